use miette::{Diagnostic, SourceSpan};
use strum::Display;
use thiserror::Error;

/// Records all errors reported by this library.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Errors encountered while parsing a version.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    /// Errors encountered while parsing a constraint expression.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Constraint(#[from] ConstraintParseError),
}

/// The segment of a version that was being parsed when an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Segment {
    /// The major version number.
    Major,

    /// The minor version number.
    Minor,

    /// The patch version number.
    Patch,

    /// The dot separated pre-release identifiers after `-`.
    Prerelease,

    /// The dot separated build metadata identifiers after `+`.
    Build,
}

/// Errors encountered when parsing a [`Version`](crate::Version).
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
#[error("invalid version '{input}': {kind}")]
pub struct ParseError {
    /// The input originally provided.
    #[source_code]
    input: String,

    /// The location of the offending byte.
    #[label("here")]
    span: SourceSpan,

    /// What went wrong.
    kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(input: &str, offset: usize, kind: ParseErrorKind) -> Self {
        let len = input[offset..].chars().next().map_or(0, char::len_utf8);
        Self {
            input: input.to_string(),
            span: (offset, len).into(),
            kind,
        }
    }

    /// The input that failed to parse.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// The byte offset into the input at which parsing failed.
    pub fn offset(&self) -> usize {
        self.span.offset()
    }

    /// The specific reason parsing failed.
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }
}

/// The distinct reasons a version can fail to parse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseErrorKind {
    /// A numeric segment had no digits.
    #[error("no {segment} version found")]
    MissingNumber {
        /// The segment lacking digits.
        segment: Segment,
    },

    /// A numeric segment started with `0` but was longer than one digit.
    #[error("{segment} version must not be prefixed with zero")]
    LeadingZero {
        /// The offending segment.
        segment: Segment,
    },

    /// A numeric segment was followed by something other than a separator.
    #[error("invalid {segment} version separator '{found}'")]
    InvalidSeparator {
        /// The segment just parsed.
        segment: Segment,

        /// The character found instead of a separator.
        found: char,
    },

    /// A pre-release or build identifier was empty.
    #[error("empty {segment} identifier not allowed")]
    EmptyIdentifier {
        /// The segment containing the empty identifier.
        segment: Segment,
    },

    /// A purely numeric pre-release identifier started with `0`.
    #[error("numeric prerelease identifier must not be prefixed with zero")]
    LeadingZeroIdentifier,

    /// A pre-release or build identifier contained a character outside `[0-9A-Za-z-]`.
    #[error("invalid character '{found}' in {segment} identifier")]
    InvalidCharacter {
        /// The segment containing the character.
        segment: Segment,

        /// The character encountered.
        found: char,
    },

    /// Something followed the build metadata.
    #[error("unexpected '{found}' after build metadata")]
    TrailingCharacters {
        /// The first character after the build metadata.
        found: char,
    },

    /// A fourth dot separated segment followed the patch version.
    #[error("extra segment after patch version")]
    ExtraSegment,
}

/// Errors encountered when parsing a [`Constraint`](crate::Constraint) from a string.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
#[error("invalid constraint '{input}': {kind}")]
pub struct ConstraintParseError {
    /// The (trimmed) input originally provided.
    #[source_code]
    input: String,

    /// The location of the offending text.
    #[label("here")]
    span: SourceSpan,

    /// What went wrong.
    kind: ConstraintParseErrorKind,
}

impl ConstraintParseError {
    pub(crate) fn new(input: &str, rest: &str, kind: ConstraintParseErrorKind) -> Self {
        let offset = input.len() - rest.len();
        Self {
            input: input.to_string(),
            span: (offset, rest.len()).into(),
            kind,
        }
    }

    /// The input that failed to parse.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// The unparsed remainder of the input, starting at the offending text.
    pub fn remainder(&self) -> &str {
        &self.input[self.span.offset()..]
    }

    /// The specific reason parsing failed.
    pub fn kind(&self) -> &ConstraintParseErrorKind {
        &self.kind
    }
}

/// The distinct reasons a constraint expression can fail to parse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConstraintParseErrorKind {
    /// A character that cannot start or continue an expression.
    #[error("unexpected char at: {at}")]
    Unexpected {
        /// The remaining input, starting at the unexpected character.
        at: String,
    },

    /// An operator was left without an operand.
    #[error("unexpected end of input")]
    UnexpectedEnd,

    /// An operator was not immediately followed by a version.
    #[error("invalid version at: {at}")]
    MissingVersion {
        /// The remaining input after the operator.
        at: String,
    },

    /// The version following an operator did not parse.
    #[error("invalid version '{version}'")]
    InvalidVersion {
        /// The version text.
        version: String,

        /// The underlying version error.
        #[source]
        error: ParseError,
    },

    /// A `(` was not closed.
    #[error("missing ')' at: {at}")]
    UnclosedGroup {
        /// The remaining input where `)` was expected.
        at: String,
    },
}

/// Construct and return a new [`ParseError`] at the cursor's current position.
///
/// ```ignore
/// error::fail!(cursor, ParseErrorKind::ExtraSegment);
/// ```
macro_rules! fail {
    ($cursor:expr, $kind:expr) => {
        return Err($crate::error::ParseError::new(
            $cursor.input(),
            $cursor.position(),
            $kind,
        ))
    };
}
pub(crate) use fail;
