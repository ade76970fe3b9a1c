//! Single pass parser turning text into a [`Version`].
//!
//! The grammar is SemVer 2.0 with one relaxation: the minor and patch
//! segments (and, for the empty string, the major segment) may be omitted.
//! `1`, `1.2`, `1-rc.1` and `1.2+build` are all valid.
//!
//! Rather than copying segments out of the input, the parser records where each
//! segment ends; an omitted segment ends where the previous one did.

use crate::{
    Segment, Version,
    charset::{is_identifier, is_numeric, is_version_separator},
    error::{self, ParseError, ParseErrorKind},
};

/// Tracks the parser's position within the input.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cursor<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    pub(crate) fn input(&self) -> &'a str {
        self.input
    }

    pub(crate) fn position(&self) -> usize {
        self.position
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.position).copied()
    }

    /// The character at the cursor, decoded so non-ASCII input is reported faithfully.
    fn current_char(&self) -> char {
        self.input[self.position..]
            .chars()
            .next()
            .unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    fn bump(&mut self) {
        self.position += 1;
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn eat_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
    }
}

/// Parse the input as a version.
pub(crate) fn parse(input: &str) -> Result<Version, ParseError> {
    if input.is_empty() {
        return Ok(Version::zero());
    }

    let mut cursor = Cursor::new(input);

    let major = number(&mut cursor, Segment::Major)?;
    let minor = if cursor.eat(b'.') {
        number(&mut cursor, Segment::Minor)?
    } else {
        major
    };
    let patch = if minor != major && cursor.eat(b'.') {
        number(&mut cursor, Segment::Patch)?
    } else {
        minor
    };

    let prerelease = if cursor.eat(b'-') {
        identifiers(&mut cursor, Segment::Prerelease)?;
        cursor.position()
    } else {
        patch
    };

    if cursor.eat(b'+') {
        identifiers(&mut cursor, Segment::Build)?;
    }

    match cursor.peek() {
        None => Ok(Version::from_offsets(input, major, minor, patch, prerelease)),
        Some(_) => error::fail!(
            cursor,
            ParseErrorKind::TrailingCharacters {
                found: cursor.current_char(),
            }
        ),
    }
}

/// Consume a numeric segment and check the byte that follows it.
///
/// Returns the end offset of the segment.
fn number(cursor: &mut Cursor<'_>, segment: Segment) -> Result<usize, ParseError> {
    match cursor.peek() {
        Some(b'0') => {
            cursor.bump();
            if cursor.peek().is_some_and(is_numeric) {
                error::fail!(cursor, ParseErrorKind::LeadingZero { segment })
            }
        }
        Some(b) if is_numeric(b) => cursor.eat_while(is_numeric),
        _ => error::fail!(cursor, ParseErrorKind::MissingNumber { segment }),
    }

    let end = cursor.position();
    match cursor.peek() {
        None => Ok(end),
        Some(b'.') if segment == Segment::Patch => {
            error::fail!(cursor, ParseErrorKind::ExtraSegment)
        }
        Some(b) if is_version_separator(b) => Ok(end),
        Some(_) => error::fail!(
            cursor,
            ParseErrorKind::InvalidSeparator {
                segment,
                found: cursor.current_char(),
            }
        ),
    }
}

/// Consume a dot separated list of identifiers.
///
/// Stops before a `+` ending the pre-release, or at the end of input.
fn identifiers(cursor: &mut Cursor<'_>, segment: Segment) -> Result<(), ParseError> {
    loop {
        let start = cursor.position();
        cursor.eat_while(is_identifier);
        let identifier = &cursor.input()[start..cursor.position()];

        if identifier.is_empty() {
            match cursor.peek() {
                None | Some(b'.') | Some(b'+') => {
                    error::fail!(cursor, ParseErrorKind::EmptyIdentifier { segment })
                }
                Some(_) => error::fail!(
                    cursor,
                    ParseErrorKind::InvalidCharacter {
                        segment,
                        found: cursor.current_char(),
                    }
                ),
            }
        }
        if segment == Segment::Prerelease
            && identifier.len() > 1
            && identifier.starts_with('0')
            && identifier.bytes().all(is_numeric)
        {
            let mut at = *cursor;
            at.position = start;
            error::fail!(at, ParseErrorKind::LeadingZeroIdentifier)
        }

        match cursor.peek() {
            None => return Ok(()),
            Some(b'.') => cursor.bump(),
            Some(b'+') if segment == Segment::Prerelease => return Ok(()),
            Some(b) if segment == Segment::Build && is_version_separator(b) => {
                error::fail!(
                    cursor,
                    ParseErrorKind::TrailingCharacters {
                        found: cursor.current_char(),
                    }
                )
            }
            Some(_) => error::fail!(
                cursor,
                ParseErrorKind::InvalidCharacter {
                    segment,
                    found: cursor.current_char(),
                }
            ),
        }
    }
}
