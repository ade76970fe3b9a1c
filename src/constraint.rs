//! # Version constraints
//!
//! A constraint is a boolean expression over version comparisons:
//!
//! ```text
//! constraint := and ('||' and)*
//! and        := terminal ('&&' terminal)*
//! terminal   := '!' terminal | '(' constraint ')' | op version
//! op         := '=' | '^' | '>' | '>=' | '<' | '<='
//! ```
//!
//! `!` binds tightest, then `&&`, then `||`. Spaces may separate tokens,
//! but an operator must be immediately followed by its version.
//! The empty string is the constraint that matches everything.
//!
//! ```
//! # use relaxed_semver::{parse_constraint, version};
//! let constraint = parse_constraint(">=1.2.0 && <2.0.0 || =0.9.8").expect("must parse");
//! assert!(constraint.matches(&version!("1.4.1")));
//! assert!(constraint.matches(&version!("0.9.8")));
//! assert!(!constraint.matches(&version!("2.0.0")));
//! assert_eq!(constraint.to_string(), "((>=1.2.0 && <2.0.0) || =0.9.8)");
//! ```
//!
//! ## Rendering
//!
//! Rendering a constraint always produces text that parses back to an equivalent tree:
//! `&&` and `||` groups are always parenthesized, and `!` parenthesizes its operand
//! unless the operand already renders with a leading `(`.
//! [`Constraint::True`] renders as the empty string at the top level and as `>=0-0`
//! when nested; an empty `&&` group renders as `>=0-0` and an empty `||` group as `!(>=0-0)`.

use std::{fmt, str::FromStr};

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, space0},
    combinator::{cut, value},
    error::{ErrorKind, ParseError as NomParseError},
    multi::many0,
    sequence::{delimited, preceded},
};
use serde::{Deserialize, Serialize};

use crate::{
    ConstraintParseError, ConstraintParseErrorKind, ParseError, Version,
    charset::{is_identifier, is_version_separator},
};

/// Enables comparison between constraint versions and target versions.
///
/// The comparison direction is reversed from what one might expect:
/// `Self` is the version inside the constraint, `V` is the version being tested,
/// and methods like `less()` check whether `V` is less than `Self`.
/// A constraint like `<2.0.0` is then simply `two.less(target)`.
///
/// Default implementations are provided for the inclusive comparisons.
pub trait Comparable<V> {
    /// Implements the caret constraint (`^`): whether `v` is a non-breaking upgrade from `self`.
    fn compatible(&self, v: &V) -> bool;

    /// Implements the equality constraint (`=`).
    fn equal(&self, v: &V) -> bool;

    /// Implements the less than constraint (`<`): whether `v` is less than `self`.
    fn less(&self, v: &V) -> bool;

    /// Implements the greater than constraint (`>`): whether `v` is greater than `self`.
    fn greater(&self, v: &V) -> bool;

    /// Implements the `<=` constraint.
    fn less_or_equal(&self, v: &V) -> bool {
        self.equal(v) || self.less(v)
    }

    /// Implements the `>=` constraint.
    fn greater_or_equal(&self, v: &V) -> bool {
        self.equal(v) || self.greater(v)
    }
}

/// A predicate over versions, built from comparisons joined by boolean operators.
///
/// `V` is the type of version held by the comparison leaves.
/// Parsing always produces `Constraint<Version>`;
/// [`Constraint::map`] converts between version types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constraint<V = Version> {
    /// Matches every version. Parsed from the empty string and renders as the empty string.
    True,

    /// `=`: matches versions with equal precedence.
    Equal(V),

    /// `<`: matches versions lower than this one.
    Less(V),

    /// `<=`: matches versions lower than or equal to this one.
    LessOrEqual(V),

    /// `>`: matches versions higher than this one.
    Greater(V),

    /// `>=`: matches versions higher than or equal to this one.
    GreaterOrEqual(V),

    /// `^`: matches versions that are non-breaking upgrades from this one.
    ///
    /// See [`Version::compatible_with`] for the exact rules.
    Compatible(V),

    /// `a && b`: matches versions matched by every child.
    And(Vec<Constraint<V>>),

    /// `a || b`: matches versions matched by any child.
    Or(Vec<Constraint<V>>),

    /// `!a`: matches versions the child does not match.
    Not(Box<Constraint<V>>),
}

impl<V> Constraint<V> {
    /// Whether the version satisfies this constraint.
    ///
    /// The target may be any type the constraint's versions are [`Comparable`] with.
    pub fn matches<T>(&self, version: &T) -> bool
    where
        V: Comparable<T>,
    {
        match self {
            Constraint::True => true,
            Constraint::Equal(s) => s.equal(version),
            Constraint::Less(s) => s.less(version),
            Constraint::LessOrEqual(s) => s.less_or_equal(version),
            Constraint::Greater(s) => s.greater(version),
            Constraint::GreaterOrEqual(s) => s.greater_or_equal(version),
            Constraint::Compatible(s) => s.compatible(version),
            Constraint::And(all) => all.iter().all(|c| c.matches(version)),
            Constraint::Or(any) => any.iter().any(|c| c.matches(version)),
            Constraint::Not(c) => !c.matches(version),
        }
    }

    /// The version held by a comparison leaf, if this is one.
    pub fn version(&self) -> Option<&V> {
        match self {
            Constraint::Equal(v)
            | Constraint::Less(v)
            | Constraint::LessOrEqual(v)
            | Constraint::Greater(v)
            | Constraint::GreaterOrEqual(v)
            | Constraint::Compatible(v) => Some(v),
            Constraint::True | Constraint::And(_) | Constraint::Or(_) | Constraint::Not(_) => None,
        }
    }

    /// Negate the constraint.
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Constraint::Not(Box::new(self))
    }

    /// Transform every version in the tree by reference, preserving its shape.
    pub fn map_ref<'a, R>(&'a self, closure: &impl Fn(&'a V) -> R) -> Constraint<R> {
        match self {
            Constraint::True => Constraint::True,
            Constraint::Equal(v) => Constraint::Equal(closure(v)),
            Constraint::Less(v) => Constraint::Less(closure(v)),
            Constraint::LessOrEqual(v) => Constraint::LessOrEqual(closure(v)),
            Constraint::Greater(v) => Constraint::Greater(closure(v)),
            Constraint::GreaterOrEqual(v) => Constraint::GreaterOrEqual(closure(v)),
            Constraint::Compatible(v) => Constraint::Compatible(closure(v)),
            Constraint::And(all) => Constraint::And(all.iter().map(|c| c.map_ref(closure)).collect()),
            Constraint::Or(any) => Constraint::Or(any.iter().map(|c| c.map_ref(closure)).collect()),
            Constraint::Not(c) => Constraint::Not(Box::new(c.map_ref(closure))),
        }
    }

    /// Transform every version in the tree by value, preserving its shape.
    pub fn map<R>(self, closure: &impl Fn(V) -> R) -> Constraint<R> {
        match self {
            Constraint::True => Constraint::True,
            Constraint::Equal(v) => Constraint::Equal(closure(v)),
            Constraint::Less(v) => Constraint::Less(closure(v)),
            Constraint::LessOrEqual(v) => Constraint::LessOrEqual(closure(v)),
            Constraint::Greater(v) => Constraint::Greater(closure(v)),
            Constraint::GreaterOrEqual(v) => Constraint::GreaterOrEqual(closure(v)),
            Constraint::Compatible(v) => Constraint::Compatible(closure(v)),
            Constraint::And(all) => Constraint::And(all.into_iter().map(|c| c.map(closure)).collect()),
            Constraint::Or(any) => Constraint::Or(any.into_iter().map(|c| c.map(closure)).collect()),
            Constraint::Not(c) => Constraint::Not(Box::new(c.map(closure))),
        }
    }

    /// Join the terms with `&&`, unwrapping a single term.
    fn all(first: Self, rest: Vec<Self>) -> Self {
        if rest.is_empty() {
            first
        } else {
            Constraint::And(std::iter::once(first).chain(rest).collect())
        }
    }

    /// Join the terms with `||`, unwrapping a single term.
    fn any(first: Self, rest: Vec<Self>) -> Self {
        if rest.is_empty() {
            first
        } else {
            Constraint::Or(std::iter::once(first).chain(rest).collect())
        }
    }
}

/// Renders [`Constraint::True`] where it cannot be written as the empty string.
/// `0-0` is the lowest possible version, so this matches every version.
const ALWAYS: &str = ">=0-0";

impl<V: fmt::Display> fmt::Display for Constraint<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::True => Ok(()),
            Constraint::Equal(v) => write!(f, "={v}"),
            Constraint::Less(v) => write!(f, "<{v}"),
            Constraint::LessOrEqual(v) => write!(f, "<={v}"),
            Constraint::Greater(v) => write!(f, ">{v}"),
            Constraint::GreaterOrEqual(v) => write!(f, ">={v}"),
            Constraint::Compatible(v) => write!(f, "^{v}"),
            Constraint::And(all) if all.is_empty() => f.write_str(ALWAYS),
            Constraint::Or(any) if any.is_empty() => write!(f, "!({ALWAYS})"),
            Constraint::And(all) => write_group(f, all, " && "),
            Constraint::Or(any) => write_group(f, any, " || "),
            Constraint::Not(c) => {
                let operand = Operand(c).to_string();
                if operand.starts_with('(') {
                    write!(f, "!{operand}")
                } else {
                    write!(f, "!({operand})")
                }
            }
        }
    }
}

/// A constraint nested inside `!`, `&&` or `||`.
struct Operand<'a, V>(&'a Constraint<V>);

impl<V: fmt::Display> fmt::Display for Operand<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Constraint::True => f.write_str(ALWAYS),
            c => write!(f, "{c}"),
        }
    }
}

fn write_group<V: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    terms: &[Constraint<V>],
    separator: &str,
) -> fmt::Result {
    f.write_str("(")?;
    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{}", Operand(term))?;
    }
    f.write_str(")")
}

/// Parse a constraint expression.
///
/// Surrounding whitespace is ignored; an empty expression parses as [`Constraint::True`].
#[tracing::instrument(level = "trace")]
pub fn parse_constraint(input: &str) -> Result<Constraint, ConstraintParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(Constraint::True);
    }

    match disjunction(input) {
        Ok((rest, constraint)) if rest.trim_start().is_empty() => Ok(constraint),
        Ok((rest, _)) => Err(Fault::new(rest.trim_start(), FaultKind::Unexpected).into_error(input)),
        Err(nom::Err::Error(fault) | nom::Err::Failure(fault)) => Err(fault.into_error(input)),
        Err(nom::Err::Incomplete(_)) => Err(Fault::new("", FaultKind::Unexpected).into_error(input)),
    }
}

impl FromStr for Constraint {
    type Err = ConstraintParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_constraint(s)
    }
}

impl TryFrom<&str> for Constraint {
    type Error = ConstraintParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        parse_constraint(value)
    }
}

impl<V: fmt::Display> Serialize for Constraint<V> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_string().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Constraint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_constraint(&s).map_err(serde::de::Error::custom)
    }
}

/// Why the parser stopped, and where.
#[derive(Debug)]
struct Fault<'a> {
    at: &'a str,
    kind: FaultKind<'a>,
}

#[derive(Debug)]
enum FaultKind<'a> {
    Unexpected,
    MissingVersion,
    InvalidVersion(&'a str, ParseError),
    UnclosedGroup,
}

impl<'a> Fault<'a> {
    fn new(at: &'a str, kind: FaultKind<'a>) -> Self {
        Self { at, kind }
    }

    fn into_error(self, input: &str) -> ConstraintParseError {
        let at = self.at.to_string();
        let kind = match self.kind {
            FaultKind::Unexpected | FaultKind::MissingVersion if self.at.is_empty() => {
                ConstraintParseErrorKind::UnexpectedEnd
            }
            FaultKind::Unexpected => ConstraintParseErrorKind::Unexpected { at },
            FaultKind::MissingVersion => ConstraintParseErrorKind::MissingVersion { at },
            FaultKind::InvalidVersion(version, error) => ConstraintParseErrorKind::InvalidVersion {
                version: version.to_string(),
                error,
            },
            FaultKind::UnclosedGroup => ConstraintParseErrorKind::UnclosedGroup { at },
        };
        ConstraintParseError::new(input, self.at, kind)
    }
}

impl<'a> NomParseError<&'a str> for Fault<'a> {
    fn from_error_kind(input: &'a str, _: ErrorKind) -> Self {
        Self::new(input, FaultKind::Unexpected)
    }

    fn append(_: &'a str, _: ErrorKind, other: Self) -> Self {
        other
    }
}

type Res<'a, T> = IResult<&'a str, T, Fault<'a>>;

fn disjunction(input: &str) -> Res<'_, Constraint> {
    (conjunction, many0(preceded((space0, tag("||")), cut(conjunction))))
        .map(|(first, rest)| Constraint::any(first, rest))
        .parse(input)
}

fn conjunction(input: &str) -> Res<'_, Constraint> {
    (terminal, many0(preceded((space0, tag("&&")), cut(terminal))))
        .map(|(first, rest)| Constraint::all(first, rest))
        .parse(input)
}

fn terminal(input: &str) -> Res<'_, Constraint> {
    preceded(space0, alt((negation, group, comparison))).parse(input)
}

fn negation(input: &str) -> Res<'_, Constraint> {
    preceded(char('!'), cut(terminal))
        .map(Constraint::not)
        .parse(input)
}

fn group(input: &str) -> Res<'_, Constraint> {
    delimited(char('('), cut(disjunction), cut(closing)).parse(input)
}

/// The `)` ending a group; running out of input first leaves the group unclosed.
fn closing(input: &str) -> Res<'_, char> {
    let (rest, _) = space0::<_, Fault<'_>>(input)?;
    if rest.is_empty() {
        return Err(nom::Err::Error(Fault::new(rest, FaultKind::UnclosedGroup)));
    }
    char(')').parse(rest)
}

fn comparison(input: &str) -> Res<'_, Constraint> {
    type Build = fn(Version) -> Constraint;
    let operator = alt((
        value(Constraint::GreaterOrEqual as Build, tag(">=")),
        value(Constraint::LessOrEqual as Build, tag("<=")),
        value(Constraint::Greater as Build, tag(">")),
        value(Constraint::Less as Build, tag("<")),
        value(Constraint::Equal as Build, tag("=")),
        value(Constraint::Compatible as Build, tag("^")),
    ));
    (operator, cut(version))
        .map(|(build, version)| build(version))
        .parse(input)
}

/// The longest run of identifier and separator bytes, parsed as a version.
fn version(input: &str) -> Res<'_, Version> {
    let end = input
        .bytes()
        .position(|b| !is_identifier(b) && !is_version_separator(b))
        .unwrap_or(input.len());
    let (literal, rest) = input.split_at(end);

    if literal.is_empty() {
        return Err(nom::Err::Error(Fault::new(input, FaultKind::MissingVersion)));
    }
    match Version::parse(literal) {
        Ok(version) => Ok((rest, version)),
        Err(err) => Err(nom::Err::Failure(Fault::new(
            input,
            FaultKind::InvalidVersion(literal, err),
        ))),
    }
}

/// Create a [`Constraint`] leaf, or parse one, panicking if it is invalid.
///
/// ```
/// # use relaxed_semver::{Constraint, constraint, version};
/// let constraint = constraint!(GreaterOrEqual => version!(1, 2, 0));
/// assert_eq!(constraint, Constraint::GreaterOrEqual(version!("1.2.0")));
///
/// let constraint = constraint!("^1.2 && !=1.3.0");
/// assert!(constraint.matches(&version!("1.4.0")));
/// assert!(!constraint.matches(&version!("1.3.0")));
/// ```
#[macro_export]
macro_rules! constraint {
    ($variant:ident => $version:expr) => {
        $crate::Constraint::$variant($version)
    };
    ($input:expr) => {
        match $crate::parse_constraint($input) {
            Ok(constraint) => constraint,
            Err(err) => panic!("{err}"),
        }
    };
}
