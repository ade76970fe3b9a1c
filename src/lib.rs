#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![warn(rust_2018_idioms)]

mod charset;
pub mod constraint;
mod error;
mod parser;
mod relaxed;
pub mod resolver;
mod version;

pub use constraint::{Comparable, Constraint, parse_constraint};
pub use error::*;
pub use relaxed::*;
pub use resolver::{BasicDependency, BasicRelease, Dependency, Release, Resolver};
pub use version::*;

/// Parse the input as a [`Version`].
///
/// The empty string is accepted and parses as `0.0.0`.
pub fn parse(input: impl AsRef<str>) -> Result<Version, ParseError> {
    Version::parse(input)
}

/// Parse the input as a [`Version`], panicking if it is invalid.
///
/// # Panics
///
/// Panics if the input is not a valid version.
pub fn must_parse(input: impl AsRef<str>) -> Version {
    Version::must_parse(input)
}

/// Parse the input as a [`RelaxedVersion`], which never fails.
pub fn parse_relaxed(input: impl AsRef<str>) -> RelaxedVersion {
    RelaxedVersion::parse(input)
}
