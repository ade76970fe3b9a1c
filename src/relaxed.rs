use std::{
    borrow::Cow,
    cmp::Ordering,
    convert::Infallible,
    hash::{Hash, Hasher},
    str::FromStr,
};

use compact_str::{CompactString, ToCompactString};
use derive_more::Display;
use documented::Documented;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{
    PartialSchema, ToSchema,
    openapi::{ObjectBuilder, Type},
};

use crate::{Comparable, ParseError, Version};

/// A version that may not be valid SemVer.
///
/// Text that parses as a [`Version`] is stored as one and gets full version semantics.
/// Anything else is kept verbatim as a custom version:
/// - Custom versions compare with each other as plain strings.
/// - Custom versions sort below every valid version.
/// - Custom versions are only compatible with an identical custom version.
#[derive(Clone, Display, Documented)]
#[display("{}", self.as_str())]
pub enum RelaxedVersion {
    /// The input was a valid version.
    Version(Version),

    /// The input was not a valid version and is stored verbatim.
    Custom(CompactString),
}

impl RelaxedVersion {
    /// Parse the input, falling back to a custom version if it is not valid SemVer.
    ///
    /// The fallback is logged at debug level.
    pub fn parse(input: impl AsRef<str>) -> Self {
        Self::parse_with(input, |input, err| {
            tracing::debug!(%input, %err, "storing invalid version as a custom version");
        })
    }

    /// Parse the input, calling `on_invalid` before falling back to a custom version.
    ///
    /// ```
    /// # use relaxed_semver::RelaxedVersion;
    /// let mut warnings = Vec::new();
    /// let version = RelaxedVersion::parse_with("v1.0", |input, _| warnings.push(input.to_string()));
    /// assert!(version.is_custom());
    /// assert_eq!(warnings, vec!["v1.0"]);
    /// ```
    pub fn parse_with(input: impl AsRef<str>, on_invalid: impl FnOnce(&str, &ParseError)) -> Self {
        let input = input.as_ref();
        match Version::parse(input) {
            Ok(version) => Self::Version(version),
            Err(err) => {
                on_invalid(input, &err);
                Self::Custom(input.to_compact_string())
            }
        }
    }

    /// View the original input as a string.
    pub fn as_str(&self) -> &str {
        match self {
            RelaxedVersion::Version(v) => v.as_str(),
            RelaxedVersion::Custom(v) => v.as_str(),
        }
    }

    /// The parsed version, unless this is a custom version.
    pub fn version(&self) -> Option<&Version> {
        match self {
            RelaxedVersion::Version(v) => Some(v),
            RelaxedVersion::Custom(_) => None,
        }
    }

    /// Whether the input was stored verbatim because it was not a valid version.
    pub fn is_custom(&self) -> bool {
        matches!(self, RelaxedVersion::Custom(_))
    }

    /// Whether this is a valid version with a pre-release segment.
    pub fn is_prerelease(&self) -> bool {
        self.version().is_some_and(Version::is_prerelease)
    }

    /// The pre-release segment, or `""` for releases and custom versions.
    pub fn prerelease(&self) -> &str {
        self.version().map_or("", Version::prerelease)
    }

    /// Whether this is a valid version with build metadata.
    pub fn has_build_metadata(&self) -> bool {
        self.version().is_some_and(Version::has_build_metadata)
    }

    /// The build metadata, or `""` if absent or a custom version.
    pub fn build_metadata(&self) -> &str {
        self.version().map_or("", Version::build_metadata)
    }

    /// Compare by precedence. Equivalent to [`Ord::cmp`].
    pub fn compare_to(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    /// Whether `other` is a non-breaking upgrade from `self`.
    ///
    /// Two valid versions follow [`Version::compatible_with`];
    /// otherwise the two must be identical custom versions.
    pub fn compatible_with(&self, other: &Self) -> bool {
        match (self, other) {
            (RelaxedVersion::Version(a), RelaxedVersion::Version(b)) => a.compatible_with(b),
            (RelaxedVersion::Custom(a), RelaxedVersion::Custom(b)) => a == b,
            _ => false,
        }
    }

    /// Render the version with omitted segments filled in; custom versions are returned verbatim.
    pub fn normalized_string(&self) -> String {
        match self {
            RelaxedVersion::Version(v) => v.normalized_string(),
            RelaxedVersion::Custom(v) => v.to_string(),
        }
    }

    /// Encode the version such that plain string ordering agrees with [`RelaxedVersion`] ordering.
    ///
    /// Valid versions use [`Version::sortable_string`]. Custom versions are prefixed with `-`,
    /// which sorts below the digit or `:` every valid encoding starts with.
    pub fn sortable_string(&self) -> String {
        match self {
            RelaxedVersion::Version(v) => v.sortable_string(),
            RelaxedVersion::Custom(v) => format!("-{v}"),
        }
    }
}

impl Ord for RelaxedVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (RelaxedVersion::Version(a), RelaxedVersion::Version(b)) => a.cmp(b),
            (RelaxedVersion::Version(_), RelaxedVersion::Custom(_)) => Ordering::Greater,
            (RelaxedVersion::Custom(_), RelaxedVersion::Version(_)) => Ordering::Less,
            (RelaxedVersion::Custom(a), RelaxedVersion::Custom(b)) => a.as_bytes().cmp(b.as_bytes()),
        }
    }
}

impl PartialOrd for RelaxedVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for RelaxedVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RelaxedVersion {}

impl Hash for RelaxedVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            RelaxedVersion::Version(v) => v.hash(state),
            RelaxedVersion::Custom(v) => v.hash(state),
        }
    }
}

impl std::fmt::Debug for RelaxedVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelaxedVersion::Version(v) => write!(f, "Version({v:?})"),
            RelaxedVersion::Custom(v) => write!(f, "Custom({v:?})"),
        }
    }
}

impl From<Version> for RelaxedVersion {
    fn from(value: Version) -> Self {
        Self::Version(value)
    }
}

impl From<&str> for RelaxedVersion {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<String> for RelaxedVersion {
    fn from(value: String) -> Self {
        Self::parse(value)
    }
}

impl FromStr for RelaxedVersion {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Serialize for RelaxedVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RelaxedVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::parse)
    }
}

impl PartialSchema for RelaxedVersion {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        ObjectBuilder::new()
            .description(Some(Self::DOCS))
            .examples([json!("1.2.3"), json!("1.2"), json!("r1234")])
            .schema_type(Type::String)
            .build()
            .into()
    }
}

impl ToSchema for RelaxedVersion {
    fn name() -> Cow<'static, str> {
        Cow::Borrowed("RelaxedVersion")
    }
}

impl Comparable<RelaxedVersion> for RelaxedVersion {
    fn compatible(&self, v: &RelaxedVersion) -> bool {
        self.compatible_with(v)
    }

    fn equal(&self, v: &RelaxedVersion) -> bool {
        v == self
    }

    fn less(&self, v: &RelaxedVersion) -> bool {
        v < self
    }

    fn greater(&self, v: &RelaxedVersion) -> bool {
        v > self
    }
}
