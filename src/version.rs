use std::{
    borrow::Cow,
    cmp::Ordering,
    hash::{Hash, Hasher},
    str::FromStr,
};

use compact_str::{CompactString, ToCompactString, format_compact};
use derive_more::Display;
use documented::Documented;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{
    PartialSchema, ToSchema,
    openapi::{ObjectBuilder, Type},
};

use crate::{Comparable, ParseError, RelaxedVersion, charset::is_numeric_identifier, parser};

/// A SemVer 2.0 version, with the minor and patch segments optionally omitted.
///
/// The original text is kept verbatim alongside the offsets at which each
/// segment ends, so accessors borrow from the input rather than allocating.
/// Omitted segments read as `"0"`, which means `1`, `1.0` and `1.0.0` all
/// compare equal while still rendering as they were written.
///
/// Ordering follows SemVer precedence:
/// - Major, minor and patch compare numerically, with no upper bound on their size.
/// - A release sorts above any of its pre-releases.
/// - Pre-release identifiers compare pairwise; numeric identifiers sort below alphanumeric ones.
/// - Build metadata is ignored.
#[derive(Clone, Display, Documented)]
#[display("{}", self.text)]
pub struct Version {
    /// The original input.
    text: CompactString,

    pub(crate) major_end: usize,
    pub(crate) minor_end: usize,
    pub(crate) patch_end: usize,
    pub(crate) prerelease_end: usize,
}

impl Version {
    /// The version parsed from an empty string, equivalent to `0.0.0`.
    pub(crate) fn zero() -> Self {
        Self {
            text: CompactString::default(),
            major_end: 0,
            minor_end: 0,
            patch_end: 0,
            prerelease_end: 0,
        }
    }

    pub(crate) fn from_offsets(
        text: &str,
        major_end: usize,
        minor_end: usize,
        patch_end: usize,
        prerelease_end: usize,
    ) -> Self {
        Self {
            text: text.to_compact_string(),
            major_end,
            minor_end,
            patch_end,
            prerelease_end,
        }
    }

    /// Create a `major.minor.patch` version.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        let (major, minor, patch) = (
            major.to_compact_string(),
            minor.to_compact_string(),
            patch.to_compact_string(),
        );
        let major_end = major.len();
        let minor_end = major_end + 1 + minor.len();
        let patch_end = minor_end + 1 + patch.len();
        Self {
            text: format_compact!("{major}.{minor}.{patch}"),
            major_end,
            minor_end,
            patch_end,
            prerelease_end: patch_end,
        }
    }

    /// Parse the input as a version.
    ///
    /// The empty string is accepted and parses as `0.0.0`.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, ParseError> {
        parser::parse(input.as_ref())
    }

    /// Parse the input as a version, panicking if it is invalid.
    ///
    /// # Panics
    ///
    /// Panics if the input is not a valid version.
    pub fn must_parse(input: impl AsRef<str>) -> Self {
        match Self::parse(input) {
            Ok(version) => version,
            Err(err) => panic!("{err}"),
        }
    }

    /// View the original input as a string.
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    /// The major version number as written, or `"0"` for the empty version.
    pub fn major(&self) -> &str {
        if self.major_end == 0 {
            "0"
        } else {
            &self.text[..self.major_end]
        }
    }

    /// The minor version number as written, or `"0"` if omitted.
    pub fn minor(&self) -> &str {
        if self.minor_end > self.major_end {
            &self.text[self.major_end + 1..self.minor_end]
        } else {
            "0"
        }
    }

    /// The patch version number as written, or `"0"` if omitted.
    pub fn patch(&self) -> &str {
        if self.patch_end > self.minor_end {
            &self.text[self.minor_end + 1..self.patch_end]
        } else {
            "0"
        }
    }

    /// Whether the version has a pre-release segment.
    pub fn is_prerelease(&self) -> bool {
        self.prerelease_end > self.patch_end
    }

    /// The pre-release segment without its leading `-`, or `""`.
    pub fn prerelease(&self) -> &str {
        if self.is_prerelease() {
            &self.text[self.patch_end + 1..self.prerelease_end]
        } else {
            ""
        }
    }

    /// The dot separated pre-release identifiers.
    pub fn prerelease_identifiers(&self) -> impl Iterator<Item = &str> {
        self.prerelease().split('.').filter(|id| !id.is_empty())
    }

    /// Whether the version has build metadata.
    pub fn has_build_metadata(&self) -> bool {
        self.text.len() > self.prerelease_end
    }

    /// The build metadata without its leading `+`, or `""`.
    pub fn build_metadata(&self) -> &str {
        if self.has_build_metadata() {
            &self.text[self.prerelease_end + 1..]
        } else {
            ""
        }
    }

    /// Compare by precedence. Equivalent to [`Ord::cmp`].
    pub fn compare_to(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    /// Whether `other` is a non-breaking upgrade from `self`.
    ///
    /// `self` is the lower bound: `other` must be at least `self` and share its major version.
    /// A major version of `0` makes the minor version significant too,
    /// and `0.0` makes the patch version significant as well.
    ///
    /// ```
    /// # use relaxed_semver::version;
    /// assert!(version!("1.2.0").compatible_with(&version!("1.9.3")));
    /// assert!(version!("0.2.0").compatible_with(&version!("0.2.5")));
    /// assert!(!version!("0.2.0").compatible_with(&version!("0.3.0")));
    /// assert!(!version!("0.0.2").compatible_with(&version!("0.0.3")));
    /// ```
    pub fn compatible_with(&self, other: &Self) -> bool {
        if other < self || self.major() != other.major() {
            return false;
        }
        if self.major() != "0" {
            return true;
        }
        if self.minor() != other.minor() {
            return false;
        }
        self.minor() != "0" || self.patch() == other.patch()
    }

    /// Encode the version such that plain string ordering agrees with version ordering.
    ///
    /// Numbers are prefixed with one `:` per digit beyond the first, so longer numbers
    /// sort after shorter ones. Releases end in `;`, which sorts after the `-` that
    /// introduces pre-release identifiers. Within the pre-release, numeric identifiers
    /// are prefixed with `:` and alphanumeric ones with `;`, joined by `,`.
    /// Build metadata is dropped.
    ///
    /// ```
    /// # use relaxed_semver::version;
    /// assert_eq!(version!("1.10.0").sortable_string(), "1.:10.0;");
    /// assert_eq!(version!("1.0.0-rc.2").sortable_string(), "1.0.0-;rc,:2");
    /// ```
    pub fn sortable_string(&self) -> String {
        let mut encoded = String::with_capacity(self.text.len() * 2 + 6);
        encode_number(&mut encoded, self.major());
        encoded.push('.');
        encode_number(&mut encoded, self.minor());
        encoded.push('.');
        encode_number(&mut encoded, self.patch());

        if !self.is_prerelease() {
            encoded.push(';');
            return encoded;
        }

        encoded.push('-');
        for (i, id) in self.prerelease_identifiers().enumerate() {
            if i > 0 {
                encoded.push(',');
            }
            if is_numeric_identifier(id) {
                encoded.push(':');
                encode_number(&mut encoded, id);
            } else {
                encoded.push(';');
                encoded.push_str(id);
            }
        }
        encoded
    }

    /// Render the version with omitted segments filled in as `0`.
    ///
    /// ```
    /// # use relaxed_semver::version;
    /// assert_eq!(version!("1-rc.1+b").normalized_string(), "1.0.0-rc.1+b");
    /// assert_eq!(version!("").normalized_string(), "0.0.0");
    /// ```
    pub fn normalized_string(&self) -> String {
        let mut normalized = self.clone();
        normalized.normalize();
        normalized.text.into_string()
    }

    /// Fill in omitted minor and patch segments in place.
    ///
    /// Afterwards the text is always `major.minor.patch[-pre][+build]`;
    /// calling this again has no effect.
    pub fn normalize(&mut self) {
        if self.major_end == 0 {
            *self = Self::new(0, 0, 0);
        } else if self.minor_end == self.major_end {
            self.text.insert_str(self.major_end, ".0.0");
            self.minor_end = self.major_end + 2;
            self.patch_end = self.major_end + 4;
            self.prerelease_end += 4;
        } else if self.patch_end == self.minor_end {
            self.text.insert_str(self.minor_end, ".0");
            self.patch_end = self.minor_end + 2;
            self.prerelease_end += 2;
        }
    }
}

/// Append a number prefixed by one `:` for each digit after the first.
fn encode_number(encoded: &mut String, number: &str) {
    encoded.extend(std::iter::repeat_n(':', number.len().saturating_sub(1)));
    encoded.push_str(number);
}

/// Compare digit strings without leading zeros by numeric value.
fn compare_numeric(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// A pre-release identifier, ordered by SemVer precedence.
#[derive(PartialEq, Eq)]
struct Identifier<'a>(&'a str);

impl Ord for Identifier<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (is_numeric_identifier(self.0), is_numeric_identifier(other.0)) {
            (true, true) => compare_numeric(self.0, other.0),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.0.cmp(other.0),
        }
    }
}

impl PartialOrd for Identifier<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_numeric(self.major(), other.major())
            .then_with(|| compare_numeric(self.minor(), other.minor()))
            .then_with(|| compare_numeric(self.patch(), other.patch()))
            .then_with(|| match (self.is_prerelease(), other.is_prerelease()) {
                (false, false) => Ordering::Equal,
                (false, true) => Ordering::Greater,
                (true, false) => Ordering::Less,
                (true, true) => self
                    .prerelease_identifiers()
                    .map(Identifier)
                    .cmp(other.prerelease_identifiers().map(Identifier)),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

// Equal versions have identical digit strings and pre-release text,
// since leading zeros are rejected by the parser.
impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.major().hash(state);
        self.minor().hash(state);
        self.patch().hash(state);
        self.prerelease().hash(state);
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Debug for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl FromStr for Version {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for Version {
    type Error = ParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<String> for Version {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl Serialize for Version {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(s).map_err(serde::de::Error::custom)
    }
}

impl PartialSchema for Version {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        ObjectBuilder::new()
            .description(Some(Self::DOCS))
            .examples([json!("1.2.3"), json!("1.2.3-rc.1+build.5"), json!("1.2")])
            .schema_type(Type::String)
            .build()
            .into()
    }
}

impl ToSchema for Version {
    fn name() -> Cow<'static, str> {
        Cow::Borrowed("Version")
    }
}

impl Comparable<Version> for Version {
    fn compatible(&self, v: &Version) -> bool {
        self.compatible_with(v)
    }

    fn equal(&self, v: &Version) -> bool {
        v == self
    }

    fn less(&self, v: &Version) -> bool {
        v < self
    }

    fn greater(&self, v: &Version) -> bool {
        v > self
    }
}

/// Custom relaxed versions sort below every valid version and are never compatible with one.
impl Comparable<RelaxedVersion> for Version {
    fn compatible(&self, v: &RelaxedVersion) -> bool {
        v.version().is_some_and(|v| self.compatible_with(v))
    }

    fn equal(&self, v: &RelaxedVersion) -> bool {
        v.version().is_some_and(|v| v == self)
    }

    fn less(&self, v: &RelaxedVersion) -> bool {
        v.version().is_none_or(|v| v < self)
    }

    fn greater(&self, v: &RelaxedVersion) -> bool {
        v.version().is_some_and(|v| v > self)
    }
}

/// Create a [`Version`], panicking if it is invalid.
///
/// ```
/// # use relaxed_semver::{Version, version};
/// let version = version!(1, 2, 0);
/// assert_eq!(version, Version::new(1, 2, 0));
///
/// let version = version!("1.2-rc.1");
/// assert_eq!(version.as_str(), "1.2-rc.1");
/// assert_eq!(version.patch(), "0");
/// ```
#[macro_export]
macro_rules! version {
    ($major:expr, $minor:expr, $patch:expr) => {
        $crate::Version::new($major, $minor, $patch)
    };
    ($input:expr) => {
        $crate::Version::must_parse($input)
    };
}
