//! Byte class membership tables used by the version and constraint parsers.

const DIGITS: &[u8] = b"0123456789";
const IDENTIFIER: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-";
const VERSION_SEPARATORS: &[u8] = b".-+";

static NUMERIC_TABLE: [bool; 256] = table(DIGITS);
static IDENTIFIER_TABLE: [bool; 256] = table(IDENTIFIER);
static SEPARATOR_TABLE: [bool; 256] = table(VERSION_SEPARATORS);

const fn table(members: &[u8]) -> [bool; 256] {
    let mut table = [false; 256];
    let mut i = 0;
    while i < members.len() {
        table[members[i] as usize] = true;
        i += 1;
    }
    table
}

/// Whether the byte is an ASCII digit.
#[inline]
pub fn is_numeric(b: u8) -> bool {
    NUMERIC_TABLE[b as usize]
}

/// Whether the byte may appear in a pre-release or build identifier: `[0-9A-Za-z-]`.
#[inline]
pub fn is_identifier(b: u8) -> bool {
    IDENTIFIER_TABLE[b as usize]
}

/// Whether the byte separates version segments: `.`, `-` or `+`.
#[inline]
pub fn is_version_separator(b: u8) -> bool {
    SEPARATOR_TABLE[b as usize]
}

/// Whether every byte of a non-empty identifier is a digit.
pub fn is_numeric_identifier(identifier: &str) -> bool {
    !identifier.is_empty() && identifier.bytes().all(is_numeric)
}
