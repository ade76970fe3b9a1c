//! Tests for the crate.

mod constraint;
mod serialization;
