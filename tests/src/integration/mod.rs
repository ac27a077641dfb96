//! Cross-crate integration scenarios.

pub mod filtering;
pub mod ordering;
