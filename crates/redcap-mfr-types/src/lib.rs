//! Runtime value model for REDCap record data
//!
//! REDCap exports every cell as a string. This crate classifies those raw
//! strings into an explicit discriminated value type with defined comparison
//! rules per pair of kinds, instead of relying on implicit coercion.

mod value;

pub use value::{Value, ValueKind};
