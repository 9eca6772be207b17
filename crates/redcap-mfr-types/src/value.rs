//! The discriminated runtime value and its cross-kind semantics

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A typed field value bound in a record snapshot.
///
/// Classification follows the REDCap export convention: a cell that parses
/// as a number is a number, a cell that parses as an ISO date or datetime is
/// temporal, the empty string is blank, everything else is text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Value {
    /// No data collected
    Blank,
    /// Numeric value (arbitrary precision)
    Number(Decimal),
    /// Free-text value (never empty; empty classifies as Blank)
    Text(String),
    /// Date or datetime value
    DateTime(NaiveDateTime),
}

/// The kind of a [`Value`], for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    Blank,
    Number,
    Text,
    DateTime,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blank => f.write_str("blank"),
            Self::Number => f.write_str("number"),
            Self::Text => f.write_str("text"),
            Self::DateTime => f.write_str("datetime"),
        }
    }
}

impl Value {
    /// Classify a raw exported cell
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Blank;
        }
        if let Ok(n) = Decimal::from_str(trimmed) {
            return Self::Number(n);
        }
        if let Some(dt) = parse_datetime(trimmed) {
            return Self::DateTime(dt);
        }
        Self::Text(trimmed.to_string())
    }

    /// Create a numeric value
    pub fn number(n: impl Into<Decimal>) -> Self {
        Self::Number(n.into())
    }

    /// Create a text value, classifying empty text as blank
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() { Self::Blank } else { Self::Text(s) }
    }

    /// The kind of this value
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Blank => ValueKind::Blank,
            Self::Number(_) => ValueKind::Number,
            Self::Text(_) => ValueKind::Text,
            Self::DateTime(_) => ValueKind::DateTime,
        }
    }

    /// Check if this value is blank
    pub const fn is_blank(&self) -> bool {
        matches!(self, Self::Blank)
    }

    /// Truthiness in boolean position: blank and zero are false,
    /// everything else is true
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Blank => false,
            Self::Number(n) => !n.is_zero(),
            Self::Text(s) => !s.is_empty(),
            Self::DateTime(_) => true,
        }
    }

    /// Numeric view: numbers directly, text when it parses as a number
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => Decimal::from_str(s.trim()).ok(),
            _ => None,
        }
    }

    /// Temporal view: datetimes directly, text when it parses as a date
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::DateTime(dt) => Some(*dt),
            Self::Text(s) => parse_datetime(s.trim()),
            _ => None,
        }
    }

    /// Loose cross-kind equality.
    ///
    /// Numbers compare numerically with numeric-parseable text, datetimes
    /// chronologically with date-parseable text; otherwise differing kinds
    /// are simply not equal. Blanks are only equal to blanks — the
    /// neither-equal-nor-unequal convention for blanks against non-blanks
    /// is the evaluator's concern, since it depends on the operand syntax.
    pub fn loose_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Blank, Self::Blank) => true,
            (Self::Blank, _) | (_, Self::Blank) => false,
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => {
                if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
                    return a == b;
                }
                if let (Some(a), Some(b)) = (self.as_datetime(), other.as_datetime()) {
                    return a == b;
                }
                false
            }
        }
    }

    /// Ordering for `<`, `<=`, `>`, `>=`.
    ///
    /// `None` means the pairing is not orderable (a type mismatch). Blanks
    /// are never orderable against anything.
    pub fn try_ordering(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Blank, _) | (_, Self::Blank) => None,
            (Self::Number(a), Self::Number(b)) => Some(a.cmp(b)),
            (Self::DateTime(a), Self::DateTime(b)) => Some(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => {
                // Prefer numeric then chronological order when both sides
                // carry parseable content, else lexicographic
                if let (Some(x), Some(y)) = (self.as_number(), other.as_number()) {
                    Some(x.cmp(&y))
                } else if let (Some(x), Some(y)) = (self.as_datetime(), other.as_datetime()) {
                    Some(x.cmp(&y))
                } else {
                    Some(a.cmp(b))
                }
            }
            _ => {
                if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
                    return Some(a.cmp(&b));
                }
                if let (Some(a), Some(b)) = (self.as_datetime(), other.as_datetime()) {
                    return Some(a.cmp(&b));
                }
                None
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blank => Ok(()),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// Parse the date and datetime shapes REDCap exports
fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default())
}
