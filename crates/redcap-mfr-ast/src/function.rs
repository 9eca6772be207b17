//! The function allow-list
//!
//! Only these functions are interpreted. Any other call syntax in a logic
//! string (REDCap's wider calculation library, smart variables, action-tag
//! expressions) is deliberately rejected at parse time so the owning field
//! degrades to an indeterminate classification instead of a guessed one.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Allow-listed branching-logic functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Function {
    /// `datediff(date1, date2, units[, returnSignedValue])`
    DateDiff,
    /// `sum(n1, n2, ...)` — blank operands are ignored
    Sum,
    /// `min(n1, n2, ...)` — blank operands are ignored
    Min,
    /// `max(n1, n2, ...)` — blank operands are ignored
    Max,
    /// `round(number[, decimal_places])`
    Round,
    /// `if(condition, value_if_true, value_if_false)`
    If,
}

impl Function {
    /// Resolve a call name against the allow-list (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "datediff" => Some(Self::DateDiff),
            "sum" => Some(Self::Sum),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "round" => Some(Self::Round),
            "if" => Some(Self::If),
            _ => None,
        }
    }

    /// The canonical lowercase name
    pub const fn name(&self) -> &'static str {
        match self {
            Self::DateDiff => "datediff",
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::Round => "round",
            Self::If => "if",
        }
    }

    /// Minimum argument count
    pub const fn min_arity(&self) -> usize {
        match self {
            Self::DateDiff => 3,
            Self::Sum | Self::Min | Self::Max => 1,
            Self::Round => 1,
            Self::If => 3,
        }
    }

    /// Maximum argument count, `None` for variadic
    pub const fn max_arity(&self) -> Option<usize> {
        match self {
            Self::DateDiff => Some(4),
            Self::Sum | Self::Min | Self::Max => None,
            Self::Round => Some(2),
            Self::If => Some(3),
        }
    }

    /// Check a call-site argument count against the contract
    pub fn accepts_arity(&self, count: usize) -> bool {
        count >= self.min_arity() && self.max_arity().is_none_or(|max| count <= max)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
