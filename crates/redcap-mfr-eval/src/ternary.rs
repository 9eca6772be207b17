//! Three-valued logic result

use redcap_mfr_diagnostics::LogicError;

/// The result of evaluating a branching-logic expression.
///
/// Truth table for `and` (symmetric, unknown carries its error):
///
/// | A       | B       | A and B |
/// |---------|---------|---------|
/// | true    | true    | true    |
/// | false   | _       | false   |
/// | _       | false   | false   |
/// | true    | unknown | unknown |
/// | unknown | unknown | unknown |
///
/// and dually for `or` (true dominates).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ternary {
    /// The logic is satisfied
    True,
    /// The logic is not satisfied
    False,
    /// The logic could not be evaluated safely
    Unknown(LogicError),
}

impl Ternary {
    /// Lift a definite boolean
    pub fn from_bool(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }

    /// Check for a definite true
    pub fn is_true(&self) -> bool {
        matches!(self, Self::True)
    }

    /// Check for a definite false
    pub fn is_false(&self) -> bool {
        matches!(self, Self::False)
    }

    /// Kleene conjunction; `other` is only evaluated when needed
    pub fn and_with(self, other: impl FnOnce() -> Self) -> Self {
        match self {
            Self::False => Self::False,
            Self::True => other(),
            Self::Unknown(err) => match other() {
                // false absorbs the unknown
                Self::False => Self::False,
                _ => Self::Unknown(err),
            },
        }
    }

    /// Kleene disjunction; `other` is only evaluated when needed
    pub fn or_with(self, other: impl FnOnce() -> Self) -> Self {
        match self {
            Self::True => Self::True,
            Self::False => other(),
            Self::Unknown(err) => match other() {
                // true absorbs the unknown
                Self::True => Self::True,
                _ => Self::Unknown(err),
            },
        }
    }

    /// Kleene negation
    pub fn negate(self) -> Self {
        match self {
            Self::True => Self::False,
            Self::False => Self::True,
            unknown => unknown,
        }
    }
}

impl From<Result<bool, LogicError>> for Ternary {
    fn from(result: Result<bool, LogicError>) -> Self {
        match result {
            Ok(b) => Self::from_bool(b),
            Err(err) => Self::Unknown(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unknown() -> Ternary {
        Ternary::Unknown(LogicError::type_mismatch("test"))
    }

    #[test]
    fn test_kleene_and() {
        assert!(Ternary::True.and_with(|| Ternary::True).is_true());
        assert!(Ternary::True.and_with(|| Ternary::False).is_false());
        // false dominates unknown on either side
        assert!(Ternary::False.and_with(unknown).is_false());
        assert!(unknown().and_with(|| Ternary::False).is_false());
        assert!(matches!(
            unknown().and_with(|| Ternary::True),
            Ternary::Unknown(_)
        ));
    }

    #[test]
    fn test_kleene_or() {
        assert!(Ternary::False.or_with(|| Ternary::True).is_true());
        assert!(Ternary::False.or_with(|| Ternary::False).is_false());
        // true dominates unknown on either side
        assert!(Ternary::True.or_with(unknown).is_true());
        assert!(unknown().or_with(|| Ternary::True).is_true());
        assert!(matches!(
            unknown().or_with(|| Ternary::False),
            Ternary::Unknown(_)
        ));
    }

    #[test]
    fn test_negate() {
        assert!(Ternary::True.negate().is_false());
        assert!(Ternary::False.negate().is_true());
        assert!(matches!(unknown().negate(), Ternary::Unknown(_)));
    }
}
