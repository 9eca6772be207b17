//! Parsed branching-logic cache.
//!
//! Every distinct logic string is parsed exactly once, single-threaded,
//! before any record is processed. Parse failures are cached too: they are
//! a property of the dictionary, not of any record, and resurface as
//! Indeterminate per field instance.

use log::warn;
use redcap_mfr_ast::{Expression, Spanned};
use redcap_mfr_diagnostics::LogicError;
use redcap_mfr_parser::parse_expression;
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable map from logic string to its parse outcome
#[derive(Debug, Default)]
pub struct AstCache {
    entries: HashMap<String, Result<Arc<Spanned<Expression>>, LogicError>>,
}

impl AstCache {
    /// Parse each distinct logic string once
    pub fn warm<'a>(logic_strings: impl IntoIterator<Item = &'a str>) -> Self {
        let mut entries = HashMap::new();
        for logic in logic_strings {
            entries.entry(logic.to_string()).or_insert_with(|| {
                parse_expression(logic).map(Arc::new).inspect_err(|err| {
                    warn!("branching logic {logic:?} did not parse: {err}");
                })
            });
        }
        Self { entries }
    }

    /// Cached parse outcome for a logic string
    pub fn get(&self, logic: &str) -> Option<&Result<Arc<Spanned<Expression>>, LogicError>> {
        self.entries.get(logic)
    }

    /// Number of distinct cached strings
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warm_deduplicates() {
        let cache = AstCache::warm(["[a] = 1", "[a] = 1", "[b] = 2"]);
        assert_eq!(cache.len(), 2);
        assert!(cache.get("[a] = 1").is_some_and(Result::is_ok));
    }

    #[test]
    fn test_parse_failures_are_cached() {
        let cache = AstCache::warm(["[a] = ="]);
        let entry = cache.get("[a] = =").unwrap();
        assert!(matches!(entry, Err(LogicError::Parse { .. })));
    }

    #[test]
    fn test_unknown_string_is_absent() {
        let cache = AstCache::warm([]);
        assert!(cache.get("[a] = 1").is_none());
        assert!(cache.is_empty());
    }
}
