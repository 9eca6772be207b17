//! Record snapshots and missing-data-code normalization

use crate::schedule::EventIdx;
use redcap_mfr_types::Value;
use std::collections::{HashMap, HashSet};

/// Project-level missing-data codes (`NA`, `UNK`, ...). A stored value
/// equal to one of these codes reads back as blank.
#[derive(Debug, Clone, Default)]
pub struct MissingDataCodes {
    codes: HashSet<String>,
}

impl MissingDataCodes {
    /// No codes configured
    pub fn none() -> Self {
        Self::default()
    }

    /// Parse the project-info encoding: `CODE, label | CODE, label | ...`
    pub fn parse(raw: &str) -> Self {
        let codes = raw
            .split('|')
            .filter_map(|entry| entry.split(',').next())
            .map(|code| code.trim().to_ascii_uppercase())
            .filter(|code| !code.is_empty())
            .collect();
        Self { codes }
    }

    /// Whether a raw string is a configured missing-data code
    pub fn matches(&self, raw: &str) -> bool {
        !self.codes.is_empty() && self.codes.contains(&raw.trim().to_ascii_uppercase())
    }
}

/// One record's exported data across all events.
///
/// Values are keyed by (event index, export field name); checkbox choices
/// live under their `field___code` export columns. Raw strings are
/// classified on insertion, with missing-data codes normalized to blank.
#[derive(Debug, Clone)]
pub struct RecordSnapshot {
    /// Record identifier
    pub record_id: String,
    /// Data access group, if the project uses them
    pub access_group: Option<String>,
    /// Per-event export column values
    values: HashMap<EventIdx, HashMap<String, Value>>,
}

impl RecordSnapshot {
    /// Create an empty snapshot
    pub fn new(record_id: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            access_group: None,
            values: HashMap::new(),
        }
    }

    /// Set the data access group
    pub fn with_access_group(mut self, group: impl Into<String>) -> Self {
        self.access_group = Some(group.into());
        self
    }

    /// Store a raw exported string, classifying it on the way in
    pub fn set_raw(
        &mut self,
        event: EventIdx,
        export_name: impl Into<String>,
        raw: &str,
        codes: &MissingDataCodes,
    ) {
        let value = if codes.matches(raw) {
            Value::Blank
        } else {
            Value::from_raw(raw)
        };
        self.set(event, export_name, value);
    }

    /// Store an already-classified value
    pub fn set(&mut self, event: EventIdx, export_name: impl Into<String>, value: Value) {
        self.values
            .entry(event)
            .or_default()
            .insert(export_name.into(), value);
    }

    /// Read a value; absent entries are blank
    pub fn value(&self, event: EventIdx, export_name: &str) -> &Value {
        self.values
            .get(&event)
            .and_then(|columns| columns.get(export_name))
            .unwrap_or(&Value::Blank)
    }

    /// Whether the record has an explicit entry for a column at an event
    pub fn has_entry(&self, event: EventIdx, export_name: &str) -> bool {
        self.values
            .get(&event)
            .is_some_and(|columns| columns.contains_key(export_name))
    }

    /// Whether any column other than `except` (and its checkbox choice
    /// columns) carries a non-blank value at the event. This is the
    /// sibling-activity gate for the missing-value detector.
    pub fn event_has_data(&self, event: EventIdx, except: &str) -> bool {
        let checkbox_prefix = format!("{except}___");
        self.values.get(&event).is_some_and(|columns| {
            columns.iter().any(|(name, value)| {
                name != except && !name.starts_with(&checkbox_prefix) && !value.is_blank()
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    #[test]
    fn test_missing_data_codes_parse() {
        let codes = MissingDataCodes::parse("NA, Not applicable | UNK, Unknown");
        assert!(codes.matches("NA"));
        assert!(codes.matches("unk"));
        assert!(!codes.matches("5"));
        assert!(!codes.matches(""));
    }

    #[test]
    fn test_no_codes_matches_nothing() {
        assert!(!MissingDataCodes::none().matches("NA"));
    }

    #[test]
    fn test_raw_classification_and_normalization() {
        let codes = MissingDataCodes::parse("NA, Not applicable");
        let mut record = RecordSnapshot::new("1001");
        record.set_raw(0, "age", "42", &codes);
        record.set_raw(0, "status", "NA", &codes);
        record.set_raw(0, "note", "  ", &codes);

        assert_eq!(record.value(0, "age"), &Value::Number(Decimal::from(42)));
        assert_eq!(record.value(0, "status"), &Value::Blank);
        assert_eq!(record.value(0, "note"), &Value::Blank);
        // absent entries read as blank too
        assert_eq!(record.value(1, "age"), &Value::Blank);
        assert!(!record.has_entry(1, "age"));
    }

    #[test]
    fn test_event_has_data_excludes_self_and_own_checkboxes() {
        let codes = MissingDataCodes::none();
        let mut record = RecordSnapshot::new("1001");
        record.set_raw(0, "race___1", "1", &codes);
        record.set_raw(0, "race___5", "0", &codes);

        // the only activity is the field's own checkbox columns
        assert!(!record.event_has_data(0, "race"));

        record.set_raw(0, "age", "42", &codes);
        assert!(record.event_has_data(0, "race"));
        // activity on another event does not count
        assert!(!record.event_has_data(1, "race"));
    }
}
