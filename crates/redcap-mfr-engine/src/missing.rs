//! Missing-value classification.
//!
//! Runs after visibility: a blank field only counts as missing when it is
//! actually shown, and (under the default policy) when the record shows
//! any other activity at the same event.

use crate::dictionary::{Dictionary, FieldDefinition, FieldIdx, FieldType};
use crate::record::RecordSnapshot;
use crate::schedule::EventIdx;
use crate::visibility::Visibility;
use redcap_mfr_diagnostics::ReasonCode;
use serde::{Deserialize, Serialize};

/// Classification of one field instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldStatus {
    /// Hidden, not collected at this event, or gated off
    NotApplicable,
    /// Visible and carries data
    Present,
    /// Visible, blank, and expected to carry data
    Missing,
    /// Visibility could not be determined
    Indeterminate(ReasonCode),
}

/// Detector knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorPolicy {
    /// Only flag a blank field as missing when some other field at the
    /// same event carries data. Off, every visible blank is missing.
    pub require_sibling_activity: bool,
}

impl Default for DetectorPolicy {
    fn default() -> Self {
        Self {
            require_sibling_activity: true,
        }
    }
}

/// Classifies field instances against resolved visibility
#[derive(Debug, Clone, Copy)]
pub struct MissingValueDetector {
    policy: DetectorPolicy,
}

impl MissingValueDetector {
    /// Create a detector with the given policy
    pub fn new(policy: DetectorPolicy) -> Self {
        Self { policy }
    }

    /// Classify one field instance. Display-only fields are never
    /// classified and come back `None`.
    pub fn classify(
        &self,
        dictionary: &Dictionary,
        field_idx: FieldIdx,
        visibility: Visibility,
        record: &RecordSnapshot,
        event: EventIdx,
    ) -> Option<FieldStatus> {
        let field = dictionary.field(field_idx);
        if !field.field_type.is_data_bearing() {
            return None;
        }

        Some(match visibility {
            Visibility::Indeterminate(reason) => FieldStatus::Indeterminate(reason),
            Visibility::Hidden => FieldStatus::NotApplicable,
            Visibility::Visible => {
                if has_value(field, record, event) {
                    FieldStatus::Present
                } else if !self.policy.require_sibling_activity
                    || record.event_has_data(event, &field.name)
                {
                    FieldStatus::Missing
                } else {
                    FieldStatus::NotApplicable
                }
            }
        })
    }
}

/// Whether the instance carries data. A checkbox is present when any of
/// its choices is checked.
fn has_value(field: &FieldDefinition, record: &RecordSnapshot, event: EventIdx) -> bool {
    if field.field_type == FieldType::Checkbox {
        return field.choices.iter().any(|choice| {
            let export_name = format!("{}___{}", field.name, choice.code.to_lowercase());
            record.value(event, &export_name).is_truthy()
        });
    }
    !record.value(event, &field.name).is_blank()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::Choice;
    use crate::record::MissingDataCodes;
    use pretty_assertions::assert_eq;

    fn dict() -> Dictionary {
        Dictionary::new(vec![
            FieldDefinition::new("age", "baseline", FieldType::Text),
            FieldDefinition::new("race", "baseline", FieldType::Checkbox)
                .with_choices(vec![Choice::new("1", "White"), Choice::new("5", "Other")]),
            FieldDefinition::new("header", "baseline", FieldType::SectionHeader),
        ])
        .unwrap()
    }

    fn record(pairs: &[(&str, &str)]) -> RecordSnapshot {
        let codes = MissingDataCodes::none();
        let mut r = RecordSnapshot::new("1001");
        for (name, raw) in pairs {
            r.set_raw(0, *name, raw, &codes);
        }
        r
    }

    fn detector() -> MissingValueDetector {
        MissingValueDetector::new(DetectorPolicy::default())
    }

    #[test]
    fn test_visible_blank_with_activity_is_missing() {
        let d = dict();
        let r = record(&[("age", ""), ("other", "1")]);
        let status = detector().classify(&d, 0, Visibility::Visible, &r, 0);
        assert_eq!(status, Some(FieldStatus::Missing));
    }

    #[test]
    fn test_visible_blank_without_activity_is_not_applicable() {
        let d = dict();
        let r = record(&[("age", "")]);
        let status = detector().classify(&d, 0, Visibility::Visible, &r, 0);
        assert_eq!(status, Some(FieldStatus::NotApplicable));
    }

    #[test]
    fn test_gate_off_flags_every_visible_blank() {
        let d = dict();
        let lenient = MissingValueDetector::new(DetectorPolicy {
            require_sibling_activity: false,
        });
        let status = lenient.classify(&d, 0, Visibility::Visible, &record(&[]), 0);
        assert_eq!(status, Some(FieldStatus::Missing));
    }

    #[test]
    fn test_present_and_hidden() {
        let d = dict();
        let r = record(&[("age", "42")]);
        assert_eq!(
            detector().classify(&d, 0, Visibility::Visible, &r, 0),
            Some(FieldStatus::Present)
        );
        assert_eq!(
            detector().classify(&d, 0, Visibility::Hidden, &r, 0),
            Some(FieldStatus::NotApplicable)
        );
    }

    #[test]
    fn test_indeterminate_carries_reason() {
        let d = dict();
        let vis = Visibility::Indeterminate(ReasonCode::UnsupportedAnnotation);
        let status = detector().classify(&d, 0, vis, &record(&[]), 0);
        assert_eq!(
            status,
            Some(FieldStatus::Indeterminate(ReasonCode::UnsupportedAnnotation))
        );
    }

    #[test]
    fn test_checkbox_presence_is_any_checked_choice() {
        let d = dict();
        let checked = record(&[("race___5", "1"), ("other", "x")]);
        assert_eq!(
            detector().classify(&d, 1, Visibility::Visible, &checked, 0),
            Some(FieldStatus::Present)
        );

        let unchecked = record(&[("race___1", "0"), ("race___5", "0"), ("other", "x")]);
        assert_eq!(
            detector().classify(&d, 1, Visibility::Visible, &unchecked, 0),
            Some(FieldStatus::Missing)
        );
    }

    #[test]
    fn test_display_only_fields_are_skipped() {
        let d = dict();
        assert_eq!(
            detector().classify(&d, 2, Visibility::Visible, &record(&[]), 0),
            None
        );
    }
}
