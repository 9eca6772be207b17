//! The project data dictionary

use indexmap::IndexMap;
use redcap_mfr_diagnostics::DictionaryError;
use serde::{Deserialize, Serialize};

/// Index of a field in the dictionary arena
pub type FieldIdx = usize;

/// REDCap field types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// Single-line text entry
    Text,
    /// Multi-line notes
    Notes,
    /// Radio button group
    Radio,
    /// Dropdown select
    Dropdown,
    /// Checkbox group (one export column per choice)
    Checkbox,
    /// Calculated field
    Calc,
    /// Yes/No
    YesNo,
    /// True/False
    TrueFalse,
    /// Slider / visual analog scale
    Slider,
    /// File upload
    File,
    /// Section header (display only)
    SectionHeader,
    /// Descriptive text (display only)
    Descriptive,
}

impl FieldType {
    /// Whether instances of this field can carry data at all
    pub const fn is_data_bearing(&self) -> bool {
        !matches!(self, Self::SectionHeader | Self::Descriptive)
    }

    /// Whether this type has a choice list
    pub const fn has_choices(&self) -> bool {
        matches!(self, Self::Radio | Self::Dropdown | Self::Checkbox)
    }
}

/// One entry of a choice-type field's choice list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Stored/exported code
    pub code: String,
    /// Displayed label; may itself embed other fields
    pub label: String,
}

impl Choice {
    /// Create a choice entry
    pub fn new(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
        }
    }
}

/// Action tags that change what a field shows or stores in ways this engine
/// does not interpret. A field carrying one of these cannot be classified.
const UNSUPPORTED_VISIBILITY_TAGS: &[&str] = &[
    "@HIDDEN",
    "@IF",
    "@CALCTEXT",
    "@CALCDATE",
];

/// A single field definition, immutable once loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Variable name, unique within the project
    pub name: String,
    /// Owning instrument (form) name
    pub instrument: String,
    /// Field type
    pub field_type: FieldType,
    /// Displayed label; may embed other fields
    pub label: String,
    /// Raw branching-logic string, if any
    pub branching_logic: Option<String>,
    /// Ordered choice list for choice-type fields
    pub choices: Vec<Choice>,
    /// Declared action tags (`@HIDDEN`, `@READONLY`, ...)
    pub annotations: Vec<String>,
}

impl FieldDefinition {
    /// Create a plain field with no logic, choices or annotations
    pub fn new(
        name: impl Into<String>,
        instrument: impl Into<String>,
        field_type: FieldType,
    ) -> Self {
        Self {
            name: name.into(),
            instrument: instrument.into(),
            field_type,
            label: String::new(),
            branching_logic: None,
            choices: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Set the displayed label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the branching logic
    pub fn with_logic(mut self, logic: impl Into<String>) -> Self {
        self.branching_logic = Some(logic.into());
        self
    }

    /// Set the choice list
    pub fn with_choices(mut self, choices: Vec<Choice>) -> Self {
        self.choices = choices;
        self
    }

    /// Add an action tag
    pub fn with_annotation(mut self, tag: impl Into<String>) -> Self {
        self.annotations.push(tag.into());
        self
    }

    /// Whether this field has a choice for the given code
    pub fn has_choice(&self, code: &str) -> bool {
        self.choices.iter().any(|c| c.code.eq_ignore_ascii_case(code))
    }

    /// The first annotation that makes visibility uninterpretable, if any.
    ///
    /// Matching is by prefix so parameterized forms (`@IF(...)`,
    /// `@HIDDEN-SURVEY`) are caught; inert tags like `@READONLY` pass.
    pub fn unsupported_annotation(&self) -> Option<&str> {
        self.annotations.iter().map(String::as_str).find(|tag| {
            let upper = tag.to_ascii_uppercase();
            UNSUPPORTED_VISIBILITY_TAGS
                .iter()
                .any(|known| upper.starts_with(known))
        })
    }
}

/// The full data dictionary: a flat arena of field definitions in
/// declaration order, with a name index.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    fields: Vec<FieldDefinition>,
    by_name: IndexMap<String, FieldIdx>,
}

impl Dictionary {
    /// Build and validate a dictionary from field definitions in
    /// declaration order.
    ///
    /// Structural defects are fatal: they invalidate every downstream
    /// computation, so they surface here, before any record is processed.
    pub fn new(fields: Vec<FieldDefinition>) -> Result<Self, DictionaryError> {
        let mut by_name = IndexMap::with_capacity(fields.len());

        for (idx, field) in fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(DictionaryError::malformed(format!(
                    "field at position {idx} has an empty name"
                )));
            }
            if field.instrument.is_empty() {
                return Err(DictionaryError::malformed(format!(
                    "field '{}' does not belong to an instrument",
                    field.name
                )));
            }
            if field.field_type.has_choices() && field.choices.is_empty() {
                return Err(DictionaryError::malformed(format!(
                    "choice field '{}' has no choices",
                    field.name
                )));
            }
            if by_name.insert(field.name.clone(), idx).is_some() {
                return Err(DictionaryError::malformed(format!(
                    "duplicate field name '{}'",
                    field.name
                )));
            }
        }

        Ok(Self { fields, by_name })
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the dictionary is empty
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field by arena index
    pub fn field(&self, idx: FieldIdx) -> &FieldDefinition {
        &self.fields[idx]
    }

    /// Look up a field index by name
    pub fn index_of(&self, name: &str) -> Option<FieldIdx> {
        self.by_name.get(name).copied()
    }

    /// Look up a field by name
    pub fn by_name(&self, name: &str) -> Option<&FieldDefinition> {
        self.index_of(name).map(|idx| self.field(idx))
    }

    /// Iterate fields in declaration order with their indices
    pub fn iter(&self) -> impl Iterator<Item = (FieldIdx, &FieldDefinition)> {
        self.fields.iter().enumerate()
    }

    /// Whether an instrument of this name exists
    pub fn has_instrument(&self, instrument: &str) -> bool {
        self.fields.iter().any(|f| f.instrument == instrument)
    }

    /// Every distinct branching-logic string, for the cache warm-up
    pub fn distinct_logic_strings(&self) -> Vec<&str> {
        let mut seen = indexmap::IndexSet::new();
        for field in &self.fields {
            if let Some(logic) = &field.branching_logic {
                seen.insert(logic.as_str());
            }
        }
        seen.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str) -> FieldDefinition {
        FieldDefinition::new(name, "baseline", FieldType::Text)
    }

    #[test]
    fn test_duplicate_names_are_fatal() {
        let err = Dictionary::new(vec![field("a"), field("a")]).unwrap_err();
        assert!(matches!(err, DictionaryError::Malformed { .. }));
    }

    #[test]
    fn test_missing_instrument_is_fatal() {
        let orphan = FieldDefinition::new("a", "", FieldType::Text);
        let err = Dictionary::new(vec![orphan]).unwrap_err();
        assert!(err.to_string().contains("instrument"));
    }

    #[test]
    fn test_choice_field_without_choices_is_fatal() {
        let bare = FieldDefinition::new("r", "baseline", FieldType::Radio);
        let err = Dictionary::new(vec![bare]).unwrap_err();
        assert!(err.to_string().contains("choices"));
    }

    #[test]
    fn test_lookup_and_order() {
        let dict = Dictionary::new(vec![field("a"), field("b")]).unwrap();
        assert_eq!(dict.index_of("b"), Some(1));
        assert_eq!(dict.field(0).name, "a");
        assert!(dict.has_instrument("baseline"));
        assert!(!dict.has_instrument("followup"));
    }

    #[test]
    fn test_unsupported_annotations() {
        let hidden = field("a").with_annotation("@HIDDEN-SURVEY");
        assert_eq!(hidden.unsupported_annotation(), Some("@HIDDEN-SURVEY"));

        let conditional = field("b").with_annotation("@IF([a]=1, @HIDDEN, '')");
        assert!(conditional.unsupported_annotation().is_some());

        let readonly = field("c").with_annotation("@READONLY");
        assert_eq!(readonly.unsupported_annotation(), None);
    }

    #[test]
    fn test_distinct_logic_strings() {
        let dict = Dictionary::new(vec![
            field("a").with_logic("[x] = 1"),
            field("b").with_logic("[x] = 1"),
            field("c").with_logic("[y] = 2"),
            field("d"),
        ])
        .unwrap();
        assert_eq!(dict.distinct_logic_strings(), vec!["[x] = 1", "[y] = 2"]);
    }
}
