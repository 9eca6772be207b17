//! Missing-field reporting for REDCap projects.
//!
//! This crate classifies, per (record, event, field), which blank data
//! fields are genuinely missing versus hidden by branching logic or an
//! embedding host, degrading to an explicit Indeterminate status whenever
//! a field's display state cannot be established.
//!
//! # Example
//!
//! ```
//! use redcap_mfr::{
//!     DetectorPolicy, Dictionary, EventSchedule, FieldDefinition, FieldType,
//!     MissingDataCodes, MissingFieldPipeline, RecordSnapshot,
//! };
//!
//! let dictionary = Dictionary::new(vec![
//!     FieldDefinition::new("consent", "intake", FieldType::Text),
//!     FieldDefinition::new("dob", "intake", FieldType::Text)
//!         .with_logic("[consent] = '1'"),
//! ])?;
//!
//! let pipeline = MissingFieldPipeline::new(
//!     dictionary,
//!     EventSchedule::single(),
//!     DetectorPolicy::default(),
//! )?;
//!
//! let codes = MissingDataCodes::none();
//! let mut record = RecordSnapshot::new("1001");
//! record.set_raw(0, "consent", "1", &codes);
//! record.set_raw(0, "dob", "", &codes);
//!
//! let report = pipeline.run(&[record]);
//! assert_eq!(report.len(), 1);
//! # Ok::<(), redcap_mfr::DictionaryError>(())
//! ```

// Re-export the public APIs of the internal crates
pub use redcap_mfr_ast as ast;
pub use redcap_mfr_diagnostics as diagnostics;
pub use redcap_mfr_engine as engine;
pub use redcap_mfr_eval as eval;
pub use redcap_mfr_parser as parser;
pub use redcap_mfr_types as types;

// Convenience re-exports
pub use redcap_mfr_diagnostics::{DictionaryError, LogicError, ReasonCode};
pub use redcap_mfr_engine::{
    Choice, DetectorPolicy, Dictionary, Event, EventSchedule, FieldDefinition, FieldStatus,
    FieldType, MissingDataCodes, MissingFieldPipeline, RecordSnapshot, Report, ReportRow,
    Visibility,
};
pub use redcap_mfr_eval::{Evaluator, Ternary};
pub use redcap_mfr_parser::parse_expression;
pub use redcap_mfr_types::Value;
