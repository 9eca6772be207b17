//! Project model, visibility resolution and missing-field detection.
//!
//! This crate owns everything above the expression engine: the data
//! dictionary and event schedule, record snapshots, the field-embedding
//! dependency graph, per-instance visibility, the missing-value detector
//! and the parallel report pipeline.

pub mod cache;
pub mod dictionary;
pub mod embedding;
pub mod missing;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod schedule;
pub mod visibility;

pub use cache::AstCache;
pub use dictionary::{Choice, Dictionary, FieldDefinition, FieldIdx, FieldType};
pub use embedding::EmbeddingGraph;
pub use missing::{DetectorPolicy, FieldStatus, MissingValueDetector};
pub use pipeline::MissingFieldPipeline;
pub use record::{MissingDataCodes, RecordSnapshot};
pub use report::{Report, ReportRow};
pub use schedule::{Event, EventIdx, EventSchedule};
pub use visibility::{RecordBindings, Visibility, VisibilityResolver};
