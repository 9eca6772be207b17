//! The missing-field report

use crate::missing::FieldStatus;
use redcap_mfr_diagnostics::ReasonCode;
use serde::Serialize;

/// One reportable field instance. Only Missing and Indeterminate
/// instances become rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    /// Data access group, empty when the project has none
    pub access_group: String,
    /// Record identifier
    pub record_id: String,
    /// Event name, empty for non-longitudinal projects
    pub event_name: String,
    /// Field name
    pub field_name: String,
    /// Missing or Indeterminate
    pub status: FieldStatus,
    /// Stable reason string for downstream consumers
    pub reason_code: &'static str,
}

impl ReportRow {
    /// Build a row for a reportable status. Present and NotApplicable
    /// instances yield no row.
    pub fn for_status(
        access_group: Option<&str>,
        record_id: &str,
        event_name: &str,
        field_name: &str,
        status: FieldStatus,
    ) -> Option<Self> {
        let reason_code = match status {
            FieldStatus::Missing => ReasonCode::VisibleBlank.as_str(),
            FieldStatus::Indeterminate(reason) => reason.as_str(),
            FieldStatus::Present | FieldStatus::NotApplicable => return None,
        };
        Some(Self {
            access_group: access_group.unwrap_or_default().to_string(),
            record_id: record_id.to_string(),
            event_name: event_name.to_string(),
            field_name: field_name.to_string(),
            status,
            reason_code,
        })
    }
}

/// A completed run's output, rows already in report order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    rows: Vec<ReportRow>,
}

impl Report {
    pub(crate) fn new(rows: Vec<ReportRow>) -> Self {
        Self { rows }
    }

    /// Rows in (access group, record, event, field declaration) order
    pub fn rows(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter()
    }

    /// Number of rows; there is no ceiling
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the report is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Only the rows that could not be classified
    pub fn indeterminate_rows(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows
            .iter()
            .filter(|row| matches!(row.status, FieldStatus::Indeterminate(_)))
    }
}

impl IntoIterator for Report {
    type Item = ReportRow;
    type IntoIter = std::vec::IntoIter<ReportRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}
