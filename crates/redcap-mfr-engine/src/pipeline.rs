//! The end-to-end missing-field pipeline.
//!
//! Construction validates the project structure (fatal errors stop here),
//! builds the embedding graph and warms the AST cache. A run fans records
//! out across a thread pool; all shared state is read-only and the output
//! is sorted afterwards, so scheduling never shows in the result.

use crate::cache::AstCache;
use crate::dictionary::Dictionary;
use crate::embedding::EmbeddingGraph;
use crate::missing::{DetectorPolicy, MissingValueDetector};
use crate::record::RecordSnapshot;
use crate::report::{Report, ReportRow};
use crate::schedule::EventSchedule;
use crate::visibility::VisibilityResolver;
use log::{debug, info};
use rayon::prelude::*;
use redcap_mfr_diagnostics::DictionaryError;

/// A prepared project, ready to process record batches
#[derive(Debug)]
pub struct MissingFieldPipeline {
    dictionary: Dictionary,
    schedule: EventSchedule,
    graph: EmbeddingGraph,
    cache: AstCache,
    detector: MissingValueDetector,
}

impl MissingFieldPipeline {
    /// Validate the project and prepare the shared read-only structures.
    ///
    /// Everything fatal surfaces here: a constructed pipeline always
    /// completes its runs.
    pub fn new(
        dictionary: Dictionary,
        schedule: EventSchedule,
        policy: DetectorPolicy,
    ) -> Result<Self, DictionaryError> {
        let graph = EmbeddingGraph::build(&dictionary)?;
        let cache = AstCache::warm(dictionary.distinct_logic_strings());
        info!(
            "pipeline ready: {} fields, {} events, {} distinct logic strings",
            dictionary.len(),
            schedule.len(),
            cache.len()
        );
        Ok(Self {
            dictionary,
            schedule,
            graph,
            cache,
            detector: MissingValueDetector::new(policy),
        })
    }

    /// The validated dictionary
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// The event schedule
    pub fn schedule(&self) -> &EventSchedule {
        &self.schedule
    }

    /// Classify every field instance of every record and assemble the
    /// report. Rows come back sorted by (access group, record id, event
    /// index, field declaration index) regardless of scheduling.
    pub fn run(&self, records: &[RecordSnapshot]) -> Report {
        debug!("processing {} records", records.len());

        let mut keyed: Vec<(SortKey, ReportRow)> = records
            .par_iter()
            .flat_map_iter(|record| self.record_rows(record))
            .collect();

        keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
        Report::new(keyed.into_iter().map(|(_, row)| row).collect())
    }

    fn record_rows<'a>(
        &'a self,
        record: &'a RecordSnapshot,
    ) -> impl Iterator<Item = (SortKey, ReportRow)> + 'a {
        let resolver = VisibilityResolver::new(&self.dictionary, &self.graph, &self.cache);

        self.schedule.iter().flat_map(move |(event_idx, event)| {
            let visibility = resolver.resolve(&self.schedule, record, event_idx);

            self.dictionary.iter().filter_map(move |(field_idx, field)| {
                if !self.schedule.is_designated(event_idx, &field.instrument) {
                    return None;
                }
                let status = self.detector.classify(
                    &self.dictionary,
                    field_idx,
                    visibility[field_idx],
                    record,
                    event_idx,
                )?;
                let row = ReportRow::for_status(
                    record.access_group.as_deref(),
                    &record.record_id,
                    &event.name,
                    &field.name,
                    status,
                )?;
                let key = SortKey {
                    access_group: row.access_group.clone(),
                    record_id: row.record_id.clone(),
                    event_idx,
                    field_idx,
                };
                Some((key, row))
            })
        })
    }
}

#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct SortKey {
    access_group: String,
    record_id: String,
    event_idx: usize,
    field_idx: usize,
}
