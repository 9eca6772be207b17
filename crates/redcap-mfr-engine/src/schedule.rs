//! Longitudinal event schedule and instrument designations

use crate::dictionary::Dictionary;
use indexmap::IndexMap;
use redcap_mfr_diagnostics::DictionaryError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Index of an event in chronological order
pub type EventIdx = usize;

/// A named data-collection event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event name (e.g. `baseline_arm_1`)
    pub name: String,
    /// Arm the event belongs to
    pub arm: String,
}

impl Event {
    /// Create an event
    pub fn new(name: impl Into<String>, arm: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arm: arm.into(),
        }
    }
}

/// The ordered event schedule plus instrument-event designations.
///
/// Events are chronological in declaration order. A field instance exists
/// for (event, field) only when the field's instrument is designated for
/// that event. Non-longitudinal projects use [`EventSchedule::single`],
/// one implicit event carrying every instrument.
#[derive(Debug, Clone)]
pub struct EventSchedule {
    events: Vec<Event>,
    by_name: IndexMap<String, EventIdx>,
    /// (event index, instrument) designations
    designations: HashSet<(EventIdx, String)>,
    /// True for the implicit single-event schedule, where every
    /// instrument is designated everywhere
    implicit: bool,
}

impl EventSchedule {
    /// Build a schedule from events in chronological order and
    /// (event name, instrument name) designations.
    pub fn new(
        events: Vec<Event>,
        designations: &[(&str, &str)],
        dictionary: &Dictionary,
    ) -> Result<Self, DictionaryError> {
        let mut by_name = IndexMap::with_capacity(events.len());
        for (idx, event) in events.iter().enumerate() {
            if by_name.insert(event.name.clone(), idx).is_some() {
                return Err(DictionaryError::malformed(format!(
                    "duplicate event name '{}'",
                    event.name
                )));
            }
        }

        let mut resolved = HashSet::with_capacity(designations.len());
        for (event_name, instrument) in designations {
            let Some(&idx) = by_name.get(*event_name) else {
                return Err(DictionaryError::malformed(format!(
                    "instrument mapping names unknown event '{event_name}'"
                )));
            };
            if !dictionary.has_instrument(instrument) {
                return Err(DictionaryError::malformed(format!(
                    "instrument mapping names unknown instrument '{instrument}'"
                )));
            }
            resolved.insert((idx, (*instrument).to_string()));
        }

        Ok(Self {
            events,
            by_name,
            designations: resolved,
            implicit: false,
        })
    }

    /// The implicit schedule for non-longitudinal projects: one unnamed
    /// event with every instrument designated.
    pub fn single() -> Self {
        let event = Event::new("", "");
        Self {
            events: vec![event],
            by_name: IndexMap::new(),
            designations: HashSet::new(),
            implicit: true,
        }
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the schedule has no events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Event by index
    pub fn event(&self, idx: EventIdx) -> &Event {
        &self.events[idx]
    }

    /// Look up an event index by name
    pub fn index_of(&self, name: &str) -> Option<EventIdx> {
        if self.implicit && name.is_empty() {
            return Some(0);
        }
        self.by_name.get(name).copied()
    }

    /// Iterate events chronologically with their indices
    pub fn iter(&self) -> impl Iterator<Item = (EventIdx, &Event)> {
        self.events.iter().enumerate()
    }

    /// Whether an instrument is collected at an event
    pub fn is_designated(&self, event: EventIdx, instrument: &str) -> bool {
        self.implicit || self.designations.contains(&(event, instrument.to_string()))
    }
}
