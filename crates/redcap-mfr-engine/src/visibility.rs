//! Per-instance visibility resolution.
//!
//! Visibility is computed per (record, event) over the dictionary in
//! embedding order, so every host is resolved before the fields embedded
//! in it.

use crate::cache::AstCache;
use crate::dictionary::{Dictionary, FieldIdx, FieldType};
use crate::embedding::EmbeddingGraph;
use crate::record::RecordSnapshot;
use crate::schedule::{EventIdx, EventSchedule};
use redcap_mfr_ast::FieldRef;
use redcap_mfr_diagnostics::{LogicError, ReasonCode};
use redcap_mfr_eval::{Bindings, Evaluator, Ternary};
use redcap_mfr_types::Value;
use serde::{Deserialize, Serialize};

/// The resolved display state of one field instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    /// The field is shown
    Visible,
    /// Branching logic (or a hidden host) suppresses the field
    Hidden,
    /// The state cannot be determined; never coerced to either side
    Indeterminate(ReasonCode),
}

/// Value resolution for one (record, event) pair.
///
/// Event qualifiers resolve against the schedule; references to events
/// after the current one are forward temporal references and unresolvable.
pub struct RecordBindings<'a> {
    dictionary: &'a Dictionary,
    schedule: &'a EventSchedule,
    record: &'a RecordSnapshot,
    current_event: EventIdx,
}

impl<'a> RecordBindings<'a> {
    /// Bind a record at an event
    pub fn new(
        dictionary: &'a Dictionary,
        schedule: &'a EventSchedule,
        record: &'a RecordSnapshot,
        current_event: EventIdx,
    ) -> Self {
        Self {
            dictionary,
            schedule,
            record,
            current_event,
        }
    }
}

impl Bindings for RecordBindings<'_> {
    fn field_value(&self, event: Option<&str>, field_ref: &FieldRef) -> Result<Value, LogicError> {
        let field = self
            .dictionary
            .by_name(&field_ref.field)
            .ok_or_else(|| LogicError::unresolved_reference(&field_ref.field))?;

        let event_idx = match event {
            Some(name) => {
                let idx = self
                    .schedule
                    .index_of(name)
                    .ok_or_else(|| LogicError::unresolved_reference(name))?;
                if idx > self.current_event {
                    // forward temporal reference
                    return Err(LogicError::unresolved_reference(format!(
                        "[{name}][{}]",
                        field_ref.field
                    )));
                }
                idx
            }
            None => self.current_event,
        };

        if !self.schedule.is_designated(event_idx, &field.instrument) {
            return Ok(Value::Blank);
        }

        if let Some(code) = &field_ref.choice {
            if field.field_type != FieldType::Checkbox || !field.has_choice(code) {
                return Err(LogicError::unresolved_reference(format!(
                    "[{}({code})]",
                    field_ref.field
                )));
            }
            let export_name = field_ref.export_name();
            // an unticked choice exports as 0 even when the column is absent
            if !self.record.has_entry(event_idx, &export_name) {
                return Ok(Value::Number(rust_decimal::Decimal::ZERO));
            }
            return Ok(self.record.value(event_idx, &export_name).clone());
        }

        Ok(self.record.value(event_idx, &field_ref.field).clone())
    }
}

/// Resolves visibility for every field of one (record, event) pair
pub struct VisibilityResolver<'a> {
    dictionary: &'a Dictionary,
    graph: &'a EmbeddingGraph,
    cache: &'a AstCache,
    evaluator: Evaluator,
}

impl<'a> VisibilityResolver<'a> {
    /// Create a resolver over prepared project structures
    pub fn new(dictionary: &'a Dictionary, graph: &'a EmbeddingGraph, cache: &'a AstCache) -> Self {
        Self {
            dictionary,
            graph,
            cache,
            evaluator: Evaluator::new(),
        }
    }

    /// Visibility of every field, indexed by dictionary position
    pub fn resolve(
        &self,
        schedule: &EventSchedule,
        record: &RecordSnapshot,
        event: EventIdx,
    ) -> Vec<Visibility> {
        let bindings = RecordBindings::new(self.dictionary, schedule, record, event);
        let mut resolved = vec![Visibility::Visible; self.dictionary.len()];

        for &idx in self.graph.topo_order() {
            let own = self.own_visibility(idx, &bindings);
            resolved[idx] = self.compose_with_hosts(idx, own, &resolved);
        }
        resolved
    }

    /// A field's visibility from its own annotations and logic alone
    fn own_visibility(&self, idx: FieldIdx, bindings: &RecordBindings<'_>) -> Visibility {
        let field = self.dictionary.field(idx);

        if field.unsupported_annotation().is_some() {
            return Visibility::Indeterminate(ReasonCode::UnsupportedAnnotation);
        }

        let Some(logic) = &field.branching_logic else {
            return Visibility::Visible;
        };
        let ast = match self.cache.get(logic) {
            Some(Ok(ast)) => ast,
            Some(Err(err)) => return Visibility::Indeterminate(err.reason_code()),
            // every logic string was warmed; an absent entry means the
            // cache and dictionary disagree, which we surface rather
            // than guess at
            None => return Visibility::Indeterminate(ReasonCode::ParseError),
        };

        match self.evaluator.evaluate(ast, bindings) {
            Ternary::True => Visibility::Visible,
            Ternary::False => Visibility::Hidden,
            Ternary::Unknown(err) => Visibility::Indeterminate(err.reason_code()),
        }
    }

    /// An embedded field inherits suppression from its hosts: any hidden
    /// host hides it, any indeterminate host leaves it indeterminate.
    fn compose_with_hosts(
        &self,
        idx: FieldIdx,
        own: Visibility,
        resolved: &[Visibility],
    ) -> Visibility {
        let mut pending: Option<ReasonCode> = None;
        for &host in self.graph.hosts_of(idx) {
            match resolved[host] {
                Visibility::Hidden => return Visibility::Hidden,
                Visibility::Indeterminate(reason) if pending.is_none() => {
                    pending = Some(reason);
                }
                _ => {}
            }
        }
        match pending {
            Some(reason) => Visibility::Indeterminate(reason),
            None => own,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{Choice, FieldDefinition};
    use crate::record::MissingDataCodes;
    use pretty_assertions::assert_eq;

    fn project(fields: Vec<FieldDefinition>) -> (Dictionary, EmbeddingGraph, AstCache) {
        let dict = Dictionary::new(fields).unwrap();
        let graph = EmbeddingGraph::build(&dict).unwrap();
        let cache = AstCache::warm(dict.distinct_logic_strings());
        (dict, graph, cache)
    }

    fn record(pairs: &[(&str, &str)]) -> RecordSnapshot {
        let codes = MissingDataCodes::none();
        let mut r = RecordSnapshot::new("1001");
        for (name, raw) in pairs {
            r.set_raw(0, *name, raw, &codes);
        }
        r
    }

    fn text(name: &str) -> FieldDefinition {
        FieldDefinition::new(name, "baseline", FieldType::Text)
    }

    #[test]
    fn test_logic_gates_visibility() {
        let (dict, graph, cache) = project(vec![
            text("consent"),
            text("dob").with_logic("[consent] = '1'"),
        ]);
        let schedule = EventSchedule::single();
        let resolver = VisibilityResolver::new(&dict, &graph, &cache);

        let shown = resolver.resolve(&schedule, &record(&[("consent", "1")]), 0);
        assert_eq!(shown[1], Visibility::Visible);

        let hidden = resolver.resolve(&schedule, &record(&[("consent", "0")]), 0);
        assert_eq!(hidden[1], Visibility::Hidden);
    }

    #[test]
    fn test_unresolved_reference_is_indeterminate() {
        let (dict, graph, cache) = project(vec![text("a").with_logic("[nosuch] = 1")]);
        let schedule = EventSchedule::single();
        let resolver = VisibilityResolver::new(&dict, &graph, &cache);

        let vis = resolver.resolve(&schedule, &record(&[]), 0);
        assert_eq!(
            vis[0],
            Visibility::Indeterminate(ReasonCode::UnresolvedReference)
        );
    }

    #[test]
    fn test_hidden_host_hides_embedded_field() {
        let (dict, graph, cache) = project(vec![
            text("gate"),
            text("host")
                .with_label("Details: {child}")
                .with_logic("[gate] = '1'"),
            text("child"),
        ]);
        let schedule = EventSchedule::single();
        let resolver = VisibilityResolver::new(&dict, &graph, &cache);

        let vis = resolver.resolve(&schedule, &record(&[("gate", "0")]), 0);
        assert_eq!(vis[1], Visibility::Hidden);
        assert_eq!(vis[2], Visibility::Hidden);
    }

    #[test]
    fn test_indeterminate_host_propagates() {
        let (dict, graph, cache) = project(vec![
            text("host")
                .with_label("{child}")
                .with_logic("[nosuch] = 1"),
            text("child").with_logic("1 = 1"),
        ]);
        let schedule = EventSchedule::single();
        let resolver = VisibilityResolver::new(&dict, &graph, &cache);

        let vis = resolver.resolve(&schedule, &record(&[]), 0);
        assert_eq!(
            vis[1],
            Visibility::Indeterminate(ReasonCode::UnresolvedReference)
        );
    }

    #[test]
    fn test_unsupported_annotation() {
        let (dict, graph, cache) = project(vec![text("a").with_annotation("@HIDDEN")]);
        let schedule = EventSchedule::single();
        let resolver = VisibilityResolver::new(&dict, &graph, &cache);

        let vis = resolver.resolve(&schedule, &record(&[]), 0);
        assert_eq!(
            vis[0],
            Visibility::Indeterminate(ReasonCode::UnsupportedAnnotation)
        );
    }

    #[test]
    fn test_checkbox_choice_defaults_to_unchecked() {
        let race = FieldDefinition::new("race", "baseline", FieldType::Checkbox)
            .with_choices(vec![Choice::new("1", "White"), Choice::new("5", "Other")]);
        let (dict, graph, cache) =
            project(vec![race, text("race_other").with_logic("[race(5)] = '1'")]);
        let schedule = EventSchedule::single();
        let resolver = VisibilityResolver::new(&dict, &graph, &cache);

        // no race columns at all: choice reads as 0, logic is false
        let vis = resolver.resolve(&schedule, &record(&[]), 0);
        assert_eq!(vis[1], Visibility::Hidden);

        let vis = resolver.resolve(&schedule, &record(&[("race___5", "1")]), 0);
        assert_eq!(vis[1], Visibility::Visible);
    }

    #[test]
    fn test_unknown_choice_code_is_unresolved() {
        let race = FieldDefinition::new("race", "baseline", FieldType::Checkbox)
            .with_choices(vec![Choice::new("1", "White")]);
        let (dict, graph, cache) =
            project(vec![race, text("other").with_logic("[race(9)] = '1'")]);
        let schedule = EventSchedule::single();
        let resolver = VisibilityResolver::new(&dict, &graph, &cache);

        let vis = resolver.resolve(&schedule, &record(&[]), 0);
        assert_eq!(
            vis[1],
            Visibility::Indeterminate(ReasonCode::UnresolvedReference)
        );
    }

    #[test]
    fn test_forward_event_reference_is_unresolved() {
        let dict = Dictionary::new(vec![
            text("a"),
            text("b").with_logic("[followup_arm_1][a] = '1'"),
        ])
        .unwrap();
        let schedule = EventSchedule::new(
            vec![
                crate::schedule::Event::new("baseline_arm_1", "1"),
                crate::schedule::Event::new("followup_arm_1", "1"),
            ],
            &[
                ("baseline_arm_1", "baseline"),
                ("followup_arm_1", "baseline"),
            ],
            &dict,
        )
        .unwrap();
        let graph = EmbeddingGraph::build(&dict).unwrap();
        let cache = AstCache::warm(dict.distinct_logic_strings());
        let resolver = VisibilityResolver::new(&dict, &graph, &cache);

        // at baseline, the followup event is in the future
        let vis = resolver.resolve(&schedule, &record(&[]), 0);
        assert_eq!(
            vis[1],
            Visibility::Indeterminate(ReasonCode::UnresolvedReference)
        );

        // at followup, a backward reference to baseline data resolves
        let codes = MissingDataCodes::none();
        let mut r = RecordSnapshot::new("1001");
        r.set_raw(1, "a", "1", &codes);
        let vis = resolver.resolve(&schedule, &r, 1);
        assert_eq!(vis[1], Visibility::Visible);
    }

    #[test]
    fn test_undesignated_instrument_reads_blank() {
        let dict = Dictionary::new(vec![
            FieldDefinition::new("lab", "labs", FieldType::Text),
            text("a").with_logic("[lab] = ''"),
        ])
        .unwrap();
        // labs is never designated, so [lab] reads blank everywhere
        let schedule = EventSchedule::new(
            vec![crate::schedule::Event::new("baseline_arm_1", "1")],
            &[("baseline_arm_1", "baseline")],
            &dict,
        )
        .unwrap();
        let graph = EmbeddingGraph::build(&dict).unwrap();
        let cache = AstCache::warm(dict.distinct_logic_strings());
        let resolver = VisibilityResolver::new(&dict, &graph, &cache);

        let vis = resolver.resolve(&schedule, &record(&[]), 0);
        assert_eq!(vis[1], Visibility::Visible);
    }
}
