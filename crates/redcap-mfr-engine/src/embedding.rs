//! Field-embedding dependency resolution.
//!
//! A field is *embedded* when its name appears in braces (`{field}`) inside
//! another field's label or choice labels. An embedded field inherits the
//! host's visibility, so hosts must be resolved first. This module extracts
//! the edges and fixes a deterministic topological evaluation order.

use crate::dictionary::{Dictionary, FieldIdx};
use once_cell::sync::Lazy;
use redcap_mfr_diagnostics::DictionaryError;
use regex::Regex;

static EMBED_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([A-Za-z][A-Za-z0-9_]*)\}").expect("embed reference pattern is valid")
});

/// The embedding graph over a dictionary arena.
#[derive(Debug, Clone)]
pub struct EmbeddingGraph {
    /// For each field, the indices of its embedding hosts
    hosts: Vec<Vec<FieldIdx>>,
    /// All fields, hosts before the fields they embed
    topo_order: Vec<FieldIdx>,
}

impl EmbeddingGraph {
    /// Extract embedding edges from labels and choice labels and compute
    /// the evaluation order. Names in braces that are not dictionary
    /// fields are plain text, not references. A cycle is fatal.
    pub fn build(dictionary: &Dictionary) -> Result<Self, DictionaryError> {
        let mut hosts: Vec<Vec<FieldIdx>> = vec![Vec::new(); dictionary.len()];

        for (host_idx, host) in dictionary.iter() {
            let labels = std::iter::once(host.label.as_str())
                .chain(host.choices.iter().map(|c| c.label.as_str()));
            for label in labels {
                for capture in EMBED_REF.captures_iter(label) {
                    let Some(child_idx) = dictionary.index_of(&capture[1]) else {
                        continue;
                    };
                    if child_idx == host_idx {
                        continue;
                    }
                    if !hosts[child_idx].contains(&host_idx) {
                        hosts[child_idx].push(host_idx);
                    }
                }
            }
        }

        let topo_order = topo_sort(&hosts, dictionary)?;
        Ok(Self { hosts, topo_order })
    }

    /// The embedding hosts of a field
    pub fn hosts_of(&self, field: FieldIdx) -> &[FieldIdx] {
        &self.hosts[field]
    }

    /// Whether the field is embedded anywhere
    pub fn is_embedded(&self, field: FieldIdx) -> bool {
        !self.hosts[field].is_empty()
    }

    /// Every field, each host preceding the fields embedded in it
    pub fn topo_order(&self) -> &[FieldIdx] {
        &self.topo_order
    }
}

/// Kahn's algorithm over host→child edges. Ready fields are taken in
/// declaration order, so the result is deterministic.
fn topo_sort(
    hosts: &[Vec<FieldIdx>],
    dictionary: &Dictionary,
) -> Result<Vec<FieldIdx>, DictionaryError> {
    let n = hosts.len();
    let mut pending: Vec<usize> = hosts.iter().map(Vec::len).collect();
    let mut children: Vec<Vec<FieldIdx>> = vec![Vec::new(); n];
    for (child, host_list) in hosts.iter().enumerate() {
        for &host in host_list {
            children[host].push(child);
        }
    }

    let mut order = Vec::with_capacity(n);
    let mut ready: Vec<FieldIdx> = (0..n).filter(|&i| pending[i] == 0).collect();

    // `ready` stays sorted because children are pushed in ascending host
    // order within each round; re-sort to keep rounds merged.
    while let Some(&next) = ready.first() {
        ready.remove(0);
        order.push(next);
        for &child in &children[next] {
            pending[child] -= 1;
            if pending[child] == 0 {
                let pos = ready.partition_point(|&f| f < child);
                ready.insert(pos, child);
            }
        }
    }

    if order.len() < n {
        let cycle: Vec<&str> = (0..n)
            .filter(|&i| pending[i] > 0)
            .map(|i| dictionary.field(i).name.as_str())
            .collect();
        return Err(DictionaryError::cyclic_embedding(&cycle));
    }
    Ok(order)
}
