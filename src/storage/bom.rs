//! In-memory bill-of-materials graph.
//!
//! The [`Bom`] knows nothing about files. It stores the parts-list relation
//! in a decomposed form: an insertion-ordered adjacency list per parent
//! (the source of truth for edge ordering, preserving parallel duplicate
//! edges as supplied), plus a `petgraph` mirror used only for whole-BOM
//! cycle analysis.

use std::{collections::HashMap, num::NonZeroU64};

use petgraph::{
    algo::{is_cyclic_directed, tarjan_scc},
    graphmap::DiGraphMap,
};

use crate::{
    domain::{BomLine, PartId},
    explode::{BomSource, RepositoryError},
};

/// An in-memory bill of materials.
///
/// Parts are interned on first sight, whether declared explicitly or only
/// referenced as a component (a legitimate leaf). Lookup of a part that was
/// never mentioned returns an empty child list, matching the engine's
/// "no decomposition" contract.
#[derive(Debug, Default)]
pub struct Bom {
    /// Interned part ids in insertion order. The index into this vec is the
    /// node key of the cycle-analysis graph.
    parts: Vec<PartId>,

    /// Reverse lookup from part id to its interned index.
    index: HashMap<PartId, usize>,

    /// Optional human-readable descriptions.
    descriptions: HashMap<PartId, String>,

    /// Adjacency lists, keyed by parent. Sole source of truth for edge
    /// ordering and multiplicity.
    children: HashMap<PartId, Vec<BomLine>>,

    /// Structure-only mirror of the edges for cycle analysis.
    graph: DiGraphMap<usize, ()>,
}

impl Bom {
    /// Creates an empty BOM.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a part, returning `true` if it was not previously known.
    pub fn add_part(&mut self, id: PartId) -> bool {
        if self.index.contains_key(&id) {
            return false;
        }
        let key = self.parts.len();
        self.graph.add_node(key);
        self.index.insert(id.clone(), key);
        self.parts.push(id);
        true
    }

    /// Sets the human-readable description of a part, interning it if
    /// needed.
    pub fn set_description(&mut self, id: PartId, description: String) {
        self.add_part(id.clone());
        self.descriptions.insert(id, description);
    }

    /// Returns the description of a part, if one was set.
    #[must_use]
    pub fn description(&self, id: &PartId) -> Option<&str> {
        self.descriptions.get(id).map(String::as_str)
    }

    /// Appends a parts-list edge: `quantity` units of `component` per one
    /// unit of `parent`.
    ///
    /// Both endpoints are interned if needed. Duplicate edges are kept, in
    /// order; the explosion engine is responsible for deduplicating them.
    pub fn link(&mut self, parent: &PartId, component: &PartId, quantity: NonZeroU64) {
        self.add_part(parent.clone());
        self.add_part(component.clone());
        self.children
            .entry(parent.clone())
            .or_default()
            .push(BomLine::new(component.clone(), quantity));
        self.graph
            .add_edge(self.index[parent], self.index[component], ());
    }

    /// Returns the direct children of a part, in insertion order.
    #[must_use]
    pub fn children(&self, parent: &PartId) -> &[BomLine] {
        self.children.get(parent).map_or(&[], Vec::as_slice)
    }

    /// Returns every parent that consumes `component`, with the per-parent
    /// quantity of each consuming edge, in part insertion order.
    #[must_use]
    pub fn where_used(&self, component: &PartId) -> Vec<(PartId, NonZeroU64)> {
        self.parts
            .iter()
            .flat_map(|parent| {
                self.children(parent)
                    .iter()
                    .filter(|line| &line.component == component)
                    .map(|line| (parent.clone(), line.quantity))
            })
            .collect()
    }

    /// Returns an iterator over all known parts in insertion order.
    pub fn parts(&self) -> impl Iterator<Item = &PartId> + '_ {
        self.parts.iter()
    }

    /// Whether the part is known to this BOM (declared or referenced).
    #[must_use]
    pub fn contains(&self, id: &PartId) -> bool {
        self.index.contains_key(id)
    }

    /// Number of known parts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the BOM holds no parts at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Total number of parts-list edges, counting duplicates.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.children.values().map(Vec::len).sum()
    }

    /// Determine whether the parts-list relation contains any cycles.
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Return all cycles as sorted sets of part ids.
    ///
    /// Strongly connected components of more than one part form one cycle
    /// each; a self-referential part forms a singleton cycle.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<PartId>> {
        let mut cycles = Vec::new();

        for component in tarjan_scc(&self.graph) {
            if component.len() > 1 {
                let mut ids: Vec<_> = component
                    .iter()
                    .map(|&key| self.parts[key].clone())
                    .collect();
                ids.sort();
                cycles.push(ids);
                continue;
            }

            let Some(&node) = component.first() else {
                continue;
            };

            if self.graph.contains_edge(node, node) {
                cycles.push(vec![self.parts[node].clone()]);
            }
        }

        cycles.sort();
        cycles
    }
}

impl BomSource for Bom {
    fn children(&self, parent: &PartId) -> Result<Vec<BomLine>, RepositoryError> {
        Ok(self.children.get(parent).cloned().unwrap_or_default())
    }
}
