//! Output types produced by a BOM explosion.

use std::{fmt, num::NonZeroU64};

use serde::Serialize;

use super::PartId;

/// A unique scheduling run number.
///
/// Issued by a [`crate::RunSequencer`]; a given value is never issued
/// twice, even across concurrent explosions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Run(NonZeroU64);

impl Run {
    /// Wraps a raw run number.
    #[must_use]
    pub const fn new(value: NonZeroU64) -> Self {
        Self(value)
    }

    /// Returns the run number as a plain integer.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for Run {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One edge of the parts-list relation as returned by a BOM source.
///
/// `quantity` units of `component` are consumed per one unit of the parent
/// the edge was queried for. Edge ordering is owned by the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BomLine {
    /// The component consumed by the parent.
    pub component: PartId,
    /// Units of the component per one unit of the parent.
    pub quantity: NonZeroU64,
}

impl BomLine {
    /// Creates a new BOM line.
    #[must_use]
    pub const fn new(component: PartId, quantity: NonZeroU64) -> Self {
        Self {
            component,
            quantity,
        }
    }
}

/// A single requirement produced by an explosion.
///
/// One record is emitted per distinct `(parent, component)` edge
/// discovered, in discovery order. The root-fallback record (a root with no
/// decomposition at all) has `component = None` and means "produce the root
/// itself".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    /// The root identifier the whole explosion was run for.
    pub master: PartId,
    /// The node whose children produced this record.
    pub parent: PartId,
    /// The component being required, or `None` for the root fallback.
    pub component: Option<PartId>,
    /// Units of the component per one unit of the parent.
    pub qty_per_parent: NonZeroU64,
    /// Cumulative quantity required at the root production level.
    pub qty_to_schedule: NonZeroU64,
    /// Unique scheduling run number for this requirement.
    pub run: Run,
}

/// Non-fatal diagnostic for a BOM edge skipped during traversal because the
/// component was already an ancestor on the current path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleSkip {
    /// The node whose child list contained the offending edge.
    pub parent: PartId,
    /// The component that was an ancestor of its own parent.
    pub component: PartId,
}

impl fmt::Display for CycleSkip {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "cyclic edge {} → {} skipped",
            self.parent, self.component
        )
    }
}

/// The complete result of one explosion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Explosion {
    /// The (normalized) root identifier that was exploded.
    pub master: PartId,
    /// The production quantity requested for the root.
    pub requested: NonZeroU64,
    /// Requirement records in discovery order.
    pub records: Vec<Record>,
    /// Edges skipped due to cycles in the underlying data.
    pub cycles: Vec<CycleSkip>,
}

impl Explosion {
    /// Total number of units scheduled across all records.
    ///
    /// Saturates rather than overflows; this is a reporting convenience,
    /// not a scheduling quantity.
    #[must_use]
    pub fn total_scheduled(&self) -> u64 {
        self.records
            .iter()
            .fold(0_u64, |acc, record| {
                acc.saturating_add(record.qty_to_schedule.get())
            })
    }
}
