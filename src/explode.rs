//! The BOM explosion engine.
//!
//! [`Exploder`] consumes two collaborators, a [`BomSource`] supplying the
//! direct children of a part and a [`RunSequencer`] allocating unique
//! scheduling run numbers, and turns "N units of assembly A" into the
//! complete, leveled list of [`Record`]s.
//!
//! The traversal is breadth-first and strictly sequential: output order is
//! discovery order and is reproducible for a fixed source response order.
//! Cycles in the underlying data are skipped per path and reported as
//! diagnostics on the result rather than failing the explosion.

use std::{
    collections::{HashMap, HashSet, VecDeque, hash_map::Entry},
    num::NonZeroU64,
    sync::atomic::{AtomicU64, Ordering},
};

use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::{BomLine, CycleSkip, Explosion, PartId, Record, Run};

/// A source of BOM edges: the recursive parts-list relation, queried one
/// parent at a time.
pub trait BomSource {
    /// Returns the direct children of `parent` with their per-parent
    /// quantities, in the source's canonical order.
    ///
    /// A parent with no decomposition yields an empty vec, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] when the underlying store is
    /// unavailable; the explosion is aborted, never retried here.
    fn children(&self, parent: &PartId) -> Result<Vec<BomLine>, RepositoryError>;
}

impl<T: BomSource + ?Sized> BomSource for &T {
    fn children(&self, parent: &PartId) -> Result<Vec<BomLine>, RepositoryError> {
        (**self).children(parent)
    }
}

/// An allocator of scheduling run numbers.
///
/// Implementations must never issue the same value twice, even across
/// concurrent callers; the engine relies on that contract rather than
/// synchronizing allocation itself.
pub trait RunSequencer {
    /// Allocates the next unused run number.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] when the underlying counter is
    /// unavailable; the explosion is aborted.
    fn next_run(&self) -> Result<Run, RepositoryError>;
}

impl<T: RunSequencer + ?Sized> RunSequencer for &T {
    fn next_run(&self) -> Result<Run, RepositoryError> {
        (**self).next_run()
    }
}

/// An in-process [`RunSequencer`] backed by an atomic counter.
///
/// Allocation is a single `fetch_add`, so the uniqueness contract holds
/// across concurrent explosions sharing one sequencer.
#[derive(Debug)]
pub struct CountingSequencer {
    next: AtomicU64,
}

impl CountingSequencer {
    /// Creates a sequencer that will issue `first` as its first run number.
    #[must_use]
    pub const fn new(first: NonZeroU64) -> Self {
        Self {
            next: AtomicU64::new(first.get()),
        }
    }
}

impl Default for CountingSequencer {
    fn default() -> Self {
        Self::new(NonZeroU64::MIN)
    }
}

impl RunSequencer for CountingSequencer {
    fn next_run(&self) -> Result<Run, RepositoryError> {
        let value = self.next.fetch_add(1, Ordering::Relaxed);
        NonZeroU64::new(value)
            .map(Run::new)
            .ok_or_else(|| RepositoryError::new("run counter wrapped around"))
    }
}

/// A collaborator (BOM source or run sequencer) failed or timed out.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("BOM repository unavailable: {reason}")]
pub struct RepositoryError {
    reason: String,
}

impl RepositoryError {
    /// Creates a new repository error with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Errors that can abort an explosion.
///
/// Cycles in the BOM data are *not* errors; they are skipped and reported
/// as [`CycleSkip`] diagnostics on the [`Explosion`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// The root identifier was empty or blank. Rejected before any
    /// collaborator is queried.
    #[error("root part identifier must not be empty")]
    InvalidRoot,

    /// The requested quantity was zero. Rejected before any collaborator is
    /// queried.
    #[error("requested quantity must be a positive integer")]
    InvalidQuantity,

    /// Cumulative quantity exceeded the representable range while expanding
    /// an edge. No partial result is surfaced.
    #[error("scheduled quantity overflowed while expanding {parent} → {component}")]
    QuantityOverflow {
        /// The parent of the edge being expanded.
        parent: PartId,
        /// The component of the edge being expanded.
        component: PartId,
    },

    /// A collaborator failed; the explosion was aborted.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// One queued node awaiting expansion.
struct Frontier {
    node: PartId,
    qty: NonZeroU64,
    /// Ancestor identifiers on the route from the root to `node`,
    /// inclusive. Used for cycle detection only, never for global dedup.
    path: HashSet<PartId>,
}

/// The explosion engine.
///
/// Holds the two collaborators and is otherwise stateless: every call to
/// [`Exploder::explode`] uses bookkeeping scoped to that call, so one
/// engine value can serve independent explosions.
#[derive(Debug)]
pub struct Exploder<S, R> {
    source: S,
    runs: R,
}

impl<S: BomSource, R: RunSequencer> Exploder<S, R> {
    /// Creates an engine over the given BOM source and run sequencer.
    #[must_use]
    pub const fn new(source: S, runs: R) -> Self {
        Self { source, runs }
    }

    /// Explodes `root` into its full multi-level requirement list for the
    /// given production quantity.
    ///
    /// Quantities compound cumulatively along each path: a grandchild's
    /// requirement is `quantity × qty(root→child) × qty(child→grandchild)`.
    /// Each distinct `(parent, component)` edge is recorded at most once
    /// (first discovery wins), and the source is queried at most once per
    /// distinct node.
    ///
    /// The caller is expected to normalize `root` (case folding) before
    /// calling; the engine only re-validates defensively.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidRoot`] / [`Error::InvalidQuantity`] for malformed
    ///   input, before any collaborator is queried.
    /// - [`Error::Repository`] when either collaborator fails; no partial
    ///   record list is surfaced.
    /// - [`Error::QuantityOverflow`] when a cumulative quantity exceeds
    ///   `u64`.
    #[instrument(skip(self))]
    pub fn explode(&self, root: &str, quantity: u64) -> Result<Explosion, Error> {
        let root = PartId::new(root).map_err(|_| Error::InvalidRoot)?;
        let requested = NonZeroU64::new(quantity).ok_or(Error::InvalidQuantity)?;

        let mut queue = VecDeque::new();
        queue.push_back(Frontier {
            node: root.clone(),
            qty: requested,
            path: HashSet::from([root.clone()]),
        });

        // Scoped to this call: processed (parent, component) edges, and a
        // per-node children cache so the source is queried once per node.
        let mut processed: HashSet<(PartId, PartId)> = HashSet::new();
        let mut cache: HashMap<PartId, Vec<BomLine>> = HashMap::new();
        let mut records = Vec::new();
        let mut cycles = Vec::new();

        while let Some(Frontier { node, qty, path }) = queue.pop_front() {
            let lines = match cache.entry(node.clone()) {
                Entry::Occupied(entry) => entry.get().clone(),
                Entry::Vacant(entry) => entry.insert(self.source.children(&node)?).clone(),
            };

            if lines.is_empty() {
                if node == root {
                    // The root has no decomposition at all: emit a single
                    // fallback record meaning "produce the root itself".
                    let run = self.runs.next_run()?;
                    records.push(Record {
                        master: root.clone(),
                        parent: root.clone(),
                        component: None,
                        qty_per_parent: NonZeroU64::MIN,
                        qty_to_schedule: requested,
                        run,
                    });
                }
                // Non-root leaf: a terminal (purchased or atomic) part.
                continue;
            }

            for line in lines {
                if path.contains(&line.component) {
                    debug!(parent = %node, component = %line.component, "skipping cyclic edge");
                    cycles.push(CycleSkip {
                        parent: node.clone(),
                        component: line.component,
                    });
                    continue;
                }

                let key = (node.clone(), line.component.clone());
                if processed.contains(&key) {
                    debug!(parent = %node, component = %line.component, "duplicate edge, already recorded");
                    continue;
                }

                let child_qty =
                    qty.checked_mul(line.quantity)
                        .ok_or_else(|| Error::QuantityOverflow {
                            parent: node.clone(),
                            component: line.component.clone(),
                        })?;
                let run = self.runs.next_run()?;

                records.push(Record {
                    master: root.clone(),
                    parent: node.clone(),
                    component: Some(line.component.clone()),
                    qty_per_parent: line.quantity,
                    qty_to_schedule: child_qty,
                    run,
                });
                processed.insert(key);

                let mut child_path = path.clone();
                child_path.insert(line.component.clone());
                queue.push_back(Frontier {
                    node: line.component,
                    qty: child_qty,
                    path: child_path,
                });
            }
        }

        Ok(Explosion {
            master: root,
            requested,
            records,
            cycles,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;

    /// A `HashMap`-backed BOM source that counts how often each node is
    /// queried.
    #[derive(Default)]
    struct FakeSource {
        children: HashMap<String, Vec<(String, u64)>>,
        calls: RefCell<HashMap<String, usize>>,
    }

    impl FakeSource {
        fn with(edges: &[(&str, &[(&str, u64)])]) -> Self {
            let children = edges
                .iter()
                .map(|(parent, lines)| {
                    (
                        (*parent).to_string(),
                        lines
                            .iter()
                            .map(|(component, qty)| ((*component).to_string(), *qty))
                            .collect(),
                    )
                })
                .collect();
            Self {
                children,
                calls: RefCell::default(),
            }
        }

        fn calls_for(&self, id: &str) -> usize {
            self.calls.borrow().get(id).copied().unwrap_or(0)
        }

        fn total_calls(&self) -> usize {
            self.calls.borrow().values().sum()
        }
    }

    impl BomSource for FakeSource {
        fn children(&self, parent: &PartId) -> Result<Vec<BomLine>, RepositoryError> {
            *self
                .calls
                .borrow_mut()
                .entry(parent.to_string())
                .or_insert(0) += 1;
            Ok(self.children.get(parent.as_str()).map_or_else(Vec::new, |lines| {
                lines
                    .iter()
                    .map(|(component, qty)| {
                        BomLine::new(
                            PartId::new(component.clone()).unwrap(),
                            NonZeroU64::new(*qty).unwrap(),
                        )
                    })
                    .collect()
            }))
        }
    }

    /// A sequencer that tracks how many runs it has issued.
    #[derive(Default)]
    struct TrackingSequencer {
        issued: Cell<u64>,
    }

    impl RunSequencer for TrackingSequencer {
        fn next_run(&self) -> Result<Run, RepositoryError> {
            let next = self.issued.get() + 1;
            self.issued.set(next);
            Ok(Run::new(NonZeroU64::new(next).unwrap()))
        }
    }

    struct FailingSource;

    impl BomSource for FailingSource {
        fn children(&self, _parent: &PartId) -> Result<Vec<BomLine>, RepositoryError> {
            Err(RepositoryError::new("connection refused"))
        }
    }

    fn component(record: &Record) -> &str {
        record.component.as_ref().map_or("", |id| id.as_str())
    }

    #[test]
    fn root_without_children_yields_fallback_record() {
        let source = FakeSource::with(&[]);
        let exploder = Exploder::new(&source, TrackingSequencer::default());

        let explosion = exploder.explode("X", 5).unwrap();

        assert_eq!(explosion.records.len(), 1);
        let record = &explosion.records[0];
        assert_eq!(record.master.as_str(), "X");
        assert_eq!(record.parent.as_str(), "X");
        assert!(record.component.is_none());
        assert_eq!(record.qty_to_schedule.get(), 5);
        assert_eq!(record.run.get(), 1);
        assert!(explosion.cycles.is_empty());
        assert_eq!(source.calls_for("X"), 1);
    }

    #[test]
    fn single_level_records_in_source_order_with_distinct_runs() {
        let source = FakeSource::with(&[("X", &[("A", 2), ("B", 3)])]);
        let exploder = Exploder::new(&source, TrackingSequencer::default());

        let explosion = exploder.explode("X", 5).unwrap();

        assert_eq!(explosion.records.len(), 2);
        assert_eq!(component(&explosion.records[0]), "A");
        assert_eq!(explosion.records[0].qty_to_schedule.get(), 10);
        assert_eq!(component(&explosion.records[1]), "B");
        assert_eq!(explosion.records[1].qty_to_schedule.get(), 15);
        assert_eq!(explosion.records[0].run.get(), 1);
        assert_eq!(explosion.records[1].run.get(), 2);
    }

    #[test]
    fn quantity_compounds_cumulatively_across_levels() {
        let source = FakeSource::with(&[("X", &[("A", 2)]), ("A", &[("B", 3)])]);
        let exploder = Exploder::new(&source, TrackingSequencer::default());

        let explosion = exploder.explode("X", 5).unwrap();

        assert_eq!(explosion.records.len(), 2);
        assert_eq!(component(&explosion.records[0]), "A");
        assert_eq!(explosion.records[0].qty_to_schedule.get(), 10);
        assert_eq!(component(&explosion.records[1]), "B");
        // 5 × 2 × 3, not 5 × 3 and not 5 × 2.
        assert_eq!(explosion.records[1].qty_to_schedule.get(), 30);
    }

    #[test]
    fn cyclic_data_terminates_and_reports_the_skipped_edge() {
        let source = FakeSource::with(&[("X", &[("Y", 1)]), ("Y", &[("X", 1)])]);
        let exploder = Exploder::new(&source, TrackingSequencer::default());

        let explosion = exploder.explode("X", 1).unwrap();

        assert_eq!(explosion.records.len(), 1);
        assert_eq!(explosion.records[0].parent.as_str(), "X");
        assert_eq!(component(&explosion.records[0]), "Y");
        assert_eq!(
            explosion.cycles,
            vec![CycleSkip {
                parent: PartId::new("Y").unwrap(),
                component: PartId::new("X").unwrap(),
            }]
        );
    }

    #[test]
    fn duplicate_edges_are_recorded_once() {
        let source = FakeSource::with(&[("X", &[("A", 1), ("A", 1)])]);
        let exploder = Exploder::new(&source, TrackingSequencer::default());

        let explosion = exploder.explode("X", 1).unwrap();

        assert_eq!(explosion.records.len(), 1);
        assert_eq!(component(&explosion.records[0]), "A");
        assert_eq!(source.calls_for("X"), 1);
        assert_eq!(source.calls_for("A"), 1);
    }

    #[test]
    fn invalid_input_is_rejected_before_any_collaborator_call() {
        let source = FakeSource::with(&[("X", &[("A", 1)])]);
        let runs = TrackingSequencer::default();
        let exploder = Exploder::new(&source, &runs);

        assert_eq!(exploder.explode("", 5).unwrap_err(), Error::InvalidRoot);
        assert_eq!(exploder.explode("   ", 5).unwrap_err(), Error::InvalidRoot);
        assert_eq!(exploder.explode("X", 0).unwrap_err(), Error::InvalidQuantity);

        assert_eq!(source.total_calls(), 0);
        assert_eq!(runs.issued.get(), 0);
    }

    #[test]
    fn shared_subassembly_is_expanded_per_edge_from_one_lookup() {
        let source = FakeSource::with(&[
            ("X", &[("L", 1), ("R", 1)]),
            ("L", &[("C", 2)]),
            ("R", &[("C", 3)]),
            ("C", &[("D", 1)]),
        ]);
        let exploder = Exploder::new(&source, TrackingSequencer::default());

        let explosion = exploder.explode("X", 1).unwrap();

        let edges: Vec<(&str, &str, u64)> = explosion
            .records
            .iter()
            .map(|record| {
                (
                    record.parent.as_str(),
                    component(record),
                    record.qty_to_schedule.get(),
                )
            })
            .collect();
        assert_eq!(
            edges,
            vec![
                ("X", "L", 1),
                ("X", "R", 1),
                ("L", "C", 2),
                ("R", "C", 3),
                // First discovery of the (C, D) edge wins; the second route
                // through R does not duplicate it.
                ("C", "D", 2),
            ]
        );
        assert_eq!(source.calls_for("C"), 1);
        assert_eq!(source.calls_for("D"), 1);
    }

    #[test]
    fn repository_failure_aborts_without_records() {
        let exploder = Exploder::new(FailingSource, TrackingSequencer::default());

        let error = exploder.explode("X", 1).unwrap_err();

        assert!(matches!(error, Error::Repository(_)));
    }

    #[test]
    fn cumulative_overflow_aborts_the_explosion() {
        let source = FakeSource::with(&[("X", &[("A", u64::MAX)])]);
        let exploder = Exploder::new(&source, TrackingSequencer::default());

        let error = exploder.explode("X", 2).unwrap_err();

        assert!(matches!(error, Error::QuantityOverflow { .. }));
    }

    #[test]
    fn legitimate_repeated_subassembly_is_not_treated_as_a_cycle() {
        // B appears under both A and X; only true ancestors count as cycles.
        let source = FakeSource::with(&[("X", &[("A", 1), ("B", 1)]), ("A", &[("B", 2)])]);
        let exploder = Exploder::new(&source, TrackingSequencer::default());

        let explosion = exploder.explode("X", 1).unwrap();

        assert!(explosion.cycles.is_empty());
        assert_eq!(explosion.records.len(), 3);
    }

    #[test]
    fn counting_sequencer_starts_at_configured_value() {
        let runs = CountingSequencer::new(NonZeroU64::new(100).unwrap());
        assert_eq!(runs.next_run().unwrap().get(), 100);
        assert_eq!(runs.next_run().unwrap().get(), 101);
    }

    #[test]
    fn counting_sequencer_is_unique_across_threads() {
        let runs = CountingSequencer::default();
        let mut issued = Vec::new();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(|| {
                        (0..250)
                            .map(|_| runs.next_run().unwrap().get())
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            for handle in handles {
                issued.extend(handle.join().unwrap());
            }
        });

        let unique: HashSet<u64> = issued.iter().copied().collect();
        assert_eq!(unique.len(), 1000);
    }
}
