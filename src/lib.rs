//! Multi-level Bill-of-Materials Explosion
//!
//! Given a top-level assembly and a production quantity, the [`Exploder`]
//! walks the recursive parts-list relation and produces the complete,
//! leveled list of [`Record`]s with cumulative quantities and unique
//! scheduling run numbers.

pub mod domain;
pub use domain::{BomLine, CycleSkip, Explosion, PartId, Record, Run};

/// The explosion engine and its collaborator traits.
pub mod explode;
pub use explode::{
    BomSource, CountingSequencer, Error as ExplodeError, Exploder, RepositoryError, RunSequencer,
};

/// In-memory BOM graph and BOM definition file loading.
pub mod storage;
pub use storage::{Bom, LoadError};
