//! Domain models for BOM explosion.
//!
//! This module contains the core domain types: validated part identifiers,
//! BOM edges, and the requirement records produced by an explosion.

/// Part identifier type and parsing.
pub mod part_id;
pub use part_id::{InvalidPartIdError, PartId};

mod record;
pub use record::{BomLine, CycleSkip, Explosion, Record, Run};
