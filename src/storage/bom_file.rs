//! Loading a [`Bom`] from a TOML definition file.
//!
//! The file format:
//!
//! ```toml
//! [parts.BIKE]
//! description = "City bike"
//! components = [
//!     { id = "WHEEL", qty = 2 },
//!     { id = "FRAME", qty = 1 },
//! ]
//!
//! [parts.WHEEL]
//! components = [{ id = "SPOKE", qty = 36 }]
//! ```
//!
//! Components that are never declared as parts are legitimate leaves.
//! Identifiers are trimmed and folded to uppercase on load; this is the
//! boundary where case-insensitivity is honored, so the engine itself can
//! compare ids exactly.

use std::{collections::BTreeMap, num::NonZeroU64, path::Path};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::Bom;
use crate::domain::PartId;

/// Errors that can occur when loading a BOM definition file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read BOM file {path}: {source}")]
    Io {
        /// The path that could not be read.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file was not valid TOML for the expected schema.
    #[error("failed to parse BOM file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A part or component identifier was empty after trimming.
    #[error("invalid part identifier {0:?}: must not be empty")]
    InvalidPart(String),

    /// Two declared parts collapse to the same identifier after
    /// normalization.
    #[error("duplicate part {0:?} after case folding")]
    DuplicatePart(String),

    /// A component quantity was zero.
    #[error("invalid quantity {qty} for component {component:?} of {parent:?}: must be at least 1")]
    InvalidQuantity {
        /// The declared parent part.
        parent: String,
        /// The offending component.
        component: String,
        /// The quantity as written in the file.
        qty: u64,
    },
}

#[derive(Debug, Deserialize)]
struct BomFile {
    #[serde(default)]
    parts: BTreeMap<String, PartEntry>,
}

#[derive(Debug, Deserialize)]
struct PartEntry {
    #[serde(default)]
    description: Option<String>,

    #[serde(default)]
    components: Vec<ComponentEntry>,
}

#[derive(Debug, Deserialize)]
struct ComponentEntry {
    id: String,
    qty: u64,
}

fn normalize(raw: &str) -> Result<PartId, LoadError> {
    PartId::new(raw.trim().to_uppercase()).map_err(|_| LoadError::InvalidPart(raw.to_string()))
}

/// Parses a BOM definition from TOML text.
///
/// # Errors
///
/// Returns a [`LoadError`] for malformed TOML, blank identifiers, zero
/// quantities, or parts that collide after case folding.
pub fn parse(text: &str) -> Result<Bom, LoadError> {
    let file: BomFile = toml::from_str(text)?;
    let mut bom = Bom::new();

    // Declared parts first, in (sorted) declaration order, so part
    // iteration order is stable regardless of edge order.
    for (raw, entry) in &file.parts {
        let parent = normalize(raw)?;
        if !bom.add_part(parent.clone()) {
            return Err(LoadError::DuplicatePart(raw.clone()));
        }
        if let Some(description) = &entry.description {
            bom.set_description(parent, description.clone());
        }
    }

    for (raw, entry) in &file.parts {
        let parent = normalize(raw)?;
        for component in &entry.components {
            let child = normalize(&component.id)?;
            let quantity =
                NonZeroU64::new(component.qty).ok_or_else(|| LoadError::InvalidQuantity {
                    parent: raw.clone(),
                    component: component.id.clone(),
                    qty: component.qty,
                })?;
            bom.link(&parent, &child, quantity);
        }
    }

    debug!(
        parts = bom.len(),
        edges = bom.edge_count(),
        "parsed BOM definition"
    );
    Ok(bom)
}

/// Loads a BOM definition from a TOML file on disk.
///
/// # Errors
///
/// Returns [`LoadError::Io`] when the file cannot be read, or any error
/// [`parse`] can produce.
pub fn load(path: &Path) -> Result<Bom, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse(&text)
}
