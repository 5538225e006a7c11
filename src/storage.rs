//! BOM storage.
//!
//! The [`Bom`] is a filesystem-agnostic in-memory parts-list graph; the
//! [`bom_file`] module loads one from a TOML definition file.

mod bom;
/// TOML BOM definition files.
pub mod bom_file;

pub use bom::Bom;
pub use bom_file::{LoadError, load, parse};
