use std::{path::Path, process};

use bomex::{PartId, storage};
use clap::Parser;
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Display a part's description, components, and usage")]
pub struct Show {
    /// The part identifier to display
    #[clap(value_parser = super::parse_part_id)]
    part: PartId,
}

impl Show {
    #[instrument(skip(self))]
    pub fn run(self, bom_path: &Path) -> anyhow::Result<()> {
        let bom = storage::load(bom_path)?;

        if !bom.contains(&self.part) {
            eprintln!("Part {} not found in {}", self.part, bom_path.display());
            process::exit(1);
        }

        println!("# {}", self.part);
        if let Some(description) = bom.description(&self.part) {
            println!("{description}");
        }

        let components = bom.children(&self.part);
        if components.is_empty() {
            println!("\n{}", "Leaf part (no decomposition)".dim());
        } else {
            println!("\n{}", "Components".dim());
            for line in components {
                println!("  • {} × {}", line.quantity, line.component);
            }
        }

        let consumers = bom.where_used(&self.part);
        if !consumers.is_empty() {
            println!("\n{}", "Used by".dim());
            for (parent, qty) in consumers {
                println!("  • {parent} ({qty} per unit)");
            }
        }

        Ok(())
    }
}
