use std::path::{Path, PathBuf};

mod explode;
mod show;
mod terminal;

use bomex::{PartId, storage};
use clap::ArgAction;
use explode::Explode;
use show::Show;
use terminal::Colorize;
use tracing::instrument;

/// Parse a part identifier from a string, normalizing to uppercase.
///
/// This is a CLI boundary function that accepts lowercase input and
/// normalizes it before the identifier enters the engine.
fn parse_part_id(s: &str) -> Result<PartId, String> {
    PartId::new(s.to_uppercase()).map_err(|e| format!("{e}"))
}

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The path to the BOM definition file
    #[arg(short, long, default_value = "bom.toml", global = true)]
    bom: PathBuf,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command.run(&self.bom)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Explode an assembly into its full multi-level requirement list
    Explode(Explode),

    /// Check BOM definition health and report cycles
    Validate(Validate),

    /// Show a part's description, components, and where-used
    Show(Show),
}

impl Command {
    fn run(self, bom: &Path) -> anyhow::Result<()> {
        match self {
            Self::Explode(command) => command.run(bom),
            Self::Validate(command) => command.run(bom),
            Self::Show(command) => command.run(bom),
        }
    }
}

#[derive(Debug, clap::Parser)]
pub struct Validate {
    /// Suppress output
    #[arg(long, short)]
    quiet: bool,
}

impl Validate {
    #[instrument]
    fn run(self, bom_path: &Path) -> anyhow::Result<()> {
        let bom = storage::load(bom_path)?;
        let cycles = bom.cycles();

        if cycles.is_empty() {
            if !self.quiet {
                println!(
                    "{}",
                    format!(
                        "✅ {} parts, {} edges, no cycles.",
                        bom.len(),
                        bom.edge_count()
                    )
                    .success()
                );
            }
            return Ok(());
        }

        if !self.quiet {
            println!(
                "{}",
                format!("⚠️  {} cycle(s) in the parts-list relation:", cycles.len()).warning()
            );
            for cycle in &cycles {
                let ids: Vec<&str> = cycle.iter().map(PartId::as_str).collect();
                println!("  • {}", ids.join(" → "));
            }
            println!(
                "\n{}",
                "Cyclic edges are skipped during explosion; fix the definitions above.".dim()
            );
        }
        // Exit code 2 signals an unhealthy BOM (for CI).
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_part_id_normalizes_case() {
        let id = parse_part_id("wheel").unwrap();
        assert_eq!(id.as_str(), "WHEEL");
    }

    #[test]
    fn parse_part_id_rejects_blank_input() {
        assert!(parse_part_id("  ").is_err());
    }
}
