use std::{num::NonZeroU64, path::Path};

use bomex::{CountingSequencer, Exploder, Explosion, PartId, storage};
use clap::Parser;
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Explode an assembly into its leveled requirement list")]
pub struct Explode {
    /// The part identifier of the assembly to explode
    #[clap(value_parser = super::parse_part_id)]
    part: PartId,

    /// The production quantity for the assembly
    qty: u64,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    format: OutputFormat,

    /// The first run number to allocate
    #[arg(long, value_name = "N", default_value_t = 1)]
    first_run: u64,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
    Ndjson,
}

impl Explode {
    #[instrument(skip(self))]
    pub fn run(self, bom_path: &Path) -> anyhow::Result<()> {
        let bom = storage::load(bom_path)?;
        let first = NonZeroU64::new(self.first_run)
            .ok_or_else(|| anyhow::anyhow!("--first-run must be at least 1"))?;

        let exploder = Exploder::new(&bom, CountingSequencer::new(first));
        let explosion = exploder.explode(self.part.as_str(), self.qty)?;

        match self.format {
            OutputFormat::Table => Self::output_table(&explosion),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&explosion)?),
            OutputFormat::Ndjson => {
                for record in &explosion.records {
                    println!("{}", serde_json::to_string(record)?);
                }
            }
        }

        Ok(())
    }

    fn output_table(explosion: &Explosion) {
        println!(
            "{:>6}  {:<16} {:<16} {:>10} {:>12}",
            "RUN", "PARENT", "COMPONENT", "QTY/PARENT", "TO SCHEDULE"
        );
        println!("{}", "─".repeat(66).dim());

        for record in &explosion.records {
            let component = record.component.as_ref().map_or("(self)", PartId::as_str);
            println!(
                "{:>6}  {:<16} {:<16} {:>10} {:>12}",
                record.run.get(),
                record.parent.as_str(),
                component,
                record.qty_per_parent.get(),
                record.qty_to_schedule.get()
            );
        }

        println!();
        for skip in &explosion.cycles {
            println!("{}", format!("⚠️  {skip}").warning());
        }
        println!(
            "{}",
            format!(
                "✅ {} requirements, {} units total for {} × {}",
                explosion.records.len(),
                explosion.total_scheduled(),
                explosion.requested,
                explosion.master.as_str()
            )
            .success()
        );
    }
}
