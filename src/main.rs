use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use paged_memory::io::{read_trace, run_trace, write_results};
use paged_memory::memory::SimulatedRam;
use paged_memory::translation;

#[derive(Parser)]
#[command(name = "paged-memory")]
#[command(about = "Run a read/write trace through the paged translation layer")]
struct Cli {
    /// Trace file: one `r <addr>` or `w <addr> <value>` per line
    trace: PathBuf,

    /// Write results here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let ops = read_trace(&cli.trace)?;

    let mut ram = SimulatedRam::new();
    translation::initialize(&mut ram);
    let results = run_trace(&mut ram, &ops);

    match cli.output {
        Some(path) => write_results(path, &results)?,
        None => {
            for line in &results {
                println!("{}", line);
            }
        }
    }

    Ok(())
}
