use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use grainsim::{ConfigLoader, OutputFormat, Simulation, WriterSink};

#[derive(Debug, Parser)]
#[command(author, version, about = "Lockstep deer/wolf/grain simulation")]
struct Cli {
    /// Path to the simulation YAML file
    #[arg(long, default_value = "scenarios/grain_valley.yaml")]
    config: PathBuf,

    /// Override the record format from the config file
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Override the climate noise seed
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = ConfigLoader::new(".").load(&cli.config)?;
    if let Some(format) = cli.format {
        config.output.format = format;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    let sink = WriterSink::new(BufWriter::new(io::stdout()), config.output.format)
        .with_csv_header(config.output.csv_header);

    let simulation = Simulation::new(config)?;
    let summary = simulation.run(sink)?;
    info!(
        name = %summary.name,
        seed = ?summary.seed,
        rounds = summary.rounds,
        deer = summary.final_state.deer,
        wolves = summary.final_state.wolves,
        grain_height = summary.final_state.grain_height,
        "run complete"
    );
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
}
