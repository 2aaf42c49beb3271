//! CLI for phylome, the phylogenomic cluster-processing pipeline.

mod commands;
mod utils;

use std::path::PathBuf;

use clap::Parser;

use commands::Commands;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The random seed for bootstrap resampling.
    #[arg(short('s'), long, default_value = "42")]
    seed: u64,

    /// Wall-clock timeout, in seconds, per external tool invocation.
    #[arg(short('t'), long)]
    timeout: Option<u64>,

    /// The directory output files are written into.
    #[arg(short('o'), long, default_value = "phylome-out")]
    out_dir: PathBuf,

    /// The subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<(), String> {
    let args = Args::parse();

    if !args.out_dir.exists() {
        std::fs::create_dir_all(&args.out_dir)
            .map_err(|e| format!("Failed to create output directory {:?}: {e}", args.out_dir))?;
    }
    let (_guard, log_path) = utils::init_logging(&args.out_dir)?;
    eprintln!("logging to {log_path:?}");

    match args.command {
        Commands::Cluster { action } => commands::cluster::dispatch(action, &args.out_dir),
        Commands::Run { config, path } => {
            commands::run::run(&config, &args.out_dir, path, args.seed, args.timeout)
        }
    }
}
