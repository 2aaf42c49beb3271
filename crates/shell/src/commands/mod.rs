//! The CLI subcommands.

pub mod cluster;
pub mod run;

use std::path::PathBuf;

use clap::Subcommand;

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build families from a blast report or an assembly and write the
    /// cluster membership.
    Cluster {
        /// What to cluster from.
        #[command(subcommand)]
        action: cluster::ClusterAction,
    },
    /// Run the configured analysis paths end to end.
    Run {
        /// The configuration file.
        #[arg(short('c'), long)]
        config: PathBuf,

        /// Run only the path with this id.
        #[arg(short('p'), long)]
        path: Option<usize>,
    },
}
