//! Building families and writing their membership.

use std::path::{Path, PathBuf};

use clap::Subcommand;

use phylome::{
    ace::{read_ace_path, AceParams},
    blast::{read_tabular, ClusterBuilder, HitFilter},
    io::tables,
    ClusterSet,
};

/// Where the clusters come from.
#[derive(Subcommand, Debug)]
pub enum ClusterAction {
    /// Cluster a tabular blast report.
    Blast {
        /// The report file.
        #[arg(short('i'), long)]
        report: PathBuf,

        /// Root for the family ids.
        #[arg(short('r'), long, default_value = "cluster")]
        rootname: String,

        /// Filter conditions, e.g. 'pct_identity > 75'.
        #[arg(short('f'), long("filter"))]
        filters: Vec<String>,

        /// Cap on members per cluster.
        #[arg(long)]
        max_members: Option<usize>,

        /// Read the report with the fast tabular parser.
        #[arg(long)]
        fast: bool,
    },
    /// Ingest an ACE assembly, one family per contig.
    Ace {
        /// The assembly file.
        #[arg(short('i'), long)]
        assembly: PathBuf,

        /// Discard contigs with a single read.
        #[arg(long)]
        nosinglets: bool,
    },
}

/// Runs the requested clustering and writes `membership.tab`.
///
/// # Errors
///
/// On unreadable input or malformed records.
pub fn dispatch(action: ClusterAction, out_dir: &Path) -> Result<(), String> {
    let set = match action {
        ClusterAction::Blast {
            report,
            rootname,
            filters,
            max_members,
            fast,
        } => cluster_blast(&report, &rootname, &filters, max_members, fast)?,
        ClusterAction::Ace { assembly, nosinglets } => {
            read_ace_path(&assembly, AceParams { nosinglets }).map_err(|e| e.to_string())?
        }
    };

    let membership_path = out_dir.join("membership.tab");
    let mut file = std::fs::File::create(&membership_path)
        .map_err(|e| format!("Failed to create {membership_path:?}: {e}"))?;
    tables::write_memberships(&mut file, &set).map_err(|e| e.to_string())?;
    ftlog::info!("wrote {} families to {membership_path:?}", set.len());
    println!("{} families -> {}", set.len(), membership_path.display());
    Ok(())
}

/// Clusters a blast report with the fast or the full parser.
fn cluster_blast(
    report: &Path,
    rootname: &str,
    filters: &[String],
    max_members: Option<usize>,
    fast: bool,
) -> Result<ClusterSet, String> {
    let filter = if filters.is_empty() {
        HitFilter::pass_all()
    } else {
        HitFilter::parse(filters).map_err(|e| e.to_string())?
    };
    if fast {
        ClusterBuilder::from_tabular_path(rootname, filter, max_members, report).map_err(|e| e.to_string())
    } else {
        let file = std::fs::File::open(report).map_err(|e| format!("Failed to open {report:?}: {e}"))?;
        let records = read_tabular(std::io::BufReader::new(file)).map_err(|e| e.to_string())?;
        Ok(ClusterBuilder::from_records(rootname, filter, max_members, records))
    }
}
