//! Running the configured analysis paths end to end.

use std::io::Write as _;
use std::path::Path;
use std::time::Duration;

use phylome::{
    ace::{read_ace_path, AceParams},
    blast::{read_tabular, ClusterBuilder, HitFilter},
    config::{DataSource, GlobalConfig, PathConfig},
    external::SystemRunner,
    io::{align_io, fasta, tables},
    pipeline::{Orchestrator, PathOutcome},
    ClusterSet,
};

/// Runs every configured path (or just `only`) over the ingested set.
///
/// # Errors
///
/// On configuration, ingest or validation failures. Per-family tool
/// failures are reported in `failed.tab` instead.
pub fn run(config_path: &Path, out_dir: &Path, only: Option<usize>, seed: u64, timeout_secs: Option<u64>) -> Result<(), String> {
    let config = GlobalConfig::from_path(config_path).map_err(|e| e.to_string())?;
    let set = ingest(&config)?;
    ftlog::info!("ingested {} families", set.len());

    let runner = SystemRunner;
    let timeout = timeout_secs.map(Duration::from_secs);
    let orchestrator = Orchestrator::new(&runner, seed, timeout);

    for path in &config.paths {
        if only.is_some_and(|id| id != path.id) {
            continue;
        }
        // Paths are independent analyses of the same ingested families.
        let mut path_set = set.clone();
        let outcome = orchestrator
            .run_path(&mut path_set, path)
            .map_err(|e| e.to_string())?;
        write_outputs(&path_set, path, &outcome, out_dir)?;
    }
    Ok(())
}

/// Builds the initial set from the configured datasource and attaches
/// sequences and strains.
fn ingest(config: &GlobalConfig) -> Result<ClusterSet, String> {
    let source = config
        .cluster_datasource
        .ok_or_else(|| "the configuration sets no CLUSTER_DATASOURCE".to_string())?;
    let input = config
        .cluster_filename
        .as_ref()
        .ok_or_else(|| "the configuration sets no CLUSTER_FILENAME".to_string())?;

    let mut set = match source {
        DataSource::Blast => {
            let filter = config.cluster_values.clone().unwrap_or_else(HitFilter::pass_all);
            if config.fast_blast_parser {
                ClusterBuilder::from_tabular_path("cluster", filter, None, input).map_err(|e| e.to_string())?
            } else {
                let file = std::fs::File::open(input).map_err(|e| format!("Failed to open {input:?}: {e}"))?;
                let records = read_tabular(std::io::BufReader::new(file)).map_err(|e| e.to_string())?;
                ClusterBuilder::from_records("cluster", filter, None, records)
            }
        }
        DataSource::Ace => read_ace_path(input, AceParams::default()).map_err(|e| e.to_string())?,
    };

    if let Some(fasta_path) = &config.memberseq_filename {
        let records = fasta::read_path(fasta_path).map_err(|e| e.to_string())?;
        let unknown = set.assign_sequences(records);
        if !unknown.is_empty() {
            ftlog::warn!("{} fasta ids belong to no family", unknown.len());
        }
    }
    if let Some(strain_path) = &config.memberstrain_filename {
        let file = std::fs::File::open(strain_path).map_err(|e| format!("Failed to open {strain_path:?}: {e}"))?;
        set.strains = tables::read_strain_table(std::io::BufReader::new(file)).map_err(|e| e.to_string())?;
    }
    Ok(set)
}

/// Writes one path's artifacts under `<out_dir>/path_<id>/`.
fn write_outputs(set: &ClusterSet, path: &PathConfig, outcome: &PathOutcome, out_dir: &Path) -> Result<(), String> {
    let dir = out_dir.join(format!("path_{}", path.id));
    std::fs::create_dir_all(&dir).map_err(|e| format!("Failed to create {dir:?}: {e}"))?;

    let mut membership = create(&dir.join("membership.tab"))?;
    tables::write_memberships(&mut membership, set).map_err(|e| e.to_string())?;

    let mut failed = create(&dir.join("failed.tab"))?;
    for id in &outcome.failed {
        writeln!(failed, "{id}").map_err(|e| e.to_string())?;
    }

    for family in set.iter() {
        if let Some(alignment) = &family.alignment {
            let mut file = create(&dir.join(format!("{}.aln", family.id)))?;
            align_io::write_clustal(&mut file, alignment).map_err(|e| e.to_string())?;
        }
        if let Some(distance) = &family.distance {
            let mut file = create(&dir.join(format!("{}.dist", family.id)))?;
            distance.write_phylip(&mut file).map_err(|e| e.to_string())?;
        }
        if let Some(tree) = &family.tree {
            write_text(&dir.join(format!("{}.nwk", family.id)), &tree.to_newick())?;
        }
        if let Some(bootstrap) = &family.bootstrap {
            write_text(&dir.join(format!("{}.consensus.nwk", family.id)), &bootstrap.to_newick())?;
        }
    }

    if let Some(groups) = &outcome.topologies {
        let mut file = create(&dir.join("topologies.tab"))?;
        for (topology, families) in groups {
            for family in families {
                writeln!(file, "{topology}\t{family}").map_err(|e| e.to_string())?;
            }
        }
    }

    for (operator, report) in &outcome.prune_reports {
        ftlog::info!(
            "path {}: {operator} removed {} families, trimmed {} families",
            path.id,
            report.removed_families.len(),
            report.removed_members.len()
        );
    }
    println!(
        "path {} ('{}'): {} families, {} failed -> {}",
        path.id,
        path.name,
        set.len(),
        outcome.failed.len(),
        dir.display()
    );
    Ok(())
}

/// Creates a file with a readable error.
fn create(path: &Path) -> Result<std::fs::File, String> {
    std::fs::File::create(path).map_err(|e| format!("Failed to create {path:?}: {e}"))
}

/// Writes a whole text file with a readable error.
fn write_text(path: &Path, text: &str) -> Result<(), String> {
    std::fs::write(path, format!("{text}\n")).map_err(|e| format!("Failed to write {path:?}: {e}"))
}
