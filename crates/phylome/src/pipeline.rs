//! The per-path orchestrator: ingest → alignment → distance → tree →
//! bootstrap, with pruning at the configured points.
//!
//! All mutations of the `ClusterSet` happen on the coordinating thread;
//! per-family work (external tools, resampling, distance arithmetic) runs
//! on a rayon pool and hands its results back for a single-writer apply
//! step at each phase boundary. A family whose external tool fails or
//! times out lands on the phase's `failed` list and never disturbs its
//! siblings.

use std::collections::HashMap;
use std::io::Write as _;
use std::path::Path;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::{
    cluster_set::ClusterSet,
    config::{PathConfig, TreeArguments, TreeMethod},
    dist::DistanceFunction,
    external::{AlignerKind, Runner, TreeProgram},
    family::SequenceFamily,
    io::{align_io, fasta, progress},
    matrix::DistanceMatrix,
    prune::{prune_by_align, prune_by_bootstrap, prune_by_overlaps, prune_by_strains, PruneReport},
    seq::{Alignment, Row},
    tree::{RerootMode, Tree},
    Error, Result,
};

/// Families a phase could not complete.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PhaseOutcome {
    /// Ids of the families whose work failed; their artifacts are left
    /// unset.
    pub failed: Vec<String>,
}

impl PhaseOutcome {
    /// Merges another outcome into this one.
    fn absorb(&mut self, other: Self) {
        self.failed.extend(other.failed);
    }
}

/// Everything a full path run produced besides the mutated set.
#[derive(Clone, Debug, Default)]
pub struct PathOutcome {
    /// Families that failed in any phase.
    pub failed: Vec<String>,
    /// Reports of the pruning operators that ran, in order.
    pub prune_reports: Vec<(String, PruneReport)>,
    /// Topology groups, when the path asked for the classification.
    pub topologies: Option<std::collections::BTreeMap<String, Vec<String>>>,
}

/// Drives families through the phases of an analysis path.
#[derive(Debug)]
pub struct Orchestrator<'r, R: Runner> {
    /// The external-tool seam.
    runner: &'r R,
    /// Seed for bootstrap resampling; per-family streams derive from it.
    seed: u64,
    /// Wall-clock allowance per external invocation.
    timeout: Option<Duration>,
}

impl<'r, R: Runner + Sync> Orchestrator<'r, R> {
    /// Creates an orchestrator over the given runner.
    #[must_use]
    pub fn new(runner: &'r R, seed: u64, timeout: Option<Duration>) -> Self {
        Self { runner, seed, timeout }
    }

    /// Runs one configured path over the set.
    ///
    /// # Errors
    ///
    /// Validation errors surface immediately; per-family tool failures are
    /// collected into the outcome instead.
    pub fn run_path(&self, set: &mut ClusterSet, path: &PathConfig) -> Result<PathOutcome> {
        ftlog::info!("running path {} ('{}') over {} families", path.id, path.name, set.len());
        let mut outcome = PathOutcome::default();

        if let Some(program) = path.alignment_program {
            let phase = self.run_alignments(set, program, &path.alignment_arguments)?;
            outcome.failed.extend(phase.failed);
        }
        if let Some(predicates) = &path.prune_align {
            let report = prune_by_align(set, predicates);
            outcome.prune_reports.push(("prune_by_align".to_string(), report));
        }
        if let Some(params) = &path.prune_overlaps {
            let report = prune_by_overlaps(set, params)?;
            outcome.prune_reports.push(("prune_by_overlaps".to_string(), report));
        }
        if let Some(function) = path.distance_function {
            let phase = self.run_distances(set, function);
            outcome.failed.extend(phase.failed);
        }
        if let Some(params) = &path.prune_strains {
            let report = prune_by_strains(set, params)?;
            outcome.prune_reports.push(("prune_by_strains".to_string(), report));
        }
        if let Some(method) = path.tree_method {
            let phase = self.run_trees(set, method, &path.tree_arguments)?;
            outcome.failed.extend(phase.failed);
        }
        if let Some(replicates) = path.bootstrapping {
            let function = path.distance_function.unwrap_or_default();
            let phase = self.run_bootstrap(set, replicates, function)?;
            outcome.failed.extend(phase.failed);
        }
        if let Some(cutoff) = path.filter_bootstrapping {
            let report = prune_by_bootstrap(set, cutoff);
            outcome.prune_reports.push(("prune_by_bootstrap".to_string(), report));
        }
        if path.topoanalysis {
            let groups = crate::topo::classify(set);
            ftlog::info!("path {}: {} distinct topologies", path.id, groups.len());
            outcome.topologies = Some(groups);
        }

        outcome.failed.sort_unstable();
        outcome.failed.dedup();
        ftlog::info!(
            "path {} finished: {} families survive, {} failed",
            path.id,
            set.len(),
            outcome.failed.len()
        );
        Ok(outcome)
    }

    /// Aligns every family with at least two sequenced members through the
    /// external aligner.
    ///
    /// # Errors
    ///
    /// [`Error::Argument`] when no family has member sequences at all.
    pub fn run_alignments(&self, set: &mut ClusterSet, program: AlignerKind, extra_args: &[String]) -> Result<PhaseOutcome> {
        let jobs: Vec<(String, Vec<(String, String)>)> = set
            .iter()
            .filter(|family| family.len() >= 2)
            .map(|family| {
                let seqs = family
                    .members()
                    .filter_map(|m| m.seq.clone().map(|s| (m.id.clone(), s)))
                    .collect::<Vec<_>>();
                (family.id.clone(), seqs)
            })
            .collect();
        if jobs.iter().all(|(_, seqs)| seqs.is_empty()) {
            return Err(Error::argument(
                "run_alignments needs member sequences; none are loaded",
            ));
        }

        let results: Vec<(String, Result<Alignment>)> = jobs
            .into_par_iter()
            .map(|(id, seqs)| {
                let result = self.align_family(&id, &seqs, program, extra_args);
                (id, result)
            })
            .collect();

        Ok(apply_phase(set, results, "aligning families", |family, mut alignment| {
            alignment.source = Some(program.program().to_string());
            family.alignment = Some(alignment);
            family.clear_derived();
        }))
    }

    /// Runs the aligner for one family.
    fn align_family(
        &self,
        id: &str,
        seqs: &[(String, String)],
        program: AlignerKind,
        extra_args: &[String],
    ) -> Result<Alignment> {
        if seqs.len() < 2 {
            return Err(Error::empty(format!("family '{id}' has fewer than two sequenced members")));
        }
        let scratch = tempfile::tempdir()?;
        let input = scratch.path().join("family.fasta");
        let output = scratch.path().join("family.aln");
        {
            let mut file = std::fs::File::create(&input)?;
            fasta::write(&mut file, seqs.iter().map(|(id, seq)| (id.as_str(), seq.as_str())))?;
        }

        let mut spec = program.spec(&input, &output, extra_args.iter().cloned());
        if let Some(timeout) = self.timeout {
            spec = spec.with_timeout(timeout);
        }
        let tool_output = self.runner.run(&spec)?;

        // mafft writes the alignment to stdout; the others to the output
        // file.
        let text = if program == AlignerKind::Mafft {
            tool_output.stdout
        } else {
            std::fs::read_to_string(&output)?
        };
        align_io::read_fasta(text.as_bytes())
    }

    /// Computes the distance matrix of every aligned family, in process.
    pub fn run_distances(&self, set: &mut ClusterSet, function: DistanceFunction) -> PhaseOutcome {
        let jobs: Vec<(String, Alignment)> = set
            .iter()
            .filter_map(|family| family.alignment.clone().map(|a| (family.id.clone(), a)))
            .collect();

        let results: Vec<(String, Result<DistanceMatrix>)> = jobs
            .into_par_iter()
            .map(|(id, alignment)| {
                let result = function.compute(&alignment);
                (id, result)
            })
            .collect();

        apply_phase(set, results, "computing distances", |family, distance| {
            family.distance = Some(distance);
            family.tree = None;
            family.bootstrap = None;
        })
    }

    /// Infers a tree for every family through the external tree program,
    /// then re-roots it as configured.
    ///
    /// # Errors
    ///
    /// Validation errors surface immediately.
    pub fn run_trees(&self, set: &mut ClusterSet, method: TreeMethod, arguments: &TreeArguments) -> Result<PhaseOutcome> {
        let jobs: Vec<(String, Option<DistanceMatrix>, Option<Alignment>)> = set
            .iter()
            .map(|family| (family.id.clone(), family.distance.clone(), family.alignment.clone()))
            .collect();

        let results: Vec<(String, Result<Tree>)> = jobs
            .into_par_iter()
            .map(|(id, distance, alignment)| {
                let result = self.infer_tree(&id, method, distance.as_ref(), alignment.as_ref());
                (id, result)
            })
            .collect();

        let mut outcome = apply_phase(set, results, "inferring trees", |family, tree| {
            family.tree = Some(tree);
            family.bootstrap = None;
        });

        if let Some(mode) = &arguments.reroot {
            outcome.absorb(reroot_trees(set, mode));
        }
        Ok(outcome)
    }

    /// Runs one family through the tree program.
    fn infer_tree(
        &self,
        id: &str,
        method: TreeMethod,
        distance: Option<&DistanceMatrix>,
        alignment: Option<&Alignment>,
    ) -> Result<Tree> {
        let scratch = tempfile::tempdir()?;
        match method {
            TreeMethod::NeighborJoining | TreeMethod::Upgma => {
                let distance = distance
                    .ok_or_else(|| Error::empty(format!("family '{id}' has no distance matrix for tree inference")))?;
                let menu = if method == TreeMethod::Upgma { "N\nY\n" } else { "Y\n" };
                self.neighbor_tree(distance, scratch.path(), menu)
            }
            TreeMethod::MaximumLikelihood => {
                let alignment = alignment
                    .ok_or_else(|| Error::empty(format!("family '{id}' has no alignment for tree inference")))?;
                if alignment.len() < 2 {
                    return Err(Error::empty(format!("family '{id}' has fewer than two aligned members")));
                }
                let (safe, back) = safe_labels(&alignment.member_ids());
                let mut renamed = Alignment::new();
                for (row, name) in alignment.rows().iter().zip(&safe) {
                    renamed.push_row(Row::new(name.clone(), row.text.clone(), row.strand))?;
                }
                {
                    let mut infile = std::fs::File::create(scratch.path().join("infile"))?;
                    align_io::write_phylip(&mut infile, &renamed)?;
                }
                let mut spec = TreeProgram::Dnaml.spec(scratch.path(), "Y\n");
                if let Some(timeout) = self.timeout {
                    spec = spec.with_timeout(timeout);
                }
                self.runner.run(&spec)?;
                let mut tree = read_outtree(scratch.path())?;
                relabel_leaves(&mut tree, &back);
                Ok(tree)
            }
        }
    }

    /// Runs phylip `neighbor` over a distance matrix, mapping the labels
    /// through phylip-safe names and back.
    fn neighbor_tree(&self, distance: &DistanceMatrix, scratch: &Path, menu: &str) -> Result<Tree> {
        let (safe, back) = safe_labels(distance.labels());
        let mut renamed = distance.clone();
        for (old, new) in distance.labels().to_vec().iter().zip(&safe) {
            renamed.rename(old, new)?;
        }
        {
            let mut infile = std::fs::File::create(scratch.join("infile"))?;
            renamed.write_phylip(&mut infile)?;
        }
        let mut spec = TreeProgram::Neighbor.spec(scratch, menu);
        if let Some(timeout) = self.timeout {
            spec = spec.with_timeout(timeout);
        }
        self.runner.run(&spec)?;
        let mut tree = read_outtree(scratch)?;
        relabel_leaves(&mut tree, &back);
        Ok(tree)
    }

    /// Builds the bootstrap consensus of every aligned family:
    /// column-resampled replicates, each through distance and `neighbor`,
    /// summarised by `consense`.
    ///
    /// # Errors
    ///
    /// [`Error::Argument`] on a zero replicate count.
    pub fn run_bootstrap(&self, set: &mut ClusterSet, replicates: usize, function: DistanceFunction) -> Result<PhaseOutcome> {
        if replicates == 0 {
            return Err(Error::argument("bootstrapping needs at least one replicate"));
        }
        let jobs: Vec<(String, Alignment)> = set
            .iter()
            .filter_map(|family| family.alignment.clone().map(|a| (family.id.clone(), a)))
            .collect();

        let results: Vec<(String, Result<Tree>)> = jobs
            .into_par_iter()
            .map(|(id, alignment)| {
                let result = self.bootstrap_family(&id, &alignment, replicates, function);
                (id, result)
            })
            .collect();

        Ok(apply_phase(set, results, "bootstrapping", |family, tree| {
            family.bootstrap = Some(tree);
        }))
    }

    /// Bootstraps one family.
    #[allow(clippy::cast_precision_loss)]
    fn bootstrap_family(&self, id: &str, alignment: &Alignment, replicates: usize, function: DistanceFunction) -> Result<Tree> {
        if alignment.len() < 2 {
            return Err(Error::empty(format!("family '{id}' has fewer than two aligned members")));
        }

        // A per-family stream keeps replicates deterministic regardless of
        // scheduling order.
        let stream = id.bytes().fold(self.seed, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(b)));
        let mut rng = StdRng::seed_from_u64(stream);

        let (safe, back) = safe_labels(&alignment.member_ids());
        let scratch = tempfile::tempdir()?;
        let mut replicate_trees = String::new();
        for _ in 0..replicates {
            let resampled = resample_columns(alignment, &mut rng)?;
            let mut distance = function.compute(&resampled)?;
            for (old, new) in resampled.member_ids().iter().zip(&safe) {
                distance.rename(old, new)?;
            }
            let replicate_dir = tempfile::tempdir()?;
            {
                let mut infile = std::fs::File::create(replicate_dir.path().join("infile"))?;
                distance.write_phylip(&mut infile)?;
            }
            let mut spec = TreeProgram::Neighbor.spec(replicate_dir.path(), "Y\n");
            if let Some(timeout) = self.timeout {
                spec = spec.with_timeout(timeout);
            }
            self.runner.run(&spec)?;
            let tree = read_outtree(replicate_dir.path())?;
            replicate_trees.push_str(&tree.to_newick());
            replicate_trees.push('\n');
        }

        std::fs::write(scratch.path().join("intree"), replicate_trees)?;
        let mut spec = TreeProgram::Consense.spec(scratch.path(), "Y\n");
        if let Some(timeout) = self.timeout {
            spec = spec.with_timeout(timeout);
        }
        self.runner.run(&spec)?;
        let mut consensus = read_outtree(scratch.path())?;

        // consense reports clade frequencies as branch lengths; convert
        // them to percent supports on the internal nodes.
        let root = consensus.root();
        for idx in 0..consensus.len() {
            if idx != root && !consensus.is_leaf(idx) {
                let count = consensus.node(idx).branch_length;
                consensus.node_mut(idx).support = Some(100.0 * count / replicates as f64);
            }
        }
        relabel_leaves(&mut consensus, &back);
        Ok(consensus)
    }
}

/// Applies per-family results on the coordinating thread, reporting
/// progress and collecting failures.
fn apply_phase<T>(
    set: &mut ClusterSet,
    results: Vec<(String, Result<T>)>,
    message: &str,
    apply: impl Fn(&mut SequenceFamily, T),
) -> PhaseOutcome {
    let total = results.len();
    let mut outcome = PhaseOutcome::default();
    let mut stderr = std::io::stderr();
    for (done, (id, result)) in results.into_iter().enumerate() {
        let _ = progress::report(&mut stderr, message, done + 1, total, &id);
        match result {
            Ok(artifact) => {
                if let Some(family) = set.family_mut(&id) {
                    apply(family, artifact);
                }
            }
            Err(error) => {
                ftlog::warn!("family '{id}' failed while {message}: {error}");
                outcome.failed.push(id);
            }
        }
    }
    let _ = writeln!(stderr);
    outcome
}

/// Re-roots every family tree in the requested mode. Families the mode
/// cannot re-root are reported failed and left unchanged.
fn reroot_trees(set: &mut ClusterSet, mode: &RerootMode) -> PhaseOutcome {
    let mut outcome = PhaseOutcome::default();
    let strains = set.strains.clone();
    for family in set.iter_mut() {
        if family.tree.is_none() {
            continue;
        }
        let lengths: HashMap<String, usize> = family
            .members()
            .map(|m| (m.id.clone(), m.seq_len()))
            .collect();
        let Some(tree) = &mut family.tree else {
            continue;
        };
        let result = match mode {
            RerootMode::Midpoint => tree.reroot_midpoint().map(|_| true),
            RerootMode::ReferenceStrain(strain) => {
                tree.reroot_reference_strain(|label| strains.strain_of(label) == Some(strain.as_str()))
            }
            RerootMode::LongestMember => tree
                .reroot_longest(|label| lengths.get(label).copied().unwrap_or(0))
                .map(|()| true),
        };
        match result {
            Ok(true) => {}
            Ok(false) => {
                ftlog::debug!("family '{}' could not be re-rooted", family.id);
                outcome.failed.push(family.id.clone());
            }
            Err(error) => {
                ftlog::warn!("family '{}' re-rooting failed: {error}", family.id);
                outcome.failed.push(family.id.clone());
            }
        }
    }
    outcome
}

/// Resamples alignment columns with replacement, keeping row order.
fn resample_columns<G: Rng>(alignment: &Alignment, rng: &mut G) -> Result<Alignment> {
    let width = alignment.width();
    if width == 0 {
        return Err(Error::empty("cannot resample an empty alignment"));
    }
    let columns: Vec<usize> = (0..width).map(|_| rng.random_range(0..width)).collect();
    let rows = alignment.rows().iter().map(|row| {
        let bytes = row.text.as_bytes();
        let text: String = columns.iter().map(|&c| bytes[c] as char).collect();
        Row::new(row.member_id.clone(), text, row.strand)
    });
    Alignment::from_rows(rows)
}

/// Phylip-safe sequential labels plus the way back.
fn safe_labels(ids: &[String]) -> (Vec<String>, HashMap<String, String>) {
    let safe: Vec<String> = (0..ids.len()).map(|i| format!("t{i:08}")).collect();
    let back = safe.iter().cloned().zip(ids.iter().cloned()).collect();
    (safe, back)
}

/// Renames tree leaves through the map.
fn relabel_leaves(tree: &mut Tree, back: &HashMap<String, String>) {
    for idx in 0..tree.len() {
        let node = tree.node_mut(idx);
        if let Some(label) = &node.label {
            if let Some(original) = back.get(label) {
                node.label = Some(original.clone());
            }
        }
    }
}

/// Reads and parses the `outtree` a phylip program left in its working
/// directory.
fn read_outtree(dir: &Path) -> Result<Tree> {
    let text = std::fs::read_to_string(dir.join("outtree"))?;
    Tree::from_newick(text.replace(['\n', '\r'], "").trim())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use crate::{
        cluster_set::ClusterSet,
        config::{PathConfig, TreeMethod},
        dist::DistanceFunction,
        external::{Runner, ToolOutput, ToolSpec},
        family::SequenceFamily,
        seq::Member,
        Error, Result,
    };

    use super::Orchestrator;

    /// A scripted runner: answers aligner calls by copying its canned
    /// alignment, and `neighbor`/`consense` calls by writing a canned
    /// `outtree` into the working directory.
    struct StubRunner {
        /// Gapped fasta the "aligner" returns.
        alignment: String,
        /// Newick the "tree program" returns.
        outtree: String,
        /// Programs invoked, in order.
        calls: Mutex<Vec<String>>,
    }

    impl StubRunner {
        fn new(alignment: &str, outtree: &str) -> Self {
            Self {
                alignment: alignment.to_string(),
                outtree: outtree.to_string(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl Runner for StubRunner {
        fn run(&self, spec: &ToolSpec) -> Result<ToolOutput> {
            self.calls.lock().unwrap().push(spec.program.clone());
            match spec.program.as_str() {
                "clustalw" => {
                    let outfile = spec
                        .args
                        .iter()
                        .find_map(|a| a.strip_prefix("-OUTFILE="))
                        .ok_or_else(|| Error::argument("missing -OUTFILE"))?;
                    std::fs::write(outfile, &self.alignment)?;
                }
                "neighbor" | "consense" | "dnaml" => {
                    let dir = spec.workdir.as_ref().ok_or_else(|| Error::argument("missing workdir"))?;
                    std::fs::write(dir.join("outtree"), &self.outtree)?;
                }
                other => {
                    return Err(Error::ToolFailure {
                        tool: other.to_string(),
                        status: "unexpected".to_string(),
                        stdout: String::new(),
                        stderr: String::new(),
                    })
                }
            }
            Ok(ToolOutput {
                stdout: String::new(),
                stderr: String::new(),
                status: 0,
            })
        }
    }

    fn seeded_set() -> ClusterSet {
        let mut set = ClusterSet::new();
        let mut fam = SequenceFamily::new("fam_001");
        fam.insert_member(Member::with_seq("m1", "ACGTACGTAC"));
        fam.insert_member(Member::with_seq("m2", "ACGTACGTAA"));
        fam.insert_member(Member::with_seq("m3", "ACGTACGAAA"));
        set.insert_family(fam);
        set
    }

    #[test]
    fn test_full_path_with_stub_tools() {
        // The stub aligner must emit the real member ids.
        let alignment = ">m1\nACGTACGTAC\n>m2\nACGTACGTAA\n>m3\nACGTACGAAA\n";
        let outtree = "((t00000000:0.1,t00000001:0.1):0.05,t00000002:0.2);\n";
        let runner = StubRunner::new(alignment, outtree);
        let orchestrator = Orchestrator::new(&runner, 42, None);

        let mut path = PathConfig::new(1);
        path.alignment_program = Some("clustalw".parse().unwrap());
        path.distance_function = Some(DistanceFunction::JukesCantor);
        path.tree_method = Some(TreeMethod::NeighborJoining);
        path.bootstrapping = Some(3);

        let mut set = seeded_set();
        let outcome = orchestrator.run_path(&mut set, &path).unwrap();
        assert!(outcome.failed.is_empty(), "failed: {:?}", outcome.failed);

        let family = set.family("fam_001").unwrap();
        assert!(family.alignment.is_some());
        assert!(family.distance.is_some());
        let tree = family.tree.as_ref().unwrap();
        let mut leaves = tree.leaf_labels();
        leaves.sort_unstable();
        assert_eq!(leaves, vec!["m1", "m2", "m3"]);
        assert!(family.bootstrap.is_some());

        let calls = runner.calls.lock().unwrap();
        assert!(calls.iter().any(|c| c == "clustalw"));
        assert!(calls.iter().any(|c| c == "neighbor"));
        assert!(calls.iter().any(|c| c == "consense"));
    }

    #[test]
    fn test_tool_failure_is_isolated() {
        struct FailingRunner;
        impl Runner for FailingRunner {
            fn run(&self, spec: &ToolSpec) -> Result<ToolOutput> {
                Err(Error::ToolFailure {
                    tool: spec.program.clone(),
                    status: "exit code 1".to_string(),
                    stdout: String::new(),
                    stderr: "boom".to_string(),
                })
            }
        }

        let orchestrator = Orchestrator::new(&FailingRunner, 42, None);
        let mut set = seeded_set();
        let outcome = orchestrator
            .run_alignments(&mut set, "clustalw".parse().unwrap(), &[])
            .unwrap();
        assert_eq!(outcome.failed, vec!["fam_001"]);
        // The family survives, artifact unset.
        assert!(set.family("fam_001").unwrap().alignment.is_none());
    }

    #[test]
    fn test_alignments_without_sequences_rejected() {
        let runner = StubRunner::new("", "");
        let orchestrator = Orchestrator::new(&runner, 42, None);

        let mut set = ClusterSet::new();
        let mut fam = SequenceFamily::new("fam_001");
        fam.insert_member(Member::new("m1"));
        fam.insert_member(Member::new("m2"));
        set.insert_family(fam);

        let err = orchestrator
            .run_alignments(&mut set, "clustalw".parse().unwrap(), &[])
            .unwrap_err();
        assert!(matches!(err, Error::Argument(_)));
    }

    #[test]
    fn test_bootstrap_supports_scaled() {
        let alignment = ">m1\nACGTACGTAC\n>m2\nACGTACGTAA\n>m3\nACGTACGAAA\n";
        // consense-style outtree: clade frequencies as branch lengths.
        let outtree = "((t00000000:2,t00000001:2):2,t00000002:2);\n";
        let runner = StubRunner::new(alignment, outtree);
        let orchestrator = Orchestrator::new(&runner, 42, None);

        let mut set = seeded_set();
        orchestrator.run_alignments(&mut set, "clustalw".parse().unwrap(), &[]).unwrap();
        let outcome = orchestrator
            .run_bootstrap(&mut set, 2, DistanceFunction::Uncorrected)
            .unwrap();
        assert!(outcome.failed.is_empty());

        let consensus = set.family("fam_001").unwrap().bootstrap.as_ref().unwrap();
        let supports: Vec<f64> = consensus.supports().collect();
        assert_eq!(supports, vec![100.0]);
    }

}
