//! Typed run configuration and its text-file parser.
//!
//! The grammar is line oriented: `KEY: [value]` for global keys and
//! `<N>KEY: [value]` for per-path keys, where `N` is the numeric path id.
//! Values are scalars or sub-key lists of the form `k1 => v1; k2 => v2`
//! (alternatively `k1 = v1, k2 = v2`). `#` starts a comment.

use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    blast::{Condition, HitFilter},
    dist::DistanceFunction,
    external::AlignerKind,
    overlaps::{OverlapMethod, SeedExtendParams},
    prune::{AlignPredicate, PruneOverlapsParams, PruneStrainsParams},
    strain::Composition,
    tree::RerootMode,
    Error, Result,
};

/// Where the initial clusters come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    /// A blast report.
    Blast,
    /// An ACE assembly.
    Ace,
}

/// How the per-family tree is inferred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeMethod {
    /// Neighbor joining over the distance matrix.
    NeighborJoining,
    /// UPGMA over the distance matrix.
    Upgma,
    /// Maximum likelihood over the alignment.
    MaximumLikelihood,
}

/// Arguments of the tree phase beyond the method itself.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TreeArguments {
    /// How to re-root the inferred tree, if at all.
    pub reroot: Option<RerootMode>,
}

/// One analysis path: the chain of per-family phases to run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PathConfig {
    /// The numeric path id from the configuration file.
    pub id: usize,
    /// Human-readable path name.
    pub name: String,
    /// The external alignment program.
    pub alignment_program: Option<AlignerKind>,
    /// Extra arguments passed to the alignment program.
    pub alignment_arguments: Vec<String>,
    /// The distance correction.
    pub distance_function: Option<DistanceFunction>,
    /// Alignment-property removal predicates.
    pub prune_align: Option<Vec<AlignPredicate>>,
    /// Strain-composition pruning.
    pub prune_strains: Option<PruneStrainsParams>,
    /// Overlap pruning.
    pub prune_overlaps: Option<PruneOverlapsParams>,
    /// The tree inference method.
    pub tree_method: Option<TreeMethod>,
    /// Tree phase arguments.
    pub tree_arguments: TreeArguments,
    /// Bootstrap replicate count.
    pub bootstrapping: Option<usize>,
    /// Bootstrap support cutoff for pruning.
    pub filter_bootstrapping: Option<f64>,
    /// Run the topology classification at the end of the path.
    pub topoanalysis: bool,
}

impl PathConfig {
    /// Creates an unconfigured path.
    #[must_use]
    pub fn new(id: usize) -> Self {
        Self {
            id,
            name: format!("path_{id}"),
            alignment_program: None,
            alignment_arguments: Vec::new(),
            distance_function: None,
            prune_align: None,
            prune_strains: None,
            prune_overlaps: None,
            tree_method: None,
            tree_arguments: TreeArguments::default(),
            bootstrapping: None,
            filter_bootstrapping: None,
            topoanalysis: false,
        }
    }
}

/// The whole run configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Where the initial clusters come from.
    pub cluster_datasource: Option<DataSource>,
    /// The blast report or assembly file.
    pub cluster_filename: Option<PathBuf>,
    /// The hit filter for blast clustering.
    pub cluster_values: Option<HitFilter>,
    /// Read the blast report with the fast tabular parser.
    pub fast_blast_parser: bool,
    /// Fasta file with member sequences.
    pub memberseq_filename: Option<PathBuf>,
    /// Strain table file.
    pub memberstrain_filename: Option<PathBuf>,
    /// The analysis paths, in id order.
    pub paths: Vec<PathConfig>,
}

impl GlobalConfig {
    /// Parses a configuration file.
    ///
    /// # Errors
    ///
    /// [`Error::Input`] on grammar violations or unknown keys;
    /// [`Error::Argument`] on mutually incompatible options.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::parse(std::io::BufReader::new(file))
    }

    /// Parses a configuration from a reader.
    ///
    /// # Errors
    ///
    /// [`Error::Input`] on grammar violations or unknown keys;
    /// [`Error::Argument`] on mutually incompatible options.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut config = Self::default();
        let mut paths: BTreeMap<usize, PathConfig> = BTreeMap::new();

        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let (key_part, value_part) = line
                .split_once(':')
                .ok_or_else(|| Error::input(format!("config line {}: missing ':'", number + 1)))?;
            let value = value_part.trim();
            let value = value
                .strip_prefix('[')
                .and_then(|v| v.strip_suffix(']'))
                .ok_or_else(|| Error::input(format!("config line {}: value must be bracketed", number + 1)))?
                .trim();

            let key_part = key_part.trim();
            let digits: String = key_part.chars().take_while(char::is_ascii_digit).collect();
            let key = &key_part[digits.len()..];
            if digits.is_empty() {
                config.apply_global(key, value)?;
            } else {
                let id: usize = digits
                    .parse()
                    .map_err(|_| Error::input(format!("bad path id '{digits}'")))?;
                let path = paths.entry(id).or_insert_with(|| PathConfig::new(id));
                apply_path_key(path, key, value)?;
            }
        }

        config.paths = paths.into_values().collect();
        config.validate()?;
        Ok(config)
    }

    /// Applies one global key.
    fn apply_global(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "CLUSTER_DATASOURCE" => {
                self.cluster_datasource = Some(match value.to_ascii_lowercase().as_str() {
                    "blast" => DataSource::Blast,
                    "ace" => DataSource::Ace,
                    other => return Err(Error::input(format!("unknown cluster datasource '{other}'"))),
                });
            }
            "CLUSTER_FILENAME" => self.cluster_filename = Some(PathBuf::from(value)),
            "CLUSTER_VALUES" => {
                let pairs = sub_pairs(value)
                    .ok_or_else(|| Error::input("CLUSTER_VALUES needs 'field => <cmp> <int>' entries"))?;
                let conditions = pairs
                    .into_iter()
                    .map(|(field, condition)| format!("{field} {condition}").parse::<Condition>())
                    .collect::<Result<Vec<_>>>()?;
                self.cluster_values = Some(HitFilter::new(conditions));
            }
            "FASTBLASTPARSER" => self.fast_blast_parser = parse_flag(value)?,
            "MEMBERSEQ_FILENAME" => self.memberseq_filename = Some(PathBuf::from(value)),
            "MEMBERSTRAIN_FILENAME" => self.memberstrain_filename = Some(PathBuf::from(value)),
            other => return Err(Error::input(format!("unknown global key '{other}'"))),
        }
        Ok(())
    }

    /// Checks cross-option consistency.
    fn validate(&self) -> Result<()> {
        if self.fast_blast_parser {
            if self.cluster_datasource != Some(DataSource::Blast) {
                return Err(Error::argument(
                    "FASTBLASTPARSER needs CLUSTER_DATASOURCE set to blast",
                ));
            }
            if self.cluster_filename.is_none() {
                return Err(Error::argument("FASTBLASTPARSER needs a CLUSTER_FILENAME"));
            }
        }
        for path in &self.paths {
            if path.filter_bootstrapping.is_some() && path.bootstrapping.is_none() {
                return Err(Error::argument(format!(
                    "path {}: FILTER_BOOTSTRAPPING needs RUN_BOOTSTRAPPING",
                    path.id
                )));
            }
            if let Some(RerootMode::ReferenceStrain(_)) = path.tree_arguments.reroot {
                if path.tree_method.is_none() {
                    return Err(Error::argument(format!(
                        "path {}: an outgroup strain needs a tree method",
                        path.id
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Applies one per-path key.
fn apply_path_key(path: &mut PathConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "PATH_NAME" => path.name = value.to_string(),
        "RUN_ALIGNMENT_PROGRAM" => path.alignment_program = Some(value.parse()?),
        "RUN_ALIGNMENT_ARGUMENTS" => {
            path.alignment_arguments = value.split_whitespace().map(str::to_string).collect();
        }
        "RUN_DISTANCE_FUNCTION" => path.distance_function = Some(value.parse()?),
        "PRUNE_ALIGN_ARGUMENTS" => {
            let pairs = sub_pairs(value)
                .ok_or_else(|| Error::input("PRUNE_ALIGN_ARGUMENTS needs 'property => <cmp> <int>' entries"))?;
            let predicates = pairs
                .into_iter()
                .map(|(property, predicate)| format!("{property} {predicate}").parse::<AlignPredicate>())
                .collect::<Result<Vec<_>>>()?;
            path.prune_align = Some(predicates);
        }
        "PRUNE_STRAINS_ARGUMENTS" => path.prune_strains = Some(parse_prune_strains(value)?),
        "PRUNE_OVERLAPS_ARGUMENTS" => path.prune_overlaps = Some(parse_prune_overlaps(value)?),
        "RUN_TREE_METHOD" => {
            path.tree_method = Some(match value.to_ascii_uppercase().as_str() {
                "NJ" => TreeMethod::NeighborJoining,
                "UPGMA" => TreeMethod::Upgma,
                "ML" => TreeMethod::MaximumLikelihood,
                other => return Err(Error::input(format!("unknown tree method '{other}'"))),
            });
        }
        "RUN_TREE_ARGUMENTS" => path.tree_arguments = parse_tree_arguments(value)?,
        "RUN_BOOTSTRAPPING" => {
            let replicates = match sub_pairs(value) {
                Some(pairs) => pairs
                    .into_iter()
                    .find(|(k, _)| k == "replicates")
                    .map(|(_, v)| v)
                    .ok_or_else(|| Error::input("RUN_BOOTSTRAPPING needs a 'replicates' entry"))?,
                None => value.to_string(),
            };
            path.bootstrapping = Some(
                replicates
                    .trim()
                    .parse()
                    .map_err(|_| Error::input(format!("bad bootstrap replicate count '{replicates}'")))?,
            );
        }
        "FILTER_BOOTSTRAPPING" => {
            path.filter_bootstrapping = Some(
                value
                    .parse()
                    .map_err(|_| Error::input(format!("bad bootstrap cutoff '{value}'")))?,
            );
        }
        "RUN_TOPOANALYSIS" => path.topoanalysis = parse_flag(value)?,
        other => return Err(Error::input(format!("unknown path key '{other}'"))),
    }
    Ok(())
}

/// Parses `PRUNE_STRAINS_ARGUMENTS`: `composition => A:1 B:1;
/// min_distance => A-B A-C; max_distance => ...`.
fn parse_prune_strains(value: &str) -> Result<PruneStrainsParams> {
    let pairs = sub_pairs(value)
        .ok_or_else(|| Error::input("PRUNE_STRAINS_ARGUMENTS needs sub-key entries"))?;
    let mut params = PruneStrainsParams::default();
    for (key, entry) in pairs {
        match key.as_str() {
            "composition" => params.composition = parse_composition(&entry)?,
            "min_distance" => params.min_distance = parse_strain_pairs(&entry)?,
            "max_distance" => params.max_distance = parse_strain_pairs(&entry)?,
            other => return Err(Error::input(format!("unknown prune_strains sub-key '{other}'"))),
        }
    }
    Ok(params)
}

/// Parses `PRUNE_OVERLAPS_ARGUMENTS`: `composition => A:1 B:1;
/// method => score; evalseed => 3; minlength => 100; minidentity => 80;
/// trim => 1; filter_gaps => 1`.
fn parse_prune_overlaps(value: &str) -> Result<PruneOverlapsParams> {
    let pairs = sub_pairs(value)
        .ok_or_else(|| Error::input("PRUNE_OVERLAPS_ARGUMENTS needs sub-key entries"))?;
    let mut params = PruneOverlapsParams::default();
    let mut search = SeedExtendParams::default();
    for (key, entry) in pairs {
        match key.as_str() {
            "composition" => params.composition = parse_composition(&entry)?,
            "method" => {
                search.method = match entry.to_ascii_lowercase().as_str() {
                    "length" => OverlapMethod::Length,
                    "score" | "ovlscore" => OverlapMethod::Score,
                    other => return Err(Error::input(format!("unknown overlap method '{other}'"))),
                };
            }
            "evalseed" => {
                search.evalseed = entry
                    .parse()
                    .map_err(|_| Error::input(format!("bad evalseed '{entry}'")))?;
            }
            "minlength" => {
                search.min_length =
                    Some(entry.parse().map_err(|_| Error::input(format!("bad minlength '{entry}'")))?);
            }
            "minidentity" => {
                search.min_identity =
                    Some(entry.parse().map_err(|_| Error::input(format!("bad minidentity '{entry}'")))?);
            }
            "trim" => params.trim = parse_flag(&entry)?,
            "filter_gaps" | "filter" => params.filter_gaps = parse_flag(&entry)?,
            other => return Err(Error::input(format!("unknown prune_overlaps sub-key '{other}'"))),
        }
    }
    params.search = search;
    Ok(params)
}

/// Parses `RUN_TREE_ARGUMENTS`: `reroot => midpoint|longest;
/// outgroup_strain => A`.
fn parse_tree_arguments(value: &str) -> Result<TreeArguments> {
    let mut arguments = TreeArguments::default();
    let Some(pairs) = sub_pairs(value) else {
        return Ok(arguments);
    };
    for (key, entry) in pairs {
        match key.as_str() {
            "reroot" => {
                arguments.reroot = Some(match entry.to_ascii_lowercase().as_str() {
                    "midpoint" => RerootMode::Midpoint,
                    "longest" => RerootMode::LongestMember,
                    other => return Err(Error::input(format!("unknown reroot mode '{other}'"))),
                });
            }
            "outgroup_strain" => {
                if arguments.reroot.is_some() {
                    return Err(Error::argument(
                        "outgroup_strain cannot be combined with another reroot mode",
                    ));
                }
                arguments.reroot = Some(RerootMode::ReferenceStrain(entry));
            }
            other => return Err(Error::input(format!("unknown tree argument '{other}'"))),
        }
    }
    Ok(arguments)
}

/// Parses a composition entry: `A:1 B:2`.
fn parse_composition(value: &str) -> Result<Composition> {
    let mut required = Vec::new();
    for token in value.split_whitespace() {
        let (strain, count) = token
            .split_once(':')
            .ok_or_else(|| Error::input(format!("bad composition entry '{token}', expected 'strain:count'")))?;
        let count: usize = count
            .parse()
            .map_err(|_| Error::input(format!("bad composition count '{count}'")))?;
        required.push((strain.to_string(), count));
    }
    Ok(Composition::new(required))
}

/// Parses a strain-pair list: `A-B A-C`.
fn parse_strain_pairs(value: &str) -> Result<Vec<(String, String)>> {
    value
        .split_whitespace()
        .map(|token| {
            token
                .split_once('-')
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .ok_or_else(|| Error::input(format!("bad strain pair '{token}', expected 'A-B'")))
        })
        .collect()
}

/// Splits a sub-key list: `k1 => v1; k2 => v2` or `k1 = v1, k2 = v2`.
/// Returns `None` for scalar values.
fn sub_pairs(value: &str) -> Option<Vec<(String, String)>> {
    let (item_sep, pair_sep) = if value.contains("=>") {
        (';', "=>")
    } else if value.contains('=') {
        (',', "=")
    } else {
        return None;
    };
    let mut pairs = Vec::new();
    for item in value.split(item_sep) {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let (key, entry) = item.split_once(pair_sep)?;
        pairs.push((key.trim().to_string(), entry.trim().to_string()));
    }
    Some(pairs)
}

/// Parses a boolean flag: `1`/`0`, `yes`/`no`, `true`/`false`.
fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" => Ok(true),
        "0" | "no" | "false" | "" => Ok(false),
        other => Err(Error::input(format!("bad flag value '{other}'"))),
    }
}
