//! Recruiting homologous sequences into a family by consensus blast.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    blast::{read_tabular, HitFilter, TabularRecord},
    external::{blast_spec, Runner},
    family::SequenceFamily,
    seq::{reverse_complement, Member, Row, Strand},
    strain::StrainMap,
    Error, Result,
};

/// Parameters of [`recruit_homologs`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecruitParams {
    /// The blast program to run, e.g. `blastn`.
    pub program: String,
    /// The formatted database; its fasta provides subject sequences.
    pub database: PathBuf,
    /// Hits to keep; `None` keeps only the best-bit-score hit.
    pub filter: Option<HitFilter>,
    /// Strain assigned to every recruited member.
    pub strain: Option<String>,
    /// Defline file annotating database subjects, indexed on first use.
    pub deflines: Option<PathBuf>,
    /// Wall-clock allowance for the blast run.
    pub timeout: Option<Duration>,
}

/// Blasts the family consensus against an external database and adds every
/// kept hit as a new member with a gap-padded alignment row.
///
/// The consensus comes from the alignment metadata when present and is
/// synthesized by majority rule otherwise. Returns the recruited member
/// ids.
///
/// # Errors
///
/// - [`Error::EmptyInput`] when the family has no alignment.
/// - [`Error::ToolFailure`] from the blast run, isolated to this family.
/// - [`Error::Input`] when a hit references an unknown subject or does not
///   fit the alignment.
pub fn recruit_homologs<R: Runner>(
    family: &mut SequenceFamily,
    strains: &mut StrainMap,
    params: &RecruitParams,
    runner: &R,
) -> Result<Vec<String>> {
    let alignment = family
        .alignment
        .as_ref()
        .ok_or_else(|| Error::empty(format!("family '{}' has no alignment to recruit into", family.id)))?;
    let consensus = match &alignment.consensus {
        Some(consensus) => consensus.clone(),
        None => alignment.majority_consensus()?,
    };
    let query_seq: String = consensus.chars().filter(|&c| c != '-').collect();

    let scratch = tempfile::tempdir()?;
    let query_path = scratch.path().join("consensus.fasta");
    {
        let mut query = std::fs::File::create(&query_path)?;
        crate::io::fasta::write(&mut query, [(family.id.as_str(), query_seq.as_str())])?;
    }

    let mut spec = blast_spec(&params.program, &params.database, &query_path);
    if let Some(timeout) = params.timeout {
        spec = spec.with_timeout(timeout);
    }
    let output = runner.run(&spec)?;
    let records = read_tabular(output.stdout.as_bytes())?;

    let kept = select_hits(records, params.filter.as_ref(), family);
    if kept.is_empty() {
        return Ok(Vec::new());
    }

    let subjects = crate::io::fasta::read_map(&params.database)?;
    let deflines = match &params.deflines {
        Some(path) => {
            let file = std::fs::File::open(path)?;
            crate::io::tables::read_deflines(std::io::BufReader::new(file))?
        }
        None => std::collections::HashMap::new(),
    };

    let mut added = Vec::new();
    for hit in kept {
        let subject_seq = subjects
            .get(&hit.subject)
            .ok_or_else(|| Error::input(format!("hit subject '{}' is not in the database fasta", hit.subject)))?;
        apply_hit(family, &hit, subject_seq)?;
        if let Some(strain) = &params.strain {
            strains.insert(hit.subject.clone(), strain.clone());
        }
        match deflines.get(&hit.subject) {
            Some(description) => ftlog::info!("recruited '{}' ({description})", hit.subject),
            None => ftlog::debug!("recruited '{}'", hit.subject),
        }
        added.push(hit.subject);
    }
    ftlog::info!("recruited {} members into family '{}'", added.len(), family.id);
    Ok(added)
}

/// Applies the filter policy: every passing hit, or the single best by bit
/// score when no filter is given. Hits on existing members are dropped.
fn select_hits(records: Vec<TabularRecord>, filter: Option<&HitFilter>, family: &SequenceFamily) -> Vec<TabularRecord> {
    let candidates: Vec<TabularRecord> = records
        .into_iter()
        .filter(|r| !family.contains(&r.subject))
        .collect();
    match filter {
        Some(filter) => candidates.into_iter().filter(|r| filter.matches(r)).collect(),
        None => candidates
            .into_iter()
            .max_by(|a, b| {
                a.bit_score
                    .partial_cmp(&b.bit_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .into_iter()
            .collect(),
    }
}

/// Adds one hit to the family: the subject substring of the hit, reverse
/// complemented for descending subject coordinates, padded with gaps to
/// occupy `[q_start, q_start + len - 1]` of the alignment.
///
/// # Errors
///
/// [`Error::Input`] when the hit coordinates do not fit the subject or the
/// alignment.
pub fn apply_hit(family: &mut SequenceFamily, hit: &TabularRecord, subject_seq: &str) -> Result<()> {
    let alignment = family
        .alignment
        .as_mut()
        .ok_or_else(|| Error::empty(format!("family '{}' has no alignment", family.id)))?;

    let (lo, hi) = if hit.is_subject_reversed() {
        (hit.s_end, hit.s_start)
    } else {
        (hit.s_start, hit.s_end)
    };
    let (lo, hi) = (usize::try_from(lo).unwrap_or(0), usize::try_from(hi).unwrap_or(0));
    if lo == 0 || hi > subject_seq.len() {
        return Err(Error::input(format!(
            "hit coordinates {lo}..={hi} do not fit subject '{}' of {} bases",
            hit.subject,
            subject_seq.len()
        )));
    }
    let mut hit_seq = subject_seq[lo - 1..hi].to_string();
    let strand = if hit.is_subject_reversed() {
        hit_seq = reverse_complement(&hit_seq);
        Strand::Reverse
    } else {
        Strand::Forward
    };

    let width = alignment.width();
    let q_start = usize::try_from(hit.q_start).unwrap_or(0);
    if q_start == 0 || q_start - 1 + hit_seq.len() > width {
        return Err(Error::input(format!(
            "hit on '{}' spans columns {q_start}..{} outside the alignment width {width}",
            hit.subject,
            q_start + hit_seq.len() - 1
        )));
    }

    let mut text = String::with_capacity(width);
    text.push_str(&"-".repeat(q_start - 1));
    text.push_str(&hit_seq);
    text.push_str(&"-".repeat(width - (q_start - 1) - hit_seq.len()));

    alignment.push_row(Row::new(hit.subject.clone(), text, strand))?;
    family.insert_member(Member::with_seq(hit.subject.clone(), hit_seq));
    family.clear_derived();
    Ok(())
}
