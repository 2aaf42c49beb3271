//! Assembly (ACE-style) ingestion: one family per contig.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use crate::{
    cluster_set::ClusterSet,
    family::SequenceFamily,
    seq::{Alignment, Member, Row, Strand},
    Error, Result,
};

/// Options for assembly ingestion.
#[derive(Clone, Copy, Debug, Default)]
pub struct AceParams {
    /// Discard contigs holding a single read.
    pub nosinglets: bool,
}

/// Placement of a read within its contig, from an `AF` record.
#[derive(Clone, Debug)]
struct Placement {
    /// Whether the read is complemented.
    complemented: bool,
    /// 1-based padded start of the read on the consensus; may be < 1.
    pad_start: i64,
}

/// Clip window of a read, from a `QA` record.
#[derive(Clone, Copy, Debug)]
struct Clip {
    /// 1-based first kept base of the padded read.
    start: i64,
    /// 1-based last kept base of the padded read.
    end: i64,
}

/// One `RD` record: the padded read sequence.
#[derive(Clone, Debug)]
struct PaddedRead {
    /// Read id.
    id: String,
    /// Padded sequence, `*` for pads.
    seq: String,
    /// Clip window from the following `QA` record.
    clip: Option<Clip>,
}

/// One `CO` record with its reads.
#[derive(Clone, Debug, Default)]
struct Contig {
    /// Contig id.
    id: String,
    /// Padded consensus sequence, `*` for pads.
    consensus: String,
    /// Read placements by read id.
    placements: HashMap<String, Placement>,
    /// The reads, in file order.
    reads: Vec<PaddedRead>,
}

/// Reads an ACE assembly file into families, one per contig.
///
/// # Errors
///
/// [`Error::Input`] on malformed tag records; I/O errors opening the file.
pub fn read_ace_path<P: AsRef<Path>>(path: P, params: AceParams) -> Result<ClusterSet> {
    let file = std::fs::File::open(path)?;
    read_ace(std::io::BufReader::new(file), params)
}

/// Reads an ACE assembly into families, one per contig.
///
/// For every read, the gapped row is the read clipped to its `QA` align
/// window, placed at its padded consensus start (positions below 1 are
/// normalised to 1), padded with gaps to the contig width, with `*` pads
/// rewritten to `-`.
///
/// # Errors
///
/// [`Error::Input`] on malformed tag records.
pub fn read_ace<R: BufRead>(reader: R, params: AceParams) -> Result<ClusterSet> {
    let mut contigs: Vec<Contig> = Vec::new();
    let mut n_declared: Option<(usize, usize)> = None;

    let mut lines = reader.lines();
    while let Some(line) = lines.next() {
        let line = line?;
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("AS") => {
                let n_contigs = parse_field(fields.next(), "AS contig count")?;
                let n_reads = parse_field(fields.next(), "AS read count")?;
                n_declared = Some((n_contigs, n_reads));
            }
            Some("CO") => {
                let id = fields
                    .next()
                    .ok_or_else(|| Error::input("CO record without a contig id"))?
                    .to_string();
                // bases, reads, segments are declared but the sequence is
                // authoritative; the complement flag applies to the
                // consensus itself and is not used here.
                let consensus = read_sequence_block(&mut lines)?;
                contigs.push(Contig {
                    id,
                    consensus,
                    ..Contig::default()
                });
            }
            Some("AF") => {
                let contig = current_contig(&mut contigs, "AF")?;
                let id = fields
                    .next()
                    .ok_or_else(|| Error::input("AF record without a read id"))?
                    .to_string();
                let comp = fields
                    .next()
                    .ok_or_else(|| Error::input(format!("AF record for '{id}' without a complement flag")))?;
                let complemented = match comp {
                    "C" => true,
                    "U" => false,
                    other => return Err(Error::input(format!("bad complement flag '{other}' for read '{id}'"))),
                };
                let pad_start = parse_field(fields.next(), "AF padded start")?;
                contig.placements.insert(id, Placement { complemented, pad_start });
            }
            Some("RD") => {
                let contig = current_contig(&mut contigs, "RD")?;
                let id = fields
                    .next()
                    .ok_or_else(|| Error::input("RD record without a read id"))?
                    .to_string();
                let seq = read_sequence_block(&mut lines)?;
                contig.reads.push(PaddedRead { id, seq, clip: None });
            }
            Some("QA") => {
                let contig = current_contig(&mut contigs, "QA")?;
                let read = contig
                    .reads
                    .last_mut()
                    .ok_or_else(|| Error::input("QA record before any RD record"))?;
                // Fields: qual start, qual end, align start, align end.
                let _qual_start: i64 = parse_field(fields.next(), "QA qual start")?;
                let _qual_end: i64 = parse_field(fields.next(), "QA qual end")?;
                let start = parse_field(fields.next(), "QA align start")?;
                let end = parse_field(fields.next(), "QA align end")?;
                read.clip = Some(Clip { start, end });
            }
            // BQ quality blocks and tag records are not used.
            _ => {}
        }
    }

    if let Some((n_contigs, _)) = n_declared {
        if n_contigs != contigs.len() {
            ftlog::debug!("AS declared {n_contigs} contigs, file holds {}", contigs.len());
        }
    }

    let mut set = ClusterSet::new();
    for contig in contigs {
        let family = build_family(contig)?;
        if params.nosinglets && family.len() < 2 {
            ftlog::debug!("dropping single-read contig '{}'", family.id);
            continue;
        }
        set.insert_family(family);
    }
    Ok(set)
}

/// Turns a parsed contig into a family with one aligned row per read.
fn build_family(contig: Contig) -> Result<SequenceFamily> {
    let width = contig.consensus.len();
    let mut family = SequenceFamily::new(contig.id.clone());
    let mut alignment = Alignment::new();
    alignment.consensus = Some(contig.consensus.replace('*', "-"));
    alignment.description = Some(format!("assembly contig {}", contig.id));
    alignment.source = Some("ace".to_string());

    for read in contig.reads {
        let placement = contig
            .placements
            .get(&read.id)
            .ok_or_else(|| Error::input(format!("read '{}' has no AF record", read.id)))?;
        let clip = read
            .clip
            .ok_or_else(|| Error::input(format!("read '{}' has no QA record", read.id)))?;
        if clip.start < 1 || clip.end < clip.start {
            ftlog::debug!("skipping unaligned read '{}'", read.id);
            continue;
        }
        let (start, end) = (usize::try_from(clip.start).unwrap_or(1), usize::try_from(clip.end).unwrap_or(0));
        if end > read.seq.len() {
            return Err(Error::input(format!(
                "read '{}' clip window {start}..={end} exceeds its {} bases",
                read.id,
                read.seq.len()
            )));
        }
        let clipped = &read.seq[start - 1..end];

        let position = usize::try_from(placement.pad_start.max(1)).unwrap_or(1);
        if position - 1 + clipped.len() > width {
            return Err(Error::input(format!(
                "read '{}' extends past the consensus width {width}",
                read.id
            )));
        }
        let mut text = String::with_capacity(width);
        text.push_str(&"-".repeat(position - 1));
        text.push_str(&clipped.replace('*', "-"));
        text.push_str(&"-".repeat(width - (position - 1) - clipped.len()));

        let strand = if placement.complemented { Strand::Reverse } else { Strand::Forward };
        let row = Row::new(read.id.clone(), text, strand);
        let unpadded = row.ungapped();
        alignment.push_row(row)?;
        family.insert_member(Member::with_seq(read.id, unpadded));
    }

    family.alignment = Some(alignment);
    Ok(family)
}

/// The contig most recently opened by a `CO` record.
fn current_contig<'a>(contigs: &'a mut [Contig], tag: &str) -> Result<&'a mut Contig> {
    contigs
        .last_mut()
        .ok_or_else(|| Error::input(format!("{tag} record before any CO record")))
}

/// Reads sequence lines up to the next blank line, concatenated.
fn read_sequence_block<B: BufRead>(lines: &mut std::io::Lines<B>) -> Result<String> {
    let mut seq = String::new();
    for line in lines.by_ref() {
        let line = line?;
        if line.trim().is_empty() {
            break;
        }
        seq.push_str(line.trim());
    }
    Ok(seq)
}

/// Parses one whitespace-separated numeric field, naming it in the error.
fn parse_field<T: std::str::FromStr>(field: Option<&str>, name: &str) -> Result<T> {
    let field = field.ok_or_else(|| Error::input(format!("missing {name}")))?;
    field
        .parse()
        .map_err(|_| Error::input(format!("bad {name} '{field}'")))
}
