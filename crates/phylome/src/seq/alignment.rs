//! Gapped alignment rows and the `Alignment` aggregate.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

use super::member::Strand;

/// The canonical gap character.
pub const GAP: u8 = b'-';

/// One gapped row of an alignment, referencing its member by id.
///
/// `start` and `end` are the 1-based columns of the first and last non-gap
/// characters. A row of nothing but gaps has `start == end == 0`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Row {
    /// Id of the member this row belongs to.
    pub member_id: String,
    /// 1-based column of the first non-gap character, 0 for an all-gap row.
    pub start: usize,
    /// 1-based column of the last non-gap character, 0 for an all-gap row.
    pub end: usize,
    /// Strand of the member relative to the alignment.
    pub strand: Strand,
    /// The gapped row text.
    pub text: String,
}

impl Row {
    /// Creates a row from gapped text, computing its non-gap span.
    #[must_use]
    pub fn new<S: Into<String>>(member_id: S, text: String, strand: Strand) -> Self {
        let (start, end) = span(text.as_bytes());
        Self {
            member_id: member_id.into(),
            start,
            end,
            strand,
            text,
        }
    }

    /// The row text with all gaps removed.
    #[must_use]
    pub fn ungapped(&self) -> String {
        self.text.bytes().filter(|&b| b != GAP).map(char::from).collect()
    }

    /// The number of non-gap characters in the row.
    #[must_use]
    pub fn residue_count(&self) -> usize {
        self.text.len() - bytecount::count(self.text.as_bytes(), GAP)
    }

    /// Recomputes `start` and `end` from the row text.
    pub fn refresh_span(&mut self) {
        let (start, end) = span(self.text.as_bytes());
        self.start = start;
        self.end = end;
    }
}

/// Returns the 1-based first and last non-gap columns, or `(0, 0)` for an
/// all-gap row.
fn span(text: &[u8]) -> (usize, usize) {
    let first = text.iter().position(|&b| b != GAP);
    let last = text.iter().rposition(|&b| b != GAP);
    match (first, last) {
        (Some(f), Some(l)) => (f + 1, l + 1),
        _ => (0, 0),
    }
}

/// An ordered collection of equal-width gapped rows, with optional consensus
/// and metadata.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Alignment {
    /// The rows, in insertion order.
    rows: Vec<Row>,
    /// The consensus sequence, when one was computed or ingested.
    pub consensus: Option<String>,
    /// Free-text description of where the alignment came from.
    pub description: Option<String>,
    /// Score reported by the program that produced the alignment.
    pub score: Option<f64>,
    /// Name of the program that produced the alignment.
    pub source: Option<String>,
}

impl Alignment {
    /// Creates an empty alignment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an alignment from rows.
    ///
    /// # Errors
    ///
    /// If the rows do not all have the same width, or a member id repeats.
    pub fn from_rows<I: IntoIterator<Item = Row>>(rows: I) -> Result<Self> {
        let mut aln = Self::new();
        for row in rows {
            aln.push_row(row)?;
        }
        Ok(aln)
    }

    /// Appends a row.
    ///
    /// # Errors
    ///
    /// If the row width differs from the alignment width, or the member id is
    /// already present.
    pub fn push_row(&mut self, row: Row) -> Result<()> {
        if !self.rows.is_empty() && row.text.len() != self.width() {
            return Err(Error::input(format!(
                "row '{}' has width {} but the alignment has width {}",
                row.member_id,
                row.text.len(),
                self.width()
            )));
        }
        if self.row(&row.member_id).is_some() {
            return Err(Error::input(format!(
                "member '{}' appears twice in the alignment",
                row.member_id
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// The number of columns. An empty alignment has width 0.
    #[must_use]
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, |r| r.text.len())
    }

    /// The number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the alignment has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The rows, in insertion order.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Looks up a row by member id.
    #[must_use]
    pub fn row(&self, member_id: &str) -> Option<&Row> {
        self.rows.iter().find(|r| r.member_id == member_id)
    }

    /// The member ids of all rows, in insertion order.
    #[must_use]
    pub fn member_ids(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.member_id.clone()).collect()
    }

    /// Keeps only the rows whose member id satisfies the predicate, returning
    /// the ids of the rows that were dropped.
    pub fn retain_members<P: Fn(&str) -> bool>(&mut self, keep: P) -> Vec<String> {
        let mut dropped = Vec::new();
        self.rows.retain(|r| {
            if keep(&r.member_id) {
                true
            } else {
                dropped.push(r.member_id.clone());
                false
            }
        });
        dropped
    }

    /// Removes the row of the given member, if present.
    pub fn remove_member(&mut self, member_id: &str) -> Option<Row> {
        let idx = self.rows.iter().position(|r| r.member_id == member_id)?;
        Some(self.rows.remove(idx))
    }

    /// Returns a new alignment holding only the columns `start..=end`
    /// (1-based inclusive). The consensus, when present, is sliced to the
    /// same window; metadata is carried over.
    ///
    /// # Errors
    ///
    /// If the window is empty or extends past the alignment width.
    pub fn slice_columns(&self, start: usize, end: usize) -> Result<Self> {
        if start == 0 || end < start || end > self.width() {
            return Err(Error::argument(format!(
                "column window {start}..={end} is not valid for an alignment of width {}",
                self.width()
            )));
        }
        let rows = self.rows.iter().map(|r| {
            let text = r.text[start - 1..end].to_string();
            Row::new(r.member_id.clone(), text, r.strand)
        });
        let mut sliced = Self::from_rows(rows)?;
        sliced.consensus = self.consensus.as_ref().map(|c| c[start - 1..end].to_string());
        sliced.description.clone_from(&self.description);
        sliced.source.clone_from(&self.source);
        Ok(sliced)
    }

    /// Removes every column in which all rows carry a gap. Spans and the
    /// consensus are recomputed to the compacted coordinates.
    pub fn compact_gaps(&mut self) {
        let width = self.width();
        let keep: Vec<bool> = (0..width)
            .map(|c| self.rows.iter().any(|r| r.text.as_bytes()[c] != GAP))
            .collect();
        if keep.iter().all(|&k| k) {
            return;
        }
        for row in &mut self.rows {
            let bytes = row.text.as_bytes();
            row.text = (0..width).filter(|&c| keep[c]).map(|c| bytes[c] as char).collect();
            row.refresh_span();
        }
        if let Some(consensus) = &self.consensus {
            let bytes = consensus.as_bytes();
            self.consensus = Some((0..width).filter(|&c| keep[c]).map(|c| bytes[c] as char).collect());
        }
    }

    /// The total number of non-gap characters across all rows.
    #[must_use]
    pub fn num_residues(&self) -> usize {
        self.rows.iter().map(Row::residue_count).sum()
    }

    /// The mean pairwise identity over the full width, as a percentage.
    ///
    /// Columns where both rows carry a gap count as matches. Returns 0 for
    /// alignments with fewer than two rows.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percentage_identity(&self) -> f64 {
        let width = self.width();
        if self.rows.len() < 2 || width == 0 {
            return 0.0;
        }
        let mut total = 0.0;
        let mut pairs = 0_usize;
        for (i, a) in self.rows.iter().enumerate() {
            for b in &self.rows[i + 1..] {
                let matches = a
                    .text
                    .bytes()
                    .zip(b.text.bytes())
                    .filter(|(x, y)| x == y)
                    .count();
                total += 100.0 * matches as f64 / width as f64;
                pairs += 1;
            }
        }
        total / pairs as f64
    }

    /// Synthesizes a majority-rule consensus: the most frequent character of
    /// each column, ties broken by byte order.
    ///
    /// # Errors
    ///
    /// If the alignment has no rows.
    pub fn majority_consensus(&self) -> Result<String> {
        if self.rows.is_empty() {
            return Err(Error::empty("cannot build a consensus from an empty alignment"));
        }
        let width = self.width();
        let mut consensus = String::with_capacity(width);
        for c in 0..width {
            let mut counts = [0_usize; 256];
            for row in &self.rows {
                counts[row.text.as_bytes()[c] as usize] += 1;
            }
            let best = (0..=255_usize)
                .max_by_key(|&b| (counts[b], 255 - b))
                .unwrap_or(usize::from(GAP));
            consensus.push(best as u8 as char);
        }
        Ok(consensus)
    }

    /// The row with the most non-gap characters, if any.
    #[must_use]
    pub fn longest_row(&self) -> Option<&Row> {
        self.rows.iter().max_by_key(|r| r.residue_count())
    }
}
