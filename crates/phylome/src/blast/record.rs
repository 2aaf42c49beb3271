//! The tabular blast record schema.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One hit from a tabular blast report: the fixed 12-column schema.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TabularRecord {
    /// Query sequence id.
    pub query: String,
    /// Subject sequence id.
    pub subject: String,
    /// Percentage identity over the aligned region.
    pub pct_identity: f64,
    /// Alignment length.
    pub aln_length: u64,
    /// Number of mismatches.
    pub mismatches: u64,
    /// Number of gap openings.
    pub gap_openings: u64,
    /// 1-based start of the hit on the query.
    pub q_start: u64,
    /// 1-based end of the hit on the query.
    pub q_end: u64,
    /// 1-based start of the hit on the subject. Greater than `s_end` for
    /// reverse-strand hits.
    pub s_start: u64,
    /// 1-based end of the hit on the subject.
    pub s_end: u64,
    /// Expectation value, in scientific notation in the report.
    pub e_value: f64,
    /// Bit score.
    pub bit_score: f64,
}

impl TabularRecord {
    /// Parses a record from the 12 tab-separated fields of one report line.
    ///
    /// # Errors
    ///
    /// If the field count is not 12 or a numeric field does not parse.
    pub fn from_fields(fields: &[&str]) -> Result<Self> {
        if fields.len() != 12 {
            return Err(Error::input(format!(
                "blast record has {} fields, expected 12",
                fields.len()
            )));
        }
        Ok(Self {
            query: fields[0].to_string(),
            subject: fields[1].to_string(),
            pct_identity: parse_num(fields[2], "pct_identity")?,
            aln_length: parse_num(fields[3], "aln_length")?,
            mismatches: parse_num(fields[4], "mismatches")?,
            gap_openings: parse_num(fields[5], "gap_openings")?,
            q_start: parse_num(fields[6], "q_start")?,
            q_end: parse_num(fields[7], "q_end")?,
            s_start: parse_num(fields[8], "s_start")?,
            s_end: parse_num(fields[9], "s_end")?,
            e_value: parse_num(fields[10], "e_value")?,
            bit_score: parse_num(fields[11], "bit_score")?,
        })
    }

    /// Whether this is a self-hit.
    #[must_use]
    pub fn is_self_hit(&self) -> bool {
        self.query == self.subject
    }

    /// Whether the subject coordinates run backwards (reverse-strand hit).
    #[must_use]
    pub fn is_subject_reversed(&self) -> bool {
        self.s_start > self.s_end
    }
}

/// Reads all records of a tabular report.
///
/// # Errors
///
/// [`Error::Input`] on malformed rows.
pub fn read_tabular<R: std::io::Read>(reader: R) -> Result<Vec<TabularRecord>> {
    let mut tsv = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(reader);
    let mut records = Vec::new();
    for row in tsv.records() {
        let row = row.map_err(|e| Error::input(format!("bad blast report row: {e}")))?;
        let fields: Vec<&str> = row.iter().collect();
        records.push(TabularRecord::from_fields(&fields)?);
    }
    Ok(records)
}

/// Parses one numeric field, naming it in the error.
fn parse_num<T: std::str::FromStr>(field: &str, name: &str) -> Result<T> {
    field
        .trim()
        .parse()
        .map_err(|_| Error::input(format!("bad {name} value '{field}' in blast record")))
}
