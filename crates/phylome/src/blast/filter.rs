//! Filter expressions over blast records.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

use super::record::TabularRecord;

/// An explicit comparison operator. Unknown symbols are rejected at parse
/// time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    /// `<`
    Less,
    /// `<=`
    LessEq,
    /// `==`
    Equal,
    /// `>=`
    GreaterEq,
    /// `>`
    Greater,
}

impl Comparator {
    /// Applies the comparison.
    #[must_use]
    pub fn compare(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Less => value < threshold,
            Self::LessEq => value <= threshold,
            Self::Equal => (value - threshold).abs() < f64::EPSILON,
            Self::GreaterEq => value >= threshold,
            Self::Greater => value > threshold,
        }
    }
}

impl FromStr for Comparator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "<" => Ok(Self::Less),
            "<=" => Ok(Self::LessEq),
            "==" => Ok(Self::Equal),
            ">=" => Ok(Self::GreaterEq),
            ">" => Ok(Self::Greater),
            other => Err(Error::input(format!("unknown comparator '{other}'"))),
        }
    }
}

impl std::fmt::Display for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Self::Less => "<",
            Self::LessEq => "<=",
            Self::Equal => "==",
            Self::GreaterEq => ">=",
            Self::Greater => ">",
        };
        write!(f, "{symbol}")
    }
}

/// The numeric fields of a [`TabularRecord`] a filter may test.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterField {
    /// Percentage identity.
    PctIdentity,
    /// Alignment length.
    AlnLength,
    /// Mismatch count.
    Mismatches,
    /// Gap-opening count.
    GapOpenings,
    /// Query start.
    QStart,
    /// Query end.
    QEnd,
    /// Subject start.
    SStart,
    /// Subject end.
    SEnd,
    /// Expectation value.
    EValue,
    /// Bit score.
    BitScore,
}

impl FilterField {
    /// Extracts the field's value from a record.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn value_of(self, record: &TabularRecord) -> f64 {
        match self {
            Self::PctIdentity => record.pct_identity,
            Self::AlnLength => record.aln_length as f64,
            Self::Mismatches => record.mismatches as f64,
            Self::GapOpenings => record.gap_openings as f64,
            Self::QStart => record.q_start as f64,
            Self::QEnd => record.q_end as f64,
            Self::SStart => record.s_start as f64,
            Self::SEnd => record.s_end as f64,
            Self::EValue => record.e_value,
            Self::BitScore => record.bit_score,
        }
    }
}

impl FromStr for FilterField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "pct_identity" | "percentage_identity" => Ok(Self::PctIdentity),
            "aln_length" | "align_length" => Ok(Self::AlnLength),
            "mismatches" => Ok(Self::Mismatches),
            "gap_openings" | "gapsopenings" => Ok(Self::GapOpenings),
            "q_start" => Ok(Self::QStart),
            "q_end" => Ok(Self::QEnd),
            "s_start" => Ok(Self::SStart),
            "s_end" => Ok(Self::SEnd),
            "e_value" | "evalue" => Ok(Self::EValue),
            "bit_score" | "score" => Ok(Self::BitScore),
            other => Err(Error::input(format!("unknown filter field '{other}'"))),
        }
    }
}

/// One `(field, comparator, threshold)` triple.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Condition {
    /// The record field under test.
    pub field: FilterField,
    /// The comparison to apply.
    pub comparator: Comparator,
    /// The integer threshold, compared in `f64` space.
    pub threshold: i64,
}

impl Condition {
    /// Whether the record passes this condition.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn matches(&self, record: &TabularRecord) -> bool {
        self.comparator.compare(self.field.value_of(record), self.threshold as f64)
    }
}

impl FromStr for Condition {
    type Err = Error;

    /// Parses `"<field> <comparator> <integer>"`, e.g. `"aln_length > 60"`.
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        let (Some(field), Some(comparator), Some(threshold), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::input(format!(
                "bad filter condition '{s}', expected '<field> <comparator> <integer>'"
            )));
        };
        Ok(Self {
            field: field.parse()?,
            comparator: comparator.parse()?,
            threshold: threshold
                .parse()
                .map_err(|_| Error::input(format!("non-integer threshold '{threshold}'")))?,
        })
    }
}

/// A conjunction of conditions: a hit is admitted when every condition
/// passes.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct HitFilter {
    /// The conditions, all of which must pass.
    conditions: Vec<Condition>,
}

impl HitFilter {
    /// Creates a filter that admits everything.
    #[must_use]
    pub fn pass_all() -> Self {
        Self::default()
    }

    /// Creates a filter from conditions.
    #[must_use]
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }

    /// Parses a filter from condition strings.
    ///
    /// # Errors
    ///
    /// If any condition does not parse.
    pub fn parse<I, S>(conditions: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let conditions = conditions
            .into_iter()
            .map(|c| c.as_ref().parse())
            .collect::<Result<Vec<Condition>>>()?;
        Ok(Self::new(conditions))
    }

    /// Whether the record passes every condition.
    #[must_use]
    pub fn matches(&self, record: &TabularRecord) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
    }

    /// The conditions.
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}
