//! Pairwise distance computation over an alignment.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{matrix::DistanceMatrix, seq::Alignment, seq::GAP, Error, Result};

/// The distance corrections available for nucleotide alignments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceFunction {
    /// The proportion of differing sites (p-distance).
    Uncorrected,
    /// Jukes-Cantor 1969 correction.
    #[default]
    JukesCantor,
    /// Kimura two-parameter correction.
    Kimura2P,
}

impl FromStr for DistanceFunction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uncorrected" | "p" => Ok(Self::Uncorrected),
            "jukescantor" | "jc" | "jc69" => Ok(Self::JukesCantor),
            "kimura" | "k2p" | "k80" => Ok(Self::Kimura2P),
            other => Err(Error::input(format!("unknown distance function '{other}'"))),
        }
    }
}

impl DistanceFunction {
    /// Computes the pairwise distance matrix of an alignment.
    ///
    /// Only columns where both rows carry a base are compared. Saturated
    /// pairs, where the correction diverges, clamp to [`MAX_DISTANCE`].
    ///
    /// # Errors
    ///
    /// [`Error::EmptyInput`] for alignments with fewer than two rows.
    pub fn compute(self, alignment: &Alignment) -> Result<DistanceMatrix> {
        if alignment.len() < 2 {
            return Err(Error::empty("distance computation needs at least two rows"));
        }
        let mut matrix = DistanceMatrix::new(alignment.member_ids())?;
        let rows = alignment.rows();
        for (i, a) in rows.iter().enumerate() {
            for b in &rows[i + 1..] {
                let d = self.pair_distance(a.text.as_bytes(), b.text.as_bytes());
                matrix.set(&a.member_id, &b.member_id, d)?;
            }
        }
        Ok(matrix)
    }

    /// The distance between two gapped rows of equal width.
    #[allow(clippy::cast_precision_loss)]
    fn pair_distance(self, a: &[u8], b: &[u8]) -> f64 {
        let mut sites = 0_usize;
        let mut diffs = 0_usize;
        let mut transitions = 0_usize;
        for (&x, &y) in a.iter().zip(b) {
            if x == GAP || y == GAP {
                continue;
            }
            sites += 1;
            let (x, y) = (x.to_ascii_uppercase(), y.to_ascii_uppercase());
            if x != y {
                diffs += 1;
                if is_transition(x, y) {
                    transitions += 1;
                }
            }
        }
        if sites == 0 {
            return 0.0;
        }
        let p = diffs as f64 / sites as f64;
        match self {
            Self::Uncorrected => p,
            Self::JukesCantor => {
                let arg = 1.0 - 4.0 * p / 3.0;
                if arg <= 0.0 {
                    MAX_DISTANCE
                } else {
                    (-0.75 * arg.ln()).min(MAX_DISTANCE)
                }
            }
            Self::Kimura2P => {
                let ts = transitions as f64 / sites as f64;
                let tv = (diffs - transitions) as f64 / sites as f64;
                let arg1 = 1.0 - 2.0 * ts - tv;
                let arg2 = 1.0 - 2.0 * tv;
                if arg1 <= 0.0 || arg2 <= 0.0 {
                    MAX_DISTANCE
                } else {
                    (-0.5 * (arg1 * arg2.sqrt()).ln()).min(MAX_DISTANCE)
                }
            }
        }
    }
}

/// The clamp for saturated pairwise distances.
pub const MAX_DISTANCE: f64 = 10.0;

/// Whether a substitution is a transition (purine-purine or
/// pyrimidine-pyrimidine).
fn is_transition(x: u8, y: u8) -> bool {
    matches!((x, y), (b'A', b'G') | (b'G', b'A') | (b'C', b'T') | (b'T', b'C'))
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;
    use test_case::test_case;

    use crate::seq::{Alignment, Row, Strand};

    use super::{DistanceFunction, MAX_DISTANCE};

    fn pair(a: &str, b: &str) -> Alignment {
        Alignment::from_rows([
            Row::new("x", a.to_string(), Strand::Forward),
            Row::new("y", b.to_string(), Strand::Forward),
        ])
        .unwrap()
    }

    #[test]
    fn test_uncorrected() {
        let aln = pair("ACGTACGT", "ACGTACGA");
        let matrix = DistanceFunction::Uncorrected.compute(&aln).unwrap();
        assert!(approx_eq!(f64, matrix.get("x", "y").unwrap(), 0.125, epsilon = 1e-12));
    }

    #[test]
    fn test_gap_columns_skipped() {
        let aln = pair("ACGT----", "ACGAACGT");
        let matrix = DistanceFunction::Uncorrected.compute(&aln).unwrap();
        // One difference over four comparable sites.
        assert!(approx_eq!(f64, matrix.get("x", "y").unwrap(), 0.25, epsilon = 1e-12));
    }

    #[test]
    fn test_jukes_cantor_exceeds_p() {
        let aln = pair("ACGTACGT", "ACGTACGA");
        let p = DistanceFunction::Uncorrected.compute(&aln).unwrap().get("x", "y").unwrap();
        let jc = DistanceFunction::JukesCantor.compute(&aln).unwrap().get("x", "y").unwrap();
        assert!(jc > p);
    }

    #[test]
    fn test_saturated_clamps() {
        let aln = pair("AAAA", "GGGG");
        let jc = DistanceFunction::JukesCantor.compute(&aln).unwrap();
        assert!(approx_eq!(f64, jc.get("x", "y").unwrap(), MAX_DISTANCE));
    }

    #[test]
    fn test_kimura_separates_transitions() {
        // One transition (A-G) versus one transversion (A-C) over 8 sites.
        // Transitions saturate faster, so the same count corrects further.
        let ts = pair("ACGTACGT", "GCGTACGT");
        let tv = pair("ACGTACGT", "CCGTACGT");
        let d_ts = DistanceFunction::Kimura2P.compute(&ts).unwrap().get("x", "y").unwrap();
        let d_tv = DistanceFunction::Kimura2P.compute(&tv).unwrap().get("x", "y").unwrap();
        assert!(d_ts > d_tv);
    }

    #[test_case("uncorrected", DistanceFunction::Uncorrected)]
    #[test_case("JC", DistanceFunction::JukesCantor)]
    #[test_case("k2p", DistanceFunction::Kimura2P)]
    fn test_parse(name: &str, expected: DistanceFunction) {
        assert_eq!(name.parse::<DistanceFunction>().unwrap(), expected);
    }

    #[test]
    fn test_single_row_rejected() {
        let aln = Alignment::from_rows([Row::new("x", "ACGT".to_string(), Strand::Forward)]).unwrap();
        assert!(DistanceFunction::JukesCantor.compute(&aln).is_err());
    }
}
