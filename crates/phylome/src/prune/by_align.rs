//! Pruning whole families by scalar alignment properties.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{blast::Comparator, cluster_set::ClusterSet, seq::Alignment, Error};

use super::PruneReport;

/// The scalar properties of an alignment a predicate may test.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlignProperty {
    /// The score reported by the alignment program.
    Score,
    /// The alignment width in columns.
    Length,
    /// The total number of non-gap characters.
    NumResidues,
    /// The number of rows.
    NumSequences,
    /// The mean pairwise percentage identity.
    PercentageIdentity,
}

impl AlignProperty {
    /// Extracts the property's value from an alignment.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn value_of(self, alignment: &Alignment) -> f64 {
        match self {
            Self::Score => alignment.score.unwrap_or(0.0),
            Self::Length => alignment.width() as f64,
            Self::NumResidues => alignment.num_residues() as f64,
            Self::NumSequences => alignment.len() as f64,
            Self::PercentageIdentity => alignment.percentage_identity(),
        }
    }
}

impl FromStr for AlignProperty {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim() {
            "score" => Ok(Self::Score),
            "length" => Ok(Self::Length),
            "num_residues" => Ok(Self::NumResidues),
            "num_sequences" => Ok(Self::NumSequences),
            "percentage_identity" => Ok(Self::PercentageIdentity),
            other => Err(Error::input(format!("unknown alignment property '{other}'"))),
        }
    }
}

/// One `(property, comparator, threshold)` removal predicate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AlignPredicate {
    /// The alignment property under test.
    pub property: AlignProperty,
    /// The comparison to apply.
    pub comparator: Comparator,
    /// The integer threshold, compared in `f64` space.
    pub threshold: i64,
}

impl AlignPredicate {
    /// Whether the alignment matches this predicate.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn matches(&self, alignment: &Alignment) -> bool {
        self.comparator
            .compare(self.property.value_of(alignment), self.threshold as f64)
    }
}

impl FromStr for AlignPredicate {
    type Err = Error;

    /// Parses `"<property> <comparator> <integer>"`, e.g.
    /// `"num_sequences < 4"`.
    fn from_str(s: &str) -> Result<Self, Error> {
        let mut parts = s.split_whitespace();
        let (Some(property), Some(comparator), Some(threshold), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::input(format!(
                "bad alignment predicate '{s}', expected '<property> <comparator> <integer>'"
            )));
        };
        Ok(Self {
            property: property.parse()?,
            comparator: comparator.parse()?,
            threshold: threshold
                .parse()
                .map_err(|_| Error::input(format!("non-integer threshold '{threshold}'")))?,
        })
    }
}

/// Removes every family whose alignment matches any of the predicates.
///
/// The predicates are disjunctive: one match is enough. Families without an
/// alignment are never removed. Deleting a family drops its distance, tree
/// and bootstrap with it.
pub fn prune_by_align(set: &mut ClusterSet, predicates: &[AlignPredicate]) -> PruneReport {
    let mut report = PruneReport::default();
    let doomed: Vec<String> = set
        .iter()
        .filter(|family| {
            family
                .alignment
                .as_ref()
                .is_some_and(|alignment| predicates.iter().any(|p| p.matches(alignment)))
        })
        .map(|family| family.id.clone())
        .collect();

    for id in doomed {
        set.remove_family(&id);
        report.family_removed(id);
    }
    ftlog::info!("prune_by_align removed {} families", report.removed_families.len());
    report
}

#[cfg(test)]
mod tests {
    use crate::{
        cluster_set::ClusterSet,
        family::SequenceFamily,
        seq::{Alignment, Member, Row, Strand},
    };

    use super::{prune_by_align, AlignPredicate};

    fn family(id: &str, rows: &[(&str, &str)]) -> SequenceFamily {
        let mut fam = SequenceFamily::new(id);
        let mut aln = Alignment::new();
        for (member, text) in rows {
            fam.insert_member(Member::new(*member));
            aln.push_row(Row::new(*member, (*text).to_string(), Strand::Forward)).unwrap();
        }
        fam.alignment = Some(aln);
        fam
    }

    #[test]
    fn test_disjunction_removes_on_any_match() {
        let mut set = ClusterSet::new();
        set.insert_family(family("keep", &[("a", "ACGTACGT"), ("b", "ACGTACGT"), ("c", "ACGTACGT")]));
        set.insert_family(family("small", &[("d", "ACGTACGT"), ("e", "ACGTACGT")]));
        set.insert_family(family("short", &[("f", "ACG"), ("g", "ACG"), ("h", "ACG")]));

        let predicates: Vec<AlignPredicate> = ["num_sequences < 3", "length < 5"]
            .iter()
            .map(|p| p.parse().unwrap())
            .collect();
        let report = prune_by_align(&mut set, &predicates);

        let mut removed = report.removed_families.clone();
        removed.sort_unstable();
        assert_eq!(removed, vec!["short", "small"]);
        assert_eq!(set.family_ids(), vec!["keep"]);
    }

    #[test]
    fn test_family_without_alignment_kept() {
        let mut set = ClusterSet::new();
        let mut bare = SequenceFamily::new("bare");
        bare.insert_member(Member::new("x"));
        set.insert_family(bare);

        let predicates = vec!["num_sequences < 100".parse::<AlignPredicate>().unwrap()];
        let report = prune_by_align(&mut set, &predicates);
        assert!(report.is_noop());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_unknown_property_rejected() {
        assert!("width < 5".parse::<AlignPredicate>().is_err());
    }
}
