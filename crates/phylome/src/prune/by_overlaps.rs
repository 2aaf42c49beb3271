//! Pruning by jointly-overlapping member selection.

use serde::{Deserialize, Serialize};

use crate::{
    cluster_set::ClusterSet,
    overlaps::{seed_and_extend, SeedExtendParams},
    strain::Composition,
    Result,
};

use super::PruneReport;

/// Parameters of [`prune_by_overlaps`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PruneOverlapsParams {
    /// The required strain composition.
    pub composition: Composition,
    /// The seed-and-extend search parameters.
    pub search: SeedExtendParams,
    /// Trim the surviving alignment to the overlap window.
    pub trim: bool,
    /// Remove all-gap columns from the surviving alignment.
    pub filter_gaps: bool,
}

/// Replaces each family's alignment by its best jointly-overlapping
/// sub-alignment satisfying the composition.
///
/// Families with no valid selection are deleted. When a selection exists,
/// members outside it are removed, the alignment is optionally trimmed to
/// the overlap window and gap-compacted, and the derived artifacts are
/// dropped.
///
/// Families without an alignment are left untouched.
///
/// # Errors
///
/// Propagates alignment-slicing failures; these indicate a broken overlap
/// window and are internal errors.
pub fn prune_by_overlaps(set: &mut ClusterSet, params: &PruneOverlapsParams) -> Result<PruneReport> {
    let mut report = PruneReport::default();
    let mut doomed = Vec::new();
    let strains = set.strains.clone();

    for family in set.iter_mut() {
        let Some(alignment) = &family.alignment else {
            continue;
        };
        let Some(selection) = seed_and_extend(alignment, &strains, &params.composition, &params.search) else {
            doomed.push(family.id.clone());
            continue;
        };

        let mut pruned = alignment.clone();
        pruned.retain_members(|id| selection.member_ids.iter().any(|m| m == id));
        if params.trim {
            pruned = pruned.slice_columns(selection.start, selection.end)?;
        }
        if params.filter_gaps {
            pruned.compact_gaps();
        }

        let removed = family.retain_members(|id| selection.member_ids.iter().any(|m| m == id));
        family.replace_alignment(pruned);
        report.members_removed(family.id.clone(), removed);
    }

    for id in doomed {
        set.remove_family(&id);
        report.family_removed(id);
    }
    ftlog::info!(
        "prune_by_overlaps removed {} families and re-aligned {} others",
        report.removed_families.len(),
        report.removed_members.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use crate::{
        cluster_set::ClusterSet,
        family::SequenceFamily,
        matrix::DistanceMatrix,
        seq::{Alignment, Member, Row, Strand},
        strain::Composition,
    };

    use super::{prune_by_overlaps, PruneOverlapsParams};

    fn set_with_overlapping_family() -> ClusterSet {
        let rows = [
            ("a1", "AACCGGTTAACC----"),
            ("b1", "AACCGGTTAACC----"),
            ("c1", "--CCGGTTAACCTT--"),
            ("a2", "--------------GG"),
        ];
        let mut fam = SequenceFamily::new("fam_001");
        let mut aln = Alignment::new();
        for (id, text) in rows {
            fam.insert_member(Member::new(id));
            aln.push_row(Row::new(id, text.to_string(), Strand::Forward)).unwrap();
        }
        fam.alignment = Some(aln);
        fam.distance = Some(DistanceMatrix::new(rows.iter().map(|(id, _)| *id)).unwrap());

        let mut set = ClusterSet::new();
        for (id, strain) in [("a1", "A"), ("a2", "A"), ("b1", "B"), ("c1", "C")] {
            set.strains.insert(id, strain);
        }
        set.insert_family(fam);
        set
    }

    #[test]
    fn test_alignment_replaced_and_trimmed() {
        let mut set = set_with_overlapping_family();
        let params = PruneOverlapsParams {
            composition: Composition::new([("A", 1), ("B", 1), ("C", 1)]),
            trim: true,
            filter_gaps: true,
            ..PruneOverlapsParams::default()
        };
        let report = prune_by_overlaps(&mut set, &params).unwrap();

        assert!(report.removed_families.is_empty());
        assert_eq!(
            report.removed_members.get("fam_001").unwrap(),
            &vec!["a2".to_string()]
        );

        let family = set.family("fam_001").unwrap();
        assert_eq!(family.member_ids(), vec!["a1", "b1", "c1"]);
        let alignment = family.alignment.as_ref().unwrap();
        assert_eq!(alignment.len(), 3);
        // Trimmed to the shared window, columns 3..12.
        assert_eq!(alignment.width(), 10);
        assert!(family.distance.is_none(), "derived artifacts must be dropped");
    }

    #[test]
    fn test_no_selection_deletes_family() {
        let mut set = set_with_overlapping_family();
        let params = PruneOverlapsParams {
            composition: Composition::new([("A", 2), ("B", 1), ("C", 1)]),
            ..PruneOverlapsParams::default()
        };
        let report = prune_by_overlaps(&mut set, &params).unwrap();
        assert_eq!(report.removed_families, vec!["fam_001"]);
        assert!(set.is_empty());
    }

    #[test]
    fn test_family_without_alignment_untouched() {
        let mut set = ClusterSet::new();
        let mut bare = SequenceFamily::new("bare");
        bare.insert_member(Member::new("x"));
        set.insert_family(bare);
        set.strains.insert("x", "A");

        let report = prune_by_overlaps(&mut set, &PruneOverlapsParams::default()).unwrap();
        assert!(report.is_noop());
        assert_eq!(set.len(), 1);
    }
}
