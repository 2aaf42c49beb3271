//! Pruning by bootstrap support.

use crate::cluster_set::ClusterSet;

use super::PruneReport;

/// Removes every family whose bootstrap consensus tree carries at least one
/// node, excluding the root, with support strictly below `cutoff`.
///
/// Nodes without a support value (the root, leaves) are ignored. Families
/// without a bootstrap consensus are left untouched.
pub fn prune_by_bootstrap(set: &mut ClusterSet, cutoff: f64) -> PruneReport {
    let mut report = PruneReport::default();
    let doomed: Vec<String> = set
        .iter()
        .filter(|family| {
            family
                .bootstrap
                .as_ref()
                .is_some_and(|tree| tree.supports().any(|support| support < cutoff))
        })
        .map(|family| family.id.clone())
        .collect();

    for id in doomed {
        set.remove_family(&id);
        report.family_removed(id);
    }
    ftlog::info!(
        "prune_by_bootstrap(cutoff {cutoff}) removed {} families",
        report.removed_families.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use crate::{cluster_set::ClusterSet, family::SequenceFamily, seq::Member, tree::Tree};

    use super::prune_by_bootstrap;

    fn set_with_consensus(newick: &str) -> ClusterSet {
        let mut fam = SequenceFamily::new("fam_001");
        for id in ["a", "b", "c", "d"] {
            fam.insert_member(Member::new(id));
        }
        fam.bootstrap = Some(Tree::from_newick(newick).unwrap());
        let mut set = ClusterSet::new();
        set.insert_family(fam);
        set
    }

    #[test]
    fn test_low_support_removes_family() {
        // Internal supports 80, 55, 90.
        let mut set = set_with_consensus("(((a:1,b:1)80:1,c:1)55:1,d:1)90;");
        let report = prune_by_bootstrap(&mut set, 60.0);
        assert_eq!(report.removed_families, vec!["fam_001"]);
        assert!(set.is_empty());
    }

    #[test]
    fn test_all_supported_is_noop() {
        let mut set = set_with_consensus("(((a:1,b:1)80:1,c:1)65:1,d:1)90;");
        let report = prune_by_bootstrap(&mut set, 60.0);
        assert!(report.is_noop());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_root_support_ignored() {
        // Only the root dips below the cutoff.
        let mut set = set_with_consensus("(((a:1,b:1)80:1,c:1)65:1,d:1)10;");
        let report = prune_by_bootstrap(&mut set, 60.0);
        assert!(report.is_noop());
    }

    #[test]
    fn test_family_without_consensus_untouched() {
        let mut set = ClusterSet::new();
        set.insert_family(SequenceFamily::new("bare"));
        let report = prune_by_bootstrap(&mut set, 60.0);
        assert!(report.is_noop());
        assert_eq!(set.len(), 1);
    }
}
