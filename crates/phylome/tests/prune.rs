//! Tests for the pruning operators against the documented scenarios.

use phylome::{
    prune::{prune_by_bootstrap, prune_by_strains, PruneStrainsParams},
    seq::{Alignment, Member, Row, Strand},
    tree::Tree,
    ClusterSet, Composition, DistanceMatrix, SequenceFamily,
};

/// Five members with strains A, A, B, B, C and the pinned distances of the
/// strain-selection scenario.
fn strain_scenario() -> ClusterSet {
    let ids = ["a1", "a2", "b1", "b2", "c1"];
    let mut family = SequenceFamily::new("fam_001");
    let mut alignment = Alignment::new();
    for id in ids {
        family.insert_member(Member::new(id));
        alignment
            .push_row(Row::new(id, "ACGTACGT".to_string(), Strand::Forward))
            .unwrap();
    }
    family.alignment = Some(alignment);

    let mut distance = DistanceMatrix::new(ids).unwrap();
    distance.set("a1", "b1", 0.1).unwrap();
    distance.set("a1", "c1", 0.2).unwrap();
    distance.set("a2", "b2", 0.3).unwrap();
    for (a, b) in [
        ("a1", "a2"),
        ("a1", "b2"),
        ("a2", "b1"),
        ("a2", "c1"),
        ("b1", "b2"),
        ("b1", "c1"),
        ("b2", "c1"),
    ] {
        distance.set(a, b, 0.9).unwrap();
    }
    family.distance = Some(distance);

    let mut set = ClusterSet::new();
    for (id, strain) in [("a1", "A"), ("a2", "A"), ("b1", "B"), ("b2", "B"), ("c1", "C")] {
        set.strains.insert(id, strain);
    }
    set.insert_family(family);
    set
}

#[test]
fn strain_composition_selects_the_constrained_pairs() {
    let mut set = strain_scenario();
    let params = PruneStrainsParams {
        composition: Composition::new([("A", 1), ("B", 1), ("C", 1)]),
        min_distance: vec![("A".into(), "B".into()), ("A".into(), "C".into())],
        max_distance: Vec::new(),
    };
    let report = prune_by_strains(&mut set, &params).unwrap();

    let family = set.family("fam_001").unwrap();
    assert_eq!(family.member_ids(), vec!["a1", "b1", "c1"]);
    assert!(family.distance.is_none(), "the distance matrix must be cleared");
    assert!(family.tree.is_none());

    assert!(report.removed_families.is_empty());
    assert_eq!(
        report.removed_members.get("fam_001").unwrap(),
        &vec!["a2".to_string(), "b2".to_string()]
    );

    // The alignment was pruned in step with the member set.
    assert_eq!(family.alignment.as_ref().unwrap().len(), family.len());
    family.check_consistency().unwrap();
}

#[test]
fn unsatisfiable_composition_deletes_the_family() {
    let mut set = strain_scenario();
    let params = PruneStrainsParams {
        composition: Composition::new([("A", 3)]),
        ..PruneStrainsParams::default()
    };
    let report = prune_by_strains(&mut set, &params).unwrap();
    assert_eq!(report.removed_families, vec!["fam_001"]);
    assert!(set.is_empty());
}

fn set_with_supports(newick: &str) -> ClusterSet {
    let mut family = SequenceFamily::new("fam_001");
    for id in ["a", "b", "c", "d"] {
        family.insert_member(Member::new(id));
    }
    family.bootstrap = Some(Tree::from_newick(newick).unwrap());
    let mut set = ClusterSet::new();
    set.insert_family(family);
    set
}

#[test]
fn bootstrap_cutoff_removes_weakly_supported_family() {
    // Internal supports 80, 55, 90 with a cutoff of 60: removed.
    let mut set = set_with_supports("(((a:1,b:1)80:1,c:1)55:1,d:1)90;");
    let report = prune_by_bootstrap(&mut set, 60.0);
    assert_eq!(report.removed_families, vec!["fam_001"]);
}

#[test]
fn bootstrap_cutoff_is_noop_when_all_supports_pass() {
    let mut set = set_with_supports("(((a:1,b:1)80:1,c:1)62:1,d:1)90;");
    let report = prune_by_bootstrap(&mut set, 60.0);
    assert!(report.is_noop());
    assert_eq!(set.len(), 1);

    // Idempotent: running again changes nothing.
    let again = prune_by_bootstrap(&mut set, 60.0);
    assert!(again.is_noop());
}
