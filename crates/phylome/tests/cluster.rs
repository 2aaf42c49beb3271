//! Tests for blast clustering and family bookkeeping.

use phylome::{
    blast::{ClusterBuilder, HitFilter, TabularRecord},
    io::tables,
};

/// Builds one tabular record from its 12 fields.
fn hit(query: &str, subject: &str, pct: f64, len: u64) -> TabularRecord {
    let line = format!("{query}\t{subject}\t{pct}\t{len}\t0\t0\t1\t{len}\t1\t{len}\t1e-20\t100");
    let fields: Vec<&str> = line.split('\t').collect();
    TabularRecord::from_fields(&fields).unwrap()
}

#[test]
fn filtered_admission() {
    // q1->s1 passes the filter, q1->s2 fails both conditions.
    let filter = HitFilter::parse(["pct_identity > 75", "aln_length > 60"]).unwrap();
    let records = vec![hit("q1", "s1", 95.0, 120), hit("q1", "s2", 70.0, 40)];
    let set = ClusterBuilder::from_records("fam", filter, None, records);

    assert_eq!(set.len(), 1);
    let family = set.family("fam_001").unwrap();
    assert!(family.contains("q1") && family.contains("s1"));
    assert!(!family.contains("s2"));
}

#[test]
fn renumbering_is_zero_padded_and_descending() {
    let records = vec![
        hit("a", "a", 100.0, 100),
        hit("b", "b1", 95.0, 120),
        hit("b", "b2", 95.0, 120),
        hit("c", "c1", 95.0, 120),
    ];
    let set = ClusterBuilder::from_records("fam", HitFilter::pass_all(), None, records);

    let ids = set.family_ids();
    assert_eq!(ids, vec!["fam_001", "fam_002", "fam_003"]);

    let sizes: Vec<usize> = ids.iter().map(|id| set.family(id).unwrap().len()).collect();
    let mut sorted = sizes.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(sizes, sorted, "ids must follow descending member count");
}

#[test]
fn renumbering_ties_keep_appearance_order() {
    // Two clusters of equal size; the one seeded first keeps the lower id.
    let records = vec![hit("x", "x1", 95.0, 120), hit("y", "y1", 95.0, 120)];
    let set = ClusterBuilder::from_records("fam", HitFilter::pass_all(), None, records);

    assert!(set.family("fam_001").unwrap().contains("x"));
    assert!(set.family("fam_002").unwrap().contains("y"));
}

#[test]
fn first_assignment_wins_across_queries() {
    let records = vec![
        hit("q1", "shared", 95.0, 120),
        hit("q2", "shared", 99.0, 200),
        hit("q2", "own", 95.0, 120),
    ];
    let set = ClusterBuilder::from_records("fam", HitFilter::pass_all(), None, records);
    let index = set.member_index().unwrap();
    assert_eq!(index.get("shared"), index.get("q1"));
    assert_ne!(index.get("shared"), index.get("q2"));
}

#[test]
fn membership_file_round_trip() {
    let records = vec![hit("q1", "s1", 95.0, 120), hit("q2", "s2", 95.0, 120)];
    let set = ClusterBuilder::from_records("fam", HitFilter::pass_all(), None, records);

    let mut buffer = Vec::new();
    tables::write_memberships(&mut buffer, &set).unwrap();
    let back = tables::read_memberships(buffer.as_slice()).unwrap();

    assert_eq!(back.family_ids(), set.family_ids());
    for id in set.family_ids() {
        assert_eq!(back.family(&id).unwrap().member_ids(), set.family(&id).unwrap().member_ids());
    }
}

#[test]
fn malformed_report_is_input_error() {
    let report = "q1\ts1\t95.0\t120\t0\t0\t1\t120\t1\t120\n";
    let err = ClusterBuilder::from_tabular("fam", HitFilter::pass_all(), None, report.as_bytes());
    assert!(matches!(err, Err(phylome::Error::Input(_))));
}
