//! Tests for overlap geometry and best-overlap selection.

use float_cmp::approx_eq;

use phylome::{
    overlaps::{best_subalignment, OverlapMatrix, OverlapMethod},
    seq::{Alignment, Row, Strand},
};

fn row(id: &str, text: &str) -> Row {
    Row::new(id, text.to_string(), Strand::Forward)
}

/// `AAAAACCCCC` against `---AACCCCCGG` over twelve columns.
fn canonical_pair() -> Alignment {
    Alignment::from_rows([row("m1", "AAAAACCCCC--"), row("m2", "---AACCCCCGG")]).unwrap()
}

#[test]
fn canonical_overlap_length_and_identity() {
    let matrix = OverlapMatrix::from_alignment(&canonical_pair());
    let entry = matrix.get_by_id("m1", "m2").unwrap();
    assert_eq!(entry.length, 7);
    assert!(approx_eq!(f64, entry.identity, 100.0, epsilon = 1e-9));
}

#[test]
fn best_overlap_returns_the_pair_and_trims_to_seven() {
    let matrix = OverlapMatrix::from_alignment(&canonical_pair());
    assert_eq!(matrix.best_overlap(), Some((0, 1)));

    let sub = best_subalignment(&canonical_pair(), OverlapMethod::Length)
        .unwrap()
        .unwrap();
    assert_eq!(sub.width(), 7);
    assert_eq!(sub.len(), 2);
}

#[test]
fn diagonal_entries_are_zero() {
    let aln = Alignment::from_rows([
        row("m1", "AACCGGTT"),
        row("m2", "AACCGG--"),
        row("m3", "--CCGGTT"),
    ])
    .unwrap();
    let matrix = OverlapMatrix::from_alignment(&aln);
    for i in 0..matrix.n() {
        assert_eq!(matrix.get(i, i).length, 0);
    }
}

#[test]
fn best_overlap_is_idempotent() {
    let aln = Alignment::from_rows([
        row("m1", "AACCGGTT--"),
        row("m2", "AACCGGTTAA"),
        row("m3", "----GGTTAA"),
    ])
    .unwrap();
    let first = OverlapMatrix::from_alignment(&aln).best_overlap();
    for _ in 0..3 {
        assert_eq!(OverlapMatrix::from_alignment(&aln).best_overlap(), first);
    }
}

#[test]
fn overlap_score_weighs_length_against_identity() {
    // A 10-column 50%-identity pair scores 2.5; an 8-column perfect pair
    // scores 8.
    let aln = Alignment::from_rows([
        row("half", "AAAAATTTTT"),
        row("base", "AAAAAAAAAA"),
        row("tail", "AAAAAAAA--"),
    ])
    .unwrap();
    let matrix = OverlapMatrix::from_alignment(&aln);

    let divergent = matrix.get_by_id("half", "base").unwrap();
    assert!(approx_eq!(f64, divergent.score(OverlapMethod::Score), 2.5, epsilon = 1e-9));

    let short = matrix.get_by_id("base", "tail").unwrap();
    assert!(approx_eq!(f64, short.score(OverlapMethod::Score), 8.0, epsilon = 1e-9));

    assert_eq!(matrix.best_overlap_score(), Some((1, 2)));
}
