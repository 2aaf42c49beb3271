//! Overlap geometry between alignment rows, best-pair selection, and the
//! seed-and-extend search for a jointly-overlapping submember set.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    seq::{Alignment, Row},
    strain::{Composition, StrainMap},
    Result,
};

/// The overlap of one unordered row pair.
///
/// `start` and `end` are 1-based alignment columns. Non-overlapping pairs
/// and the diagonal hold the zero entry (`length == 0`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlapEntry {
    /// First shared non-gap column.
    pub start: usize,
    /// Last shared non-gap column.
    pub end: usize,
    /// Number of shared columns.
    pub length: usize,
    /// Percentage identity over the shared columns. Columns where both rows
    /// carry a gap count as matches.
    pub identity: f64,
}

impl OverlapEntry {
    /// The score of this entry under the given method.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn score(&self, method: OverlapMethod) -> f64 {
        match method {
            OverlapMethod::Length => self.length as f64,
            OverlapMethod::Score => self.length as f64 * (self.identity / 100.0).powi(2),
        }
    }
}

/// How overlaps are ranked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlapMethod {
    /// By overlap length alone.
    Length,
    /// By `length · (identity/100)²`, which penalises short high-identity
    /// and long low-identity pairs symmetrically.
    #[default]
    Score,
}

/// A symmetric matrix of pairwise row overlaps.
#[derive(Clone, Debug)]
pub struct OverlapMatrix {
    /// Row member ids, in alignment order.
    ids: Vec<String>,
    /// Row-major `n * n` entries.
    entries: Vec<OverlapEntry>,
}

impl OverlapMatrix {
    /// Computes the overlap matrix of an alignment.
    #[must_use]
    pub fn from_alignment(alignment: &Alignment) -> Self {
        let rows = alignment.rows();
        let n = rows.len();
        let mut entries = vec![OverlapEntry::default(); n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let entry = pair_overlap(&rows[i], &rows[j]);
                entries[i * n + j] = entry;
                entries[j * n + i] = entry;
            }
        }
        Self {
            ids: alignment.member_ids(),
            entries,
        }
    }

    /// Parallel version of [`Self::from_alignment`].
    #[must_use]
    pub fn par_from_alignment(alignment: &Alignment) -> Self {
        let rows = alignment.rows();
        let n = rows.len();
        let upper: Vec<((usize, usize), OverlapEntry)> = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|(i, j)| ((i, j), pair_overlap(&rows[i], &rows[j])))
            .collect();

        let mut entries = vec![OverlapEntry::default(); n * n];
        for ((i, j), entry) in upper {
            entries[i * n + j] = entry;
            entries[j * n + i] = entry;
        }
        Self {
            ids: alignment.member_ids(),
            entries,
        }
    }

    /// The number of rows.
    #[must_use]
    pub fn n(&self) -> usize {
        self.ids.len()
    }

    /// The row member ids, in alignment order.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// The entry at `(i, j)` by row index.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> &OverlapEntry {
        &self.entries[i * self.n() + j]
    }

    /// The entry for a pair of member ids, if both are present.
    #[must_use]
    pub fn get_by_id(&self, a: &str, b: &str) -> Option<&OverlapEntry> {
        let i = self.ids.iter().position(|id| id == a)?;
        let j = self.ids.iter().position(|id| id == b)?;
        Some(self.get(i, j))
    }

    /// The pair with the longest overlap, ties resolved to the first pair in
    /// row order. `None` when no pair overlaps.
    #[must_use]
    pub fn best_overlap(&self) -> Option<(usize, usize)> {
        self.best_pair(OverlapMethod::Length)
    }

    /// The pair with the highest overlap score, ties resolved to the first
    /// pair in row order. `None` when no pair overlaps.
    #[must_use]
    pub fn best_overlap_score(&self) -> Option<(usize, usize)> {
        self.best_pair(OverlapMethod::Score)
    }

    /// The best pair under the given method.
    #[must_use]
    pub fn best_pair(&self, method: OverlapMethod) -> Option<(usize, usize)> {
        let mut best: Option<((usize, usize), f64)> = None;
        for i in 0..self.n() {
            for j in (i + 1)..self.n() {
                let entry = self.get(i, j);
                if entry.length == 0 {
                    continue;
                }
                let score = entry.score(method);
                if best.is_none_or(|(_, b)| score > b) {
                    best = Some(((i, j), score));
                }
            }
        }
        best.map(|(pair, _)| pair)
    }

    /// All overlapping pairs sorted by descending score under the method,
    /// ties in row-pair order.
    #[must_use]
    pub fn ranked_pairs(&self, method: OverlapMethod) -> Vec<(usize, usize)> {
        let mut pairs: Vec<(usize, usize)> = (0..self.n())
            .flat_map(|i| ((i + 1)..self.n()).map(move |j| (i, j)))
            .filter(|&(i, j)| self.get(i, j).length > 0)
            .collect();
        pairs.sort_by(|&a, &b| {
            let (sa, sb) = (self.get(a.0, a.1).score(method), self.get(b.0, b.1).score(method));
            sb.partial_cmp(&sa).unwrap_or(std::cmp::Ordering::Equal).then(a.cmp(&b))
        });
        pairs
    }
}

/// Computes the overlap entry of two rows via the four-case interval
/// intersection of their non-gap spans.
fn pair_overlap(a: &Row, b: &Row) -> OverlapEntry {
    if a.start == 0 || b.start == 0 {
        return OverlapEntry::default();
    }
    let start = a.start.max(b.start);
    let end = a.end.min(b.end);
    if start > end {
        return OverlapEntry::default();
    }
    OverlapEntry {
        start,
        end,
        length: end - start + 1,
        identity: slice_identity(&[a, b], start, end),
    }
}

/// Mean pairwise identity of the given rows over columns `start..=end`
/// (1-based, inclusive), as a percentage. Gap-vs-gap columns count as
/// matches.
#[allow(clippy::cast_precision_loss)]
fn slice_identity(rows: &[&Row], start: usize, end: usize) -> f64 {
    let length = end - start + 1;
    let mut total = 0.0;
    let mut pairs = 0_usize;
    for (k, a) in rows.iter().enumerate() {
        for b in &rows[k + 1..] {
            let a_slice = &a.text.as_bytes()[start - 1..end];
            let b_slice = &b.text.as_bytes()[start - 1..end];
            let matches = a_slice.iter().zip(b_slice).filter(|(x, y)| x == y).count();
            total += 100.0 * matches as f64 / length as f64;
            pairs += 1;
        }
    }
    if pairs == 0 {
        0.0
    } else {
        total / pairs as f64
    }
}

/// Parameters of the seed-and-extend search.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeedExtendParams {
    /// How seeds and selections are scored.
    pub method: OverlapMethod,
    /// How many of the best seed pairs to evaluate.
    pub evalseed: usize,
    /// Seeds below this overlap length are discarded.
    pub min_length: Option<usize>,
    /// Seeds below this percentage identity are discarded.
    pub min_identity: Option<f64>,
}

impl Default for SeedExtendParams {
    fn default() -> Self {
        Self {
            method: OverlapMethod::Score,
            evalseed: 3,
            min_length: None,
            min_identity: None,
        }
    }
}

/// A jointly-overlapping submember set found by seed-and-extend.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlapSelection {
    /// Selected member ids, in selection order.
    pub member_ids: Vec<String>,
    /// First column of the global overlap window.
    pub start: usize,
    /// Last column of the global overlap window.
    pub end: usize,
    /// The selection's score under the search method.
    pub score: f64,
}

/// Searches for a maximal jointly-overlapping submember set satisfying the
/// composition.
///
/// The best `evalseed` pairs seed independent extensions; each extension
/// greedily adds the member whose inclusion scores highest on the
/// intersected window until the composition is satisfied. The best valid
/// selection across all seeds wins.
///
/// Returns `None` when no seed produces a selection that satisfies the
/// composition on a non-empty window.
#[must_use]
pub fn seed_and_extend(
    alignment: &Alignment,
    strains: &StrainMap,
    composition: &Composition,
    params: &SeedExtendParams,
) -> Option<OverlapSelection> {
    let matrix = OverlapMatrix::from_alignment(alignment);
    let rows = alignment.rows();

    let seeds: Vec<(usize, usize)> = matrix
        .ranked_pairs(params.method)
        .into_iter()
        .filter(|&(i, j)| {
            let entry = matrix.get(i, j);
            params.min_length.is_none_or(|floor| entry.length >= floor)
                && params.min_identity.is_none_or(|floor| entry.identity >= floor)
        })
        .take(params.evalseed)
        .collect();

    let mut best: Option<OverlapSelection> = None;
    for (i, j) in seeds {
        if let Some(selection) = extend_seed(rows, strains, composition, params, (i, j), &matrix) {
            if best.as_ref().is_none_or(|b| selection.score > b.score) {
                best = Some(selection);
            }
        }
    }
    best
}

/// Extends one seed pair until the composition is satisfied.
fn extend_seed(
    rows: &[Row],
    strains: &StrainMap,
    composition: &Composition,
    params: &SeedExtendParams,
    (i, j): (usize, usize),
    matrix: &OverlapMatrix,
) -> Option<OverlapSelection> {
    let entry = matrix.get(i, j);
    let mut comp = composition.clone();
    comp.reset();
    let mut selected = vec![i, j];
    let (mut start, mut end) = (entry.start, entry.end);
    comp.offer(strains.strain_of(&rows[i].member_id));
    comp.offer(strains.strain_of(&rows[j].member_id));

    while !comp.is_satisfied() {
        // Candidates whose strain is still needed, scored on the window
        // their inclusion would leave.
        let mut choice: Option<(usize, f64, usize, usize)> = None;
        for (k, row) in rows.iter().enumerate() {
            if selected.contains(&k) {
                continue;
            }
            let strain = strains.strain_of(&row.member_id);
            if !comp.clone().offer(strain) {
                continue;
            }
            if row.start == 0 {
                continue;
            }
            let (new_start, new_end) = (start.max(row.start), end.min(row.end));
            if new_start > new_end {
                continue;
            }
            let score = selection_score(rows, &selected, Some(k), new_start, new_end, params.method);
            if choice.is_none_or(|(_, best_score, _, _)| score > best_score) {
                choice = Some((k, score, new_start, new_end));
            }
        }
        let (k, _, new_start, new_end) = choice?;
        selected.push(k);
        start = new_start;
        end = new_end;
        comp.offer(strains.strain_of(&rows[k].member_id));
    }

    // The global overlap across the selected rows; the incremental window
    // already is that intersection, but it must be non-empty.
    if start > end {
        return None;
    }
    Some(OverlapSelection {
        member_ids: selected.iter().map(|&k| rows[k].member_id.clone()).collect(),
        start,
        end,
        score: selection_score(rows, &selected, None, start, end, params.method),
    })
}

/// The score of a selection (plus an optional extra row) on a window.
#[allow(clippy::cast_precision_loss)]
fn selection_score(
    rows: &[Row],
    selected: &[usize],
    extra: Option<usize>,
    start: usize,
    end: usize,
    method: OverlapMethod,
) -> f64 {
    let members: Vec<&Row> = selected
        .iter()
        .chain(extra.iter())
        .map(|&k| &rows[k])
        .collect();
    let length = (end - start + 1) as f64;
    match method {
        OverlapMethod::Length => length,
        OverlapMethod::Score => {
            let identity = slice_identity(&members, start, end);
            length * (identity / 100.0).powi(2)
        }
    }
}

/// Builds the trimmed sub-alignment of the best-overlapping pair.
///
/// # Errors
///
/// Propagates alignment-slicing failures.
pub fn best_subalignment(alignment: &Alignment, method: OverlapMethod) -> Result<Option<Alignment>> {
    let matrix = OverlapMatrix::from_alignment(alignment);
    let Some((i, j)) = matrix.best_pair(method) else {
        return Ok(None);
    };
    let entry = *matrix.get(i, j);
    let ids = [matrix.ids()[i].clone(), matrix.ids()[j].clone()];
    let mut sub = alignment.clone();
    sub.retain_members(|id| ids.contains(&id.to_string()));
    let sub = sub.slice_columns(entry.start, entry.end)?;
    Ok(Some(sub))
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use crate::{
        seq::{Alignment, Row, Strand},
        strain::{Composition, StrainMap},
    };

    use super::{seed_and_extend, best_subalignment, OverlapMatrix, OverlapMethod, SeedExtendParams};

    fn row(id: &str, text: &str) -> Row {
        Row::new(id, text.to_string(), Strand::Forward)
    }

    /// The two-row alignment of the canonical overlap example: columns 6..12
    /// are shared, with full identity.
    fn canonical_pair() -> Alignment {
        Alignment::from_rows([
            row("m1", "AAAAACCCCC--"),
            row("m2", "---AACCCCCGG"),
        ])
        .unwrap()
    }

    #[test]
    fn test_pair_overlap_geometry() {
        let matrix = OverlapMatrix::from_alignment(&canonical_pair());
        let entry = matrix.get_by_id("m1", "m2").unwrap();
        assert_eq!((entry.start, entry.end), (4, 10));
        assert_eq!(entry.length, 7);
        assert!(approx_eq!(f64, entry.identity, 100.0, epsilon = 1e-9));
    }

    #[test]
    fn test_diagonal_is_zero() {
        let matrix = OverlapMatrix::from_alignment(&canonical_pair());
        assert_eq!(matrix.get(0, 0).length, 0);
        assert_eq!(matrix.get(1, 1).length, 0);
    }

    #[test]
    fn test_disjoint_rows() {
        let aln = Alignment::from_rows([row("m1", "AAAA----"), row("m2", "----CCCC")]).unwrap();
        let matrix = OverlapMatrix::from_alignment(&aln);
        assert_eq!(matrix.get(0, 1).length, 0);
        assert!(matrix.best_overlap().is_none());
    }

    #[test]
    fn test_best_overlap_idempotent() {
        let aln = three_strain_alignment();
        let matrix = OverlapMatrix::from_alignment(&aln);
        let first = matrix.best_overlap();
        let again = OverlapMatrix::from_alignment(&aln).best_overlap();
        assert_eq!(first, again);
    }

    #[test]
    fn test_par_matches_sequential() {
        let aln = three_strain_alignment();
        let seq = OverlapMatrix::from_alignment(&aln);
        let par = OverlapMatrix::par_from_alignment(&aln);
        for i in 0..seq.n() {
            for j in 0..seq.n() {
                assert_eq!(seq.get(i, j), par.get(i, j));
            }
        }
    }

    #[test]
    fn test_score_penalises_short_and_dissimilar() {
        // m1/m2 overlap long but diverge; m1/m3 overlap short but match.
        let aln = Alignment::from_rows([
            row("m1", "AAAAAAAAAA"),
            row("m2", "TTTTTTTTAA"),
            row("m3", "AA--------"),
        ])
        .unwrap();
        let matrix = OverlapMatrix::from_alignment(&aln);

        // By length the divergent pair wins; by score neither beats a
        // mid-length mid-identity pair, and here the short perfect pair
        // outscores the long 20%-identity pair.
        assert_eq!(matrix.best_overlap(), Some((0, 1)));
        assert_eq!(matrix.best_overlap_score(), Some((0, 2)));
    }

    #[test]
    fn test_best_subalignment_trims() {
        let sub = best_subalignment(&canonical_pair(), OverlapMethod::Length)
            .unwrap()
            .unwrap();
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.width(), 7);
        assert_eq!(sub.row("m1").unwrap().text, "AACCCCC");
        assert_eq!(sub.row("m2").unwrap().text, "AACCCCC");
    }

    /// Five rows over three strains; rows a1/b1/c1 share a wide window.
    fn three_strain_alignment() -> Alignment {
        Alignment::from_rows([
            row("a1", "AACCGGTTAACC----"),
            row("b1", "AACCGGTTAACC----"),
            row("c1", "--CCGGTTAACCTT--"),
            row("a2", "----------CCTTGG"),
            row("b2", "------------TTGG"),
        ])
        .unwrap()
    }

    fn strains() -> StrainMap {
        [("a1", "A"), ("a2", "A"), ("b1", "B"), ("b2", "B"), ("c1", "C")]
            .into_iter()
            .map(|(m, s)| (m.to_string(), s.to_string()))
            .collect()
    }

    #[test]
    fn test_seed_and_extend_meets_composition() {
        let aln = three_strain_alignment();
        let composition = Composition::new([("A", 1), ("B", 1), ("C", 1)]);
        let selection = seed_and_extend(&aln, &strains(), &composition, &SeedExtendParams::default()).unwrap();

        let mut ids = selection.member_ids.clone();
        ids.sort_unstable();
        assert_eq!(ids, vec!["a1", "b1", "c1"]);
        assert_eq!((selection.start, selection.end), (3, 12));
    }

    #[test]
    fn test_seed_and_extend_unsatisfiable() {
        let aln = three_strain_alignment();
        let composition = Composition::new([("A", 2), ("B", 2), ("C", 1)]);
        // a2/b2 share no window with the a1/b1/c1 block wide enough to keep
        // everyone overlapping, so no selection exists... except the a2/b2
        // rows do overlap columns 13..16 with c1? c1 ends at column 14, so
        // the five-way window is empty.
        assert!(seed_and_extend(&aln, &strains(), &composition, &SeedExtendParams::default()).is_none());
    }

    #[test]
    fn test_seed_floors_filter_seeds() {
        let aln = canonical_pair();
        let composition = Composition::new([] as [(String, usize); 0]);
        let params = SeedExtendParams {
            min_length: Some(10),
            ..SeedExtendParams::default()
        };
        assert!(seed_and_extend(&aln, &StrainMap::new(), &composition, &params).is_none());
    }
}
