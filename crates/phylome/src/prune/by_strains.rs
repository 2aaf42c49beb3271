//! Pruning by strain composition with inter-strain distance constraints.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{cluster_set::ClusterSet, strain::Composition, strain::StrainMap, Error, Result};

use super::PruneReport;

/// Whether a constrained strain pair should be picked from the near or the
/// far end of its distance range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceConstraint {
    /// Prefer the smallest distances for this strain pair.
    Min,
    /// Prefer the largest distances for this strain pair.
    Max,
}

/// Parameters of [`prune_by_strains`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PruneStrainsParams {
    /// The required strain composition.
    pub composition: Composition,
    /// Strain pairs whose closest members should be selected first, in
    /// priority order.
    pub min_distance: Vec<(String, String)>,
    /// Strain pairs whose farthest members should be selected first, after
    /// the `min_distance` constraints.
    pub max_distance: Vec<(String, String)>,
}

impl PruneStrainsParams {
    /// The constraints in walk order: `min_distance` first, then
    /// `max_distance`.
    fn constraints(&self) -> Vec<(&(String, String), DistanceConstraint)> {
        self.min_distance
            .iter()
            .map(|p| (p, DistanceConstraint::Min))
            .chain(self.max_distance.iter().map(|p| (p, DistanceConstraint::Max)))
            .collect()
    }
}

/// Whether a member-pair's strains match a constraint pair, in either
/// order.
fn strain_pair_matches(constraint: &(String, String), a: Option<&str>, b: Option<&str>) -> bool {
    let (Some(a), Some(b)) = (a, b) else {
        return false;
    };
    (constraint.0 == a && constraint.1 == b) || (constraint.0 == b && constraint.1 == a)
}

/// Selects, per family, the members of a strain composition by walking the
/// member pairs in constraint order.
///
/// Pairs matching the first constraint come first (ascending distance for a
/// `min_distance` constraint, descending for `max_distance`), then the next
/// constraint, then the remaining pairs in matrix order; the walk is stable
/// within ties. Each pair offers its two members to the composition; once
/// the composition is satisfied only the selected members are kept, their
/// alignment rows pruned to match and the derived artifacts dropped.
/// Families that cannot satisfy the composition are deleted.
///
/// # Errors
///
/// [`Error::EmptyInput`] when no strains are loaded, or when no family has
/// a distance matrix to walk. A family that is merely missing its own
/// matrix (its distance phase failed) is skipped, not deleted.
pub fn prune_by_strains(set: &mut ClusterSet, params: &PruneStrainsParams) -> Result<PruneReport> {
    if set.strains.is_empty() {
        return Err(Error::empty("prune_by_strains needs a loaded strain table"));
    }
    if !set.is_empty() && set.iter().all(|family| family.distance.is_none()) {
        return Err(Error::empty("prune_by_strains needs distance matrices; none are computed"));
    }

    let mut report = PruneReport::default();
    let mut doomed = Vec::new();
    let strains = set.strains.clone();

    for family in set.iter_mut() {
        let Some(distance) = &family.distance else {
            ftlog::debug!("family '{}' has no distance matrix, skipping", family.id);
            continue;
        };
        match select_members(distance.pairs(), &strains, params) {
            Some(selected) => {
                let removed = family.retain_members(|id| selected.contains(id));
                report.members_removed(family.id.clone(), removed);
            }
            None => doomed.push(family.id.clone()),
        }
    }

    for id in doomed {
        set.remove_family(&id);
        report.family_removed(id);
    }
    ftlog::info!(
        "prune_by_strains removed {} families and trimmed {} others",
        report.removed_families.len(),
        report.removed_members.len()
    );
    Ok(report)
}

/// Walks the ordered pair list, returning the selected member ids when the
/// composition can be satisfied.
fn select_members<'a, I>(pairs: I, strains: &StrainMap, params: &PruneStrainsParams) -> Option<BTreeSet<String>>
where
    I: Iterator<Item = (&'a str, &'a str, f64)>,
{
    let constraints = params.constraints();

    // Sort key: (constraint rank, signed distance). Negating the distance
    // for a max constraint turns descending into ascending, so one stable
    // ascending sort covers both directions and keeps unmatched pairs in
    // matrix order.
    let mut ordered: Vec<(usize, f64, &str, &str)> = pairs
        .map(|(a, b, d)| {
            let (sa, sb) = (strains.strain_of(a), strains.strain_of(b));
            let rank = constraints
                .iter()
                .position(|(pair, _)| strain_pair_matches(pair, sa, sb))
                .unwrap_or(constraints.len());
            let key = match constraints.get(rank) {
                Some((_, DistanceConstraint::Min)) => d,
                Some((_, DistanceConstraint::Max)) => -d,
                None => 0.0,
            };
            (rank, key, a, b)
        })
        .collect();
    ordered.sort_by(|x, y| {
        x.0.cmp(&y.0)
            .then(x.1.partial_cmp(&y.1).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut composition = params.composition.clone();
    composition.reset();
    let mut selected = BTreeSet::new();
    for (_, _, a, b) in ordered {
        for id in [a, b] {
            if !selected.contains(id) && composition.offer(strains.strain_of(id)) {
                selected.insert(id.to_string());
            }
        }
        if composition.is_satisfied() {
            return Some(selected);
        }
    }
    // A trivial composition is satisfied by selecting nothing.
    composition.is_satisfied().then_some(selected)
}
