//! Re-rooting operations: midpoint, reference strain, and longest member.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

use super::Tree;

/// How a family's tree should be re-rooted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RerootMode {
    /// Root at the point equidistant from the two most distant leaves.
    Midpoint,
    /// Root at the farthest-from-root leaf belonging to the named strain.
    ReferenceStrain(String),
    /// Root at the leaf whose underlying sequence is longest.
    LongestMember,
}

impl Tree {
    /// Re-roots the tree at the leaf with the given label.
    ///
    /// A new root node is inserted on the leaf's edge so that the leaf hangs
    /// from it at branch length 0 and the rest of the tree at the full old
    /// edge length.
    ///
    /// # Errors
    ///
    /// If no leaf carries the label, or the leaf is already the root.
    pub fn reroot_at_leaf(&mut self, label: &str) -> Result<()> {
        let leaf = self
            .find_leaf(label)
            .ok_or_else(|| Error::argument(format!("no leaf labelled '{label}'")))?;
        let anchor = self.insert_on_edge(leaf, 0.0)?;
        self.reroot_at(anchor);
        Ok(())
    }

    /// Re-roots the tree at its midpoint: the point halfway along the
    /// longest leaf-to-leaf path.
    ///
    /// Returns `false` without touching the tree when the tree is degenerate
    /// (fewer than two leaves) or all branch lengths are zero.
    ///
    /// # Errors
    ///
    /// Only on internal inconsistencies while splitting the midpoint edge.
    pub fn reroot_midpoint(&mut self) -> Result<bool> {
        let leaves = self.leaves();
        if leaves.len() < 2 {
            return Ok(false);
        }

        // The most distant leaf pair, ties resolved by leaf order.
        let mut best = (0.0_f64, leaves[0], leaves[0]);
        for (i, &u) in leaves.iter().enumerate() {
            for &v in &leaves[i + 1..] {
                let d = self.distance_between(u, v);
                if d > best.0 {
                    best = (d, u, v);
                }
            }
        }
        let (total, u, v) = best;
        if total <= 0.0 {
            return Ok(false);
        }

        // Walk from u toward v until the accumulated length covers half the
        // path, then split the edge we stopped inside.
        let half = total / 2.0;
        let path = self.path_between(u, v);
        let mut covered = 0.0;
        for w in path.windows(2) {
            let (x, y) = (w[0], w[1]);
            let edge = if self.node(x).parent == Some(y) {
                self.node(x).branch_length
            } else {
                self.node(y).branch_length
            };
            if covered + edge >= half {
                let offset = half - covered;
                let anchor = if self.node(x).parent == Some(y) {
                    // Walking up: the split point sits `offset` above x.
                    self.insert_on_edge(x, offset)?
                } else {
                    // Walking down: the split point sits `edge - offset` above y.
                    self.insert_on_edge(y, edge - offset)?
                };
                self.reroot_at(anchor);
                return Ok(true);
            }
            covered += edge;
        }
        Ok(false)
    }

    /// Re-roots at the leaf of the target strain farthest from the current
    /// root. `is_target` decides whether a leaf label belongs to the strain.
    ///
    /// Returns `false` without touching the tree when no leaf matches.
    ///
    /// # Errors
    ///
    /// Only on internal inconsistencies while re-rooting.
    pub fn reroot_reference_strain<P: Fn(&str) -> bool>(&mut self, is_target: P) -> Result<bool> {
        let candidates: Vec<usize> = self
            .leaves()
            .into_iter()
            .filter(|&i| self.node(i).label.as_deref().is_some_and(&is_target))
            .collect();
        let Some(&first) = candidates.first() else {
            return Ok(false);
        };

        let farthest = candidates
            .iter()
            .copied()
            .fold((first, self.distance_to_root(first)), |(best, best_d), i| {
                let d = self.distance_to_root(i);
                if d > best_d {
                    (i, d)
                } else {
                    (best, best_d)
                }
            })
            .0;
        let label = self.node(farthest).label.clone().ok_or_else(|| {
            Error::Consistency(format!("leaf {farthest} has no label"))
        })?;
        self.reroot_at_leaf(&label)?;
        Ok(true)
    }

    /// Re-roots at the leaf whose underlying raw sequence is longest, using
    /// `seq_len` to look lengths up by leaf label. Ties resolve to the first
    /// leaf in depth-first order.
    ///
    /// # Errors
    ///
    /// If the tree has no labelled leaves.
    pub fn reroot_longest<F: Fn(&str) -> usize>(&mut self, seq_len: F) -> Result<()> {
        let labels = self.leaf_labels();
        let longest = labels
            .iter()
            .max_by_key(|label| seq_len(label))
            .ok_or_else(|| Error::empty("tree has no labelled leaves"))?
            .clone();
        self.reroot_at_leaf(&longest)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use float_cmp::approx_eq;

    use super::Tree;

    fn four_leaf() -> Tree {
        Tree::from_newick("((L1:0.1,L2:0.2):0.05,(L3:0.3,L4:0.4):0.05);").unwrap()
    }

    #[test]
    fn test_reroot_at_leaf_property() {
        let mut tree = four_leaf();
        tree.reroot_at_leaf("L3").unwrap();

        let root = tree.root();
        let l3 = tree.find_leaf("L3").unwrap();
        assert_eq!(tree.node(l3).parent, Some(root));
        assert!(approx_eq!(f64, tree.node(l3).branch_length, 0.0, epsilon = 1e-12));

        // All pairwise leaf distances survive the surgery.
        let l1 = tree.find_leaf("L1").unwrap();
        assert!(approx_eq!(f64, tree.distance_between(l1, l3), 0.5, epsilon = 1e-12));
    }

    #[test]
    fn test_midpoint() {
        let mut tree = four_leaf();
        assert!(tree.reroot_midpoint().unwrap());

        // The longest path is L2..L4 at 0.7, so the midpoint is 0.35 from
        // each and falls inside the L4 branch.
        let root = tree.root();
        let l2 = tree.find_leaf("L2").unwrap();
        let l4 = tree.find_leaf("L4").unwrap();
        assert!(approx_eq!(f64, tree.distance_between(root, l2), 0.35, epsilon = 1e-9));
        assert!(approx_eq!(f64, tree.distance_between(root, l4), 0.35, epsilon = 1e-9));
        assert_eq!(tree.node(l4).parent, Some(root));
    }

    #[test]
    fn test_midpoint_degenerate_is_noop() {
        let mut tree = Tree::from_newick("(L1:0,L2:0);").unwrap();
        assert!(!tree.reroot_midpoint().unwrap());

        let mut single = Tree::from_newick("L1:1;").unwrap();
        assert!(!single.reroot_midpoint().unwrap());
    }

    #[test]
    fn test_reference_strain() {
        let strains: HashMap<&str, &str> =
            [("L1", "A"), ("L2", "A"), ("L3", "B"), ("L4", "B")].into_iter().collect();

        let mut tree = four_leaf();
        let rerooted = tree
            .reroot_reference_strain(|label| strains.get(label) == Some(&"A"))
            .unwrap();
        assert!(rerooted);

        // L2 is the A-strain leaf farthest from the old root.
        let root = tree.root();
        let l2 = tree.find_leaf("L2").unwrap();
        assert_eq!(tree.node(l2).parent, Some(root));
    }

    #[test]
    fn test_reference_strain_missing_is_noop() {
        let mut tree = four_leaf();
        let before = tree.to_newick();
        let rerooted = tree.reroot_reference_strain(|_| false).unwrap();
        assert!(!rerooted);
        assert_eq!(tree.to_newick(), before);
    }

    #[test]
    fn test_reroot_longest() {
        let lengths: HashMap<&str, usize> =
            [("L1", 100), ("L2", 250), ("L3", 80), ("L4", 120)].into_iter().collect();

        let mut tree = four_leaf();
        tree.reroot_longest(|label| lengths.get(label).copied().unwrap_or(0)).unwrap();

        let root = tree.root();
        let l2 = tree.find_leaf("L2").unwrap();
        assert_eq!(tree.node(l2).parent, Some(root));
    }
}
