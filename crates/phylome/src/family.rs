//! A `SequenceFamily` aggregates a member set with its derived artifacts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    matrix::DistanceMatrix,
    seq::{Alignment, Member},
    tree::Tree,
    Error, Result,
};

/// A set of putatively homologous sequences and everything derived from
/// them.
///
/// The family owns its members; the alignment references members by id and
/// owns the gapped rows. The derived artifacts form a chain: mutating the
/// member set invalidates the alignment, and mutating or replacing the
/// alignment invalidates the distance matrix, the tree and the bootstrap
/// consensus.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SequenceFamily {
    /// The family id.
    pub id: String,
    /// The members, keyed by id.
    members: BTreeMap<String, Member>,
    /// The alignment over (a subset of) the members.
    pub alignment: Option<Alignment>,
    /// Pairwise distances derived from the alignment.
    pub distance: Option<DistanceMatrix>,
    /// The inferred tree, with leaves labelled by member ids.
    pub tree: Option<Tree>,
    /// The bootstrap consensus tree.
    pub bootstrap: Option<Tree>,
}

impl SequenceFamily {
    /// Creates an empty family.
    #[must_use]
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// The number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the family has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether a member with the given id is present.
    #[must_use]
    pub fn contains(&self, member_id: &str) -> bool {
        self.members.contains_key(member_id)
    }

    /// A reference to a member by id.
    #[must_use]
    pub fn member(&self, member_id: &str) -> Option<&Member> {
        self.members.get(member_id)
    }

    /// A mutable reference to a member by id.
    pub fn member_mut(&mut self, member_id: &str) -> Option<&mut Member> {
        self.members.get_mut(member_id)
    }

    /// Iterates over the members in id order.
    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    /// The member ids, in id order.
    #[must_use]
    pub fn member_ids(&self) -> Vec<String> {
        self.members.keys().cloned().collect()
    }

    /// Inserts a member without invalidating anything. Used during ingest
    /// and by operators that extend the alignment in the same step.
    pub fn insert_member(&mut self, member: Member) {
        self.members.insert(member.id.clone(), member);
    }

    /// Removes a member, its alignment row, and all derived artifacts.
    pub fn remove_member(&mut self, member_id: &str) -> Option<Member> {
        let removed = self.members.remove(member_id)?;
        if let Some(alignment) = &mut self.alignment {
            alignment.remove_member(member_id);
        }
        self.clear_derived();
        Some(removed)
    }

    /// Keeps only the members whose id satisfies the predicate, pruning the
    /// alignment rows to match and clearing derived artifacts. Returns the
    /// removed ids in id order.
    pub fn retain_members<P: Fn(&str) -> bool>(&mut self, keep: P) -> Vec<String> {
        let removed: Vec<String> = self.members.keys().filter(|id| !keep(id)).cloned().collect();
        if removed.is_empty() {
            return removed;
        }
        for id in &removed {
            self.members.remove(id);
        }
        if let Some(alignment) = &mut self.alignment {
            alignment.retain_members(&keep);
        }
        self.clear_derived();
        removed
    }

    /// Drops the distance matrix, the tree and the bootstrap consensus.
    pub fn clear_derived(&mut self) {
        self.distance = None;
        self.tree = None;
        self.bootstrap = None;
    }

    /// Replaces the alignment and drops everything derived from the old one.
    pub fn replace_alignment(&mut self, alignment: Alignment) {
        self.alignment = Some(alignment);
        self.clear_derived();
    }

    /// Verifies the cross-entity invariants:
    ///
    /// 1. every alignment row references a family member,
    /// 2. the distance labels equal the alignment member set,
    /// 3. the tree leaves equal the alignment member set.
    ///
    /// # Errors
    ///
    /// [`Error::Consistency`] naming the first broken invariant.
    pub fn check_consistency(&self) -> Result<()> {
        let Some(alignment) = &self.alignment else {
            return Ok(());
        };
        for row_id in alignment.member_ids() {
            if !self.contains(&row_id) {
                return Err(Error::Consistency(format!(
                    "family '{}': alignment row '{row_id}' has no member",
                    self.id
                )));
            }
        }

        let mut aligned: Vec<String> = alignment.member_ids();
        aligned.sort_unstable();

        if let Some(distance) = &self.distance {
            let mut labels: Vec<String> = distance.labels().to_vec();
            labels.sort_unstable();
            if labels != aligned {
                return Err(Error::Consistency(format!(
                    "family '{}': distance labels diverge from the alignment",
                    self.id
                )));
            }
        }

        if let Some(tree) = &self.tree {
            let mut leaves = tree.leaf_labels();
            leaves.sort_unstable();
            if leaves != aligned {
                return Err(Error::Consistency(format!(
                    "family '{}': tree leaves diverge from the alignment",
                    self.id
                )));
            }
        }
        Ok(())
    }
}
