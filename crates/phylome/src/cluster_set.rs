//! The `ClusterSet` owns every family of a dataset.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::{family::SequenceFamily, strain::StrainMap, Error, Result};

/// The exclusive owner of a dataset's families, together with the strain
/// table they share.
///
/// Families are keyed by id in a `BTreeMap` so iteration order is
/// deterministic.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClusterSet {
    /// family id → family.
    families: BTreeMap<String, SequenceFamily>,
    /// Member id → strain label, shared by all families.
    pub strains: StrainMap,
}

impl ClusterSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of families.
    #[must_use]
    pub fn len(&self) -> usize {
        self.families.len()
    }

    /// Whether the set holds no families.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// A reference to a family by id.
    #[must_use]
    pub fn family(&self, id: &str) -> Option<&SequenceFamily> {
        self.families.get(id)
    }

    /// A mutable reference to a family by id.
    pub fn family_mut(&mut self, id: &str) -> Option<&mut SequenceFamily> {
        self.families.get_mut(id)
    }

    /// Inserts a family, replacing any previous family with the same id.
    pub fn insert_family(&mut self, family: SequenceFamily) {
        self.families.insert(family.id.clone(), family);
    }

    /// Removes a family by id.
    pub fn remove_family(&mut self, id: &str) -> Option<SequenceFamily> {
        self.families.remove(id)
    }

    /// The family ids, in id order.
    #[must_use]
    pub fn family_ids(&self) -> Vec<String> {
        self.families.keys().cloned().collect()
    }

    /// Iterates over the families in id order.
    pub fn iter(&self) -> impl Iterator<Item = &SequenceFamily> {
        self.families.values()
    }

    /// Iterates mutably over the families in id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SequenceFamily> {
        self.families.values_mut()
    }

    /// Builds the member id → family id index.
    ///
    /// # Errors
    ///
    /// [`Error::Consistency`] if a member id appears in two families.
    pub fn member_index(&self) -> Result<HashMap<String, String>> {
        let mut index = HashMap::new();
        for family in self.families.values() {
            for member_id in family.member_ids() {
                if let Some(other) = index.insert(member_id.clone(), family.id.clone()) {
                    return Err(Error::Consistency(format!(
                        "member '{member_id}' belongs to both '{other}' and '{}'",
                        family.id
                    )));
                }
            }
        }
        Ok(index)
    }

    /// Renumbers the families by descending member count with zero-padded
    /// sequential ids `<rootname>_<NNN>`. Ties keep their previous id order.
    pub fn renumber(&mut self, rootname: &str) {
        let mut order: Vec<(String, usize)> = self
            .families
            .iter()
            .map(|(id, fam)| (id.clone(), fam.len()))
            .collect();
        // BTreeMap iteration is id-ordered, so a stable sort keeps ties
        // in their original id order.
        order.sort_by(|a, b| b.1.cmp(&a.1));

        let width = usize::max(3, order.len().to_string().len());
        let mut renumbered = BTreeMap::new();
        for (rank, (old_id, _)) in order.into_iter().enumerate() {
            if let Some(mut family) = self.families.remove(&old_id) {
                family.id = format!("{rootname}_{:0width$}", rank + 1);
                renumbered.insert(family.id.clone(), family);
            }
        }
        self.families = renumbered;
    }

    /// Attaches raw sequences to members wherever the id is known.
    /// Returns the ids that were not found in any family.
    pub fn assign_sequences<I>(&mut self, sequences: I) -> Vec<String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let index = match self.member_index() {
            Ok(index) => index,
            Err(_) => return Vec::new(),
        };
        let mut unknown = Vec::new();
        for (id, seq) in sequences {
            match index.get(&id).and_then(|fid| self.families.get_mut(fid)) {
                Some(family) => {
                    if let Some(member) = family.member_mut(&id) {
                        member.seq = Some(seq);
                    }
                }
                None => unknown.push(id),
            }
        }
        unknown
    }
}
