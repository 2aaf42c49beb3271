//! Strain labels and the `Composition` selection predicate.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// A mapping from member id to strain label.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StrainMap {
    /// member id → strain label.
    map: HashMap<String, String>,
}

impl StrainMap {
    /// Creates an empty strain map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of members with a known strain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether no strains are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The strain of a member, if known.
    #[must_use]
    pub fn strain_of(&self, member_id: &str) -> Option<&str> {
        self.map.get(member_id).map(String::as_str)
    }

    /// Records the strain of a member, replacing any previous label.
    pub fn insert<M: Into<String>, S: Into<String>>(&mut self, member_id: M, strain: S) {
        self.map.insert(member_id.into(), strain.into());
    }
}

impl FromIterator<(String, String)> for StrainMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

/// A multiset over strain labels: how many members of each strain a
/// selection must contain.
///
/// A `Composition` is a value object owned by its caller; operators clone a
/// fresh one per family so no counts leak between families.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composition {
    /// strain label → required member count.
    required: BTreeMap<String, usize>,
    /// strain label → members accepted so far.
    counts: BTreeMap<String, usize>,
}

impl Composition {
    /// Creates a composition from `(strain, required count)` pairs.
    #[must_use]
    pub fn new<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        Self {
            required: required.into_iter().map(|(s, n)| (s.into(), n)).collect(),
            counts: BTreeMap::new(),
        }
    }

    /// Whether the composition requires nothing.
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        self.required.values().all(|&n| n == 0)
    }

    /// Offers a member of the given strain. Returns `true` when the member
    /// was needed and has been counted, `false` when its strain is not part
    /// of the composition or is already full.
    pub fn offer(&mut self, strain: Option<&str>) -> bool {
        let Some(strain) = strain else {
            return false;
        };
        let Some(&needed) = self.required.get(strain) else {
            return false;
        };
        let count = self.counts.entry(strain.to_string()).or_insert(0);
        if *count < needed {
            *count += 1;
            true
        } else {
            false
        }
    }

    /// Whether every strain has reached its required count.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.required
            .iter()
            .all(|(strain, &needed)| self.counts.get(strain).copied().unwrap_or(0) >= needed)
    }

    /// Clears the accepted counts, keeping the requirements.
    pub fn reset(&mut self) {
        self.counts.clear();
    }

    /// The required `(strain, count)` pairs, in strain order.
    pub fn requirements(&self) -> impl Iterator<Item = (&str, usize)> {
        self.required.iter().map(|(s, &n)| (s.as_str(), n))
    }
}

#[cfg(test)]
mod tests {
    use super::{Composition, StrainMap};

    #[test]
    fn test_offer_and_satisfy() {
        let mut comp = Composition::new([("A", 1), ("B", 2)]);
        assert!(!comp.is_satisfied());

        assert!(comp.offer(Some("A")));
        assert!(!comp.offer(Some("A")), "strain A is already full");
        assert!(!comp.offer(Some("C")), "strain C is not required");
        assert!(!comp.offer(None));

        assert!(comp.offer(Some("B")));
        assert!(!comp.is_satisfied());
        assert!(comp.offer(Some("B")));
        assert!(comp.is_satisfied());
    }

    #[test]
    fn test_reset() {
        let mut comp = Composition::new([("A", 1)]);
        assert!(comp.offer(Some("A")));
        assert!(comp.is_satisfied());
        comp.reset();
        assert!(!comp.is_satisfied());
        assert!(comp.offer(Some("A")));
    }

    #[test]
    fn test_strain_map() {
        let mut strains = StrainMap::new();
        strains.insert("m1", "A");
        strains.insert("m2", "B");
        assert_eq!(strains.strain_of("m1"), Some("A"));
        assert_eq!(strains.strain_of("m3"), None);
        assert_eq!(strains.len(), 2);
    }
}
