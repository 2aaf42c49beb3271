//! Grouping family trees by strain-labelled topology.
//!
//! Two trees share a topology when, after replacing every leaf label by its
//! strain and sorting children canonically, their nested-parenthesis forms
//! are equal. Branch lengths and supports are ignored.

use std::collections::BTreeMap;

use crate::{cluster_set::ClusterSet, strain::StrainMap, tree::Tree};

/// The canonical strain-labelled topology string of a tree.
///
/// Leaves render as their strain label (or `?` when the strain is
/// unknown); internal nodes render as the sorted, comma-joined forms of
/// their children in parentheses. Sorting makes the form independent of
/// child order, so equal topologies compare equal as strings.
#[must_use]
pub fn topology_id(tree: &Tree, strains: &StrainMap) -> String {
    canonical(tree, tree.root(), strains)
}

/// Renders one subtree canonically.
fn canonical(tree: &Tree, idx: usize, strains: &StrainMap) -> String {
    let node = tree.node(idx);
    if node.children.is_empty() {
        return node
            .label
            .as_deref()
            .and_then(|label| strains.strain_of(label))
            .unwrap_or("?")
            .to_string();
    }
    let mut parts: Vec<String> = node
        .children
        .iter()
        .map(|&child| canonical(tree, child, strains))
        .collect();
    parts.sort_unstable();
    format!("({})", parts.join(","))
}

/// Groups the families of a set by the topology of their tree, in
/// topology order. Families without a tree are left out.
#[must_use]
pub fn classify(set: &ClusterSet) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for family in set.iter() {
        if let Some(tree) = &family.tree {
            let id = topology_id(tree, &set.strains);
            groups.entry(id).or_default().push(family.id.clone());
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use crate::{cluster_set::ClusterSet, family::SequenceFamily, seq::Member, strain::StrainMap, tree::Tree};

    use super::{classify, topology_id};

    fn strains() -> StrainMap {
        [("a1", "A"), ("a2", "A"), ("b1", "B"), ("c1", "C")]
            .into_iter()
            .map(|(m, s)| (m.to_string(), s.to_string()))
            .collect()
    }

    #[test]
    fn test_child_order_does_not_matter() {
        let strains = strains();
        let left = Tree::from_newick("((a1:1,b1:1):1,c1:1);").unwrap();
        let right = Tree::from_newick("(c1:2,(b1:1,a1:3):1);").unwrap();
        assert_eq!(topology_id(&left, &strains), topology_id(&right, &strains));
        assert_eq!(topology_id(&left, &strains), "((A,B),C)");
    }

    #[test]
    fn test_different_shapes_differ() {
        let strains = strains();
        let one = Tree::from_newick("((a1:1,b1:1):1,c1:1);").unwrap();
        let other = Tree::from_newick("((a1:1,c1:1):1,b1:1);").unwrap();
        assert_ne!(topology_id(&one, &strains), topology_id(&other, &strains));
    }

    #[test]
    fn test_unknown_strain_renders_question_mark() {
        let strains = strains();
        let tree = Tree::from_newick("(a1:1,zz:1);").unwrap();
        assert_eq!(topology_id(&tree, &strains), "(?,A)");
    }

    #[test]
    fn test_classify_groups_families() {
        let mut set = ClusterSet::new();
        set.strains = strains();
        for (fam, newick) in [
            ("fam_001", "((a1:1,b1:1):1,c1:1);"),
            ("fam_002", "(c1:1,(b1:2,a1:1):1);"),
            ("fam_003", "((a1:1,c1:1):1,b1:1);"),
        ] {
            let mut family = SequenceFamily::new(fam);
            family.insert_member(Member::new("a1"));
            family.tree = Some(Tree::from_newick(newick).unwrap());
            set.insert_family(family);
        }

        let groups = classify(&set);
        assert_eq!(groups.len(), 2);
        assert_eq!(
            groups.get("((A,B),C)").unwrap(),
            &vec!["fam_001".to_string(), "fam_002".to_string()]
        );
        assert_eq!(groups.get("((A,C),B)").unwrap(), &vec!["fam_003".to_string()]);
    }
}
