//! Tests for newick handling and re-rooting.

use float_cmp::approx_eq;

use phylome::tree::Tree;

/// `((L1:0.1,L2:0.2):0.05,(L3:0.3,L4:0.4):0.05);`
fn four_leaf() -> Tree {
    Tree::from_newick("((L1:0.1,L2:0.2):0.05,(L3:0.3,L4:0.4):0.05);").unwrap()
}

#[test]
fn newick_round_trip_keeps_supports() {
    let text = "((a:1,b:2)95:0.5,(c:3,d:4)40:0.25);";
    let tree = Tree::from_newick(text).unwrap();
    assert_eq!(tree.to_newick(), text);
    let supports: Vec<f64> = tree.supports().collect();
    assert_eq!(supports, vec![95.0, 40.0]);
}

#[test]
fn midpoint_root_is_equidistant_from_the_farthest_leaves() {
    let mut tree = four_leaf();
    assert!(tree.reroot_midpoint().unwrap());

    // The longest leaf-to-leaf path runs L2 to L4 at 0.7; the new root
    // sits 0.35 from each, inside the L4 branch.
    let root = tree.root();
    let l2 = tree.find_leaf("L2").unwrap();
    let l4 = tree.find_leaf("L4").unwrap();
    assert!(approx_eq!(f64, tree.distance_between(root, l2), 0.35, epsilon = 1e-9));
    assert!(approx_eq!(f64, tree.distance_between(root, l4), 0.35, epsilon = 1e-9));

    // All leaf-to-leaf distances survive the surgery.
    let l1 = tree.find_leaf("L1").unwrap();
    assert!(approx_eq!(f64, tree.distance_between(l1, l4), 0.6, epsilon = 1e-9));
}

#[test]
fn rerooting_at_a_leaf_hangs_it_from_the_new_root() {
    let mut tree = four_leaf();
    tree.reroot_at_leaf("L3").unwrap();

    let root = tree.root();
    let l3 = tree.find_leaf("L3").unwrap();
    assert_eq!(tree.node(l3).parent, Some(root));
    assert!(approx_eq!(f64, tree.node(l3).branch_length, 0.0, epsilon = 1e-12));
}

#[test]
fn degenerate_trees_are_left_alone_by_midpoint() {
    let mut zero_lengths = Tree::from_newick("(L1:0,L2:0);").unwrap();
    assert!(!zero_lengths.reroot_midpoint().unwrap());

    let mut single = Tree::from_newick("L1:1;").unwrap();
    assert!(!single.reroot_midpoint().unwrap());
}

#[test]
fn reference_strain_picks_the_farthest_matching_leaf() {
    let mut tree = four_leaf();
    // Of L1 and L2, L2 is farther from the root.
    let rerooted = tree
        .reroot_reference_strain(|label| label == "L1" || label == "L2")
        .unwrap();
    assert!(rerooted);
    let root = tree.root();
    let l2 = tree.find_leaf("L2").unwrap();
    assert_eq!(tree.node(l2).parent, Some(root));
}

#[test]
fn reference_strain_with_no_match_fails_without_touching_the_tree() {
    let mut tree = four_leaf();
    let before = tree.to_newick();
    assert!(!tree.reroot_reference_strain(|_| false).unwrap());
    assert_eq!(tree.to_newick(), before);
}
