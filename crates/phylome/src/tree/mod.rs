//! A rooted, labelled phylogenetic tree with branch lengths and support
//! values.
//!
//! Nodes live in an index arena: children and parents are `usize` indices
//! into the tree's node vector, so the structure has no cyclic ownership.

mod newick;
mod reroot;

pub use reroot::RerootMode;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A single node of a [`Tree`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TreeNode {
    /// Index of the parent node; `None` for the root.
    pub parent: Option<usize>,
    /// Indices of the child nodes, in insertion order.
    pub children: Vec<usize>,
    /// Leaf label (a member id); internal nodes are usually unlabelled.
    pub label: Option<String>,
    /// Length of the branch to the parent; 0 for the root.
    pub branch_length: f64,
    /// Bootstrap support of the branch to the parent, 0-100 by convention.
    pub support: Option<f64>,
}

/// A rooted tree whose leaves are labelled by member ids.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tree {
    /// The node arena.
    nodes: Vec<TreeNode>,
    /// Index of the root node.
    root: usize,
}

impl Tree {
    /// Creates a tree holding a single unlabelled root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![TreeNode {
                parent: None,
                children: Vec::new(),
                label: None,
                branch_length: 0.0,
                support: None,
            }],
            root: 0,
        }
    }

    /// The index of the root node.
    #[must_use]
    pub fn root(&self) -> usize {
        self.root
    }

    /// The number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds only its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// A reference to the node at `idx`.
    #[must_use]
    pub fn node(&self, idx: usize) -> &TreeNode {
        &self.nodes[idx]
    }

    /// A mutable reference to the node at `idx`.
    pub fn node_mut(&mut self, idx: usize) -> &mut TreeNode {
        &mut self.nodes[idx]
    }

    /// Adds a child under `parent` and returns its index.
    pub fn add_child(&mut self, parent: usize, label: Option<String>, branch_length: f64) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(TreeNode {
            parent: Some(parent),
            children: Vec::new(),
            label,
            branch_length,
            support: None,
        });
        self.nodes[parent].children.push(idx);
        idx
    }

    /// Whether the node at `idx` has no children.
    #[must_use]
    pub fn is_leaf(&self, idx: usize) -> bool {
        self.nodes[idx].children.is_empty()
    }

    /// Indices of all leaves, in depth-first order from the root.
    #[must_use]
    pub fn leaves(&self) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(idx) = stack.pop() {
            if self.is_leaf(idx) {
                out.push(idx);
            } else {
                // Reverse so children come off the stack in insertion order.
                stack.extend(self.nodes[idx].children.iter().rev().copied());
            }
        }
        out
    }

    /// Labels of all leaves, in depth-first order from the root.
    #[must_use]
    pub fn leaf_labels(&self) -> Vec<String> {
        self.leaves()
            .into_iter()
            .filter_map(|i| self.nodes[i].label.clone())
            .collect()
    }

    /// Finds the leaf with the given label.
    #[must_use]
    pub fn find_leaf(&self, label: &str) -> Option<usize> {
        self.leaves()
            .into_iter()
            .find(|&i| self.nodes[i].label.as_deref() == Some(label))
    }

    /// The node indices from `idx` up to and including the root.
    #[must_use]
    pub fn path_to_root(&self, idx: usize) -> Vec<usize> {
        let mut path = vec![idx];
        let mut cursor = idx;
        while let Some(parent) = self.nodes[cursor].parent {
            path.push(parent);
            cursor = parent;
        }
        path
    }

    /// The sum of branch lengths from `idx` up to the root.
    #[must_use]
    pub fn distance_to_root(&self, idx: usize) -> f64 {
        let mut total = 0.0;
        let mut cursor = idx;
        while let Some(parent) = self.nodes[cursor].parent {
            total += self.nodes[cursor].branch_length;
            cursor = parent;
        }
        total
    }

    /// The node sequence from `a` to `b` through their lowest common
    /// ancestor. Both endpoints are included.
    #[must_use]
    pub fn path_between(&self, a: usize, b: usize) -> Vec<usize> {
        let up_a = self.path_to_root(a);
        let up_b = self.path_to_root(b);
        let on_a_path: std::collections::HashSet<usize> = up_a.iter().copied().collect();

        // Lowest ancestor of b that also lies above a.
        let lca = up_b
            .iter()
            .copied()
            .find(|i| on_a_path.contains(i))
            .unwrap_or(self.root);

        let mut path: Vec<usize> = up_a.iter().take_while(|&&i| i != lca).copied().collect();
        path.push(lca);
        let down_b: Vec<usize> = up_b.iter().take_while(|&&i| i != lca).copied().collect();
        path.extend(down_b.into_iter().rev());
        path
    }

    /// The branch-length distance between two nodes.
    #[must_use]
    pub fn distance_between(&self, a: usize, b: usize) -> f64 {
        let path = self.path_between(a, b);
        path.windows(2).map(|w| self.edge_length(w[0], w[1])).sum()
    }

    /// The length of the edge between two adjacent nodes.
    ///
    /// The length of an edge is stored on the child side.
    fn edge_length(&self, x: usize, y: usize) -> f64 {
        if self.nodes[x].parent == Some(y) {
            self.nodes[x].branch_length
        } else {
            self.nodes[y].branch_length
        }
    }

    /// Support values of all non-root nodes that carry one.
    pub fn supports(&self) -> impl Iterator<Item = f64> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != self.root)
            .filter_map(|(_, n)| n.support)
    }

    /// Splits the edge above `child`, inserting a new node at
    /// `dist_from_child` along it, and returns the new node's index.
    ///
    /// The support of the split edge stays on the upper half.
    ///
    /// # Errors
    ///
    /// If `child` is the root, or `dist_from_child` exceeds the edge length.
    pub fn insert_on_edge(&mut self, child: usize, dist_from_child: f64) -> Result<usize> {
        let parent = self.nodes[child]
            .parent
            .ok_or_else(|| Error::argument("cannot split the edge above the root"))?;
        let edge = self.nodes[child].branch_length;
        if dist_from_child > edge + 1e-12 {
            return Err(Error::argument(format!(
                "split point {dist_from_child} lies beyond the edge length {edge}"
            )));
        }

        let idx = self.nodes.len();
        self.nodes.push(TreeNode {
            parent: Some(parent),
            children: vec![child],
            label: None,
            branch_length: edge - dist_from_child,
            support: self.nodes[child].support,
        });
        let slot = self.nodes[parent]
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or_else(|| Error::Consistency(format!("node {child} is missing from its parent's children")))?;
        self.nodes[parent].children[slot] = idx;
        self.nodes[child].parent = Some(idx);
        self.nodes[child].branch_length = dist_from_child;
        self.nodes[child].support = None;
        Ok(idx)
    }

    /// Makes `new_root` the root by reversing parent pointers along the path
    /// to the current root. Branch lengths and supports move with their
    /// edges.
    pub fn reroot_at(&mut self, new_root: usize) {
        if new_root == self.root {
            return;
        }
        let path = self.path_to_root(new_root);
        let edges: Vec<(f64, Option<f64>)> = path[..path.len() - 1]
            .iter()
            .map(|&i| (self.nodes[i].branch_length, self.nodes[i].support))
            .collect();

        for (k, &(length, support)) in edges.iter().enumerate() {
            let (a, b) = (path[k], path[k + 1]);
            self.nodes[b].children.retain(|&c| c != a);
            self.nodes[a].children.push(b);
            self.nodes[b].parent = Some(a);
            self.nodes[b].branch_length = length;
            self.nodes[b].support = support;
        }
        self.nodes[new_root].parent = None;
        self.nodes[new_root].branch_length = 0.0;
        self.nodes[new_root].support = None;
        self.root = new_root;
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}
