//! PQ-trees over a set of leaf keys.
//!
//! A PQ-tree represents a family of orders of its leaves: the children of a P-node may
//! be permuted freely, the children of a Q-node only reversed. [`PqTree::reduce`]
//! restricts the family to the orders in which a given set of leaves is consecutive.
//!
//! Nodes live in an arena and refer to each other by [`PqNodeId`]. Each node stores an
//! ordered `Vec` of children, so the templates of the reduction are splices on those
//! vectors.

use std::{fmt::Debug, fmt::Write, hash::Hash};

use ahash::AHashMap;
use thiserror::Error;

use crate::define_indexed_vec;

mod templates;

#[cfg(test)]
mod test;

define_indexed_vec!(
    /// A node of a [`PqTree`].
    pub struct PqNodeId;

    /// Arena storage of a [`PqTree`].
    pub struct PqNodeVec;
);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PqKind<K> {
    Leaf(K),
    /// Children in any order.
    P,
    /// Children in the stored order or its reverse.
    Q,
}

/// Classification of a node during a reduction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Label {
    #[default]
    Empty,
    Partial,
    Full,
}

#[derive(Clone, Debug)]
pub struct PqNode<K> {
    pub kind: PqKind<K>,
    pub parent: Option<PqNodeId>,
    pub children: Vec<PqNodeId>,
    label: Label,
    pertinent: usize,
    live: bool,
}

impl<K> PqNode<K> {
    fn new(kind: PqKind<K>) -> Self {
        PqNode {
            kind,
            parent: None,
            children: Vec::new(),
            label: Label::Empty,
            pertinent: 0,
            live: true,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, PqKind::Leaf(_))
    }
}

/// Where the consecutive pertinent leaves sit after a successful reduction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PertinentRoot {
    /// Every leaf below this node is pertinent, and no other leaf is.
    Full(PqNodeId),
    /// The children `start..end` of this Q-node hold exactly the pertinent leaves.
    Range {
        node: PqNodeId,
        start: usize,
        end: usize,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PqTreeError {
    #[error("The pertinent leaves cannot be made consecutive (failed at node {0})")]
    Irreducible(PqNodeId),
    #[error("Key #{0} of the pertinent set is not a leaf of the tree")]
    UnknownLeaf(usize),
    #[error("Key #{0} is already a leaf of the tree")]
    DuplicateLeaf(usize),
    #[error("The pertinent set is empty")]
    EmptyPertinentSet,
}

#[derive(Clone, Debug)]
pub struct PqTree<K> {
    nodes: PqNodeVec<PqNode<K>>,
    free: Vec<PqNodeId>,
    root: Option<PqNodeId>,
    leaves: AHashMap<K, PqNodeId>,
}

impl<K: Copy + Eq + Hash> PqTree<K> {
    /// A P-node over one leaf per key; a single key gives a lone leaf.
    ///
    /// Repeated keys are kept once.
    pub fn new(keys: impl IntoIterator<Item = K>) -> Self {
        let mut tree = PqTree {
            nodes: PqNodeVec::new(),
            free: Vec::new(),
            root: None,
            leaves: AHashMap::new(),
        };
        let mut leaves = Vec::new();
        for key in keys {
            if tree.leaves.contains_key(&key) {
                continue;
            }
            let id = tree.alloc(PqKind::Leaf(key));
            tree.leaves.insert(key, id);
            leaves.push(id);
        }
        tree.root = tree.group(leaves, Label::Empty);
        tree
    }

    pub fn root(&self) -> Option<PqNodeId> {
        self.root
    }

    pub fn node(&self, id: PqNodeId) -> &PqNode<K> {
        &self.nodes[id]
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.leaves.contains_key(key)
    }

    /// The leaf keys from left to right.
    pub fn frontier(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.leaves.len());
        let mut stack: Vec<PqNodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            match node.kind {
                PqKind::Leaf(key) => keys.push(key),
                _ => stack.extend(node.children.iter().rev()),
            }
        }
        keys
    }

    /// Substitutes the pertinent region returned by [`PqTree::reduce`] with fresh leaves:
    /// a P-node over `keys`, a single leaf for one key, nothing for none.
    pub fn replace_pertinent(
        &mut self,
        pertinent: PertinentRoot,
        keys: &[K],
    ) -> Result<(), PqTreeError> {
        for (i, key) in keys.iter().enumerate() {
            if self.leaves.contains_key(key) || keys[..i].contains(key) {
                return Err(PqTreeError::DuplicateLeaf(i));
            }
        }
        let fresh: Vec<_> = keys
            .iter()
            .map(|&key| {
                let id = self.alloc(PqKind::Leaf(key));
                self.leaves.insert(key, id);
                id
            })
            .collect();
        let replacement = self.group(fresh, Label::Empty);

        match pertinent {
            PertinentRoot::Full(node) => {
                let parent = self.nodes[node].parent;
                match replacement {
                    Some(r) => self.replace_node(node, r),
                    None => self.detach(node),
                }
                self.free_subtree(node);
                if let Some(p) = parent {
                    self.normalize(p);
                }
            }
            PertinentRoot::Range { node, start, end } => {
                let removed: Vec<_> = self.nodes[node]
                    .children
                    .splice(start..end, replacement)
                    .collect();
                if let Some(r) = replacement {
                    self.nodes[r].parent = Some(node);
                }
                for r in removed {
                    self.free_subtree(r);
                }
                self.normalize(node);
            }
        }
        Ok(())
    }

    /// Deletes the given leaves, restricting the represented orders to the rest.
    pub fn remove_leaves(&mut self, keys: &[K]) -> Result<(), PqTreeError> {
        if let Some(i) = keys.iter().position(|k| !self.leaves.contains_key(k)) {
            return Err(PqTreeError::UnknownLeaf(i));
        }
        for key in keys {
            let Some(id) = self.leaves.remove(key) else {
                continue;
            };
            let parent = self.nodes[id].parent;
            self.detach(id);
            self.kill(id);
            if let Some(p) = parent {
                self.normalize(p);
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------------------
    // Arena plumbing
    // ---------------------------------------------------------------------------------

    fn alloc(&mut self, kind: PqKind<K>) -> PqNodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = PqNode::new(kind);
                id
            }
            None => self.nodes.push(PqNode::new(kind)),
        }
    }

    fn kill(&mut self, id: PqNodeId) {
        let node = &mut self.nodes[id];
        node.live = false;
        node.children.clear();
        node.parent = None;
        self.free.push(id);
    }

    fn set_children(&mut self, id: PqNodeId, children: Vec<PqNodeId>) {
        for &c in &children {
            self.nodes[c].parent = Some(id);
        }
        self.nodes[id].children = children;
    }

    /// Zero children give nothing, one child is returned as is, more get a new P-node.
    fn group(&mut self, children: Vec<PqNodeId>, label: Label) -> Option<PqNodeId> {
        match children.len() {
            0 => None,
            1 => Some(children[0]),
            _ => {
                let id = self.alloc(PqKind::P);
                self.set_children(id, children);
                self.nodes[id].label = label;
                Some(id)
            }
        }
    }

    /// Puts `new` where `old` hangs in the tree.
    fn replace_node(&mut self, old: PqNodeId, new: PqNodeId) {
        let parent = self.nodes[old].parent;
        match parent {
            Some(p) => {
                if let Some(slot) = self.nodes[p].children.iter_mut().find(|c| **c == old) {
                    *slot = new;
                }
            }
            None => self.root = Some(new),
        }
        self.nodes[new].parent = parent;
        self.nodes[old].parent = None;
    }

    fn detach(&mut self, id: PqNodeId) {
        match self.nodes[id].parent {
            Some(p) => self.nodes[p].children.retain(|c| *c != id),
            None => {
                if self.root == Some(id) {
                    self.root = None;
                }
            }
        }
        self.nodes[id].parent = None;
    }

    fn free_subtree(&mut self, id: PqNodeId) {
        let mut stack = vec![id];
        while let Some(x) = stack.pop() {
            if let PqKind::Leaf(key) = self.nodes[x].kind {
                if self.leaves.get(&key) == Some(&x) {
                    self.leaves.remove(&key);
                }
            }
            stack.extend(self.nodes[x].children.iter().copied());
            self.kill(x);
        }
    }

    /// Removes childless inner nodes, splices out single children and turns two-child
    /// Q-nodes into P-nodes, walking up from `id`.
    fn normalize(&mut self, id: PqNodeId) {
        let mut current = Some(id);
        while let Some(x) = current {
            let node = &self.nodes[x];
            if !node.live || node.is_leaf() {
                break;
            }
            let parent = node.parent;
            match node.children.len() {
                0 => {
                    self.detach(x);
                    self.kill(x);
                    current = parent;
                }
                1 => {
                    let child = node.children[0];
                    self.replace_node(x, child);
                    self.kill(x);
                    break;
                }
                2 if node.kind == PqKind::Q => {
                    self.nodes[x].kind = PqKind::P;
                    break;
                }
                _ => break,
            }
        }
    }

    fn reset_labels(&mut self) {
        for (_, node) in self.nodes.iter_mut() {
            node.label = Label::Empty;
            node.pertinent = 0;
        }
    }
}

impl<K: Copy + Eq + Hash + Debug> PqTree<K> {
    /// A text drawing of the tree, one node per line.
    pub fn debug_draw(&self) -> String {
        let mut out = String::new();
        let Some(root) = self.root else {
            out.push_str("(empty)");
            return out;
        };
        // (node, prefix, whether it is the last child; None for the root)
        let mut stack = vec![(root, String::new(), None)];
        while let Some((id, prefix, last)) = stack.pop() {
            let node = &self.nodes[id];
            let label = match &node.kind {
                PqKind::Leaf(key) => format!("leaf {key:?}"),
                PqKind::P => "P".to_owned(),
                PqKind::Q => "Q".to_owned(),
            };
            let child_prefix = match last {
                None => {
                    let _ = writeln!(out, "{label}");
                    String::new()
                }
                Some(is_last) => {
                    let connector = if is_last { "└── " } else { "├── " };
                    let _ = writeln!(out, "{prefix}{connector}{label}");
                    format!("{prefix}{}", if is_last { "    " } else { "│   " })
                }
            };
            let n = node.children.len();
            for (i, &child) in node.children.iter().enumerate().rev() {
                stack.push((child, child_prefix.clone(), Some(i + 1 == n)));
            }
        }
        out.pop();
        out
    }
}
