use std::cell::Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParentPointer(pub usize);

impl From<usize> for ParentPointer {
    fn from(x: usize) -> Self {
        ParentPointer(x)
    }
}

/// A node of the parent-pointer forest.
///
/// - `Root { rank }` is the representative of its set, with its union-by-rank value.
/// - `Child(parent)` points towards the representative.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UFNode {
    Root { rank: usize },
    Child(ParentPointer),
}

/// Disjoint sets over `0..len`, with union by rank and path compression.
///
/// The forest is stored as `Cell`s so that [`UnionFind::find`] can compress paths
/// through a shared reference.
#[derive(Debug, Clone)]
pub struct UnionFind {
    nodes: Vec<Cell<UFNode>>,
    n_sets: usize,
}

impl UnionFind {
    pub fn new(len: usize) -> Self {
        UnionFind {
            nodes: (0..len).map(|_| Cell::new(UFNode::Root { rank: 0 })).collect(),
            n_sets: len,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of disjoint sets.
    pub fn n_sets(&self) -> usize {
        self.n_sets
    }

    /// The representative of the set containing `x`.
    pub fn find(&self, x: usize) -> ParentPointer {
        let x = ParentPointer(x);
        let mut root = x;
        while let UFNode::Child(parent) = self.nodes[root.0].get() {
            root = parent;
        }
        let mut current = x;
        while let UFNode::Child(parent) = self.nodes[current.0].get() {
            self.nodes[current.0].set(UFNode::Child(root));
            current = parent;
        }
        root
    }

    pub fn same(&self, x: usize, y: usize) -> bool {
        self.find(x) == self.find(y)
    }

    /// Merges the sets of `x` and `y`. Returns `false` if they were already one set.
    pub fn union(&mut self, x: usize, y: usize) -> bool {
        let root_x = self.find(x);
        let root_y = self.find(y);
        if root_x == root_y {
            return false;
        }
        let rank = |p: ParentPointer| match self.nodes[p.0].get() {
            UFNode::Root { rank } => rank,
            UFNode::Child(_) => 0,
        };
        let (rank_x, rank_y) = (rank(root_x), rank(root_y));
        let (winner, loser) = if rank_x < rank_y {
            (root_y, root_x)
        } else {
            (root_x, root_y)
        };
        if rank_x == rank_y {
            self.nodes[winner.0].set(UFNode::Root { rank: rank_x + 1 });
        }
        self.nodes[loser.0].set(UFNode::Child(winner));
        self.n_sets -= 1;
        true
    }
}

#[cfg(test)]
mod test;
