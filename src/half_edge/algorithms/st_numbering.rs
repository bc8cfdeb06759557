use ahash::AHashMap;
use rand::{rngs::SmallRng, seq::SliceRandom};
use thiserror::Error;

use crate::half_edge::{involution::EdgeIndex, HedgeGraph, NodeIndex};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StNumberingError {
    #[error("Edge {0} is not part of the block")]
    EdgeNotInBlock(EdgeIndex),
    #[error("Edge {0} is a self-loop and cannot be the st edge")]
    SelfLoop(EdgeIndex),
    #[error("The block is not biconnected: node {0} cannot be placed")]
    NotBiconnected(NodeIndex),
}

/// A total order of the nodes of a biconnected block in which `s` comes first, `t` comes
/// last, and every other node has a neighbour before and a neighbour after it.
#[derive(Clone, Debug)]
pub struct StNumbering {
    pub order: Vec<NodeIndex>,
    pub number: AHashMap<NodeIndex, usize>,
}

impl StNumbering {
    pub fn s(&self) -> NodeIndex {
        self.order[0]
    }

    pub fn t(&self) -> NodeIndex {
        self.order[self.order.len() - 1]
    }

    pub fn of(&self, node: NodeIndex) -> Option<usize> {
        self.number.get(&node).copied()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Sign {
    Minus,
    Plus,
}

impl<E, V> HedgeGraph<E, V> {
    /// st-numbering of the block spanned by `block`, with `st_edge` joining `s` (its
    /// source) and `t` (its sink).
    ///
    /// Even–Tarjan over an iterative DFS from `s` whose first tree edge is `st_edge`,
    /// followed by Ebert's sign-list construction. With an `rng` the DFS visits
    /// neighbours in a shuffled order, which yields a different numbering.
    pub fn st_numbering(
        &self,
        block: &[EdgeIndex],
        st_edge: EdgeIndex,
        mut rng: Option<&mut SmallRng>,
    ) -> Result<StNumbering, StNumberingError> {
        if !block.contains(&st_edge) {
            return Err(StNumberingError::EdgeNotInBlock(st_edge));
        }
        let (s, t) = self.endpoints(st_edge);
        if s == t {
            return Err(StNumberingError::SelfLoop(st_edge));
        }

        let mut local: AHashMap<NodeIndex, usize> = AHashMap::new();
        let mut nodes = Vec::new();
        let mut adj: Vec<Vec<(usize, EdgeIndex)>> = Vec::new();
        let mut local_id = |n: NodeIndex, nodes: &mut Vec<NodeIndex>, adj: &mut Vec<Vec<_>>| {
            *local.entry(n).or_insert_with(|| {
                nodes.push(n);
                adj.push(Vec::new());
                nodes.len() - 1
            })
        };
        let ls = local_id(s, &mut nodes, &mut adj);
        let lt = local_id(t, &mut nodes, &mut adj);
        for &e in block {
            let (a, b) = self.endpoints(e);
            if a == b {
                continue;
            }
            let la = local_id(a, &mut nodes, &mut adj);
            let lb = local_id(b, &mut nodes, &mut adj);
            adj[la].push((lb, e));
            adj[lb].push((la, e));
        }
        let n = nodes.len();

        if let Some(rng) = rng.as_deref_mut() {
            for list in adj.iter_mut() {
                list.shuffle(rng);
            }
        }
        // t is the first child of s
        if let Some(pos) = adj[ls].iter().position(|&(_, e)| e == st_edge) {
            adj[ls].swap(0, pos);
        }

        const UNSEEN: usize = usize::MAX;
        let mut pre = vec![UNSEEN; n];
        let mut low = vec![UNSEEN; n];
        let mut parent = vec![UNSEEN; n];
        let mut preorder = Vec::with_capacity(n);
        let mut stack: Vec<(usize, Option<EdgeIndex>, usize)> = vec![(ls, None, 0)];
        pre[ls] = 0;
        low[ls] = 0;
        preorder.push(ls);

        while let Some((v, via, pos)) = stack.last_mut() {
            let v = *v;
            if *pos < adj[v].len() {
                let (w, e) = adj[v][*pos];
                *pos += 1;
                if Some(e) == *via {
                    continue;
                }
                if pre[w] == UNSEEN {
                    pre[w] = preorder.len();
                    low[w] = pre[w];
                    parent[w] = v;
                    preorder.push(w);
                    stack.push((w, Some(e), 0));
                } else {
                    low[v] = low[v].min(pre[w]);
                }
                continue;
            }
            stack.pop();
            if let Some(&(p, _, _)) = stack.last() {
                low[p] = low[p].min(low[v]);
            }
        }

        if preorder.len() != n || preorder.get(1) != Some(&lt) {
            let missing = (0..n).find(|&i| pre[i] == UNSEEN).unwrap_or(lt);
            return Err(StNumberingError::NotBiconnected(nodes[missing]));
        }

        // Ebert's sign list, kept as a doubly linked list over local ids.
        const NIL: usize = usize::MAX;
        let mut next = vec![NIL; n];
        let mut prev = vec![NIL; n];
        let mut sign = vec![Sign::Plus; n];
        next[ls] = lt;
        prev[lt] = ls;
        sign[ls] = Sign::Minus;

        for &v in &preorder[2..] {
            let p = parent[v];
            let lowv = preorder[low[v]];
            // t is the only child of s, and no other node may separate a subtree
            if p == ls || low[v] >= pre[p] {
                return Err(StNumberingError::NotBiconnected(nodes[p]));
            }
            if sign[lowv] == Sign::Minus {
                // before p
                let a = prev[p];
                prev[v] = a;
                next[v] = p;
                prev[p] = v;
                if a != NIL {
                    next[a] = v;
                }
                sign[p] = Sign::Plus;
            } else {
                // after p
                let b = next[p];
                next[v] = b;
                prev[v] = p;
                next[p] = v;
                if b != NIL {
                    prev[b] = v;
                }
                sign[p] = Sign::Minus;
            }
        }

        let mut order = Vec::with_capacity(n);
        let mut number = AHashMap::with_capacity(n);
        let mut cur = ls;
        while cur != NIL {
            number.insert(nodes[cur], order.len());
            order.push(nodes[cur]);
            cur = next[cur];
        }

        Ok(StNumbering { order, number })
    }
}
