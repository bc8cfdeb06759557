//! The Booth–Lueker reduction.
//!
//! Pertinent counts are bubbled up from each pertinent leaf, the pertinent root is the
//! lowest node whose count equals the number of pertinent leaves, and the templates are
//! applied to the pertinent subtree in post-order. Every partial node left behind by a
//! template is a Q-node whose children run from empty to full.

use std::hash::Hash;

use tracing::{debug, trace};

use super::{Label, PertinentRoot, PqKind, PqNodeId, PqTree, PqTreeError};

impl<K: Copy + Eq + Hash> PqTree<K> {
    /// Restricts the tree to the orders in which the leaves `keys` are consecutive.
    ///
    /// On success the returned [`PertinentRoot`] locates the pertinent leaves, ready for
    /// [`PqTree::replace_pertinent`]. On failure the tree is left as it was, which is
    /// done by reducing a copy: every call costs O(tree size) on top of the reduction.
    pub fn reduce(&mut self, keys: &[K]) -> Result<PertinentRoot, PqTreeError> {
        if keys.is_empty() {
            return Err(PqTreeError::EmptyPertinentSet);
        }
        let mut leaves = Vec::with_capacity(keys.len());
        for (i, key) in keys.iter().enumerate() {
            let id = *self.leaves.get(key).ok_or(PqTreeError::UnknownLeaf(i))?;
            if !leaves.contains(&id) {
                leaves.push(id);
            }
        }

        let mut work = self.clone();
        let result = work.reduce_in_place(&leaves);
        work.reset_labels();
        match result {
            Ok(root) => {
                *self = work;
                Ok(root)
            }
            Err(err) => {
                debug!(%err, pertinent = leaves.len(), "reduction failed");
                Err(err)
            }
        }
    }

    fn reduce_in_place(&mut self, leaves: &[PqNodeId]) -> Result<PertinentRoot, PqTreeError> {
        let total = leaves.len();
        for &leaf in leaves {
            self.nodes[leaf].label = Label::Full;
            let mut current = Some(leaf);
            while let Some(c) = current {
                self.nodes[c].pertinent += 1;
                current = self.nodes[c].parent;
            }
        }

        let mut proot = leaves[0];
        while self.nodes[proot].pertinent < total {
            proot = self.nodes[proot]
                .parent
                .ok_or(PqTreeError::Irreducible(proot))?;
        }
        if self.nodes[proot].is_leaf() {
            return Ok(PertinentRoot::Full(proot));
        }

        let mut order = Vec::new();
        let mut stack = vec![proot];
        while let Some(x) = stack.pop() {
            order.push(x);
            stack.extend(
                self.nodes[x]
                    .children
                    .iter()
                    .filter(|c| self.nodes[**c].pertinent > 0 && !self.nodes[**c].is_leaf()),
            );
        }

        for &x in order.iter().rev() {
            let is_root = x == proot;
            let outcome = match self.nodes[x].kind {
                PqKind::P => self.template_p(x, is_root)?,
                PqKind::Q => self.template_q(x, is_root)?,
                PqKind::Leaf(_) => None,
            };
            trace!(node = %x, label = ?self.nodes[x].label, is_root, "template applied");
            if let Some(root) = outcome {
                return Ok(root);
            }
        }
        Err(PqTreeError::Irreducible(proot))
    }

    fn template_p(
        &mut self,
        x: PqNodeId,
        is_root: bool,
    ) -> Result<Option<PertinentRoot>, PqTreeError> {
        let children = self.nodes[x].children.clone();
        let (mut full, mut partial, mut empty) = (Vec::new(), Vec::new(), Vec::new());
        for &c in &children {
            match self.nodes[c].label {
                Label::Full => full.push(c),
                Label::Partial => partial.push(c),
                Label::Empty => empty.push(c),
            }
        }

        if partial.is_empty() && empty.is_empty() {
            self.nodes[x].label = Label::Full;
            return Ok(is_root.then_some(PertinentRoot::Full(x)));
        }

        match (partial.as_slice(), is_root) {
            ([], true) => {
                let at = children
                    .iter()
                    .position(|c| self.nodes[*c].label == Label::Full)
                    .ok_or(PqTreeError::Irreducible(x))?;
                let group = self
                    .group(full, Label::Full)
                    .ok_or(PqTreeError::Irreducible(x))?;
                let mut rest: Vec<_> = children
                    .into_iter()
                    .filter(|c| self.nodes[*c].label != Label::Full)
                    .collect();
                rest.insert(at, group);
                self.set_children(x, rest);
                Ok(Some(PertinentRoot::Full(group)))
            }
            ([], false) => {
                let halves: Vec<_> = self
                    .group(empty, Label::Empty)
                    .into_iter()
                    .chain(self.group(full, Label::Full))
                    .collect();
                self.nodes[x].kind = PqKind::Q;
                self.set_children(x, halves);
                self.nodes[x].label = Label::Partial;
                Ok(None)
            }
            (&[y], true) => {
                if let Some(fg) = self.group(full, Label::Full) {
                    self.nodes[y].children.push(fg);
                    self.nodes[fg].parent = Some(y);
                }
                self.absorb_into(x, y, empty);
                let (start, end) = self.full_span(y).ok_or(PqTreeError::Irreducible(y))?;
                Ok(Some(PertinentRoot::Range {
                    node: y,
                    start,
                    end,
                }))
            }
            (&[y], false) => {
                let inner = std::mem::take(&mut self.nodes[y].children);
                let merged: Vec<_> = self
                    .group(empty, Label::Empty)
                    .into_iter()
                    .chain(inner)
                    .chain(self.group(full, Label::Full))
                    .collect();
                self.set_children(y, merged);
                self.replace_node(x, y);
                self.kill(x);
                Ok(None)
            }
            (&[y1, y2], true) => {
                let mut second = std::mem::take(&mut self.nodes[y2].children);
                second.reverse();
                let mut merged = std::mem::take(&mut self.nodes[y1].children);
                merged.extend(self.group(full, Label::Full));
                merged.extend(second);
                self.set_children(y1, merged);
                self.kill(y2);
                self.absorb_into(x, y1, empty);
                let (start, end) = self.full_span(y1).ok_or(PqTreeError::Irreducible(y1))?;
                Ok(Some(PertinentRoot::Range {
                    node: y1,
                    start,
                    end,
                }))
            }
            _ => Err(PqTreeError::Irreducible(x)),
        }
    }

    /// Leaves `x` with its empty children and the partial `y`, or puts `y` in place of
    /// `x` when nothing else remains.
    fn absorb_into(&mut self, x: PqNodeId, y: PqNodeId, empty: Vec<PqNodeId>) {
        if empty.is_empty() {
            self.replace_node(x, y);
            self.kill(x);
        } else {
            let mut rest = empty;
            rest.push(y);
            self.set_children(x, rest);
        }
    }

    fn template_q(
        &mut self,
        x: PqNodeId,
        is_root: bool,
    ) -> Result<Option<PertinentRoot>, PqTreeError> {
        let mut labels: Vec<Label> = self.nodes[x]
            .children
            .iter()
            .map(|c| self.nodes[*c].label)
            .collect();
        if labels.iter().all(|l| *l == Label::Full) {
            self.nodes[x].label = Label::Full;
            return Ok(is_root.then_some(PertinentRoot::Full(x)));
        }

        let irreducible = PqTreeError::Irreducible(x);
        let (Some(first), Some(last)) = (
            labels.iter().position(|l| *l != Label::Empty),
            labels.iter().rposition(|l| *l != Label::Empty),
        ) else {
            return Err(irreducible);
        };
        if labels[first..=last].contains(&Label::Empty) {
            return Err(irreducible);
        }

        if is_root {
            if last > first {
                if labels[first + 1..last].iter().any(|l| *l != Label::Full) {
                    return Err(irreducible);
                }
                if labels[last] == Label::Partial {
                    self.splice_partial(x, last, true);
                }
            }
            if labels[first] == Label::Partial {
                self.splice_partial(x, first, false);
            }
            let (start, end) = self.full_span(x).ok_or(irreducible)?;
            return Ok(Some(PertinentRoot::Range {
                node: x,
                start,
                end,
            }));
        }

        let len = labels.len();
        let touches_left = first == 0;
        let touches_right = last == len - 1;
        let reverse = match (touches_left, touches_right) {
            (true, true) => labels[last] == Label::Partial,
            (_, true) => false,
            (true, false) => true,
            (false, false) => return Err(irreducible),
        };
        let first = if reverse {
            self.nodes[x].children.reverse();
            labels.reverse();
            len - 1 - last
        } else {
            first
        };
        if labels[first + 1..].iter().any(|l| *l != Label::Full) {
            return Err(irreducible);
        }
        if labels[first] == Label::Partial {
            self.splice_partial(x, first, false);
        }
        self.nodes[x].label = Label::Partial;
        Ok(None)
    }

    /// Replaces the partial child at `pos` of the Q-node `x` by its own children.
    fn splice_partial(&mut self, x: PqNodeId, pos: usize, reversed: bool) {
        let y = self.nodes[x].children[pos];
        let mut inner = std::mem::take(&mut self.nodes[y].children);
        if reversed {
            inner.reverse();
        }
        for &c in &inner {
            self.nodes[c].parent = Some(x);
        }
        self.nodes[x].children.splice(pos..=pos, inner);
        self.kill(y);
    }

    fn full_span(&self, q: PqNodeId) -> Option<(usize, usize)> {
        let children = &self.nodes[q].children;
        let is_full = |c: &PqNodeId| self.nodes[*c].label == Label::Full;
        let start = children.iter().position(is_full)?;
        let end = children.iter().rposition(is_full)? + 1;
        Some((start, end))
    }
}
