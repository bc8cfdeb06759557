//! Straight-line grid drawings by the shift method.
//!
//! Vertices are placed in shelling order. The contour always runs from `v1` to `v2`
//! with edges of slope `+1` or `-1`. A new step is put where the slope `+1` line from
//! its left neighbour meets the slope `-1` line from its right neighbour, after
//! shifting the covered part of the contour right by one and the part from the right
//! neighbour on by two per new vertex. A vertex moves together with every vertex it
//! covered, which keeps the drawing below it intact.

use tracing::trace;

use super::{ShellingOrder, ShellingStep};
use crate::{
    half_edge::NodeIndex,
    planarity::{GridPlacer, PlanarizationError},
};

/// Integer coordinates for the nodes of a [`ShellingOrder`]'s graph.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridLayout {
    coords: Vec<Option<(i64, i64)>>,
    width: i64,
    height: i64,
}

impl GridLayout {
    /// Places `order` with the [`ShiftMethod`].
    pub fn from_shelling(order: &ShellingOrder) -> Result<Self, PlanarizationError> {
        ShiftMethod.place(order)
    }

    pub fn position(&self, node: NodeIndex) -> Option<(i64, i64)> {
        self.coords.get(node.0).copied().flatten()
    }

    pub fn positions(&self) -> impl Iterator<Item = (NodeIndex, (i64, i64))> + '_ {
        self.coords
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.map(|c| (NodeIndex(i), c)))
    }

    pub fn width(&self) -> i64 {
        self.width
    }

    pub fn height(&self) -> i64 {
        self.height
    }

    /// Lower left and upper right corner of the placed nodes.
    pub fn bounding_box(&self) -> Option<((i64, i64), (i64, i64))> {
        let mut positions = self.positions().map(|(_, c)| c);
        let first = positions.next()?;
        Some(positions.fold((first, first), |((x0, y0), (x1, y1)), (x, y)| {
            ((x0.min(x), y0.min(y)), (x1.max(x), y1.max(y)))
        }))
    }
}

/// The de Fraysseix–Pach–Pollack shift method, extended to chains as Kant does.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShiftMethod;

impl GridPlacer for ShiftMethod {
    fn place(&self, order: &ShellingOrder) -> Result<GridLayout, PlanarizationError> {
        let mut state = ShiftState::new(order.graph().node_bound());
        let mut steps = order.iter();
        if let Some(first) = steps.next() {
            state.start(first)?;
        }
        for step in steps {
            state.add(step)?;
        }
        Ok(state.finish())
    }
}

struct ShiftState {
    coords: Vec<Option<(i64, i64)>>,
    /// Everything that moves along with a contour vertex, itself included.
    shift_set: Vec<Vec<NodeIndex>>,
    contour: Vec<NodeIndex>,
}

fn malformed(step: &ShellingStep, reason: &str) -> PlanarizationError {
    PlanarizationError::UnsupportedConfiguration(format!(
        "cannot place step {:?}: {reason}",
        step.nodes
    ))
}

impl ShiftState {
    fn new(bound: usize) -> Self {
        ShiftState {
            coords: vec![None; bound],
            shift_set: vec![Vec::new(); bound],
            contour: Vec::new(),
        }
    }

    fn put(&mut self, node: NodeIndex, at: (i64, i64)) {
        self.coords[node.0] = Some(at);
        self.shift_set[node.0] = vec![node];
    }

    fn at(&self, node: NodeIndex) -> (i64, i64) {
        self.coords[node.0].unwrap_or_default()
    }

    fn start(&mut self, base: &ShellingStep) -> Result<(), PlanarizationError> {
        match base.nodes.as_slice() {
            [only] => self.put(*only, (0, 0)),
            [v1, v2] => {
                self.put(*v1, (0, 0));
                self.put(*v2, (2, 0));
            }
            _ => return Err(malformed(base, "the first step must be one node or the base")),
        }
        self.contour = base.nodes.clone();
        Ok(())
    }

    fn shift(&mut self, contour_node: NodeIndex, dx: i64) {
        for &n in &self.shift_set[contour_node.0] {
            if let Some((x, _)) = self.coords[n.0].as_mut() {
                *x += dx;
            }
        }
    }

    fn add(&mut self, step: &ShellingStep) -> Result<(), PlanarizationError> {
        let (Some(left), Some(right)) = (step.left, step.right) else {
            return Err(malformed(step, "missing contour neighbours"));
        };
        let position = |n: NodeIndex| self.contour.iter().position(|c| *c == n);
        let (Some(p), Some(q)) = (position(left), position(right)) else {
            return Err(malformed(step, "neighbours are not on the contour"));
        };
        if p >= q {
            return Err(malformed(step, "left neighbour is not left of the right one"));
        }
        if step.nodes.is_empty()
            || step
                .nodes
                .iter()
                .any(|n| self.coords.get(n.0).map_or(true, Option::is_some))
        {
            return Err(malformed(step, "nodes are missing or placed already"));
        }

        let l = step.nodes.len() as i64;
        let covered: Vec<NodeIndex> = self.contour[p + 1..q].to_vec();
        for &c in &covered {
            self.shift(c, 1);
        }
        for c in self.contour[q..].to_vec() {
            self.shift(c, 2 * l);
        }

        let (xp, yp) = self.at(left);
        let (xq, yq) = self.at(right);
        // where the right neighbour would be for a single vertex
        let xq = xq - 2 * (l - 1);
        debug_assert_eq!((xp + xq + yq - yp) % 2, 0);
        let (x, y) = ((xp + xq + yq - yp) / 2, (xq - xp + yq + yp) / 2);

        for (i, &z) in step.nodes.iter().enumerate() {
            let i = i as i64;
            self.put(z, (x + i, y + i));
        }
        let first = step.nodes[0];
        for c in covered {
            let moved = std::mem::take(&mut self.shift_set[c.0]);
            self.shift_set[first.0].extend(moved);
        }
        trace!(nodes = ?step.nodes, %left, %right, x, y, "placed");

        self.contour.splice(p + 1..q, step.nodes.iter().copied());
        Ok(())
    }

    fn finish(self) -> GridLayout {
        let (width, height) = self
            .coords
            .iter()
            .flatten()
            .fold((0, 0), |(w, h), &(x, y)| (w.max(x), h.max(y)));
        GridLayout {
            coords: self.coords,
            width,
            height,
        }
    }
}
