//! # Permutations
//!
//! Rotation systems are permutations of hedges: `σ` sends a hedge to the next one
//! around its node, `α` to its twin, and the cycles of `φ = σ ∘ α` are the faces.
//! [`HedgeGraphExt`] builds all three for a [`HedgeGraph`]; [`Permutation`] is the
//! plain `0..n` permutation they are stored as.

use std::{fmt, ops::Index};

use crate::half_edge::{involution::Hedge, HedgeGraph};

/// A permutation of `0..n`, kept together with its inverse.
///
/// ```
/// use planarize::permutation::Permutation;
///
/// let p = Permutation::from_map(vec![2, 0, 1, 3]);
/// assert_eq!(p.inverse().map(), &[1, 2, 0, 3]);
/// assert!(p.compose(&p.inverse()).is_identity());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Permutation {
    map: Vec<usize>,
    inv: Vec<usize>,
}

impl Permutation {
    pub fn id(n: usize) -> Self {
        Permutation {
            map: (0..n).collect(),
            inv: (0..n).collect(),
        }
    }

    /// `map[i]` is the image of `i`. `map` must be a bijection of `0..map.len()`.
    pub fn from_map(map: Vec<usize>) -> Self {
        let mut inv = vec![0; map.len()];
        for (i, &j) in map.iter().enumerate() {
            inv[j] = i;
        }
        Permutation { map, inv }
    }

    pub fn map(&self) -> &[usize] {
        &self.map
    }

    pub fn inv(&self) -> &[usize] {
        &self.inv
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn inverse(&self) -> Self {
        Permutation {
            map: self.inv.clone(),
            inv: self.map.clone(),
        }
    }

    /// `(self ∘ other)(i) = self[other[i]]`: `other` is applied first.
    ///
    /// ```
    /// # use planarize::permutation::Permutation;
    /// let a = Permutation::from_map(vec![1, 0, 2]);
    /// let b = Permutation::from_map(vec![0, 2, 1]);
    /// assert_eq!(a.compose(&b).map(), &[1, 2, 0]);
    /// ```
    pub fn compose(&self, other: &Self) -> Self {
        let map = other.map.iter().map(|&i| self.map[i]).collect();
        Self::from_map(map)
    }

    pub fn is_identity(&self) -> bool {
        self.map.iter().enumerate().all(|(i, &m)| i == m)
    }

    /// Returns the cycle decomposition of `self` as a `Vec` of cycles,
    /// each cycle represented as a `Vec<usize>`.
    /// Each cycle lists the indices of a single cycle, e.g. `[0, 2, 1]` means `0->2, 2->1, 1->0`.
    /// Cycles are ordered by their smallest element, which is also their first element.
    ///
    /// # Examples
    ///
    /// ```
    /// # use planarize::permutation::Permutation;
    /// let p = Permutation::from_map(vec![2, 0, 1, 3]);
    /// let cycles = p.find_cycles();
    /// assert_eq!(cycles, vec![vec![0, 2, 1], vec![3]]);
    /// ```
    pub fn find_cycles(&self) -> Vec<Vec<usize>> {
        let mut visited = vec![false; self.map.len()];
        let mut cycles = Vec::new();
        for i in 0..self.map.len() {
            if visited[i] {
                continue;
            }
            let mut cycle = Vec::new();
            let mut j = i;
            while !visited[j] {
                visited[j] = true;
                cycle.push(j);
                j = self.map[j];
            }
            if !cycle.is_empty() {
                cycles.push(cycle);
            }
        }
        cycles
    }
}

impl fmt::Display for Permutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cycles = self.find_cycles();
        let mut first = true;
        for cycle in cycles {
            if cycle.len() > 1 {
                if !first {
                    write!(f, " ")?;
                }
                write!(f, "(")?;
                for (i, &x) in cycle.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{x}")?;
                }
                write!(f, ")")?;
                first = false;
            }
        }
        if first {
            write!(f, "()")?;
        }

        write!(f, " [")?;
        for (i, &x) in self.map.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{x}")?;
        }
        write!(f, "]")
    }
}

impl Index<usize> for Permutation {
    type Output = usize;

    fn index(&self, index: usize) -> &Self::Output {
        &self.map()[index]
    }
}

/// The permutations a rotation system induces on the hedge slots of a graph.
///
/// Hedges of removed edges are fixed points of all three.
pub trait HedgeGraphExt {
    /// `σ`: every hedge to its successor in the rotation of its node.
    fn rotation_permutation(&self) -> Permutation;

    /// `α`: every hedge to its twin.
    fn involution_permutation(&self) -> Permutation;

    /// `φ = σ ∘ α`: every hedge to its successor on the boundary of its left face.
    fn face_permutation(&self) -> Permutation {
        self.rotation_permutation()
            .compose(&self.involution_permutation())
    }
}

impl<E, V> HedgeGraphExt for HedgeGraph<E, V> {
    fn rotation_permutation(&self) -> Permutation {
        Permutation::from_map(
            (0..self.hedge_bound())
                .map(|i| {
                    let h = Hedge(i);
                    if self.is_live_hedge(h) {
                        self.rot_next(h).0
                    } else {
                        i
                    }
                })
                .collect(),
        )
    }

    fn involution_permutation(&self) -> Permutation {
        Permutation::from_map(
            (0..self.hedge_bound())
                .map(|i| {
                    let h = Hedge(i);
                    if self.is_live_hedge(h) {
                        self.inv(h).0
                    } else {
                        i
                    }
                })
                .collect(),
        )
    }
}
