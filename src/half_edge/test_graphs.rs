use std::fmt;

use super::*;
use crate::half_edge::builder::HedgeGraphBuilder;

#[test]
fn test_petersen() -> TestResult {
    TestGraph::Petersen.test_all()
}

#[test]
fn test_complete_5() -> TestResult {
    TestGraph::Complete(5).test_all()
}

#[test]
fn test_complete_bipartite_3_3() -> TestResult {
    TestGraph::CompleteBipartite(3, 3).test_all()
}

#[test]
fn test_wheel_6() -> TestResult {
    TestGraph::Wheel(6).test_all()
}

#[test]
fn test_grid_4_3() -> TestResult {
    TestGraph::Grid(4, 3).test_all()
}

#[test]
fn test_prism_5() -> TestResult {
    TestGraph::Prism(5).test_all()
}

#[test]
fn test_cycle_5() -> TestResult {
    TestGraph::Cycle(5).test_all()
}

#[test]
fn test_path_4() -> TestResult {
    TestGraph::Path(4).test_all()
}

// Test Graph Structures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub(crate) enum TestGraph {
    Petersen,
    Complete(usize),                 // Kn
    CompleteBipartite(usize, usize), // Km,n
    Wheel(usize),                    // hub plus a rim of n nodes
    Grid(usize, usize),              // w x h lattice
    Prism(usize),                    // two n-cycles joined by rungs
    Cycle(usize),                    // cycle of length n
    Path(usize),                     // path on n nodes
}

impl fmt::Display for TestGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestGraph::Petersen => write!(f, "Petersen"),
            TestGraph::Complete(n) => write!(f, "Complete({n})"),
            TestGraph::CompleteBipartite(n, m) => write!(f, "CompleteBipartite({n}, {m})"),
            TestGraph::Wheel(n) => write!(f, "Wheel({n})"),
            TestGraph::Grid(w, h) => write!(f, "Grid({w}, {h})"),
            TestGraph::Prism(n) => write!(f, "Prism({n})"),
            TestGraph::Cycle(n) => write!(f, "Cycle({n})"),
            TestGraph::Path(n) => write!(f, "Path({n})"),
        }
    }
}

#[derive(Debug, Clone)]
#[allow(dead_code)]
pub(crate) struct GraphProperties {
    pub n_nodes: usize,
    pub n_edges: usize,
    pub connected_components: usize,
    pub min_degree: usize,
    pub max_degree: usize,
    pub is_planar: bool,
    /// Known crossing number, where it is small enough to be tabulated.
    pub crossing_number: Option<usize>,
}

/// Zarankiewicz's formula, exact for `min(m, n) <= 6`.
fn zarankiewicz(m: usize, n: usize) -> usize {
    (m / 2) * (m.saturating_sub(1) / 2) * (n / 2) * (n.saturating_sub(1) / 2)
}

impl TestGraph {
    pub(crate) fn graph(&self) -> HedgeGraph<(), ()> {
        self.build().0
    }

    pub(crate) fn build(&self) -> (HedgeGraph<(), ()>, GraphProperties) {
        let mut builder = HedgeGraphBuilder::new();

        match *self {
            TestGraph::Petersen => {
                let outer: Vec<_> = (0..5).map(|_| builder.add_node(())).collect();
                let inner: Vec<_> = (0..5).map(|_| builder.add_node(())).collect();
                for i in 0..5 {
                    builder.add_edge(outer[i], outer[(i + 1) % 5], ());
                    builder.add_edge(outer[i], inner[i], ());
                    builder.add_edge(inner[i], inner[(i + 2) % 5], ());
                }

                let properties = GraphProperties {
                    n_nodes: 10,
                    n_edges: 15,
                    connected_components: 1,
                    min_degree: 3,
                    max_degree: 3,
                    is_planar: false,
                    crossing_number: Some(2),
                };
                (builder.build(), properties)
            }

            TestGraph::Complete(n) => {
                let nodes: Vec<_> = (0..n).map(|_| builder.add_node(())).collect();
                for i in 0..n {
                    for j in (i + 1)..n {
                        builder.add_edge(nodes[i], nodes[j], ());
                    }
                }

                let crossing_number = match n {
                    0..=4 => Some(0),
                    5 => Some(1),
                    6 => Some(3),
                    7 => Some(9),
                    8 => Some(18),
                    _ => None,
                };
                let properties = GraphProperties {
                    n_nodes: n,
                    n_edges: n * n.saturating_sub(1) / 2,
                    connected_components: usize::from(n > 0),
                    min_degree: n.saturating_sub(1),
                    max_degree: n.saturating_sub(1),
                    is_planar: n <= 4,
                    crossing_number,
                };
                (builder.build(), properties)
            }

            TestGraph::CompleteBipartite(m, n) => {
                let left: Vec<_> = (0..m).map(|_| builder.add_node(())).collect();
                let right: Vec<_> = (0..n).map(|_| builder.add_node(())).collect();
                for &a in &left {
                    for &b in &right {
                        builder.add_edge(a, b, ());
                    }
                }

                let properties = GraphProperties {
                    n_nodes: m + n,
                    n_edges: m * n,
                    connected_components: 1,
                    min_degree: m.min(n),
                    max_degree: m.max(n),
                    is_planar: m.min(n) <= 2,
                    crossing_number: (m.min(n) <= 6).then(|| zarankiewicz(m, n)),
                };
                (builder.build(), properties)
            }

            TestGraph::Wheel(n) => {
                let hub = builder.add_node(());
                let rim: Vec<_> = (0..n).map(|_| builder.add_node(())).collect();
                for i in 0..n {
                    builder.add_edge(rim[i], rim[(i + 1) % n], ());
                }
                for &r in &rim {
                    builder.add_edge(hub, r, ());
                }

                let properties = GraphProperties {
                    n_nodes: n + 1,
                    n_edges: 2 * n,
                    connected_components: 1,
                    min_degree: 3,
                    max_degree: n.max(3),
                    is_planar: true,
                    crossing_number: Some(0),
                };
                (builder.build(), properties)
            }

            TestGraph::Grid(w, h) => {
                let nodes: Vec<Vec<_>> = (0..h)
                    .map(|_| (0..w).map(|_| builder.add_node(())).collect())
                    .collect();
                for y in 0..h {
                    for x in 0..w {
                        if x + 1 < w {
                            builder.add_edge(nodes[y][x], nodes[y][x + 1], ());
                        }
                        if y + 1 < h {
                            builder.add_edge(nodes[y][x], nodes[y + 1][x], ());
                        }
                    }
                }

                let properties = GraphProperties {
                    n_nodes: w * h,
                    n_edges: (w - 1) * h + w * (h - 1),
                    connected_components: 1,
                    min_degree: 2,
                    max_degree: if w > 2 && h > 2 { 4 } else { 3 },
                    is_planar: true,
                    crossing_number: Some(0),
                };
                (builder.build(), properties)
            }

            TestGraph::Prism(n) => {
                let top: Vec<_> = (0..n).map(|_| builder.add_node(())).collect();
                let bottom: Vec<_> = (0..n).map(|_| builder.add_node(())).collect();
                for i in 0..n {
                    builder.add_edge(top[i], top[(i + 1) % n], ());
                    builder.add_edge(bottom[i], bottom[(i + 1) % n], ());
                    builder.add_edge(top[i], bottom[i], ());
                }

                let properties = GraphProperties {
                    n_nodes: 2 * n,
                    n_edges: 3 * n,
                    connected_components: 1,
                    min_degree: 3,
                    max_degree: 3,
                    is_planar: true,
                    crossing_number: Some(0),
                };
                (builder.build(), properties)
            }

            TestGraph::Cycle(n) => {
                let nodes: Vec<_> = (0..n).map(|_| builder.add_node(())).collect();
                for i in 0..n {
                    builder.add_edge(nodes[i], nodes[(i + 1) % n], ());
                }

                let properties = GraphProperties {
                    n_nodes: n,
                    n_edges: n,
                    connected_components: 1,
                    min_degree: 2,
                    max_degree: 2,
                    is_planar: true,
                    crossing_number: Some(0),
                };
                (builder.build(), properties)
            }

            TestGraph::Path(n) => {
                let nodes: Vec<_> = (0..n).map(|_| builder.add_node(())).collect();
                for pair in nodes.windows(2) {
                    builder.add_edge(pair[0], pair[1], ());
                }

                let properties = GraphProperties {
                    n_nodes: n,
                    n_edges: n.saturating_sub(1),
                    connected_components: 1,
                    min_degree: if n > 2 { 1 } else { n.saturating_sub(1) },
                    max_degree: if n > 2 { 2 } else { n.saturating_sub(1) },
                    is_planar: true,
                    crossing_number: Some(0),
                };
                (builder.build(), properties)
            }
        }
    }
}

pub(crate) type TestResult = Result<(), TestError>;

#[derive(Debug)]
#[allow(dead_code)]
pub(crate) enum TestError {
    WrongNodeCount { expected: usize, found: usize },
    WrongEdgeCount { expected: usize, found: usize },
    WrongComponentCount { expected: usize, found: usize },
    WrongDegree {
        kind: &'static str,
        expected: usize,
        found: usize,
    },
    InvalidRotation(NodeIndex),
    Custom(String),
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestError::WrongNodeCount { expected, found } => write!(
                f,
                "Wrong number of nodes. Expected: {expected}, Found: {found}",
            ),
            TestError::WrongEdgeCount { expected, found } => write!(
                f,
                "Wrong number of edges. Expected: {expected}, Found: {found}",
            ),
            TestError::WrongComponentCount { expected, found } => write!(
                f,
                "Wrong number of components. Expected: {expected}, Found: {found}",
            ),
            TestError::WrongDegree {
                kind,
                expected,
                found,
            } => write!(
                f,
                "Wrong {kind} degree. Expected: {expected}, Found: {found}",
            ),
            TestError::InvalidRotation(n) => write!(f, "Rotation of node {n} is broken"),
            TestError::Custom(msg) => write!(f, "{msg}"),
        }
    }
}

impl TestGraph {
    fn test_basic_properties(
        &self,
        graph: &HedgeGraph<(), ()>,
        props: &GraphProperties,
    ) -> TestResult {
        if graph.n_nodes() != props.n_nodes {
            return Err(TestError::WrongNodeCount {
                expected: props.n_nodes,
                found: graph.n_nodes(),
            });
        }

        if graph.n_edges() != props.n_edges {
            return Err(TestError::WrongEdgeCount {
                expected: props.n_edges,
                found: graph.n_edges(),
            });
        }

        let components = graph.count_connected_components();
        if components != props.connected_components {
            return Err(TestError::WrongComponentCount {
                expected: props.connected_components,
                found: components,
            });
        }

        Ok(())
    }

    fn test_degree_distribution(
        &self,
        graph: &HedgeGraph<(), ()>,
        props: &GraphProperties,
    ) -> TestResult {
        let mut min_degree = usize::MAX;
        let mut max_degree = 0;

        for n in graph.iter_node_ids() {
            let degree = graph.iter_crown(n).count();
            if degree != graph.degree(n) {
                return Err(TestError::InvalidRotation(n));
            }
            min_degree = min_degree.min(degree);
            max_degree = max_degree.max(degree);
        }

        if min_degree != props.min_degree {
            return Err(TestError::WrongDegree {
                kind: "minimum",
                expected: props.min_degree,
                found: min_degree,
            });
        }

        if max_degree != props.max_degree {
            return Err(TestError::WrongDegree {
                kind: "maximum",
                expected: props.max_degree,
                found: max_degree,
            });
        }

        Ok(())
    }

    fn test_rotations(&self, graph: &HedgeGraph<(), ()>) -> TestResult {
        for n in graph.iter_node_ids() {
            for h in graph.iter_crown(n) {
                if graph.node_id(h) != n
                    || graph.rot_prev(graph.rot_next(h)) != h
                    || graph.inv(graph.inv(h)) != h
                {
                    return Err(TestError::InvalidRotation(n));
                }
            }
        }
        Ok(())
    }

    pub(crate) fn test_all(&self) -> TestResult {
        let (graph, properties) = self.build();

        self.test_basic_properties(&graph, &properties)?;
        self.test_degree_distribution(&graph, &properties)?;
        self.test_rotations(&graph)?;

        Ok(())
    }
}
