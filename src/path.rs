use crate::assembly_graph::{AssemblyGraph, EdgeId};
use std::collections::HashMap;

/// Ordered run of graph edges with a recorded gap before each edge (zero for
/// the first, and for directly adjacent pairs). Owns no edges; edges are
/// shared identities into the graph.
#[derive(Clone, Debug, Default)]
pub struct BidirectionalPath {
    edges: Vec<EdgeId>,
    gaps: Vec<i64>,
    weight: f64,
}

impl BidirectionalPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_edges(edges: &[EdgeId]) -> Self {
        let mut path = Self::new();
        for &e in edges {
            path.push_back(e, 0);
        }
        path
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn at(&self, i: usize) -> EdgeId {
        self.edges[i]
    }

    /// Gap recorded before edge `i`.
    pub fn gap_at(&self, i: usize) -> i64 {
        self.gaps[i]
    }

    pub fn back(&self) -> Option<EdgeId> {
        self.edges.last().copied()
    }

    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub fn push_back(&mut self, e: EdgeId, gap: i64) {
        self.gaps.push(if self.edges.is_empty() { 0 } else { gap });
        self.edges.push(e);
    }

    /// Prepend an edge; `gap_to_next` becomes the gap before the old head.
    pub fn push_front(&mut self, e: EdgeId, gap_to_next: i64) {
        self.edges.insert(0, e);
        self.gaps.insert(0, 0);
        if self.edges.len() > 1 {
            self.gaps[1] = gap_to_next;
        }
    }

    pub fn pop_back(&mut self) -> Option<EdgeId> {
        self.gaps.pop();
        self.edges.pop()
    }

    pub fn pop_front(&mut self) -> Option<EdgeId> {
        if self.edges.is_empty() {
            return None;
        }
        self.gaps.remove(0);
        if !self.gaps.is_empty() {
            self.gaps[0] = 0;
        }
        Some(self.edges.remove(0))
    }

    /// Length of the path suffix starting at edge `i`, gaps included.
    pub fn length_at(&self, graph: &AssemblyGraph, i: usize) -> usize {
        let mut total: i64 = 0;
        for j in i..self.edges.len() {
            total += graph.length(self.edges[j]) as i64;
            if j > i {
                total += self.gaps[j];
            }
        }
        total.max(0) as usize
    }

    pub fn total_length(&self, graph: &AssemblyGraph) -> usize {
        self.length_at(graph, 0)
    }

    /// Positions of every occurrence of `e` in the path.
    pub fn find_all(&self, e: EdgeId) -> Vec<usize> {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, x)| **x == e)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    /// Consecutive edges must be adjacent in the graph unless a nonzero gap
    /// is recorded between them.
    pub fn check_connectivity(&self, graph: &AssemblyGraph) -> bool {
        self.edges.windows(2).enumerate().all(|(i, pair)| {
            graph.edge_end(pair[0]) == graph.edge_start(pair[1]) || self.gaps[i + 1] != 0
        })
    }
}

/// A path and its reverse-complement twin, mutated only through this owner so
/// the mirror invariant can always be restored to a checkable state.
#[derive(Clone, Debug, Default)]
pub struct PathPair {
    forward: BidirectionalPath,
    reverse: BidirectionalPath,
}

impl PathPair {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_edges(edges: &[EdgeId]) -> Self {
        let mut pair = Self::new();
        for &e in edges {
            pair.push_back(e, 0);
        }
        pair
    }

    pub fn forward(&self) -> &BidirectionalPath {
        &self.forward
    }

    pub fn reverse(&self) -> &BidirectionalPath {
        &self.reverse
    }

    pub fn push_back(&mut self, e: EdgeId, gap: i64) {
        self.forward.push_back(e, gap);
        self.reverse.push_front(e.conjugate(), gap);
    }

    pub fn pop_back(&mut self) -> Option<EdgeId> {
        self.reverse.pop_front();
        self.forward.pop_back()
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.forward.set_weight(weight);
        self.reverse.set_weight(weight);
    }

    /// Verify that the two halves are exact conjugate mirrors, gaps included.
    /// Run after any batch of mutations that bypassed the pair API.
    pub fn check_symmetry(&self) -> bool {
        let n = self.forward.len();
        if self.reverse.len() != n {
            return false;
        }
        for j in 0..n {
            if self.reverse.at(j) != self.forward.at(n - 1 - j).conjugate() {
                return false;
            }
        }
        for j in 1..n {
            if self.reverse.gap_at(j) != self.forward.gap_at(n - j) {
                return false;
            }
        }
        true
    }
}

/// Addresses one half of a stored path pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PathKey {
    pub pair: usize,
    pub conjugate: bool,
}

/// Owner of all constructed path pairs.
#[derive(Default)]
pub struct PathContainer {
    pairs: Vec<PathPair>,
}

impl PathContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, pair: PathPair) -> usize {
        self.pairs.push(pair);
        self.pairs.len() - 1
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pair(&self, i: usize) -> &PathPair {
        &self.pairs[i]
    }

    pub fn path(&self, key: PathKey) -> &BidirectionalPath {
        if key.conjugate {
            self.pairs[key.pair].reverse()
        } else {
            self.pairs[key.pair].forward()
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathPair> {
        self.pairs.iter()
    }
}

/// Which paths currently cover a given edge. Rebuilt from the container;
/// read-only lookups are safe concurrently with extension of other paths.
#[derive(Default)]
pub struct GraphCoverageMap {
    map: HashMap<EdgeId, Vec<PathKey>>,
}

impl GraphCoverageMap {
    pub fn build(container: &PathContainer) -> Self {
        let mut map: HashMap<EdgeId, Vec<PathKey>> = HashMap::new();
        for (i, pair) in container.iter().enumerate() {
            for (half, conjugate) in [(pair.forward(), false), (pair.reverse(), true)] {
                let key = PathKey { pair: i, conjugate };
                let mut seen = std::collections::HashSet::new();
                for &e in half.edges() {
                    if seen.insert(e) {
                        map.entry(e).or_default().push(key);
                    }
                }
            }
        }
        GraphCoverageMap { map }
    }

    pub fn covering_paths(&self, e: EdgeId) -> &[PathKey] {
        self.map.get(&e).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn coverage(&self, e: EdgeId) -> usize {
        self.covering_paths(e).len()
    }
}
