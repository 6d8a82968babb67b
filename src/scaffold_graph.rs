//! Scaffold graph: a sparse graph whose vertices are trusted long edges of
//! the base graph and whose edges are inferred long-range connections that
//! still need proving. Built once per resolution round and superseded by the
//! next round's graph, never mutated in place.

use crate::assembly_graph::EdgeId;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Inferred connection between two scaffold vertices. `length` is the
/// estimated gap span, `weight` the supporting evidence mass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaffoldEdge {
    pub start: EdgeId,
    pub end: EdgeId,
    pub length: i64,
    pub weight: f64,
}

impl ScaffoldEdge {
    pub fn new(start: EdgeId, end: EdgeId, length: i64, weight: f64) -> Self {
        ScaffoldEdge { start, end, length, weight }
    }
}

/// BTree-backed adjacency keeps iteration order stable across runs, which
/// the per-round substitution step relies on for reproducible output.
#[derive(Default, Clone)]
pub struct ScaffoldGraph {
    vertices: BTreeSet<EdgeId>,
    outgoing: BTreeMap<EdgeId, Vec<ScaffoldEdge>>,
    incoming: BTreeMap<EdgeId, Vec<ScaffoldEdge>>,
}

impl ScaffoldGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, v: EdgeId) {
        self.vertices.insert(v);
    }

    pub fn add_edge(&mut self, edge: ScaffoldEdge) {
        self.vertices.insert(edge.start);
        self.vertices.insert(edge.end);
        self.outgoing.entry(edge.start).or_default().push(edge);
        self.incoming.entry(edge.end).or_default().push(edge);
    }

    pub fn contains_vertex(&self, v: EdgeId) -> bool {
        self.vertices.contains(&v)
    }

    pub fn contains_edge(&self, start: EdgeId, end: EdgeId) -> bool {
        self.outgoing
            .get(&start)
            .map(|es| es.iter().any(|e| e.end == end))
            .unwrap_or(false)
    }

    pub fn vertices(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.vertices.iter().copied()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.outgoing.values().map(|v| v.len()).sum()
    }

    /// All scaffold edges in deterministic start-vertex order.
    pub fn edges(&self) -> impl Iterator<Item = &ScaffoldEdge> + '_ {
        self.outgoing.values().flatten()
    }

    pub fn outgoing_edges(&self, v: EdgeId) -> &[ScaffoldEdge] {
        self.outgoing.get(&v).map(|e| e.as_slice()).unwrap_or(&[])
    }

    pub fn incoming_edges(&self, v: EdgeId) -> &[ScaffoldEdge] {
        self.incoming.get(&v).map(|e| e.as_slice()).unwrap_or(&[])
    }

    pub fn out_degree(&self, v: EdgeId) -> usize {
        self.outgoing_edges(v).len()
    }

    pub fn in_degree(&self, v: EdgeId) -> usize {
        self.incoming_edges(v).len()
    }

    /// Edges that are the sole outgoing connection of their start vertex and
    /// the sole incoming connection of their end vertex. Only these are
    /// candidates for gap closing; anything else is still ambiguous at the
    /// scaffold level.
    pub fn univocal_edges(&self) -> Vec<ScaffoldEdge> {
        self.edges()
            .filter(|e| self.out_degree(e.start) == 1 && self.in_degree(e.end) == 1)
            .copied()
            .collect()
    }
}

/// Directed transition relation over base-graph edges, used as the mutable
/// working subgraph during pruning. Unlike `ScaffoldGraph` this one is meant
/// to be carved down edge by edge.
#[derive(Default, Clone)]
pub struct TransitionGraph {
    vertices: BTreeSet<EdgeId>,
    outgoing: BTreeMap<EdgeId, BTreeSet<EdgeId>>,
    incoming: BTreeMap<EdgeId, BTreeSet<EdgeId>>,
}

impl TransitionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, v: EdgeId) {
        self.vertices.insert(v);
    }

    pub fn add_edge(&mut self, from: EdgeId, to: EdgeId) {
        self.vertices.insert(from);
        self.vertices.insert(to);
        self.outgoing.entry(from).or_default().insert(to);
        self.incoming.entry(to).or_default().insert(from);
    }

    pub fn remove_edge(&mut self, from: EdgeId, to: EdgeId) {
        if let Some(set) = self.outgoing.get_mut(&from) {
            set.remove(&to);
        }
        if let Some(set) = self.incoming.get_mut(&to) {
            set.remove(&from);
        }
    }

    pub fn contains_vertex(&self, v: EdgeId) -> bool {
        self.vertices.contains(&v)
    }

    pub fn contains_edge(&self, from: EdgeId, to: EdgeId) -> bool {
        self.outgoing
            .get(&from)
            .map(|s| s.contains(&to))
            .unwrap_or(false)
    }

    pub fn vertices(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.vertices.iter().copied()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.outgoing.values().map(|s| s.len()).sum()
    }

    pub fn outgoing(&self, v: EdgeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.outgoing.get(&v).into_iter().flatten().copied()
    }

    pub fn incoming(&self, v: EdgeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.incoming.get(&v).into_iter().flatten().copied()
    }

    pub fn out_degree(&self, v: EdgeId) -> usize {
        self.outgoing.get(&v).map(|s| s.len()).unwrap_or(0)
    }

    pub fn in_degree(&self, v: EdgeId) -> usize {
        self.incoming.get(&v).map(|s| s.len()).unwrap_or(0)
    }

    /// Keep only vertices reachable from `source` going forward and from
    /// `sink` going backward; everything else is noise picked up by the
    /// bounded traversals.
    pub fn remove_disconnected(&mut self, source: EdgeId, sink: EdgeId) {
        let forward = self.reach(source, true);
        let backward = self.reach(sink, false);
        let keep: BTreeSet<EdgeId> = self
            .vertices
            .iter()
            .filter(|v| {
                **v == source || **v == sink || (forward.contains(*v) && backward.contains(*v))
            })
            .copied()
            .collect();
        self.vertices = keep.clone();
        self.outgoing.retain(|v, _| keep.contains(v));
        self.incoming.retain(|v, _| keep.contains(v));
        for set in self.outgoing.values_mut() {
            set.retain(|v| keep.contains(v));
        }
        for set in self.incoming.values_mut() {
            set.retain(|v| keep.contains(v));
        }
    }

    fn reach(&self, from: EdgeId, forward: bool) -> HashSet<EdgeId> {
        let mut seen = HashSet::new();
        let mut stack = vec![from];
        while let Some(v) = stack.pop() {
            if !seen.insert(v) {
                continue;
            }
            let next: Vec<EdgeId> = if forward {
                self.outgoing(v).collect()
            } else {
                self.incoming(v).collect()
            };
            for w in next {
                if !seen.contains(&w) {
                    stack.push(w);
                }
            }
        }
        seen
    }
}
