//! Coarse summary graph: vertices are union-find classes of original
//! vertices, edges are the retained ("long") original edges between classes.
//! Built once and never mutated in place; transposition and subgraph
//! extraction produce new instances.

use crate::assembly_graph::{AssemblyGraph, EdgeId, VertexId};
use crate::concurrent_dsu::ConcurrentDsu;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::info;

#[derive(Default, Clone)]
pub struct ContractedGraph {
    vertices: BTreeSet<VertexId>,
    outgoing: HashMap<VertexId, BTreeMap<VertexId, Vec<EdgeId>>>,
    incoming: HashMap<VertexId, BTreeMap<VertexId, Vec<EdgeId>>>,
    vertex_to_root: HashMap<VertexId, VertexId>,
    capacity: HashMap<VertexId, usize>,
}

impl ContractedGraph {
    /// Contract every edge failing `predicate`; edges passing it become the
    /// retained edges of the summary graph. The DSU merge sweep is
    /// data-parallel over the edge set: unions commute and are idempotent,
    /// so worker interleaving cannot change the resulting partition.
    pub fn from_predicate<F>(graph: &AssemblyGraph, predicate: F) -> ContractedGraph
    where
        F: Fn(EdgeId) -> bool + Sync,
    {
        let dsu = ConcurrentDsu::new(graph.vertex_capacity());
        let edges: Vec<EdgeId> = graph.edge_ids().collect();
        edges.par_iter().for_each(|&e| {
            if !predicate(e) {
                dsu.unite(graph.edge_start(e), graph.edge_end(e));
            }
        });

        let mut result = ContractedGraph::default();
        for v in graph.vertex_ids() {
            let root = dsu.find(v);
            result.vertex_to_root.insert(v, root);
            result.vertices.insert(root);
        }
        for e in &edges {
            let start_root = result.vertex_to_root[&graph.edge_start(*e)];
            let end_root = result.vertex_to_root[&graph.edge_end(*e)];
            if predicate(*e) {
                result.insert_edge(start_root, end_root, *e);
            } else {
                *result.capacity.entry(start_root).or_insert(0) += graph.length(*e);
            }
        }
        info!(
            vertices = result.vertex_count(),
            edges = result.edge_count(),
            "built contracted graph from edge predicate"
        );
        result
    }

    /// Contract externally supplied vertex clusters instead of predicate
    /// failures; retained edges are those crossing between classes.
    pub fn from_clusters(graph: &AssemblyGraph, clusters: &[Vec<VertexId>]) -> ContractedGraph {
        let dsu = ConcurrentDsu::new(graph.vertex_capacity());
        clusters.par_iter().for_each(|cluster| {
            for pair in cluster.windows(2) {
                dsu.unite(pair[0], pair[1]);
            }
        });

        let mut result = ContractedGraph::default();
        for v in graph.vertex_ids() {
            let root = dsu.find(v);
            result.vertex_to_root.insert(v, root);
            result.vertices.insert(root);
        }
        for e in graph.edge_ids() {
            let start_root = result.vertex_to_root[&graph.edge_start(e)];
            let end_root = result.vertex_to_root[&graph.edge_end(e)];
            if start_root == end_root {
                *result.capacity.entry(start_root).or_insert(0) += graph.length(e);
            } else {
                result.insert_edge(start_root, end_root, e);
            }
        }
        result
    }

    /// New graph with every edge reversed; lets forward algorithms run on
    /// the reverse graph without duplicating logic.
    pub fn transpose(&self) -> ContractedGraph {
        ContractedGraph {
            vertices: self.vertices.clone(),
            outgoing: self.incoming.clone(),
            incoming: self.outgoing.clone(),
            vertex_to_root: self.vertex_to_root.clone(),
            capacity: self.capacity.clone(),
        }
    }

    /// Restriction to `keep`, dropping edges with either endpoint outside.
    pub fn subgraph(&self, keep: &HashSet<VertexId>) -> ContractedGraph {
        let mut result = ContractedGraph {
            vertices: self.vertices.iter().filter(|v| keep.contains(v)).copied().collect(),
            vertex_to_root: self
                .vertex_to_root
                .iter()
                .filter(|(_, root)| keep.contains(root))
                .map(|(v, root)| (*v, *root))
                .collect(),
            capacity: self
                .capacity
                .iter()
                .filter(|(root, _)| keep.contains(root))
                .map(|(root, c)| (*root, *c))
                .collect(),
            ..Default::default()
        };
        for (from, to, e) in self.edges() {
            if keep.contains(&from) && keep.contains(&to) {
                result.insert_edge(from, to, e);
            }
        }
        result
    }

    fn insert_edge(&mut self, from: VertexId, to: VertexId, e: EdgeId) {
        self.outgoing.entry(from).or_default().entry(to).or_default().push(e);
        self.incoming.entry(to).or_default().entry(from).or_default().push(e);
    }

    /// Representative of the class an original vertex was contracted into.
    pub fn root_of(&self, v: VertexId) -> Option<VertexId> {
        self.vertex_to_root.get(&v).copied()
    }

    /// Total length of contracted-away structure inside a class.
    pub fn capacity_of(&self, root: VertexId) -> usize {
        self.capacity.get(&root).copied().unwrap_or(0)
    }

    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.iter().copied()
    }

    pub fn contains_vertex(&self, root: VertexId) -> bool {
        self.vertices.contains(&root)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Retained edges as `(from_class, to_class, original_edge)`, in
    /// deterministic class order.
    pub fn edges(&self) -> impl Iterator<Item = (VertexId, VertexId, EdgeId)> + '_ {
        self.outgoing.iter().flat_map(|(from, targets)| {
            targets.iter().flat_map(move |(to, edges)| {
                edges.iter().map(move |e| (*from, *to, *e))
            })
        })
    }

    pub fn edge_count(&self) -> usize {
        self.outgoing
            .values()
            .flat_map(|t| t.values())
            .map(|v| v.len())
            .sum()
    }

    /// Number of retained original edges between two classes.
    pub fn multiplicity(&self, from: VertexId, to: VertexId) -> usize {
        self.outgoing
            .get(&from)
            .and_then(|t| t.get(&to))
            .map(|v| v.len())
            .unwrap_or(0)
    }

    pub fn outgoing_of(&self, root: VertexId) -> impl Iterator<Item = (VertexId, &[EdgeId])> + '_ {
        self.outgoing
            .get(&root)
            .into_iter()
            .flat_map(|t| t.iter().map(|(to, es)| (*to, es.as_slice())))
    }

    pub fn out_degree(&self, root: VertexId) -> usize {
        self.outgoing
            .get(&root)
            .map(|t| t.values().map(|v| v.len()).sum())
            .unwrap_or(0)
    }

    pub fn in_degree(&self, root: VertexId) -> usize {
        self.incoming
            .get(&root)
            .map(|t| t.values().map(|v| v.len()).sum())
            .unwrap_or(0)
    }
}
