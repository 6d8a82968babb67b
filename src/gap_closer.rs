//! Iterative scaffold-graph gap closing. For every univocal scaffold
//! connection the closer carves a barcode-supported corridor out of the base
//! graph, prunes it with edge predicates, and tries to read off a single
//! resolving path. Closed connections are substituted into a successor
//! scaffold graph and the whole procedure repeats until a round closes
//! nothing. One unresolved connection never fails the round; it is simply
//! carried forward.

use crate::assembly_graph::{AssemblyGraph, EdgeId};
use crate::dijkstra::{BackwardNeighbours, BarcodePutChecker, BoundedDijkstra, ForwardNeighbours};
use crate::gap_predicates::{GapCloserPredicateBuilder, ScaffoldEdgeScoreFunction};
use crate::scaffold_graph::{ScaffoldEdge, ScaffoldGraph, TransitionGraph};
use crate::stats::BarcodeIndex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

// Settled-vertex cap for the corridor searches.
const MAX_SUBGRAPH_VERTICES: usize = 10_000;

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SubgraphExtractorParams {
    pub distance_threshold: usize,
    pub share_threshold: f64,
    pub count_threshold: usize,
    pub small_length_threshold: usize,
    pub large_length_threshold: usize,
}

/// Builds the candidate transition graph for one scaffold connection: base
/// graph edges that lie on a barcode-compatible corridor between the two
/// endpoints, wired with the scaffold transitions known between them.
pub struct CloudSubgraphExtractor<'a> {
    graph: &'a AssemblyGraph,
    barcodes: &'a BarcodeIndex,
    params: SubgraphExtractorParams,
}

impl<'a> CloudSubgraphExtractor<'a> {
    pub fn new(
        graph: &'a AssemblyGraph,
        barcodes: &'a BarcodeIndex,
        params: SubgraphExtractorParams,
    ) -> Self {
        CloudSubgraphExtractor {
            graph,
            barcodes,
            params,
        }
    }

    /// Interior vertices are mid-sized edges; the endpoints themselves and
    /// their conjugates never qualify.
    fn check_subgraph_vertex(&self, e: EdgeId, first: EdgeId, second: EdgeId) -> bool {
        let len = self.graph.length(e);
        len >= self.params.small_length_threshold
            && len < self.params.large_length_threshold
            && e != first.conjugate()
            && e != second.conjugate()
    }

    pub fn extract_subgraph(
        &self,
        source: &ScaffoldGraph,
        first: EdgeId,
        second: EdgeId,
    ) -> TransitionGraph {
        let targets = self
            .barcodes
            .shared_barcodes(first, second, self.params.count_threshold);
        let checker = BarcodePutChecker::new(
            self.graph,
            self.barcodes,
            targets,
            self.params.share_threshold,
            self.params.count_threshold,
            self.params.small_length_threshold,
        );
        let dijkstra = BoundedDijkstra::new(
            self.graph,
            self.params.distance_threshold,
            MAX_SUBGRAPH_VERTICES,
        );
        let forward_source = ForwardNeighbours::new(self.graph);
        let backward_source = BackwardNeighbours::new(self.graph);
        let forward = dijkstra.run(self.graph.edge_end(first), &checker, &forward_source);
        let backward = dijkstra.run(self.graph.edge_start(second), &checker, &backward_source);

        let mut t = TransitionGraph::new();
        t.add_vertex(first);
        t.add_vertex(second);
        for candidate in source.vertices() {
            if candidate != first
                && candidate != second
                && self.check_subgraph_vertex(candidate, first, second)
                && forward.reached(self.graph.edge_start(candidate))
                && backward.reached(self.graph.edge_end(candidate))
            {
                t.add_vertex(candidate);
            }
        }
        for e in source.edges() {
            // The connection being resolved must not shortcut its own
            // corridor.
            if (e.start, e.end) != (first, second)
                && t.contains_vertex(e.start)
                && t.contains_vertex(e.end)
            {
                t.add_edge(e.start, e.end);
            }
        }
        t.remove_disconnected(first, second);
        debug!(
            first = first.0,
            second = second.0,
            vertices = t.vertex_count(),
            "extracted candidate subgraph"
        );
        t
    }
}

/// True when the pruned subgraph is literally one chain from `source` to
/// `sink` with no choice left.
pub fn is_simple_path(t: &TransitionGraph, source: EdgeId, sink: EdgeId) -> bool {
    let mut visited = HashSet::new();
    let mut current = source;
    loop {
        if current == sink {
            return true;
        }
        if !visited.insert(current) {
            return false;
        }
        let outs: Vec<EdgeId> = t.outgoing(current).collect();
        if outs.len() != 1 {
            return false;
        }
        current = outs[0];
    }
}

fn collect_simple_path(t: &TransitionGraph, source: EdgeId, sink: EdgeId) -> Vec<EdgeId> {
    let mut path = vec![source];
    let mut current = source;
    while current != sink {
        // Caller has verified out-degree one along the chain.
        match t.outgoing(current).next() {
            Some(next) => {
                path.push(next);
                current = next;
            }
            None => return Vec::new(),
        }
    }
    path
}

/// Reads a single source-to-sink path out of a pruned transition graph,
/// greedily when the graph still branches.
pub struct SubgraphPathExtractor<'a> {
    score: &'a (dyn ScaffoldEdgeScoreFunction + Sync),
}

impl<'a> SubgraphPathExtractor<'a> {
    pub fn new(score: &'a (dyn ScaffoldEdgeScoreFunction + Sync)) -> Self {
        SubgraphPathExtractor { score }
    }

    /// Full path including both endpoints; empty when the subgraph is
    /// ambiguous or a dead end.
    pub fn extract_path(&self, t: &TransitionGraph, source: EdgeId, sink: EdgeId) -> Vec<EdgeId> {
        if !t.contains_vertex(source) || !t.contains_vertex(sink) {
            return Vec::new();
        }
        if is_simple_path(t, source, sink) {
            return collect_simple_path(t, source, sink);
        }
        self.greedy_walk(t, source, sink)
    }

    /// Locally best-scoring candidate; `None` on a dead end or a score tie,
    /// which the caller treats as "do not guess".
    fn next_max(
        &self,
        t: &TransitionGraph,
        current: EdgeId,
        forward: bool,
    ) -> Option<EdgeId> {
        let candidates: Vec<EdgeId> = if forward {
            t.outgoing(current).collect()
        } else {
            t.incoming(current).collect()
        };
        let mut best: Option<(EdgeId, f64)> = None;
        let mut tied = false;
        for c in candidates {
            let score = if forward {
                self.score.score(current, c)
            } else {
                self.score.score(c, current)
            };
            match best {
                None => best = Some((c, score)),
                Some((_, best_score)) => {
                    if score > best_score {
                        best = Some((c, score));
                        tied = false;
                    } else if (score - best_score).abs() < 1e-9 {
                        tied = true;
                    }
                }
            }
        }
        match best {
            Some((c, _)) if !tied => Some(c),
            _ => None,
        }
    }

    fn greedy_walk(&self, t: &TransitionGraph, source: EdgeId, sink: EdgeId) -> Vec<EdgeId> {
        let mut forward_part = vec![source];
        let mut backward_part = vec![sink];
        let mut visited: HashSet<EdgeId> = [source, sink].into_iter().collect();
        let cap = t.vertex_count() + 2;

        for _ in 0..cap {
            let f_tip = *forward_part.last().unwrap_or(&source);
            let b_tip = *backward_part.last().unwrap_or(&sink);
            if t.contains_edge(f_tip, b_tip) {
                backward_part.reverse();
                forward_part.extend(backward_part);
                return forward_part;
            }
            let mut progressed = false;
            if let Some(next) = self.next_max(t, f_tip, true) {
                if !visited.insert(next) {
                    return Vec::new();
                }
                forward_part.push(next);
                progressed = true;
            }
            let f_tip = *forward_part.last().unwrap_or(&source);
            if t.contains_edge(f_tip, b_tip) {
                backward_part.reverse();
                forward_part.extend(backward_part);
                return forward_part;
            }
            if let Some(prev) = self.next_max(t, b_tip, false) {
                if !visited.insert(prev) {
                    return Vec::new();
                }
                backward_part.push(prev);
                progressed = true;
            }
            if !progressed {
                return Vec::new();
            }
        }
        Vec::new()
    }
}

/// Resolved connections of one closing sweep.
pub struct InsertedVerticesData {
    pub closed_edges: Vec<ScaffoldEdge>,
    pub paths: Vec<Vec<EdgeId>>,
    pub inserted_vertices: usize,
}

/// One full round: the successor graph plus what was closed to produce it.
pub struct IterationResult {
    pub new_graph: ScaffoldGraph,
    pub inserted_vertices: usize,
    pub closed_edges: Vec<ScaffoldEdge>,
}

pub struct ScaffoldGraphGapCloser<'a> {
    extractor: CloudSubgraphExtractor<'a>,
    path_extractor: SubgraphPathExtractor<'a>,
    predicate_builders: Vec<Box<dyn GapCloserPredicateBuilder + Sync + 'a>>,
}

impl<'a> ScaffoldGraphGapCloser<'a> {
    pub fn new(
        graph: &'a AssemblyGraph,
        barcodes: &'a BarcodeIndex,
        params: SubgraphExtractorParams,
        score: &'a (dyn ScaffoldEdgeScoreFunction + Sync),
        predicate_builders: Vec<Box<dyn GapCloserPredicateBuilder + Sync + 'a>>,
    ) -> Self {
        ScaffoldGraphGapCloser {
            extractor: CloudSubgraphExtractor::new(graph, barcodes, params),
            path_extractor: SubgraphPathExtractor::new(score),
            predicate_builders,
        }
    }

    /// Predicates are rebuilt against `source_graph` for every connection,
    /// so graph-borrowing predicates always consult the current round's
    /// scaffold graph.
    fn prune(
        &self,
        t: &mut TransitionGraph,
        source_graph: &ScaffoldGraph,
        source: EdgeId,
        sink: EdgeId,
    ) {
        for builder in &self.predicate_builders {
            let predicate = builder.build(source_graph);
            let edges: Vec<(EdgeId, EdgeId)> = t
                .vertices()
                .flat_map(|v| t.outgoing(v).map(move |w| (v, w)))
                .collect();
            for (from, to) in edges {
                if !predicate.check(&ScaffoldEdge::new(from, to, 0, 0.0)) {
                    t.remove_edge(from, to);
                }
            }
            t.remove_disconnected(source, sink);
        }
    }

    /// A connection counts as closed only when the resolving path has at
    /// least one internal vertex; a bare source-sink link adds nothing.
    fn try_close(&self, source_graph: &ScaffoldGraph, edge: &ScaffoldEdge) -> Option<Vec<EdgeId>> {
        let mut t = self
            .extractor
            .extract_subgraph(source_graph, edge.start, edge.end);
        self.prune(&mut t, source_graph, edge.start, edge.end);
        let path = self.path_extractor.extract_path(&t, edge.start, edge.end);
        if path.len() > 2 {
            Some(path)
        } else {
            None
        }
    }

    /// Resolve all univocal connections against `source_graph`. Independent
    /// per edge: every worker reads shared immutable state and writes only
    /// its own candidate subgraph.
    pub fn get_inserted_connections(
        &self,
        univocal_edges: &[ScaffoldEdge],
        source_graph: &ScaffoldGraph,
    ) -> InsertedVerticesData {
        let closures: Vec<(ScaffoldEdge, Vec<EdgeId>)> = univocal_edges
            .par_iter()
            .filter_map(|e| self.try_close(source_graph, e).map(|p| (*e, p)))
            .collect();
        let inserted_vertices = closures.iter().map(|(_, p)| p.len() - 2).sum();
        let (closed_edges, paths) = closures.into_iter().unzip();
        InsertedVerticesData {
            closed_edges,
            paths,
            inserted_vertices,
        }
    }

    fn substitute(
        current: &ScaffoldGraph,
        data: &InsertedVerticesData,
    ) -> ScaffoldGraph {
        let mut new_graph = ScaffoldGraph::new();
        for v in current.vertices() {
            new_graph.add_vertex(v);
        }
        for edge in current.edges() {
            let closure = data
                .closed_edges
                .iter()
                .position(|c| (c.start, c.end) == (edge.start, edge.end));
            match closure {
                Some(i) => {
                    // The closed edge's gap estimate is spread evenly over
                    // the links that replace it.
                    let links = (data.paths[i].len() - 1) as i64;
                    let link_length = edge.length / links;
                    for pair in data.paths[i].windows(2) {
                        new_graph
                            .add_edge(ScaffoldEdge::new(pair[0], pair[1], link_length, edge.weight));
                    }
                }
                None => new_graph.add_edge(*edge),
            }
        }
        new_graph
    }

    pub fn launch_gap_closing_iteration(&self, current: &ScaffoldGraph) -> IterationResult {
        let univocal = current.univocal_edges();
        let data = self.get_inserted_connections(&univocal, current);
        let new_graph = Self::substitute(current, &data);
        IterationResult {
            new_graph,
            inserted_vertices: data.inserted_vertices,
            closed_edges: data.closed_edges,
        }
    }

    /// Rounds of close-and-substitute until a round closes nothing or the
    /// iteration cap is hit.
    pub fn close_gaps(&self, graph: &ScaffoldGraph, max_iterations: usize) -> ScaffoldGraph {
        let mut current = graph.clone();
        for iteration in 0..max_iterations {
            let result = self.launch_gap_closing_iteration(&current);
            info!(
                iteration,
                closed = result.closed_edges.len(),
                inserted = result.inserted_vertices,
                "gap closing round"
            );
            if result.closed_edges.is_empty() {
                break;
            }
            current = result.new_graph;
        }
        current
    }

    /// Iterate the fine-grained graph to convergence, then substitute its
    /// closures into the coarse graph it was seeded from.
    pub fn close_gaps_in_large_graph(
        &self,
        large: &ScaffoldGraph,
        small: &ScaffoldGraph,
        max_iterations: usize,
    ) -> ScaffoldGraph {
        let resolved = self.close_gaps(small, max_iterations);
        let univocal = large.univocal_edges();
        let data = self.get_inserted_connections(&univocal, &resolved);
        info!(
            closed = data.closed_edges.len(),
            inserted = data.inserted_vertices,
            "merged small-graph closures into large graph"
        );
        Self::substitute(large, &data)
    }
}
