//! Bounded shortest-path traversal engine. The search itself is a plain
//! Dijkstra sweep; what makes it reusable is the two strategy seams:
//! a [`PutChecker`] deciding whether a reached vertex is worth expanding, and
//! a [`NeighbourSource`] deciding what counts as an outgoing edge (which may
//! diverge from the literal graph, e.g. jumping across a dead end using
//! paired-read connections).

use crate::assembly_graph::{AssemblyGraph, EdgeId, VertexId};
use crate::stats::{BarcodeId, BarcodeIndex, PairedConnectionCondition};
use crate::unique_edges::UniqueEdgeStorage;
use bitvec::prelude::*;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use tracing::debug;

/// Decides whether the far endpoint of `edge`, reached at `distance`, should
/// be enqueued for further expansion. Returning `false` makes the search stop
/// at this edge without discarding anything already found.
pub trait PutChecker {
    fn check(&self, vertex: VertexId, edge: EdgeId, distance: usize) -> bool;
}

/// Supplies the ordered set of "next edges" from a vertex, each paired with
/// the vertex it leads to.
pub trait NeighbourSource {
    fn neighbours(&self, vertex: VertexId) -> Vec<(EdgeId, VertexId)>;
}

/// Outcome of one bounded search. An empty result is a valid outcome, not a
/// failure.
#[derive(Default)]
pub struct SearchResult {
    distances: HashMap<VertexId, usize>,
    order: Vec<(VertexId, usize)>,
    reached_edges: HashSet<EdgeId>,
}

impl SearchResult {
    pub fn distance(&self, v: VertexId) -> Option<usize> {
        self.distances.get(&v).copied()
    }

    pub fn reached(&self, v: VertexId) -> bool {
        self.distances.contains_key(&v)
    }

    /// Vertices in the order they were settled; distances are non-decreasing.
    pub fn processed_in_order(&self) -> &[(VertexId, usize)] {
        &self.order
    }

    pub fn reached_edges(&self) -> &HashSet<EdgeId> {
        &self.reached_edges
    }

    pub fn vertex_count(&self) -> usize {
        self.order.len()
    }
}

/// Dijkstra search bounded by accumulated path length and by the number of
/// settled vertices. Both bounds are hard loop exits.
pub struct BoundedDijkstra<'a> {
    graph: &'a AssemblyGraph,
    length_bound: usize,
    max_vertices: usize,
}

impl<'a> BoundedDijkstra<'a> {
    pub fn new(graph: &'a AssemblyGraph, length_bound: usize, max_vertices: usize) -> Self {
        BoundedDijkstra {
            graph,
            length_bound,
            max_vertices,
        }
    }

    pub fn run(
        &self,
        start: VertexId,
        put_checker: &dyn PutChecker,
        neighbours: &dyn NeighbourSource,
    ) -> SearchResult {
        let mut result = SearchResult::default();
        let mut settled = bitvec![0; self.graph.vertex_capacity()];
        let mut heap: BinaryHeap<Reverse<(usize, usize)>> = BinaryHeap::new();

        result.distances.insert(start, 0);
        heap.push(Reverse((0, start.0)));

        while let Some(Reverse((dist, slot))) = heap.pop() {
            if settled[slot] {
                continue;
            }
            // Pop order is monotonic, so the first over-bound entry ends the
            // whole search.
            if dist > self.length_bound {
                break;
            }
            settled.set(slot, true);
            let v = VertexId(slot);
            result.order.push((v, dist));
            if result.order.len() >= self.max_vertices {
                debug!(max_vertices = self.max_vertices, "vertex budget exhausted");
                break;
            }

            for (e, w) in neighbours.neighbours(v) {
                let next_dist = dist + self.graph.length(e);
                if next_dist > self.length_bound {
                    continue;
                }
                if !put_checker.check(w, e, next_dist) {
                    continue;
                }
                result.reached_edges.insert(e);
                let improved = result
                    .distances
                    .get(&w)
                    .map_or(true, |&old| next_dist < old);
                if improved && !settled[w.0] {
                    result.distances.insert(w, next_dist);
                    heap.push(Reverse((next_dist, w.0)));
                }
            }
        }
        result
    }
}

/// Admits everything; plain bounded Dijkstra.
pub struct AdmitAll;

impl PutChecker for AdmitAll {
    fn check(&self, _vertex: VertexId, _edge: EdgeId, _distance: usize) -> bool {
        true
    }
}

/// Stop-at-first-long-unique-edge policy: short edges always pass, long
/// non-unique edges pass, long unique edges end the expansion (the repeat
/// boundary has been reached).
pub struct UniqueEdgePutChecker<'a> {
    graph: &'a AssemblyGraph,
    unique: &'a UniqueEdgeStorage,
}

impl<'a> UniqueEdgePutChecker<'a> {
    pub fn new(graph: &'a AssemblyGraph, unique: &'a UniqueEdgeStorage) -> Self {
        UniqueEdgePutChecker { graph, unique }
    }
}

impl PutChecker for UniqueEdgePutChecker<'_> {
    fn check(&self, _vertex: VertexId, edge: EdgeId, _distance: usize) -> bool {
        if self.graph.length(edge) < self.unique.min_length() {
            return true;
        }
        !self.unique.is_unique(edge)
    }
}

/// Barcode-compatibility policy: short edges bypass the check; long edges
/// must carry a sufficient share of the target barcode set.
pub struct BarcodePutChecker<'a> {
    graph: &'a AssemblyGraph,
    index: &'a BarcodeIndex,
    target_barcodes: Vec<BarcodeId>,
    share_threshold: f64,
    count_threshold: usize,
    edge_length_threshold: usize,
}

impl<'a> BarcodePutChecker<'a> {
    pub fn new(
        graph: &'a AssemblyGraph,
        index: &'a BarcodeIndex,
        target_barcodes: Vec<BarcodeId>,
        share_threshold: f64,
        count_threshold: usize,
        edge_length_threshold: usize,
    ) -> Self {
        BarcodePutChecker {
            graph,
            index,
            target_barcodes,
            share_threshold,
            count_threshold,
            edge_length_threshold,
        }
    }
}

impl PutChecker for BarcodePutChecker<'_> {
    fn check(&self, _vertex: VertexId, edge: EdgeId, _distance: usize) -> bool {
        if self.graph.length(edge) <= self.edge_length_threshold {
            return true;
        }
        if self.target_barcodes.is_empty() {
            return false;
        }
        let contained =
            self.index
                .count_contained(edge, &self.target_barcodes, self.count_threshold);
        let share = contained as f64 / self.target_barcodes.len() as f64;
        debug!(edge = edge.0, share, "barcode share for long edge");
        share >= self.share_threshold
    }
}

/// Logical AND over an ordered list of put-checkers; rejects on the first
/// failing policy.
pub struct CompositePutChecker<'a> {
    checkers: Vec<Box<dyn PutChecker + 'a>>,
}

impl<'a> CompositePutChecker<'a> {
    pub fn new(checkers: Vec<Box<dyn PutChecker + 'a>>) -> Self {
        CompositePutChecker { checkers }
    }
}

impl PutChecker for CompositePutChecker<'_> {
    fn check(&self, vertex: VertexId, edge: EdgeId, distance: usize) -> bool {
        self.checkers.iter().all(|c| c.check(vertex, edge, distance))
    }
}

/// Literal outgoing edges.
pub struct ForwardNeighbours<'a> {
    graph: &'a AssemblyGraph,
}

impl<'a> ForwardNeighbours<'a> {
    pub fn new(graph: &'a AssemblyGraph) -> Self {
        ForwardNeighbours { graph }
    }
}

impl NeighbourSource for ForwardNeighbours<'_> {
    fn neighbours(&self, vertex: VertexId) -> Vec<(EdgeId, VertexId)> {
        self.graph
            .outgoing_edges(vertex)
            .iter()
            .map(|&e| (e, self.graph.edge_end(e)))
            .collect()
    }
}

/// Literal incoming edges, for searches run against edge direction.
pub struct BackwardNeighbours<'a> {
    graph: &'a AssemblyGraph,
}

impl<'a> BackwardNeighbours<'a> {
    pub fn new(graph: &'a AssemblyGraph) -> Self {
        BackwardNeighbours { graph }
    }
}

impl NeighbourSource for BackwardNeighbours<'_> {
    fn neighbours(&self, vertex: VertexId) -> Vec<(EdgeId, VertexId)> {
        self.graph
            .incoming_edges(vertex)
            .iter()
            .map(|&e| (e, self.graph.edge_start(e)))
            .collect()
    }
}

/// Forward edges, except at a tip (dead end with exactly one incoming edge),
/// where the literal empty neighbour set is replaced by the edges that
/// paired-read evidence connects to the tip edge. This lets the search jump
/// across coverage gaps.
pub struct PairedConnectionNeighbours<'a> {
    graph: &'a AssemblyGraph,
    condition: PairedConnectionCondition<'a>,
}

impl<'a> PairedConnectionNeighbours<'a> {
    pub fn new(graph: &'a AssemblyGraph, condition: PairedConnectionCondition<'a>) -> Self {
        PairedConnectionNeighbours { graph, condition }
    }

    fn is_tip_end(&self, vertex: VertexId) -> bool {
        self.graph.out_degree(vertex) == 0 && self.graph.in_degree(vertex) == 1
    }
}

impl NeighbourSource for PairedConnectionNeighbours<'_> {
    fn neighbours(&self, vertex: VertexId) -> Vec<(EdgeId, VertexId)> {
        if self.is_tip_end(vertex) {
            let tip = self.graph.incoming_edges(vertex)[0];
            self.condition
                .connected_with(tip)
                .keys()
                .map(|&e| (e, self.graph.edge_end(e)))
                .collect()
        } else {
            self.graph
                .outgoing_edges(vertex)
                .iter()
                .map(|&e| (e, self.graph.edge_end(e)))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::PairedInfoIndex;

    fn chain(n: usize, edge_len: usize) -> (AssemblyGraph, Vec<VertexId>, Vec<EdgeId>) {
        let mut g = AssemblyGraph::new();
        let vs: Vec<VertexId> = (0..n).map(|_| g.add_vertex()).collect();
        let es: Vec<EdgeId> = (0..n - 1)
            .map(|i| g.add_edge(vs[i], vs[i + 1], edge_len, 10.0))
            .collect();
        (g, vs, es)
    }

    #[test]
    fn linear_chain_respects_bound_and_order() {
        let (g, vs, _) = chain(6, 100);
        let dijkstra = BoundedDijkstra::new(&g, 250, usize::MAX);
        let forward = ForwardNeighbours::new(&g);
        let result = dijkstra.run(vs[0], &AdmitAll, &forward);

        // 0, 100, 200 are within the bound; 300 is not.
        assert!(result.reached(vs[0]));
        assert!(result.reached(vs[1]));
        assert!(result.reached(vs[2]));
        assert!(!result.reached(vs[3]));
        assert_eq!(result.distance(vs[2]), Some(200));

        let order = result.processed_in_order();
        for pair in order.windows(2) {
            assert!(pair[0].1 <= pair[1].1);
        }
    }

    #[test]
    fn max_vertices_is_a_hard_exit() {
        let (g, vs, _) = chain(10, 1);
        let dijkstra = BoundedDijkstra::new(&g, usize::MAX, 3);
        let forward = ForwardNeighbours::new(&g);
        let result = dijkstra.run(vs[0], &AdmitAll, &forward);
        assert_eq!(result.vertex_count(), 3);
    }

    #[test]
    fn unique_checker_stops_at_long_unique_edge() {
        let (g, vs, es) = chain(5, 1000);
        let mut unique = UniqueEdgeStorage::new(500);
        unique.insert(es[1]);
        let checker = UniqueEdgePutChecker::new(&g, &unique);
        let dijkstra = BoundedDijkstra::new(&g, usize::MAX, usize::MAX);
        let forward = ForwardNeighbours::new(&g);
        let result = dijkstra.run(vs[0], &checker, &forward);

        // es[1] is long and unique: its far end is never expanded.
        assert!(result.reached(vs[1]));
        assert!(!result.reached(vs[2]));
        assert!(result.reached_edges().contains(&es[0]));
        assert!(!result.reached_edges().contains(&es[1]));
    }

    #[test]
    fn long_non_unique_edge_passes() {
        let (g, vs, _) = chain(4, 1000);
        let unique = UniqueEdgeStorage::new(500);
        let checker = UniqueEdgePutChecker::new(&g, &unique);
        let dijkstra = BoundedDijkstra::new(&g, usize::MAX, usize::MAX);
        let forward = ForwardNeighbours::new(&g);
        let result = dijkstra.run(vs[0], &checker, &forward);
        assert!(result.reached(vs[3]));
    }

    #[test]
    fn paired_connection_jumps_across_tip() {
        // a -e0-> b (dead end), with paired evidence e0 -> e1 where
        // e1: c -> d lives in a disconnected component.
        let mut g = AssemblyGraph::new();
        let a = g.add_vertex();
        let b = g.add_vertex();
        let c = g.add_vertex();
        let d = g.add_vertex();
        let e0 = g.add_edge(a, b, 100, 10.0);
        let e1 = g.add_edge(c, d, 100, 10.0);

        let mut paired = PairedInfoIndex::new();
        paired.add(e0, e1, 150, 5.0);
        let condition = PairedConnectionCondition::new(&paired, 1.0);
        let source = PairedConnectionNeighbours::new(&g, condition);
        let dijkstra = BoundedDijkstra::new(&g, usize::MAX, usize::MAX);
        let result = dijkstra.run(a, &AdmitAll, &source);

        assert!(result.reached(b));
        assert!(result.reached(d));
        assert!(result.reached_edges().contains(&e1));
    }

    #[test]
    fn composite_checker_short_circuits_on_rejection() {
        let (g, vs, es) = chain(4, 1000);
        let mut unique = UniqueEdgeStorage::new(500);
        unique.insert(es[0]);
        let barcodes = BarcodeIndex::new();
        let composite = CompositePutChecker::new(vec![
            Box::new(UniqueEdgePutChecker::new(&g, &unique)),
            Box::new(BarcodePutChecker::new(&g, &barcodes, vec![], 0.5, 1, 2000)),
        ]);
        let dijkstra = BoundedDijkstra::new(&g, usize::MAX, usize::MAX);
        let forward = ForwardNeighbours::new(&g);
        let result = dijkstra.run(vs[0], &composite, &forward);
        // First edge is long and unique: its far end is never admitted.
        assert!(!result.reached(vs[1]));
        assert!(!result.reached(vs[2]));
        assert_eq!(result.vertex_count(), 1);
    }
}
