//! Edge predicates and score functions the gap closer runs over candidate
//! scaffold connections. Predicates answer "could this connection be real";
//! score functions rank competing transitions during the greedy walk. All of
//! them borrow the evidence indices immutably and are safe to evaluate from
//! parallel workers.

use crate::assembly_graph::{AssemblyGraph, EdgeId};
use crate::dijkstra::{
    BarcodePutChecker, BoundedDijkstra, CompositePutChecker, ForwardNeighbours, PutChecker,
    UniqueEdgePutChecker,
};
use crate::extension_chooser::{
    EdgeWithDistance, ExtensionChooser, PairedWeightCounter, SimpleExtensionChooser,
};
use crate::path::{BidirectionalPath, GraphCoverageMap, PathContainer};
use crate::scaffold_graph::{ScaffoldEdge, ScaffoldGraph};
use crate::stats::{BarcodeId, BarcodeIndex, PairedInfoIndex};
use crate::unique_edges::UniqueEdgeStorage;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};
use tracing::debug;

/// Verdict on one inferred scaffold connection. `false` means the connection
/// contradicts the evidence and should be stripped from the working subgraph.
pub trait ScaffoldEdgePredicate {
    fn check(&self, edge: &ScaffoldEdge) -> bool;
}

fn shared_count(a: &[BarcodeId], b: &[BarcodeId]) -> usize {
    let right: BTreeSet<BarcodeId> = b.iter().copied().collect();
    a.iter().filter(|x| right.contains(x)).count()
}

/// Splits both endpoint edges in half and demands that shared barcodes
/// respect the inferred orientation: evidence crossing the gap should come
/// from the facing halves, not the far ones.
pub struct EdgeSplitPredicate<'a> {
    graph: &'a AssemblyGraph,
    barcodes: &'a BarcodeIndex,
    count_threshold: usize,
    strictness: f64,
}

impl<'a> EdgeSplitPredicate<'a> {
    pub fn new(
        graph: &'a AssemblyGraph,
        barcodes: &'a BarcodeIndex,
        count_threshold: usize,
        strictness: f64,
    ) -> Self {
        EdgeSplitPredicate {
            graph,
            barcodes,
            count_threshold,
            strictness,
        }
    }

    /// `first` and `second` are the two halves of one endpoint edge, `third`
    /// the barcode set of the other endpoint. Ordering holds when the half
    /// adjacent to the gap carries at least `strictness` times the shared
    /// evidence of the far half. No far-half evidence at all is a pass.
    fn ordering_for_three(&self, first: &[BarcodeId], second: &[BarcodeId], third: &[BarcodeId]) -> bool {
        let far = shared_count(first, third);
        let near = shared_count(second, third);
        far == 0 || near as f64 >= self.strictness * far as f64
    }

    /// All four halves at once: the two facing halves must share at least as
    /// many barcodes as the two outer halves.
    fn ordering_for_four(
        &self,
        first: &[BarcodeId],
        second: &[BarcodeId],
        third: &[BarcodeId],
        fourth: &[BarcodeId],
    ) -> bool {
        shared_count(second, third) >= shared_count(first, fourth)
    }

    fn halves(&self, e: EdgeId) -> (Vec<BarcodeId>, Vec<BarcodeId>) {
        let mid = self.graph.length(e) / 2;
        (
            self.barcodes.barcodes_in_prefix(e, mid, self.count_threshold),
            self.barcodes.barcodes_in_suffix(e, mid, self.count_threshold),
        )
    }
}

impl ScaffoldEdgePredicate for EdgeSplitPredicate<'_> {
    fn check(&self, edge: &ScaffoldEdge) -> bool {
        let (start_head, start_tail) = self.halves(edge.start);
        let (end_head, end_tail) = self.halves(edge.end);
        let start_all = self.barcodes.barcodes(edge.start, self.count_threshold);
        let end_all = self.barcodes.barcodes(edge.end, self.count_threshold);

        let ok = self.ordering_for_three(&start_head, &start_tail, &end_all)
            && self.ordering_for_three(&end_tail, &end_head, &start_all)
            && self.ordering_for_four(&start_head, &start_tail, &end_head, &end_tail);
        if !ok {
            debug!(start = edge.start.0, end = edge.end.0, "split ordering violated");
        }
        ok
    }
}

/// "Is `middle` genuinely between `first` and `third`": the barcodes shared by
/// the two flanks should mostly appear on the middle edge as well.
pub struct EdgeInTheMiddlePredicate<'a> {
    barcodes: &'a BarcodeIndex,
    count_threshold: usize,
    shared_fraction_threshold: f64,
}

impl<'a> EdgeInTheMiddlePredicate<'a> {
    pub fn new(
        barcodes: &'a BarcodeIndex,
        count_threshold: usize,
        shared_fraction_threshold: f64,
    ) -> Self {
        EdgeInTheMiddlePredicate {
            barcodes,
            count_threshold,
            shared_fraction_threshold,
        }
    }

    pub fn is_correct_ordering(&self, first: EdgeId, middle: EdgeId, third: EdgeId) -> bool {
        let flank_shared = self.barcodes.shared_barcodes(first, third, self.count_threshold);
        if flank_shared.is_empty() {
            return false;
        }
        let on_middle =
            self.barcodes
                .count_contained(middle, &flank_shared, self.count_threshold);
        on_middle as f64 / flank_shared.len() as f64 >= self.shared_fraction_threshold
    }
}

/// Rejects a connection that skips over another candidate: if some other
/// candidate of the start vertex tests as sitting between the endpoints, the
/// direct edge is a far edge and goes away.
pub struct NextFarEdgesPredicate<'a> {
    middle: EdgeInTheMiddlePredicate<'a>,
    candidates_getter: Box<dyn Fn(EdgeId) -> Vec<EdgeId> + 'a>,
}

impl<'a> NextFarEdgesPredicate<'a> {
    pub fn new(
        barcodes: &'a BarcodeIndex,
        count_threshold: usize,
        shared_fraction_threshold: f64,
        candidates_getter: Box<dyn Fn(EdgeId) -> Vec<EdgeId> + 'a>,
    ) -> Self {
        NextFarEdgesPredicate {
            middle: EdgeInTheMiddlePredicate::new(
                barcodes,
                count_threshold,
                shared_fraction_threshold,
            ),
            candidates_getter,
        }
    }
}

impl ScaffoldEdgePredicate for NextFarEdgesPredicate<'_> {
    fn check(&self, edge: &ScaffoldEdge) -> bool {
        let candidates = (self.candidates_getter)(edge.start);
        !candidates.iter().any(|&c| {
            c != edge.end && self.middle.is_correct_ordering(edge.start, c, edge.end)
        })
    }
}

/// Breadth-first sweep over the scaffold graph, bounded by accumulated gap
/// length, with one forbidden edge. Used to ask whether a connection's
/// endpoints are already joined by an alternative route.
pub struct SimpleSearcher<'a> {
    scaffold_graph: &'a ScaffoldGraph,
    distance_threshold: i64,
}

impl<'a> SimpleSearcher<'a> {
    pub fn new(scaffold_graph: &'a ScaffoldGraph, distance_threshold: i64) -> Self {
        SimpleSearcher {
            scaffold_graph,
            distance_threshold,
        }
    }

    pub fn reachable_vertices(&self, from: EdgeId, restricted: &ScaffoldEdge) -> Vec<EdgeId> {
        let mut visited: HashSet<EdgeId> = HashSet::new();
        let mut queue: VecDeque<(EdgeId, i64)> = VecDeque::new();
        let mut result = Vec::new();
        queue.push_back((from, 0));
        visited.insert(from);
        while let Some((v, dist)) = queue.pop_front() {
            result.push(v);
            for out in self.scaffold_graph.outgoing_edges(v) {
                if out.start == restricted.start && out.end == restricted.end {
                    continue;
                }
                let next_dist = dist + out.length.max(0);
                if next_dist > self.distance_threshold {
                    continue;
                }
                if visited.insert(out.end) {
                    queue.push_back((out.end, next_dist));
                }
            }
        }
        result
    }
}

/// Removes transitive connections: an edge whose endpoints are still joined
/// by a multi-step route once the edge itself is forbidden carries no
/// information of its own.
pub struct TransitiveEdgesPredicate<'a> {
    scaffold_graph: &'a ScaffoldGraph,
    distance_threshold: i64,
}

impl<'a> TransitiveEdgesPredicate<'a> {
    pub fn new(scaffold_graph: &'a ScaffoldGraph, distance_threshold: i64) -> Self {
        TransitiveEdgesPredicate {
            scaffold_graph,
            distance_threshold,
        }
    }
}

impl ScaffoldEdgePredicate for TransitiveEdgesPredicate<'_> {
    fn check(&self, edge: &ScaffoldEdge) -> bool {
        let searcher = SimpleSearcher::new(self.scaffold_graph, self.distance_threshold);
        let reachable = searcher.reachable_vertices(edge.start, edge);
        !reachable.contains(&edge.end)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MiddleDijkstraParams {
    pub count_threshold: usize,
    pub share_threshold: f64,
    pub length_bound: usize,
    pub max_vertices: usize,
    pub edge_length_threshold: usize,
}

/// Heavyweight check of last resort: run a bounded search from the tail of
/// the start edge, admitting only barcode-compatible non-unique structure,
/// and require that it reaches the head of the end edge.
pub struct MiddleDijkstraPredicate<'a> {
    graph: &'a AssemblyGraph,
    unique: &'a UniqueEdgeStorage,
    barcodes: &'a BarcodeIndex,
    params: MiddleDijkstraParams,
}

impl<'a> MiddleDijkstraPredicate<'a> {
    pub fn new(
        graph: &'a AssemblyGraph,
        unique: &'a UniqueEdgeStorage,
        barcodes: &'a BarcodeIndex,
        params: MiddleDijkstraParams,
    ) -> Self {
        MiddleDijkstraPredicate {
            graph,
            unique,
            barcodes,
            params,
        }
    }
}

impl ScaffoldEdgePredicate for MiddleDijkstraPredicate<'_> {
    fn check(&self, edge: &ScaffoldEdge) -> bool {
        let targets =
            self.barcodes
                .shared_barcodes(edge.start, edge.end, self.params.count_threshold);
        let checkers: Vec<Box<dyn PutChecker>> = vec![
            Box::new(UniqueEdgePutChecker::new(self.graph, self.unique)),
            Box::new(BarcodePutChecker::new(
                self.graph,
                self.barcodes,
                targets,
                self.params.share_threshold,
                self.params.count_threshold,
                self.params.edge_length_threshold,
            )),
        ];
        let composite = CompositePutChecker::new(checkers);
        let dijkstra =
            BoundedDijkstra::new(self.graph, self.params.length_bound, self.params.max_vertices);
        let forward = ForwardNeighbours::new(self.graph);
        let result = dijkstra.run(self.graph.edge_end(edge.start), &composite, &forward);
        result.reached(self.graph.edge_start(edge.end))
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PairedEndParams {
    pub lib_span: i64,
    pub distance_error: i64,
    pub significance_threshold: f64,
    pub priority_coefficient: f64,
    pub min_connection_weight: f64,
}

/// Validates a connection with paired-read evidence alone: seed a path with
/// the start edge, let the weighted chooser pick among every paired-connected
/// candidate, and demand that it settles on the end edge. A tie or a losing
/// end edge both fail the connection.
pub struct PairedEndPredicate<'a> {
    graph: &'a AssemblyGraph,
    index: &'a PairedInfoIndex,
    params: PairedEndParams,
}

impl<'a> PairedEndPredicate<'a> {
    pub fn new(
        graph: &'a AssemblyGraph,
        index: &'a PairedInfoIndex,
        params: PairedEndParams,
    ) -> Self {
        PairedEndPredicate {
            graph,
            index,
            params,
        }
    }

    /// Support-weighted mean evidence distance minus the start edge length.
    fn estimated_gap(&self, from: EdgeId, to: EdgeId) -> i64 {
        let mut sum = 0.0;
        let mut mass = 0.0;
        for (d, w) in self.index.points(from, to) {
            sum += *d as f64 * w;
            mass += w;
        }
        if mass <= 0.0 {
            return 0;
        }
        (sum / mass).round() as i64 - self.graph.length(from) as i64
    }
}

impl ScaffoldEdgePredicate for PairedEndPredicate<'_> {
    fn check(&self, edge: &ScaffoldEdge) -> bool {
        let counter = PairedWeightCounter::new(
            self.graph,
            self.index,
            self.params.lib_span,
            self.params.distance_error,
            self.params.significance_threshold,
        );
        let chooser =
            SimpleExtensionChooser::new(self.graph, &counter, self.params.priority_coefficient);
        let path = BidirectionalPath::from_edges(&[edge.start]);
        let candidates: Vec<EdgeWithDistance> = self
            .index
            .connected_with(edge.start, self.params.min_connection_weight)
            .keys()
            .map(|&e| EdgeWithDistance::new(e, self.estimated_gap(edge.start, e)))
            .collect();
        let result = chooser.filter(&path, &candidates);
        result.len() == 1 && result[0].edge == edge.end
    }
}

/// Per-connection predicate construction. Graph-borrowing predicates must
/// see the scaffold graph of the current closing round, not whichever graph
/// existed when the closer was configured, so the closer holds builders and
/// asks for fresh predicate instances each time it prunes.
pub trait GapCloserPredicateBuilder {
    fn build<'g>(&'g self, source_graph: &'g ScaffoldGraph)
        -> Box<dyn ScaffoldEdgePredicate + 'g>;
}

pub struct SplitPredicateBuilder<'a> {
    graph: &'a AssemblyGraph,
    barcodes: &'a BarcodeIndex,
    count_threshold: usize,
    strictness: f64,
}

impl<'a> SplitPredicateBuilder<'a> {
    pub fn new(
        graph: &'a AssemblyGraph,
        barcodes: &'a BarcodeIndex,
        count_threshold: usize,
        strictness: f64,
    ) -> Self {
        SplitPredicateBuilder {
            graph,
            barcodes,
            count_threshold,
            strictness,
        }
    }
}

impl GapCloserPredicateBuilder for SplitPredicateBuilder<'_> {
    fn build<'g>(
        &'g self,
        _source_graph: &'g ScaffoldGraph,
    ) -> Box<dyn ScaffoldEdgePredicate + 'g> {
        Box::new(EdgeSplitPredicate::new(
            self.graph,
            self.barcodes,
            self.count_threshold,
            self.strictness,
        ))
    }
}

pub struct TransitivePredicateBuilder {
    distance_threshold: i64,
}

impl TransitivePredicateBuilder {
    pub fn new(distance_threshold: i64) -> Self {
        TransitivePredicateBuilder { distance_threshold }
    }
}

impl GapCloserPredicateBuilder for TransitivePredicateBuilder {
    fn build<'g>(
        &'g self,
        source_graph: &'g ScaffoldGraph,
    ) -> Box<dyn ScaffoldEdgePredicate + 'g> {
        Box::new(TransitiveEdgesPredicate::new(
            source_graph,
            self.distance_threshold,
        ))
    }
}

pub struct PairedEndPredicateBuilder<'a> {
    graph: &'a AssemblyGraph,
    index: &'a PairedInfoIndex,
    params: PairedEndParams,
}

impl<'a> PairedEndPredicateBuilder<'a> {
    pub fn new(
        graph: &'a AssemblyGraph,
        index: &'a PairedInfoIndex,
        params: PairedEndParams,
    ) -> Self {
        PairedEndPredicateBuilder {
            graph,
            index,
            params,
        }
    }
}

impl GapCloserPredicateBuilder for PairedEndPredicateBuilder<'_> {
    fn build<'g>(
        &'g self,
        _source_graph: &'g ScaffoldGraph,
    ) -> Box<dyn ScaffoldEdgePredicate + 'g> {
        Box::new(PairedEndPredicate::new(self.graph, self.index, self.params))
    }
}

/// Ranks a candidate transition between two base-graph edges.
pub trait ScaffoldEdgeScoreFunction {
    fn score(&self, from: EdgeId, to: EdgeId) -> f64;
}

/// Raw count of shared barcodes.
pub struct TrivialBarcodeScoreFunction<'a> {
    barcodes: &'a BarcodeIndex,
    count_threshold: usize,
}

impl<'a> TrivialBarcodeScoreFunction<'a> {
    pub fn new(barcodes: &'a BarcodeIndex, count_threshold: usize) -> Self {
        TrivialBarcodeScoreFunction {
            barcodes,
            count_threshold,
        }
    }
}

impl ScaffoldEdgeScoreFunction for TrivialBarcodeScoreFunction<'_> {
    fn score(&self, from: EdgeId, to: EdgeId) -> f64 {
        self.barcodes.shared_barcodes(from, to, self.count_threshold).len() as f64
    }
}

/// Shared-barcode count normalized by both endpoint set sizes, scaled by the
/// total barcode universe so deeply sampled datasets do not dominate.
pub struct NormalizedBarcodeScoreFunction<'a> {
    barcodes: &'a BarcodeIndex,
    count_threshold: usize,
}

impl<'a> NormalizedBarcodeScoreFunction<'a> {
    pub fn new(barcodes: &'a BarcodeIndex, count_threshold: usize) -> Self {
        NormalizedBarcodeScoreFunction {
            barcodes,
            count_threshold,
        }
    }
}

impl ScaffoldEdgeScoreFunction for NormalizedBarcodeScoreFunction<'_> {
    fn score(&self, from: EdgeId, to: EdgeId) -> f64 {
        let left = self.barcodes.barcode_count(from, self.count_threshold);
        let right = self.barcodes.barcode_count(to, self.count_threshold);
        if left == 0 || right == 0 {
            return 0.0;
        }
        let shared = self.barcodes.shared_barcodes(from, to, self.count_threshold).len();
        shared as f64 * self.barcodes.total_barcodes() as f64 / (left as f64 * right as f64)
    }
}

/// Counts previously assembled paths that walk `from` and later `to`; the
/// strongest evidence available when long paths exist.
pub struct PathClusterScoreFunction<'a> {
    container: &'a PathContainer,
    coverage: &'a GraphCoverageMap,
}

impl<'a> PathClusterScoreFunction<'a> {
    pub fn new(container: &'a PathContainer, coverage: &'a GraphCoverageMap) -> Self {
        PathClusterScoreFunction { container, coverage }
    }
}

impl ScaffoldEdgeScoreFunction for PathClusterScoreFunction<'_> {
    fn score(&self, from: EdgeId, to: EdgeId) -> f64 {
        let mut supporting = 0usize;
        for key in self.coverage.covering_paths(from) {
            let path = self.container.path(*key);
            let from_positions = path.find_all(from);
            let to_positions = path.find_all(to);
            if from_positions
                .iter()
                .any(|&i| to_positions.iter().any(|&j| j > i))
            {
                supporting += 1;
            }
        }
        supporting as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly_graph::VertexId;
    use crate::path::PathPair;

    fn two_edges(len: usize) -> (AssemblyGraph, EdgeId, EdgeId) {
        let mut g = AssemblyGraph::new();
        let a = g.add_vertex();
        let b = g.add_vertex();
        let c = g.add_vertex();
        let d = g.add_vertex();
        let e0 = g.add_edge(a, b, len, 10.0);
        let e1 = g.add_edge(c, d, len, 10.0);
        (g, e0, e1)
    }

    #[test]
    fn split_predicate_accepts_facing_halves_rejects_outer() {
        let (g, e0, e1) = two_edges(1000);
        // Shared barcodes sit in the tail of e0 and head of e1.
        let mut good = BarcodeIndex::new();
        for b in 0..6 {
            good.add_read(e0, BarcodeId(b), 900);
            good.add_read(e1, BarcodeId(b), 50);
        }
        let predicate = EdgeSplitPredicate::new(&g, &good, 1, 1.0);
        assert!(predicate.check(&ScaffoldEdge::new(e0, e1, 0, 1.0)));

        // Shared barcodes in the head of e0 and tail of e1: wrong ordering.
        let mut bad = BarcodeIndex::new();
        for b in 0..6 {
            bad.add_read(e0, BarcodeId(b), 50);
            bad.add_read(e1, BarcodeId(b), 900);
        }
        let predicate = EdgeSplitPredicate::new(&g, &bad, 1, 1.0);
        assert!(!predicate.check(&ScaffoldEdge::new(e0, e1, 0, 1.0)));
    }

    #[test]
    fn middle_predicate_needs_flank_barcodes_on_middle() {
        let mut g = AssemblyGraph::new();
        let vs: Vec<VertexId> = (0..4).map(|_| g.add_vertex()).collect();
        let first = g.add_edge(vs[0], vs[1], 1000, 10.0);
        let middle = g.add_edge(vs[1], vs[2], 1000, 10.0);
        let third = g.add_edge(vs[2], vs[3], 1000, 10.0);

        let mut index = BarcodeIndex::new();
        for b in 0..4 {
            index.add_read(first, BarcodeId(b), 500);
            index.add_read(third, BarcodeId(b), 500);
        }
        for b in 0..3 {
            index.add_read(middle, BarcodeId(b), 500);
        }
        let predicate = EdgeInTheMiddlePredicate::new(&index, 1, 0.7);
        assert!(predicate.is_correct_ordering(first, middle, third));
        let strict = EdgeInTheMiddlePredicate::new(&index, 1, 0.9);
        assert!(!strict.is_correct_ordering(first, middle, third));
    }

    #[test]
    fn transitive_edge_is_removed_when_detour_exists() {
        let mut scaffold = ScaffoldGraph::new();
        scaffold.add_edge(ScaffoldEdge::new(EdgeId(0), EdgeId(2), 100, 1.0));
        scaffold.add_edge(ScaffoldEdge::new(EdgeId(2), EdgeId(4), 100, 1.0));
        scaffold.add_edge(ScaffoldEdge::new(EdgeId(0), EdgeId(4), 250, 1.0));

        let predicate = TransitiveEdgesPredicate::new(&scaffold, 1000);
        assert!(!predicate.check(&ScaffoldEdge::new(EdgeId(0), EdgeId(4), 250, 1.0)));
        // The two-step edges have no alternative route.
        assert!(predicate.check(&ScaffoldEdge::new(EdgeId(0), EdgeId(2), 100, 1.0)));
        assert!(predicate.check(&ScaffoldEdge::new(EdgeId(2), EdgeId(4), 100, 1.0)));
    }

    #[test]
    fn far_edge_predicate_spots_skipped_candidate() {
        let mut g = AssemblyGraph::new();
        let vs: Vec<VertexId> = (0..4).map(|_| g.add_vertex()).collect();
        let first = g.add_edge(vs[0], vs[1], 1000, 10.0);
        let middle = g.add_edge(vs[1], vs[2], 1000, 10.0);
        let third = g.add_edge(vs[2], vs[3], 1000, 10.0);

        let mut index = BarcodeIndex::new();
        for b in 0..4 {
            index.add_read(first, BarcodeId(b), 500);
            index.add_read(middle, BarcodeId(b), 500);
        }
        // The far flank only sees half the fragment cloud.
        for b in 0..2 {
            index.add_read(third, BarcodeId(b), 500);
        }
        let candidates: Vec<EdgeId> = vec![middle, third];
        let predicate = NextFarEdgesPredicate::new(
            &index,
            1,
            0.6,
            Box::new(move |_| candidates.clone()),
        );
        // first -> third skips middle, which the evidence places in between.
        assert!(!predicate.check(&ScaffoldEdge::new(first, third, 0, 1.0)));
        assert!(predicate.check(&ScaffoldEdge::new(first, middle, 0, 1.0)));
    }

    #[test]
    fn middle_dijkstra_predicate_follows_barcode_corridor() {
        // start edge -> two short filler edges -> end edge, all sharing
        // barcodes; an unrelated long branch is not admitted.
        let mut g = AssemblyGraph::new();
        let vs: Vec<VertexId> = (0..5).map(|_| g.add_vertex()).collect();
        let start = g.add_edge(vs[0], vs[1], 2000, 10.0);
        let _mid1 = g.add_edge(vs[1], vs[2], 300, 10.0);
        let _mid2 = g.add_edge(vs[2], vs[3], 300, 10.0);
        let end = g.add_edge(vs[3], vs[4], 2000, 10.0);

        let mut index = BarcodeIndex::new();
        for b in 0..8 {
            index.add_read(start, BarcodeId(b), 1500);
            index.add_read(end, BarcodeId(b), 100);
        }
        let unique = UniqueEdgeStorage::new(10_000);
        let params = MiddleDijkstraParams {
            count_threshold: 1,
            share_threshold: 0.5,
            length_bound: 5000,
            max_vertices: 100,
            edge_length_threshold: 500,
        };
        let predicate = MiddleDijkstraPredicate::new(&g, &unique, &index, params);
        assert!(predicate.check(&ScaffoldEdge::new(start, end, 600, 8.0)));
        // Reversed direction has no corridor.
        assert!(!predicate.check(&ScaffoldEdge::new(end, start, 600, 8.0)));
    }

    #[test]
    fn paired_end_predicate_demands_unique_winner() {
        let mut g = AssemblyGraph::new();
        let vs: Vec<VertexId> = (0..4).map(|_| g.add_vertex()).collect();
        let start = g.add_edge(vs[0], vs[1], 2000, 10.0);
        // The junction branches, so the seed position keeps its evidence.
        let side = g.add_vertex();
        g.add_edge(side, vs[1], 100, 1.0);
        let a = g.add_edge(vs[1], vs[2], 1000, 10.0);
        let b = g.add_edge(vs[1], vs[3], 1000, 10.0);

        let mut index = PairedInfoIndex::new();
        index.add(start, a, 2100, 10.0);
        index.add(start, b, 2100, 1.0);
        let params = PairedEndParams {
            lib_span: 4000,
            distance_error: 15,
            significance_threshold: 1.0,
            priority_coefficient: 2.0,
            min_connection_weight: 0.5,
        };
        let predicate = PairedEndPredicate::new(&g, &index, params);

        assert!(predicate.check(&ScaffoldEdge::new(start, a, 100, 10.0)));
        // The weaker candidate loses the weighted selection.
        assert!(!predicate.check(&ScaffoldEdge::new(start, b, 100, 1.0)));
        // No paired evidence at all: nothing to validate with.
        assert!(!predicate.check(&ScaffoldEdge::new(a, b, 100, 1.0)));
    }

    #[test]
    fn path_cluster_score_counts_ordered_co_occurrence() {
        let mut container = PathContainer::new();
        container.add(PathPair::from_edges(&[EdgeId(0), EdgeId(2), EdgeId(4)]));
        container.add(PathPair::from_edges(&[EdgeId(0), EdgeId(4)]));
        container.add(PathPair::from_edges(&[EdgeId(4), EdgeId(0)]));
        let coverage = GraphCoverageMap::build(&container);
        let score = PathClusterScoreFunction::new(&container, &coverage);

        assert!((score.score(EdgeId(0), EdgeId(4)) - 2.0).abs() < 1e-9);
        assert!((score.score(EdgeId(0), EdgeId(2)) - 1.0).abs() < 1e-9);
        assert!((score.score(EdgeId(2), EdgeId(0)) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn normalized_score_penalizes_large_sets() {
        let mut index = BarcodeIndex::new();
        for b in 0..10 {
            index.add_read(EdgeId(0), BarcodeId(b), 10);
        }
        for b in 0..10 {
            index.add_read(EdgeId(2), BarcodeId(b), 10);
        }
        for b in 8..10 {
            index.add_read(EdgeId(4), BarcodeId(b), 10);
        }
        let normalized = NormalizedBarcodeScoreFunction::new(&index, 1);
        let trivial = TrivialBarcodeScoreFunction::new(&index, 1);
        // Full overlap of a small set outranks the same shared count would in
        // a large set.
        assert!(normalized.score(EdgeId(0), EdgeId(4)) > normalized.score(EdgeId(0), EdgeId(2)) / 2.0);
        assert!((trivial.score(EdgeId(0), EdgeId(2)) - 10.0).abs() < 1e-9);
        assert!((trivial.score(EdgeId(0), EdgeId(4)) - 2.0).abs() < 1e-9);
    }
}
