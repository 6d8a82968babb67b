//! Path-extension decision functions. Each chooser filters a candidate set of
//! next edges for a path under construction; an empty result means "do not
//! extend here", and more than one surviving candidate means the extension is
//! ambiguous and the caller must not guess.

use crate::assembly_graph::{AssemblyGraph, EdgeId};
use crate::path::{BidirectionalPath, GraphCoverageMap, PathContainer};
use crate::stats::PairedInfoIndex;
use std::collections::HashSet;
use tracing::debug;

/// Candidate next edge, with the estimated gap between the path end and the
/// edge start.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeWithDistance {
    pub edge: EdgeId,
    pub distance: i64,
}

impl EdgeWithDistance {
    pub fn new(edge: EdgeId, distance: i64) -> Self {
        EdgeWithDistance { edge, distance }
    }
}

/// Statistics provider queried by the weight-based choosers. Implementations
/// never mutate shared state; all methods are pure.
pub trait WeightCounter {
    /// Support weight for extending `path` with `e` at the given gap,
    /// ignoring the excluded path positions.
    fn count_weight(
        &self,
        path: &BidirectionalPath,
        e: EdgeId,
        excluded: &HashSet<usize>,
        gap: i64,
    ) -> f64;

    /// Whether any evidence connects `from` to `to` at roughly `distance`.
    fn pair_info_exists(&self, from: EdgeId, to: EdgeId, distance: i64) -> bool;

    /// Whether `weight` clears the configured significance threshold.
    fn is_extension_possible(&self, weight: f64) -> bool;

    /// Raw `(distance, weight)` evidence points for an edge pair.
    fn distance_points(&self, from: EdgeId, to: EdgeId) -> Vec<(i64, f64)>;

    /// Expected support for the candidate at the estimated gap; only the sign
    /// matters to callers (non-positive means the gap is out of library
    /// range).
    fn ideal_info(&self, path: &BidirectionalPath, e: EdgeId, gap: i64) -> f64;
}

/// Weight counter over a paired-read distance index.
pub struct PairedWeightCounter<'a> {
    graph: &'a AssemblyGraph,
    index: &'a PairedInfoIndex,
    /// Maximum span the library can support (insert size minus read length).
    lib_span: i64,
    /// Tolerance when matching an evidence distance against a path offset.
    distance_error: i64,
    significance_threshold: f64,
}

impl<'a> PairedWeightCounter<'a> {
    pub fn new(
        graph: &'a AssemblyGraph,
        index: &'a PairedInfoIndex,
        lib_span: i64,
        distance_error: i64,
        significance_threshold: f64,
    ) -> Self {
        PairedWeightCounter {
            graph,
            index,
            lib_span,
            distance_error,
            significance_threshold,
        }
    }
}

impl WeightCounter for PairedWeightCounter<'_> {
    fn count_weight(
        &self,
        path: &BidirectionalPath,
        e: EdgeId,
        excluded: &HashSet<usize>,
        gap: i64,
    ) -> f64 {
        let mut total = 0.0;
        for j in 0..path.len() {
            if excluded.contains(&j) {
                continue;
            }
            let expected = path.length_at(self.graph, j) as i64 + gap;
            for (d, w) in self.index.points(path.at(j), e) {
                if (d - expected).abs() <= self.distance_error {
                    total += w;
                }
            }
        }
        total
    }

    fn pair_info_exists(&self, from: EdgeId, to: EdgeId, distance: i64) -> bool {
        self.index
            .points(from, to)
            .iter()
            .any(|(d, w)| (d - distance).abs() <= self.distance_error && *w > 0.0)
    }

    fn is_extension_possible(&self, weight: f64) -> bool {
        weight >= self.significance_threshold
    }

    fn distance_points(&self, from: EdgeId, to: EdgeId) -> Vec<(i64, f64)> {
        self.index.points(from, to).to_vec()
    }

    fn ideal_info(&self, _path: &BidirectionalPath, _e: EdgeId, gap: i64) -> f64 {
        (self.lib_span - gap).max(0) as f64
    }
}

/// Walks backward from the path tip marking positions whose extension was
/// uniquely determined, so their evidence is not double-counted against new
/// candidates.
pub struct PathAnalyzer<'a> {
    graph: &'a AssemblyGraph,
}

impl<'a> PathAnalyzer<'a> {
    pub fn new(graph: &'a AssemblyGraph) -> Self {
        PathAnalyzer { graph }
    }

    /// Mark trailing positions reachable over vertices with exactly one
    /// incoming edge. Returns the index of the first position that was not
    /// marked, or -1 if the walk consumed the whole path.
    pub fn exclude_trivial(
        &self,
        path: &BidirectionalPath,
        excluded: &mut HashSet<usize>,
        from: Option<usize>,
    ) -> i64 {
        let mut idx = match from {
            Some(f) if f >= path.len() => return f as i64,
            Some(f) => f as i64,
            None => path.len() as i64 - 1,
        };
        if idx < 0 {
            return idx;
        }
        let mut current = self.graph.edge_end(path.at(idx as usize));
        while idx >= 0 {
            match self.graph.unique_incoming_edge(current) {
                Some(e) => {
                    current = self.graph.edge_start(e);
                    excluded.insert(idx as usize);
                    idx -= 1;
                }
                None => break,
            }
        }
        idx
    }

    /// Like `exclude_trivial`, but keeps walking past a branch point when all
    /// alternative incoming edges there originate from the same source vertex
    /// (a bulge, not a true branch).
    pub fn exclude_trivial_with_bulges(
        &self,
        path: &BidirectionalPath,
        excluded: &mut HashSet<usize>,
    ) -> i64 {
        excluded.clear();
        if path.is_empty() {
            return 0;
        }
        let mut last = path.len() as i64 - 1;
        loop {
            last = self.exclude_trivial(path, excluded, Some(last as usize));
            if last < 0 {
                break;
            }
            let v = self.graph.edge_end(path.at(last as usize));
            let u = self.graph.edge_start(path.at(last as usize));
            let bulge = self
                .graph
                .incoming_edges(v)
                .iter()
                .all(|&e| self.graph.edge_start(e) == u);
            if !bulge {
                break;
            }
            last -= 1;
            if last < 0 {
                break;
            }
        }
        last
    }
}

/// Filters candidate next edges for a path; pure in `path`.
pub trait ExtensionChooser {
    fn filter(
        &self,
        path: &BidirectionalPath,
        candidates: &[EdgeWithDistance],
    ) -> Vec<EdgeWithDistance>;
}

/// Accepts a sole candidate, rejects anything ambiguous.
pub struct TrivialExtensionChooser;

impl ExtensionChooser for TrivialExtensionChooser {
    fn filter(
        &self,
        _path: &BidirectionalPath,
        candidates: &[EdgeWithDistance],
    ) -> Vec<EdgeWithDistance> {
        if candidates.len() == 1 {
            candidates.to_vec()
        } else {
            Vec::new()
        }
    }
}

/// Pipes the output of one chooser into another (logical AND narrowing).
pub struct JointExtensionChooser<'a> {
    first: &'a dyn ExtensionChooser,
    second: &'a dyn ExtensionChooser,
}

impl<'a> JointExtensionChooser<'a> {
    pub fn new(first: &'a dyn ExtensionChooser, second: &'a dyn ExtensionChooser) -> Self {
        JointExtensionChooser { first, second }
    }
}

impl ExtensionChooser for JointExtensionChooser<'_> {
    fn filter(
        &self,
        path: &BidirectionalPath,
        candidates: &[EdgeWithDistance],
    ) -> Vec<EdgeWithDistance> {
        let narrowed = self.first.filter(path, candidates);
        self.second.filter(path, &narrowed)
    }
}

/// Max-weight selection with a priority band: keeps the best candidate plus
/// every candidate within `max_weight / priority_coefficient` of it, then
/// tie-breaks by re-weighting with shared-evidence positions excluded.
pub struct SimpleExtensionChooser<'a> {
    graph: &'a AssemblyGraph,
    wc: &'a dyn WeightCounter,
    priority_coefficient: f64,
}

impl<'a> SimpleExtensionChooser<'a> {
    pub fn new(
        graph: &'a AssemblyGraph,
        wc: &'a dyn WeightCounter,
        priority_coefficient: f64,
    ) -> Self {
        SimpleExtensionChooser {
            graph,
            wc,
            priority_coefficient,
        }
    }

    fn find_result(
        &self,
        path: &BidirectionalPath,
        candidates: &[EdgeWithDistance],
        excluded: &HashSet<usize>,
    ) -> Vec<EdgeWithDistance> {
        let mut weighted: Vec<(f64, EdgeWithDistance)> = candidates
            .iter()
            .map(|c| {
                let w = self.wc.count_weight(path, c.edge, excluded, c.distance);
                debug!(edge = c.edge.0, weight = w, "candidate weight");
                (w, *c)
            })
            .collect();
        weighted.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        let max_weight = match weighted.first() {
            Some((w, _)) => *w,
            None => return Vec::new(),
        };
        if !self.wc.is_extension_possible(max_weight) {
            return Vec::new();
        }
        weighted
            .into_iter()
            .filter(|(w, _)| *w >= max_weight / self.priority_coefficient)
            .map(|(_, c)| c)
            .collect()
    }
}

impl ExtensionChooser for SimpleExtensionChooser<'_> {
    fn filter(
        &self,
        path: &BidirectionalPath,
        candidates: &[EdgeWithDistance],
    ) -> Vec<EdgeWithDistance> {
        if candidates.is_empty() {
            return Vec::new();
        }
        let analyzer = PathAnalyzer::new(self.graph);
        let mut excluded = HashSet::new();
        analyzer.exclude_trivial_with_bulges(path, &mut excluded);

        let result = self.find_result(path, candidates, &excluded);
        if result.len() <= 1 {
            return result;
        }
        // Tie: additionally exclude positions with evidence for both leading
        // candidates, then re-weigh. Only a unique survivor overrides the
        // first pass; otherwise the ambiguous set is returned as-is.
        let first = result[0].edge;
        let second = result[1].edge;
        for j in 0..path.len() {
            let at = path.length_at(self.graph, j) as i64;
            if self.wc.pair_info_exists(path.at(j), first, at)
                && self.wc.pair_info_exists(path.at(j), second, at)
            {
                excluded.insert(j);
            }
        }
        let rerun = self.find_result(path, candidates, &excluded);
        if rerun.len() == 1 {
            rerun
        } else {
            result
        }
    }
}

/// Thresholds for the gap-aware scaffolding chooser.
#[derive(Clone, Copy, Debug)]
pub struct ScaffoldingParams {
    /// Histogram cutoff as a fraction of the strongest single evidence point.
    pub rel_cutoff: f64,
    /// Absolute ceiling on the histogram cutoff.
    pub cutoff: f64,
    /// Minimum surviving evidence mass to accept a candidate.
    pub sum_threshold: f64,
    /// Offsets this close to the path end are not informative (k-mer size).
    pub offset_slack: usize,
}

/// Gap-aware selection: estimates the gap to each candidate from a weighted
/// histogram of inferred offsets, sigma-clipped over two rounds.
pub struct ScaffoldingExtensionChooser<'a> {
    graph: &'a AssemblyGraph,
    wc: &'a dyn WeightCounter,
    params: ScaffoldingParams,
}

fn weighted_mean(histogram: &[(i64, f64)]) -> i64 {
    let sum: f64 = histogram.iter().map(|(_, w)| w).sum();
    if sum <= 0.0 {
        return 0;
    }
    let mean: f64 = histogram
        .iter()
        .map(|(d, w)| *d as f64 * w / sum)
        .sum();
    mean.round() as i64
}

fn weighted_dev(histogram: &[(i64, f64)], mean: i64) -> i64 {
    let sum: f64 = histogram.iter().map(|(_, w)| w).sum();
    if sum <= 0.0 {
        return 0;
    }
    let var: f64 = histogram
        .iter()
        .map(|(d, w)| ((d - mean) as f64).powi(2) * w)
        .sum::<f64>()
        / sum;
    var.sqrt().round() as i64
}

impl<'a> ScaffoldingExtensionChooser<'a> {
    pub fn new(
        graph: &'a AssemblyGraph,
        wc: &'a dyn WeightCounter,
        params: ScaffoldingParams,
    ) -> Self {
        ScaffoldingExtensionChooser { graph, wc, params }
    }

    /// Collect `(inferred_gap, weight)` contributions from every path
    /// position with evidence reaching past the path end. Returns the
    /// histogram and the strongest single evidence weight.
    fn collect_histogram(
        &self,
        path: &BidirectionalPath,
        e: EdgeId,
    ) -> (Vec<(i64, f64)>, f64) {
        let mut histogram = Vec::new();
        let mut max_weight = 0.0f64;
        for j in 0..path.len() {
            let length_at = path.length_at(self.graph, j) as i64;
            let min_informative = (length_at - self.params.offset_slack as i64).max(0);
            for (d, w) in self.wc.distance_points(path.at(j), e) {
                max_weight = max_weight.max(w);
                if d > min_informative {
                    histogram.push((d - length_at, w));
                }
            }
        }
        (histogram, max_weight)
    }
}

impl ExtensionChooser for ScaffoldingExtensionChooser<'_> {
    fn filter(
        &self,
        path: &BidirectionalPath,
        candidates: &[EdgeWithDistance],
    ) -> Vec<EdgeWithDistance> {
        let mut result = Vec::new();
        for c in candidates {
            let (mut histogram, max_weight) = self.collect_histogram(path, c.edge);
            let cutoff = (max_weight * self.params.rel_cutoff).min(self.params.cutoff);
            for round in 0..2i64 {
                let mean = weighted_mean(&histogram);
                let dev = weighted_dev(&histogram, mean);
                let half_window = (5 - round) * dev;
                histogram.retain(|(d, w)| {
                    *d >= mean - half_window && *d <= mean + half_window && *w >= cutoff
                });
            }
            let sum: f64 = histogram.iter().map(|(_, w)| w).sum();
            if sum <= self.params.sum_threshold {
                continue;
            }
            let gap = weighted_mean(&histogram);
            if self.wc.ideal_info(path, c.edge, gap) > 0.0 {
                debug!(edge = c.edge.0, gap, sum, "scaffolding candidate accepted");
                result.push(EdgeWithDistance::new(c.edge, gap));
            }
        }
        result
    }
}

/// Consensus over previously assembled long paths: a candidate is kept only
/// if supporting paths that agree with the current path tip continue into it,
/// scored by how many trailing edges match before the paths diverge.
pub struct PathsDrivenExtensionChooser<'a> {
    container: &'a PathContainer,
    coverage: &'a GraphCoverageMap,
}

impl<'a> PathsDrivenExtensionChooser<'a> {
    pub fn new(container: &'a PathContainer, coverage: &'a GraphCoverageMap) -> Self {
        PathsDrivenExtensionChooser {
            container,
            coverage,
        }
    }

    /// Trailing edges of `path` matched by `support` ending at `back_pos`.
    fn backward_match(path: &BidirectionalPath, support: &BidirectionalPath, back_pos: usize) -> usize {
        let mut covered = 0usize;
        while covered <= back_pos && covered < path.len() {
            if path.at(path.len() - 1 - covered) != support.at(back_pos - covered) {
                break;
            }
            covered += 1;
        }
        covered
    }
}

impl ExtensionChooser for PathsDrivenExtensionChooser<'_> {
    fn filter(
        &self,
        path: &BidirectionalPath,
        candidates: &[EdgeWithDistance],
    ) -> Vec<EdgeWithDistance> {
        if candidates.is_empty() || path.is_empty() {
            return Vec::new();
        }
        let candidate_set: HashSet<EdgeId> = candidates.iter().map(|c| c.edge).collect();
        let back = match path.back() {
            Some(e) => e,
            None => return Vec::new(),
        };

        // `None` stands for a supporting path that ends at the current tip.
        let mut supported: HashSet<Option<EdgeId>> = HashSet::new();
        let mut occurrences = Vec::new();
        for key in self.coverage.covering_paths(back) {
            let support = self.container.path(*key);
            for pos in support.find_all(back) {
                if pos + 1 < support.len() && candidate_set.contains(&support.at(pos + 1)) {
                    supported.insert(Some(support.at(pos + 1)));
                    occurrences.push((*key, pos));
                } else if pos + 1 == support.len() {
                    supported.insert(None);
                    occurrences.push((*key, pos));
                }
            }
        }

        if supported.len() > 1 {
            // Score each occurrence by backward agreement and keep the
            // candidates tied at the maximum.
            let mut scored: Vec<(Option<EdgeId>, usize)> = occurrences
                .iter()
                .map(|(key, pos)| {
                    let support = self.container.path(*key);
                    let covered = Self::backward_match(path, support, *pos);
                    let next = if pos + 1 < support.len() {
                        Some(support.at(pos + 1))
                    } else {
                        None
                    };
                    (next, covered)
                })
                .collect();
            scored.sort_by(|a, b| b.1.cmp(&a.1));
            let best = scored[0].1;
            supported = scored
                .iter()
                .take_while(|(_, s)| *s == best)
                .map(|(e, _)| *e)
                .collect();
            // A path ending at the tip tied at maximum support makes the
            // decision unreliable; select none.
            if supported.contains(&None) {
                debug!("end-of-path support ties at maximum, not extending");
                return Vec::new();
            }
        } else if supported.contains(&None) {
            return Vec::new();
        }

        candidates
            .iter()
            .filter(|c| supported.contains(&Some(c.edge)))
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly_graph::VertexId;
    use crate::path::PathPair;

    fn chain(n: usize, edge_len: usize) -> (AssemblyGraph, Vec<VertexId>, Vec<EdgeId>) {
        let mut g = AssemblyGraph::new();
        let vs: Vec<VertexId> = (0..n).map(|_| g.add_vertex()).collect();
        let es: Vec<EdgeId> = (0..n - 1)
            .map(|i| g.add_edge(vs[i], vs[i + 1], edge_len, 10.0))
            .collect();
        (g, vs, es)
    }

    #[test]
    fn exclude_trivial_stops_at_branching_vertex() {
        // Chain v0..v3 with an extra edge into v1, so only the two trailing
        // positions are uniquely determined.
        let (mut g, vs, es) = chain(4, 100);
        let x = g.add_vertex();
        g.add_edge(x, vs[1], 100, 5.0);

        let path = BidirectionalPath::from_edges(&es);
        let analyzer = PathAnalyzer::new(&g);
        let mut excluded = HashSet::new();
        let stop = analyzer.exclude_trivial(&path, &mut excluded, None);

        assert_eq!(stop, 0);
        assert!(excluded.contains(&2));
        assert!(excluded.contains(&1));
        assert!(!excluded.contains(&0));
    }

    #[test]
    fn bulge_does_not_stop_exclusion() {
        // v0 -> v1 twice (a bulge), then v1 -> v2 -> v3. The bulge vertex is
        // not a true branch, so the walk continues through it.
        let mut g = AssemblyGraph::new();
        let vs: Vec<VertexId> = (0..4).map(|_| g.add_vertex()).collect();
        let main = g.add_edge(vs[0], vs[1], 100, 10.0);
        let _alt = g.add_edge(vs[0], vs[1], 90, 4.0);
        let e1 = g.add_edge(vs[1], vs[2], 100, 10.0);
        let e2 = g.add_edge(vs[2], vs[3], 100, 10.0);

        let path = BidirectionalPath::from_edges(&[main, e1, e2]);
        let analyzer = PathAnalyzer::new(&g);

        let mut plain = HashSet::new();
        let plain_stop = analyzer.exclude_trivial(&path, &mut plain, None);
        assert_eq!(plain_stop, 0);

        let mut with_bulges = HashSet::new();
        let bulge_stop = analyzer.exclude_trivial_with_bulges(&path, &mut with_bulges);
        assert!(bulge_stop < 0);
    }

    fn weighted_fixture(
        weights: &[f64],
    ) -> (AssemblyGraph, PairedInfoIndex, BidirectionalPath, Vec<EdgeWithDistance>) {
        // One path edge of length 100 and one candidate per weight, each with
        // a single evidence point at the matching distance. The extra edge
        // into the junction keeps the path position out of the trivial
        // exclusion set.
        let mut g = AssemblyGraph::new();
        let vs: Vec<VertexId> = (0..weights.len() + 2).map(|_| g.add_vertex()).collect();
        let path_edge = g.add_edge(vs[0], vs[1], 100, 10.0);
        let side = g.add_vertex();
        g.add_edge(side, vs[1], 100, 1.0);
        let mut index = PairedInfoIndex::new();
        let mut candidates = Vec::new();
        for (i, w) in weights.iter().enumerate() {
            let e = g.add_edge(vs[1], vs[i + 2], 100, 10.0);
            index.add(path_edge, e, 100, *w);
            candidates.push(EdgeWithDistance::new(e, 0));
        }
        let path = BidirectionalPath::from_edges(&[path_edge]);
        (g, index, path, candidates)
    }

    #[test]
    fn priority_band_keeps_near_best_candidates() {
        let (g, index, path, candidates) = weighted_fixture(&[10.0, 9.0, 1.0]);
        let wc = PairedWeightCounter::new(&g, &index, 1000, 10, 1.0);

        let chooser = SimpleExtensionChooser::new(&g, &wc, 2.0);
        let result = chooser.filter(&path, &candidates);
        // 10 and 9 are both within 10/2 = 5; 1 is not.
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].edge, candidates[0].edge);
        assert_eq!(result[1].edge, candidates[1].edge);
    }

    #[test]
    fn tight_priority_band_selects_single_best() {
        let (g, index, path, candidates) = weighted_fixture(&[10.0, 9.0, 1.0]);
        let wc = PairedWeightCounter::new(&g, &index, 1000, 10, 1.0);

        let chooser = SimpleExtensionChooser::new(&g, &wc, 1.05);
        let result = chooser.filter(&path, &candidates);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].edge, candidates[0].edge);
    }

    #[test]
    fn insignificant_max_weight_rejects_all() {
        let (g, index, path, candidates) = weighted_fixture(&[0.4, 0.2]);
        let wc = PairedWeightCounter::new(&g, &index, 1000, 10, 1.0);
        let chooser = SimpleExtensionChooser::new(&g, &wc, 2.0);
        assert!(chooser.filter(&path, &candidates).is_empty());
    }

    #[test]
    fn sigma_clipping_drops_outlier_and_estimates_gap() {
        let mut g = AssemblyGraph::new();
        let vs: Vec<VertexId> = (0..3).map(|_| g.add_vertex()).collect();
        let path_edge = g.add_edge(vs[0], vs[1], 100, 10.0);
        let candidate = g.add_edge(vs[1], vs[2], 100, 10.0);

        let mut index = PairedInfoIndex::new();
        // Mass near gap = 50 (distances ~150 past a 100 bp path)...
        for d in [148, 149, 150, 151, 152] {
            index.add(path_edge, candidate, d, 10.0);
        }
        // ...and one far outlier at gap = 500.
        index.add(path_edge, candidate, 600, 1.0);

        let wc = PairedWeightCounter::new(&g, &index, 1000, 10, 1.0);
        let params = ScaffoldingParams {
            rel_cutoff: 0.05,
            cutoff: 10.0,
            sum_threshold: 10.0,
            offset_slack: 0,
        };
        let chooser = ScaffoldingExtensionChooser::new(&g, &wc, params);
        let path = BidirectionalPath::from_edges(&[path_edge]);
        let result = chooser.filter(&path, &[EdgeWithDistance::new(candidate, 0)]);

        assert_eq!(result.len(), 1);
        assert!((result[0].distance - 50).abs() <= 3, "gap {}", result[0].distance);
    }

    #[test]
    fn out_of_library_range_gap_is_rejected() {
        let mut g = AssemblyGraph::new();
        let vs: Vec<VertexId> = (0..3).map(|_| g.add_vertex()).collect();
        let path_edge = g.add_edge(vs[0], vs[1], 100, 10.0);
        let candidate = g.add_edge(vs[1], vs[2], 100, 10.0);
        let mut index = PairedInfoIndex::new();
        for d in [548, 550, 552] {
            index.add(path_edge, candidate, d, 10.0);
        }
        // lib_span 300 < estimated gap 450: ideal support is non-positive.
        let wc = PairedWeightCounter::new(&g, &index, 300, 10, 1.0);
        let params = ScaffoldingParams {
            rel_cutoff: 0.05,
            cutoff: 10.0,
            sum_threshold: 10.0,
            offset_slack: 0,
        };
        let chooser = ScaffoldingExtensionChooser::new(&g, &wc, params);
        let path = BidirectionalPath::from_edges(&[path_edge]);
        assert!(chooser
            .filter(&path, &[EdgeWithDistance::new(candidate, 0)])
            .is_empty());
    }

    #[test]
    fn paths_driven_prefers_longest_backward_match() {
        let (_, _, es) = chain(6, 100);
        // Current path [e0, e1]; candidates e2 and e3(conj side unused).
        let path = BidirectionalPath::from_edges(&[es[0], es[1]]);
        let mut container = PathContainer::new();
        // Supports e2 with two trailing edges matched.
        container.add(PathPair::from_edges(&[es[0], es[1], es[2]]));
        // Supports e3 with only one trailing edge matched.
        container.add(PathPair::from_edges(&[es[1], es[3]]));
        let coverage = GraphCoverageMap::build(&container);
        let chooser = PathsDrivenExtensionChooser::new(&container, &coverage);

        let candidates = [
            EdgeWithDistance::new(es[2], 0),
            EdgeWithDistance::new(es[3], 0),
        ];
        let result = chooser.filter(&path, &candidates);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].edge, es[2]);
    }

    #[test]
    fn equal_support_stays_ambiguous() {
        let (_, _, es) = chain(6, 100);
        let path = BidirectionalPath::from_edges(&[es[0], es[1]]);
        let mut container = PathContainer::new();
        container.add(PathPair::from_edges(&[es[0], es[1], es[2]]));
        container.add(PathPair::from_edges(&[es[0], es[1], es[3]]));
        let coverage = GraphCoverageMap::build(&container);
        let chooser = PathsDrivenExtensionChooser::new(&container, &coverage);

        let candidates = [
            EdgeWithDistance::new(es[2], 0),
            EdgeWithDistance::new(es[3], 0),
        ];
        let result = chooser.filter(&path, &candidates);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn end_of_path_support_selects_none() {
        let (_, _, es) = chain(6, 100);
        let path = BidirectionalPath::from_edges(&[es[0], es[1]]);
        let mut container = PathContainer::new();
        // Ends exactly at the tip: inconclusive.
        container.add(PathPair::from_edges(&[es[0], es[1]]));
        container.add(PathPair::from_edges(&[es[1], es[2]]));
        let coverage = GraphCoverageMap::build(&container);
        let chooser = PathsDrivenExtensionChooser::new(&container, &coverage);

        let candidates = [EdgeWithDistance::new(es[2], 0)];
        let result = chooser.filter(&path, &candidates);
        assert!(result.is_empty());
    }

    #[test]
    fn joint_chooser_narrows_sequentially() {
        let (g, index, path, candidates) = weighted_fixture(&[10.0, 9.0]);
        let wc = PairedWeightCounter::new(&g, &index, 1000, 10, 1.0);
        let simple = SimpleExtensionChooser::new(&g, &wc, 1.05);
        let trivial = TrivialExtensionChooser;
        let joint = JointExtensionChooser::new(&simple, &trivial);
        let result = joint.filter(&path, &candidates);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].edge, candidates[0].edge);
    }
}
