use anyhow::{bail, Result};
use tracing::debug;

/// Vertex identity in the assembly graph.
///
/// Vertices are allocated in conjugate pairs; the conjugate of a vertex is
/// always `id ^ 1`, so reverse-complement symmetry is a property of the
/// numbering itself rather than of a side table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub usize);

/// Edge identity in the assembly graph. Same pairing scheme as `VertexId`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub usize);

impl VertexId {
    #[inline]
    pub fn conjugate(self) -> VertexId {
        VertexId(self.0 ^ 1)
    }
}

impl EdgeId {
    #[inline]
    pub fn conjugate(self) -> EdgeId {
        EdgeId(self.0 ^ 1)
    }
}

#[derive(Clone, Debug)]
struct EdgeRecord {
    start: VertexId,
    end: VertexId,
    length: usize,
    coverage: f64,
    alive: bool,
}

#[derive(Clone, Debug)]
struct VertexRecord {
    alive: bool,
}

/// Directed multigraph with reverse-complement (conjugate) symmetry.
///
/// Every `add_edge` call creates the edge and its conjugate together, so the
/// invariant `edge_start(e.conjugate()) == edge_end(e).conjugate()` holds for
/// every live edge. Structural mutations (`delete_edge`, `compress_vertex`)
/// maintain both sides or fail.
pub struct AssemblyGraph {
    vertices: Vec<VertexRecord>,
    edges: Vec<EdgeRecord>,
    outgoing: Vec<Vec<EdgeId>>,
    incoming: Vec<Vec<EdgeId>>,
}

impl Default for AssemblyGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl AssemblyGraph {
    pub fn new() -> Self {
        AssemblyGraph {
            vertices: Vec::new(),
            edges: Vec::new(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
        }
    }

    /// Allocate a vertex and its conjugate, returning the forward one.
    pub fn add_vertex(&mut self) -> VertexId {
        let id = VertexId(self.vertices.len());
        for _ in 0..2 {
            self.vertices.push(VertexRecord { alive: true });
            self.outgoing.push(Vec::new());
            self.incoming.push(Vec::new());
        }
        id
    }

    /// Add an edge `start -> end` together with its conjugate
    /// `end.conjugate() -> start.conjugate()`. Returns the forward edge.
    pub fn add_edge(&mut self, start: VertexId, end: VertexId, length: usize, coverage: f64) -> EdgeId {
        let id = EdgeId(self.edges.len());
        self.edges.push(EdgeRecord { start, end, length, coverage, alive: true });
        self.edges.push(EdgeRecord {
            start: end.conjugate(),
            end: start.conjugate(),
            length,
            coverage,
            alive: true,
        });
        self.outgoing[start.0].push(id);
        self.incoming[end.0].push(id);
        self.outgoing[end.conjugate().0].push(id.conjugate());
        self.incoming[start.conjugate().0].push(id.conjugate());
        id
    }

    #[inline]
    pub fn edge_start(&self, e: EdgeId) -> VertexId {
        self.edges[e.0].start
    }

    #[inline]
    pub fn edge_end(&self, e: EdgeId) -> VertexId {
        self.edges[e.0].end
    }

    #[inline]
    pub fn length(&self, e: EdgeId) -> usize {
        self.edges[e.0].length
    }

    #[inline]
    pub fn coverage(&self, e: EdgeId) -> f64 {
        self.edges[e.0].coverage
    }

    #[inline]
    pub fn edge_alive(&self, e: EdgeId) -> bool {
        e.0 < self.edges.len() && self.edges[e.0].alive
    }

    #[inline]
    pub fn vertex_alive(&self, v: VertexId) -> bool {
        v.0 < self.vertices.len() && self.vertices[v.0].alive
    }

    pub fn outgoing_edges(&self, v: VertexId) -> &[EdgeId] {
        &self.outgoing[v.0]
    }

    pub fn incoming_edges(&self, v: VertexId) -> &[EdgeId] {
        &self.incoming[v.0]
    }

    pub fn out_degree(&self, v: VertexId) -> usize {
        self.outgoing[v.0].len()
    }

    pub fn in_degree(&self, v: VertexId) -> usize {
        self.incoming[v.0].len()
    }

    /// The sole incoming edge of `v`, if its in-degree is exactly one.
    pub fn unique_incoming_edge(&self, v: VertexId) -> Option<EdgeId> {
        match self.incoming[v.0].as_slice() {
            [e] => Some(*e),
            _ => None,
        }
    }

    /// Live edges, both strands, in id order.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, r)| r.alive)
            .map(|(i, _)| EdgeId(i))
    }

    /// Live vertices, both strands, in id order.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, r)| r.alive)
            .map(|(i, _)| VertexId(i))
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().filter(|r| r.alive).count()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.iter().filter(|r| r.alive).count()
    }

    /// Total number of vertex slots ever allocated (live or not). The
    /// traversal engine and the DSU size their index arenas from this.
    pub fn vertex_capacity(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_capacity(&self) -> usize {
        self.edges.len()
    }

    /// Whether `u` and `w` are the same vertex up to conjugation. Compression
    /// through such a pair would glue a sequence to its own reverse
    /// complement, so callers must check this first.
    pub fn related_vertices(&self, u: VertexId, w: VertexId) -> bool {
        u == w || u == w.conjugate()
    }

    /// Remove an edge and its conjugate.
    pub fn delete_edge(&mut self, e: EdgeId) -> Result<()> {
        if !self.edge_alive(e) {
            bail!("delete_edge: edge {:?} is not in the graph", e);
        }
        for id in [e, e.conjugate()] {
            let (start, end) = (self.edges[id.0].start, self.edges[id.0].end);
            self.outgoing[start.0].retain(|x| *x != id);
            self.incoming[end.0].retain(|x| *x != id);
            self.edges[id.0].alive = false;
        }
        debug!(edge = e.0, "deleted edge pair");
        Ok(())
    }

    /// Merge a degree-(1,1) vertex into its neighbours: the incoming and
    /// outgoing edges are replaced by a single edge spanning both. The
    /// conjugate vertex is compressed alongside. Returns the new edge.
    pub fn compress_vertex(&mut self, v: VertexId) -> Result<EdgeId> {
        if !self.vertex_alive(v) {
            bail!("compress_vertex: vertex {:?} is not in the graph", v);
        }
        if self.in_degree(v) != 1 || self.out_degree(v) != 1 {
            bail!(
                "compress_vertex: {:?} has degree ({}, {}), expected (1, 1)",
                v,
                self.in_degree(v),
                self.out_degree(v)
            );
        }
        let e_in = self.incoming[v.0][0];
        let e_out = self.outgoing[v.0][0];
        if e_in == e_out || e_in == e_out.conjugate() {
            bail!("compress_vertex: {:?} sits on a loop or hairpin", v);
        }
        let a = self.edge_start(e_in);
        let b = self.edge_end(e_out);
        if self.related_vertices(a, v) || self.related_vertices(v, b) {
            bail!("compress_vertex: {:?} is self-adjacent", v);
        }
        let len = self.length(e_in) + self.length(e_out);
        let cov = if len == 0 {
            0.0
        } else {
            (self.coverage(e_in) * self.length(e_in) as f64
                + self.coverage(e_out) * self.length(e_out) as f64)
                / len as f64
        };
        self.delete_edge(e_in)?;
        self.delete_edge(e_out)?;
        self.vertices[v.0].alive = false;
        self.vertices[v.conjugate().0].alive = false;
        let merged = self.add_edge(a, b, len, cov);
        debug!(vertex = v.0, merged = merged.0, "compressed vertex");
        Ok(merged)
    }

    /// Verify the conjugate invariant over every live edge. A failure here
    /// means an upstream mutation broke the data model and downstream results
    /// cannot be trusted.
    pub fn check_conjugate_symmetry(&self) -> Result<()> {
        for e in self.edge_ids() {
            let c = e.conjugate();
            if !self.edge_alive(c) {
                bail!("edge {:?} is live but its conjugate is not", e);
            }
            if self.edge_start(c) != self.edge_end(e).conjugate()
                || self.edge_end(c) != self.edge_start(e).conjugate()
            {
                bail!("conjugate of {:?} is not structurally mirrored", e);
            }
            if self.length(e) != self.length(c) {
                bail!("conjugate of {:?} differs in length", e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(n: usize) -> (AssemblyGraph, Vec<VertexId>, Vec<EdgeId>) {
        let mut g = AssemblyGraph::new();
        let vs: Vec<VertexId> = (0..n).map(|_| g.add_vertex()).collect();
        let es: Vec<EdgeId> = (0..n - 1)
            .map(|i| g.add_edge(vs[i], vs[i + 1], 100, 10.0))
            .collect();
        (g, vs, es)
    }

    #[test]
    fn conjugate_symmetry_holds_by_construction() {
        let (g, vs, es) = chain(4);
        for &e in &es {
            let c = e.conjugate();
            assert_eq!(g.edge_start(c), g.edge_end(e).conjugate());
            assert_eq!(g.edge_end(c), g.edge_start(e).conjugate());
        }
        assert!(g.check_conjugate_symmetry().is_ok());
        assert_eq!(g.out_degree(vs[0]), 1);
        assert_eq!(g.in_degree(vs[0].conjugate()), 1);
    }

    #[test]
    fn delete_edge_removes_both_strands() {
        let (mut g, vs, es) = chain(3);
        g.delete_edge(es[0]).unwrap();
        assert!(!g.edge_alive(es[0]));
        assert!(!g.edge_alive(es[0].conjugate()));
        assert_eq!(g.out_degree(vs[0]), 0);
        assert_eq!(g.in_degree(vs[1]), 0);
        assert!(g.delete_edge(es[0]).is_err());
        assert!(g.check_conjugate_symmetry().is_ok());
    }

    #[test]
    fn compress_vertex_merges_chain() {
        let (mut g, vs, _) = chain(3);
        let merged = g.compress_vertex(vs[1]).unwrap();
        assert_eq!(g.edge_start(merged), vs[0]);
        assert_eq!(g.edge_end(merged), vs[2]);
        assert_eq!(g.length(merged), 200);
        assert!((g.coverage(merged) - 10.0).abs() < 1e-9);
        assert!(!g.vertex_alive(vs[1]));
        assert!(g.check_conjugate_symmetry().is_ok());
    }

    #[test]
    fn compress_rejects_branching_vertex() {
        let mut g = AssemblyGraph::new();
        let a = g.add_vertex();
        let b = g.add_vertex();
        let c = g.add_vertex();
        let d = g.add_vertex();
        g.add_edge(a, b, 50, 1.0);
        g.add_edge(c, b, 50, 1.0);
        g.add_edge(b, d, 50, 1.0);
        assert!(g.compress_vertex(b).is_err());
    }

    #[test]
    fn compress_rejects_self_loop() {
        let mut g = AssemblyGraph::new();
        let a = g.add_vertex();
        g.add_edge(a, a, 50, 1.0);
        assert!(g.compress_vertex(a).is_err());
    }
}
