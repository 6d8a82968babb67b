use crate::assembly_graph::VertexId;
use std::sync::Arc;
use uf_rush::UFRush;

/// Concurrent union-find over vertex index slots.
///
/// Thin wrapper around the lock-free `UFRush` arena. `unite` is commutative
/// and idempotent, so worker threads may merge vertex classes in any
/// interleaving and still converge to the same partition; no caller-side
/// synchronization is needed.
pub struct ConcurrentDsu {
    uf: Arc<UFRush>,
}

impl ConcurrentDsu {
    /// Create a union-find covering vertex slots `0..capacity`.
    pub fn new(capacity: usize) -> Self {
        ConcurrentDsu {
            uf: Arc::new(UFRush::new(capacity.max(1))),
        }
    }

    /// Representative of the class containing `v`.
    pub fn find(&self, v: VertexId) -> VertexId {
        VertexId(self.uf.find(v.0))
    }

    /// Merge the classes of `u` and `w`.
    pub fn unite(&self, u: VertexId, w: VertexId) {
        if u != w {
            self.uf.unite(u.0, w.0);
        }
    }

    /// Whether `u` and `w` are currently in the same class.
    pub fn same(&self, u: VertexId, w: VertexId) -> bool {
        u == w || self.uf.find(u.0) == self.uf.find(w.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn unite_then_find_agrees() {
        let dsu = ConcurrentDsu::new(16);
        dsu.unite(VertexId(1), VertexId(2));
        dsu.unite(VertexId(2), VertexId(3));
        assert!(dsu.same(VertexId(1), VertexId(3)));
        assert!(!dsu.same(VertexId(1), VertexId(4)));
        assert_eq!(dsu.find(VertexId(1)), dsu.find(VertexId(3)));
    }

    #[test]
    fn concurrent_unions_converge_to_one_partition() {
        let n = 4096;
        // Pair up slots (2k, 2k+1) and additionally chain every fourth slot,
        // from many threads at once.
        let pairs: Vec<(usize, usize)> = (0..n / 2)
            .map(|k| (2 * k, 2 * k + 1))
            .chain((0..n / 4).map(|k| (4 * k, 4 * k + 2)))
            .collect();

        let runs: Vec<Vec<VertexId>> = (0..4)
            .map(|_| {
                let dsu = ConcurrentDsu::new(n);
                pairs
                    .par_iter()
                    .for_each(|&(a, b)| dsu.unite(VertexId(a), VertexId(b)));
                (0..n).map(|i| dsu.find(VertexId(i))).collect()
            })
            .collect();

        // Every 4k..4k+4 block collapsed into one class.
        let first = &runs[0];
        for k in 0..n / 4 {
            let root = first[4 * k];
            for off in 1..4 {
                assert_eq!(first[4 * k + off], root);
            }
            if k > 0 {
                assert_ne!(first[4 * k], first[4 * (k - 1)]);
            }
        }
        // The partition (not necessarily the representative choice) is
        // identical across runs: same equivalence classes.
        for run in &runs[1..] {
            for i in 0..n {
                for j in [i / 4 * 4, (i + 1).min(n - 1)] {
                    assert_eq!(first[i] == first[j], run[i] == run[j]);
                }
            }
        }
    }
}
