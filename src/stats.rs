//! Read-only statistical evidence providers: paired-read distance points and
//! barcode occurrence per edge. Both are built by external indexing code and
//! only queried here; every query is a pure function, safe to share across
//! worker threads.

use crate::assembly_graph::EdgeId;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Tag grouping reads that came from the same long source fragment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BarcodeId(pub u64);

const NO_POINTS: &[(i64, f64)] = &[];

/// Paired-read distance evidence: for an ordered edge pair, the observed
/// distance estimates with their weights.
#[derive(Default)]
pub struct PairedInfoIndex {
    points: HashMap<(EdgeId, EdgeId), Vec<(i64, f64)>>,
}

impl PairedInfoIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, from: EdgeId, to: EdgeId, distance: i64, weight: f64) {
        self.points
            .entry((from, to))
            .or_default()
            .push((distance, weight));
    }

    /// All `(distance, weight)` points supporting `from -> to`.
    pub fn points(&self, from: EdgeId, to: EdgeId) -> &[(i64, f64)] {
        self.points
            .get(&(from, to))
            .map(|v| v.as_slice())
            .unwrap_or(NO_POINTS)
    }

    /// Total support weight for `from -> to`.
    pub fn total_weight(&self, from: EdgeId, to: EdgeId) -> f64 {
        self.points(from, to).iter().map(|(_, w)| w).sum()
    }

    /// Edges connected to `from` with summed weight at least `min_weight`,
    /// in deterministic edge-id order.
    pub fn connected_with(&self, from: EdgeId, min_weight: f64) -> BTreeMap<EdgeId, f64> {
        let mut result = BTreeMap::new();
        for ((f, t), pts) in &self.points {
            if *f == from {
                let w: f64 = pts.iter().map(|(_, w)| w).sum();
                if w >= min_weight {
                    result.insert(*t, w);
                }
            }
        }
        result
    }
}

/// Paired-read connection view with a fixed admission threshold; the
/// paired-connection neighbour source holds one of these.
pub struct PairedConnectionCondition<'a> {
    index: &'a PairedInfoIndex,
    min_weight: f64,
}

impl<'a> PairedConnectionCondition<'a> {
    pub fn new(index: &'a PairedInfoIndex, min_weight: f64) -> Self {
        PairedConnectionCondition { index, min_weight }
    }

    pub fn connected_with(&self, from: EdgeId) -> BTreeMap<EdgeId, f64> {
        self.index.connected_with(from, self.min_weight)
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct BarcodeHit {
    read_count: usize,
    min_offset: usize,
    max_offset: usize,
}

/// Barcode occurrence per edge, with enough positional resolution to answer
/// "does this barcode sit in the head or the tail half of the edge".
#[derive(Default)]
pub struct BarcodeIndex {
    entries: HashMap<EdgeId, BTreeMap<BarcodeId, BarcodeHit>>,
    all_barcodes: BTreeSet<BarcodeId>,
}

impl BarcodeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one read of `barcode` landing on `edge` at `offset` from the
    /// edge start.
    pub fn add_read(&mut self, edge: EdgeId, barcode: BarcodeId, offset: usize) {
        let hit = self
            .entries
            .entry(edge)
            .or_default()
            .entry(barcode)
            .or_insert(BarcodeHit {
                read_count: 0,
                min_offset: offset,
                max_offset: offset,
            });
        hit.read_count += 1;
        hit.min_offset = hit.min_offset.min(offset);
        hit.max_offset = hit.max_offset.max(offset);
        self.all_barcodes.insert(barcode);
    }

    /// Barcodes on `edge` with at least `count_threshold` reads, sorted.
    pub fn barcodes(&self, edge: EdgeId, count_threshold: usize) -> Vec<BarcodeId> {
        self.entries
            .get(&edge)
            .map(|m| {
                m.iter()
                    .filter(|(_, h)| h.read_count >= count_threshold)
                    .map(|(b, _)| *b)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn barcode_count(&self, edge: EdgeId, count_threshold: usize) -> usize {
        self.barcodes(edge, count_threshold).len()
    }

    /// Barcodes shared by both edges at the given read-count threshold.
    pub fn shared_barcodes(
        &self,
        first: EdgeId,
        second: EdgeId,
        count_threshold: usize,
    ) -> Vec<BarcodeId> {
        let right: BTreeSet<BarcodeId> = self.barcodes(second, count_threshold).into_iter().collect();
        self.barcodes(first, count_threshold)
            .into_iter()
            .filter(|b| right.contains(b))
            .collect()
    }

    /// Fraction of the smaller barcode set shared with the other edge.
    /// Zero when either side is empty.
    pub fn shared_fraction(&self, first: EdgeId, second: EdgeId, count_threshold: usize) -> f64 {
        let a = self.barcode_count(first, count_threshold);
        let b = self.barcode_count(second, count_threshold);
        let denom = a.min(b);
        if denom == 0 {
            return 0.0;
        }
        self.shared_barcodes(first, second, count_threshold).len() as f64 / denom as f64
    }

    /// Barcodes whose first occurrence falls within the prefix
    /// `[0, prefix_len)` of the edge.
    pub fn barcodes_in_prefix(
        &self,
        edge: EdgeId,
        prefix_len: usize,
        count_threshold: usize,
    ) -> Vec<BarcodeId> {
        self.entries
            .get(&edge)
            .map(|m| {
                m.iter()
                    .filter(|(_, h)| h.read_count >= count_threshold && h.min_offset < prefix_len)
                    .map(|(b, _)| *b)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Barcodes whose last occurrence falls at or past `suffix_start`.
    pub fn barcodes_in_suffix(
        &self,
        edge: EdgeId,
        suffix_start: usize,
        count_threshold: usize,
    ) -> Vec<BarcodeId> {
        self.entries
            .get(&edge)
            .map(|m| {
                m.iter()
                    .filter(|(_, h)| h.read_count >= count_threshold && h.max_offset >= suffix_start)
                    .map(|(b, _)| *b)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// How many of the given barcodes occur on `edge`.
    pub fn count_contained(
        &self,
        edge: EdgeId,
        barcodes: &[BarcodeId],
        count_threshold: usize,
    ) -> usize {
        let on_edge: BTreeSet<BarcodeId> = self.barcodes(edge, count_threshold).into_iter().collect();
        barcodes.iter().filter(|b| on_edge.contains(b)).count()
    }

    /// Number of distinct barcodes in the whole index.
    pub fn total_barcodes(&self) -> usize {
        self.all_barcodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connected_with_applies_weight_threshold() {
        let mut index = PairedInfoIndex::new();
        index.add(EdgeId(0), EdgeId(2), 150, 3.0);
        index.add(EdgeId(0), EdgeId(2), 160, 2.0);
        index.add(EdgeId(0), EdgeId(4), 300, 0.5);
        let connected = index.connected_with(EdgeId(0), 1.0);
        assert_eq!(connected.len(), 1);
        assert!((connected[&EdgeId(2)] - 5.0).abs() < 1e-9);
        assert_eq!(index.points(EdgeId(0), EdgeId(6)).len(), 0);
    }

    #[test]
    fn shared_barcodes_and_fraction() {
        let mut index = BarcodeIndex::new();
        for b in 0..4 {
            index.add_read(EdgeId(0), BarcodeId(b), 10);
        }
        for b in 2..6 {
            index.add_read(EdgeId(2), BarcodeId(b), 20);
        }
        let shared = index.shared_barcodes(EdgeId(0), EdgeId(2), 1);
        assert_eq!(shared, vec![BarcodeId(2), BarcodeId(3)]);
        assert!((index.shared_fraction(EdgeId(0), EdgeId(2), 1) - 0.5).abs() < 1e-9);
        assert_eq!(index.total_barcodes(), 6);
    }

    #[test]
    fn prefix_suffix_split() {
        let mut index = BarcodeIndex::new();
        index.add_read(EdgeId(0), BarcodeId(1), 10);
        index.add_read(EdgeId(0), BarcodeId(2), 900);
        index.add_read(EdgeId(0), BarcodeId(3), 40);
        index.add_read(EdgeId(0), BarcodeId(3), 950);
        assert_eq!(
            index.barcodes_in_prefix(EdgeId(0), 500, 1),
            vec![BarcodeId(1), BarcodeId(3)]
        );
        assert_eq!(
            index.barcodes_in_suffix(EdgeId(0), 500, 1),
            vec![BarcodeId(2), BarcodeId(3)]
        );
    }

    #[test]
    fn read_count_threshold_filters() {
        let mut index = BarcodeIndex::new();
        index.add_read(EdgeId(0), BarcodeId(7), 0);
        index.add_read(EdgeId(0), BarcodeId(7), 5);
        index.add_read(EdgeId(0), BarcodeId(8), 0);
        assert_eq!(index.barcodes(EdgeId(0), 2), vec![BarcodeId(7)]);
    }
}
