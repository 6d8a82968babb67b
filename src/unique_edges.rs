use crate::assembly_graph::EdgeId;
use std::collections::HashSet;

/// Precomputed classification of "unique" edges: edges long and covered
/// enough to be trusted to occur exactly once in the underlying sequence.
/// Built externally; the core only queries it.
pub struct UniqueEdgeStorage {
    unique: HashSet<EdgeId>,
    min_length: usize,
}

impl UniqueEdgeStorage {
    /// `min_length` is the length floor of the classification: edges shorter
    /// than this were never considered for uniqueness.
    pub fn new(min_length: usize) -> Self {
        UniqueEdgeStorage {
            unique: HashSet::new(),
            min_length,
        }
    }

    /// Mark an edge (and its conjugate) unique.
    pub fn insert(&mut self, e: EdgeId) {
        self.unique.insert(e);
        self.unique.insert(e.conjugate());
    }

    pub fn is_unique(&self, e: EdgeId) -> bool {
        self.unique.contains(&e)
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn len(&self) -> usize {
        self.unique.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unique.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conjugate_is_unique_too() {
        let mut storage = UniqueEdgeStorage::new(500);
        storage.insert(EdgeId(4));
        assert!(storage.is_unique(EdgeId(4)));
        assert!(storage.is_unique(EdgeId(5)));
        assert!(!storage.is_unique(EdgeId(6)));
        assert_eq!(storage.min_length(), 500);
    }
}
