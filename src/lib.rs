//! Repeat resolution and scaffold gap closing for assembly graphs.
//!
//! The crate works on a conjugate-symmetric directed multigraph and three
//! read-only evidence indices (paired-read distances, barcode occurrence,
//! unique-edge classification). On top of those it provides a bounded
//! strategy-parameterized Dijkstra engine, graph contraction over a lock-free
//! union-find, a family of path extension choosers, and an iterative
//! scaffold-graph gap closer that turns ambiguous long-range connections into
//! explicit paths.

pub mod assembly_graph;
pub mod concurrent_dsu;
pub mod contracted_graph;
pub mod dijkstra;
pub mod extension_chooser;
pub mod gap_closer;
pub mod gap_predicates;
pub mod path;
pub mod scaffold_graph;
pub mod stats;
pub mod unique_edges;
