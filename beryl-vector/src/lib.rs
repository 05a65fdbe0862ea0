//! Vector Index Layer for BerylDB
//!
//! This crate provides approximate nearest neighbor search over fixed-dimension
//! `f32` vectors using HNSW indexing.
//!
//! # Features
//!
//! - **HNSW Indexing**: Hierarchical Navigable Small World graphs for fast approximate nearest neighbor search
//! - **Multiple Distance Metrics**: Euclidean distance, cosine distance, negated dot product
//! - **Lazy Deletion**: removed vectors stay in the graph as waypoints and are filtered from results
//! - **Deterministic Builds**: seeded level assignment, so insert order plus seed reproduces the graph
//! - **Binary Serialization**: self-describing little-endian snapshot of the full graph state
//!
//! The index works purely in terms of opaque `u64` identifiers. Mapping between
//! caller-visible ids and index ids is the job of the collection layer in
//! `beryl-db`.
//!
//! # Example
//!
//! ```rust
//! use beryl_vector::{HnswConfig, HnswIndex, Metric};
//!
//! # fn main() -> beryl_vector::Result<()> {
//! let mut index = HnswIndex::new(3, Metric::L2, HnswConfig::default())?;
//!
//! index.add(0, &[1.0, 0.0, 0.0])?;
//! index.add(1, &[0.0, 1.0, 0.0])?;
//!
//! let results = index.search(&[1.0, 0.0, 0.0], 2, 50)?;
//! assert_eq!(results[0].id, 0);
//! # Ok(())
//! # }
//! ```

mod distance;
mod hnsw;
mod types;

pub use distance::Metric;
pub use hnsw::{DEFAULT_EF_SEARCH, HnswConfig, HnswIndex, INDEX_FORMAT_VERSION};
pub use types::{SearchResult, VectorId};

/// Errors that can occur during index operations
#[derive(Debug, thiserror::Error)]
pub enum VectorError {
    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Vector id {0} already exists")]
    DuplicateId(VectorId),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

pub type Result<T> = std::result::Result<T, VectorError>;
