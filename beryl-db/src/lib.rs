//! BerylDB - an embedded vector database
//!
//! BerylDB organizes fixed-dimension `f32` vectors into named collections,
//! serves approximate nearest neighbor queries through the HNSW index in
//! `beryl-vector`, and checkpoints everything to disk in a crash-safe
//! three-file-per-collection layout.
//!
//! # Features
//!
//! - **Named Collections**: each with its own dimension, metric, and index
//! - **User Ids**: caller-chosen 64-bit ids, remapped internally so the index
//!   never sees them
//! - **Exact Retrieval**: `get` returns the very floats that were inserted,
//!   independent of what the index does to them
//! - **Durable State**: atomic writes, versioned formats, strict
//!   cross-validation on load
//!
//! # Example
//!
//! ```rust,no_run
//! use beryl_db::{Database, Metric};
//!
//! # fn main() -> beryl_db::Result<()> {
//! let db = Database::open("./my_database")?;
//!
//! let collection = db.create_collection("documents", 3, Metric::Cosine, None)?;
//! {
//!     let mut collection = collection.lock();
//!     collection.insert(1001, &[0.1, 0.2, 0.3])?;
//!     collection.insert(1002, &[0.3, 0.2, 0.1])?;
//!
//!     for hit in collection.search(&[0.1, 0.2, 0.3], 5, None)? {
//!         println!("id: {}, distance: {}", hit.id, hit.distance);
//!     }
//! }
//!
//! db.close()?;
//! # Ok(())
//! # }
//! ```

mod collection;
mod database;
mod persistence;

pub use beryl_vector::{
    DEFAULT_EF_SEARCH, HnswConfig, Metric, SearchResult, VectorError, VectorId,
};
pub use collection::Collection;
pub use database::{CollectionHandle, Database};
pub use persistence::{CollectionMeta, DatabaseMeta, FILE_FORMAT_VERSION, PersistenceManager};

/// Errors that can occur during database operations
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Collection '{0}' already exists")]
    CollectionExists(String),

    #[error("Collection '{0}' not found")]
    CollectionNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Vector(#[from] VectorError),
}

pub type Result<T> = std::result::Result<T, DbError>;
