//! Identifier and search result types

use serde::{Deserialize, Serialize};

/// Identifier for a vector stored in an index.
///
/// Assigned by the owning collection, monotonically increasing and never
/// reused after a removal.
pub type VectorId = u64;

/// Result of a vector similarity search
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SearchResult {
    /// The id of the found vector
    pub id: VectorId,
    /// Distance to the query under the index metric; lower is more similar
    pub distance: f32,
}

impl SearchResult {
    pub fn new(id: VectorId, distance: f32) -> Self {
        Self { id, distance }
    }
}

impl PartialEq for SearchResult {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for SearchResult {}

impl PartialOrd for SearchResult {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SearchResult {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Ascending by distance, ties broken by ascending id
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.id.cmp(&other.id))
    }
}
