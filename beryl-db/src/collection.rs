//! Named collections of vectors
//!
//! A collection owns one HNSW index and the mapping between caller-chosen
//! user ids and the internal ids the index is keyed by. It validates every
//! input before the index sees it, and it keeps a verbatim copy of each
//! inserted vector so `get` can return exactly what was stored regardless of
//! how the index arranges its own data.

use std::collections::HashMap;

use beryl_vector::{DEFAULT_EF_SEARCH, HnswConfig, HnswIndex, Metric, SearchResult, VectorError, VectorId};

use crate::Result;

/// A named collection of vectors with a fixed dimension and metric.
///
/// Internal ids are assigned monotonically starting at zero and are never
/// reused, even after a delete. For live entries `user_to_internal` and
/// `internal_to_user` are mutual inverses of equal size.
#[derive(Debug)]
pub struct Collection {
    name: String,
    dimension: usize,
    metric: Metric,
    index: HnswIndex,
    user_to_internal: HashMap<u64, VectorId>,
    internal_to_user: HashMap<VectorId, u64>,
    /// Original vectors keyed by user id, for byte-exact retrieval
    vectors: HashMap<u64, Vec<f32>>,
    next_internal_id: VectorId,
}

impl Collection {
    /// Create a new empty collection.
    pub fn new(
        name: impl Into<String>,
        dimension: usize,
        metric: Metric,
        config: HnswConfig,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(crate::DbError::InvalidArgument(
                "Collection name cannot be empty".to_string(),
            ));
        }

        let index = HnswIndex::new(dimension, metric, config)?;

        Ok(Self {
            name,
            dimension,
            metric,
            index,
            user_to_internal: HashMap::new(),
            internal_to_user: HashMap::new(),
            vectors: HashMap::new(),
            next_internal_id: 0,
        })
    }

    /// Get the collection name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the fixed vector dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Get the distance metric
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Get the number of live vectors
    pub fn count(&self) -> usize {
        self.user_to_internal.len()
    }

    /// Alias for [`Collection::count`]
    pub fn len(&self) -> usize {
        self.count()
    }

    /// Check if the collection holds no vectors
    pub fn is_empty(&self) -> bool {
        self.user_to_internal.is_empty()
    }

    /// Insert a vector under a caller-chosen user id.
    ///
    /// Fails with `DimensionMismatch` for wrong-length vectors and
    /// `DuplicateId` if the user id is live; neither failure mutates state.
    pub fn insert(&mut self, user_id: u64, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            }
            .into());
        }
        if self.user_to_internal.contains_key(&user_id) {
            return Err(VectorError::DuplicateId(user_id).into());
        }

        let internal_id = self.next_internal_id;
        self.index.add(internal_id, vector)?;

        self.next_internal_id += 1;
        self.user_to_internal.insert(user_id, internal_id);
        self.internal_to_user.insert(internal_id, user_id);
        self.vectors.insert(user_id, vector.to_vec());
        Ok(())
    }

    /// Search for the k nearest neighbors of a query vector.
    ///
    /// Results carry user ids, ordered as the index returned them. Pass
    /// `None` for `ef_search` to use [`DEFAULT_EF_SEARCH`].
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        ef_search: Option<usize>,
    ) -> Result<Vec<SearchResult>> {
        if query.len() != self.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            }
            .into());
        }

        let ef = ef_search.unwrap_or(DEFAULT_EF_SEARCH);
        let hits = self.index.search(query, k, ef)?;

        // Rewrite internal ids to user ids, dropping any hit whose internal
        // id has no inverse entry (a concurrent reader racing a delete)
        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                self.internal_to_user
                    .get(&hit.id)
                    .map(|&user_id| SearchResult::new(user_id, hit.distance))
            })
            .collect())
    }

    /// Delete a vector by user id.
    ///
    /// Returns true if the vector was found and deleted, false otherwise.
    pub fn delete(&mut self, user_id: u64) -> bool {
        let Some(internal_id) = self.user_to_internal.remove(&user_id) else {
            return false;
        };
        self.internal_to_user.remove(&internal_id);
        self.vectors.remove(&user_id);
        self.index.remove(internal_id);
        true
    }

    /// Retrieve a copy of the stored vector for a user id.
    pub fn get(&self, user_id: u64) -> Option<Vec<f32>> {
        self.vectors.get(&user_id).cloned()
    }

    /// Check if a user id exists in the collection
    pub fn contains(&self, user_id: u64) -> bool {
        self.user_to_internal.contains_key(&user_id)
    }

    // Internal accessors for persistence support

    pub(crate) fn index(&self) -> &HnswIndex {
        &self.index
    }

    pub(crate) fn user_to_internal(&self) -> &HashMap<u64, VectorId> {
        &self.user_to_internal
    }

    pub(crate) fn raw_vectors(&self) -> &HashMap<u64, Vec<f32>> {
        &self.vectors
    }

    pub(crate) fn next_internal_id(&self) -> VectorId {
        self.next_internal_id
    }

    /// Reconstruct a collection from persisted state. The caller has already
    /// cross-validated the parts against each other.
    pub(crate) fn from_parts(
        name: String,
        dimension: usize,
        metric: Metric,
        index: HnswIndex,
        user_to_internal: HashMap<u64, VectorId>,
        internal_to_user: HashMap<VectorId, u64>,
        vectors: HashMap<u64, Vec<f32>>,
        next_internal_id: VectorId,
    ) -> Self {
        Self {
            name,
            dimension,
            metric,
            index,
            user_to_internal,
            internal_to_user,
            vectors,
            next_internal_id,
        }
    }
}
