//! Database registry: the public entry point
//!
//! A `Database` owns the name→collection map and the persistence manager.
//! Collections are handed out behind `Arc<Mutex<_>>` so operations within one
//! collection are mutually exclusive while distinct collections proceed in
//! parallel; the registry map itself is reader-writer guarded so lookups can
//! run concurrently and create/delete exclude everything.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};

use beryl_vector::{HnswConfig, Metric};

use crate::collection::Collection;
use crate::persistence::PersistenceManager;
use crate::{DbError, Result};

/// Shared handle to a collection. Lock it to operate; hold the lock for the
/// duration of one logical operation only.
pub type CollectionHandle = Arc<Mutex<Collection>>;

/// An embedded vector database: a registry of named collections with durable
/// on-disk state.
///
/// Dropping a database that was not explicitly closed performs a best-effort
/// save. Prefer [`Database::close`] or [`Database::with`], which report
/// persistence failures instead of just logging them.
pub struct Database {
    path: PathBuf,
    persistence: PersistenceManager,
    collections: RwLock<HashMap<String, CollectionHandle>>,
    closed: AtomicBool,
}

impl Database {
    /// Open a database directory, creating it if needed and loading every
    /// collection already persisted there.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let persistence = PersistenceManager::new(&path)?;

        let mut collections = HashMap::new();
        for name in persistence.list_collections()? {
            if let Some(collection) = persistence.load_collection(&name)? {
                collections.insert(name, Arc::new(Mutex::new(collection)));
            }
        }

        tracing::info!(
            path = %path.display(),
            collections = collections.len(),
            "Opened database"
        );

        Ok(Self {
            path,
            persistence,
            collections: RwLock::new(collections),
            closed: AtomicBool::new(false),
        })
    }

    /// Run `f` against a freshly opened database and guarantee a save on both
    /// the normal and the error exit path. An error from `f` is propagated
    /// unchanged; a save failure surfaces only when `f` itself succeeded.
    pub fn with<P, T, F>(path: P, f: F) -> Result<T>
    where
        P: AsRef<Path>,
        F: FnOnce(&Database) -> Result<T>,
    {
        let db = Database::open(path)?;
        let result = f(&db);
        let saved = db.close();
        match result {
            Ok(value) => saved.map(|()| value),
            Err(e) => Err(e),
        }
    }

    /// Get the database directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create a new collection.
    ///
    /// Pass `None` for `config` to use the default HNSW parameters.
    pub fn create_collection(
        &self,
        name: &str,
        dimension: usize,
        metric: Metric,
        config: Option<HnswConfig>,
    ) -> Result<CollectionHandle> {
        let mut collections = self.collections.write();
        if collections.contains_key(name) {
            return Err(DbError::CollectionExists(name.to_string()));
        }

        let collection = Collection::new(name, dimension, metric, config.unwrap_or_default())?;
        let handle = Arc::new(Mutex::new(collection));
        collections.insert(name.to_string(), handle.clone());

        tracing::debug!(collection = name, dimension, %metric, "Created collection");
        Ok(handle)
    }

    /// Get an existing collection by name.
    pub fn get_collection(&self, name: &str) -> Result<CollectionHandle> {
        self.collections
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| DbError::CollectionNotFound(name.to_string()))
    }

    /// Delete a collection from memory and disk.
    ///
    /// Returns true if anything was removed. A collection absent from memory
    /// still gets its on-disk files unlinked, covering orphans left behind by
    /// a partial save.
    pub fn delete_collection(&self, name: &str) -> Result<bool> {
        let mut collections = self.collections.write();
        let removed_from_memory = collections.remove(name).is_some();
        let removed_from_disk = self.persistence.delete_collection(name)?;
        Ok(removed_from_memory || removed_from_disk)
    }

    /// List all collection names, sorted.
    pub fn list_collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a collection exists
    pub fn contains(&self, name: &str) -> bool {
        self.collections.read().contains_key(name)
    }

    /// Get the number of collections
    pub fn len(&self) -> usize {
        self.collections.read().len()
    }

    /// Check if the database holds no collections
    pub fn is_empty(&self) -> bool {
        self.collections.read().is_empty()
    }

    /// Persist all collections to disk, modified or not.
    ///
    /// Each collection is held exclusively while its snapshot is serialized,
    /// so the on-disk state is the logical state at that moment.
    pub fn save(&self) -> Result<()> {
        let collections = self.collections.read();

        self.persistence.save_metadata({
            let mut names: Vec<String> = collections.keys().cloned().collect();
            names.sort();
            names
        })?;

        for handle in collections.values() {
            let collection = handle.lock();
            self.persistence.save_collection(&collection)?;
        }

        tracing::info!(collections = collections.len(), "Saved database");
        Ok(())
    }

    /// Save and consume the database.
    pub fn close(self) -> Result<()> {
        self.closed.store(true, Ordering::Relaxed);
        self.save()
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if !self.closed.load(Ordering::Relaxed)
            && let Err(e) = self.save()
        {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to save database on drop"
            );
        }
    }
}
