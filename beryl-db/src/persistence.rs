//! On-disk persistence for collections
//!
//! File structure:
//!
//! ```text
//! db_path/
//! ├── metadata.json          # Database-level metadata
//! └── collections/
//!     ├── {name}.hnsw        # Serialized HNSW index (binary)
//!     ├── {name}.meta        # Collection metadata (JSON)
//!     └── {name}.vectors     # Original vectors + id mappings (binary)
//! ```
//!
//! Every write goes to a `.tmp` sibling, is flushed and fsync'd, then renamed
//! over the target, so a crash can leave a stale or missing file but never a
//! torn one. The three files of a collection are not written atomically as a
//! group; instead the loader refuses any trio that fails cross-validation.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use beryl_vector::{HnswIndex, Metric, VectorId};

use crate::collection::Collection;
use crate::{DbError, Result};

/// Version of the `.meta`, `.vectors` and `metadata.json` formats. The
/// `.hnsw` blob carries its own independent version.
pub const FILE_FORMAT_VERSION: u32 = 1;

/// Collection metadata stored as `{name}.meta`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionMeta {
    pub version: u32,
    pub name: String,
    pub dimension: usize,
    pub metric: Metric,
    pub count: usize,
    pub next_internal_id: u64,
}

/// Database-level metadata stored as `metadata.json`.
///
/// The collections list is advisory; the authoritative set comes from
/// scanning `collections/*.meta`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseMeta {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub collections: Vec<String>,
}

/// Manages persistence of collections under one database directory
pub struct PersistenceManager {
    db_path: PathBuf,
    collections_path: PathBuf,
}

impl PersistenceManager {
    /// Create a persistence manager rooted at `db_path`, creating the
    /// directory layout if needed.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        let collections_path = db_path.join("collections");

        fs::create_dir_all(&db_path)?;
        fs::create_dir_all(&collections_path)?;

        Ok(Self {
            db_path,
            collections_path,
        })
    }

    /// Save a single collection to disk.
    pub fn save_collection(&self, collection: &Collection) -> Result<()> {
        let name = collection.name();

        let hnsw_data = collection.index().serialize();
        self.atomic_write(&self.collection_file(name, "hnsw"), &hnsw_data)?;

        let meta = CollectionMeta {
            version: FILE_FORMAT_VERSION,
            name: name.to_string(),
            dimension: collection.dimension(),
            metric: collection.metric(),
            count: collection.count(),
            next_internal_id: collection.next_internal_id(),
        };
        let meta_json = serde_json::to_vec_pretty(&meta)
            .map_err(|e| DbError::Deserialization(format!("Failed to encode metadata: {e}")))?;
        self.atomic_write(&self.collection_file(name, "meta"), &meta_json)?;

        let vectors_data = serialize_vectors(collection);
        self.atomic_write(&self.collection_file(name, "vectors"), &vectors_data)?;

        tracing::debug!(
            collection = name,
            count = collection.count(),
            "Saved collection"
        );
        Ok(())
    }

    /// Load a collection by name.
    ///
    /// Returns `Ok(None)` unless all three files are present. Raises
    /// `Deserialization` for files that are present but corrupt, stale, or
    /// inconsistent with each other.
    pub fn load_collection(&self, name: &str) -> Result<Option<Collection>> {
        let meta_path = self.collection_file(name, "meta");
        let hnsw_path = self.collection_file(name, "hnsw");
        let vectors_path = self.collection_file(name, "vectors");

        if !(meta_path.exists() && hnsw_path.exists() && vectors_path.exists()) {
            return Ok(None);
        }

        let meta_bytes = fs::read(&meta_path)?;
        let meta: CollectionMeta = serde_json::from_slice(&meta_bytes).map_err(|e| {
            DbError::Deserialization(format!("Corrupt metadata file for collection '{name}': {e}"))
        })?;

        if meta.version > FILE_FORMAT_VERSION {
            return Err(DbError::Deserialization(format!(
                "File format version {} is newer than supported {FILE_FORMAT_VERSION}",
                meta.version
            )));
        }

        let hnsw_bytes = fs::read(&hnsw_path)?;
        let index = HnswIndex::deserialize(&hnsw_bytes).map_err(|e| {
            DbError::Deserialization(format!("Corrupt index file for collection '{name}': {e}"))
        })?;

        // The index header must agree with the metadata it was saved with
        if index.dimension() != meta.dimension {
            return Err(DbError::Deserialization(format!(
                "Index dimension {} does not match metadata dimension {} for collection '{name}'",
                index.dimension(),
                meta.dimension
            )));
        }
        if index.metric() != meta.metric {
            return Err(DbError::Deserialization(format!(
                "Index metric {} does not match metadata metric {} for collection '{name}'",
                index.metric(),
                meta.metric
            )));
        }

        let vectors_bytes = fs::read(&vectors_path)?;
        let (user_to_internal, internal_to_user, vectors) =
            deserialize_vectors(&vectors_bytes, meta.dimension, meta.count).map_err(|e| {
                match e {
                    DbError::Deserialization(msg) => DbError::Deserialization(format!(
                        "Corrupt vectors file for collection '{name}': {msg}"
                    )),
                    other => other,
                }
            })?;

        for &internal_id in internal_to_user.keys() {
            if internal_id >= meta.next_internal_id {
                return Err(DbError::Deserialization(format!(
                    "Internal id {internal_id} is not below next_internal_id {} for collection '{name}'",
                    meta.next_internal_id
                )));
            }
            if !index.contains(internal_id) {
                return Err(DbError::Deserialization(format!(
                    "Internal id {internal_id} is missing from the index for collection '{name}'"
                )));
            }
        }

        tracing::debug!(collection = name, count = meta.count, "Loaded collection");

        Ok(Some(Collection::from_parts(
            meta.name,
            meta.dimension,
            meta.metric,
            index,
            user_to_internal,
            internal_to_user,
            vectors,
            meta.next_internal_id,
        )))
    }

    /// Delete collection files from disk. Missing files are tolerated.
    ///
    /// Returns true if any file was deleted.
    pub fn delete_collection(&self, name: &str) -> Result<bool> {
        let mut deleted_any = false;
        for extension in ["meta", "hnsw", "vectors"] {
            let path = self.collection_file(name, extension);
            match fs::remove_file(&path) {
                Ok(()) => deleted_any = true,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(deleted_any)
    }

    /// List all persisted collection names, sorted.
    pub fn list_collections(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.collections_path)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("meta")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Save database-level metadata.
    pub fn save_metadata(&self, collections: Vec<String>) -> Result<()> {
        let meta = DatabaseMeta {
            version: FILE_FORMAT_VERSION,
            collections,
        };
        let data = serde_json::to_vec_pretty(&meta)
            .map_err(|e| DbError::Deserialization(format!("Failed to encode metadata: {e}")))?;
        self.atomic_write(&self.db_path.join("metadata.json"), &data)
    }

    /// Load database-level metadata. Missing or unreadable metadata is
    /// advisory only, so it degrades to the default.
    pub fn load_metadata(&self) -> DatabaseMeta {
        let path = self.db_path.join("metadata.json");
        fs::read(&path)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .unwrap_or_default()
    }

    fn collection_file(&self, name: &str, extension: &str) -> PathBuf {
        self.collections_path.join(format!("{name}.{extension}"))
    }

    /// Write data to a file atomically: write to `{path}.tmp`, flush, fsync,
    /// then rename over the target.
    fn atomic_write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let tmp_path = path.with_extension(format!("{extension}.tmp"));

        let mut file = File::create(&tmp_path)?;
        file.write_all(data)?;
        file.flush()?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

/// Serialize vectors and id mappings to the binary `.vectors` format.
///
/// Layout (little-endian):
///
/// ```text
/// [version: u32][count: u64][dimension: u32]
/// per record: [user_id: u64][internal_id: u64][f32 x dimension]
/// ```
///
/// Records are written in ascending internal-id order for reproducible bytes.
fn serialize_vectors(collection: &Collection) -> Vec<u8> {
    let vectors = collection.raw_vectors();
    let dimension = collection.dimension();

    let mut records: Vec<(u64, VectorId)> = collection
        .user_to_internal()
        .iter()
        .map(|(&user_id, &internal_id)| (user_id, internal_id))
        .collect();
    records.sort_by_key(|&(_, internal_id)| internal_id);

    let mut data = Vec::with_capacity(16 + records.len() * (16 + dimension * 4));
    data.extend_from_slice(&FILE_FORMAT_VERSION.to_le_bytes());
    data.extend_from_slice(&(records.len() as u64).to_le_bytes());
    data.extend_from_slice(&(dimension as u32).to_le_bytes());

    for (user_id, internal_id) in records {
        data.extend_from_slice(&user_id.to_le_bytes());
        data.extend_from_slice(&internal_id.to_le_bytes());
        for &value in &vectors[&user_id] {
            data.extend_from_slice(&value.to_le_bytes());
        }
    }

    data
}

type VectorState = (
    HashMap<u64, VectorId>,
    HashMap<VectorId, u64>,
    HashMap<u64, Vec<f32>>,
);

/// Deserialize the `.vectors` format, verifying the exact file length and the
/// user↔internal bijection.
fn deserialize_vectors(
    data: &[u8],
    expected_dimension: usize,
    expected_count: usize,
) -> Result<VectorState> {
    if data.len() < 16 {
        return Err(DbError::Deserialization("File too small".to_string()));
    }

    let version = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let count = u64::from_le_bytes([
        data[4], data[5], data[6], data[7], data[8], data[9], data[10], data[11],
    ]) as usize;
    let dimension = u32::from_le_bytes([data[12], data[13], data[14], data[15]]) as usize;

    if version > FILE_FORMAT_VERSION {
        return Err(DbError::Deserialization(format!(
            "Version {version} is newer than supported {FILE_FORMAT_VERSION}"
        )));
    }
    if dimension != expected_dimension {
        return Err(DbError::Deserialization(format!(
            "Dimension mismatch: file has {dimension}, expected {expected_dimension}"
        )));
    }
    if count != expected_count {
        return Err(DbError::Deserialization(format!(
            "Count mismatch: file has {count}, expected {expected_count}"
        )));
    }

    let expected_size = dimension
        .checked_mul(4)
        .and_then(|n| n.checked_add(16))
        .and_then(|record_size| count.checked_mul(record_size))
        .and_then(|n| n.checked_add(16));
    if expected_size != Some(data.len()) {
        return Err(DbError::Deserialization(format!(
            "File length {} does not match header (count {count}, dimension {dimension})",
            data.len()
        )));
    }

    let mut user_to_internal = HashMap::with_capacity(count);
    let mut internal_to_user = HashMap::with_capacity(count);
    let mut vectors = HashMap::with_capacity(count);

    // The exact-length check above guarantees every slice below is in bounds
    let mut offset = 16;
    for _ in 0..count {
        let user_id = read_u64_at(data, offset);
        let internal_id = read_u64_at(data, offset + 8);
        offset += 16;

        let mut vector = Vec::with_capacity(dimension);
        for _ in 0..dimension {
            vector.push(read_f32_at(data, offset));
            offset += 4;
        }

        if user_to_internal.insert(user_id, internal_id).is_some() {
            return Err(DbError::Deserialization(format!(
                "Duplicate user id {user_id}"
            )));
        }
        if internal_to_user.insert(internal_id, user_id).is_some() {
            return Err(DbError::Deserialization(format!(
                "Duplicate internal id {internal_id}"
            )));
        }
        vectors.insert(user_id, vector);
    }

    Ok((user_to_internal, internal_to_user, vectors))
}

fn read_u64_at(data: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[offset..offset + 8]);
    u64::from_le_bytes(bytes)
}

fn read_f32_at(data: &[u8], offset: usize) -> f32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&data[offset..offset + 4]);
    f32::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use beryl_vector::HnswConfig;
    use tempfile::TempDir;

    fn sample_collection(name: &str, metric: Metric) -> Collection {
        let mut c = Collection::new(name, 3, metric, HnswConfig::default()).unwrap();
        c.insert(10, &[1.0, 0.0, 0.0]).unwrap();
        c.insert(20, &[0.0, 1.0, 0.0]).unwrap();
        c.insert(30, &[0.0, 0.0, 1.0]).unwrap();
        c.delete(20);
        c
    }

    fn has_tmp_files(dir: &Path) -> bool {
        fs::read_dir(dir).unwrap().any(|entry| {
            entry
                .unwrap()
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == "tmp")
        })
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let pm = PersistenceManager::new(dir.path()).unwrap();

        let original = sample_collection("docs", Metric::L2);
        pm.save_collection(&original).unwrap();

        let loaded = pm.load_collection("docs").unwrap().unwrap();
        assert_eq!(loaded.name(), "docs");
        assert_eq!(loaded.dimension(), 3);
        assert_eq!(loaded.metric(), Metric::L2);
        assert_eq!(loaded.count(), 2);
        assert_eq!(loaded.next_internal_id(), 3);
        assert_eq!(loaded.get(10), Some(vec![1.0, 0.0, 0.0]));
        assert_eq!(loaded.get(20), None);

        assert_eq!(
            original.search(&[1.0, 0.0, 0.0], 3, None).unwrap(),
            loaded.search(&[1.0, 0.0, 0.0], 3, None).unwrap()
        );
    }

    #[test]
    fn test_no_tmp_files_after_save() {
        let dir = TempDir::new().unwrap();
        let pm = PersistenceManager::new(dir.path()).unwrap();
        pm.save_collection(&sample_collection("docs", Metric::Cosine)).unwrap();
        pm.save_metadata(vec!["docs".to_string()]).unwrap();

        assert!(!has_tmp_files(dir.path()));
        assert!(!has_tmp_files(&dir.path().join("collections")));
    }

    #[test]
    fn test_load_missing_collection() {
        let dir = TempDir::new().unwrap();
        let pm = PersistenceManager::new(dir.path()).unwrap();
        assert!(pm.load_collection("nope").unwrap().is_none());
    }

    #[test]
    fn test_load_with_one_file_missing_is_absent() {
        let dir = TempDir::new().unwrap();
        let pm = PersistenceManager::new(dir.path()).unwrap();
        pm.save_collection(&sample_collection("docs", Metric::L2)).unwrap();

        for extension in ["meta", "hnsw", "vectors"] {
            fs::remove_file(pm.collection_file("docs", extension)).unwrap();
            assert!(pm.load_collection("docs").unwrap().is_none());
            // Put everything back for the next round
            pm.save_collection(&sample_collection("docs", Metric::L2)).unwrap();
        }
    }

    #[test]
    fn test_load_rejects_corrupt_meta() {
        let dir = TempDir::new().unwrap();
        let pm = PersistenceManager::new(dir.path()).unwrap();
        pm.save_collection(&sample_collection("docs", Metric::L2)).unwrap();

        fs::write(pm.collection_file("docs", "meta"), b"{not json").unwrap();
        assert!(matches!(
            pm.load_collection("docs"),
            Err(DbError::Deserialization(_))
        ));
    }

    #[test]
    fn test_load_rejects_newer_meta_version() {
        let dir = TempDir::new().unwrap();
        let pm = PersistenceManager::new(dir.path()).unwrap();
        let collection = sample_collection("docs", Metric::L2);
        pm.save_collection(&collection).unwrap();

        let meta_path = pm.collection_file("docs", "meta");
        let mut meta: CollectionMeta =
            serde_json::from_slice(&fs::read(&meta_path).unwrap()).unwrap();
        meta.version = FILE_FORMAT_VERSION + 1;
        fs::write(&meta_path, serde_json::to_vec(&meta).unwrap()).unwrap();

        assert!(matches!(
            pm.load_collection("docs"),
            Err(DbError::Deserialization(_))
        ));
    }

    #[test]
    fn test_load_rejects_truncated_vectors() {
        let dir = TempDir::new().unwrap();
        let pm = PersistenceManager::new(dir.path()).unwrap();
        pm.save_collection(&sample_collection("docs", Metric::L2)).unwrap();

        let vectors_path = pm.collection_file("docs", "vectors");
        let bytes = fs::read(&vectors_path).unwrap();
        fs::write(&vectors_path, &bytes[..bytes.len() - 4]).unwrap();

        assert!(matches!(
            pm.load_collection("docs"),
            Err(DbError::Deserialization(_))
        ));
    }

    #[test]
    fn test_load_rejects_broken_bijection() {
        let dir = TempDir::new().unwrap();
        let pm = PersistenceManager::new(dir.path()).unwrap();

        let mut c = Collection::new("docs", 2, Metric::L2, HnswConfig::default()).unwrap();
        c.insert(10, &[1.0, 0.0]).unwrap();
        c.insert(20, &[0.0, 1.0]).unwrap();
        pm.save_collection(&c).unwrap();

        // Rewrite the second record's internal id (offset: 16-byte header +
        // one 24-byte record + 8-byte user id) to collide with the first
        let vectors_path = pm.collection_file("docs", "vectors");
        let mut bytes = fs::read(&vectors_path).unwrap();
        bytes[48..56].copy_from_slice(&0u64.to_le_bytes());
        fs::write(&vectors_path, &bytes).unwrap();

        assert!(matches!(
            pm.load_collection("docs"),
            Err(DbError::Deserialization(_))
        ));
    }

    #[test]
    fn test_load_rejects_metric_mismatch_between_files() {
        let dir = TempDir::new().unwrap();
        let pm = PersistenceManager::new(dir.path()).unwrap();

        pm.save_collection(&sample_collection("l2", Metric::L2)).unwrap();
        pm.save_collection(&sample_collection("cos", Metric::Cosine)).unwrap();

        // Swap in the wrong index file; its header says l2, the meta says cosine
        fs::copy(
            pm.collection_file("l2", "hnsw"),
            pm.collection_file("cos", "hnsw"),
        )
        .unwrap();

        assert!(matches!(
            pm.load_collection("cos"),
            Err(DbError::Deserialization(_))
        ));
    }

    #[test]
    fn test_delete_collection() {
        let dir = TempDir::new().unwrap();
        let pm = PersistenceManager::new(dir.path()).unwrap();
        pm.save_collection(&sample_collection("docs", Metric::L2)).unwrap();

        assert!(pm.delete_collection("docs").unwrap());
        assert!(!pm.collection_file("docs", "meta").exists());
        assert!(!pm.collection_file("docs", "hnsw").exists());
        assert!(!pm.collection_file("docs", "vectors").exists());

        // Nothing left to delete
        assert!(!pm.delete_collection("docs").unwrap());
    }

    #[test]
    fn test_list_collections_sorted() {
        let dir = TempDir::new().unwrap();
        let pm = PersistenceManager::new(dir.path()).unwrap();

        for name in ["zebra", "alpha", "mango"] {
            pm.save_collection(&sample_collection(name, Metric::L2)).unwrap();
        }

        assert_eq!(
            pm.list_collections().unwrap(),
            vec!["alpha".to_string(), "mango".to_string(), "zebra".to_string()]
        );
    }

    #[test]
    fn test_metadata_round_trip_and_tolerant_load() {
        let dir = TempDir::new().unwrap();
        let pm = PersistenceManager::new(dir.path()).unwrap();

        // Missing metadata degrades to the default
        assert!(pm.load_metadata().collections.is_empty());

        pm.save_metadata(vec!["a".to_string(), "b".to_string()]).unwrap();
        let meta = pm.load_metadata();
        assert_eq!(meta.version, FILE_FORMAT_VERSION);
        assert_eq!(meta.collections, vec!["a".to_string(), "b".to_string()]);

        // Unreadable metadata also degrades to the default
        fs::write(dir.path().join("metadata.json"), b"garbage").unwrap();
        assert!(pm.load_metadata().collections.is_empty());
    }
}
