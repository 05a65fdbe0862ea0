//! Property-based tests for the collection layer
//!
//! Uses proptest to verify id-mapping and retrieval invariants with random
//! inputs

use beryl_db::{Collection, HnswConfig, Metric, PersistenceManager};
use proptest::prelude::*;
use std::collections::HashMap;
use tempfile::TempDir;

fn vector_strategy(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-1.0f32..1.0f32, dim..=dim)
}

fn batch_strategy(dim: usize, max: usize) -> impl Strategy<Value = HashMap<u64, Vec<f32>>> {
    prop::collection::hash_map(any::<u64>(), vector_strategy(dim), 1..max)
}

proptest! {
    /// Property: get returns byte-identical floats for everything inserted,
    /// and count tracks the number of live entries
    #[test]
    fn test_get_round_trip_identity(batch in batch_strategy(8, 40)) {
        let mut collection =
            Collection::new("prop", 8, Metric::L2, HnswConfig::default()).unwrap();

        for (id, vector) in &batch {
            collection.insert(*id, vector).unwrap();
        }

        prop_assert_eq!(collection.count(), batch.len());
        for (id, vector) in &batch {
            let got = collection.get(*id);
            prop_assert_eq!(got.as_ref(), Some(vector));
            prop_assert!(collection.contains(*id));
        }
    }

    /// Property: deleting a subset removes exactly that subset, from both
    /// retrieval and search
    #[test]
    fn test_delete_subset(
        batch in batch_strategy(4, 30),
        selector in any::<u64>(),
    ) {
        let mut collection =
            Collection::new("prop", 4, Metric::L2, HnswConfig::default()).unwrap();

        for (id, vector) in &batch {
            collection.insert(*id, vector).unwrap();
        }

        let doomed: Vec<u64> = batch
            .keys()
            .copied()
            .filter(|id| id.wrapping_add(selector) % 2 == 0)
            .collect();
        for id in &doomed {
            prop_assert!(collection.delete(*id));
            prop_assert!(!collection.delete(*id), "Second delete must report absent");
        }

        prop_assert_eq!(collection.count(), batch.len() - doomed.len());

        for (id, vector) in &batch {
            if doomed.contains(id) {
                prop_assert_eq!(collection.get(*id), None);
                let results = collection.search(vector, batch.len(), None).unwrap();
                prop_assert!(!results.iter().any(|r| r.id == *id));
            } else {
                prop_assert!(collection.contains(*id));
            }
        }
    }

    /// Property: a collection survives a save/load cycle with identical
    /// contents and identical search answers
    #[test]
    fn test_save_load_identity(
        batch in batch_strategy(4, 25),
        queries in prop::collection::vec(vector_strategy(4), 1..5),
    ) {
        let dir = TempDir::new().unwrap();
        let pm = PersistenceManager::new(dir.path()).unwrap();

        let mut original =
            Collection::new("prop", 4, Metric::Cosine, HnswConfig::default()).unwrap();
        for (id, vector) in &batch {
            original.insert(*id, vector).unwrap();
        }

        pm.save_collection(&original).unwrap();
        let loaded = pm.load_collection("prop").unwrap().unwrap();

        prop_assert_eq!(loaded.count(), original.count());
        for (id, vector) in &batch {
            let got = loaded.get(*id);
            prop_assert_eq!(got.as_ref(), Some(vector));
        }
        for query in &queries {
            prop_assert_eq!(
                original.search(query, 10, None).unwrap(),
                loaded.search(query, 10, None).unwrap()
            );
        }
    }
}
