//! HNSW (Hierarchical Navigable Small World) index implementation
//!
//! HNSW is a graph-based algorithm for approximate nearest neighbor search.
//! It builds a multi-layer graph where:
//! - Layer 0 contains all vectors
//! - Higher layers contain progressively fewer vectors
//! - Each vector connects to M neighbors at each layer
//!
//! Search starts at the top layer and greedily navigates to the nearest neighbors,
//! descending through layers until reaching layer 0.
//!
//! Removal is lazy: a removed vector keeps its node and edges so the graph stays
//! connected, and is only filtered out when results are emitted.

use crate::{Metric, Result, SearchResult, VectorError, VectorId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Default search width when the caller does not tune it per query
pub const DEFAULT_EF_SEARCH: usize = 50;

/// Version of the binary index format written by [`HnswIndex::serialize`]
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// Magic tag at the start of every serialized index
const INDEX_MAGIC: [u8; 4] = *b"BHNW";

/// Serialized stand-in for "no entry point". Internal ids are assigned
/// monotonically from zero, so this value is never a real id.
const NO_ENTRY_POINT: u64 = u64::MAX;

/// Hard ceiling on assigned layers, preventing degenerate level draws
const MAX_LEVEL: usize = 16;

/// Default seed for the level-assignment PRNG
const DEFAULT_SEED: u64 = 42;

/// Configuration for HNSW index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HnswConfig {
    /// Maximum number of bi-directional links per element per layer (M)
    /// Typical values: 5-48
    /// Higher M = better recall, more memory, slower insertions
    pub max_connections: usize,

    /// Maximum number of connections for layer 0 (typically M * 2)
    pub max_connections_layer0: usize,

    /// Size of the dynamic candidate list during construction (ef_construction)
    /// Typical values: 100-500
    /// Higher ef_construction = better quality index, slower construction
    pub ef_construction: usize,

    /// Normalization factor for level selection (ml)
    /// Typically 1.0 / ln(M)
    pub level_multiplier: f64,

    /// Seed for the level-assignment PRNG. Insert order plus seed determines
    /// the graph exactly.
    pub seed: u64,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self::new(16, 200)
    }
}

impl HnswConfig {
    /// Create a configuration from M and ef_construction, deriving the
    /// layer-0 cap and level multiplier.
    pub fn new(max_connections: usize, ef_construction: usize) -> Self {
        let level_multiplier = if max_connections > 1 {
            1.0 / (max_connections as f64).ln()
        } else {
            0.0
        };
        Self {
            max_connections,
            max_connections_layer0: max_connections * 2,
            ef_construction,
            level_multiplier,
            seed: DEFAULT_SEED,
        }
    }

    /// Replace the level-assignment seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Create a fast configuration (less accuracy, faster search)
    pub fn fast() -> Self {
        Self::new(8, 100)
    }

    /// Create a balanced configuration (default)
    pub fn balanced() -> Self {
        Self::default()
    }

    /// Create a high-quality configuration (better accuracy, slower search)
    pub fn high_quality() -> Self {
        Self::new(32, 400)
    }
}

/// A node in the HNSW graph
#[derive(Debug, Clone)]
struct HnswNode {
    /// The stored vector
    vector: Vec<f32>,
    /// Layer at which this node was inserted
    level: usize,
    /// Connections at each layer (index = layer, 0..=level)
    neighbors: Vec<Vec<VectorId>>,
    /// Lazy deletion flag; a removed node stays in the graph as a waypoint
    removed: bool,
}

impl HnswNode {
    fn new(vector: Vec<f32>, level: usize) -> Self {
        Self {
            vector,
            level,
            neighbors: vec![Vec::new(); level + 1],
            removed: false,
        }
    }
}

/// HNSW index for fast approximate nearest neighbor search
#[derive(Debug)]
pub struct HnswIndex {
    /// Configuration
    config: HnswConfig,
    /// Distance metric
    metric: Metric,
    /// Fixed vector dimension
    dimension: usize,
    /// All nodes in the graph, keyed by id
    nodes: HashMap<VectorId, HnswNode>,
    /// Entry point (a live node at the highest layer)
    entry_point: Option<VectorId>,
    /// Maximum layer in the graph
    top_level: usize,
    /// Count of live (non-removed) nodes
    live_count: usize,
    /// Deterministic RNG for level assignment; its position is part of the
    /// serialized state
    rng: ChaCha8Rng,
}

impl HnswIndex {
    /// Create a new empty HNSW index.
    pub fn new(dimension: usize, metric: Metric, config: HnswConfig) -> Result<Self> {
        if dimension < 1 {
            return Err(VectorError::InvalidArgument(format!(
                "dimension must be >= 1, got {dimension}"
            )));
        }
        if config.max_connections < 1 {
            return Err(VectorError::InvalidArgument(format!(
                "max_connections must be >= 1, got {}",
                config.max_connections
            )));
        }
        if config.ef_construction < 1 {
            return Err(VectorError::InvalidArgument(format!(
                "ef_construction must be >= 1, got {}",
                config.ef_construction
            )));
        }

        let rng = ChaCha8Rng::seed_from_u64(config.seed);

        Ok(Self {
            config,
            metric,
            dimension,
            nodes: HashMap::new(),
            entry_point: None,
            top_level: 0,
            live_count: 0,
            rng,
        })
    }

    /// Get the fixed vector dimension of this index
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Get the distance metric used by this index
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Get the index configuration
    pub fn config(&self) -> &HnswConfig {
        &self.config
    }

    /// Get the number of live (non-removed) vectors
    pub fn len(&self) -> usize {
        self.live_count
    }

    /// Check if the index holds no live vectors
    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    /// Check whether an id is present and not removed
    pub fn contains(&self, id: VectorId) -> bool {
        self.nodes.get(&id).is_some_and(|node| !node.removed)
    }

    /// Insert a vector into the index.
    ///
    /// Adding an id that exists only as a tombstone revives it as a fresh
    /// insert; adding a live id is an error.
    pub fn add(&mut self, id: VectorId, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        match self.nodes.get(&id) {
            Some(node) if !node.removed => return Err(VectorError::DuplicateId(id)),
            Some(_) => self.forget(id),
            None => {}
        }

        // Select layer for this element
        let level = self.random_level();

        self.nodes.insert(id, HnswNode::new(vector.to_vec(), level));
        self.live_count += 1;

        // If this is the first element (or all prior elements are tombstones
        // with no reachable entry), it becomes the entry point.
        let Some(entry) = self.entry_point else {
            self.entry_point = Some(id);
            self.top_level = level;
            return Ok(());
        };

        // Zoom in: greedy descent through the layers above the new node's level
        let mut current = entry;
        for layer in (level + 1..=self.top_level).rev() {
            current = self.greedy_closest(vector, current, layer);
        }

        // Link phase: connect the new node layer by layer, top down
        for layer in (0..=level.min(self.top_level)).rev() {
            // Find ef_construction nearest candidates on this layer
            let candidates =
                self.search_layer(vector, current, self.config.ef_construction, layer);

            // Select up to M diverse neighbors
            let selected = self.select_neighbors(&candidates, self.config.max_connections);

            let cap = self.layer_cap(layer);
            for &neighbor in &selected {
                self.link(id, neighbor, layer);
                self.link(neighbor, id, layer);

                // Re-select the neighbor's links if its degree overflowed the cap
                let degree = self
                    .nodes
                    .get(&neighbor)
                    .map_or(0, |node| node.neighbors[layer].len());
                if degree > cap {
                    self.shrink_neighbors(neighbor, layer, cap);
                }
            }

            // The closest candidate seeds the search on the next layer down
            if let Some(&(closest, _)) = candidates.first() {
                current = closest;
            }
        }

        // Update entry point if this node is at a higher layer
        if level > self.top_level {
            self.top_level = level;
            self.entry_point = Some(id);
        }

        Ok(())
    }

    /// Search for the k nearest neighbors of a query vector.
    ///
    /// Results are ordered ascending by distance, ties broken by ascending id.
    /// Returns fewer than k results if the index holds fewer live vectors.
    pub fn search(&self, query: &[f32], k: usize, ef_search: usize) -> Result<Vec<SearchResult>> {
        if query.len() != self.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if k < 1 {
            return Err(VectorError::InvalidArgument(format!(
                "k must be >= 1, got {k}"
            )));
        }

        let Some(entry) = self.entry_point else {
            return Ok(Vec::new());
        };
        if self.live_count == 0 {
            return Ok(Vec::new());
        }

        // Zoom in from the top layer down to layer 1
        let mut current = entry;
        for layer in (1..=self.top_level).rev() {
            current = self.greedy_closest(query, current, layer);
        }

        // Wide search on layer 0
        let ef = ef_search.max(k);
        let candidates = self.search_layer(query, current, ef, 0);

        // Tombstones serve as waypoints during traversal but never appear in
        // results
        let mut results: Vec<SearchResult> = candidates
            .into_iter()
            .filter(|(id, _)| self.contains(*id))
            .map(|(id, distance)| SearchResult::new(id, distance))
            .collect();

        results.sort();
        results.truncate(k);
        Ok(results)
    }

    /// Mark a vector as removed (lazy deletion).
    ///
    /// Returns true if the id was live. The node and its edges stay in the
    /// graph; if the entry point was removed, a live node at the highest
    /// remaining layer is promoted.
    pub fn remove(&mut self, id: VectorId) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) if !node.removed => {
                node.removed = true;
                self.live_count -= 1;
                if self.entry_point == Some(id) {
                    self.promote_entry_point();
                }
                true
            }
            _ => false,
        }
    }

    /// Serialize the entire index to a self-describing binary blob.
    ///
    /// Layout (all integers little-endian, floats IEEE-754 f32 little-endian):
    ///
    /// ```text
    /// [magic: 4][version: u32][dimension: u32][metric: u8]
    /// [M: u32][ef_construction: u32][seed: u64][rng_word_pos: u128]
    /// [top_level: u32][entry_point: u64][node_count: u64]
    /// per node: [id: u64][removed: u8][level: u32][f32 x dimension]
    ///           per layer 0..=level: [degree: u32][neighbor: u64 x degree]
    /// ```
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64 + self.nodes.len() * (16 + self.dimension * 4));

        buf.extend_from_slice(&INDEX_MAGIC);
        buf.extend_from_slice(&INDEX_FORMAT_VERSION.to_le_bytes());
        buf.extend_from_slice(&(self.dimension as u32).to_le_bytes());
        buf.push(self.metric.to_tag());
        buf.extend_from_slice(&(self.config.max_connections as u32).to_le_bytes());
        buf.extend_from_slice(&(self.config.ef_construction as u32).to_le_bytes());
        buf.extend_from_slice(&self.config.seed.to_le_bytes());
        buf.extend_from_slice(&self.rng.get_word_pos().to_le_bytes());
        buf.extend_from_slice(&(self.top_level as u32).to_le_bytes());
        buf.extend_from_slice(&self.entry_point.unwrap_or(NO_ENTRY_POINT).to_le_bytes());
        buf.extend_from_slice(&(self.nodes.len() as u64).to_le_bytes());

        // Enumerate nodes in id order for a reproducible byte stream
        let mut ids: Vec<VectorId> = self.nodes.keys().copied().collect();
        ids.sort_unstable();

        for id in ids {
            let node = &self.nodes[&id];
            buf.extend_from_slice(&id.to_le_bytes());
            buf.push(u8::from(node.removed));
            buf.extend_from_slice(&(node.level as u32).to_le_bytes());
            for &value in &node.vector {
                buf.extend_from_slice(&value.to_le_bytes());
            }
            for layer in &node.neighbors {
                buf.extend_from_slice(&(layer.len() as u32).to_le_bytes());
                for &neighbor in layer {
                    buf.extend_from_slice(&neighbor.to_le_bytes());
                }
            }
        }

        buf
    }

    /// Reconstruct an index from a blob produced by [`HnswIndex::serialize`].
    ///
    /// Any structural fault (bad magic, newer version, truncation, dangling
    /// neighbor ids, degree over cap, inconsistent entry point) is rejected
    /// with [`VectorError::Deserialization`].
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(data);

        let magic = reader.take(4)?;
        if magic != INDEX_MAGIC {
            return Err(VectorError::Deserialization(
                "Not a serialized HNSW index (bad magic)".to_string(),
            ));
        }

        let version = reader.read_u32()?;
        if version > INDEX_FORMAT_VERSION {
            return Err(VectorError::Deserialization(format!(
                "Index format version {version} is newer than supported {INDEX_FORMAT_VERSION}"
            )));
        }

        let dimension = reader.read_u32()? as usize;
        let metric = Metric::from_tag(reader.read_u8()?)?;
        let max_connections = reader.read_u32()? as usize;
        let ef_construction = reader.read_u32()? as usize;
        let seed = reader.read_u64()?;
        let word_pos = reader.read_u128()?;
        let top_level = reader.read_u32()? as usize;
        let entry_raw = reader.read_u64()?;
        let node_count = reader.read_u64()? as usize;

        if dimension < 1 || max_connections < 1 || ef_construction < 1 {
            return Err(VectorError::Deserialization(
                "Invalid index parameters in header".to_string(),
            ));
        }

        let config = HnswConfig::new(max_connections, ef_construction).with_seed(seed);
        let layer0_cap = config.max_connections_layer0;

        // Capacities are bounded by the bytes actually present, so a header
        // with an absurd count cannot drive allocation
        let mut nodes: HashMap<VectorId, HnswNode> =
            HashMap::with_capacity(node_count.min(reader.remaining() / 13));
        for _ in 0..node_count {
            let id = reader.read_u64()?;
            let removed = match reader.read_u8()? {
                0 => false,
                1 => true,
                other => {
                    return Err(VectorError::Deserialization(format!(
                        "Invalid removed flag {other} for node {id}"
                    )));
                }
            };
            let level = reader.read_u32()? as usize;
            if level > MAX_LEVEL {
                return Err(VectorError::Deserialization(format!(
                    "Node {id} has level {level} above the maximum {MAX_LEVEL}"
                )));
            }

            let mut vector = Vec::with_capacity(dimension.min(reader.remaining() / 4));
            for _ in 0..dimension {
                vector.push(reader.read_f32()?);
            }

            let mut neighbors = Vec::with_capacity(level + 1);
            for layer in 0..=level {
                let degree = reader.read_u32()? as usize;
                let cap = if layer == 0 { layer0_cap } else { max_connections };
                if degree > cap {
                    return Err(VectorError::Deserialization(format!(
                        "Node {id} has degree {degree} above the cap {cap} at layer {layer}"
                    )));
                }
                let mut list = Vec::with_capacity(degree.min(reader.remaining() / 8));
                for _ in 0..degree {
                    list.push(reader.read_u64()?);
                }
                neighbors.push(list);
            }

            let node = HnswNode {
                vector,
                level,
                neighbors,
                removed,
            };
            if nodes.insert(id, node).is_some() {
                return Err(VectorError::Deserialization(format!(
                    "Duplicate node id {id}"
                )));
            }
        }

        if !reader.is_empty() {
            return Err(VectorError::Deserialization(
                "Trailing bytes after node table".to_string(),
            ));
        }

        // Every edge must point at a node in the table
        for (id, node) in &nodes {
            for layer in &node.neighbors {
                for neighbor in layer {
                    if !nodes.contains_key(neighbor) {
                        return Err(VectorError::Deserialization(format!(
                            "Node {id} references unknown neighbor {neighbor}"
                        )));
                    }
                }
            }
        }

        let live_count = nodes.values().filter(|node| !node.removed).count();

        let entry_point = if entry_raw == NO_ENTRY_POINT {
            if live_count > 0 {
                return Err(VectorError::Deserialization(
                    "Missing entry point for non-empty index".to_string(),
                ));
            }
            None
        } else {
            match nodes.get(&entry_raw) {
                Some(node) if node.level == top_level && !node.removed => Some(entry_raw),
                Some(node) if node.removed => {
                    return Err(VectorError::Deserialization(format!(
                        "Entry point {entry_raw} is a removed node"
                    )));
                }
                Some(_) => {
                    return Err(VectorError::Deserialization(format!(
                        "Entry point {entry_raw} does not match top level {top_level}"
                    )));
                }
                None => {
                    return Err(VectorError::Deserialization(format!(
                        "Entry point {entry_raw} is not in the node table"
                    )));
                }
            }
        };

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_word_pos(word_pos);

        tracing::debug!(
            nodes = nodes.len(),
            live = live_count,
            dimension,
            "Deserialized HNSW index"
        );

        Ok(Self {
            config,
            metric,
            dimension,
            nodes,
            entry_point,
            top_level,
            live_count,
            rng,
        })
    }

    /// Degree cap for a layer: 2M on the base layer, M above it
    fn layer_cap(&self, layer: usize) -> usize {
        if layer == 0 {
            self.config.max_connections_layer0
        } else {
            self.config.max_connections
        }
    }

    /// Select a random layer for a new element: floor(-ln(u) * ml)
    fn random_level(&mut self) -> usize {
        let uniform: f64 = self.rng.random_range(f64::EPSILON..=1.0);
        let level = (-uniform.ln() * self.config.level_multiplier).floor() as usize;
        level.min(MAX_LEVEL)
    }

    /// Distance from a stored node to a query vector
    fn node_distance(&self, id: VectorId, query: &[f32]) -> f32 {
        self.nodes
            .get(&id)
            .map_or(f32::INFINITY, |node| self.metric.distance(query, &node.vector))
    }

    /// Greedy walk on one layer: follow any strictly closer neighbor until a
    /// local minimum is reached
    fn greedy_closest(&self, query: &[f32], start: VectorId, layer: usize) -> VectorId {
        let mut current = start;
        let mut best = self.node_distance(current, query);

        loop {
            let mut improved = false;
            if let Some(node) = self.nodes.get(&current)
                && layer < node.neighbors.len()
            {
                for &neighbor in &node.neighbors[layer] {
                    let dist = self.node_distance(neighbor, query);
                    if dist < best {
                        best = dist;
                        current = neighbor;
                        improved = true;
                    }
                }
            }
            if !improved {
                return current;
            }
        }
    }

    /// Beam search on a single layer.
    ///
    /// Maintains a min-heap frontier and a bounded max-heap of the ef best
    /// nodes seen. Tombstones are traversed like any other node. Returns
    /// candidates sorted ascending by (distance, id).
    fn search_layer(
        &self,
        query: &[f32],
        start: VectorId,
        ef: usize,
        layer: usize,
    ) -> Vec<(VectorId, f32)> {
        let mut visited = HashSet::new();
        let mut frontier = BinaryHeap::new();
        let mut nearest: BinaryHeap<(OrderedFloat, VectorId)> = BinaryHeap::new();

        let dist = self.node_distance(start, query);
        visited.insert(start);
        frontier.push(Reverse((OrderedFloat(dist), start)));
        nearest.push((OrderedFloat(dist), start));

        while let Some(Reverse((OrderedFloat(current_dist), current_id))) = frontier.pop() {
            // The closest frontier node is farther than the worst result and
            // the result set is full: nothing left can improve it
            if let Some(&(OrderedFloat(worst), _)) = nearest.peek()
                && nearest.len() >= ef
                && current_dist > worst
            {
                break;
            }

            if let Some(node) = self.nodes.get(&current_id)
                && layer < node.neighbors.len()
            {
                for &neighbor in &node.neighbors[layer] {
                    if visited.insert(neighbor) {
                        let dist = self.node_distance(neighbor, query);
                        let worst = nearest
                            .peek()
                            .map_or(f32::INFINITY, |&(OrderedFloat(d), _)| d);

                        if nearest.len() < ef || dist < worst {
                            frontier.push(Reverse((OrderedFloat(dist), neighbor)));
                            nearest.push((OrderedFloat(dist), neighbor));
                            if nearest.len() > ef {
                                nearest.pop();
                            }
                        }
                    }
                }
            }
        }

        let mut result: Vec<(VectorId, f32)> = nearest
            .into_iter()
            .map(|(OrderedFloat(dist), id)| (id, dist))
            .collect();
        result.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        result
    }

    /// Diversity heuristic for neighbor selection.
    ///
    /// Candidates carry their distance to the base point and arrive sorted
    /// ascending. A candidate is accepted only if no already-accepted neighbor
    /// is closer to it than the base point is. This favors neighbors that open
    /// new directions over clusters of mutually close points and is required
    /// for graph quality; a plain top-M cut degrades recall badly.
    fn select_neighbors(&self, candidates: &[(VectorId, f32)], m: usize) -> Vec<VectorId> {
        let mut selected: Vec<(VectorId, f32)> = Vec::with_capacity(m);

        for &(candidate, dist_to_base) in candidates {
            if selected.len() >= m {
                break;
            }
            let Some(candidate_node) = self.nodes.get(&candidate) else {
                continue;
            };

            let diverse = selected.iter().all(|&(kept, _)| {
                self.nodes.get(&kept).is_none_or(|kept_node| {
                    self.metric
                        .distance(&candidate_node.vector, &kept_node.vector)
                        >= dist_to_base
                })
            });

            if diverse {
                selected.push((candidate, dist_to_base));
            }
        }

        selected.into_iter().map(|(id, _)| id).collect()
    }

    /// Add a directed edge if it is not already present
    fn link(&mut self, src: VectorId, dst: VectorId, layer: usize) {
        if let Some(node) = self.nodes.get_mut(&src)
            && layer < node.neighbors.len()
            && !node.neighbors[layer].contains(&dst)
        {
            node.neighbors[layer].push(dst);
        }
    }

    /// Re-run the selection heuristic over a node's extended neighbor list,
    /// keeping at most `cap` links
    fn shrink_neighbors(&mut self, id: VectorId, layer: usize, cap: usize) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        let base = node.vector.clone();

        let mut extended: Vec<(VectorId, f32)> = node.neighbors[layer]
            .iter()
            .map(|&neighbor| (neighbor, self.node_distance(neighbor, &base)))
            .collect();
        extended.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        let kept = self.select_neighbors(&extended, cap);
        if let Some(node) = self.nodes.get_mut(&id) {
            node.neighbors[layer] = kept;
        }
    }

    /// Promote a live node at the highest remaining layer to entry point.
    /// With no live node left the index becomes empty: no entry point,
    /// top level zero.
    fn promote_entry_point(&mut self) {
        let best = self
            .nodes
            .iter()
            .filter(|(_, node)| !node.removed)
            .map(|(&id, node)| (node.level, id))
            // Highest level wins; among equals the smallest id, for
            // reproducibility
            .max_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(&a.1)));

        match best {
            Some((level, id)) => {
                self.entry_point = Some(id);
                self.top_level = level;
            }
            None => {
                self.entry_point = None;
                self.top_level = 0;
            }
        }
    }

    /// Fully detach a tombstoned node so its id can be inserted fresh
    fn forget(&mut self, id: VectorId) {
        if self.nodes.remove(&id).is_some() {
            for node in self.nodes.values_mut() {
                for layer in node.neighbors.iter_mut() {
                    layer.retain(|&neighbor| neighbor != id);
                }
            }
            // A tombstone is never the entry point, so no promotion is needed
        }
    }
}

/// Wrapper for f32 to make it orderable (for BinaryHeap)
#[derive(Debug, Clone, Copy, PartialEq)]
struct OrderedFloat(f32);

impl Eq for OrderedFloat {}

impl PartialOrd for OrderedFloat {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedFloat {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Cursor over a little-endian byte buffer with truncation checking
struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).filter(|&end| end <= self.buf.len());
        match end {
            Some(end) => {
                let slice = &self.buf[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(VectorError::Deserialization(
                "Unexpected end of index data".to_string(),
            )),
        }
    }

    fn is_empty(&self) -> bool {
        self.pos == self.buf.len()
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_u64(&mut self) -> Result<u64> {
        let bytes: [u8; 8] = self.take(8)?.try_into().map_err(|_| {
            VectorError::Deserialization("Unexpected end of index data".to_string())
        })?;
        Ok(u64::from_le_bytes(bytes))
    }

    fn read_u128(&mut self) -> Result<u128> {
        let bytes: [u8; 16] = self.take(16)?.try_into().map_err(|_| {
            VectorError::Deserialization("Unexpected end of index data".to_string())
        })?;
        Ok(u128::from_le_bytes(bytes))
    }

    fn read_f32(&mut self) -> Result<f32> {
        let bytes = self.take(4)?;
        Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}
