//! Hierarchical Navigable Small World index
//!
//! A layered proximity graph over vectors in a shared cosine space. Layer 0
//! holds every node; higher layers hold geometrically fewer, giving the
//! greedy descent its logarithmic expected hops. The whole graph lives
//! behind one reader-writer lock; finer-grained node locking is a possible
//! future refinement.

pub mod store;

use crate::error::{IndexError, Result, StoreError};
use crate::similarity::cosine_distance;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::debug;

pub use store::HnswVectorStore;

/// Layer-assignment normalizer, `1 / ln 2`
const LEVEL_NORMALIZER: f64 = 1.0 / std::f64::consts::LN_2;

/// HNSW tuning parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HnswConfig {
    /// Desired out-degree per layer (layer 0 allows `2m`)
    #[serde(default = "default_m")]
    pub m: usize,

    /// Candidate pool size during insertion
    #[serde(default = "default_ef_construction")]
    pub ef_construction: usize,

    /// Candidate pool size during queries
    #[serde(default = "default_ef_search")]
    pub ef_search: usize,

    /// Hard cap on the number of layers
    #[serde(default = "default_max_level")]
    pub max_level: usize,

    /// Seed for the layer-assignment RNG; random when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_m() -> usize {
    16
}

fn default_ef_construction() -> usize {
    200
}

fn default_ef_search() -> usize {
    100
}

fn default_max_level() -> usize {
    16
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            m: default_m(),
            ef_construction: default_ef_construction(),
            ef_search: default_ef_search(),
            max_level: default_max_level(),
            seed: None,
        }
    }
}

impl HnswConfig {
    /// Pick parameters by expected dataset size
    ///
    /// Smaller graphs need less connectivity; the bands trade memory and
    /// build time for recall as the corpus grows.
    pub fn adaptive(expected_size: usize) -> Self {
        let (m, ef_construction, ef_search) = if expected_size < 10_000 {
            (12, 100, 50)
        } else if expected_size < 100_000 {
            (16, 200, 100)
        } else if expected_size < 1_000_000 {
            (24, 300, 150)
        } else {
            (32, 400, 200)
        };

        Self {
            m,
            ef_construction,
            ef_search,
            max_level: 16,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// An approximate nearest neighbor returned by the index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: String,
    pub score: f64,
    pub distance: f64,
}

#[derive(Debug, Clone)]
struct Node {
    vector: Vec<f64>,
    level: usize,
    /// Neighbor ids per layer, index 0..=level
    neighbors: Vec<Vec<String>>,
}

impl Node {
    fn new(vector: Vec<f64>, level: usize) -> Self {
        Self {
            vector,
            level,
            neighbors: vec![Vec::new(); level + 1],
        }
    }
}

#[derive(Debug)]
struct Graph {
    nodes: HashMap<String, Node>,
    entry_point: Option<String>,
    dimension: Option<usize>,
    rng: StdRng,
}

/// Heap entry ordered by `(distance, id)`
///
/// The id tie-break makes every search deterministic under equal distances.
#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    distance: f64,
    id: String,
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Multi-layer navigable small-world graph over vectors
///
/// `search` and `size` take the shared lock; `add`, `delete`, and `build`
/// take the exclusive lock. The graph is always queryable; there is no
/// build-then-seal phase.
pub struct HnswIndex {
    config: HnswConfig,
    state: RwLock<Graph>,
}

impl HnswIndex {
    pub fn new(config: HnswConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            config,
            state: RwLock::new(Graph {
                nodes: HashMap::new(),
                entry_point: None,
                dimension: None,
                rng,
            }),
        }
    }

    pub fn config(&self) -> &HnswConfig {
        &self.config
    }

    /// Number of live nodes
    pub async fn size(&self) -> usize {
        self.state.read().await.nodes.len()
    }

    /// Vector dimension fixed by the first insert, if any
    pub async fn dimension(&self) -> Option<usize> {
        self.state.read().await.dimension
    }

    /// Current entry point id, if the index is non-empty
    pub async fn entry_point(&self) -> Option<String> {
        self.state.read().await.entry_point.clone()
    }

    /// All node ids, in unspecified order
    pub async fn node_ids(&self) -> Vec<String> {
        self.state.read().await.nodes.keys().cloned().collect()
    }

    /// Diagnostic view of a node's per-layer neighbor lists
    pub async fn node_links(&self, id: &str) -> Option<Vec<Vec<String>>> {
        self.state
            .read()
            .await
            .nodes
            .get(id)
            .map(|n| n.neighbors.clone())
    }

    /// Bulk insert; equivalent to calling `add` for each pair in order
    pub async fn build(&self, vectors: Vec<Vec<f64>>, ids: Vec<String>) -> Result<()> {
        if vectors.len() != ids.len() {
            return Err(IndexError::LengthMismatch {
                vectors: vectors.len(),
                ids: ids.len(),
            }
            .into());
        }
        for (vector, id) in vectors.into_iter().zip(ids) {
            self.add(vector, id).await?;
        }
        Ok(())
    }

    /// Insert a new node
    ///
    /// Either fully links the node or, on a validation error, leaves the
    /// graph untouched.
    pub async fn add(&self, vector: Vec<f64>, id: impl Into<String>) -> Result<()> {
        let id = id.into();
        let mut graph = self.state.write().await;

        if graph.nodes.contains_key(&id) {
            return Err(IndexError::Duplicate(id).into());
        }
        if let Some(expected) = graph.dimension {
            if vector.len() != expected {
                return Err(IndexError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                }
                .into());
            }
        }

        let level = random_level(&mut graph.rng, self.config.max_level);
        graph.dimension.get_or_insert(vector.len());

        // First node becomes the entry point with no links at any layer
        let Some(entry) = graph.entry_point.clone() else {
            graph.nodes.insert(id.clone(), Node::new(vector, level));
            graph.entry_point = Some(id);
            return Ok(());
        };

        let entry_level = graph.nodes.get(&entry).map_or(0, |n| n.level);
        graph
            .nodes
            .insert(id.clone(), Node::new(vector.clone(), level));

        // Greedy descent through the layers above the new node's level
        let mut ep = entry.clone();
        for layer in (level + 1..=entry_level).rev() {
            ep = greedy_step(&graph, &vector, ep, layer);
        }

        // Link into every layer the new node occupies
        for layer in (0..=level.min(entry_level)).rev() {
            let candidates = search_layer(&graph, &vector, &ep, self.config.ef_construction, layer);
            let cap = self.degree_cap(layer);
            let selected = select_neighbors(&candidates, cap);

            for neighbor in &selected {
                link(&mut graph, &id, &neighbor.id, layer);
            }
            for neighbor in &selected {
                prune(&mut graph, &neighbor.id, layer, cap);
            }

            if let Some(nearest) = selected.first() {
                ep = nearest.id.clone();
            }
        }

        if level > entry_level {
            graph.entry_point = Some(id.clone());
        }

        debug!(%id, level, size = graph.nodes.len(), "node inserted");
        Ok(())
    }

    /// Approximate top-k search, ascending by distance
    pub async fn search(&self, query: &[f64], k: usize) -> Result<Vec<Neighbor>> {
        if query.is_empty() {
            return Err(StoreError::MissingQuery.into());
        }

        let graph = self.state.read().await;
        let Some(entry) = graph.entry_point.clone() else {
            return Ok(Vec::new());
        };
        if k == 0 {
            return Ok(Vec::new());
        }

        let entry_level = graph.nodes.get(&entry).map_or(0, |n| n.level);
        let mut ep = entry;
        for layer in (1..=entry_level).rev() {
            ep = greedy_step(&graph, query, ep, layer);
        }

        let ef = self.config.ef_search.max(k);
        let mut nearest = search_layer(&graph, query, &ep, ef, 0);
        nearest.truncate(k);

        Ok(nearest
            .into_iter()
            .map(|c| {
                let score = (1.0 - c.distance).clamp(0.0, 1.0);
                Neighbor {
                    id: c.id,
                    score,
                    distance: 1.0 - score,
                }
            })
            .collect())
    }

    /// Remove a node and every reference to it
    ///
    /// Neighbors of the removed node are not relinked; recall can degrade
    /// after many deletes.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let mut graph = self.state.write().await;

        if graph.nodes.remove(id).is_none() {
            return Err(IndexError::NotFound(id.to_string()).into());
        }

        for node in graph.nodes.values_mut() {
            for layer in node.neighbors.iter_mut() {
                layer.retain(|n| n != id);
            }
        }

        if graph.entry_point.as_deref() == Some(id) {
            // Highest remaining level wins, smallest id on ties
            graph.entry_point = graph
                .nodes
                .iter()
                .max_by(|(id_a, a), (id_b, b)| {
                    a.level.cmp(&b.level).then_with(|| id_b.cmp(id_a))
                })
                .map(|(nid, _)| nid.clone());
        }

        debug!(%id, size = graph.nodes.len(), "node deleted");
        Ok(())
    }

    /// Drop every node, keeping the dimension and configuration
    pub async fn clear(&self) {
        let mut graph = self.state.write().await;
        graph.nodes.clear();
        graph.entry_point = None;
    }

    fn degree_cap(&self, layer: usize) -> usize {
        if layer == 0 {
            self.config.m * 2
        } else {
            self.config.m
        }
    }
}

impl Default for HnswIndex {
    fn default() -> Self {
        Self::new(HnswConfig::default())
    }
}

/// Draw a layer from the geometric-like distribution `floor(-ln(u) * ml)`
fn random_level(rng: &mut StdRng, max_level: usize) -> usize {
    let u: f64 = 1.0 - rng.random::<f64>(); // (0, 1]
    let level = (-u.ln() * LEVEL_NORMALIZER) as usize;
    level.min(max_level)
}

/// One-neighbor-per-layer greedy move toward the query
fn greedy_step(graph: &Graph, query: &[f64], start: String, layer: usize) -> String {
    let mut current = start;
    let mut current_dist = graph
        .nodes
        .get(&current)
        .map_or(f64::INFINITY, |n| cosine_distance(query, &n.vector));

    loop {
        let Some(node) = graph.nodes.get(&current) else {
            return current;
        };
        if layer > node.level {
            return current;
        }

        let mut improved = false;
        for nid in &node.neighbors[layer] {
            if let Some(neighbor) = graph.nodes.get(nid) {
                let d = cosine_distance(query, &neighbor.vector);
                if d < current_dist {
                    current = nid.clone();
                    current_dist = d;
                    improved = true;
                }
            }
        }
        if !improved {
            return current;
        }
    }
}

/// Beam search over one layer
///
/// Maintains a min-heap frontier and a max-heap working set bounded to `ef`
/// entries; stops when the nearest frontier candidate is farther than the
/// worst working-set entry. Returns the working set nearest-first.
fn search_layer(
    graph: &Graph,
    query: &[f64],
    entry: &str,
    ef: usize,
    layer: usize,
) -> Vec<Candidate> {
    let ef = ef.max(1);
    let Some(entry_node) = graph.nodes.get(entry) else {
        return Vec::new();
    };

    let start = Candidate {
        distance: cosine_distance(query, &entry_node.vector),
        id: entry.to_string(),
    };

    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(start.id.clone());

    let mut frontier: BinaryHeap<Reverse<Candidate>> = BinaryHeap::new();
    frontier.push(Reverse(start.clone()));

    let mut working: BinaryHeap<Candidate> = BinaryHeap::new();
    working.push(start);

    while let Some(Reverse(current)) = frontier.pop() {
        let worst = working.peek().map_or(f64::INFINITY, |c| c.distance);
        if current.distance > worst {
            break;
        }

        let Some(node) = graph.nodes.get(&current.id) else {
            continue;
        };
        if layer > node.level {
            continue;
        }

        for nid in &node.neighbors[layer] {
            if !visited.insert(nid.clone()) {
                continue;
            }
            let Some(neighbor) = graph.nodes.get(nid) else {
                continue;
            };
            let d = cosine_distance(query, &neighbor.vector);
            let worst = working.peek().map_or(f64::INFINITY, |c| c.distance);
            if working.len() < ef || d < worst {
                let candidate = Candidate {
                    distance: d,
                    id: nid.clone(),
                };
                frontier.push(Reverse(candidate.clone()));
                working.push(candidate);
                while working.len() > ef {
                    working.pop();
                }
            }
        }
    }

    working.into_sorted_vec()
}

/// Baseline heuristic: the `cap` candidates nearest to the new node
fn select_neighbors(candidates: &[Candidate], cap: usize) -> Vec<Candidate> {
    candidates.iter().take(cap).cloned().collect()
}

/// Add the edge `a <-> b` at `layer`, skipping existing half-edges
fn link(graph: &mut Graph, a: &str, b: &str, layer: usize) {
    if a == b {
        return;
    }
    for (from, to) in [(a, b), (b, a)] {
        if let Some(node) = graph.nodes.get_mut(from) {
            if layer <= node.level && !node.neighbors[layer].iter().any(|n| n == to) {
                node.neighbors[layer].push(to.to_string());
            }
        }
    }
}

/// Shrink an over-full neighbor list back to `cap`, removing the reciprocal
/// half-edge of every dropped link so bidirectionality is preserved
fn prune(graph: &mut Graph, id: &str, layer: usize, cap: usize) {
    let (vector, neighbors) = match graph.nodes.get(id) {
        Some(node) if layer <= node.level && node.neighbors[layer].len() > cap => {
            (node.vector.clone(), node.neighbors[layer].clone())
        }
        _ => return,
    };

    let mut scored: Vec<Candidate> = neighbors
        .into_iter()
        .map(|nid| {
            let distance = graph
                .nodes
                .get(&nid)
                .map_or(f64::INFINITY, |n| cosine_distance(&vector, &n.vector));
            Candidate { distance, id: nid }
        })
        .collect();
    scored.sort();

    let keep: Vec<String> = scored.iter().take(cap).map(|c| c.id.clone()).collect();
    let dropped = scored.split_off(cap);

    if let Some(node) = graph.nodes.get_mut(id) {
        node.neighbors[layer] = keep;
    }
    for candidate in dropped {
        if let Some(node) = graph.nodes.get_mut(&candidate.id) {
            if layer <= node.level {
                node.neighbors[layer].retain(|n| n != id);
            }
        }
    }
}
