//! Persistent local vector store

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

use scholar_core::{EmbeddingSpace, Error, IndexEntry, Result, ScoredEntry, VectorStore};

/// Default directory holding the index files
pub const DEFAULT_INDEX_DIR: &str = "vector_db";

const INDEX_FILE: &str = "index.json";
const FORMAT_VERSION: u32 = 2;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreData {
    version: u32,
    space: Option<EmbeddingSpace>,
    entries: Vec<IndexEntry>,
}

/// Vector store kept in memory and mirrored to `<dir>/index.json`
///
/// Entries survive restarts through the index file. The store assumes it is
/// the only writer of that file and never touches anything else in `dir`.
pub struct LocalVectorStore {
    dir: PathBuf,
    data: Arc<RwLock<StoreData>>,
}

impl LocalVectorStore {
    /// Open the store in `dir`, loading any persisted entries
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let index_file = dir.join(INDEX_FILE);
        let data = if index_file.exists() {
            Self::load_from_file(&index_file)?
        } else {
            StoreData {
                version: FORMAT_VERSION,
                ..Default::default()
            }
        };

        info!(
            dir = %dir.display(),
            entries = data.entries.len(),
            model = data.space.as_ref().map(|s| s.model_id.as_str()).unwrap_or("none"),
            "Opened vector store"
        );

        Ok(Self {
            dir,
            data: Arc::new(RwLock::new(data)),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn load_from_file(path: &Path) -> Result<StoreData> {
        let content = std::fs::read_to_string(path)?;
        let data: StoreData = serde_json::from_str(&content).map_err(|e| {
            Error::VectorStore(format!("Corrupt index file {}: {}", path.display(), e))
        })?;

        if data.version != FORMAT_VERSION {
            return Err(Error::VectorStore(format!(
                "Unsupported index format version {} in {}; clear the index to rebuild it",
                data.version,
                path.display()
            )));
        }

        let consistent = match &data.space {
            Some(space) => data.entries.iter().all(|e| e.embedding.len() == space.dimensions),
            None => data.entries.is_empty(),
        };
        if !consistent {
            return Err(Error::VectorStore(format!(
                "Index file {} mixes embedding dimensions",
                path.display()
            )));
        }

        Ok(data)
    }

    /// Write the snapshot next to the index file, then swap it in
    async fn save(&self, snapshot: String) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let index_file = self.dir.join(INDEX_FILE);
        let temp_file = self.dir.join(format!("{}.tmp", INDEX_FILE));

        tokio::fs::write(&temp_file, snapshot).await?;
        tokio::fs::rename(&temp_file, &index_file).await?;
        debug!(path = %index_file.display(), "Saved vector store");
        Ok(())
    }

    fn lock_error<E: std::fmt::Display>(e: E) -> Error {
        Error::VectorStore(format!("Lock error: {}", e))
    }

    /// Simple cosine similarity calculation, for vectors of equal length
    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot_product / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorStore for LocalVectorStore {
    async fn add(&self, space: &EmbeddingSpace, new_entries: Vec<IndexEntry>) -> Result<usize> {
        if new_entries.is_empty() {
            return Ok(0);
        }

        if let Some(entry) = new_entries.iter().find(|e| e.embedding.len() != space.dimensions) {
            return Err(Error::VectorStore(format!(
                "Embedding of length {} does not match {} dimensions of {}",
                entry.embedding.len(),
                space.dimensions,
                space.model_id
            )));
        }

        let added = new_entries.len();
        let snapshot = {
            let mut data = self.data.write().map_err(Self::lock_error)?;
            match &data.space {
                Some(stored) if stored != space => {
                    return Err(Error::VectorStore(format!(
                        "Index holds {}-dimensional vectors from {}, cannot add vectors from {}; clear the index first",
                        stored.dimensions, stored.model_id, space.model_id
                    )));
                }
                Some(_) => {}
                None => data.space = Some(space.clone()),
            }
            data.entries.extend(new_entries);
            serde_json::to_string(&*data)?
        };

        self.save(snapshot).await?;
        Ok(added)
    }

    async fn embedding_space(&self) -> Result<Option<EmbeddingSpace>> {
        let data = self.data.read().map_err(Self::lock_error)?;
        Ok(data.space.clone())
    }

    async fn search_by_vector(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredEntry>> {
        let data = self.data.read().map_err(Self::lock_error)?;

        if let Some(space) = &data.space {
            if vector.len() != space.dimensions {
                return Err(Error::VectorStore(format!(
                    "Query vector has {} dimensions but the index holds {}-dimensional vectors from {}",
                    vector.len(),
                    space.dimensions,
                    space.model_id
                )));
            }
        }

        let mut results: Vec<ScoredEntry> = data
            .entries
            .iter()
            .map(|entry| ScoredEntry {
                chunk: entry.chunk.clone(),
                score: Self::cosine_similarity(vector, &entry.embedding),
            })
            .collect();

        // Stable sort keeps insertion order among equal scores.
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(top_k);

        Ok(results)
    }

    async fn contains(&self, content_hash: &str) -> Result<bool> {
        let data = self.data.read().map_err(Self::lock_error)?;
        Ok(data.entries.iter().any(|e| e.content_hash == content_hash))
    }

    async fn clear(&self) -> Result<()> {
        let snapshot = {
            let mut data = self.data.write().map_err(Self::lock_error)?;
            data.entries.clear();
            data.space = None;
            serde_json::to_string(&*data)?
        };

        self.save(snapshot).await?;

        info!(dir = %self.dir.display(), "Cleared vector store");
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        let data = self.data.read().map_err(Self::lock_error)?;
        Ok(data.entries.len())
    }
}
