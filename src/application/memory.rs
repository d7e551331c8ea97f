//! # Agent Memory
//!
//! Short-term conversation buffer plus a JSON-persisted vector store for long-term recall.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain::paths::MEMORY_STORE;
use crate::domain::traits::Embedder;

const BOOT_RECORD: &str = "Boot memory for ADE.";

/// Ordered (user, assistant) turns of the current session.
#[derive(Debug, Clone, Default)]
pub struct ConversationBuffer {
    turns: Vec<(String, String)>,
}

impl ConversationBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.turns.push((user.into(), assistant.into()));
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// `Human: ...` / `AI: ...` lines for the prompt.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|(user, assistant)| format!("Human: {}\nAI: {}", user, assistant))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryRecord {
    pub text: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub embedding: Vec<f32>,
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Vector store persisted as `store.json` in the vectorstore directory.
pub struct LongTermStore {
    path: PathBuf,
    records: Vec<MemoryRecord>,
    embedder: Arc<dyn Embedder>,
}

impl LongTermStore {
    /// Loads the store, creating it with the boot record when absent.
    pub async fn open(dir: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
        fs::create_dir_all(dir).with_context(|| format!("Cannot create {}", dir.display()))?;
        let path = dir.join(MEMORY_STORE);
        let records = if path.exists() {
            let content = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            Vec::new()
        };

        let mut store = Self { path, records, embedder };
        if store.records.is_empty() {
            let mut meta = Map::new();
            meta.insert("source".to_string(), Value::from("boot"));
            store.add_text(BOOT_RECORD, meta).await?;
            tracing::info!("Created long-term memory at {}", store.path.display());
        }
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[MemoryRecord] {
        &self.records
    }

    /// True when some record carries `metadata[key] == value`.
    pub fn has_metadata(&self, key: &str, value: &str) -> bool {
        self.records
            .iter()
            .any(|r| r.metadata.get(key).and_then(Value::as_str) == Some(value))
    }

    pub async fn add_text(&mut self, text: &str, metadata: Map<String, Value>) -> Result<()> {
        let embedding = self
            .embedder
            .embed(text)
            .await
            .map_err(|e| anyhow!("Embedding failed: {}", e))?;
        self.records.push(MemoryRecord {
            text: text.to_string(),
            metadata,
            embedding,
        });
        self.save()
    }

    /// Top-`k` records by cosine similarity to `query`.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<&MemoryRecord>> {
        let query = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| anyhow!("Embedding failed: {}", e))?;
        let mut scored: Vec<(f32, &MemoryRecord)> = self
            .records
            .iter()
            .map(|r| (cosine_similarity(&query, &r.embedding), r))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        Ok(scored.into_iter().take(k).map(|(_, r)| r).collect())
    }

    fn save(&self) -> Result<()> {
        let json = serde_json::to_string(&self.records)?;
        fs::write(&self.path, json).with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

/// Both memories behind one handle. Long-term memory is optional.
pub struct AgentMemory {
    pub buffer: ConversationBuffer,
    pub store: Option<LongTermStore>,
    k: usize,
}

impl AgentMemory {
    pub fn new(store: Option<LongTermStore>, k: usize) -> Self {
        Self {
            buffer: ConversationBuffer::new(),
            store,
            k,
        }
    }

    /// Opens the store, degrading to buffer-only memory on failure.
    pub async fn open(dir: &Path, embedder: Option<Arc<dyn Embedder>>, k: usize) -> Self {
        let store = match embedder {
            Some(embedder) => match LongTermStore::open(dir, embedder).await {
                Ok(store) => Some(store),
                Err(e) => {
                    tracing::warn!("Long-term memory unavailable, using conversation buffer only: {:#}", e);
                    None
                }
            },
            None => None,
        };
        Self::new(store, k)
    }

    pub fn has_long_term(&self) -> bool {
        self.store.is_some()
    }

    /// Relevant memories as prompt lines; failures yield an empty list.
    pub async fn relevant(&self, query: &str) -> Vec<String> {
        let Some(store) = &self.store else {
            return Vec::new();
        };
        match store.search(query, self.k).await {
            Ok(records) => records.into_iter().map(|r| r.text.clone()).collect(),
            Err(e) => {
                tracing::warn!("Memory search failed: {:#}", e);
                Vec::new()
            }
        }
    }

    pub async fn remember(&mut self, text: &str, source: &str) -> Result<()> {
        let store = self
            .store
            .as_mut()
            .ok_or_else(|| anyhow!("Long-term memory is not available"))?;
        let mut meta = Map::new();
        meta.insert("source".to_string(), Value::from(source));
        store.add_text(text, meta).await
    }
}
