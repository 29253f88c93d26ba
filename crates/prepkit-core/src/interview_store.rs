//! Interview collection storage.
//!
//! Records are append-only: the generation handler adds one document per
//! successful request and nothing in this codebase mutates or deletes them.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::error::{PrepKitError, Result};
use crate::types::{Interview, StoredInterview};

/// Default collection name for generated interviews.
pub const DEFAULT_COLLECTION: &str = "interviews";

/// Document-collection abstraction for interview records.
#[async_trait]
pub trait InterviewStore: Send + Sync {
    /// Append a record and return the id assigned to it.
    async fn add(&self, interview: &Interview) -> Result<String>;

    /// List every stored record in insertion order.
    async fn list(&self) -> Result<Vec<StoredInterview>>;
}

/// File-based store writing one JSON document per line.
///
/// Layout: `<base>/<collection>.jsonl`
pub struct JsonlInterviewStore {
    base: PathBuf,
    collection: String,
    write_lock: Mutex<()>,
}

impl JsonlInterviewStore {
    pub fn new(base: PathBuf, collection: impl Into<String>) -> Self {
        Self {
            base,
            collection: collection.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Default store location: `~/.prepkit/data/`
    pub fn default_path() -> PathBuf {
        crate::config::data_dir().join("data")
    }

    fn collection_path(&self) -> PathBuf {
        self.base.join(format!("{}.jsonl", self.collection))
    }
}

#[async_trait]
impl InterviewStore for JsonlInterviewStore {
    async fn add(&self, interview: &Interview) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let doc = StoredInterview {
            id: id.clone(),
            interview: interview.clone(),
        };
        let mut line = serde_json::to_string(&doc)?;
        line.push('\n');

        // One writer at a time so concurrent requests never interleave lines.
        let _guard = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&self.base).await?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.collection_path())
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!(%id, collection = %self.collection, "Added interview");
        Ok(id)
    }

    async fn list(&self) -> Result<Vec<StoredInterview>> {
        let path = self.collection_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let data = tokio::fs::read_to_string(&path).await?;
        let mut docs = Vec::new();
        for line in data.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let doc: StoredInterview = serde_json::from_str(line).map_err(|e| {
                PrepKitError::Storage(format!("corrupt interview line: {e}"))
            })?;
            docs.push(doc);
        }
        Ok(docs)
    }
}

/// In-memory store, used for dry runs and tests.
#[derive(Default)]
pub struct MemoryInterviewStore {
    docs: RwLock<Vec<StoredInterview>>,
}

impl MemoryInterviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }
}

#[async_trait]
impl InterviewStore for MemoryInterviewStore {
    async fn add(&self, interview: &Interview) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        self.docs.write().await.push(StoredInterview {
            id: id.clone(),
            interview: interview.clone(),
        });
        Ok(id)
    }

    async fn list(&self) -> Result<Vec<StoredInterview>> {
        Ok(self.docs.read().await.clone())
    }
}
