use crate::error::StoreError;
use crate::metrics::CompletionMetrics;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Who and what a chat call belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionContext {
    pub user_id: String,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    #[serde(flatten)]
    pub context: InteractionContext,
    pub metrics: CompletionMetrics,
}

/// Receives the metrics of each completed chat call.
pub trait InteractionStore: Send + Sync {
    fn record<'a>(
        &'a self,
        metrics: &'a CompletionMetrics,
        context: &'a InteractionContext,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + 'a>>;
}

#[derive(Debug, Default)]
pub struct MemoryInteractionStore {
    records: Mutex<Vec<InteractionRecord>>,
}

impl MemoryInteractionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<InteractionRecord> {
        self.records.lock().await.clone()
    }
}

impl InteractionStore for MemoryInteractionStore {
    fn record<'a>(
        &'a self,
        metrics: &'a CompletionMetrics,
        context: &'a InteractionContext,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + 'a>> {
        Box::pin(async move {
            self.records.lock().await.push(InteractionRecord {
                context: context.clone(),
                metrics: metrics.clone(),
            });
            Ok(())
        })
    }
}

/// Appends one JSON line per completed call.
#[derive(Debug)]
pub struct JsonlInteractionStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlInteractionStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl InteractionStore for JsonlInteractionStore {
    fn record<'a>(
        &'a self,
        metrics: &'a CompletionMetrics,
        context: &'a InteractionContext,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + 'a>> {
        Box::pin(async move {
            let mut line = serde_json::to_vec(&InteractionRecord {
                context: context.clone(),
                metrics: metrics.clone(),
            })?;
            line.push(b'\n');

            let _guard = self.write_lock.lock().await;
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            file.write_all(&line).await?;
            file.flush().await?;
            Ok(())
        })
    }
}
