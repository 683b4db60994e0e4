//! Policy snapshot persistence
//!
//! The policy never touches the disk itself. Snapshots are handed to a
//! [`SnapshotWriter`], whose background task writes them to a
//! [`PolicySnapshotStore`], so a slow write never stalls composition.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::types::{ContextKey, Strategy};
use crate::error::{ComposerError, Result};

fn fresh_epsilon() -> f64 {
    0.1
}

/// Serializable policy state
///
/// Absent fields load as fresh-start values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySnapshot {
    #[serde(default)]
    pub q_values: BTreeMap<ContextKey, BTreeMap<Strategy, f64>>,
    #[serde(default, rename = "counts")]
    pub action_counts: BTreeMap<ContextKey, BTreeMap<Strategy, u64>>,
    #[serde(default = "fresh_epsilon")]
    pub epsilon: f64,
    #[serde(default)]
    pub total_actions: u64,
    #[serde(default)]
    pub successful_actions: u64,
    #[serde(default)]
    pub reward_history: Vec<f64>,
    #[serde(default)]
    pub action_history: Vec<Strategy>,
}

impl Default for PolicySnapshot {
    fn default() -> Self {
        Self {
            q_values: BTreeMap::new(),
            action_counts: BTreeMap::new(),
            epsilon: fresh_epsilon(),
            total_actions: 0,
            successful_actions: 0,
            reward_history: Vec::new(),
            action_history: Vec::new(),
        }
    }
}

/// Storage interface for policy snapshots
#[async_trait]
pub trait PolicySnapshotStore: Send + Sync {
    /// Load the latest snapshot, `None` when nothing was saved yet
    async fn load(&self) -> Result<Option<PolicySnapshot>>;

    /// Replace the stored snapshot
    async fn save(&self, snapshot: &PolicySnapshot) -> Result<()>;
}

/// Snapshot stored as one JSON document
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl PolicySnapshotStore for JsonFileSnapshotStore {
    async fn load(&self) -> Result<Option<PolicySnapshot>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ComposerError::Persistence(format!(
                    "failed to read policy snapshot: {}",
                    e
                )));
            }
        };

        let snapshot = serde_json::from_str(&contents)?;
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &PolicySnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ComposerError::Persistence(format!("failed to create policy dir: {}", e))
            })?;
        }

        let json = serde_json::to_vec_pretty(snapshot)?;
        let tmp = self.temp_path();

        let mut file = tokio::fs::File::create(&tmp).await.map_err(|e| {
            ComposerError::Persistence(format!("failed to create policy snapshot: {}", e))
        })?;
        file.write_all(&json).await.map_err(|e| {
            ComposerError::Persistence(format!("failed to write policy snapshot: {}", e))
        })?;
        file.flush()
            .await
            .map_err(|e| ComposerError::Persistence(format!("failed to flush: {}", e)))?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            ComposerError::Persistence(format!("failed to replace policy snapshot: {}", e))
        })?;

        Ok(())
    }
}

/// In-memory snapshot store for tests and ephemeral hosts
#[derive(Default)]
pub struct InMemorySnapshotStore {
    snapshot: Mutex<Option<PolicySnapshot>>,
    saves: Mutex<usize>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: PolicySnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
            saves: Mutex::new(0),
        }
    }

    /// Number of completed saves
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn latest(&self) -> Option<PolicySnapshot> {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl PolicySnapshotStore for InMemorySnapshotStore {
    async fn load(&self) -> Result<Option<PolicySnapshot>> {
        Ok(self.latest())
    }

    async fn save(&self, snapshot: &PolicySnapshot) -> Result<()> {
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}

/// Messages sent to the background snapshot writer task.
#[derive(Debug)]
pub enum WriterMessage {
    /// A snapshot to persist.
    ///
    /// Boxed to keep the message small on the channel.
    Snapshot(Box<PolicySnapshot>),
    /// Shutdown signal for the writer task.
    Shutdown,
}

/// Fire-and-forget snapshot writer.
///
/// Spawns a task that saves queued snapshots in order. Failures are logged
/// and never reach the caller.
pub struct SnapshotWriter {
    writer_tx: mpsc::UnboundedSender<WriterMessage>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SnapshotWriter {
    /// Spawn the writer task. Must be called inside a tokio runtime.
    #[must_use]
    pub fn spawn(store: Arc<dyn PolicySnapshotStore>) -> Self {
        let (writer_tx, writer_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(Self::writer_task(store, writer_rx));
        Self {
            writer_tx,
            handle: Mutex::new(Some(handle)),
        }
    }

    async fn writer_task(
        store: Arc<dyn PolicySnapshotStore>,
        mut rx: mpsc::UnboundedReceiver<WriterMessage>,
    ) {
        debug!("Policy snapshot writer task started");

        while let Some(msg) = rx.recv().await {
            match msg {
                WriterMessage::Snapshot(snapshot) => {
                    match store.save(&snapshot).await {
                        Ok(()) => info!(
                            total_actions = snapshot.total_actions,
                            contexts = snapshot.q_values.len(),
                            "Policy snapshot saved"
                        ),
                        Err(e) => error!(error = %e, "Failed to save policy snapshot"),
                    }
                }
                WriterMessage::Shutdown => {
                    debug!("Policy snapshot writer received shutdown signal");
                    break;
                }
            }
        }

        debug!("Policy snapshot writer task stopped");
    }

    /// Queue a snapshot. Non-blocking.
    pub fn submit(&self, snapshot: PolicySnapshot) {
        if self
            .writer_tx
            .send(WriterMessage::Snapshot(Box::new(snapshot)))
            .is_err()
        {
            error!("Policy snapshot writer is gone, snapshot dropped");
        }
    }

    /// Stop the task after everything already queued has been written
    pub async fn shutdown(&self) {
        let _ = self.writer_tx.send(WriterMessage::Shutdown);
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(error = %e, "Policy snapshot writer task failed");
            }
        }
    }
}
