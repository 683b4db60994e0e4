//! Trace storage backends

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::TraceRecord;
use crate::error::Result;
use crate::jsonl::JsonlFile;

/// Append-only trace storage
#[async_trait]
pub trait TraceLog: Send + Sync {
    async fn append(&self, record: &TraceRecord) -> Result<()>;

    /// Most recent record for `trace_id`
    async fn find(&self, trace_id: &str) -> Result<Option<TraceRecord>> {
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .rev()
            .find(|r| r.trace_id() == trace_id))
    }

    async fn read_all(&self) -> Result<Vec<TraceRecord>>;
}

/// Traces as JSON lines in one file
pub struct JsonlTraceLog {
    file: JsonlFile,
}

impl JsonlTraceLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonlFile::new(path),
        }
    }
}

#[async_trait]
impl TraceLog for JsonlTraceLog {
    async fn append(&self, record: &TraceRecord) -> Result<()> {
        self.file.append(record).await
    }

    async fn read_all(&self) -> Result<Vec<TraceRecord>> {
        self.file.read_all().await
    }
}

#[derive(Default)]
pub struct InMemoryTraceLog {
    records: Mutex<Vec<TraceRecord>>,
}

impl InMemoryTraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TraceLog for InMemoryTraceLog {
    async fn append(&self, record: &TraceRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<TraceRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}
