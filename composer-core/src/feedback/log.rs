//! Feedback storage backends

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::FeedbackRecord;
use crate::error::Result;
use crate::jsonl::JsonlFile;

/// Append-only feedback storage
#[async_trait]
pub trait FeedbackLog: Send + Sync {
    async fn append(&self, record: &FeedbackRecord) -> Result<()>;

    async fn read_all(&self) -> Result<Vec<FeedbackRecord>>;
}

/// Feedback as JSON lines in one file
pub struct JsonlFeedbackLog {
    file: JsonlFile,
}

impl JsonlFeedbackLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonlFile::new(path),
        }
    }
}

#[async_trait]
impl FeedbackLog for JsonlFeedbackLog {
    async fn append(&self, record: &FeedbackRecord) -> Result<()> {
        self.file.append(record).await
    }

    async fn read_all(&self) -> Result<Vec<FeedbackRecord>> {
        self.file.read_all().await
    }
}

#[derive(Default)]
pub struct InMemoryFeedbackLog {
    records: Mutex<Vec<FeedbackRecord>>,
}

impl InMemoryFeedbackLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeedbackLog for InMemoryFeedbackLog {
    async fn append(&self, record: &FeedbackRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<FeedbackRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}
