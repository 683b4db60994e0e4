//! Append-only JSONL file storage shared by the trace and feedback logs

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::warn;

use crate::error::{ComposerError, Result};

/// One JSON document per line
#[derive(Debug, Clone)]
pub struct JsonlFile {
    path: PathBuf,
}

impl JsonlFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ComposerError::Persistence(format!("failed to create log dir: {}", e))
            })?;
        }
        Ok(())
    }

    /// Append one entry and flush
    pub async fn append<T: Serialize>(&self, entry: &T) -> Result<()> {
        self.ensure_parent_dir().await?;

        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| ComposerError::Persistence(format!("failed to open log: {}", e)))?;

        file.write_all(line.as_bytes())
            .await
            .map_err(|e| ComposerError::Persistence(format!("failed to write entry: {}", e)))?;
        file.flush()
            .await
            .map_err(|e| ComposerError::Persistence(format!("failed to flush: {}", e)))?;

        Ok(())
    }

    /// Every parseable entry in file order. Unparseable lines are skipped.
    pub async fn read_all<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .await
            .map_err(|e| ComposerError::Persistence(format!("failed to open log: {}", e)))?;

        let mut lines = BufReader::new(file).lines();
        let mut entries = Vec::new();

        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| ComposerError::Persistence(format!("failed to read line: {}", e)))?
        {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(path = %self.path.display(), error = %e, "Skipping malformed log line"),
            }
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Entry {
        id: u32,
        text: String,
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let tmp = TempDir::new().unwrap();
        let file = JsonlFile::new(tmp.path().join("absent.jsonl"));
        let entries: Vec<Entry> = file.read_all().await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_append_creates_parent_dirs_and_keeps_order() {
        let tmp = TempDir::new().unwrap();
        let file = JsonlFile::new(tmp.path().join("nested").join("log.jsonl"));

        for id in 0..3 {
            file.append(&Entry {
                id,
                text: format!("entry {id}"),
            })
            .await
            .unwrap();
        }

        let entries: Vec<Entry> = file.read_all().await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].id, 2);

        let raw = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(raw.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_malformed_lines_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("log.jsonl");
        std::fs::write(&path, "{\"id\":1,\"text\":\"ok\"}\nnot json\n\n{\"id\":2,\"text\":\"ok\"}\n")
            .unwrap();

        let entries: Vec<Entry> = JsonlFile::new(path).read_all().await.unwrap();
        assert_eq!(entries.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 2]);
    }
}
