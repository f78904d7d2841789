//! Append-only submission log
//!
//! Every submitted snippet is appended verbatim. Writes go through a single
//! append-mode handle guarded by a lock, so concurrent submissions never
//! interleave regardless of their size.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{Error, Result};

/// Shared handle to the submission log
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
    file: Arc<Mutex<File>>,
}

impl AuditLog {
    /// Open (or create) the log in append mode
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| Error::Audit(format!("Failed to open {}: {}", path.display(), e)))?;

        Ok(AuditLog {
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one submission.
    ///
    /// A newline is added when the text does not end with one so that
    /// consecutive submissions stay separable.
    pub async fn record(&self, source: &str) -> Result<()> {
        if source.is_empty() {
            return Ok(());
        }

        let mut entry = String::with_capacity(source.len() + 1);
        entry.push_str(source);
        if !entry.ends_with('\n') {
            entry.push('\n');
        }

        let mut file = self.file.lock().await;
        file.write_all(entry.as_bytes())
            .await
            .map_err(|e| Error::Audit(format!("Failed to append to {}: {}", self.path.display(), e)))?;
        file.flush()
            .await
            .map_err(|e| Error::Audit(format!("Failed to flush {}: {}", self.path.display(), e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_appends_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("eval.log");

        let log = AuditLog::open(&path).await.unwrap();
        log.record("first").await.unwrap();
        log.record("second\n").await.unwrap();
        drop(log);

        let log = AuditLog::open(&path).await.unwrap();
        log.record("third").await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "first\nsecond\nthird\n");
    }

    #[tokio::test]
    async fn test_empty_submission_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("eval.log");

        let log = AuditLog::open(&path).await.unwrap();
        log.record("").await.unwrap();

        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_concurrent_records_stay_intact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("eval.log");
        let log = AuditLog::open(&path).await.unwrap();

        // Large entries so that unsynchronized writes would be split
        let entries: Vec<String> = (0..32)
            .map(|i| format!("{}\n", char::from(b'a' + (i % 26) as u8).to_string().repeat(64 * 1024)))
            .collect();

        let mut handles = Vec::new();
        for entry in entries.clone() {
            let log = log.clone();
            handles.push(tokio::spawn(async move { log.record(&entry).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let mut lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), entries.len());

        let mut expected: Vec<&str> = entries.iter().map(|e| e.trim_end()).collect();
        lines.sort_unstable();
        expected.sort_unstable();
        assert_eq!(lines, expected);
    }

    #[tokio::test]
    async fn test_open_in_missing_dir_fails() {
        let dir = tempdir().unwrap();
        let err = AuditLog::open(dir.path().join("missing").join("eval.log"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Audit(_)));
    }
}
