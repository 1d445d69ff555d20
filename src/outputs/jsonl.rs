//! JSON Lines corpus output.
//!
//! Records are appended one per line and flushed immediately, so a run that
//! is interrupted leaves behind every record accepted so far and never a
//! half-written one. Non-ASCII text is written literally.

use crate::models::CorpusRecord;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

/// Append-only writer for the corpus file.
pub struct JsonlSink {
    path: PathBuf,
    file: File,
    written: usize,
}

impl JsonlSink {
    /// Open `path` for appending, creating it if needed.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        Ok(Self {
            path,
            file,
            written: 0,
        })
    }

    /// Serialize `record` as one line, write it and flush.
    pub async fn append(&mut self, record: &CorpusRecord) -> std::io::Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        self.file.write_all(&line).await?;
        self.file.flush().await?;
        self.written += 1;
        debug!(id = %record.id, path = %self.path.display(), "Appended record");
        Ok(())
    }

    /// Records appended through this sink.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
