//! Scoped atomic writes of scenario artifacts.
//!
//! Every output file (scenario document, binary plan, properties) is written
//! to a uniquely named temporary file next to its destination, flushed,
//! fsynced and then renamed over the destination. A reader never observes a
//! partially written artifact, and an abandoned writer removes its temporary
//! file when dropped.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ScenarioError, ScenarioResult};

/// Writer for one artifact. Nothing is visible at the destination until
/// [`ArtifactWriter::commit`] returns.
#[derive(Debug)]
pub struct ArtifactWriter {
    temp_path: Option<PathBuf>,
    final_path: PathBuf,
    writer: Option<BufWriter<File>>,
    written: u64,
}

impl ArtifactWriter {
    /// Opens a temporary file next to `final_path`.
    ///
    /// # Errors
    ///
    /// Returns `ScenarioError::Io` if the temporary file cannot be created,
    /// e.g. because the parent folder does not exist.
    pub fn create(final_path: impl Into<PathBuf>) -> ScenarioResult<Self> {
        let final_path = final_path.into();
        let file_name = final_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                ScenarioError::internal(format!(
                    "artifact path {} has no file name",
                    final_path.display()
                ))
            })?;
        let temp_path = final_path.with_file_name(format!(".{file_name}.tmp.{}", Uuid::new_v4()));

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .map_err(|e| ScenarioError::io(&temp_path, e))?;

        Ok(Self {
            temp_path: Some(temp_path),
            final_path,
            writer: Some(BufWriter::new(file)),
            written: 0,
        })
    }

    /// Destination path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.final_path
    }

    /// Appends bytes to the pending artifact.
    ///
    /// # Errors
    ///
    /// Returns `ScenarioError::Io` on a failed write.
    pub fn write(&mut self, bytes: &[u8]) -> ScenarioResult<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| ScenarioError::internal("artifact writer already consumed"))?;
        writer
            .write_all(bytes)
            .map_err(|e| ScenarioError::io(&self.final_path, e))?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    /// Flushes, fsyncs and renames the temporary file over the destination.
    ///
    /// # Errors
    ///
    /// Returns `ScenarioError::Io` if any step fails. The temporary file is
    /// removed in that case.
    pub fn commit(mut self) -> ScenarioResult<PathBuf> {
        let mut writer = self
            .writer
            .take()
            .ok_or_else(|| ScenarioError::internal("artifact writer already consumed"))?;
        let temp_path = self
            .temp_path
            .clone()
            .ok_or_else(|| ScenarioError::internal("artifact temp path already consumed"))?;

        writer.flush().map_err(|e| ScenarioError::io(&temp_path, e))?;
        writer
            .get_ref()
            .sync_all()
            .map_err(|e| ScenarioError::io(&temp_path, e))?;
        drop(writer);

        fs::rename(&temp_path, &self.final_path)
            .map_err(|e| ScenarioError::io(&self.final_path, e))?;
        self.temp_path = None;

        info!(path = %self.final_path.display(), bytes = self.written, "artifact written");
        Ok(self.final_path.clone())
    }

    /// Drops the pending artifact and removes the temporary file.
    ///
    /// # Errors
    ///
    /// Returns `ScenarioError::Io` if the temporary file cannot be removed.
    pub fn abort(mut self) -> ScenarioResult<()> {
        self.writer.take();
        if let Some(temp_path) = self.temp_path.take() {
            if temp_path.exists() {
                fs::remove_file(&temp_path).map_err(|e| ScenarioError::io(&temp_path, e))?;
            }
        }
        Ok(())
    }
}

impl Drop for ArtifactWriter {
    fn drop(&mut self) {
        self.writer.take();
        if let Some(ref temp_path) = self.temp_path {
            if temp_path.exists() {
                debug!(path = %temp_path.display(), "removing abandoned artifact");
                let _ = fs::remove_file(temp_path);
            }
        }
    }
}

/// Writes `bytes` to `path` atomically.
///
/// # Errors
///
/// Returns `ScenarioError::Io` on failure; the destination is left untouched.
pub fn write_atomic(path: impl Into<PathBuf>, bytes: &[u8]) -> ScenarioResult<PathBuf> {
    let mut writer = ArtifactWriter::create(path)?;
    writer.write(bytes)?;
    writer.commit()
}
