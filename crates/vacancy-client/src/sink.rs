use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use vacancy_core::error::AppError;
use vacancy_core::models::{BlobTarget, compute_hash};
use vacancy_core::traits::Sink;

/// Writes the snapshot to `<root>/<container>/<blob>` on the local filesystem.
///
/// The previous snapshot is always overwritten. The payload goes to a
/// temporary sibling first and is renamed into place, so readers never see a
/// half-written file.
#[derive(Debug, Clone)]
pub struct FsSink {
    root: PathBuf,
}

impl FsSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, target: &BlobTarget) -> PathBuf {
        self.root.join(&target.container).join(&target.blob)
    }
}

fn sink_error(action: &str, path: &Path, e: std::io::Error) -> AppError {
    AppError::Sink(format!("Failed to {action} {}: {e}", path.display()))
}

impl Sink for FsSink {
    async fn upload(&self, target: &BlobTarget, payload: &[u8]) -> Result<(), AppError> {
        let path = self.path_for(target);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| sink_error("create directory", dir, e))?;
        }

        let new_hash = compute_hash(payload);
        let previous_hash = match tokio::fs::read(&path).await {
            Ok(existing) => Some(compute_hash(&existing)),
            Err(_) => None,
        };
        let changed = previous_hash.as_deref() != Some(new_hash.as_str());

        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, payload)
            .await
            .map_err(|e| sink_error("write", &tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| sink_error("replace", &path, e))?;

        tracing::info!(
            path = %path.display(),
            bytes = payload.len(),
            hash = %new_hash,
            changed,
            "Snapshot written"
        );
        Ok(())
    }
}

/// Prints the snapshot to stdout, for piping into other tools.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl Sink for StdoutSink {
    async fn upload(&self, target: &BlobTarget, payload: &[u8]) -> Result<(), AppError> {
        let mut out = tokio::io::stdout();
        out.write_all(payload)
            .await
            .map_err(|e| AppError::Sink(format!("Failed to write to stdout: {e}")))?;
        out.write_all(b"\n")
            .await
            .map_err(|e| AppError::Sink(format!("Failed to write to stdout: {e}")))?;
        out.flush()
            .await
            .map_err(|e| AppError::Sink(format!("Failed to flush stdout: {e}")))?;

        tracing::debug!(
            container = %target.container,
            blob = %target.blob,
            bytes = payload.len(),
            "Snapshot printed"
        );
        Ok(())
    }
}
