use std::path::Path;
use tracing::debug;

use crate::error::{RecorderError, RecorderResult};

/// Persists a finished recording
#[async_trait::async_trait]
pub trait FileWriter: Send + Sync {
    async fn write(&self, path: &Path, bytes: &[u8]) -> RecorderResult<()>;
}

/// Writes recordings to the local filesystem, creating missing parent directories
#[derive(Debug, Default, Clone, Copy)]
pub struct FsFileWriter;

#[async_trait::async_trait]
impl FileWriter for FsFileWriter {
    async fn write(&self, path: &Path, bytes: &[u8]) -> RecorderResult<()> {
        let failure = |e: std::io::Error| RecorderError::WriteFailure {
            path: path.display().to_string(),
            message: e.to_string(),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(failure)?;
        }

        tokio::fs::write(path, bytes).await.map_err(failure)?;
        debug!("Wrote {} bytes to {}", bytes.len(), path.display());

        Ok(())
    }
}
