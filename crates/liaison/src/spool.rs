use std::io::Write;
use std::path::PathBuf;

use crate::config::SpoolConfig;
use crate::error::Error;

/// Writes oversized tool output to temp storage so the full payload stays
/// retrievable after truncation shrinks what the backend sees.
pub struct Spool {
    config: SpoolConfig,
}

impl Spool {
    pub fn new(config: SpoolConfig) -> Self {
        Self { config }
    }

    /// Spool `content` if spooling is enabled and the payload crosses the
    /// configured byte threshold. Returns the path of the spooled file, or
    /// `None` when nothing was written.
    pub fn maybe_spool(&self, tool_name: &str, content: &str) -> Result<Option<PathBuf>, Error> {
        if !self.config.enabled || content.len() < self.config.threshold_bytes {
            return Ok(None);
        }

        let dir = self
            .config
            .dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        std::fs::create_dir_all(&dir)
            .map_err(|e| Error::Spool(format!("failed to create {}: {e}", dir.display())))?;

        let mut file = tempfile::Builder::new()
            .prefix(&format!("liaison-{tool_name}-"))
            .suffix(".txt")
            .tempfile_in(&dir)
            .map_err(|e| Error::Spool(format!("failed to create spool file: {e}")))?;
        file.write_all(content.as_bytes())
            .map_err(|e| Error::Spool(format!("failed to write spool file: {e}")))?;

        // keep() detaches the file from the guard so it survives this call
        let (_, path) = file
            .keep()
            .map_err(|e| Error::Spool(format!("failed to persist spool file: {e}")))?;

        tracing::debug!(
            tool = tool_name,
            bytes = content.len(),
            path = %path.display(),
            "spooled oversized tool output"
        );
        Ok(Some(path))
    }
}
