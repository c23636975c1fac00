//! Transient on-disk staging for uploaded audio
//!
//! The staged file lives exactly as long as its `StagedAudio` handle: it is
//! removed on drop, so every exit path of a request releases it.

use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

const STAGING_PREFIX: &str = "ffx-audio-";
const DEFAULT_EXTENSION: &str = "wav";

/// Uploaded audio written to a temporary file
#[derive(Debug)]
pub struct StagedAudio {
    file: NamedTempFile,
    file_name: String,
}

impl StagedAudio {
    /// Write `audio` to a fresh temporary file
    ///
    /// The extension of `original_name` is kept so the scoring service can
    /// sniff the container format.
    pub fn stage(audio: &[u8], original_name: Option<&str>) -> std::io::Result<Self> {
        let extension = original_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or(DEFAULT_EXTENSION)
            .to_ascii_lowercase();

        let mut file = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(&format!(".{}", extension))
            .tempfile()?;
        file.write_all(audio)?;
        file.flush()?;

        let file_name = format!("recording.{}", extension);

        tracing::debug!(
            path = %file.path().display(),
            bytes = audio.len(),
            "Staged uploaded audio"
        );

        Ok(Self { file, file_name })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Filename to present in the outbound multipart upload
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Read the staged audio back for transmission
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(self.path()).await
    }

    /// Delete the staged file now, surfacing any removal error
    pub fn release(self) -> std::io::Result<()> {
        let path = self.file.path().to_path_buf();
        self.file.close()?;
        tracing::debug!(path = %path.display(), "Released staged audio");
        Ok(())
    }
}
