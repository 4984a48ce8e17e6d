use super::TranscriptionError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Runs `ffmpeg` to pull a 16 kHz mono WAV track out of any media container.
#[derive(Debug, Clone)]
pub struct AudioExtractor {
    ffmpeg: PathBuf,
}

impl AudioExtractor {
    /// Use the `ffmpeg` executable at `ffmpeg` (a bare name is looked up on `PATH`).
    pub fn new(ffmpeg: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
        }
    }

    /// Decode `input` and write its audio track to `output`.
    pub async fn extract_audio(&self, input: &Path, output: &Path) -> Result<(), TranscriptionError> {
        let result = Command::new(&self.ffmpeg)
            .args(["-y", "-nostdin", "-loglevel", "error", "-i"])
            .arg(input)
            .args(["-vn", "-ac", "1", "-ar", "16000", "-f", "wav"])
            .arg(output)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|error| match error.kind() {
                ErrorKind::NotFound => TranscriptionError::AudioExtraction(format!(
                    "ffmpeg not found at '{}'",
                    self.ffmpeg.display()
                )),
                _ => TranscriptionError::Io(error),
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(TranscriptionError::AudioExtraction(format!(
                "ffmpeg exited with {}: {}",
                result.status,
                stderr.trim()
            )));
        }

        tracing::debug!(input = %input.display(), output = %output.display(), "Extracted audio track");
        Ok(())
    }
}
