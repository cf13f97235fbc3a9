use std::path::Path;

use async_trait::async_trait;
use reelmark_core::{MediaHandle, Result, TranscriptBackend, TranscriptResponse};

/// Development stand-in for the real backend: serves the transcript from a
/// `.json` sidecar next to the video file and the media bytes from the file
/// itself, through the same trait the HTTP client implements.
pub struct FileBackend;

#[async_trait]
impl TranscriptBackend for FileBackend {
    async fn upload_video(&self, video: &Path) -> Result<String> {
        // No transport; the "job id" is the video path itself.
        Ok(video.to_string_lossy().into_owned())
    }

    async fn fetch_transcript(&self, job_id: &str) -> Result<TranscriptResponse> {
        let sidecar = Path::new(job_id).with_extension("json");
        let json = tokio::fs::read_to_string(&sidecar).await?;
        let transcript = serde_json::from_str(&json)?;
        Ok(TranscriptResponse {
            transcript,
            video_url: job_id.to_string(),
        })
    }

    async fn fetch_media(&self, location: &str) -> Result<MediaHandle> {
        let bytes = tokio::fs::read(location).await?;
        let suffix = Path::new(location)
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_else(|| "bin".to_string());
        MediaHandle::from_bytes(&bytes, &suffix).await
    }
}
