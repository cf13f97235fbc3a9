use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{HighlightError, Result};
use crate::media::MediaHandle;
use crate::types::{Transcript, TranscriptResponse};

/// Backend collaborator the load workflow talks to: upload transport,
/// transcript fetch, and media byte retrieval.
#[async_trait]
pub trait TranscriptBackend: Send + Sync {
    /// Upload the video and return the processing job id.
    async fn upload_video(&self, video: &Path) -> Result<String>;

    /// Fetch the generated transcript and the media location for a job.
    async fn fetch_transcript(&self, job_id: &str) -> Result<TranscriptResponse>;

    /// Retrieve the media bytes behind `location` into a locally-owned
    /// playable handle.
    async fn fetch_media(&self, location: &str) -> Result<MediaHandle>;
}

#[derive(Deserialize)]
struct UploadResponse {
    id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTranscriptResponse {
    transcript: Option<Transcript>,
    video_url: Option<String>,
}

/// HTTP implementation of [`TranscriptBackend`]. `base_url` is the backend
/// origin; endpoints live under `/api`, media locations are resolved
/// against the same origin.
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn resolve(&self, location: &str) -> String {
        if location.starts_with("http://") || location.starts_with("https://") {
            location.to_string()
        } else {
            format!("{}/{}", self.base_url, location.trim_start_matches('/'))
        }
    }
}

#[async_trait]
impl TranscriptBackend for ApiClient {
    async fn upload_video(&self, video: &Path) -> Result<String> {
        let bytes = tokio::fs::read(video).await?;
        let file_name = video
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.mp4".to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(bytes).file_name(file_name));

        let response = self
            .client
            .post(format!("{}/api/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(HighlightError::UploadFailed {
                path: video.to_path_buf(),
                reason: format!("status {}", response.status()),
            });
        }

        let payload: UploadResponse = response.json().await?;
        payload
            .id
            .ok_or(HighlightError::MalformedResponse { field: "id" })
    }

    async fn fetch_transcript(&self, job_id: &str) -> Result<TranscriptResponse> {
        let response = self
            .client
            .get(format!("{}/api/transcript/{}", self.base_url, job_id))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(HighlightError::TranscriptFetchFailed {
                job_id: job_id.to_string(),
                reason: format!("status {}", response.status()),
            });
        }

        let payload: RawTranscriptResponse = response.json().await?;
        let transcript = payload
            .transcript
            .ok_or(HighlightError::MalformedResponse {
                field: "transcript",
            })?;
        let video_url = payload
            .video_url
            .ok_or(HighlightError::MalformedResponse { field: "videoUrl" })?;

        Ok(TranscriptResponse {
            transcript,
            video_url,
        })
    }

    async fn fetch_media(&self, location: &str) -> Result<MediaHandle> {
        let url = self.resolve(location);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(HighlightError::MediaFetchFailed {
                url,
                reason: format!("status {}", response.status()),
            });
        }

        let bytes = response.bytes().await?;
        let suffix = Path::new(location)
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_else(|| "bin".to_string());
        MediaHandle::from_bytes(&bytes, &suffix).await
    }
}
