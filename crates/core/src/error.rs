use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HighlightError {
    #[error("Upload failed for {path}: {reason}")]
    UploadFailed { path: PathBuf, reason: String },

    #[error("Transcript fetch failed for job {job_id}: {reason}")]
    TranscriptFetchFailed { job_id: String, reason: String },

    #[error("Transcript response missing {field}")]
    MalformedResponse { field: &'static str },

    #[error("Media retrieval failed for {url}: {reason}")]
    MediaFetchFailed { url: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, HighlightError>;
