use serde::{Deserialize, Serialize};

/// A single transcript sentence. `is_highlight` is the only mutable field,
/// and only through [`crate::store::TranscriptStore::toggle_highlight`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sentence {
    pub id: String,
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub is_highlight: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub title: String,
    pub sentences: Vec<Sentence>,
}

/// Complete transcript for one video. Sentence ids are unique across the
/// whole transcript, not just within a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    pub video_id: String,
    pub title: String,
    pub duration: f64,
    pub sections: Vec<Section>,
}

/// Flat projection of one highlighted sentence, carrying its parent section.
/// Derived from a [`Transcript`], never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightSegment {
    pub sentence_id: String,
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub section_id: String,
    pub section_title: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewState {
    #[default]
    Upload,
    Processing,
    Editor,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStep {
    #[default]
    Idle,
    Upload,
    Transcript,
    Finalizing,
}

/// Successful payload of the transcript fetch: the transcript itself plus
/// the location the media bytes can be retrieved from.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptResponse {
    pub transcript: Transcript,
    pub video_url: String,
}
