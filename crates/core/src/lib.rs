pub mod api;
pub mod error;
pub mod format;
pub mod media;
pub mod player;
pub mod segments;
pub mod store;
pub mod types;

pub use api::{ApiClient, TranscriptBackend};
pub use error::{HighlightError, Result};
pub use format::{active_sentence_at, format_time, format_transcript_outline};
pub use media::MediaHandle;
pub use player::{
    END_TOLERANCE, MediaElement, MediaEvent, PlaybackController, PlayerCommand, SEEK_THRESHOLD,
};
pub use segments::{
    CONTAINMENT_TOLERANCE, highlight_segments, is_inside_any, next_segment_after,
    previous_segment_before, should_advance,
};
pub use store::{EditorState, TranscriptStore};
pub use types::{
    HighlightSegment, ProcessingStep, Section, Sentence, Transcript, TranscriptResponse, ViewState,
};
