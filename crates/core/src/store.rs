use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;

use crate::api::TranscriptBackend;
use crate::error::Result;
use crate::media::MediaHandle;
use crate::segments::{highlight_segments, next_segment_after, previous_segment_before};
use crate::types::{HighlightSegment, ProcessingStep, Transcript, ViewState};

/// Pause before the editor appears, so the finalizing step is perceptible.
const FINALIZING_DELAY: Duration = Duration::from_millis(300);

/// Jumping to the previous highlight looks back from slightly before the
/// playhead, so a segment that just started still counts as "current".
const REWIND_GRACE: f64 = 3.0;

/// Snapshot of everything consumers render from. Published on the store's
/// watch channel after every mutation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorState {
    pub transcript: Option<Transcript>,
    pub video_path: Option<PathBuf>,
    pub view_state: ViewState,
    pub processing_step: ProcessingStep,
    pub current_time: f64,
    pub is_playing: bool,
    pub active_sentence_id: Option<String>,
    pub highlight_segments: Vec<HighlightSegment>,
}

struct StoreState {
    editor: EditorState,
    media: Option<MediaHandle>,
}

struct StoreInner {
    state: Mutex<StoreState>,
    editor_tx: watch::Sender<EditorState>,
    load_generation: AtomicU64,
}

/// Process-wide editor state. All mutation goes through the methods below;
/// each one recomputes derived state where needed and publishes a fresh
/// snapshot atomically. Handles are cheap to clone.
#[derive(Clone)]
pub struct TranscriptStore {
    inner: Arc<StoreInner>,
}

impl TranscriptStore {
    pub fn new() -> Self {
        let (editor_tx, _) = watch::channel(EditorState::default());
        Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(StoreState {
                    editor: EditorState::default(),
                    media: None,
                }),
                editor_tx,
                load_generation: AtomicU64::new(0),
            }),
        }
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> EditorState {
        self.inner.editor_tx.borrow().clone()
    }

    /// Watch channel receiving a snapshot after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<EditorState> {
        self.inner.editor_tx.subscribe()
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut StoreState) -> R) -> R {
        let mut state = self.inner.state.lock().expect("transcript store poisoned");
        let result = f(&mut state);
        let snapshot = state.editor.clone();
        drop(state);
        self.inner.editor_tx.send_replace(snapshot);
        result
    }

    /// Like [`Self::mutate`], but only while `generation` is still the
    /// newest load. A superseded workflow must not touch state a newer one
    /// owns.
    fn mutate_if_current<R>(
        &self,
        generation: u64,
        f: impl FnOnce(&mut StoreState) -> R,
    ) -> Option<R> {
        let mut state = self.inner.state.lock().expect("transcript store poisoned");
        if self.inner.load_generation.load(Ordering::Relaxed) != generation {
            return None;
        }
        let result = f(&mut state);
        let snapshot = state.editor.clone();
        drop(state);
        self.inner.editor_tx.send_replace(snapshot);
        Some(result)
    }

    /// Run the full load workflow: upload, transcript fetch, media
    /// retrieval, commit. Failures revert to the initial upload view and are
    /// logged, never returned; the UI observes state, not errors.
    pub async fn load_transcript(&self, backend: &dyn TranscriptBackend, video: &Path) {
        let generation = self.inner.load_generation.fetch_add(1, Ordering::Relaxed) + 1;

        self.mutate(|state| {
            if let Some(old) = state.media.take() {
                tracing::debug!(path = %old.path().display(), "Releasing superseded media handle");
            }
            state.editor.video_path = None;
            state.editor.view_state = ViewState::Processing;
            state.editor.processing_step = ProcessingStep::Upload;
        });

        if let Err(error) = self.run_load(backend, video, generation).await {
            tracing::error!(error = %error, video = %video.display(), "Failed to load transcript");
            self.mutate_if_current(generation, |state| {
                state.media = None;
                state.editor = EditorState::default();
            });
        }
    }

    async fn run_load(
        &self,
        backend: &dyn TranscriptBackend,
        video: &Path,
        generation: u64,
    ) -> Result<()> {
        let job_id = backend.upload_video(video).await?;

        if self
            .mutate_if_current(generation, |state| {
                state.editor.processing_step = ProcessingStep::Transcript;
            })
            .is_none()
        {
            tracing::debug!(generation, "Ignoring superseded load after upload");
            return Ok(());
        }

        let response = backend.fetch_transcript(&job_id).await?;
        let media = backend.fetch_media(&response.video_url).await?;

        if self
            .mutate_if_current(generation, |state| {
                state.editor.processing_step = ProcessingStep::Finalizing;
            })
            .is_none()
        {
            tracing::debug!(generation, "Ignoring superseded load after fetch");
            return Ok(());
        }

        tokio::time::sleep(FINALIZING_DELAY).await;

        let committed = self.mutate_if_current(generation, |state| {
            let segments = highlight_segments(Some(&response.transcript));
            tracing::info!(
                video_id = %response.transcript.video_id,
                sections = response.transcript.sections.len(),
                highlights = segments.len(),
                "Transcript loaded"
            );
            state.editor.video_path = Some(media.path().to_path_buf());
            state.media = Some(media);
            state.editor.transcript = Some(response.transcript);
            state.editor.highlight_segments = segments;
            state.editor.current_time = 0.0;
            state.editor.is_playing = false;
            state.editor.active_sentence_id = None;
            state.editor.view_state = ViewState::Editor;
            state.editor.processing_step = ProcessingStep::Idle;
        });
        if committed.is_none() {
            tracing::debug!(generation, "Discarding superseded load at commit");
        }
        Ok(())
    }

    /// Flip the highlight flag on the sentence with `sentence_id` (first id
    /// match) and recompute the derived segments. No-op without a
    /// transcript.
    pub fn toggle_highlight(&self, sentence_id: &str) {
        self.mutate(|state| {
            let Some(transcript) = state.editor.transcript.as_mut() else {
                return;
            };
            'sections: for section in &mut transcript.sections {
                for sentence in &mut section.sentences {
                    if sentence.id == sentence_id {
                        sentence.is_highlight = !sentence.is_highlight;
                        break 'sections;
                    }
                }
            }
            state.editor.highlight_segments = highlight_segments(state.editor.transcript.as_ref());
        });
    }

    pub fn set_current_time(&self, time: f64) {
        self.mutate(|state| state.editor.current_time = time);
    }

    pub fn set_is_playing(&self, playing: bool) {
        self.mutate(|state| state.editor.is_playing = playing);
    }

    pub fn set_active_sentence_id(&self, id: Option<String>) {
        self.mutate(|state| state.editor.active_sentence_id = id);
    }

    /// Move the playhead to the start of the sentence with `sentence_id`.
    /// Returns the new playhead position, or `None` when the id is unknown
    /// or no transcript is loaded.
    pub fn seek_to_sentence(&self, sentence_id: &str) -> Option<f64> {
        self.mutate(|state| {
            let start = state.editor.transcript.as_ref().and_then(|transcript| {
                transcript
                    .sections
                    .iter()
                    .flat_map(|section| &section.sentences)
                    .find(|sentence| sentence.id == sentence_id)
                    .map(|sentence| sentence.start)
            });
            if let Some(start) = start {
                state.editor.current_time = start;
            }
            start
        })
    }

    /// Jump to the next highlight after the playhead, if any.
    pub fn seek_to_next_highlight(&self) -> Option<f64> {
        self.mutate(|state| {
            let start =
                next_segment_after(&state.editor.highlight_segments, state.editor.current_time)
                    .map(|segment| segment.start);
            if let Some(start) = start {
                state.editor.current_time = start;
            }
            start
        })
    }

    /// Jump to the previous highlight, looking back from
    /// `current_time - REWIND_GRACE`.
    pub fn seek_to_previous_highlight(&self) -> Option<f64> {
        self.mutate(|state| {
            let start = previous_segment_before(
                &state.editor.highlight_segments,
                state.editor.current_time - REWIND_GRACE,
            )
            .map(|segment| segment.start);
            if let Some(start) = start {
                state.editor.current_time = start;
            }
            start
        })
    }

    /// Release the media handle and restore every field to its initial
    /// value.
    pub fn reset(&self) {
        self.mutate(|state| {
            if let Some(handle) = state.media.take() {
                tracing::debug!(path = %handle.path().display(), "Releasing media handle on reset");
            }
            state.editor = EditorState::default();
        });
    }

    #[cfg(test)]
    pub(crate) fn install_transcript(&self, transcript: Transcript) {
        self.mutate(|state| {
            state.editor.highlight_segments = highlight_segments(Some(&transcript));
            state.editor.transcript = Some(transcript);
            state.editor.view_state = ViewState::Editor;
        });
    }
}

impl Default for TranscriptStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::error::HighlightError;
    use crate::types::{Section, Sentence, TranscriptResponse};

    fn sentence(id: &str, start: f64, end: f64, is_highlight: bool) -> Sentence {
        Sentence {
            id: id.to_string(),
            start,
            end,
            text: format!("sentence {id}"),
            is_highlight,
        }
    }

    fn transcript() -> Transcript {
        Transcript {
            video_id: "v1".to_string(),
            title: "Demo".to_string(),
            duration: 30.0,
            sections: vec![Section {
                id: "sec1".to_string(),
                title: "Intro".to_string(),
                sentences: vec![
                    sentence("s1", 0.0, 5.0, false),
                    sentence("s2", 5.0, 10.0, true),
                    sentence("s3", 10.0, 15.0, false),
                ],
            }],
        }
    }

    struct StubBackend {
        fail_upload: bool,
        upload_delay: Duration,
    }

    impl StubBackend {
        fn ok() -> Self {
            Self {
                fail_upload: false,
                upload_delay: Duration::ZERO,
            }
        }

        fn failing() -> Self {
            Self {
                fail_upload: true,
                ..Self::ok()
            }
        }

        fn slow_failing(delay: Duration) -> Self {
            Self {
                fail_upload: true,
                upload_delay: delay,
            }
        }
    }

    #[async_trait]
    impl TranscriptBackend for StubBackend {
        async fn upload_video(&self, video: &Path) -> crate::error::Result<String> {
            if !self.upload_delay.is_zero() {
                tokio::time::sleep(self.upload_delay).await;
            }
            if self.fail_upload {
                return Err(HighlightError::UploadFailed {
                    path: video.to_path_buf(),
                    reason: "status 500 Internal Server Error".to_string(),
                });
            }
            Ok("job-1".to_string())
        }

        async fn fetch_transcript(&self, _job_id: &str) -> crate::error::Result<TranscriptResponse> {
            Ok(TranscriptResponse {
                transcript: transcript(),
                video_url: "/videos/demo.mp4".to_string(),
            })
        }

        async fn fetch_media(&self, _location: &str) -> crate::error::Result<MediaHandle> {
            MediaHandle::from_bytes(b"demo-bytes", "mp4").await
        }
    }

    #[tokio::test]
    async fn load_commits_transcript_and_derived_segments() {
        let store = TranscriptStore::new();
        let backend = StubBackend::ok();

        store.load_transcript(&backend, Path::new("demo.mp4")).await;

        let state = store.snapshot();
        assert_eq!(state.view_state, ViewState::Editor);
        assert_eq!(state.processing_step, ProcessingStep::Idle);
        assert!(state.transcript.is_some());
        assert_eq!(state.highlight_segments.len(), 1);
        assert_eq!(state.highlight_segments[0].sentence_id, "s2");
        assert_eq!(state.current_time, 0.0);
        assert!(!state.is_playing);
        assert!(state.active_sentence_id.is_none());
        let video_path = state.video_path.expect("media handle committed");
        assert!(video_path.exists());
    }

    #[tokio::test]
    async fn failed_load_reverts_to_the_full_initial_state() {
        let store = TranscriptStore::new();
        let backend = StubBackend::failing();

        store.load_transcript(&backend, Path::new("demo.mp4")).await;

        assert_eq!(store.snapshot(), EditorState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_load_cannot_corrupt_a_newer_one() {
        let store = TranscriptStore::new();
        let slow = StubBackend::slow_failing(Duration::from_secs(5));
        let fast = StubBackend::ok();

        let stale = {
            let store = store.clone();
            tokio::spawn(async move { store.load_transcript(&slow, Path::new("old.mp4")).await })
        };
        tokio::task::yield_now().await;
        store.load_transcript(&fast, Path::new("new.mp4")).await;
        stale.await.expect("stale load task");

        // The stale failure must not have wiped the committed editor state.
        let state = store.snapshot();
        assert_eq!(state.view_state, ViewState::Editor);
        assert!(state.transcript.is_some());
    }

    #[tokio::test]
    async fn replacing_a_load_releases_the_previous_media_handle() {
        let store = TranscriptStore::new();
        let backend = StubBackend::ok();

        store.load_transcript(&backend, Path::new("a.mp4")).await;
        let first_path = store.snapshot().video_path.expect("first media");
        assert!(first_path.exists());

        store.load_transcript(&backend, Path::new("b.mp4")).await;
        assert!(!first_path.exists());
        let second_path = store.snapshot().video_path.expect("second media");
        assert!(second_path.exists());
    }

    #[test]
    fn toggle_highlight_twice_round_trips() {
        let store = TranscriptStore::new();
        store.install_transcript(transcript());
        let original = store.snapshot();

        store.toggle_highlight("s1");
        let toggled = store.snapshot();
        assert_eq!(toggled.highlight_segments.len(), 2);
        assert_eq!(toggled.highlight_segments[0].sentence_id, "s1");

        store.toggle_highlight("s1");
        let restored = store.snapshot();
        assert_eq!(restored.highlight_segments, original.highlight_segments);
        assert_eq!(restored.transcript, original.transcript);
    }

    #[test]
    fn toggle_highlight_without_transcript_is_a_noop() {
        let store = TranscriptStore::new();
        store.toggle_highlight("s1");
        assert_eq!(store.snapshot(), EditorState::default());
    }

    #[test]
    fn seek_to_sentence_moves_the_playhead() {
        let store = TranscriptStore::new();
        store.install_transcript(transcript());

        assert_eq!(store.seek_to_sentence("s3"), Some(10.0));
        assert_eq!(store.snapshot().current_time, 10.0);

        assert_eq!(store.seek_to_sentence("missing"), None);
        assert_eq!(store.snapshot().current_time, 10.0);
    }

    #[test]
    fn highlight_navigation_moves_between_segments() {
        let store = TranscriptStore::new();
        let mut t = transcript();
        t.sections[0].sentences[2].is_highlight = true; // s2 and s3 highlighted
        store.install_transcript(t);

        assert_eq!(store.seek_to_next_highlight(), Some(5.0));
        assert_eq!(store.seek_to_next_highlight(), Some(10.0));
        assert_eq!(store.seek_to_next_highlight(), None);

        // Within the rewind grace of s3's start, previous lands on s2.
        assert_eq!(store.seek_to_previous_highlight(), Some(5.0));
        assert_eq!(store.seek_to_previous_highlight(), None);
    }

    #[tokio::test]
    async fn reset_restores_initial_state_and_releases_media() {
        let store = TranscriptStore::new();
        let backend = StubBackend::ok();
        store.load_transcript(&backend, Path::new("demo.mp4")).await;
        let video_path: PathBuf = store.snapshot().video_path.expect("media");

        store.set_current_time(12.0);
        store.set_is_playing(true);
        store.set_active_sentence_id(Some("s2".to_string()));
        store.reset();

        assert_eq!(store.snapshot(), EditorState::default());
        assert!(!video_path.exists());
    }

    #[test]
    fn watch_subscribers_see_mutations() {
        let store = TranscriptStore::new();
        let rx = store.subscribe();

        store.set_current_time(3.5);
        assert_eq!(rx.borrow().current_time, 3.5);

        store.set_is_playing(true);
        assert!(rx.borrow().is_playing);
    }
}
