use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;

use crate::segments::next_segment_after;
use crate::store::TranscriptStore;

/// How close to a segment's end counts as having reached it.
pub const END_TOLERANCE: f64 = 0.05;

/// Store/element divergence beyond which the controller reconciles the
/// element with a programmatic seek.
pub const SEEK_THRESHOLD: f64 = 0.1;

/// Suppression window after an auto-skip seek.
const SEEK_RESET_DELAY: Duration = Duration::from_millis(300);

/// Grace after the element reports a store-driven seek complete.
const SEEKED_RESET_DELAY: Duration = Duration::from_millis(200);

/// Live media element the controller drives. The element's native event
/// stream arrives separately as ordered [`MediaEvent`]s.
pub trait MediaElement: Send {
    fn position(&self) -> f64;
    fn seek(&mut self, time: f64);
    fn play(&mut self);
    fn pause(&mut self);
}

/// Native media element events, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    TimeUpdate(f64),
    Seeked(f64),
    Error(String),
}

/// User-invoked playback commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    TogglePlayPause,
}

/// Where playhead authority currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncPhase {
    /// No media element bound.
    Idle,
    /// The element's native time updates drive the store.
    Following,
    /// A programmatic seek is in flight; native time updates are suppressed
    /// until the pending reset fires.
    ExternalSeek,
}

/// How the pending return to [`SyncPhase::Following`] is armed. At most one
/// reset is pending; arming a new one replaces (cancels) the previous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResetArm {
    None,
    /// Fixed timer (auto-skip seeks).
    Deadline(Instant),
    /// Wait for the element's seek-complete event, then a short grace timer
    /// (store-driven seeks).
    OnSeeked,
}

/// State machine mediating between a media element's native event stream
/// and the store's playhead intent. Auto-skips gaps between highlights
/// during playback, loops from the last highlight back to the first, and
/// suppresses the element's own events while a programmatic seek settles so
/// the two event sources cannot feed back into each other.
pub struct PlaybackController<M: MediaElement> {
    store: TranscriptStore,
    media: Option<M>,
    phase: SyncPhase,
    reset: ResetArm,
}

impl<M: MediaElement> PlaybackController<M> {
    pub fn new(store: TranscriptStore) -> Self {
        Self {
            store,
            media: None,
            phase: SyncPhase::Idle,
            reset: ResetArm::None,
        }
    }

    /// Attach the live element and start following its time updates.
    pub fn bind(&mut self, media: M) {
        self.media = Some(media);
        self.phase = SyncPhase::Following;
    }

    pub fn handle_media_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::TimeUpdate(t) => self.on_time_update(t),
            MediaEvent::Seeked(t) => self.on_seeked(t),
            MediaEvent::Error(message) => {
                tracing::warn!(%message, "Media element reported an error");
                self.store.set_is_playing(false);
            }
        }
    }

    pub fn handle_command(&mut self, command: PlayerCommand) {
        match command {
            PlayerCommand::TogglePlayPause => self.toggle_play_pause(),
        }
    }

    fn toggle_play_pause(&mut self) {
        let Some(media) = self.media.as_mut() else {
            return;
        };
        if self.store.snapshot().is_playing {
            media.pause();
            self.store.set_is_playing(false);
        } else {
            media.play();
            self.store.set_is_playing(true);
        }
    }

    fn on_time_update(&mut self, t: f64) {
        if self.phase != SyncPhase::Following {
            return;
        }

        self.store.set_current_time(t);

        let state = self.store.snapshot();
        let segments = state.highlight_segments;
        let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
            return;
        };
        let playing = state.is_playing;

        // Tail of the last highlight: loop back to the first while playing,
        // otherwise stop.
        if t >= last.end - END_TOLERANCE {
            if playing {
                let (start, id) = (first.start, first.sentence_id.clone());
                self.external_seek(start, Some(id), timer_reset());
            } else {
                if let Some(media) = self.media.as_mut() {
                    media.pause();
                }
                self.store.set_is_playing(false);
            }
            return;
        }

        let current = segments
            .iter()
            .enumerate()
            .find(|(_, segment)| t >= segment.start && t < segment.end);

        // In a gap between highlights: jump to the next one.
        let Some((index, current)) = current else {
            if !playing {
                return;
            }
            if let Some(next) = next_segment_after(&segments, t) {
                let (start, id) = (next.start, next.sentence_id.clone());
                self.external_seek(start, Some(id), timer_reset());
            }
            return;
        };

        // Tail of the current highlight: advance, or loop from the last.
        if t >= current.end - END_TOLERANCE {
            if playing {
                let target = segments.get(index + 1).unwrap_or(first);
                let (start, id) = (target.start, target.sentence_id.clone());
                self.external_seek(start, Some(id), timer_reset());
            }
            return;
        }

        if state.active_sentence_id.as_deref() != Some(current.sentence_id.as_str()) {
            self.store
                .set_active_sentence_id(Some(current.sentence_id.clone()));
        }
    }

    fn on_seeked(&mut self, _t: f64) {
        if self.phase == SyncPhase::ExternalSeek && self.reset == ResetArm::OnSeeked {
            self.reset = ResetArm::Deadline(Instant::now() + SEEKED_RESET_DELAY);
        }
    }

    /// Store playhead moved. While a programmatic seek is in flight the
    /// check is deferred to the phase reset; a divergence that survives it
    /// is picked up there.
    fn reconcile_to(&mut self, target: f64) {
        if self.phase == SyncPhase::ExternalSeek {
            return;
        }
        let Some(media) = self.media.as_ref() else {
            return;
        };
        if (media.position() - target).abs() <= SEEK_THRESHOLD {
            return;
        }
        tracing::debug!(
            seek_to = target,
            position = media.position(),
            "Reconciling element to store seek"
        );
        self.external_seek(target, None, ResetArm::OnSeeked);
    }

    fn on_reset_elapsed(&mut self) {
        self.reset = ResetArm::None;
        if self.phase == SyncPhase::Idle {
            return;
        }
        self.phase = SyncPhase::Following;
        // A store seek that arrived during the suppression window still
        // needs the element moved.
        let target = self.store.snapshot().current_time;
        self.reconcile_to(target);
    }

    /// Programmatic seek: move the element, mirror the target into the
    /// store so element and store agree, and arm the reset back to
    /// `Following`. Arming replaces any pending reset.
    fn external_seek(&mut self, time: f64, sentence_id: Option<String>, reset: ResetArm) {
        let Some(media) = self.media.as_mut() else {
            return;
        };
        self.phase = SyncPhase::ExternalSeek;
        media.seek(time);
        self.store.set_current_time(time);
        if let Some(id) = sentence_id {
            self.store.set_active_sentence_id(Some(id));
        }
        self.reset = reset;
    }

    /// Event loop: native media events, user commands, store changes, and
    /// the pending reset deadline, processed in arrival order until the
    /// shutdown signal or a closed channel. Dropping out of the loop also
    /// drops any pending reset unfired.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<MediaEvent>,
        mut commands: mpsc::Receiver<PlayerCommand>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let mut store_rx = self.store.subscribe();
        let mut last_store_time = store_rx.borrow().current_time;

        loop {
            let deadline = match self.reset {
                ResetArm::Deadline(at) => Some(at),
                _ => None,
            };

            tokio::select! {
                _ = shutdown.recv() => return Ok(()),
                event = events.recv() => match event {
                    Some(event) => self.handle_media_event(event),
                    None => return Ok(()),
                },
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => return Ok(()),
                },
                changed = store_rx.changed() => {
                    if changed.is_err() {
                        return Ok(());
                    }
                    let time = store_rx.borrow_and_update().current_time;
                    if time != last_store_time {
                        last_store_time = time;
                        self.reconcile_to(time);
                    }
                },
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.on_reset_elapsed();
                },
            }
        }
    }
}

fn timer_reset() -> ResetArm {
    ResetArm::Deadline(Instant::now() + SEEK_RESET_DELAY)
}
