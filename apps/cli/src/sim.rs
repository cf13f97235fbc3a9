use std::sync::{Arc, Mutex};
use std::time::Duration;

use reelmark_core::{MediaElement, MediaEvent};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const TICK: Duration = Duration::from_millis(250);

struct ClockState {
    position: f64,
    playing: bool,
    duration: f64,
}

/// Simulated media element: a real-time clock that emits `TimeUpdate`
/// events at the cadence a video element would, and `Seeked` after every
/// programmatic seek. Stands in for actual media decoding in the terminal.
pub struct ClockMedia {
    state: Arc<Mutex<ClockState>>,
    events: mpsc::Sender<MediaEvent>,
}

impl ClockMedia {
    /// Create the clock and start its ticker task. The task ends when the
    /// event channel's receiver side is dropped.
    pub fn spawn(duration: f64, events: mpsc::Sender<MediaEvent>) -> (Self, JoinHandle<()>) {
        let state = Arc::new(Mutex::new(ClockState {
            position: 0.0,
            playing: false,
            duration,
        }));

        let ticker_state = Arc::clone(&state);
        let ticker_events = events.clone();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            loop {
                interval.tick().await;
                let position = {
                    let mut clock = ticker_state.lock().expect("clock state poisoned");
                    if !clock.playing {
                        continue;
                    }
                    clock.position = (clock.position + TICK.as_secs_f64()).min(clock.duration);
                    if clock.position >= clock.duration {
                        clock.playing = false;
                    }
                    clock.position
                };
                if ticker_events
                    .send(MediaEvent::TimeUpdate(position))
                    .await
                    .is_err()
                {
                    break;
                }
            }
        });

        (Self { state, events }, task)
    }
}

impl MediaElement for ClockMedia {
    fn position(&self) -> f64 {
        self.state.lock().expect("clock state poisoned").position
    }

    fn seek(&mut self, time: f64) {
        let clamped = {
            let mut clock = self.state.lock().expect("clock state poisoned");
            clock.position = time.clamp(0.0, clock.duration);
            clock.position
        };
        // A real element reports seek completion asynchronously; mirror that
        // through the event channel.
        let _ = self.events.try_send(MediaEvent::Seeked(clamped));
    }

    fn play(&mut self) {
        self.state.lock().expect("clock state poisoned").playing = true;
    }

    fn pause(&mut self) {
        self.state.lock().expect("clock state poisoned").playing = false;
    }
}
