//! Event system: crossterm event reader running in a background tokio task.
//!
//! Produces terminal events (key, resize) plus tick/render events at
//! fixed intervals via `tokio::sync::mpsc`. Live data does not pass
//! through here; it arrives on the action channel from the data bridge.

use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Tick interval: notification expiry, throbbers and the clip pulse (4 Hz).
pub const TICK_RATE: Duration = Duration::from_millis(250);

/// Render interval (~30 FPS), fast enough for the video frame counter.
pub const RENDER_RATE: Duration = Duration::from_millis(33);

/// Events produced by the terminal event reader.
#[derive(Debug, PartialEq, Eq)]
pub enum Event {
    /// A key was pressed. Releases and repeats are filtered out.
    Key(KeyEvent),
    /// Terminal was resized to (cols, rows).
    Resize(u16, u16),
    /// Periodic tick for time-based UI state.
    Tick,
    /// Redraw request.
    Render,
}

impl Event {
    /// Map a raw terminal event. Mouse, focus and paste events are dropped
    /// since the dashboard does not capture them.
    fn from_terminal(event: CrosstermEvent) -> Option<Self> {
        match event {
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Some(Self::Key(key)),
            CrosstermEvent::Resize(w, h) => Some(Self::Resize(w, h)),
            _ => None,
        }
    }
}

/// Reads terminal events in a background task and sends them over a channel.
pub struct EventReader {
    rx: mpsc::UnboundedReceiver<Event>,
    cancel: CancellationToken,
}

impl EventReader {
    /// Spawn the background event reader.
    ///
    /// - `tick_rate`: interval for `Event::Tick` (normally [`TICK_RATE`])
    /// - `render_rate`: interval for `Event::Render` (normally [`RENDER_RATE`])
    pub fn new(tick_rate: Duration, render_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            let mut terminal = EventStream::new();
            let mut tick_interval = tokio::time::interval(tick_rate);
            let mut render_interval = tokio::time::interval(render_rate);

            // A stalled loop skips missed ticks instead of bursting them
            tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            render_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                let event = tokio::select! {
                    () = task_cancel.cancelled() => break,
                    _ = tick_interval.tick() => Event::Tick,
                    _ = render_interval.tick() => Event::Render,
                    Some(Ok(raw)) = terminal.next() => match Event::from_terminal(raw) {
                        Some(event) => event,
                        None => continue,
                    },
                };

                // Receiver gone: the app loop has exited.
                if tx.send(event).is_err() {
                    break;
                }
            }
        });

        Self { rx, cancel }
    }

    /// Receive the next event. Returns `None` if the reader has stopped.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Signal the background reader to stop.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for EventReader {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
