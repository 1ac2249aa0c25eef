//! Session runtime
//!
//! Executes the effects produced by pure transitions: backend calls run as
//! background tasks so a slow exchange cannot block a clear or hydrate, and
//! their completions re-enter the state machine as events carrying their
//! operation's sequence number. Every state change is published as a
//! snapshot for the rendering layer to project.

pub mod traits;

#[cfg(test)]
pub mod testing;

pub use traits::Backend;

use crate::mood::MoodDisplay;
use crate::session::{transition, Effect, Event, Message, SessionState, UiStatus};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Immutable view of the session for the rendering layer. The rendering
/// layer only ever observes these; errors never escape the state machine
/// as exceptions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub messages: Vec<Message>,
    pub mood: Option<MoodDisplay>,
    pub status: UiStatus,
}

/// Cloneable handle the rendering layer uses to drive the session.
#[derive(Clone)]
pub struct SessionHandle {
    event_tx: mpsc::Sender<Event>,
}

impl SessionHandle {
    pub async fn submit(&self, text: impl Into<String>) {
        self.send(Event::Submit { text: text.into() }).await;
    }

    pub async fn hydrate(&self) {
        self.send(Event::Hydrate).await;
    }

    pub async fn clear(&self) {
        self.send(Event::Clear).await;
    }

    async fn send(&self, event: Event) {
        if self.event_tx.send(event).await.is_err() {
            tracing::warn!("Session runtime is gone; dropping event");
        }
    }
}

/// The session event loop.
pub struct SessionRuntime<B: Backend + 'static> {
    state: SessionState,
    backend: Arc<B>,
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    snapshot_tx: watch::Sender<Snapshot>,
}

impl<B: Backend + 'static> SessionRuntime<B> {
    /// Spawn a runtime, returning the handle and the snapshot stream.
    pub fn spawn(backend: B) -> (SessionHandle, watch::Receiver<Snapshot>) {
        let (event_tx, event_rx) = mpsc::channel(32);
        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::default());

        let runtime = Self {
            state: SessionState::new(),
            backend: Arc::new(backend),
            event_rx,
            event_tx: event_tx.clone(),
            snapshot_tx,
        };
        tokio::spawn(runtime.run());

        (SessionHandle { event_tx }, snapshot_rx)
    }

    async fn run(mut self) {
        tracing::debug!("Session runtime started");
        while let Some(event) = self.event_rx.recv().await {
            self.process(event);
        }
        tracing::debug!("Session runtime stopped");
    }

    fn process(&mut self, event: Event) {
        match transition(&self.state, event) {
            Ok(result) => {
                self.state = result.new_state;
                self.publish();
                for effect in result.effects {
                    self.execute(effect);
                }
            }
            // Rejections are resolved locally: no state change, no call.
            Err(err) => tracing::debug!(reason = %err, "Input rejected"),
        }
    }

    fn publish(&self) {
        let snapshot = Snapshot {
            messages: self.state.messages.clone(),
            mood: self.state.mood.current().cloned(),
            status: self.state.status(),
        };
        let _ = self.snapshot_tx.send(snapshot);
    }

    /// Run one effect as a background task. Completions re-enter through
    /// the event channel tagged with the effect's sequence number.
    fn execute(&self, effect: Effect) {
        let backend = Arc::clone(&self.backend);
        let events = self.event_tx.clone();

        tokio::spawn(async move {
            let start = std::time::Instant::now();
            let event = match effect {
                Effect::SendText { seq, text } => match backend.converse(&text).await {
                    Ok(reply) => Event::ReplyOk { seq, reply },
                    Err(err) => {
                        tracing::error!(seq, error = %err, "Exchange failed");
                        Event::ReplyFailed {
                            seq,
                            message: err.to_string(),
                        }
                    }
                },
                Effect::FetchHistory { seq } => match backend.history().await {
                    Ok((messages, mood)) => Event::HistoryLoaded {
                        seq,
                        messages,
                        mood,
                    },
                    Err(err) => {
                        tracing::error!(seq, error = %err, "History fetch failed");
                        Event::HistoryFailed {
                            seq,
                            message: err.to_string(),
                        }
                    }
                },
                Effect::DeleteHistory { seq } => match backend.delete_history().await {
                    Ok(()) => Event::ClearOk { seq },
                    Err(err) => {
                        tracing::error!(seq, error = %err, "History delete failed");
                        Event::ClearFailed {
                            seq,
                            message: err.to_string(),
                        }
                    }
                },
            };

            tracing::debug!(duration_ms = %start.elapsed().as_millis(), "Backend call finished");
            let _ = events.send(event).await;
        });
    }
}
