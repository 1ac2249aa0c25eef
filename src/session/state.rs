//! Session state types

use crate::mood::{MoodSample, MoodTrend};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

/// One entry in the transcript.
///
/// Immutable once appended, except for the pending -> settled flip when the
/// backend acknowledges the exchange. Only user messages are ever pending;
/// assistant messages arrive settled.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub speaker: Speaker,
    pub text: String,
    /// Classification attached to assistant turns. Either both the tag and
    /// the confidence are known or neither is.
    pub annotation: Option<MoodSample>,
    pub pending: bool,
}

impl Message {
    /// A freshly submitted user message, optimistic until reconciled.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            speaker: Speaker::User,
            text: text.into(),
            annotation: None,
            pending: true,
        }
    }

    /// An assistant message, settled on arrival.
    pub fn assistant(text: impl Into<String>, annotation: Option<MoodSample>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            speaker: Speaker::Assistant,
            text: text.into(),
            annotation,
            pending: false,
        }
    }

    /// Mark the message settled (used for hydrated history and reconciled
    /// optimistic messages).
    pub fn settled(mut self) -> Self {
        self.pending = false;
        self
    }
}

/// What a completed `/conversation` exchange yields.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantReply {
    pub text: String,
    pub annotation: Option<MoodSample>,
}

/// Session phase. `Sending` carries the sequence number of the in-flight
/// exchange; no second send is accepted until it resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Sending { seq: u64 },
}

/// Transient flags the rendering layer projects. Reset at the start of
/// every user-initiated action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiStatus {
    pub pending: bool,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// The conversational session: timeline, mood trend, transient flags, and
/// the sequence bookkeeping that keeps late completions from resurrecting
/// cleared history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub phase: Phase,
    /// Insertion order is the sole source of truth for transcript rendering.
    pub messages: Vec<Message>,
    pub mood: MoodTrend,
    pub error: Option<String>,
    pub success: Option<String>,
    /// Sequence number handed to the next issued operation.
    pub next_seq: u64,
    /// Sequence number of the last completed clear or hydrate. Completions
    /// tagged older than this are discarded.
    pub barrier: u64,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the transient flags for the rendering layer.
    pub fn status(&self) -> UiStatus {
        UiStatus {
            pending: matches!(self.phase, Phase::Sending { .. }),
            error: self.error.clone(),
            success: self.success.clone(),
        }
    }

    /// Allocate the sequence number for a newly issued operation.
    pub(crate) fn next_op(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}
