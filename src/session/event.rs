//! Events that drive session transitions

use super::state::{AssistantReply, Message};
use crate::mood::MoodSample;

/// Inputs to the transition function: user intents plus backend completions.
///
/// Completion events echo the sequence number of the operation that produced
/// them, so results that arrive after a later clear or hydrate has completed
/// can be recognized and dropped.
#[derive(Debug, Clone)]
pub enum Event {
    // User intents
    /// Text submitted for a new exchange.
    Submit { text: String },
    /// Load the durable transcript and mood trend from the backend.
    Hydrate,
    /// Delete the durable history.
    Clear,

    // Backend completions
    ReplyOk {
        seq: u64,
        reply: AssistantReply,
    },
    ReplyFailed {
        seq: u64,
        message: String,
    },
    HistoryLoaded {
        seq: u64,
        messages: Vec<Message>,
        mood: Vec<MoodSample>,
    },
    HistoryFailed {
        seq: u64,
        message: String,
    },
    ClearOk {
        seq: u64,
    },
    ClearFailed {
        seq: u64,
        message: String,
    },
}
