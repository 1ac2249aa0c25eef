//! Pure transition function for the conversational session
//!
//! Given the same state and event this always produces the same result; all
//! I/O happens in the runtime via the returned effects.

use super::effect::Effect;
use super::event::Event;
use super::state::{AssistantReply, Message, Phase, SessionState};
use crate::mood::MoodSample;
use thiserror::Error;

/// Success flag text after a completed clear.
const HISTORY_CLEARED: &str = "Chat history cleared.";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Inputs rejected before any state change or network call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("message is empty")]
    EmptyInput,
    #[error("a message is already in flight")]
    Busy,
}

/// Apply one event to the session.
pub fn transition(state: &SessionState, event: Event) -> Result<TransitionResult, TransitionError> {
    match event {
        Event::Submit { text } => submit(state, &text),
        Event::Hydrate => Ok(hydrate(state)),
        Event::Clear => Ok(clear(state)),
        Event::ReplyOk { seq, reply } => Ok(reply_ok(state, seq, reply)),
        Event::ReplyFailed { seq, message } => Ok(reply_failed(state, seq, message)),
        Event::HistoryLoaded {
            seq,
            messages,
            mood,
        } => Ok(history_loaded(state, seq, messages, mood)),
        Event::HistoryFailed { seq, message } => Ok(operation_failed(state, seq, message)),
        Event::ClearOk { seq } => Ok(clear_ok(state, seq)),
        Event::ClearFailed { seq, message } => Ok(operation_failed(state, seq, message)),
    }
}

/// A completion is stale once a later clear or hydrate has completed.
fn stale(state: &SessionState, seq: u64) -> bool {
    seq < state.barrier
}

/// Settle the optimistic user message, if one is outstanding. Single-flight
/// sends mean only the most recent entry can be pending.
fn settle_pending(state: &mut SessionState) {
    if let Some(last) = state.messages.last_mut() {
        last.pending = false;
    }
}

/// Reset the transient flags and allocate a sequence number for a new
/// user-initiated operation.
fn begin_action(state: &SessionState) -> (SessionState, u64) {
    let mut next = state.clone();
    next.error = None;
    next.success = None;
    let seq = next.next_op();
    (next, seq)
}

fn submit(state: &SessionState, text: &str) -> Result<TransitionResult, TransitionError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TransitionError::EmptyInput);
    }
    if matches!(state.phase, Phase::Sending { .. }) {
        return Err(TransitionError::Busy);
    }

    let (mut next, seq) = begin_action(state);
    // Optimistic append: the user message is in the transcript before any
    // network response is observed.
    next.messages.push(Message::user(text));
    next.phase = Phase::Sending { seq };

    Ok(TransitionResult::new(next).with_effect(Effect::SendText {
        seq,
        text: text.to_string(),
    }))
}

/// Hydrate is permitted in any phase: a remount can race an in-flight send,
/// and the barrier bump on completion is what invalidates that send.
fn hydrate(state: &SessionState) -> TransitionResult {
    let (next, seq) = begin_action(state);
    TransitionResult::new(next).with_effect(Effect::FetchHistory { seq })
}

fn clear(state: &SessionState) -> TransitionResult {
    let (next, seq) = begin_action(state);
    TransitionResult::new(next).with_effect(Effect::DeleteHistory { seq })
}

fn reply_ok(state: &SessionState, seq: u64, reply: AssistantReply) -> TransitionResult {
    if stale(state, seq) {
        return TransitionResult::new(state.clone());
    }

    let mut next = state.clone();
    settle_pending(&mut next);
    if let Some(sample) = reply.annotation.clone() {
        next.mood.push(sample);
    }
    next.messages
        .push(Message::assistant(reply.text, reply.annotation));
    if next.phase == (Phase::Sending { seq }) {
        next.phase = Phase::Idle;
    }
    TransitionResult::new(next)
}

/// A failed exchange keeps the optimistic user message in the transcript so
/// the user can retry with context instead of resending blindly.
fn reply_failed(state: &SessionState, seq: u64, message: String) -> TransitionResult {
    if stale(state, seq) {
        return TransitionResult::new(state.clone());
    }

    let mut next = state.clone();
    settle_pending(&mut next);
    next.error = Some(message);
    if next.phase == (Phase::Sending { seq }) {
        next.phase = Phase::Idle;
    }
    TransitionResult::new(next)
}

/// Wholesale replace: the backend's durable history is authoritative over
/// whatever the client holds.
fn history_loaded(
    state: &SessionState,
    seq: u64,
    messages: Vec<Message>,
    mood: Vec<MoodSample>,
) -> TransitionResult {
    if stale(state, seq) {
        return TransitionResult::new(state.clone());
    }

    let mut next = state.clone();
    next.messages = messages;
    next.mood.replace(mood);
    next.barrier = seq;
    invalidate_older_send(&mut next, seq);
    TransitionResult::new(next)
}

fn clear_ok(state: &SessionState, seq: u64) -> TransitionResult {
    if stale(state, seq) {
        return TransitionResult::new(state.clone());
    }

    // Message sequence and mood trend empty in the same transition; no
    // intermediate state is observable.
    let mut next = state.clone();
    next.messages.clear();
    next.mood.clear();
    next.barrier = seq;
    next.success = Some(HISTORY_CLEARED.to_string());
    invalidate_older_send(&mut next, seq);
    TransitionResult::new(next)
}

/// A failed clear or hydrate leaves the existing timeline untouched.
fn operation_failed(state: &SessionState, seq: u64, message: String) -> TransitionResult {
    if stale(state, seq) {
        return TransitionResult::new(state.clone());
    }

    let mut next = state.clone();
    next.error = Some(message);
    TransitionResult::new(next)
}

/// An exchange issued before the newly completed clear/hydrate is dead: its
/// completion will fall behind the barrier. One issued after it is still
/// live and keeps the phase.
fn invalidate_older_send(state: &mut SessionState, barrier_seq: u64) {
    if let Phase::Sending { seq } = state.phase {
        if seq < barrier_seq {
            state.phase = Phase::Idle;
        }
    }
}
