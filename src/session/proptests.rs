//! Property-based tests for the session transition function
//!
//! These verify the timeline invariants hold across arbitrary inputs and
//! event interleavings.

use super::state::*;
use super::transition::*;
use super::*;
use crate::mood::{MoodSample, Sentiment};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_sentiment() -> impl Strategy<Value = Sentiment> {
    prop_oneof![
        Just(Sentiment::Happy),
        Just(Sentiment::Sad),
        Just(Sentiment::Angry),
        Just(Sentiment::Anxious),
        Just(Sentiment::Excited),
        Just(Sentiment::Neutral),
        Just(Sentiment::Overwhelmed),
        "[a-z]{3,12}".prop_map(Sentiment::Other),
    ]
}

fn arb_sample() -> impl Strategy<Value = MoodSample> {
    (arb_sentiment(), 0.0f32..=1.0).prop_map(|(sentiment, confidence)| MoodSample {
        sentiment,
        confidence,
    })
}

fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z ]{0,29}"
}

/// Settled messages as they come back from a hydrate.
fn arb_settled_message() -> impl Strategy<Value = Message> {
    prop_oneof![
        arb_text().prop_map(|text| Message::user(text).settled()),
        (arb_text(), proptest::option::of(arb_sample()))
            .prop_map(|(text, annotation)| Message::assistant(text, annotation)),
    ]
}

fn arb_reply() -> impl Strategy<Value = AssistantReply> {
    (arb_text(), proptest::option::of(arb_sample()))
        .prop_map(|(text, annotation)| AssistantReply { text, annotation })
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        arb_text().prop_map(|text| Event::Submit { text }),
        Just(Event::Hydrate),
        Just(Event::Clear),
        (0u64..6, arb_reply()).prop_map(|(seq, reply)| Event::ReplyOk { seq, reply }),
        (0u64..6, arb_text()).prop_map(|(seq, message)| Event::ReplyFailed { seq, message }),
        (
            0u64..6,
            proptest::collection::vec(arb_settled_message(), 0..4),
            proptest::collection::vec(arb_sample(), 0..4),
        )
            .prop_map(|(seq, messages, mood)| Event::HistoryLoaded {
                seq,
                messages,
                mood,
            }),
        (0u64..6, arb_text()).prop_map(|(seq, message)| Event::HistoryFailed { seq, message }),
        (0u64..6).prop_map(|seq| Event::ClearOk { seq }),
        (0u64..6, arb_text()).prop_map(|(seq, message)| Event::ClearFailed { seq, message }),
    ]
}

/// Structural invariants the timeline must keep after every transition.
fn assert_timeline_invariants(state: &SessionState) {
    let mut prev_pending = false;
    for msg in &state.messages {
        assert!(
            !(msg.pending && prev_pending),
            "two consecutive pending entries"
        );
        if msg.speaker == Speaker::Assistant {
            assert!(!msg.pending, "assistant messages never exist in pending form");
        }
        prev_pending = msg.pending;
    }
    if let Some(pos) = state.messages.iter().position(|m| m.pending) {
        assert_eq!(
            pos,
            state.messages.len() - 1,
            "only the most recent message may be pending"
        );
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// For all non-empty trimmed input, submit appends exactly one pending
    /// user message and emits exactly one SendText carrying that text.
    #[test]
    fn prop_submit_optimistic_append(text in arb_text()) {
        let state = SessionState::new();
        let result = transition(&state, Event::Submit { text: text.clone() }).unwrap();

        prop_assert_eq!(result.new_state.messages.len(), 1);
        let msg = &result.new_state.messages[0];
        prop_assert_eq!(msg.speaker, Speaker::User);
        prop_assert_eq!(msg.text.as_str(), text.trim());
        prop_assert!(msg.pending);

        prop_assert_eq!(result.effects.len(), 1);
        match &result.effects[0] {
            Effect::SendText { text: sent, .. } => prop_assert_eq!(sent.as_str(), text.trim()),
            other => prop_assert!(false, "unexpected effect {:?}", other),
        }
    }

    /// Whitespace-only input is rejected with no state change and no effect.
    #[test]
    fn prop_blank_submit_is_a_local_noop(text in "[ \t]{0,8}") {
        let state = SessionState::new();
        let result = transition(&state, Event::Submit { text });
        prop_assert_eq!(result.unwrap_err(), TransitionError::EmptyInput);
    }

    /// Completions older than the barrier never change state.
    #[test]
    fn prop_stale_completions_are_discarded(
        reply in arb_reply(),
        message in arb_text(),
        mood in proptest::collection::vec(arb_sample(), 0..4),
    ) {
        // Hydrate (seq 0) then clear (seq 1) completed: barrier is 1.
        let mut state = SessionState::new();
        state.next_seq = 2;
        state.barrier = 1;
        state.messages.push(Message::user("kept").settled());

        let stale_events = vec![
            Event::ReplyOk { seq: 0, reply },
            Event::ReplyFailed { seq: 0, message: message.clone() },
            Event::HistoryLoaded { seq: 0, messages: vec![], mood },
            Event::HistoryFailed { seq: 0, message: message.clone() },
            Event::ClearOk { seq: 0 },
            Event::ClearFailed { seq: 0, message },
        ];
        for event in stale_events {
            let result = transition(&state, event).unwrap();
            prop_assert_eq!(&result.new_state, &state);
            prop_assert!(result.effects.is_empty());
        }
    }

    /// The timeline invariants survive arbitrary event interleavings.
    #[test]
    fn prop_timeline_invariants_hold(events in proptest::collection::vec(arb_event(), 0..24)) {
        let mut state = SessionState::new();
        for event in events {
            if let Ok(result) = transition(&state, event) {
                state = result.new_state;
            }
            assert_timeline_invariants(&state);
        }
    }

    /// A settled exchange grows the transcript by two and the trend by one.
    #[test]
    fn prop_settled_exchange_counts(text in arb_text(), sample in arb_sample()) {
        let state = SessionState::new();
        let sent = transition(&state, Event::Submit { text: text.clone() }).unwrap().new_state;
        let Phase::Sending { seq } = sent.phase else {
            prop_assert!(false, "expected Sending phase");
            unreachable!()
        };

        let reply = AssistantReply { text, annotation: Some(sample) };
        let settled = transition(&sent, Event::ReplyOk { seq, reply }).unwrap().new_state;

        prop_assert_eq!(settled.messages.len(), state.messages.len() + 2);
        prop_assert_eq!(settled.mood.len(), state.mood.len() + 1);
        prop_assert_eq!(settled.phase, Phase::Idle);
    }

    /// A failed exchange grows the transcript by one and flags the error.
    #[test]
    fn prop_failed_exchange_counts(text in arb_text(), message in arb_text()) {
        let state = SessionState::new();
        let sent = transition(&state, Event::Submit { text }).unwrap().new_state;
        let Phase::Sending { seq } = sent.phase else {
            prop_assert!(false, "expected Sending phase");
            unreachable!()
        };

        let failed = transition(&sent, Event::ReplyFailed { seq, message }).unwrap().new_state;

        prop_assert_eq!(failed.messages.len(), state.messages.len() + 1);
        prop_assert_eq!(failed.mood.len(), state.mood.len());
        prop_assert!(failed.error.is_some());
        prop_assert_eq!(failed.phase, Phase::Idle);
    }
}
