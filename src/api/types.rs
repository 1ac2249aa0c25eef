//! Wire types for the PulsePath backend contract

use crate::mood::{MoodSample, Sentiment};
use crate::session::{AssistantReply, Message};
use serde::Deserialize;

/// Response payload shape, selected by the caller up front rather than
/// sniffed from the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Json,
    Binary,
}

/// Decoded response payload, tagged to match the requested [`ResponseKind`].
#[derive(Debug, Clone)]
pub enum Payload {
    Json(serde_json::Value),
    Binary(Vec<u8>),
}

// ============================================================================
// Response bodies
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
}

/// Shared shape for endpoints that acknowledge with a `message` field
/// (signup, delete-history).
#[derive(Debug, Deserialize)]
pub struct NoticeResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryResponse {
    pub history: Vec<WireMessage>,
}

#[derive(Debug, Deserialize)]
pub struct MoodHistoryResponse {
    pub mood: Vec<MoodSample>,
}

#[derive(Debug, Deserialize)]
pub struct ConverseResponse {
    pub ai_response: String,
    #[serde(default)]
    pub label: Option<Sentiment>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct SentimentResponse {
    pub label: Sentiment,
    pub confidence: f32,
}

#[derive(Debug, Deserialize)]
pub struct TranscriptResponse {
    pub text: String,
}

// ============================================================================
// Wire -> domain conversion
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireSender {
    User,
    Ai,
}

/// One transcript entry as the history endpoint serves it.
#[derive(Debug, Clone, Deserialize)]
pub struct WireMessage {
    pub sender: WireSender,
    pub text: String,
    #[serde(default)]
    pub label: Option<Sentiment>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

/// A classification is attached only when both halves are present; a
/// half-populated one is dropped rather than surfaced.
fn annotation(label: Option<Sentiment>, confidence: Option<f32>) -> Option<MoodSample> {
    match (label, confidence) {
        (Some(sentiment), Some(confidence)) => Some(MoodSample::new(sentiment, confidence)),
        _ => None,
    }
}

impl WireMessage {
    /// Hydrated entries arrive settled regardless of speaker.
    pub fn into_message(self) -> Message {
        let annotation = annotation(self.label, self.confidence);
        match self.sender {
            WireSender::User => Message::user(self.text).settled(),
            WireSender::Ai => Message::assistant(self.text, annotation),
        }
    }
}

impl ConverseResponse {
    pub fn into_reply(self) -> AssistantReply {
        AssistantReply {
            annotation: annotation(self.label, self.confidence),
            text: self.ai_response,
        }
    }
}

impl SentimentResponse {
    pub fn into_sample(self) -> MoodSample {
        MoodSample::new(self.label, self.confidence)
    }
}
