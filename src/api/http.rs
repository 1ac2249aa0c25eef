//! HTTP transport for the PulsePath backend
//!
//! Attaches the bearer credential from the token store, serializes JSON
//! bodies, and decodes responses into the application's error taxonomy.
//! There is no retry logic here: the user re-submits the affected action.

use super::error::ApiError;
use super::types::{
    ConverseResponse, HistoryResponse, LoginResponse, MoodHistoryResponse, NoticeResponse,
    Payload, ResponseKind, SentimentResponse, TranscriptResponse, WireMessage,
};
use crate::auth::TokenStore;
use crate::mood::MoodSample;
use crate::session::{AssistantReply, Message};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Client for the PulsePath backend.
pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenStore>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Self {
            client,
            base_url,
            tokens,
        }
    }

    /// Issue a request and return the payload in the requested shape.
    ///
    /// The credential is attached when the store holds one and omitted
    /// otherwise. HTTP status codes are not interpreted here; callers
    /// inspect the decoded payload for an application-level error.
    pub async fn request(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<Value>,
        kind: ResponseKind,
    ) -> Result<Payload, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut request = self.client.request(method.clone(), &url);
        if let Some(token) = self.tokens.get() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        tracing::debug!(%method, endpoint, status = %response.status(), "Backend call");

        let bytes = response.bytes().await?;
        match kind {
            ResponseKind::Json => serde_json::from_slice(&bytes)
                .map(Payload::Json)
                .map_err(|err| ApiError::Transport(format!("unparseable response body: {err}"))),
            ResponseKind::Binary => Ok(Payload::Binary(bytes.to_vec())),
        }
    }

    /// Issue a JSON request and decode the expected success shape.
    async fn json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        let Payload::Json(value) = self.request(endpoint, method, body, ResponseKind::Json).await?
        else {
            return Err(ApiError::MalformedResponse);
        };
        decode(value)
    }

    /// Authenticated endpoints are short-circuited when no credential is
    /// held, rather than silently sent without the header.
    fn require_token(&self) -> Result<(), ApiError> {
        if self.tokens.get().is_none() {
            return Err(ApiError::Unauthenticated);
        }
        Ok(())
    }

    // ========================================================================
    // Endpoints
    // ========================================================================

    /// Exchange credentials for a bearer token. The caller decides where the
    /// token is stored.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let body = json!({ "username": username, "password": password });
        let response: LoginResponse = self.json("/login", Method::POST, Some(body)).await?;
        Ok(response.access_token)
    }

    /// Register a new account. Returns the backend's confirmation notice.
    pub async fn signup(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let body = json!({ "username": username, "password": password });
        let response: NoticeResponse = self.json("/signup", Method::POST, Some(body)).await?;
        Ok(response.message)
    }

    pub async fn chat_history(&self) -> Result<Vec<Message>, ApiError> {
        self.require_token()?;
        let response: HistoryResponse = self.json("/chat-history", Method::GET, None).await?;
        Ok(response
            .history
            .into_iter()
            .map(WireMessage::into_message)
            .collect())
    }

    pub async fn mood_history(&self) -> Result<Vec<MoodSample>, ApiError> {
        self.require_token()?;
        let response: MoodHistoryResponse = self.json("/mood-history", Method::GET, None).await?;
        Ok(response.mood)
    }

    /// Exchange one user turn for a classified assistant reply.
    pub async fn converse(&self, text: &str) -> Result<AssistantReply, ApiError> {
        self.require_token()?;
        let body = json!({ "text": text });
        let response: ConverseResponse = self.json("/conversation", Method::POST, Some(body)).await?;
        Ok(response.into_reply())
    }

    /// Delete the durable history. Returns the backend's confirmation notice.
    pub async fn delete_history(&self) -> Result<String, ApiError> {
        self.require_token()?;
        let response: NoticeResponse = self.json("/delete-history", Method::POST, None).await?;
        Ok(response.message)
    }

    /// One-shot sentiment classification, independent of the transcript.
    pub async fn sentiment(&self, text: &str) -> Result<MoodSample, ApiError> {
        self.require_token()?;
        let body = json!({ "text": text });
        let response: SentimentResponse = self.json("/sentiment", Method::POST, Some(body)).await?;
        Ok(response.into_sample())
    }

    /// Synthesize speech for the given text. The payload is raw audio.
    pub async fn tts(&self, text: &str) -> Result<Vec<u8>, ApiError> {
        self.require_token()?;
        let body = json!({ "text": text });
        match self
            .request("/tts", Method::POST, Some(body), ResponseKind::Binary)
            .await?
        {
            Payload::Binary(audio) => Ok(audio),
            Payload::Json(_) => Err(ApiError::MalformedResponse),
        }
    }

    /// Transcribe a WAV recording.
    pub async fn stt(&self, wav: &[u8]) -> Result<String, ApiError> {
        self.require_token()?;
        let body = json!({ "audio": BASE64.encode(wav) });
        let response: TranscriptResponse = self.json("/stt", Method::POST, Some(body)).await?;
        Ok(response.text)
    }
}

/// Decode an application payload: a well-formed `{error}` body becomes
/// `ApiError::Application`; a body matching neither the success shape nor
/// `{error}` is `MalformedResponse`.
fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        return Err(ApiError::Application(error.to_string()));
    }
    serde_json::from_value(value).map_err(|_| ApiError::MalformedResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;

    #[test]
    fn test_decode_success_shape() {
        let value = json!({ "access_token": "tok" });
        let decoded: LoginResponse = decode(value).unwrap();
        assert_eq!(decoded.access_token, "tok");
    }

    #[test]
    fn test_decode_application_error() {
        let value = json!({ "error": "invalid credentials" });
        let err = decode::<LoginResponse>(value).unwrap_err();
        assert_eq!(err, ApiError::Application("invalid credentials".into()));
    }

    #[test]
    fn test_decode_neither_shape_is_malformed() {
        // Neither the success fields nor `error`: its own case, not a guess.
        let value = json!({ "status": "weird" });
        let err = decode::<LoginResponse>(value).unwrap_err();
        assert_eq!(err, ApiError::MalformedResponse);
    }

    #[tokio::test]
    async fn test_authenticated_calls_short_circuit_without_token() {
        // No server needed: the guard fires before any request is built.
        let client = ApiClient::new("http://127.0.0.1:9", Arc::new(MemoryTokenStore::new()));

        assert_eq!(
            client.converse("hi").await.unwrap_err(),
            ApiError::Unauthenticated
        );
        assert_eq!(
            client.delete_history().await.unwrap_err(),
            ApiError::Unauthenticated
        );
        assert_eq!(
            client.chat_history().await.unwrap_err(),
            ApiError::Unauthenticated
        );
    }

    #[test]
    fn test_base_url_trailing_slash_normalized() {
        let client = ApiClient::new("http://localhost:5000/", Arc::new(MemoryTokenStore::new()));
        assert_eq!(client.base_url, "http://localhost:5000");
    }
}
