//! Trait abstraction over the backend
//!
//! Enables testing the session runtime with mock implementations.

use crate::api::{ApiClient, ApiError};
use crate::mood::MoodSample;
use crate::session::{AssistantReply, Message};
use async_trait::async_trait;
use std::sync::Arc;

/// The slice of the backend contract the session runtime drives.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Exchange one user turn for a classified assistant reply.
    async fn converse(&self, text: &str) -> Result<AssistantReply, ApiError>;

    /// Fetch the durable transcript and mood trend.
    async fn history(&self) -> Result<(Vec<Message>, Vec<MoodSample>), ApiError>;

    /// Delete the durable history.
    async fn delete_history(&self) -> Result<(), ApiError>;
}

#[async_trait]
impl<T: Backend + ?Sized> Backend for Arc<T> {
    async fn converse(&self, text: &str) -> Result<AssistantReply, ApiError> {
        (**self).converse(text).await
    }

    async fn history(&self) -> Result<(Vec<Message>, Vec<MoodSample>), ApiError> {
        (**self).history().await
    }

    async fn delete_history(&self) -> Result<(), ApiError> {
        (**self).delete_history().await
    }
}

// ============================================================================
// Production adapter
// ============================================================================

#[async_trait]
impl Backend for ApiClient {
    async fn converse(&self, text: &str) -> Result<AssistantReply, ApiError> {
        ApiClient::converse(self, text).await
    }

    async fn history(&self) -> Result<(Vec<Message>, Vec<MoodSample>), ApiError> {
        // The transcript and the trend live behind separate endpoints but
        // hydrate replaces both at once, so they are fetched together.
        tokio::try_join!(self.chat_history(), self.mood_history())
    }

    async fn delete_history(&self) -> Result<(), ApiError> {
        ApiClient::delete_history(self).await.map(|_notice| ())
    }
}
