//! Mock backend and session test harness
//!
//! These mocks enable integration testing of the runtime without real I/O.

use super::traits::Backend;
use super::{SessionHandle, SessionRuntime, Snapshot};
use crate::api::ApiError;
use crate::mood::MoodSample;
use crate::session::{AssistantReply, Message};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

type HistoryResult = Result<(Vec<Message>, Vec<MoodSample>), ApiError>;

// ============================================================================
// Mock Backend
// ============================================================================

/// Mock backend that returns queued results, with an optional delay on
/// exchanges so tests can race a slow send against clear/hydrate.
pub struct MockBackend {
    replies: Mutex<VecDeque<Result<AssistantReply, ApiError>>>,
    histories: Mutex<VecDeque<HistoryResult>>,
    deletes: Mutex<VecDeque<Result<(), ApiError>>>,
    converse_delay: Option<Duration>,
    /// Texts sent to converse, in call order.
    pub sent: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            histories: Mutex::new(VecDeque::new()),
            deletes: Mutex::new(VecDeque::new()),
            converse_delay: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Delay every exchange by the given duration.
    pub fn with_converse_delay(mut self, delay: Duration) -> Self {
        self.converse_delay = Some(delay);
        self
    }

    pub fn queue_reply(&self, reply: AssistantReply) {
        self.replies.lock().unwrap().push_back(Ok(reply));
    }

    pub fn queue_reply_error(&self, error: ApiError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn queue_history(&self, messages: Vec<Message>, mood: Vec<MoodSample>) {
        self.histories.lock().unwrap().push_back(Ok((messages, mood)));
    }

    pub fn queue_history_error(&self, error: ApiError) {
        self.histories.lock().unwrap().push_back(Err(error));
    }

    pub fn queue_delete_ok(&self) {
        self.deletes.lock().unwrap().push_back(Ok(()));
    }

    pub fn queue_delete_error(&self, error: ApiError) {
        self.deletes.lock().unwrap().push_back(Err(error));
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn converse(&self, text: &str) -> Result<AssistantReply, ApiError> {
        self.sent.lock().unwrap().push(text.to_string());
        if let Some(delay) = self.converse_delay {
            tokio::time::sleep(delay).await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Transport("no mock reply queued".into())))
    }

    async fn history(&self) -> HistoryResult {
        self.histories
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Transport("no mock history queued".into())))
    }

    async fn delete_history(&self) -> Result<(), ApiError> {
        self.deletes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Transport("no mock delete queued".into())))
    }
}

// ============================================================================
// Test Session Harness
// ============================================================================

/// Helper for driving a runtime against a [`MockBackend`] with minimal
/// boilerplate.
pub struct TestSession {
    pub handle: SessionHandle,
    pub snapshots: watch::Receiver<Snapshot>,
    pub backend: Arc<MockBackend>,
}

impl TestSession {
    pub fn start(backend: MockBackend) -> Self {
        let backend = Arc::new(backend);
        let (handle, snapshots) = SessionRuntime::spawn(Arc::clone(&backend));
        Self {
            handle,
            snapshots,
            backend,
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// Wait until a snapshot satisfies the predicate, within the timeout.
    pub async fn wait_for(
        &mut self,
        timeout: Duration,
        pred: impl Fn(&Snapshot) -> bool,
    ) -> Snapshot {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            {
                let current = self.snapshots.borrow_and_update();
                if pred(&current) {
                    return current.clone();
                }
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for snapshot"
            );
            let _ = tokio::time::timeout(Duration::from_millis(50), self.snapshots.changed()).await;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::Sentiment;
    use crate::session::Speaker;

    const WAIT: Duration = Duration::from_secs(2);

    fn classified(text: &str, sentiment: Sentiment, confidence: f32) -> AssistantReply {
        AssistantReply {
            text: text.to_string(),
            annotation: Some(MoodSample::new(sentiment, confidence)),
        }
    }

    /// Login scenario tail: hydrate on an empty account yields an empty
    /// transcript, then one exchange grows it to two messages and one sample.
    #[tokio::test]
    async fn test_hydrate_then_exchange_scenario() {
        let backend = MockBackend::new();
        backend.queue_history(vec![], vec![]);
        backend.queue_reply(classified("Thanks for sharing", Sentiment::Neutral, 0.8));

        let mut session = TestSession::start(backend);
        session.handle.hydrate().await;
        // An empty hydrate result is indistinguishable from the initial
        // snapshot, so give the fetch time to land before submitting.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let empty = session.snapshot();
        assert!(empty.messages.is_empty());
        assert!(empty.mood.is_none());
        assert!(!empty.status.pending);

        session.handle.submit("I feel okay").await;
        let settled = session.wait_for(WAIT, |s| s.messages.len() == 2).await;

        assert_eq!(settled.messages[0].speaker, Speaker::User);
        assert_eq!(settled.messages[0].text, "I feel okay");
        assert_eq!(settled.messages[1].text, "Thanks for sharing");
        let mood = settled.mood.expect("one mood sample");
        assert_eq!(mood.label, "neutral");
        assert!((mood.confidence - 0.8).abs() < f32::EPSILON);
        assert!(settled.status.error.is_none());
        assert!(!settled.status.pending);
    }

    /// The optimistic user message is visible while the exchange is still
    /// in flight.
    #[tokio::test]
    async fn test_optimistic_message_visible_before_reply() {
        let backend =
            MockBackend::new().with_converse_delay(Duration::from_millis(200));
        backend.queue_reply(classified("hello", Sentiment::Happy, 0.9));

        let mut session = TestSession::start(backend);
        session.handle.submit("hi there").await;

        let inflight = session
            .wait_for(WAIT, |s| s.messages.len() == 1 && s.status.pending)
            .await;
        assert!(inflight.messages[0].pending);
        assert_eq!(inflight.messages[0].text, "hi there");

        let settled = session.wait_for(WAIT, |s| s.messages.len() == 2).await;
        assert!(!settled.messages[0].pending);
    }

    /// Failure path: the user message is retained, the error flag carries
    /// the backend's message, and the mood trend is untouched.
    #[tokio::test]
    async fn test_failed_exchange_scenario() {
        let backend = MockBackend::new();
        backend.queue_reply_error(ApiError::Application("service unavailable".into()));

        let mut session = TestSession::start(backend);
        session.handle.submit("hello").await;

        let failed = session
            .wait_for(WAIT, |s| s.status.error.is_some())
            .await;
        assert_eq!(failed.messages.len(), 1);
        assert_eq!(failed.messages[0].text, "hello");
        assert_eq!(failed.status.error.as_deref(), Some("service unavailable"));
        assert!(failed.mood.is_none());
        assert!(!failed.status.pending);
    }

    #[tokio::test]
    async fn test_clear_success_empties_transcript_and_trend() {
        let backend = MockBackend::new();
        backend.queue_history(
            vec![
                Message::user("old").settled(),
                Message::assistant("reply", Some(MoodSample::new(Sentiment::Sad, 0.6))),
            ],
            vec![MoodSample::new(Sentiment::Sad, 0.6)],
        );
        backend.queue_delete_ok();

        let mut session = TestSession::start(backend);
        session.handle.hydrate().await;
        session.wait_for(WAIT, |s| s.messages.len() == 2).await;

        session.handle.clear().await;
        let cleared = session
            .wait_for(WAIT, |s| s.status.success.is_some())
            .await;
        assert!(cleared.messages.is_empty());
        assert!(cleared.mood.is_none());
        assert_eq!(cleared.status.success.as_deref(), Some("Chat history cleared."));
    }

    #[tokio::test]
    async fn test_hydrate_failure_reports_error_and_keeps_state() {
        let backend = MockBackend::new();
        backend.queue_history_error(ApiError::Transport("connection refused".into()));

        let mut session = TestSession::start(backend);
        session.handle.hydrate().await;

        let failed = session
            .wait_for(WAIT, |s| s.status.error.is_some())
            .await;
        assert!(failed.messages.is_empty());
        assert!(failed
            .status
            .error
            .as_deref()
            .unwrap()
            .contains("connection refused"));
    }

    #[tokio::test]
    async fn test_clear_failure_leaves_transcript_untouched() {
        let backend = MockBackend::new();
        backend.queue_history(
            vec![Message::user("kept").settled()],
            vec![MoodSample::new(Sentiment::Anxious, 0.7)],
        );
        backend.queue_delete_error(ApiError::Transport("connection refused".into()));

        let mut session = TestSession::start(backend);
        session.handle.hydrate().await;
        session.wait_for(WAIT, |s| s.messages.len() == 1).await;

        session.handle.clear().await;
        let failed = session
            .wait_for(WAIT, |s| s.status.error.is_some())
            .await;
        assert_eq!(failed.messages.len(), 1);
        assert!(failed.mood.is_some());
        assert!(failed.status.success.is_none());
    }

    /// Sequence-discard property: a slow send issued before hydrate+clear
    /// must not resurrect messages after the clear completed.
    #[tokio::test]
    async fn test_slow_send_cannot_resurrect_cleared_history() {
        let backend =
            MockBackend::new().with_converse_delay(Duration::from_millis(300));
        backend.queue_reply(classified("too late", Sentiment::Sad, 0.4));
        backend.queue_history(vec![], vec![]);
        backend.queue_delete_ok();

        let mut session = TestSession::start(backend);
        session.handle.submit("slow message").await;
        session
            .wait_for(WAIT, |s| s.messages.len() == 1 && s.status.pending)
            .await;

        session.handle.hydrate().await;
        session.handle.clear().await;
        let cleared = session
            .wait_for(WAIT, |s| s.status.success.is_some())
            .await;
        assert!(cleared.messages.is_empty());

        // Outlive the delayed reply, then confirm it was discarded.
        tokio::time::sleep(Duration::from_millis(500)).await;
        let after = session.snapshot();
        assert!(after.messages.is_empty(), "stale reply must not reappear");
        assert!(after.mood.is_none());
    }

    /// Whitespace input causes no state change and no network call.
    #[tokio::test]
    async fn test_blank_submit_makes_no_call() {
        let backend = MockBackend::new();
        let session = TestSession::start(backend);

        session.handle.submit("   ").await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(session.snapshot().messages.is_empty());
        assert!(session.backend.sent_texts().is_empty());
    }

    /// Single-flight: a second submit while one is outstanding is rejected.
    #[tokio::test]
    async fn test_second_submit_rejected_while_sending() {
        let backend =
            MockBackend::new().with_converse_delay(Duration::from_millis(150));
        backend.queue_reply(classified("first reply", Sentiment::Neutral, 0.5));

        let mut session = TestSession::start(backend);
        session.handle.submit("one").await;
        session.handle.submit("two").await;

        let settled = session
            .wait_for(WAIT, |s| s.messages.len() == 2 && !s.status.pending)
            .await;
        assert_eq!(settled.messages[0].text, "one");
        assert_eq!(session.backend.sent_texts(), vec!["one".to_string()]);
    }
}
