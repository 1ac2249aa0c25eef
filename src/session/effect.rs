//! Effects produced by session transitions

/// I/O the runtime must perform after a transition.
///
/// Each effect carries the sequence number its completion event must echo
/// back; the transition function uses it to recognize stale results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// POST the text to the conversation endpoint.
    SendText { seq: u64, text: String },
    /// Fetch the durable transcript and mood trend.
    FetchHistory { seq: u64 },
    /// Ask the backend to delete the durable history.
    DeleteHistory { seq: u64 },
}
