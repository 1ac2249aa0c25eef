//! PulsePath backend transport
//!
//! A thin request/response wrapper: credential injection, JSON or binary
//! payloads, and the transport/application/malformed error taxonomy. Retry
//! policy is the caller's responsibility (here: none; the user re-submits).

mod error;
mod http;
pub mod types;

pub use error::ApiError;
pub use http::ApiClient;
pub use types::{Payload, ResponseKind};
