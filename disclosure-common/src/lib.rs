//! Common types and utilities shared across the disclosure crates.
//!
//! This crate defines the lookup error taxonomy, the structured error payload
//! returned to callers, and observability helpers. It is intentionally
//! lightweight so every crate in the workspace can depend on it.
//!
//! # Overview
//!
//! - [`LookupError`] and [`Result`]: the one error type every stage of a lookup
//!   (query validation, resolution, fetch, parse) reports through
//! - [`ErrorPayload`]: the `{ "error": ..., "kind": ... }` object surfaced to callers
//! - [`CandidateQuery`]: a validated, normalized lookup query
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! # Examples
//!
//! ```rust
//! use disclosure_common::{ErrorPayload, LookupError};
//!
//! let err = LookupError::NotFound("jane doe".into());
//! assert_eq!(err.kind(), "not_found");
//!
//! let payload = ErrorPayload::from(&err);
//! assert_eq!(payload.kind, "not_found");
//! assert!(payload.error.contains("jane doe"));
//! ```
use serde::{Deserialize, Serialize};

pub mod observability;
pub mod query;

pub use query::CandidateQuery;

/// Failures a single lookup can end in.
///
/// Per-field misses are not errors; they live in the extracted field outcomes.
/// Every variant is terminal for its request. Retrying, if any, happens inside
/// the fetcher before a [`LookupError::Fetch`] is produced.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The caller supplied no usable query.
    #[error("{0}")]
    Client(String),

    /// The query does not resolve to a source document.
    #[error("candidate not found: {0}")]
    NotFound(String),

    /// Network or transport failure while retrieving the document.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The document could not be turned into a tree at all.
    #[error("document could not be parsed: {0}")]
    Parse(String),
}

impl LookupError {
    /// Stable snake_case tag used in structured error payloads and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            LookupError::Client(_) => "client_error",
            LookupError::NotFound(_) => "not_found",
            LookupError::Fetch(_) => "fetch_error",
            LookupError::Parse(_) => "parse_error",
        }
    }
}

/// Convenient alias for results that use [`LookupError`].
pub type Result<T> = std::result::Result<T, LookupError>;

/// Structured error object returned in place of a candidate record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
    pub kind: String,
}

impl From<&LookupError> for ErrorPayload {
    fn from(err: &LookupError) -> Self {
        Self {
            error: err.to_string(),
            kind: err.kind().to_string(),
        }
    }
}
