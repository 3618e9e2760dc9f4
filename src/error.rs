//! Error types for searching, fetching and selecting videos.
//!
//! Library code returns these typed errors; the terminal front-end wraps them
//! in `anyhow` where it needs context.

use thiserror::Error;

/// Failure raised by a [`FetchAdapter`](crate::youtube::FetchAdapter) while talking to the search API.
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("search API responded with HTTP {0}")]
  Status(u16),

  #[error("could not decode response: {0}")]
  Decode(String),

  /// The fetch task ended without sending a response (panicked or was aborted).
  #[error("fetch task ended without a response")]
  Aborted,
}

/// Errors surfaced by [`SearchController`](crate::search::SearchController).
#[derive(Debug, Error)]
pub enum SearchError {
  /// The query text was empty. Callers treat this as a no-op, not a failure.
  #[error("empty search query")]
  EmptyQuery,

  #[error("fetching results for {query} failed")]
  FetchFailed {
    query: String,
    #[source]
    source: FetchError,
  },

  #[error("could not parse search results: {0}")]
  Parse(String),

  #[error("invalid search configuration: {0}")]
  Config(String),
}

/// Errors surfaced by [`SelectionEngine`](crate::selection::SelectionEngine).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
  /// The id is not part of the active result set; state is left untouched.
  #[error("video {0} is not in the active result set")]
  NotFound(String),
}
