//! Failure modes when talking to a Jellyfin server.

use thiserror::Error;

/// Errors from authentication, listing, and stream resolution.
#[derive(Debug, Error)]
pub enum JellyfinError {
  #[error("server unreachable: {0}")]
  Unreachable(#[from] reqwest::Error),

  #[error("server returned HTTP {status}: {body}")]
  Http {
    status: reqwest::StatusCode,
    body: String,
  },

  #[error("malformed server response: {0}")]
  Json(#[from] serde_json::Error),

  #[error("authentication failed: {0}")]
  AuthFailed(String),

  #[error("not connected to a server")]
  NotConnected,

  #[error("invalid server URL: {0}")]
  InvalidUrl(String),
}

impl JellyfinError {
  /// True when the server rejected our credentials or token.
  pub fn is_auth(&self) -> bool {
    matches!(self, JellyfinError::AuthFailed(_))
  }
}
