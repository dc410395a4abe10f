use thiserror::Error;

/// Failure of a list fetch or a mutation, as seen by callers above the fetcher.
///
/// Every expected failure mode resolves to one of these values; nothing above
/// the fetcher panics or propagates transport errors directly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
  /// The request never produced an HTTP response (DNS, connect, reset, timeout).
  #[error("network error: {0}")]
  Transport(String),

  /// The server answered with a non-success status and no usable envelope.
  #[error("server returned HTTP {status}")]
  Http { status: u16 },

  /// The backend answered `success: false`; the message is shown verbatim.
  #[error("{0}")]
  Backend(String),

  /// The response body could not be decoded into the expected shape.
  #[error("malformed response: {0}")]
  Decode(String),

  /// The request itself is malformed (bad descriptor, bad URL). Never retried.
  #[error("invalid request: {0}")]
  InvalidRequest(String),
}

impl FetchError {
  /// Whether retrying the same request later could plausibly succeed.
  pub fn is_transient(&self) -> bool {
    match self {
      Self::Transport(_) => true,
      Self::Http { status } => *status >= 500 || *status == 408 || *status == 429,
      Self::Backend(_) | Self::Decode(_) | Self::InvalidRequest(_) => false,
    }
  }

  /// The message a user should see in a notification or an error state.
  pub fn user_message(&self) -> String {
    self.to_string()
  }
}

impl From<reqwest::Error> for FetchError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_decode() {
      Self::Decode(err.to_string())
    } else if let Some(status) = err.status() {
      Self::Http {
        status: status.as_u16(),
      }
    } else if err.is_builder() {
      Self::InvalidRequest(err.to_string())
    } else {
      Self::Transport(err.to_string())
    }
  }
}
