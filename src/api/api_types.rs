//! Wire types for the storefront REST API.
//!
//! The backend wraps every response in `{success, data?, message?}`. These
//! types decode that shape once and hand the rest of the crate a tagged
//! [`Envelope`] instead of optional fields.

use serde::{Deserialize, Serialize};

use super::error::FetchError;
use super::types::OrderStatus;

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
  success: bool,
  data: Option<T>,
  message: Option<String>,
}

/// Response envelope after decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
  Success(Option<T>),
  Failure { message: String },
}

impl<T> Envelope<T> {
  /// Decode an envelope from a response body.
  pub fn from_slice<'de>(body: &'de [u8]) -> Result<Self, FetchError>
  where
    T: Deserialize<'de>,
  {
    let raw: ApiEnvelope<T> =
      serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    Ok(if raw.success {
      Envelope::Success(raw.data)
    } else {
      Envelope::Failure {
        message: raw
          .message
          .filter(|m| !m.trim().is_empty())
          .unwrap_or_else(|| "The server reported a failure without a message".to_string()),
      }
    })
  }

  /// Success with a payload, or the backend's message as an error.
  pub fn into_data(self) -> Result<T, FetchError> {
    match self {
      Envelope::Success(Some(data)) => Ok(data),
      Envelope::Success(None) => Err(FetchError::Decode(
        "success response without data".to_string(),
      )),
      Envelope::Failure { message } => Err(FetchError::Backend(message)),
    }
  }

  /// Success regardless of payload, or the backend's message as an error.
  pub fn into_unit(self) -> Result<(), FetchError> {
    match self {
      Envelope::Success(_) => Ok(()),
      Envelope::Failure { message } => Err(FetchError::Backend(message)),
    }
  }
}

/// Body of the order status mutation.
#[derive(Debug, Serialize)]
pub struct ApiStatusUpdate<'a> {
  pub id: &'a str,
  pub status: OrderStatus,
}
