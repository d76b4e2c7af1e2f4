//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a backend error through the domain taxonomy.
  pub fn from_store<E: Into<roster_core::Error>>(e: E) -> Self {
    Self::from(e.into())
  }
}

impl From<roster_core::Error> for ApiError {
  fn from(e: roster_core::Error) -> Self {
    use roster_core::Error as E;
    match e {
      E::Validation(message) => Self::BadRequest(message),
      E::IdentityNotFound(id) => {
        Self::NotFound(format!("identity account {id} not found"))
      }
      E::MailboxNotFound(id) => {
        Self::NotFound(format!("mailbox account {id} not found"))
      }
      E::Conflict(message) => Self::Conflict(message),
      E::Store(source) => Self::Store(source),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => {
        // Full detail stays in the server log; the caller gets an opaque
        // message.
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal store error".to_owned())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
