//! Error types for `roster-core`.
//!
//! This is the domain taxonomy the interface layer maps onto client and
//! server error classes. Validation and not-found errors are raised before
//! any write; `Store` wraps backend failures whose detail is logged
//! server-side and never shown to callers.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// A required field is missing or malformed.
  #[error("validation error: {0}")]
  Validation(String),

  #[error("identity account not found: {0}")]
  IdentityNotFound(Uuid),

  #[error("mailbox account not found: {0}")]
  MailboxNotFound(Uuid),

  /// Generated code or unique login id collided with an existing row.
  #[error("conflict: {0}")]
  Conflict(String),

  /// Backend failure (connection, transaction, corrupt row).
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
