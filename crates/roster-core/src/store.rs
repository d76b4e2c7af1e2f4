//! The `AccountStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `roster-store-sqlite`). The API layer depends on this abstraction, not
//! on any concrete backend.
//!
//! Every mutating method writes the entity row and exactly one history
//! event as a single atomic unit: a caller never observes one without the
//! other. Reads of mailbox accounts always return the masked secret.

use std::future::Future;

use uuid::Uuid;

use crate::{
  history::{Dashboard, HistoryFilter},
  identity::{Identity, NewIdentity, UpdateIdentity},
  mailbox::{MailboxView, NewMailbox, UpdateMailbox},
};

/// Abstraction over a roster store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait AccountStore: Send + Sync {
  /// Backend error. Convertible into the domain taxonomy so interface
  /// layers can map it onto client/server error classes.
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  // ── Identity accounts ─────────────────────────────────────────────────

  /// Validate `input`, assign the next code for the current calendar
  /// year, and persist the account together with its `creation` event.
  fn create_identity(
    &self,
    input: NewIdentity,
  ) -> impl Future<Output = Result<Identity, Self::Error>> + Send + '_;

  /// Retrieve an identity account by id. Returns `None` if not found.
  fn get_identity(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + '_;

  /// List all identity accounts, ordered by code.
  fn list_identities(
    &self,
  ) -> impl Future<Output = Result<Vec<Identity>, Self::Error>> + Send + '_;

  /// Replace the editable fields, deriving lock/delete dates from the
  /// incoming status, and append the matching event.
  fn update_identity(
    &self,
    id: Uuid,
    changes: UpdateIdentity,
  ) -> impl Future<Output = Result<Identity, Self::Error>> + Send + '_;

  /// Transition the account to `Deleted` and stamp the delete date.
  /// The row is retained.
  fn soft_delete_identity(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Identity, Self::Error>> + Send + '_;

  // ── Mailbox accounts ──────────────────────────────────────────────────

  fn create_mailbox(
    &self,
    input: NewMailbox,
  ) -> impl Future<Output = Result<MailboxView, Self::Error>> + Send + '_;

  fn get_mailbox(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<MailboxView>, Self::Error>> + Send + '_;

  /// List all mailbox accounts with their linked identity fields,
  /// ordered by login id.
  fn list_mailboxes(
    &self,
  ) -> impl Future<Output = Result<Vec<MailboxView>, Self::Error>> + Send + '_;

  fn update_mailbox(
    &self,
    id: Uuid,
    changes: UpdateMailbox,
  ) -> impl Future<Output = Result<MailboxView, Self::Error>> + Send + '_;

  /// Transition the mailbox to `Withdrawn`. The row is retained.
  fn soft_delete_mailbox(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<MailboxView, Self::Error>> + Send + '_;

  // ── Dashboard ─────────────────────────────────────────────────────────

  /// The filtered listing plus the unfiltered statistics views.
  fn dashboard<'a>(
    &'a self,
    filter: &'a HistoryFilter,
  ) -> impl Future<Output = Result<Dashboard, Self::Error>> + Send + 'a;
}
