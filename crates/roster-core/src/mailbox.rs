//! Mailbox accounts — mail-system records, optionally linked to an
//! identity account.
//!
//! A mailbox with no owner is a shared/departmental mailbox. The stored
//! secret never leaves the store through a read path: every returned
//! mailbox carries [`SECRET_MASK`] instead, and an update whose secret is
//! empty or equals the mask token leaves the stored secret unchanged.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Fixed token substituted for the secret on every read path.
pub const SECRET_MASK: &str = "********";

/// Permission level of the mailbox user.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MailboxRole {
  #[default]
  Normal,
  OrgAdmin,
  SuperAdmin,
}

/// Lifecycle status of a mailbox account. `Withdrawn` is the terminal
/// soft-delete state.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MailboxStatus {
  #[default]
  Normal,
  Temporary,
  Suspended,
  Dormant,
  Withdrawn,
  Expired,
}

impl fmt::Display for MailboxStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Normal => "normal",
      Self::Temporary => "temporary",
      Self::Suspended => "suspended",
      Self::Dormant => "dormant",
      Self::Withdrawn => "withdrawn",
      Self::Expired => "expired",
    })
  }
}

/// Approval workflow state for a mailbox account.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
  #[default]
  Pending,
  Approved,
  Rejected,
}

impl fmt::Display for ApprovalStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Pending => "pending",
      Self::Approved => "approved",
      Self::Rejected => "rejected",
    })
  }
}

/// A tracked mail-system account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mailbox {
  pub mailbox_id:   Uuid,
  /// Owning identity account; `None` for shared mailboxes.
  pub owner_id:     Option<Uuid>,
  pub display_name: String,
  /// Unique login identifier (mail address).
  pub login_id:     String,
  /// Always [`SECRET_MASK`] on anything returned by the store.
  pub secret:       String,
  pub department:   Option<String>,
  pub role:         MailboxRole,
  pub status:       MailboxStatus,
  pub approval:     ApprovalStatus,
  pub otp_enabled:  bool,
  /// Code of the identity account administering this mailbox; free text,
  /// not enforced against the identity table.
  pub manager_code: Option<String>,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

/// A mailbox bundled with the joined identity fields of its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailboxView {
  pub mailbox:     Mailbox,
  pub linked_code: Option<String>,
  pub linked_name: Option<String>,
}

/// Input to [`crate::store::AccountStore::create_mailbox`].
/// When an owner is given and no department is, the owner's department is
/// carried over. Timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewMailbox {
  pub owner_id:     Option<Uuid>,
  pub display_name: String,
  pub login_id:     String,
  pub secret:       String,
  pub department:   Option<String>,
  pub role:         MailboxRole,
  pub status:       MailboxStatus,
  pub approval:     ApprovalStatus,
  pub otp_enabled:  bool,
  pub manager_code: Option<String>,
}

/// Input to [`crate::store::AccountStore::update_mailbox`].
/// Full replacement of the editable fields. A secret of `None`, the empty
/// string, or the mask token keeps the stored secret.
#[derive(Debug, Clone)]
pub struct UpdateMailbox {
  pub owner_id:     Option<Uuid>,
  pub display_name: String,
  pub login_id:     String,
  pub secret:       Option<String>,
  pub department:   Option<String>,
  pub role:         MailboxRole,
  pub status:       MailboxStatus,
  pub approval:     ApprovalStatus,
  pub otp_enabled:  bool,
  pub manager_code: Option<String>,
}

fn check_required(pairs: &[(&str, &str)]) -> Result<()> {
  for (field, value) in pairs {
    if value.trim().is_empty() {
      return Err(Error::Validation(format!("{field} is required")));
    }
  }
  Ok(())
}

impl NewMailbox {
  /// Check required fields before any write is attempted.
  pub fn validate(&self) -> Result<()> {
    check_required(&[
      ("display_name", &self.display_name),
      ("login_id", &self.login_id),
      ("secret", &self.secret),
    ])
  }
}

impl UpdateMailbox {
  pub fn validate(&self) -> Result<()> {
    check_required(&[
      ("display_name", &self.display_name),
      ("login_id", &self.login_id),
    ])
  }
}
