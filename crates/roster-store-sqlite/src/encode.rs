//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as ISO
//! `YYYY-MM-DD`, UUIDs as hyphenated lowercase strings, and enums as the
//! same tokens their serde representations use.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use roster_core::{
  history::{AccountKind, HistoryEntry, HistoryEvent},
  identity::{EmployeeCategory, Identity, IdentityStatus},
  mailbox::{
    ApprovalStatus, Mailbox, MailboxRole, MailboxStatus, MailboxView,
    SECRET_MASK,
  },
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// Millisecond precision with a `Z` suffix, which SQLite's date functions
/// parse; the fixed width also keeps textual ordering chronological.
pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String {
  d.format("%Y-%m-%d").to_string()
}

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_category(c: EmployeeCategory) -> &'static str {
  match c {
    EmployeeCategory::Internal => "internal",
    EmployeeCategory::Outsourced => "outsourced",
    EmployeeCategory::Volunteer => "volunteer",
  }
}

pub fn decode_category(s: &str) -> Result<EmployeeCategory> {
  match s {
    "internal" => Ok(EmployeeCategory::Internal),
    "outsourced" => Ok(EmployeeCategory::Outsourced),
    "volunteer" => Ok(EmployeeCategory::Volunteer),
    other => Err(Error::Decode(format!("unknown employee category: {other:?}"))),
  }
}

pub fn encode_identity_status(s: IdentityStatus) -> &'static str {
  match s {
    IdentityStatus::Registered => "registered",
    IdentityStatus::Locked => "locked",
    IdentityStatus::Deleted => "deleted",
  }
}

pub fn decode_identity_status(s: &str) -> Result<IdentityStatus> {
  match s {
    "registered" => Ok(IdentityStatus::Registered),
    "locked" => Ok(IdentityStatus::Locked),
    "deleted" => Ok(IdentityStatus::Deleted),
    other => Err(Error::Decode(format!("unknown identity status: {other:?}"))),
  }
}

pub fn encode_role(r: MailboxRole) -> &'static str {
  match r {
    MailboxRole::Normal => "normal",
    MailboxRole::OrgAdmin => "org_admin",
    MailboxRole::SuperAdmin => "super_admin",
  }
}

pub fn decode_role(s: &str) -> Result<MailboxRole> {
  match s {
    "normal" => Ok(MailboxRole::Normal),
    "org_admin" => Ok(MailboxRole::OrgAdmin),
    "super_admin" => Ok(MailboxRole::SuperAdmin),
    other => Err(Error::Decode(format!("unknown mailbox role: {other:?}"))),
  }
}

pub fn encode_mailbox_status(s: MailboxStatus) -> &'static str {
  match s {
    MailboxStatus::Normal => "normal",
    MailboxStatus::Temporary => "temporary",
    MailboxStatus::Suspended => "suspended",
    MailboxStatus::Dormant => "dormant",
    MailboxStatus::Withdrawn => "withdrawn",
    MailboxStatus::Expired => "expired",
  }
}

pub fn decode_mailbox_status(s: &str) -> Result<MailboxStatus> {
  match s {
    "normal" => Ok(MailboxStatus::Normal),
    "temporary" => Ok(MailboxStatus::Temporary),
    "suspended" => Ok(MailboxStatus::Suspended),
    "dormant" => Ok(MailboxStatus::Dormant),
    "withdrawn" => Ok(MailboxStatus::Withdrawn),
    "expired" => Ok(MailboxStatus::Expired),
    other => Err(Error::Decode(format!("unknown mailbox status: {other:?}"))),
  }
}

pub fn encode_approval(a: ApprovalStatus) -> &'static str {
  match a {
    ApprovalStatus::Pending => "pending",
    ApprovalStatus::Approved => "approved",
    ApprovalStatus::Rejected => "rejected",
  }
}

pub fn decode_approval(s: &str) -> Result<ApprovalStatus> {
  match s {
    "pending" => Ok(ApprovalStatus::Pending),
    "approved" => Ok(ApprovalStatus::Approved),
    "rejected" => Ok(ApprovalStatus::Rejected),
    other => Err(Error::Decode(format!("unknown approval status: {other:?}"))),
  }
}

pub fn encode_account_kind(k: AccountKind) -> &'static str {
  match k {
    AccountKind::Identity => "identity",
    AccountKind::Mailbox => "mailbox",
  }
}

pub fn decode_account_kind(s: &str) -> Result<AccountKind> {
  match s {
    "identity" => Ok(AccountKind::Identity),
    "mailbox" => Ok(AccountKind::Mailbox),
    other => Err(Error::Decode(format!("unknown account kind: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `identity_accounts` row.
pub struct RawIdentity {
  pub account_id:    String,
  pub code:          String,
  pub name:          String,
  pub organization:  String,
  pub department:    String,
  pub category:      String,
  pub vendor_name:   Option<String>,
  pub duty:          Option<String>,
  pub work_scope:    Option<String>,
  pub requester:     String,
  pub status:        String,
  pub registered_on: String,
  pub locked_on:     Option<String>,
  pub deleted_on:    Option<String>,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawIdentity {
  pub fn into_identity(self) -> Result<Identity> {
    Ok(Identity {
      account_id:    decode_uuid(&self.account_id)?,
      code:          self.code,
      name:          self.name,
      organization:  self.organization,
      department:    self.department,
      category:      decode_category(&self.category)?,
      vendor_name:   self.vendor_name,
      duty:          self.duty,
      work_scope:    self.work_scope,
      requester:     self.requester,
      status:        decode_identity_status(&self.status)?,
      registered_on: decode_date(&self.registered_on)?,
      locked_on:     self.locked_on.as_deref().map(decode_date).transpose()?,
      deleted_on:    self.deleted_on.as_deref().map(decode_date).transpose()?,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings from a `mailbox_accounts` row joined with its owner.
/// The secret column is deliberately absent: read queries never select
/// it, and the materialised view always carries the mask token.
pub struct RawMailbox {
  pub mailbox_id:   String,
  pub owner_id:     Option<String>,
  pub display_name: String,
  pub login_id:     String,
  pub department:   Option<String>,
  pub role:         String,
  pub status:       String,
  pub approval:     String,
  pub otp_enabled:  bool,
  pub manager_code: Option<String>,
  pub created_at:   String,
  pub updated_at:   String,
  // identity join
  pub linked_code:  Option<String>,
  pub linked_name:  Option<String>,
}

impl RawMailbox {
  pub fn into_view(self) -> Result<MailboxView> {
    Ok(MailboxView {
      mailbox:     Mailbox {
        mailbox_id:   decode_uuid(&self.mailbox_id)?,
        owner_id:     self.owner_id.as_deref().map(decode_uuid).transpose()?,
        display_name: self.display_name,
        login_id:     self.login_id,
        secret:       SECRET_MASK.to_owned(),
        department:   self.department,
        role:         decode_role(&self.role)?,
        status:       decode_mailbox_status(&self.status)?,
        approval:     decode_approval(&self.approval)?,
        otp_enabled:  self.otp_enabled,
        manager_code: self.manager_code,
        created_at:   decode_dt(&self.created_at)?,
        updated_at:   decode_dt(&self.updated_at)?,
      },
      linked_code: self.linked_code,
      linked_name: self.linked_name,
    })
  }
}

/// Raw strings from a `history_events` row joined with its subject.
pub struct RawHistoryEntry {
  pub event_id:          String,
  pub subject_id:        Option<String>,
  pub changed_by:        String,
  pub change_date:       String,
  pub kind:              String,
  pub change_type:       String,
  pub change_detail:     String,
  // identity join
  pub linked_name:       Option<String>,
  pub linked_code:       Option<String>,
  pub linked_department: Option<String>,
}

impl RawHistoryEntry {
  pub fn into_entry(self) -> Result<HistoryEntry> {
    Ok(HistoryEntry {
      event:             HistoryEvent {
        event_id:      decode_uuid(&self.event_id)?,
        subject_id:    self.subject_id.as_deref().map(decode_uuid).transpose()?,
        changed_by:    self.changed_by,
        change_date:   decode_dt(&self.change_date)?,
        kind:          decode_account_kind(&self.kind)?,
        change_type:   self.change_type,
        change_detail: self.change_detail,
      },
      linked_name:       self.linked_name,
      linked_code:       self.linked_code,
      linked_department: self.linked_department,
    })
  }
}
