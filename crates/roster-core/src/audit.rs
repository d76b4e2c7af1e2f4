//! Change-record construction for every mutating operation.
//!
//! Each entity mutation produces exactly one [`NewHistoryEvent`]; the
//! store persists it in the same transaction as the entity write. The
//! functions here are pure: they resolve the subject reference, the
//! acting user, the classification label, and the detail line.

use uuid::Uuid;

use crate::{
  history::{AccountKind, NewHistoryEvent},
  identity::{Identity, IdentityStatus},
  mailbox::Mailbox,
};

/// Actor recorded when the caller does not identify one.
pub const SYSTEM_ACTOR: &str = "system";

/// Keyword substrings the statistics views match against classification
/// labels. Every label below except `lock` embeds exactly one of them.
pub const CREATED_KEYWORD: &str = "creation";
pub const UPDATED_KEYWORD: &str = "modification";
pub const DELETED_KEYWORD: &str = "deletion";

fn actor(explicit: Option<&str>) -> String {
  match explicit {
    Some(s) if !s.trim().is_empty() => s.to_owned(),
    _ => SYSTEM_ACTOR.to_owned(),
  }
}

/// `mailbox <keyword>`, with a ` (shared)` suffix for ownerless mailboxes.
fn mailbox_label(keyword: &str, shared: bool) -> String {
  if shared {
    format!("mailbox {keyword} (shared)")
  } else {
    format!("mailbox {keyword}")
  }
}

// ─── Identity operations ─────────────────────────────────────────────────────

pub fn identity_created(identity: &Identity) -> NewHistoryEvent {
  NewHistoryEvent {
    subject_id:    Some(identity.account_id),
    changed_by:    actor(Some(&identity.requester)),
    kind:          AccountKind::Identity,
    change_type:   CREATED_KEYWORD.to_owned(),
    change_detail: format!(
      "account created: {}, code: {}, department: {}",
      identity.name, identity.code, identity.department
    ),
  }
}

/// Label is chosen from the status the update lands on: entering the
/// locked state is a `lock`, entering the deleted state a `deletion`,
/// anything else a plain `modification`.
pub fn identity_updated(
  identity: &Identity,
  changed_by: Option<&str>,
) -> NewHistoryEvent {
  let change_type = match identity.status {
    IdentityStatus::Locked => "lock",
    IdentityStatus::Deleted => DELETED_KEYWORD,
    IdentityStatus::Registered => UPDATED_KEYWORD,
  };
  NewHistoryEvent {
    subject_id:    Some(identity.account_id),
    changed_by:    actor(changed_by),
    kind:          AccountKind::Identity,
    change_type:   change_type.to_owned(),
    change_detail: format!(
      "status: {}, requester: {}",
      identity.status, identity.requester
    ),
  }
}

pub fn identity_deleted(account_id: Uuid) -> NewHistoryEvent {
  NewHistoryEvent {
    subject_id:    Some(account_id),
    changed_by:    SYSTEM_ACTOR.to_owned(),
    kind:          AccountKind::Identity,
    change_type:   DELETED_KEYWORD.to_owned(),
    change_detail: "account soft-deleted".to_owned(),
  }
}

// ─── Mailbox operations ──────────────────────────────────────────────────────

pub fn mailbox_created(mailbox: &Mailbox) -> NewHistoryEvent {
  let shared = mailbox.owner_id.is_none();
  NewHistoryEvent {
    subject_id:    mailbox.owner_id,
    changed_by:    actor(mailbox.manager_code.as_deref()),
    kind:          AccountKind::Mailbox,
    change_type:   mailbox_label(CREATED_KEYWORD, shared),
    change_detail: if shared {
      format!(
        "shared mailbox created: {}, name: {}",
        mailbox.login_id, mailbox.display_name
      )
    } else {
      format!("mailbox created: {}", mailbox.login_id)
    },
  }
}

pub fn mailbox_updated(mailbox: &Mailbox) -> NewHistoryEvent {
  let shared = mailbox.owner_id.is_none();
  NewHistoryEvent {
    subject_id:    mailbox.owner_id,
    changed_by:    actor(mailbox.manager_code.as_deref()),
    kind:          AccountKind::Mailbox,
    change_type:   mailbox_label(UPDATED_KEYWORD, shared),
    change_detail: if shared {
      format!(
        "shared mailbox updated: {}, name: {}, status: {}",
        mailbox.login_id, mailbox.display_name, mailbox.status
      )
    } else {
      format!(
        "mailbox updated: {}, status: {}, approval: {}",
        mailbox.login_id, mailbox.status, mailbox.approval
      )
    },
  }
}

pub fn mailbox_deleted(mailbox: &Mailbox) -> NewHistoryEvent {
  let shared = mailbox.owner_id.is_none();
  NewHistoryEvent {
    subject_id:    mailbox.owner_id,
    changed_by:    SYSTEM_ACTOR.to_owned(),
    kind:          AccountKind::Mailbox,
    change_type:   mailbox_label(DELETED_KEYWORD, shared),
    change_detail: if shared {
      format!(
        "shared mailbox deleted: {}, name: {}",
        mailbox.login_id, mailbox.display_name
      )
    } else {
      format!("mailbox deleted: {}", mailbox.login_id)
    },
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;
  use crate::{
    identity::EmployeeCategory,
    mailbox::{ApprovalStatus, MailboxRole, MailboxStatus},
  };

  fn identity(status: IdentityStatus) -> Identity {
    Identity {
      account_id:    Uuid::new_v4(),
      code:          "Z2024001".into(),
      name:          "Ada".into(),
      organization:  "HQ".into(),
      department:    "engineering".into(),
      category:      EmployeeCategory::Internal,
      vendor_name:   None,
      duty:          None,
      work_scope:    None,
      requester:     "ops-lead".into(),
      status,
      registered_on: Utc::now().date_naive(),
      locked_on:     None,
      deleted_on:    None,
      created_at:    Utc::now(),
      updated_at:    Utc::now(),
    }
  }

  fn mailbox(owner_id: Option<Uuid>) -> Mailbox {
    Mailbox {
      mailbox_id:   Uuid::new_v4(),
      owner_id,
      display_name: "Support".into(),
      login_id:     "support@example.com".into(),
      secret:       "********".into(),
      department:   None,
      role:         MailboxRole::Normal,
      status:       MailboxStatus::Normal,
      approval:     ApprovalStatus::Pending,
      otp_enabled:  false,
      manager_code: None,
      created_at:   Utc::now(),
      updated_at:   Utc::now(),
    }
  }

  #[test]
  fn creation_label_and_actor() {
    let event = identity_created(&identity(IdentityStatus::Registered));
    assert_eq!(event.change_type, "creation");
    assert_eq!(event.changed_by, "ops-lead");
    assert_eq!(event.kind, AccountKind::Identity);
  }

  #[test]
  fn update_label_follows_status() {
    let modified = identity_updated(&identity(IdentityStatus::Registered), None);
    assert_eq!(modified.change_type, "modification");
    assert_eq!(modified.changed_by, SYSTEM_ACTOR);

    let locked = identity_updated(&identity(IdentityStatus::Locked), Some("kim"));
    assert_eq!(locked.change_type, "lock");
    assert_eq!(locked.changed_by, "kim");

    let deleted = identity_updated(&identity(IdentityStatus::Deleted), None);
    assert_eq!(deleted.change_type, "deletion");
  }

  #[test]
  fn blank_actor_falls_back_to_sentinel() {
    let event = identity_updated(&identity(IdentityStatus::Registered), Some("  "));
    assert_eq!(event.changed_by, SYSTEM_ACTOR);
  }

  #[test]
  fn shared_mailbox_gets_suffix_and_null_subject() {
    let event = mailbox_created(&mailbox(None));
    assert_eq!(event.change_type, "mailbox creation (shared)");
    assert!(event.subject_id.is_none());
    assert!(event.change_detail.contains("shared"));
  }

  #[test]
  fn owned_mailbox_references_owner() {
    let owner = Uuid::new_v4();
    let event = mailbox_updated(&mailbox(Some(owner)));
    assert_eq!(event.change_type, "mailbox modification");
    assert_eq!(event.subject_id, Some(owner));
  }

  #[test]
  fn labels_embed_statistics_keywords() {
    assert!(mailbox_label(CREATED_KEYWORD, true).contains(CREATED_KEYWORD));
    assert!(mailbox_label(DELETED_KEYWORD, false).contains(DELETED_KEYWORD));
    let deleted = mailbox_deleted(&mailbox(None));
    assert!(deleted.change_type.contains(DELETED_KEYWORD));
  }
}
