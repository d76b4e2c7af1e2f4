//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Datelike, Utc};
use uuid::Uuid;

use roster_core::{
  Error as CoreError, audit,
  history::{AccountKind, Dashboard, HistoryFilter},
  identity::{
    EmployeeCategory, Identity, IdentityStatus, NewIdentity, UpdateIdentity,
  },
  mailbox::{
    ApprovalStatus, MailboxRole, MailboxStatus, NewMailbox, SECRET_MASK,
    UpdateMailbox,
  },
  store::AccountStore,
};

use crate::{Error, SqliteStore, store::effective_secret};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn sample_identity(name: &str) -> NewIdentity {
  NewIdentity {
    name:         name.into(),
    organization: "HQ".into(),
    department:   "engineering".into(),
    category:     EmployeeCategory::Internal,
    vendor_name:  None,
    duty:         Some("backend".into()),
    work_scope:   None,
    requester:    "ops-lead".into(),
  }
}

fn update_from(identity: &Identity, status: IdentityStatus) -> UpdateIdentity {
  UpdateIdentity {
    name:         identity.name.clone(),
    organization: identity.organization.clone(),
    department:   identity.department.clone(),
    category:     identity.category,
    vendor_name:  identity.vendor_name.clone(),
    duty:         identity.duty.clone(),
    work_scope:   identity.work_scope.clone(),
    requester:    identity.requester.clone(),
    status,
    changed_by:   None,
  }
}

fn sample_mailbox(login: &str, owner_id: Option<Uuid>) -> NewMailbox {
  NewMailbox {
    owner_id,
    display_name: "Support".into(),
    login_id:     login.into(),
    secret:       "hunter2".into(),
    department:   None,
    role:         MailboxRole::Normal,
    status:       MailboxStatus::Normal,
    approval:     ApprovalStatus::Pending,
    otp_enabled:  false,
    manager_code: None,
  }
}

async fn unfiltered(s: &SqliteStore) -> Dashboard {
  s.dashboard(&HistoryFilter::default()).await.unwrap()
}

// ─── Code generation ─────────────────────────────────────────────────────────

#[tokio::test]
async fn create_identity_assigns_sequential_codes() {
  let s = store().await;
  let year = Utc::now().date_naive().year();

  let first = s.create_identity(sample_identity("Ada")).await.unwrap();
  let second = s.create_identity(sample_identity("Grace")).await.unwrap();

  assert_eq!(first.code, format!("Z{year}001"));
  assert_eq!(second.code, format!("Z{year}002"));
}

#[tokio::test]
async fn identity_codes_have_no_gaps_or_duplicates() {
  let s = store().await;
  let year = Utc::now().date_naive().year();

  for i in 0..4 {
    s.create_identity(sample_identity(&format!("user-{i}")))
      .await
      .unwrap();
  }

  let mut codes: Vec<String> = s
    .list_identities()
    .await
    .unwrap()
    .into_iter()
    .map(|identity| identity.code)
    .collect();
  codes.sort();
  let expected: Vec<String> =
    (1..=4).map(|seq| format!("Z{year}{seq:03}")).collect();
  assert_eq!(codes, expected);
}

// ─── Validation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn outsourced_without_vendor_fails_validation() {
  let s = store().await;

  let mut input = sample_identity("Vendorless");
  input.category = EmployeeCategory::Outsourced;
  input.vendor_name = None;

  let err = s.create_identity(input).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::Validation(_))));

  // Short-circuited before any write: no row, no event.
  assert!(s.list_identities().await.unwrap().is_empty());
  assert_eq!(unfiltered(&s).await.total_count, 0);
}

#[tokio::test]
async fn blank_required_field_fails_validation() {
  let s = store().await;

  let mut input = sample_identity("  ");
  input.name = "  ".into();

  let err = s.create_identity(input).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::Validation(_))));
}

// ─── Identity lifecycle ──────────────────────────────────────────────────────

#[tokio::test]
async fn create_appends_exactly_one_creation_event() {
  let s = store().await;
  let identity = s.create_identity(sample_identity("Ada")).await.unwrap();

  let dashboard = unfiltered(&s).await;
  assert_eq!(dashboard.total_count, 1);

  let entry = &dashboard.history[0];
  assert_eq!(entry.event.change_type, "creation");
  assert_eq!(entry.event.subject_id, Some(identity.account_id));
  assert_eq!(entry.event.kind, AccountKind::Identity);
  assert_eq!(entry.event.changed_by, "ops-lead");
  assert_eq!(entry.linked_code.as_deref(), Some(identity.code.as_str()));
}

#[tokio::test]
async fn update_to_locked_sets_lock_date_and_appends_lock_event() {
  let s = store().await;
  let identity = s.create_identity(sample_identity("Ada")).await.unwrap();
  let today = Utc::now().date_naive();

  let locked = s
    .update_identity(
      identity.account_id,
      update_from(&identity, IdentityStatus::Locked),
    )
    .await
    .unwrap();

  assert_eq!(locked.status, IdentityStatus::Locked);
  assert_eq!(locked.locked_on, Some(today));
  assert_eq!(locked.deleted_on, None);

  let dashboard = unfiltered(&s).await;
  let lock_event = dashboard
    .history
    .iter()
    .find(|entry| entry.event.change_type == "lock")
    .expect("lock event");
  assert_eq!(lock_event.event.subject_id, Some(identity.account_id));
}

#[tokio::test]
async fn reregistering_clears_lock_date() {
  let s = store().await;
  let identity = s.create_identity(sample_identity("Ada")).await.unwrap();

  s.update_identity(
    identity.account_id,
    update_from(&identity, IdentityStatus::Locked),
  )
  .await
  .unwrap();
  let reopened = s
    .update_identity(
      identity.account_id,
      update_from(&identity, IdentityStatus::Registered),
    )
    .await
    .unwrap();

  // The row only reflects the current status; the lock transition stays
  // visible in the history log.
  assert_eq!(reopened.locked_on, None);
  assert_eq!(reopened.deleted_on, None);
  let dashboard = unfiltered(&s).await;
  assert!(
    dashboard
      .history
      .iter()
      .any(|entry| entry.event.change_type == "lock")
  );
}

#[tokio::test]
async fn update_missing_identity_is_not_found() {
  let s = store().await;
  let identity = s.create_identity(sample_identity("Ada")).await.unwrap();

  let err = s
    .update_identity(
      Uuid::new_v4(),
      update_from(&identity, IdentityStatus::Registered),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::IdentityNotFound(_))));

  // Nothing beyond the creation event was appended.
  assert_eq!(unfiltered(&s).await.total_count, 1);
}

#[tokio::test]
async fn soft_delete_retains_row_and_appends_deletion_event() {
  let s = store().await;
  let identity = s.create_identity(sample_identity("Ada")).await.unwrap();
  let today = Utc::now().date_naive();

  let deleted = s.soft_delete_identity(identity.account_id).await.unwrap();
  assert_eq!(deleted.status, IdentityStatus::Deleted);
  assert_eq!(deleted.deleted_on, Some(today));

  let fetched = s.get_identity(identity.account_id).await.unwrap();
  assert!(fetched.is_some());
  assert_eq!(fetched.unwrap().status, IdentityStatus::Deleted);

  let dashboard = unfiltered(&s).await;
  let deletion = dashboard
    .history
    .iter()
    .find(|entry| entry.event.change_type == "deletion")
    .expect("deletion event");
  assert_eq!(deletion.event.changed_by, audit::SYSTEM_ACTOR);
}

#[tokio::test]
async fn soft_delete_preserves_lock_date() {
  let s = store().await;
  let identity = s.create_identity(sample_identity("Ada")).await.unwrap();
  let today = Utc::now().date_naive();

  s.update_identity(
    identity.account_id,
    update_from(&identity, IdentityStatus::Locked),
  )
  .await
  .unwrap();
  let deleted = s.soft_delete_identity(identity.account_id).await.unwrap();

  assert_eq!(deleted.locked_on, Some(today));
  assert_eq!(deleted.deleted_on, Some(today));
}

#[tokio::test]
async fn soft_delete_missing_identity_is_not_found() {
  let s = store().await;
  let err = s.soft_delete_identity(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::IdentityNotFound(_))));
}

// ─── Mailbox lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn shared_mailbox_event_has_no_subject_and_mentions_shared() {
  let s = store().await;
  let view = s
    .create_mailbox(sample_mailbox("support@example.com", None))
    .await
    .unwrap();
  assert!(view.mailbox.owner_id.is_none());
  assert!(view.linked_code.is_none());

  let dashboard = unfiltered(&s).await;
  let entry = &dashboard.history[0];
  assert_eq!(entry.event.change_type, "mailbox creation (shared)");
  assert_eq!(entry.event.kind, AccountKind::Mailbox);
  assert!(entry.event.subject_id.is_none());
  assert!(entry.event.change_detail.contains("shared"));
}

#[tokio::test]
async fn personal_mailbox_inherits_owner_department() {
  let s = store().await;
  let owner = s.create_identity(sample_identity("Ada")).await.unwrap();

  let view = s
    .create_mailbox(sample_mailbox("ada@example.com", Some(owner.account_id)))
    .await
    .unwrap();

  assert_eq!(view.mailbox.department.as_deref(), Some("engineering"));
  assert_eq!(view.linked_code.as_deref(), Some(owner.code.as_str()));
  assert_eq!(view.linked_name.as_deref(), Some("Ada"));

  let dashboard = unfiltered(&s).await;
  let entry = dashboard
    .history
    .iter()
    .find(|entry| entry.event.change_type == "mailbox creation")
    .expect("mailbox creation event");
  assert_eq!(entry.event.subject_id, Some(owner.account_id));
}

#[tokio::test]
async fn mailbox_with_unknown_owner_is_not_found() {
  let s = store().await;
  let err = s
    .create_mailbox(sample_mailbox("ghost@example.com", Some(Uuid::new_v4())))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::IdentityNotFound(_))));
  assert_eq!(unfiltered(&s).await.total_count, 0);
}

#[tokio::test]
async fn duplicate_login_id_conflicts() {
  let s = store().await;
  s.create_mailbox(sample_mailbox("dup@example.com", None))
    .await
    .unwrap();

  let err = s
    .create_mailbox(sample_mailbox("dup@example.com", None))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::Conflict(_))));

  // The failed attempt left no event behind.
  assert_eq!(unfiltered(&s).await.total_count, 1);
}

#[tokio::test]
async fn mailbox_secret_never_leaves_the_store() {
  let s = store().await;
  let created = s
    .create_mailbox(sample_mailbox("secret@example.com", None))
    .await
    .unwrap();
  assert_eq!(created.mailbox.secret, SECRET_MASK);

  let fetched = s
    .get_mailbox(created.mailbox.mailbox_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(fetched.mailbox.secret, SECRET_MASK);

  let listed = s.list_mailboxes().await.unwrap();
  assert!(listed.iter().all(|view| view.mailbox.secret == SECRET_MASK));
}

#[test]
fn mask_token_and_empty_secret_keep_the_stored_value() {
  assert_eq!(
    effective_secret("stored".into(), Some(SECRET_MASK.into())),
    "stored"
  );
  assert_eq!(effective_secret("stored".into(), Some(String::new())), "stored");
  assert_eq!(effective_secret("stored".into(), None), "stored");
  assert_eq!(
    effective_secret("stored".into(), Some("fresh".into())),
    "fresh"
  );
}

#[tokio::test]
async fn update_mailbox_appends_modification_event() {
  let s = store().await;
  let created = s
    .create_mailbox(sample_mailbox("team@example.com", None))
    .await
    .unwrap();

  let updated = s
    .update_mailbox(created.mailbox.mailbox_id, UpdateMailbox {
      owner_id:     None,
      display_name: "Team".into(),
      login_id:     "team@example.com".into(),
      secret:       Some(SECRET_MASK.into()),
      department:   Some("support".into()),
      role:         MailboxRole::OrgAdmin,
      status:       MailboxStatus::Suspended,
      approval:     ApprovalStatus::Approved,
      otp_enabled:  true,
      manager_code: Some("Z2024001".into()),
    })
    .await
    .unwrap();

  assert_eq!(updated.mailbox.status, MailboxStatus::Suspended);
  assert_eq!(updated.mailbox.secret, SECRET_MASK);

  let dashboard = unfiltered(&s).await;
  let entry = dashboard
    .history
    .iter()
    .find(|entry| entry.event.change_type == "mailbox modification (shared)")
    .expect("modification event");
  assert_eq!(entry.event.changed_by, "Z2024001");
  assert!(entry.event.change_detail.contains("suspended"));
}

#[tokio::test]
async fn soft_delete_mailbox_withdraws_and_appends_event() {
  let s = store().await;
  let created = s
    .create_mailbox(sample_mailbox("gone@example.com", None))
    .await
    .unwrap();

  let withdrawn = s
    .soft_delete_mailbox(created.mailbox.mailbox_id)
    .await
    .unwrap();
  assert_eq!(withdrawn.mailbox.status, MailboxStatus::Withdrawn);

  // Row retained, only the status flipped.
  let fetched = s
    .get_mailbox(created.mailbox.mailbox_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(fetched.mailbox.status, MailboxStatus::Withdrawn);

  let dashboard = unfiltered(&s).await;
  assert!(
    dashboard
      .history
      .iter()
      .any(|entry| entry.event.change_type == "mailbox deletion (shared)")
  );
}

// ─── Atomicity ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn every_mutation_appends_exactly_one_event() {
  let s = store().await;

  let identity = s.create_identity(sample_identity("Ada")).await.unwrap();
  assert_eq!(unfiltered(&s).await.total_count, 1);

  s.update_identity(
    identity.account_id,
    update_from(&identity, IdentityStatus::Registered),
  )
  .await
  .unwrap();
  assert_eq!(unfiltered(&s).await.total_count, 2);

  let mailbox = s
    .create_mailbox(sample_mailbox("ada@example.com", Some(identity.account_id)))
    .await
    .unwrap();
  assert_eq!(unfiltered(&s).await.total_count, 3);

  s.soft_delete_mailbox(mailbox.mailbox.mailbox_id).await.unwrap();
  assert_eq!(unfiltered(&s).await.total_count, 4);

  s.soft_delete_identity(identity.account_id).await.unwrap();
  assert_eq!(unfiltered(&s).await.total_count, 5);
}

// ─── Dashboard listing ───────────────────────────────────────────────────────

async fn seed_mixed_log(s: &SqliteStore) -> Identity {
  let identity = s.create_identity(sample_identity("Ada")).await.unwrap();
  s.update_identity(
    identity.account_id,
    update_from(&identity, IdentityStatus::Locked),
  )
  .await
  .unwrap();
  s.create_mailbox(sample_mailbox("ada@example.com", Some(identity.account_id)))
    .await
    .unwrap();
  let shared = s
    .create_mailbox(sample_mailbox("support@example.com", None))
    .await
    .unwrap();
  s.soft_delete_mailbox(shared.mailbox.mailbox_id).await.unwrap();
  identity
}

#[tokio::test]
async fn unfiltered_listing_returns_every_event() {
  let s = store().await;
  seed_mixed_log(&s).await;

  let dashboard = unfiltered(&s).await;
  assert_eq!(dashboard.history.len(), 5);
  assert_eq!(dashboard.total_count, 5);
}

#[tokio::test]
async fn listing_is_sorted_newest_first() {
  let s = store().await;
  seed_mixed_log(&s).await;

  let dashboard = unfiltered(&s).await;
  assert!(
    dashboard
      .history
      .windows(2)
      .all(|pair| pair[0].event.change_date >= pair[1].event.change_date)
  );
}

#[tokio::test]
async fn listing_enriches_identity_events_with_joined_fields() {
  let s = store().await;
  let identity = seed_mixed_log(&s).await;

  let dashboard = unfiltered(&s).await;
  let entry = dashboard
    .history
    .iter()
    .find(|entry| entry.event.change_type == "creation")
    .expect("creation event");
  assert_eq!(entry.linked_name.as_deref(), Some("Ada"));
  assert_eq!(entry.linked_code.as_deref(), Some(identity.code.as_str()));
  assert_eq!(entry.linked_department.as_deref(), Some("engineering"));
}

// ─── Filters ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn filter_by_kind_splits_populations() {
  let s = store().await;
  seed_mixed_log(&s).await;

  let identity_only = s
    .dashboard(&HistoryFilter {
      kind: Some(AccountKind::Identity),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(identity_only.total_count, 2);
  assert!(
    identity_only
      .history
      .iter()
      .all(|entry| entry.event.kind == AccountKind::Identity)
  );

  let mailbox_only = s
    .dashboard(&HistoryFilter {
      kind: Some(AccountKind::Mailbox),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(mailbox_only.total_count, 3);
}

#[tokio::test]
async fn statistics_ignore_listing_filters() {
  let s = store().await;
  seed_mixed_log(&s).await;

  let filtered = s
    .dashboard(&HistoryFilter {
      kind: Some(AccountKind::Mailbox),
      ..Default::default()
    })
    .await
    .unwrap();
  let full = unfiltered(&s).await;

  assert_eq!(
    filtered.monthly_stats[0].total_count,
    full.monthly_stats[0].total_count
  );
  assert_eq!(
    filtered.yearly_stats[0].total_count,
    full.yearly_stats[0].total_count
  );
}

#[tokio::test]
async fn filter_by_actor_is_substring_and_skipped_when_empty() {
  let s = store().await;
  let mut input = sample_identity("Ada");
  input.requester = "alice-ops".into();
  s.create_identity(input).await.unwrap();
  s.create_identity(sample_identity("Grace")).await.unwrap();

  let matched = s
    .dashboard(&HistoryFilter {
      changed_by: Some("alice".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(matched.total_count, 1);

  let blank = s
    .dashboard(&HistoryFilter {
      changed_by: Some(String::new()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(blank.total_count, 2);
}

#[tokio::test]
async fn filter_by_change_type_is_exact() {
  let s = store().await;
  seed_mixed_log(&s).await;

  let shared_creations = s
    .dashboard(&HistoryFilter {
      change_type: Some("mailbox creation (shared)".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(shared_creations.total_count, 1);

  // Exact match, not substring: plain "creation" does not cover the
  // mailbox labels.
  let plain_creations = s
    .dashboard(&HistoryFilter {
      change_type: Some("creation".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(plain_creations.total_count, 1);
}

#[tokio::test]
async fn filter_by_date_range_is_inclusive() {
  let s = store().await;
  seed_mixed_log(&s).await;
  let today = Utc::now().date_naive();
  let tomorrow = today.succ_opt().unwrap();

  let spanning = s
    .dashboard(&HistoryFilter {
      from: Some(today),
      until: Some(today),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(spanning.total_count, 5);

  let future = s
    .dashboard(&HistoryFilter {
      from: Some(tomorrow),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(future.total_count, 0);
}

#[tokio::test]
async fn filter_by_year_and_month() {
  let s = store().await;
  seed_mixed_log(&s).await;
  let today = Utc::now().date_naive();

  let this_month = s
    .dashboard(&HistoryFilter {
      year: Some(today.year()),
      month: Some(today.month()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(this_month.total_count, 5);

  let next_year = s
    .dashboard(&HistoryFilter {
      year: Some(today.year() + 1),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(next_year.total_count, 0);
}

// ─── Statistics ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn monthly_stats_sum_to_yearly_stats() {
  let s = store().await;
  seed_mixed_log(&s).await;

  let dashboard = unfiltered(&s).await;
  for yearly in &dashboard.yearly_stats {
    let months: Vec<_> = dashboard
      .monthly_stats
      .iter()
      .filter(|monthly| monthly.year == yearly.year)
      .collect();
    assert_eq!(
      months.iter().map(|m| m.total_count).sum::<u64>(),
      yearly.total_count
    );
    assert_eq!(
      months.iter().map(|m| m.create_count).sum::<u64>(),
      yearly.create_count
    );
    assert_eq!(
      months.iter().map(|m| m.update_count).sum::<u64>(),
      yearly.update_count
    );
    assert_eq!(
      months.iter().map(|m| m.delete_count).sum::<u64>(),
      yearly.delete_count
    );
    assert_eq!(
      months.iter().map(|m| m.mailbox_count).sum::<u64>(),
      yearly.mailbox_count
    );
    assert_eq!(
      months.iter().map(|m| m.identity_count).sum::<u64>(),
      yearly.identity_count
    );
  }
}

#[tokio::test]
async fn keyword_counts_follow_label_content() {
  let s = store().await;
  seed_mixed_log(&s).await;

  // creation + mailbox creation x2 = 3 creates; lock is neither a
  // create, an update, nor a delete; mailbox deletion = 1 delete.
  let yearly = &unfiltered(&s).await.yearly_stats[0];
  assert_eq!(yearly.total_count, 5);
  assert_eq!(yearly.create_count, 3);
  assert_eq!(yearly.update_count, 0);
  assert_eq!(yearly.delete_count, 1);
  assert_eq!(yearly.mailbox_count, 3);
  assert_eq!(yearly.identity_count, 2);
}

#[tokio::test]
async fn type_stats_sum_to_total_and_carry_kind() {
  let s = store().await;
  seed_mixed_log(&s).await;

  let dashboard = unfiltered(&s).await;
  let summed: u64 = dashboard.type_stats.iter().map(|t| t.count).sum();
  assert_eq!(summed, dashboard.total_count);

  for stat in &dashboard.type_stats {
    let expected = if stat.change_type.starts_with("mailbox") {
      AccountKind::Mailbox
    } else {
      AccountKind::Identity
    };
    assert_eq!(stat.kind, expected, "label {:?}", stat.change_type);
  }

  assert!(
    dashboard
      .type_stats
      .windows(2)
      .all(|pair| pair[0].count >= pair[1].count)
  );
}
