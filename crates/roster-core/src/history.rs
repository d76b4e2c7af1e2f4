//! History events — the fundamental unit of the audit subsystem.
//!
//! An event is an immutable record of one change to an identity or
//! mailbox account. Events are never updated or deleted; the table they
//! live in is strictly append-only. The account kind is stored as its own
//! tag next to the free-text classification label, so aggregation never
//! has to infer the kind from label content.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which account population an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
  Identity,
  Mailbox,
}

/// One immutable audit-log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEvent {
  pub event_id:      Uuid,
  /// Referenced identity account; `None` for shared-mailbox events.
  /// The reference degrades to null if the account row ever goes away;
  /// history is never cascade-deleted.
  pub subject_id:    Option<Uuid>,
  pub changed_by:    String,
  /// Server-assigned at insert; never changes.
  pub change_date:   DateTime<Utc>,
  pub kind:          AccountKind,
  /// Free-text classification label, kept verbatim for display.
  pub change_type:   String,
  pub change_detail: String,
}

/// Input to the store's history append. The id and timestamp are always
/// assigned at insert; they are not accepted from callers.
#[derive(Debug, Clone)]
pub struct NewHistoryEvent {
  pub subject_id:    Option<Uuid>,
  pub changed_by:    String,
  pub kind:          AccountKind,
  pub change_type:   String,
  pub change_detail: String,
}

/// An event enriched with the joined identity fields of its subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
  pub event:             HistoryEvent,
  pub linked_name:       Option<String>,
  pub linked_code:       Option<String>,
  pub linked_department: Option<String>,
}

// ─── Filtering ───────────────────────────────────────────────────────────────

/// Parameters for the dashboard listing. All fields are optional and
/// combined conjunctively; `None` means no filter. The statistics views
/// ignore this entirely (they always cover the whole log).
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
  pub year:        Option<i32>,
  pub month:       Option<u32>,
  /// Exact match on the classification label.
  pub change_type: Option<String>,
  /// Substring match on the actor; skipped when empty.
  pub changed_by:  Option<String>,
  /// Inclusive lower bound on the calendar date of `change_date`.
  pub from:        Option<NaiveDate>,
  /// Inclusive upper bound.
  pub until:       Option<NaiveDate>,
  pub kind:        Option<AccountKind>,
}

// ─── Statistics ──────────────────────────────────────────────────────────────

/// Per-(year, month) change counts over the whole log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyStat {
  pub year:           i32,
  pub month:          u32,
  pub total_count:    u64,
  pub create_count:   u64,
  pub update_count:   u64,
  pub delete_count:   u64,
  pub mailbox_count:  u64,
  pub identity_count: u64,
}

/// Per-year change counts over the whole log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearlyStat {
  pub year:           i32,
  pub total_count:    u64,
  pub create_count:   u64,
  pub update_count:   u64,
  pub delete_count:   u64,
  pub mailbox_count:  u64,
  pub identity_count: u64,
}

/// Count per exact classification label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeStat {
  pub change_type: String,
  pub count:       u64,
  pub kind:        AccountKind,
}

/// The full dashboard read model: the filtered listing plus the three
/// always-unfiltered statistical views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
  pub history:      Vec<HistoryEntry>,
  /// Size of the full matching set; equals `history.len()` since the
  /// listing is not paginated.
  pub total_count:  u64,
  pub monthly_stats: Vec<MonthlyStat>,
  pub yearly_stats:  Vec<YearlyStat>,
  pub type_stats:    Vec<TypeStat>,
}
