//! [`SqliteStore`] — the SQLite implementation of [`AccountStore`].
//!
//! Every mutating method opens one transaction covering the entity write
//! and its history append; a failure in either rolls back both. Domain
//! outcomes that are decided inside a transaction (not-found, missing
//! owner) are threaded out as an inner [`roster_core::Result`] so the
//! transaction machinery and the domain taxonomy stay separate.

use std::path::Path;

use chrono::{Datelike, Utc};
use rusqlite::{OptionalExtension as _, ToSql};
use uuid::Uuid;

use roster_core::{
  Error as CoreError, audit,
  history::{
    AccountKind, Dashboard, HistoryEvent, HistoryFilter, MonthlyStat,
    NewHistoryEvent, TypeStat, YearlyStat,
  },
  identity::{Identity, IdentityStatus, NewIdentity, UpdateIdentity},
  mailbox::{
    Mailbox, MailboxStatus, MailboxView, NewMailbox, SECRET_MASK,
    UpdateMailbox,
  },
  store::AccountStore,
};

use crate::{
  Error, Result,
  encode::{
    RawHistoryEntry, RawIdentity, RawMailbox, decode_account_kind, decode_dt,
    encode_account_kind, encode_approval, encode_category, encode_date,
    encode_dt, encode_identity_status, encode_mailbox_status, encode_role,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A roster store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Error plumbing ──────────────────────────────────────────────────────────

/// Carry a store-crate error (decode failure) out of a `call` closure.
fn into_call_err(e: Error) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e))
}

/// Surface UNIQUE-constraint failures as [`CoreError::Conflict`]; pass
/// everything else through as a database error.
fn constraint_conflict(e: tokio_rusqlite::Error, what: &str) -> Error {
  match &e {
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(f, _))
      if f.code == rusqlite::ErrorCode::ConstraintViolation =>
    {
      Error::Core(CoreError::Conflict(what.to_owned()))
    }
    _ => Error::Database(e),
  }
}

// ─── Write helpers ───────────────────────────────────────────────────────────

/// Assign the server-side id and timestamp to a pending history event.
fn stamp(input: NewHistoryEvent) -> HistoryEvent {
  HistoryEvent {
    event_id:      Uuid::new_v4(),
    subject_id:    input.subject_id,
    changed_by:    input.changed_by,
    change_date:   Utc::now(),
    kind:          input.kind,
    change_type:   input.change_type,
    change_detail: input.change_detail,
  }
}

/// The secret to store on update: an incoming value that is empty or the
/// mask token keeps the current one.
pub(crate) fn effective_secret(
  current: String,
  incoming: Option<String>,
) -> String {
  match incoming {
    Some(s) if !s.is_empty() && s != SECRET_MASK => s,
    _ => current,
  }
}

fn masked(mut mailbox: Mailbox) -> Mailbox {
  mailbox.secret = SECRET_MASK.to_owned();
  mailbox
}

fn insert_event(
  conn: &rusqlite::Connection,
  event: &HistoryEvent,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO history_events (
       event_id, subject_id, changed_by, change_date,
       kind, change_type, change_detail
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    rusqlite::params![
      encode_uuid(event.event_id),
      event.subject_id.map(encode_uuid),
      event.changed_by,
      encode_dt(event.change_date),
      encode_account_kind(event.kind),
      event.change_type,
      event.change_detail,
    ],
  )?;
  Ok(())
}

fn insert_identity(
  conn: &rusqlite::Connection,
  identity: &Identity,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO identity_accounts (
       account_id, code, name, organization, department, category,
       vendor_name, duty, work_scope, requester, status,
       registered_on, locked_on, deleted_on, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
    rusqlite::params![
      encode_uuid(identity.account_id),
      identity.code,
      identity.name,
      identity.organization,
      identity.department,
      encode_category(identity.category),
      identity.vendor_name,
      identity.duty,
      identity.work_scope,
      identity.requester,
      encode_identity_status(identity.status),
      encode_date(identity.registered_on),
      identity.locked_on.map(encode_date),
      identity.deleted_on.map(encode_date),
      encode_dt(identity.created_at),
      encode_dt(identity.updated_at),
    ],
  )?;
  Ok(())
}

fn update_identity_row(
  conn: &rusqlite::Connection,
  identity: &Identity,
) -> rusqlite::Result<()> {
  conn.execute(
    "UPDATE identity_accounts SET
       name = ?2, organization = ?3, department = ?4, category = ?5,
       vendor_name = ?6, duty = ?7, work_scope = ?8, requester = ?9,
       status = ?10, locked_on = ?11, deleted_on = ?12, updated_at = ?13
     WHERE account_id = ?1",
    rusqlite::params![
      encode_uuid(identity.account_id),
      identity.name,
      identity.organization,
      identity.department,
      encode_category(identity.category),
      identity.vendor_name,
      identity.duty,
      identity.work_scope,
      identity.requester,
      encode_identity_status(identity.status),
      identity.locked_on.map(encode_date),
      identity.deleted_on.map(encode_date),
      encode_dt(identity.updated_at),
    ],
  )?;
  Ok(())
}

fn insert_mailbox(
  conn: &rusqlite::Connection,
  mailbox: &Mailbox,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO mailbox_accounts (
       mailbox_id, owner_id, display_name, login_id, secret, department,
       role, status, approval, otp_enabled, manager_code,
       created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
    rusqlite::params![
      encode_uuid(mailbox.mailbox_id),
      mailbox.owner_id.map(encode_uuid),
      mailbox.display_name,
      mailbox.login_id,
      mailbox.secret,
      mailbox.department,
      encode_role(mailbox.role),
      encode_mailbox_status(mailbox.status),
      encode_approval(mailbox.approval),
      mailbox.otp_enabled,
      mailbox.manager_code,
      encode_dt(mailbox.created_at),
      encode_dt(mailbox.updated_at),
    ],
  )?;
  Ok(())
}

fn update_mailbox_row(
  conn: &rusqlite::Connection,
  mailbox: &Mailbox,
) -> rusqlite::Result<()> {
  conn.execute(
    "UPDATE mailbox_accounts SET
       owner_id = ?2, display_name = ?3, login_id = ?4, secret = ?5,
       department = ?6, role = ?7, status = ?8, approval = ?9,
       otp_enabled = ?10, manager_code = ?11, updated_at = ?12
     WHERE mailbox_id = ?1",
    rusqlite::params![
      encode_uuid(mailbox.mailbox_id),
      mailbox.owner_id.map(encode_uuid),
      mailbox.display_name,
      mailbox.login_id,
      mailbox.secret,
      mailbox.department,
      encode_role(mailbox.role),
      encode_mailbox_status(mailbox.status),
      encode_approval(mailbox.approval),
      mailbox.otp_enabled,
      mailbox.manager_code,
      encode_dt(mailbox.updated_at),
    ],
  )?;
  Ok(())
}

// ─── Read helpers ────────────────────────────────────────────────────────────

const IDENTITY_COLUMNS: &str = "account_id, code, name, organization, \
   department, category, vendor_name, duty, work_scope, requester, \
   status, registered_on, locked_on, deleted_on, created_at, updated_at";

fn identity_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawIdentity> {
  Ok(RawIdentity {
    account_id:    row.get(0)?,
    code:          row.get(1)?,
    name:          row.get(2)?,
    organization:  row.get(3)?,
    department:    row.get(4)?,
    category:      row.get(5)?,
    vendor_name:   row.get(6)?,
    duty:          row.get(7)?,
    work_scope:    row.get(8)?,
    requester:     row.get(9)?,
    status:        row.get(10)?,
    registered_on: row.get(11)?,
    locked_on:     row.get(12)?,
    deleted_on:    row.get(13)?,
    created_at:    row.get(14)?,
    updated_at:    row.get(15)?,
  })
}

fn fetch_identity_raw(
  conn: &rusqlite::Connection,
  id: Uuid,
) -> rusqlite::Result<Option<RawIdentity>> {
  conn
    .query_row(
      &format!(
        "SELECT {IDENTITY_COLUMNS} FROM identity_accounts WHERE account_id = ?1"
      ),
      rusqlite::params![encode_uuid(id)],
      identity_from_row,
    )
    .optional()
}

// The secret column is never part of a mailbox read; the view is built
// with the mask token.
const MAILBOX_COLUMNS: &str = "m.mailbox_id, m.owner_id, m.display_name, \
   m.login_id, m.department, m.role, m.status, m.approval, m.otp_enabled, \
   m.manager_code, m.created_at, m.updated_at, \
   a.code AS linked_code, a.name AS linked_name";

const MAILBOX_JOIN: &str = "FROM mailbox_accounts m \
   LEFT JOIN identity_accounts a ON m.owner_id = a.account_id";

fn mailbox_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawMailbox> {
  Ok(RawMailbox {
    mailbox_id:   row.get(0)?,
    owner_id:     row.get(1)?,
    display_name: row.get(2)?,
    login_id:     row.get(3)?,
    department:   row.get(4)?,
    role:         row.get(5)?,
    status:       row.get(6)?,
    approval:     row.get(7)?,
    otp_enabled:  row.get(8)?,
    manager_code: row.get(9)?,
    created_at:   row.get(10)?,
    updated_at:   row.get(11)?,
    linked_code:  row.get(12)?,
    linked_name:  row.get(13)?,
  })
}

fn fetch_mailbox_raw(
  conn: &rusqlite::Connection,
  id: Uuid,
) -> rusqlite::Result<Option<RawMailbox>> {
  conn
    .query_row(
      &format!("SELECT {MAILBOX_COLUMNS} {MAILBOX_JOIN} WHERE m.mailbox_id = ?1"),
      rusqlite::params![encode_uuid(id)],
      mailbox_from_row,
    )
    .optional()
}

/// Look up the owner fields a mailbox write needs: code, name, department.
fn fetch_owner(
  conn: &rusqlite::Connection,
  id: Uuid,
) -> rusqlite::Result<Option<(String, String, String)>> {
  conn
    .query_row(
      "SELECT code, name, department FROM identity_accounts WHERE account_id = ?1",
      rusqlite::params![encode_uuid(id)],
      |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )
    .optional()
}

// ─── Filter predicates ───────────────────────────────────────────────────────

/// A bound predicate value.
#[derive(Clone)]
enum SqlParam {
  Int(i64),
  Text(String),
}

impl ToSql for SqlParam {
  fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
    match self {
      Self::Int(v) => v.to_sql(),
      Self::Text(v) => v.to_sql(),
    }
  }
}

/// Translate a [`HistoryFilter`] into parameterised predicates. Filter
/// values are always bound, never spliced into the query text.
fn filter_predicates(
  filter: &HistoryFilter,
) -> (Vec<&'static str>, Vec<SqlParam>) {
  let mut conds = Vec::new();
  let mut params = Vec::new();

  if let Some(year) = filter.year {
    conds.push("CAST(strftime('%Y', h.change_date) AS INTEGER) = ?");
    params.push(SqlParam::Int(i64::from(year)));
  }
  if let Some(month) = filter.month {
    conds.push("CAST(strftime('%m', h.change_date) AS INTEGER) = ?");
    params.push(SqlParam::Int(i64::from(month)));
  }
  if let Some(change_type) = &filter.change_type
    && !change_type.is_empty()
  {
    conds.push("h.change_type = ?");
    params.push(SqlParam::Text(change_type.clone()));
  }
  if let Some(actor) = &filter.changed_by
    && !actor.is_empty()
  {
    conds.push("h.changed_by LIKE ?");
    params.push(SqlParam::Text(format!("%{actor}%")));
  }
  if let Some(from) = filter.from {
    conds.push("date(h.change_date) >= ?");
    params.push(SqlParam::Text(encode_date(from)));
  }
  if let Some(until) = filter.until {
    conds.push("date(h.change_date) <= ?");
    params.push(SqlParam::Text(encode_date(until)));
  }
  if let Some(kind) = filter.kind {
    conds.push("h.kind = ?");
    params.push(SqlParam::Text(encode_account_kind(kind).to_owned()));
  }

  (conds, params)
}

// ─── Statistics SQL ──────────────────────────────────────────────────────────

// The statistics views always cover the whole log; listing filters do
// not apply to them.
const MONTHLY_SQL: &str = "
  SELECT CAST(strftime('%Y', change_date) AS INTEGER) AS year,
         CAST(strftime('%m', change_date) AS INTEGER) AS month,
         COUNT(*),
         SUM(CASE WHEN change_type LIKE ?1 THEN 1 ELSE 0 END),
         SUM(CASE WHEN change_type LIKE ?2 THEN 1 ELSE 0 END),
         SUM(CASE WHEN change_type LIKE ?3 THEN 1 ELSE 0 END),
         SUM(CASE WHEN kind = ?4 THEN 1 ELSE 0 END),
         SUM(CASE WHEN kind = ?5 THEN 1 ELSE 0 END)
  FROM history_events
  GROUP BY strftime('%Y', change_date), strftime('%m', change_date)
  ORDER BY year DESC, month DESC";

const YEARLY_SQL: &str = "
  SELECT CAST(strftime('%Y', change_date) AS INTEGER) AS year,
         COUNT(*),
         SUM(CASE WHEN change_type LIKE ?1 THEN 1 ELSE 0 END),
         SUM(CASE WHEN change_type LIKE ?2 THEN 1 ELSE 0 END),
         SUM(CASE WHEN change_type LIKE ?3 THEN 1 ELSE 0 END),
         SUM(CASE WHEN kind = ?4 THEN 1 ELSE 0 END),
         SUM(CASE WHEN kind = ?5 THEN 1 ELSE 0 END)
  FROM history_events
  GROUP BY strftime('%Y', change_date)
  ORDER BY year DESC";

// Labels are grouped verbatim; values differing by whitespace or case
// form distinct groups.
const TYPE_SQL: &str = "
  SELECT change_type, COUNT(*) AS count, kind
  FROM history_events
  GROUP BY change_type, kind
  ORDER BY count DESC";

// ─── AccountStore impl ───────────────────────────────────────────────────────

impl AccountStore for SqliteStore {
  type Error = Error;

  // ── Identity accounts ─────────────────────────────────────────────────────

  async fn create_identity(&self, input: NewIdentity) -> Result<Identity> {
    input.validate().map_err(Error::Core)?;
    let now = Utc::now();

    let identity = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let today = now.date_naive();

        // Highest existing sequence for this calendar year; codes are
        // zero-padded so the textual ordering is the numeric one.
        let prefix = format!("Z{}", today.year());
        let last: Option<String> = tx
          .query_row(
            "SELECT code FROM identity_accounts WHERE code LIKE ?1
             ORDER BY code DESC LIMIT 1",
            rusqlite::params![format!("{prefix}%")],
            |row| row.get(0),
          )
          .optional()?;
        let sequence = last
          .as_deref()
          .and_then(|code| code.get(prefix.len()..))
          .and_then(|tail| tail.parse::<u32>().ok())
          .map_or(1, |seq| seq + 1);

        let identity = Identity {
          account_id:    Uuid::new_v4(),
          code:          format!("{prefix}{sequence:03}"),
          name:          input.name,
          organization:  input.organization,
          department:    input.department,
          category:      input.category,
          vendor_name:   input.vendor_name,
          duty:          input.duty,
          work_scope:    input.work_scope,
          requester:     input.requester,
          status:        IdentityStatus::Registered,
          registered_on: today,
          locked_on:     None,
          deleted_on:    None,
          created_at:    now,
          updated_at:    now,
        };

        insert_identity(&tx, &identity)?;
        insert_event(&tx, &stamp(audit::identity_created(&identity)))?;
        tx.commit()?;
        Ok(identity)
      })
      .await
      .map_err(|e| constraint_conflict(e, "identity code collision"))?;

    Ok(identity)
  }

  async fn get_identity(&self, id: Uuid) -> Result<Option<Identity>> {
    let raw = self
      .conn
      .call(move |conn| Ok(fetch_identity_raw(conn, id)?))
      .await?;
    raw.map(RawIdentity::into_identity).transpose()
  }

  async fn list_identities(&self) -> Result<Vec<Identity>> {
    let raws: Vec<RawIdentity> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {IDENTITY_COLUMNS} FROM identity_accounts ORDER BY code"
        ))?;
        let rows = stmt
          .query_map([], identity_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawIdentity::into_identity).collect()
  }

  async fn update_identity(
    &self,
    id: Uuid,
    changes: UpdateIdentity,
  ) -> Result<Identity> {
    changes.validate().map_err(Error::Core)?;
    let now = Utc::now();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(current) = fetch_identity_raw(&tx, id)? else {
          return Ok(Err(CoreError::IdentityNotFound(id)));
        };
        let current = current.into_identity().map_err(into_call_err)?;

        // Lock/delete dates follow the incoming status alone; leaving a
        // state clears its date. Past transitions live in the history
        // log, not on the row.
        let today = now.date_naive();
        let (locked_on, deleted_on) = match changes.status {
          IdentityStatus::Locked => (Some(today), None),
          IdentityStatus::Deleted => (None, Some(today)),
          IdentityStatus::Registered => (None, None),
        };

        let identity = Identity {
          account_id: id,
          code: current.code,
          name: changes.name,
          organization: changes.organization,
          department: changes.department,
          category: changes.category,
          vendor_name: changes.vendor_name,
          duty: changes.duty,
          work_scope: changes.work_scope,
          requester: changes.requester,
          status: changes.status,
          registered_on: current.registered_on,
          locked_on,
          deleted_on,
          created_at: current.created_at,
          updated_at: now,
        };

        update_identity_row(&tx, &identity)?;
        insert_event(
          &tx,
          &stamp(audit::identity_updated(
            &identity,
            changes.changed_by.as_deref(),
          )),
        )?;
        tx.commit()?;
        Ok(Ok(identity))
      })
      .await?;

    Ok(outcome?)
  }

  async fn soft_delete_identity(&self, id: Uuid) -> Result<Identity> {
    let now = Utc::now();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(current) = fetch_identity_raw(&tx, id)? else {
          return Ok(Err(CoreError::IdentityNotFound(id)));
        };
        let mut identity = current.into_identity().map_err(into_call_err)?;

        identity.status = IdentityStatus::Deleted;
        identity.deleted_on = Some(now.date_naive());
        identity.updated_at = now;

        update_identity_row(&tx, &identity)?;
        insert_event(&tx, &stamp(audit::identity_deleted(id)))?;
        tx.commit()?;
        Ok(Ok(identity))
      })
      .await?;

    Ok(outcome?)
  }

  // ── Mailbox accounts ──────────────────────────────────────────────────────

  async fn create_mailbox(&self, input: NewMailbox) -> Result<MailboxView> {
    input.validate().map_err(Error::Core)?;
    let now = Utc::now();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let owner = match input.owner_id {
          Some(owner_id) => match fetch_owner(&tx, owner_id)? {
            Some(found) => Some(found),
            None => return Ok(Err(CoreError::IdentityNotFound(owner_id))),
          },
          None => None,
        };

        // A personal mailbox with no explicit department inherits the
        // owner's.
        let department = input
          .department
          .filter(|d| !d.trim().is_empty())
          .or_else(|| owner.as_ref().map(|(_, _, dept)| dept.clone()));

        let mailbox = Mailbox {
          mailbox_id:   Uuid::new_v4(),
          owner_id:     input.owner_id,
          display_name: input.display_name,
          login_id:     input.login_id,
          secret:       input.secret,
          department,
          role:         input.role,
          status:       input.status,
          approval:     input.approval,
          otp_enabled:  input.otp_enabled,
          manager_code: input.manager_code,
          created_at:   now,
          updated_at:   now,
        };

        insert_mailbox(&tx, &mailbox)?;
        insert_event(&tx, &stamp(audit::mailbox_created(&mailbox)))?;
        tx.commit()?;

        Ok(Ok(MailboxView {
          mailbox:     masked(mailbox),
          linked_code: owner.as_ref().map(|(code, _, _)| code.clone()),
          linked_name: owner.map(|(_, name, _)| name),
        }))
      })
      .await
      .map_err(|e| constraint_conflict(e, "login id already taken"))?;

    Ok(outcome?)
  }

  async fn get_mailbox(&self, id: Uuid) -> Result<Option<MailboxView>> {
    let raw = self
      .conn
      .call(move |conn| Ok(fetch_mailbox_raw(conn, id)?))
      .await?;
    raw.map(RawMailbox::into_view).transpose()
  }

  async fn list_mailboxes(&self) -> Result<Vec<MailboxView>> {
    let raws: Vec<RawMailbox> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MAILBOX_COLUMNS} {MAILBOX_JOIN} ORDER BY m.login_id"
        ))?;
        let rows = stmt
          .query_map([], mailbox_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawMailbox::into_view).collect()
  }

  async fn update_mailbox(
    &self,
    id: Uuid,
    changes: UpdateMailbox,
  ) -> Result<MailboxView> {
    changes.validate().map_err(Error::Core)?;
    let now = Utc::now();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let current: Option<(String, String)> = tx
          .query_row(
            "SELECT secret, created_at FROM mailbox_accounts WHERE mailbox_id = ?1",
            rusqlite::params![encode_uuid(id)],
            |row| Ok((row.get(0)?, row.get(1)?)),
          )
          .optional()?;
        let Some((current_secret, created_at)) = current else {
          return Ok(Err(CoreError::MailboxNotFound(id)));
        };

        let owner = match changes.owner_id {
          Some(owner_id) => match fetch_owner(&tx, owner_id)? {
            Some(found) => Some(found),
            None => return Ok(Err(CoreError::IdentityNotFound(owner_id))),
          },
          None => None,
        };

        let mailbox = Mailbox {
          mailbox_id:   id,
          owner_id:     changes.owner_id,
          display_name: changes.display_name,
          login_id:     changes.login_id,
          secret:       effective_secret(current_secret, changes.secret),
          department:   changes.department,
          role:         changes.role,
          status:       changes.status,
          approval:     changes.approval,
          otp_enabled:  changes.otp_enabled,
          manager_code: changes.manager_code,
          created_at:   decode_dt(&created_at).map_err(into_call_err)?,
          updated_at:   now,
        };

        update_mailbox_row(&tx, &mailbox)?;
        insert_event(&tx, &stamp(audit::mailbox_updated(&mailbox)))?;
        tx.commit()?;

        Ok(Ok(MailboxView {
          mailbox:     masked(mailbox),
          linked_code: owner.as_ref().map(|(code, _, _)| code.clone()),
          linked_name: owner.map(|(_, name, _)| name),
        }))
      })
      .await
      .map_err(|e| constraint_conflict(e, "login id already taken"))?;

    Ok(outcome?)
  }

  async fn soft_delete_mailbox(&self, id: Uuid) -> Result<MailboxView> {
    let now = Utc::now();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(current) = fetch_mailbox_raw(&tx, id)? else {
          return Ok(Err(CoreError::MailboxNotFound(id)));
        };
        let mut view = current.into_view().map_err(into_call_err)?;

        view.mailbox.status = MailboxStatus::Withdrawn;
        view.mailbox.updated_at = now;

        tx.execute(
          "UPDATE mailbox_accounts SET status = ?2, updated_at = ?3
           WHERE mailbox_id = ?1",
          rusqlite::params![
            encode_uuid(id),
            encode_mailbox_status(MailboxStatus::Withdrawn),
            encode_dt(now),
          ],
        )?;
        insert_event(&tx, &stamp(audit::mailbox_deleted(&view.mailbox)))?;
        tx.commit()?;
        Ok(Ok(view))
      })
      .await?;

    Ok(outcome?)
  }

  // ── Dashboard ─────────────────────────────────────────────────────────────

  async fn dashboard(&self, filter: &HistoryFilter) -> Result<Dashboard> {
    let (conds, params) = filter_predicates(filter);
    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };

    let list_sql = format!(
      "SELECT h.event_id, h.subject_id, h.changed_by, h.change_date,
              h.kind, h.change_type, h.change_detail,
              a.name AS linked_name, a.code AS linked_code,
              a.department AS linked_department
       FROM history_events h
       LEFT JOIN identity_accounts a ON h.subject_id = a.account_id
       {where_clause}
       ORDER BY h.change_date DESC"
    );
    let count_sql =
      format!("SELECT COUNT(*) FROM history_events h {where_clause}");

    let dashboard = self
      .conn
      .call(move |conn| {
        // Filtered listing, newest first.
        let mut stmt = conn.prepare(&list_sql)?;
        let raws = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            Ok(RawHistoryEntry {
              event_id:          row.get(0)?,
              subject_id:        row.get(1)?,
              changed_by:        row.get(2)?,
              change_date:       row.get(3)?,
              kind:              row.get(4)?,
              change_type:       row.get(5)?,
              change_detail:     row.get(6)?,
              linked_name:       row.get(7)?,
              linked_code:       row.get(8)?,
              linked_department: row.get(9)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        let history = raws
          .into_iter()
          .map(|raw| raw.into_entry().map_err(into_call_err))
          .collect::<Result<Vec<_>, tokio_rusqlite::Error>>()?;

        let total_count: i64 = conn.query_row(
          &count_sql,
          rusqlite::params_from_iter(params.iter()),
          |row| row.get(0),
        )?;

        // The statistics views run over the whole log, unfiltered.
        let stat_params = vec![
          SqlParam::Text(format!("%{}%", audit::CREATED_KEYWORD)),
          SqlParam::Text(format!("%{}%", audit::UPDATED_KEYWORD)),
          SqlParam::Text(format!("%{}%", audit::DELETED_KEYWORD)),
          SqlParam::Text(encode_account_kind(AccountKind::Mailbox).to_owned()),
          SqlParam::Text(encode_account_kind(AccountKind::Identity).to_owned()),
        ];

        let mut stmt = conn.prepare(MONTHLY_SQL)?;
        let monthly_stats = stmt
          .query_map(rusqlite::params_from_iter(stat_params.iter()), |row| {
            Ok(MonthlyStat {
              year:           row.get::<_, i64>(0)? as i32,
              month:          row.get::<_, i64>(1)? as u32,
              total_count:    row.get::<_, i64>(2)? as u64,
              create_count:   row.get::<_, i64>(3)? as u64,
              update_count:   row.get::<_, i64>(4)? as u64,
              delete_count:   row.get::<_, i64>(5)? as u64,
              mailbox_count:  row.get::<_, i64>(6)? as u64,
              identity_count: row.get::<_, i64>(7)? as u64,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(YEARLY_SQL)?;
        let yearly_stats = stmt
          .query_map(rusqlite::params_from_iter(stat_params.iter()), |row| {
            Ok(YearlyStat {
              year:           row.get::<_, i64>(0)? as i32,
              total_count:    row.get::<_, i64>(1)? as u64,
              create_count:   row.get::<_, i64>(2)? as u64,
              update_count:   row.get::<_, i64>(3)? as u64,
              delete_count:   row.get::<_, i64>(4)? as u64,
              mailbox_count:  row.get::<_, i64>(5)? as u64,
              identity_count: row.get::<_, i64>(6)? as u64,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(TYPE_SQL)?;
        let raw_types = stmt
          .query_map([], |row| {
            Ok((
              row.get::<_, String>(0)?,
              row.get::<_, i64>(1)?,
              row.get::<_, String>(2)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        let type_stats = raw_types
          .into_iter()
          .map(|(change_type, count, kind)| {
            Ok(TypeStat {
              change_type,
              count: count as u64,
              kind:  decode_account_kind(&kind).map_err(into_call_err)?,
            })
          })
          .collect::<Result<Vec<_>, tokio_rusqlite::Error>>()?;

        Ok(Dashboard {
          history,
          total_count: total_count as u64,
          monthly_stats,
          yearly_stats,
          type_stats,
        })
      })
      .await?;

    Ok(dashboard)
  }
}
