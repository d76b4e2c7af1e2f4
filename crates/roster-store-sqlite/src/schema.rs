//! SQL schema for the Roster SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated
//! on `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS identity_accounts (
    account_id    TEXT PRIMARY KEY,
    code          TEXT NOT NULL UNIQUE,  -- 'Z' + year + 3-digit sequence
    name          TEXT NOT NULL,
    organization  TEXT NOT NULL,
    department    TEXT NOT NULL,
    category      TEXT NOT NULL,         -- 'internal' | 'outsourced' | 'volunteer'
    vendor_name   TEXT,
    duty          TEXT,
    work_scope    TEXT,
    requester     TEXT NOT NULL,
    status        TEXT NOT NULL DEFAULT 'registered',
    registered_on TEXT NOT NULL,         -- ISO date
    locked_on     TEXT,
    deleted_on    TEXT,
    created_at    TEXT NOT NULL,         -- RFC 3339 UTC
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS mailbox_accounts (
    mailbox_id   TEXT PRIMARY KEY,
    owner_id     TEXT REFERENCES identity_accounts(account_id) ON DELETE SET NULL,
    display_name TEXT NOT NULL,
    login_id     TEXT NOT NULL UNIQUE,
    secret       TEXT NOT NULL,
    department   TEXT,
    role         TEXT NOT NULL DEFAULT 'normal',
    status       TEXT NOT NULL DEFAULT 'normal',
    approval     TEXT NOT NULL DEFAULT 'pending',
    otp_enabled  INTEGER NOT NULL DEFAULT 0,
    manager_code TEXT,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

-- History is strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS history_events (
    event_id      TEXT PRIMARY KEY,
    subject_id    TEXT REFERENCES identity_accounts(account_id) ON DELETE SET NULL,
    changed_by    TEXT NOT NULL,
    change_date   TEXT NOT NULL,         -- RFC 3339 UTC; server-assigned
    kind          TEXT NOT NULL,         -- 'identity' | 'mailbox'
    change_type   TEXT NOT NULL,         -- free-text classification label
    change_detail TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS mailbox_owner_idx   ON mailbox_accounts(owner_id);
CREATE INDEX IF NOT EXISTS history_subject_idx ON history_events(subject_id);
CREATE INDEX IF NOT EXISTS history_date_idx    ON history_events(change_date);
CREATE INDEX IF NOT EXISTS history_type_idx    ON history_events(change_type);

PRAGMA user_version = 1;
";
