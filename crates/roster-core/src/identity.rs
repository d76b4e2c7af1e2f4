//! Identity accounts — SSO-style person records with a lifecycle status.
//!
//! Every identity carries a human-readable code of the form
//! `Z<year><seq:03>` (e.g. `Z2024001`), assigned at creation and never
//! reused. Lock and delete dates are derived from the status on every
//! write: they are set when the status enters the corresponding state and
//! cleared otherwise. The history log, not the entity row, is the durable
//! record of past transitions.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Employment relationship of the account holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeCategory {
  Internal,
  Outsourced,
  Volunteer,
}

/// Lifecycle status of an identity account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityStatus {
  Registered,
  Locked,
  Deleted,
}

impl fmt::Display for IdentityStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Registered => "registered",
      Self::Locked => "locked",
      Self::Deleted => "deleted",
    })
  }
}

/// A tracked person in the organisation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
  pub account_id:    Uuid,
  /// Unique code `Z<year><seq:03>`, assigned at creation.
  pub code:          String,
  pub name:          String,
  pub organization:  String,
  pub department:    String,
  pub category:      EmployeeCategory,
  /// Vendor company; required when `category` is `Outsourced`.
  pub vendor_name:   Option<String>,
  pub duty:          Option<String>,
  pub work_scope:    Option<String>,
  /// Who asked for the account; free text.
  pub requester:     String,
  pub status:        IdentityStatus,
  pub registered_on: NaiveDate,
  /// Set iff `status` is `Locked`.
  pub locked_on:     Option<NaiveDate>,
  /// Set when `status` is `Deleted`.
  pub deleted_on:    Option<NaiveDate>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

/// Input to [`crate::store::AccountStore::create_identity`].
/// The code, status, and all dates are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewIdentity {
  pub name:         String,
  pub organization: String,
  pub department:   String,
  pub category:     EmployeeCategory,
  pub vendor_name:  Option<String>,
  pub duty:         Option<String>,
  pub work_scope:   Option<String>,
  pub requester:    String,
}

/// Input to [`crate::store::AccountStore::update_identity`].
/// Full replacement of the editable fields; the store derives lock and
/// delete dates from `status`.
#[derive(Debug, Clone)]
pub struct UpdateIdentity {
  pub name:         String,
  pub organization: String,
  pub department:   String,
  pub category:     EmployeeCategory,
  pub vendor_name:  Option<String>,
  pub duty:         Option<String>,
  pub work_scope:   Option<String>,
  pub requester:    String,
  pub status:       IdentityStatus,
  /// Acting user for the history record; the system sentinel when absent.
  pub changed_by:   Option<String>,
}

fn check_required(pairs: &[(&str, &str)]) -> Result<()> {
  for (field, value) in pairs {
    if value.trim().is_empty() {
      return Err(Error::Validation(format!("{field} is required")));
    }
  }
  Ok(())
}

fn check_vendor(
  category: EmployeeCategory,
  vendor_name: Option<&str>,
) -> Result<()> {
  if category == EmployeeCategory::Outsourced
    && vendor_name.is_none_or(|v| v.trim().is_empty())
  {
    return Err(Error::Validation(
      "vendor_name is required for outsourced accounts".into(),
    ));
  }
  Ok(())
}

impl NewIdentity {
  /// Check required fields before any write is attempted.
  pub fn validate(&self) -> Result<()> {
    check_required(&[
      ("name", &self.name),
      ("organization", &self.organization),
      ("department", &self.department),
      ("requester", &self.requester),
    ])?;
    check_vendor(self.category, self.vendor_name.as_deref())
  }
}

impl UpdateIdentity {
  pub fn validate(&self) -> Result<()> {
    check_required(&[
      ("name", &self.name),
      ("organization", &self.organization),
      ("department", &self.department),
      ("requester", &self.requester),
    ])?;
    check_vendor(self.category, self.vendor_name.as_deref())
  }
}
