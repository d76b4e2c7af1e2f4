//! Handler for `GET /dashboard`.
//!
//! Query parameters arrive as optional strings; empty values mean "no
//! filter". `accountType` accepts `SSO` or `webmail` and maps onto the
//! stored account-kind tag.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::NaiveDate;
use roster_core::{
  history::{
    AccountKind, Dashboard, HistoryEntry, HistoryFilter, MonthlyStat,
    TypeStat, YearlyStat,
  },
  store::AccountStore,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ApiError;

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DashboardParams {
  pub year:         Option<String>,
  pub month:        Option<String>,
  pub change_type:  Option<String>,
  pub changed_by:   Option<String>,
  pub start_date:   Option<String>,
  pub end_date:     Option<String>,
  pub account_type: Option<String>,
}

/// Response envelope; key casing is part of the interface.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
  pub history:       Vec<HistoryEntry>,
  pub total_count:   u64,
  pub monthly_stats: Vec<MonthlyStat>,
  pub yearly_stats:  Vec<YearlyStat>,
  pub type_stats:    Vec<TypeStat>,
}

impl From<Dashboard> for DashboardResponse {
  fn from(d: Dashboard) -> Self {
    DashboardResponse {
      history:       d.history,
      total_count:   d.total_count,
      monthly_stats: d.monthly_stats,
      yearly_stats:  d.yearly_stats,
      type_stats:    d.type_stats,
    }
  }
}

fn parse_number<T: FromStr>(
  value: Option<String>,
  name: &str,
) -> Result<Option<T>, ApiError> {
  match value.as_deref() {
    None | Some("") => Ok(None),
    Some(s) => s.parse::<T>().map(Some).map_err(|_| {
      ApiError::BadRequest(format!("{name} must be an integer, got {s:?}"))
    }),
  }
}

fn parse_date(
  value: Option<String>,
  name: &str,
) -> Result<Option<NaiveDate>, ApiError> {
  match value.as_deref() {
    None | Some("") => Ok(None),
    Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
      .map(Some)
      .map_err(|_| {
        ApiError::BadRequest(format!("{name} must be YYYY-MM-DD, got {s:?}"))
      }),
  }
}

fn parse_filter(params: DashboardParams) -> Result<HistoryFilter, ApiError> {
  let kind = match params.account_type.as_deref() {
    None | Some("") => None,
    Some("SSO") => Some(AccountKind::Identity),
    Some("webmail") => Some(AccountKind::Mailbox),
    Some(other) => {
      return Err(ApiError::BadRequest(format!(
        "accountType must be SSO or webmail, got {other:?}"
      )));
    }
  };

  Ok(HistoryFilter {
    year:        parse_number(params.year, "year")?,
    month:       parse_number(params.month, "month")?,
    change_type: params.change_type.filter(|s| !s.is_empty()),
    changed_by:  params.changed_by.filter(|s| !s.is_empty()),
    from:        parse_date(params.start_date, "startDate")?,
    until:       parse_date(params.end_date, "endDate")?,
    kind,
  })
}

/// `GET /dashboard[?year=...][&month=...][&changeType=...][&changedBy=...]
/// [&startDate=...][&endDate=...][&accountType=SSO|webmail]`
pub async fn handler<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardResponse>, ApiError>
where
  S: AccountStore,
{
  let filter = parse_filter(params)?;
  let dashboard = store
    .dashboard(&filter)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(DashboardResponse::from(dashboard)))
}
