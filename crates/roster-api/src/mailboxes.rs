//! Handlers for `/mailboxes` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/mailboxes` | All mailbox accounts with linked identity fields |
//! | `POST`   | `/mailboxes` | Body: [`CreateMailboxBody`]; 201 + stored account |
//! | `GET`    | `/mailboxes/:id` | 404 if not found |
//! | `PUT`    | `/mailboxes/:id` | Body: [`UpdateMailboxBody`]; full replacement |
//! | `DELETE` | `/mailboxes/:id` | Soft delete: status → withdrawn, row retained |
//!
//! The secret field of every response is the fixed mask token.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use roster_core::{
  mailbox::{
    ApprovalStatus, MailboxRole, MailboxStatus, MailboxView, NewMailbox,
    UpdateMailbox,
  },
  store::AccountStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /mailboxes`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<MailboxView>>, ApiError>
where
  S: AccountStore,
{
  let mailboxes = store.list_mailboxes().await.map_err(ApiError::from_store)?;
  Ok(Json(mailboxes))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /mailboxes`. Role, status, approval, and
/// the OTP flag default like fresh accounts do.
#[derive(Debug, Deserialize)]
pub struct CreateMailboxBody {
  pub owner_id:     Option<Uuid>,
  pub display_name: String,
  pub login_id:     String,
  pub secret:       String,
  pub department:   Option<String>,
  pub role:         Option<MailboxRole>,
  pub status:       Option<MailboxStatus>,
  pub approval:     Option<ApprovalStatus>,
  #[serde(default)]
  pub otp_enabled:  bool,
  pub manager_code: Option<String>,
}

impl From<CreateMailboxBody> for NewMailbox {
  fn from(b: CreateMailboxBody) -> Self {
    NewMailbox {
      owner_id:     b.owner_id,
      display_name: b.display_name,
      login_id:     b.login_id,
      secret:       b.secret,
      department:   b.department,
      role:         b.role.unwrap_or_default(),
      status:       b.status.unwrap_or_default(),
      approval:     b.approval.unwrap_or_default(),
      otp_enabled:  b.otp_enabled,
      manager_code: b.manager_code,
    }
  }
}

/// `POST /mailboxes` — returns 201 + the stored [`MailboxView`].
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateMailboxBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AccountStore,
{
  let view = store
    .create_mailbox(NewMailbox::from(body))
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(view)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /mailboxes/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<MailboxView>, ApiError>
where
  S: AccountStore,
{
  let view = store
    .get_mailbox(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| {
      ApiError::NotFound(format!("mailbox account {id} not found"))
    })?;
  Ok(Json(view))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `PUT /mailboxes/:id`. A secret that is absent,
/// empty, or the mask token keeps the stored one.
#[derive(Debug, Deserialize)]
pub struct UpdateMailboxBody {
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

impl From<UpdateMailboxBody> for UpdateMailbox {
  fn from(b: UpdateMailboxBody) -> Self {
    UpdateMailbox {
      owner_id:     b.owner_id,
      display_name: b.display_name,
      login_id:     b.login_id,
      secret:       b.secret,
      department:   b.department,
      role:         b.role,
      status:       b.status,
      approval:     b.approval,
      otp_enabled:  b.otp_enabled,
      manager_code: b.manager_code,
    }
  }
}

/// `PUT /mailboxes/:id`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateMailboxBody>,
) -> Result<Json<MailboxView>, ApiError>
where
  S: AccountStore,
{
  let view = store
    .update_mailbox(id, UpdateMailbox::from(body))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(view))
}

// ─── Soft delete ──────────────────────────────────────────────────────────────

/// `DELETE /mailboxes/:id` — returns the withdrawn account.
pub async fn remove<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<MailboxView>, ApiError>
where
  S: AccountStore,
{
  let view = store
    .soft_delete_mailbox(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(view))
}
