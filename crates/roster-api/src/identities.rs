//! Handlers for `/identities` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/identities` | All identity accounts |
//! | `POST`   | `/identities` | Body: [`CreateIdentityBody`]; 201 + stored account |
//! | `GET`    | `/identities/:id` | 404 if not found |
//! | `PUT`    | `/identities/:id` | Body: [`UpdateIdentityBody`]; full replacement |
//! | `DELETE` | `/identities/:id` | Soft delete: status → deleted, row retained |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use roster_core::{
  identity::{
    EmployeeCategory, Identity, IdentityStatus, NewIdentity, UpdateIdentity,
  },
  store::AccountStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /identities`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Identity>>, ApiError>
where
  S: AccountStore,
{
  let identities = store
    .list_identities()
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(identities))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /identities`.
#[derive(Debug, Deserialize)]
pub struct CreateIdentityBody {
  pub name:         String,
  pub organization: String,
  pub department:   String,
  pub category:     EmployeeCategory,
  pub vendor_name:  Option<String>,
  pub duty:         Option<String>,
  pub work_scope:   Option<String>,
  pub requester:    String,
}

impl From<CreateIdentityBody> for NewIdentity {
  fn from(b: CreateIdentityBody) -> Self {
    NewIdentity {
      name:         b.name,
      organization: b.organization,
      department:   b.department,
      category:     b.category,
      vendor_name:  b.vendor_name,
      duty:         b.duty,
      work_scope:   b.work_scope,
      requester:    b.requester,
    }
  }
}

/// `POST /identities` — returns 201 + the stored [`Identity`].
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateIdentityBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AccountStore,
{
  let identity = store
    .create_identity(NewIdentity::from(body))
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(identity)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /identities/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Identity>, ApiError>
where
  S: AccountStore,
{
  let identity = store
    .get_identity(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| {
      ApiError::NotFound(format!("identity account {id} not found"))
    })?;
  Ok(Json(identity))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `PUT /identities/:id`.
#[derive(Debug, Deserialize)]
pub struct UpdateIdentityBody {
  pub name:         String,
  pub organization: String,
  pub department:   String,
  pub category:     EmployeeCategory,
  pub vendor_name:  Option<String>,
  pub duty:         Option<String>,
  pub work_scope:   Option<String>,
  pub requester:    String,
  pub status:       IdentityStatus,
  pub changed_by:   Option<String>,
}

impl From<UpdateIdentityBody> for UpdateIdentity {
  fn from(b: UpdateIdentityBody) -> Self {
    UpdateIdentity {
      name:         b.name,
      organization: b.organization,
      department:   b.department,
      category:     b.category,
      vendor_name:  b.vendor_name,
      duty:         b.duty,
      work_scope:   b.work_scope,
      requester:    b.requester,
      status:       b.status,
      changed_by:   b.changed_by,
    }
  }
}

/// `PUT /identities/:id`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateIdentityBody>,
) -> Result<Json<Identity>, ApiError>
where
  S: AccountStore,
{
  let identity = store
    .update_identity(id, UpdateIdentity::from(body))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(identity))
}

// ─── Soft delete ──────────────────────────────────────────────────────────────

/// `DELETE /identities/:id` — returns the soft-deleted account.
pub async fn remove<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Identity>, ApiError>
where
  S: AccountStore,
{
  let identity = store
    .soft_delete_identity(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(identity))
}
