//! JSON REST API for Roster.
//!
//! Exposes an axum [`Router`] backed by any
//! [`roster_core::store::AccountStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", roster_api::api_router(store.clone()))
//! ```

pub mod dashboard;
pub mod error;
pub mod identities;
pub mod mailboxes;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use roster_core::store::AccountStore;
use serde::Deserialize;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `ROSTER_`-prefixed environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("roster.db") }

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router
/// regardless of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: AccountStore + 'static,
{
  Router::new()
    // Identity accounts
    .route(
      "/identities",
      get(identities::list::<S>).post(identities::create::<S>),
    )
    .route(
      "/identities/{id}",
      get(identities::get_one::<S>)
        .put(identities::update::<S>)
        .delete(identities::remove::<S>),
    )
    // Mailbox accounts
    .route(
      "/mailboxes",
      get(mailboxes::list::<S>).post(mailboxes::create::<S>),
    )
    .route(
      "/mailboxes/{id}",
      get(mailboxes::get_one::<S>)
        .put(mailboxes::update::<S>)
        .delete(mailboxes::remove::<S>),
    )
    // Dashboard
    .route("/dashboard", get(dashboard::handler::<S>))
    .with_state(store)
}
