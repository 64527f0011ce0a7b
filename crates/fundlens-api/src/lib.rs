//! JSON REST API for Fundlens.
//!
//! Exposes an axum [`Router`] backed by a [`fundlens_engine::ReportEngine`]
//! over any [`fundlens_core::store::DonationStore`]. Auth, TLS, and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", fundlens_api::api_router(engine.clone()))
//! ```

pub mod error;
pub mod reports;

use std::sync::Arc;

use axum::{Router, routing::get};
use fundlens_core::store::DonationStore;
use fundlens_engine::ReportEngine;

pub use error::ApiError;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(engine: Arc<ReportEngine<S>>) -> Router<()>
where
  S: DonationStore + 'static,
{
  Router::new()
    .route("/reports/recipients", get(reports::recipient_archive::<S>))
    .route("/reports/recipients/{slug}", get(reports::single_recipient::<S>))
    .route("/reports/donors", get(reports::donor_archive::<S>))
    .route("/reports/donors/{slug}", get(reports::single_donor::<S>))
    .route("/reports/top", get(reports::top_recipients::<S>))
    .with_state(engine)
}
