//! Handlers for `GET /reports/*`.
//!
//! Query parameters map directly onto [`ReportRequest`] fields; the
//! sentinel `"all"` is accepted anywhere a slug is and folded away by the
//! engine's normalisation.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use fundlens_core::{
  report::ReportTable,
  request::{ReportRequest, ReportShape},
  store::DonationStore,
};
use fundlens_engine::ReportEngine;
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize, Default)]
pub struct ReportParams {
  /// Year slug, or `"all"`.
  pub year:       Option<String>,
  /// Donor-type (category) slug, or `"all"`.
  pub donor_type: Option<String>,
  /// Free-text filter over the archive's primary dimension.
  pub search:     Option<String>,
  /// Row cap for the top-recipients report.
  pub limit:      Option<usize>,
}

impl ReportParams {
  fn into_request(self, shape: ReportShape) -> ReportRequest {
    let mut request = ReportRequest::new(shape);
    request.year = self.year;
    request.donor_type = self.donor_type;
    request.search = self.search;
    request.limit = self.limit;
    request
  }
}

async fn run<S: DonationStore>(
  engine: &ReportEngine<S>,
  request: &ReportRequest,
) -> Result<Json<ReportTable>, ApiError> {
  let table = engine.generate(request).await?;
  Ok(Json(table.as_ref().clone()))
}

/// `GET /reports/recipients[?year=...][&search=...]`
pub async fn recipient_archive<S: DonationStore>(
  State(engine): State<Arc<ReportEngine<S>>>,
  Query(params): Query<ReportParams>,
) -> Result<Json<ReportTable>, ApiError> {
  let request = params.into_request(ReportShape::RecipientArchive);
  run(&engine, &request).await
}

/// `GET /reports/donors[?year=...][&donor_type=...][&search=...]`
pub async fn donor_archive<S: DonationStore>(
  State(engine): State<Arc<ReportEngine<S>>>,
  Query(params): Query<ReportParams>,
) -> Result<Json<ReportTable>, ApiError> {
  let request = params.into_request(ReportShape::DonorArchive);
  run(&engine, &request).await
}

/// `GET /reports/recipients/{slug}[?year=...][&donor_type=...]`
pub async fn single_recipient<S: DonationStore>(
  State(engine): State<Arc<ReportEngine<S>>>,
  Path(slug): Path<String>,
  Query(params): Query<ReportParams>,
) -> Result<Json<ReportTable>, ApiError> {
  let mut request = params.into_request(ReportShape::SingleRecipient);
  request.recipient = Some(slug);
  run(&engine, &request).await
}

/// `GET /reports/donors/{slug}[?year=...][&donor_type=...]`
pub async fn single_donor<S: DonationStore>(
  State(engine): State<Arc<ReportEngine<S>>>,
  Path(slug): Path<String>,
  Query(params): Query<ReportParams>,
) -> Result<Json<ReportTable>, ApiError> {
  let mut request = params.into_request(ReportShape::SingleDonor);
  request.donor = Some(slug);
  run(&engine, &request).await
}

/// `GET /reports/top[?donor_type=...][&year=...][&limit=...]`
pub async fn top_recipients<S: DonationStore>(
  State(engine): State<Arc<ReportEngine<S>>>,
  Query(params): Query<ReportParams>,
) -> Result<Json<ReportTable>, ApiError> {
  let request = params.into_request(ReportShape::TopRecipients);
  run(&engine, &request).await
}
