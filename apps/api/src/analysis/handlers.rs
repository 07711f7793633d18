//! Axum route handler for the Analysis API.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

use crate::analysis::models::{AnalysisInput, AnalysisOutput};
use crate::analysis::pipeline::perform_analysis;
use crate::errors::AppError;
use crate::state::AppState;

/// POST /analyze
///
/// Accepts `{ jobDescriptionPdf, cvPdf }` (both base64) and returns the
/// assessment plus processing metadata. A body that is not valid JSON or has
/// mistyped fields is a bad-input error like any other malformed input.
pub async fn handle_analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalysisInput>, JsonRejection>,
) -> Result<Json<AnalysisOutput>, AppError> {
    let Json(input) = payload.map_err(|rejection| {
        warn!("Rejected analyze request body: {rejection}");
        AppError::BadInput(rejection.body_text())
    })?;

    let request_id = Uuid::new_v4();
    let output = perform_analysis(input, state.extractor.as_ref(), state.assessor.as_ref())
        .instrument(info_span!("analyze", %request_id))
        .await?;

    Ok(Json(output))
}
