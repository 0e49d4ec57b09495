// src/handlers/admin.rs

use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::{error::AppError, services::scoring::reconcile_points, store::LearnifyStore};

/// Re-applies the first-correct-only rule to the whole attempt log.
/// Admin only. Safe to run repeatedly.
pub async fn fix_scores(
    State(store): State<Arc<dyn LearnifyStore>>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = store.fetch_all_attempts().await?;
    let reconciliation = reconcile_points(&attempts);

    let corrected = if reconciliation.corrections.is_empty() {
        0
    } else {
        store
            .apply_point_corrections(&reconciliation.corrections)
            .await?
    };

    tracing::info!(
        scanned = reconciliation.scanned,
        corrected,
        "Quiz points reconciled"
    );

    Ok(Json(serde_json::json!({
        "scanned": reconciliation.scanned,
        "corrected": corrected,
        "learners": reconciliation.totals,
    })))
}
