// src/handlers/leaderboard.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};

use crate::{
    config::{DEFAULT_CONTEXT_SIZE, DEFAULT_LEADERBOARD_LIMIT, MAX_CONTEXT_SIZE, MAX_LEADERBOARD_LIMIT},
    error::AppError,
    models::leaderboard::{ContextParams, LeaderboardPage, LeaderboardParams},
    services::ranking::{find_leaderboard_context, paginate, rank_leaderboard},
    store::LearnifyStore,
};

fn clamp_or(raw: Option<i64>, default: usize, min: usize, max: usize) -> usize {
    match raw {
        None => default,
        Some(n) => n.clamp(min as i64, max as i64) as usize,
    }
}

/// Returns one page of the full ranking.
pub async fn get_leaderboard(
    State(store): State<Arc<dyn LearnifyStore>>,
    Query(params): Query<LeaderboardParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = clamp_or(params.limit, DEFAULT_LEADERBOARD_LIMIT, 1, MAX_LEADERBOARD_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0) as usize;

    let aggregates = store.fetch_leaderboard_aggregates().await?;
    let ranked = rank_leaderboard(&aggregates);

    Ok(Json(LeaderboardPage {
        entries: paginate(&ranked, limit, offset),
        total: ranked.len(),
        limit,
        offset,
    }))
}

/// Returns a learner's entry together with the entries around it.
pub async fn get_learner_context(
    State(store): State<Arc<dyn LearnifyStore>>,
    Path(learner_id): Path<String>,
    Query(params): Query<ContextParams>,
) -> Result<impl IntoResponse, AppError> {
    let context = clamp_or(params.context, DEFAULT_CONTEXT_SIZE, 0, MAX_CONTEXT_SIZE);

    let aggregates = store.fetch_leaderboard_aggregates().await?;
    let ranked = rank_leaderboard(&aggregates);

    let result = find_leaderboard_context(&ranked, &learner_id, context)?;
    Ok(Json(result))
}
