// src/models/leaderboard.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Per-learner activity counts, aggregated by the store.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LearnerAggregate {
    pub learner_id: String,
    pub display_name: String,
    pub check_in_count: i64,
    pub review_count: i64,
    pub submission_count: i64,
    /// Already first-correct-only; the ranker does not recompute it.
    pub quiz_points: i64,
    pub latest_check_in: Option<DateTime<Utc>>,
}

/// One row of the computed leaderboard. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub learner_id: String,
    pub display_name: String,
    pub score: i64,
    pub check_in_count: i64,
    pub latest_check_in: Option<DateTime<Utc>>,
    pub rank: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContextParams {
    pub context: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LeaderboardPage {
    pub entries: Vec<LeaderboardEntry>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}
