// src/store/mod.rs

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        attempt::{Attempt, NewAttempt, PointCorrection},
        leaderboard::LearnerAggregate,
        question::Question,
    },
};

pub mod postgres;

pub use postgres::PgStore;

/// Everything the handlers need from persistence.
///
/// Uniqueness, foreign keys and cascades are the store's job; the handlers only
/// see consistent snapshots.
#[async_trait]
pub trait LearnifyStore: Send + Sync {
    /// Active questions, optionally restricted to one difficulty level.
    async fn fetch_active_questions(&self, difficulty: Option<i16>)
    -> Result<Vec<Question>, AppError>;

    async fn fetch_question(&self, id: i64) -> Result<Option<Question>, AppError>;

    /// All attempts by one learner, oldest first.
    async fn fetch_learner_attempts(&self, learner_id: &str) -> Result<Vec<Attempt>, AppError>;

    /// Stores a graded attempt and returns it as stored.
    ///
    /// At most one attempt per (learner, question) may carry points. If another
    /// paid attempt already exists, the new one is stored with 0 points instead
    /// of failing, even when both requests raced past the handler's check.
    async fn record_attempt(&self, attempt: NewAttempt) -> Result<Attempt, AppError>;

    /// The whole attempt log, used by score reconciliation.
    async fn fetch_all_attempts(&self) -> Result<Vec<Attempt>, AppError>;

    /// Rewrites `points_earned` for each correction. Returns the number of rows changed.
    async fn apply_point_corrections(&self, corrections: &[PointCorrection])
    -> Result<u64, AppError>;

    async fn fetch_leaderboard_aggregates(&self) -> Result<Vec<LearnerAggregate>, AppError>;
}
