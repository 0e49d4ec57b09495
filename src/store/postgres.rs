// src/store/postgres.rs

//! Postgres-backed store.
//!
//! Queries are built at runtime with `sqlx::query_as::<_, T>` rather than the
//! `query_as!` macros, so the crate compiles without a live database or a
//! `.sqlx` offline cache. The shared column lists keep the `FromRow` models and
//! the SQL in step.

use async_trait::async_trait;
use sqlx::PgPool;

use super::LearnifyStore;
use crate::{
    error::AppError,
    models::{
        attempt::{Attempt, NewAttempt, PointCorrection},
        leaderboard::LearnerAggregate,
        question::Question,
    },
};

const QUESTION_COLUMNS: &str = r#"
    id, question_text, category, difficulty_level,
    option_a, option_b, option_c, option_d,
    correct_answer, explanation, is_active
"#;

const ATTEMPT_COLUMNS: &str = r#"
    id, learner_id, question_id, selected_answer,
    is_correct, points_earned, created_at
"#;

/// `LearnifyStore` backed by Postgres.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_attempt(&self, attempt: &NewAttempt) -> Result<Attempt, sqlx::Error> {
        let sql = format!(
            "INSERT INTO quiz_attempts
             (learner_id, question_id, selected_answer, is_correct, points_earned)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {ATTEMPT_COLUMNS}"
        );

        sqlx::query_as::<_, Attempt>(&sql)
            .bind(&attempt.learner_id)
            .bind(attempt.question_id)
            .bind(&attempt.selected_answer)
            .bind(attempt.is_correct)
            .bind(attempt.points_earned)
            .fetch_one(&self.pool)
            .await
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

fn attempt_error(err: sqlx::Error) -> AppError {
    if err
        .as_database_error()
        .is_some_and(|db| db.is_foreign_key_violation())
    {
        AppError::NotFound("Learner or question not found".to_string())
    } else {
        tracing::error!("Failed to record attempt: {:?}", err);
        AppError::from(err)
    }
}

#[async_trait]
impl LearnifyStore for PgStore {
    async fn fetch_active_questions(
        &self,
        difficulty: Option<i16>,
    ) -> Result<Vec<Question>, AppError> {
        let sql = format!(
            "SELECT {QUESTION_COLUMNS} FROM questions
             WHERE is_active = TRUE AND ($1::SMALLINT IS NULL OR difficulty_level = $1)
             ORDER BY id"
        );

        sqlx::query_as::<_, Question>(&sql)
            .bind(difficulty)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch questions: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })
    }

    async fn fetch_question(&self, id: i64) -> Result<Option<Question>, AppError> {
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1");

        sqlx::query_as::<_, Question>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch question {}: {:?}", id, e);
                AppError::InternalServerError(e.to_string())
            })
    }

    async fn fetch_learner_attempts(&self, learner_id: &str) -> Result<Vec<Attempt>, AppError> {
        let sql = format!(
            "SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts
             WHERE learner_id = $1
             ORDER BY created_at, id"
        );

        sqlx::query_as::<_, Attempt>(&sql)
            .bind(learner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch attempts for {}: {:?}", learner_id, e);
                AppError::InternalServerError(e.to_string())
            })
    }

    async fn record_attempt(&self, attempt: NewAttempt) -> Result<Attempt, AppError> {
        match self.insert_attempt(&attempt).await {
            // Another request already got points for this question; store this one unpaid.
            Err(e) if attempt.points_earned > 0 && is_unique_violation(&e) => {
                tracing::info!(
                    learner = %attempt.learner_id,
                    question = attempt.question_id,
                    "Points already awarded, recording attempt with 0 points"
                );
                let unpaid = NewAttempt {
                    points_earned: 0,
                    ..attempt
                };
                self.insert_attempt(&unpaid)
                    .await
                    .map_err(attempt_error)
            }
            result => result.map_err(attempt_error),
        }
    }

    async fn fetch_all_attempts(&self) -> Result<Vec<Attempt>, AppError> {
        let sql = format!("SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts ORDER BY created_at, id");

        sqlx::query_as::<_, Attempt>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch attempt log: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })
    }

    async fn apply_point_corrections(
        &self,
        corrections: &[PointCorrection],
    ) -> Result<u64, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        // Withdraw points before granting them so the award-once index never sees two paid rows.
        let mut ordered: Vec<&PointCorrection> = corrections.iter().collect();
        ordered.sort_by_key(|c| (c.new_points > 0, c.attempt_id));

        let mut changed = 0;
        for correction in ordered {
            let result = sqlx::query("UPDATE quiz_attempts SET points_earned = $1 WHERE id = $2")
                .bind(correction.new_points)
                .bind(correction.attempt_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::InternalServerError(e.to_string()))?;
            changed += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        Ok(changed)
    }

    async fn fetch_leaderboard_aggregates(&self) -> Result<Vec<LearnerAggregate>, AppError> {
        sqlx::query_as::<_, LearnerAggregate>(
            r#"
            SELECT
                l.id AS learner_id,
                l.display_name,
                COALESCE(c.total, 0) AS check_in_count,
                COALESCE(r.total, 0) AS review_count,
                COALESCE(s.total, 0) AS submission_count,
                COALESCE(q.points, 0)::BIGINT AS quiz_points,
                c.latest AS latest_check_in
            FROM learners l
            LEFT JOIN (
                SELECT learner_id, COUNT(*) AS total, MAX(checked_in_at) AS latest
                FROM check_ins GROUP BY learner_id
            ) c ON c.learner_id = l.id
            LEFT JOIN (
                SELECT reviewer_id AS learner_id, COUNT(*) AS total
                FROM app_reviews GROUP BY reviewer_id
            ) r ON r.learner_id = l.id
            LEFT JOIN (
                SELECT learner_id, COUNT(*) AS total
                FROM submissions GROUP BY learner_id
            ) s ON s.learner_id = l.id
            LEFT JOIN (
                SELECT learner_id, SUM(points_earned) AS points
                FROM quiz_attempts GROUP BY learner_id
            ) q ON q.learner_id = l.id
            WHERE l.role = 'student'
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch leaderboard aggregates: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })
    }
}
