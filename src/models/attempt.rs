// src/models/attempt.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::question::validate_answer_key;

/// Represents the 'quiz_attempts' table in the database.
/// Append-only; only the reconciliation pass rewrites `points_earned`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub learner_id: String,
    pub question_id: i64,
    pub selected_answer: String,
    pub is_correct: bool,
    pub points_earned: i64,
    pub created_at: DateTime<Utc>,
}

/// An attempt that has been graded but not yet stored.
#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub learner_id: String,
    pub question_id: i64,
    pub selected_answer: String,
    pub is_correct: bool,
    pub points_earned: i64,
}

/// DTO for submitting one answer.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAttemptRequest {
    #[validate(range(min = 1))]
    pub question_id: i64,
    #[validate(custom(function = validate_answer_key))]
    pub selected_answer: String,
}

/// Returned after grading; this is the only place the answer key leaves the server.
#[derive(Debug, Serialize, Deserialize)]
pub struct AttemptResult {
    pub attempt_id: i64,
    pub is_correct: bool,
    pub correct_answer: String,
    pub explanation: Option<String>,
    pub points_earned: i64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct QuizStats {
    pub total_attempts: usize,
    pub correct_attempts: usize,
    pub questions_solved: usize,
    pub questions_missed: usize,
    pub quiz_points: i64,
    pub accuracy: f64,
}

/// A single stored attempt whose points disagree with the first-correct-only rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointCorrection {
    pub attempt_id: i64,
    pub old_points: i64,
    pub new_points: i64,
}
