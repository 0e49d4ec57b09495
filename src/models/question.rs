// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// The four answer keys a multiple-choice question can have.
pub const ANSWER_KEYS: [&str; 4] = ["A", "B", "C", "D"];

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// The text shown to the learner.
    pub question_text: String,

    pub category: String,

    /// 1 (easy) to 3 (hard).
    pub difficulty_level: i16,

    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,

    /// One of 'A', 'B', 'C', 'D'.
    pub correct_answer: String,

    /// Shown after the learner answers.
    pub explanation: Option<String>,

    pub is_active: bool,
}

/// DTO for sending question to client (excludes answer and explanation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub question_text: String,
    pub category: String,
    pub difficulty_level: i16,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            question_text: q.question_text.clone(),
            category: q.category.clone(),
            difficulty_level: q.difficulty_level,
            option_a: q.option_a.clone(),
            option_b: q.option_b.clone(),
            option_c: q.option_c.clone(),
            option_d: q.option_d.clone(),
        }
    }
}

/// Query string accepted by the question batch endpoint.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct QuestionBatchParams {
    pub count: Option<i64>,
    #[validate(range(min = 1, max = 3, message = "Difficulty must be between 1 and 3."))]
    pub difficulty: Option<i16>,
    pub mode: Option<String>,
}

pub fn validate_answer_key(answer: &str) -> Result<(), validator::ValidationError> {
    if !ANSWER_KEYS.contains(&answer) {
        return Err(validator::ValidationError::new("answer_must_be_a_to_d"));
    }
    Ok(())
}
