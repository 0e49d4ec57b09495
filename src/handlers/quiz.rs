// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use rand::{SeedableRng, rngs::StdRng};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        attempt::{AttemptResult, NewAttempt, SubmitAttemptRequest},
        question::QuestionBatchParams,
    },
    services::{
        scoring::{points_for, quiz_stats},
        selector::{LearnerHistory, SelectionMode, clamp_count, select_questions},
    },
    store::LearnifyStore,
    utils::jwt::Claims,
};

/// Hands out a batch of questions for the current learner.
///
/// `count` is clamped to 1..=20, `mode` is one of `smart` (default), `random`
/// or `wrong_only`. If the learner's history cannot be loaded the batch is
/// drawn at random instead of failing.
pub async fn get_questions(
    State(store): State<Arc<dyn LearnifyStore>>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<QuestionBatchParams>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = params.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let count = clamp_count(params.count);
    let mode = SelectionMode::parse_lenient(params.mode.as_deref());

    let pool = store.fetch_active_questions(params.difficulty).await?;

    let history = match store.fetch_learner_attempts(&claims.sub).await {
        Ok(attempts) => Some(LearnerHistory::from_attempts(&attempts)),
        Err(e) => {
            tracing::warn!("Falling back to random selection for {}: {}", claims.sub, e);
            None
        }
    };

    let mut rng = StdRng::from_os_rng();
    let selection = select_questions(&pool, count, mode, history.as_ref(), &mut rng)?;

    tracing::info!(
        learner = %claims.sub,
        method = ?selection.selection_method,
        returned = selection.questions.len(),
        priority = selection.priority_count,
        "Selected quiz batch"
    );

    Ok(Json(selection))
}

/// Grades and records one answer.
///
/// Only the first correct answer to a question earns points; the response is
/// where the learner finally sees the answer key and explanation.
pub async fn submit_attempt(
    State(store): State<Arc<dyn LearnifyStore>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = req.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let question = store
        .fetch_question(req.question_id)
        .await?
        .filter(|q| q.is_active)
        .ok_or(AppError::NotFound("Question not found".to_string()))?;

    let prior = store.fetch_learner_attempts(&claims.sub).await?;

    let is_correct = req.selected_answer == question.correct_answer;
    let points_earned = points_for(is_correct, question.id, &prior);

    let attempt = store
        .record_attempt(NewAttempt {
            learner_id: claims.sub.clone(),
            question_id: question.id,
            selected_answer: req.selected_answer,
            is_correct,
            points_earned,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AttemptResult {
            attempt_id: attempt.id,
            is_correct,
            correct_answer: question.correct_answer,
            explanation: question.explanation,
            points_earned: attempt.points_earned,
        }),
    ))
}

/// Quiz statistics for the current learner.
pub async fn get_stats(
    State(store): State<Arc<dyn LearnifyStore>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = store.fetch_learner_attempts(&claims.sub).await?;
    Ok(Json(quiz_stats(&attempts)))
}
