// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use learnify::{
    config::Config,
    error::AppError,
    models::{
        attempt::{Attempt, NewAttempt, PointCorrection},
        leaderboard::LearnerAggregate,
        question::Question,
    },
    routes,
    services::scoring::apply_corrections,
    state::AppState,
    store::LearnifyStore,
    utils::jwt::sign_jwt,
};

pub const TEST_SECRET: &str = "test_secret_for_integration_tests";

#[derive(Default)]
struct Inner {
    questions: Vec<Question>,
    attempts: Vec<Attempt>,
    learners: Vec<LearnerAggregate>,
}

/// In-memory `LearnifyStore`. Quiz points on the leaderboard are summed from
/// the stored attempts, like the Postgres aggregate query does.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_history: AtomicBool,
}

impl MemoryStore {
    pub fn add_question(&self, id: i64, difficulty: i16, correct: &str) {
        self.inner.lock().unwrap().questions.push(Question {
            id,
            question_text: format!("Question {}", id),
            category: "basics".to_string(),
            difficulty_level: difficulty,
            option_a: "first".to_string(),
            option_b: "second".to_string(),
            option_c: "third".to_string(),
            option_d: "fourth".to_string(),
            correct_answer: correct.to_string(),
            explanation: Some(format!("Explanation {}", id)),
            is_active: true,
        });
    }

    pub fn deactivate_question(&self, id: i64) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(q) = inner.questions.iter_mut().find(|q| q.id == id) {
            q.is_active = false;
        }
    }

    pub fn add_learner(
        &self,
        learner_id: &str,
        display_name: &str,
        check_ins: i64,
        latest_check_in: Option<DateTime<Utc>>,
    ) {
        self.inner.lock().unwrap().learners.push(LearnerAggregate {
            learner_id: learner_id.to_string(),
            display_name: display_name.to_string(),
            check_in_count: check_ins,
            review_count: 0,
            submission_count: 0,
            quiz_points: 0,
            latest_check_in,
        });
    }

    /// Inserts an attempt as-is, bypassing grading.
    pub fn push_raw_attempt(&self, learner_id: &str, question_id: i64, is_correct: bool, points: i64) {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.attempts.len() as i64 + 1;
        inner.attempts.push(Attempt {
            id,
            learner_id: learner_id.to_string(),
            question_id,
            selected_answer: if is_correct { "A" } else { "B" }.to_string(),
            is_correct,
            points_earned: points,
            created_at: Utc::now(),
        });
    }

    pub fn fail_history(&self, fail: bool) {
        self.fail_history.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl LearnifyStore for MemoryStore {
    async fn fetch_active_questions(
        &self,
        difficulty: Option<i16>,
    ) -> Result<Vec<Question>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .questions
            .iter()
            .filter(|q| q.is_active)
            .filter(|q| difficulty.is_none_or(|d| q.difficulty_level == d))
            .cloned()
            .collect())
    }

    async fn fetch_question(&self, id: i64) -> Result<Option<Question>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.questions.iter().find(|q| q.id == id).cloned())
    }

    async fn fetch_learner_attempts(&self, learner_id: &str) -> Result<Vec<Attempt>, AppError> {
        if self.fail_history.load(Ordering::SeqCst) {
            return Err(AppError::InternalServerError(
                "attempt history unavailable".to_string(),
            ));
        }
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .attempts
            .iter()
            .filter(|a| a.learner_id == learner_id)
            .cloned()
            .collect())
    }

    async fn record_attempt(&self, attempt: NewAttempt) -> Result<Attempt, AppError> {
        let mut inner = self.inner.lock().unwrap();
        // Same rule as the partial unique index on quiz_attempts.
        let already_paid = inner.attempts.iter().any(|a| {
            a.learner_id == attempt.learner_id
                && a.question_id == attempt.question_id
                && a.points_earned > 0
        });
        let points_earned = if already_paid { 0 } else { attempt.points_earned };
        let stored = Attempt {
            id: inner.attempts.len() as i64 + 1,
            learner_id: attempt.learner_id,
            question_id: attempt.question_id,
            selected_answer: attempt.selected_answer,
            is_correct: attempt.is_correct,
            points_earned,
            created_at: Utc::now(),
        };
        inner.attempts.push(stored.clone());
        Ok(stored)
    }

    async fn fetch_all_attempts(&self) -> Result<Vec<Attempt>, AppError> {
        Ok(self.inner.lock().unwrap().attempts.clone())
    }

    async fn apply_point_corrections(
        &self,
        corrections: &[PointCorrection],
    ) -> Result<u64, AppError> {
        let mut inner = self.inner.lock().unwrap();
        Ok(apply_corrections(&mut inner.attempts, corrections))
    }

    async fn fetch_leaderboard_aggregates(&self) -> Result<Vec<LearnerAggregate>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .learners
            .iter()
            .map(|l| {
                let quiz_points = inner
                    .attempts
                    .iter()
                    .filter(|a| a.learner_id == l.learner_id)
                    .map(|a| a.points_earned)
                    .sum();
                LearnerAggregate {
                    quiz_points,
                    ..l.clone()
                }
            })
            .collect())
    }
}

/// Spawns the app on a random port backed by `store`.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
pub async fn spawn_app(store: Arc<MemoryStore>) -> String {
    let config = Config {
        database_url: "postgres://unused".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        rust_log: "error".to_string(),
        port: 0,
    };

    let state = AppState { store, config };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

pub fn token_for(learner_id: &str, role: &str) -> String {
    sign_jwt(learner_id, role, TEST_SECRET, 600).expect("Failed to sign test token")
}

pub fn unique_learner() -> String {
    format!("l_{}", &uuid::Uuid::new_v4().to_string()[..8])
}
