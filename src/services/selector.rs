// src/services/selector.rs

//! Adaptive quiz batch selection.
//!
//! A learner's history splits the pool into three buckets:
//!
//! * priority: answered wrong at least once and not among the recent correct answers
//! * new: never attempted
//! * reinforcement: among the most recent correct answers
//!
//! Smart batches take roughly 60% priority, 30% new and fill the rest with
//! reinforcement, then top up from whatever is left in the pool.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    config::{DEFAULT_QUESTION_COUNT, MAX_QUESTION_COUNT, RECENT_CORRECT_WINDOW},
    models::{
        attempt::Attempt,
        question::{PublicQuestion, Question},
    },
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuizError {
    #[error("No questions found")]
    NoQuestionsFound,
    #[error("No previously missed questions to review")]
    NoWrongQuestions,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    #[default]
    Smart,
    Random,
    WrongOnly,
}

impl SelectionMode {
    /// Unknown or missing modes fall back to `Smart`.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(|m| m.trim().to_ascii_lowercase()).as_deref() {
            Some("random") => SelectionMode::Random,
            Some("wrong_only") => SelectionMode::WrongOnly,
            _ => SelectionMode::Smart,
        }
    }
}

/// Clamps a requested batch size into `[1, MAX_QUESTION_COUNT]`.
pub fn clamp_count(raw: Option<i64>) -> usize {
    match raw {
        None => DEFAULT_QUESTION_COUNT,
        Some(n) => n.clamp(1, MAX_QUESTION_COUNT as i64) as usize,
    }
}

/// What the selector needs to know about a learner's past attempts.
#[derive(Debug, Clone, Default)]
pub struct LearnerHistory {
    wrong: HashSet<i64>,
    recently_correct: HashSet<i64>,
    attempted: HashSet<i64>,
}

impl LearnerHistory {
    pub fn from_attempts(attempts: &[Attempt]) -> Self {
        let mut correct: Vec<&Attempt> = attempts.iter().filter(|a| a.is_correct).collect();
        correct.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Self {
            wrong: attempts
                .iter()
                .filter(|a| !a.is_correct)
                .map(|a| a.question_id)
                .collect(),
            recently_correct: correct
                .iter()
                .take(RECENT_CORRECT_WINDOW)
                .map(|a| a.question_id)
                .collect(),
            attempted: attempts.iter().map(|a| a.question_id).collect(),
        }
    }

    /// Missed at some point and not mastered recently.
    pub fn is_priority(&self, question_id: i64) -> bool {
        self.wrong.contains(&question_id) && !self.recently_correct.contains(&question_id)
    }

    pub fn has_attempted(&self, question_id: i64) -> bool {
        self.attempted.contains(&question_id)
    }

    pub fn is_recently_correct(&self, question_id: i64) -> bool {
        self.recently_correct.contains(&question_id)
    }

    pub fn priority_len(&self) -> usize {
        self.wrong
            .iter()
            .filter(|id| !self.recently_correct.contains(id))
            .count()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Selection {
    pub questions: Vec<PublicQuestion>,
    pub selection_method: SelectionMode,
    pub priority_count: usize,
}

/// Picks a batch of distinct questions from `pool`.
///
/// Without a history every mode degrades to `Random`. The returned questions
/// never carry the answer key or the explanation.
pub fn select_questions<R: Rng + ?Sized>(
    pool: &[Question],
    count: usize,
    mode: SelectionMode,
    history: Option<&LearnerHistory>,
    rng: &mut R,
) -> Result<Selection, QuizError> {
    if pool.is_empty() {
        return Err(QuizError::NoQuestionsFound);
    }

    let count = count.clamp(1, MAX_QUESTION_COUNT);

    // Fix a deterministic starting order so a seeded rng gives a reproducible batch.
    let mut sorted: Vec<&Question> = pool.iter().collect();
    sorted.sort_by_key(|q| q.id);
    sorted.dedup_by_key(|q| q.id);

    let (batch, method, priority_count) = match (mode, history) {
        (SelectionMode::WrongOnly, Some(history)) => {
            let candidates: Vec<&Question> = sorted
                .into_iter()
                .filter(|q| history.is_priority(q.id))
                .collect();
            if candidates.is_empty() {
                return Err(QuizError::NoWrongQuestions);
            }
            let batch = draw(candidates, count, rng);
            let picked = batch.len();
            (batch, SelectionMode::WrongOnly, picked)
        }
        (SelectionMode::Smart, Some(history)) => {
            let (batch, priority_count) = smart_batch(sorted, count, history, rng);
            (batch, SelectionMode::Smart, priority_count)
        }
        _ => (draw(sorted, count, rng), SelectionMode::Random, 0),
    };

    Ok(Selection {
        questions: batch.into_iter().map(PublicQuestion::from).collect(),
        selection_method: method,
        priority_count,
    })
}

fn smart_batch<'a, R: Rng + ?Sized>(
    sorted: Vec<&'a Question>,
    count: usize,
    history: &LearnerHistory,
    rng: &mut R,
) -> (Vec<&'a Question>, usize) {
    let mut priority = Vec::new();
    let mut fresh = Vec::new();
    let mut reinforcement = Vec::new();

    for q in &sorted {
        if history.is_priority(q.id) {
            priority.push(*q);
        } else if !history.has_attempted(q.id) {
            fresh.push(*q);
        } else if history.is_recently_correct(q.id) {
            reinforcement.push(*q);
        }
    }

    // ceil(0.6 * count) and ceil(0.3 * count), never more than what is still open.
    let priority_quota = (count * 3).div_ceil(5).min(count);
    let mut batch = draw(priority, priority_quota, rng);
    let priority_count = batch.len();

    let fresh_quota = (count * 3).div_ceil(10).min(count - batch.len());
    batch.extend(draw(fresh, fresh_quota, rng));

    let reinforcement_quota = count - batch.len();
    batch.extend(draw(reinforcement, reinforcement_quota, rng));

    if batch.len() < count {
        let chosen: HashSet<i64> = batch.iter().map(|q| q.id).collect();
        let leftovers: Vec<&Question> = sorted
            .into_iter()
            .filter(|q| !chosen.contains(&q.id))
            .collect();
        let missing = count - batch.len();
        tracing::debug!(missing, available = leftovers.len(), "Topping up smart batch");
        batch.extend(draw(leftovers, missing, rng));
    }

    batch.shuffle(rng);
    (batch, priority_count)
}

/// Sample without replacement: shuffle the bucket, keep the first `n`.
fn draw<'a, R: Rng + ?Sized>(
    mut bucket: Vec<&'a Question>,
    n: usize,
    rng: &mut R,
) -> Vec<&'a Question> {
    bucket.shuffle(rng);
    bucket.truncate(n);
    bucket
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rand::{SeedableRng, rngs::StdRng};

    fn question(id: i64) -> Question {
        Question {
            id,
            question_text: format!("Question {}", id),
            category: "general".to_string(),
            difficulty_level: ((id % 3) + 1) as i16,
            option_a: "a".to_string(),
            option_b: "b".to_string(),
            option_c: "c".to_string(),
            option_d: "d".to_string(),
            correct_answer: "A".to_string(),
            explanation: Some("because".to_string()),
            is_active: true,
        }
    }

    fn pool(n: i64) -> Vec<Question> {
        (1..=n).map(question).collect()
    }

    fn attempt(id: i64, question_id: i64, is_correct: bool, minutes: i64) -> Attempt {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();
        Attempt {
            id,
            learner_id: "learner-1".to_string(),
            question_id,
            selected_answer: if is_correct { "A" } else { "B" }.to_string(),
            is_correct,
            points_earned: 0,
            created_at: base + Duration::minutes(minutes),
        }
    }

    fn ids(selection: &Selection) -> Vec<i64> {
        selection.questions.iter().map(|q| q.id).collect()
    }

    #[test]
    fn random_mode_returns_requested_count_without_duplicates() {
        let mut rng = StdRng::seed_from_u64(7);
        let questions = pool(12);

        for count in 1..=MAX_QUESTION_COUNT {
            let selection =
                select_questions(&questions, count, SelectionMode::Random, None, &mut rng).unwrap();
            let picked = ids(&selection);
            let unique: HashSet<i64> = picked.iter().copied().collect();

            assert_eq!(picked.len(), count.min(questions.len()));
            assert_eq!(unique.len(), picked.len());
            assert_eq!(selection.priority_count, 0);
        }
    }

    #[test]
    fn answers_never_leak() {
        let mut rng = StdRng::seed_from_u64(1);
        let selection =
            select_questions(&pool(5), 5, SelectionMode::Smart, None, &mut rng).unwrap();
        let json = serde_json::to_value(&selection).unwrap();

        for q in json["questions"].as_array().unwrap() {
            assert!(q.get("correct_answer").is_none());
            assert!(q.get("explanation").is_none());
        }
    }

    #[test]
    fn empty_pool_is_an_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = select_questions(&[], 5, SelectionMode::Random, None, &mut rng).unwrap_err();
        assert_eq!(err, QuizError::NoQuestionsFound);
    }

    #[test]
    fn missing_history_degrades_to_random() {
        let mut rng = StdRng::seed_from_u64(3);
        let selection =
            select_questions(&pool(10), 4, SelectionMode::WrongOnly, None, &mut rng).unwrap();
        assert_eq!(selection.selection_method, SelectionMode::Random);
        assert_eq!(selection.questions.len(), 4);
    }

    #[test]
    fn wrong_only_without_misses_fails() {
        let mut rng = StdRng::seed_from_u64(3);
        let history = LearnerHistory::from_attempts(&[attempt(1, 1, true, 0)]);
        let err = select_questions(
            &pool(10),
            5,
            SelectionMode::WrongOnly,
            Some(&history),
            &mut rng,
        )
        .unwrap_err();
        assert_eq!(err, QuizError::NoWrongQuestions);
    }

    #[test]
    fn wrong_only_picks_from_missed_questions() {
        let mut rng = StdRng::seed_from_u64(11);
        let history = LearnerHistory::from_attempts(&[
            attempt(1, 2, false, 0),
            attempt(2, 4, false, 1),
            attempt(3, 6, false, 2),
            // Missed then mastered recently: no longer a priority.
            attempt(4, 8, false, 3),
            attempt(5, 8, true, 4),
        ]);

        let selection = select_questions(
            &pool(10),
            10,
            SelectionMode::WrongOnly,
            Some(&history),
            &mut rng,
        )
        .unwrap();

        let mut picked = ids(&selection);
        picked.sort();
        assert_eq!(picked, vec![2, 4, 6]);
        assert_eq!(selection.priority_count, 3);
        assert_eq!(selection.selection_method, SelectionMode::WrongOnly);
    }

    #[test]
    fn smart_mode_fills_buckets_in_proportion() {
        // 20 questions: 1-3 missed, 4-5 never seen, 6-20 answered correctly.
        let mut attempts = vec![
            attempt(1, 1, false, 0),
            attempt(2, 2, false, 1),
            attempt(3, 3, false, 2),
        ];
        for (i, qid) in (6..=20).enumerate() {
            attempts.push(attempt(10 + i as i64, qid, true, 10 + i as i64));
        }
        let history = LearnerHistory::from_attempts(&attempts);

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let selection =
                select_questions(&pool(20), 5, SelectionMode::Smart, Some(&history), &mut rng)
                    .unwrap();

            let mut picked = ids(&selection);
            picked.sort();
            assert_eq!(picked, vec![1, 2, 3, 4, 5]);
            assert_eq!(selection.priority_count, 3);
            assert_eq!(selection.selection_method, SelectionMode::Smart);
        }
    }

    #[test]
    fn smart_mode_tops_up_when_buckets_run_dry() {
        // One missed question, everything else answered correctly. Only 11..=20
        // fall in the recent window, so 2..=10 are reachable through the top-up alone.
        let mut attempts = vec![attempt(1, 1, false, 0)];
        for (i, qid) in (2..=20).enumerate() {
            attempts.push(attempt(10 + i as i64, qid, true, 10 + i as i64));
        }
        let history = LearnerHistory::from_attempts(&attempts);

        let mut rng = StdRng::seed_from_u64(5);
        let selection =
            select_questions(&pool(20), 15, SelectionMode::Smart, Some(&history), &mut rng)
                .unwrap();
        let picked = ids(&selection);
        let unique: HashSet<i64> = picked.iter().copied().collect();

        assert_eq!(picked.len(), 15);
        assert_eq!(unique.len(), 15);
        assert!(unique.contains(&1));
        assert_eq!(selection.priority_count, 1);
    }

    #[test]
    fn smart_mode_handles_small_counts() {
        let history = LearnerHistory::from_attempts(&[attempt(1, 1, false, 0)]);
        let mut rng = StdRng::seed_from_u64(9);
        let selection =
            select_questions(&pool(4), 1, SelectionMode::Smart, Some(&history), &mut rng).unwrap();

        assert_eq!(ids(&selection), vec![1]);
    }

    #[test]
    fn same_seed_same_batch() {
        let history = LearnerHistory::from_attempts(&[attempt(1, 3, false, 0)]);
        let questions = pool(20);

        let first = select_questions(
            &questions,
            8,
            SelectionMode::Smart,
            Some(&history),
            &mut StdRng::seed_from_u64(42),
        )
        .unwrap();
        let second = select_questions(
            &questions,
            8,
            SelectionMode::Smart,
            Some(&history),
            &mut StdRng::seed_from_u64(42),
        )
        .unwrap();

        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn recent_window_only_counts_latest_correct_attempts() {
        let attempts: Vec<Attempt> = (1..=12).map(|q| attempt(q, q, true, q)).collect();
        let history = LearnerHistory::from_attempts(&attempts);

        assert!(!history.is_recently_correct(1));
        assert!(!history.is_recently_correct(2));
        assert!(history.is_recently_correct(3));
        assert!(history.is_recently_correct(12));
    }

    #[test]
    fn count_is_clamped() {
        assert_eq!(clamp_count(None), DEFAULT_QUESTION_COUNT);
        assert_eq!(clamp_count(Some(0)), 1);
        assert_eq!(clamp_count(Some(-4)), 1);
        assert_eq!(clamp_count(Some(500)), MAX_QUESTION_COUNT);
    }

    #[test]
    fn mode_parsing_is_lenient() {
        assert_eq!(SelectionMode::parse_lenient(None), SelectionMode::Smart);
        assert_eq!(SelectionMode::parse_lenient(Some("RANDOM")), SelectionMode::Random);
        assert_eq!(
            SelectionMode::parse_lenient(Some("wrong_only")),
            SelectionMode::WrongOnly
        );
        assert_eq!(SelectionMode::parse_lenient(Some("bogus")), SelectionMode::Smart);
    }
}
