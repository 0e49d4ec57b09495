// src/services/scoring.rs

//! First-correct-only quiz scoring.
//!
//! Only the earliest correct attempt per (learner, question) earns points.
//! `reconcile_points` recomputes that from the whole attempt log, so running it
//! again on corrected data changes nothing.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::{
    config::POINTS_PER_CORRECT,
    models::attempt::{Attempt, PointCorrection, QuizStats},
    services::selector::LearnerHistory,
};

#[derive(Debug, Default, Serialize)]
pub struct Reconciliation {
    pub scanned: usize,
    pub corrections: Vec<PointCorrection>,
    /// Recomputed quiz points per learner.
    pub totals: BTreeMap<String, i64>,
}

/// Points a freshly graded attempt should earn given the learner's prior attempts.
pub fn points_for(is_correct: bool, question_id: i64, prior: &[Attempt]) -> i64 {
    let already_solved = prior
        .iter()
        .any(|a| a.question_id == question_id && a.is_correct);

    if is_correct && !already_solved {
        POINTS_PER_CORRECT
    } else {
        0
    }
}

pub fn reconcile_points(attempts: &[Attempt]) -> Reconciliation {
    let mut ordered: Vec<&Attempt> = attempts.iter().collect();
    ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    let mut solved: HashSet<(&str, i64)> = HashSet::new();
    let mut totals: BTreeMap<String, i64> = BTreeMap::new();
    let mut corrections = Vec::new();

    for attempt in ordered {
        let first_correct =
            attempt.is_correct && solved.insert((attempt.learner_id.as_str(), attempt.question_id));
        let expected = if first_correct { POINTS_PER_CORRECT } else { 0 };

        *totals.entry(attempt.learner_id.clone()).or_insert(0) += expected;

        if attempt.points_earned != expected {
            corrections.push(PointCorrection {
                attempt_id: attempt.id,
                old_points: attempt.points_earned,
                new_points: expected,
            });
        }
    }

    corrections.sort_by_key(|c| c.attempt_id);

    Reconciliation {
        scanned: attempts.len(),
        corrections,
        totals,
    }
}

/// Summary of one learner's attempts.
pub fn quiz_stats(attempts: &[Attempt]) -> QuizStats {
    let correct_attempts = attempts.iter().filter(|a| a.is_correct).count();
    let solved: HashSet<i64> = attempts
        .iter()
        .filter(|a| a.is_correct)
        .map(|a| a.question_id)
        .collect();
    let history = LearnerHistory::from_attempts(attempts);

    let accuracy = if attempts.is_empty() {
        0.0
    } else {
        let pct = correct_attempts as f64 / attempts.len() as f64 * 100.0;
        (pct * 10.0).round() / 10.0
    };

    QuizStats {
        total_attempts: attempts.len(),
        correct_attempts,
        questions_solved: solved.len(),
        questions_missed: history.priority_len(),
        quiz_points: solved.len() as i64 * POINTS_PER_CORRECT,
        accuracy,
    }
}

/// Applies corrections to an in-memory attempt list, returning how many rows changed.
pub fn apply_corrections(attempts: &mut [Attempt], corrections: &[PointCorrection]) -> u64 {
    let by_id: HashMap<i64, i64> = corrections
        .iter()
        .map(|c| (c.attempt_id, c.new_points))
        .collect();

    let mut changed = 0;
    for attempt in attempts.iter_mut() {
        if let Some(&points) = by_id.get(&attempt.id) {
            if attempt.points_earned != points {
                attempt.points_earned = points;
                changed += 1;
            }
        }
    }
    changed
}
