// src/services/ranking.rs

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    config::ACTIVITY_BONUS,
    models::leaderboard::{LeaderboardEntry, LearnerAggregate},
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LeaderboardError {
    #[error("Student not found on the leaderboard")]
    StudentNotFound,
}

/// A learner's entry together with its neighbours in the ranking.
#[derive(Debug, Serialize, Deserialize)]
pub struct LeaderboardContext {
    pub entry: LeaderboardEntry,
    pub window: Vec<LeaderboardEntry>,
}

/// 10 points per activity kind the learner has touched at least once, plus quiz points.
pub fn score(aggregate: &LearnerAggregate) -> i64 {
    let bonus = |count: i64| if count > 0 { ACTIVITY_BONUS } else { 0 };

    bonus(aggregate.check_in_count)
        + bonus(aggregate.review_count)
        + bonus(aggregate.submission_count)
        + aggregate.quiz_points
}

/// Score desc, check-ins desc, latest check-in desc (present before absent),
/// display name asc. The learner id settles two learners sharing a name.
fn compare(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.check_in_count.cmp(&a.check_in_count))
        .then_with(|| match (&a.latest_check_in, &b.latest_check_in) {
            (Some(x), Some(y)) => y.cmp(x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.display_name.cmp(&b.display_name))
        .then_with(|| a.learner_id.cmp(&b.learner_id))
}

/// Scores and sorts every learner, then assigns positional 1-based ranks.
pub fn rank_leaderboard(aggregates: &[LearnerAggregate]) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = aggregates
        .iter()
        .map(|a| LeaderboardEntry {
            learner_id: a.learner_id.clone(),
            display_name: a.display_name.clone(),
            score: score(a),
            check_in_count: a.check_in_count,
            latest_check_in: a.latest_check_in,
            rank: 0,
        })
        .collect();

    entries.sort_by(compare);

    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = i + 1;
    }

    entries
}

/// Slices an already ranked list. Ranks are carried over untouched.
pub fn paginate(ranked: &[LeaderboardEntry], limit: usize, offset: usize) -> Vec<LeaderboardEntry> {
    ranked.iter().skip(offset).take(limit).cloned().collect()
}

pub fn find_leaderboard_context(
    ranked: &[LeaderboardEntry],
    learner_id: &str,
    context_size: usize,
) -> Result<LeaderboardContext, LeaderboardError> {
    let position = ranked
        .iter()
        .position(|e| e.learner_id == learner_id)
        .ok_or(LeaderboardError::StudentNotFound)?;

    let start = position.saturating_sub(context_size);
    let end = (position + context_size + 1).min(ranked.len());

    Ok(LeaderboardContext {
        entry: ranked[position].clone(),
        window: ranked[start..end].to_vec(),
    })
}
