// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Default number of questions handed out when the client does not ask for a size.
pub const DEFAULT_QUESTION_COUNT: usize = 10;

/// Upper bound for a single quiz batch.
pub const MAX_QUESTION_COUNT: usize = 20;

/// Points awarded for the first correct answer to a question.
pub const POINTS_PER_CORRECT: i64 = 5;

/// Flat bonus for having at least one check-in, review or submission.
pub const ACTIVITY_BONUS: i64 = 10;

/// How many of the most recent correct attempts count as "recently mastered".
pub const RECENT_CORRECT_WINDOW: usize = 10;

pub const DEFAULT_LEADERBOARD_LIMIT: usize = 50;
pub const MAX_LEADERBOARD_LIMIT: usize = 100;

pub const DEFAULT_CONTEXT_SIZE: usize = 5;
pub const MAX_CONTEXT_SIZE: usize = 25;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub rust_log: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        Self {
            database_url,
            jwt_secret,
            rust_log,
            port,
        }
    }
}
