// src/models/quiz_result.rs

use std::collections::HashMap;

use serde::Serialize;

use crate::models::progress::ProgressStatus;
use crate::services::leveling::LevelUp;

/// Represents the 'quiz_results' table. Append-only log of attempts.
#[derive(Debug, Clone, Serialize)]
pub struct QuizResult {
    pub id: i64,
    pub quiz_id: i64,
    /// `None` for anonymous attempts on public quizzes.
    pub user_id: Option<i64>,
    pub score: i32,
    pub answers: HashMap<i64, String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewQuizResult {
    pub quiz_id: i64,
    pub user_id: Option<i64>,
    pub score: i32,
    pub answers: HashMap<i64, String>,
}

/// Response body of a quiz submission.
#[derive(Debug, Serialize)]
pub struct QuizSubmissionResponse {
    pub result_id: i64,
    pub total_score: i32,
    pub correct_count: usize,
    pub total_questions: usize,
    pub passed: bool,
    pub feedback: Vec<String>,
    /// Progress status written for this attempt, if any.
    pub status: Option<ProgressStatus>,
    /// True when the quiz had already been completed; the attempt is logged only.
    pub already_completed: bool,
    pub level_up: Option<LevelUp>,
}
