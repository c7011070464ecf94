// src/models/progress.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{models::user::Level, services::leveling::LevelUp};

/// The three kinds of content a learner can complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Module,
    Quiz,
    Simulation,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Module => "module",
            ContentKind::Quiz => "quiz",
            ContentKind::Simulation => "simulation",
        }
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "module" => Ok(ContentKind::Module),
            "quiz" => Ok(ContentKind::Quiz),
            "simulation" => Ok(ContentKind::Simulation),
            other => Err(format!("unknown content type '{}'", other)),
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Points at one piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentRef {
    pub kind: ContentKind,
    pub id: i64,
}

impl ContentRef {
    pub fn module(id: i64) -> Self {
        Self { kind: ContentKind::Module, id }
    }

    pub fn quiz(id: i64) -> Self {
        Self { kind: ContentKind::Quiz, id }
    }

    pub fn simulation(id: i64) -> Self {
        Self { kind: ContentKind::Simulation, id }
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.kind, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    NotStarted,
    Completed,
    Failed,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::NotStarted => "not_started",
            ProgressStatus::Completed => "completed",
            ProgressStatus::Failed => "failed",
        }
    }
}

impl FromStr for ProgressStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(ProgressStatus::NotStarted),
            "completed" => Ok(ProgressStatus::Completed),
            "failed" => Ok(ProgressStatus::Failed),
            other => Err(format!("unknown progress status '{}'", other)),
        }
    }
}

/// Represents the 'user_progress' table.
#[derive(Debug, Clone, Serialize)]
pub struct UserProgress {
    pub id: i64,
    pub user_id: i64,
    pub content_type: ContentKind,
    pub content_id: i64,
    pub status: ProgressStatus,
    pub score: i32,
    /// Seconds, informational only.
    pub time_taken: i32,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl UserProgress {
    pub fn content(&self) -> ContentRef {
        ContentRef {
            kind: self.content_type,
            id: self.content_id,
        }
    }
}

/// Insert payload for a progress record.
#[derive(Debug, Clone)]
pub struct NewProgress {
    pub user_id: i64,
    pub content: ContentRef,
    pub status: ProgressStatus,
    pub score: i32,
    pub time_taken: i32,
}

/// Number of distinct completed items per content kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CompletionCounts {
    pub simulations: i64,
    pub quizzes: i64,
    pub modules: i64,
}

/// Response body of the progress endpoints.
#[derive(Debug, Serialize)]
pub struct ProgressOverview {
    pub user_id: i64,
    pub username: String,
    pub level: Level,
    pub completed: CompletionCounts,
    pub percentage: f64,
    pub records: Vec<UserProgress>,
}

/// The learner's own view: the overview plus a promotion notice, if this
/// request produced one.
#[derive(Debug, Serialize)]
pub struct MyProgress {
    #[serde(flatten)]
    pub overview: ProgressOverview,
    pub level_up: Option<LevelUp>,
}
