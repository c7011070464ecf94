// src/models/assignment.rs

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    models::progress::{ContentKind, ContentRef},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Pending,
    Done,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Pending => "pending",
            AssignmentStatus::Done => "done",
        }
    }
}

impl FromStr for AssignmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AssignmentStatus::Pending),
            "done" => Ok(AssignmentStatus::Done),
            other => Err(format!("unknown assignment status '{}'", other)),
        }
    }
}

/// Represents the 'assignments' table.
/// Unique per (user_id, content_type, content_id).
#[derive(Debug, Clone, Serialize)]
pub struct Assignment {
    pub id: i64,
    pub user_id: i64,
    pub content_type: ContentKind,
    pub content_id: i64,
    pub status: AssignmentStatus,
    pub assigned_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Assignment {
    pub fn content(&self) -> ContentRef {
        ContentRef {
            kind: self.content_type,
            id: self.content_id,
        }
    }
}

/// Who the assignment is for. Exactly one of the two forms is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssigneeRef {
    Id(i64),
    Username(String),
}

/// DTO for creating (or re-issuing) an assignment.
#[derive(Debug, Deserialize)]
pub struct AssignmentRequest {
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub content_id: i64,
    pub content_type: ContentKind,
}

impl AssignmentRequest {
    pub fn assignee(&self) -> Result<AssigneeRef, AppError> {
        match (&self.user_id, &self.username) {
            (Some(id), None) => Ok(AssigneeRef::Id(*id)),
            (None, Some(name)) if !name.trim().is_empty() => {
                Ok(AssigneeRef::Username(name.trim().to_string()))
            }
            (Some(_), Some(_)) => Err(AppError::BadRequest(
                "Supply either user_id or username, not both".to_string(),
            )),
            _ => Err(AppError::BadRequest(
                "Either user_id or username is required".to_string(),
            )),
        }
    }

    pub fn content(&self) -> ContentRef {
        ContentRef {
            kind: self.content_type,
            id: self.content_id,
        }
    }
}

/// Query parameters for the admin assignment listing.
#[derive(Debug, Deserialize)]
pub struct AssignmentListParams {
    pub user_id: Option<i64>,
}
