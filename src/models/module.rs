// src/models/module.rs

use serde::{Deserialize, Serialize};
use url::Url;
use validator::Validate;

/// Represents the 'modules' table in the database.
/// A static unit of learning content.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Module {
    pub id: i64,

    pub title: String,

    /// Sanitized HTML body.
    pub content: String,

    /// Public URL of the illustration, hosted elsewhere.
    pub image_url: Option<String>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating or replacing a module.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ModuleRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 50000))]
    pub content: String,
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub image_url: Option<String>,
}

/// Validates that a string is a correctly formatted URL.
fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}
