// src/handlers/progress.rs

use std::sync::Arc;

use axum::{Extension, Json, extract::State, response::IntoResponse};

use crate::{
    error::AppError, models::progress::MyProgress, services::completion, store::Store,
    utils::jwt::Claims,
};

/// Progress overview of the current user.
///
/// Re-runs the leveling rule first, so a learner who already meets the
/// targets is promoted here at the latest.
pub async fn get_my_progress(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let level_up = completion::apply_leveling(store.as_ref(), user_id).await?;

    let user = store
        .find_user_by_id(user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;
    let overview = completion::overview(store.as_ref(), &user).await?;

    Ok(Json(MyProgress { overview, level_up }))
}
