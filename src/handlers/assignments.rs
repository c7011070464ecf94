// src/handlers/assignments.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::assignment::{AssigneeRef, AssignmentListParams, AssignmentRequest, AssignmentStatus},
    store::Store,
    utils::jwt::Claims,
};

/// Assigns content to a user, or re-issues an existing assignment.
///
/// * The user is looked up by id or by username (exactly one must be given).
/// * The content must exist.
/// * The status starts as `done` when the user already completed the content.
///
/// Admin only.
pub async fn upsert_assignment(
    State(store): State<Arc<dyn Store>>,
    Json(req): Json<AssignmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = match req.assignee()? {
        AssigneeRef::Id(id) => store.find_user_by_id(id).await?,
        AssigneeRef::Username(name) => store.find_user_by_username(&name).await?,
    }
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    let content = req.content();
    if !store.content_exists(content).await? {
        return Err(AppError::NotFound(format!("{} not found", content)));
    }

    let status = if store.find_completed_progress(user.id, content).await?.is_some() {
        AssignmentStatus::Done
    } else {
        AssignmentStatus::Pending
    };

    let assignment = store.upsert_assignment(user.id, content, status).await?;

    tracing::info!(
        "Assigned {} to user {} ({})",
        content,
        user.username,
        assignment.status.as_str()
    );

    Ok((StatusCode::CREATED, Json(assignment)))
}

/// Lists assignments, optionally for one user.
/// Admin only.
pub async fn list_assignments(
    State(store): State<Arc<dyn Store>>,
    Query(params): Query<AssignmentListParams>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(store.list_assignments(params.user_id).await?))
}

/// Removes an assignment.
/// Admin only.
pub async fn delete_assignment(
    State(store): State<Arc<dyn Store>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !store.delete_assignment(id).await? {
        return Err(AppError::NotFound("Assignment not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Assignments of the current user.
pub async fn list_my_assignments(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    Ok(Json(store.list_assignments(Some(user_id)).await?))
}
