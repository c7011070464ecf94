// src/handlers/admin.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{AdminCreateUserRequest, AdminUpdateUserRequest, NewUser, UserChanges},
    services::completion,
    store::Store,
    utils::{hash::hash_password, jwt::Claims},
};

/// Lists all users in the system.
/// Admin only.
pub async fn list_users(
    State(store): State<Arc<dyn Store>>,
) -> Result<impl IntoResponse, AppError> {
    let users = store.list_users().await?;
    Ok(Json(users))
}

/// Creates a new user with specific role.
/// Admin only.
pub async fn create_user(
    State(store): State<Arc<dyn Store>>,
    Json(payload): Json<AdminCreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let password_hash = hash_password(&payload.password)?;

    let user = store
        .create_user(NewUser {
            username: payload.username,
            email: payload.email.to_lowercase(),
            password_hash,
            role: payload.role,
        })
        .await?;

    tracing::info!("Admin created user {} with role {}", user.username, user.role);

    Ok((StatusCode::CREATED, Json(user)))
}

/// Updates user information. Fields are optional.
/// Admin only. The learner level is not editable here.
pub async fn update_user(
    State(store): State<Arc<dyn Store>>,
    Path(id): Path<i64>,
    Json(payload): Json<AdminUpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let password_hash = match &payload.password {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    let changes = UserChanges {
        username: payload.username,
        email: payload.email.map(|e| e.to_lowercase()),
        role: payload.role,
        password_hash,
    };

    let user = store
        .update_user(id, changes)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Deletes a user by ID.
/// Admin only. Prevents deleting self.
pub async fn delete_user(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if id == claims.user_id()? {
        return Err(AppError::BadRequest("Cannot delete yourself".to_string()));
    }

    if !store.delete_user(id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    tracing::info!("Admin deleted user {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Progress overview of any user.
/// Admin only.
pub async fn user_progress(
    State(store): State<Arc<dyn Store>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = store
        .find_user_by_id(id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let overview = completion::overview(store.as_ref(), &user).await?;
    Ok(Json(overview))
}
