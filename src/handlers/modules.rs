// src/handlers/modules.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    config::FULL_SCORE,
    error::AppError,
    models::{
        module::ModuleRequest,
        progress::{ContentRef, NewProgress, ProgressStatus},
    },
    services::completion,
    store::Store,
    utils::{html::clean_html, jwt::Claims},
};

/// Lists all modules.
pub async fn list_modules(
    State(store): State<Arc<dyn Store>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(store.list_modules().await?))
}

/// Retrieves a single module by ID.
pub async fn get_module(
    State(store): State<Arc<dyn Store>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let module = store
        .get_module(id)
        .await?
        .ok_or(AppError::NotFound("Module not found".to_string()))?;
    Ok(Json(module))
}

/// Marks a module as read.
///
/// One-shot: a second call for the same module returns 409.
pub async fn complete_module(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    if store.get_module(id).await?.is_none() {
        return Err(AppError::NotFound("Module not found".to_string()));
    }

    let recorded = completion::record_progress(
        store.as_ref(),
        NewProgress {
            user_id,
            content: ContentRef::module(id),
            status: ProgressStatus::Completed,
            score: FULL_SCORE,
            time_taken: 0,
        },
    )
    .await?;

    Ok(Json(json!({
        "status": recorded.progress.status,
        "score": recorded.progress.score,
        "level_up": recorded.level_up,
    })))
}

fn sanitized(mut payload: ModuleRequest) -> Result<ModuleRequest, AppError> {
    payload.validate()?;
    payload.title = payload.title.trim().to_string();
    payload.content = clean_html(&payload.content);
    if payload.title.is_empty() || payload.content.is_empty() {
        return Err(AppError::BadRequest(
            "Title and content cannot be empty".to_string(),
        ));
    }
    Ok(payload)
}

/// Creates a new module.
/// Admin only.
pub async fn create_module(
    State(store): State<Arc<dyn Store>>,
    Json(payload): Json<ModuleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let module = store.create_module(sanitized(payload)?).await?;
    tracing::info!("Created module {} '{}'", module.id, module.title);
    Ok((StatusCode::CREATED, Json(module)))
}

/// Replaces a module's title, content and image.
/// Admin only.
pub async fn update_module(
    State(store): State<Arc<dyn Store>>,
    Path(id): Path<i64>,
    Json(payload): Json<ModuleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let module = store
        .update_module(id, sanitized(payload)?)
        .await?
        .ok_or(AppError::NotFound("Module not found".to_string()))?;
    Ok(Json(module))
}

/// Deletes a module and the progress/assignments that reference it.
/// Admin only.
pub async fn delete_module(
    State(store): State<Arc<dyn Store>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !store.delete_module(id).await? {
        return Err(AppError::NotFound("Module not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
