// src/handlers/simulations.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::{
        progress::{ContentRef, NewProgress},
        simulation::{AdvanceRequest, AdvanceResponse, SimulationRequest, SimulationSummary},
    },
    services::{
        completion,
        simulation::{RunEvent, SimulationRun},
    },
    store::Store,
    utils::jwt::Claims,
};

/// Lists simulations (without steps).
pub async fn list_simulations(
    State(store): State<Arc<dyn Store>>,
) -> Result<impl IntoResponse, AppError> {
    let simulations = store.list_simulations().await?;
    let summaries: Vec<SimulationSummary> =
        simulations.iter().map(SimulationSummary::from).collect();
    Ok(Json(summaries))
}

/// Retrieves a simulation with all of its steps.
pub async fn get_simulation(
    State(store): State<Arc<dyn Store>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let simulation = store
        .get_simulation(id)
        .await?
        .ok_or(AppError::NotFound("Simulation not found".to_string()))?;
    Ok(Json(simulation))
}

/// Applies the learner's choice on the current step.
///
/// Non-terminal choices only return the next step. A terminal choice records
/// the outcome as progress (once per learner), syncs the assignment and
/// re-evaluates the level.
pub async fn advance(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(req): Json<AdvanceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let simulation = store
        .get_simulation(id)
        .await?
        .ok_or(AppError::NotFound("Simulation not found".to_string()))?;

    let mut run = SimulationRun::at(req.current_step);
    run.tick(req.elapsed_seconds);

    let response = match run.choose(&simulation.steps, req.option_index)? {
        RunEvent::Moved { to } => AdvanceResponse {
            next_step: Some(to),
            outcome: None,
            time_taken: run.elapsed(),
            score: None,
            status: None,
            level_up: None,
        },
        RunEvent::Finished {
            completion: finished,
            time_taken,
        } => {
            let recorded = completion::record_progress(
                store.as_ref(),
                NewProgress {
                    user_id,
                    content: ContentRef::simulation(simulation.id),
                    status: finished.status,
                    score: finished.score,
                    time_taken: i32::try_from(time_taken).unwrap_or(i32::MAX),
                },
            )
            .await?;

            tracing::info!(
                "User {} finished simulation {} with outcome '{}'",
                user_id,
                simulation.id,
                finished.outcome
            );

            AdvanceResponse {
                next_step: None,
                outcome: Some(finished.outcome),
                time_taken,
                score: Some(recorded.progress.score),
                status: Some(recorded.progress.status),
                level_up: recorded.level_up,
            }
        }
    };

    Ok(Json(response))
}

/// Creates a simulation after validating its step graph.
/// Admin only.
pub async fn create_simulation(
    State(store): State<Arc<dyn Store>>,
    Json(payload): Json<SimulationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let simulation = store
        .create_simulation(payload.into_new_simulation()?)
        .await?;
    tracing::info!(
        "Created simulation {} with {} steps",
        simulation.id,
        simulation.steps.len()
    );
    Ok((StatusCode::CREATED, Json(simulation)))
}

/// Replaces a simulation's title, description and steps.
/// Admin only.
pub async fn update_simulation(
    State(store): State<Arc<dyn Store>>,
    Path(id): Path<i64>,
    Json(payload): Json<SimulationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let simulation = store
        .update_simulation(id, payload.into_new_simulation()?)
        .await?
        .ok_or(AppError::NotFound("Simulation not found".to_string()))?;
    Ok(Json(simulation))
}

/// Deletes a simulation and the progress/assignments that reference it.
/// Admin only.
pub async fn delete_simulation(
    State(store): State<Arc<dyn Store>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !store.delete_simulation(id).await? {
        return Err(AppError::NotFound("Simulation not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
