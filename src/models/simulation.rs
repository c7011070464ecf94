// src/models/simulation.rs

use serde::{Deserialize, Serialize};

use crate::models::progress::ProgressStatus;
use crate::services::leveling::LevelUp;

/// One node of a branching scenario.
///
/// `options`, `next_step` and (when present) `outcomes` are parallel lists:
/// choosing `options[i]` moves to `next_step[i]`, or ends the run with
/// `outcomes[i]` when that entry is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub scenario: String,
    pub options: Vec<String>,
    pub next_step: Vec<Option<usize>>,
    #[serde(default)]
    pub outcomes: Vec<Option<String>>,
}

/// Represents the 'simulations' table. Steps are stored as a JSON array.
#[derive(Debug, Clone, Serialize)]
pub struct Simulation {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub steps: Vec<Step>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Listing entry.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationSummary {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub step_count: usize,
}

impl From<&Simulation> for SimulationSummary {
    fn from(sim: &Simulation) -> Self {
        Self {
            id: sim.id,
            title: sim.title.clone(),
            description: sim.description.clone(),
            step_count: sim.steps.len(),
        }
    }
}

/// DTO for creating or replacing a simulation.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationRequest {
    pub title: String,
    pub description: Option<String>,
    pub steps: Vec<Step>,
}

/// Validated simulation ready for insertion.
#[derive(Debug, Clone)]
pub struct NewSimulation {
    pub title: String,
    pub description: Option<String>,
    pub steps: Vec<Step>,
}

/// DTO for choosing an option on the current step.
///
/// The engine is stateless between calls: the client reports which step it
/// is on and how long it spent there, and neither value is checked against
/// earlier calls. A client can therefore jump straight to any step index;
/// only the choice on that step is validated.
#[derive(Debug, Deserialize)]
pub struct AdvanceRequest {
    pub current_step: usize,
    pub option_index: usize,
    /// Seconds spent on the current step, as measured by the client.
    #[serde(default)]
    pub elapsed_seconds: u32,
}

/// Result of one advance call.
#[derive(Debug, Serialize)]
pub struct AdvanceResponse {
    pub next_step: Option<usize>,
    pub outcome: Option<String>,
    /// Per-step counter after the transition. Reset to 0 when moving on.
    pub time_taken: u32,
    pub score: Option<i32>,
    pub status: Option<ProgressStatus>,
    pub level_up: Option<LevelUp>,
}
