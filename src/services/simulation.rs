// src/services/simulation.rs

//! Branching scenario engine.
//!
//! The engine only checks the step it is asked about. Cycles and unreachable
//! steps are allowed; authoring validation catches index and length errors
//! when a simulation is saved.

use crate::{
    config::FULL_SCORE,
    error::AppError,
    models::{
        progress::ProgressStatus,
        simulation::{NewSimulation, SimulationRequest, Step},
    },
    utils::html::clean_html,
};

pub const DEFAULT_OUTCOME: &str = "neutral";
pub const SUCCESS_OUTCOME: &str = "success";
const BREACH_MARKER: &str = "breach";

/// Where a choice leads. Exactly one of the fields is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next_step: Option<usize>,
    pub outcome: Option<String>,
}

/// Score and status derived from a terminal outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub outcome: String,
    pub score: i32,
    pub status: ProgressStatus,
}

/// Applies option `option_index` on step `current`.
pub fn advance(steps: &[Step], current: usize, option_index: usize) -> Result<Transition, AppError> {
    let step = steps.get(current).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Step {} does not exist (simulation has {} steps)",
            current,
            steps.len()
        ))
    })?;

    if option_index >= step.options.len() {
        return Err(AppError::BadRequest(format!(
            "Option {} is out of range for step {} ({} options)",
            option_index,
            current,
            step.options.len()
        )));
    }

    let target = step.next_step.get(option_index).ok_or_else(|| {
        AppError::InconsistentGraph(format!(
            "Step {} has no branch for option {}",
            current, option_index
        ))
    })?;

    match target {
        Some(next) if *next < steps.len() => Ok(Transition {
            next_step: Some(*next),
            outcome: None,
        }),
        Some(next) => Err(AppError::InconsistentGraph(format!(
            "Step {} option {} points to step {}, but only {} steps exist",
            current,
            option_index,
            next,
            steps.len()
        ))),
        None => {
            let outcome = step
                .outcomes
                .get(option_index)
                .cloned()
                .flatten()
                .filter(|o| !o.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_OUTCOME.to_string());
            Ok(Transition {
                next_step: None,
                outcome: Some(outcome),
            })
        }
    }
}

/// Maps a terminal outcome label to the recorded score and status.
pub fn evaluate_outcome(outcome: &str) -> Completion {
    let score = if outcome == SUCCESS_OUTCOME { FULL_SCORE } else { 0 };
    let status = if outcome.contains(BREACH_MARKER) {
        ProgressStatus::Failed
    } else {
        ProgressStatus::Completed
    };
    Completion {
        outcome: outcome.to_string(),
        score,
        status,
    }
}

/// What happened after a choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    Moved { to: usize },
    Finished { completion: Completion, time_taken: u32 },
}

/// A learner's position in a simulation plus the time spent on that step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationRun {
    current_step: usize,
    elapsed: u32,
}

impl SimulationRun {
    pub fn at(step: usize) -> Self {
        Self {
            current_step: step,
            elapsed: 0,
        }
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn tick(&mut self, seconds: u32) {
        self.elapsed = self.elapsed.saturating_add(seconds);
    }

    /// Picks an option. The step counter restarts on every move.
    pub fn choose(&mut self, steps: &[Step], option_index: usize) -> Result<RunEvent, AppError> {
        let transition = advance(steps, self.current_step, option_index)?;
        match (transition.next_step, transition.outcome) {
            (Some(next), _) => {
                self.current_step = next;
                self.elapsed = 0;
                Ok(RunEvent::Moved { to: next })
            }
            (None, outcome) => {
                let outcome = outcome.unwrap_or_else(|| DEFAULT_OUTCOME.to_string());
                Ok(RunEvent::Finished {
                    completion: evaluate_outcome(&outcome),
                    time_taken: self.elapsed,
                })
            }
        }
    }
}

/// Checks every step for local validity.
pub fn validate_steps(steps: &[Step]) -> Result<(), AppError> {
    if steps.is_empty() {
        return Err(AppError::BadRequest(
            "A simulation needs at least one step".to_string(),
        ));
    }

    for (index, step) in steps.iter().enumerate() {
        if step.scenario.trim().is_empty() {
            return Err(AppError::BadRequest(format!(
                "Step {}: scenario text is required",
                index
            )));
        }
        if step.options.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Step {}: at least one option is required",
                index
            )));
        }
        if step.options.iter().any(|o| o.trim().is_empty()) {
            return Err(AppError::BadRequest(format!(
                "Step {}: options cannot be blank",
                index
            )));
        }
        if step.next_step.len() != step.options.len() {
            return Err(AppError::BadRequest(format!(
                "Step {}: {} options but {} next-step entries",
                index,
                step.options.len(),
                step.next_step.len()
            )));
        }
        if !step.outcomes.is_empty() && step.outcomes.len() != step.options.len() {
            return Err(AppError::BadRequest(format!(
                "Step {}: {} options but {} outcome entries",
                index,
                step.options.len(),
                step.outcomes.len()
            )));
        }
        if let Some(bad) = step.next_step.iter().flatten().find(|n| **n >= steps.len()) {
            return Err(AppError::InconsistentGraph(format!(
                "Step {}: next step {} is out of range ({} steps)",
                index,
                bad,
                steps.len()
            )));
        }
    }
    Ok(())
}

impl SimulationRequest {
    /// Validates the step graph and sanitizes free text.
    pub fn into_new_simulation(self) -> Result<NewSimulation, AppError> {
        let title = self.title.trim().to_string();
        if title.is_empty() || title.len() > 200 {
            return Err(AppError::BadRequest(
                "Simulation title must be between 1 and 200 characters".to_string(),
            ));
        }
        validate_steps(&self.steps)?;

        let steps = self
            .steps
            .into_iter()
            .map(|step| Step {
                scenario: clean_html(&step.scenario),
                ..step
            })
            .collect();

        Ok(NewSimulation {
            title,
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Step 0: "click" goes on to step 1, "report" ends in success.
    /// Step 1: "enter password" ends in a breach, "close tab" has no outcome.
    fn phishing_steps() -> Vec<Step> {
        vec![
            Step {
                scenario: "An email asks you to verify your account.".to_string(),
                options: vec!["click".to_string(), "report".to_string()],
                next_step: vec![Some(1), None],
                outcomes: vec![None, Some("success".to_string())],
            },
            Step {
                scenario: "A login page opens.".to_string(),
                options: vec!["enter password".to_string(), "close tab".to_string()],
                next_step: vec![None, None],
                outcomes: vec![Some("data breach".to_string()), None],
            },
        ]
    }

    #[test]
    fn reporting_ends_in_success() {
        let steps = phishing_steps();
        let t = advance(&steps, 0, 1).unwrap();
        assert_eq!(t.next_step, None);
        assert_eq!(t.outcome.as_deref(), Some("success"));

        let c = evaluate_outcome(t.outcome.as_deref().unwrap());
        assert_eq!(c.score, 100);
        assert_eq!(c.status, ProgressStatus::Completed);
    }

    #[test]
    fn clicking_moves_to_next_step_and_resets_clock() {
        let steps = phishing_steps();
        let mut run = SimulationRun::at(0);
        run.tick(12);
        assert_eq!(run.elapsed(), 12);

        let event = run.choose(&steps, 0).unwrap();
        assert_eq!(event, RunEvent::Moved { to: 1 });
        assert_eq!(run.current_step(), 1);
        assert_eq!(run.elapsed(), 0);
    }

    #[test]
    fn breach_outcome_fails_with_zero_score() {
        let steps = phishing_steps();
        let mut run = SimulationRun::at(1);
        run.tick(30);
        match run.choose(&steps, 0).unwrap() {
            RunEvent::Finished {
                completion,
                time_taken,
            } => {
                assert_eq!(completion.outcome, "data breach");
                assert_eq!(completion.score, 0);
                assert_eq!(completion.status, ProgressStatus::Failed);
                assert_eq!(time_taken, 30);
            }
            other => panic!("expected a finished run, got {:?}", other),
        }
    }

    #[test]
    fn missing_outcome_defaults_to_neutral() {
        let steps = phishing_steps();
        let t = advance(&steps, 1, 1).unwrap();
        assert_eq!(t.outcome.as_deref(), Some(DEFAULT_OUTCOME));

        let c = evaluate_outcome(DEFAULT_OUTCOME);
        assert_eq!(c.score, 0);
        assert_eq!(c.status, ProgressStatus::Completed);
    }

    #[test]
    fn out_of_range_option_is_rejected() {
        let steps = phishing_steps();
        assert!(matches!(advance(&steps, 0, 2), Err(AppError::BadRequest(_))));
        assert!(matches!(advance(&steps, 5, 0), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn dangling_next_step_is_an_inconsistent_graph() {
        let mut steps = phishing_steps();
        steps[0].next_step[0] = Some(9);
        assert!(matches!(
            advance(&steps, 0, 0),
            Err(AppError::InconsistentGraph(_))
        ));
        assert!(matches!(
            validate_steps(&steps),
            Err(AppError::InconsistentGraph(_))
        ));
    }

    #[test]
    fn advance_never_leaves_the_step_range() {
        let steps = phishing_steps();
        for (current, step) in steps.iter().enumerate() {
            for option in 0..step.options.len() {
                let t = advance(&steps, current, option).unwrap();
                if let Some(next) = t.next_step {
                    assert!(next < steps.len());
                }
            }
        }
    }

    #[test]
    fn cycles_are_allowed() {
        let steps = vec![Step {
            scenario: "Loop".to_string(),
            options: vec!["again".to_string(), "stop".to_string()],
            next_step: vec![Some(0), None],
            outcomes: vec![],
        }];
        assert!(validate_steps(&steps).is_ok());
        assert_eq!(advance(&steps, 0, 0).unwrap().next_step, Some(0));
    }

    #[test]
    fn mismatched_lengths_are_invalid_input() {
        let mut steps = phishing_steps();
        steps[0].next_step.pop();
        assert!(matches!(validate_steps(&steps), Err(AppError::BadRequest(_))));

        let mut steps = phishing_steps();
        steps[0].outcomes.push(None);
        assert!(matches!(validate_steps(&steps), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn request_sanitizes_scenario_text() {
        let mut steps = phishing_steps();
        steps[0].scenario = "Hello<script>alert(1)</script>".to_string();
        let sim = SimulationRequest {
            title: " Phishing ".to_string(),
            description: Some("  ".to_string()),
            steps,
        }
        .into_new_simulation()
        .unwrap();

        assert_eq!(sim.title, "Phishing");
        assert_eq!(sim.description, None);
        assert_eq!(sim.steps[0].scenario, "Hello");
    }
}
