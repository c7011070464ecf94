// src/services/leveling.rs

use serde::Serialize;

use crate::{
    config::{TARGET_MODULES, TARGET_QUIZZES, TARGET_SIMULATIONS},
    models::{progress::CompletionCounts, user::Level},
};

/// One-time notification returned when a promotion was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelUp {
    pub from: Level,
    pub to: Level,
    pub message: String,
}

impl LevelUp {
    pub fn new(from: Level, to: Level) -> Self {
        Self {
            from,
            to,
            message: format!(
                "Congratulations! You advanced from {} to {}.",
                from.as_str(),
                to.as_str()
            ),
        }
    }
}

/// Weighted completion percentage.
///
/// Each kind contributes at most its target (1 simulation, 2 quizzes,
/// 2 modules), so the result does not grow with the size of the catalogue.
pub fn progress_percentage(counts: &CompletionCounts) -> f64 {
    let part = |done: i64, target: i64| done.clamp(0, target) as f64 / target as f64;

    let raw = (part(counts.simulations, TARGET_SIMULATIONS)
        + part(counts.quizzes, TARGET_QUIZZES)
        + part(counts.modules, TARGET_MODULES))
        / 5.0
        * 100.0;

    raw.clamp(0.0, 100.0)
}

/// Whether all promotion targets are met.
pub fn meets_targets(counts: &CompletionCounts) -> bool {
    counts.simulations >= TARGET_SIMULATIONS
        && counts.quizzes >= TARGET_QUIZZES
        && counts.modules >= TARGET_MODULES
}

/// The level a user should move to, if any. Never returns a lower level.
pub fn next_level(current: Level, counts: &CompletionCounts) -> Option<Level> {
    match current {
        Level::Beginner if meets_targets(counts) => Some(Level::Intermediate),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(simulations: i64, quizzes: i64, modules: i64) -> CompletionCounts {
        CompletionCounts {
            simulations,
            quizzes,
            modules,
        }
    }

    #[test]
    fn partial_progress_without_promotion() {
        let c = counts(1, 2, 1);
        assert!((progress_percentage(&c) - 50.0).abs() < 1e-9);
        assert_eq!(next_level(Level::Beginner, &c), None);
    }

    #[test]
    fn contributions_are_capped_per_kind() {
        assert!((progress_percentage(&counts(5, 10, 7)) - 60.0).abs() < 1e-9);
        assert_eq!(progress_percentage(&counts(0, 0, 0)), 0.0);
        assert!((progress_percentage(&counts(0, 1, 0)) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn beginner_is_promoted_once_targets_are_met() {
        let c = counts(1, 2, 2);
        assert_eq!(next_level(Level::Beginner, &c), Some(Level::Intermediate));
        // Re-evaluating after the promotion changes nothing.
        assert_eq!(next_level(Level::Intermediate, &c), None);
    }

    #[test]
    fn intermediate_is_never_demoted() {
        assert_eq!(next_level(Level::Intermediate, &counts(0, 0, 0)), None);
    }

    #[test]
    fn level_up_message_names_both_levels() {
        let n = LevelUp::new(Level::Beginner, Level::Intermediate);
        assert!(n.message.contains("beginner"));
        assert!(n.message.contains("intermediate"));
    }
}
