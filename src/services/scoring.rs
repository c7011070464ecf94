// src/services/scoring.rs

use std::collections::HashMap;

use crate::{config::QUIZ_PASS_PERCENTAGE, models::quiz::Question};

/// Outcome of grading one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grade {
    pub total_score: i32,
    pub correct_count: usize,
    pub passed: bool,
    /// One line per question, in quiz order.
    pub feedback: Vec<String>,
}

/// Number of correct answers needed to pass: `ceil(count * 0.7)`.
pub fn pass_threshold(question_count: usize) -> usize {
    (question_count * QUIZ_PASS_PERCENTAGE).div_ceil(100)
}

/// Grades answers against the stored questions.
///
/// Matching is strict string equality. Unanswered questions count as wrong,
/// answers for unknown question ids are ignored.
pub fn grade(questions: &[Question], answers: &HashMap<i64, String>) -> Grade {
    let mut total_score = 0;
    let mut correct_count = 0;
    let mut feedback = Vec::with_capacity(questions.len());

    for question in questions {
        let is_correct = answers
            .get(&question.id)
            .is_some_and(|answer| answer == &question.correct);

        if is_correct {
            total_score += question.score;
            correct_count += 1;
        }
        feedback.push(feedback_line(question, is_correct));
    }

    Grade {
        total_score,
        correct_count,
        passed: correct_count >= pass_threshold(questions.len()),
        feedback,
    }
}

fn feedback_line(question: &Question, is_correct: bool) -> String {
    let extra = question.feedback.as_deref().unwrap_or("");
    let line = if is_correct {
        format!("Correct! {}", extra)
    } else {
        format!(
            "Incorrect. The correct answer is \"{}\". {}",
            question.correct, extra
        )
    };
    line.trim_end().to_string()
}
