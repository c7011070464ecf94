// src/models/quiz.rs

use std::{collections::HashMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{error::AppError, services::access::validate_pin_format};

/// Kind of question. True/false questions always carry the options `["true", "false"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ScenarioBased,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::TrueFalse => "true_false",
            QuestionType::ScenarioBased => "scenario_based",
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multiple_choice" => Ok(QuestionType::MultipleChoice),
            "true_false" => Ok(QuestionType::TrueFalse),
            "scenario_based" => Ok(QuestionType::ScenarioBased),
            other => Err(format!("unknown question type '{}'", other)),
        }
    }
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,

    #[serde(rename = "type")]
    pub question_type: QuestionType,

    pub text: String,

    /// Ordered answer options. Stored as a JSON array in the database.
    pub options: Vec<String>,

    /// Always one of `options`.
    pub correct: String,

    /// Points awarded for a correct answer.
    pub score: i32,

    /// Explanation appended to the grading message.
    pub feedback: Option<String>,

    /// Display order inside the quiz.
    pub position: i32,
}

/// DTO for sending a question to learners (excludes answer and feedback).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub text: String,
    pub options: Vec<String>,
    pub score: i32,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            question_type: q.question_type,
            text: q.text.clone(),
            options: q.options.clone(),
            score: q.score,
        }
    }
}

/// Who may open a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuizAccess {
    /// Anyone, including anonymous visitors.
    Public,
    /// Any signed-in learner. Optionally tied to the module it reviews.
    ModuleLinked {
        #[serde(default)]
        module_id: Option<i64>,
    },
    /// Anyone presenting the matching PIN.
    PinProtected { pin: String },
}

impl QuizAccess {
    pub fn kind(&self) -> &'static str {
        match self {
            QuizAccess::Public => "public",
            QuizAccess::ModuleLinked { .. } => "module_linked",
            QuizAccess::PinProtected { .. } => "pin_protected",
        }
    }

    pub fn module_id(&self) -> Option<i64> {
        match self {
            QuizAccess::ModuleLinked { module_id } => *module_id,
            _ => None,
        }
    }

    pub fn pin(&self) -> Option<&str> {
        match self {
            QuizAccess::PinProtected { pin } => Some(pin),
            _ => None,
        }
    }

    /// Rebuilds the policy from its stored columns.
    pub fn from_columns(
        kind: &str,
        module_id: Option<i64>,
        pin: Option<String>,
    ) -> Result<Self, String> {
        match kind {
            "public" => Ok(QuizAccess::Public),
            "module_linked" => Ok(QuizAccess::ModuleLinked { module_id }),
            "pin_protected" => pin
                .map(|pin| QuizAccess::PinProtected { pin })
                .ok_or_else(|| "pin_protected quiz without a pin".to_string()),
            other => Err(format!("unknown quiz type '{}'", other)),
        }
    }
}

impl fmt::Display for QuizAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// A quiz with its full question set. Admin-facing: includes answers and the PIN.
#[derive(Debug, Clone, Serialize)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub access: QuizAccess,
    pub questions: Vec<Question>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Listing entry. Never carries questions or the PIN.
#[derive(Debug, Clone, Serialize)]
pub struct QuizSummary {
    pub id: i64,
    pub title: String,
    pub quiz_type: String,
    pub module_id: Option<i64>,
    pub question_count: i64,
}

impl From<&Quiz> for QuizSummary {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title.clone(),
            quiz_type: quiz.access.kind().to_string(),
            module_id: quiz.access.module_id(),
            question_count: quiz.questions.len() as i64,
        }
    }
}

/// Learner-facing quiz, once the access gate has been passed.
#[derive(Debug, Serialize)]
pub struct QuizView {
    pub id: i64,
    pub title: String,
    pub quiz_type: String,
    pub module_id: Option<i64>,
    pub questions: Vec<PublicQuestion>,
}

impl From<&Quiz> for QuizView {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title.clone(),
            quiz_type: quiz.access.kind().to_string(),
            module_id: quiz.access.module_id(),
            questions: quiz.questions.iter().map(PublicQuestion::from).collect(),
        }
    }
}

/// Question kind as sent by the authoring form.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice { options: Vec<String> },
    TrueFalse,
    ScenarioBased { options: Vec<String> },
}

/// DTO for one question inside a quiz create/update request.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionRequest {
    #[serde(flatten)]
    pub kind: QuestionKind,
    pub text: String,
    pub correct: String,
    #[serde(default = "default_question_score")]
    pub score: i32,
    pub feedback: Option<String>,
}

fn default_question_score() -> i32 {
    1
}

/// Validated question ready for insertion.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub question_type: QuestionType,
    pub text: String,
    pub options: Vec<String>,
    pub correct: String,
    pub score: i32,
    pub feedback: Option<String>,
    pub position: i32,
}

impl QuestionRequest {
    pub fn into_new_question(self, position: i32) -> Result<NewQuestion, AppError> {
        let label = position + 1;
        let text = self.text.trim().to_string();
        if text.is_empty() || text.len() > 2000 {
            return Err(AppError::BadRequest(format!(
                "Question {}: text must be between 1 and 2000 characters",
                label
            )));
        }

        let (question_type, options) = match self.kind {
            QuestionKind::TrueFalse => (
                QuestionType::TrueFalse,
                vec!["true".to_string(), "false".to_string()],
            ),
            QuestionKind::MultipleChoice { options } => (QuestionType::MultipleChoice, options),
            QuestionKind::ScenarioBased { options } => (QuestionType::ScenarioBased, options),
        };

        if options.len() < 2 {
            return Err(AppError::BadRequest(format!(
                "Question {}: at least two options are required",
                label
            )));
        }
        if options.iter().any(|o| o.trim().is_empty() || o.len() > 500) {
            return Err(AppError::BadRequest(format!(
                "Question {}: options must be between 1 and 500 characters",
                label
            )));
        }
        if !options.contains(&self.correct) {
            return Err(AppError::BadRequest(format!(
                "Question {}: correct answer must be one of the options",
                label
            )));
        }
        if !(0..=1000).contains(&self.score) {
            return Err(AppError::BadRequest(format!(
                "Question {}: score must be between 0 and 1000",
                label
            )));
        }
        if self.feedback.as_ref().is_some_and(|f| f.len() > 2000) {
            return Err(AppError::BadRequest(format!(
                "Question {}: feedback is too long",
                label
            )));
        }

        Ok(NewQuestion {
            question_type,
            text,
            options,
            correct: self.correct,
            score: self.score,
            feedback: self.feedback.filter(|f| !f.trim().is_empty()),
            position,
        })
    }
}

/// DTO for creating a quiz or replacing one wholesale.
#[derive(Debug, Clone, Deserialize)]
pub struct QuizRequest {
    pub title: String,
    pub access: QuizAccess,
    pub questions: Vec<QuestionRequest>,
}

/// Validated quiz ready for insertion.
#[derive(Debug, Clone)]
pub struct NewQuiz {
    pub title: String,
    pub access: QuizAccess,
    pub questions: Vec<NewQuestion>,
}

impl QuizRequest {
    pub fn into_new_quiz(self) -> Result<NewQuiz, AppError> {
        let title = self.title.trim().to_string();
        if title.is_empty() || title.len() > 200 {
            return Err(AppError::BadRequest(
                "Quiz title must be between 1 and 200 characters".to_string(),
            ));
        }
        if let QuizAccess::PinProtected { pin } = &self.access {
            validate_pin_format(pin)?;
        }
        if self.questions.is_empty() {
            return Err(AppError::BadRequest(
                "A quiz needs at least one question".to_string(),
            ));
        }

        let questions = self
            .questions
            .into_iter()
            .enumerate()
            .map(|(i, q)| q.into_new_question(i as i32))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NewQuiz {
            title,
            access: self.access,
            questions,
        })
    }
}

/// DTO for presenting a PIN to a pin-protected quiz.
#[derive(Debug, Deserialize)]
pub struct UnlockQuizRequest {
    pub pin: String,
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    /// Key: Question ID, Value: the chosen option text.
    pub answers: HashMap<i64, String>,

    /// Required for pin-protected quizzes.
    pub pin: Option<String>,

    /// Seconds spent on the attempt, as measured by the client.
    #[serde(default)]
    pub time_taken: i32,
}
