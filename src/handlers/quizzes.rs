// src/handlers/quizzes.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::{
        progress::{ContentRef, NewProgress, ProgressStatus},
        quiz::{NewQuiz, Quiz, QuizRequest, QuizSummary, QuizView, SubmitQuizRequest, UnlockQuizRequest},
        quiz_result::{NewQuizResult, QuizSubmissionResponse},
    },
    services::{access::authorize_quiz, completion, scoring},
    store::Store,
    utils::jwt::MaybeClaims,
};

async fn load_quiz(store: &dyn Store, id: i64) -> Result<Quiz, AppError> {
    store
        .get_quiz(id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))
}

/// Lists quizzes without questions or PINs.
pub async fn list_quizzes(
    State(store): State<Arc<dyn Store>>,
) -> Result<impl IntoResponse, AppError> {
    let quizzes = store.list_quizzes().await?;
    let summaries: Vec<QuizSummary> = quizzes.iter().map(QuizSummary::from).collect();
    Ok(Json(summaries))
}

/// Opens a quiz for answering.
///
/// Public quizzes open for anyone, module-linked ones need a session and
/// pin-protected ones must go through `unlock_quiz`.
pub async fn get_quiz(
    State(store): State<Arc<dyn Store>>,
    MaybeClaims(claims): MaybeClaims,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = load_quiz(store.as_ref(), id).await?;
    authorize_quiz(&quiz.access, claims.as_ref(), None)?;
    Ok(Json(QuizView::from(&quiz)))
}

/// Presents a PIN and returns the questions when it matches.
pub async fn unlock_quiz(
    State(store): State<Arc<dyn Store>>,
    MaybeClaims(claims): MaybeClaims,
    Path(id): Path<i64>,
    Json(req): Json<UnlockQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = load_quiz(store.as_ref(), id).await?;
    authorize_quiz(&quiz.access, claims.as_ref(), Some(&req.pin))?;
    Ok(Json(QuizView::from(&quiz)))
}

/// Grades a submission.
///
/// * Always appends a quiz result, anonymous visitors included.
/// * Signed-in learners also get a progress record: completed when passed,
///   failed otherwise. Failed quizzes can be retried without limit.
/// * Unanswered questions count as wrong; an empty answer map is a valid
///   (failing) attempt.
/// * Once a quiz is completed, later attempts are graded and logged but do
///   not write progress again. The assignment is re-synced instead.
pub async fn submit_quiz(
    State(store): State<Arc<dyn Store>>,
    MaybeClaims(claims): MaybeClaims,
    Path(id): Path<i64>,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = load_quiz(store.as_ref(), id).await?;
    authorize_quiz(&quiz.access, claims.as_ref(), req.pin.as_deref())?;

    let user_id = claims.as_ref().map(|c| c.user_id()).transpose()?;
    let grade = scoring::grade(&quiz.questions, &req.answers);

    let result = store
        .insert_quiz_result(NewQuizResult {
            quiz_id: quiz.id,
            user_id,
            score: grade.total_score,
            answers: req.answers,
        })
        .await?;

    let mut status = None;
    let mut already_completed = false;
    let mut level_up = None;

    if let Some(user_id) = user_id {
        let content = ContentRef::quiz(quiz.id);
        if store.find_completed_progress(user_id, content).await?.is_some() {
            already_completed = true;
            completion::sync_assignment(store.as_ref(), user_id, content).await?;
        } else {
            let recorded = completion::record_progress(
                store.as_ref(),
                NewProgress {
                    user_id,
                    content,
                    status: if grade.passed {
                        ProgressStatus::Completed
                    } else {
                        ProgressStatus::Failed
                    },
                    score: grade.total_score,
                    time_taken: req.time_taken.max(0),
                },
            )
            .await?;
            status = Some(recorded.progress.status);
            level_up = recorded.level_up;
        }
    }

    tracing::info!(
        "Quiz {} submitted by {:?}: {}/{} correct, passed={}",
        quiz.id,
        user_id,
        grade.correct_count,
        quiz.questions.len(),
        grade.passed
    );

    Ok(Json(QuizSubmissionResponse {
        result_id: result.id,
        total_score: grade.total_score,
        correct_count: grade.correct_count,
        total_questions: quiz.questions.len(),
        passed: grade.passed,
        feedback: grade.feedback,
        status,
        already_completed,
        level_up,
    }))
}

async fn validated(store: &dyn Store, payload: QuizRequest) -> Result<NewQuiz, AppError> {
    let new_quiz = payload.into_new_quiz()?;
    if let Some(module_id) = new_quiz.access.module_id() {
        if !store.content_exists(ContentRef::module(module_id)).await? {
            return Err(AppError::NotFound(format!(
                "Module {} not found",
                module_id
            )));
        }
    }
    Ok(new_quiz)
}

/// Creates a quiz with its questions in one transaction.
/// Admin only.
pub async fn create_quiz(
    State(store): State<Arc<dyn Store>>,
    Json(payload): Json<QuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new_quiz = validated(store.as_ref(), payload).await?;
    let quiz = store.create_quiz(new_quiz).await?;
    tracing::info!(
        "Created {} quiz {} with {} questions",
        quiz.access,
        quiz.id,
        quiz.questions.len()
    );
    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Full quiz including answers and PIN.
/// Admin only.
pub async fn get_quiz_admin(
    State(store): State<Arc<dyn Store>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(load_quiz(store.as_ref(), id).await?))
}

/// Replaces a quiz and its whole question set atomically.
/// Admin only.
pub async fn update_quiz(
    State(store): State<Arc<dyn Store>>,
    Path(id): Path<i64>,
    Json(payload): Json<QuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new_quiz = validated(store.as_ref(), payload).await?;
    let quiz = store
        .replace_quiz(id, new_quiz)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;
    Ok(Json(quiz))
}

/// Deletes a quiz with its questions, results, progress and assignments.
/// Admin only.
pub async fn delete_quiz(
    State(store): State<Arc<dyn Store>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !store.delete_quiz(id).await? {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Attempt log of one quiz, newest first.
/// Admin only.
pub async fn list_results(
    State(store): State<Arc<dyn Store>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    load_quiz(store.as_ref(), id).await?;
    Ok(Json(store.list_quiz_results(id).await?))
}
