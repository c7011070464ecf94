// src/services/completion.rs

//! The single write path for learner progress.
//!
//! Module completion, simulation endings and quiz submissions all go through
//! `record_progress`, which keeps the write-once rule, assignment status and
//! level promotion in one place.

use crate::{
    error::AppError,
    models::{
        progress::{ContentRef, NewProgress, ProgressOverview, ProgressStatus, UserProgress},
        user::User,
    },
    services::leveling::{self, LevelUp},
    store::Store,
};

/// What a progress write produced.
#[derive(Debug)]
pub struct Recorded {
    pub progress: UserProgress,
    pub level_up: Option<LevelUp>,
}

/// Writes a progress record for `(user, content)`.
///
/// Refused with `AlreadyCompleted` if the pair has a completed record. The
/// matching assignment is still flipped to done on that path, so a write
/// interrupted after the insert is repaired by the next attempt.
/// A completed write flips the matching assignment to done and re-evaluates
/// the learner's level.
pub async fn record_progress(store: &dyn Store, new: NewProgress) -> Result<Recorded, AppError> {
    let user_id = new.user_id;
    let content = new.content;

    if store
        .find_completed_progress(user_id, content)
        .await?
        .is_some()
    {
        // A previous write may have stopped before the assignment was synced.
        sync_assignment(store, user_id, content).await?;
        return Err(AppError::AlreadyCompleted(format!(
            "{} already completed",
            content
        )));
    }

    let progress = match store.insert_progress(new).await {
        Ok(progress) => progress,
        Err(AppError::AlreadyCompleted(msg)) => {
            sync_assignment(store, user_id, content).await?;
            return Err(AppError::AlreadyCompleted(msg));
        }
        Err(e) => return Err(e),
    };

    tracing::info!(
        "Recorded progress for user {} on {}: {} (score {})",
        user_id,
        content,
        progress.status.as_str(),
        progress.score
    );

    let level_up = if progress.status == ProgressStatus::Completed {
        sync_assignment(store, user_id, content).await?;
        apply_leveling(store, user_id).await?
    } else {
        None
    };

    Ok(Recorded { progress, level_up })
}

/// Marks the assignment for `(user, content)` as done, if there is one.
pub async fn sync_assignment(
    store: &dyn Store,
    user_id: i64,
    content: ContentRef,
) -> Result<bool, AppError> {
    let updated = store.mark_assignment_done(user_id, content).await?;
    if updated {
        tracing::info!("Assignment for user {} on {} is done", user_id, content);
    }
    Ok(updated)
}

/// Recomputes the learner's level from their completed records.
///
/// Safe to call repeatedly: the promotion is a conditional update, so only
/// the call that actually changes the level returns a notification.
pub async fn apply_leveling(store: &dyn Store, user_id: i64) -> Result<Option<LevelUp>, AppError> {
    let user = store
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let counts = store.completion_counts(user_id).await?;

    let Some(next) = leveling::next_level(user.level, &counts) else {
        return Ok(None);
    };

    if store.promote_user_level(user_id, user.level, next).await? {
        tracing::info!(
            "User {} promoted from {} to {}",
            user_id,
            user.level.as_str(),
            next.as_str()
        );
        Ok(Some(LevelUp::new(user.level, next)))
    } else {
        Ok(None)
    }
}

/// Builds the progress view for a user.
pub async fn overview(store: &dyn Store, user: &User) -> Result<ProgressOverview, AppError> {
    let counts = store.completion_counts(user.id).await?;
    let records = store.list_progress(user.id).await?;

    Ok(ProgressOverview {
        user_id: user.id,
        username: user.username.clone(),
        level: user.level,
        completed: counts,
        percentage: leveling::progress_percentage(&counts),
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        assignment::AssignmentStatus,
        module::ModuleRequest,
        user::{NewUser, Role},
    };
    use crate::store::MemoryStore;

    async fn learner_and_module(store: &MemoryStore) -> (i64, ContentRef) {
        let user = store
            .create_user(NewUser {
                username: "dana".to_string(),
                email: "dana@example.com".to_string(),
                password_hash: "hash".to_string(),
                role: Role::User,
            })
            .await
            .unwrap();
        let module = store
            .create_module(ModuleRequest {
                title: "Tailgating".to_string(),
                content: "Hold the door, check the badge.".to_string(),
                image_url: None,
            })
            .await
            .unwrap();
        (user.id, ContentRef::module(module.id))
    }

    fn completed(user_id: i64, content: ContentRef, score: i32) -> NewProgress {
        NewProgress {
            user_id,
            content,
            status: ProgressStatus::Completed,
            score,
            time_taken: 0,
        }
    }

    #[tokio::test]
    async fn completion_marks_assignment_done() {
        let store = MemoryStore::new();
        let (user_id, content) = learner_and_module(&store).await;
        store
            .upsert_assignment(user_id, content, AssignmentStatus::Pending)
            .await
            .unwrap();

        record_progress(&store, completed(user_id, content, 100))
            .await
            .unwrap();

        let assignments = store.list_assignments(Some(user_id)).await.unwrap();
        assert_eq!(assignments[0].status, AssignmentStatus::Done);
    }

    #[tokio::test]
    async fn failed_record_leaves_assignment_pending() {
        let store = MemoryStore::new();
        let (user_id, content) = learner_and_module(&store).await;
        store
            .upsert_assignment(user_id, content, AssignmentStatus::Pending)
            .await
            .unwrap();

        let recorded = record_progress(
            &store,
            NewProgress {
                status: ProgressStatus::Failed,
                score: 0,
                ..completed(user_id, content, 0)
            },
        )
        .await
        .unwrap();
        assert_eq!(recorded.progress.status, ProgressStatus::Failed);

        let assignments = store.list_assignments(Some(user_id)).await.unwrap();
        assert_eq!(assignments[0].status, AssignmentStatus::Pending);
    }

    #[tokio::test]
    async fn repeated_completion_repairs_unsynced_assignment() {
        let store = MemoryStore::new();
        let (user_id, content) = learner_and_module(&store).await;
        store
            .upsert_assignment(user_id, content, AssignmentStatus::Pending)
            .await
            .unwrap();
        // Completed row stored, but the assignment update never happened.
        store
            .insert_progress(completed(user_id, content, 100))
            .await
            .unwrap();

        let err = record_progress(&store, completed(user_id, content, 40))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyCompleted(_)));

        let assignments = store.list_assignments(Some(user_id)).await.unwrap();
        assert_eq!(assignments[0].status, AssignmentStatus::Done);

        // The original record is untouched.
        let records = store.list_progress(user_id).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].score, 100);
    }
}
