// src/store/mod.rs

//! Persistence boundary.
//!
//! Handlers receive an `Arc<dyn Store>` through `AppState` and never touch a
//! connection directly. `PgStore` is the production backend, `MemoryStore`
//! keeps everything in process.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        assignment::{Assignment, AssignmentStatus},
        module::{Module, ModuleRequest},
        progress::{CompletionCounts, ContentRef, NewProgress, UserProgress},
        quiz::{NewQuiz, Quiz},
        quiz_result::{NewQuizResult, QuizResult},
        simulation::{NewSimulation, Simulation},
        user::{Level, NewUser, User, UserChanges},
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    // Users
    async fn create_user(&self, new: NewUser) -> Result<User, AppError>;
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn list_users(&self) -> Result<Vec<User>, AppError>;
    /// Returns `None` when the user does not exist.
    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<Option<User>, AppError>;
    async fn delete_user(&self, id: i64) -> Result<bool, AppError>;
    /// Moves the user from `from` to `to` only if they are still at `from`.
    /// Returns whether a row changed.
    async fn promote_user_level(&self, id: i64, from: Level, to: Level) -> Result<bool, AppError>;

    // Modules
    async fn create_module(&self, new: ModuleRequest) -> Result<Module, AppError>;
    async fn get_module(&self, id: i64) -> Result<Option<Module>, AppError>;
    async fn list_modules(&self) -> Result<Vec<Module>, AppError>;
    async fn update_module(&self, id: i64, changes: ModuleRequest) -> Result<Option<Module>, AppError>;
    /// Also removes progress and assignments pointing at the module.
    async fn delete_module(&self, id: i64) -> Result<bool, AppError>;

    // Quizzes
    async fn create_quiz(&self, new: NewQuiz) -> Result<Quiz, AppError>;
    async fn get_quiz(&self, id: i64) -> Result<Option<Quiz>, AppError>;
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, AppError>;
    /// Replaces title, access policy and the whole question set in one transaction.
    async fn replace_quiz(&self, id: i64, new: NewQuiz) -> Result<Option<Quiz>, AppError>;
    async fn delete_quiz(&self, id: i64) -> Result<bool, AppError>;

    // Simulations
    async fn create_simulation(&self, new: NewSimulation) -> Result<Simulation, AppError>;
    async fn get_simulation(&self, id: i64) -> Result<Option<Simulation>, AppError>;
    async fn list_simulations(&self) -> Result<Vec<Simulation>, AppError>;
    async fn update_simulation(
        &self,
        id: i64,
        new: NewSimulation,
    ) -> Result<Option<Simulation>, AppError>;
    async fn delete_simulation(&self, id: i64) -> Result<bool, AppError>;

    async fn content_exists(&self, content: ContentRef) -> Result<bool, AppError>;

    // Progress
    async fn find_completed_progress(
        &self,
        user_id: i64,
        content: ContentRef,
    ) -> Result<Option<UserProgress>, AppError>;
    /// Fails with `AlreadyCompleted` if a completed record for the same
    /// (user, content) pair already exists.
    async fn insert_progress(&self, new: NewProgress) -> Result<UserProgress, AppError>;
    async fn list_progress(&self, user_id: i64) -> Result<Vec<UserProgress>, AppError>;
    async fn completion_counts(&self, user_id: i64) -> Result<CompletionCounts, AppError>;

    // Quiz results
    async fn insert_quiz_result(&self, new: NewQuizResult) -> Result<QuizResult, AppError>;
    async fn list_quiz_results(&self, quiz_id: i64) -> Result<Vec<QuizResult>, AppError>;

    // Assignments
    /// Inserts or updates the assignment for (user, content).
    async fn upsert_assignment(
        &self,
        user_id: i64,
        content: ContentRef,
        status: AssignmentStatus,
    ) -> Result<Assignment, AppError>;
    /// Flips a matching assignment to done. Returns whether one existed.
    async fn mark_assignment_done(&self, user_id: i64, content: ContentRef) -> Result<bool, AppError>;
    async fn list_assignments(&self, user_id: Option<i64>) -> Result<Vec<Assignment>, AppError>;
    async fn delete_assignment(&self, id: i64) -> Result<bool, AppError>;
}
