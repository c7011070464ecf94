// src/store/memory.rs

use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    error::AppError,
    models::{
        assignment::{Assignment, AssignmentStatus},
        module::{Module, ModuleRequest},
        progress::{
            CompletionCounts, ContentKind, ContentRef, NewProgress, ProgressStatus, UserProgress,
        },
        quiz::{NewQuestion, NewQuiz, Question, Quiz, QuizAccess},
        quiz_result::{NewQuizResult, QuizResult},
        simulation::{NewSimulation, Simulation},
        user::{Level, NewUser, User, UserChanges},
    },
    store::Store,
};

#[derive(Default)]
struct Tables {
    last_id: i64,
    users: BTreeMap<i64, User>,
    modules: BTreeMap<i64, Module>,
    quizzes: BTreeMap<i64, Quiz>,
    simulations: BTreeMap<i64, Simulation>,
    progress: Vec<UserProgress>,
    results: Vec<QuizResult>,
    assignments: BTreeMap<i64, Assignment>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn build_questions(&mut self, quiz_id: i64, questions: Vec<NewQuestion>) -> Vec<Question> {
        questions
            .into_iter()
            .map(|q| Question {
                id: self.next_id(),
                quiz_id,
                question_type: q.question_type,
                text: q.text,
                options: q.options,
                correct: q.correct,
                score: q.score,
                feedback: q.feedback,
                position: q.position,
            })
            .collect()
    }

    fn name_taken(&self, username: Option<&str>, email: Option<&str>, except: Option<i64>) -> bool {
        self.users.values().any(|u| {
            Some(u.id) != except
                && (username == Some(u.username.as_str()) || email == Some(u.email.as_str()))
        })
    }

    fn has_completed(&self, user_id: i64, content: ContentRef) -> bool {
        self.progress.iter().any(|p| {
            p.user_id == user_id && p.content() == content && p.status == ProgressStatus::Completed
        })
    }

    fn drop_references(&mut self, content: ContentRef) {
        self.progress.retain(|p| p.content() != content);
        self.assignments.retain(|_, a| a.content() != content);
    }
}

/// In-process store with the same semantics as `PgStore`.
///
/// Every operation runs under a single lock, which also makes multi-row
/// writes atomic. Data is lost when the process exits.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        self.tables
            .lock()
            .map_err(|_| AppError::InternalServerError("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, new: NewUser) -> Result<User, AppError> {
        let mut t = self.lock()?;
        if t.name_taken(Some(new.username.as_str()), Some(new.email.as_str()), None) {
            return Err(AppError::Conflict(format!(
                "Username '{}' or email '{}' already exists",
                new.username, new.email
            )));
        }
        let user = User {
            id: t.next_id(),
            username: new.username,
            email: new.email,
            password: new.password_hash,
            role: new.role,
            level: Level::Beginner,
            created_at: Some(Utc::now()),
        };
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.lock()?.users.values().rev().cloned().collect())
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<Option<User>, AppError> {
        let mut t = self.lock()?;
        if !t.users.contains_key(&id) {
            return Ok(None);
        }
        if t.name_taken(changes.username.as_deref(), changes.email.as_deref(), Some(id)) {
            return Err(AppError::Conflict(
                "Username or email already exists".to_string(),
            ));
        }
        let Some(user) = t.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password = password_hash;
        }
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: i64) -> Result<bool, AppError> {
        let mut t = self.lock()?;
        if t.users.remove(&id).is_none() {
            return Ok(false);
        }
        t.progress.retain(|p| p.user_id != id);
        t.assignments.retain(|_, a| a.user_id != id);
        for result in t.results.iter_mut().filter(|r| r.user_id == Some(id)) {
            result.user_id = None;
        }
        Ok(true)
    }

    async fn promote_user_level(&self, id: i64, from: Level, to: Level) -> Result<bool, AppError> {
        let mut t = self.lock()?;
        match t.users.get_mut(&id) {
            Some(user) if user.level == from => {
                user.level = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn create_module(&self, new: ModuleRequest) -> Result<Module, AppError> {
        let mut t = self.lock()?;
        let module = Module {
            id: t.next_id(),
            title: new.title,
            content: new.content,
            image_url: new.image_url,
            created_at: Some(Utc::now()),
        };
        t.modules.insert(module.id, module.clone());
        Ok(module)
    }

    async fn get_module(&self, id: i64) -> Result<Option<Module>, AppError> {
        Ok(self.lock()?.modules.get(&id).cloned())
    }

    async fn list_modules(&self) -> Result<Vec<Module>, AppError> {
        Ok(self.lock()?.modules.values().cloned().collect())
    }

    async fn update_module(&self, id: i64, changes: ModuleRequest) -> Result<Option<Module>, AppError> {
        let mut t = self.lock()?;
        Ok(t.modules.get_mut(&id).map(|module| {
            module.title = changes.title;
            module.content = changes.content;
            module.image_url = changes.image_url;
            module.clone()
        }))
    }

    async fn delete_module(&self, id: i64) -> Result<bool, AppError> {
        let mut t = self.lock()?;
        if t.modules.remove(&id).is_none() {
            return Ok(false);
        }
        t.drop_references(ContentRef::module(id));
        for quiz in t.quizzes.values_mut() {
            if let QuizAccess::ModuleLinked { module_id } = &mut quiz.access {
                if *module_id == Some(id) {
                    *module_id = None;
                }
            }
        }
        Ok(true)
    }

    async fn create_quiz(&self, new: NewQuiz) -> Result<Quiz, AppError> {
        let mut t = self.lock()?;
        let id = t.next_id();
        let questions = t.build_questions(id, new.questions);
        let quiz = Quiz {
            id,
            title: new.title,
            access: new.access,
            questions,
            created_at: Some(Utc::now()),
        };
        t.quizzes.insert(id, quiz.clone());
        Ok(quiz)
    }

    async fn get_quiz(&self, id: i64) -> Result<Option<Quiz>, AppError> {
        Ok(self.lock()?.quizzes.get(&id).cloned())
    }

    async fn list_quizzes(&self) -> Result<Vec<Quiz>, AppError> {
        Ok(self.lock()?.quizzes.values().cloned().collect())
    }

    async fn replace_quiz(&self, id: i64, new: NewQuiz) -> Result<Option<Quiz>, AppError> {
        let mut t = self.lock()?;
        if !t.quizzes.contains_key(&id) {
            return Ok(None);
        }
        let questions = t.build_questions(id, new.questions);
        Ok(t.quizzes.get_mut(&id).map(|quiz| {
            quiz.title = new.title;
            quiz.access = new.access;
            quiz.questions = questions;
            quiz.clone()
        }))
    }

    async fn delete_quiz(&self, id: i64) -> Result<bool, AppError> {
        let mut t = self.lock()?;
        if t.quizzes.remove(&id).is_none() {
            return Ok(false);
        }
        t.drop_references(ContentRef::quiz(id));
        t.results.retain(|r| r.quiz_id != id);
        Ok(true)
    }

    async fn create_simulation(&self, new: NewSimulation) -> Result<Simulation, AppError> {
        let mut t = self.lock()?;
        let simulation = Simulation {
            id: t.next_id(),
            title: new.title,
            description: new.description,
            steps: new.steps,
            created_at: Some(Utc::now()),
        };
        t.simulations.insert(simulation.id, simulation.clone());
        Ok(simulation)
    }

    async fn get_simulation(&self, id: i64) -> Result<Option<Simulation>, AppError> {
        Ok(self.lock()?.simulations.get(&id).cloned())
    }

    async fn list_simulations(&self) -> Result<Vec<Simulation>, AppError> {
        Ok(self.lock()?.simulations.values().cloned().collect())
    }

    async fn update_simulation(
        &self,
        id: i64,
        new: NewSimulation,
    ) -> Result<Option<Simulation>, AppError> {
        let mut t = self.lock()?;
        Ok(t.simulations.get_mut(&id).map(|sim| {
            sim.title = new.title;
            sim.description = new.description;
            sim.steps = new.steps;
            sim.clone()
        }))
    }

    async fn delete_simulation(&self, id: i64) -> Result<bool, AppError> {
        let mut t = self.lock()?;
        if t.simulations.remove(&id).is_none() {
            return Ok(false);
        }
        t.drop_references(ContentRef::simulation(id));
        Ok(true)
    }

    async fn content_exists(&self, content: ContentRef) -> Result<bool, AppError> {
        let t = self.lock()?;
        Ok(match content.kind {
            ContentKind::Module => t.modules.contains_key(&content.id),
            ContentKind::Quiz => t.quizzes.contains_key(&content.id),
            ContentKind::Simulation => t.simulations.contains_key(&content.id),
        })
    }

    async fn find_completed_progress(
        &self,
        user_id: i64,
        content: ContentRef,
    ) -> Result<Option<UserProgress>, AppError> {
        Ok(self
            .lock()?
            .progress
            .iter()
            .find(|p| {
                p.user_id == user_id
                    && p.content() == content
                    && p.status == ProgressStatus::Completed
            })
            .cloned())
    }

    async fn insert_progress(&self, new: NewProgress) -> Result<UserProgress, AppError> {
        let mut t = self.lock()?;
        if new.status == ProgressStatus::Completed && t.has_completed(new.user_id, new.content) {
            return Err(AppError::AlreadyCompleted(format!(
                "{} already completed",
                new.content
            )));
        }
        let progress = UserProgress {
            id: t.next_id(),
            user_id: new.user_id,
            content_type: new.content.kind,
            content_id: new.content.id,
            status: new.status,
            score: new.score,
            time_taken: new.time_taken,
            completed_at: Some(Utc::now()),
        };
        t.progress.push(progress.clone());
        Ok(progress)
    }

    async fn list_progress(&self, user_id: i64) -> Result<Vec<UserProgress>, AppError> {
        Ok(self
            .lock()?
            .progress
            .iter()
            .rev()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn completion_counts(&self, user_id: i64) -> Result<CompletionCounts, AppError> {
        let t = self.lock()?;
        let count = |kind: ContentKind| {
            let mut ids: Vec<i64> = t
                .progress
                .iter()
                .filter(|p| {
                    p.user_id == user_id
                        && p.content_type == kind
                        && p.status == ProgressStatus::Completed
                })
                .map(|p| p.content_id)
                .collect();
            ids.sort_unstable();
            ids.dedup();
            ids.len() as i64
        };
        Ok(CompletionCounts {
            simulations: count(ContentKind::Simulation),
            quizzes: count(ContentKind::Quiz),
            modules: count(ContentKind::Module),
        })
    }

    async fn insert_quiz_result(&self, new: NewQuizResult) -> Result<QuizResult, AppError> {
        let mut t = self.lock()?;
        let result = QuizResult {
            id: t.next_id(),
            quiz_id: new.quiz_id,
            user_id: new.user_id,
            score: new.score,
            answers: new.answers,
            created_at: Some(Utc::now()),
        };
        t.results.push(result.clone());
        Ok(result)
    }

    async fn list_quiz_results(&self, quiz_id: i64) -> Result<Vec<QuizResult>, AppError> {
        Ok(self
            .lock()?
            .results
            .iter()
            .rev()
            .filter(|r| r.quiz_id == quiz_id)
            .cloned()
            .collect())
    }

    async fn upsert_assignment(
        &self,
        user_id: i64,
        content: ContentRef,
        status: AssignmentStatus,
    ) -> Result<Assignment, AppError> {
        let mut t = self.lock()?;
        let now = Some(Utc::now());

        if let Some(existing) = t
            .assignments
            .values_mut()
            .find(|a| a.user_id == user_id && a.content() == content)
        {
            existing.status = status;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let assignment = Assignment {
            id: t.next_id(),
            user_id,
            content_type: content.kind,
            content_id: content.id,
            status,
            assigned_at: now,
            updated_at: now,
        };
        t.assignments.insert(assignment.id, assignment.clone());
        Ok(assignment)
    }

    async fn mark_assignment_done(&self, user_id: i64, content: ContentRef) -> Result<bool, AppError> {
        let mut t = self.lock()?;
        match t
            .assignments
            .values_mut()
            .find(|a| a.user_id == user_id && a.content() == content)
        {
            Some(assignment) => {
                assignment.status = AssignmentStatus::Done;
                assignment.updated_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_assignments(&self, user_id: Option<i64>) -> Result<Vec<Assignment>, AppError> {
        Ok(self
            .lock()?
            .assignments
            .values()
            .rev()
            .filter(|a| user_id.is_none_or(|id| a.user_id == id))
            .cloned()
            .collect())
    }

    async fn delete_assignment(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.lock()?.assignments.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz::QuestionType;
    use crate::models::user::Role;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: format!("{}@example.com", name),
            password_hash: "hash".to_string(),
            role: Role::User,
        }
    }

    fn new_quiz(correct: &str) -> NewQuiz {
        NewQuiz {
            title: "Passwords".to_string(),
            access: QuizAccess::Public,
            questions: vec![NewQuestion {
                question_type: QuestionType::TrueFalse,
                text: "Is 'password1' strong?".to_string(),
                options: vec!["true".to_string(), "false".to_string()],
                correct: correct.to_string(),
                score: 1,
                feedback: None,
                position: 0,
            }],
        }
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let store = MemoryStore::new();
        store.create_user(new_user("alice")).await.unwrap();
        let err = store.create_user(new_user("alice")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn completed_progress_is_write_once() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("bob")).await.unwrap();
        let content = ContentRef::module(42);
        let progress = |status| NewProgress {
            user_id: user.id,
            content,
            status,
            score: 100,
            time_taken: 0,
        };

        store.insert_progress(progress(ProgressStatus::Failed)).await.unwrap();
        store.insert_progress(progress(ProgressStatus::Completed)).await.unwrap();
        let err = store
            .insert_progress(progress(ProgressStatus::Completed))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyCompleted(_)));

        let counts = store.completion_counts(user.id).await.unwrap();
        assert_eq!(counts.modules, 1);
    }

    #[tokio::test]
    async fn replace_quiz_swaps_the_question_set() {
        let store = MemoryStore::new();
        let quiz = store.create_quiz(new_quiz("false")).await.unwrap();
        let old_id = quiz.questions[0].id;

        let replaced = store
            .replace_quiz(quiz.id, new_quiz("true"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(replaced.questions.len(), 1);
        assert_ne!(replaced.questions[0].id, old_id);
        assert_eq!(replaced.questions[0].correct, "true");

        assert!(store.replace_quiz(9999, new_quiz("true")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn assignment_upsert_keeps_one_row() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("carol")).await.unwrap();
        let content = ContentRef::quiz(3);

        let first = store
            .upsert_assignment(user.id, content, AssignmentStatus::Pending)
            .await
            .unwrap();
        let second = store
            .upsert_assignment(user.id, content, AssignmentStatus::Done)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.list_assignments(Some(user.id)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn promotion_only_applies_from_expected_level() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("dave")).await.unwrap();

        assert!(store
            .promote_user_level(user.id, Level::Beginner, Level::Intermediate)
            .await
            .unwrap());
        assert!(!store
            .promote_user_level(user.id, Level::Beginner, Level::Intermediate)
            .await
            .unwrap());
    }
}
