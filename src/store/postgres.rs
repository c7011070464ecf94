// src/store/postgres.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder, types::Json};

use crate::{
    error::AppError,
    models::{
        assignment::{Assignment, AssignmentStatus},
        module::{Module, ModuleRequest},
        progress::{CompletionCounts, ContentKind, ContentRef, NewProgress, UserProgress},
        quiz::{NewQuestion, NewQuiz, Question, Quiz, QuizAccess},
        quiz_result::{NewQuizResult, QuizResult},
        simulation::{NewSimulation, Simulation, Step},
        user::{Level, NewUser, User, UserChanges},
    },
    store::Store,
};

const USER_COLUMNS: &str = "id, username, email, password, role, level, created_at";
const MODULE_COLUMNS: &str = "id, title, content, image_url, created_at";
const QUIZ_COLUMNS: &str = "id, title, type AS quiz_type, pin, module_id, created_at";
const QUESTION_COLUMNS: &str =
    "id, quiz_id, type AS question_type, text, options, correct, score, feedback, position";
const SIMULATION_COLUMNS: &str = "id, title, description, steps, created_at";
const PROGRESS_COLUMNS: &str =
    "id, user_id, content_type, content_id, status, score, time_taken, completed_at";
const ASSIGNMENT_COLUMNS: &str =
    "id, user_id, content_type, content_id, status, assigned_at, updated_at";
const RESULT_COLUMNS: &str = "id, quiz_id, user_id, score, answers, created_at";

/// Turns a corrupt enum column into an internal error.
fn parse_column<T: std::str::FromStr<Err = String>>(raw: &str) -> Result<T, AppError> {
    raw.parse::<T>().map_err(AppError::InternalServerError)
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password: String,
    role: String,
    level: String,
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            password: row.password,
            role: parse_column(&row.role)?,
            level: parse_column(&row.level)?,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct QuizRow {
    id: i64,
    title: String,
    quiz_type: String,
    pin: Option<String>,
    module_id: Option<i64>,
    created_at: Option<DateTime<Utc>>,
}

impl QuizRow {
    fn into_quiz(self, questions: Vec<Question>) -> Result<Quiz, AppError> {
        let access = QuizAccess::from_columns(&self.quiz_type, self.module_id, self.pin)
            .map_err(AppError::InternalServerError)?;
        Ok(Quiz {
            id: self.id,
            title: self.title,
            access,
            questions,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct QuestionRow {
    id: i64,
    quiz_id: i64,
    question_type: String,
    text: String,
    options: Json<Vec<String>>,
    correct: String,
    score: i32,
    feedback: Option<String>,
    position: i32,
}

impl TryFrom<QuestionRow> for Question {
    type Error = AppError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        Ok(Question {
            id: row.id,
            quiz_id: row.quiz_id,
            question_type: parse_column(&row.question_type)?,
            text: row.text,
            options: row.options.0,
            correct: row.correct,
            score: row.score,
            feedback: row.feedback,
            position: row.position,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SimulationRow {
    id: i64,
    title: String,
    description: Option<String>,
    steps: Json<Vec<Step>>,
    created_at: Option<DateTime<Utc>>,
}

impl From<SimulationRow> for Simulation {
    fn from(row: SimulationRow) -> Self {
        Simulation {
            id: row.id,
            title: row.title,
            description: row.description,
            steps: row.steps.0,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProgressRow {
    id: i64,
    user_id: i64,
    content_type: String,
    content_id: i64,
    status: String,
    score: i32,
    time_taken: i32,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<ProgressRow> for UserProgress {
    type Error = AppError;

    fn try_from(row: ProgressRow) -> Result<Self, Self::Error> {
        Ok(UserProgress {
            id: row.id,
            user_id: row.user_id,
            content_type: parse_column(&row.content_type)?,
            content_id: row.content_id,
            status: parse_column(&row.status)?,
            score: row.score,
            time_taken: row.time_taken,
            completed_at: row.completed_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AssignmentRow {
    id: i64,
    user_id: i64,
    content_type: String,
    content_id: i64,
    status: String,
    assigned_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<AssignmentRow> for Assignment {
    type Error = AppError;

    fn try_from(row: AssignmentRow) -> Result<Self, Self::Error> {
        Ok(Assignment {
            id: row.id,
            user_id: row.user_id,
            content_type: parse_column(&row.content_type)?,
            content_id: row.content_id,
            status: parse_column(&row.status)?,
            assigned_at: row.assigned_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct QuizResultRow {
    id: i64,
    quiz_id: i64,
    user_id: Option<i64>,
    score: i32,
    answers: Json<HashMap<i64, String>>,
    created_at: Option<DateTime<Utc>>,
}

impl From<QuizResultRow> for QuizResult {
    fn from(row: QuizResultRow) -> Self {
        QuizResult {
            id: row.id,
            quiz_id: row.quiz_id,
            user_id: row.user_id,
            score: row.score,
            answers: row.answers.0,
            created_at: row.created_at,
        }
    }
}

fn content_table(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Module => "modules",
        ContentKind::Quiz => "quizzes",
        ContentKind::Simulation => "simulations",
    }
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies the bundled migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    async fn insert_questions(
        conn: &mut PgConnection,
        quiz_id: i64,
        questions: &[NewQuestion],
    ) -> Result<Vec<Question>, AppError> {
        let mut inserted = Vec::with_capacity(questions.len());
        for q in questions {
            let sql = format!(
                "INSERT INTO questions (quiz_id, type, text, options, correct, score, feedback, position)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                 RETURNING {}",
                QUESTION_COLUMNS
            );
            let row = sqlx::query_as::<_, QuestionRow>(&sql)
                .bind(quiz_id)
                .bind(q.question_type.as_str())
                .bind(&q.text)
                .bind(Json(&q.options))
                .bind(&q.correct)
                .bind(q.score)
                .bind(&q.feedback)
                .bind(q.position)
                .fetch_one(&mut *conn)
                .await?;
            inserted.push(Question::try_from(row)?);
        }
        Ok(inserted)
    }

    async fn questions_for(&self, quiz_id: i64) -> Result<Vec<Question>, AppError> {
        let sql = format!(
            "SELECT {} FROM questions WHERE quiz_id = $1 ORDER BY position, id",
            QUESTION_COLUMNS
        );
        sqlx::query_as::<_, QuestionRow>(&sql)
            .bind(quiz_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Question::try_from)
            .collect()
    }

    /// Deletes a content row together with progress and assignments that reference it.
    async fn delete_content(&self, content: ContentRef) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_progress WHERE content_type = $1 AND content_id = $2")
            .bind(content.kind.as_str())
            .bind(content.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM assignments WHERE content_type = $1 AND content_id = $2")
            .bind(content.kind.as_str())
            .bind(content.id)
            .execute(&mut *tx)
            .await?;

        let sql = format!("DELETE FROM {} WHERE id = $1", content_table(content.kind));
        let result = sqlx::query(&sql).bind(content.id).execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, new: NewUser) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (username, email, password, role) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&new.username)
            .bind(&new.email)
            .bind(&new.password_hash)
            .bind(new.role.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict(_) => AppError::Conflict(format!(
                    "Username '{}' or email '{}' already exists",
                    new.username, new.email
                )),
                other => other,
            })?;
        User::try_from(row)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let sql = format!("SELECT {} FROM users ORDER BY id DESC", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<Option<User>, AppError> {
        if changes.is_empty() {
            return self.find_user_by_id(id).await;
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET ");
        let mut separated = builder.separated(", ");

        if let Some(username) = changes.username {
            separated.push("username = ");
            separated.push_bind_unseparated(username);
        }
        if let Some(email) = changes.email {
            separated.push("email = ");
            separated.push_bind_unseparated(email);
        }
        if let Some(role) = changes.role {
            separated.push("role = ");
            separated.push_bind_unseparated(role.as_str());
        }
        if let Some(password_hash) = changes.password_hash {
            separated.push("password = ");
            separated.push_bind_unseparated(password_hash);
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(" RETURNING ");
        builder.push(USER_COLUMNS);

        builder
            .build_query_as::<UserRow>()
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn delete_user(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn promote_user_level(&self, id: i64, from: Level, to: Level) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE users SET level = $1 WHERE id = $2 AND level = $3")
            .bind(to.as_str())
            .bind(id)
            .bind(from.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_module(&self, new: ModuleRequest) -> Result<Module, AppError> {
        let sql = format!(
            "INSERT INTO modules (title, content, image_url) VALUES ($1, $2, $3) RETURNING {}",
            MODULE_COLUMNS
        );
        let module = sqlx::query_as::<_, Module>(&sql)
            .bind(new.title)
            .bind(new.content)
            .bind(new.image_url)
            .fetch_one(&self.pool)
            .await?;
        Ok(module)
    }

    async fn get_module(&self, id: i64) -> Result<Option<Module>, AppError> {
        let sql = format!("SELECT {} FROM modules WHERE id = $1", MODULE_COLUMNS);
        let module = sqlx::query_as::<_, Module>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(module)
    }

    async fn list_modules(&self) -> Result<Vec<Module>, AppError> {
        let sql = format!("SELECT {} FROM modules ORDER BY id", MODULE_COLUMNS);
        let modules = sqlx::query_as::<_, Module>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(modules)
    }

    async fn update_module(&self, id: i64, changes: ModuleRequest) -> Result<Option<Module>, AppError> {
        let sql = format!(
            "UPDATE modules SET title = $1, content = $2, image_url = $3 WHERE id = $4 RETURNING {}",
            MODULE_COLUMNS
        );
        let module = sqlx::query_as::<_, Module>(&sql)
            .bind(changes.title)
            .bind(changes.content)
            .bind(changes.image_url)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(module)
    }

    async fn delete_module(&self, id: i64) -> Result<bool, AppError> {
        self.delete_content(ContentRef::module(id)).await
    }

    async fn create_quiz(&self, new: NewQuiz) -> Result<Quiz, AppError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO quizzes (title, type, pin, module_id) VALUES ($1, $2, $3, $4) RETURNING {}",
            QUIZ_COLUMNS
        );
        let row = sqlx::query_as::<_, QuizRow>(&sql)
            .bind(&new.title)
            .bind(new.access.kind())
            .bind(new.access.pin())
            .bind(new.access.module_id())
            .fetch_one(&mut *tx)
            .await?;

        let questions = Self::insert_questions(&mut *tx, row.id, &new.questions).await?;
        tx.commit().await?;

        row.into_quiz(questions)
    }

    async fn get_quiz(&self, id: i64) -> Result<Option<Quiz>, AppError> {
        let sql = format!("SELECT {} FROM quizzes WHERE id = $1", QUIZ_COLUMNS);
        let row = sqlx::query_as::<_, QuizRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let questions = self.questions_for(row.id).await?;
                row.into_quiz(questions).map(Some)
            }
            None => Ok(None),
        }
    }

    async fn list_quizzes(&self) -> Result<Vec<Quiz>, AppError> {
        let sql = format!("SELECT {} FROM quizzes ORDER BY id", QUIZ_COLUMNS);
        let rows = sqlx::query_as::<_, QuizRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {} FROM questions ORDER BY quiz_id, position, id",
            QUESTION_COLUMNS
        );
        let mut by_quiz: HashMap<i64, Vec<Question>> = HashMap::new();
        for row in sqlx::query_as::<_, QuestionRow>(&sql)
            .fetch_all(&self.pool)
            .await?
        {
            let question = Question::try_from(row)?;
            by_quiz.entry(question.quiz_id).or_default().push(question);
        }

        rows.into_iter()
            .map(|row| {
                let questions = by_quiz.remove(&row.id).unwrap_or_default();
                row.into_quiz(questions)
            })
            .collect()
    }

    async fn replace_quiz(&self, id: i64, new: NewQuiz) -> Result<Option<Quiz>, AppError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "UPDATE quizzes SET title = $1, type = $2, pin = $3, module_id = $4 WHERE id = $5 RETURNING {}",
            QUIZ_COLUMNS
        );
        let row = sqlx::query_as::<_, QuizRow>(&sql)
            .bind(&new.title)
            .bind(new.access.kind())
            .bind(new.access.pin())
            .bind(new.access.module_id())
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        // Dropping the transaction rolls it back.
        let Some(row) = row else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM questions WHERE quiz_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let questions = Self::insert_questions(&mut *tx, id, &new.questions).await?;
        tx.commit().await?;

        row.into_quiz(questions).map(Some)
    }

    async fn delete_quiz(&self, id: i64) -> Result<bool, AppError> {
        self.delete_content(ContentRef::quiz(id)).await
    }

    async fn create_simulation(&self, new: NewSimulation) -> Result<Simulation, AppError> {
        let sql = format!(
            "INSERT INTO simulations (title, description, steps) VALUES ($1, $2, $3) RETURNING {}",
            SIMULATION_COLUMNS
        );
        let row = sqlx::query_as::<_, SimulationRow>(&sql)
            .bind(&new.title)
            .bind(&new.description)
            .bind(Json(&new.steps))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn get_simulation(&self, id: i64) -> Result<Option<Simulation>, AppError> {
        let sql = format!("SELECT {} FROM simulations WHERE id = $1", SIMULATION_COLUMNS);
        let row = sqlx::query_as::<_, SimulationRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Simulation::from))
    }

    async fn list_simulations(&self) -> Result<Vec<Simulation>, AppError> {
        let sql = format!("SELECT {} FROM simulations ORDER BY id", SIMULATION_COLUMNS);
        let rows = sqlx::query_as::<_, SimulationRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Simulation::from).collect())
    }

    async fn update_simulation(
        &self,
        id: i64,
        new: NewSimulation,
    ) -> Result<Option<Simulation>, AppError> {
        let sql = format!(
            "UPDATE simulations SET title = $1, description = $2, steps = $3 WHERE id = $4 RETURNING {}",
            SIMULATION_COLUMNS
        );
        let row = sqlx::query_as::<_, SimulationRow>(&sql)
            .bind(&new.title)
            .bind(&new.description)
            .bind(Json(&new.steps))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Simulation::from))
    }

    async fn delete_simulation(&self, id: i64) -> Result<bool, AppError> {
        self.delete_content(ContentRef::simulation(id)).await
    }

    async fn content_exists(&self, content: ContentRef) -> Result<bool, AppError> {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)",
            content_table(content.kind)
        );
        let exists = sqlx::query_scalar::<_, bool>(&sql)
            .bind(content.id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn find_completed_progress(
        &self,
        user_id: i64,
        content: ContentRef,
    ) -> Result<Option<UserProgress>, AppError> {
        let sql = format!(
            "SELECT {} FROM user_progress
             WHERE user_id = $1 AND content_type = $2 AND content_id = $3 AND status = 'completed'",
            PROGRESS_COLUMNS
        );
        sqlx::query_as::<_, ProgressRow>(&sql)
            .bind(user_id)
            .bind(content.kind.as_str())
            .bind(content.id)
            .fetch_optional(&self.pool)
            .await?
            .map(UserProgress::try_from)
            .transpose()
    }

    async fn insert_progress(&self, new: NewProgress) -> Result<UserProgress, AppError> {
        let sql = format!(
            "INSERT INTO user_progress (user_id, content_type, content_id, status, score, time_taken)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            PROGRESS_COLUMNS
        );
        let row = sqlx::query_as::<_, ProgressRow>(&sql)
            .bind(new.user_id)
            .bind(new.content.kind.as_str())
            .bind(new.content.id)
            .bind(new.status.as_str())
            .bind(new.score)
            .bind(new.time_taken)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match AppError::from(e) {
                // Partial unique index on completed rows
                AppError::Conflict(_) => {
                    AppError::AlreadyCompleted(format!("{} already completed", new.content))
                }
                other => other,
            })?;
        UserProgress::try_from(row)
    }

    async fn list_progress(&self, user_id: i64) -> Result<Vec<UserProgress>, AppError> {
        let sql = format!(
            "SELECT {} FROM user_progress WHERE user_id = $1 ORDER BY completed_at DESC, id DESC",
            PROGRESS_COLUMNS
        );
        sqlx::query_as::<_, ProgressRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(UserProgress::try_from)
            .collect()
    }

    async fn completion_counts(&self, user_id: i64) -> Result<CompletionCounts, AppError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT content_type, COUNT(DISTINCT content_id)
            FROM user_progress
            WHERE user_id = $1 AND status = 'completed'
            GROUP BY content_type
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut counts = CompletionCounts::default();
        for (kind, count) in rows {
            match parse_column::<ContentKind>(&kind)? {
                ContentKind::Module => counts.modules = count,
                ContentKind::Quiz => counts.quizzes = count,
                ContentKind::Simulation => counts.simulations = count,
            }
        }
        Ok(counts)
    }

    async fn insert_quiz_result(&self, new: NewQuizResult) -> Result<QuizResult, AppError> {
        let sql = format!(
            "INSERT INTO quiz_results (quiz_id, user_id, score, answers) VALUES ($1, $2, $3, $4) RETURNING {}",
            RESULT_COLUMNS
        );
        let row = sqlx::query_as::<_, QuizResultRow>(&sql)
            .bind(new.quiz_id)
            .bind(new.user_id)
            .bind(new.score)
            .bind(Json(&new.answers))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn list_quiz_results(&self, quiz_id: i64) -> Result<Vec<QuizResult>, AppError> {
        let sql = format!(
            "SELECT {} FROM quiz_results WHERE quiz_id = $1 ORDER BY created_at DESC, id DESC",
            RESULT_COLUMNS
        );
        let rows = sqlx::query_as::<_, QuizResultRow>(&sql)
            .bind(quiz_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(QuizResult::from).collect())
    }

    async fn upsert_assignment(
        &self,
        user_id: i64,
        content: ContentRef,
        status: AssignmentStatus,
    ) -> Result<Assignment, AppError> {
        let sql = format!(
            "INSERT INTO assignments (user_id, content_type, content_id, status)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, content_type, content_id) DO UPDATE SET
                 status = EXCLUDED.status,
                 updated_at = CURRENT_TIMESTAMP
             RETURNING {}",
            ASSIGNMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, AssignmentRow>(&sql)
            .bind(user_id)
            .bind(content.kind.as_str())
            .bind(content.id)
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?;
        Assignment::try_from(row)
    }

    async fn mark_assignment_done(&self, user_id: i64, content: ContentRef) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE assignments SET status = 'done', updated_at = CURRENT_TIMESTAMP
            WHERE user_id = $1 AND content_type = $2 AND content_id = $3
            "#,
        )
        .bind(user_id)
        .bind(content.kind.as_str())
        .bind(content.id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_assignments(&self, user_id: Option<i64>) -> Result<Vec<Assignment>, AppError> {
        let sql = format!(
            "SELECT {} FROM assignments WHERE ($1::BIGINT IS NULL OR user_id = $1) ORDER BY id DESC",
            ASSIGNMENT_COLUMNS
        );
        sqlx::query_as::<_, AssignmentRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Assignment::try_from)
            .collect()
    }

    async fn delete_assignment(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM assignments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
