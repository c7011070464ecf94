// tests/api_tests.rs

use std::sync::Arc;

use cyberaware::{
    config::Config,
    models::user::{NewUser, Role},
    routes,
    state::AppState,
    store::{MemoryStore, Store},
    utils::hash::hash_password,
};
use serde_json::{Value, json};

const ADMIN_PASSWORD: &str = "admin-password";

struct TestApp {
    address: String,
    client: reqwest::Client,
    admin_token: String,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Registers a fresh learner and returns its token.
    async fn learner(&self) -> String {
        self.named_learner().await.0
    }

    /// Registers a fresh learner and returns its token and username.
    async fn named_learner(&self) -> (String, String) {
        let username = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);
        let response = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": "password123"
            }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);
        let token = login(&self.client, &self.address, &username, "password123").await;
        (token, username)
    }

    async fn get_json(&self, path: &str, token: &str) -> Value {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
            .json()
            .await
            .unwrap()
    }

    async fn assign(&self, username: &str, content_type: &str, content_id: i64) -> Value {
        let response = self
            .admin_post(
                "/api/admin/assignments",
                json!({
                    "username": username,
                    "content_type": content_type,
                    "content_id": content_id
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.unwrap()
    }

    async fn admin_post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(&self.admin_token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    async fn create(&self, path: &str, body: Value) -> i64 {
        let response = self.admin_post(path, body).await;
        assert_eq!(response.status().as_u16(), 201);
        let created: Value = response.json().await.unwrap();
        created["id"].as_i64().unwrap()
    }

    async fn create_module(&self) -> i64 {
        self.create(
            "/api/admin/modules",
            json!({ "title": "Phishing 101", "content": "<p>Check the sender.</p>" }),
        )
        .await
    }

    async fn create_quiz(&self, access: Value) -> i64 {
        self.create(
            "/api/admin/quizzes",
            json!({
                "title": "Spot the phish",
                "access": access,
                "questions": [
                    { "type": "true_false", "text": "HTTPS means safe?", "correct": "false", "feedback": "Anyone can get a cert." },
                    { "type": "multiple_choice", "text": "Best reaction?", "options": ["Click", "Report"], "correct": "Report" }
                ]
            }),
        )
        .await
    }

    async fn create_simulation(&self) -> i64 {
        self.create(
            "/api/admin/simulations",
            json!({
                "title": "Suspicious email",
                "description": "An invoice arrives from an unknown sender.",
                "steps": [
                    {
                        "scenario": "Open the attachment?",
                        "options": ["Open", "Verify sender"],
                        "next_step": [null, 1],
                        "outcomes": ["data breach", null]
                    },
                    {
                        "scenario": "The sender is spoofed. Next?",
                        "options": ["Report to IT"],
                        "next_step": [null],
                        "outcomes": ["success"]
                    }
                ]
            }),
        )
        .await
    }

    async fn quiz_question_ids(&self, quiz_id: i64) -> Vec<i64> {
        let quiz: Value = self
            .client
            .get(self.url(&format!("/api/admin/quizzes/{}", quiz_id)))
            .bearer_auth(&self.admin_token)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        quiz["questions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|q| q["id"].as_i64().unwrap())
            .collect()
    }

    /// Answers both questions of `create_quiz` correctly.
    async fn passing_answers(&self, quiz_id: i64) -> Value {
        let ids = self.quiz_question_ids(quiz_id).await;
        json!({ ids[0].to_string(): "false", ids[1].to_string(): "Report" })
    }
}

async fn login(client: &reqwest::Client, address: &str, username: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

/// Spawns the app on a random port backed by the in-memory store,
/// with one admin account already seeded.
async fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    store
        .create_user(NewUser {
            username: "root_admin".to_string(),
            email: "admin@example.com".to_string(),
            password_hash: hash_password(ADMIN_PASSWORD).unwrap(),
            role: Role::Admin,
        })
        .await
        .unwrap();

    let config = Config {
        database_url: "memory".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        port: 0,
        admin_username: None,
        admin_password: None,
        admin_email: None,
    };

    let app = routes::create_router(AppState::new(store, config));

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::new();
    let admin_token = login(&client, &address, "root_admin", ADMIN_PASSWORD).await;

    TestApp {
        address,
        client,
        admin_token,
    }
}

#[tokio::test]
async fn health_check_404() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/random_path_that_does_not_exist"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_fails_validation() {
    let app = spawn_app().await;

    // Username too short
    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({ "username": "yo", "email": "yo@example.com", "password": "password123" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "username": "root_admin", "password": "nope" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn admin_routes_require_admin_role() {
    let app = spawn_app().await;
    let token = app.learner().await;

    let anonymous = app.client.get(app.url("/api/admin/users")).send().await.unwrap();
    assert_eq!(anonymous.status().as_u16(), 401);

    let learner = app
        .client
        .get(app.url("/api/admin/users"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(learner.status().as_u16(), 403);

    let admin = app
        .client
        .get(app.url("/api/admin/users"))
        .bearer_auth(&app.admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(admin.status().as_u16(), 200);
}

#[tokio::test]
async fn completing_a_module_twice_is_a_conflict() {
    let app = spawn_app().await;
    let token = app.learner().await;
    let module_id = app.create_module().await;
    let url = app.url(&format!("/api/modules/{}/complete", module_id));

    let first = app.client.post(&url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(first.status().as_u16(), 200);
    let body: Value = first.json().await.unwrap();
    assert_eq!(body["status"], "completed");
    assert_eq!(body["score"], 100);

    let second = app.client.post(&url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(second.status().as_u16(), 409);

    let progress = app.get_json("/api/progress/me", &token).await;
    let records = progress["records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["status"], "completed");
    assert_eq!(records[0]["score"], 100);
}

#[tokio::test]
async fn simulation_walks_to_success() {
    let app = spawn_app().await;
    let token = app.learner().await;
    let sim_id = app.create_simulation().await;
    let url = app.url(&format!("/api/simulations/{}/advance", sim_id));

    // Step 0, "Verify sender" moves on without recording anything
    let moved: Value = app
        .client
        .post(&url)
        .bearer_auth(&token)
        .json(&json!({ "current_step": 0, "option_index": 1, "elapsed_seconds": 7 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(moved["next_step"], 1);
    assert_eq!(moved["time_taken"], 0);
    assert!(moved["outcome"].is_null());

    let progress: Value = app
        .client
        .get(app.url("/api/progress/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(progress["records"].as_array().unwrap().len(), 0);

    let finished: Value = app
        .client
        .post(&url)
        .bearer_auth(&token)
        .json(&json!({ "current_step": 1, "option_index": 0, "elapsed_seconds": 4 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(finished["outcome"], "success");
    assert_eq!(finished["score"], 100);
    assert_eq!(finished["status"], "completed");
    assert_eq!(finished["time_taken"], 4);

    // Replaying the terminal choice cannot complete it again
    let replay = app
        .client
        .post(&url)
        .bearer_auth(&token)
        .json(&json!({ "current_step": 1, "option_index": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(replay.status().as_u16(), 409);

    let progress = app.get_json("/api/progress/me", &token).await;
    let records = progress["records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["score"], 100);
    assert_eq!(records[0]["time_taken"], 4);
}

#[tokio::test]
async fn simulation_breach_fails_and_bad_index_is_rejected() {
    let app = spawn_app().await;
    let token = app.learner().await;
    let sim_id = app.create_simulation().await;
    let url = app.url(&format!("/api/simulations/{}/advance", sim_id));

    let breach: Value = app
        .client
        .post(&url)
        .bearer_auth(&token)
        .json(&json!({ "current_step": 0, "option_index": 0 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(breach["outcome"], "data breach");
    assert_eq!(breach["status"], "failed");
    assert_eq!(breach["score"], 0);

    let out_of_range = app
        .client
        .post(&url)
        .bearer_auth(&token)
        .json(&json!({ "current_step": 0, "option_index": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(out_of_range.status().as_u16(), 400);
}

#[tokio::test]
async fn simulations_require_login() {
    let app = spawn_app().await;
    let sim_id = app.create_simulation().await;

    let response = app
        .client
        .get(app.url(&format!("/api/simulations/{}", sim_id)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn rejects_simulation_with_dangling_next_step() {
    let app = spawn_app().await;

    let response = app
        .admin_post(
            "/api/admin/simulations",
            json!({
                "title": "Broken",
                "steps": [
                    { "scenario": "Go?", "options": ["Yes"], "next_step": [3], "outcomes": [null] }
                ]
            }),
        )
        .await;

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn anonymous_visitor_can_take_public_quiz() {
    let app = spawn_app().await;
    let quiz_id = app.create_quiz(json!({ "type": "public" })).await;

    let view: Value = app
        .client
        .get(app.url(&format!("/api/quizzes/{}", quiz_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let questions = view["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    assert!(questions.iter().all(|q| q.get("correct").is_none()));

    let answers = app.passing_answers(quiz_id).await;
    let result: Value = app
        .client
        .post(app.url(&format!("/api/quizzes/{}/submit", quiz_id)))
        .json(&json!({ "answers": answers }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(result["passed"], true);
    assert_eq!(result["correct_count"], 2);
    assert!(result["status"].is_null());

    let results: Value = app
        .client
        .get(app.url(&format!("/api/admin/quizzes/{}/results", quiz_id)))
        .bearer_auth(&app.admin_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(results.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn module_linked_quiz_needs_a_session() {
    let app = spawn_app().await;
    let module_id = app.create_module().await;
    let quiz_id = app
        .create_quiz(json!({ "type": "module_linked", "module_id": module_id }))
        .await;
    let url = app.url(&format!("/api/quizzes/{}", quiz_id));

    let anonymous = app.client.get(&url).send().await.unwrap();
    assert_eq!(anonymous.status().as_u16(), 401);

    let token = app.learner().await;
    let signed_in = app.client.get(&url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(signed_in.status().as_u16(), 200);
}

#[tokio::test]
async fn pin_protected_quiz_flow() {
    let app = spawn_app().await;

    let short_pin = app
        .admin_post(
            "/api/admin/quizzes",
            json!({
                "title": "Short pin",
                "access": { "type": "pin_protected", "pin": "12" },
                "questions": [{ "type": "true_false", "text": "?", "correct": "true" }]
            }),
        )
        .await;
    assert_eq!(short_pin.status().as_u16(), 400);

    let quiz_id = app
        .create_quiz(json!({ "type": "pin_protected", "pin": "4321" }))
        .await;
    let token = app.learner().await;

    let no_pin = app
        .client
        .get(app.url(&format!("/api/quizzes/{}", quiz_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(no_pin.status().as_u16(), 403);

    let wrong = app
        .client
        .post(app.url(&format!("/api/quizzes/{}/unlock", quiz_id)))
        .json(&json!({ "pin": "0000" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status().as_u16(), 403);
    let body: Value = wrong.json().await.unwrap();
    assert_eq!(body["error"], "Incorrect PIN");

    let unlocked = app
        .client
        .post(app.url(&format!("/api/quizzes/{}/unlock", quiz_id)))
        .json(&json!({ "pin": "4321" }))
        .send()
        .await
        .unwrap();
    assert_eq!(unlocked.status().as_u16(), 200);

    let answers = app.passing_answers(quiz_id).await;
    let submitted: Value = app
        .client
        .post(app.url(&format!("/api/quizzes/{}/submit", quiz_id)))
        .bearer_auth(&token)
        .json(&json!({ "answers": answers, "pin": "4321", "time_taken": 30 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(submitted["passed"], true);
    assert_eq!(submitted["status"], "completed");
}

#[tokio::test]
async fn failed_quiz_can_be_retried_until_passed() {
    let app = spawn_app().await;
    let token = app.learner().await;
    let quiz_id = app.create_quiz(json!({ "type": "public" })).await;
    let ids = app.quiz_question_ids(quiz_id).await;
    let url = app.url(&format!("/api/quizzes/{}/submit", quiz_id));

    // 1 of 2 correct is below the pass mark
    let failed: Value = app
        .client
        .post(&url)
        .bearer_auth(&token)
        .json(&json!({ "answers": { ids[0].to_string(): "false", ids[1].to_string(): "Click" } }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(failed["passed"], false);
    assert_eq!(failed["status"], "failed");
    assert!(
        failed["feedback"][1]
            .as_str()
            .unwrap()
            .starts_with("Incorrect. The correct answer is \"Report\".")
    );

    let passed: Value = app
        .client
        .post(&url)
        .bearer_auth(&token)
        .json(&json!({ "answers": app.passing_answers(quiz_id).await }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(passed["status"], "completed");
    assert_eq!(passed["already_completed"], false);

    let again: Value = app
        .client
        .post(&url)
        .bearer_auth(&token)
        .json(&json!({ "answers": app.passing_answers(quiz_id).await }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(again["already_completed"], true);
    assert!(again["status"].is_null());
}

#[tokio::test]
async fn assignment_turns_done_on_completion() {
    let app = spawn_app().await;
    let token = app.learner().await;
    let module_id = app.create_module().await;

    let users: Value = app
        .client
        .get(app.url("/api/admin/users"))
        .bearer_auth(&app.admin_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let learner = users
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["role"] == "user")
        .unwrap()
        .clone();

    let assigned = app
        .admin_post(
            "/api/admin/assignments",
            json!({
                "username": learner["username"],
                "content_type": "module",
                "content_id": module_id
            }),
        )
        .await;
    assert_eq!(assigned.status().as_u16(), 201);
    let assigned: Value = assigned.json().await.unwrap();
    assert_eq!(assigned["status"], "pending");

    app.client
        .post(app.url(&format!("/api/modules/{}/complete", module_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    let mine: Value = app
        .client
        .get(app.url("/api/assignments/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let mine = mine.as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["status"], "done");

    // Re-assigning already completed content starts out done
    let reassigned: Value = app
        .admin_post(
            "/api/admin/assignments",
            json!({
                "user_id": learner["id"],
                "content_type": "module",
                "content_id": module_id
            }),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(reassigned["status"], "done");
}

#[tokio::test]
async fn assignment_to_missing_content_is_not_found() {
    let app = spawn_app().await;
    app.learner().await;

    let response = app
        .admin_post(
            "/api/admin/assignments",
            json!({ "user_id": 1, "content_type": "quiz", "content_id": 999 }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn learner_levels_up_once_targets_are_met() {
    let app = spawn_app().await;
    let token = app.learner().await;

    let modules = [app.create_module().await, app.create_module().await];
    let quizzes = [
        app.create_quiz(json!({ "type": "public" })).await,
        app.create_quiz(json!({ "type": "public" })).await,
    ];
    let sim_id = app.create_simulation().await;

    for module_id in modules {
        app.client
            .post(app.url(&format!("/api/modules/{}/complete", module_id)))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
    }
    for quiz_id in quizzes {
        let answers = app.passing_answers(quiz_id).await;
        let result: Value = app
            .client
            .post(app.url(&format!("/api/quizzes/{}/submit", quiz_id)))
            .bearer_auth(&token)
            .json(&json!({ "answers": answers }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(result["level_up"].is_null());
    }

    let url = app.url(&format!("/api/simulations/{}/advance", sim_id));
    app.client
        .post(&url)
        .bearer_auth(&token)
        .json(&json!({ "current_step": 0, "option_index": 1 }))
        .send()
        .await
        .unwrap();
    let finished: Value = app
        .client
        .post(&url)
        .bearer_auth(&token)
        .json(&json!({ "current_step": 1, "option_index": 0 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(finished["level_up"]["to"], "intermediate");

    let progress: Value = app
        .client
        .get(app.url("/api/progress/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(progress["level"], "intermediate");
    assert!(progress["username"].as_str().unwrap().starts_with("u_"));
    assert_eq!(progress["completed"]["simulations"], 1);
    // Each kind is capped at its target, so a promoted learner sits at 60%
    assert!((progress["percentage"].as_f64().unwrap() - 60.0).abs() < 1e-9);
    // The promotion message is only handed out once
    assert!(progress["level_up"].is_null());
}

#[tokio::test]
async fn empty_answer_set_is_a_failing_attempt() {
    let app = spawn_app().await;
    let token = app.learner().await;
    let quiz_id = app.create_quiz(json!({ "type": "public" })).await;

    let response = app
        .client
        .post(app.url(&format!("/api/quizzes/{}/submit", quiz_id)))
        .bearer_auth(&token)
        .json(&json!({ "answers": {} }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let result: Value = response.json().await.unwrap();
    assert_eq!(result["passed"], false);
    assert_eq!(result["correct_count"], 0);
    assert_eq!(result["status"], "failed");
    assert_eq!(result["feedback"].as_array().unwrap().len(), 2);

    let results = app
        .get_json(&format!("/api/admin/quizzes/{}/results", quiz_id), &app.admin_token)
        .await;
    assert_eq!(results.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn replacing_a_quiz_swaps_the_question_set() {
    let app = spawn_app().await;
    let quiz_id = app.create_quiz(json!({ "type": "public" })).await;
    let old_answers = app.passing_answers(quiz_id).await;

    let response = app
        .client
        .put(app.url(&format!("/api/admin/quizzes/{}", quiz_id)))
        .bearer_auth(&app.admin_token)
        .json(&json!({
            "title": "Who do you call?",
            "access": { "type": "public" },
            "questions": [
                { "type": "multiple_choice", "text": "Lost laptop?", "options": ["IT desk", "Nobody"], "correct": "IT desk" }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let view: Value = app
        .client
        .get(app.url(&format!("/api/quizzes/{}", quiz_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["title"], "Who do you call?");
    let questions = view["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0]["text"], "Lost laptop?");

    let submit_url = app.url(&format!("/api/quizzes/{}/submit", quiz_id));

    // Answers keyed by the replaced question ids no longer count
    let stale: Value = app
        .client
        .post(&submit_url)
        .json(&json!({ "answers": old_answers }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stale["correct_count"], 0);
    assert_eq!(stale["total_questions"], 1);
    assert_eq!(stale["passed"], false);

    let new_id = app.quiz_question_ids(quiz_id).await[0];
    let fresh: Value = app
        .client
        .post(&submit_url)
        .json(&json!({ "answers": { new_id.to_string(): "IT desk" } }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fresh["passed"], true);
}

#[tokio::test]
async fn deleting_content_removes_its_progress_and_assignments() {
    let app = spawn_app().await;
    let (token, username) = app.named_learner().await;
    let module_id = app.create_module().await;

    let updated = app
        .client
        .put(app.url(&format!("/api/admin/modules/{}", module_id)))
        .bearer_auth(&app.admin_token)
        .json(&json!({ "title": "Phishing 102", "content": "<p>Hover before you click.</p>" }))
        .send()
        .await
        .unwrap();
    assert_eq!(updated.status().as_u16(), 200);
    let updated: Value = updated.json().await.unwrap();
    assert_eq!(updated["title"], "Phishing 102");

    app.assign(&username, "module", module_id).await;
    app.client
        .post(app.url(&format!("/api/modules/{}/complete", module_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    let deleted = app
        .client
        .delete(app.url(&format!("/api/admin/modules/{}", module_id)))
        .bearer_auth(&app.admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 204);

    let gone = app
        .client
        .get(app.url(&format!("/api/modules/{}", module_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status().as_u16(), 404);

    let progress = app.get_json("/api/progress/me", &token).await;
    assert_eq!(progress["records"].as_array().unwrap().len(), 0);
    assert_eq!(progress["completed"]["modules"], 0);

    let mine = app.get_json("/api/assignments/me", &token).await;
    assert_eq!(mine.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn failed_attempts_leave_assignments_pending() {
    let app = spawn_app().await;
    let (token, username) = app.named_learner().await;
    let sim_id = app.create_simulation().await;
    let quiz_id = app.create_quiz(json!({ "type": "public" })).await;

    app.assign(&username, "simulation", sim_id).await;
    app.assign(&username, "quiz", quiz_id).await;

    let breach: Value = app
        .client
        .post(app.url(&format!("/api/simulations/{}/advance", sim_id)))
        .bearer_auth(&token)
        .json(&json!({ "current_step": 0, "option_index": 0 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(breach["status"], "failed");

    let failed: Value = app
        .client
        .post(app.url(&format!("/api/quizzes/{}/submit", quiz_id)))
        .bearer_auth(&token)
        .json(&json!({ "answers": {} }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(failed["status"], "failed");

    let mine = app.get_json("/api/assignments/me", &token).await;
    let mine = mine.as_array().unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|a| a["status"] == "pending"));
}
