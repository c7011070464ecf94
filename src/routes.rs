// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, assignments, auth, modules, progress, quizzes, simulations},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware, optional_auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, modules, quizzes, simulations, learner, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (store and config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let module_routes = Router::new()
        .route("/", get(modules::list_modules))
        .route("/{id}", get(modules::get_module))
        .merge(
            Router::new()
                .route("/{id}/complete", post(modules::complete_module))
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        );

    // Anonymous visitors may take public quizzes; a token, when present,
    // unlocks module-linked ones and records progress.
    let quiz_routes = Router::new()
        .route("/", get(quizzes::list_quizzes))
        .route("/{id}", get(quizzes::get_quiz))
        .route("/{id}/unlock", post(quizzes::unlock_quiz))
        .route("/{id}/submit", post(quizzes::submit_quiz))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ));

    let simulation_routes = Router::new()
        .route("/", get(simulations::list_simulations))
        .route("/{id}", get(simulations::get_simulation))
        .route("/{id}/advance", post(simulations::advance))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let learner_routes = Router::new()
        .route("/progress/me", get(progress::get_my_progress))
        .route("/assignments/me", get(assignments::list_my_assignments))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/users/{id}",
            put(admin::update_user).delete(admin::delete_user),
        )
        .route("/users/{id}/progress", get(admin::user_progress))
        .route("/modules", post(modules::create_module))
        .route(
            "/modules/{id}",
            put(modules::update_module).delete(modules::delete_module),
        )
        .route("/quizzes", post(quizzes::create_quiz))
        .route(
            "/quizzes/{id}",
            get(quizzes::get_quiz_admin)
                .put(quizzes::update_quiz)
                .delete(quizzes::delete_quiz),
        )
        .route("/quizzes/{id}/results", get(quizzes::list_results))
        .route("/simulations", post(simulations::create_simulation))
        .route(
            "/simulations/{id}",
            put(simulations::update_simulation)
                .delete(simulations::delete_simulation),
        )
        .route(
            "/assignments",
            get(assignments::list_assignments).post(assignments::upsert_assignment),
        )
        .route(
            "/assignments/{id}",
            delete(assignments::delete_assignment),
        )
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/modules", module_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/simulations", simulation_routes)
        .nest("/api", learner_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
