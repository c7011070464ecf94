// src/config.rs

use std::env;

use dotenvy::dotenv;

/// Share of questions that must be answered correctly to pass a quiz, in percent.
pub const QUIZ_PASS_PERCENTAGE: usize = 70;

/// Score recorded for a fully completed module or a successful simulation.
pub const FULL_SCORE: i32 = 100;

/// Shortest PIN accepted for pin-protected quizzes.
pub const MIN_PIN_LENGTH: usize = 4;

/// Completion targets for leaving the beginner level.
pub const TARGET_SIMULATIONS: i64 = 1;
pub const TARGET_QUIZZES: i64 = 2;
pub const TARGET_MODULES: i64 = 2;

/// Value of `DATABASE_URL` that selects the in-process store.
pub const MEMORY_DATABASE_URL: &str = "memory";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub admin_email: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set".to_string())?;

        let jwt_expiration = match env::var("JWT_EXPIRATION") {
            Ok(raw) => raw
                .parse::<u64>()
                .map_err(|e| format!("JWT_EXPIRATION must be a number of seconds: {}", e))?,
            Err(_) => 86_400,
        };

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|e| format!("PORT must be a valid port number: {}", e))?,
            Err(_) => 3000,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            port,
            admin_username: env::var("ADMIN_USERNAME").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            admin_email: env::var("ADMIN_EMAIL").ok(),
        })
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_DATABASE_URL
    }
}
