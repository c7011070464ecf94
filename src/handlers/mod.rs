// src/handlers/mod.rs

pub mod admin;
pub mod assignments;
pub mod auth;
pub mod modules;
pub mod progress;
pub mod quizzes;
pub mod simulations;
