// src/models/mod.rs

pub mod assignment;
pub mod module;
pub mod progress;
pub mod quiz;
pub mod quiz_result;
pub mod simulation;
pub mod user;
