// src/services/mod.rs

pub mod access;
pub mod completion;
pub mod leveling;
pub mod scoring;
pub mod simulation;
