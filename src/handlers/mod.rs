// src/handlers/mod.rs

pub mod analytics;
pub mod auth;
pub mod evaluation;
pub mod submission;
