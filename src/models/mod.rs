// src/models/mod.rs

pub mod attempt;
pub mod evaluation;
pub mod question;
pub mod user;
