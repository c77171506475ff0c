// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod completion;
pub mod quiz;
pub mod scenario;
pub mod survey;
