// src/models/mod.rs

pub mod completion;
pub mod response;
pub mod scenario;
pub mod survey;
pub mod user;
