// src/error/mod.rs
//
// Application error types shared by every layer.

pub mod types;

pub use types::{AppError, AppResult};
