//! Middleware modules.

pub mod auth;
pub mod error;

pub use auth::{AuthGate, Identity};
pub use error::{AppError, AppResult};
