//! # Postboard Infrastructure
//!
//! Concrete implementations of the ports defined in `postboard-core`.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - In-memory store only
//! - `database` - SQL-backed store via SeaORM (sqlite or postgres)

pub mod auth;
pub mod database;

pub use auth::{Argon2PasswordService, HashingConfig, JwtConfig, JwtTokenService};
pub use database::{DatabaseConfig, InMemoryPostRepository, InMemoryUserRepository};

#[cfg(feature = "database")]
pub use database::{Database, SqlPostRepository, SqlUserRepository};
