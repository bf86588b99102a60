//! # Postboard Core
//!
//! The domain layer of the Postboard service: users, posts, their validation
//! rules and the ports infrastructure has to implement.
//! This crate contains pure business logic with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod validation;

pub use error::{DomainError, RepoError};
pub use validation::{FieldError, ValidationErrors};
