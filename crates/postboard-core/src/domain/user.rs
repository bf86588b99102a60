use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::ValidationErrors;

/// User entity - an account that can log in once usable.
///
/// `password_hash` only ever holds the output of a one-way hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub bio: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with generated ID and timestamps.
    pub fn new(
        name: String,
        email: String,
        password_hash: String,
        bio: Option<String>,
        active: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            bio,
            active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the account usable. Returns `false` if it already was.
    pub fn activate(&mut self) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        self.updated_at = Utc::now();
        true
    }
}

/// Registration input before the password is hashed.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub bio: Option<String>,
}

impl Registration {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("name", &self.name);
        errors.require("email", &self.email);
        if !self.email.trim().is_empty() && !self.email.contains('@') {
            errors.add("email", "email must be a valid address");
        }
        errors.require("password", &self.password);
        errors.into_result()
    }
}

/// Whether new accounts need an explicit activation step before login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationPolicy {
    pub require_activation: bool,
}

impl Default for ActivationPolicy {
    fn default() -> Self {
        Self {
            require_activation: true,
        }
    }
}

impl ActivationPolicy {
    /// The `active` flag a freshly registered account starts with.
    pub fn initial_active(&self) -> bool {
        !self.require_activation
    }

    pub fn permits_login(&self, user: &User) -> bool {
        user.active || !self.require_activation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(email: &str) -> Registration {
        Registration {
            name: "Alice".to_string(),
            email: email.to_string(),
            password: "hunter22".to_string(),
            bio: None,
        }
    }

    #[test]
    fn test_registration_requires_valid_email() {
        assert!(registration("alice@example.com").validate().is_ok());

        let errors = registration("alice").validate().unwrap_err();
        assert!(errors.has("email"));

        let errors = registration("").validate().unwrap_err();
        assert_eq!(errors.errors().len(), 1);
    }

    #[test]
    fn test_activation_policy() {
        let strict = ActivationPolicy {
            require_activation: true,
        };
        let mut user = User::new(
            "Alice".into(),
            "alice@example.com".into(),
            "hash".into(),
            None,
            strict.initial_active(),
        );
        assert!(!strict.permits_login(&user));

        assert!(user.activate());
        assert!(!user.activate());
        assert!(strict.permits_login(&user));

        let open = ActivationPolicy {
            require_activation: false,
        };
        assert!(open.initial_active());
    }
}
