//! Application state - shared across all handlers.

use std::sync::Arc;

use postboard_core::domain::{ActivationPolicy, PatchPolicy};
use postboard_core::error::RepoError;
use postboard_core::ports::{AuthError, PasswordService, PostRepository, TokenService, UserRepository};
use postboard_infra::{
    Argon2PasswordService, DatabaseConfig, InMemoryPostRepository, InMemoryUserRepository,
    JwtTokenService,
};

use crate::config::{AppConfig, ConfigError};

/// Errors raised while building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("store initialization failed: {0}")]
    Store(#[from] RepoError),

    #[error("auth setup failed: {0}")]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

type Store = (Arc<dyn UserRepository>, Arc<dyn PostRepository>);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub accounts: ActivationPolicy,
    pub post_patch: Arc<PatchPolicy>,
    pub public_base_url: Arc<str>,
}

impl AppState {
    /// Build the application state, provisioning the configured store.
    pub async fn new(config: &AppConfig) -> Result<Self, StartupError> {
        let (users, posts) = match &config.database {
            Some(db_config) => sql_store(db_config).await?,
            None => {
                tracing::info!("DATABASE_URL not set. Using auto-provisioned in-memory store.");
                in_memory_store()
            }
        };

        Self::with_store(config, users, posts)
    }

    /// State backed by a fresh in-memory store.
    pub fn in_memory(config: &AppConfig) -> Result<Self, StartupError> {
        let (users, posts) = in_memory_store();
        Self::with_store(config, users, posts)
    }

    /// State over the given repositories.
    pub fn with_store(
        config: &AppConfig,
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
    ) -> Result<Self, StartupError> {
        let passwords = Argon2PasswordService::with_config(config.hashing)?;
        let tokens = JwtTokenService::new(config.jwt.clone());

        tracing::info!(
            require_activation = config.accounts.require_activation,
            token_ttl_secs = config.jwt.expiration_secs,
            "Application state initialized"
        );

        Ok(Self {
            users,
            posts,
            tokens: Arc::new(tokens),
            passwords: Arc::new(passwords),
            accounts: config.accounts,
            post_patch: Arc::new(config.post_patch.clone()),
            public_base_url: Arc::from(config.public_base_url.as_str()),
        })
    }

    pub fn activation_link(&self, user_id: uuid::Uuid) -> String {
        format!("{}/api/v1/users/activate/{}", self.public_base_url, user_id)
    }
}

fn in_memory_store() -> Store {
    let users: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
    let posts: Arc<dyn PostRepository> = Arc::new(InMemoryPostRepository::new());
    (users, posts)
}

#[cfg(feature = "database")]
async fn sql_store(config: &DatabaseConfig) -> Result<Store, StartupError> {
    let db = postboard_infra::Database::init(config).await?;
    let users: Arc<dyn UserRepository> = Arc::new(db.users());
    let posts: Arc<dyn PostRepository> = Arc::new(db.posts());
    Ok((users, posts))
}

#[cfg(not(feature = "database"))]
async fn sql_store(_config: &DatabaseConfig) -> Result<Store, StartupError> {
    Err(ConfigError::DatabaseUnsupported.into())
}
