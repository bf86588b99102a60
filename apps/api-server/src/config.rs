//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

use postboard_core::domain::{ActivationPolicy, PatchPolicy, UnknownField};
use postboard_infra::{DatabaseConfig, HashingConfig, JwtConfig};

/// Configuration that prevents the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("POST_PATCH_FIELDS contains an {0}")]
    PatchFields(#[from] UnknownField),

    #[error("JWT_SECRET must be set when RUST_ENV is production")]
    DefaultSecretInProduction,

    #[error("DATABASE_URL is set but the server was built without the `database` feature")]
    DatabaseUnsupported,
}

/// Application configuration, built once at startup and handed to `AppState`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` selects the auto-provisioned in-memory store.
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    pub hashing: HashingConfig,
    pub accounts: ActivationPolicy,
    pub post_patch: PatchPolicy,
    /// Prefix of the activation link written to the log.
    pub public_base_url: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_or(&lookup, "PORT", 8000u16);

        let database = lookup("DATABASE_URL").map(|url| DatabaseConfig {
            url,
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10),
        });

        let jwt_defaults = JwtConfig::default();
        let jwt = JwtConfig {
            secret: lookup("JWT_SECRET").unwrap_or(jwt_defaults.secret),
            expiration_secs: parse_or(&lookup, "JWT_EXPIRATION_SECS", jwt_defaults.expiration_secs),
            issuer: lookup("JWT_ISSUER").unwrap_or(jwt_defaults.issuer),
        };

        if jwt.uses_default_secret() {
            let is_production = lookup("RUST_ENV")
                .map(|v| v == "production" || v == "prod")
                .unwrap_or(false);

            if is_production {
                return Err(ConfigError::DefaultSecretInProduction);
            }
            tracing::warn!("Using default JWT secret. Set JWT_SECRET for production use.");
        }

        let hashing_defaults = HashingConfig::default();
        let hashing = HashingConfig {
            memory_kib: parse_or(&lookup, "PASSWORD_HASH_MEMORY_KIB", hashing_defaults.memory_kib),
            iterations: parse_or(&lookup, "PASSWORD_HASH_ITERATIONS", hashing_defaults.iterations),
            parallelism: parse_or(&lookup, "PASSWORD_HASH_PARALLELISM", hashing_defaults.parallelism),
        };

        let accounts = ActivationPolicy {
            require_activation: lookup("REQUIRE_ACTIVATION")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        };

        let post_patch = match lookup("POST_PATCH_FIELDS") {
            Some(names) => PatchPolicy::from_names(&names)?,
            None => PatchPolicy::allow_all(),
        };

        let public_base_url = lookup("PUBLIC_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://{host}:{port}"));

        Ok(Self {
            host,
            port,
            database,
            jwt,
            hashing,
            accounts,
            post_patch,
            public_base_url,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key).and_then(|s| s.parse().ok()).unwrap_or(default)
}
