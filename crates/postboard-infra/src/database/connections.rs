use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, DbConn, DbErr, Schema};

use postboard_core::error::RepoError;

use super::DatabaseConfig;
use super::entity::{post, user};
use super::sql_repo::{SqlPostRepository, SqlUserRepository};

/// An in-memory sqlite database lives only as long as its connection, so the
/// pool must never recycle it.
const MEMORY_DB_KEEPALIVE: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Process-wide SQL connection, provisioned once at startup.
pub struct Database {
    pub conn: DbConn,
}

impl Database {
    /// Connect and create any missing tables from the entity definitions.
    pub async fn init(config: &DatabaseConfig) -> Result<Self, RepoError> {
        tracing::info!("Initializing database connection...");

        let mut opts = ConnectOptions::new(config.url.clone());
        opts.max_connections(config.max_connections)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .sqlx_logging(true);

        if config.is_in_memory() {
            opts.max_connections(1)
                .idle_timeout(MEMORY_DB_KEEPALIVE)
                .max_lifetime(MEMORY_DB_KEEPALIVE);
        }

        let conn = sea_orm::Database::connect(opts)
            .await
            .map_err(|e| RepoError::Connection(e.to_string()))?;

        create_schema(&conn)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        tracing::info!(
            backend = ?conn.get_database_backend(),
            in_memory = config.is_in_memory(),
            "Database connected"
        );

        Ok(Self { conn })
    }

    pub fn users(&self) -> SqlUserRepository {
        SqlUserRepository::new(self.conn.clone())
    }

    pub fn posts(&self) -> SqlPostRepository {
        SqlPostRepository::new(self.conn.clone())
    }
}

async fn create_schema(db: &DbConn) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let statements = [
        schema
            .create_table_from_entity(user::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(post::Entity)
            .if_not_exists()
            .to_owned(),
    ];

    for statement in &statements {
        db.execute(backend.build(statement)).await?;
    }

    Ok(())
}
