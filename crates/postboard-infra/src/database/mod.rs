//! Document stores: an in-memory table per entity, and a SQL store.

mod memory;

#[cfg(feature = "database")]
mod connections;
#[cfg(feature = "database")]
pub mod entity;
#[cfg(feature = "database")]
mod sql_repo;

pub use memory::{InMemoryPostRepository, InMemoryRepository, InMemoryUserRepository, Keyed};

#[cfg(feature = "database")]
pub use connections::Database;
#[cfg(feature = "database")]
pub use sql_repo::{SqlPostRepository, SqlUserRepository};


/// Configuration for the SQL store.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// An in-memory sqlite URL, which must be served by a single connection.
    pub fn is_in_memory(&self) -> bool {
        self.url.starts_with("sqlite::memory:") || self.url.contains("mode=memory")
    }
}
