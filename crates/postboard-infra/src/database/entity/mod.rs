//! SeaORM entities. The schema is created from these at startup.

pub mod post;
pub mod user;
