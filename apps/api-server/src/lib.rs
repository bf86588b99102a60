//! # Postboard API Server
//!
//! Users, login and bearer-protected posts over HTTP/JSON, built on Actix-web.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod state;
pub mod telemetry;
