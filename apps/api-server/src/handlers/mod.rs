//! HTTP handlers and route configuration.

mod health;
mod posts;
mod users;

use actix_web::{error::JsonPayloadError, web};
use uuid::Uuid;

use crate::middleware::{AppError, AppResult, AuthGate};
use crate::state::AppState;

/// Register application state, body limits and all routes.
pub fn configure(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let gate = AuthGate::new(state.tokens.clone());

        cfg.app_data(web::Data::new(state))
            .app_data(json_config())
            .service(
                web::scope("/api")
                    // Public routes
                    .route("/health", web::get().to(health::health_check))
                    .service(
                        web::scope("/v1")
                            .route("/users", web::post().to(users::register))
                            .route("/users/activate/{id}", web::get().to(users::activate))
                            .route("/login", web::post().to(users::login))
                            // Protected routes
                            .service(
                                web::scope("/posts")
                                    .wrap(gate)
                                    .route("", web::post().to(posts::create))
                                    .route("", web::get().to(posts::list))
                                    .route("/{id}", web::get().to(posts::get))
                                    .route("/{id}", web::patch().to(posts::update))
                                    .route("/{id}", web::delete().to(posts::delete))
                                    .route("/{id}/view", web::patch().to(posts::view)),
                            ),
                    ),
            );
    }
}

/// Malformed JSON bodies become 400 problem responses.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req| {
        tracing::debug!(error = %err, "Rejected request body");
        AppError::BadRequest(err.to_string()).into()
    })
}

/// Parse a path identifier; anything but a UUID is a malformed id.
fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("Invalid ID".to_string()))
}
