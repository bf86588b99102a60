//! Registration, activation and login.

use std::sync::Arc;

use actix_web::{HttpResponse, web};

use postboard_core::RepoError;
use postboard_core::domain::{Registration, User};
use postboard_core::ports::{AuthError, PasswordService};
use postboard_shared::dto::{
    LoginRequest, LoginResponse, MessageResponse, RegisterResponse, RegisterUserRequest,
    UserResponse,
};

use super::parse_id;
use crate::middleware::error::INVALID_DATA;
use crate::middleware::{AppError, AppResult};
use crate::state::AppState;

const LOGIN_FAILED: &str = "Login failed";

fn email_taken() -> AppError {
    AppError::BadRequest("Email already registered".to_string())
}

fn user_response(user: &User) -> UserResponse {
    UserResponse {
        id: user.id.to_string(),
        name: user.name.clone(),
        email: user.email.clone(),
        bio: user.bio.clone(),
        active: user.active,
        created_at: user.created_at.to_rfc3339(),
    }
}

/// Run the (deliberately slow) hash off the async executor.
async fn hash_password(passwords: Arc<dyn PasswordService>, password: String) -> AppResult<String> {
    web::block(move || passwords.hash(&password))
        .await
        .map_err(|e| {
            tracing::error!("Password hashing task failed: {}", e);
            AppError::BadRequest(INVALID_DATA.to_string())
        })?
        .map_err(AppError::from)
}

async fn verify_password(
    passwords: Arc<dyn PasswordService>,
    password: String,
    hash: String,
) -> AppResult<bool> {
    web::block(move || passwords.verify(&password, &hash))
        .await
        .map_err(|e| {
            tracing::error!("Password verification task failed: {}", e);
            AppError::BadRequest(LOGIN_FAILED.to_string())
        })?
        .map_err(|e| {
            tracing::error!("Password verification failed: {}", e);
            AppError::BadRequest(LOGIN_FAILED.to_string())
        })
}

/// POST /api/v1/users
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let registration = Registration {
        name: req.name.unwrap_or_default().trim().to_string(),
        email: req.email.unwrap_or_default().trim().to_string(),
        password: req.password.unwrap_or_default(),
        bio: req.bio,
    };
    registration.validate()?;

    if state.users.find_by_email(&registration.email).await?.is_some() {
        return Err(email_taken());
    }

    let password_hash = hash_password(state.passwords.clone(), registration.password).await?;

    let user = User::new(
        registration.name,
        registration.email,
        password_hash,
        registration.bio,
        state.accounts.initial_active(),
    );
    let saved = state.users.save(user).await.map_err(|e| match e {
        RepoError::Constraint(_) => email_taken(),
        other => other.into(),
    })?;

    let message = if saved.active {
        tracing::info!(user_id = %saved.id, "User registered");
        "User created."
    } else {
        tracing::info!(
            user_id = %saved.id,
            activation_link = %state.activation_link(saved.id),
            "User activation link"
        );
        "User created. Check activation link in server log."
    };

    Ok(HttpResponse::Created().json(RegisterResponse {
        message: message.to_string(),
        user: user_response(&saved),
    }))
}

/// GET /api/v1/users/activate/{id}
pub async fn activate(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path)?;

    let mut user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if user.activate() {
        state.users.save(user).await?;
        tracing::info!(user_id = %id, "User activated");
    }

    Ok(HttpResponse::Ok().json(MessageResponse::new("User activated successfully")))
}

/// POST /api/v1/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .users
        .find_by_email(req.email.trim())
        .await
        .map_err(|e| {
            tracing::error!("User lookup failed: {}", e);
            AppError::BadRequest(LOGIN_FAILED.to_string())
        })?
        .ok_or(AuthError::InvalidCredentials)?;

    if !state.accounts.permits_login(&user) {
        return Err(AuthError::AccountInactive.into());
    }

    let valid =
        verify_password(state.passwords.clone(), req.password, user.password_hash.clone()).await?;
    if !valid {
        tracing::warn!(user_id = %user.id, "Login with wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state
        .tokens
        .generate_token(user.id, &user.email)
        .map_err(|e| {
            tracing::error!("Token signing failed: {}", e);
            AppError::BadRequest(LOGIN_FAILED.to_string())
        })?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.expiration_seconds().max(0) as u64,
    }))
}
