use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    routing::post,
    Json, Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use skyfare_core::models::UserAccount;
use skyfare_core::validate::is_valid_email;
use skyfare_core::{FieldErrors, StoreError};

use crate::error::ApiError;
use crate::state::AppState;

pub const ROLE_USER: &str = "USER";
pub const ROLE_ADMIN: &str = "ADMIN";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
    pub exp: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    username: String,
    email: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    password: String,
    password_confirm: String,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    user_id: Uuid,
    username: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register/", post(register))
        .route("/login/", post(login))
        .route("/logout/", post(logout))
}

fn issue_token(state: &AppState, user: &UserAccount) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        role: if user.is_staff { ROLE_ADMIN } else { ROLE_USER }.to_string(),
        exp: (Utc::now() + Duration::seconds(state.auth.expiration as i64)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.auth.secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("Token encoding failed: {}", e)))
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))?
        .to_string())
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let mut errors = FieldErrors::new();
    if req.username.trim().is_empty() {
        errors.push("username", "This field is required.");
    }
    if !is_valid_email(&req.email) {
        errors.push("email", "Enter a valid email address.");
    }
    if req.password.len() < 8 {
        errors.push("password", "Password must be at least 8 characters long.");
    }
    if req.password != req.password_confirm {
        errors.push("password_confirm", "The two password fields didn't match.");
    }
    errors.into_result().map_err(ApiError::Validation)?;

    let password_hash = hash_password(&req.password)?;
    let user = state
        .users
        .create_user(
            req.username.trim(),
            req.email.trim(),
            req.first_name.trim(),
            req.last_name.trim(),
            &password_hash,
        )
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => {
                ApiError::field("username", "A user with that username already exists.")
            }
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, username = %user.username, "account created");

    let token = issue_token(&state, &user)?;
    Ok(Json(AuthResponse {
        token,
        user_id: user.id,
        username: user.username,
    }))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state
        .users
        .find_by_username(req.username.trim())
        .await?
        .filter(|u| verify_password(&req.password, &u.password_hash))
        .ok_or_else(|| ApiError::Authentication("Invalid username or password.".to_string()))?;

    let token = issue_token(&state, &user)?;
    Ok(Json(AuthResponse {
        token,
        user_id: user.id,
        username: user.username,
    }))
}

/// Tokens are stateless; logout is an acknowledgement for symmetric clients.
async fn logout() -> Json<serde_json::Value> {
    Json(json!({ "detail": "Logged out." }))
}

fn claims_from_request(state: &AppState, req: &Request) -> Result<Claims, ApiError> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::Authentication("Authentication required.".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Authentication("Authentication required.".to_string()))?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Authentication("Invalid or expired token.".to_string()))?;

    Ok(token_data.claims)
}

/// Requires a valid token; injects [`Claims`] into request extensions.
pub async fn require_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = claims_from_request(&state, &req)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Requires a valid token with the admin role.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = claims_from_request(&state, &req)?;
    if !claims.is_admin() {
        return Err(ApiError::Authorization(
            "Administrator access required.".to_string(),
        ));
    }
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
