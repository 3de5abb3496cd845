// libs/auth-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    Json,
};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::{StoreError, SupabaseClient};
use shared_models::auth::TokenResponse;
use shared_models::error::AppError;
use shared_utils::jwt::validate_token;

use crate::models::{AuthSession, LoginRequest, SignupRequest};

fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_header = headers
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    if !auth_value.starts_with("Bearer ") {
        return Err(AppError::Auth("Invalid authorization header format".to_string()));
    }

    Ok(auth_value[7..].to_string())
}

fn map_identity_err(e: StoreError) -> AppError {
    match e {
        StoreError::Auth(msg) => AppError::Auth(msg),
        other => AppError::Upstream(other.to_string()),
    }
}

/// Create a doctor account with the identity provider. The profile row is a
/// separate step against the doctors endpoint once logged in.
#[axum::debug_handler]
pub async fn signup(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<Value>, AppError> {
    debug!("Signing up {}", request.email);

    if request.password.len() < 8 {
        return Err(AppError::ValidationError(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let supabase = SupabaseClient::new(&config);

    let session: Value = supabase
        .request(
            Method::POST,
            "/auth/v1/signup",
            None,
            Some(json!({
                "email": request.email,
                "password": request.password
            })),
        )
        .await
        .map_err(map_identity_err)?;

    Ok(Json(json!({
        "success": true,
        "session": session
    })))
}

#[axum::debug_handler]
pub async fn login(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthSession>, AppError> {
    debug!("Logging in {}", request.email);

    let supabase = SupabaseClient::new(&config);

    let session: AuthSession = supabase
        .request(
            Method::POST,
            "/auth/v1/token?grant_type=password",
            None,
            Some(json!({
                "email": request.email,
                "password": request.password
            })),
        )
        .await
        .map_err(|e| match e {
            StoreError::Auth(_) | StoreError::Api { status: 400, .. } => {
                AppError::Auth("Invalid email or password".to_string())
            }
            other => AppError::Upstream(other.to_string()),
        })?;

    Ok(Json(session))
}

/// Local check of a bearer token, no upstream round-trip.
#[axum::debug_handler]
pub async fn validate(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    let token = extract_bearer_token(&headers)?;

    match validate_token(&token, &config.supabase_jwt_secret) {
        Ok(user) => Ok(Json(TokenResponse {
            valid: true,
            user_id: user.id,
            email: user.email,
            role: user.role,
        })),
        Err(err) => Err(AppError::Auth(err)),
    }
}
