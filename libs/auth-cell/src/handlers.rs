use std::sync::Arc;

use axum::{
    extract::{State, Json},
    http::{HeaderMap, StatusCode},
};
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_models::auth::TokenResponse;
use shared_models::error::AppError;
use shared_utils::jwt;

use crate::models::RegisterRequest;
use crate::registration::RegistrationService;

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))
}

#[axum::debug_handler]
pub async fn register_user(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if let Some(field) = request.invalid_field() {
        debug!("Registration rejected, invalid field: {}", field);
        return Err(AppError::BadRequest("validation failed on request body".to_string()));
    }

    let service = RegistrationService::new(&config);

    let exists = service.user_exists(request.username.trim(), request.email.trim())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    if exists {
        return Err(AppError::BadRequest("Another user exists with same username/email".to_string()));
    }

    let account = service.register(&request)
        .await
        .map_err(|e| AppError::ExternalService(e.to_string()))?;

    info!("Registered user {}", account.username);
    Ok((StatusCode::CREATED, Json(json!({
        "message": "Congratulations! You have registered successfully",
        "data": account
    }))))
}

pub async fn validate_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let token = extract_bearer_token(&headers)?;
    let user = jwt::validate_token(token, &config.supabase_jwt_secret)
        .map_err(AppError::Auth)?;

    Ok(Json(TokenResponse {
        valid: true,
        user_id: user.id,
        username: user.username,
        email: user.email,
        role: user.role,
    }))
}

pub async fn verify_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let token = extract_bearer_token(&headers)?;
    let valid = jwt::validate_token(token, &config.supabase_jwt_secret).is_ok();

    Ok(Json(json!({ "valid": valid })))
}
