//! API key gate, bearer authentication, role checks, and auth handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use serde::Deserialize;

use super::error::{
    ApiError, MSG_FORBIDDEN, MSG_INVALID_API_KEY, MSG_MISSING_API_KEY, MSG_UNAUTHORIZED,
};
use super::types::ApiResponse;
use super::validation;
use super::AppState;
use crate::services::auth_service::{RefreshResult, SignInResult, UserProfile};
use crate::services::token::TokenKind;

/// The authenticated caller's user id, inserted by [`auth_middleware`].
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub i32);

/// Rejects any request without a known ACTIVE `x-api-key` header.
pub async fn api_key_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty());

    let Some(key) = key else {
        return Err(ApiError::Unauthorized(MSG_MISSING_API_KEY.to_string()));
    };

    let active = state
        .store
        .is_api_key_active(key)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    if !active {
        return Err(ApiError::Unauthorized(MSG_INVALID_API_KEY.to_string()));
    }

    Ok(next.run(request).await)
}

/// Verifies the bearer token cryptographically and against its persisted
/// row, then exposes the caller as an [`AuthUser`] extension. Every failure
/// mode gets the same 401 message.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|v| !v.is_empty());

    let Some(token) = token else {
        return Err(ApiError::Unauthorized(MSG_UNAUTHORIZED.to_string()));
    };

    let claims = state
        .tokens
        .verify(token, TokenKind::Access)
        .await
        .map_err(|_| ApiError::Unauthorized(MSG_UNAUTHORIZED.to_string()))?;

    request.extensions_mut().insert(AuthUser(claims.id));

    Ok(next.run(request).await)
}

/// Requires the authenticated caller to hold the ADMIN role.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .copied()
        .ok_or_else(|| ApiError::Unauthorized(MSG_UNAUTHORIZED.to_string()))?;

    let role_names = state
        .store
        .get_user_role_names(user.0)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    if !role_names.iter().any(|name| name == "ADMIN") {
        tracing::debug!("User {} denied admin access: {}", user.0, MSG_FORBIDDEN);
        return Err(ApiError::Forbidden);
    }

    Ok(next.run(request).await)
}

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirmation: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct SignOutRequest {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
}

pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserProfile>>), ApiError> {
    validation::validate_sign_up(
        &body.name,
        &body.email,
        &body.password,
        &body.password_confirmation,
    )?;

    let profile = state
        .auth
        .sign_up(&body.name, &body.email, &body.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            201,
            "Hooray, your account has been created",
            profile,
        )),
    ))
}

pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignInRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SignInResult>>), ApiError> {
    validation::validate_sign_in(&body.email, &body.password)?;

    let result = state.auth.sign_in(&body.email, &body.password).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(200, "Hooray, you're signed in", result)),
    ))
}

pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RefreshRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RefreshResult>>), ApiError> {
    validation::validate_refresh(&body.refresh_token)?;

    let result = state.auth.refresh(&body.refresh_token).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            200,
            "Hooray, your token has been refreshed",
            result,
        )),
    ))
}

pub async fn sign_out(
    State(state): State<Arc<AppState>>,
    axum::Extension(user): axum::Extension<AuthUser>,
    Json(body): Json<SignOutRequest>,
) -> Result<(StatusCode, Json<ApiResponse<()>>), ApiError> {
    validation::validate_sign_out(&body.access_token, &body.refresh_token)?;

    state
        .auth
        .sign_out(user.0, &body.access_token, &body.refresh_token)
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success_empty(200, "Hooray, you're signed out")),
    ))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    axum::Extension(user): axum::Extension<AuthUser>,
) -> Result<(StatusCode, Json<ApiResponse<UserProfile>>), ApiError> {
    let profile = state.auth.me(user.0).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(200, "Hooray, here's your profile", profile)),
    ))
}
