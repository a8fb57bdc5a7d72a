/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register`: create an account
/// - `POST /v1/auth/login`: authenticate, returns a bearer token
/// - `POST /v1/auth/password-reset`: request a reset email (always succeeds)
/// - `POST /v1/auth/logout`: best-effort remote invalidation
/// - `PUT  /v1/auth/password`: set a new password
/// - `PUT  /v1/auth/profile`: update the owner-mutable account fields
/// - `GET  /v1/auth/me`: rebuild the session view from a valid token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use cinevault_shared::auth::jwt;
use cinevault_shared::auth::middleware::AuthContext;
use cinevault_shared::auth::service::NewRegistration;
use cinevault_shared::models::account::UpdateAccount;
use cinevault_shared::auth::session::SessionUser;
use cinevault_shared::models::profile::Role;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Checked against the strength policy by the auth service
    pub password: String,

    #[validate(length(min = 1, max = 64, message = "Username must be 1-64 characters"))]
    pub username: String,

    #[validate(length(min = 1, max = 128, message = "Display name must be 1-128 characters"))]
    pub display_name: String,

    #[validate(length(max = 2000, message = "Bio must be at most 2000 characters"))]
    pub bio: Option<String>,

    /// Register as a creator (starts as a pending application)
    #[serde(default)]
    pub creator_application: bool,
}

/// Register response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    pub user: SessionUser,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,

    /// Optional role assertion; login fails if it doesn't match
    pub role: Option<Role>,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,

    /// Bearer token for subsequent requests
    pub token: String,

    pub user: SessionUser,
}

/// Password reset request
#[derive(Debug, Deserialize, Validate)]
pub struct PasswordResetRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// New password request
#[derive(Debug, Deserialize)]
pub struct NewPasswordRequest {
    pub new_password: String,
}

/// Profile update request; absent fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 128, message = "Display name must be 1-128 characters"))]
    pub display_name: Option<String>,

    /// Some(None) clears the bio
    pub bio: Option<Option<String>>,
}

/// Plain success acknowledgment
#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub success: bool,
}

/// Session restore response
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub success: bool,
    pub user: SessionUser,
}

/// Collapses validator output into one message for the 400 body
fn validation_message(errors: validator::ValidationErrors) -> ApiError {
    let message = errors
        .field_errors()
        .iter()
        .flat_map(|(_, errs)| errs.iter())
        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .next()
        .unwrap_or_else(|| "Validation failed".to_string());
    ApiError::BadRequest(message)
}

/// Register a new account
///
/// # Errors
///
/// - `400` validation or weak password
/// - `409` email already registered
/// - `500` partial registration (body carries the account id for retry)
/// - `503` provider unavailable
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    req.validate().map_err(validation_message)?;

    let user = state
        .auth
        .register(NewRegistration {
            email: req.email,
            password: req.password,
            username: req.username,
            display_name: req.display_name,
            bio: req.bio,
            creator_application: req.creator_application,
        })
        .await?;

    let message = if req.creator_application {
        "Creator account created; awaiting approval".to_string()
    } else {
        "Account created".to_string()
    };

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message,
            user,
        }),
    ))
}

/// Authenticate and mint a bearer token
///
/// # Errors
///
/// - `401` bad email or password (one indistinguishable message)
/// - `403` role mismatch or unapproved creator
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate().map_err(validation_message)?;

    let user = state.auth.login(&req.email, &req.password, req.role).await?;

    let claims = jwt::Claims::new(user.id, user.email.clone(), user.role);
    let token = jwt::create_token(&claims, state.jwt_secret())
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(LoginResponse {
        success: true,
        token,
        user,
    }))
}

/// Log out
///
/// Remote invalidation is best-effort; this endpoint always acknowledges.
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Json<AckResponse> {
    state.auth.logout(auth.account_id).await;
    Json(AckResponse { success: true })
}

/// Request a password reset email
///
/// Always acknowledges, whether or not the email exists.
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(req): Json<PasswordResetRequest>,
) -> ApiResult<Json<AckResponse>> {
    req.validate().map_err(validation_message)?;

    state.auth.request_password_reset(&req.email).await;
    Ok(Json(AckResponse { success: true }))
}

/// Set a new password for the authenticated account
///
/// Same strength policy as registration.
pub async fn reset_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<NewPasswordRequest>,
) -> ApiResult<Json<AckResponse>> {
    state
        .auth
        .reset_password(auth.account_id, &req.new_password)
        .await?;
    Ok(Json(AckResponse { success: true }))
}

/// Update the owner-mutable account fields (email, display name, bio)
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<MeResponse>> {
    req.validate().map_err(validation_message)?;

    let user = state
        .auth
        .update_account(
            auth.account_id,
            UpdateAccount {
                email: req.email,
                display_name: req.display_name,
                bio: req.bio,
            },
        )
        .await?;

    Ok(Json(MeResponse {
        success: true,
        user,
    }))
}

/// Rebuild the session view from a valid token
///
/// Returns 401 when the account behind the token no longer resolves, which
/// tells the client to clear its cached session.
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MeResponse>> {
    let user = state
        .auth
        .current_user(auth.account_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Session no longer valid".to_string()))?;

    Ok(Json(MeResponse {
        success: true,
        user,
    }))
}
