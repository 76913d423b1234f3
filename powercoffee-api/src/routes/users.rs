/// User endpoints
///
/// Public:
/// - `POST /api/users/signup` - register, no token issued
/// - `POST /api/users/signin` - username + password sign-in
/// - `POST /api/users/auth/google` - Google ID token sign-in
/// - `POST /api/users/forgot-password` - always 200
/// - `GET /api/users/reset-password/:token` - check a reset token
/// - `PATCH /api/users/reset-password/:token` - consume it
///
/// Bearer token required:
/// - `GET /api/users` - super_admin
/// - `GET|PUT|DELETE /api/users/:id` - self or super_admin
/// - `PATCH /api/users/:id` - change own password
/// - `GET /api/users/get-by-email/:email` - self or super_admin

use crate::{app::AppState, error::ApiResult, routes::PageParams};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use powercoffee_shared::auth::authorization::{
    require_any_role, require_self, require_self_or_any_role, AuthzError,
};
use powercoffee_shared::auth::middleware::AuthContext;
use powercoffee_shared::identity::{
    AuthResponse, MessageResponse, SignupInput, UpdateUserInput, UserResponse,
};
use powercoffee_shared::models::role::RoleName;
use powercoffee_shared::models::user::normalize_email;
use powercoffee_shared::pagination::PaginationResponse;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

const USER_MANAGERS: &[RoleName] = &[RoleName::SuperAdmin];

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(length(min = 3, max = 40, message = "Username must be 3-40 characters"))]
    pub username: String,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 120, message = "Email must be at most 120 characters")
    )]
    pub email: String,

    #[validate(length(min = 1, max = 60, message = "Phone number must be 1-60 characters"))]
    pub phone_number: String,

    #[validate(length(min = 1, max = 60, message = "First name must be 1-60 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 60, message = "Last name must be 1-60 characters"))]
    pub last_name: String,

    #[validate(length(min = 6, max = 120, message = "Password must be 6-120 characters"))]
    pub password: String,

    /// Requested role names
    #[serde(default, alias = "roles")]
    pub role: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SigninRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GoogleSigninRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(length(min = 6, max = 120, message = "Password must be 6-120 characters"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub old_password: String,

    #[validate(length(min = 6, max = 120, message = "Password must be 6-120 characters"))]
    pub new_password: String,
}

/// Profile update; omitted fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 40, message = "Username must be 3-40 characters"))]
    pub username: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 60, message = "Phone number must be 1-60 characters"))]
    pub phone_number: Option<String>,

    #[validate(length(min = 1, max = 60, message = "First name must be 1-60 characters"))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 60, message = "Last name must be 1-60 characters"))]
    pub last_name: Option<String>,
}

/// Register a new user
///
/// Duplicate username, email or phone number answer 400 with the same
/// messages as the rest of the API (`"Username is already taken!"` ...).
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    let response = state
        .identity
        .signup(SignupInput {
            username: req.username,
            email: req.email,
            phone_number: req.phone_number,
            first_name: req.first_name,
            last_name: req.last_name,
            password: req.password,
            roles: req.role,
        })
        .await?;

    Ok(Json(response))
}

pub async fn signin(
    State(state): State<AppState>,
    Json(req): Json<SigninRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let response = state
        .identity
        .authenticate(&req.username, &req.password)
        .await?;

    Ok(Json(response))
}

pub async fn google_signin(
    State(state): State<AppState>,
    Json(req): Json<GoogleSigninRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let response = state
        .identity
        .authenticate_with_external_identity(&req.token)
        .await?;

    Ok(Json(response))
}

/// Starts a password reset
///
/// Answers 200 whether or not the email belongs to anyone.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<StatusCode> {
    req.validate()?;

    state.identity.request_password_reset(&req.email).await?;
    Ok(StatusCode::OK)
}

pub async fn check_reset_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<StatusCode> {
    state.identity.check_reset_token(&token).await?;
    Ok(StatusCode::OK)
}

pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<StatusCode> {
    req.validate()?;

    state
        .identity
        .reset_password(&token, &req.new_password)
        .await?;
    Ok(StatusCode::OK)
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<PaginationResponse<UserResponse>>> {
    require_any_role(&auth, USER_MANAGERS)?;

    let page = state.identity.list_users(params.into()).await?;
    Ok(Json(page))
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    require_self_or_any_role(&auth, id, USER_MANAGERS)?;

    Ok(Json(state.identity.get_user_by_id(id).await?))
}

/// Auth-shaped lookup by email, with a freshly issued token
pub async fn get_user_by_email(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(email): Path<String>,
) -> ApiResult<Json<AuthResponse>> {
    if !auth.has_any_role(USER_MANAGERS) {
        let me = state.identity.get_user_by_id(auth.user_id).await?;
        if normalize_email(&me.email) != normalize_email(&email) {
            return Err(AuthzError::NotAuthorized.into());
        }
    }

    Ok(Json(state.identity.get_user_by_email(&email).await?))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    require_self_or_any_role(&auth, id, USER_MANAGERS)?;
    req.validate()?;

    let updated = state
        .identity
        .update_user(
            id,
            UpdateUserInput {
                username: req.username,
                email: req.email,
                phone_number: req.phone_number,
                first_name: req.first_name,
                last_name: req.last_name,
            },
        )
        .await?;

    Ok(Json(updated))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_self_or_any_role(&auth, id, USER_MANAGERS)?;

    state.identity.delete_user(id).await?;
    Ok(StatusCode::OK)
}

/// Changes the caller's own password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    require_self(&auth, id)?;
    req.validate()?;

    state
        .identity
        .change_password(id, &req.old_password, &req.new_password)
        .await?;
    Ok(StatusCode::OK)
}
