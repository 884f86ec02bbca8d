//! Account endpoints: signup, token login and the own profile.

use axum::extract::State;
use recipebox_api::{ApiError, ApiJson, ApiResponse};
use recipebox_auth::{OwnerAuth, authenticate, hash_password, issue_token};
use recipebox_core::{CoreError, NewUser, User, non_null, normalize_email};
use serde::{Deserialize, Serialize};

use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserPayload {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenPayload {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserPayload {
    #[serde(default, deserialize_with = "non_null")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "non_null")]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "non_null")]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserView {
    pub email: String,
    pub name: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenView {
    pub token: String,
}

pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateUserPayload>,
) -> Result<ApiResponse<UserView>, ApiError> {
    let email = normalize_email(&payload.email)?;
    check_password(&state, &payload.password)?;
    let hash = hash_blocking(payload.password).await?;

    let user = state
        .users
        .create_user(NewUser::new(email, payload.name.trim(), hash))
        .await?;

    tracing::info!(user_id = %user.id, "User created");
    Ok(ApiResponse::created(UserView::from(&user)))
}

pub async fn create_token(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<TokenPayload>,
) -> Result<ApiResponse<TokenView>, ApiError> {
    if payload.email.trim().is_empty() {
        return Err(CoreError::invalid_field("email", "This field may not be blank.").into());
    }
    if payload.password.is_empty() {
        return Err(CoreError::invalid_field("password", "This field may not be blank.").into());
    }
    let user = authenticate(state.users.as_ref(), &payload.email, &payload.password).await?;
    let token = issue_token(state.users.as_ref(), &user).await?;
    Ok(ApiResponse::ok(TokenView { token }))
}

pub async fn read_me(OwnerAuth(auth): OwnerAuth) -> ApiResponse<UserView> {
    ApiResponse::ok(UserView::from(&auth.user))
}

/// PUT: email, name and password are all required.
pub async fn replace_me(
    State(state): State<AppState>,
    OwnerAuth(auth): OwnerAuth,
    ApiJson(payload): ApiJson<UpdateUserPayload>,
) -> Result<ApiResponse<UserView>, ApiError> {
    for (field, value) in [
        ("email", &payload.email),
        ("name", &payload.name),
        ("password", &payload.password),
    ] {
        if value.is_none() {
            return Err(CoreError::missing_field(field).into());
        }
    }
    apply_update(&state, auth.user, payload).await
}

/// PATCH: only supplied fields change.
pub async fn update_me(
    State(state): State<AppState>,
    OwnerAuth(auth): OwnerAuth,
    ApiJson(payload): ApiJson<UpdateUserPayload>,
) -> Result<ApiResponse<UserView>, ApiError> {
    apply_update(&state, auth.user, payload).await
}

async fn apply_update(
    state: &AppState,
    mut user: User,
    payload: UpdateUserPayload,
) -> Result<ApiResponse<UserView>, ApiError> {
    if let Some(email) = payload.email.as_deref() {
        user.email = normalize_email(email)?;
    }
    if let Some(name) = payload.name.as_deref() {
        user.name = name.trim().to_string();
    }
    if let Some(password) = payload.password {
        check_password(state, &password)?;
        user.password_hash = hash_blocking(password).await?;
    }

    let user = state.users.update_user(&user).await?;
    tracing::info!(user_id = %user.id, "User updated");
    Ok(ApiResponse::ok(UserView::from(&user)))
}

fn check_password(state: &AppState, password: &str) -> Result<(), CoreError> {
    let min = state.config.auth.min_password_length;
    if password.chars().count() < min {
        return Err(CoreError::invalid_field(
            "password",
            format!("Ensure this field has at least {min} characters."),
        ));
    }
    Ok(())
}

// Argon2 blocks for tens of milliseconds; run it on the blocking pool.
async fn hash_blocking(password: String) -> Result<String, ApiError> {
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::internal(format!("password hashing task failed: {e}")))??;
    Ok(hash)
}
