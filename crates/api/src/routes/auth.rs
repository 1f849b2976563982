use axum::{Json, extract::State, http::{HeaderMap, StatusCode, header}};
use rollcall_db::models::{User, UserRole};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub display_name: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[serde(default)]
    pub role: UserRole,
    pub student_id: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub username: String,
    pub display_name: String,
    pub role: UserRole,
    pub student_id: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, HeaderMap, Json<AuthResponse>), ApiError> {
    body.validate()?;

    let password_hash = state.auth.hash_password(&body.password)?;

    let user = state
        .users
        .create(
            body.email.clone(),
            body.username.clone(),
            body.display_name.clone(),
            password_hash,
            body.role,
            body.student_id.clone(),
            body.department.clone(),
        )
        .await?;

    let user_id = user.id.unwrap();
    let tokens = state
        .auth
        .generate_tokens(user_id, &user.email, &user.username, user.role)?;

    let headers = auth_cookie_headers(&tokens.access_token, tokens.expires_in);

    let response = AuthResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
        user: to_user_response(user),
    };

    Ok((StatusCode::CREATED, headers, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>), ApiError> {
    let user = if let Some(ref username) = body.username {
        state.users.find_by_username(username).await
    } else if let Some(ref email) = body.email {
        state.users.find_by_email(email).await
    } else {
        return Err(ApiError::BadRequest(
            "Either username or email is required".to_string(),
        ));
    }
    .map_err(|_| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    let password_hash = user
        .password_hash
        .as_ref()
        .ok_or_else(|| ApiError::Unauthorized("No password set".to_string()))?;

    let valid = state.auth.verify_password(&body.password, password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let user_id = user.id.unwrap();
    let tokens = state
        .auth
        .generate_tokens(user_id, &user.email, &user.username, user.role)?;

    state.users.touch_last_active(user_id).await.ok();

    let headers = auth_cookie_headers(&tokens.access_token, tokens.expires_in);

    let response = AuthResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
        user: to_user_response(user),
    };

    Ok((headers, Json(response)))
}

pub async fn logout() -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    let cookie = "access_token=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0";
    headers.insert(header::SET_COOKIE, cookie.parse().unwrap());
    Ok(headers)
}

pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.base.find_by_id(auth.user_id).await?;
    Ok(Json(to_user_response(user)))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>), ApiError> {
    let claims = state.auth.verify_refresh_token(&body.refresh_token)?;

    let user_id = bson::oid::ObjectId::parse_str(&claims.sub)
        .map_err(|_| ApiError::Unauthorized("Invalid user ID".to_string()))?;

    let user = state.users.base.find_by_id(user_id).await?;

    let tokens = state
        .auth
        .generate_tokens(user_id, &user.email, &user.username, user.role)?;

    let headers = auth_cookie_headers(&tokens.access_token, tokens.expires_in);

    let response = AuthResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
        user: to_user_response(user),
    };

    Ok((headers, Json(response)))
}

fn auth_cookie_headers(access_token: &str, expires_in: u64) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let cookie = format!(
        "access_token={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        access_token, expires_in
    );
    headers.insert(header::SET_COOKIE, cookie.parse().unwrap());
    headers
}

fn to_user_response(user: User) -> UserResponse {
    UserResponse {
        id: user.id.unwrap().to_hex(),
        email: user.email,
        username: user.username,
        display_name: user.display_name,
        role: user.role,
        student_id: user.student_id,
        department: user.department,
    }
}
