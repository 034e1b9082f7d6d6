use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;

use crate::{
    api::{extract::AppJson, middleware::auth::CurrentUser, state::AppState},
    domain::{InstituteSignupRequest, LoginRequest, Role, StudentSignupRequest, User},
    error::Result,
};

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub user: User,
}

pub async fn register_student(
    State(state): State<AppState>,
    AppJson(request): AppJson<StudentSignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let user = state.service_context.account_service
        .register_student(request)
        .await?;

    Ok((StatusCode::CREATED, Json(AuthResponse {
        message: "Student registered successfully".to_string(),
        token: None,
        user,
    })))
}

pub async fn register_institute(
    State(state): State<AppState>,
    AppJson(request): AppJson<InstituteSignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let (user, token) = state.service_context.account_service
        .register_institute(request)
        .await?;

    Ok((StatusCode::CREATED, Json(AuthResponse {
        message: "Institute registered successfully".to_string(),
        token: Some(token),
        user,
    })))
}

async fn login_as(state: &AppState, role: Role, request: LoginRequest) -> Result<Json<AuthResponse>> {
    let (user, token) = state.service_context.account_service
        .login(role, request)
        .await?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        token: Some(token),
        user,
    }))
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    login_as(&state, Role::Student, request).await
}

pub async fn login_institute(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    login_as(&state, Role::Institute, request).await
}

pub async fn login_admin(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    login_as(&state, Role::Admin, request).await
}

pub async fn me(Extension(current): Extension<CurrentUser>) -> Json<User> {
    Json(current.user)
}
