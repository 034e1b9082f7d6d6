use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::{
        extract::{AppPath, AppQuery},
        middleware::auth::CurrentUser,
        state::AppState,
    },
    domain::{Event, Feedback, Role, User},
    error::Result,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub total_users: i64,
    pub total_events: i64,
    pub total_students: i64,
    pub total_institutes: i64,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<PlatformStats>> {
    let ctx = &state.service_context;

    Ok(Json(PlatformStats {
        total_users: ctx.user_repo.count().await?,
        total_events: ctx.event_repo.count().await?,
        total_students: ctx.user_repo.count_by_role(Role::Student).await?,
        total_institutes: ctx.user_repo.count_by_role(Role::Institute).await?,
    }))
}

pub async fn students(State(state): State<AppState>) -> Result<Json<Vec<User>>> {
    let users = state.service_context.account_service.list(Role::Student).await?;
    Ok(Json(users))
}

pub async fn institutes(State(state): State<AppState>) -> Result<Json<Vec<User>>> {
    let users = state.service_context.account_service.list(Role::Institute).await?;
    Ok(Json(users))
}

pub async fn events(
    State(state): State<AppState>,
    AppQuery(page): AppQuery<Pagination>,
) -> Result<Json<Vec<Event>>> {
    let limit = page.limit.unwrap_or(100).clamp(1, 500);
    let offset = page.offset.unwrap_or(0).max(0);

    let events = state.service_context.event_service.list_all(limit, offset).await?;
    Ok(Json(events))
}

pub async fn delete_event(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode> {
    state.service_context.event_service
        .delete(id, current.user.id, Role::Admin)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode> {
    state.service_context.account_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn feedback(State(state): State<AppState>) -> Result<Json<Vec<Feedback>>> {
    let entries = state.service_context.feedback_service.list().await?;
    Ok(Json(entries))
}

pub async fn delete_feedback(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode> {
    state.service_context.feedback_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
