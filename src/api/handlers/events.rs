use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::{
        extract::{AppJson, AppPath},
        middleware::auth::CurrentUser,
        state::AppState,
    },
    domain::{Event, EventDetails, EventDraft, EventStatistics, Role, UpdateEventRequest},
    error::Result,
};

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub message: String,
    pub event: Event,
}

pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    AppJson(draft): AppJson<EventDraft>,
) -> Result<(StatusCode, Json<Event>)> {
    let institute_id = current.require_role(Role::Institute)?;

    let event = state.service_context.event_service
        .create(institute_id, draft)
        .await?;

    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn list_active(State(state): State<AppState>) -> Result<Json<Vec<Event>>> {
    let events = state.service_context.event_service.list_active().await?;
    Ok(Json(events))
}

pub async fn list_institute(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<Event>>> {
    let institute_id = current.require_role(Role::Institute)?;
    let events = state.service_context.event_service
        .list_for_institute(institute_id)
        .await?;
    Ok(Json(events))
}

pub async fn list_registered(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<Event>>> {
    let student_id = current.require_role(Role::Student)?;
    let events = state.service_context.event_service
        .list_for_student(student_id)
        .await?;
    Ok(Json(events))
}

pub async fn get(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<EventDetails>> {
    let details = state.service_context.event_service.details(id).await?;
    Ok(Json(details))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    AppPath(id): AppPath<Uuid>,
    AppJson(patch): AppJson<UpdateEventRequest>,
) -> Result<Json<Event>> {
    let institute_id = current.require_role(Role::Institute)?;

    let event = state.service_context.event_service
        .update(id, institute_id, patch)
        .await?;

    Ok(Json(event))
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<StatusRequest>,
) -> Result<Json<EventResponse>> {
    let institute_id = current.require_role(Role::Institute)?;

    let event = state.service_context.event_service
        .change_status(id, institute_id, &request.status)
        .await?;

    Ok(Json(EventResponse {
        message: format!("Event status updated to {}", event.status),
        event,
    }))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode> {
    state.service_context.event_service
        .delete(id, current.user.id, current.user.role())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn register(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<EventResponse>> {
    let student_id = current.require_role(Role::Student)?;

    let event = state.service_context.event_service
        .register(id, student_id)
        .await?;

    Ok(Json(EventResponse {
        message: "Successfully registered for event".to_string(),
        event,
    }))
}

pub async fn unregister(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<EventResponse>> {
    let student_id = current.require_role(Role::Student)?;

    let event = state.service_context.event_service
        .unregister(id, student_id)
        .await?;

    Ok(Json(EventResponse {
        message: "Successfully unregistered from event".to_string(),
        event,
    }))
}

pub async fn stats(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<EventStatistics>> {
    let institute_id = current.require_role(Role::Institute)?;

    let stats = state.service_context.event_service
        .statistics(id, institute_id)
        .await?;

    Ok(Json(stats))
}
