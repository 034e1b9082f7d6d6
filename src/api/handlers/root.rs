use axum::{http::StatusCode, Json, response::IntoResponse};
use serde_json::json;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "EventHub API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Event registration for students and institutes",
        "status": "operational",
        "endpoints": {
            "health": "/health",
            "auth": "/api/auth",
            "events": "/api/events",
            "feedback": "/api/feedback/submit",
            "admin": "/api/admin"
        }
    }))
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
