use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};

use crate::{
    api::{extract::AppJson, state::AppState},
    domain::{CreateFeedbackRequest, Feedback, RequestMetadata},
    error::Result,
};

/// Client address is the first hop of `X-Forwarded-For`.
fn request_metadata(headers: &HeaderMap) -> RequestMetadata {
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    RequestMetadata {
        ip_address: header_str(header::HeaderName::from_static("x-forwarded-for"))
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string()),
        user_agent: header_str(header::USER_AGENT).map(str::to_string),
    }
}

pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(request): AppJson<CreateFeedbackRequest>,
) -> Result<(StatusCode, Json<Feedback>)> {
    let feedback = state.service_context.feedback_service
        .submit(request, request_metadata(&headers))
        .await?;

    Ok((StatusCode::CREATED, Json(feedback)))
}
