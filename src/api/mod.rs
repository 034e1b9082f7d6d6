pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    Router,
    routing::{get, post, put, patch, delete},
};
use tower_http::{
    cors::CorsLayer,
    trace::TraceLayer,
};
use std::sync::Arc;

use crate::{
    config::Settings,
    service::ServiceContext,
};
use state::AppState;

pub fn create_app(service_context: Arc<ServiceContext>, settings: Arc<Settings>) -> Router {
    let app_state = AppState::new(service_context, settings);

    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))

        .nest("/api", api_routes(app_state.clone()))

        .with_state(app_state)

        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes(state.clone()))
        .nest("/events", event_routes(state.clone()))
        .route("/feedback/submit", post(handlers::feedback::submit))
        .nest("/admin", admin_routes(state))
}

fn auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/register/student", post(handlers::auth::register_student))
        .route("/register/institute", post(handlers::auth::register_institute))
        .route("/login", post(handlers::auth::login))
        .route("/login/institute", post(handlers::auth::login_institute))
        .route("/login/admin", post(handlers::auth::login_admin))
        .merge(Router::new()
            .route("/me", get(handlers::auth::me))
            .route_layer(axum::middleware::from_fn_with_state(
                state,
                middleware::auth::require_auth,
            ))
        )
}

// Every event route needs a bearer token; role checks happen per handler.
fn event_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/create", post(handlers::events::create))
        .route("/active", get(handlers::events::list_active))
        .route("/institute", get(handlers::events::list_institute))
        .route("/registered", get(handlers::events::list_registered))
        .route("/:id", get(handlers::events::get))
        .route("/:id", put(handlers::events::update))
        .route("/:id", delete(handlers::events::delete))
        .route("/:id/status", patch(handlers::events::update_status))
        .route("/:id/register", post(handlers::events::register))
        .route("/:id/unregister", post(handlers::events::unregister))
        .route("/:id/stats", get(handlers::events::stats))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_auth,
        ))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/stats", get(handlers::admin::stats))
        .route("/students", get(handlers::admin::students))
        .route("/institutes", get(handlers::admin::institutes))
        .route("/events", get(handlers::admin::events))
        .route("/events/:id", delete(handlers::admin::delete_event))
        .route("/users/:id", delete(handlers::admin::delete_user))
        .route("/feedback", get(handlers::admin::feedback))
        .route("/feedback/:id", delete(handlers::admin::delete_feedback))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_admin,
        ))
}
