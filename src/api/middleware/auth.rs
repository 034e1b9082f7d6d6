use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use uuid::Uuid;

use crate::{
    api::state::AppState,
    domain::{Role, User},
    error::{AppError, Result},
};

#[derive(Clone)]
pub struct CurrentUser {
    pub user: User,
}

impl CurrentUser {
    /// Returns the user's id when they hold `role`, otherwise `Forbidden`.
    pub fn require_role(&self, role: Role) -> Result<Uuid> {
        if self.user.role() != role {
            return Err(AppError::Forbidden);
        }
        Ok(self.user.id)
    }
}

async fn authenticate(
    state: &AppState,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<User> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AppError::Unauthorized)?;

    let claims = state.service_context.auth_service.verify_token(bearer.token())?;

    // Tokens outlive accounts; a deleted user is just unauthenticated
    let user = state.service_context.user_repo
        .find_by_id(claims.sub)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if user.role() != claims.role {
        tracing::debug!("Token role {} does not match account {}", claims.role, user.id);
        return Err(AppError::Unauthorized);
    }

    Ok(user)
}

pub async fn require_auth(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let user = authenticate(&state, bearer).await?;

    request.extensions_mut().insert(CurrentUser { user });

    Ok(next.run(request).await)
}

pub async fn require_admin(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let user = authenticate(&state, bearer).await?;

    if user.role() != Role::Admin {
        return Err(AppError::Forbidden);
    }

    request.extensions_mut().insert(CurrentUser { user });

    Ok(next.run(request).await)
}
