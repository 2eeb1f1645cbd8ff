use std::sync::Arc;

use axum::{
    extract::State,
    http::{self, Request},
    middleware::Next,
    response::Response,
};

use crate::{auth, error::AppError, AppState};

/// Resolves the acting user from `Authorization: Bearer <token>` and stores it
/// as a `CurrentUser` request extension.
pub async fn mw_require_auth<B>(
    State(state): State<Arc<AppState>>,
    mut request: Request<B>,
    next: Next<B>,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .unwrap_or(auth_header)
        .trim();

    let current_user = auth::verify_token(token, state.accounts.jwt_secret())?;
    tracing::debug!(user_id = current_user.user_id, username = %current_user.username, "request authenticated");
    request.extensions_mut().insert(current_user);

    Ok(next.run(request).await)
}
