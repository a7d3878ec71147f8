//! Principal resolution.
//!
//! Credentials are checked by an identity provider in front of this service,
//! which forwards the authenticated username in a trusted header (see
//! `Config::identity_header`). This module only maps that name to a [`User`].

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;

use crate::models::User;
use crate::state::AppState;
use crate::utils::error::AppError;

/// The authenticated user behind a request.
#[derive(Debug, Clone)]
pub struct Principal(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| AppError::AuthError("Login required".to_string()))
    }
}

/// Resolves the identity header into a [`Principal`] request extension.
///
/// Requests without the header pass through anonymously; routes that need a
/// principal reject them through the extractor. A header naming an unknown
/// user is rejected here.
pub async fn resolve_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let username = request
        .headers()
        .get(state.config.identity_header.as_str())
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned);

    if let Some(username) = username {
        let user = state
            .store
            .find_user_by_username(&username)
            .await?
            .ok_or_else(|| {
                tracing::warn!(username = %username, "Identity header names an unknown user");
                AppError::AuthError("Unknown user".to_string())
            })?;
        request.extensions_mut().insert(Principal(user));
    }

    Ok(next.run(request).await)
}
