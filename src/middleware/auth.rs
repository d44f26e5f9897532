use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::bearer_token;
use crate::error::ApiError;
use crate::state::AppState;

/// Verifies the bearer token with the identity provider and injects the
/// resulting `Claims` into request extensions. Runs before any extractor of
/// the wrapped handlers, so a bad token short-circuits body parsing too.
pub async fn identity_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let raw = match headers.get(AUTHORIZATION) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| ApiError::unauthorized("Malformed authorization header"))?,
        ),
        None => None,
    };

    let token = bearer_token(raw)?;
    let claims = state.verifier.verify(token).await?;

    tracing::debug!("Authenticated request for {:?}", claims.id);
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}
