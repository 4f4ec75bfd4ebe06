//! Axum extractors and middleware for auth

use crate::{claims::Claims, errors::AuthError, traits::TokenVerifier};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, Method, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Extractor for verified [`Claims`] - requires [`auth_required`] to have run
#[derive(Debug, Clone)]
pub struct Authz(pub Claims);

impl Authz {
    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.0.tenant_id
    }
}

impl<S> FromRequestParts<S> for Authz
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(Authz)
            .ok_or(AuthError::Internal(
                "Claims not found - auth middleware not configured".to_owned(),
            ))
    }
}

#[derive(Clone)]
pub struct AuthState {
    verifier: Arc<dyn TokenVerifier>,
}

impl AuthState {
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { verifier }
    }
}

/// Middleware that rejects requests without a valid bearer token.
///
/// CORS preflight requests pass through untouched. On success the verified
/// [`Claims`] are stored in request extensions for [`Authz`].
pub async fn auth_required(
    State(AuthState { verifier }): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    if is_preflight_request(request.method(), request.headers()) {
        return next.run(request).await;
    }

    let Some(token) = extract_bearer_token(request.headers()) else {
        return AuthError::Missing.into_response();
    };

    let claims = match verifier.verify(token).await {
        Ok(claims) => claims,
        Err(err) => {
            tracing::debug!(error = %err, "bearer token rejected");
            return err.into_response();
        }
    };

    request.extensions_mut().insert(claims);
    next.run(request).await
}

/// Extract the bearer token from the `Authorization` header.
///
/// The scheme is matched case-insensitively; anything else is treated as absent.
#[must_use]
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?
        .trim();
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn is_preflight_request(method: &Method, headers: &HeaderMap) -> bool {
    method == Method::OPTIONS
        && headers.contains_key(axum::http::header::ORIGIN)
        && headers.contains_key(axum::http::header::ACCESS_CONTROL_REQUEST_METHOD)
}
