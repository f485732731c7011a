//! Bearer token authentication middleware

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use tracing::debug;

/// Expected fleet token
///
/// A gate without a token rejects every request.
#[derive(Debug, Clone)]
pub struct BearerGate {
    token: Option<Arc<str>>,
}

impl BearerGate {
    pub fn new(token: Option<&str>) -> Self {
        Self {
            token: token.filter(|token| !token.is_empty()).map(Arc::from),
        }
    }

    /// Check an `Authorization` header value.
    pub fn check(&self, header: Option<&str>) -> Result<(), AuthError> {
        let header = header.ok_or(AuthError::MissingToken)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidFormat)?;

        let expected = self.token.as_deref().ok_or(AuthError::NotConfigured)?;

        // the exact suffix is compared, in time independent of its content
        if !bool::from(token.as_bytes().ct_eq(expected.as_bytes())) {
            return Err(AuthError::InvalidToken);
        }

        Ok(())
    }
}

/// Authentication middleware
///
/// Checks for the fleet's Bearer token in the Authorization header. Rejected
/// requests never reach the handler.
pub async fn auth_middleware(
    State(gate): State<BearerGate>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    if let Err(e) = gate.check(auth_header) {
        debug!("rejecting {} {}: {e:?}", request.method(), request.uri().path());
        return Err(e);
    }

    Ok(next.run(request).await)
}

/// Authentication errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    InvalidFormat,
    InvalidToken,
    NotConfigured,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingToken => "Missing Authorization header",
            AuthError::InvalidFormat => "Invalid Authorization format (expected: Bearer <token>)",
            AuthError::InvalidToken => "Invalid token",
            AuthError::NotConfigured => "Unauthorized",
        };

        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Bearer")],
            message,
        )
            .into_response()
    }
}
