use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::HOST;
use axum::http::request::Parts;
use std::convert::Infallible;
use tracing::debug;

use crate::state::AppState;

/// Header a reverse proxy uses to pass on the original request scheme
const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// The authenticated user, as asserted by the trusted identity header
///
/// `None` when identity is disabled, the header is missing, or its value is
/// blank or not valid text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub Option<String>);

impl CurrentUser {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let Some(header) = state.identity_header else {
            return Ok(CurrentUser(None));
        };

        let user = parts
            .headers
            .get(&header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        if let Some(ref user) = user {
            debug!("Request authenticated as {}", user);
        }
        Ok(CurrentUser(user))
    }
}

/// `scheme://host` the client used to reach us, if the request says
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin(pub Option<String>);

impl RequestOrigin {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for RequestOrigin
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let host = parts
            .headers
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        let Some(host) = host else {
            return Ok(RequestOrigin(None));
        };

        // Only the first hop matters when proxies chain the header
        let scheme = parts
            .headers
            .get(FORWARDED_PROTO)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| *v == "http" || *v == "https")
            .unwrap_or("http");

        Ok(RequestOrigin(Some(format!("{}://{}", scheme, host))))
    }
}
