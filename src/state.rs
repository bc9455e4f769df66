use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::FromRef;
use axum::http::HeaderName;

use crate::db::DbPool;
use crate::media::MediaStore;

/// Shared state handed to every handler
///
/// Handlers that only need the pool extract `State<Arc<DbPool>>` through
/// `FromRef`, the same as before media and identity were part of the state.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<DbPool>,
    pub media: Arc<MediaStore>,

    /// Trusted header carrying the authenticated user, if identity is enabled
    pub identity_header: Option<HeaderName>,
}

impl AppState {
    /// Builds the state, parsing the identity header name
    ///
    /// An empty `identity_header` turns identity off, so every request is
    /// treated as anonymous.
    ///
    /// ### Errors
    ///
    /// Returns an error if `identity_header` is not a valid header name.
    pub fn new(pool: Arc<DbPool>, media: MediaStore, identity_header: &str) -> Result<Self> {
        let identity_header = match identity_header.trim() {
            "" => None,
            name => Some(
                HeaderName::from_bytes(name.as_bytes())
                    .with_context(|| format!("invalid identity header name {:?}", name))?,
            ),
        };

        Ok(Self {
            pool,
            media: Arc::new(media),
            identity_header,
        })
    }
}

impl FromRef<AppState> for Arc<DbPool> {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Arc<MediaStore> {
    fn from_ref(state: &AppState) -> Self {
        state.media.clone()
    }
}
