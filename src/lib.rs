/// Bazaar: A Marketplace Listing Service
///
/// This library provides the core of a small marketplace: people submit items
/// to sell, rent, donate, lend or share, with optional images and a price,
/// and a moderator approves or rejects each submission before it is shown.
///
/// ### Modules
///
/// - `db`: Database connection management
/// - `models`: Listings, listing images and their typed fields
/// - `repo`: Repository layer for database operations
/// - `schema`: Database schema definitions
/// - `submission`: Parsing and validating create requests
/// - `media`: Storage for uploaded image files
/// - `dto`: Wire formats
/// - `handlers`: HTTP handlers
///
/// ### Web API
///
/// - `GET /listings/`: All listings, optionally filtered by `status`
/// - `POST /listings/create/`: Submit a listing (JSON, form or multipart)
/// - `GET /listings/approved/`: Approved listings
/// - `GET /listings/mine/`: The caller's listings
/// - `GET /listings/pending/`: Listings awaiting moderation
/// - `PATCH /listings/{id}/approve/`: Approve a listing
/// - `PATCH /listings/{id}/reject/`: Reject a listing
/// - `GET /listings/stats/`: Moderation counters and a 7-day trend

/// Configuration module
pub mod config;

/// Database connection module
pub mod db;

/// Data transfer objects module
pub mod dto;

/// Error handling module
pub mod errors;

/// Request extractors for identity and origin
pub mod extract;

/// Web API handlers module
pub mod handlers;

/// Logging setup
pub mod logging;

/// Uploaded file storage
pub mod media;

/// Data models module
pub mod models;

/// Repository module for database operations
pub mod repo;

/// Database schema module
pub mod schema;

/// Shared handler state
pub mod state;

/// Create-request parsing and validation
pub mod submission;

#[cfg(test)]
mod test_utils;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::warn;

pub use errors::ApiError;
pub use state::AppState;

use handlers::*;

/// Router settings that are not needed by any handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppOptions {
    /// Largest accepted request body in bytes
    pub max_upload_bytes: usize,

    /// Origins allowed to call the API from a browser; empty adds no CORS layer
    pub cors_allowed_origins: Vec<String>,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            max_upload_bytes: 10 * 1024 * 1024,
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl AppOptions {
    pub fn from_config(config: &config::Config) -> Self {
        Self {
            max_upload_bytes: config.max_upload_bytes(),
            cors_allowed_origins: config.cors_allowed_origins.clone(),
        }
    }
}

/// Builds the CORS layer for the configured origins
///
/// `*` allows any origin. Entries that are not valid header values are
/// skipped with a warning.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin {:?}", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers(Any)
}

/// Creates the application router with all routes
///
/// This function sets up the Axum router with all the API endpoints and
/// mounts the media directory at its URL prefix.
///
/// ### Arguments
///
/// * `state` - Pool, media store and identity settings shared with all handlers
/// * `options` - Body size limit and CORS origins
///
/// ### Returns
///
/// An Axum Router configured with all routes and the state attached
pub fn create_app(state: AppState, options: AppOptions) -> Router {
    let media_files = ServeDir::new(state.media.root());
    let media_prefix = state.media.url_prefix().trim_end_matches('/').to_string();

    let router = Router::new()
        // Read API
        .route("/listings/", get(list_listings_handler))
        .route("/listings/approved/", get(list_approved_listings_handler))
        .route("/listings/mine/", get(list_my_listings_handler))
        .route("/listings/pending/", get(list_pending_listings_handler))
        // Write API
        .route("/listings/create/", post(create_listing_handler))
        // Moderation API
        .route("/listings/{id}/approve/", patch(approve_listing_handler))
        .route("/listings/{id}/reject/", patch(reject_listing_handler))
        .route("/listings/stats/", get(listing_stats_handler));

    // Nesting at the root is not allowed, so a bare "/" prefix becomes the fallback
    let router = if media_prefix.is_empty() {
        router.fallback_service(media_files)
    } else {
        router.nest_service(&media_prefix, media_files)
    };

    let router = router
        .layer(DefaultBodyLimit::max(options.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if options.cors_allowed_origins.is_empty() {
        router
    } else {
        router.layer(cors_layer(&options.cors_allowed_origins))
    }
}

/// Runs the embedded migrations
///
/// This function applies all pending database migrations to set up the schema.
///
/// ### Arguments
///
/// * `conn` - A mutable reference to a SQLite connection
///
/// ### Errors
///
/// Returns an error if any migration fails to apply
pub fn run_migrations(conn: &mut diesel::SqliteConnection) -> anyhow::Result<()> {
    use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

    // Define the embedded migrations
    const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_state;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_media_files_are_served() {
        let (state, _media_dir) = setup_test_state();
        let path = state.media.store_image(Some("cat.png"), b"meow").await.unwrap();
        let app = create_app(state, AppOptions::default());

        let request = Request::builder()
            .uri(format!("/media/{}", path))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"meow");
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let (state, _media_dir) = setup_test_state();
        let app = create_app(state, AppOptions::default());

        let request = Request::builder().uri("/nope/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_wrong_method_is_rejected() {
        let (state, _media_dir) = setup_test_state();
        let app = create_app(state, AppOptions::default());

        let request = Request::builder()
            .method("POST")
            .uri("/listings/")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_cors_layer_only_when_configured() {
        let preflight = || {
            Request::builder()
                .method("OPTIONS")
                .uri("/listings/")
                .header(header::ORIGIN, "https://shop.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap()
        };

        let (state, _media_dir) = setup_test_state();
        let app = create_app(state, AppOptions::default());
        let response = app.oneshot(preflight()).await.unwrap();
        assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());

        let (state, _media_dir) = setup_test_state();
        let options = AppOptions {
            cors_allowed_origins: vec!["https://shop.example".to_string()],
            ..AppOptions::default()
        };
        let app = create_app(state, options);
        let response = app.oneshot(preflight()).await.unwrap();
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://shop.example"
        );
    }

    #[test]
    fn test_run_migrations_is_repeatable() {
        use diesel::Connection;

        let mut conn = diesel::SqliteConnection::establish(":memory:").unwrap();
        run_migrations(&mut conn).unwrap();
        run_migrations(&mut conn).unwrap();
    }
}
