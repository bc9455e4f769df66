use crate::*;
use crate::models::{ListingType, NewListing, Price};
use crate::schema::listings;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// Sets up a test database with migrations applied
///
/// This function:
/// 1. Creates an in-memory SQLite database
/// 2. Enables foreign key constraints (through the pool's connection customizer)
/// 3. Runs all migrations to set up the schema
///
/// ### Returns
///
/// An Arc-wrapped database connection pool connected to the in-memory database
pub fn setup_test_db() -> Arc<db::DbPool> {
    // Use a unique shared in-memory database for each test.
    // Plain ":memory:" gives each connection its own separate database,
    // so migrations run on one connection wouldn't be visible on others.
    // By using a unique URI with cache=shared, all connections in this pool
    // share the same in-memory database while remaining isolated from other tests.
    let unique_id = uuid::Uuid::new_v4();
    let database_url = format!("file:test_{}?mode=memory&cache=shared", unique_id);
    let pool = db::init_pool(&database_url).expect("Failed to build pool");

    let mut conn = pool.get().expect("Failed to get connection");
    run_migrations(&mut conn).expect("Failed to run migrations");

    Arc::new(pool)
}

/// Sets up application state backed by a fresh database and a temporary media root
///
/// The returned `TempDir` must be kept alive for as long as the state is used.
pub fn setup_test_state() -> (AppState, TempDir) {
    let pool = setup_test_db();
    let media_dir = tempfile::tempdir().expect("Failed to create media dir");
    let media = media::MediaStore::new(media_dir.path(), "/media/");
    let state = AppState::new(pool, media, "X-Authenticated-User")
        .expect("Failed to build state");
    (state, media_dir)
}

/// Builds a pending listing ready for insertion
pub fn new_listing(title: &str, listing_type: ListingType, price: Option<&str>, listed_by: &str) -> NewListing {
    let price = price.map(|p| p.parse::<Price>().expect("valid test price"));
    NewListing::new(title.to_string(), String::new(), listing_type, price, listed_by.to_string())
}

/// Overwrites a listing's creation time so ordering and trend tests are deterministic
pub fn set_created_at(pool: &db::DbPool, listing_id: i32, created_at: NaiveDateTime) {
    let conn = &mut pool.get().unwrap();
    diesel::update(listings::table.find(listing_id))
        .set(listings::created_at.eq(created_at))
        .execute(conn)
        .unwrap();
}


use diesel::sql_types::Text;
use diesel::QueryableByName;

#[derive(QueryableByName, Debug)]
struct TableName {
    #[diesel(sql_type = Text)]
    name: String,
}

/// Tests the setup_test_db function
///
/// This test verifies that:
/// 1. The test database can be created and connected to
/// 2. The database has the expected tables
/// 3. Foreign keys are switched on for pooled connections
/// 4. The app can serve a request against it
#[tokio::test]
async fn test_setup_test_db() {
    let (state, _media_dir) = setup_test_state();
    let pool = state.pool.clone();

    let mut conn = pool.get().unwrap();

    let table_names: Vec<TableName> = diesel::sql_query("SELECT name FROM sqlite_master WHERE type='table'")
        .load(&mut conn)
        .expect("Failed to load table names");

    let expected_tables = vec![
        "listings", "listing_images",
        "__diesel_schema_migrations" // Diesel's migration tracking table
    ];

    for table in expected_tables {
        let exists = table_names.iter().any(|t| t.name == table);
        assert!(exists, "Table '{}' not found in database", table);

        let query = format!("SELECT COUNT(*) FROM {}", table);
        let result = diesel::sql_query(&query).execute(&mut conn);
        assert!(result.is_ok(), "Failed to query table '{}': {:?}", table, result.err());
    }

    #[derive(QueryableByName)]
    struct ForeignKeys {
        #[diesel(sql_type = diesel::sql_types::Integer)]
        foreign_keys: i32,
    }
    let fk: ForeignKeys = diesel::sql_query("PRAGMA foreign_keys")
        .get_result(&mut conn)
        .unwrap();
    assert_eq!(fk.foreign_keys, 1);

    drop(conn);

    let app = create_app(state, AppOptions::default());

    let request = Request::builder()
        .uri("/listings/")
        .method("GET")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
