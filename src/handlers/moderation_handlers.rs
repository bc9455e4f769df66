use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{instrument, debug, info};

use crate::db::DbPool;
use crate::dto::{ListingStats, StatusDto};
use crate::errors::ApiError;
use crate::models::ListingStatus;
use crate::repo;

/// Moves a listing to `status`, answering 404 for unknown or non-numeric IDs
fn moderate(pool: &DbPool, id: &str, status: ListingStatus) -> Result<Json<StatusDto>, ApiError> {
    let listing_id: i32 = id.parse().map_err(|_| {
        debug!("Listing id {:?} is not a number", id);
        ApiError::NotFound
    })?;

    let listing = repo::set_listing_status(pool, listing_id, status)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    info!("Listing {} marked {}", listing.get_id(), status);

    Ok(Json(StatusDto { status: listing.get_status() }))
}

/// Handler for approving a listing
///
/// This function handles PATCH requests to `/listings/{id}/approve/`.
/// Approving an already approved listing succeeds and refreshes its
/// `updated_at`.
///
/// ### Returns
///
/// `{"status": "approved"}`, or 404 if there is no such listing
#[instrument(skip(pool), fields(listing_id = %id))]
pub async fn approve_listing_handler(
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<String>,
) -> Result<Json<StatusDto>, ApiError> {
    moderate(&pool, &id, ListingStatus::Approved)
}

/// Handler for rejecting a listing
///
/// This function handles PATCH requests to `/listings/{id}/reject/`.
#[instrument(skip(pool), fields(listing_id = %id))]
pub async fn reject_listing_handler(
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<String>,
) -> Result<Json<StatusDto>, ApiError> {
    moderate(&pool, &id, ListingStatus::Rejected)
}

/// Handler for the moderation dashboard counters
///
/// This function handles GET requests to `/listings/stats/`. The trend
/// covers the seven UTC days ending today.
#[instrument(skip(pool))]
pub async fn listing_stats_handler(
    State(pool): State<Arc<DbPool>>,
) -> Result<Json<ListingStats>, ApiError> {
    let today = Utc::now().date_naive();
    let stats = repo::listing_stats(&pool, today)
        .map_err(ApiError::Database)?;
    Ok(Json(stats))
}
