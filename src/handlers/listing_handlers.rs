use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use axum_extra::extract::Query;
use std::sync::Arc;
use tracing::{instrument, debug, info, warn, error};

use crate::db::DbPool;
use crate::dto::{ListingDto, ListingQueryDto, MineQueryDto};
use crate::errors::ApiError;
use crate::extract::{CurrentUser, RequestOrigin};
use crate::media::MediaStore;
use crate::models::{Listing, ListingImage, ListingStatus};
use crate::repo::{self, ListingFilter};
use crate::submission::ListingSubmission;

/// Returned by `/listings/mine/` when there is no one to list for
pub const MINE_FORBIDDEN: &str = "Authentication required or provide listed_by parameter.";

/// Loads the listings matching `filter` and renders them for the wire
fn load_dtos(
    pool: &DbPool,
    media: &MediaStore,
    origin: &RequestOrigin,
    filter: &ListingFilter,
) -> Result<Vec<ListingDto>, ApiError> {
    let rows = repo::list_listings_with_images(pool, filter)
        .map_err(ApiError::Database)?;

    debug!("Found {} listings", rows.len());

    Ok(rows
        .iter()
        .map(|(listing, images)| ListingDto::new(listing, images, media, origin.as_deref()))
        .collect())
}

/// Handler for listing all listings
///
/// This function handles GET requests to `/listings/`.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `media` - Resolves image paths to URLs
/// * `origin` - Where the client reached us, for absolute image URLs
/// * `query` - Optional `status` filter; blank means no filter
///
/// ### Returns
///
/// The matching listings as JSON, newest first
#[instrument(skip(pool, media, origin))]
pub async fn list_listings_handler(
    State(pool): State<Arc<DbPool>>,
    State(media): State<Arc<MediaStore>>,
    origin: RequestOrigin,
    Query(query): Query<ListingQueryDto>,
) -> Result<Json<Vec<ListingDto>>, ApiError> {
    let filter = ListingFilter {
        status: query.status_filter(),
        listed_by: None,
    };
    Ok(Json(load_dtos(&pool, &media, &origin, &filter)?))
}

/// Handler for the public listing feed
///
/// This function handles GET requests to `/listings/approved/`.
#[instrument(skip(pool, media, origin))]
pub async fn list_approved_listings_handler(
    State(pool): State<Arc<DbPool>>,
    State(media): State<Arc<MediaStore>>,
    origin: RequestOrigin,
) -> Result<Json<Vec<ListingDto>>, ApiError> {
    let filter = ListingFilter::with_status(ListingStatus::Approved);
    Ok(Json(load_dtos(&pool, &media, &origin, &filter)?))
}

/// Handler for the moderation queue
///
/// This function handles GET requests to `/listings/pending/`.
#[instrument(skip(pool, media, origin))]
pub async fn list_pending_listings_handler(
    State(pool): State<Arc<DbPool>>,
    State(media): State<Arc<MediaStore>>,
    origin: RequestOrigin,
) -> Result<Json<Vec<ListingDto>>, ApiError> {
    let filter = ListingFilter::with_status(ListingStatus::Pending);
    Ok(Json(load_dtos(&pool, &media, &origin, &filter)?))
}

/// Handler for listing one submitter's listings
///
/// This function handles GET requests to `/listings/mine/`. The
/// authenticated user wins over the `listed_by` query parameter.
///
/// ### Returns
///
/// The submitter's listings as JSON, newest first, or 403 if neither an
/// identity nor a non-empty `listed_by` was given
#[instrument(skip(pool, media, origin))]
pub async fn list_my_listings_handler(
    State(pool): State<Arc<DbPool>>,
    State(media): State<Arc<MediaStore>>,
    user: CurrentUser,
    origin: RequestOrigin,
    Query(query): Query<MineQueryDto>,
) -> Result<Json<Vec<ListingDto>>, ApiError> {
    let owner = user
        .0
        .or(query.listed_by.filter(|name| !name.is_empty()))
        .ok_or_else(|| {
            warn!("Refusing to list listings without an owner");
            ApiError::Forbidden(MINE_FORBIDDEN.to_string())
        })?;

    Ok(Json(load_dtos(&pool, &media, &origin, &ListingFilter::with_listed_by(owner))?))
}

/// Handler for submitting a new listing
///
/// This function handles POST requests to `/listings/create/`. The body may
/// be JSON, a urlencoded form, or a multipart form with repeated `images`
/// file parts.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `media` - Where image files are written
/// * `user` - The authenticated submitter, if any
/// * `origin` - Where the client reached us, for absolute image URLs
/// * `submission` - The unvalidated request body
///
/// ### Returns
///
/// 201 with the stored listing and its images, or 400 with every field error
#[instrument(skip(pool, media, origin, submission), fields(images = submission.images().len()))]
pub async fn create_listing_handler(
    State(pool): State<Arc<DbPool>>,
    State(media): State<Arc<MediaStore>>,
    user: CurrentUser,
    origin: RequestOrigin,
    submission: ListingSubmission,
) -> Result<(StatusCode, Json<ListingDto>), ApiError> {
    let new_listing = submission.validate(user.as_deref()).map_err(|errors| {
        warn!("Rejected listing submission: {}", errors);
        ApiError::Validation(errors)
    })?;

    // Accepted as-is; sell and rent listings are expected to carry a price
    if new_listing.get_listing_type().expects_price() && new_listing.get_price().is_none() {
        warn!("{} listing submitted without a price", new_listing.get_listing_type());
    }

    let listing = repo::create_listing(&pool, &new_listing)
        .map_err(ApiError::Database)?;

    let images = store_images(&pool, &media, &listing, submission).await?;

    info!("Created listing {} with {} images", listing.get_id(), images.len());

    Ok((
        StatusCode::CREATED,
        Json(ListingDto::new(&listing, &images, &media, origin.as_deref())),
    ))
}

/// Writes each uploaded file and records it against the listing, in order
///
/// The listing row is already committed; a failure here leaves it with the
/// images stored so far.
async fn store_images(
    pool: &DbPool,
    media: &MediaStore,
    listing: &Listing,
    submission: ListingSubmission,
) -> Result<Vec<ListingImage>, ApiError> {
    let mut images = Vec::new();

    for upload in submission.into_images() {
        let path = media
            .store_image(upload.file_name.as_deref(), &upload.data)
            .await
            .map_err(|err| {
                error!("Listing {} was saved but an image could not be stored", listing.get_id());
                ApiError::Storage(err)
            })?;

        let image = repo::add_listing_image(pool, listing.get_id(), path)
            .map_err(|err| {
                error!("Listing {} was saved but an image could not be recorded", listing.get_id());
                ApiError::Database(err)
            })?;

        images.push(image);
    }

    Ok(images)
}
