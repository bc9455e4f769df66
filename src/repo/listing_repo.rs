use crate::db::DbPool;
use crate::models::{Listing, ListingImage, ListingStatus, NewListing};
use crate::schema::{listing_images, listings};
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use anyhow::Result;
use tracing::{instrument, debug, info};

/// Which listings a query should return
///
/// Empty fields do not filter. `status` is matched as text so that an
/// unrecognised status simply matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    /// Exact status to match
    pub status: Option<String>,

    /// Exact submitter to match
    pub listed_by: Option<String>,
}

impl ListingFilter {
    /// A filter matching one status
    pub fn with_status(status: ListingStatus) -> Self {
        Self {
            status: Some(status.as_str().to_string()),
            listed_by: None,
        }
    }

    /// A filter matching one submitter
    pub fn with_listed_by(listed_by: impl Into<String>) -> Self {
        Self {
            status: None,
            listed_by: Some(listed_by.into()),
        }
    }
}

/// Inserts a new listing and returns it as stored
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `new_listing` - The validated listing to insert
///
/// ### Returns
///
/// A Result containing the stored Listing, with its assigned ID
///
/// ### Errors
///
/// Returns an error if:
/// - Unable to get a connection from the pool
/// - The database insert operation fails
#[instrument(skip(pool, new_listing), fields(title = %new_listing.get_title(), listed_by = %new_listing.get_listed_by()))]
pub fn create_listing(pool: &DbPool, new_listing: &NewListing) -> Result<Listing> {
    debug!("Creating new listing");

    let conn = &mut pool.get()?;

    let listing = diesel::insert_into(listings::table)
        .values(new_listing)
        .returning(Listing::as_returning())
        .get_result(conn)?;

    info!("Created listing with id: {}", listing.get_id());

    Ok(listing)
}

/// Retrieves a listing by its ID
///
/// ### Returns
///
/// A Result containing an Option with the Listing if found, or None if not found
#[instrument(skip(pool))]
pub fn get_listing(pool: &DbPool, listing_id: i32) -> Result<Option<Listing>> {
    let conn = &mut pool.get()?;

    let result = listings::table
        .find(listing_id)
        .select(Listing::as_select())
        .first(conn)
        .optional()?;

    Ok(result)
}

/// Lists listings matching a filter, newest first
///
/// Listings created in the same instant come out highest ID first.
#[instrument(skip(pool))]
pub fn list_listings(pool: &DbPool, filter: &ListingFilter) -> Result<Vec<Listing>> {
    let conn = &mut pool.get()?;
    Ok(load_listings(conn, filter)?)
}

/// Listings matching `filter`, unordered and with every column
fn filtered_listings(filter: &ListingFilter) -> listings::BoxedQuery<'static, Sqlite> {
    let mut query = listings::table.into_boxed();

    if let Some(ref status) = filter.status {
        query = query.filter(listings::status.eq(status.clone()));
    }
    if let Some(ref listed_by) = filter.listed_by {
        query = query.filter(listings::listed_by.eq(listed_by.clone()));
    }

    query
}

fn load_listings(conn: &mut SqliteConnection, filter: &ListingFilter) -> QueryResult<Vec<Listing>> {
    let result = filtered_listings(filter)
        .order((listings::created_at.desc(), listings::id.desc()))
        .select(Listing::as_select())
        .load(conn)?;

    debug!("Loaded {} listings", result.len());

    Ok(result)
}

/// Lists listings matching a filter together with their images
///
/// Listings come back newest first, each with its images in upload order.
/// Images are selected with the same filter as a subquery, so the number of
/// bound parameters does not grow with the number of listings. Both reads
/// run in one transaction.
#[instrument(skip(pool))]
pub fn list_listings_with_images(
    pool: &DbPool,
    filter: &ListingFilter,
) -> Result<Vec<(Listing, Vec<ListingImage>)>> {
    let conn = &mut pool.get()?;

    let (found, images) = conn.transaction::<_, diesel::result::Error, _>(|conn| {
        let found = load_listings(conn, filter)?;

        let images = listing_images::table
            .filter(listing_images::listing_id.eq_any(filtered_listings(filter).select(listings::id)))
            .select(ListingImage::as_select())
            .order(listing_images::id.asc())
            .load(conn)?;

        Ok((found, images))
    })?;

    let grouped = images.grouped_by(&found);

    Ok(found.into_iter().zip(grouped).collect())
}

/// Moves a listing to a new moderation status
///
/// `updated_at` is refreshed even when the status does not change.
///
/// ### Returns
///
/// A Result containing the updated Listing, or None if no listing has that ID
#[instrument(skip(pool))]
pub fn set_listing_status(pool: &DbPool, listing_id: i32, status: ListingStatus) -> Result<Option<Listing>> {
    debug!("Updating listing status");

    let conn = &mut pool.get()?;
    let now = Utc::now().naive_utc();

    let updated = diesel::update(listings::table.find(listing_id))
        .set((listings::status.eq(status), listings::updated_at.eq(now)))
        .returning(Listing::as_returning())
        .get_result(conn)
        .optional()?;

    match updated {
        Some(ref listing) => info!("Listing {} is now {}", listing.get_id(), listing.get_status()),
        None => debug!("Listing not found"),
    }

    Ok(updated)
}
