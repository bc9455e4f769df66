use crate::db::DbPool;
use crate::models::{ListingImage, NewListingImage};
use crate::schema::listing_images;
use diesel::prelude::*;
use anyhow::Result;
use tracing::{instrument, debug};

/// Records a stored image file against a listing
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `listing_id` - The listing the image belongs to
/// * `image_path` - Path of the stored file, relative to the media root
///
/// ### Errors
///
/// Returns an error if:
/// - Unable to get a connection from the pool
/// - The listing does not exist (foreign key violation)
/// - The database insert operation fails
#[instrument(skip(pool))]
pub fn add_listing_image(pool: &DbPool, listing_id: i32, image_path: String) -> Result<ListingImage> {
    let conn = &mut pool.get()?;

    let image = diesel::insert_into(listing_images::table)
        .values(NewListingImage::new(listing_id, image_path))
        .returning(ListingImage::as_returning())
        .get_result(conn)?;

    debug!("Recorded image {} for listing {}", image.get_id(), listing_id);

    Ok(image)
}

/// Lists a listing's images in upload order
#[instrument(skip(pool))]
pub fn list_images_for_listing(pool: &DbPool, listing_id: i32) -> Result<Vec<ListingImage>> {
    let conn = &mut pool.get()?;

    let images = listing_images::table
        .filter(listing_images::listing_id.eq(listing_id))
        .order(listing_images::id.asc())
        .select(ListingImage::as_select())
        .load(conn)?;

    Ok(images)
}
