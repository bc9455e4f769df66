use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;

use super::Listing;
use crate::schema::listing_images;

/// An image attached to a listing
///
/// `image` holds the path of the stored file relative to the media root, not
/// a URL; URLs depend on the request and are built when serializing.
#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq, Eq)]
#[diesel(belongs_to(Listing))]
#[diesel(table_name = listing_images)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ListingImage {
    id: i32,
    listing_id: i32,
    image: String,
    uploaded_at: NaiveDateTime,
}

impl ListingImage {
    /// Gets the image's ID
    pub fn get_id(&self) -> i32 {
        self.id
    }

    /// Gets the ID of the listing this image belongs to
    pub fn get_listing_id(&self) -> i32 {
        self.listing_id
    }

    /// Gets the stored file path, relative to the media root
    pub fn get_image(&self) -> String {
        self.image.clone()
    }

    /// Gets the upload timestamp as a DateTime<Utc>
    pub fn get_uploaded_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.uploaded_at, Utc)
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = listing_images)]
pub struct NewListingImage {
    listing_id: i32,
    image: String,
    uploaded_at: NaiveDateTime,
}

impl NewListingImage {
    /// Creates an image record for a stored file, stamped with the current time
    pub fn new(listing_id: i32, image: String) -> Self {
        Self {
            listing_id,
            image,
            uploaded_at: Utc::now().naive_utc(),
        }
    }
}
