use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::media::MediaStore;
use crate::models::{Listing, ListingImage, ListingStatus, ListingType, Price};

/// Query parameters accepted by `GET /listings/`
///
/// An empty `status` is treated the same as a missing one.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ListingQueryDto {
    /// Exact status to filter by
    pub status: Option<String>,
}

impl ListingQueryDto {
    /// The status filter, with blank values dropped
    pub fn status_filter(&self) -> Option<String> {
        self.status.clone().filter(|s| !s.is_empty())
    }
}

/// Query parameters accepted by `GET /listings/mine/`
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct MineQueryDto {
    /// Submitter to list for when the request carries no identity
    pub listed_by: Option<String>,
}

/// Data transfer object for creating a listing
///
/// This is what the CLI sends as a JSON body (or as multipart text parts when
/// images are attached). The server reads submissions more leniently, see
/// `ListingSubmission`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreateListingDto {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub listing_type: ListingType,

    /// Decimal price as typed by the user, e.g. "12.50"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listed_by: Option<String>,
}

impl CreateListingDto {
    /// The body as text fields, in the order a form would send them
    pub fn to_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("title", self.title.clone()),
            ("listing_type", self.listing_type.to_string()),
        ];
        if let Some(ref description) = self.description {
            fields.push(("description", description.clone()));
        }
        if let Some(ref price) = self.price {
            fields.push(("price", price.clone()));
        }
        if let Some(ref listed_by) = self.listed_by {
            fields.push(("listed_by", listed_by.clone()));
        }
        fields
    }
}

/// An image as returned by the API
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ListingImageDto {
    pub id: i32,

    /// Absolute URL when the request had a host, otherwise a URL path
    pub image: String,

    pub uploaded_at: DateTime<Utc>,
}

/// A listing as returned by the API, with its images
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ListingDto {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub listing_type: ListingType,
    pub price: Option<Price>,
    pub listed_by: String,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub images: Vec<ListingImageDto>,
}

impl ListingDto {
    /// Builds the wire form of a listing
    ///
    /// ### Arguments
    ///
    /// * `listing` - The stored listing
    /// * `images` - Its images, in the order they should be shown
    /// * `media` - Resolves stored paths to URL paths
    /// * `origin` - `scheme://host` of the request, if known
    pub fn new(listing: &Listing, images: &[ListingImage], media: &MediaStore, origin: Option<&str>) -> Self {
        let images = images
            .iter()
            .map(|image| ListingImageDto {
                id: image.get_id(),
                image: image_url(media, origin, &image.get_image()),
                uploaded_at: image.get_uploaded_at(),
            })
            .collect();

        Self {
            id: listing.get_id(),
            title: listing.get_title(),
            description: listing.get_description(),
            listing_type: listing.get_listing_type(),
            price: listing.get_price(),
            listed_by: listing.get_listed_by(),
            status: listing.get_status(),
            created_at: listing.get_created_at(),
            updated_at: listing.get_updated_at(),
            images,
        }
    }
}

/// Resolves a stored image path to the URL clients should fetch
fn image_url(media: &MediaStore, origin: Option<&str>, path: &str) -> String {
    let url_path = media.url_for(path);
    match origin {
        Some(origin) => format!("{}{}", origin.trim_end_matches('/'), url_path),
        None => url_path,
    }
}

/// Body returned by the approve and reject endpoints
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusDto {
    pub status: ListingStatus,
}

/// Number of listings created on one day
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyCount {
    /// UTC calendar day, serialized as YYYY-MM-DD
    pub date: NaiveDate,
    pub count: i64,
}

/// Moderation dashboard counters
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ListingStats {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,

    /// One entry per day, oldest first
    pub trend: Vec<DailyCount>,
}
