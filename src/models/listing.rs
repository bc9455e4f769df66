use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;

use super::{ListingStatus, ListingType, Price};
use crate::schema::listings;

/// A marketplace submission as stored in the `listings` table
///
/// Fields are read through getters; only the repository layer writes them,
/// which keeps `status` and the timestamps out of client hands.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = listings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Listing {
    /// Store-assigned identifier
    id: i32,

    /// Short headline for the item
    title: String,

    /// Free-text details, empty when the submitter gave none
    description: String,

    /// What the submitter wants to do with the item
    listing_type: ListingType,

    /// Asking price, if any
    price: Option<Price>,

    /// Username of the submitter, or "anonymous"
    listed_by: String,

    /// Moderation state
    status: ListingStatus,

    /// When the listing was submitted
    created_at: NaiveDateTime,

    /// When the listing last changed
    updated_at: NaiveDateTime,
}

impl Listing {
    /// Gets the listing's ID
    pub fn get_id(&self) -> i32 {
        self.id
    }

    /// Gets the listing's title
    pub fn get_title(&self) -> String {
        self.title.clone()
    }

    /// Gets the listing's description
    pub fn get_description(&self) -> String {
        self.description.clone()
    }

    /// Gets the kind of listing
    pub fn get_listing_type(&self) -> ListingType {
        self.listing_type
    }

    /// Gets the asking price
    pub fn get_price(&self) -> Option<Price> {
        self.price
    }

    /// Gets who submitted the listing
    pub fn get_listed_by(&self) -> String {
        self.listed_by.clone()
    }

    /// Gets the moderation status
    pub fn get_status(&self) -> ListingStatus {
        self.status
    }

    /// Gets the creation timestamp as a DateTime<Utc>
    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }

    /// Gets the last-update timestamp as a DateTime<Utc>
    pub fn get_updated_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.updated_at, Utc)
    }
}

/// A listing ready to be inserted
///
/// There is no way to choose the status: every new listing starts out
/// pending.
#[derive(Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = listings)]
pub struct NewListing {
    title: String,
    description: String,
    listing_type: ListingType,
    price: Option<Price>,
    listed_by: String,
    status: ListingStatus,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl NewListing {
    /// Creates a pending listing stamped with the current time
    ///
    /// ### Arguments
    ///
    /// * `title` - The listing headline
    /// * `description` - Free-text details (may be empty)
    /// * `listing_type` - What the submitter wants to do with the item
    /// * `price` - Optional asking price
    /// * `listed_by` - Who submitted it
    pub fn new(
        title: String,
        description: String,
        listing_type: ListingType,
        price: Option<Price>,
        listed_by: String,
    ) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            title,
            description,
            listing_type,
            price,
            listed_by,
            status: ListingStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Gets the title that will be stored
    pub fn get_title(&self) -> &str {
        &self.title
    }

    /// Gets the kind of listing that will be stored
    pub fn get_listing_type(&self) -> ListingType {
        self.listing_type
    }

    /// Gets the price that will be stored
    pub fn get_price(&self) -> Option<Price> {
        self.price
    }

    /// Gets the submitter that will be stored
    pub fn get_listed_by(&self) -> &str {
        &self.listed_by
    }

    /// Gets the status that will be stored, which is always pending
    pub fn get_status(&self) -> ListingStatus {
        self.status
    }
}
