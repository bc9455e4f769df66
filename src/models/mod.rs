/// Data models module
///
/// This module defines the records stored for the marketplace: listings,
/// the images attached to them, and the typed columns they are built from.

mod choices;
pub use choices::{ListingStatus, ListingType, UnknownChoice};

mod price;
pub use price::{Price, PriceError};

mod listing;
pub use listing::{Listing, NewListing};

mod listing_image;
pub use listing_image::{ListingImage, NewListingImage};
