/// Repository module
///
/// This module provides the data access layer for the application.
/// It contains functions for creating, querying and moderating listings
/// and for recording the images attached to them.
///
/// Every function takes the connection pool and checks a connection out for
/// the duration of the call; none of them hold state between calls.

mod listing_repo;
mod listing_image_repo;
mod stats_repo;

// Re-export all repository functions
pub use listing_repo::*;
pub use listing_image_repo::*;
pub use stats_repo::*;
