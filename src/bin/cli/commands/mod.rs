pub mod listing;
pub mod moderation;
