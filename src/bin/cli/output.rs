use bazaar::dto::{ListingDto, ListingStats, StatusDto};
use clap::ValueEnum;
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

/// Bundled output configuration passed to all print functions
#[derive(Debug, Clone, Copy)]
pub struct OutputConfig {
    /// The output format
    pub format: OutputFormat,
    /// When true, print minimal output (just IDs or counts)
    pub quiet: bool,
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Could not encode output: {}", e),
    }
}

fn price_text(listing: &ListingDto) -> String {
    listing.price.map_or_else(|| "-".to_string(), |p| p.to_string())
}

/// Prints a list of listings in the specified format
pub fn print_listings(listings: &[ListingDto], config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if listings.is_empty() {
                if !config.quiet {
                    println!("No listings found.");
                }
                return;
            }
            if config.quiet {
                for listing in listings {
                    println!("{}", listing.id);
                }
                return;
            }
            let max_id = listings.iter().map(|l| l.id.to_string().len()).max().unwrap_or(2).max(2);
            let max_title = listings.iter().map(|l| l.title.chars().count()).max().unwrap_or(5).max(5);
            println!(
                "{:<id_w$}  {:<title_w$}  {:<7}  {:>12}  {:<8}  LISTED BY",
                "ID", "TITLE", "TYPE", "PRICE", "STATUS",
                id_w = max_id,
                title_w = max_title,
            );
            for listing in listings {
                println!(
                    "{:<id_w$}  {:<title_w$}  {:<7}  {:>12}  {:<8}  {}",
                    listing.id,
                    listing.title,
                    listing.listing_type.as_str(),
                    price_text(listing),
                    listing.status.as_str(),
                    listing.listed_by,
                    id_w = max_id,
                    title_w = max_title,
                );
            }
        }
        OutputFormat::Json => print_json(listings),
    }
}

/// Prints a single listing in the specified format
pub fn print_listing(listing: &ListingDto, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", listing.id);
                return;
            }
            println!("ID:          {}", listing.id);
            println!("Title:       {}", listing.title);
            if !listing.description.is_empty() {
                println!("Description: {}", listing.description);
            }
            println!("Type:        {}", listing.listing_type);
            println!("Price:       {}", price_text(listing));
            println!("Listed by:   {}", listing.listed_by);
            println!("Status:      {}", listing.status);
            println!("Created:     {}", listing.created_at);
            println!("Updated:     {}", listing.updated_at);
            for image in &listing.images {
                println!("Image:       {}", image.image);
            }
        }
        OutputFormat::Json => print_json(listing),
    }
}

/// Prints the result of a moderation action
pub fn print_status(id: i32, status: &StatusDto, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", status.status);
            } else {
                println!("Listing {} is now {}.", id, status.status);
            }
        }
        OutputFormat::Json => print_json(status),
    }
}

/// Prints the moderation counters and trend
pub fn print_stats(stats: &ListingStats, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", stats.pending);
                return;
            }
            println!("Total:    {}", stats.total);
            println!("Pending:  {}", stats.pending);
            println!("Approved: {}", stats.approved);
            println!("Rejected: {}", stats.rejected);
            println!();
            println!("Created per day:");
            for day in &stats.trend {
                println!("  {}  {}", day.date, day.count);
            }
        }
        OutputFormat::Json => print_json(stats),
    }
}
