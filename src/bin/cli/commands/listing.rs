use std::path::PathBuf;

use bazaar::dto::CreateListingDto;
use bazaar::models::ListingType;
use clap::Subcommand;

use crate::client::BazaarClient;
use crate::output::{self, OutputConfig};

/// Listing commands
#[derive(Subcommand, Debug)]
pub enum ListingCommands {
    /// List all listings
    List {
        /// Only show listings with this status (pending, approved, rejected)
        #[clap(long)]
        status: Option<String>,
    },
    /// List approved listings
    Approved,
    /// List listings awaiting moderation
    Pending,
    /// List one submitter's listings
    Mine {
        /// The submitter to list for
        #[clap(long)]
        listed_by: String,
    },
    /// Submit a new listing
    Create {
        /// Headline of the listing
        #[clap(long)]
        title: String,
        /// What to do with the item
        #[clap(long = "type", value_parser = parse_listing_type)]
        listing_type: ListingType,
        /// Asking price, e.g. 12.50
        #[clap(long)]
        price: Option<String>,
        /// Longer description
        #[clap(long)]
        description: Option<String>,
        /// Who is submitting it
        #[clap(long)]
        listed_by: Option<String>,
        /// Image file to attach; may be repeated
        #[clap(long = "image")]
        images: Vec<PathBuf>,
    },
}

fn parse_listing_type(value: &str) -> Result<ListingType, String> {
    value.parse::<ListingType>().map_err(|e| e.to_string())
}

/// Executes a listing command
pub async fn execute(
    client: &BazaarClient,
    cmd: ListingCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ListingCommands::List { status } => {
            let listings = client.list_listings(status.as_deref()).await?;
            output::print_listings(&listings, config);
        }
        ListingCommands::Approved => {
            let listings = client.list_approved().await?;
            output::print_listings(&listings, config);
        }
        ListingCommands::Pending => {
            let listings = client.list_pending().await?;
            output::print_listings(&listings, config);
        }
        ListingCommands::Mine { listed_by } => {
            let listings = client.list_mine(&listed_by).await?;
            output::print_listings(&listings, config);
        }
        ListingCommands::Create {
            title,
            listing_type,
            price,
            description,
            listed_by,
            images,
        } => {
            let dto = CreateListingDto {
                title,
                description,
                listing_type,
                price,
                listed_by,
            };
            let listing = client.create_listing(&dto, &images).await?;
            output::print_listing(&listing, config);
        }
    }
    Ok(())
}
