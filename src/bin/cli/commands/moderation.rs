use clap::Subcommand;

use crate::client::BazaarClient;
use crate::output::{self, OutputConfig};

/// Moderation commands
#[derive(Subcommand, Debug)]
pub enum ModerationCommands {
    /// Approve a listing
    Approve {
        /// The listing ID
        id: i32,
    },
    /// Reject a listing
    Reject {
        /// The listing ID
        id: i32,
    },
    /// Show moderation counters and the 7-day trend
    Stats,
}

/// Executes a moderation command
pub async fn execute(
    client: &BazaarClient,
    cmd: ModerationCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ModerationCommands::Approve { id } => {
            let status = client.approve_listing(id).await?;
            output::print_status(id, &status, config);
        }
        ModerationCommands::Reject { id } => {
            let status = client.reject_listing(id).await?;
            output::print_status(id, &status, config);
        }
        ModerationCommands::Stats => {
            let stats = client.stats().await?;
            output::print_stats(&stats, config);
        }
    }
    Ok(())
}
