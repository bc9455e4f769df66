mod client;
mod commands;
mod output;

use clap::{Parser, Subcommand};
use client::{BazaarClient, ClientError};
use bazaar::config;
use output::{OutputConfig, OutputFormat};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::process;

/// Where `bazaar` listens when nothing else is configured
const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// CLI for the Bazaar marketplace listing service
#[derive(Parser, Debug)]
#[clap(name = "bazaar-cli", about = "CLI for the Bazaar marketplace")]
struct Cli {
    /// Server URL to connect to
    #[clap(
        long,
        env = "BAZAAR_URL",
        global = true
    )]
    server_url: Option<String>,

    /// Output format
    #[clap(long, value_enum, default_value_t = OutputFormat::Human, global = true)]
    format: OutputFormat,

    /// Quiet mode: minimal output (just IDs or counts)
    #[clap(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Browse and submit listings
    #[command(subcommand)]
    Listing(commands::listing::ListingCommands),
    /// Approve, reject and review stats
    #[command(subcommand)]
    Moderate(commands::moderation::ModerationCommands),
}

/// Reads the shared `config.toml`, if there is one
///
/// A file that cannot be read or parsed is reported and then ignored, so a
/// broken server config never stops the CLI from running with a flag.
fn load_file_config() -> Option<config::ConfigUpdate> {
    let path = config::get_config_dir_path()?.join(config::CONFIG_FILE_NAME);
    match config::config_from_file(Some(path)) {
        Ok(update) => Some(update),
        Err(e) => {
            eprintln!("Warning: {}", e);
            None
        }
    }
}

/// URL for reaching a server bound to `bind_address` from this machine
///
/// Wildcard addresses are swapped for loopback. Returns `None` when the
/// address is not an `ip:port` pair.
fn local_url_for_bind(bind_address: &str) -> Option<String> {
    let mut addr: SocketAddr = bind_address.parse().ok()?;
    if addr.ip().is_unspecified() {
        let loopback = match addr.ip() {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::LOCALHOST),
        };
        addr.set_ip(loopback);
    }
    Some(format!("http://{}", addr))
}

/// Picks the server to talk to
///
/// Precedence: `--server-url` / `BAZAAR_URL`, then `server_url` from the
/// config file, then the `bind_address` the server itself is configured
/// with, then the server's default address.
fn resolve_server_url(cli_url: Option<String>, file: Option<config::ConfigUpdate>) -> String {
    if let Some(url) = cli_url {
        return url;
    }

    let file = file.unwrap_or_default();
    file.server_url
        .or_else(|| file.bind_address.as_deref().and_then(local_url_for_bind))
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
}

/// Formats an error for stderr
///
/// Connection failures name the server that was tried, and a 404 from a
/// moderation command points at the listing ID.
fn format_error(err: &(dyn std::error::Error + 'static), server_url: &str) -> String {
    match err.downcast_ref::<ClientError>() {
        Some(ClientError::Request(e)) if e.is_connect() || e.is_timeout() => format!(
            "Could not connect to the bazaar server at {}. Is it running?\n  {}",
            server_url, e
        ),
        Some(ClientError::Server { status, .. }) if *status == reqwest::StatusCode::NOT_FOUND => {
            format!("No such listing on {} (HTTP 404)", server_url)
        }
        _ => err.to_string(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let server_url = match cli.server_url {
        Some(url) => url,
        None => resolve_server_url(None, load_file_config()),
    };
    let client = BazaarClient::new(server_url.clone());
    let output_config = OutputConfig {
        format: cli.format,
        quiet: cli.quiet,
    };

    let result = match cli.command {
        Commands::Listing(cmd) => commands::listing::execute(&client, cmd, &output_config).await,
        Commands::Moderate(cmd) => commands::moderation::execute(&client, cmd, &output_config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", format_error(e.as_ref(), &server_url));
        process::exit(1);
    }
}
