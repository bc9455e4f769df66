use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use directories::ProjectDirs;
use clap::Parser;
use std::fs;
use thiserror::Error;
use tracing::{info, warn};

/// Name of the config file inside the platform config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration for the Bazaar server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// URL for the database connection
    pub database_url: String,
    /// Address the HTTP server listens on
    pub bind_address: String,
    /// Directory uploaded images are written under
    pub media_root: PathBuf,
    /// URL path the media directory is served at
    pub media_url: String,
    /// Trusted header carrying the authenticated user; empty disables identity
    pub identity_header: String,
    /// Largest accepted request body, in megabytes
    pub max_upload_mb: u64,
    /// Origins allowed to make cross-origin requests; empty disables CORS
    pub cors_allowed_origins: Vec<String>,
    /// Directory for JSON log files; `None` logs to stdout only
    pub log_dir: Option<PathBuf>,
}

/// Update structure for Config with all fields optional
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub bind_address: Option<String>,
    #[serde(default)]
    pub media_root: Option<PathBuf>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub identity_header: Option<String>,
    #[serde(default)]
    pub max_upload_mb: Option<u64>,
    #[serde(default)]
    pub cors_allowed_origins: Option<Vec<String>>,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    /// Server the CLI talks to; ignored by the server itself
    #[serde(default)]
    pub server_url: Option<String>,
}

/// Command line arguments for the server
#[derive(Parser, Debug, Default)]
#[clap(name = "bazaar", about = "Marketplace listing service")]
pub struct CliArgs {
    /// Database URL
    #[clap(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Address to listen on, e.g. 0.0.0.0:8000
    #[clap(long, env = "BAZAAR_BIND_ADDRESS")]
    pub bind_address: Option<String>,

    /// Directory uploaded images are stored in
    #[clap(long, env = "BAZAAR_MEDIA_ROOT")]
    pub media_root: Option<PathBuf>,

    /// URL path images are served under
    #[clap(long, env = "BAZAAR_MEDIA_URL")]
    pub media_url: Option<String>,

    /// Trusted header naming the authenticated user (empty to disable)
    #[clap(long, env = "BAZAAR_IDENTITY_HEADER")]
    pub identity_header: Option<String>,

    /// Largest accepted request body in megabytes
    #[clap(long, env = "BAZAAR_MAX_UPLOAD_MB")]
    pub max_upload_mb: Option<u64>,

    /// Comma separated origins allowed to call the API from a browser
    #[clap(long, env = "BAZAAR_CORS_ALLOWED_ORIGINS", value_delimiter = ',')]
    pub cors_allowed_origins: Option<Vec<String>>,

    /// Directory to write daily JSON log files to
    #[clap(long, env = "BAZAAR_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Debug mode
    #[clap(long, env = "BAZAAR_DEBUG", default_value_t = false)]
    pub debug: bool,
}

/// Errors raised while loading the config file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl Config {
    /// Applies a config update to the current configuration
    pub fn apply_update(self, update: ConfigUpdate) -> Self {
        Self {
            database_url: update.database_url.unwrap_or(self.database_url),
            bind_address: update.bind_address.unwrap_or(self.bind_address),
            media_root: update.media_root.unwrap_or(self.media_root),
            media_url: update.media_url.unwrap_or(self.media_url),
            identity_header: update.identity_header.unwrap_or(self.identity_header),
            max_upload_mb: update.max_upload_mb.unwrap_or(self.max_upload_mb),
            cors_allowed_origins: update.cors_allowed_origins.unwrap_or(self.cors_allowed_origins),
            log_dir: update.log_dir.or(self.log_dir),
        }
    }

    /// Returns the upload limit in bytes
    pub fn max_upload_bytes(&self) -> usize {
        let bytes = self.max_upload_mb.saturating_mul(1024 * 1024);
        usize::try_from(bytes).unwrap_or(usize::MAX)
    }
}

/// Returns the base (default) configuration
///
/// With a data directory the database and media live inside it, otherwise
/// in the working directory.
pub fn base_config(data_path: Option<PathBuf>) -> Config {
    let database_url = data_path
        .as_ref()
        .map_or("bazaar.db".to_string(), |path| path.join("bazaar.db").to_string_lossy().to_string());
    let media_root = data_path.map_or(PathBuf::from("media"), |path| path.join("media"));

    Config {
        database_url,
        bind_address: "127.0.0.1:8000".to_string(),
        media_root,
        media_url: "/media/".to_string(),
        identity_header: "x-authenticated-user".to_string(),
        max_upload_mb: 10,
        cors_allowed_origins: Vec::new(),
        log_dir: None,
    }
}

/// Loads configuration from a TOML file
///
/// A missing path or missing file is not an error; it just contributes
/// nothing.
pub fn config_from_file(config_path: Option<PathBuf>) -> Result<ConfigUpdate, ConfigError> {
    let Some(config_path) = config_path else {
        return Ok(ConfigUpdate::default());
    };

    if !config_path.exists() {
        info!("Config file not found at {:?}, using defaults", config_path);
        return Ok(ConfigUpdate::default());
    }

    let content = fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
        path: config_path.clone(),
        source,
    })?;

    let update = toml::from_str::<ConfigUpdate>(&content).map_err(|source| ConfigError::Parse {
        path: config_path.clone(),
        source,
    })?;

    info!("Loaded configuration from {:?}", config_path);
    Ok(update)
}

/// Loads configuration from command line arguments
pub fn config_from_args(args: &CliArgs) -> ConfigUpdate {
    ConfigUpdate {
        database_url: args.database_url.clone(),
        bind_address: args.bind_address.clone(),
        media_root: args.media_root.clone(),
        media_url: args.media_url.clone(),
        identity_header: args.identity_header.clone(),
        max_upload_mb: args.max_upload_mb,
        cors_allowed_origins: args.cors_allowed_origins.clone(),
        log_dir: args.log_dir.clone(),
        server_url: None,
    }
}

/// Returns the platform config directory, if one can be determined
pub fn get_config_dir_path() -> Option<PathBuf> {
    match ProjectDirs::from("com", "bazaar", "bazaar") {
        Some(proj_dirs) => Some(proj_dirs.config_dir().to_path_buf()),
        None => {
            warn!("Could not determine XDG config directory, skipping config file");
            None
        }
    }
}

/// Gets the complete configuration by combining defaults with
/// values from config file, environment variables, and command line arguments
/// in order of increasing precedence
///
/// A config file that exists but cannot be read or parsed is reported and
/// skipped.
pub fn get_config(args: &CliArgs) -> Config {
    let config_path = get_config_dir_path().and_then(|path| {
        if !path.exists() {
            info!("Config path not found at {:?}, using defaults", path);
            None
        } else {
            Some(path)
        }
    });

    let base = base_config(config_path.clone());

    let file_update = config_from_file(config_path.map(|path| path.join(CONFIG_FILE_NAME)))
        .unwrap_or_else(|e| {
            warn!("{}", e);
            ConfigUpdate::default()
        });

    // Apply updates in order of increasing precedence
    let config = base
        .apply_update(file_update)
        .apply_update(config_from_args(args));

    info!(
        "Final configuration: database_url={}, bind_address={}, media_root={}, media_url={}, max_upload_mb={}",
        config.database_url,
        config.bind_address,
        config.media_root.display(),
        config.media_url,
        config.max_upload_mb,
    );

    config
}

#[cfg(test)]
mod tests;
