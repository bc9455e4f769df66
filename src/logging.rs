use std::path::Path;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// File name prefix for the daily log files
const LOG_FILE_PREFIX: &str = "bazaar.log";

/// Filter used when `RUST_LOG` is not set
pub fn default_filter(debug: bool) -> &'static str {
    if debug {
        "bazaar=debug,tower_http=debug"
    } else {
        "bazaar=info,tower_http=info"
    }
}

/// Installs the global tracing subscriber
///
/// Human-readable logs always go to stdout. With a `log_dir`, the same events
/// are also written as JSON lines to a file that rolls over daily.
///
/// ### Returns
///
/// The file writer's guard, which must be held until shutdown so buffered
/// lines are flushed
///
/// ### Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(debug: bool, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(debug).into());

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().json().with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}
