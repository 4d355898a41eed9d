use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::utils::error::AppError;
use crate::Result;

/// Builds the filter: `RUST_LOG` wins, otherwise `level` for this crate and
/// warnings for everything else.
pub fn env_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => level_filter(level),
    }
}

/// `level` for this crate, warnings for everything else.
fn level_filter(level: &str) -> Result<EnvFilter> {
    let directive = format!("grandtrain_watcher={}", level)
        .parse::<Directive>()
        .map_err(|e| AppError::Parse {
            message: format!("Invalid log level '{}': {}", level, e),
        })?;

    Ok(EnvFilter::new("warn").add_directive(directive))
}

/// Logs to stdout and to `directory/file_name`. Keep the guard alive for the
/// lifetime of the process or buffered file lines are lost.
pub fn init_tracing(config: &LoggingConfig) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&config.directory)?;

    let file_appender = tracing_appender::rolling::never(&config.directory, &config.file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(env_filter(&config.level)?)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()
        .map_err(|e| AppError::Internal(format!("Failed to install tracing subscriber: {}", e)))?;

    Ok(guard)
}
