//! Logging Infrastructure
//!
//! Structured logging setup for development and production:
//! - console output with env-based filtering
//! - optional daily-rotating JSON file logs in production

use std::fs;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Build the optional daily-rotating JSON file layer.
///
/// Generic over the subscriber `S` so the same layer can be attached to
/// either the JSON or human-readable console stack (each produces a
/// distinct subscriber type).
fn build_file_layer<S>(
    level: &str,
    log_dir: Option<&str>,
) -> anyhow::Result<Option<Box<dyn Layer<S> + Send + Sync + 'static>>>
where
    S: tracing::Subscriber + for<'span> LookupSpan<'span>,
{
    let layer = match log_dir {
        Some(dir) => {
            let dir = Path::new(dir);
            fs::create_dir_all(dir)?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, "fulfillment.log");
            Some(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_writer(appender)
                    .with_filter(EnvFilter::new(level.to_string()))
                    .boxed(),
            )
        }
        None => None,
    };
    Ok(layer)
}

/// Initialize the logging system
///
/// # Arguments
/// * `level` - default log level when `RUST_LOG` is unset (e.g. "info")
/// * `json_format` - JSON output (production) vs human-readable (development)
/// * `log_dir` - optional directory for daily-rotating file logs
pub fn init_logger(level: &str, json_format: bool, log_dir: Option<&str>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json_format {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(true))
            .with(build_file_layer(level, log_dir)?)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(true))
            .with(build_file_layer(level, log_dir)?)
            .init();
    }

    Ok(())
}
