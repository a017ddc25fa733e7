use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// File prefix of the rotating installer logs.
pub const LOG_PREFIX: &str = "ezbcoin";

/// Pick the filter: `RUST_LOG` when set, otherwise `debug` or `info`.
fn env_filter(debug_mode: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if debug_mode { "debug" } else { "info" })
    })
}

/// Install the global subscriber.
///
/// Everything goes to a daily rotating file under `log_dir`. The terminal
/// belongs to the prompts and subprocess output, so a stderr layer is only
/// added in debug mode.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the whole run.
pub fn init_logging(log_dir: &Utf8Path, debug_mode: bool) -> Result<WorkerGuard> {
    if !log_dir.exists() {
        fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir))?;
    }

    let file_appender = rolling::daily(log_dir, LOG_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    let console_layer = debug_mode.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(env_filter(debug_mode))
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    tracing::info!(
        "Logging initialized: dir={}, prefix={}, debug={}",
        log_dir,
        LOG_PREFIX,
        debug_mode
    );

    Ok(guard)
}
