use std::{path::Path, sync::LazyLock};

use anyhow::{anyhow, Result};
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::{
    fmt::{format::FmtSpan, writer::MakeWriterExt},
    EnvFilter,
};

pub const CLI_PREFIX: &str = "cli";
pub const SERVER_PREFIX: &str = "server";

const DEFAULT_LEVEL: &str = "info";
const MAX_LOG_FILES: usize = 5;

/// Filter directive for the crate. An explicit level wins, then `RUST_LOG`. A `RUST_LOG` that
/// already names targets is used as is.
fn log_directive(log_level: Option<LevelFilter>, rust_log: Option<String>) -> String {
    let target = env!("CARGO_PKG_NAME").replace('-', "_");
    match (log_level, rust_log) {
        (Some(level), _) => format!("{target}={level}"),
        (None, Some(value)) if value.contains('=') => value,
        (None, Some(value)) if !value.trim().is_empty() => format!("{target}={}", value.trim()),
        _ => format!("{target}={DEFAULT_LEVEL}"),
    }
}

/// Writes logs into daily rotated files `<data_dir>/logs/<prefix>.*`, and also into stdout if
/// `show_std` is set.
pub fn enable_logging(
    prefix: &str,
    data_dir: &Path,
    log_level: Option<LevelFilter>,
    show_std: bool,
) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(prefix)
        .build(data_dir.join("logs"))?;

    let stdout = std::io::stdout.with_filter(move |_| show_std);
    let directive = log_directive(log_level, std::env::var("RUST_LOG").ok());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&directive)?)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(stdout.and(appender))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to install logging: {e}"))
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .pretty()
        .try_init();
});
