//! File-based logging setup.
//!
//! The embedding application owns the screen, so logs go to a rotating file
//! instead of stdout. Call [`init_logging`] once from the composition root
//! before constructing the player.

use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const LOG_DIR: &str = ".logs";
const LOG_FILE_PREFIX: &str = "spotyda";

/// Initialize the logging system.
///
/// Logs are written to `.logs/spotyda.YYYY-MM-DD.log` with daily rotation.
/// The log level can be controlled via the `RUST_LOG` environment variable;
/// the default keeps this crate at DEBUG and everything else at WARN.
pub fn init_logging() -> anyhow::Result<()> {
    let log_dir = Path::new(LOG_DIR);
    if !log_dir.exists() {
        std::fs::create_dir_all(log_dir)?;
    }

    let file_appender = RollingFileAppender::new(Rotation::DAILY, LOG_DIR, LOG_FILE_PREFIX);

    // Non-blocking writer so the async runtime never stalls on log I/O.
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The guard must outlive the process; leak it instead of storing it.
    Box::leak(Box::new(guard));

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("spotyda_core=debug,reqwest=info,warn"));

    let fmt_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();

    tracing::info!("Logging initialized - logs written to {}/", LOG_DIR);

    Ok(())
}
