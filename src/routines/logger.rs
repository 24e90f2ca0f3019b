//! Logging routines

use crate::error::Result;
use crate::routines::settings::Settings;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Setup logging for a campaign run.
///
/// Uses the `tracing` crate, with `tracing-subscriber` for formatting.
/// The log level comes from the settings and defaults to `info`; if a log
/// file is configured it is truncated and receives a plain-text copy of the
/// stream. Installing the global subscriber is an application concern, so
/// library entry points never call this.
pub fn setup_log(settings: &Settings) -> Result<()> {
    let env_filter = EnvFilter::new(&settings.log.level);
    let subscriber = Registry::default().with(env_filter);

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(false)
        .with_timer(CompactTimestamp);

    match &settings.log.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)?;
            let file_layer = fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_timer(CompactTimestamp);
            subscriber.with(stdout_layer).with(file_layer).init();
        }
        None => subscriber.with(stdout_layer).init(),
    }

    tracing::debug!("Logging is configured with level: {}", settings.log.level);
    Ok(())
}

#[derive(Clone)]
struct CompactTimestamp;

impl FormatTime for CompactTimestamp {
    fn format_time(
        &self,
        w: &mut tracing_subscriber::fmt::format::Writer<'_>,
    ) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S"))
    }
}
