use std::env;

use tracing::{debug, level_filters::LevelFilter};
use tracing_subscriber::{
    filter::Directive,
    fmt::{format::Writer, time::FormatTime},
    EnvFilter,
};

/// Target prefix of every event this crate emits.
pub const LOG_TARGET: &str = env!("CARGO_CRATE_NAME");

struct WriterTimer;

impl FormatTime for WriterTimer {
    fn format_time(&self, writer: &mut Writer<'_>) -> std::fmt::Result {
        write!(writer, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Filter enabling this crate's events at `log_level` and nothing else, plus any
/// comma separated `extra` directives in `RUST_LOG` syntax. Unparseable ones are skipped.
pub fn log_filter(log_level: LevelFilter, extra: Option<&str>) -> EnvFilter {
    let mut filter = EnvFilter::new(format!("{}={}", LOG_TARGET, log_level));

    for raw in extra.unwrap_or_default().split(',').map(str::trim).filter(|d| !d.is_empty()) {
        match raw.parse::<Directive>() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => debug!("Ignoring log directive {}: {}", raw, e),
        }
    }

    filter
}

/// Installs a global fmt subscriber showing batch writer events at `log_level`.
/// Directives in `RUST_LOG` are added on top. Calling this twice is harmless.
pub fn setup_logger(log_level: LevelFilter) {
    let extra = env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(log_level, extra.as_deref());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(WriterTimer)
        .with_target(true)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        debug!("A global subscriber is already installed, keeping it");
    }
}

pub fn setup_info_logger() {
    setup_logger(LevelFilter::INFO);
}
