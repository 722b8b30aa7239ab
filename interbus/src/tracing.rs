//! Log setup for programs built on interbus.
//!
//! Library code only emits events; nothing here runs unless a binary such as
//! `interbus-scan` asks for it. Levels follow bus activity:
//!
//! - `trace`: every register exchange and probed device type
//! - `debug`: scan progress, busy retries, fallback to per-address probes
//! - `info`: resolved and verified bindings
//! - `warn`: ports skipped on open or left unclosed
//!
//! `RUST_LOG=interbus=trace` shows the raw traffic.

use std::env;
use time::OffsetDateTime;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt::{format::Writer, time::FormatTime},
    prelude::*,
};

pub mod prelude {
    #[allow(unused_imports)]
    pub use tracing::{debug, error, info, trace, warn};
}

use prelude::*;

/// Install the global subscriber: journald when started by systemd
/// (`JOURNAL_STREAM` set), stdout otherwise.
pub fn init_journald_or_stdout() {
    if env::var("JOURNAL_STREAM").is_ok() {
        if let Ok(layer) = tracing_journald::layer() {
            let layer = layer.with_syslog_identifier("interbus".to_owned());
            tracing_subscriber::registry().with(layer).init();
        } else {
            use_stdout();
            error!("Failed to initialize journald logging, using stdout.");
        }
    } else {
        use_stdout();
    }
}

// RUST_LOG wins; without it only bindings and failures are shown.
fn use_stdout() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var("RUST_LOG")
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_timer(LocalTimer))
        .init();
}

// Local time to the millisecond; bus exchanges are a few ms apart.
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let stamp = now
            .format(time::macros::format_description!(
                "[hour]:[minute]:[second].[subsecond digits:3]"
            ))
            .map_err(|_| std::fmt::Error)?;
        w.write_str(&stamp)
    }
}
