use anyhow::anyhow;
use chrono::Timelike;
use std::str::FromStr;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::{format::Writer, time::FormatTime};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct SystemTime;

impl FormatTime for SystemTime {
    fn format_time(&self, w: &mut Writer<'_>) -> core::fmt::Result {
        let time = chrono::prelude::Local::now();
        write!(
            w,
            "{:02}:{:02}:{:02}.{:03}",
            time.hour() % 24,
            time.minute(),
            time.second(),
            time.timestamp_subsec_millis()
        )
    }
}

/// Install the stderr logger. `RUST_LOG` overrides `v2sync=<level>`.
pub fn init_tracing(level: &str) -> anyhow::Result<()> {
    let directive = Directive::from_str(&format!("v2sync={}", level))
        .map_err(|_| anyhow!("Invalid log level: {}", level))?;
    let stderr_layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_timer(SystemTime);
    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(
            EnvFilter::builder()
                .with_default_directive(directive)
                .from_env_lossy(),
        )
        .init();
    Ok(())
}
