//! Tracing initialization.

use anyhow::{Result, anyhow};
use courier_core::config::LogFormat;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Filter comes from `RUST_LOG` (default `info`).
///
/// Fails if a global subscriber is already installed.
pub fn init(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match format {
        LogFormat::Json => builder
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .try_init(),
        LogFormat::Text => builder.try_init(),
    }
    .map_err(|e| anyhow!(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_reported() {
        // Only this test installs a subscriber in this binary.
        init(LogFormat::Text).unwrap();
        let err = init(LogFormat::Json).unwrap_err();
        assert!(!err.to_string().is_empty());
    }
}
