//! Logging setup for tether services.

use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Logging options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Only errors are logged. Overrides everything else.
    pub quiet: bool,
    /// 0 = info, 1 = debug, 2+ = trace. Ignored when `RUST_LOG` is set.
    pub verbosity: u8,
    /// Extra comma-separated filter directives, e.g. `tether_eip=trace`.
    pub filter: Option<String>,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl LogConfig {
    /// Builds the filter for this config.
    ///
    /// Precedence: `quiet`, then `RUST_LOG` or the verbosity level, then
    /// `filter` directives on top.
    pub fn env_filter(&self) -> Result<EnvFilter> {
        if self.quiet {
            return Ok(EnvFilter::new("error"));
        }

        let base_level = match self.verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        let mut filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(base_level));

        if let Some(custom) = &self.filter {
            for directive in custom.split(',').map(str::trim).filter(|d| !d.is_empty()) {
                let directive = directive
                    .parse()
                    .wrap_err_with(|| format!("invalid log directive {directive:?}"))?;
                filter = filter.add_directive(directive);
            }
        }
        Ok(filter)
    }
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = config.env_filter()?;

    let layer = fmt::Layer::new().with_target(true);
    let layer = if config.json {
        layer.json().boxed()
    } else {
        layer.with_ansi(true).boxed()
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()
        .wrap_err("failed to install tracing subscriber")?;
    Ok(())
}

/// Routes logs to the test harness. Safe to call from every test.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_wins() {
        let config = LogConfig {
            quiet: true,
            verbosity: 3,
            ..Default::default()
        };
        assert_eq!(config.env_filter().unwrap().to_string(), "error");
    }

    #[test]
    fn test_bad_directive_is_an_error() {
        let config = LogConfig {
            filter: Some("tether_eip=loud".into()),
            ..Default::default()
        };
        assert!(config.env_filter().is_err());
    }

    #[test]
    fn test_from_toml() {
        let config: LogConfig = toml::from_str("verbosity = 1\njson = true").unwrap();
        assert_eq!(config.verbosity, 1);
        assert!(config.json);
        assert_eq!(config.filter, None);
    }

    #[test]
    fn test_init_test_logging_twice() {
        init_test_logging();
        init_test_logging();
        tracing::info!("still fine");
    }
}
