//! Tracing setup for the `courier` binary.
//!
//! Log records go to stderr so stdout only carries command output. A process
//! installs at most one subscriber: the settings of the first successful call
//! stay in effect, and later calls with different settings are noted at
//! `debug` and otherwise ignored.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;

use courier_config::{Config, LogFormat};

/// Settings of the installed subscriber.
static INSTALLED: OnceCell<Settings> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Eq)]
struct Settings {
    filter: String,
    format: LogFormat,
}

impl From<&Config> for Settings {
    fn from(config: &Config) -> Self {
        Self {
            filter: config.log_filter().to_owned(),
            format: config.log_format(),
        }
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub(crate) enum TelemetryError {
    /// The configured log filter is not a valid directive.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Another subscriber already owns the process.
    #[error("failed to install telemetry subscriber: {0}")]
    Install(String),
}

/// Installs the subscriber described by `config` unless one is installed.
pub(crate) fn initialise(config: &Config) -> Result<(), TelemetryError> {
    let requested = Settings::from(config);
    let installed = INSTALLED.get_or_try_init(|| install(&requested).map(|()| requested.clone()))?;
    if *installed != requested {
        debug!(
            filter = installed.filter.as_str(),
            format = %installed.format,
            "telemetry already initialised; keeping earlier settings"
        );
    }
    Ok(())
}

fn install(settings: &Settings) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(&settings.filter)
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339());

    let installed = match settings.format {
        LogFormat::Json => builder.json().flatten_event(true).try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    installed.map_err(|error| TelemetryError::Install(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_initialisation_succeeds() {
        let config = Config::default();
        initialise(&config).expect("first initialisation");
        let compact = Config {
            log_format: LogFormat::Compact,
            ..Config::default()
        };
        initialise(&compact).expect("later initialisation");
        assert!(INSTALLED.get().is_some());
    }

    #[test]
    fn rejects_invalid_filters() {
        let settings = Settings {
            filter: "courier=loud".to_owned(),
            format: LogFormat::Compact,
        };
        let err = install(&settings).expect_err("invalid filter");
        assert!(matches!(err, TelemetryError::Filter(_)));
    }
}
