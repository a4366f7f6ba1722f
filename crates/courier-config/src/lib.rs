//! Layered configuration for the `courier` command-line tool.
//!
//! [`Config`] derives its loader from [`ortho_config`]. Values resolve from
//! four layers, lowest precedence first:
//!
//! 1. built-in defaults,
//! 2. a TOML configuration file (`--config-path`, `COURIER_CONFIG_PATH`, or a
//!    discovered `.courier.toml`),
//! 3. `COURIER_*` environment variables,
//! 4. command-line flags (`--log-filter`, `--log-format`, `--manifest`).
//!
//! Each layer only overrides the fields it sets.

mod defaults;
mod logging;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use ortho_config::OrthoError;

pub use self::defaults::{
    DEFAULT_LOG_FILTER, ENV_CONFIG_PATH, ENV_LOG_FILTER, ENV_LOG_FORMAT, ENV_MANIFEST,
    default_log_filter, default_log_filter_string, default_log_format,
};
pub use self::logging::{LogFormat, LogFormatParseError};

/// Resolved configuration shared by every command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(prefix = "COURIER")]
pub struct Config {
    /// Tracing filter directive, such as `info` or `courier_core=debug`.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for log records.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Service manifest used when a command does not name one.
    pub manifest: Option<Utf8PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            manifest: None,
        }
    }
}

impl Config {
    /// Returns the tracing filter directive.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Returns the log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns the configured manifest path. An empty value from any layer
    /// counts as unset.
    #[must_use]
    pub fn manifest(&self) -> Option<&Utf8Path> {
        self.manifest
            .as_deref()
            .filter(|path| !path.as_str().is_empty())
    }
}
