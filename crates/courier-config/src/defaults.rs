use crate::logging::LogFormat;

/// Environment variable naming the configuration file.
pub const ENV_CONFIG_PATH: &str = "COURIER_CONFIG_PATH";

/// Environment variable overriding the log filter.
pub const ENV_LOG_FILTER: &str = "COURIER_LOG_FILTER";

/// Environment variable overriding the log format.
pub const ENV_LOG_FORMAT: &str = "COURIER_LOG_FORMAT";

/// Environment variable naming the service manifest.
pub const ENV_MANIFEST: &str = "COURIER_MANIFEST";

/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression used by the binary.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binary.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}
