//! Declarative configuration loading from YAML, TOML, and environment variables.
//!
//! File configuration goes through serde mirror structs that are converted into
//! [`ClientConfig`](crate::config::ClientConfig) with the builder API, so files and code share
//! one set of validation rules.
//!
//! # Supported Formats
//!
//! - **YAML** (requires `config-file` feature): `ClientConfig::from_yaml("openwire.yaml")`
//! - **TOML** (requires `config-file` feature): `ClientConfig::from_toml("openwire.toml")`
//! - **Environment Variables** (always available): `ClientConfig::from_env()`
//!
//! # Example YAML
//!
//! ```yaml
//! wire-format-version: 12
//! max-frame-size: 104857600
//! response-timeout-ms: 30000
//! dispatch-statistics: true
//! wire-format:
//!   cache-size: 1024
//!   stack-trace-enabled: true
//!   tcp-no-delay-enabled: true
//!   max-inactivity-duration-ms: 30000
//!   max-inactivity-duration-initial-delay-ms: 10000
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ClientConfig, ClientConfigBuilder, ConfigError};

/// Top-level file-based configuration.
///
/// Mirrors [`ClientConfig`](crate::config::ClientConfig) with serde-friendly types and is
/// converted into it via [`TryFrom`].
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct FileConfig {
    /// Highest protocol version offered during negotiation.
    pub wire_format_version: Option<u32>,
    /// Largest frame accepted or sent, in bytes.
    pub max_frame_size: Option<usize>,
    /// Response timeout in milliseconds.
    pub response_timeout_ms: Option<u64>,
    /// Whether the dispatcher keeps delivery statistics.
    pub dispatch_statistics: Option<bool>,
    /// Advertised wire-format options.
    pub wire_format: Option<FileWireFormatConfig>,
}

/// Wire-format section of a [`FileConfig`].
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct FileWireFormatConfig {
    pub tight_encoding_enabled: Option<bool>,
    pub cache_enabled: Option<bool>,
    pub cache_size: Option<i32>,
    pub size_prefix_disabled: Option<bool>,
    pub stack_trace_enabled: Option<bool>,
    pub tcp_no_delay_enabled: Option<bool>,
    pub max_inactivity_duration_ms: Option<u64>,
    pub max_inactivity_duration_initial_delay_ms: Option<u64>,
}

impl TryFrom<FileConfig> for ClientConfig {
    type Error = ConfigError;

    fn try_from(file: FileConfig) -> Result<Self, Self::Error> {
        let mut builder = ClientConfigBuilder::new();

        if let Some(version) = file.wire_format_version {
            builder = builder.wire_format_version(version);
        }
        if let Some(size) = file.max_frame_size {
            builder = builder.max_frame_size(size);
        }
        if let Some(ms) = file.response_timeout_ms {
            builder = builder.response_timeout(Duration::from_millis(ms));
        }
        if let Some(enabled) = file.dispatch_statistics {
            builder = builder.dispatch_statistics(enabled);
        }

        if let Some(wf) = file.wire_format {
            builder = builder.wire_format(|mut w| {
                if let Some(v) = wf.tight_encoding_enabled {
                    w = w.tight_encoding_enabled(v);
                }
                if let Some(v) = wf.cache_enabled {
                    w = w.cache_enabled(v);
                }
                if let Some(v) = wf.cache_size {
                    w = w.cache_size(v);
                }
                if let Some(v) = wf.size_prefix_disabled {
                    w = w.size_prefix_disabled(v);
                }
                if let Some(v) = wf.stack_trace_enabled {
                    w = w.stack_trace_enabled(v);
                }
                if let Some(v) = wf.tcp_no_delay_enabled {
                    w = w.tcp_no_delay_enabled(v);
                }
                if let Some(ms) = wf.max_inactivity_duration_ms {
                    w = w.max_inactivity_duration(Duration::from_millis(ms));
                }
                if let Some(ms) = wf.max_inactivity_duration_initial_delay_ms {
                    w = w.max_inactivity_duration_initial_delay(Duration::from_millis(ms));
                }
                w
            });
        }

        builder.build()
    }
}

impl ClientConfig {
    /// Loads configuration from a YAML file.
    ///
    /// Requires the `config-file` feature.
    #[cfg(feature = "config-file")]
    pub fn from_yaml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::new(format!("failed to read YAML config file: {e}"))
        })?;
        let file_config: FileConfig = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("failed to parse YAML config: {e}")))?;
        file_config.try_into()
    }

    /// Loads configuration from a TOML file.
    ///
    /// Requires the `config-file` feature.
    #[cfg(feature = "config-file")]
    pub fn from_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::new(format!("failed to read TOML config file: {e}"))
        })?;
        let file_config: FileConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("failed to parse TOML config: {e}")))?;
        file_config.try_into()
    }

    /// Loads configuration from environment variables.
    ///
    /// This method is always available (no feature flag required). Unset variables keep their
    /// defaults; a variable that does not parse is an error.
    ///
    /// # Supported Environment Variables
    ///
    /// | Variable | Maps to |
    /// |----------|---------|
    /// | `OPENWIRE_WIRE_FORMAT_VERSION` | `wire_format_version` |
    /// | `OPENWIRE_MAX_FRAME_SIZE` | `max_frame_size` in bytes |
    /// | `OPENWIRE_RESPONSE_TIMEOUT_MS` | Response timeout in milliseconds |
    /// | `OPENWIRE_DISPATCH_STATISTICS` | `"true"` or `"false"` |
    /// | `OPENWIRE_TIGHT_ENCODING_ENABLED` | `"true"` or `"false"` |
    /// | `OPENWIRE_CACHE_ENABLED` | `"true"` or `"false"` |
    /// | `OPENWIRE_CACHE_SIZE` | Advertised marshal cache size |
    /// | `OPENWIRE_MAX_INACTIVITY_DURATION_MS` | Inactivity period in milliseconds |
    pub fn from_env() -> Result<Self, ConfigError> {
        file_config_from_vars(|name| std::env::var(name).ok())?.try_into()
    }
}

fn file_config_from_vars<F>(lookup: F) -> Result<FileConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut file_config = FileConfig::default();

    if let Some(val) = lookup("OPENWIRE_WIRE_FORMAT_VERSION") {
        file_config.wire_format_version = Some(parse_var("OPENWIRE_WIRE_FORMAT_VERSION", &val)?);
    }

    if let Some(val) = lookup("OPENWIRE_MAX_FRAME_SIZE") {
        file_config.max_frame_size = Some(parse_var("OPENWIRE_MAX_FRAME_SIZE", &val)?);
    }

    if let Some(val) = lookup("OPENWIRE_RESPONSE_TIMEOUT_MS") {
        file_config.response_timeout_ms = Some(parse_var("OPENWIRE_RESPONSE_TIMEOUT_MS", &val)?);
    }

    if let Some(val) = lookup("OPENWIRE_DISPATCH_STATISTICS") {
        file_config.dispatch_statistics = Some(val.eq_ignore_ascii_case("true"));
    }

    if let Some(val) = lookup("OPENWIRE_TIGHT_ENCODING_ENABLED") {
        file_config
            .wire_format
            .get_or_insert_with(Default::default)
            .tight_encoding_enabled = Some(val.eq_ignore_ascii_case("true"));
    }

    if let Some(val) = lookup("OPENWIRE_CACHE_ENABLED") {
        file_config
            .wire_format
            .get_or_insert_with(Default::default)
            .cache_enabled = Some(val.eq_ignore_ascii_case("true"));
    }

    if let Some(val) = lookup("OPENWIRE_CACHE_SIZE") {
        file_config
            .wire_format
            .get_or_insert_with(Default::default)
            .cache_size = Some(parse_var("OPENWIRE_CACHE_SIZE", &val)?);
    }

    if let Some(val) = lookup("OPENWIRE_MAX_INACTIVITY_DURATION_MS") {
        file_config
            .wire_format
            .get_or_insert_with(Default::default)
            .max_inactivity_duration_ms =
            Some(parse_var("OPENWIRE_MAX_INACTIVITY_DURATION_MS", &val)?);
    }

    Ok(file_config)
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::new(format!("{name} has an invalid value: {value:?}")))
}

/// Loads a configuration file, choosing the format by extension.
///
/// Requires the `config-file` feature.
#[cfg(feature = "config-file")]
pub fn load_config<P: AsRef<std::path::Path>>(path: P) -> Result<ClientConfig, ConfigError> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => ClientConfig::from_yaml(path),
        Some("toml") => ClientConfig::from_toml(path),
        Some(ext) => Err(ConfigError::new(format!(
            "unsupported config file extension: .{ext} (expected .yaml, .yml, or .toml)"
        ))),
        None => Err(ConfigError::new(
            "config file has no extension; expected .yaml, .yml, or .toml",
        )),
    }
}
