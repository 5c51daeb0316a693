//! Client configuration types and builders.

use std::time::Duration;

use openwire_core::commands::wire_format_properties as props;
use openwire_core::commands::WireFormatInfo;
use openwire_core::protocol::{DEFAULT_MAX_FRAME_SIZE, DEFAULT_VERSION, MAX_VERSION, MIN_VERSION};
use openwire_core::OpenWireError;

/// Default response timeout.
const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);
/// Default size of the marshal cache advertised to the peer.
const DEFAULT_CACHE_SIZE: i32 = 1024;
/// Default inactivity period after which a silent connection is considered dead.
const DEFAULT_MAX_INACTIVITY_DURATION: Duration = Duration::from_secs(30);
/// Default delay before inactivity monitoring starts.
const DEFAULT_MAX_INACTIVITY_INITIAL_DELAY: Duration = Duration::from_secs(10);

/// Configuration error returned when validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for OpenWireError {
    fn from(err: ConfigError) -> Self {
        OpenWireError::Configuration(err.message)
    }
}

/// Wire-format options advertised to the peer in the `WireFormatInfo` handshake.
///
/// Tight encoding and marshal caching are only advertised; a connection whose negotiation turns
/// either on is refused, since commands are always loosely encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireFormatConfig {
    tight_encoding_enabled: bool,
    cache_enabled: bool,
    cache_size: i32,
    size_prefix_disabled: bool,
    stack_trace_enabled: bool,
    tcp_no_delay_enabled: bool,
    max_inactivity_duration: Duration,
    max_inactivity_duration_initial_delay: Duration,
}

impl WireFormatConfig {
    /// Returns whether tight encoding is advertised.
    pub fn tight_encoding_enabled(&self) -> bool {
        self.tight_encoding_enabled
    }

    /// Returns whether marshal caching is advertised.
    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    /// Returns the advertised marshal cache size.
    pub fn cache_size(&self) -> i32 {
        self.cache_size
    }

    /// Returns whether frames are sent without a length prefix.
    pub fn size_prefix_disabled(&self) -> bool {
        self.size_prefix_disabled
    }

    /// Returns whether broker exceptions should carry stack traces.
    pub fn stack_trace_enabled(&self) -> bool {
        self.stack_trace_enabled
    }

    /// Returns whether `TCP_NODELAY` is requested.
    pub fn tcp_no_delay_enabled(&self) -> bool {
        self.tcp_no_delay_enabled
    }

    /// Returns the inactivity period after which the connection is considered dead.
    pub fn max_inactivity_duration(&self) -> Duration {
        self.max_inactivity_duration
    }

    /// Returns the delay before inactivity monitoring starts.
    pub fn max_inactivity_duration_initial_delay(&self) -> Duration {
        self.max_inactivity_duration_initial_delay
    }
}

impl Default for WireFormatConfig {
    fn default() -> Self {
        Self {
            tight_encoding_enabled: false,
            cache_enabled: false,
            cache_size: DEFAULT_CACHE_SIZE,
            size_prefix_disabled: false,
            stack_trace_enabled: true,
            tcp_no_delay_enabled: true,
            max_inactivity_duration: DEFAULT_MAX_INACTIVITY_DURATION,
            max_inactivity_duration_initial_delay: DEFAULT_MAX_INACTIVITY_INITIAL_DELAY,
        }
    }
}

impl From<WireFormatConfig> for WireFormatConfigBuilder {
    fn from(config: WireFormatConfig) -> Self {
        Self {
            tight_encoding_enabled: Some(config.tight_encoding_enabled),
            cache_enabled: Some(config.cache_enabled),
            cache_size: Some(config.cache_size),
            size_prefix_disabled: Some(config.size_prefix_disabled),
            stack_trace_enabled: Some(config.stack_trace_enabled),
            tcp_no_delay_enabled: Some(config.tcp_no_delay_enabled),
            max_inactivity_duration: Some(config.max_inactivity_duration),
            max_inactivity_duration_initial_delay: Some(
                config.max_inactivity_duration_initial_delay,
            ),
        }
    }
}

/// Builder for `WireFormatConfig`.
#[derive(Debug, Clone, Default)]
pub struct WireFormatConfigBuilder {
    tight_encoding_enabled: Option<bool>,
    cache_enabled: Option<bool>,
    cache_size: Option<i32>,
    size_prefix_disabled: Option<bool>,
    stack_trace_enabled: Option<bool>,
    tcp_no_delay_enabled: Option<bool>,
    max_inactivity_duration: Option<Duration>,
    max_inactivity_duration_initial_delay: Option<Duration>,
}

impl WireFormatConfigBuilder {
    /// Creates a new wire-format configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertises tight encoding.
    pub fn tight_encoding_enabled(mut self, enabled: bool) -> Self {
        self.tight_encoding_enabled = Some(enabled);
        self
    }

    /// Advertises marshal caching.
    pub fn cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = Some(enabled);
        self
    }

    /// Sets the advertised marshal cache size.
    pub fn cache_size(mut self, size: i32) -> Self {
        self.cache_size = Some(size);
        self
    }

    /// Advertises frames without a length prefix.
    pub fn size_prefix_disabled(mut self, disabled: bool) -> Self {
        self.size_prefix_disabled = Some(disabled);
        self
    }

    /// Requests stack traces in broker exceptions.
    pub fn stack_trace_enabled(mut self, enabled: bool) -> Self {
        self.stack_trace_enabled = Some(enabled);
        self
    }

    /// Requests `TCP_NODELAY`.
    pub fn tcp_no_delay_enabled(mut self, enabled: bool) -> Self {
        self.tcp_no_delay_enabled = Some(enabled);
        self
    }

    /// Sets the inactivity period. Zero disables inactivity monitoring.
    pub fn max_inactivity_duration(mut self, duration: Duration) -> Self {
        self.max_inactivity_duration = Some(duration);
        self
    }

    /// Sets the delay before inactivity monitoring starts.
    pub fn max_inactivity_duration_initial_delay(mut self, delay: Duration) -> Self {
        self.max_inactivity_duration_initial_delay = Some(delay);
        self
    }

    /// Builds the wire-format configuration, returning an error if validation fails.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `cache_size` is negative
    /// - `size_prefix_disabled` is set, since frames are always length-prefixed
    pub fn build(self) -> Result<WireFormatConfig, ConfigError> {
        let defaults = WireFormatConfig::default();
        let cache_size = self.cache_size.unwrap_or(defaults.cache_size);
        let size_prefix_disabled = self
            .size_prefix_disabled
            .unwrap_or(defaults.size_prefix_disabled);

        if cache_size < 0 {
            return Err(ConfigError::new("cache_size must not be negative"));
        }

        if size_prefix_disabled {
            return Err(ConfigError::new(
                "size_prefix_disabled is not supported: frames are always length-prefixed",
            ));
        }

        Ok(WireFormatConfig {
            tight_encoding_enabled: self
                .tight_encoding_enabled
                .unwrap_or(defaults.tight_encoding_enabled),
            cache_enabled: self.cache_enabled.unwrap_or(defaults.cache_enabled),
            cache_size,
            size_prefix_disabled,
            stack_trace_enabled: self
                .stack_trace_enabled
                .unwrap_or(defaults.stack_trace_enabled),
            tcp_no_delay_enabled: self
                .tcp_no_delay_enabled
                .unwrap_or(defaults.tcp_no_delay_enabled),
            max_inactivity_duration: self
                .max_inactivity_duration
                .unwrap_or(defaults.max_inactivity_duration),
            max_inactivity_duration_initial_delay: self
                .max_inactivity_duration_initial_delay
                .unwrap_or(defaults.max_inactivity_duration_initial_delay),
        })
    }
}

/// Configuration for an OpenWire client connection.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    wire_format_version: u32,
    max_frame_size: usize,
    response_timeout: Duration,
    dispatch_statistics: bool,
    wire_format: WireFormatConfig,
}

impl ClientConfig {
    /// Creates a new client configuration builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Returns the highest protocol version this client offers.
    pub fn wire_format_version(&self) -> u32 {
        self.wire_format_version
    }

    /// Returns the largest frame accepted or sent, in bytes.
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Returns how long a request waits for its response.
    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    /// Returns whether the dispatcher keeps delivery statistics.
    pub fn dispatch_statistics(&self) -> bool {
        self.dispatch_statistics
    }

    /// Returns the advertised wire-format options.
    pub fn wire_format(&self) -> &WireFormatConfig {
        &self.wire_format
    }

    /// Builds the `WireFormatInfo` this client sends when a connection opens.
    pub fn local_wire_format_info(&self) -> WireFormatInfo {
        let wire_format = &self.wire_format;
        let mut info = WireFormatInfo::new(self.wire_format_version as i32);
        info.set_property(props::TIGHT_ENCODING_ENABLED, wire_format.tight_encoding_enabled);
        info.set_property(props::CACHE_ENABLED, wire_format.cache_enabled);
        info.set_property(props::CACHE_SIZE, wire_format.cache_size);
        info.set_property(props::SIZE_PREFIX_DISABLED, wire_format.size_prefix_disabled);
        info.set_property(props::STACK_TRACE_ENABLED, wire_format.stack_trace_enabled);
        info.set_property(props::TCP_NO_DELAY_ENABLED, wire_format.tcp_no_delay_enabled);
        info.set_property(
            props::MAX_INACTIVITY_DURATION,
            duration_millis(wire_format.max_inactivity_duration),
        );
        info.set_property(
            props::MAX_INACTIVITY_DURATION_INITIAL_DELAY,
            duration_millis(wire_format.max_inactivity_duration_initial_delay),
        );
        info.set_property(props::MAX_FRAME_SIZE, self.max_frame_size as i64);
        info
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfigBuilder::new().build().unwrap()
    }
}

fn duration_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// Builder for `ClientConfig`.
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    wire_format_version: Option<u32>,
    max_frame_size: Option<usize>,
    response_timeout: Option<Duration>,
    dispatch_statistics: Option<bool>,
    wire_format: WireFormatConfigBuilder,
}

impl ClientConfigBuilder {
    /// Creates a new client configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the highest protocol version offered during negotiation.
    pub fn wire_format_version(mut self, version: u32) -> Self {
        self.wire_format_version = Some(version);
        self
    }

    /// Sets the largest frame accepted or sent, in bytes.
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = Some(size);
        self
    }

    /// Sets how long a request waits for its response.
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = Some(timeout);
        self
    }

    /// Enables or disables dispatcher statistics.
    pub fn dispatch_statistics(mut self, enabled: bool) -> Self {
        self.dispatch_statistics = Some(enabled);
        self
    }

    /// Configures the advertised wire-format options using a builder function.
    pub fn wire_format<F>(mut self, f: F) -> Self
    where
        F: FnOnce(WireFormatConfigBuilder) -> WireFormatConfigBuilder,
    {
        self.wire_format = f(self.wire_format);
        self
    }

    /// Builds the client configuration, returning an error if validation fails.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `wire_format_version` is outside the supported protocol versions
    /// - `max_frame_size` is zero
    /// - `response_timeout` is zero
    /// - the wire-format options are invalid
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let wire_format_version = self.wire_format_version.unwrap_or(DEFAULT_VERSION);
        let max_frame_size = self.max_frame_size.unwrap_or(DEFAULT_MAX_FRAME_SIZE);
        let response_timeout = self.response_timeout.unwrap_or(DEFAULT_RESPONSE_TIMEOUT);

        if !(MIN_VERSION..=MAX_VERSION).contains(&wire_format_version) {
            return Err(ConfigError::new(format!(
                "wire_format_version must be between {MIN_VERSION} and {MAX_VERSION}, got {wire_format_version}"
            )));
        }

        if max_frame_size == 0 {
            return Err(ConfigError::new("max_frame_size must be greater than zero"));
        }

        if response_timeout.is_zero() {
            return Err(ConfigError::new("response_timeout must be greater than zero"));
        }

        let wire_format = self.wire_format.build()?;

        Ok(ClientConfig {
            wire_format_version,
            max_frame_size,
            response_timeout,
            dispatch_statistics: self.dispatch_statistics.unwrap_or(true),
            wire_format,
        })
    }
}
