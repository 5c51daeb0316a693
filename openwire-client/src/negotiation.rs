//! `WireFormatInfo` exchange and protocol version negotiation.

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;

use openwire_core::commands::wire_format_properties as props;
use openwire_core::commands::WireFormatInfo;
use openwire_core::protocol::{MAX_VERSION, MIN_VERSION};
use openwire_core::{DataStructure, OpenWireCodec, OpenWireError, Result};

/// The settings both peers agreed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiatedWireFormat {
    version: u32,
    tight_encoding_enabled: bool,
    cache_enabled: bool,
    cache_size: i32,
    size_prefix_disabled: bool,
    stack_trace_enabled: bool,
    tcp_no_delay_enabled: bool,
    max_inactivity_duration: i64,
    max_inactivity_duration_initial_delay: i64,
    max_frame_size: Option<i64>,
}

impl NegotiatedWireFormat {
    /// Returns the protocol version used for the rest of the connection.
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn tight_encoding_enabled(&self) -> bool {
        self.tight_encoding_enabled
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    pub fn cache_size(&self) -> i32 {
        self.cache_size
    }

    pub fn size_prefix_disabled(&self) -> bool {
        self.size_prefix_disabled
    }

    pub fn stack_trace_enabled(&self) -> bool {
        self.stack_trace_enabled
    }

    pub fn tcp_no_delay_enabled(&self) -> bool {
        self.tcp_no_delay_enabled
    }

    /// Returns the agreed inactivity period in milliseconds; zero disables monitoring.
    pub fn max_inactivity_duration(&self) -> i64 {
        self.max_inactivity_duration
    }

    pub fn max_inactivity_duration_initial_delay(&self) -> i64 {
        self.max_inactivity_duration_initial_delay
    }

    /// Returns the smaller of the advertised frame limits, if either side sent one.
    pub fn max_frame_size(&self) -> Option<i64> {
        self.max_frame_size
    }

    /// Fails unless the agreed settings can be served by loose encoding over sized frames.
    pub fn ensure_loose_encoding(&self) -> Result<()> {
        if self.tight_encoding_enabled {
            return Err(OpenWireError::Protocol(
                "peer negotiated tight encoding, which is not supported".to_string(),
            ));
        }
        if self.cache_enabled {
            return Err(OpenWireError::Protocol(
                "peer negotiated marshal caching, which is not supported".to_string(),
            ));
        }
        if self.size_prefix_disabled {
            return Err(OpenWireError::Protocol(
                "peer negotiated frames without a size prefix, which is not supported".to_string(),
            ));
        }
        Ok(())
    }
}

/// Agrees on the settings advertised by both ends.
///
/// The version is the lower of the two, capped at the newest version this crate speaks. Boolean
/// options are on only if both sides enabled them; sizes and durations take the smaller value.
///
/// # Errors
///
/// Returns [`OpenWireError::Protocol`] if the remote magic is wrong, the agreed version is below
/// the minimum, or the agreed cache size does not fit in an `i32`.
pub fn negotiate(local: &WireFormatInfo, remote: &WireFormatInfo) -> Result<NegotiatedWireFormat> {
    if !remote.is_valid() {
        return Err(OpenWireError::Protocol(
            "remote wire format magic is invalid".to_string(),
        ));
    }

    let version = local.version.min(remote.version).min(MAX_VERSION as i32);
    if version < MIN_VERSION as i32 {
        return Err(OpenWireError::Protocol(format!(
            "remote wire format ({}) is lower than the minimum version required ({MIN_VERSION})",
            remote.version
        )));
    }

    let both = |name: &str| {
        local.properties.get_bool(name).unwrap_or(false)
            && remote.properties.get_bool(name).unwrap_or(false)
    };
    let smaller = |name: &str| {
        match (local.properties.get_long(name), remote.properties.get_long(name)) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    };

    let cache_size = smaller(props::CACHE_SIZE).unwrap_or(0);
    let cache_size = i32::try_from(cache_size).map_err(|_| {
        OpenWireError::Protocol(format!("negotiated cache size {cache_size} is out of range"))
    })?;

    let negotiated = NegotiatedWireFormat {
        version: version as u32,
        tight_encoding_enabled: both(props::TIGHT_ENCODING_ENABLED),
        cache_enabled: both(props::CACHE_ENABLED),
        cache_size,
        size_prefix_disabled: both(props::SIZE_PREFIX_DISABLED),
        stack_trace_enabled: both(props::STACK_TRACE_ENABLED),
        tcp_no_delay_enabled: both(props::TCP_NO_DELAY_ENABLED),
        max_inactivity_duration: smaller(props::MAX_INACTIVITY_DURATION).unwrap_or(0),
        max_inactivity_duration_initial_delay: smaller(props::MAX_INACTIVITY_DURATION_INITIAL_DELAY)
            .unwrap_or(0),
        max_frame_size: smaller(props::MAX_FRAME_SIZE),
    };

    tracing::debug!(
        local = local.version,
        remote = remote.version,
        negotiated = negotiated.version,
        "negotiated wire format"
    );
    Ok(negotiated)
}

/// Sends `local`, reads the peer's `WireFormatInfo` and fixes the codec to the agreed version.
///
/// A frame limit advertised by either side lowers the codec's own limit; it is never raised.
///
/// # Errors
///
/// Fails if the stream closes or yields another command first, if negotiation fails, or if the
/// peer insists on an encoding other than loose.
pub async fn handshake<T>(
    framed: &mut Framed<T, OpenWireCodec>,
    local: &WireFormatInfo,
) -> Result<NegotiatedWireFormat>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    framed
        .send(Box::new(local.clone()) as Box<dyn DataStructure>)
        .await?;

    let received = framed.next().await.ok_or_else(|| {
        OpenWireError::Protocol("connection closed before the peer sent its wire format".to_string())
    })??;

    let remote = received.downcast_ref::<WireFormatInfo>().ok_or_else(|| {
        OpenWireError::Protocol(format!(
            "expected a wire format exchange, received type {}",
            received.type_code()
        ))
    })?;

    let negotiated = negotiate(local, remote)?;
    negotiated.ensure_loose_encoding()?;
    let codec = framed.codec_mut();
    codec.set_version(negotiated.version());
    if let Some(limit) = negotiated.max_frame_size().filter(|limit| *limit > 0) {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        if limit < codec.frame_size_limit() {
            codec.set_max_frame_size(limit);
        }
    }
    tracing::info!(
        version = negotiated.version(),
        max_frame_size = framed.codec().frame_size_limit(),
        "wire format established"
    );
    Ok(negotiated)
}
