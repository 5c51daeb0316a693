//! Connection-side plumbing for OpenWire clients.
//!
//! This crate sits between a byte stream and application code:
//!
//! - [`negotiation`]: the `WireFormatInfo` exchange that fixes a connection's protocol version.
//! - [`pump`]: the inbound loop that decodes frames and routes each command.
//! - [`correlator`]: pending-response slots that requesters block on.
//! - [`dispatch`]: delivery of dispatched messages to per-consumer listeners.
//! - [`config`] and [`config_file`]: client settings from code, files or the environment.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use openwire_client::{ClientConfig, CommandPump, MessageDispatcher, ResponseCorrelator};
//!
//! let config = ClientConfig::builder()
//!     .wire_format_version(10)
//!     .build()
//!     .unwrap();
//! let correlator = Arc::new(ResponseCorrelator::from_config(&config));
//! let dispatcher = Arc::new(MessageDispatcher::from_config(&config));
//! let pump = CommandPump::new(correlator, dispatcher);
//! # let _ = pump;
//! ```

pub mod config;
pub mod config_file;
pub mod correlator;
pub mod dispatch;
pub mod listener;
pub mod negotiation;
pub mod pump;

pub use config::{ClientConfig, ClientConfigBuilder, ConfigError, WireFormatConfig};
#[cfg(feature = "config-file")]
pub use config_file::load_config;
pub use config_file::FileConfig;
pub use correlator::{FutureResponse, ResponseCorrelator};
pub use dispatch::MessageDispatcher;
pub use listener::{CommandListener, ListenerId, ListenerStats, MessageListener};
pub use negotiation::{handshake, negotiate, NegotiatedWireFormat};
pub use pump::{CommandPump, PumpSummary};
