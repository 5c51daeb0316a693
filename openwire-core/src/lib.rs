//! Core types and protocols for OpenWire clients.
//!
//! This crate holds the OpenWire command catalog and everything needed to move commands across a
//! connection:
//!
//! - [`commands`]: the polymorphic [`DataStructure`] model, the command catalog, destinations,
//!   identifiers and primitive maps.
//! - [`marshal`]: the version-parametric loose encoding and the type-code registry.
//! - [`protocol`]: wire constants and the length-prefixed frame codec.
//! - [`lang`]: [`Pointer`], a shared-ownership handle with pluggable counting.
//! - [`concurrent`]: [`Monitor`], a reentrant lock with wait and notify.
//!
//! ```rust
//! use openwire_core::commands::{ActiveMqDestination, TextMessage};
//! use openwire_core::marshal::{marshal, unmarshal};
//!
//! let mut message = TextMessage::default();
//! message.set_text("hello").unwrap();
//! message.base.destination = Some(ActiveMqDestination::queue("orders"));
//!
//! let bytes = marshal(&message, 12).unwrap();
//! let decoded = unmarshal(&bytes, 12).unwrap();
//! assert!(decoded.equals(&message));
//! ```

pub mod commands;
pub mod concurrent;
pub mod error;
pub mod lang;
pub mod marshal;
pub mod protocol;

pub use commands::{Command, DataStructure, Message};
pub use concurrent::{Monitor, Synchronizable};
pub use error::{OpenWireError, Result};
pub use lang::Pointer;
pub use marshal::{marshal, unmarshal, CommandRegistry, OpenWireFormat};
pub use protocol::OpenWireCodec;
