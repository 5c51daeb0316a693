//! OpenWire framing.
//!
//! Every command travels as a 4-byte big-endian payload length followed by the marshaled
//! command.

mod codec;
pub mod constants;

pub use codec::OpenWireCodec;
pub use constants::*;
