//! Marshaling framework for OpenWire's loose binary encoding.

mod data_input;
mod data_output;
mod engine;
pub mod loose;
mod registry;

pub use data_input::{DataInput, ObjectDataInput};
pub use data_output::{DataOutput, ObjectDataOutput};
pub use engine::{marshal, unmarshal, OpenWireFormat};
pub use loose::Nested;
pub use registry::{CommandRegistry, Constructor};
