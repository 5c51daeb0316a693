//! The version-parametric marshaling engine.

use crate::commands::DataStructure;
use crate::error::{OpenWireError, Result};
use crate::lang::Pointer;
use crate::protocol::constants::is_supported_version;

use super::{CommandRegistry, DataInput, DataOutput, ObjectDataInput, ObjectDataOutput};

/// Converts data structures to and from the OpenWire loose encoding.
///
/// The engine holds no per-connection state: the negotiated protocol version is passed to every
/// call. Decoding resolves type codes through the registry the engine was built with.
#[derive(Debug, Clone, Copy)]
pub struct OpenWireFormat<'r> {
    registry: &'r CommandRegistry,
}

impl OpenWireFormat<'static> {
    /// Creates an engine backed by the default command registry.
    pub fn new() -> Self {
        Self::with_registry(CommandRegistry::global())
    }
}

impl Default for OpenWireFormat<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> OpenWireFormat<'r> {
    /// Creates an engine that resolves type codes through `registry`.
    pub fn with_registry(registry: &'r CommandRegistry) -> Self {
        Self { registry }
    }

    /// Returns the registry used for decoding.
    pub fn registry(&self) -> &'r CommandRegistry {
        self.registry
    }

    /// Encodes `value` as its type code followed by its fields.
    pub fn marshal(&self, value: &dyn DataStructure, version: u32) -> Result<Vec<u8>> {
        let mut output = ObjectDataOutput::new();
        self.marshal_into(value, &mut output, version)?;
        Ok(output.into_bytes())
    }

    /// Encodes `value` into an existing output.
    pub fn marshal_into(
        &self,
        value: &dyn DataStructure,
        output: &mut dyn DataOutput,
        version: u32,
    ) -> Result<()> {
        check_version(version)?;
        tracing::trace!(type_code = value.type_code(), version, "marshaling");
        output.write_ubyte(value.type_code())?;
        value.marshal_fields(output, version)
    }

    /// Decodes exactly one data structure from `bytes`.
    ///
    /// Bytes left over after the structure is complete are rejected as `MalformedField`.
    pub fn unmarshal(&self, bytes: &[u8], version: u32) -> Result<Box<dyn DataStructure>> {
        let mut input = ObjectDataInput::with_registry(bytes, self.registry);
        let value = self.unmarshal_from(&mut input, version)?;
        if input.remaining() > 0 {
            return Err(OpenWireError::MalformedField(format!(
                "{} trailing bytes after type code {}",
                input.remaining(),
                value.type_code()
            )));
        }
        Ok(value)
    }

    /// Decodes one data structure and hands it out behind a shared handle.
    pub fn unmarshal_shared(&self, bytes: &[u8], version: u32) -> Result<Pointer<dyn DataStructure>> {
        self.unmarshal(bytes, version).map(Pointer::from_box)
    }

    /// Decodes the next data structure from `input`, leaving anything after it unread.
    pub fn unmarshal_from(
        &self,
        input: &mut dyn DataInput,
        version: u32,
    ) -> Result<Box<dyn DataStructure>> {
        check_version(version)?;
        let type_code = input.read_ubyte()?;
        let mut value = self
            .registry
            .create(type_code)
            .ok_or(OpenWireError::UnknownTypeCode(type_code))?;
        value.unmarshal_fields(input, version)?;
        tracing::trace!(type_code, version, "unmarshaled");
        Ok(value)
    }
}

fn check_version(version: u32) -> Result<()> {
    if is_supported_version(version) {
        Ok(())
    } else {
        Err(OpenWireError::UnsupportedVersion(version))
    }
}

/// Encodes `value` with the default engine.
pub fn marshal(value: &dyn DataStructure, version: u32) -> Result<Vec<u8>> {
    OpenWireFormat::new().marshal(value, version)
}

/// Decodes one data structure with the default engine.
pub fn unmarshal(bytes: &[u8], version: u32) -> Result<Box<dyn DataStructure>> {
    OpenWireFormat::new().unmarshal(bytes, version)
}
