//! Codec implementation for length-prefixed OpenWire frames.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::constants::{DEFAULT_MAX_FRAME_SIZE, DEFAULT_VERSION, SIZE_OF_FRAME_LENGTH_FIELD};
use crate::commands::DataStructure;
use crate::error::{OpenWireError, Result};
use crate::marshal::{ObjectDataOutput, OpenWireFormat};

/// Codec for encoding and decoding OpenWire commands.
///
/// Implements the `tokio_util::codec::{Encoder, Decoder}` traits for use with tokio's framed
/// I/O. Each frame holds exactly one command marshaled at the codec's protocol version.
#[derive(Debug, Clone)]
pub struct OpenWireCodec {
    format: OpenWireFormat<'static>,
    version: u32,
    max_frame_size: usize,
}

impl OpenWireCodec {
    /// Creates a codec for the newest protocol version with the default frame size limit.
    pub fn new() -> Self {
        Self::with_version(DEFAULT_VERSION)
    }

    /// Creates a codec for a specific protocol version.
    pub fn with_version(version: u32) -> Self {
        Self {
            format: OpenWireFormat::new(),
            version,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Sets the largest payload accepted or produced.
    pub fn max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    /// Replaces the engine, for example to decode through a custom registry.
    pub fn format(mut self, format: OpenWireFormat<'static>) -> Self {
        self.format = format;
        self
    }

    /// Returns the protocol version frames are encoded and decoded with.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Switches to a negotiated protocol version.
    pub fn set_version(&mut self, version: u32) {
        self.version = version;
    }

    /// Returns the largest payload accepted or produced.
    pub fn frame_size_limit(&self) -> usize {
        self.max_frame_size
    }

    /// Lowers or raises the frame size limit on a codec that is already in use.
    pub fn set_max_frame_size(&mut self, max_frame_size: usize) {
        self.max_frame_size = max_frame_size;
    }

    fn check_size(&self, size: usize) -> Result<()> {
        if size > self.max_frame_size {
            Err(OpenWireError::Protocol(format!(
                "frame of {} bytes exceeds maximum of {}",
                size, self.max_frame_size
            )))
        } else {
            Ok(())
        }
    }
}

impl Default for OpenWireCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder<&dyn DataStructure> for OpenWireCodec {
    type Error = OpenWireError;

    fn encode(&mut self, item: &dyn DataStructure, dst: &mut BytesMut) -> Result<()> {
        let mut output = ObjectDataOutput::new();
        self.format.marshal_into(item, &mut output, self.version)?;
        self.check_size(output.len())?;

        let length = u32::try_from(output.len())
            .map_err(|_| OpenWireError::Protocol("frame length overflows u32".to_string()))?;
        dst.reserve(SIZE_OF_FRAME_LENGTH_FIELD + output.len());
        dst.put_u32(length);
        dst.put_slice(output.as_bytes());
        Ok(())
    }
}

impl Encoder<Box<dyn DataStructure>> for OpenWireCodec {
    type Error = OpenWireError;

    fn encode(&mut self, item: Box<dyn DataStructure>, dst: &mut BytesMut) -> Result<()> {
        <Self as Encoder<&dyn DataStructure>>::encode(self, item.as_ref(), dst)
    }
}

impl Decoder for OpenWireCodec {
    type Item = Box<dyn DataStructure>;
    type Error = OpenWireError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.len() < SIZE_OF_FRAME_LENGTH_FIELD {
            return Ok(None);
        }

        let frame_length = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;
        self.check_size(frame_length)?;

        let total_frame_size = SIZE_OF_FRAME_LENGTH_FIELD + frame_length;
        if src.len() < total_frame_size {
            src.reserve(total_frame_size - src.len());
            return Ok(None);
        }

        src.advance(SIZE_OF_FRAME_LENGTH_FIELD);
        let payload = src.split_to(frame_length);
        self.format.unmarshal(&payload, self.version).map(Some)
    }
}
