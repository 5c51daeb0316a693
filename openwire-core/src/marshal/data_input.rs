//! Data input traits and implementations for OpenWire marshaling.

use crate::commands::DataStructure;
use crate::error::{OpenWireError, Result};
use bytes::Buf;
use std::io::Cursor;

use super::CommandRegistry;

/// How deeply nested data structures may be embedded in one another.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Trait for reading primitive values from OpenWire's binary format.
///
/// All multi-byte values are read in big-endian (network) byte order.
pub trait DataInput {
    /// Reads a single signed byte.
    fn read_byte(&mut self) -> Result<i8>;

    /// Reads a single unsigned byte.
    fn read_ubyte(&mut self) -> Result<u8>;

    /// Reads a boolean from a single byte.
    fn read_bool(&mut self) -> Result<bool>;

    /// Reads a 16-bit signed integer.
    fn read_short(&mut self) -> Result<i16>;

    /// Reads a 16-bit unsigned character code.
    fn read_char(&mut self) -> Result<u16>;

    /// Reads a 32-bit signed integer.
    fn read_int(&mut self) -> Result<i32>;

    /// Reads a 64-bit signed integer.
    fn read_long(&mut self) -> Result<i64>;

    /// Reads a 32-bit floating point value.
    fn read_float(&mut self) -> Result<f32>;

    /// Reads a 64-bit floating point value.
    fn read_double(&mut self) -> Result<f64>;

    /// Reads the specified number of raw bytes.
    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>>;

    /// Reads a length-prefixed UTF-8 string.
    fn read_string(&mut self) -> Result<String>;

    /// Returns the number of bytes left to read.
    fn remaining(&self) -> usize;

    /// Constructs an empty instance of the variant registered for `type_code`.
    fn construct(&self, type_code: u8) -> Result<Box<dyn DataStructure>>;

    /// Records entry into a nested data structure, failing once nesting gets implausibly deep.
    fn enter_nested(&mut self) -> Result<()>;

    /// Records leaving a nested data structure.
    fn leave_nested(&mut self);

    /// Reads a 4-byte length prefix and checks that `min_element_size * length` bytes can
    /// follow it.
    fn read_length(&mut self, what: &str, min_element_size: usize) -> Result<usize> {
        let len = self.read_int()?;
        if len < 0 {
            return Err(OpenWireError::MalformedField(format!(
                "negative {what} length: {len}"
            )));
        }
        let len = len as usize;
        if len.saturating_mul(min_element_size) > self.remaining() {
            return Err(OpenWireError::MalformedField(format!(
                "{what} length {len} exceeds remaining {} bytes",
                self.remaining()
            )));
        }
        Ok(len)
    }
}

/// A buffer-based implementation of `DataInput`.
#[derive(Debug)]
pub struct ObjectDataInput<'a> {
    cursor: Cursor<&'a [u8]>,
    registry: &'a CommandRegistry,
    depth: usize,
}

impl<'a> ObjectDataInput<'a> {
    /// Creates a new `ObjectDataInput` resolving nested type codes through the default registry.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_registry(data, CommandRegistry::global())
    }

    /// Creates a new `ObjectDataInput` resolving nested type codes through `registry`.
    pub fn with_registry(data: &'a [u8], registry: &'a CommandRegistry) -> Self {
        Self {
            cursor: Cursor::new(data),
            registry,
            depth: 0,
        }
    }

    /// Returns the current position in the buffer.
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    fn ensure_remaining(&self, n: usize) -> Result<()> {
        if self.cursor.remaining() < n {
            Err(OpenWireError::TruncatedStream {
                needed: n,
                remaining: self.cursor.remaining(),
            })
        } else {
            Ok(())
        }
    }
}

impl DataInput for ObjectDataInput<'_> {
    fn read_byte(&mut self) -> Result<i8> {
        self.ensure_remaining(1)?;
        Ok(self.cursor.get_i8())
    }

    fn read_ubyte(&mut self) -> Result<u8> {
        self.ensure_remaining(1)?;
        Ok(self.cursor.get_u8())
    }

    fn read_bool(&mut self) -> Result<bool> {
        self.ensure_remaining(1)?;
        Ok(self.cursor.get_u8() != 0)
    }

    fn read_short(&mut self) -> Result<i16> {
        self.ensure_remaining(2)?;
        Ok(self.cursor.get_i16())
    }

    fn read_char(&mut self) -> Result<u16> {
        self.ensure_remaining(2)?;
        Ok(self.cursor.get_u16())
    }

    fn read_int(&mut self) -> Result<i32> {
        self.ensure_remaining(4)?;
        Ok(self.cursor.get_i32())
    }

    fn read_long(&mut self) -> Result<i64> {
        self.ensure_remaining(8)?;
        Ok(self.cursor.get_i64())
    }

    fn read_float(&mut self) -> Result<f32> {
        self.ensure_remaining(4)?;
        Ok(self.cursor.get_f32())
    }

    fn read_double(&mut self) -> Result<f64> {
        self.ensure_remaining(8)?;
        Ok(self.cursor.get_f64())
    }

    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        self.ensure_remaining(len)?;
        let mut buf = vec![0u8; len];
        self.cursor.copy_to_slice(&mut buf);
        Ok(buf)
    }

    fn read_string(&mut self) -> Result<String> {
        let len = self.read_length("string", 1)?;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes)
            .map_err(|e| OpenWireError::MalformedField(format!("invalid UTF-8 string: {}", e)))
    }

    fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    fn construct(&self, type_code: u8) -> Result<Box<dyn DataStructure>> {
        self.registry
            .create(type_code)
            .ok_or(OpenWireError::UnknownTypeCode(type_code))
    }

    fn enter_nested(&mut self) -> Result<()> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(OpenWireError::MalformedField(format!(
                "data structures nested deeper than {MAX_NESTING_DEPTH}"
            )));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave_nested(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_input() {
        let data = [1, 2, 3, 4];
        let input = ObjectDataInput::new(&data);
        assert_eq!(input.remaining(), 4);
        assert_eq!(input.position(), 0);
    }

    #[test]
    fn test_read_byte_negative() {
        let data = [0xFFu8];
        let mut input = ObjectDataInput::new(&data);
        assert_eq!(input.read_byte().unwrap(), -1);
    }

    #[test]
    fn test_read_ubyte() {
        let data = [0xFFu8];
        let mut input = ObjectDataInput::new(&data);
        assert_eq!(input.read_ubyte().unwrap(), 255);
    }

    #[test]
    fn test_read_bool_nonzero_is_true() {
        let data = [0u8, 42u8];
        let mut input = ObjectDataInput::new(&data);
        assert!(!input.read_bool().unwrap());
        assert!(input.read_bool().unwrap());
    }

    #[test]
    fn test_read_short_big_endian() {
        let data = [0x01, 0x02];
        let mut input = ObjectDataInput::new(&data);
        assert_eq!(input.read_short().unwrap(), 0x0102);
    }

    #[test]
    fn test_read_char() {
        let data = [0x00, 0x41];
        let mut input = ObjectDataInput::new(&data);
        assert_eq!(input.read_char().unwrap(), u16::from(b'A'));
    }

    #[test]
    fn test_read_int_big_endian() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let mut input = ObjectDataInput::new(&data);
        assert_eq!(input.read_int().unwrap(), 0x01020304);
    }

    #[test]
    fn test_read_long_big_endian() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let mut input = ObjectDataInput::new(&data);
        assert_eq!(input.read_long().unwrap(), 0x0102030405060708);
    }

    #[test]
    fn test_read_double() {
        let data = [0x3F, 0xF0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        let mut input = ObjectDataInput::new(&data);
        assert_eq!(input.read_double().unwrap(), 1.0f64);
    }

    #[test]
    fn test_read_string() {
        let data = [0, 0, 0, 4, b't', b'e', b's', b't'];
        let mut input = ObjectDataInput::new(&data);
        assert_eq!(input.read_string().unwrap(), "test");
        assert_eq!(input.remaining(), 0);
    }

    #[test]
    fn test_truncated_int() {
        let data = [0x01, 0x02, 0x03];
        let mut input = ObjectDataInput::new(&data);
        assert!(matches!(
            input.read_int(),
            Err(OpenWireError::TruncatedStream {
                needed: 4,
                remaining: 3
            })
        ));
    }

    #[test]
    fn test_truncated_bytes() {
        let data = [1, 2, 3];
        let mut input = ObjectDataInput::new(&data);
        assert!(matches!(
            input.read_bytes(5),
            Err(OpenWireError::TruncatedStream { .. })
        ));
    }

    #[test]
    fn test_negative_string_length_is_malformed() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF];
        let mut input = ObjectDataInput::new(&data);
        assert!(matches!(
            input.read_string(),
            Err(OpenWireError::MalformedField(_))
        ));
    }

    #[test]
    fn test_oversized_string_length_is_malformed() {
        let data = [0, 0, 0, 9, b'a', b'b'];
        let mut input = ObjectDataInput::new(&data);
        assert!(matches!(
            input.read_string(),
            Err(OpenWireError::MalformedField(_))
        ));
    }

    #[test]
    fn test_invalid_utf8_string() {
        let data = [0, 0, 0, 2, 0xFF, 0xFE];
        let mut input = ObjectDataInput::new(&data);
        assert!(matches!(
            input.read_string(),
            Err(OpenWireError::MalformedField(_))
        ));
    }

    #[test]
    fn test_construct_known_and_unknown_codes() {
        let input = ObjectDataInput::new(&[]);
        assert_eq!(input.construct(102).unwrap().type_code(), 102);
        assert!(matches!(
            input.construct(255),
            Err(OpenWireError::UnknownTypeCode(255))
        ));
    }

    #[test]
    fn test_nesting_depth_is_bounded() {
        let mut input = ObjectDataInput::new(&[]);
        for _ in 0..MAX_NESTING_DEPTH {
            input.enter_nested().unwrap();
        }
        assert!(matches!(
            input.enter_nested(),
            Err(OpenWireError::MalformedField(_))
        ));
        input.leave_nested();
        assert!(input.enter_nested().is_ok());
    }

    #[test]
    fn test_position_advances() {
        let data = [0, 0, 0, 42, 1, 2, 3, 4];
        let mut input = ObjectDataInput::new(&data);
        input.read_int().unwrap();
        assert_eq!(input.position(), 4);
        input.read_int().unwrap();
        assert_eq!(input.position(), 8);
    }
}
