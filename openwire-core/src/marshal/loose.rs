//! Loose-encoding helpers for the field shapes shared by catalog variants.
//!
//! Optional values are preceded by a presence byte. Nested data structures are written as their
//! type code followed by their fields, so a reader can construct the right variant before
//! populating it.

use std::collections::BTreeMap;

use crate::commands::{DataStructure, Message, Variant};
use crate::error::{OpenWireError, Result};

use super::{DataInput, DataOutput};

/// A value that can be embedded in another data structure as type code plus fields.
pub trait Nested: Sized {
    /// Writes the type code followed by the fields.
    fn write_nested(&self, output: &mut dyn DataOutput, version: u32) -> Result<()>;

    /// Reads the fields of a value whose type code has already been consumed.
    fn read_nested(type_code: u8, input: &mut dyn DataInput, version: u32) -> Result<Self>;
}

impl<T: Variant + Default> Nested for T {
    fn write_nested(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        output.write_ubyte(self.data_structure_type())?;
        self.write_fields(output, version)
    }

    fn read_nested(type_code: u8, input: &mut dyn DataInput, version: u32) -> Result<Self> {
        let mut value = T::default();
        expect_type_code(value.data_structure_type(), type_code)?;
        value.read_fields(input, version)?;
        Ok(value)
    }
}

impl Nested for Box<dyn DataStructure> {
    fn write_nested(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        output.write_ubyte(self.type_code())?;
        self.marshal_fields(output, version)
    }

    fn read_nested(type_code: u8, input: &mut dyn DataInput, version: u32) -> Result<Self> {
        let mut value = input.construct(type_code)?;
        value.unmarshal_fields(input, version)?;
        Ok(value)
    }
}

impl Nested for Box<dyn Message> {
    fn write_nested(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        output.write_ubyte(self.type_code())?;
        self.marshal_fields(output, version)
    }

    fn read_nested(type_code: u8, input: &mut dyn DataInput, version: u32) -> Result<Self> {
        let value = <Box<dyn DataStructure>>::read_nested(type_code, input, version)?;
        value.into_message().map_err(|other| {
            OpenWireError::MalformedField(format!(
                "expected a message, found type code {}",
                other.type_code()
            ))
        })
    }
}

/// Fails with `MalformedField` unless `found` is the type code a field requires.
pub fn expect_type_code(expected: u8, found: u8) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(OpenWireError::MalformedField(format!(
            "expected nested type code {expected}, found {found}"
        )))
    }
}

pub fn write_nullable_string(output: &mut dyn DataOutput, value: Option<&str>) -> Result<()> {
    output.write_bool(value.is_some())?;
    match value {
        Some(value) => output.write_string(value),
        None => Ok(()),
    }
}

pub fn read_nullable_string(input: &mut dyn DataInput) -> Result<Option<String>> {
    if input.read_bool()? {
        input.read_string().map(Some)
    } else {
        Ok(None)
    }
}

/// Writes a byte sequence; an empty sequence is written as absent.
pub fn write_byte_array(output: &mut dyn DataOutput, value: &[u8]) -> Result<()> {
    output.write_bool(!value.is_empty())?;
    if value.is_empty() {
        return Ok(());
    }
    output.write_length("byte array", value.len())?;
    output.write_bytes(value)
}

pub fn read_byte_array(input: &mut dyn DataInput) -> Result<Vec<u8>> {
    if !input.read_bool()? {
        return Ok(Vec::new());
    }
    let len = input.read_length("byte array", 1)?;
    input.read_bytes(len)
}

pub fn write_nested<T: Nested>(
    output: &mut dyn DataOutput,
    value: Option<&T>,
    version: u32,
) -> Result<()> {
    output.write_bool(value.is_some())?;
    match value {
        Some(value) => value.write_nested(output, version),
        None => Ok(()),
    }
}

pub fn read_nested<T: Nested>(input: &mut dyn DataInput, version: u32) -> Result<Option<T>> {
    if !input.read_bool()? {
        return Ok(None);
    }
    let type_code = input.read_ubyte()?;
    read_nested_value(type_code, input, version).map(Some)
}

fn read_nested_value<T: Nested>(type_code: u8, input: &mut dyn DataInput, version: u32) -> Result<T> {
    input.enter_nested()?;
    let value = T::read_nested(type_code, input, version);
    input.leave_nested();
    value
}

/// Writes an array of nested values; an empty array is written as absent.
pub fn write_nested_array<T: Nested>(
    output: &mut dyn DataOutput,
    values: &[T],
    version: u32,
) -> Result<()> {
    output.write_bool(!values.is_empty())?;
    if values.is_empty() {
        return Ok(());
    }
    let count = i16::try_from(values.len()).map_err(|_| {
        OpenWireError::MalformedField(format!("array of {} elements is too long", values.len()))
    })?;
    output.write_short(count)?;
    for value in values {
        value.write_nested(output, version)?;
    }
    Ok(())
}

pub fn read_nested_array<T: Nested>(input: &mut dyn DataInput, version: u32) -> Result<Vec<T>> {
    if !input.read_bool()? {
        return Ok(Vec::new());
    }
    let count = input.read_short()?;
    if count < 0 || count as usize > input.remaining() {
        return Err(OpenWireError::MalformedField(format!(
            "array count {count} with {} bytes remaining",
            input.remaining()
        )));
    }
    let mut values = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let type_code = input.read_ubyte()?;
        values.push(read_nested_value(type_code, input, version)?);
    }
    Ok(values)
}

/// Writes a string-to-string mapping as a count followed by key/value pairs, in key order.
pub fn write_string_map(output: &mut dyn DataOutput, map: &BTreeMap<String, String>) -> Result<()> {
    output.write_length("map", map.len())?;
    for (key, value) in map {
        output.write_string(key)?;
        output.write_string(value)?;
    }
    Ok(())
}

pub fn read_string_map(input: &mut dyn DataInput) -> Result<BTreeMap<String, String>> {
    // Each entry takes at least two empty string prefixes.
    let count = input.read_length("map", 8)?;
    let mut map = BTreeMap::new();
    for _ in 0..count {
        let key = input.read_string()?;
        let value = input.read_string()?;
        map.insert(key, value);
    }
    Ok(map)
}
