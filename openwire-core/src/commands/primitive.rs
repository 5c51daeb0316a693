//! Tagged primitive values used by message properties, map and stream bodies, and wire-format
//! properties.

use std::collections::BTreeMap;

use crate::error::{OpenWireError, Result};
use crate::marshal::{DataInput, DataOutput};

const NULL_TYPE: u8 = 0;
const BOOLEAN_TYPE: u8 = 1;
const BYTE_TYPE: u8 = 2;
const CHAR_TYPE: u8 = 3;
const SHORT_TYPE: u8 = 4;
const INTEGER_TYPE: u8 = 5;
const LONG_TYPE: u8 = 6;
const DOUBLE_TYPE: u8 = 7;
const FLOAT_TYPE: u8 = 8;
const STRING_TYPE: u8 = 9;
const BYTE_ARRAY_TYPE: u8 = 10;
const MAP_TYPE: u8 = 11;
const LIST_TYPE: u8 = 12;
const BIG_STRING_TYPE: u8 = 13;

const MAX_NESTING: usize = 32;

/// A dynamically typed value.
///
/// Floating-point values compare by bit pattern, so a NaN equals an identical NaN and a value
/// always equals its own clone or decoded copy.
#[derive(Debug, Clone, Default)]
pub enum PrimitiveValue {
    #[default]
    Null,
    Boolean(bool),
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Double(f64),
    Float(f32),
    String(String),
    ByteArray(Vec<u8>),
    Map(PrimitiveMap),
    List(Vec<PrimitiveValue>),
}

impl PrimitiveValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PrimitiveValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns integral values widened to `i64`.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            PrimitiveValue::Byte(v) => Some(i64::from(*v)),
            PrimitiveValue::Short(v) => Some(i64::from(*v)),
            PrimitiveValue::Int(v) => Some(i64::from(*v)),
            PrimitiveValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PrimitiveValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PrimitiveValue::Null)
    }

    /// Writes the type tag followed by the value.
    pub fn write(&self, output: &mut dyn DataOutput) -> Result<()> {
        match self {
            PrimitiveValue::Null => output.write_ubyte(NULL_TYPE),
            PrimitiveValue::Boolean(v) => {
                output.write_ubyte(BOOLEAN_TYPE)?;
                output.write_bool(*v)
            }
            PrimitiveValue::Byte(v) => {
                output.write_ubyte(BYTE_TYPE)?;
                output.write_byte(*v)
            }
            PrimitiveValue::Char(v) => {
                output.write_ubyte(CHAR_TYPE)?;
                output.write_char(*v)
            }
            PrimitiveValue::Short(v) => {
                output.write_ubyte(SHORT_TYPE)?;
                output.write_short(*v)
            }
            PrimitiveValue::Int(v) => {
                output.write_ubyte(INTEGER_TYPE)?;
                output.write_int(*v)
            }
            PrimitiveValue::Long(v) => {
                output.write_ubyte(LONG_TYPE)?;
                output.write_long(*v)
            }
            PrimitiveValue::Double(v) => {
                output.write_ubyte(DOUBLE_TYPE)?;
                output.write_double(*v)
            }
            PrimitiveValue::Float(v) => {
                output.write_ubyte(FLOAT_TYPE)?;
                output.write_float(*v)
            }
            PrimitiveValue::String(v) => match u16::try_from(v.len()) {
                Ok(len) => {
                    output.write_ubyte(STRING_TYPE)?;
                    output.write_char(len)?;
                    output.write_bytes(v.as_bytes())
                }
                Err(_) => {
                    output.write_ubyte(BIG_STRING_TYPE)?;
                    output.write_string(v)
                }
            },
            PrimitiveValue::ByteArray(v) => {
                output.write_ubyte(BYTE_ARRAY_TYPE)?;
                output.write_length("byte array", v.len())?;
                output.write_bytes(v)
            }
            PrimitiveValue::Map(v) => {
                output.write_ubyte(MAP_TYPE)?;
                v.write(output)
            }
            PrimitiveValue::List(values) => {
                output.write_ubyte(LIST_TYPE)?;
                output.write_length("list", values.len())?;
                for value in values {
                    value.write(output)?;
                }
                Ok(())
            }
        }
    }

    /// Reads a type tag and the value it announces.
    pub fn read(input: &mut dyn DataInput) -> Result<Self> {
        Self::read_nested(input, 0)
    }

    fn read_nested(input: &mut dyn DataInput, depth: usize) -> Result<Self> {
        if depth > MAX_NESTING {
            return Err(OpenWireError::MalformedField(format!(
                "primitive values nested deeper than {MAX_NESTING}"
            )));
        }
        let value = match input.read_ubyte()? {
            NULL_TYPE => PrimitiveValue::Null,
            BOOLEAN_TYPE => PrimitiveValue::Boolean(input.read_bool()?),
            BYTE_TYPE => PrimitiveValue::Byte(input.read_byte()?),
            CHAR_TYPE => PrimitiveValue::Char(input.read_char()?),
            SHORT_TYPE => PrimitiveValue::Short(input.read_short()?),
            INTEGER_TYPE => PrimitiveValue::Int(input.read_int()?),
            LONG_TYPE => PrimitiveValue::Long(input.read_long()?),
            DOUBLE_TYPE => PrimitiveValue::Double(input.read_double()?),
            FLOAT_TYPE => PrimitiveValue::Float(input.read_float()?),
            STRING_TYPE => {
                let len = usize::from(input.read_char()?);
                if len > input.remaining() {
                    return Err(OpenWireError::MalformedField(format!(
                        "string length {len} exceeds remaining {} bytes",
                        input.remaining()
                    )));
                }
                let bytes = input.read_bytes(len)?;
                PrimitiveValue::String(String::from_utf8(bytes).map_err(|e| {
                    OpenWireError::MalformedField(format!("invalid UTF-8 string: {e}"))
                })?)
            }
            BIG_STRING_TYPE => PrimitiveValue::String(input.read_string()?),
            BYTE_ARRAY_TYPE => {
                let len = input.read_length("byte array", 1)?;
                PrimitiveValue::ByteArray(input.read_bytes(len)?)
            }
            MAP_TYPE => PrimitiveValue::Map(PrimitiveMap::read_nested(input, depth + 1)?),
            LIST_TYPE => {
                let count = input.read_length("list", 1)?;
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(Self::read_nested(input, depth + 1)?);
                }
                PrimitiveValue::List(values)
            }
            other => {
                return Err(OpenWireError::MalformedField(format!(
                    "unknown primitive type tag {other}"
                )));
            }
        };
        Ok(value)
    }
}

impl PartialEq for PrimitiveValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Byte(a), Self::Byte(b)) => a == b,
            (Self::Char(a), Self::Char(b)) => a == b,
            (Self::Short(a), Self::Short(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Long(a), Self::Long(b)) => a == b,
            (Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits(),
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::ByteArray(a), Self::ByteArray(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for PrimitiveValue {
    fn from(v: bool) -> Self {
        PrimitiveValue::Boolean(v)
    }
}

impl From<i32> for PrimitiveValue {
    fn from(v: i32) -> Self {
        PrimitiveValue::Int(v)
    }
}

impl From<i64> for PrimitiveValue {
    fn from(v: i64) -> Self {
        PrimitiveValue::Long(v)
    }
}

impl From<f64> for PrimitiveValue {
    fn from(v: f64) -> Self {
        PrimitiveValue::Double(v)
    }
}

impl From<&str> for PrimitiveValue {
    fn from(v: &str) -> Self {
        PrimitiveValue::String(v.to_string())
    }
}

impl From<String> for PrimitiveValue {
    fn from(v: String) -> Self {
        PrimitiveValue::String(v)
    }
}

impl From<Vec<u8>> for PrimitiveValue {
    fn from(v: Vec<u8>) -> Self {
        PrimitiveValue::ByteArray(v)
    }
}

/// String-keyed primitive values, kept sorted so encoding is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimitiveMap {
    entries: BTreeMap<String, PrimitiveValue>,
}

impl PrimitiveMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&PrimitiveValue> {
        self.entries.get(key)
    }

    /// Inserts a value, returning the one previously stored under the key.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PrimitiveValue>,
    ) -> Option<PrimitiveValue> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<PrimitiveValue> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(PrimitiveValue::as_bool)
    }

    pub fn get_long(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(PrimitiveValue::as_long)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(PrimitiveValue::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PrimitiveValue)> {
        self.entries.iter()
    }

    /// Writes the entry count followed by each key and tagged value.
    pub fn write(&self, output: &mut dyn DataOutput) -> Result<()> {
        output.write_length("map", self.entries.len())?;
        for (key, value) in &self.entries {
            output.write_string(key)?;
            value.write(output)?;
        }
        Ok(())
    }

    pub fn read(input: &mut dyn DataInput) -> Result<Self> {
        Self::read_nested(input, 0)
    }

    fn read_nested(input: &mut dyn DataInput, depth: usize) -> Result<Self> {
        // A key prefix and a type tag per entry.
        let count = input.read_length("map", 5)?;
        let mut map = Self::new();
        for _ in 0..count {
            let key = input.read_string()?;
            let value = PrimitiveValue::read_nested(input, depth)?;
            map.entries.insert(key, value);
        }
        Ok(map)
    }
}

impl FromIterator<(String, PrimitiveValue)> for PrimitiveMap {
    fn from_iter<I: IntoIterator<Item = (String, PrimitiveValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marshal::{ObjectDataInput, ObjectDataOutput};

    fn round_trip(value: &PrimitiveValue) -> PrimitiveValue {
        let mut output = ObjectDataOutput::new();
        value.write(&mut output).unwrap();
        let mut input = ObjectDataInput::new(output.as_bytes());
        let back = PrimitiveValue::read(&mut input).unwrap();
        assert_eq!(input.remaining(), 0);
        back
    }

    #[test]
    fn test_short_string_uses_two_byte_length() {
        let mut output = ObjectDataOutput::new();
        PrimitiveValue::from("hi").write(&mut output).unwrap();
        assert_eq!(output.as_bytes(), &[9, 0, 2, b'h', b'i']);
    }

    #[test]
    fn test_big_string_uses_four_byte_length() {
        let text = "x".repeat(70_000);
        let mut output = ObjectDataOutput::new();
        PrimitiveValue::from(text.as_str()).write(&mut output).unwrap();
        assert_eq!(output.as_bytes()[0], 13);
        assert_eq!(round_trip(&PrimitiveValue::String(text.clone())).as_str(), Some(text.as_str()));
    }

    #[test]
    fn test_nested_collections() {
        let mut inner = PrimitiveMap::new();
        inner.insert("flag", true);
        let value = PrimitiveValue::List(vec![
            PrimitiveValue::Null,
            PrimitiveValue::Map(inner),
            PrimitiveValue::Char(65),
            PrimitiveValue::Float(1.5),
            PrimitiveValue::ByteArray(vec![1, 2, 3]),
        ]);
        assert_eq!(round_trip(&value), value);
    }

    #[test]
    fn test_unknown_tag_is_malformed() {
        let data = [42u8];
        let mut input = ObjectDataInput::new(&data);
        assert!(matches!(
            PrimitiveValue::read(&mut input),
            Err(OpenWireError::MalformedField(_))
        ));
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let mut data = Vec::new();
        for _ in 0..64 {
            data.extend_from_slice(&[12, 0, 0, 0, 1]);
        }
        data.push(0);
        let mut input = ObjectDataInput::new(&data);
        assert!(matches!(
            PrimitiveValue::read(&mut input),
            Err(OpenWireError::MalformedField(_))
        ));
    }

    #[test]
    fn test_map_accessors() {
        let mut map = PrimitiveMap::new();
        map.insert("count", 3i32);
        map.insert("name", "orders");
        assert_eq!(map.get_long("count"), Some(3));
        assert_eq!(map.get_str("name"), Some("orders"));
        assert_eq!(map.get_bool("name"), None);
        assert_eq!(map.insert("count", 4i64), Some(PrimitiveValue::Int(3)));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_map_round_trip() {
        let map: PrimitiveMap = [
            ("b".to_string(), PrimitiveValue::Long(-1)),
            ("a".to_string(), PrimitiveValue::Double(2.5)),
        ]
        .into_iter()
        .collect();

        let mut output = ObjectDataOutput::new();
        map.write(&mut output).unwrap();
        let mut input = ObjectDataInput::new(output.as_bytes());
        assert_eq!(PrimitiveMap::read(&mut input).unwrap(), map);
    }

    #[test]
    fn test_nan_equals_itself() {
        let value = PrimitiveValue::Double(f64::NAN);
        assert_eq!(value, value.clone());
        assert_eq!(round_trip(&value), value);
        assert_eq!(PrimitiveValue::Float(f32::NAN), PrimitiveValue::Float(f32::NAN));

        assert_ne!(PrimitiveValue::Double(0.0), PrimitiveValue::Double(-0.0));
        assert_ne!(PrimitiveValue::Double(1.0), PrimitiveValue::Float(1.0));
    }

    #[test]
    fn test_map_with_nan_survives_round_trip() {
        let mut map = PrimitiveMap::new();
        map.insert("ratio", f64::NAN);
        map.insert("nested", PrimitiveValue::List(vec![PrimitiveValue::Float(f32::NAN)]));

        let mut output = ObjectDataOutput::new();
        map.write(&mut output).unwrap();
        let mut input = ObjectDataInput::new(output.as_bytes());
        assert_eq!(PrimitiveMap::read(&mut input).unwrap(), map);
    }
}
