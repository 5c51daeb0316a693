//! The polymorphic root of every wire-transmissible type.

use std::any::Any;
use std::fmt;

use crate::error::{OpenWireError, Result};
use crate::marshal::{DataInput, DataOutput};

use super::message::Message;

/// A wire-transmissible entity identified by a one-byte type code.
///
/// This is the object-safe view used by the marshaling engine, the registry and everything that
/// handles commands without knowing their concrete type. Catalog entries never implement it
/// directly: implementing [`Variant`] provides it.
pub trait DataStructure: Any + fmt::Debug + Send + Sync {
    /// Returns the variant's unique type code.
    fn type_code(&self) -> u8;

    /// Writes every field (not the type code) in wire order for `version`.
    fn marshal_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()>;

    /// Reads every field (not the type code) in wire order for `version`.
    fn unmarshal_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()>;

    /// Returns an independently owned deep copy.
    fn clone_data_structure(&self) -> Box<dyn DataStructure>;

    /// Overwrites every field with a deep copy of `source`'s.
    ///
    /// Fails with [`OpenWireError::TypeMismatch`] when `source` is a different variant.
    fn copy_from(&mut self, source: &dyn DataStructure) -> Result<()>;

    /// Structural equality; a different variant is never equal.
    fn equals(&self, other: &dyn DataStructure) -> bool;

    /// Renders the variant name and its fields for diagnostics.
    fn describe(&self) -> String {
        format!("{self:?}")
    }

    /// Upcasts to `Any` for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Upcasts to `Any` for mutable downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Returns the command view if this variant is a command.
    fn as_command(&self) -> Option<&dyn Command>;

    /// Returns the mutable command view if this variant is a command.
    fn as_command_mut(&mut self) -> Option<&mut dyn Command>;

    /// Returns the message view if this variant is a message.
    fn as_message(&self) -> Option<&dyn Message>;

    /// Converts into an owned message, handing the value back unchanged if it is not one.
    fn into_message(self: Box<Self>) -> std::result::Result<Box<dyn Message>, Box<dyn DataStructure>>;
}

/// Per-variant behavior of a catalog entry.
///
/// Cloning, equality and copying come from `Clone` and `PartialEq`, which every variant derives
/// field by field; the blanket [`DataStructure`] implementation turns them into the polymorphic
/// operations. Variants only spell out their type code and wire layout, plus the capability
/// views they offer.
pub trait Variant: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// The type code this value is written with.
    fn data_structure_type(&self) -> u8;

    /// Writes the variant's fields in wire order.
    fn write_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()>;

    /// Reads the variant's fields in wire order.
    fn read_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()>;

    /// The command view, for variants that carry a [`CommandHeader`].
    fn command_view(&self) -> Option<&dyn Command> {
        None
    }

    /// The mutable command view.
    fn command_view_mut(&mut self) -> Option<&mut dyn Command> {
        None
    }

    /// The message view, for message variants.
    fn message_view(&self) -> Option<&dyn Message> {
        None
    }

    /// Boxes this value as a message, if it is one.
    fn boxed_message(self: Box<Self>) -> std::result::Result<Box<dyn Message>, Box<Self>> {
        Err(self)
    }
}

impl<T: Variant> DataStructure for T {
    fn type_code(&self) -> u8 {
        self.data_structure_type()
    }

    fn marshal_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        self.write_fields(output, version)
    }

    fn unmarshal_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
        self.read_fields(input, version)
    }

    fn clone_data_structure(&self) -> Box<dyn DataStructure> {
        Box::new(self.clone())
    }

    fn copy_from(&mut self, source: &dyn DataStructure) -> Result<()> {
        let expected = self.data_structure_type();
        match source.as_any().downcast_ref::<T>() {
            Some(source) if source.data_structure_type() == expected => {
                self.clone_from(source);
                Ok(())
            }
            _ => Err(OpenWireError::TypeMismatch {
                expected,
                found: source.type_code(),
            }),
        }
    }

    fn equals(&self, other: &dyn DataStructure) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn as_command(&self) -> Option<&dyn Command> {
        self.command_view()
    }

    fn as_command_mut(&mut self) -> Option<&mut dyn Command> {
        self.command_view_mut()
    }

    fn as_message(&self) -> Option<&dyn Message> {
        self.message_view()
    }

    fn into_message(self: Box<Self>) -> std::result::Result<Box<dyn Message>, Box<dyn DataStructure>> {
        self.boxed_message()
            .map_err(|this| this as Box<dyn DataStructure>)
    }
}

impl dyn DataStructure {
    /// Downcasts to a concrete variant.
    pub fn downcast_ref<T: DataStructure>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    /// Downcasts to a concrete variant, mutably.
    pub fn downcast_mut<T: DataStructure>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut()
    }
}

impl PartialEq for dyn DataStructure {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl Clone for Box<dyn DataStructure> {
    fn clone(&self) -> Self {
        self.clone_data_structure()
    }
}

/// Compares two optional data structures; two absent values are equal.
pub fn equals_optional(a: Option<&dyn DataStructure>, b: Option<&dyn DataStructure>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.equals(b),
        _ => false,
    }
}

/// Fields shared by every command: the sender-assigned id and whether a response is expected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CommandHeader {
    /// Identifier the sender assigns; responses echo it as their correlation id.
    pub command_id: i32,
    /// Whether the sender expects a response.
    pub response_required: bool,
}

impl CommandHeader {
    pub(crate) fn write(&self, output: &mut dyn DataOutput) -> Result<()> {
        output.write_int(self.command_id)?;
        output.write_bool(self.response_required)
    }

    pub(crate) fn read(&mut self, input: &mut dyn DataInput) -> Result<()> {
        self.command_id = input.read_int()?;
        self.response_required = input.read_bool()?;
        Ok(())
    }
}

/// A data structure that travels as a top-level command.
pub trait Command: DataStructure {
    /// The command header.
    fn header(&self) -> &CommandHeader;

    /// The command header, mutably.
    fn header_mut(&mut self) -> &mut CommandHeader;

    /// Returns the command id.
    fn command_id(&self) -> i32 {
        self.header().command_id
    }

    /// Sets the command id.
    fn set_command_id(&mut self, command_id: i32) {
        self.header_mut().command_id = command_id;
    }

    /// Returns `true` if the sender expects a response.
    fn is_response_required(&self) -> bool {
        self.header().response_required
    }

    /// Sets whether the sender expects a response.
    fn set_response_required(&mut self, response_required: bool) {
        self.header_mut().response_required = response_required;
    }

    /// The id of the command this answers, for responses.
    fn correlation_id(&self) -> Option<i32> {
        None
    }

    /// Returns `true` for responses.
    fn is_response(&self) -> bool {
        self.correlation_id().is_some()
    }
}

/// Implements [`Command`] for a type with a `header: CommandHeader` field.
macro_rules! impl_command {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::commands::Command for $ty {
                fn header(&self) -> &$crate::commands::CommandHeader {
                    &self.header
                }

                fn header_mut(&mut self) -> &mut $crate::commands::CommandHeader {
                    &mut self.header
                }
            }
        )+
    };
}

pub(crate) use impl_command;
