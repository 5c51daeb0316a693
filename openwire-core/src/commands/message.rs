//! Messages and their typed bodies.

use std::fmt;

use crate::error::{OpenWireError, Result};
use crate::marshal::loose;
use crate::marshal::{DataInput, DataOutput, ObjectDataInput, ObjectDataOutput};
use crate::protocol::constants::{
    ACTIVEMQ_BLOB_MESSAGE, ACTIVEMQ_BYTES_MESSAGE, ACTIVEMQ_MAP_MESSAGE, ACTIVEMQ_MESSAGE,
    ACTIVEMQ_OBJECT_MESSAGE, ACTIVEMQ_STREAM_MESSAGE, ACTIVEMQ_TEXT_MESSAGE,
};

use super::{
    ActiveMqDestination, BrokerId, Command, CommandHeader, ConsumerId, DataStructure, MessageId,
    PrimitiveMap, PrimitiveValue, ProducerId, TransactionId, Variant,
};

/// Fields shared by every message kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageBase {
    pub header: CommandHeader,
    pub producer_id: Option<ProducerId>,
    pub destination: Option<ActiveMqDestination>,
    pub transaction_id: Option<TransactionId>,
    pub original_destination: Option<ActiveMqDestination>,
    pub message_id: Option<MessageId>,
    pub original_transaction_id: Option<TransactionId>,
    pub group_id: Option<String>,
    pub group_sequence: i32,
    pub correlation_id: Option<String>,
    pub persistent: bool,
    pub expiration: i64,
    pub priority: u8,
    pub reply_to: Option<ActiveMqDestination>,
    pub timestamp: i64,
    pub message_type: Option<String>,
    pub content: Vec<u8>,
    pub properties: PrimitiveMap,
    pub data_structure: Option<Box<dyn DataStructure>>,
    pub target_consumer_id: Option<ConsumerId>,
    pub compressed: bool,
    pub redelivery_counter: i32,
    pub broker_path: Vec<BrokerId>,
    pub arrival: i64,
    pub user_id: Option<String>,
    /// Carried from version 2.
    pub droppable: bool,
    /// Carried from version 3.
    pub cluster: Vec<BrokerId>,
    /// Carried from version 3.
    pub broker_in_time: i64,
    /// Carried from version 3.
    pub broker_out_time: i64,
}

impl MessageBase {
    pub(crate) fn write(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        self.header.write(output)?;
        loose::write_nested(output, self.producer_id.as_ref(), version)?;
        loose::write_nested(output, self.destination.as_ref(), version)?;
        loose::write_nested(output, self.transaction_id.as_ref(), version)?;
        loose::write_nested(output, self.original_destination.as_ref(), version)?;
        loose::write_nested(output, self.message_id.as_ref(), version)?;
        loose::write_nested(output, self.original_transaction_id.as_ref(), version)?;
        loose::write_nullable_string(output, self.group_id.as_deref())?;
        output.write_int(self.group_sequence)?;
        loose::write_nullable_string(output, self.correlation_id.as_deref())?;
        output.write_bool(self.persistent)?;
        output.write_long(self.expiration)?;
        output.write_ubyte(self.priority)?;
        loose::write_nested(output, self.reply_to.as_ref(), version)?;
        output.write_long(self.timestamp)?;
        loose::write_nullable_string(output, self.message_type.as_deref())?;
        loose::write_byte_array(output, &self.content)?;
        self.properties.write(output)?;
        loose::write_nested(output, self.data_structure.as_ref(), version)?;
        loose::write_nested(output, self.target_consumer_id.as_ref(), version)?;
        output.write_bool(self.compressed)?;
        output.write_int(self.redelivery_counter)?;
        loose::write_nested_array(output, &self.broker_path, version)?;
        output.write_long(self.arrival)?;
        loose::write_nullable_string(output, self.user_id.as_deref())?;
        if version >= 2 {
            output.write_bool(self.droppable)?;
        }
        if version >= 3 {
            loose::write_nested_array(output, &self.cluster, version)?;
            output.write_long(self.broker_in_time)?;
            output.write_long(self.broker_out_time)?;
        }
        Ok(())
    }

    pub(crate) fn read(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
        self.header.read(input)?;
        self.producer_id = loose::read_nested(input, version)?;
        self.destination = loose::read_nested(input, version)?;
        self.transaction_id = loose::read_nested(input, version)?;
        self.original_destination = loose::read_nested(input, version)?;
        self.message_id = loose::read_nested(input, version)?;
        self.original_transaction_id = loose::read_nested(input, version)?;
        self.group_id = loose::read_nullable_string(input)?;
        self.group_sequence = input.read_int()?;
        self.correlation_id = loose::read_nullable_string(input)?;
        self.persistent = input.read_bool()?;
        self.expiration = input.read_long()?;
        self.priority = input.read_ubyte()?;
        self.reply_to = loose::read_nested(input, version)?;
        self.timestamp = input.read_long()?;
        self.message_type = loose::read_nullable_string(input)?;
        self.content = loose::read_byte_array(input)?;
        self.properties = PrimitiveMap::read(input)?;
        self.data_structure = loose::read_nested(input, version)?;
        self.target_consumer_id = loose::read_nested(input, version)?;
        self.compressed = input.read_bool()?;
        self.redelivery_counter = input.read_int()?;
        self.broker_path = loose::read_nested_array(input, version)?;
        self.arrival = input.read_long()?;
        self.user_id = loose::read_nullable_string(input)?;
        if version >= 2 {
            self.droppable = input.read_bool()?;
        }
        if version >= 3 {
            self.cluster = loose::read_nested_array(input, version)?;
            self.broker_in_time = input.read_long()?;
            self.broker_out_time = input.read_long()?;
        }
        Ok(())
    }
}

/// A command that carries application data to or from a destination.
pub trait Message: Command {
    /// The fields every message kind shares.
    fn message(&self) -> &MessageBase;

    /// The shared fields, mutably.
    fn message_mut(&mut self) -> &mut MessageBase;

    /// Returns an independently owned deep copy that keeps the message capability.
    fn clone_message(&self) -> Box<dyn Message>;

    fn message_id(&self) -> Option<&MessageId> {
        self.message().message_id.as_ref()
    }

    fn destination(&self) -> Option<&ActiveMqDestination> {
        self.message().destination.as_ref()
    }

    fn properties(&self) -> &PrimitiveMap {
        &self.message().properties
    }

    fn property(&self, name: &str) -> Option<&PrimitiveValue> {
        self.message().properties.get(name)
    }

    fn set_property(&mut self, name: &str, value: PrimitiveValue) {
        self.message_mut().properties.insert(name, value);
    }

    fn is_persistent(&self) -> bool {
        self.message().persistent
    }

    /// Returns `true` once the expiration time has passed `now`, both in epoch milliseconds.
    fn is_expired(&self, now: i64) -> bool {
        let expiration = self.message().expiration;
        expiration > 0 && now > expiration
    }
}

impl PartialEq for dyn Message {
    fn eq(&self, other: &Self) -> bool {
        let other: &dyn DataStructure = other;
        self.equals(other)
    }
}

impl Clone for Box<dyn Message> {
    fn clone(&self) -> Self {
        self.clone_message()
    }
}

/// Implements [`Command`] and [`Message`] for a type with a `base: MessageBase` field, and the
/// [`Variant`] capability views that expose them.
macro_rules! message_capabilities {
    ($ty:ty) => {
        impl Command for $ty {
            fn header(&self) -> &CommandHeader {
                &self.base.header
            }

            fn header_mut(&mut self) -> &mut CommandHeader {
                &mut self.base.header
            }
        }

        impl Message for $ty {
            fn message(&self) -> &MessageBase {
                &self.base
            }

            fn message_mut(&mut self) -> &mut MessageBase {
                &mut self.base
            }

            fn clone_message(&self) -> Box<dyn Message> {
                Box::new(self.clone())
            }
        }
    };
}

macro_rules! message_views {
    () => {
        command_views!();

        fn message_view(&self) -> Option<&dyn Message> {
            Some(self)
        }

        fn boxed_message(self: Box<Self>) -> std::result::Result<Box<dyn Message>, Box<Self>> {
            Ok(self)
        }
    };
}

/// Defines a message kind whose body lives entirely in `content`.
macro_rules! simple_message {
    ($(#[$meta:meta])* $name:ident, $code:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name {
            pub base: MessageBase,
        }

        impl Variant for $name {
            fn data_structure_type(&self) -> u8 {
                $code
            }

            fn write_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
                self.base.write(output, version)
            }

            fn read_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
                self.base.read(input, version)
            }

            message_views!();
        }

        message_capabilities!($name);
    };
}

simple_message!(
    /// A message without a typed body.
    ActiveMqMessage,
    ACTIVEMQ_MESSAGE
);

simple_message!(
    /// A message whose body is an opaque byte sequence.
    BytesMessage,
    ACTIVEMQ_BYTES_MESSAGE
);

simple_message!(
    /// A message whose body is a map of primitive values.
    MapMessage,
    ACTIVEMQ_MAP_MESSAGE
);

simple_message!(
    /// A message whose body is a serialized object, kept as bytes.
    ObjectMessage,
    ACTIVEMQ_OBJECT_MESSAGE
);

simple_message!(
    /// A message whose body is a sequence of primitive values.
    StreamMessage,
    ACTIVEMQ_STREAM_MESSAGE
);

simple_message!(
    /// A message whose body is a string.
    TextMessage,
    ACTIVEMQ_TEXT_MESSAGE
);

impl BytesMessage {
    pub fn body(&self) -> &[u8] {
        &self.base.content
    }

    pub fn set_body(&mut self, body: Vec<u8>) {
        self.base.content = body;
    }
}

impl ObjectMessage {
    pub fn object_bytes(&self) -> &[u8] {
        &self.base.content
    }

    pub fn set_object_bytes(&mut self, bytes: Vec<u8>) {
        self.base.content = bytes;
    }
}

impl TextMessage {
    /// Decodes the body; an empty body is no text.
    pub fn text(&self) -> Result<Option<String>> {
        if self.base.content.is_empty() {
            return Ok(None);
        }
        let mut input = ObjectDataInput::new(&self.base.content);
        input.read_string().map(Some)
    }

    pub fn set_text(&mut self, text: &str) -> Result<()> {
        let mut output = ObjectDataOutput::with_capacity(text.len() + 4);
        output.write_string(text)?;
        self.base.content = output.into_bytes();
        Ok(())
    }
}

impl MapMessage {
    pub fn map(&self) -> Result<PrimitiveMap> {
        if self.base.content.is_empty() {
            return Ok(PrimitiveMap::new());
        }
        let mut input = ObjectDataInput::new(&self.base.content);
        PrimitiveMap::read(&mut input)
    }

    pub fn set_map(&mut self, map: &PrimitiveMap) -> Result<()> {
        let mut output = ObjectDataOutput::new();
        map.write(&mut output)?;
        self.base.content = output.into_bytes();
        Ok(())
    }
}

impl StreamMessage {
    /// Decodes the body as consecutive tagged values.
    pub fn values(&self) -> Result<Vec<PrimitiveValue>> {
        let mut input = ObjectDataInput::new(&self.base.content);
        let mut values = Vec::new();
        while input.remaining() > 0 {
            values.push(PrimitiveValue::read(&mut input)?);
        }
        Ok(values)
    }

    pub fn set_values(&mut self, values: &[PrimitiveValue]) -> Result<()> {
        let mut output = ObjectDataOutput::new();
        for value in values {
            value.write(&mut output)?;
        }
        self.base.content = output.into_bytes();
        Ok(())
    }
}

/// A message whose body is stored out of band and referenced by URL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlobMessage {
    pub base: MessageBase,
    pub remote_blob_url: Option<String>,
    pub mime_type: Option<String>,
    pub delete_when_done: bool,
}

impl Variant for BlobMessage {
    fn data_structure_type(&self) -> u8 {
        ACTIVEMQ_BLOB_MESSAGE
    }

    fn write_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        self.base.write(output, version)?;
        loose::write_nullable_string(output, self.remote_blob_url.as_deref())?;
        loose::write_nullable_string(output, self.mime_type.as_deref())?;
        output.write_bool(self.delete_when_done)
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
        self.base.read(input, version)?;
        self.remote_blob_url = loose::read_nullable_string(input)?;
        self.mime_type = loose::read_nullable_string(input)?;
        self.delete_when_done = input.read_bool()?;
        Ok(())
    }

    message_views!();
}

message_capabilities!(BlobMessage);

impl fmt::Display for dyn Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message_id() {
            Some(id) => write!(f, "message {id} (type {})", self.type_code()),
            None => write!(f, "message (type {})", self.type_code()),
        }
    }
}

/// Narrows a decoded data structure to a message without re-decoding it.
pub fn into_message(value: Box<dyn DataStructure>) -> Result<Box<dyn Message>> {
    value.into_message().map_err(|other| {
        OpenWireError::TypeMismatch {
            expected: ACTIVEMQ_MESSAGE,
            found: other.type_code(),
        }
    })
}
