//! Message delivery to consumers and its acknowledgement.

use crate::error::Result;
use crate::marshal::loose;
use crate::marshal::{DataInput, DataOutput};
use crate::protocol::constants::{
    DELIVERED_ACK_TYPE, INDIVIDUAL_ACK_TYPE, MESSAGE_ACK, MESSAGE_DISPATCH,
    MESSAGE_DISPATCH_NOTIFICATION, POISON_ACK_TYPE, REDELIVERED_ACK_TYPE, STANDARD_ACK_TYPE,
    UNMATCHED_ACK_TYPE,
};

use super::{
    impl_command, ActiveMqDestination, BrokerError, CommandHeader, ConsumerId, Message, MessageId,
    TransactionId, Variant,
};

/// Delivers one message to one consumer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageDispatch {
    pub header: CommandHeader,
    pub consumer_id: Option<ConsumerId>,
    pub destination: Option<ActiveMqDestination>,
    pub message: Option<Box<dyn Message>>,
    pub redelivery_counter: i32,
}

impl Variant for MessageDispatch {
    fn data_structure_type(&self) -> u8 {
        MESSAGE_DISPATCH
    }

    fn write_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        self.header.write(output)?;
        loose::write_nested(output, self.consumer_id.as_ref(), version)?;
        loose::write_nested(output, self.destination.as_ref(), version)?;
        loose::write_nested(output, self.message.as_ref(), version)?;
        output.write_int(self.redelivery_counter)
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
        self.header.read(input)?;
        self.consumer_id = loose::read_nested(input, version)?;
        self.destination = loose::read_nested(input, version)?;
        self.message = loose::read_nested(input, version)?;
        self.redelivery_counter = input.read_int()?;
        Ok(())
    }

    command_views!();
}

/// Acknowledges one or more dispatched messages.
///
/// `ack_type` holds one of the `*_ACK_TYPE` constants; the range from `first_message_id` to
/// `last_message_id` covers `message_count` messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageAck {
    pub header: CommandHeader,
    pub destination: Option<ActiveMqDestination>,
    pub transaction_id: Option<TransactionId>,
    pub consumer_id: Option<ConsumerId>,
    pub ack_type: u8,
    pub first_message_id: Option<MessageId>,
    pub last_message_id: Option<MessageId>,
    pub message_count: i32,
    /// Carried from version 7.
    pub poison_cause: Option<BrokerError>,
}

impl MessageAck {
    /// Builds an acknowledgement of `message_count` messages ending with `dispatch`'s message.
    pub fn for_dispatch(dispatch: &MessageDispatch, ack_type: u8, message_count: i32) -> Self {
        let last_message_id = dispatch
            .message
            .as_ref()
            .and_then(|message| message.message_id().cloned());
        Self {
            destination: dispatch.destination.clone(),
            consumer_id: dispatch.consumer_id.clone(),
            ack_type,
            last_message_id,
            message_count,
            ..Self::default()
        }
    }

    pub fn is_delivered_ack(&self) -> bool {
        self.ack_type == DELIVERED_ACK_TYPE
    }

    pub fn is_poison_ack(&self) -> bool {
        self.ack_type == POISON_ACK_TYPE
    }

    pub fn is_standard_ack(&self) -> bool {
        self.ack_type == STANDARD_ACK_TYPE
    }

    pub fn is_redelivered_ack(&self) -> bool {
        self.ack_type == REDELIVERED_ACK_TYPE
    }

    pub fn is_individual_ack(&self) -> bool {
        self.ack_type == INDIVIDUAL_ACK_TYPE
    }

    pub fn is_unmatched_ack(&self) -> bool {
        self.ack_type == UNMATCHED_ACK_TYPE
    }
}

impl Variant for MessageAck {
    fn data_structure_type(&self) -> u8 {
        MESSAGE_ACK
    }

    fn write_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        self.header.write(output)?;
        loose::write_nested(output, self.destination.as_ref(), version)?;
        loose::write_nested(output, self.transaction_id.as_ref(), version)?;
        loose::write_nested(output, self.consumer_id.as_ref(), version)?;
        output.write_ubyte(self.ack_type)?;
        loose::write_nested(output, self.first_message_id.as_ref(), version)?;
        loose::write_nested(output, self.last_message_id.as_ref(), version)?;
        output.write_int(self.message_count)?;
        if version >= 7 {
            BrokerError::write_optional(output, self.poison_cause.as_ref())?;
        }
        Ok(())
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
        self.header.read(input)?;
        self.destination = loose::read_nested(input, version)?;
        self.transaction_id = loose::read_nested(input, version)?;
        self.consumer_id = loose::read_nested(input, version)?;
        self.ack_type = input.read_ubyte()?;
        self.first_message_id = loose::read_nested(input, version)?;
        self.last_message_id = loose::read_nested(input, version)?;
        self.message_count = input.read_int()?;
        if version >= 7 {
            self.poison_cause = BrokerError::read_optional(input)?;
        }
        Ok(())
    }

    command_views!();
}

/// Tells a slave broker which consumer its master dispatched a message to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageDispatchNotification {
    pub header: CommandHeader,
    pub consumer_id: Option<ConsumerId>,
    pub destination: Option<ActiveMqDestination>,
    pub delivery_sequence_id: i64,
    pub message_id: Option<MessageId>,
}

impl Variant for MessageDispatchNotification {
    fn data_structure_type(&self) -> u8 {
        MESSAGE_DISPATCH_NOTIFICATION
    }

    fn write_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        self.header.write(output)?;
        loose::write_nested(output, self.consumer_id.as_ref(), version)?;
        loose::write_nested(output, self.destination.as_ref(), version)?;
        output.write_long(self.delivery_sequence_id)?;
        loose::write_nested(output, self.message_id.as_ref(), version)
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
        self.header.read(input)?;
        self.consumer_id = loose::read_nested(input, version)?;
        self.destination = loose::read_nested(input, version)?;
        self.delivery_sequence_id = input.read_long()?;
        self.message_id = loose::read_nested(input, version)?;
        Ok(())
    }

    command_views!();
}

impl_command!(MessageDispatch, MessageAck, MessageDispatchNotification);
