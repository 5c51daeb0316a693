//! Records the broker writes to its persistence journal.

use crate::error::Result;
use crate::marshal::loose;
use crate::marshal::{DataInput, DataOutput};
use crate::protocol::constants::{
    JOURNAL_QUEUE_ACK, JOURNAL_TOPIC_ACK, JOURNAL_TRACE, JOURNAL_TRANSACTION,
};

use super::{ActiveMqDestination, MessageAck, MessageId, TransactionId, Variant};

/// A durable topic subscriber's acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalTopicAck {
    pub destination: Option<ActiveMqDestination>,
    pub message_id: Option<MessageId>,
    pub message_sequence_id: i64,
    pub subscription_name: Option<String>,
    pub client_id: Option<String>,
    pub transaction_id: Option<TransactionId>,
}

impl Variant for JournalTopicAck {
    fn data_structure_type(&self) -> u8 {
        JOURNAL_TOPIC_ACK
    }

    fn write_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        loose::write_nested(output, self.destination.as_ref(), version)?;
        loose::write_nested(output, self.message_id.as_ref(), version)?;
        output.write_long(self.message_sequence_id)?;
        loose::write_nullable_string(output, self.subscription_name.as_deref())?;
        loose::write_nullable_string(output, self.client_id.as_deref())?;
        loose::write_nested(output, self.transaction_id.as_ref(), version)
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
        self.destination = loose::read_nested(input, version)?;
        self.message_id = loose::read_nested(input, version)?;
        self.message_sequence_id = input.read_long()?;
        self.subscription_name = loose::read_nullable_string(input)?;
        self.client_id = loose::read_nullable_string(input)?;
        self.transaction_id = loose::read_nested(input, version)?;
        Ok(())
    }
}

/// A queue acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalQueueAck {
    pub destination: Option<ActiveMqDestination>,
    pub message_ack: Option<MessageAck>,
}

impl Variant for JournalQueueAck {
    fn data_structure_type(&self) -> u8 {
        JOURNAL_QUEUE_ACK
    }

    fn write_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        loose::write_nested(output, self.destination.as_ref(), version)?;
        loose::write_nested(output, self.message_ack.as_ref(), version)
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
        self.destination = loose::read_nested(input, version)?;
        self.message_ack = loose::read_nested(input, version)?;
        Ok(())
    }
}

/// A free-form marker in the journal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalTrace {
    pub message: Option<String>,
}

impl Variant for JournalTrace {
    fn data_structure_type(&self) -> u8 {
        JOURNAL_TRACE
    }

    fn write_fields(&self, output: &mut dyn DataOutput, _version: u32) -> Result<()> {
        loose::write_nullable_string(output, self.message.as_deref())
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, _version: u32) -> Result<()> {
        self.message = loose::read_nullable_string(input)?;
        Ok(())
    }
}

/// A transaction state change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalTransaction {
    pub transaction_id: Option<TransactionId>,
    pub transaction_type: u8,
    pub was_prepared: bool,
}

impl Variant for JournalTransaction {
    fn data_structure_type(&self) -> u8 {
        JOURNAL_TRANSACTION
    }

    fn write_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        loose::write_nested(output, self.transaction_id.as_ref(), version)?;
        output.write_ubyte(self.transaction_type)?;
        output.write_bool(self.was_prepared)
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
        self.transaction_id = loose::read_nested(input, version)?;
        self.transaction_type = input.read_ubyte()?;
        self.was_prepared = input.read_bool()?;
        Ok(())
    }
}
