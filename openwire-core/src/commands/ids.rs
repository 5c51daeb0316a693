//! Identifiers for connections, sessions, producers, consumers, messages and transactions.

use std::fmt;

use crate::error::{OpenWireError, Result};
use crate::marshal::loose::{self, Nested};
use crate::marshal::{DataInput, DataOutput};
use crate::protocol::constants::{
    BROKER_ID, CONNECTION_ID, CONSUMER_ID, LOCAL_TRANSACTION_ID, MESSAGE_ID, PRODUCER_ID,
    SESSION_ID, XA_TRANSACTION_ID,
};

use super::Variant;

/// Identifies a client connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId {
    pub value: String,
}

impl ConnectionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl Variant for ConnectionId {
    fn data_structure_type(&self) -> u8 {
        CONNECTION_ID
    }

    fn write_fields(&self, output: &mut dyn DataOutput, _version: u32) -> Result<()> {
        output.write_string(&self.value)
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, _version: u32) -> Result<()> {
        self.value = input.read_string()?;
        Ok(())
    }
}

/// Identifies a session within a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId {
    pub connection_id: String,
    pub value: i64,
}

impl SessionId {
    pub fn new(connection_id: &ConnectionId, value: i64) -> Self {
        Self {
            connection_id: connection_id.value.clone(),
            value,
        }
    }

    /// The connection this session belongs to.
    pub fn parent(&self) -> ConnectionId {
        ConnectionId::new(self.connection_id.clone())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.connection_id, self.value)
    }
}

impl Variant for SessionId {
    fn data_structure_type(&self) -> u8 {
        SESSION_ID
    }

    fn write_fields(&self, output: &mut dyn DataOutput, _version: u32) -> Result<()> {
        output.write_string(&self.connection_id)?;
        output.write_long(self.value)
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, _version: u32) -> Result<()> {
        self.connection_id = input.read_string()?;
        self.value = input.read_long()?;
        Ok(())
    }
}

/// Identifies a consumer within a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConsumerId {
    pub connection_id: String,
    pub session_id: i64,
    pub value: i64,
}

impl ConsumerId {
    pub fn new(session_id: &SessionId, value: i64) -> Self {
        Self {
            connection_id: session_id.connection_id.clone(),
            session_id: session_id.value,
            value,
        }
    }

    /// The session this consumer belongs to.
    pub fn parent(&self) -> SessionId {
        SessionId {
            connection_id: self.connection_id.clone(),
            value: self.session_id,
        }
    }
}

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.connection_id, self.session_id, self.value)
    }
}

impl Variant for ConsumerId {
    fn data_structure_type(&self) -> u8 {
        CONSUMER_ID
    }

    fn write_fields(&self, output: &mut dyn DataOutput, _version: u32) -> Result<()> {
        output.write_string(&self.connection_id)?;
        output.write_long(self.session_id)?;
        output.write_long(self.value)
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, _version: u32) -> Result<()> {
        self.connection_id = input.read_string()?;
        self.session_id = input.read_long()?;
        self.value = input.read_long()?;
        Ok(())
    }
}

/// Identifies a producer within a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProducerId {
    pub connection_id: String,
    pub value: i64,
    pub session_id: i64,
}

impl ProducerId {
    pub fn new(session_id: &SessionId, value: i64) -> Self {
        Self {
            connection_id: session_id.connection_id.clone(),
            value,
            session_id: session_id.value,
        }
    }

    /// The session this producer belongs to.
    pub fn parent(&self) -> SessionId {
        SessionId {
            connection_id: self.connection_id.clone(),
            value: self.session_id,
        }
    }
}

impl fmt::Display for ProducerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.connection_id, self.session_id, self.value)
    }
}

impl Variant for ProducerId {
    fn data_structure_type(&self) -> u8 {
        PRODUCER_ID
    }

    fn write_fields(&self, output: &mut dyn DataOutput, _version: u32) -> Result<()> {
        output.write_string(&self.connection_id)?;
        output.write_long(self.value)?;
        output.write_long(self.session_id)
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, _version: u32) -> Result<()> {
        self.connection_id = input.read_string()?;
        self.value = input.read_long()?;
        self.session_id = input.read_long()?;
        Ok(())
    }
}

/// Identifies a broker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BrokerId {
    pub value: String,
}

impl BrokerId {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl fmt::Display for BrokerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl Variant for BrokerId {
    fn data_structure_type(&self) -> u8 {
        BROKER_ID
    }

    fn write_fields(&self, output: &mut dyn DataOutput, _version: u32) -> Result<()> {
        output.write_string(&self.value)
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, _version: u32) -> Result<()> {
        self.value = input.read_string()?;
        Ok(())
    }
}

/// Identifies a message by its producer and sequence numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId {
    pub producer_id: Option<ProducerId>,
    pub producer_sequence_id: i64,
    pub broker_sequence_id: i64,
}

impl MessageId {
    pub fn new(producer_id: ProducerId, producer_sequence_id: i64) -> Self {
        Self {
            producer_id: Some(producer_id),
            producer_sequence_id,
            broker_sequence_id: 0,
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.producer_id {
            Some(producer_id) => write!(f, "{}:{}", producer_id, self.producer_sequence_id),
            None => write!(f, "{}", self.producer_sequence_id),
        }
    }
}

impl Variant for MessageId {
    fn data_structure_type(&self) -> u8 {
        MESSAGE_ID
    }

    fn write_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        loose::write_nested(output, self.producer_id.as_ref(), version)?;
        output.write_long(self.producer_sequence_id)?;
        output.write_long(self.broker_sequence_id)
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
        self.producer_id = loose::read_nested(input, version)?;
        self.producer_sequence_id = input.read_long()?;
        self.broker_sequence_id = input.read_long()?;
        Ok(())
    }
}

/// A transaction local to one connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalTransactionId {
    pub value: i64,
    pub connection_id: Option<ConnectionId>,
}

impl LocalTransactionId {
    pub fn new(connection_id: ConnectionId, value: i64) -> Self {
        Self {
            value,
            connection_id: Some(connection_id),
        }
    }
}

impl Variant for LocalTransactionId {
    fn data_structure_type(&self) -> u8 {
        LOCAL_TRANSACTION_ID
    }

    fn write_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        output.write_long(self.value)?;
        loose::write_nested(output, self.connection_id.as_ref(), version)
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
        self.value = input.read_long()?;
        self.connection_id = loose::read_nested(input, version)?;
        Ok(())
    }
}

/// A distributed (XA) transaction branch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct XaTransactionId {
    pub format_id: i32,
    pub global_transaction_id: Vec<u8>,
    pub branch_qualifier: Vec<u8>,
}

impl Variant for XaTransactionId {
    fn data_structure_type(&self) -> u8 {
        XA_TRANSACTION_ID
    }

    fn write_fields(&self, output: &mut dyn DataOutput, _version: u32) -> Result<()> {
        output.write_int(self.format_id)?;
        loose::write_byte_array(output, &self.global_transaction_id)?;
        loose::write_byte_array(output, &self.branch_qualifier)
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, _version: u32) -> Result<()> {
        self.format_id = input.read_int()?;
        self.global_transaction_id = loose::read_byte_array(input)?;
        self.branch_qualifier = loose::read_byte_array(input)?;
        Ok(())
    }
}

/// Either kind of transaction id, as carried by transactional commands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransactionId {
    Local(LocalTransactionId),
    Xa(XaTransactionId),
}

impl TransactionId {
    pub fn is_local(&self) -> bool {
        matches!(self, TransactionId::Local(_))
    }

    pub fn is_xa(&self) -> bool {
        matches!(self, TransactionId::Xa(_))
    }
}

impl From<LocalTransactionId> for TransactionId {
    fn from(id: LocalTransactionId) -> Self {
        TransactionId::Local(id)
    }
}

impl From<XaTransactionId> for TransactionId {
    fn from(id: XaTransactionId) -> Self {
        TransactionId::Xa(id)
    }
}

impl Nested for TransactionId {
    fn write_nested(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        match self {
            TransactionId::Local(id) => id.write_nested(output, version),
            TransactionId::Xa(id) => id.write_nested(output, version),
        }
    }

    fn read_nested(type_code: u8, input: &mut dyn DataInput, version: u32) -> Result<Self> {
        match type_code {
            LOCAL_TRANSACTION_ID => {
                LocalTransactionId::read_nested(type_code, input, version).map(Self::Local)
            }
            XA_TRANSACTION_ID => {
                XaTransactionId::read_nested(type_code, input, version).map(Self::Xa)
            }
            other => Err(OpenWireError::MalformedField(format!(
                "type code {other} is not a transaction id"
            ))),
        }
    }
}
