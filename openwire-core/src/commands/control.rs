//! Connection-level control commands.

use crate::error::Result;
use crate::marshal::loose;
use crate::marshal::{DataInput, DataOutput};
use crate::protocol::constants::{
    CONNECTION_CONTROL, CONNECTION_ERROR, CONSUMER_CONTROL, CONTROL_COMMAND, DISCOVERY_EVENT,
    FLUSH_COMMAND, KEEP_ALIVE_INFO, LAST_PARTIAL_COMMAND, MESSAGE_PULL, NETWORK_BRIDGE_FILTER,
    PARTIAL_COMMAND, PRODUCER_ACK, REPLAY_COMMAND, SHUTDOWN_INFO,
};

use super::{
    impl_command, ActiveMqDestination, BrokerError, BrokerId, CommandHeader, ConnectionId,
    ConsumerId, MessageId, ProducerId, Variant,
};

/// Defines a command that carries nothing but its header.
macro_rules! header_only_command {
    ($(#[$meta:meta])* $name:ident, $code:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            pub header: CommandHeader,
        }

        impl Variant for $name {
            fn data_structure_type(&self) -> u8 {
                $code
            }

            fn write_fields(&self, output: &mut dyn DataOutput, _version: u32) -> Result<()> {
                self.header.write(output)
            }

            fn read_fields(&mut self, input: &mut dyn DataInput, _version: u32) -> Result<()> {
                self.header.read(input)
            }

            command_views!();
        }

        impl_command!($name);
    };
}

header_only_command!(
    /// Sent periodically so both peers know the connection is alive.
    KeepAliveInfo,
    KEEP_ALIVE_INFO
);

header_only_command!(
    /// Announces an orderly close of the connection.
    ShutdownInfo,
    SHUTDOWN_INFO
);

header_only_command!(
    /// Asks the peer to flush anything it has buffered.
    FlushCommand,
    FLUSH_COMMAND
);

/// A free-form administrative command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlCommand {
    pub header: CommandHeader,
    pub command: Option<String>,
}

impl Variant for ControlCommand {
    fn data_structure_type(&self) -> u8 {
        CONTROL_COMMAND
    }

    fn write_fields(&self, output: &mut dyn DataOutput, _version: u32) -> Result<()> {
        self.header.write(output)?;
        loose::write_nullable_string(output, self.command.as_deref())
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, _version: u32) -> Result<()> {
        self.header.read(input)?;
        self.command = loose::read_nullable_string(input)?;
        Ok(())
    }

    command_views!();
}

/// An asynchronous error the broker raises against a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionError {
    pub header: CommandHeader,
    pub exception: Option<BrokerError>,
    pub connection_id: Option<ConnectionId>,
}

impl Variant for ConnectionError {
    fn data_structure_type(&self) -> u8 {
        CONNECTION_ERROR
    }

    fn write_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        self.header.write(output)?;
        BrokerError::write_optional(output, self.exception.as_ref())?;
        loose::write_nested(output, self.connection_id.as_ref(), version)
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
        self.header.read(input)?;
        self.exception = BrokerError::read_optional(input)?;
        self.connection_id = loose::read_nested(input, version)?;
        Ok(())
    }

    command_views!();
}

/// Broker instructions to a single consumer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumerControl {
    pub header: CommandHeader,
    /// Carried from version 6.
    pub destination: Option<ActiveMqDestination>,
    pub close: bool,
    pub consumer_id: Option<ConsumerId>,
    pub prefetch: i32,
    /// Carried from version 2.
    pub flush: bool,
    /// Carried from version 2.
    pub start: bool,
    /// Carried from version 2.
    pub stop: bool,
}

impl Variant for ConsumerControl {
    fn data_structure_type(&self) -> u8 {
        CONSUMER_CONTROL
    }

    fn write_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        self.header.write(output)?;
        if version >= 6 {
            loose::write_nested(output, self.destination.as_ref(), version)?;
        }
        output.write_bool(self.close)?;
        loose::write_nested(output, self.consumer_id.as_ref(), version)?;
        output.write_int(self.prefetch)?;
        if version >= 2 {
            output.write_bool(self.flush)?;
            output.write_bool(self.start)?;
            output.write_bool(self.stop)?;
        }
        Ok(())
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
        self.header.read(input)?;
        if version >= 6 {
            self.destination = loose::read_nested(input, version)?;
        }
        self.close = input.read_bool()?;
        self.consumer_id = loose::read_nested(input, version)?;
        self.prefetch = input.read_int()?;
        if version >= 2 {
            self.flush = input.read_bool()?;
            self.start = input.read_bool()?;
            self.stop = input.read_bool()?;
        }
        Ok(())
    }

    command_views!();
}

/// Broker instructions to a whole connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionControl {
    pub header: CommandHeader,
    pub close: bool,
    pub exit: bool,
    pub fault_tolerant: bool,
    pub resume: bool,
    pub suspend: bool,
    /// Carried from version 6.
    pub connected_brokers: Option<String>,
    /// Carried from version 6.
    pub reconnect_to: Option<String>,
    /// Carried from version 6.
    pub rebalance_connection: bool,
    /// Carried from version 8.
    pub token: Vec<u8>,
}

impl Variant for ConnectionControl {
    fn data_structure_type(&self) -> u8 {
        CONNECTION_CONTROL
    }

    fn write_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        self.header.write(output)?;
        output.write_bool(self.close)?;
        output.write_bool(self.exit)?;
        output.write_bool(self.fault_tolerant)?;
        output.write_bool(self.resume)?;
        output.write_bool(self.suspend)?;
        if version >= 6 {
            loose::write_nullable_string(output, self.connected_brokers.as_deref())?;
            loose::write_nullable_string(output, self.reconnect_to.as_deref())?;
            output.write_bool(self.rebalance_connection)?;
        }
        if version >= 8 {
            loose::write_byte_array(output, &self.token)?;
        }
        Ok(())
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
        self.header.read(input)?;
        self.close = input.read_bool()?;
        self.exit = input.read_bool()?;
        self.fault_tolerant = input.read_bool()?;
        self.resume = input.read_bool()?;
        self.suspend = input.read_bool()?;
        if version >= 6 {
            self.connected_brokers = loose::read_nullable_string(input)?;
            self.reconnect_to = loose::read_nullable_string(input)?;
            self.rebalance_connection = input.read_bool()?;
        }
        if version >= 8 {
            self.token = loose::read_byte_array(input)?;
        }
        Ok(())
    }

    command_views!();
}

/// Tells a producer how many bytes of its sends the broker has accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProducerAck {
    pub header: CommandHeader,
    pub producer_id: Option<ProducerId>,
    pub size: i32,
}

impl Variant for ProducerAck {
    fn data_structure_type(&self) -> u8 {
        PRODUCER_ACK
    }

    fn write_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        self.header.write(output)?;
        loose::write_nested(output, self.producer_id.as_ref(), version)?;
        output.write_int(self.size)
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
        self.header.read(input)?;
        self.producer_id = loose::read_nested(input, version)?;
        self.size = input.read_int()?;
        Ok(())
    }

    command_views!();
}

/// A request from a zero-prefetch consumer for its next message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePull {
    pub header: CommandHeader,
    pub consumer_id: Option<ConsumerId>,
    pub destination: Option<ActiveMqDestination>,
    pub timeout: i64,
    /// Carried from version 3.
    pub correlation_id: Option<String>,
    /// Carried from version 3.
    pub message_id: Option<MessageId>,
}

impl Variant for MessagePull {
    fn data_structure_type(&self) -> u8 {
        MESSAGE_PULL
    }

    fn write_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        self.header.write(output)?;
        loose::write_nested(output, self.consumer_id.as_ref(), version)?;
        loose::write_nested(output, self.destination.as_ref(), version)?;
        output.write_long(self.timeout)?;
        if version >= 3 {
            loose::write_nullable_string(output, self.correlation_id.as_deref())?;
            loose::write_nested(output, self.message_id.as_ref(), version)?;
        }
        Ok(())
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
        self.header.read(input)?;
        self.consumer_id = loose::read_nested(input, version)?;
        self.destination = loose::read_nested(input, version)?;
        self.timeout = input.read_long()?;
        if version >= 3 {
            self.correlation_id = loose::read_nullable_string(input)?;
            self.message_id = loose::read_nested(input, version)?;
        }
        Ok(())
    }

    command_views!();
}

/// A broker discovered or lost on the network.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryEvent {
    pub service_name: Option<String>,
    pub broker_name: Option<String>,
}

impl Variant for DiscoveryEvent {
    fn data_structure_type(&self) -> u8 {
        DISCOVERY_EVENT
    }

    fn write_fields(&self, output: &mut dyn DataOutput, _version: u32) -> Result<()> {
        loose::write_nullable_string(output, self.service_name.as_deref())?;
        loose::write_nullable_string(output, self.broker_name.as_deref())
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, _version: u32) -> Result<()> {
        self.service_name = loose::read_nullable_string(input)?;
        self.broker_name = loose::read_nullable_string(input)?;
        Ok(())
    }
}

/// Defines a fragment of a command too large for one datagram.
macro_rules! fragment_command {
    ($(#[$meta:meta])* $name:ident, $code:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            pub header: CommandHeader,
            pub data: Vec<u8>,
        }

        impl Variant for $name {
            fn data_structure_type(&self) -> u8 {
                $code
            }

            fn write_fields(&self, output: &mut dyn DataOutput, _version: u32) -> Result<()> {
                self.header.write(output)?;
                loose::write_byte_array(output, &self.data)
            }

            fn read_fields(&mut self, input: &mut dyn DataInput, _version: u32) -> Result<()> {
                self.header.read(input)?;
                self.data = loose::read_byte_array(input)?;
                Ok(())
            }

            command_views!();
        }

        impl_command!($name);
    };
}

fragment_command!(
    /// One fragment of a larger command.
    PartialCommand,
    PARTIAL_COMMAND
);

fragment_command!(
    /// The final fragment of a larger command.
    LastPartialCommand,
    LAST_PARTIAL_COMMAND
);

/// Asks the peer to resend the commands between two sequence numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayCommand {
    pub header: CommandHeader,
    pub first_nak_number: i32,
    pub last_nak_number: i32,
}

impl Variant for ReplayCommand {
    fn data_structure_type(&self) -> u8 {
        REPLAY_COMMAND
    }

    fn write_fields(&self, output: &mut dyn DataOutput, _version: u32) -> Result<()> {
        self.header.write(output)?;
        output.write_int(self.first_nak_number)?;
        output.write_int(self.last_nak_number)
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, _version: u32) -> Result<()> {
        self.header.read(input)?;
        self.first_nak_number = input.read_int()?;
        self.last_nak_number = input.read_int()?;
        Ok(())
    }

    command_views!();
}

/// Limits how far messages travel across a network of brokers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkBridgeFilter {
    pub network_broker_id: Option<BrokerId>,
    pub network_ttl: i32,
}

impl Variant for NetworkBridgeFilter {
    fn data_structure_type(&self) -> u8 {
        NETWORK_BRIDGE_FILTER
    }

    fn write_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        loose::write_nested(output, self.network_broker_id.as_ref(), version)?;
        output.write_int(self.network_ttl)
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
        self.network_broker_id = loose::read_nested(input, version)?;
        self.network_ttl = input.read_int()?;
        Ok(())
    }
}

impl_command!(
    ControlCommand,
    ConnectionError,
    ConsumerControl,
    ConnectionControl,
    ProducerAck,
    MessagePull,
    ReplayCommand,
);
