//! Lifecycle announcements: wire format, broker, connection, session, consumer and producer
//! registration and removal.

use crate::error::{OpenWireError, Result};
use crate::marshal::loose;
use crate::marshal::{DataInput, DataOutput};
use crate::protocol::constants::{
    BROKER_INFO, CONNECTION_INFO, CONSUMER_INFO, DEFAULT_VERSION, DESTINATION_ADD_OPERATION,
    DESTINATION_INFO, DESTINATION_REMOVE_OPERATION, MAGIC, PRODUCER_INFO, REMOVE_INFO,
    REMOVE_SUBSCRIPTION_INFO, SESSION_INFO, SUBSCRIPTION_INFO, TRANSACTION_INFO, WIRE_FORMAT_INFO,
};

use super::{
    impl_command, ActiveMqDestination, BrokerId, CommandHeader, ConnectionId, ConsumerId,
    DataStructure, PrimitiveMap, PrimitiveValue, ProducerId, SessionId, TransactionId, Variant,
};

pub const TIGHT_ENCODING_ENABLED: &str = "TightEncodingEnabled";
pub const CACHE_ENABLED: &str = "CacheEnabled";
pub const CACHE_SIZE: &str = "CacheSize";
pub const SIZE_PREFIX_DISABLED: &str = "SizePrefixDisabled";
pub const STACK_TRACE_ENABLED: &str = "StackTraceEnabled";
pub const TCP_NO_DELAY_ENABLED: &str = "TcpNoDelayEnabled";
pub const MAX_INACTIVITY_DURATION: &str = "MaxInactivityDuration";
pub const MAX_INACTIVITY_DURATION_INITIAL_DELAY: &str = "MaxInactivityDurationInitalDelay";
pub const MAX_FRAME_SIZE: &str = "MaxFrameSize";

/// The first command each peer sends: protocol magic, version and encoding options.
#[derive(Debug, Clone, PartialEq)]
pub struct WireFormatInfo {
    pub magic: [u8; 8],
    pub version: i32,
    pub properties: PrimitiveMap,
}

impl Default for WireFormatInfo {
    fn default() -> Self {
        Self::new(DEFAULT_VERSION as i32)
    }
}

impl WireFormatInfo {
    pub fn new(version: i32) -> Self {
        Self {
            magic: MAGIC,
            version,
            properties: PrimitiveMap::new(),
        }
    }

    /// Returns `true` if the magic identifies an OpenWire peer.
    pub fn is_valid(&self) -> bool {
        self.magic == MAGIC
    }

    pub fn property(&self, name: &str) -> Option<&PrimitiveValue> {
        self.properties.get(name)
    }

    pub fn set_property(&mut self, name: &str, value: impl Into<PrimitiveValue>) {
        self.properties.insert(name, value);
    }

    pub fn is_tight_encoding_enabled(&self) -> bool {
        self.properties.get_bool(TIGHT_ENCODING_ENABLED).unwrap_or(false)
    }

    pub fn is_cache_enabled(&self) -> bool {
        self.properties.get_bool(CACHE_ENABLED).unwrap_or(false)
    }

    pub fn is_size_prefix_disabled(&self) -> bool {
        self.properties.get_bool(SIZE_PREFIX_DISABLED).unwrap_or(false)
    }

    pub fn max_inactivity_duration(&self) -> Option<i64> {
        self.properties.get_long(MAX_INACTIVITY_DURATION)
    }

    pub fn max_frame_size(&self) -> Option<i64> {
        self.properties.get_long(MAX_FRAME_SIZE)
    }
}

impl Variant for WireFormatInfo {
    fn data_structure_type(&self) -> u8 {
        WIRE_FORMAT_INFO
    }

    fn write_fields(&self, output: &mut dyn DataOutput, _version: u32) -> Result<()> {
        output.write_bytes(&self.magic)?;
        output.write_int(self.version)?;
        self.properties.write(output)
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, _version: u32) -> Result<()> {
        let magic = input.read_bytes(MAGIC.len())?;
        self.magic = magic
            .try_into()
            .map_err(|_| OpenWireError::MalformedField("wire format magic".to_string()))?;
        self.version = input.read_int()?;
        self.properties = PrimitiveMap::read(input)?;
        Ok(())
    }
}

/// Describes a broker to its clients and peers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrokerInfo {
    pub header: CommandHeader,
    pub broker_id: Option<BrokerId>,
    pub broker_url: Option<String>,
    pub peer_broker_infos: Vec<BrokerInfo>,
    pub broker_name: Option<String>,
    pub slave_broker: bool,
    pub master_broker: bool,
    pub fault_tolerant_configuration: bool,
    /// Carried from version 2.
    pub duplex_connection: bool,
    /// Carried from version 2.
    pub network_connection: bool,
    /// Carried from version 2.
    pub connection_id: i64,
    /// Carried from version 3.
    pub broker_upload_url: Option<String>,
    /// Carried from version 3.
    pub network_properties: Option<String>,
}

impl Variant for BrokerInfo {
    fn data_structure_type(&self) -> u8 {
        BROKER_INFO
    }

    fn write_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        self.header.write(output)?;
        loose::write_nested(output, self.broker_id.as_ref(), version)?;
        loose::write_nullable_string(output, self.broker_url.as_deref())?;
        loose::write_nested_array(output, &self.peer_broker_infos, version)?;
        loose::write_nullable_string(output, self.broker_name.as_deref())?;
        output.write_bool(self.slave_broker)?;
        output.write_bool(self.master_broker)?;
        output.write_bool(self.fault_tolerant_configuration)?;
        if version >= 2 {
            output.write_bool(self.duplex_connection)?;
            output.write_bool(self.network_connection)?;
            output.write_long(self.connection_id)?;
        }
        if version >= 3 {
            loose::write_nullable_string(output, self.broker_upload_url.as_deref())?;
            loose::write_nullable_string(output, self.network_properties.as_deref())?;
        }
        Ok(())
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
        self.header.read(input)?;
        self.broker_id = loose::read_nested(input, version)?;
        self.broker_url = loose::read_nullable_string(input)?;
        self.peer_broker_infos = loose::read_nested_array(input, version)?;
        self.broker_name = loose::read_nullable_string(input)?;
        self.slave_broker = input.read_bool()?;
        self.master_broker = input.read_bool()?;
        self.fault_tolerant_configuration = input.read_bool()?;
        if version >= 2 {
            self.duplex_connection = input.read_bool()?;
            self.network_connection = input.read_bool()?;
            self.connection_id = input.read_long()?;
        }
        if version >= 3 {
            self.broker_upload_url = loose::read_nullable_string(input)?;
            self.network_properties = loose::read_nullable_string(input)?;
        }
        Ok(())
    }

    command_views!();
}

/// Opens a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub header: CommandHeader,
    pub connection_id: Option<ConnectionId>,
    pub client_id: Option<String>,
    pub password: Option<String>,
    pub user_name: Option<String>,
    pub broker_path: Vec<BrokerId>,
    pub broker_master_connector: bool,
    pub manageable: bool,
    /// Carried from version 2.
    pub client_master: bool,
    /// Carried from version 6.
    pub fault_tolerant: bool,
    /// Carried from version 6.
    pub failover_reconnect: bool,
    /// Carried from version 8.
    pub client_ip: Option<String>,
}

impl ConnectionInfo {
    pub fn new(connection_id: ConnectionId) -> Self {
        Self {
            connection_id: Some(connection_id),
            manageable: true,
            client_master: true,
            ..Self::default()
        }
    }
}

impl Variant for ConnectionInfo {
    fn data_structure_type(&self) -> u8 {
        CONNECTION_INFO
    }

    fn write_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        self.header.write(output)?;
        loose::write_nested(output, self.connection_id.as_ref(), version)?;
        loose::write_nullable_string(output, self.client_id.as_deref())?;
        loose::write_nullable_string(output, self.password.as_deref())?;
        loose::write_nullable_string(output, self.user_name.as_deref())?;
        loose::write_nested_array(output, &self.broker_path, version)?;
        output.write_bool(self.broker_master_connector)?;
        output.write_bool(self.manageable)?;
        if version >= 2 {
            output.write_bool(self.client_master)?;
        }
        if version >= 6 {
            output.write_bool(self.fault_tolerant)?;
            output.write_bool(self.failover_reconnect)?;
        }
        if version >= 8 {
            loose::write_nullable_string(output, self.client_ip.as_deref())?;
        }
        Ok(())
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
        self.header.read(input)?;
        self.connection_id = loose::read_nested(input, version)?;
        self.client_id = loose::read_nullable_string(input)?;
        self.password = loose::read_nullable_string(input)?;
        self.user_name = loose::read_nullable_string(input)?;
        self.broker_path = loose::read_nested_array(input, version)?;
        self.broker_master_connector = input.read_bool()?;
        self.manageable = input.read_bool()?;
        if version >= 2 {
            self.client_master = input.read_bool()?;
        }
        if version >= 6 {
            self.fault_tolerant = input.read_bool()?;
            self.failover_reconnect = input.read_bool()?;
        }
        if version >= 8 {
            self.client_ip = loose::read_nullable_string(input)?;
        }
        Ok(())
    }

    command_views!();
}

/// Opens a session within a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionInfo {
    pub header: CommandHeader,
    pub session_id: Option<SessionId>,
}

impl Variant for SessionInfo {
    fn data_structure_type(&self) -> u8 {
        SESSION_INFO
    }

    fn write_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        self.header.write(output)?;
        loose::write_nested(output, self.session_id.as_ref(), version)
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
        self.header.read(input)?;
        self.session_id = loose::read_nested(input, version)?;
        Ok(())
    }

    command_views!();
}

/// Registers a consumer and its subscription options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsumerInfo {
    pub header: CommandHeader,
    pub consumer_id: Option<ConsumerId>,
    pub browser: bool,
    pub destination: Option<ActiveMqDestination>,
    pub prefetch_size: i32,
    pub maximum_pending_message_limit: i32,
    pub dispatch_async: bool,
    pub selector: Option<String>,
    pub subscription_name: Option<String>,
    pub no_local: bool,
    pub exclusive: bool,
    pub retroactive: bool,
    pub priority: i8,
    pub broker_path: Vec<BrokerId>,
    pub additional_predicate: Option<Box<dyn DataStructure>>,
    pub network_subscription: bool,
    pub optimized_acknowledge: bool,
    pub no_range_acks: bool,
    /// Carried from version 4.
    pub network_consumer_path: Vec<ConsumerId>,
}

impl ConsumerInfo {
    pub fn new(consumer_id: ConsumerId, destination: ActiveMqDestination) -> Self {
        Self {
            consumer_id: Some(consumer_id),
            destination: Some(destination),
            prefetch_size: 1000,
            dispatch_async: true,
            ..Self::default()
        }
    }

    /// Returns `true` for durable topic subscriptions.
    pub fn is_durable(&self) -> bool {
        self.subscription_name.is_some()
    }
}

impl Variant for ConsumerInfo {
    fn data_structure_type(&self) -> u8 {
        CONSUMER_INFO
    }

    fn write_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        self.header.write(output)?;
        loose::write_nested(output, self.consumer_id.as_ref(), version)?;
        output.write_bool(self.browser)?;
        loose::write_nested(output, self.destination.as_ref(), version)?;
        output.write_int(self.prefetch_size)?;
        output.write_int(self.maximum_pending_message_limit)?;
        output.write_bool(self.dispatch_async)?;
        loose::write_nullable_string(output, self.selector.as_deref())?;
        loose::write_nullable_string(output, self.subscription_name.as_deref())?;
        output.write_bool(self.no_local)?;
        output.write_bool(self.exclusive)?;
        output.write_bool(self.retroactive)?;
        output.write_byte(self.priority)?;
        loose::write_nested_array(output, &self.broker_path, version)?;
        loose::write_nested(output, self.additional_predicate.as_ref(), version)?;
        output.write_bool(self.network_subscription)?;
        output.write_bool(self.optimized_acknowledge)?;
        output.write_bool(self.no_range_acks)?;
        if version >= 4 {
            loose::write_nested_array(output, &self.network_consumer_path, version)?;
        }
        Ok(())
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
        self.header.read(input)?;
        self.consumer_id = loose::read_nested(input, version)?;
        self.browser = input.read_bool()?;
        self.destination = loose::read_nested(input, version)?;
        self.prefetch_size = input.read_int()?;
        self.maximum_pending_message_limit = input.read_int()?;
        self.dispatch_async = input.read_bool()?;
        self.selector = loose::read_nullable_string(input)?;
        self.subscription_name = loose::read_nullable_string(input)?;
        self.no_local = input.read_bool()?;
        self.exclusive = input.read_bool()?;
        self.retroactive = input.read_bool()?;
        self.priority = input.read_byte()?;
        self.broker_path = loose::read_nested_array(input, version)?;
        self.additional_predicate = loose::read_nested(input, version)?;
        self.network_subscription = input.read_bool()?;
        self.optimized_acknowledge = input.read_bool()?;
        self.no_range_acks = input.read_bool()?;
        if version >= 4 {
            self.network_consumer_path = loose::read_nested_array(input, version)?;
        }
        Ok(())
    }

    command_views!();
}

/// Registers a producer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProducerInfo {
    pub header: CommandHeader,
    pub producer_id: Option<ProducerId>,
    pub destination: Option<ActiveMqDestination>,
    pub broker_path: Vec<BrokerId>,
    /// Carried from version 2.
    pub dispatch_async: bool,
    /// Carried from version 3.
    pub window_size: i32,
}

impl Variant for ProducerInfo {
    fn data_structure_type(&self) -> u8 {
        PRODUCER_INFO
    }

    fn write_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        self.header.write(output)?;
        loose::write_nested(output, self.producer_id.as_ref(), version)?;
        loose::write_nested(output, self.destination.as_ref(), version)?;
        loose::write_nested_array(output, &self.broker_path, version)?;
        if version >= 2 {
            output.write_bool(self.dispatch_async)?;
        }
        if version >= 3 {
            output.write_int(self.window_size)?;
        }
        Ok(())
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
        self.header.read(input)?;
        self.producer_id = loose::read_nested(input, version)?;
        self.destination = loose::read_nested(input, version)?;
        self.broker_path = loose::read_nested_array(input, version)?;
        if version >= 2 {
            self.dispatch_async = input.read_bool()?;
        }
        if version >= 3 {
            self.window_size = input.read_int()?;
        }
        Ok(())
    }

    command_views!();
}

/// Begins, prepares, commits or rolls back a transaction.
///
/// `transaction_type` holds one of the `TRANSACTION_*` constants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionInfo {
    pub header: CommandHeader,
    pub connection_id: Option<ConnectionId>,
    pub transaction_id: Option<TransactionId>,
    pub transaction_type: u8,
}

impl Variant for TransactionInfo {
    fn data_structure_type(&self) -> u8 {
        TRANSACTION_INFO
    }

    fn write_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        self.header.write(output)?;
        loose::write_nested(output, self.connection_id.as_ref(), version)?;
        loose::write_nested(output, self.transaction_id.as_ref(), version)?;
        output.write_ubyte(self.transaction_type)
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
        self.header.read(input)?;
        self.connection_id = loose::read_nested(input, version)?;
        self.transaction_id = loose::read_nested(input, version)?;
        self.transaction_type = input.read_ubyte()?;
        Ok(())
    }

    command_views!();
}

/// Creates or removes a destination on the broker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationInfo {
    pub header: CommandHeader,
    pub connection_id: Option<ConnectionId>,
    pub destination: Option<ActiveMqDestination>,
    pub operation_type: u8,
    pub timeout: i64,
    pub broker_path: Vec<BrokerId>,
}

impl DestinationInfo {
    pub fn is_add_operation(&self) -> bool {
        self.operation_type == DESTINATION_ADD_OPERATION
    }

    pub fn is_remove_operation(&self) -> bool {
        self.operation_type == DESTINATION_REMOVE_OPERATION
    }
}

impl Variant for DestinationInfo {
    fn data_structure_type(&self) -> u8 {
        DESTINATION_INFO
    }

    fn write_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        self.header.write(output)?;
        loose::write_nested(output, self.connection_id.as_ref(), version)?;
        loose::write_nested(output, self.destination.as_ref(), version)?;
        output.write_ubyte(self.operation_type)?;
        output.write_long(self.timeout)?;
        loose::write_nested_array(output, &self.broker_path, version)
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
        self.header.read(input)?;
        self.connection_id = loose::read_nested(input, version)?;
        self.destination = loose::read_nested(input, version)?;
        self.operation_type = input.read_ubyte()?;
        self.timeout = input.read_long()?;
        self.broker_path = loose::read_nested_array(input, version)?;
        Ok(())
    }

    command_views!();
}

/// Deletes a durable subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveSubscriptionInfo {
    pub header: CommandHeader,
    pub connection_id: Option<ConnectionId>,
    pub subscription_name: Option<String>,
    pub client_id: Option<String>,
}

impl Variant for RemoveSubscriptionInfo {
    fn data_structure_type(&self) -> u8 {
        REMOVE_SUBSCRIPTION_INFO
    }

    fn write_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        self.header.write(output)?;
        loose::write_nested(output, self.connection_id.as_ref(), version)?;
        loose::write_nullable_string(output, self.subscription_name.as_deref())?;
        loose::write_nullable_string(output, self.client_id.as_deref())
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
        self.header.read(input)?;
        self.connection_id = loose::read_nested(input, version)?;
        self.subscription_name = loose::read_nullable_string(input)?;
        self.client_id = loose::read_nullable_string(input)?;
        Ok(())
    }

    command_views!();
}

/// Closes the connection, session, consumer or producer named by `object_id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoveInfo {
    pub header: CommandHeader,
    pub object_id: Option<Box<dyn DataStructure>>,
    /// Carried from version 5.
    pub last_delivered_sequence_id: i64,
}

impl RemoveInfo {
    pub fn new(object_id: impl DataStructure) -> Self {
        Self {
            object_id: Some(Box::new(object_id)),
            ..Self::default()
        }
    }
}

impl Variant for RemoveInfo {
    fn data_structure_type(&self) -> u8 {
        REMOVE_INFO
    }

    fn write_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        self.header.write(output)?;
        loose::write_nested(output, self.object_id.as_ref(), version)?;
        if version >= 5 {
            output.write_long(self.last_delivered_sequence_id)?;
        }
        Ok(())
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
        self.header.read(input)?;
        self.object_id = loose::read_nested(input, version)?;
        if version >= 5 {
            self.last_delivered_sequence_id = input.read_long()?;
        }
        Ok(())
    }

    command_views!();
}

/// A durable subscription as stored by the broker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionInfo {
    pub client_id: Option<String>,
    pub destination: Option<ActiveMqDestination>,
    pub selector: Option<String>,
    pub subscription_name: Option<String>,
    /// Carried from version 3.
    pub subscribed_destination: Option<ActiveMqDestination>,
}

impl Variant for SubscriptionInfo {
    fn data_structure_type(&self) -> u8 {
        SUBSCRIPTION_INFO
    }

    fn write_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        loose::write_nullable_string(output, self.client_id.as_deref())?;
        loose::write_nested(output, self.destination.as_ref(), version)?;
        loose::write_nullable_string(output, self.selector.as_deref())?;
        loose::write_nullable_string(output, self.subscription_name.as_deref())?;
        if version >= 3 {
            loose::write_nested(output, self.subscribed_destination.as_ref(), version)?;
        }
        Ok(())
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
        self.client_id = loose::read_nullable_string(input)?;
        self.destination = loose::read_nested(input, version)?;
        self.selector = loose::read_nullable_string(input)?;
        self.subscription_name = loose::read_nullable_string(input)?;
        if version >= 3 {
            self.subscribed_destination = loose::read_nested(input, version)?;
        }
        Ok(())
    }
}

impl_command!(
    BrokerInfo,
    ConnectionInfo,
    SessionInfo,
    ConsumerInfo,
    ProducerInfo,
    TransactionInfo,
    DestinationInfo,
    RemoveSubscriptionInfo,
    RemoveInfo,
);
