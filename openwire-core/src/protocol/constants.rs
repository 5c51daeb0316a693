//! Protocol constants for the OpenWire wire format.

/// Size of the frame length field in bytes.
pub const SIZE_OF_FRAME_LENGTH_FIELD: usize = 4;

/// Default upper bound on a single frame's payload (100 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 100 * 1024 * 1024;

/// Magic bytes opening every `WireFormatInfo`.
pub const MAGIC: [u8; 8] = *b"ActiveMQ";

/// Oldest protocol version the engine reads and writes.
pub const MIN_VERSION: u32 = 1;

/// Newest protocol version the engine reads and writes.
pub const MAX_VERSION: u32 = 12;

/// Version advertised when none is configured.
pub const DEFAULT_VERSION: u32 = MAX_VERSION;

// Type codes of the command catalog.

pub const WIRE_FORMAT_INFO: u8 = 1;
pub const BROKER_INFO: u8 = 2;
pub const CONNECTION_INFO: u8 = 3;
pub const SESSION_INFO: u8 = 4;
pub const CONSUMER_INFO: u8 = 5;
pub const PRODUCER_INFO: u8 = 6;
pub const TRANSACTION_INFO: u8 = 7;
pub const DESTINATION_INFO: u8 = 8;
pub const REMOVE_SUBSCRIPTION_INFO: u8 = 9;
pub const KEEP_ALIVE_INFO: u8 = 10;
pub const SHUTDOWN_INFO: u8 = 11;
pub const REMOVE_INFO: u8 = 12;
pub const CONTROL_COMMAND: u8 = 14;
pub const FLUSH_COMMAND: u8 = 15;
pub const CONNECTION_ERROR: u8 = 16;
pub const CONSUMER_CONTROL: u8 = 17;
pub const CONNECTION_CONTROL: u8 = 18;
pub const PRODUCER_ACK: u8 = 19;
pub const MESSAGE_PULL: u8 = 20;
pub const MESSAGE_DISPATCH: u8 = 21;
pub const MESSAGE_ACK: u8 = 22;

pub const ACTIVEMQ_MESSAGE: u8 = 23;
pub const ACTIVEMQ_BYTES_MESSAGE: u8 = 24;
pub const ACTIVEMQ_MAP_MESSAGE: u8 = 25;
pub const ACTIVEMQ_OBJECT_MESSAGE: u8 = 26;
pub const ACTIVEMQ_STREAM_MESSAGE: u8 = 27;
pub const ACTIVEMQ_TEXT_MESSAGE: u8 = 28;
pub const ACTIVEMQ_BLOB_MESSAGE: u8 = 29;

pub const RESPONSE: u8 = 30;
pub const EXCEPTION_RESPONSE: u8 = 31;
pub const DATA_RESPONSE: u8 = 32;
pub const DATA_ARRAY_RESPONSE: u8 = 33;
pub const INTEGER_RESPONSE: u8 = 34;

pub const DISCOVERY_EVENT: u8 = 40;

pub const JOURNAL_TOPIC_ACK: u8 = 50;
pub const JOURNAL_QUEUE_ACK: u8 = 52;
pub const JOURNAL_TRACE: u8 = 53;
pub const JOURNAL_TRANSACTION: u8 = 54;
pub const SUBSCRIPTION_INFO: u8 = 55;

pub const PARTIAL_COMMAND: u8 = 60;
pub const LAST_PARTIAL_COMMAND: u8 = 61;
pub const REPLAY_COMMAND: u8 = 65;

pub const MESSAGE_DISPATCH_NOTIFICATION: u8 = 90;
pub const NETWORK_BRIDGE_FILTER: u8 = 91;

pub const ACTIVEMQ_QUEUE: u8 = 100;
pub const ACTIVEMQ_TOPIC: u8 = 101;
pub const ACTIVEMQ_TEMP_QUEUE: u8 = 102;
pub const ACTIVEMQ_TEMP_TOPIC: u8 = 103;

pub const MESSAGE_ID: u8 = 110;
pub const LOCAL_TRANSACTION_ID: u8 = 111;
pub const XA_TRANSACTION_ID: u8 = 112;

pub const CONNECTION_ID: u8 = 120;
pub const SESSION_ID: u8 = 121;
pub const CONSUMER_ID: u8 = 122;
pub const PRODUCER_ID: u8 = 123;
pub const BROKER_ID: u8 = 124;

// Acknowledgement types carried by `MessageAck`.

pub const DELIVERED_ACK_TYPE: u8 = 0;
pub const POISON_ACK_TYPE: u8 = 1;
pub const STANDARD_ACK_TYPE: u8 = 2;
pub const REDELIVERED_ACK_TYPE: u8 = 3;
pub const INDIVIDUAL_ACK_TYPE: u8 = 4;
pub const UNMATCHED_ACK_TYPE: u8 = 5;

// Transaction operations carried by `TransactionInfo`.

pub const TRANSACTION_BEGIN: u8 = 0;
pub const TRANSACTION_PREPARE: u8 = 1;
pub const TRANSACTION_COMMIT_ONE_PHASE: u8 = 2;
pub const TRANSACTION_COMMIT_TWO_PHASE: u8 = 3;
pub const TRANSACTION_ROLLBACK: u8 = 4;
pub const TRANSACTION_RECOVER: u8 = 5;
pub const TRANSACTION_FORGET: u8 = 6;
pub const TRANSACTION_END: u8 = 7;

// Operations carried by `DestinationInfo`.

pub const DESTINATION_ADD_OPERATION: u8 = 0;
pub const DESTINATION_REMOVE_OPERATION: u8 = 1;

/// Returns `true` if the engine can read and write `version`.
pub fn is_supported_version(version: u32) -> bool {
    (MIN_VERSION..=MAX_VERSION).contains(&version)
}
