//! The OpenWire command catalog.
//!
//! Every wire-transmissible type implements [`Variant`] and therefore [`DataStructure`].
//! Top-level commands additionally implement [`Command`], and the seven message kinds implement
//! [`Message`].

/// Implements the command capability views inside a [`Variant`] impl.
macro_rules! command_views {
    () => {
        fn command_view(&self) -> Option<&dyn $crate::commands::Command> {
            Some(self)
        }

        fn command_view_mut(&mut self) -> Option<&mut dyn $crate::commands::Command> {
            Some(self)
        }
    };
}

pub(crate) use command_views;

mod control;
mod data_structure;
mod destination;
mod dispatch;
mod ids;
mod info;
mod journal;
mod message;
mod primitive;
mod response;

pub use control::{
    ConnectionControl, ConnectionError, ConsumerControl, ControlCommand, DiscoveryEvent,
    FlushCommand, KeepAliveInfo, LastPartialCommand, MessagePull, NetworkBridgeFilter,
    PartialCommand, ProducerAck, ReplayCommand, ShutdownInfo,
};
pub use data_structure::{equals_optional, Command, CommandHeader, DataStructure, Variant};
pub(crate) use data_structure::impl_command;
pub use destination::{ActiveMqDestination, Destination, DestinationType};
pub use dispatch::{MessageAck, MessageDispatch, MessageDispatchNotification};
pub use ids::{
    BrokerId, ConnectionId, ConsumerId, LocalTransactionId, MessageId, ProducerId, SessionId,
    TransactionId, XaTransactionId,
};
pub use info::{
    BrokerInfo, ConnectionInfo, ConsumerInfo, DestinationInfo, ProducerInfo, RemoveInfo,
    RemoveSubscriptionInfo, SessionInfo, SubscriptionInfo, TransactionInfo, WireFormatInfo,
};
pub use journal::{JournalQueueAck, JournalTopicAck, JournalTrace, JournalTransaction};
pub use message::{
    into_message, ActiveMqMessage, BlobMessage, BytesMessage, MapMessage, Message, MessageBase,
    ObjectMessage, StreamMessage, TextMessage,
};
pub use primitive::{PrimitiveMap, PrimitiveValue};
pub use response::{
    BrokerError, DataArrayResponse, DataResponse, ExceptionResponse, IntegerResponse, Response,
    StackTraceElement,
};

/// Property names a [`WireFormatInfo`] advertises.
pub mod wire_format_properties {
    pub use super::info::{
        CACHE_ENABLED, CACHE_SIZE, MAX_FRAME_SIZE, MAX_INACTIVITY_DURATION,
        MAX_INACTIVITY_DURATION_INITIAL_DELAY, SIZE_PREFIX_DISABLED, STACK_TRACE_ENABLED,
        TCP_NO_DELAY_ENABLED, TIGHT_ENCODING_ENABLED,
    };
}
