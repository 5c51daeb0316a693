//! Type code to constructor lookup used when decoding.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::commands::{self, ActiveMqDestination, DataStructure, Variant};
use crate::protocol::constants::{
    ACTIVEMQ_QUEUE, ACTIVEMQ_TEMP_QUEUE, ACTIVEMQ_TEMP_TOPIC, ACTIVEMQ_TOPIC,
};

/// Creates an empty instance of one catalog variant.
pub type Constructor = fn() -> Box<dyn DataStructure>;

/// Registry mapping type codes to zero-argument constructors.
///
/// The process-wide default registry from [`CommandRegistry::global`] is built on first use and
/// never changes afterwards. Custom registries are assembled with [`register`] and
/// [`unregister`] before being shared with a decoder.
///
/// [`register`]: CommandRegistry::register
/// [`unregister`]: CommandRegistry::unregister
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    constructors: HashMap<u8, Constructor>,
}

fn construct<T: Variant + Default>() -> Box<dyn DataStructure> {
    Box::new(T::default())
}

fn empty_queue() -> Box<dyn DataStructure> {
    Box::new(ActiveMqDestination::queue(""))
}

fn empty_topic() -> Box<dyn DataStructure> {
    Box::new(ActiveMqDestination::topic(""))
}

fn empty_temp_queue() -> Box<dyn DataStructure> {
    Box::new(ActiveMqDestination::temp_queue(""))
}

fn empty_temp_topic() -> Box<dyn DataStructure> {
    Box::new(ActiveMqDestination::temp_topic(""))
}

impl CommandRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Creates a registry holding every variant of the command catalog.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register_variant::<commands::WireFormatInfo>();
        registry.register_variant::<commands::BrokerInfo>();
        registry.register_variant::<commands::ConnectionInfo>();
        registry.register_variant::<commands::SessionInfo>();
        registry.register_variant::<commands::ConsumerInfo>();
        registry.register_variant::<commands::ProducerInfo>();
        registry.register_variant::<commands::TransactionInfo>();
        registry.register_variant::<commands::DestinationInfo>();
        registry.register_variant::<commands::RemoveSubscriptionInfo>();
        registry.register_variant::<commands::KeepAliveInfo>();
        registry.register_variant::<commands::ShutdownInfo>();
        registry.register_variant::<commands::RemoveInfo>();
        registry.register_variant::<commands::ControlCommand>();
        registry.register_variant::<commands::FlushCommand>();
        registry.register_variant::<commands::ConnectionError>();
        registry.register_variant::<commands::ConsumerControl>();
        registry.register_variant::<commands::ConnectionControl>();
        registry.register_variant::<commands::ProducerAck>();
        registry.register_variant::<commands::MessagePull>();
        registry.register_variant::<commands::MessageDispatch>();
        registry.register_variant::<commands::MessageAck>();

        registry.register_variant::<commands::ActiveMqMessage>();
        registry.register_variant::<commands::BytesMessage>();
        registry.register_variant::<commands::MapMessage>();
        registry.register_variant::<commands::ObjectMessage>();
        registry.register_variant::<commands::StreamMessage>();
        registry.register_variant::<commands::TextMessage>();
        registry.register_variant::<commands::BlobMessage>();

        registry.register_variant::<commands::Response>();
        registry.register_variant::<commands::ExceptionResponse>();
        registry.register_variant::<commands::DataResponse>();
        registry.register_variant::<commands::DataArrayResponse>();
        registry.register_variant::<commands::IntegerResponse>();

        registry.register_variant::<commands::DiscoveryEvent>();
        registry.register_variant::<commands::JournalTopicAck>();
        registry.register_variant::<commands::JournalQueueAck>();
        registry.register_variant::<commands::JournalTrace>();
        registry.register_variant::<commands::JournalTransaction>();
        registry.register_variant::<commands::SubscriptionInfo>();
        registry.register_variant::<commands::PartialCommand>();
        registry.register_variant::<commands::LastPartialCommand>();
        registry.register_variant::<commands::ReplayCommand>();
        registry.register_variant::<commands::MessageDispatchNotification>();
        registry.register_variant::<commands::NetworkBridgeFilter>();

        registry.register(ACTIVEMQ_QUEUE, empty_queue);
        registry.register(ACTIVEMQ_TOPIC, empty_topic);
        registry.register(ACTIVEMQ_TEMP_QUEUE, empty_temp_queue);
        registry.register(ACTIVEMQ_TEMP_TOPIC, empty_temp_topic);

        registry.register_variant::<commands::MessageId>();
        registry.register_variant::<commands::LocalTransactionId>();
        registry.register_variant::<commands::XaTransactionId>();
        registry.register_variant::<commands::ConnectionId>();
        registry.register_variant::<commands::SessionId>();
        registry.register_variant::<commands::ConsumerId>();
        registry.register_variant::<commands::ProducerId>();
        registry.register_variant::<commands::BrokerId>();

        registry
    }

    /// Returns the process-wide registry of catalog variants.
    pub fn global() -> &'static CommandRegistry {
        static GLOBAL: OnceLock<CommandRegistry> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            let registry = Self::with_defaults();
            tracing::debug!(variants = registry.len(), "built default command registry");
            registry
        })
    }

    /// Registers a constructor for a type code.
    ///
    /// Returns the constructor previously registered for the code, which is replaced.
    pub fn register(&mut self, type_code: u8, constructor: Constructor) -> Option<Constructor> {
        self.constructors.insert(type_code, constructor)
    }

    /// Registers a variant under the type code its default instance reports.
    pub fn register_variant<T: Variant + Default>(&mut self) -> Option<Constructor> {
        let type_code = T::default().data_structure_type();
        self.register(type_code, construct::<T>)
    }

    /// Removes the constructor for a type code.
    pub fn unregister(&mut self, type_code: u8) -> Option<Constructor> {
        self.constructors.remove(&type_code)
    }

    /// Creates an empty instance of the variant registered for `type_code`.
    pub fn create(&self, type_code: u8) -> Option<Box<dyn DataStructure>> {
        self.constructors.get(&type_code).map(|constructor| constructor())
    }

    /// Returns `true` if a constructor is registered for the type code.
    pub fn contains(&self, type_code: u8) -> bool {
        self.constructors.contains_key(&type_code)
    }

    /// Returns the registered type codes in ascending order.
    pub fn type_codes(&self) -> Vec<u8> {
        let mut codes: Vec<u8> = self.constructors.keys().copied().collect();
        codes.sort_unstable();
        codes
    }

    /// Returns the number of registered constructors.
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Returns `true` if no constructors are registered.
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{KeepAliveInfo, ShutdownInfo};

    fn keep_alive() -> Box<dyn DataStructure> {
        Box::new(KeepAliveInfo::default())
    }

    #[test]
    fn test_registry_new_is_empty() {
        let registry = CommandRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.create(10).is_none());
    }

    #[test]
    fn test_every_constructor_reports_its_code() {
        let registry = CommandRegistry::with_defaults();
        for code in registry.type_codes() {
            let value = registry.create(code).unwrap();
            assert_eq!(value.type_code(), code);
        }
    }

    #[test]
    fn test_default_registry_covers_reserved_codes() {
        let registry = CommandRegistry::global();
        assert!(registry.contains(52));
        assert!(registry.contains(102));
        assert_eq!(registry.len(), 56);
        assert!(!registry.contains(13));
    }

    #[test]
    fn test_register_replaces_previous() {
        let mut registry = CommandRegistry::new();
        assert!(registry.register_variant::<ShutdownInfo>().is_none());
        assert!(registry.register(11, keep_alive).is_some());
        assert_eq!(registry.create(11).unwrap().type_code(), 10);
    }

    #[test]
    fn test_unregister() {
        let mut registry = CommandRegistry::with_defaults();
        assert!(registry.unregister(11).is_some());
        assert!(registry.unregister(11).is_none());
        assert!(!registry.contains(11));
        assert!(CommandRegistry::global().contains(11));
    }
}
