//! Listener contracts for inbound messages and commands.

use std::sync::atomic::{AtomicU64, Ordering};

use openwire_core::{DataStructure, Message, Pointer};
use uuid::Uuid;

/// Unique identifier for a listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    /// Creates a new unique listener ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a listener ID from a UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Receives messages delivered to a consumer.
///
/// The handle is valid for the duration of the call. A listener that keeps the message clones
/// the handle. Callbacks cannot fail; a listener handles its own errors.
pub trait MessageListener: Send + Sync {
    /// Called once per delivered message.
    fn on_message(&self, message: &Pointer<dyn Message>);
}

impl<F> MessageListener for F
where
    F: Fn(&Pointer<dyn Message>) + Send + Sync,
{
    fn on_message(&self, message: &Pointer<dyn Message>) {
        self(message)
    }
}

/// Receives inbound commands that are neither responses nor message dispatches.
pub trait CommandListener: Send + Sync {
    /// Called once per unrouted inbound command.
    fn on_command(&self, command: &Pointer<dyn DataStructure>);
}

impl<F> CommandListener for F
where
    F: Fn(&Pointer<dyn DataStructure>) + Send + Sync,
{
    fn on_command(&self, command: &Pointer<dyn DataStructure>) {
        self(command)
    }
}

/// Delivery counters kept by a dispatcher.
#[derive(Debug, Default)]
pub struct ListenerStats {
    messages_delivered: AtomicU64,
    messages_dropped: AtomicU64,
}

impl ListenerStats {
    /// Creates zeroed statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the delivered counter.
    pub fn record_delivered(&self) {
        self.messages_delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the dropped counter.
    pub fn record_dropped(&self) {
        self.messages_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of messages handed to a listener.
    pub fn messages_delivered(&self) -> u64 {
        self.messages_delivered.load(Ordering::Relaxed)
    }

    /// Returns the number of dispatches that found no listener.
    pub fn messages_dropped(&self) -> u64 {
        self.messages_dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openwire_core::commands::{KeepAliveInfo, TextMessage};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn test_listener_id_uniqueness() {
        let id1 = ListenerId::new();
        let id2 = ListenerId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_listener_id_display() {
        let id = ListenerId::new();
        assert!(id.to_string().starts_with("listener-"));
        assert_eq!(ListenerId::from_uuid(id.as_uuid()), id);
    }

    #[test]
    fn test_closure_message_listener() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let listener = move |message: &Pointer<dyn Message>| {
            assert!(!message.is_null());
            counter.fetch_add(1, Ordering::SeqCst);
        };

        let message: Pointer<dyn Message> = Pointer::from_box(Box::new(TextMessage::default()));
        listener.on_message(&message);
        listener.on_message(&message);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_listener_may_keep_a_clone() {
        let kept = std::sync::Mutex::new(Vec::new());
        let listener = |message: &Pointer<dyn Message>| {
            kept.lock().unwrap().push(message.clone());
        };

        let message: Pointer<dyn Message> = Pointer::from_box(Box::new(TextMessage::default()));
        listener.on_message(&message);
        assert_eq!(message.use_count(), 2);
        drop(message);
        assert_eq!(kept.lock().unwrap()[0].use_count(), 1);
    }

    #[test]
    fn test_closure_command_listener() {
        let seen = AtomicUsize::new(0);
        let listener = |command: &Pointer<dyn DataStructure>| {
            assert_eq!(command.try_deref().unwrap().type_code(), 10);
            seen.fetch_add(1, Ordering::SeqCst);
        };

        let command: Pointer<dyn DataStructure> =
            Pointer::from_box(Box::new(KeepAliveInfo::default()));
        listener.on_command(&command);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_stats() {
        let stats = ListenerStats::new();
        assert_eq!(stats.messages_delivered(), 0);
        assert_eq!(stats.messages_dropped(), 0);

        stats.record_delivered();
        stats.record_delivered();
        stats.record_dropped();

        assert_eq!(stats.messages_delivered(), 2);
        assert_eq!(stats.messages_dropped(), 1);
    }

    #[test]
    fn test_listener_id_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ListenerId>();
        assert_send_sync::<ListenerStats>();
    }
}
