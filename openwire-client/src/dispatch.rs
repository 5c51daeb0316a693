//! Routing of inbound message dispatches to consumer listeners.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use openwire_core::commands::{ConsumerId, MessageDispatch};
use openwire_core::{Message, Pointer};

use crate::config::ClientConfig;
use crate::listener::{ListenerId, ListenerStats, MessageListener};

struct Registration {
    id: ListenerId,
    listener: Arc<dyn MessageListener>,
}

/// Delivers each `MessageDispatch` to the listener registered for its consumer.
///
/// At most one listener is registered per consumer. Dispatches for consumers without a listener
/// are counted as dropped and logged; they are not errors.
pub struct MessageDispatcher {
    registrations: RwLock<HashMap<ConsumerId, Registration>>,
    stats: ListenerStats,
    statistics_enabled: bool,
}

impl MessageDispatcher {
    /// Creates a dispatcher with statistics enabled.
    pub fn new() -> Self {
        Self::with_statistics(true)
    }

    /// Creates a dispatcher, optionally keeping delivery statistics.
    pub fn with_statistics(statistics_enabled: bool) -> Self {
        Self {
            registrations: RwLock::new(HashMap::new()),
            stats: ListenerStats::new(),
            statistics_enabled,
        }
    }

    /// Creates a dispatcher configured from `config`.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::with_statistics(config.dispatch_statistics())
    }

    /// Registers `listener` for `consumer_id`, replacing any previous registration.
    pub fn add_listener<L>(&self, consumer_id: ConsumerId, listener: L) -> ListenerId
    where
        L: MessageListener + 'static,
    {
        self.add_shared_listener(consumer_id, Arc::new(listener))
    }

    /// Registers a listener that is shared with other owners.
    pub fn add_shared_listener(
        &self,
        consumer_id: ConsumerId,
        listener: Arc<dyn MessageListener>,
    ) -> ListenerId {
        let id = ListenerId::new();
        let mut registrations = self
            .registrations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = registrations.insert(consumer_id.clone(), Registration { id, listener })
        {
            tracing::debug!(
                consumer = %consumer_id,
                replaced = %previous.id,
                "replaced message listener"
            );
        }
        tracing::debug!(consumer = %consumer_id, listener = %id, "registered message listener");
        id
    }

    /// Removes the registration with the given ID. Returns `false` if it is not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut registrations = self
            .registrations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = registrations.len();
        registrations.retain(|_, registration| registration.id != id);
        let removed = registrations.len() != before;
        if removed {
            tracing::debug!(listener = %id, "removed message listener");
        }
        removed
    }

    /// Removes whatever listener is registered for `consumer_id`.
    pub fn remove_consumer(&self, consumer_id: &ConsumerId) -> bool {
        self.registrations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(consumer_id)
            .is_some()
    }

    /// Returns `true` if a listener is registered for `consumer_id`.
    pub fn has_listener(&self, consumer_id: &ConsumerId) -> bool {
        self.registrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(consumer_id)
    }

    /// Returns the number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.registrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Delivers the dispatched message to its consumer's listener.
    ///
    /// Returns `true` if a listener received the message. The listener runs without the
    /// registration lock held, so it may add or remove listeners.
    pub fn dispatch(&self, dispatch: MessageDispatch) -> bool {
        let MessageDispatch {
            consumer_id,
            message,
            ..
        } = dispatch;

        let Some(consumer_id) = consumer_id else {
            tracing::warn!("dropping message dispatch without a consumer id");
            self.record_dropped();
            return false;
        };

        let Some(message) = message else {
            tracing::debug!(consumer = %consumer_id, "dropping message dispatch without a message");
            self.record_dropped();
            return false;
        };

        let listener = self
            .registrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&consumer_id)
            .map(|registration| Arc::clone(&registration.listener));

        match listener {
            Some(listener) => {
                let message: Pointer<dyn Message> = Pointer::from_box(message);
                listener.on_message(&message);
                if self.statistics_enabled {
                    self.stats.record_delivered();
                }
                true
            }
            None => {
                tracing::warn!(
                    consumer = %consumer_id,
                    dispatched = %message.as_ref(),
                    "no listener for dispatched message"
                );
                self.record_dropped();
                false
            }
        }
    }

    /// Returns the delivery statistics. Counters stay at zero when statistics are disabled.
    pub fn stats(&self) -> &ListenerStats {
        &self.stats
    }

    fn record_dropped(&self) {
        if self.statistics_enabled {
            self.stats.record_dropped();
        }
    }
}

impl Default for MessageDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MessageDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageDispatcher")
            .field("listeners", &self.listener_count())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openwire_core::commands::{ConnectionId, SessionId, TextMessage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn consumer(value: i64) -> ConsumerId {
        ConsumerId::new(&SessionId::new(&ConnectionId::new("ID:test-1"), 1), value)
    }

    fn text_dispatch(consumer_id: ConsumerId, text: &str) -> MessageDispatch {
        let mut message = TextMessage::default();
        message.set_text(text).unwrap();
        MessageDispatch {
            consumer_id: Some(consumer_id),
            message: Some(Box::new(message)),
            ..MessageDispatch::default()
        }
    }

    #[test]
    fn test_dispatch_routes_by_consumer() {
        let dispatcher = MessageDispatcher::new();
        let first = Arc::new(Mutex::new(Vec::new()));
        let second = Arc::new(AtomicUsize::new(0));

        let sink = Arc::clone(&first);
        dispatcher.add_listener(consumer(1), move |message: &Pointer<dyn Message>| {
            let text = message
                .try_deref()
                .unwrap()
                .as_any()
                .downcast_ref::<TextMessage>()
                .and_then(|m| m.text().unwrap());
            sink.lock().unwrap().push(text);
        });
        let count = Arc::clone(&second);
        dispatcher.add_listener(consumer(2), move |_: &Pointer<dyn Message>| {
            count.fetch_add(1, Ordering::SeqCst);
        });

        assert!(dispatcher.dispatch(text_dispatch(consumer(1), "a")));
        assert!(dispatcher.dispatch(text_dispatch(consumer(2), "b")));
        assert!(dispatcher.dispatch(text_dispatch(consumer(1), "c")));

        assert_eq!(
            *first.lock().unwrap(),
            vec![Some("a".to_string()), Some("c".to_string())]
        );
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.stats().messages_delivered(), 3);
        assert_eq!(dispatcher.stats().messages_dropped(), 0);
    }

    #[test]
    fn test_unknown_consumer_is_dropped() {
        let dispatcher = MessageDispatcher::new();
        assert!(!dispatcher.dispatch(text_dispatch(consumer(9), "lost")));
        assert!(!dispatcher.dispatch(MessageDispatch::default()));
        assert_eq!(dispatcher.stats().messages_dropped(), 2);
        assert_eq!(dispatcher.stats().messages_delivered(), 0);
    }

    #[test]
    fn test_dispatch_without_message_is_dropped() {
        let dispatcher = MessageDispatcher::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let count = Arc::clone(&calls);
        dispatcher.add_listener(consumer(1), move |_: &Pointer<dyn Message>| {
            count.fetch_add(1, Ordering::SeqCst);
        });
        let dispatch = MessageDispatch {
            consumer_id: Some(consumer(1)),
            ..MessageDispatch::default()
        };
        assert!(!dispatcher.dispatch(dispatch));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(dispatcher.stats().messages_dropped(), 1);
    }

    #[test]
    fn test_remove_listener() {
        let dispatcher = MessageDispatcher::new();
        let id = dispatcher.add_listener(consumer(1), |_: &Pointer<dyn Message>| {});
        assert!(dispatcher.has_listener(&consumer(1)));

        assert!(dispatcher.remove_listener(id));
        assert!(!dispatcher.remove_listener(id));
        assert!(!dispatcher.has_listener(&consumer(1)));
        assert!(!dispatcher.dispatch(text_dispatch(consumer(1), "x")));
    }

    #[test]
    fn test_replacing_listener_invalidates_old_id() {
        let dispatcher = MessageDispatcher::new();
        let old = dispatcher.add_listener(consumer(1), |_: &Pointer<dyn Message>| {});
        let new = dispatcher.add_listener(consumer(1), |_: &Pointer<dyn Message>| {});
        assert_eq!(dispatcher.listener_count(), 1);
        assert!(!dispatcher.remove_listener(old));
        assert!(dispatcher.remove_listener(new));
    }

    #[test]
    fn test_remove_consumer() {
        let dispatcher = MessageDispatcher::new();
        dispatcher.add_listener(consumer(3), |_: &Pointer<dyn Message>| {});
        assert!(dispatcher.remove_consumer(&consumer(3)));
        assert!(!dispatcher.remove_consumer(&consumer(3)));
    }

    #[test]
    fn test_statistics_disabled() {
        let config = ClientConfig::builder()
            .dispatch_statistics(false)
            .build()
            .unwrap();
        let dispatcher = MessageDispatcher::from_config(&config);
        dispatcher.add_listener(consumer(1), |_: &Pointer<dyn Message>| {});
        assert!(dispatcher.dispatch(text_dispatch(consumer(1), "x")));
        assert!(!dispatcher.dispatch(text_dispatch(consumer(2), "y")));
        assert_eq!(dispatcher.stats().messages_delivered(), 0);
        assert_eq!(dispatcher.stats().messages_dropped(), 0);
    }

    #[test]
    fn test_listener_may_unregister_itself() {
        let dispatcher = Arc::new(MessageDispatcher::new());
        let id_slot = Arc::new(Mutex::new(None));

        let weak = Arc::downgrade(&dispatcher);
        let slot = Arc::clone(&id_slot);
        let id = dispatcher.add_listener(consumer(1), move |_: &Pointer<dyn Message>| {
            if let (Some(dispatcher), Some(id)) = (weak.upgrade(), *slot.lock().unwrap()) {
                dispatcher.remove_listener(id);
            }
        });
        *id_slot.lock().unwrap() = Some(id);

        assert!(dispatcher.dispatch(text_dispatch(consumer(1), "once")));
        assert!(!dispatcher.dispatch(text_dispatch(consumer(1), "twice")));
    }
}
