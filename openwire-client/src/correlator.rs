//! Matching of inbound responses to outstanding requests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use openwire_core::{Command, DataStructure, Monitor, OpenWireError, Pointer, Result};

use crate::config::ClientConfig;

/// A pending response slot that a requester blocks on until the inbound side fills it.
#[derive(Debug)]
pub struct FutureResponse {
    command_id: i32,
    monitor: Monitor,
    response: Mutex<Option<Pointer<dyn DataStructure>>>,
}

impl FutureResponse {
    fn new(command_id: i32) -> Self {
        Self {
            command_id,
            monitor: Monitor::new(),
            response: Mutex::new(None),
        }
    }

    /// Returns the command id this slot answers.
    pub fn command_id(&self) -> i32 {
        self.command_id
    }

    /// Returns `true` once a response has arrived.
    pub fn is_done(&self) -> bool {
        self.slot().is_some()
    }

    /// Blocks until the response arrives.
    pub fn wait(&self) -> Result<Pointer<dyn DataStructure>> {
        let guard = self.monitor.synchronized()?;
        loop {
            if let Some(response) = self.slot().clone() {
                return Ok(response);
            }
            guard.wait()?;
        }
    }

    /// Blocks until the response arrives or `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns [`OpenWireError::Timeout`] if no response arrived in time.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<Pointer<dyn DataStructure>> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.wait();
        };
        let guard = self.monitor.synchronized()?;
        loop {
            if let Some(response) = self.slot().clone() {
                return Ok(response);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(OpenWireError::Timeout(format!(
                    "no response to command {} within {:?}",
                    self.command_id, timeout
                )));
            }
            guard.wait_timeout(deadline - now)?;
        }
    }

    fn complete(&self, response: Pointer<dyn DataStructure>) -> Result<()> {
        let guard = self.monitor.synchronized()?;
        *self.slot() = Some(response);
        guard.notify_all()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Pointer<dyn DataStructure>>> {
        self.response.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Hands out command ids and pending-response slots keyed by them.
#[derive(Debug)]
pub struct ResponseCorrelator {
    next_command_id: AtomicI32,
    pending: Mutex<HashMap<i32, Arc<FutureResponse>>>,
    response_timeout: Duration,
}

impl ResponseCorrelator {
    /// Creates a correlator whose requests wait at most `response_timeout`.
    pub fn new(response_timeout: Duration) -> Self {
        Self {
            next_command_id: AtomicI32::new(1),
            pending: Mutex::new(HashMap::new()),
            response_timeout,
        }
    }

    /// Creates a correlator configured from `config`.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.response_timeout())
    }

    /// Returns the timeout applied by [`await_response`](Self::await_response).
    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    /// Returns a fresh command id. Ids start at 1 and skip 0 when they wrap.
    pub fn next_command_id(&self) -> i32 {
        loop {
            let id = self.next_command_id.fetch_add(1, Ordering::Relaxed);
            if id != 0 {
                return id;
            }
        }
    }

    /// Assigns `command` a fresh id, marks it as expecting a response and registers its slot.
    pub fn prepare(&self, command: &mut dyn Command) -> Arc<FutureResponse> {
        let command_id = self.next_command_id();
        command.set_command_id(command_id);
        command.set_response_required(true);
        self.register(command_id)
    }

    /// Registers a slot for `command_id`, replacing any slot already waiting on it.
    pub fn register(&self, command_id: i32) -> Arc<FutureResponse> {
        let future = Arc::new(FutureResponse::new(command_id));
        if self
            .pending()
            .insert(command_id, Arc::clone(&future))
            .is_some()
        {
            tracing::warn!(command_id, "replaced a pending response slot");
        }
        future
    }

    /// Completes the slot whose command id matches the response's correlation id.
    ///
    /// Returns `false` if `response` is not a response or nobody is waiting for it; such
    /// responses are logged and dropped.
    pub fn complete(&self, response: Pointer<dyn DataStructure>) -> Result<bool> {
        let correlation_id = response
            .get()
            .and_then(|command| command.as_command())
            .and_then(|command| command.correlation_id());

        let Some(correlation_id) = correlation_id else {
            tracing::warn!("ignoring a completion that carries no correlation id");
            return Ok(false);
        };

        let future = self.pending().remove(&correlation_id);
        match future {
            Some(future) => {
                future.complete(response)?;
                tracing::trace!(correlation_id, "completed pending response");
                Ok(true)
            }
            None => {
                tracing::warn!(correlation_id, "response for unknown command id");
                Ok(false)
            }
        }
    }

    /// Waits for the slot's response using the configured timeout.
    ///
    /// A timed-out slot is released, so a late response is logged and dropped.
    pub fn await_response(&self, future: &FutureResponse) -> Result<Pointer<dyn DataStructure>> {
        match future.wait_timeout(self.response_timeout) {
            Err(OpenWireError::Timeout(message)) => {
                self.cancel(future.command_id());
                Err(OpenWireError::Timeout(message))
            }
            other => other,
        }
    }

    /// Releases the slot for `command_id` without completing it.
    pub fn cancel(&self, command_id: i32) -> bool {
        self.pending().remove(&command_id).is_some()
    }

    /// Returns the number of requests still waiting.
    pub fn pending_count(&self) -> usize {
        self.pending().len()
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, HashMap<i32, Arc<FutureResponse>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ResponseCorrelator {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openwire_core::commands::{IntegerResponse, KeepAliveInfo, Response, SessionInfo};
    use std::thread;

    fn response(correlation_id: i32) -> Pointer<dyn DataStructure> {
        Pointer::from_box(Box::new(Response::new(correlation_id)))
    }

    #[test]
    fn test_command_ids_are_sequential() {
        let correlator = ResponseCorrelator::new(Duration::from_secs(1));
        assert_eq!(correlator.next_command_id(), 1);
        assert_eq!(correlator.next_command_id(), 2);
    }

    #[test]
    fn test_prepare_marks_command() {
        let correlator = ResponseCorrelator::new(Duration::from_secs(1));
        let mut command = SessionInfo::default();
        let future = correlator.prepare(&mut command);
        assert_eq!(command.command_id(), future.command_id());
        assert!(command.is_response_required());
        assert_eq!(correlator.pending_count(), 1);
    }

    #[test]
    fn test_complete_before_wait() {
        let correlator = ResponseCorrelator::new(Duration::from_secs(1));
        let future = correlator.register(7);
        assert!(correlator.complete(response(7)).unwrap());
        assert!(future.is_done());

        let received = correlator.await_response(&future).unwrap();
        assert_eq!(received.try_deref().unwrap().type_code(), 30);
        assert_eq!(correlator.pending_count(), 0);
    }

    #[test]
    fn test_complete_wakes_waiting_thread() {
        let correlator = Arc::new(ResponseCorrelator::new(Duration::from_secs(10)));
        let future = correlator.register(3);

        let waiter = {
            let correlator = Arc::clone(&correlator);
            let future = Arc::clone(&future);
            thread::spawn(move || correlator.await_response(&future))
        };

        thread::sleep(Duration::from_millis(50));
        let reply = IntegerResponse {
            correlation_id: 3,
            result: 42,
            ..IntegerResponse::default()
        };
        assert!(correlator.complete(Pointer::from_box(Box::new(reply))).unwrap());

        let received = waiter.join().unwrap().unwrap();
        let reply = received
            .try_deref()
            .unwrap()
            .downcast_ref::<IntegerResponse>()
            .unwrap();
        assert_eq!(reply.result, 42);
    }

    #[test]
    fn test_unbounded_timeout_waits_for_completion() {
        let correlator = Arc::new(ResponseCorrelator::new(Duration::MAX));
        let future = correlator.register(5);

        let waiter = {
            let correlator = Arc::clone(&correlator);
            let future = Arc::clone(&future);
            thread::spawn(move || correlator.await_response(&future))
        };

        thread::sleep(Duration::from_millis(20));
        assert!(correlator.complete(response(5)).unwrap());
        assert_eq!(waiter.join().unwrap().unwrap().try_deref().unwrap().type_code(), 30);

        let early = correlator.register(6);
        correlator.complete(response(6)).unwrap();
        assert!(early.wait_timeout(Duration::MAX).is_ok());
    }

    #[test]
    fn test_unknown_correlation_id_is_ignored() {
        let correlator = ResponseCorrelator::new(Duration::from_secs(1));
        let future = correlator.register(1);
        assert!(!correlator.complete(response(99)).unwrap());
        assert!(!future.is_done());
        assert_eq!(correlator.pending_count(), 1);
    }

    #[test]
    fn test_non_response_is_ignored() {
        let correlator = ResponseCorrelator::new(Duration::from_secs(1));
        correlator.register(0);
        let command: Pointer<dyn DataStructure> =
            Pointer::from_box(Box::new(KeepAliveInfo::default()));
        assert!(!correlator.complete(command).unwrap());
        assert!(!correlator.complete(Pointer::null()).unwrap());
    }

    #[test]
    fn test_timeout_releases_slot() {
        let correlator = ResponseCorrelator::new(Duration::from_millis(50));
        let future = correlator.register(5);

        let start = Instant::now();
        let result = correlator.await_response(&future);
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert!(matches!(result, Err(OpenWireError::Timeout(_))));
        assert_eq!(correlator.pending_count(), 0);

        assert!(!correlator.complete(response(5)).unwrap());
    }

    #[test]
    fn test_cancel() {
        let correlator = ResponseCorrelator::new(Duration::from_secs(1));
        correlator.register(11);
        assert!(correlator.cancel(11));
        assert!(!correlator.cancel(11));
    }

    #[test]
    fn test_default_uses_configured_timeout() {
        let correlator = ResponseCorrelator::default();
        assert_eq!(correlator.response_timeout(), Duration::from_secs(30));
    }
}
