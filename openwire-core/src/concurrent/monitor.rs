//! Monitor-style lock/wait/notify coordination.

use std::sync::{Condvar, Mutex, MutexGuard};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use crate::error::{OpenWireError, Result};

/// The contract for objects that can be locked, waited on and notified.
///
/// `wait`, `notify` and `notify_all` are only valid while the calling thread holds the lock.
/// Implementations report a violation as [`OpenWireError::SynchronizationFailure`].
pub trait Synchronizable {
    /// Locks the object, blocking until it is available.
    fn lock(&self) -> Result<()>;

    /// Unlocks the object.
    fn unlock(&self) -> Result<()>;

    /// Releases the lock and suspends until notified, then re-acquires the lock.
    fn wait(&self) -> Result<()>;

    /// Like [`wait`](Synchronizable::wait) but gives up after `millis` milliseconds.
    fn wait_for(&self, millis: u64) -> Result<()>;

    /// Wakes one waiting thread.
    fn notify(&self) -> Result<()>;

    /// Wakes every waiting thread.
    fn notify_all(&self) -> Result<()>;
}

#[derive(Debug, Default)]
struct MonitorState {
    owner: Option<ThreadId>,
    holds: usize,
    waiters: usize,
    wakeups: usize,
}

/// A reentrant mutex paired with a condition variable.
///
/// Types that need monitor semantics hold a `Monitor` as a field and delegate their
/// [`Synchronizable`] implementation to it. Ownership is tracked per thread, so calling
/// `unlock`, `wait` or `notify` without holding the lock fails instead of corrupting state.
#[derive(Debug, Default)]
pub struct Monitor {
    state: Mutex<MonitorState>,
    released: Condvar,
    signalled: Condvar,
}

impl Monitor {
    /// Creates an unlocked monitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the monitor and returns a guard that unlocks it when dropped.
    pub fn synchronized(&self) -> Result<MonitorGuard<'_>> {
        self.lock()?;
        Ok(MonitorGuard { monitor: self })
    }

    /// Returns `true` if the calling thread holds the lock.
    pub fn is_held_by_current_thread(&self) -> bool {
        self.state()
            .map(|state| state.owner == Some(thread::current().id()))
            .unwrap_or(false)
    }

    fn state(&self) -> Result<MutexGuard<'_, MonitorState>> {
        self.state.lock().map_err(|_| poisoned())
    }

    fn owned_state(&self, operation: &str) -> Result<MutexGuard<'_, MonitorState>> {
        let state = self.state()?;
        if state.owner == Some(thread::current().id()) {
            Ok(state)
        } else {
            Err(OpenWireError::SynchronizationFailure(format!(
                "{operation} called without holding the monitor"
            )))
        }
    }

    fn wait_until(&self, deadline: Option<Instant>) -> Result<()> {
        let me = thread::current().id();
        let mut state = self.owned_state("wait")?;

        let holds = state.holds;
        state.owner = None;
        state.holds = 0;
        state.waiters += 1;
        self.released.notify_one();

        loop {
            if state.wakeups > 0 {
                state.wakeups -= 1;
                break;
            }
            match deadline {
                None => {
                    state = self.signalled.wait(state).map_err(|_| poisoned())?;
                }
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    state = self
                        .signalled
                        .wait_timeout(state, deadline - now)
                        .map_err(|_| poisoned())?
                        .0;
                }
            }
        }

        state.waiters -= 1;
        state.wakeups = state.wakeups.min(state.waiters);

        while state.owner.is_some() {
            state = self.released.wait(state).map_err(|_| poisoned())?;
        }
        state.owner = Some(me);
        state.holds = holds;
        Ok(())
    }
}

impl Synchronizable for Monitor {
    fn lock(&self) -> Result<()> {
        let me = thread::current().id();
        let mut state = self.state()?;
        if state.owner == Some(me) {
            state.holds += 1;
            return Ok(());
        }
        while state.owner.is_some() {
            state = self.released.wait(state).map_err(|_| poisoned())?;
        }
        state.owner = Some(me);
        state.holds = 1;
        Ok(())
    }

    fn unlock(&self) -> Result<()> {
        let mut state = self.owned_state("unlock")?;
        state.holds -= 1;
        if state.holds == 0 {
            state.owner = None;
            self.released.notify_one();
        }
        Ok(())
    }

    fn wait(&self) -> Result<()> {
        self.wait_until(None)
    }

    fn wait_for(&self, millis: u64) -> Result<()> {
        self.wait_until(deadline_after(Duration::from_millis(millis)))
    }

    fn notify(&self) -> Result<()> {
        let mut state = self.owned_state("notify")?;
        if state.waiters > state.wakeups {
            state.wakeups += 1;
            self.signalled.notify_one();
        }
        Ok(())
    }

    fn notify_all(&self) -> Result<()> {
        let mut state = self.owned_state("notify_all")?;
        state.wakeups = state.waiters;
        self.signalled.notify_all();
        Ok(())
    }
}

/// A timeout too large to represent as an instant waits without a deadline.
fn deadline_after(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}

/// Holds a [`Monitor`] locked for the guard's lifetime.
#[derive(Debug)]
pub struct MonitorGuard<'a> {
    monitor: &'a Monitor,
}

impl MonitorGuard<'_> {
    /// Waits until notified. The lock is held again when this returns.
    pub fn wait(&self) -> Result<()> {
        self.monitor.wait()
    }

    /// Waits until notified or until `timeout` elapses.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<()> {
        self.monitor.wait_until(deadline_after(timeout))
    }

    /// Wakes one waiting thread.
    pub fn notify(&self) -> Result<()> {
        self.monitor.notify()
    }

    /// Wakes every waiting thread.
    pub fn notify_all(&self) -> Result<()> {
        self.monitor.notify_all()
    }
}

impl Drop for MonitorGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.monitor.unlock() {
            tracing::error!(error = %e, "failed to release monitor");
        }
    }
}

fn poisoned() -> OpenWireError {
    OpenWireError::SynchronizationFailure("monitor state poisoned".to_string())
}
