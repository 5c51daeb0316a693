//! Thread coordination primitives.

mod monitor;

pub use monitor::{Monitor, MonitorGuard, Synchronizable};
