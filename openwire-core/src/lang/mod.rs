//! Shared ownership.

mod pointer;

pub use pointer::{
    AtomicCounter, ByAddress, CounterPolicy, InvasiveCounter, InvasiveReference, Pointer,
    ReferenceCount, SelfCounting,
};
