//! Synchronization primitives for deferred construction.
//!
//! - [`LazyAsync`]: a value built asynchronously, at most once, on first use

pub mod lazy_async;

pub use lazy_async::{Construction, ConstructionState, LazyAsync};
