//! Defcon: deferred construction handles for asynchronously built objects.
//!
//! # Overview
//!
//! Some objects can only be built asynchronously: a repository that must open
//! a connection pool, a client that needs to discover its endpoint. Defcon
//! lets callers obtain a handle to such an object *immediately* and use it as
//! if it were already built. The real object is constructed on the first
//! call, at most once, and every call is forwarded to it once it exists.
//!
//! # Core Guarantees
//!
//! - **Lazy**: creating a handle never invokes the factory
//! - **At most once**: concurrent first calls share one construction attempt
//! - **Cached failure**: a failed construction is replayed, never retried
//! - **Shape preserving**: async calls stay async, sync calls return a value
//! - **Typed results**: a value of the wrong type is a failure, not garbage
//!
//! # Module Structure
//!
//! - [`types`]: Outcomes, cancellation reasons, erased values and arguments
//! - [`error`](mod@error): The [`Fault`] taxonomy and normalization
//! - [`bridge`](mod@bridge): Retyping erased asynchronous results
//! - [`sync`]: [`LazyAsync`], the memoized construction attempt
//! - [`intercept`]: Call descriptors and the [`CallInterceptor`]
//! - [`proxy`]: [`ProxyHandle`] and [`create_handle`]
//! - [`config`]: [`HandleConfig`]
//! - [`util`]: Cooperative yield futures
//! - [`tracing_compat`]: Optional tracing integration (requires `tracing-integration` feature)
//!
//! # Blocking
//!
//! Synchronous methods on a handle block the calling thread until the target
//! is built. See [`intercept::interceptor`] for the deadlock hazard this
//! carries.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]

pub mod bridge;
pub mod config;
pub mod error;
pub mod intercept;
pub mod proxy;
pub mod sync;
pub mod tracing_compat;
pub mod types;
pub mod util;

// ── Test-only modules ───────────────────────────────────────────────────
#[cfg(any(test, feature = "test-internals"))]
pub mod test_utils;

// Re-exports for convenient access to core types
pub use bridge::{Bridged, BridgedOutcome, Pending, bridge};
pub use config::{ConfigError, HandleConfig};
pub use error::{Cause, Fault, FaultKind, normalize};
pub use intercept::{
    CallDescriptor, CallInterceptor, Dispatch, Forwarded, MethodId, Reply, ReturnShape, ShapeKind,
};
pub use proxy::{ProxyHandle, create_handle, create_handle_with_config};
pub use sync::{Construction, ConstructionState, LazyAsync};
pub use types::{Arguments, CancelKind, CancelReason, ErasedValue, Outcome, OutcomeError, TypeTag};
