//! Core types shared by every layer of the deferred handle.
//!
//! - [`outcome`]: Three-valued outcome of a construction attempt or call
//! - [`cancel`]: Cancellation reason and kind types
//! - [`value`]: Type tags, erased values, and argument lists

pub mod cancel;
pub mod outcome;
pub mod value;

pub use cancel::{CancelKind, CancelReason};
pub use outcome::{Outcome, OutcomeError};
pub use value::{Arguments, ErasedValue, TypeTag};
