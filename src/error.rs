//! Failure taxonomy and normalization.
//!
//! Every failure a caller can observe through a deferred handle is a
//! [`Fault`]:
//!
//! - construction failures: whatever the factory failed with, cached and
//!   replayed to every caller
//! - forwarding failures: whatever the real target's method failed with
//! - [`Fault::Panicked`]: the factory panicked instead of settling
//! - [`Fault::TypeMismatch`]: the target produced a value that is not the
//!   declared result type
//! - [`Fault::ShapeMismatch`]: the target answered with a different return
//!   shape than the call declared
//!
//! Asynchronous plumbing tends to wrap one real failure in an aggregate.
//! [`Fault::normalize`] collapses single-item aggregates back to the one
//! underlying cause; aggregates of several causes are left alone.

use crate::intercept::{MethodId, ShapeKind};
use crate::types::TypeTag;
use std::sync::Arc;

/// Shared, type-erased underlying error.
pub type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// A failure observed through a deferred handle.
///
/// `Fault` is cheap to clone: a cached construction failure is handed out to
/// every caller, and all of them see the same underlying [`Cause`].
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum Fault {
    /// An underlying error raised by the factory or the real target.
    #[error(transparent)]
    Cause(Cause),
    /// Several failures reported together.
    #[error("{} failures occurred", .0.len())]
    Aggregate(Vec<Fault>),
    /// A plain failure message.
    #[error("{0}")]
    Message(String),
    /// A produced value was not of the declared type.
    #[error("type mismatch: expected `{expected}`, found `{found}`")]
    TypeMismatch {
        /// The type the caller declared.
        expected: TypeTag,
        /// The type the target actually produced.
        found: TypeTag,
    },
    /// The target answered with a different return shape than declared.
    #[error("method `{method}` declared a {declared} result, but the target produced a {actual} result")]
    ShapeMismatch {
        /// The intercepted method.
        method: MethodId,
        /// The shape the call declared.
        declared: ShapeKind,
        /// The shape the target produced.
        actual: ShapeKind,
    },
    /// The target does not implement the requested method.
    #[error("unknown method `{method}`")]
    UnknownMethod {
        /// The requested method.
        method: MethodId,
    },
    /// The target asked for more arguments than the call carried.
    #[error("missing argument at position {index}")]
    MissingArgument {
        /// Zero-based position of the missing argument.
        index: usize,
    },
    /// The call carried arguments the target did not consume.
    #[error("{remaining} unexpected trailing argument(s)")]
    UnexpectedArguments {
        /// Number of arguments left over.
        remaining: usize,
    },
    /// The factory panicked while building the target.
    #[error("deferred construction panicked: {message}")]
    Panicked {
        /// The panic payload, if it was a string.
        message: String,
    },
}

/// Discriminant of a [`Fault`], for matching without borrowing payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// See [`Fault::Cause`].
    Cause,
    /// See [`Fault::Aggregate`].
    Aggregate,
    /// See [`Fault::Message`].
    Message,
    /// See [`Fault::TypeMismatch`].
    TypeMismatch,
    /// See [`Fault::ShapeMismatch`].
    ShapeMismatch,
    /// See [`Fault::UnknownMethod`].
    UnknownMethod,
    /// See [`Fault::MissingArgument`].
    MissingArgument,
    /// See [`Fault::UnexpectedArguments`].
    UnexpectedArguments,
    /// See [`Fault::Panicked`].
    Panicked,
}

impl Fault {
    /// Wraps an underlying error.
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Cause(Arc::new(error))
    }

    /// Wraps an already shared underlying error.
    #[must_use]
    pub fn from_cause(cause: Cause) -> Self {
        Self::Cause(cause)
    }

    /// Creates a failure from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Groups several failures together.
    pub fn aggregate(faults: impl IntoIterator<Item = Self>) -> Self {
        Self::Aggregate(faults.into_iter().collect())
    }

    /// Creates a type mismatch failure.
    #[must_use]
    pub const fn type_mismatch(expected: TypeTag, found: TypeTag) -> Self {
        Self::TypeMismatch { expected, found }
    }

    /// Creates a shape mismatch failure.
    #[must_use]
    pub const fn shape_mismatch(method: MethodId, declared: ShapeKind, actual: ShapeKind) -> Self {
        Self::ShapeMismatch {
            method,
            declared,
            actual,
        }
    }

    /// Creates an unknown method failure.
    #[must_use]
    pub const fn unknown_method(method: MethodId) -> Self {
        Self::UnknownMethod { method }
    }

    /// Creates a failure from a caught panic payload.
    #[must_use]
    pub fn panicked(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|text| (*text).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "opaque panic payload".to_owned());
        Self::Panicked { message }
    }

    /// Returns the discriminant of this failure.
    #[must_use]
    pub const fn kind(&self) -> FaultKind {
        match self {
            Self::Cause(_) => FaultKind::Cause,
            Self::Aggregate(_) => FaultKind::Aggregate,
            Self::Message(_) => FaultKind::Message,
            Self::TypeMismatch { .. } => FaultKind::TypeMismatch,
            Self::ShapeMismatch { .. } => FaultKind::ShapeMismatch,
            Self::UnknownMethod { .. } => FaultKind::UnknownMethod,
            Self::MissingArgument { .. } => FaultKind::MissingArgument,
            Self::UnexpectedArguments { .. } => FaultKind::UnexpectedArguments,
            Self::Panicked { .. } => FaultKind::Panicked,
        }
    }

    /// Returns the grouped failures of an aggregate, or an empty slice.
    #[must_use]
    pub fn inner_faults(&self) -> &[Self] {
        match self {
            Self::Aggregate(faults) => faults,
            _ => &[],
        }
    }

    /// Returns the underlying error as `E`, if this is a [`Fault::Cause`] of
    /// that type.
    #[must_use]
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            Self::Cause(cause) => cause.as_ref().downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Returns `true` if both failures denote the same occurrence.
    ///
    /// Underlying causes compare by identity, not by value: two separately
    /// raised errors with equal messages are different occurrences.
    #[must_use]
    pub fn is_same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Cause(a), Self::Cause(b)) => Arc::ptr_eq(a, b),
            (Self::Aggregate(a), Self::Aggregate(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.is_same(y))
            }
            (a, b) => a.kind() == b.kind() && a.to_string() == b.to_string(),
        }
    }

    /// Collapses single-item aggregates down to their one inner failure.
    ///
    /// Unwrapping repeats while the result is still a single-item aggregate.
    /// Aggregates of zero or several failures, and every other failure, are
    /// returned unchanged.
    #[must_use]
    pub fn normalize(self) -> Self {
        match self {
            Self::Aggregate(mut faults) if faults.len() == 1 => match faults.pop() {
                Some(only) => only.normalize(),
                None => Self::Aggregate(faults),
            },
            other => other,
        }
    }
}

/// Collapses single-item aggregates. See [`Fault::normalize`].
#[must_use]
pub fn normalize(fault: Fault) -> Fault {
    fault.normalize()
}

impl From<String> for Fault {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<&str> for Fault {
    fn from(message: &str) -> Self {
        Self::Message(message.to_owned())
    }
}

impl From<std::io::Error> for Fault {
    fn from(error: std::io::Error) -> Self {
        Self::new(error)
    }
}

impl From<Vec<Self>> for Fault {
    fn from(faults: Vec<Self>) -> Self {
        Self::Aggregate(faults)
    }
}
