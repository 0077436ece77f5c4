//! Three-valued outcome of an asynchronous operation.
//!
//! Every call on a deferred handle settles into exactly one of:
//!
//! - [`Outcome::Ok`]: the operation produced a value
//! - [`Outcome::Err`]: the operation failed with a [`Fault`]
//! - [`Outcome::Cancelled`]: the operation was cancelled, with a [`CancelReason`]
//!
//! Cancellation is kept apart from failure so that a bridged call can settle
//! "identically to the source" without folding a cancellation into an error.

use crate::error::Fault;
use crate::types::CancelReason;
use core::fmt;

/// The settled result of a construction attempt or a forwarded call.
#[derive(Debug, Clone)]
#[must_use = "an outcome may carry a failure that should be observed"]
pub enum Outcome<T> {
    /// The operation succeeded.
    Ok(T),
    /// The operation failed.
    Err(Fault),
    /// The operation was cancelled.
    Cancelled(CancelReason),
}

impl<T> Outcome<T> {
    /// Creates a successful outcome.
    pub const fn ok(value: T) -> Self {
        Self::Ok(value)
    }

    /// Creates a failed outcome.
    pub fn err(fault: impl Into<Fault>) -> Self {
        Self::Err(fault.into())
    }

    /// Creates a cancelled outcome.
    pub const fn cancelled(reason: CancelReason) -> Self {
        Self::Cancelled(reason)
    }

    /// Returns `true` if the outcome is a success.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Returns `true` if the outcome is a failure.
    #[must_use]
    pub const fn is_err(&self) -> bool {
        matches!(self, Self::Err(_))
    }

    /// Returns `true` if the outcome is a cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Returns the success value by reference.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Ok(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the failure by reference.
    #[must_use]
    pub const fn fault(&self) -> Option<&Fault> {
        match self {
            Self::Err(fault) => Some(fault),
            _ => None,
        }
    }

    /// Returns the cancellation reason by reference.
    #[must_use]
    pub const fn cancel_reason(&self) -> Option<&CancelReason> {
        match self {
            Self::Cancelled(reason) => Some(reason),
            _ => None,
        }
    }

    /// Maps the success value, leaving failure and cancellation untouched.
    pub fn map<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Ok(value) => Outcome::Ok(f(value)),
            Self::Err(fault) => Outcome::Err(fault),
            Self::Cancelled(reason) => Outcome::Cancelled(reason),
        }
    }

    /// Maps the failure, leaving success and cancellation untouched.
    pub fn map_fault<F>(self, f: F) -> Self
    where
        F: FnOnce(Fault) -> Fault,
    {
        match self {
            Self::Err(fault) => Self::Err(f(fault)),
            other => other,
        }
    }

    /// Chains an outcome-producing continuation onto a success.
    pub fn and_then<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> Outcome<U>,
    {
        match self {
            Self::Ok(value) => f(value),
            Self::Err(fault) => Outcome::Err(fault),
            Self::Cancelled(reason) => Outcome::Cancelled(reason),
        }
    }

    /// Splits the success value from a non-success, retyping the latter.
    ///
    /// This is the early-return helper for async blocks:
    ///
    /// ```
    /// use defcon::Outcome;
    ///
    /// fn double(input: Outcome<i32>) -> Outcome<i64> {
    ///     let value = match input.split() {
    ///         Ok(value) => value,
    ///         Err(settled) => return settled,
    ///     };
    ///     Outcome::Ok(i64::from(value) * 2)
    /// }
    ///
    /// assert_eq!(double(Outcome::Ok(21)).unwrap(), 42);
    /// ```
    pub fn split<U>(self) -> Result<T, Outcome<U>> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::Err(fault) => Err(Outcome::Err(fault)),
            Self::Cancelled(reason) => Err(Outcome::Cancelled(reason)),
        }
    }

    /// Converts into a `Result`, folding failure and cancellation into
    /// [`OutcomeError`].
    pub fn into_result(self) -> Result<T, OutcomeError> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::Err(fault) => Err(OutcomeError::Failed(fault)),
            Self::Cancelled(reason) => Err(OutcomeError::Cancelled(reason)),
        }
    }

    /// Returns the success value, panicking otherwise.
    #[track_caller]
    pub fn unwrap(self) -> T {
        match self {
            Self::Ok(value) => value,
            Self::Err(fault) => panic!("called `Outcome::unwrap()` on an `Err` value: {fault}"),
            Self::Cancelled(reason) => {
                panic!("called `Outcome::unwrap()` on a `Cancelled` value: {reason}")
            }
        }
    }

    /// Returns the failure, panicking otherwise.
    #[track_caller]
    pub fn unwrap_err(self) -> Fault {
        match self {
            Self::Err(fault) => fault,
            Self::Ok(_) => panic!("called `Outcome::unwrap_err()` on an `Ok` value"),
            Self::Cancelled(reason) => {
                panic!("called `Outcome::unwrap_err()` on a `Cancelled` value: {reason}")
            }
        }
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T>
where
    E: Into<Fault>,
{
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(error) => Self::Err(error.into()),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok(value) => write!(f, "ok: {value}"),
            Self::Err(fault) => write!(f, "failed: {fault}"),
            Self::Cancelled(reason) => write!(f, "cancelled: {reason}"),
        }
    }
}

/// Non-success arm of an [`Outcome`], as a standard error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OutcomeError {
    /// The operation failed.
    #[error(transparent)]
    Failed(Fault),
    /// The operation was cancelled.
    #[error("operation cancelled: {0}")]
    Cancelled(CancelReason),
}
