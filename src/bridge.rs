//! Retyping an erased asynchronous result.
//!
//! The interceptor is written once for every call site, so the value a
//! forwarded call produces reaches it as an [`ErasedValue`]. [`bridge`] turns
//! that erased future back into a future of the exact type the caller
//! declared:
//!
//! - success: the value is cast to `T`; a failed cast is a
//!   [`Fault::TypeMismatch`], never swallowed
//! - failure: the cause is [normalized](Fault::normalize) and passed on
//! - cancellation: passed on unchanged
//!
//! A bridge wraps exactly one source and polls it until it settles; it never
//! re-subscribes or retries.

use crate::error::Fault;
use crate::tracing_compat::error;
use crate::types::{ErasedValue, Outcome, TypeTag};
use futures::future::BoxFuture;
use pin_project::pin_project;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

/// A boxed, erased-or-typed asynchronous outcome.
pub type Pending<T> = BoxFuture<'static, Outcome<T>>;

/// Bridged outcome over the interceptor's boxed erased source.
pub type BridgedOutcome<T> = Bridged<T, Pending<ErasedValue>>;

/// Links a typed outcome to one erased source.
pub fn bridge<T, S>(source: S) -> Bridged<T, S>
where
    T: Any,
    S: Future<Output = Outcome<ErasedValue>>,
{
    Bridged {
        source,
        settled: false,
        _marker: PhantomData,
    }
}

/// Future returned by [`bridge`].
#[pin_project]
#[must_use = "futures do nothing unless polled"]
pub struct Bridged<T, S> {
    #[pin]
    source: S,
    settled: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Bridged<T, Pending<ErasedValue>>
where
    T: Any,
{
    /// A bridge whose source has already failed.
    pub fn failed(fault: Fault) -> Self {
        let source: Pending<ErasedValue> = Box::pin(futures::future::ready(Outcome::Err(fault)));
        bridge(source)
    }
}

impl<T, S> Bridged<T, S> {
    /// Returns the declared result type.
    #[must_use]
    pub fn declared_type() -> TypeTag
    where
        T: Any,
    {
        TypeTag::of::<T>()
    }

    /// Returns `true` once the bridge has produced its outcome.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        self.settled
    }
}

impl<T, S> Future for Bridged<T, S>
where
    T: Any,
    S: Future<Output = Outcome<ErasedValue>>,
{
    type Output = Outcome<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        assert!(!*this.settled, "Bridged polled after completion");

        let settled = ready!(this.source.poll(cx));
        *this.settled = true;

        Poll::Ready(
            settled
                .map_fault(Fault::normalize)
                .and_then(|value| match value.downcast::<T>() {
                    Ok(value) => Outcome::Ok(value),
                    Err(fault) => {
                        error!(error = %fault, "bridged value does not match the declared type");
                        Outcome::Err(fault)
                    }
                }),
        )
    }
}

impl<T, S> fmt::Debug for Bridged<T, S>
where
    T: Any,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridged")
            .field("declared", &TypeTag::of::<T>())
            .field("settled", &self.settled)
            .finish_non_exhaustive()
    }
}
