//! Memoized asynchronous construction.
//!
//! [`LazyAsync`] owns at most one construction attempt for its whole
//! lifetime. The first call to [`LazyAsync::ensure_built`] flips the attempt
//! from "not started" to "started" under a short critical section; every
//! caller, including that first one, then awaits the same shared attempt.
//!
//! # Driving the attempt
//!
//! The attempt is a [`Shared`] future: whichever waiter is polled drives the
//! factory forward, and if every waiter goes away the attempt is retained and
//! resumed by the next one. The factory closure itself is only called on the
//! first poll, outside of the check-and-set lock.
//!
//! # Settlement
//!
//! Successes are cached as `Arc<T>`. Failures are [normalized] once and cached
//! as well, so every caller observes the same cause. A factory that panics
//! settles the attempt as failed with [`Fault::Panicked`]. Nothing is retried.
//!
//! [normalized]: crate::error::Fault::normalize

use crate::error::Fault;
use crate::tracing_compat::{debug, trace};
use crate::types::Outcome;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

type Factory<T> = Box<dyn FnOnce() -> BoxFuture<'static, Outcome<T>> + Send>;
type Attempt<T> = Shared<BoxFuture<'static, Outcome<Arc<T>>>>;

/// Observable state of a construction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstructionState {
    /// Nobody has asked for the target yet.
    NotStarted,
    /// The single factory execution is running.
    InProgress,
    /// The target was built and is cached.
    Resolved,
    /// The factory failed; the failure is cached.
    Failed,
    /// The factory was cancelled; the cancellation is cached.
    Cancelled,
}

impl ConstructionState {
    /// Returns `true` once the attempt has settled.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Resolved | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for ConstructionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not started",
            Self::InProgress => "in progress",
            Self::Resolved => "resolved",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

struct Slot<T> {
    factory: Option<Factory<T>>,
    attempt: Option<Attempt<T>>,
}

/// A value built asynchronously, at most once, on first request.
pub struct LazyAsync<T> {
    slot: Mutex<Slot<T>>,
    label: Arc<str>,
}

impl<T> LazyAsync<T>
where
    T: Send + Sync + 'static,
{
    /// Creates a lazy value from an asynchronous factory.
    ///
    /// The factory is not called until the first [`ensure_built`](Self::ensure_built).
    pub fn new<F, Fut>(factory: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Outcome<T>> + Send + 'static,
    {
        Self::with_label(crate::config::DEFAULT_LABEL, factory)
    }

    /// Creates a lazy value whose log events carry `label`.
    pub fn with_label<F, Fut>(label: impl Into<Arc<str>>, factory: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Outcome<T>> + Send + 'static,
    {
        let factory: Factory<T> = Box::new(move || factory().boxed());
        Self {
            slot: Mutex::new(Slot {
                factory: Some(factory),
                attempt: None,
            }),
            label: label.into(),
        }
    }

    /// Returns the shared construction attempt, starting it if needed.
    ///
    /// All callers receive a handle to the same eventual outcome. The
    /// returned future does not need to be polled by the caller that started
    /// the attempt; any holder can drive it.
    pub fn ensure_built(&self) -> Construction<T> {
        let mut slot = self.slot.lock();
        if let Some(attempt) = &slot.attempt {
            return Construction {
                inner: attempt.clone(),
            };
        }

        let attempt = match slot.factory.take() {
            Some(factory) => {
                debug!(label = %self.label, "starting deferred construction");
                run_attempt(Arc::clone(&self.label), factory)
            }
            // The factory is only ever taken together with storing an attempt.
            None => futures::future::ready(Outcome::Err(Fault::msg(
                "deferred construction factory is unavailable",
            )))
            .boxed(),
        }
        .shared();

        slot.attempt = Some(attempt.clone());
        Construction { inner: attempt }
    }

    /// Blocks the calling thread until the attempt settles.
    ///
    /// Starts the attempt if needed. If the attempt is already resolved this
    /// returns immediately without blocking.
    ///
    /// # Deadlock hazard
    ///
    /// The calling thread itself polls the attempt while it waits. A factory
    /// that can only make progress on the executor thread that is now blocked
    /// (for example a single-threaded runtime the caller is running on) will
    /// never complete.
    pub fn wait_blocking(&self) -> Outcome<Arc<T>> {
        let construction = self.ensure_built();
        if let Some(settled) = construction.peek() {
            return settled;
        }
        futures_lite::future::block_on(construction)
    }

    /// Returns the current state of the attempt.
    pub fn state(&self) -> ConstructionState {
        let slot = self.slot.lock();
        match &slot.attempt {
            None => ConstructionState::NotStarted,
            Some(attempt) => match attempt.peek() {
                None => ConstructionState::InProgress,
                Some(Outcome::Ok(_)) => ConstructionState::Resolved,
                Some(Outcome::Err(_)) => ConstructionState::Failed,
                Some(Outcome::Cancelled(_)) => ConstructionState::Cancelled,
            },
        }
    }

    /// Returns `true` once the attempt has been started.
    pub fn is_started(&self) -> bool {
        self.slot.lock().attempt.is_some()
    }

    /// Returns the target if it has already been built.
    pub fn try_get(&self) -> Option<Arc<T>> {
        let slot = self.slot.lock();
        match slot.attempt.as_ref()?.peek()? {
            Outcome::Ok(target) => Some(Arc::clone(target)),
            _ => None,
        }
    }

    /// Returns the label carried by log events.
    pub fn label(&self) -> &str {
        &self.label
    }
}

fn run_attempt<T>(label: Arc<str>, factory: Factory<T>) -> BoxFuture<'static, Outcome<Arc<T>>>
where
    T: Send + Sync + 'static,
{
    async move {
        let built = AssertUnwindSafe(async move { factory().await })
            .catch_unwind()
            .await;
        let settled = match built {
            Ok(Outcome::Ok(target)) => Outcome::Ok(Arc::new(target)),
            Ok(Outcome::Err(fault)) => Outcome::Err(fault.normalize()),
            Ok(Outcome::Cancelled(reason)) => Outcome::Cancelled(reason),
            Err(payload) => Outcome::Err(Fault::panicked(payload.as_ref())),
        };
        match &settled {
            Outcome::Ok(_) => debug!(label = %label, "deferred construction resolved"),
            Outcome::Err(fault) => debug!(label = %label, error = %fault, "deferred construction failed"),
            Outcome::Cancelled(reason) => {
                debug!(label = %label, reason = %reason, "deferred construction cancelled");
            }
        }
        settled
    }
    .boxed()
}

impl<T> fmt::Debug for LazyAsync<T>
where
    T: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyAsync")
            .field("label", &self.label)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Future resolving to the settled construction attempt.
///
/// Cloning is cheap; every clone awaits the same attempt.
#[must_use = "futures do nothing unless polled"]
pub struct Construction<T> {
    inner: Attempt<T>,
}

impl<T> Construction<T>
where
    T: Send + Sync + 'static,
{
    /// Returns the settled outcome without waiting, if available.
    pub fn peek(&self) -> Option<Outcome<Arc<T>>> {
        self.inner.peek().cloned()
    }
}

impl<T> Clone for Construction<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Future for Construction<T>
where
    T: Send + Sync + 'static,
{
    type Output = Outcome<Arc<T>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let poll = Pin::new(&mut self.inner).poll(cx);
        if poll.is_pending() {
            trace!("waiting on deferred construction");
        }
        poll
    }
}

impl<T> fmt::Debug for Construction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Construction").finish_non_exhaustive()
    }
}
