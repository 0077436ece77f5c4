//! The per-call interception point.
//!
//! A handle turns every method call into a [`CallDescriptor`] and hands it to
//! [`CallInterceptor::intercept`]. The interceptor classifies the declared
//! [`ReturnShape`], makes sure the real target exists, forwards the call
//! unchanged through the target's [`Dispatch`] implementation, and returns a
//! [`Reply`] of the matching shape:
//!
//! | declared shape  | waits for construction        | reply                    |
//! |-----------------|-------------------------------|--------------------------|
//! | `AsyncValue(T)` | suspends the caller's future  | [`Reply::Value`]         |
//! | `FireAndForget` | suspends the caller's future  | [`Reply::Completion`]    |
//! | `Sync(T)`       | **blocks the calling thread** | [`Reply::Immediate`]     |
//!
//! The typed helpers ([`call_async`], [`call_fire_and_forget`], [`call_sync`])
//! build the descriptor for the caller and hand back exactly the static type
//! the call site declared; value-returning async calls go through
//! [`bridge`](crate::bridge::bridge).
//!
//! # Blocking synchronous calls
//!
//! A synchronous call that arrives before the target is resolved stalls its
//! thread for the whole duration of construction. The waiting thread drives
//! the shared attempt itself, so a factory that only makes progress on some
//! other executor keeps working, but a factory that needs the *blocked*
//! thread (for example, the single thread of a current-thread runtime the
//! caller is running on) deadlocks. Issue an async call first, or make sure
//! construction does not depend on the calling thread.
//!
//! [`call_async`]: CallInterceptor::call_async
//! [`call_fire_and_forget`]: CallInterceptor::call_fire_and_forget
//! [`call_sync`]: CallInterceptor::call_sync

use crate::bridge::{BridgedOutcome, Pending, bridge};
use crate::config::HandleConfig;
use crate::error::Fault;
use crate::intercept::{CallDescriptor, MethodId, ReturnShape, ShapeKind};
use crate::sync::{ConstructionState, LazyAsync};
use crate::tracing_compat::{error, trace, warn};
use crate::types::{Arguments, ErasedValue, Outcome};
use futures::future::BoxFuture;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// The real target's side of the interception boundary.
///
/// Implementations map a method identity plus its arguments onto an actual
/// method call and report the call's result in the shape the method natively
/// has. Arguments should be taken with [`Arguments::next`] in declaration
/// order.
pub trait Dispatch: Send + Sync + 'static {
    /// Invokes `method` with `args`.
    ///
    /// Returns `Err` when the call cannot even be started: an unknown method,
    /// or arguments that do not fit.
    fn dispatch(&self, method: &MethodId, args: Arguments) -> Result<Forwarded<'_>, Fault>;
}

impl<D: Dispatch + ?Sized> Dispatch for Box<D> {
    fn dispatch(&self, method: &MethodId, args: Arguments) -> Result<Forwarded<'_>, Fault> {
        (**self).dispatch(method, args)
    }
}

impl<D: Dispatch + ?Sized> Dispatch for Arc<D> {
    fn dispatch(&self, method: &MethodId, args: Arguments) -> Result<Forwarded<'_>, Fault> {
        (**self).dispatch(method, args)
    }
}

/// The result of a forwarded call, in the target method's native shape.
pub enum Forwarded<'a> {
    /// The method completes asynchronously without a value.
    Completion(BoxFuture<'a, Outcome<()>>),
    /// The method resolves asynchronously to a value.
    Value(BoxFuture<'a, Outcome<ErasedValue>>),
    /// The method returned synchronously.
    Immediate(Outcome<ErasedValue>),
}

impl<'a> Forwarded<'a> {
    /// Forwards an asynchronous method without a value.
    pub fn completion<F>(future: F) -> Self
    where
        F: Future<Output = Outcome<()>> + Send + 'a,
    {
        Self::Completion(Box::pin(future))
    }

    /// Forwards an asynchronous value-returning method.
    pub fn value<V, F>(future: F) -> Self
    where
        V: Any + Send,
        F: Future<Output = Outcome<V>> + Send + 'a,
    {
        Self::Value(Box::pin(async move { future.await.map(ErasedValue::new) }))
    }

    /// Forwards a synchronous method.
    pub fn immediate<V: Any + Send>(outcome: Outcome<V>) -> Self {
        Self::Immediate(outcome.map(ErasedValue::new))
    }

    /// Returns the shape this result was produced in.
    #[must_use]
    pub const fn kind(&self) -> ShapeKind {
        match self {
            Self::Completion(_) => ShapeKind::FireAndForget,
            Self::Value(_) => ShapeKind::AsyncValue,
            Self::Immediate(_) => ShapeKind::Sync,
        }
    }
}

impl fmt::Debug for Forwarded<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Forwarded").field(&self.kind()).finish()
    }
}

/// What [`CallInterceptor::intercept`] hands back for one call.
pub enum Reply {
    /// Erased outcome of an `AsyncValue` call; see [`bridge`].
    Value(Pending<ErasedValue>),
    /// Completion of a `FireAndForget` call.
    Completion(Pending<()>),
    /// Settled outcome of a `Sync` call.
    Immediate(Outcome<ErasedValue>),
}

impl Reply {
    /// Returns the shape of this reply.
    #[must_use]
    pub const fn kind(&self) -> ShapeKind {
        match self {
            Self::Value(_) => ShapeKind::AsyncValue,
            Self::Completion(_) => ShapeKind::FireAndForget,
            Self::Immediate(_) => ShapeKind::Sync,
        }
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Immediate(outcome) => f.debug_tuple("Immediate").field(outcome).finish(),
            other => f.debug_tuple("Reply").field(&other.kind()).finish(),
        }
    }
}

struct Inner<T> {
    target: LazyAsync<T>,
    config: HandleConfig,
}

/// Intercepts calls on a handle and forwards them to a lazily built target.
///
/// Cloning is cheap; clones share the same construction attempt.
pub struct CallInterceptor<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for CallInterceptor<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Dispatch> CallInterceptor<T> {
    /// Creates an interceptor over the target built by `factory`.
    ///
    /// Nothing is constructed until the first call is intercepted.
    pub fn new<F, Fut>(factory: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Outcome<T>> + Send + 'static,
    {
        Self::with_config(HandleConfig::default(), factory)
    }

    /// Creates an interceptor with explicit settings.
    pub fn with_config<F, Fut>(config: HandleConfig, factory: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Outcome<T>> + Send + 'static,
    {
        let target = LazyAsync::with_label(config.label.as_str(), factory);
        Self {
            inner: Arc::new(Inner { target, config }),
        }
    }

    /// Intercepts one call.
    ///
    /// For `Sync` shapes this blocks the calling thread until construction
    /// settles; see the [module documentation](self) for the hazard.
    pub fn intercept(&self, call: CallDescriptor) -> Reply {
        let (method, args, shape) = call.into_parts();
        trace!(
            label = %self.inner.config.label,
            method = %method,
            shape = %shape,
            "intercepting call"
        );
        match shape {
            ReturnShape::AsyncValue(_) => Reply::Value(self.forward_value(method, args)),
            ReturnShape::FireAndForget => Reply::Completion(self.forward_completion(method, args)),
            ReturnShape::Sync(_) => Reply::Immediate(self.forward_blocking(method, args)),
        }
    }

    /// Intercepts a value-returning async call declared as returning `R`.
    pub fn call_async<R>(&self, method: MethodId, args: Arguments) -> BridgedOutcome<R>
    where
        R: Any + Send,
    {
        let call = CallDescriptor::new(method, args, ReturnShape::async_value::<R>());
        match self.intercept(call) {
            Reply::Value(pending) => bridge::<R, _>(pending),
            other => BridgedOutcome::failed(self.mismatch(method, ShapeKind::AsyncValue, other.kind())),
        }
    }

    /// Intercepts an async call that only signals completion.
    pub fn call_fire_and_forget(&self, method: MethodId, args: Arguments) -> Pending<()> {
        let call = CallDescriptor::new(method, args, ReturnShape::FireAndForget);
        match self.intercept(call) {
            Reply::Completion(pending) => pending,
            other => {
                let fault = self.mismatch(method, ShapeKind::FireAndForget, other.kind());
                Box::pin(futures::future::ready(Outcome::Err(fault)))
            }
        }
    }

    /// Intercepts a synchronous call declared as returning `R`.
    ///
    /// Blocks the calling thread until construction settles.
    pub fn call_sync<R>(&self, method: MethodId, args: Arguments) -> Outcome<R>
    where
        R: Any + Send,
    {
        let call = CallDescriptor::new(method, args, ReturnShape::sync::<R>());
        match self.intercept(call) {
            Reply::Immediate(outcome) => outcome.and_then(|value| match value.downcast::<R>() {
                Ok(value) => Outcome::Ok(value),
                Err(fault) => {
                    error!(
                        label = %self.inner.config.label,
                        method = %method,
                        error = %fault,
                        "synchronous result does not match the declared type"
                    );
                    Outcome::Err(fault)
                }
            }),
            other => Outcome::Err(self.mismatch(method, ShapeKind::Sync, other.kind())),
        }
    }

    /// Returns the state of the construction attempt.
    pub fn state(&self) -> ConstructionState {
        self.inner.target.state()
    }

    /// Returns the target if it has already been built.
    pub fn target(&self) -> Option<Arc<T>> {
        self.inner.target.try_get()
    }

    /// Returns the settings of this interceptor.
    pub fn config(&self) -> &HandleConfig {
        &self.inner.config
    }

    fn forward_value(&self, method: MethodId, args: Arguments) -> Pending<ErasedValue> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let target = match inner.target.ensure_built().await.split() {
                Ok(target) => target,
                Err(settled) => return settled,
            };
            let forwarded = match target.dispatch(&method, args) {
                Ok(forwarded) => forwarded,
                Err(fault) => return Outcome::Err(fault),
            };
            match forwarded {
                Forwarded::Value(pending) => pending.await,
                other => Outcome::Err(inner.mismatch(method, ShapeKind::AsyncValue, other.kind())),
            }
        })
    }

    fn forward_completion(&self, method: MethodId, args: Arguments) -> Pending<()> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let target = match inner.target.ensure_built().await.split() {
                Ok(target) => target,
                Err(settled) => return settled,
            };
            let forwarded = match target.dispatch(&method, args) {
                Ok(forwarded) => forwarded,
                Err(fault) => return Outcome::Err(fault),
            };
            match forwarded {
                Forwarded::Completion(pending) => pending.await,
                other => Outcome::Err(inner.mismatch(method, ShapeKind::FireAndForget, other.kind())),
            }
        })
    }

    fn forward_blocking(&self, method: MethodId, args: Arguments) -> Outcome<ErasedValue> {
        let inner = &self.inner;
        if inner.config.warn_on_blocking_wait && !inner.target.state().is_settled() {
            warn!(
                label = %inner.config.label,
                method = %method,
                "synchronous call is blocking its thread until construction settles"
            );
        }
        let target = match inner.target.wait_blocking().split() {
            Ok(target) => target,
            Err(settled) => return settled,
        };
        match target.dispatch(&method, args) {
            Ok(Forwarded::Immediate(outcome)) => outcome,
            Ok(other) => Outcome::Err(inner.mismatch(method, ShapeKind::Sync, other.kind())),
            Err(fault) => Outcome::Err(fault),
        }
    }

    fn mismatch(&self, method: MethodId, declared: ShapeKind, actual: ShapeKind) -> Fault {
        self.inner.mismatch(method, declared, actual)
    }
}

impl<T> Inner<T> {
    fn mismatch(&self, method: MethodId, declared: ShapeKind, actual: ShapeKind) -> Fault {
        let fault = Fault::shape_mismatch(method, declared, actual);
        error!(label = %self.config.label, error = %fault, "return shape mismatch");
        fault
    }
}

impl<T: Dispatch> fmt::Debug for CallInterceptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallInterceptor")
            .field("label", &self.inner.config.label)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
