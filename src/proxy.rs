//! The handle factory.
//!
//! A handle is a value implementing the target interface that owns a
//! [`CallInterceptor`] and routes every method through it. Handles are
//! written once per interface (a small adapter struct, see
//! [`ProxyHandle`]); [`create_handle`] wires a factory to a fresh
//! interceptor and returns immediately without building anything.

use crate::config::HandleConfig;
use crate::intercept::{CallInterceptor, Dispatch};
use crate::tracing_compat::debug;
use crate::types::Outcome;
use std::future::Future;

/// A handle type that forwards an interface to a lazily built target.
///
/// ```
/// use defcon::{Arguments, CallInterceptor, Dispatch, Fault, Forwarded, MethodId, Outcome};
/// use defcon::{ProxyHandle, create_handle};
///
/// const ANSWER: MethodId = MethodId::new("answer");
///
/// struct Oracle;
///
/// impl Dispatch for Oracle {
///     fn dispatch(&self, method: &MethodId, _: Arguments) -> Result<Forwarded<'_>, Fault> {
///         match *method {
///             ANSWER => Ok(Forwarded::immediate(Outcome::Ok(42_u32))),
///             other => Err(Fault::unknown_method(other)),
///         }
///     }
/// }
///
/// struct OracleHandle(CallInterceptor<Oracle>);
///
/// impl ProxyHandle for OracleHandle {
///     type Target = Oracle;
///     fn from_interceptor(interceptor: CallInterceptor<Oracle>) -> Self {
///         Self(interceptor)
///     }
/// }
///
/// impl OracleHandle {
///     fn answer(&self) -> u32 {
///         self.0.call_sync(ANSWER, Arguments::new()).unwrap()
///     }
/// }
///
/// let handle: OracleHandle = create_handle(|| async { Outcome::Ok(Oracle) });
/// assert_eq!(handle.answer(), 42);
/// ```
pub trait ProxyHandle: Sized {
    /// The real target the handle forwards to.
    type Target: Dispatch;

    /// Wraps an interceptor into the handle.
    fn from_interceptor(interceptor: CallInterceptor<Self::Target>) -> Self;
}

/// Creates a handle whose target is built by `factory` on first use.
///
/// Returns immediately; the factory is not invoked.
pub fn create_handle<H, F, Fut>(factory: F) -> H
where
    H: ProxyHandle,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Outcome<H::Target>> + Send + 'static,
{
    create_handle_with_config(HandleConfig::default(), factory)
}

/// Like [`create_handle`], with explicit settings.
pub fn create_handle_with_config<H, F, Fut>(config: HandleConfig, factory: F) -> H
where
    H: ProxyHandle,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Outcome<H::Target>> + Send + 'static,
{
    debug!(
        label = %config.label,
        target_type = std::any::type_name::<H::Target>(),
        "deferred handle created"
    );
    H::from_interceptor(CallInterceptor::with_config(config, factory))
}
