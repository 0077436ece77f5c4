//! Optional tracing integration.
//!
//! With the `tracing-integration` feature the logging macros are the ones from
//! the `tracing` crate. Without it they expand to nothing, so call sites never
//! need their own `cfg` attributes.

#[cfg(feature = "tracing-integration")]
pub use tracing::{debug, error, info, trace, warn};

#[cfg(not(feature = "tracing-integration"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __defcon_noop_log {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing-integration"))]
pub use crate::__defcon_noop_log as debug;
#[cfg(not(feature = "tracing-integration"))]
pub use crate::__defcon_noop_log as error;
#[cfg(not(feature = "tracing-integration"))]
pub use crate::__defcon_noop_log as info;
#[cfg(not(feature = "tracing-integration"))]
pub use crate::__defcon_noop_log as trace;
#[cfg(not(feature = "tracing-integration"))]
pub use crate::__defcon_noop_log as warn;
