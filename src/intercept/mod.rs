//! Call interception.
//!
//! - [`call`]: method identities, declared return shapes, call descriptors
//! - [`interceptor`]: the [`CallInterceptor`] and the target-side [`Dispatch`] seam

pub mod call;
pub mod interceptor;

pub use call::{CallDescriptor, MethodId, ReturnShape, ShapeKind};
pub use interceptor::{CallInterceptor, Dispatch, Forwarded, Reply};
