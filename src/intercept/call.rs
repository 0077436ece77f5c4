//! Call descriptors: what an intercepted call is, before it is forwarded.

use crate::types::{Arguments, TypeTag};
use std::any::Any;
use std::fmt;

/// Identity of a method on the target interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId {
    name: &'static str,
}

impl MethodId {
    /// Creates a method identity from its name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    /// Returns the method name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Declared return shape of an intercepted call.
///
/// The set is closed: a method either completes asynchronously without a
/// value, resolves asynchronously to a value, or returns synchronously. A
/// method with no return value at all is `Sync` over `()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnShape {
    /// Asynchronous completion/failure signal, no value.
    FireAndForget,
    /// Asynchronous value of the tagged type.
    AsyncValue(TypeTag),
    /// Synchronous value of the tagged type.
    Sync(TypeTag),
}

impl ReturnShape {
    /// Asynchronous value of type `T`.
    #[must_use]
    pub fn async_value<T: Any>() -> Self {
        Self::AsyncValue(TypeTag::of::<T>())
    }

    /// Synchronous value of type `T`.
    #[must_use]
    pub fn sync<T: Any>() -> Self {
        Self::Sync(TypeTag::of::<T>())
    }

    /// Synchronous call without a return value.
    #[must_use]
    pub fn sync_unit() -> Self {
        Self::Sync(TypeTag::unit())
    }

    /// Returns the payload-free discriminant.
    #[must_use]
    pub const fn kind(&self) -> ShapeKind {
        match self {
            Self::FireAndForget => ShapeKind::FireAndForget,
            Self::AsyncValue(_) => ShapeKind::AsyncValue,
            Self::Sync(_) => ShapeKind::Sync,
        }
    }

    /// Returns the declared value type, if the shape carries one.
    #[must_use]
    pub const fn value_type(&self) -> Option<TypeTag> {
        match self {
            Self::FireAndForget => None,
            Self::AsyncValue(tag) | Self::Sync(tag) => Some(*tag),
        }
    }

    /// Returns `true` if the caller can suspend while the call settles.
    #[must_use]
    pub const fn is_async(&self) -> bool {
        !matches!(self, Self::Sync(_))
    }
}

impl fmt::Display for ReturnShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FireAndForget => write!(f, "fire-and-forget"),
            Self::AsyncValue(tag) => write!(f, "async<{tag}>"),
            Self::Sync(tag) => write!(f, "sync<{tag}>"),
        }
    }
}

/// Discriminant of a [`ReturnShape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// See [`ReturnShape::FireAndForget`].
    FireAndForget,
    /// See [`ReturnShape::AsyncValue`].
    AsyncValue,
    /// See [`ReturnShape::Sync`].
    Sync,
}

impl ShapeKind {
    /// Returns the shape name as a static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FireAndForget => "fire-and-forget",
            Self::AsyncValue => "async value",
            Self::Sync => "synchronous",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One intercepted call: method identity, arguments, and declared shape.
#[derive(Debug)]
pub struct CallDescriptor {
    method: MethodId,
    args: Arguments,
    shape: ReturnShape,
}

impl CallDescriptor {
    /// Creates a descriptor.
    #[must_use]
    pub const fn new(method: MethodId, args: Arguments, shape: ReturnShape) -> Self {
        Self {
            method,
            args,
            shape,
        }
    }

    /// Returns the method identity.
    #[must_use]
    pub const fn method(&self) -> MethodId {
        self.method
    }

    /// Returns the arguments.
    #[must_use]
    pub const fn args(&self) -> &Arguments {
        &self.args
    }

    /// Returns the declared return shape.
    #[must_use]
    pub const fn shape(&self) -> ReturnShape {
        self.shape
    }

    /// Decomposes the descriptor.
    #[must_use]
    pub fn into_parts(self) -> (MethodId, Arguments, ReturnShape) {
        (self.method, self.args, self.shape)
    }
}
