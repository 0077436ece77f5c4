//! Type-erased values crossing the interception boundary.
//!
//! Arguments travel from the handle to the real target, and results travel
//! back, as [`ErasedValue`]s. Each erased value remembers the [`TypeTag`] of
//! what was stored so that a failed cast can report both sides.

use crate::error::Fault;
use std::any::{Any, TypeId, type_name};
use std::collections::VecDeque;
use std::fmt;

/// Runtime identity of a Rust type, with its name for diagnostics.
#[derive(Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    /// Returns the tag of `T`.
    #[must_use]
    pub fn of<T: Any + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Returns the unit tag, used for calls without a return value.
    #[must_use]
    pub fn unit() -> Self {
        Self::of::<()>()
    }

    /// Returns the type id.
    #[must_use]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the type name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if this tag describes `T`.
    #[must_use]
    pub fn is<T: Any + ?Sized>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl std::hash::Hash for TypeTag {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeTag").field(&self.name).finish()
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A value whose static type has been erased.
pub struct ErasedValue {
    value: Box<dyn Any + Send>,
    tag: TypeTag,
}

impl ErasedValue {
    /// Erases `value`.
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self {
            value: Box::new(value),
            tag: TypeTag::of::<T>(),
        }
    }

    /// Erases `()`.
    #[must_use]
    pub fn unit() -> Self {
        Self::new(())
    }

    /// Returns the tag of the stored value.
    #[must_use]
    pub const fn tag(&self) -> TypeTag {
        self.tag
    }

    /// Returns `true` if the stored value is a `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Borrows the stored value as `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Recovers the stored value as `T`.
    ///
    /// Fails with [`Fault::TypeMismatch`] when the stored value is not a `T`.
    pub fn downcast<T: Any>(self) -> Result<T, Fault> {
        let found = self.tag;
        self.value
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| Fault::type_mismatch(TypeTag::of::<T>(), found))
    }
}

impl fmt::Debug for ErasedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedValue")
            .field("type", &self.tag.name)
            .finish_non_exhaustive()
    }
}

/// Ordered argument list of an intercepted call.
///
/// The interceptor never looks inside; only the real target's dispatch pops
/// arguments, in the order the handle pushed them.
#[derive(Debug, Default)]
pub struct Arguments {
    values: VecDeque<ErasedValue>,
    taken: usize,
}

impl Arguments {
    /// Creates an empty argument list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an argument.
    #[must_use]
    pub fn with<T: Any + Send>(mut self, value: T) -> Self {
        self.push(value);
        self
    }

    /// Appends an argument in place.
    pub fn push<T: Any + Send>(&mut self, value: T) {
        self.values.push_back(ErasedValue::new(value));
    }

    /// Number of arguments not yet taken.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if every argument has been taken.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Tags of the remaining arguments, in order.
    pub fn tags(&self) -> impl Iterator<Item = TypeTag> + '_ {
        self.values.iter().map(ErasedValue::tag)
    }

    /// Takes the next argument as `T`.
    pub fn next_arg<T: Any>(&mut self) -> Result<T, Fault> {
        let index = self.taken;
        let value = self
            .values
            .pop_front()
            .ok_or(Fault::MissingArgument { index })?;
        self.taken += 1;
        value.downcast::<T>()
    }

    /// Asserts that no arguments remain.
    pub fn finish(self) -> Result<(), Fault> {
        if self.values.is_empty() {
            Ok(())
        } else {
            Err(Fault::UnexpectedArguments {
                remaining: self.values.len(),
            })
        }
    }
}

impl FromIterator<ErasedValue> for Arguments {
    fn from_iter<I: IntoIterator<Item = ErasedValue>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
            taken: 0,
        }
    }
}
