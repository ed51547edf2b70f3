//! Traits implemented by every native-side wrapper
//!
//! Generated bindings and the `system` wrappers implement the same four
//! traits, so a wrapper can be passed, returned and converted without
//! knowing whether it came from the generator or the runtime.

use crate::boundary;
use crate::error::{InteropError, InteropResult};
use crate::ids::TypeId;
use crate::system::Object;

/// A wrapper type with a wire identity.
pub trait ObjectHash {
    /// Identity the registry knows this type by.
    fn type_id() -> TypeId;
}

/// A wrapper that can take ownership of a handle.
pub trait FromObject: ObjectHash + Sized {
    /// Adopt `object` without asking the registry what it boxes.
    ///
    /// # Safety
    ///
    /// The caller asserts that `object` boxes a value of this wrapper's type.
    unsafe fn from_object_unchecked(object: Object) -> Self;

    /// Adopt `object` after the registry confirms it is an instance of this
    /// wrapper's type. On mismatch the handle is released.
    fn from_object(object: Object) -> InteropResult<Self> {
        if boundary::is_instance(object.handle(), Self::type_id())? {
            // Safety: the registry confirmed the boxed type.
            Ok(unsafe { Self::from_object_unchecked(object) })
        } else {
            Err(InteropError::mismatch(std::any::type_name::<Self>()))
        }
    }
}

/// A wrapper the native side can construct from a plain value.
pub trait ObjectInitializable: FromObject {
    /// Value the instance is built from.
    type InitType<'a>;

    /// Ask the registry for a new instance.
    fn new(value: Self::InitType<'_>) -> InteropResult<Self>;
}

/// A wrapper whose boxed value can be copied back out.
pub trait ObjectValuable {
    /// Extracted value.
    type ValueType;

    /// Coerce the boxed value.
    fn value(&self) -> InteropResult<Self::ValueType>;
}
