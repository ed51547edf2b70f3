//! Built-in wrappers
//!
//! Every built-in the runtime knows has a wrapper here. Generated bindings
//! refer to them by the reflected short name (`SByte`, `Boolean`, `Single`),
//! which the aliases at the bottom of this module resolve.

use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;

use crate::boundary;
use crate::builtin::{BuiltinKind, ARRAY_GET_LENGTH, ARRAY_GET_VALUE, ARRAY_SET_VALUE};
use crate::error::{InteropError, InteropResult};
use crate::ids::{Handle, TypeId};
use crate::init::{ArrayData, ObjectInit, StringData};
use crate::traits::{FromObject, ObjectHash, ObjectInitializable, ObjectValuable};

// ============================================================================
// Object
// ============================================================================

/// An owned handle. Dropping it releases the managed value.
pub struct Object(Handle);

impl Object {
    /// Take ownership of a raw handle.
    ///
    /// # Safety
    ///
    /// `handle` must be live and not owned by any other `Object`.
    pub unsafe fn from_raw(handle: Handle) -> Self {
        Self(handle)
    }

    /// The underlying handle, still owned by `self`.
    pub fn handle(&self) -> Handle {
        self.0
    }

    /// Give up ownership without releasing the managed value.
    pub fn into_raw(self) -> Handle {
        let handle = self.0;
        std::mem::forget(self);
        handle
    }

    /// Whether the boxed value is an instance of `T`.
    pub fn is<T: ObjectHash>(&self) -> InteropResult<bool> {
        boundary::is_instance(self.0, T::type_id())
    }

    /// Checked conversion into a typed wrapper.
    pub fn downcast<T: FromObject>(self) -> InteropResult<T> {
        T::from_object(self)
    }

    /// Whether the handle boxes a null reference returned by the host.
    pub fn is_null_reference(&self) -> InteropResult<bool> {
        boundary::is_instance(self.0, BuiltinKind::Void.type_id())
    }

    /// Like [`Object::downcast`], but a null reference becomes `None`
    /// instead of a mismatch. The marker handle is released either way.
    pub fn downcast_nullable<T: FromObject>(self) -> InteropResult<Option<T>> {
        if self.is_null_reference()? {
            return Ok(None);
        }
        T::from_object(self).map(Some)
    }
}

impl Drop for Object {
    fn drop(&mut self) {
        if !self.0.is_null() {
            boundary::free_object(self.0);
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Object").field(&self.0).finish()
    }
}

impl ObjectHash for Object {
    fn type_id() -> TypeId {
        BuiltinKind::Object.type_id()
    }
}

impl FromObject for Object {
    unsafe fn from_object_unchecked(object: Object) -> Self {
        object
    }
}

// ============================================================================
// Scalars
// ============================================================================

macro_rules! scalar_wrapper {
    ($(#[$doc:meta])* $name:ident, $prim:ty, $coerce:ident, |$raw:ident| $convert:expr) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $name(Object);

        impl Deref for $name {
            type Target = Object;
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl ObjectHash for $name {
            fn type_id() -> TypeId {
                BuiltinKind::$name.type_id()
            }
        }

        impl FromObject for $name {
            unsafe fn from_object_unchecked(object: Object) -> Self {
                Self(object)
            }
        }

        impl ObjectInitializable for $name {
            type InitType<'a> = $prim;

            fn new(value: Self::InitType<'_>) -> InteropResult<Self> {
                boundary::construct(&ObjectInit::new(Self::type_id(), value)).map(Self)
            }
        }

        impl ObjectValuable for $name {
            type ValueType = $prim;

            fn value(&self) -> InteropResult<Self::ValueType> {
                let $raw = boundary::$coerce(self.0.handle())?;
                Ok($convert)
            }
        }
    };
}

scalar_wrapper!(
    /// `System.SByte`
    Int8, i8, as_u8, |raw| raw as i8
);
scalar_wrapper!(
    /// `System.Byte`
    UInt8, u8, as_u8, |raw| raw
);
scalar_wrapper!(
    /// `System.Boolean`
    Bool, bool, as_u8, |raw| raw != 0
);
scalar_wrapper!(
    /// `System.Char`, one UTF-16 code unit
    Char, u16, as_u16, |raw| raw
);
scalar_wrapper!(
    /// `System.Int16`
    Int16, i16, as_u16, |raw| raw as i16
);
scalar_wrapper!(
    /// `System.UInt16`
    UInt16, u16, as_u16, |raw| raw
);
scalar_wrapper!(
    /// `System.Int32`
    Int32, i32, as_u32, |raw| raw as i32
);
scalar_wrapper!(
    /// `System.UInt32`
    UInt32, u32, as_u32, |raw| raw
);
scalar_wrapper!(
    /// `System.Int64`
    Int64, i64, as_u64, |raw| raw as i64
);
scalar_wrapper!(
    /// `System.UInt64`
    UInt64, u64, as_u64, |raw| raw
);
scalar_wrapper!(
    /// `System.Single`
    Float, f32, as_u32, |raw| f32::from_bits(raw)
);
scalar_wrapper!(
    /// `System.Double`
    Double, f64, as_u64, |raw| f64::from_bits(raw)
);

// ============================================================================
// String
// ============================================================================

/// `System.String`
#[derive(Debug)]
pub struct String(Object);

impl Deref for String {
    type Target = Object;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl ObjectHash for String {
    fn type_id() -> TypeId {
        BuiltinKind::String.type_id()
    }
}

impl FromObject for String {
    unsafe fn from_object_unchecked(object: Object) -> Self {
        Self(object)
    }
}

impl ObjectInitializable for String {
    type InitType<'a> = &'a str;

    fn new(value: Self::InitType<'_>) -> InteropResult<Self> {
        let data = StringData {
            ptr: value.as_ptr(),
            len: value.len() as isize,
        };
        boundary::construct(&ObjectInit::new(Self::type_id(), data)).map(Self)
    }
}

impl ObjectValuable for String {
    type ValueType = std::string::String;

    fn value(&self) -> InteropResult<Self::ValueType> {
        boundary::as_string(self.0.handle())
    }
}

// ============================================================================
// Array
// ============================================================================

/// `System.Array` holding elements of `T`.
///
/// Elements stay in the registry; every access is a call through the
/// boundary.
pub struct Array<T> {
    object: Object,
    element: PhantomData<fn() -> T>,
}

impl<T> Deref for Array<T> {
    type Target = Object;
    fn deref(&self) -> &Self::Target {
        &self.object
    }
}

impl<T> fmt::Debug for Array<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Array")
            .field("object", &self.object)
            .field("element", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> ObjectHash for Array<T> {
    fn type_id() -> TypeId {
        BuiltinKind::Array.type_id()
    }
}

impl<T> FromObject for Array<T> {
    unsafe fn from_object_unchecked(object: Object) -> Self {
        Self {
            object,
            element: PhantomData,
        }
    }
}

impl<T: ObjectHash> ObjectInitializable for Array<T> {
    /// Number of default-initialized elements.
    type InitType<'a> = usize;

    fn new(len: Self::InitType<'_>) -> InteropResult<Self> {
        let data = ArrayData {
            element: T::type_id().raw(),
            len: isize::try_from(len).map_err(|_| InteropError::ConstructionFailed(Self::type_id()))?,
        };
        let object = boundary::construct(&ObjectInit::new(Self::type_id(), data))?;
        Ok(Self {
            object,
            element: PhantomData,
        })
    }
}

fn index_arg(index: usize) -> InteropResult<Int32> {
    let index = i32::try_from(index).map_err(|_| InteropError::mismatch("System.Int32"))?;
    Int32::new(index)
}

impl<T: FromObject> Array<T> {
    /// Number of elements.
    pub fn len(&self) -> InteropResult<usize> {
        let result = boundary::call_function(Self::type_id(), *ARRAY_GET_LENGTH, self.object.handle())?;
        let length = Int32::from_object(result)?.value()?;
        usize::try_from(length).map_err(|_| InteropError::mismatch("non-negative System.Int32"))
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> InteropResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Element at `index`, checked against `T`.
    pub fn get(&self, index: usize) -> InteropResult<T> {
        let index = index_arg(index)?;
        boundary::push_parameter(Self::type_id(), *ARRAY_GET_VALUE, index.handle())?;
        boundary::call_function(Self::type_id(), *ARRAY_GET_VALUE, self.object.handle())?.downcast()
    }

    /// Element at `index`, `None` for a null or unset reference slot.
    pub fn get_nullable(&self, index: usize) -> InteropResult<Option<T>> {
        let index = index_arg(index)?;
        boundary::push_parameter(Self::type_id(), *ARRAY_GET_VALUE, index.handle())?;
        boundary::call_function(Self::type_id(), *ARRAY_GET_VALUE, self.object.handle())?
            .downcast_nullable()
    }

    /// Store `value` at `index`.
    pub fn set(&self, index: usize, value: &Object) -> InteropResult<()> {
        let index = index_arg(index)?;
        boundary::push_parameter(Self::type_id(), *ARRAY_SET_VALUE, value.handle())?;
        boundary::push_parameter(Self::type_id(), *ARRAY_SET_VALUE, index.handle())?;
        boundary::call_function(Self::type_id(), *ARRAY_SET_VALUE, self.object.handle())?;
        Ok(())
    }
}

impl<T> Array<T>
where
    T: FromObject + Deref<Target = Object>,
{
    /// Build an array holding copies of `items`.
    pub fn from_items(items: &[T]) -> InteropResult<Self> {
        let array = Self::new(items.len())?;
        for (index, item) in items.iter().enumerate() {
            array.set(index, item)?;
        }
        Ok(array)
    }
}

impl<T> ObjectValuable for Array<T>
where
    T: FromObject + ObjectValuable,
{
    type ValueType = Vec<T::ValueType>;

    fn value(&self) -> InteropResult<Self::ValueType> {
        let length = self.len()?;
        let mut out = Vec::with_capacity(length);
        for index in 0..length {
            out.push(self.get(index)?.value()?);
        }
        Ok(out)
    }
}

// Reflected names used by generated paths.

/// Reflected name of [`Int8`]
pub type SByte = Int8;
/// Reflected name of [`UInt8`]
pub type Byte = UInt8;
/// Reflected name of [`Bool`]
pub type Boolean = Bool;
/// Reflected name of [`Float`]
pub type Single = Float;
