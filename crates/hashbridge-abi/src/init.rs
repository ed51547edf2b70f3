//! Construction records
//!
//! The native side builds an [`ObjectInit`] on its own stack and hands the
//! managed side a pointer to the header. The payload follows the header
//! directly: scalar bytes, a [`StringData`] or an [`ArrayData`].

use std::mem::size_of;

use crate::builtin::BuiltinKind;
use crate::error::{InteropError, InteropResult};
use crate::ids::TypeId;

/// Fixed header of every construction request.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectInitializer {
    /// Identity of the requested type
    pub type_id: u64,
    /// Size in bytes of the payload following this header
    pub payload_size: isize,
}

/// String payload: borrowed UTF-8 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct StringData {
    /// First byte
    pub ptr: *const u8,
    /// Length in bytes
    pub len: isize,
}

/// Array payload: element type and length.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayData {
    /// Identity of the element type
    pub element: u64,
    /// Number of elements
    pub len: isize,
}

/// Header and payload laid out contiguously.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ObjectInit<P> {
    header: ObjectInitializer,
    payload: P,
}

impl<P: Copy> ObjectInit<P> {
    /// Build a request for `type_id` carrying `payload`.
    pub fn new(type_id: TypeId, payload: P) -> Self {
        Self {
            header: ObjectInitializer {
                type_id: type_id.raw(),
                payload_size: size_of::<P>() as isize,
            },
            payload,
        }
    }

    /// The header.
    pub fn header(&self) -> &ObjectInitializer {
        &self.header
    }

    /// The payload.
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Pointer handed across the boundary.
    pub fn as_ptr(&self) -> *const ObjectInitializer {
        (self as *const Self).cast()
    }
}

impl ObjectInit<()> {
    /// Request with no payload, used for singletons and registered constructors.
    pub fn empty(type_id: TypeId) -> Self {
        Self::new(type_id, ())
    }
}

/// Decoded payload of a construction request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitPayload<'a> {
    /// No payload, or a payload the requested type ignores
    Empty,
    /// Little-endian scalar bytes, exactly the scalar's width
    Scalar(&'a [u8]),
    /// String contents
    String(&'a str),
    /// Array shape
    Array {
        /// Element type
        element: TypeId,
        /// Element count
        len: usize,
    },
}

impl ObjectInitializer {
    /// Decode a request received across the boundary.
    ///
    /// The payload is interpreted according to the requested type: built-in
    /// scalars read their width, strings and arrays read their record, every
    /// other type decodes to [`InitPayload::Empty`].
    ///
    /// # Safety
    ///
    /// `init` must point to a header followed by `payload_size` readable
    /// bytes. A string payload must point to `len` bytes that stay valid
    /// for `'a`.
    pub unsafe fn decode<'a>(
        init: *const ObjectInitializer,
    ) -> InteropResult<(TypeId, InitPayload<'a>)> {
        if init.is_null() {
            return Err(InteropError::NullHandle);
        }
        let header = init.read_unaligned();
        let type_id = TypeId::from_raw(header.type_id);
        let failed = || InteropError::ConstructionFailed(type_id);
        let size = usize::try_from(header.payload_size).map_err(|_| failed())?;
        let payload = init.cast::<u8>().add(size_of::<ObjectInitializer>());

        let decoded = match BuiltinKind::from_type_id(type_id) {
            Some(BuiltinKind::String) => {
                if size < size_of::<StringData>() {
                    return Err(failed());
                }
                let data = payload.cast::<StringData>().read_unaligned();
                let len = usize::try_from(data.len).map_err(|_| failed())?;
                let bytes: &'a [u8] = if len == 0 {
                    &[]
                } else if data.ptr.is_null() {
                    return Err(failed());
                } else {
                    std::slice::from_raw_parts(data.ptr, len)
                };
                InitPayload::String(std::str::from_utf8(bytes).map_err(|_| failed())?)
            }
            Some(BuiltinKind::Array) => {
                if size < size_of::<ArrayData>() {
                    return Err(failed());
                }
                let data = payload.cast::<ArrayData>().read_unaligned();
                InitPayload::Array {
                    element: TypeId::from_raw(data.element),
                    len: usize::try_from(data.len).map_err(|_| failed())?,
                }
            }
            Some(kind) => match kind.scalar_size() {
                Some(width) if size >= width => {
                    InitPayload::Scalar(std::slice::from_raw_parts(payload, width))
                }
                Some(_) => return Err(failed()),
                None => InitPayload::Empty,
            },
            None => InitPayload::Empty,
        };
        Ok((type_id, decoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        assert_eq!(size_of::<ObjectInitializer>(), 8 + size_of::<isize>());
        assert_eq!(size_of::<ArrayData>(), 8 + size_of::<isize>());
        let init = ObjectInit::new(BuiltinKind::Int64.type_id(), 5i64);
        let base = init.as_ptr() as usize;
        let payload = init.payload() as *const i64 as usize;
        assert_eq!(payload - base, size_of::<ObjectInitializer>());
        assert_eq!(init.header().payload_size, 8);
    }

    #[test]
    fn test_decode_scalar() {
        let init = ObjectInit::new(BuiltinKind::Int32.type_id(), 42i32);
        let (type_id, payload) = unsafe { ObjectInitializer::decode(init.as_ptr()) }.unwrap();
        assert_eq!(type_id, BuiltinKind::Int32.type_id());
        assert_eq!(payload, InitPayload::Scalar(&42i32.to_le_bytes()));
    }

    #[test]
    fn test_decode_string() {
        let text = "mod.id";
        let init = ObjectInit::new(
            BuiltinKind::String.type_id(),
            StringData {
                ptr: text.as_ptr(),
                len: text.len() as isize,
            },
        );
        let (_, payload) = unsafe { ObjectInitializer::decode(init.as_ptr()) }.unwrap();
        assert_eq!(payload, InitPayload::String("mod.id"));
    }

    #[test]
    fn test_decode_array() {
        let init = ObjectInit::new(
            BuiltinKind::Array.type_id(),
            ArrayData {
                element: BuiltinKind::Int32.type_id().raw(),
                len: 3,
            },
        );
        let (_, payload) = unsafe { ObjectInitializer::decode(init.as_ptr()) }.unwrap();
        assert_eq!(
            payload,
            InitPayload::Array {
                element: BuiltinKind::Int32.type_id(),
                len: 3
            }
        );
    }

    #[test]
    fn test_decode_short_scalar_fails() {
        let init = ObjectInit::new(BuiltinKind::Int64.type_id(), 1u8);
        let err = unsafe { ObjectInitializer::decode(init.as_ptr()) }.unwrap_err();
        assert_eq!(err, InteropError::ConstructionFailed(BuiltinKind::Int64.type_id()));
    }

    #[test]
    fn test_decode_unknown_type_is_empty() {
        let init = ObjectInit::empty(TypeId::of_path("crate::host::IConfig"));
        let (_, payload) = unsafe { ObjectInitializer::decode(init.as_ptr()) }.unwrap();
        assert_eq!(payload, InitPayload::Empty);
    }
}
