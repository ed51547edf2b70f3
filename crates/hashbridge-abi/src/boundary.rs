//! Native-side boundary client
//!
//! The managed host hands the native library one [`BoundaryTable`] of
//! `extern "C"` entry points at load time. Everything here is a thin,
//! checked wrapper over that table: null handles and false success flags
//! are turned into [`InteropError`]s using the host's last-error code.

use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use crate::error::{ErrorCode, InteropError, InteropResult};
use crate::ids::{Handle, MethodId, TypeId};
use crate::init::{ObjectInit, ObjectInitializer, StringData};
use crate::system::Object;

// ============================================================================
// Entry Points
// ============================================================================

/// `construct(ObjectInitializer*) -> Handle`
pub type ConstructFn = unsafe extern "C" fn(*const ObjectInitializer) -> u64;
/// `push_parameter(TypeId, MethodId, Handle)`
pub type PushParameterFn = extern "C" fn(u64, u64, u64);
/// `call_function(TypeId, MethodId, Handle) -> Handle`
pub type CallFunctionFn = extern "C" fn(u64, u64, u64) -> u64;
/// `free(Handle)`
pub type FreeObjectFn = extern "C" fn(u64);
/// `as_u8(Handle, success_out) -> u8`
pub type AsU8Fn = unsafe extern "C" fn(u64, *mut bool) -> u8;
/// `as_u16(Handle, success_out) -> u16`
pub type AsU16Fn = unsafe extern "C" fn(u64, *mut bool) -> u16;
/// `as_u32(Handle, success_out) -> u32`
pub type AsU32Fn = unsafe extern "C" fn(u64, *mut bool) -> u32;
/// `as_u64(Handle, success_out) -> u64`
pub type AsU64Fn = unsafe extern "C" fn(u64, *mut bool) -> u64;
/// `as_string(Handle, success_out) -> string_handle`
pub type AsStringFn = unsafe extern "C" fn(u64, *mut bool) -> *mut StringData;
/// Release a string handle returned by `as_string`
pub type StringFreeFn = unsafe extern "C" fn(*mut StringData);
/// `is_instance(Handle, TypeId) -> bool`
pub type IsInstanceFn = extern "C" fn(u64, u64) -> bool;
/// Failure code of the last call on this thread
pub type LastErrorFn = extern "C" fn() -> u32;

/// Entry points provided by the managed host.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct BoundaryTable {
    /// Construct a built-in, singleton or registered type
    pub construct: ConstructFn,
    /// Stage an argument
    pub push_parameter: PushParameterFn,
    /// Invoke with the staged arguments
    pub call_function: CallFunctionFn,
    /// Release a handle
    pub free_object: FreeObjectFn,
    /// Extract an 8-bit scalar
    pub as_u8: AsU8Fn,
    /// Extract a 16-bit scalar
    pub as_u16: AsU16Fn,
    /// Extract a 32-bit scalar
    pub as_u32: AsU32Fn,
    /// Extract a 64-bit scalar
    pub as_u64: AsU64Fn,
    /// Extract a string
    pub as_string: AsStringFn,
    /// Release an extracted string
    pub string_free: StringFreeFn,
    /// Checked downcast
    pub is_instance: IsInstanceFn,
    /// Last failure code
    pub last_error: LastErrorFn,
}

static BOUNDARY: OnceCell<BoundaryTable> = OnceCell::new();

/// Install the host's entry points. Only the first installation wins.
pub fn install(table: BoundaryTable) -> bool {
    let installed = BOUNDARY.set(table).is_ok();
    debug!(installed, "boundary table installation");
    installed
}

/// Whether a boundary table has been installed.
pub fn is_installed() -> bool {
    BOUNDARY.get().is_some()
}

/// Install the host's entry points from C.
///
/// # Arguments
/// * `table` - Pointer to a fully populated table, copied before returning
///
/// # Returns
/// * `true` if this call installed the table
///
/// # Safety
/// `table` must be null or point to a valid `BoundaryTable`.
#[no_mangle]
pub unsafe extern "C" fn hb_install_boundary(table: *const BoundaryTable) -> bool {
    if table.is_null() {
        return false;
    }
    install(*table)
}

fn table() -> InteropResult<&'static BoundaryTable> {
    BOUNDARY.get().ok_or(InteropError::BoundaryNotInstalled)
}

fn last_error(table: &BoundaryTable) -> u32 {
    (table.last_error)()
}

fn failure(table: &BoundaryTable, type_id: TypeId, method: MethodId, handle: Handle) -> InteropError {
    InteropError::from_code(last_error(table), type_id, method, handle)
}

fn coercion_failure(table: &BoundaryTable, handle: Handle, expected: &str) -> InteropError {
    match ErrorCode::from_raw(last_error(table)) {
        Some(ErrorCode::StaleHandle) => InteropError::StaleHandle(handle),
        Some(ErrorCode::NullHandle) => InteropError::NullHandle,
        _ => InteropError::mismatch(expected),
    }
}

// ============================================================================
// Construction and Dispatch
// ============================================================================

/// Construct an instance from a construction record.
pub fn construct<P: Copy>(init: &ObjectInit<P>) -> InteropResult<Object> {
    let table = table()?;
    // Safety: `init` is a complete header followed by its payload.
    let raw = unsafe { (table.construct)(init.as_ptr()) };
    let type_id = TypeId::from_raw(init.header().type_id);
    if raw == 0 {
        return Err(failure(table, type_id, MethodId::from_raw(0), Handle::NULL));
    }
    // Safety: a non-null handle from construct is owned by the caller.
    Ok(unsafe { Object::from_raw(Handle::from_raw(raw)) })
}

/// Stage one argument for `(type_id, method)`.
pub fn push_parameter(type_id: TypeId, method: MethodId, argument: Handle) -> InteropResult<()> {
    let table = table()?;
    (table.push_parameter)(type_id.raw(), method.raw(), argument.raw());
    match last_error(table) {
        0 => Ok(()),
        code => Err(InteropError::from_code(code, type_id, method, argument)),
    }
}

/// Invoke `(type_id, method)` on `receiver` with the staged arguments.
///
/// Void methods return a marker object, released when dropped.
pub fn call_function(type_id: TypeId, method: MethodId, receiver: Handle) -> InteropResult<Object> {
    let table = table()?;
    let raw = (table.call_function)(type_id.raw(), method.raw(), receiver.raw());
    if raw == 0 {
        return Err(failure(table, type_id, method, receiver));
    }
    // Safety: a non-null handle from call_function is owned by the caller.
    Ok(unsafe { Object::from_raw(Handle::from_raw(raw)) })
}

/// Release a handle. Silently ignored when no boundary is installed.
pub fn free_object(handle: Handle) {
    if let Ok(table) = table() {
        (table.free_object)(handle.raw());
    }
}

/// Ask the registry whether `handle` boxes an instance of `type_id`.
pub fn is_instance(handle: Handle, type_id: TypeId) -> InteropResult<bool> {
    let table = table()?;
    let result = (table.is_instance)(handle.raw(), type_id.raw());
    if !result && last_error(table) != 0 {
        return Err(failure(table, type_id, MethodId::from_raw(0), handle));
    }
    Ok(result)
}

// ============================================================================
// Extraction
// ============================================================================

macro_rules! coerce_fn {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $expected:literal) => {
        $(#[$doc])*
        pub fn $name(handle: Handle) -> InteropResult<$ty> {
            let table = table()?;
            let mut success = false;
            // Safety: `success` outlives the call.
            let value = unsafe { (table.$name)(handle.raw(), &mut success) };
            if success {
                Ok(value)
            } else {
                Err(coercion_failure(table, handle, $expected))
            }
        }
    };
}

coerce_fn!(
    /// Extract a byte, signed byte or boolean.
    as_u8, u8, "8-bit scalar"
);
coerce_fn!(
    /// Extract a 16-bit integer or char.
    as_u16, u16, "16-bit scalar"
);
coerce_fn!(
    /// Extract a 32-bit integer or the bits of a float.
    as_u32, u32, "32-bit scalar"
);
coerce_fn!(
    /// Extract a 64-bit integer or the bits of a double.
    as_u64, u64, "64-bit scalar"
);

/// Copy a boxed string out of the registry.
pub fn as_string(handle: Handle) -> InteropResult<String> {
    let table = table()?;
    let mut success = false;
    // Safety: `success` outlives the call.
    let data = unsafe { (table.as_string)(handle.raw(), &mut success) };
    if !success || data.is_null() {
        return Err(coercion_failure(table, handle, "System.String"));
    }
    // Safety: a successful as_string returns an owned record the caller
    // releases with string_free.
    let copied = unsafe {
        let record = *data;
        let text = match usize::try_from(record.len) {
            Ok(0) => Some(String::new()),
            Ok(len) => String::from_utf8(std::slice::from_raw_parts(record.ptr, len).to_vec()).ok(),
            Err(_) => None,
        };
        (table.string_free)(data);
        text
    };
    copied.ok_or_else(|| {
        warn!(%handle, "host returned a malformed string record");
        InteropError::mismatch("System.String")
    })
}
