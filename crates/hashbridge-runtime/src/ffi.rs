//! C ABI for the native side
//!
//! Every entry point resolves the installed registry, performs one
//! operation and records the outcome in a thread-local error slot that
//! `hb_last_error` reads back. Failed calls return a null handle, `false`
//! or zero; successful calls reset the slot to [`ErrorCode::None`].

use std::cell::Cell;
use std::sync::Arc;

use hashbridge_abi::boundary::BoundaryTable;
use hashbridge_abi::{ErrorCode, Handle, InteropError, MethodId, ObjectInitializer, StringData, TypeId};
use once_cell::sync::OnceCell;
use tracing::{debug, info};

use crate::dispatch::ScalarKind;
use crate::registry::ObjectRegistry;

static REGISTRY: OnceCell<Arc<ObjectRegistry>> = OnceCell::new();

thread_local! {
    static LAST_ERROR: Cell<ErrorCode> = const { Cell::new(ErrorCode::None) };
}

/// Install the process registry. Only the first installation wins.
pub fn install(registry: Arc<ObjectRegistry>) -> bool {
    let installed = REGISTRY.set(registry).is_ok();
    info!(installed, "registry installation");
    installed
}

/// The installed registry, if any.
pub fn registry() -> Option<&'static Arc<ObjectRegistry>> {
    REGISTRY.get()
}

/// Failure recorded by the last boundary call on this thread.
pub fn last_error() -> ErrorCode {
    LAST_ERROR.with(Cell::get)
}

/// Entry points to hand to the native library.
pub fn boundary_table() -> BoundaryTable {
    BoundaryTable {
        construct: hb_construct,
        push_parameter: hb_push_parameter,
        call_function: hb_call_function,
        free_object: hb_free_object,
        as_u8: hb_as_u8,
        as_u16: hb_as_u16,
        as_u32: hb_as_u32,
        as_u64: hb_as_u64,
        as_string: hb_as_string,
        string_free: hb_string_free,
        is_instance: hb_is_instance,
        last_error: hb_last_error,
    }
}

fn with_registry<T>(
    op: impl FnOnce(&ObjectRegistry) -> Result<T, InteropError>,
) -> Result<T, InteropError> {
    let registry = REGISTRY.get().ok_or(InteropError::BoundaryNotInstalled)?;
    op(registry)
}

fn record<T>(result: Result<T, InteropError>, fallback: T) -> T {
    match result {
        Ok(value) => {
            LAST_ERROR.with(|slot| slot.set(ErrorCode::None));
            value
        }
        Err(err) => {
            debug!(error = %err, "boundary call failed");
            LAST_ERROR.with(|slot| slot.set(err.code()));
            fallback
        }
    }
}

// ============================================================================
// Construction and Dispatch
// ============================================================================

/// Construct an instance.
///
/// # Arguments
/// * `init` - Construction record: header followed by its payload
///
/// # Returns
/// * Handle of the new instance, or 0 on failure
///
/// # Safety
/// `init` must be null or point to a complete `ObjectInitializer` record.
#[no_mangle]
pub unsafe extern "C" fn hb_construct(init: *const ObjectInitializer) -> u64 {
    let result = with_registry(|registry| {
        let (type_id, payload) = ObjectInitializer::decode(init)?;
        registry.construct(type_id, payload)
    });
    record(result, Handle::NULL).raw()
}

/// Stage one argument for `(type_id, method)`.
#[no_mangle]
pub extern "C" fn hb_push_parameter(type_id: u64, method: u64, argument: u64) {
    let result = with_registry(|registry| {
        registry.push_parameter(
            TypeId::from_raw(type_id),
            MethodId::from_raw(method),
            Handle::from_raw(argument),
        )
    });
    record(result, ());
}

/// Invoke `(type_id, method)` on `receiver` with the staged arguments.
///
/// # Returns
/// * Handle of the result, a marker handle for void methods, or 0 on failure
#[no_mangle]
pub extern "C" fn hb_call_function(type_id: u64, method: u64, receiver: u64) -> u64 {
    let result = with_registry(|registry| {
        registry.call_function(
            TypeId::from_raw(type_id),
            MethodId::from_raw(method),
            Handle::from_raw(receiver),
        )
    });
    record(result, Handle::NULL).raw()
}

/// Release a handle.
#[no_mangle]
pub extern "C" fn hb_free_object(handle: u64) {
    let result = with_registry(|registry| registry.free(Handle::from_raw(handle)));
    record(result, ());
}

/// Checked downcast.
#[no_mangle]
pub extern "C" fn hb_is_instance(handle: u64, type_id: u64) -> bool {
    let result = with_registry(|registry| {
        registry.is_instance(Handle::from_raw(handle), TypeId::from_raw(type_id))
    });
    record(result, false)
}

/// Failure code of the last call on this thread, `0` after a success.
#[no_mangle]
pub extern "C" fn hb_last_error() -> u32 {
    last_error().raw()
}

// ============================================================================
// Extraction
// ============================================================================

unsafe fn write_success(success: *mut bool, value: bool) {
    if !success.is_null() {
        *success = value;
    }
}

macro_rules! extract_fn {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $kind:expr) => {
        $(#[$doc])*
        ///
        /// # Safety
        /// `success` must be null or valid for writes.
        #[no_mangle]
        pub unsafe extern "C" fn $name(handle: u64, success: *mut bool) -> $ty {
            let result =
                with_registry(|registry| registry.coerce(Handle::from_raw(handle), $kind));
            write_success(success, result.is_ok());
            record(result, 0) as $ty
        }
    };
}

extract_fn!(
    /// Extract a byte, signed byte or boolean.
    hb_as_u8, u8, ScalarKind::U8
);
extract_fn!(
    /// Extract a 16-bit integer or char.
    hb_as_u16, u16, ScalarKind::U16
);
extract_fn!(
    /// Extract a 32-bit integer or the bits of a float.
    hb_as_u32, u32, ScalarKind::U32
);
extract_fn!(
    /// Extract a 64-bit integer or the bits of a double.
    hb_as_u64, u64, ScalarKind::U64
);

/// Copy a boxed string into a record owned by the caller.
///
/// # Returns
/// * A record to release with `hb_string_free`, or null on failure
///
/// # Safety
/// `success` must be null or valid for writes.
#[no_mangle]
pub unsafe extern "C" fn hb_as_string(handle: u64, success: *mut bool) -> *mut StringData {
    let result = with_registry(|registry| registry.coerce_string(Handle::from_raw(handle)));
    write_success(success, result.is_ok());
    match record(result.map(Some), None) {
        Some(text) => {
            let bytes: Box<[u8]> = Box::from(text.as_bytes());
            let len = bytes.len() as isize;
            let ptr = Box::into_raw(bytes).cast::<u8>().cast_const();
            Box::into_raw(Box::new(StringData { ptr, len }))
        }
        None => std::ptr::null_mut(),
    }
}

/// Release a record returned by `hb_as_string`.
///
/// # Safety
/// `data` must be null or a record returned by `hb_as_string` that has not
/// been released yet.
#[no_mangle]
pub unsafe extern "C" fn hb_string_free(data: *mut StringData) {
    if data.is_null() {
        return;
    }
    let record = Box::from_raw(data);
    let len = usize::try_from(record.len).unwrap_or(0);
    drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(
        record.ptr.cast_mut(),
        len,
    )));
}
