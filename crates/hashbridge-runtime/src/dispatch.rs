//! Dispatch core
//!
//! Each `(TypeId, MethodId)` pair owns a staging buffer. `push_parameter`
//! appends to it and `call_function` drains it under the same lock, so
//! arguments staged for one method never leak into another and are consumed
//! in push order. Handles are resolved when the call happens, not when they
//! are pushed.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use hashbridge_abi::{BuiltinKind, Handle, InitPayload, InteropError, MethodId, TypeId};
use tracing::{debug, error, warn};

use crate::error::InvokeError;
use crate::registry::ObjectRegistry;
use crate::value::Value;

/// Scalar width requested by an `as_u*` extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    U8,
    U16,
    U32,
    U64,
}

impl ScalarKind {
    fn expected(self) -> &'static str {
        match self {
            ScalarKind::U8 => "8-bit scalar",
            ScalarKind::U16 => "16-bit scalar",
            ScalarKind::U32 => "32-bit scalar",
            ScalarKind::U64 => "64-bit scalar",
        }
    }
}

impl ObjectRegistry {
    /// Stage `argument` for the next call of `(type_id, method)`.
    pub fn push_parameter(
        &self,
        type_id: TypeId,
        method: MethodId,
        argument: Handle,
    ) -> Result<(), InteropError> {
        let slot = self.method_table(type_id)?.slot(method)?;
        slot.staged.lock().push(argument);
        debug!(%type_id, %method, %argument, "parameter staged");
        Ok(())
    }

    /// Number of arguments currently staged for `(type_id, method)`.
    pub fn pending(&self, type_id: TypeId, method: MethodId) -> Result<usize, InteropError> {
        let slot = self.method_table(type_id)?.slot(method)?;
        let pending = slot.staged.lock().len();
        Ok(pending)
    }

    /// Invoke `(type_id, method)` on `receiver` with the staged arguments
    /// and box the result.
    ///
    /// The staging buffer is cleared whether or not the call succeeds. A
    /// null receiver is passed to the method as [`Value::Void`]. Void
    /// methods, and null reference results, return a fresh marker handle.
    /// A null where the signature promises a scalar is an invocation fault.
    pub fn call_function(
        &self,
        type_id: TypeId,
        method: MethodId,
        receiver: Handle,
    ) -> Result<Handle, InteropError> {
        let slot = self.method_table(type_id)?.slot(method)?;
        let staged = std::mem::take(&mut *slot.staged.lock());

        let fault = |err: InvokeError| {
            error!(%type_id, %method, error = %err, "invocation failed");
            InteropError::InvocationFault {
                type_id,
                method,
                message: err.to_string(),
            }
        };

        let receiver = self.resolve(receiver)?;
        if !receiver.is_void() && !self.instance_of(&receiver, type_id) {
            let name = self.method_table(type_id)?.reflected_name().to_string();
            return Err(fault(InvokeError::Receiver(name)));
        }
        let args = staged
            .iter()
            .map(|handle| self.resolve(*handle))
            .collect::<Result<Vec<_>, _>>()?;

        let descriptor = &slot.descriptor;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| descriptor.invoke(&receiver, &args)));
        let value = match outcome {
            Ok(Ok(value)) => value,
            Ok(Err(err)) => return Err(fault(err)),
            Err(payload) => return Err(fault(InvokeError::Panic(panic_message(payload)))),
        };

        if value.is_void() && descriptor.returns_scalar() {
            return Err(fault(InvokeError::NullScalar(descriptor.returns().to_string())));
        }
        // non-scalar nulls travel as the Void marker
        let value = if descriptor.is_void() { Value::Void } else { value };
        let handle = self.arena.insert(value);
        debug!(%type_id, %method, args = args.len(), result = %handle, "call completed");
        Ok(handle)
    }

    /// Release a handle. Singleton handles stay live.
    pub fn free(&self, handle: Handle) -> Result<(), InteropError> {
        let released = self.arena.free(handle)?;
        debug!(%handle, released, "free");
        Ok(())
    }

    /// Materialize an instance of `type_id`.
    ///
    /// Built-ins are decoded from the payload. Singletons ignore the payload
    /// and return their pinned handle. Other registered types use their
    /// constructor.
    pub fn construct(&self, type_id: TypeId, payload: InitPayload<'_>) -> Result<Handle, InteropError> {
        let failed = InteropError::ConstructionFailed(type_id);

        if let Some(kind) = BuiltinKind::from_type_id(type_id) {
            let value = match (kind, payload) {
                (kind, InitPayload::Scalar(bytes)) if kind.is_scalar() => {
                    Value::from_scalar(kind, bytes).ok_or(failed)?
                }
                (BuiltinKind::String, InitPayload::String(text)) => Value::from(text),
                (BuiltinKind::Array, InitPayload::Array { element, len }) => {
                    if element == BuiltinKind::Void.type_id() || !self.contains(element) {
                        warn!(%element, "array of unregistered element type");
                        return Err(failed);
                    }
                    Value::array_of(element, len)
                }
                _ => return Err(failed),
            };
            return Ok(self.arena.insert(value));
        }

        let table = self.method_table(type_id)?;
        if let Some(handle) = table.singleton() {
            return Ok(handle);
        }
        let constructor = table.constructor.as_ref().ok_or(failed.clone())?;
        let value = match panic::catch_unwind(AssertUnwindSafe(|| constructor())) {
            Ok(Ok(value)) => value,
            Ok(Err(err)) => {
                warn!(%type_id, error = %err, "constructor failed");
                return Err(failed);
            }
            Err(payload) => {
                error!(%type_id, panic = %panic_message(payload), "constructor panicked");
                return Err(failed);
            }
        };
        Ok(self.arena.insert(value))
    }

    /// Extract a scalar, widened to 64 bits.
    ///
    /// Signed values are reinterpreted at their own width, booleans read as
    /// 0 or 1 and floats as their IEEE bits.
    pub fn coerce(&self, handle: Handle, kind: ScalarKind) -> Result<u64, InteropError> {
        let value = self.arena.get(handle)?;
        let bits = match (kind, &value) {
            (ScalarKind::U8, Value::UInt8(v)) => u64::from(*v),
            (ScalarKind::U8, Value::Int8(v)) => u64::from(*v as u8),
            (ScalarKind::U8, Value::Bool(v)) => u64::from(*v),
            (ScalarKind::U16, Value::UInt16(v)) => u64::from(*v),
            (ScalarKind::U16, Value::Int16(v)) => u64::from(*v as u16),
            (ScalarKind::U16, Value::Char(v)) => u64::from(*v),
            (ScalarKind::U32, Value::UInt32(v)) => u64::from(*v),
            (ScalarKind::U32, Value::Int32(v)) => u64::from(*v as u32),
            (ScalarKind::U32, Value::Float(v)) => u64::from(v.to_bits()),
            (ScalarKind::U64, Value::UInt64(v)) => *v,
            (ScalarKind::U64, Value::Int64(v)) => *v as u64,
            (ScalarKind::U64, Value::Double(v)) => v.to_bits(),
            _ => return Err(InteropError::mismatch(kind.expected())),
        };
        Ok(bits)
    }

    /// Extract a string.
    pub fn coerce_string(&self, handle: Handle) -> Result<Arc<str>, InteropError> {
        match self.arena.get(handle)? {
            Value::String(text) => Ok(text),
            _ => Err(InteropError::mismatch(BuiltinKind::String.reflected_name())),
        }
    }

    /// Whether `handle` boxes an instance of `type_id` or of a descendant.
    pub fn is_instance(&self, handle: Handle, type_id: TypeId) -> Result<bool, InteropError> {
        let value = self.arena.get(handle)?;
        Ok(self.instance_of(&value, type_id))
    }

    pub(crate) fn instance_of(&self, value: &Value, expected: TypeId) -> bool {
        let actual = value.type_id();
        if actual == expected {
            return true;
        }
        if value.is_void() {
            return false;
        }
        expected == BuiltinKind::Object.type_id()
            || self
                .method_table(actual)
                .is_ok_and(|table| table.is_descendant_of(expected))
    }

    fn resolve(&self, handle: Handle) -> Result<Value, InteropError> {
        if handle.is_null() {
            return Ok(Value::Void);
        }
        self.arena.get(handle)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
