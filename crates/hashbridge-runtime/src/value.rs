//! Boxed values held by the registry
//!
//! Scalars are stored inline. Strings, arrays and host objects are
//! reference-counted, so resolving a handle clones an `Arc`, never the data.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use hashbridge_abi::{BuiltinKind, NativePath, TypeId};
use parking_lot::RwLock;

/// A value boxed behind a handle.
#[derive(Clone)]
pub enum Value {
    /// Void results and null references
    Void,
    Bool(bool),
    Int8(i8),
    UInt8(u8),
    Char(u16),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(Arc<str>),
    Array(ArrayRef),
    /// Instance of a registered host type
    Object(ObjectRef),
}

/// Shared, mutable array storage.
#[derive(Clone)]
pub struct ArrayRef(Arc<RwLock<ArrayValue>>);

/// Array contents.
#[derive(Debug, Clone)]
pub struct ArrayValue {
    /// Element type
    pub element: TypeId,
    /// Elements; unset slots hold `Value::Void`
    pub items: Vec<Value>,
}

impl ArrayRef {
    pub fn new(element: TypeId, items: Vec<Value>) -> Self {
        Self(Arc::new(RwLock::new(ArrayValue { element, items })))
    }

    pub fn element(&self) -> TypeId {
        self.0.read().element
    }

    pub fn len(&self) -> usize {
        self.0.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.read().items.get(index).cloned()
    }

    /// Replace the element at `index`; false when out of range.
    pub fn set(&self, index: usize, value: Value) -> bool {
        match self.0.write().items.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.0.read().items.clone()
    }
}

/// Instance of a registered host type: identity plus opaque state.
#[derive(Clone)]
pub struct ObjectRef {
    type_id: TypeId,
    inner: Arc<dyn Any + Send + Sync>,
}

impl ObjectRef {
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Whether both refer to the same instance.
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Value {
    /// Box host state as an instance of `type_id`.
    pub fn object<T: Any + Send + Sync>(type_id: TypeId, state: T) -> Self {
        Value::Object(ObjectRef {
            type_id,
            inner: Arc::new(state),
        })
    }

    /// Box host state as an instance of the type with reflected name
    /// `reflected_name` rendered under the `crate` root.
    pub fn object_of<T: Any + Send + Sync>(reflected_name: &str, state: T) -> Self {
        Value::object_in("crate", reflected_name, state)
    }

    /// Like [`Value::object_of`] for bindings mounted under `root`
    /// (`crate::bindings`).
    pub fn object_in<T: Any + Send + Sync>(root: &str, reflected_name: &str, state: T) -> Self {
        let type_id = NativePath::from_dotted(reflected_name, root, Vec::new()).type_id();
        Value::object(type_id, state)
    }

    /// Array of `len` default elements of `element`.
    pub fn array_of(element: TypeId, len: usize) -> Self {
        let fill = BuiltinKind::from_type_id(element)
            .map(Value::default_of)
            .unwrap_or(Value::Void);
        Value::Array(ArrayRef::new(element, vec![fill; len]))
    }

    /// Default value of a built-in: zero for scalars, void otherwise.
    pub fn default_of(kind: BuiltinKind) -> Value {
        match kind {
            BuiltinKind::Bool => Value::Bool(false),
            BuiltinKind::Int8 => Value::Int8(0),
            BuiltinKind::UInt8 => Value::UInt8(0),
            BuiltinKind::Char => Value::Char(0),
            BuiltinKind::Int16 => Value::Int16(0),
            BuiltinKind::UInt16 => Value::UInt16(0),
            BuiltinKind::Int32 => Value::Int32(0),
            BuiltinKind::UInt32 => Value::UInt32(0),
            BuiltinKind::Int64 => Value::Int64(0),
            BuiltinKind::UInt64 => Value::UInt64(0),
            BuiltinKind::Float => Value::Float(0.0),
            BuiltinKind::Double => Value::Double(0.0),
            BuiltinKind::Void
            | BuiltinKind::Object
            | BuiltinKind::String
            | BuiltinKind::Array => Value::Void,
        }
    }

    /// Decode little-endian scalar payload bytes.
    pub fn from_scalar(kind: BuiltinKind, bytes: &[u8]) -> Option<Value> {
        fn take<const N: usize>(bytes: &[u8]) -> Option<[u8; N]> {
            bytes.get(..N)?.try_into().ok()
        }
        Some(match kind {
            BuiltinKind::Bool => Value::Bool(take::<1>(bytes)?[0] != 0),
            BuiltinKind::Int8 => Value::Int8(i8::from_le_bytes(take(bytes)?)),
            BuiltinKind::UInt8 => Value::UInt8(take::<1>(bytes)?[0]),
            BuiltinKind::Char => Value::Char(u16::from_le_bytes(take(bytes)?)),
            BuiltinKind::Int16 => Value::Int16(i16::from_le_bytes(take(bytes)?)),
            BuiltinKind::UInt16 => Value::UInt16(u16::from_le_bytes(take(bytes)?)),
            BuiltinKind::Int32 => Value::Int32(i32::from_le_bytes(take(bytes)?)),
            BuiltinKind::UInt32 => Value::UInt32(u32::from_le_bytes(take(bytes)?)),
            BuiltinKind::Int64 => Value::Int64(i64::from_le_bytes(take(bytes)?)),
            BuiltinKind::UInt64 => Value::UInt64(u64::from_le_bytes(take(bytes)?)),
            BuiltinKind::Float => Value::Float(f32::from_le_bytes(take(bytes)?)),
            BuiltinKind::Double => Value::Double(f64::from_le_bytes(take(bytes)?)),
            BuiltinKind::Void
            | BuiltinKind::Object
            | BuiltinKind::String
            | BuiltinKind::Array => return None,
        })
    }

    /// Built-in kind of this value, if any.
    pub fn kind(&self) -> Option<BuiltinKind> {
        Some(match self {
            Value::Void => BuiltinKind::Void,
            Value::Bool(_) => BuiltinKind::Bool,
            Value::Int8(_) => BuiltinKind::Int8,
            Value::UInt8(_) => BuiltinKind::UInt8,
            Value::Char(_) => BuiltinKind::Char,
            Value::Int16(_) => BuiltinKind::Int16,
            Value::UInt16(_) => BuiltinKind::UInt16,
            Value::Int32(_) => BuiltinKind::Int32,
            Value::UInt32(_) => BuiltinKind::UInt32,
            Value::Int64(_) => BuiltinKind::Int64,
            Value::UInt64(_) => BuiltinKind::UInt64,
            Value::Float(_) => BuiltinKind::Float,
            Value::Double(_) => BuiltinKind::Double,
            Value::String(_) => BuiltinKind::String,
            Value::Array(_) => BuiltinKind::Array,
            Value::Object(_) => return None,
        })
    }

    /// Runtime identity of the boxed value.
    pub fn type_id(&self) -> TypeId {
        match self {
            Value::Object(object) => object.type_id(),
            other => other
                .kind()
                .map(BuiltinKind::type_id)
                .unwrap_or_else(|| BuiltinKind::Object.type_id()),
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(value) => Some(*value),
            Value::Int32(value) => Some(i64::from(*value)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(value) => Some(*value),
            Value::Float(value) => Some(f64::from(*value)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value.as_ref()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Host state of an object value.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_object()?.downcast_ref::<T>()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "Void"),
            Value::Bool(v) => write!(f, "Bool({})", v),
            Value::Int8(v) => write!(f, "Int8({})", v),
            Value::UInt8(v) => write!(f, "UInt8({})", v),
            Value::Char(v) => write!(f, "Char({:#06x})", v),
            Value::Int16(v) => write!(f, "Int16({})", v),
            Value::UInt16(v) => write!(f, "UInt16({})", v),
            Value::Int32(v) => write!(f, "Int32({})", v),
            Value::UInt32(v) => write!(f, "UInt32({})", v),
            Value::Int64(v) => write!(f, "Int64({})", v),
            Value::UInt64(v) => write!(f, "UInt64({})", v),
            Value::Float(v) => write!(f, "Float({})", v),
            Value::Double(v) => write!(f, "Double({})", v),
            Value::String(v) => write!(f, "String({:?})", v),
            Value::Array(array) => write!(f, "Array({}, len={})", array.element(), array.len()),
            Value::Object(object) => write!(f, "Object({})", object.type_id()),
        }
    }
}

macro_rules! value_from {
    ($($prim:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$prim> for Value {
                fn from(value: $prim) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float,
    f64 => Double,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(Arc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(Arc::from(value))
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Void
    }
}
