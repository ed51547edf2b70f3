//! Built-in types provided by the runtime itself
//!
//! Built-ins are never generated. Their paths live under
//! `hashbridge_abi::system`, named after the reflected short name
//! (`SByte`, `Boolean`, `Single`), and both sides compute their ids from
//! that rendering.

use once_cell::sync::Lazy;

use crate::ids::{MethodId, TypeId};
use crate::path::NativePath;

/// Root namespace of every built-in path.
pub const RUNTIME_NAMESPACE: &str = "hashbridge_abi";

/// A type the runtime constructs and coerces without a registered descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinKind {
    /// Marker for void results.
    Void,
    /// The universal base type.
    Object,
    /// `System.Boolean`
    Bool,
    /// `System.SByte`
    Int8,
    /// `System.Byte`
    UInt8,
    /// `System.Char`, a UTF-16 code unit
    Char,
    /// `System.Int16`
    Int16,
    /// `System.UInt16`
    UInt16,
    /// `System.Int32`
    Int32,
    /// `System.UInt32`
    UInt32,
    /// `System.Int64`
    Int64,
    /// `System.UInt64`
    UInt64,
    /// `System.Single`
    Float,
    /// `System.Double`
    Double,
    /// `System.String`
    String,
    /// `System.Array`
    Array,
}

impl BuiltinKind {
    /// Every built-in, in declaration order.
    pub const ALL: [BuiltinKind; 16] = [
        BuiltinKind::Void,
        BuiltinKind::Object,
        BuiltinKind::Bool,
        BuiltinKind::Int8,
        BuiltinKind::UInt8,
        BuiltinKind::Char,
        BuiltinKind::Int16,
        BuiltinKind::UInt16,
        BuiltinKind::Int32,
        BuiltinKind::UInt32,
        BuiltinKind::Int64,
        BuiltinKind::UInt64,
        BuiltinKind::Float,
        BuiltinKind::Double,
        BuiltinKind::String,
        BuiltinKind::Array,
    ];

    /// Short reflected name, also the final segment of the native path.
    pub fn reflected_short_name(self) -> &'static str {
        match self {
            BuiltinKind::Void => "Void",
            BuiltinKind::Object => "Object",
            BuiltinKind::Bool => "Boolean",
            BuiltinKind::Int8 => "SByte",
            BuiltinKind::UInt8 => "Byte",
            BuiltinKind::Char => "Char",
            BuiltinKind::Int16 => "Int16",
            BuiltinKind::UInt16 => "UInt16",
            BuiltinKind::Int32 => "Int32",
            BuiltinKind::UInt32 => "UInt32",
            BuiltinKind::Int64 => "Int64",
            BuiltinKind::UInt64 => "UInt64",
            BuiltinKind::Float => "Single",
            BuiltinKind::Double => "Double",
            BuiltinKind::String => "String",
            BuiltinKind::Array => "Array",
        }
    }

    /// Fully-qualified reflected name (`System.Int32`).
    pub fn reflected_name(self) -> String {
        format!("System.{}", self.reflected_short_name())
    }

    /// Look up a built-in by its reflected full name.
    pub fn from_reflected(full_name: &str) -> Option<Self> {
        let short = full_name.strip_prefix("System.")?;
        Self::ALL
            .into_iter()
            .find(|kind| kind.reflected_short_name() == short)
    }

    /// Look up a built-in by identity.
    pub fn from_type_id(type_id: TypeId) -> Option<Self> {
        TYPE_IDS
            .iter()
            .position(|id| *id == type_id)
            .map(|index| Self::ALL[index])
    }

    /// Native path under the runtime namespace.
    pub fn native_path(self) -> NativePath {
        NativePath::runtime(self.reflected_short_name())
    }

    /// Identity of this built-in.
    pub fn type_id(self) -> TypeId {
        TYPE_IDS[self as usize]
    }

    /// Width of the scalar payload, for scalar kinds.
    pub fn scalar_size(self) -> Option<usize> {
        match self {
            BuiltinKind::Bool | BuiltinKind::Int8 | BuiltinKind::UInt8 => Some(1),
            BuiltinKind::Char | BuiltinKind::Int16 | BuiltinKind::UInt16 => Some(2),
            BuiltinKind::Int32 | BuiltinKind::UInt32 | BuiltinKind::Float => Some(4),
            BuiltinKind::Int64 | BuiltinKind::UInt64 | BuiltinKind::Double => Some(8),
            BuiltinKind::Void | BuiltinKind::Object | BuiltinKind::String | BuiltinKind::Array => {
                None
            }
        }
    }

    /// Whether values of this kind are constructed from scalar payload bytes.
    pub fn is_scalar(self) -> bool {
        self.scalar_size().is_some()
    }
}

static TYPE_IDS: Lazy<[TypeId; 16]> =
    Lazy::new(|| BuiltinKind::ALL.map(|kind| kind.native_path().type_id()));

/// `System.Array.GetValue(System.Int32)`
pub static ARRAY_GET_VALUE: Lazy<MethodId> =
    Lazy::new(|| MethodId::of_signature("GetValue", ["System.Int32"]));

/// `System.Array.SetValue(System.Object, System.Int32)`
pub static ARRAY_SET_VALUE: Lazy<MethodId> =
    Lazy::new(|| MethodId::of_signature("SetValue", ["System.Object", "System.Int32"]));

/// `System.Array.get_Length()`
pub static ARRAY_GET_LENGTH: Lazy<MethodId> =
    Lazy::new(|| MethodId::of_signature("get_Length", [] as [&str; 0]));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflected_lookup() {
        assert_eq!(BuiltinKind::from_reflected("System.Int32"), Some(BuiltinKind::Int32));
        assert_eq!(BuiltinKind::from_reflected("System.Single"), Some(BuiltinKind::Float));
        assert_eq!(BuiltinKind::from_reflected("System.Guid"), None);
        assert_eq!(BuiltinKind::from_reflected("Int32"), None);
    }

    #[test]
    fn test_type_ids_are_distinct() {
        for kind in BuiltinKind::ALL {
            assert_eq!(BuiltinKind::from_type_id(kind.type_id()), Some(kind));
        }
    }

    #[test]
    fn test_paths_use_reflected_names() {
        assert_eq!(BuiltinKind::Int8.native_path().render(), "hashbridge_abi::system::SByte");
        assert_eq!(
            BuiltinKind::Int32.type_id(),
            TypeId::of_path("hashbridge_abi::system::Int32")
        );
    }

    #[test]
    fn test_array_method_ids() {
        assert_eq!(ARRAY_GET_VALUE.raw(), 0x40fb3729a671e7f4);
        assert_eq!(ARRAY_GET_LENGTH.raw(), 0x45eb5d69f4b05f30);
    }
}
