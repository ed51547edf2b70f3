//! Wire identities: type and method ids, and object handles

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::hash::{hash_method, hash_type_path};

/// Stable identity of a type: the hash of its rendered native path.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(u64);

impl TypeId {
    /// Wrap a raw identity, as emitted into generated code.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw wire value.
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Identity of a rendered native path.
    pub fn of_path(path: &str) -> Self {
        Self(hash_type_path(path))
    }
}

/// Stable identity of a method within a type's merged method table.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodId(u64);

impl MethodId {
    /// Wrap a raw identity, as emitted into generated code.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw wire value.
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Identity of a method from its name and reflected parameter type names.
    pub fn of_signature<I, S>(name: &str, param_paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(hash_method(name, param_paths))
    }
}

macro_rules! hex_fmt {
    ($ty:ident) => {
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:#018x})", stringify!($ty), self.0)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:#018x}", self.0)
            }
        }
    };
}

hex_fmt!(TypeId);
hex_fmt!(MethodId);

/// Opaque reference to one live value in the managed registry.
///
/// The low 32 bits are the arena slot index, the high 32 bits the slot
/// generation. Generations start at 1, so a live handle is never zero and
/// zero is reserved for [`Handle::NULL`].
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Handle(u64);

impl Handle {
    /// The null handle, returned by every failed boundary call.
    pub const NULL: Handle = Handle(0);

    /// Pack a slot index and generation.
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | index as u64)
    }

    /// Wrap a raw wire value.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw wire value.
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Arena slot index.
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Slot generation at allocation time.
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Whether this is the null handle.
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Handle(null)")
        } else {
            write!(f, "Handle({}@{})", self.index(), self.generation())
        }
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
