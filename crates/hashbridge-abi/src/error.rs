//! Error types for the hashbridge ABI

use crate::ids::{Handle, MethodId, TypeId};

/// Result type for boundary calls
pub type InteropResult<T> = Result<T, InteropError>;

/// Failure code recorded by the managed side for the last boundary call on
/// the current thread.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorCode {
    /// No failure recorded
    #[default]
    None = 0,
    /// TypeId absent from the registry
    UnknownType = 1,
    /// MethodId absent under a known TypeId
    UnknownMethod = 2,
    /// Registry could not materialize an instance
    ConstructionFailed = 3,
    /// Boxed value does not match the requested kind
    CoercionMismatch = 4,
    /// Invoked method failed
    InvocationFault = 5,
    /// Handle refers to a freed slot
    StaleHandle = 6,
    /// Null handle passed where a value was required
    NullHandle = 7,
    /// No registry installed behind the boundary
    NotInstalled = 8,
}

impl ErrorCode {
    /// Decode a raw code read across the boundary.
    pub fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => ErrorCode::None,
            1 => ErrorCode::UnknownType,
            2 => ErrorCode::UnknownMethod,
            3 => ErrorCode::ConstructionFailed,
            4 => ErrorCode::CoercionMismatch,
            5 => ErrorCode::InvocationFault,
            6 => ErrorCode::StaleHandle,
            7 => ErrorCode::NullHandle,
            8 => ErrorCode::NotInstalled,
            _ => return None,
        })
    }

    /// Raw wire value.
    pub fn raw(self) -> u32 {
        self as u32
    }
}

/// Interop error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InteropError {
    /// TypeId absent from the registry
    #[error("Unknown type {0}")]
    UnknownType(TypeId),

    /// MethodId absent under a known TypeId
    #[error("Unknown method {method} on type {type_id}")]
    UnknownMethod {
        /// Receiver type
        type_id: TypeId,
        /// Requested method
        method: MethodId,
    },

    /// Registry could not materialize an instance
    #[error("Could not construct an instance of {0}")]
    ConstructionFailed(TypeId),

    /// Boxed value does not match the requested kind
    #[error("Coercion mismatch: expected {expected}")]
    CoercionMismatch {
        /// Requested kind or type
        expected: String,
    },

    /// Invoked method failed on the managed side
    #[error("Invocation of {method} on {type_id} failed: {message}")]
    InvocationFault {
        /// Receiver type
        type_id: TypeId,
        /// Invoked method
        method: MethodId,
        /// Failure description, when one crossed the boundary
        message: String,
    },

    /// Handle refers to a freed or never-allocated slot
    #[error("Stale handle {0}")]
    StaleHandle(Handle),

    /// Null handle passed where a value was required
    #[error("Null handle")]
    NullHandle,

    /// No boundary table, or no registry behind it, installed in this process
    #[error("Boundary not installed")]
    BoundaryNotInstalled,

    /// Failure code this client does not understand
    #[error("Unknown failure code {0}")]
    Unknown(u32),
}

impl InteropError {
    /// Code recorded for this error across the boundary.
    pub fn code(&self) -> ErrorCode {
        match self {
            InteropError::UnknownType(_) => ErrorCode::UnknownType,
            InteropError::UnknownMethod { .. } => ErrorCode::UnknownMethod,
            InteropError::ConstructionFailed(_) => ErrorCode::ConstructionFailed,
            InteropError::CoercionMismatch { .. } => ErrorCode::CoercionMismatch,
            InteropError::InvocationFault { .. } | InteropError::Unknown(_) => {
                ErrorCode::InvocationFault
            }
            InteropError::StaleHandle(_) => ErrorCode::StaleHandle,
            InteropError::NullHandle => ErrorCode::NullHandle,
            InteropError::BoundaryNotInstalled => ErrorCode::NotInstalled,
        }
    }

    /// Coercion failure for a requested kind.
    pub fn mismatch(expected: impl Into<String>) -> Self {
        InteropError::CoercionMismatch {
            expected: expected.into(),
        }
    }

    /// Rebuild an error from a recorded code and the context of the call
    /// that failed.
    pub fn from_code(raw: u32, type_id: TypeId, method: MethodId, handle: Handle) -> Self {
        match ErrorCode::from_raw(raw) {
            Some(ErrorCode::UnknownType) => InteropError::UnknownType(type_id),
            Some(ErrorCode::UnknownMethod) => InteropError::UnknownMethod { type_id, method },
            Some(ErrorCode::ConstructionFailed) => InteropError::ConstructionFailed(type_id),
            Some(ErrorCode::CoercionMismatch) => InteropError::mismatch(type_id.to_string()),
            Some(ErrorCode::InvocationFault) | Some(ErrorCode::None) => {
                InteropError::InvocationFault {
                    type_id,
                    method,
                    message: String::new(),
                }
            }
            Some(ErrorCode::StaleHandle) => InteropError::StaleHandle(handle),
            Some(ErrorCode::NullHandle) => InteropError::NullHandle,
            Some(ErrorCode::NotInstalled) => InteropError::BoundaryNotInstalled,
            None => InteropError::Unknown(raw),
        }
    }
}
