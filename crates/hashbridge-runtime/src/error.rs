//! Runtime error types

use hashbridge_abi::{MethodId, TypeId};

/// Errors raised while building the registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Two distinct types render to the same identity
    #[error("TypeId collision {type_id}: '{first}' and '{second}'")]
    TypeIdCollision {
        type_id: TypeId,
        first: String,
        second: String,
    },

    /// The same type registered twice
    #[error("Type '{0}' registered more than once")]
    DuplicateType(String),

    /// Two distinct signatures hash to the same method identity
    #[error("MethodId collision {method} on '{type_name}': '{first}' and '{second}'")]
    MethodIdCollision {
        type_name: String,
        method: MethodId,
        first: String,
        second: String,
    },

    /// A descriptor extends a type that was never registered
    #[error("Type '{type_name}' extends unregistered type {parent}")]
    UnknownParent { type_name: String, parent: TypeId },

    /// A singleton's constructor failed
    #[error("Singleton '{type_name}' failed to initialize: {source}")]
    Singleton {
        type_name: String,
        #[source]
        source: InvokeError,
    },
}

/// Failures raised by a method, constructor or argument conversion.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvokeError {
    /// Staged argument count does not match the signature
    #[error("Expected {expected} arguments, got {got}")]
    Arity { expected: usize, got: usize },

    /// Argument has the wrong runtime type
    #[error("Argument {index}: expected {expected}")]
    Argument { index: usize, expected: String },

    /// Receiver is not an instance the method can run on
    #[error("Receiver is not a {0}")]
    Receiver(String),

    /// Index outside an array's bounds
    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    /// Method returned null where its signature promises a scalar
    #[error("Null returned for value type {0}")]
    NullScalar(String),

    /// Method reported a failure
    #[error("{0}")]
    Failed(String),

    /// Method panicked
    #[error("Method panicked: {0}")]
    Panic(String),
}

impl InvokeError {
    /// Wrong argument type at `index`.
    pub fn argument(index: usize, expected: impl Into<String>) -> Self {
        InvokeError::Argument {
            index,
            expected: expected.into(),
        }
    }
}

impl From<String> for InvokeError {
    fn from(s: String) -> Self {
        InvokeError::Failed(s)
    }
}

impl From<&str> for InvokeError {
    fn from(s: &str) -> Self {
        InvokeError::Failed(s.to_string())
    }
}
