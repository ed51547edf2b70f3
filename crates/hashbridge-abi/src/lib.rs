//! Hashbridge ABI - the wire contract shared by both sides of the bridge
//!
//! A managed host and a native library agree on nothing but 64-bit
//! identities. This crate owns those identities and everything that has to
//! be bit-for-bit identical on both sides:
//!
//! - identity hashing of type paths and method signatures ([`hash`])
//! - native path rendering, the input of every [`TypeId`] ([`path`])
//! - handles and ids ([`ids`])
//! - the `ObjectInitializer` construction record ([`init`])
//! - the built-in type table ([`builtin`])
//! - the descriptor manifest exchanged between generator and registry ([`manifest`])
//!
//! It also carries the native-side client: the installed boundary table
//! ([`boundary`]), the wrapper traits ([`traits`]) and the `system` wrappers
//! generated bindings are written against ([`system`]).
//!
//! # Example
//!
//! ```ignore
//! use hashbridge_abi::system::Int32;
//! use hashbridge_abi::{ObjectInitializable, ObjectValuable};
//!
//! let value = Int32::new(42)?;
//! assert_eq!(value.value()?, 42);
//! ```

#![warn(missing_docs)]

pub mod boundary;
pub mod builtin;
pub mod error;
pub mod hash;
pub mod ids;
pub mod init;
pub mod manifest;
pub mod path;
pub mod system;
pub mod traits;

pub use builtin::{BuiltinKind, RUNTIME_NAMESPACE};
pub use error::{ErrorCode, InteropError, InteropResult};
pub use hash::{hash_bytes, hash_method, hash_str, hash_type_path};
pub use ids::{Handle, MethodId, TypeId};
pub use init::{ArrayData, InitPayload, ObjectInit, ObjectInitializer, StringData};
pub use manifest::{DescriptorManifest, MethodManifest, TypeManifest};
pub use path::NativePath;
pub use traits::{FromObject, ObjectHash, ObjectInitializable, ObjectValuable};
