//! Hashbridge Runtime
//!
//! The managed side of the bridge. A host describes the interfaces it
//! exposes as [`TypeDescriptor`]s, builds one [`ObjectRegistry`] at startup
//! and installs it behind the `extern "C"` boundary. From then on the
//! native side constructs values, stages arguments and invokes methods by
//! `(TypeId, MethodId)` only.
//!
//! # Example
//!
//! ```ignore
//! use hashbridge_runtime::{ObjectRegistry, TypeDescriptor, Value};
//!
//! let config = TypeDescriptor::new("Host.Services.IConfig", "crate")
//!     .getter("ModId", "System.String", |_| Ok(Value::from("sample.mod")))
//!     .singleton(|| Ok(Value::object_of("Host.Services.IConfig", ())));
//!
//! let registry = ObjectRegistry::builder().register(config).build()?;
//! hashbridge_runtime::ffi::install(std::sync::Arc::new(registry));
//! ```

pub mod arena;
pub mod descriptor;
pub mod dispatch;
pub mod error;
pub mod ffi;
pub mod registry;
pub mod sigcache;
pub mod value;

pub use arena::HandleArena;
pub use descriptor::{ConstructorFn, MethodDescriptor, MethodFn, TypeDescriptor};
pub use dispatch::ScalarKind;
pub use error::{InvokeError, RegistryError};
pub use registry::{ManifestReport, MethodTable, ObjectRegistry, RegistryBuilder};
pub use sigcache::{ActiveSet, CacheError, CacheStatus, ModEntry, RegenerateReason, SignatureCache};
pub use value::{ArrayRef, ArrayValue, ObjectRef, Value};
