//! Object registry
//!
//! One [`ObjectRegistry`] owns every method table and the handle arena.
//! It is assembled once from [`TypeDescriptor`]s before any boundary call
//! is possible and is read-only afterwards, apart from the per-method
//! staging buffers and the arena.

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use hashbridge_abi::builtin::{ARRAY_GET_LENGTH, ARRAY_GET_VALUE, ARRAY_SET_VALUE};
use hashbridge_abi::{BuiltinKind, DescriptorManifest, Handle, InteropError, MethodId, TypeId};

use crate::arena::HandleArena;
use crate::descriptor::{ConstructorFn, MethodDescriptor, TypeDescriptor};
use crate::error::{InvokeError, RegistryError};
use crate::value::Value;

/// A method plus the arguments staged for its next call.
pub(crate) struct MethodSlot {
    pub(crate) descriptor: MethodDescriptor,
    pub(crate) staged: Mutex<Vec<Handle>>,
}

/// Everything callable on one type.
pub struct MethodTable {
    type_id: TypeId,
    reflected_name: String,
    path: String,
    parents: Vec<TypeId>,
    ancestors: FxHashSet<TypeId>,
    methods: FxHashMap<MethodId, MethodSlot>,
    pub(crate) constructor: Option<ConstructorFn>,
    pub(crate) singleton: Option<Handle>,
}

impl MethodTable {
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn reflected_name(&self) -> &str {
        &self.reflected_name
    }

    /// Rendered native path the identity was computed from.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Direct parents.
    pub fn parents(&self) -> &[TypeId] {
        &self.parents
    }

    /// Whether `type_id` is a direct or transitive parent of this type.
    pub fn is_descendant_of(&self, type_id: TypeId) -> bool {
        self.ancestors.contains(&type_id)
    }

    pub fn method(&self, method: MethodId) -> Option<&MethodDescriptor> {
        self.methods.get(&method).map(|slot| &slot.descriptor)
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.methods.values().map(|slot| &slot.descriptor)
    }

    /// Handle of the shared instance, for singleton types.
    pub fn singleton(&self) -> Option<Handle> {
        self.singleton
    }

    /// Whether `construct` can produce an instance.
    pub fn is_constructible(&self) -> bool {
        self.singleton.is_some() || self.constructor.is_some()
    }

    pub(crate) fn slot(&self, method: MethodId) -> Result<&MethodSlot, InteropError> {
        self.methods.get(&method).ok_or(InteropError::UnknownMethod {
            type_id: self.type_id,
            method,
        })
    }
}

/// Assembles an [`ObjectRegistry`].
pub struct RegistryBuilder {
    descriptors: Vec<TypeDescriptor>,
}

impl RegistryBuilder {
    /// Builder pre-populated with every runtime built-in.
    pub fn new() -> Self {
        Self {
            descriptors: BuiltinKind::ALL.into_iter().map(builtin_descriptor).collect(),
        }
    }

    /// Add one host type.
    pub fn register(mut self, descriptor: TypeDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Add several host types.
    pub fn register_all(mut self, descriptors: impl IntoIterator<Item = TypeDescriptor>) -> Self {
        self.descriptors.extend(descriptors);
        self
    }

    /// Validate the descriptors, build the tables and create singletons.
    pub fn build(self) -> Result<ObjectRegistry, RegistryError> {
        let mut tables: FxHashMap<TypeId, MethodTable> = FxHashMap::default();
        let mut singletons: Vec<(TypeId, ConstructorFn)> = Vec::new();

        for mut descriptor in self.descriptors {
            if let Some(existing) = tables.get(&descriptor.type_id()) {
                if existing.reflected_name == descriptor.reflected_name() {
                    return Err(RegistryError::DuplicateType(existing.reflected_name.clone()));
                }
                return Err(RegistryError::TypeIdCollision {
                    type_id: descriptor.type_id(),
                    first: existing.reflected_name.clone(),
                    second: descriptor.reflected_name().to_string(),
                });
            }
            if let Some((method, first, second)) = descriptor.conflicts.first() {
                return Err(RegistryError::MethodIdCollision {
                    type_name: descriptor.reflected_name().to_string(),
                    method: *method,
                    first: first.clone(),
                    second: second.clone(),
                });
            }

            let mut constructor = descriptor.take_constructor();
            if descriptor.is_singleton() {
                if let Some(factory) = constructor.take() {
                    singletons.push((descriptor.type_id(), factory));
                }
            }
            let methods = descriptor
                .methods()
                .iter()
                .map(|method| {
                    let slot = MethodSlot {
                        descriptor: method.clone(),
                        staged: Mutex::new(Vec::new()),
                    };
                    (method.id(), slot)
                })
                .collect();

            tables.insert(
                descriptor.type_id(),
                MethodTable {
                    type_id: descriptor.type_id(),
                    reflected_name: descriptor.reflected_name().to_string(),
                    path: descriptor.path().to_string(),
                    parents: descriptor.parents().to_vec(),
                    ancestors: FxHashSet::default(),
                    methods,
                    constructor,
                    singleton: None,
                },
            );
        }

        for table in tables.values() {
            if let Some(parent) = table.parents.iter().find(|p| !tables.contains_key(p)) {
                return Err(RegistryError::UnknownParent {
                    type_name: table.reflected_name.clone(),
                    parent: *parent,
                });
            }
        }

        let closures: Vec<(TypeId, FxHashSet<TypeId>)> = tables
            .keys()
            .map(|type_id| (*type_id, ancestor_closure(&tables, *type_id)))
            .collect();
        for (type_id, ancestors) in closures {
            if let Some(table) = tables.get_mut(&type_id) {
                table.ancestors = ancestors;
            }
        }

        let arena = HandleArena::new();
        for (type_id, factory) in singletons {
            let Some(table) = tables.get_mut(&type_id) else {
                continue;
            };
            let value = factory().map_err(|source| RegistryError::Singleton {
                type_name: table.reflected_name.clone(),
                source,
            })?;
            let handle = arena.insert_pinned(value);
            debug!(type_name = %table.reflected_name, %handle, "singleton created");
            table.singleton = Some(handle);
        }

        debug!(types = tables.len(), "registry built");
        Ok(ObjectRegistry { tables, arena })
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn ancestor_closure(tables: &FxHashMap<TypeId, MethodTable>, type_id: TypeId) -> FxHashSet<TypeId> {
    let mut seen = FxHashSet::default();
    let mut stack: Vec<TypeId> = tables
        .get(&type_id)
        .map(|table| table.parents.clone())
        .unwrap_or_default();
    while let Some(next) = stack.pop() {
        if next == type_id || !seen.insert(next) {
            continue;
        }
        if let Some(table) = tables.get(&next) {
            stack.extend(table.parents.iter().copied());
        }
    }
    seen
}

// ============================================================================
// Built-ins
// ============================================================================

fn builtin_descriptor(kind: BuiltinKind) -> TypeDescriptor {
    let descriptor = TypeDescriptor::builtin(kind);
    if kind != BuiltinKind::Array {
        return descriptor;
    }
    descriptor
        .method("GetValue", &["System.Int32"], "System.Object", |receiver, args| {
            let array = array_receiver(receiver)?;
            let index = array_index(&args[0], 0, array.len())?;
            Ok(array.get(index).unwrap_or(Value::Void))
        })
        .method(
            "SetValue",
            &["System.Object", "System.Int32"],
            "System.Void",
            |receiver, args| {
                let array = array_receiver(receiver)?;
                let index = array_index(&args[1], 1, array.len())?;
                let element = array.element();
                let typed = BuiltinKind::from_type_id(element)
                    .filter(|kind| kind.is_scalar() || *kind == BuiltinKind::String);
                if let Some(kind) = typed {
                    if args[0].type_id() != element {
                        return Err(InvokeError::argument(0, kind.reflected_name()));
                    }
                }
                array.set(index, args[0].clone());
                Ok(Value::Void)
            },
        )
        .getter("Length", "System.Int32", |receiver| {
            let len = array_receiver(receiver)?.len();
            i32::try_from(len)
                .map(Value::from)
                .map_err(|_| InvokeError::from("array length exceeds System.Int32"))
        })
}

fn array_receiver(receiver: &Value) -> Result<&crate::value::ArrayRef, InvokeError> {
    receiver
        .as_array()
        .ok_or_else(|| InvokeError::Receiver(BuiltinKind::Array.reflected_name()))
}

fn array_index(arg: &Value, position: usize, len: usize) -> Result<usize, InvokeError> {
    let index = arg
        .as_i32()
        .ok_or_else(|| InvokeError::argument(position, "System.Int32"))?;
    usize::try_from(index)
        .ok()
        .filter(|index| *index < len)
        .ok_or(InvokeError::IndexOutOfRange {
            index: i64::from(index),
            len,
        })
}

// ============================================================================
// Registry
// ============================================================================

/// Process-wide type and handle tables.
pub struct ObjectRegistry {
    tables: FxHashMap<TypeId, MethodTable>,
    pub(crate) arena: HandleArena,
}

/// Differences between a generated manifest and a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestReport {
    /// Bound types with no registered descriptor
    pub missing_types: Vec<String>,
    /// Bound methods absent from a registered type, as `Type::Signature`
    pub missing_methods: Vec<String>,
    /// Types bound as services but registered without a singleton, or the reverse
    pub service_mismatches: Vec<String>,
}

impl ManifestReport {
    /// Whether every bound call has a registered target.
    pub fn is_clean(&self) -> bool {
        self.missing_types.is_empty()
            && self.missing_methods.is_empty()
            && self.service_mismatches.is_empty()
    }
}

impl ObjectRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Method table of a registered type.
    pub fn method_table(&self, type_id: TypeId) -> Result<&MethodTable, InteropError> {
        self.tables.get(&type_id).ok_or(InteropError::UnknownType(type_id))
    }

    pub fn contains(&self, type_id: TypeId) -> bool {
        self.tables.contains_key(&type_id)
    }

    pub fn types(&self) -> impl Iterator<Item = &MethodTable> {
        self.tables.values()
    }

    pub fn handles(&self) -> &HandleArena {
        &self.arena
    }

    /// Compare the bindings a generator emitted against what is registered.
    pub fn check_manifest(&self, manifest: &DescriptorManifest) -> ManifestReport {
        let mut report = ManifestReport::default();
        for bound in &manifest.types {
            let Some(table) = self.tables.get(&bound.type_id) else {
                report.missing_types.push(bound.reflected_name.clone());
                continue;
            };
            if bound.service != table.singleton.is_some() {
                report.service_mismatches.push(bound.reflected_name.clone());
            }
            for method in &bound.methods {
                if !table.methods.contains_key(&method.method_id) {
                    report.missing_methods.push(format!(
                        "{}::{}({})",
                        bound.reflected_name,
                        method.name,
                        method.parameters.join(", ")
                    ));
                }
            }
        }
        report
    }
}

impl std::fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectRegistry")
            .field("types", &self.tables.len())
            .field("live_handles", &self.arena.live())
            .finish()
    }
}
