//! Type Graph Builder
//!
//! Walks the reflected metadata starting from every candidate interface and
//! produces one [`BindingEntry`] per bindable type:
//!
//! - properties become ordinary `get_X` / `set_X` methods
//! - methods with by-reference parameters, anonymous types or generic
//!   instances are rejected and recorded as [`Exclusion`]s
//! - every type named in an accepted signature is visited too, except
//!   built-ins, which resolve to the fixed runtime namespace
//! - an interface's method list is merged with its ancestors' by
//!   [`MethodId`], the most-derived declaration winning
//!
//! Identities are checked as entries are created: two reflected names that
//! hash to the same [`TypeId`] abort the build.

use std::collections::VecDeque;
use std::fmt;

use hashbridge_abi::{
    BuiltinKind, DescriptorManifest, MethodId, MethodManifest, NativePath, TypeId, TypeManifest,
};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::config::BindgenConfig;
use crate::error::GraphError;
use crate::metadata::{AssemblyMetadata, Metadata, ParameterMetadata, TypeMetadata, TypeRef};

// ---------------------------------------------------------------------------
// Graph model
// ---------------------------------------------------------------------------

/// Candidate selection and naming options.
#[derive(Debug, Clone)]
pub struct GraphOptions {
    pub crate_root: String,
    pub exclude_namespaces: Vec<String>,
    pub exclude_assemblies: Vec<String>,
    pub services: Vec<String>,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            crate_root: "crate".to_string(),
            exclude_namespaces: Vec::new(),
            exclude_assemblies: Vec::new(),
            services: Vec::new(),
        }
    }
}

impl From<&BindgenConfig> for GraphOptions {
    fn from(config: &BindgenConfig) -> Self {
        Self {
            crate_root: config.crate_root.clone(),
            exclude_namespaces: config.exclude_namespaces.clone(),
            exclude_assemblies: config.exclude_assemblies.clone(),
            services: config.services.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// An interface with a method list
    Interface,
    /// A type reachable from a signature that has no bindable members
    Opaque,
}

/// A resolved reference to a type from a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeBinding {
    /// Reflected full name; the MethodId hash input
    pub reflected_name: String,
    pub path: NativePath,
}

impl TypeBinding {
    fn builtin(kind: BuiltinKind) -> Self {
        Self {
            reflected_name: kind.reflected_name(),
            path: kind.native_path(),
        }
    }

    pub fn is_void(&self) -> bool {
        self.path == BuiltinKind::Void.native_path()
    }

    /// Whether values of this type can be null: everything but the
    /// built-in scalars.
    pub fn is_nullable(&self) -> bool {
        !self.is_void()
            && !BuiltinKind::from_reflected(&self.reflected_name).is_some_and(BuiltinKind::is_scalar)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterBinding {
    pub name: Option<String>,
    pub ty: TypeBinding,
}

/// One method of a binding entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodBinding {
    pub method_id: MethodId,
    pub name: String,
    /// Interface that declared this method
    pub declaring: TypeId,
    pub parameters: Vec<ParameterBinding>,
    pub returns: TypeBinding,
}

impl MethodBinding {
    /// `Name(System.Int32, System.String)`
    pub fn signature(&self) -> String {
        let params: Vec<&str> = self
            .parameters
            .iter()
            .map(|param| param.ty.reflected_name.as_str())
            .collect();
        format!("{}({})", self.name, params.join(", "))
    }

    fn same_signature(&self, other: &MethodBinding) -> bool {
        self.name == other.name
            && self.parameters.len() == other.parameters.len()
            && self
                .parameters
                .iter()
                .zip(&other.parameters)
                .all(|(a, b)| a.ty.reflected_name == b.ty.reflected_name)
    }
}

/// The generated description of one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingEntry {
    pub type_id: TypeId,
    pub reflected_name: String,
    pub path: NativePath,
    pub kind: EntryKind,
    /// Host provides exactly one shared instance
    pub service: bool,
    /// Directly extended interfaces
    pub extends: Vec<TypeId>,
    /// Merged method list: own declarations first, then ancestors
    pub methods: Vec<MethodBinding>,
}

/// Why a member was left out of the bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionReason {
    /// Parameter passed by reference (in/out/ref)
    ByRefParameter(String),
    /// Signature names a type reflection could not name
    AnonymousType(String),
    /// Signature names a generic instance or open generic
    GenericType(String),
    /// Signature names a type with no usable full name
    UnresolvedType(String),
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::ByRefParameter(param) => {
                write!(f, "parameter '{}' is passed by reference", param)
            }
            ExclusionReason::AnonymousType(ty) => write!(f, "anonymous type {}", ty),
            ExclusionReason::GenericType(ty) => write!(f, "generic type {}", ty),
            ExclusionReason::UnresolvedType(ty) => write!(f, "unresolved type {}", ty),
        }
    }
}

/// A rejected member, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    /// Reflected name of the type that declared the member
    pub type_name: String,
    pub member: String,
    pub reason: ExclusionReason,
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}: {}", self.type_name, self.member, self.reason)
    }
}

/// All binding entries, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct TypeGraph {
    entries: Vec<BindingEntry>,
    index: FxHashMap<TypeId, usize>,
    exclusions: Vec<Exclusion>,
}

impl TypeGraph {
    pub fn entries(&self) -> &[BindingEntry] {
        &self.entries
    }

    pub fn get(&self, type_id: TypeId) -> Option<&BindingEntry> {
        self.index.get(&type_id).map(|&index| &self.entries[index])
    }

    pub fn find(&self, reflected_name: &str) -> Option<&BindingEntry> {
        self.entries
            .iter()
            .find(|entry| entry.reflected_name == reflected_name)
    }

    pub fn exclusions(&self) -> &[Exclusion] {
        &self.exclusions
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Export the identities the emitted bindings dispatch to.
    pub fn manifest(&self) -> DescriptorManifest {
        let types = self
            .entries
            .iter()
            .map(|entry| TypeManifest {
                type_id: entry.type_id,
                path: entry.path.render(),
                reflected_name: entry.reflected_name.clone(),
                service: entry.service,
                methods: entry
                    .methods
                    .iter()
                    .map(|method| MethodManifest {
                        method_id: method.method_id,
                        name: method.name.clone(),
                        parameters: method
                            .parameters
                            .iter()
                            .map(|param| param.ty.reflected_name.clone())
                            .collect(),
                        returns: method.returns.reflected_name.clone(),
                    })
                    .collect(),
            })
            .collect();
        DescriptorManifest { types }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builds a [`TypeGraph`] from reflected metadata.
pub struct GraphBuilder<'a> {
    options: GraphOptions,
    known: FxHashMap<&'a str, (&'a AssemblyMetadata, &'a TypeMetadata)>,
    entries: Vec<BindingEntry>,
    index: FxHashMap<TypeId, usize>,
    by_name: FxHashMap<String, TypeId>,
    declared: FxHashMap<TypeId, Vec<MethodBinding>>,
    queue: VecDeque<String>,
    exclusions: Vec<Exclusion>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(metadata: &'a Metadata, options: GraphOptions) -> Self {
        let mut known = FxHashMap::default();
        for (assembly, ty) in metadata.types() {
            if let Some(name) = ty.full_name.as_deref() {
                known.entry(name).or_insert((assembly, ty));
            }
        }

        let mut builder = Self {
            options,
            known,
            entries: Vec::new(),
            index: FxHashMap::default(),
            by_name: FxHashMap::default(),
            declared: FxHashMap::default(),
            queue: VecDeque::new(),
            exclusions: Vec::new(),
        };

        for (assembly, ty) in metadata.types() {
            if let Some(name) = ty.full_name.as_deref() {
                if builder.is_candidate(assembly, ty) {
                    builder.queue.push_back(name.to_string());
                }
            }
        }
        builder
    }

    pub fn build(mut self) -> Result<TypeGraph, GraphError> {
        for service in self.options.services.clone() {
            match self.known.get(service.as_str()) {
                Some((_, ty)) if ty.is_interface() && !ty.is_generic() => {
                    self.queue.push_back(service)
                }
                _ => return Err(GraphError::UnknownService(service)),
            }
        }

        while let Some(name) = self.queue.pop_front() {
            self.visit(&name)?;
        }

        for index in 0..self.entries.len() {
            if self.entries[index].kind == EntryKind::Interface {
                let methods = self.merge(self.entries[index].type_id);
                self.entries[index].methods = methods;
            }
        }

        debug!(
            entries = self.entries.len(),
            exclusions = self.exclusions.len(),
            "type graph built"
        );

        Ok(TypeGraph {
            entries: self.entries,
            index: self.index,
            exclusions: self.exclusions,
        })
    }

    fn is_candidate(&self, assembly: &AssemblyMetadata, ty: &TypeMetadata) -> bool {
        if !ty.is_interface() || !ty.public || ty.is_generic() || ty.full_name.is_none() {
            return false;
        }
        if self.options.exclude_assemblies.contains(&assembly.name) {
            return false;
        }
        let namespace = ty.namespace();
        !self.options.exclude_namespaces.iter().any(|excluded| {
            namespace == excluded
                || namespace
                    .strip_prefix(excluded.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }

    fn path_of(&self, reflected_name: &str) -> NativePath {
        NativePath::from_dotted(reflected_name, &self.options.crate_root, Vec::new())
    }

    fn visit(&mut self, name: &str) -> Result<(), GraphError> {
        if self.by_name.contains_key(name) {
            return Ok(());
        }

        let path = self.path_of(name);
        let type_id = path.type_id();
        if let Some(&existing) = self.index.get(&type_id) {
            return Err(GraphError::TypeIdCollision {
                type_id,
                first: self.entries[existing].reflected_name.clone(),
                second: name.to_string(),
            });
        }

        let interface = self
            .known
            .get(name)
            .map(|(_, ty)| *ty)
            .filter(|ty| ty.is_interface() && !ty.is_generic());
        let kind = if interface.is_some() {
            EntryKind::Interface
        } else {
            EntryKind::Opaque
        };
        debug!(type_name = name, type_id = %type_id, ?kind, "binding entry");

        self.index.insert(type_id, self.entries.len());
        self.by_name.insert(name.to_string(), type_id);
        self.entries.push(BindingEntry {
            type_id,
            reflected_name: name.to_string(),
            path,
            kind,
            service: self.options.services.iter().any(|service| service == name),
            extends: Vec::new(),
            methods: Vec::new(),
        });

        if let Some(ty) = interface {
            let extends = self.parents(name, ty);
            let declared = self.declare_methods(name, type_id, ty);
            if let Some(&index) = self.index.get(&type_id) {
                self.entries[index].extends = extends;
            }
            self.declared.insert(type_id, declared);
        }
        Ok(())
    }

    fn parents(&mut self, owner: &str, ty: &TypeMetadata) -> Vec<TypeId> {
        let mut parents = Vec::new();
        for parent in &ty.extends {
            let mut pending = Vec::new();
            match self.resolve(parent, &mut pending) {
                Ok(binding) if BuiltinKind::from_type_id(binding.path.type_id()).is_some() => {}
                Ok(binding) => {
                    parents.push(binding.path.type_id());
                    self.queue.extend(pending);
                }
                Err(reason) => self.exclude(owner, "extends", reason),
            }
        }
        parents
    }

    fn declare_methods(
        &mut self,
        owner_name: &str,
        owner: TypeId,
        ty: &TypeMetadata,
    ) -> Vec<MethodBinding> {
        let mut methods = Vec::new();

        for property in &ty.properties {
            if property.can_read {
                let getter = format!("get_{}", property.name);
                self.accept(owner_name, owner, getter, &[], &property.ty, &mut methods);
            }
            if property.can_write {
                let setter = format!("set_{}", property.name);
                let value = ParameterMetadata {
                    name: Some("value".to_string()),
                    ty: property.ty.clone(),
                    direction: Default::default(),
                };
                let void = TypeRef::void();
                self.accept(owner_name, owner, setter, &[value], &void, &mut methods);
            }
        }

        for method in ty.methods.iter().filter(|method| !method.special_name) {
            self.accept(
                owner_name,
                owner,
                method.name.clone(),
                &method.parameters,
                &method.returns,
                &mut methods,
            );
        }
        methods
    }

    fn accept(
        &mut self,
        owner_name: &str,
        owner: TypeId,
        name: String,
        parameters: &[ParameterMetadata],
        returns: &TypeRef,
        methods: &mut Vec<MethodBinding>,
    ) {
        let mut pending = Vec::new();
        match self.bind_method(owner, &name, parameters, returns, &mut pending) {
            Ok(method) => {
                self.queue.extend(pending);
                methods.push(method);
            }
            Err(reason) => self.exclude(owner_name, &name, reason),
        }
    }

    fn bind_method(
        &self,
        owner: TypeId,
        name: &str,
        parameters: &[ParameterMetadata],
        returns: &TypeRef,
        pending: &mut Vec<String>,
    ) -> Result<MethodBinding, ExclusionReason> {
        let mut bound = Vec::with_capacity(parameters.len());
        for (index, param) in parameters.iter().enumerate() {
            if param.direction.is_by_ref() {
                let label = param.name.clone().unwrap_or_else(|| format!("#{}", index));
                return Err(ExclusionReason::ByRefParameter(label));
            }
            bound.push(ParameterBinding {
                name: param.name.clone(),
                ty: self.resolve(&param.ty, pending)?,
            });
        }
        let returns = self.resolve(returns, pending)?;

        let method_id = MethodId::of_signature(
            name,
            bound.iter().map(|param| param.ty.reflected_name.as_str()),
        );
        Ok(MethodBinding {
            method_id,
            name: name.to_string(),
            declaring: owner,
            parameters: bound,
            returns,
        })
    }

    /// Resolve a signature type. Named non-built-in types are collected in
    /// `pending` and only visited once the whole signature is accepted.
    fn resolve(&self, ty: &TypeRef, pending: &mut Vec<String>) -> Result<TypeBinding, ExclusionReason> {
        match ty {
            TypeRef::Anonymous(_) => Err(ExclusionReason::AnonymousType(ty.reflected_name())),
            TypeRef::Named { name, args } if !args.is_empty() || name.contains('`') => {
                Err(ExclusionReason::GenericType(ty.reflected_name()))
            }
            TypeRef::Named { name, .. } if name.trim().is_empty() => {
                Err(ExclusionReason::UnresolvedType("<unnamed>".to_string()))
            }
            TypeRef::Named { name, .. } => match BuiltinKind::from_reflected(name) {
                // the untyped array is an array of objects
                Some(BuiltinKind::Array) => Ok(TypeBinding {
                    reflected_name: name.clone(),
                    path: NativePath::array(BuiltinKind::Object.native_path()),
                }),
                Some(kind) => Ok(TypeBinding::builtin(kind)),
                None => {
                    pending.push(name.clone());
                    Ok(TypeBinding {
                        reflected_name: name.clone(),
                        path: self.path_of(name),
                    })
                }
            },
            TypeRef::Array(element) => {
                let element = self.resolve(element, pending)?;
                if element.is_void() {
                    return Err(ExclusionReason::UnresolvedType(ty.reflected_name()));
                }
                Ok(TypeBinding {
                    reflected_name: format!("{}[]", element.reflected_name),
                    path: NativePath::array(element.path),
                })
            }
        }
    }

    fn exclude(&mut self, type_name: &str, member: &str, reason: ExclusionReason) {
        warn!(type_name, member, %reason, "member excluded from bindings");
        self.exclusions.push(Exclusion {
            type_name: type_name.to_string(),
            member: member.to_string(),
            reason,
        });
    }

    /// Own declarations, then each parent depth-first in declaration order.
    fn merge(&self, root: TypeId) -> Vec<MethodBinding> {
        let mut merged = Vec::new();
        let mut seen = FxHashMap::default();
        let mut visited = FxHashSet::default();
        self.collect(root, &mut visited, &mut seen, &mut merged);
        merged
    }

    fn collect(
        &self,
        ty: TypeId,
        visited: &mut FxHashSet<TypeId>,
        seen: &mut FxHashMap<MethodId, usize>,
        merged: &mut Vec<MethodBinding>,
    ) {
        if !visited.insert(ty) {
            return;
        }

        for method in self.declared.get(&ty).into_iter().flatten() {
            match seen.get(&method.method_id) {
                None => {
                    seen.insert(method.method_id, merged.len());
                    merged.push(method.clone());
                }
                Some(&first) if !merged[first].same_signature(method) => {
                    warn!(
                        method_id = %method.method_id,
                        kept = %merged[first].signature(),
                        shadowed = %method.signature(),
                        "MethodId collision between distinct signatures"
                    );
                }
                Some(_) => {}
            }
        }

        if let Some(&index) = self.index.get(&ty) {
            for &parent in &self.entries[index].extends {
                self.collect(parent, visited, seen, merged);
            }
        }
    }
}
