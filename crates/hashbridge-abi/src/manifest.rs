//! Descriptor manifest
//!
//! The generator writes the identities it emitted stubs for. The managed
//! registry reads the same document back and reports types and methods the
//! native side can call but the host never registered.

use serde::{Deserialize, Serialize};

use crate::ids::{MethodId, TypeId};

/// Every type and method the generated bindings can dispatch to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorManifest {
    /// Bound types, in emission order
    pub types: Vec<TypeManifest>,
}

/// One bound type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeManifest {
    /// Identity
    pub type_id: TypeId,
    /// Rendered native path (hash input)
    pub path: String,
    /// Reflected dotted name
    pub reflected_name: String,
    /// Whether the host provides exactly one shared instance
    #[serde(default)]
    pub service: bool,
    /// Merged method list
    #[serde(default)]
    pub methods: Vec<MethodManifest>,
}

/// One bound method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodManifest {
    /// Identity
    pub method_id: MethodId,
    /// Reflected method name
    pub name: String,
    /// Reflected parameter type names, in declaration order
    #[serde(default)]
    pub parameters: Vec<String>,
    /// Reflected return type name
    pub returns: String,
}

impl DescriptorManifest {
    /// Parse a manifest document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Look up a type by identity.
    pub fn get(&self, type_id: TypeId) -> Option<&TypeManifest> {
        self.types.iter().find(|ty| ty.type_id == type_id)
    }
}
