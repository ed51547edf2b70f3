//! Reflected metadata model
//!
//! The managed host dumps what reflection sees of its loaded assemblies into
//! a JSON document. Only the parts that matter for binding are modelled:
//! type names, inheritance, properties and method signatures.
//!
//! Type references accept a short form, a bare string naming a non-generic
//! type:
//!
//! ```json
//! { "name": "Scale", "parameters": [{ "name": "factor", "type": "System.Double" }] }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MetadataError;

/// A set of reflected assemblies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub assemblies: Vec<AssemblyMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyMetadata {
    pub name: String,
    #[serde(default)]
    pub types: Vec<TypeMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeMetadata {
    /// Dotted full name; absent for types reflection cannot name
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub kind: TypeKind,
    #[serde(default = "default_true")]
    pub public: bool,
    /// Open generic parameter names, empty for non-generic types
    #[serde(default)]
    pub generic_parameters: Vec<String>,
    /// Directly extended interfaces
    #[serde(default)]
    pub extends: Vec<TypeRef>,
    #[serde(default)]
    pub properties: Vec<PropertyMetadata>,
    #[serde(default)]
    pub methods: Vec<MethodMetadata>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    #[default]
    Interface,
    Class,
    Struct,
    Enum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default = "default_true")]
    pub can_read: bool,
    #[serde(default)]
    pub can_write: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodMetadata {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ParameterMetadata>,
    #[serde(default = "TypeRef::void")]
    pub returns: TypeRef,
    /// Compiler-generated accessor; covered by the owning property
    #[serde(default)]
    pub special_name: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub direction: Direction,
}

/// How a parameter is passed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Value,
    In,
    Out,
    Ref,
}

impl Direction {
    pub fn is_by_ref(self) -> bool {
        self != Direction::Value
    }
}

/// Reference to a type from a signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawTypeRef", into = "RawTypeRef")]
pub enum TypeRef {
    /// A named type, with generic arguments when it is a generic instance
    Named { name: String, args: Vec<TypeRef> },
    /// Single-dimension array
    Array(Box<TypeRef>),
    /// A type reflection could not name; the hint is for diagnostics only
    Anonymous(String),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn void() -> Self {
        TypeRef::named("System.Void")
    }

    /// Name as reflection prints it (`System.String[]`, ``IList`1[System.Int32]``).
    pub fn reflected_name(&self) -> String {
        match self {
            TypeRef::Named { name, args } if args.is_empty() => name.clone(),
            TypeRef::Named { name, args } => {
                let args: Vec<String> = args.iter().map(TypeRef::reflected_name).collect();
                format!("{}[{}]", name, args.join(","))
            }
            TypeRef::Array(element) => format!("{}[]", element.reflected_name()),
            TypeRef::Anonymous(hint) => format!("<{}>", hint),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawTypeRef {
    Short(String),
    Array {
        array: Box<TypeRef>,
    },
    Named {
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<TypeRef>,
    },
    Anonymous {
        anonymous: String,
    },
}

impl From<RawTypeRef> for TypeRef {
    fn from(raw: RawTypeRef) -> Self {
        match raw {
            RawTypeRef::Short(name) => TypeRef::named(name),
            RawTypeRef::Array { array } => TypeRef::Array(array),
            RawTypeRef::Named { name, args } => TypeRef::Named { name, args },
            RawTypeRef::Anonymous { anonymous } => TypeRef::Anonymous(anonymous),
        }
    }
}

impl From<TypeRef> for RawTypeRef {
    fn from(ty: TypeRef) -> Self {
        match ty {
            TypeRef::Named { name, args } if args.is_empty() => RawTypeRef::Short(name),
            TypeRef::Named { name, args } => RawTypeRef::Named { name, args },
            TypeRef::Array(array) => RawTypeRef::Array { array },
            TypeRef::Anonymous(anonymous) => RawTypeRef::Anonymous { anonymous },
        }
    }
}

fn default_true() -> bool {
    true
}

impl Metadata {
    /// Parse a metadata document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load a metadata document from disk.
    pub fn from_file(path: &Path) -> Result<Self, MetadataError> {
        let content = fs::read_to_string(path).map_err(|source| MetadataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content).map_err(|source| MetadataError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Append another document's assemblies.
    pub fn merge(&mut self, other: Metadata) {
        self.assemblies.extend(other.assemblies);
    }

    /// Every type with its owning assembly, in document order.
    pub fn types(&self) -> impl Iterator<Item = (&AssemblyMetadata, &TypeMetadata)> {
        self.assemblies
            .iter()
            .flat_map(|assembly| assembly.types.iter().map(move |ty| (assembly, ty)))
    }
}

impl TypeMetadata {
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    pub fn is_generic(&self) -> bool {
        !self.generic_parameters.is_empty()
            || self.full_name.as_deref().is_some_and(|name| name.contains('`'))
    }

    /// Namespace part of the full name, empty for global types.
    pub fn namespace(&self) -> &str {
        self.full_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(namespace, _)| namespace)
            .unwrap_or("")
    }
}
