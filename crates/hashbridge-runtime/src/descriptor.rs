//! Static descriptor tables
//!
//! A host describes each type it exposes once, at startup: its reflected
//! name, the methods it answers and how to make an instance. Method
//! identities are computed here with the same hash the generator uses, so a
//! descriptor only has to spell signatures the way the metadata does.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use hashbridge_abi::{BuiltinKind, MethodId, NativePath, TypeId};

use crate::error::InvokeError;
use crate::value::Value;

/// Method body: receiver and arguments in declaration order.
pub type MethodFn = Arc<dyn Fn(&Value, &[Value]) -> Result<Value, InvokeError> + Send + Sync>;

/// Instance factory.
pub type ConstructorFn = Arc<dyn Fn() -> Result<Value, InvokeError> + Send + Sync>;

/// One callable method.
#[derive(Clone)]
pub struct MethodDescriptor {
    id: MethodId,
    name: String,
    parameters: Vec<String>,
    returns: String,
    func: MethodFn,
}

impl MethodDescriptor {
    pub fn new<F>(name: &str, parameters: &[&str], returns: &str, func: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        Self {
            id: MethodId::of_signature(name, parameters),
            name: name.to_string(),
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
            returns: returns.to_string(),
            func: Arc::new(func),
        }
    }

    pub fn id(&self) -> MethodId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn returns(&self) -> &str {
        &self.returns
    }

    /// Whether the method returns `System.Void`.
    pub fn is_void(&self) -> bool {
        BuiltinKind::from_reflected(&self.returns) == Some(BuiltinKind::Void)
    }

    /// Whether the method returns a built-in scalar, which cannot be null.
    pub fn returns_scalar(&self) -> bool {
        BuiltinKind::from_reflected(&self.returns).is_some_and(BuiltinKind::is_scalar)
    }

    /// Call the body after checking the argument count.
    pub fn invoke(&self, receiver: &Value, args: &[Value]) -> Result<Value, InvokeError> {
        if args.len() != self.parameters.len() {
            return Err(InvokeError::Arity {
                expected: self.parameters.len(),
                got: args.len(),
            });
        }
        (self.func)(receiver, args)
    }

    fn same_signature(&self, other: &MethodDescriptor) -> bool {
        self.name == other.name && self.parameters == other.parameters
    }

    /// `Name(System.Int32, System.String)`
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, self.parameters.join(", "))
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("id", &self.id)
            .field("signature", &self.signature())
            .field("returns", &self.returns)
            .finish()
    }
}

/// Everything the registry needs to know about one type.
#[derive(Clone)]
pub struct TypeDescriptor {
    type_id: TypeId,
    reflected_name: String,
    path: String,
    parents: Vec<TypeId>,
    methods: Vec<MethodDescriptor>,
    pub(crate) conflicts: Vec<(MethodId, String, String)>,
    constructor: Option<ConstructorFn>,
    singleton: bool,
}

impl TypeDescriptor {
    /// Describe the type with reflected dotted name `reflected_name`, whose
    /// generated wrapper lives under `root` (usually `crate`).
    pub fn new(reflected_name: &str, root: &str) -> Self {
        Self::with_path(reflected_name, NativePath::from_dotted(reflected_name, root, Vec::new()))
    }

    /// Describe a type with an explicit native path.
    pub fn with_path(reflected_name: &str, path: NativePath) -> Self {
        Self {
            type_id: path.type_id(),
            reflected_name: reflected_name.to_string(),
            path: path.render(),
            parents: Vec::new(),
            methods: Vec::new(),
            conflicts: Vec::new(),
            constructor: None,
            singleton: false,
        }
    }

    /// Descriptor of a runtime built-in.
    pub fn builtin(kind: BuiltinKind) -> Self {
        Self::with_path(&kind.reflected_name(), kind.native_path())
    }

    /// Add a method. A method already present under the same identity, for
    /// example one inherited through [`TypeDescriptor::extends`], is shadowed.
    pub fn method<F>(mut self, name: &str, parameters: &[&str], returns: &str, func: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        let method = MethodDescriptor::new(name, parameters, returns, func);
        if let Some(index) = self.methods.iter().position(|m| m.id == method.id) {
            let existing = &self.methods[index];
            if !existing.same_signature(&method) {
                self.conflicts
                    .push((method.id, existing.signature(), method.signature()));
            }
            self.methods[index] = method;
        } else {
            self.methods.push(method);
        }
        self
    }

    /// Add a property getter, `get_{property}`.
    pub fn getter<F>(self, property: &str, ty: &str, get: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        let name = format!("get_{}", property);
        self.method(&name, &[], ty, move |receiver, _| get(receiver))
    }

    /// Add a property setter, `set_{property}`.
    pub fn setter<F>(self, property: &str, ty: &str, set: F) -> Self
    where
        F: Fn(&Value, &Value) -> Result<(), InvokeError> + Send + Sync + 'static,
    {
        let name = format!("set_{}", property);
        self.method(&name, &[ty], "System.Void", move |receiver, args| {
            set(receiver, &args[0]).map(|_| Value::Void)
        })
    }

    /// Inherit every method of `parent` not already declared here.
    pub fn extends(mut self, parent: &TypeDescriptor) -> Self {
        if !self.parents.contains(&parent.type_id) {
            self.parents.push(parent.type_id);
        }
        for method in &parent.methods {
            if !self.methods.iter().any(|m| m.id == method.id) {
                self.methods.push(method.clone());
            }
        }
        self
    }

    /// Allow the native side to construct fresh instances.
    pub fn constructor<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(factory));
        self.singleton = false;
        self
    }

    /// Create exactly one shared instance when the registry is built.
    pub fn singleton<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(factory));
        self.singleton = true;
        self
    }

    /// Box host state as an instance of this type, whatever root its
    /// bindings are mounted under.
    pub fn instance<T: Any + Send + Sync>(&self, state: T) -> Value {
        Value::object(self.type_id, state)
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn reflected_name(&self) -> &str {
        &self.reflected_name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parents(&self) -> &[TypeId] {
        &self.parents
    }

    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    pub fn is_singleton(&self) -> bool {
        self.singleton
    }

    pub(crate) fn take_constructor(&mut self) -> Option<ConstructorFn> {
        self.constructor.take()
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type_id", &self.type_id)
            .field("reflected_name", &self.reflected_name)
            .field("methods", &self.methods.len())
            .field("singleton", &self.singleton)
            .finish()
    }
}
