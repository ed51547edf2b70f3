//! Binding Emitter
//!
//! Renders a [`TypeGraph`] as Rust source written against
//! `hashbridge_abi`. Every entry becomes a transparent wrapper over
//! `system::Object` with its identity baked in as a literal, a constructor,
//! and one stub per merged method. Stubs push arguments in declaration
//! order, invoke, and check the result's runtime type before wrapping it.
//! Reference-typed results come back as `Option`, `None` for a null.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use hashbridge_abi::path::{escape_ident, to_snake_case};
use hashbridge_abi::TypeId;
use rustc_hash::FxHashSet;

use crate::graph::{BindingEntry, MethodBinding, TypeGraph};

/// Number of spaces per indentation level.
const INDENT_WIDTH: usize = 4;

const ABI: &str = "hashbridge_abi";

// ---------------------------------------------------------------------------
// Source writer
// ---------------------------------------------------------------------------

/// Line-oriented source buffer with indentation tracking.
#[derive(Default)]
struct SourceWriter {
    out: String,
    indent: usize,
}

impl SourceWriter {
    fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            self.out.push_str(&" ".repeat(self.indent * INDENT_WIDTH));
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    fn blank(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with("{\n") && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    fn open(&mut self, text: impl AsRef<str>) {
        self.line(text);
        self.indent += 1;
    }

    fn close(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.line("}");
    }

    fn finish(self) -> String {
        self.out
    }
}

// ---------------------------------------------------------------------------
// Module tree
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ModuleTree<'g> {
    entries: Vec<&'g BindingEntry>,
    children: BTreeMap<String, ModuleTree<'g>>,
}

impl<'g> ModuleTree<'g> {
    fn insert(&mut self, segments: &[String], entry: &'g BindingEntry) {
        match segments.split_first() {
            None => self.entries.push(entry),
            Some((first, rest)) => self
                .children
                .entry(first.clone())
                .or_default()
                .insert(rest, entry),
        }
    }
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Render `graph` as a Rust source file.
///
/// `crate_root` is the path the file is mounted at; its segments are not
/// re-emitted as modules.
pub fn emit(graph: &TypeGraph, crate_root: &str) -> String {
    let root_depth = crate_root.split("::").count();
    let mut tree = ModuleTree::default();
    for entry in graph.entries() {
        let module = entry.path.module();
        tree.insert(&module[root_depth.min(module.len())..], entry);
    }

    let mut emitter = Emitter {
        graph,
        w: SourceWriter::default(),
    };
    emitter.header();
    emitter.tree(&tree);
    emitter.w.finish()
}

struct Emitter<'g> {
    graph: &'g TypeGraph,
    w: SourceWriter,
}

impl Emitter<'_> {
    fn header(&mut self) {
        let graph = self.graph;
        self.w.line("// Generated by hashbridge-bindgen. Do not edit.");
        self.w.line("//");
        self.w.line(format!(
            "// {} types, {} excluded members.",
            graph.len(),
            graph.exclusions().len()
        ));
        for exclusion in graph.exclusions() {
            self.w.line(format!("//   excluded {}", exclusion));
        }
    }

    fn tree(&mut self, tree: &ModuleTree<'_>) {
        for entry in &tree.entries {
            self.entry(entry);
        }
        for (name, child) in &tree.children {
            self.w.blank();
            self.w.line("#[allow(dead_code, non_camel_case_types, clippy::all)]");
            self.w.open(format!("pub mod {} {{", escape_ident(name)));
            self.tree(child);
            self.w.close();
        }
    }

    fn entry(&mut self, entry: &BindingEntry) {
        let name = escape_ident(entry.path.name());
        let object = format!("{}::system::Object", ABI);

        self.w.blank();
        self.w.line(format!("/// `{}`", entry.reflected_name));
        self.w.line("#[repr(transparent)]");
        self.w.line(format!("pub struct {}({});", name, object));

        self.w.blank();
        self.w.open(format!("impl ::std::ops::Deref for {} {{", name));
        self.w.line(format!("type Target = {};", object));
        self.w.blank();
        self.w.open("fn deref(&self) -> &Self::Target {");
        self.w.line("&self.0");
        self.w.close();
        self.w.close();

        self.w.blank();
        self.w.open(format!("impl {}::ObjectHash for {} {{", ABI, name));
        self.w.open(format!("fn type_id() -> {}::TypeId {{", ABI));
        self.w
            .line(format!("{}::TypeId::from_raw({:#018x})", ABI, entry.type_id.raw()));
        self.w.close();
        self.w.close();

        self.w.blank();
        self.w.open(format!("impl {}::FromObject for {} {{", ABI, name));
        self.w
            .open(format!("unsafe fn from_object_unchecked(object: {}) -> Self {{", object));
        self.w.line("Self(object)");
        self.w.close();
        self.w.close();

        let constructor = if entry.service { "instance" } else { "new" };
        let mut used: FxHashSet<String> = FxHashSet::default();
        used.insert(constructor.to_string());

        self.w.blank();
        self.w.open(format!("impl {} {{", name));
        if entry.service {
            self.w.line("/// The host's shared instance.");
        } else {
            self.w.line("/// Ask the host for a new instance.");
        }
        self.w.open(format!(
            "pub fn {}() -> {}::InteropResult<Self> {{",
            constructor, ABI
        ));
        self.w.line(format!(
            "let init = {}::ObjectInit::empty(<Self as {}::ObjectHash>::type_id());",
            ABI, ABI
        ));
        self.w
            .line(format!("{}::boundary::construct(&init)?.downcast()", ABI));
        self.w.close();
        self.w.close();

        for (declaring, methods) in declaring_blocks(entry) {
            let declaring_name = self
                .graph
                .get(declaring)
                .map(|parent| parent.reflected_name.as_str())
                .unwrap_or(entry.reflected_name.as_str());

            self.w.blank();
            self.w.line(format!("// impl {}", declaring_name));
            self.w.open(format!("impl {} {{", name));
            for (index, method) in methods.into_iter().enumerate() {
                if index > 0 {
                    self.w.blank();
                }
                let stub = unique(&mut used, &to_snake_case(&method.name));
                self.method(&stub, method);
            }
            self.w.close();
        }
    }

    fn method(&mut self, stub: &str, method: &MethodBinding) {
        // `ty` is the stub's local for the owner identity
        let mut param_names: FxHashSet<String> = FxHashSet::default();
        param_names.insert("ty".to_string());
        let params: Vec<(String, String)> = method
            .parameters
            .iter()
            .enumerate()
            .map(|(index, param)| {
                let base = param
                    .name
                    .as_deref()
                    .map(to_snake_case)
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| format!("arg{}", index));
                let ident = escape_ident(&unique(&mut param_names, &base));
                (ident, param.ty.path.to_source())
            })
            .collect();

        let mut signature = format!("pub fn {}(&self", escape_ident(stub));
        for (ident, ty) in &params {
            let _ = write!(signature, ", {}: &{}", ident, ty);
        }
        let returns = if method.returns.is_void() {
            "()".to_string()
        } else if method.returns.is_nullable() {
            format!("::std::option::Option<{}>", method.returns.path.to_source())
        } else {
            method.returns.path.to_source()
        };
        let _ = write!(signature, ") -> {}::InteropResult<{}> {{", ABI, returns);

        self.w.line(format!("/// `{}`", method.signature()));
        self.w.open(signature);
        self.w.line(format!(
            "const METHOD: {}::MethodId = {}::MethodId::from_raw({:#018x});",
            ABI,
            ABI,
            method.method_id.raw()
        ));
        self.w
            .line(format!("let ty = <Self as {}::ObjectHash>::type_id();", ABI));
        for (ident, _) in &params {
            self.w.line(format!(
                "{}::boundary::push_parameter(ty, METHOD, {}::system::Object::handle({}))?;",
                ABI, ABI, ident
            ));
        }
        let call = format!(
            "{}::boundary::call_function(ty, METHOD, self.0.handle())?",
            ABI
        );
        if method.returns.is_void() {
            self.w.line(format!("drop({});", call));
            self.w.line("Ok(())");
        } else if method.returns.is_nullable() {
            self.w.line(format!("{}.downcast_nullable()", call));
        } else {
            self.w.line(format!("{}.downcast()", call));
        }
        self.w.close();
    }
}

/// Group an entry's merged methods by declaring interface, in order of
/// first appearance.
fn declaring_blocks(entry: &BindingEntry) -> Vec<(TypeId, Vec<&MethodBinding>)> {
    let mut blocks: Vec<(TypeId, Vec<&MethodBinding>)> = Vec::new();
    for method in &entry.methods {
        match blocks.iter_mut().find(|(declaring, _)| *declaring == method.declaring) {
            Some((_, methods)) => methods.push(method),
            None => blocks.push((method.declaring, vec![method])),
        }
    }
    blocks
}

/// `base`, or `base_1`, `base_2`, ... when taken.
fn unique(used: &mut FxHashSet<String>, base: &str) -> String {
    let mut candidate = base.to_string();
    let mut suffix = 0;
    while used.contains(&candidate) {
        suffix += 1;
        candidate = format!("{}_{}", base, suffix);
    }
    used.insert(candidate.clone());
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphBuilder, GraphOptions};
    use crate::metadata::Metadata;

    fn emit_json(json: &str, options: GraphOptions) -> String {
        let metadata = Metadata::from_json(json).unwrap();
        let root = options.crate_root.clone();
        let graph = GraphBuilder::new(&metadata, options).build().unwrap();
        emit(&graph, &root)
    }

    #[test]
    fn test_wrapper_and_identity() {
        let source = emit_json(
            r#"{ "assemblies": [{ "name": "Host", "types": [{ "full_name": "Host.Shapes.ISquare" }] }] }"#,
            GraphOptions::default(),
        );

        let id = TypeId::of_path("crate::host::shapes::ISquare");
        assert!(source.contains("pub mod host {"));
        assert!(source.contains("pub mod shapes {"));
        assert!(source.contains("pub struct ISquare(hashbridge_abi::system::Object);"));
        assert!(source.contains(&format!("TypeId::from_raw({:#018x})", id.raw())));
        assert!(source.contains("pub fn new() -> hashbridge_abi::InteropResult<Self> {"));
    }

    #[test]
    fn test_method_stub_shape() {
        let source = emit_json(
            r#"{ "assemblies": [{ "name": "Host", "types": [{
                "full_name": "Host.IWidget",
                "methods": [
                    { "name": "Resize", "parameters": [
                        { "name": "Width", "type": "System.Int32" },
                        { "name": "type", "type": "System.String" }
                    ]},
                    { "name": "GetLabel", "returns": "System.String" },
                    { "name": "Count", "returns": "System.Int32" }
                ]
            }]}]}"#,
            GraphOptions::default(),
        );

        assert!(source.contains(
            "pub fn resize(&self, width: &hashbridge_abi::system::Int32, r#type: &hashbridge_abi::system::String) -> hashbridge_abi::InteropResult<()> {"
        ));
        let push_width = source
            .find("Object::handle(width))?;")
            .unwrap();
        let push_type = source.find("Object::handle(r#type))?;").unwrap();
        assert!(push_width < push_type);
        assert!(source.contains("drop(hashbridge_abi::boundary::call_function(ty, METHOD, self.0.handle())?);"));
        assert!(source.contains(
            "pub fn get_label(&self) -> hashbridge_abi::InteropResult<::std::option::Option<hashbridge_abi::system::String>> {"
        ));
        assert!(source.contains("self.0.handle())?.downcast_nullable()"));
        assert!(source.contains(
            "pub fn count(&self) -> hashbridge_abi::InteropResult<hashbridge_abi::system::Int32> {"
        ));
        assert!(source.contains("self.0.handle())?.downcast()"));
    }

    #[test]
    fn test_overloads_get_suffixes() {
        let source = emit_json(
            r#"{ "assemblies": [{ "name": "Host", "types": [{
                "full_name": "Host.ILog",
                "methods": [
                    { "name": "Write", "parameters": [{ "name": "text", "type": "System.String" }] },
                    { "name": "Write", "parameters": [{ "name": "code", "type": "System.Int32" }] },
                    { "name": "New" }
                ]
            }]}]}"#,
            GraphOptions::default(),
        );

        assert!(source.contains("pub fn write(&self, text:"));
        assert!(source.contains("pub fn write_1(&self, code:"));
        assert!(source.contains("pub fn new_1(&self)"));
    }

    #[test]
    fn test_service_constructor_and_root() {
        let source = emit_json(
            r#"{ "assemblies": [{ "name": "Host", "types": [{ "full_name": "Host.Services.IModConfig" }] }] }"#,
            GraphOptions {
                crate_root: "crate::bindings".into(),
                services: vec!["Host.Services.IModConfig".into()],
                ..Default::default()
            },
        );

        let id = TypeId::of_path("crate::bindings::host::services::IModConfig");
        assert!(source.contains(&format!("TypeId::from_raw({:#018x})", id.raw())));
        assert!(!source.contains("pub mod bindings"));
        assert!(source.contains("pub fn instance() -> hashbridge_abi::InteropResult<Self> {"));
        assert!(!source.contains("pub fn new()"));
    }

    #[test]
    fn test_array_and_keyword_paths() {
        let source = emit_json(
            r#"{ "assemblies": [{ "name": "Host", "types": [
                { "full_name": "Host.Mod.IRegistry", "methods": [
                    { "name": "All", "returns": { "array": "Host.Mod.IEntry" } }
                ]},
                { "full_name": "Host.Mod.IEntry" }
            ]}]}"#,
            GraphOptions::default(),
        );

        assert!(source.contains("pub mod r#mod {"));
        assert!(source.contains(
            "hashbridge_abi::InteropResult<::std::option::Option<hashbridge_abi::system::Array<crate::host::r#mod::IEntry>>>"
        ));
    }

    #[test]
    fn test_unique() {
        let mut used = FxHashSet::default();
        assert_eq!(unique(&mut used, "get"), "get");
        assert_eq!(unique(&mut used, "get"), "get_1");
        assert_eq!(unique(&mut used, "get"), "get_2");
    }
}
