//! Graph building and emission over a diamond-shaped hierarchy

use std::collections::HashSet;

use hashbridge_abi::{MethodId, TypeId};
use hashbridge_bindgen::emit::emit;
use hashbridge_bindgen::{
    EntryKind, ExclusionReason, GraphBuilder, GraphOptions, Metadata, TypeGraph,
};

const DIAMOND: &str = include_str!("fixtures/diamond.json");

fn diamond() -> TypeGraph {
    let metadata = Metadata::from_json(DIAMOND).unwrap();
    let options = GraphOptions {
        exclude_namespaces: vec!["System".into()],
        ..Default::default()
    };
    GraphBuilder::new(&metadata, options).build().unwrap()
}

fn method(name: &str, params: &[&str]) -> MethodId {
    MethodId::of_signature(name, params)
}

/// The emitted section for one wrapper, up to the next wrapper.
fn section<'a>(source: &'a str, type_name: &str) -> &'a str {
    let start = source
        .find(&format!("pub struct {}(", type_name))
        .unwrap();
    let rest = &source[start..];
    let end = rest
        .find("#[repr(transparent)]")
        .unwrap_or(rest.len());
    &rest[..end]
}

#[test]
fn test_merged_methods_are_complete_and_distinct() {
    let graph = diamond();
    let child = graph.find("Host.Shapes.IChild").unwrap();

    let ids: Vec<MethodId> = child.methods.iter().map(|m| m.method_id).collect();
    let unique: HashSet<MethodId> = ids.iter().copied().collect();
    assert_eq!(ids.len(), unique.len());

    let expected: HashSet<MethodId> = [
        method("Child", &[]),
        method("Shared", &["System.Int32"]),
        method("Left", &[]),
        method("get_Id", &[]),
        method("Right", &[]),
    ]
    .into_iter()
    .collect();
    assert_eq!(unique, expected);
}

#[test]
fn test_most_derived_declaration_wins() {
    let graph = diamond();
    let child = graph.find("Host.Shapes.IChild").unwrap();
    let shared = child
        .methods
        .iter()
        .find(|m| m.method_id == method("Shared", &["System.Int32"]))
        .unwrap();
    assert_eq!(shared.declaring, child.type_id);

    let right = graph.find("Host.Shapes.IRight").unwrap();
    let inherited = child
        .methods
        .iter()
        .find(|m| m.name == "Right")
        .unwrap();
    assert_eq!(inherited.declaring, right.type_id);
}

#[test]
fn test_exclusions_are_reported() {
    let graph = diamond();
    let reasons: Vec<(&str, &ExclusionReason)> = graph
        .exclusions()
        .iter()
        .filter(|e| e.type_name == "Host.Shapes.IChild")
        .map(|e| (e.member.as_str(), &e.reason))
        .collect();

    assert_eq!(reasons.len(), 3);
    assert!(reasons.contains(&("TryFind", &ExclusionReason::ByRefParameter("found".into()))));
    assert!(reasons
        .iter()
        .any(|(member, reason)| *member == "Children"
            && matches!(reason, ExclusionReason::GenericType(_))));
    assert!(reasons
        .iter()
        .any(|(member, reason)| *member == "Inspect"
            && matches!(reason, ExclusionReason::AnonymousType(_))));

    let child = graph.find("Host.Shapes.IChild").unwrap();
    assert!(child.methods.iter().all(|m| m.name != "TryFind"));
}

#[test]
fn test_candidates_skip_generic_and_excluded() {
    let graph = diamond();
    assert!(graph.find("Host.Collections.IList`1").is_none());
    assert!(graph.find("System.IDisposable").is_none());
    assert_eq!(graph.len(), 4);
    assert!(graph
        .entries()
        .iter()
        .all(|entry| entry.kind == EntryKind::Interface));
}

#[test]
fn test_emitted_child_has_one_stub_per_method() {
    let graph = diamond();
    let source = emit(&graph, "crate");
    let child = graph.find("Host.Shapes.IChild").unwrap();
    let text = section(&source, "IChild");

    assert_eq!(text.matches("const METHOD").count(), child.methods.len());
    for method in &child.methods {
        let literal = format!("MethodId::from_raw({:#018x})", method.method_id.raw());
        assert_eq!(text.matches(&literal).count(), 1, "{}", method.signature());
    }

    for block in [
        "// impl Host.Shapes.IChild",
        "// impl Host.Shapes.ILeft",
        "// impl Host.Shapes.IBase",
        "// impl Host.Shapes.IRight",
    ] {
        assert_eq!(text.matches(block).count(), 1, "{}", block);
    }
}

#[test]
fn test_emitted_identity_matches_path_hash() {
    let graph = diamond();
    let source = emit(&graph, "crate");
    let id = TypeId::of_path("crate::host::shapes::IChild");
    assert_eq!(graph.find("Host.Shapes.IChild").unwrap().type_id, id);
    assert!(section(&source, "IChild").contains(&format!("{:#018x}", id.raw())));
}

#[test]
fn test_emitted_reference_return_is_optional() {
    let graph = diamond();
    let source = emit(&graph, "crate");
    assert!(section(&source, "IChild").contains(
        "pub fn child(&self) -> hashbridge_abi::InteropResult<::std::option::Option<crate::host::shapes::IBase>> {"
    ));
}

#[test]
fn test_exclusions_listed_in_header() {
    let graph = diamond();
    let source = emit(&graph, "crate");
    assert!(source.starts_with("// Generated by hashbridge-bindgen. Do not edit."));
    assert!(source.contains("//   excluded Host.Shapes.IChild::TryFind: parameter 'found' is passed by reference"));
}
