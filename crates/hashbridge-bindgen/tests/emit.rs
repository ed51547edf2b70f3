//! Emitted source for the shapes fixture, compared against the checked-in
//! bindings that the runtime's native client tests compile and run.

use hashbridge_bindgen::emit::emit;
use hashbridge_bindgen::{GraphBuilder, GraphOptions, Metadata};

const SHAPES: &str = include_str!("fixtures/shapes.json");
const EXPECTED: &str = include_str!("fixtures/shapes.rs");

fn shapes_source() -> String {
    let metadata = Metadata::from_json(SHAPES).unwrap();
    let options = GraphOptions {
        services: vec!["Host.Services.IConfig".into()],
        ..Default::default()
    };
    let graph = GraphBuilder::new(&metadata, options).build().unwrap();
    emit(&graph, "crate")
}

#[test]
fn test_shapes_bindings_match_checked_in_source() {
    let source = shapes_source();
    if let Some((number, (actual, expected))) = source
        .lines()
        .zip(EXPECTED.lines())
        .enumerate()
        .find(|(_, (actual, expected))| actual != expected)
    {
        panic!(
            "line {} differs\n  emitted:  {}\n  expected: {}",
            number + 1,
            actual,
            expected
        );
    }
    assert_eq!(source, EXPECTED);
}

#[test]
fn test_emission_is_deterministic() {
    assert_eq!(shapes_source(), shapes_source());
}
