#![allow(unused)]

use sdgen::{render, GroupSpec, Node, Registry, RenderOptions, Schema, Value};
use tracing_subscriber::EnvFilter;

pub const TEXT: &str = "text";

/// Install a subscriber once per test binary. Set `RUST_LOG=sdgen=trace` to see the engine work.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn compare_lines(message: &str, actual: &[String], expected: &[&str]) {
    if actual != expected {
        eprintln!(
            "{}\nEXPECTED:\n{}\nACTUAL:\n{}\n=========",
            message,
            expected.join("\n"),
            actual.join("\n"),
        );
        assert_eq!(actual, expected);
    }
}

pub fn render_lines(node: &Node, format: &str, options: &RenderOptions) -> Vec<String> {
    render(node, format, options)
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|err| panic!("render failed: {}", err))
}

/// Render twice, checking both renderings against `expected`.
#[track_caller]
pub fn assert_lines_with(node: &Node, format: &str, options: &RenderOptions, expected: &[&str]) {
    init_logging();
    let lines = render_lines(node, format, options);
    compare_lines(&format!("IN FORMAT {}", format), &lines, expected);
    let again = render_lines(node, format, options);
    compare_lines(&format!("RENDERING {} AGAIN", format), &again, expected);
}

#[track_caller]
pub fn assert_lines(node: &Node, format: &str, expected: &[&str]) {
    assert_lines_with(node, format, &RenderOptions::default(), expected);
}

/// `Item` (a label) and `List` (a name and a group of items) with the given expansion
/// modifiers around the items, all under format `text`.
pub fn list_registry(modifiers: &str) -> Registry {
    let mut registry = Registry::new();
    registry
        .register(
            Schema::new("Item")
                .attr("label", "")
                .positional(&["label"])
                .template(TEXT, "{label}"),
        )
        .unwrap();
    registry
        .register(
            Schema::new("List")
                .attr("name", "")
                .positional(&["name"])
                .group(GroupSpec::new("Items"))
                .template(TEXT, &format!("{{name}}:\n>{{*Items {}}}", modifiers)),
        )
        .unwrap();
    registry
}

pub fn list(registry: &Registry, name: &str, labels: &[&str]) -> Node {
    let mut list = registry.new_node("List", vec![name.into()], vec![]).unwrap();
    for label in labels {
        list.add(item(registry, label)).unwrap();
    }
    list
}

pub fn item(registry: &Registry, label: &str) -> Node {
    registry
        .new_node("Item", vec![Value::from(label)], vec![])
        .unwrap()
}
