mod common;

use common::{assert_lines, render_lines, TEXT};
use sdgen::{GroupSpec, Node, Registry, RenderOptions, Schema, Scope, ScopeRule, TreeError};

const HEADER_PASS: &str = "header";

/// `Unit` propagates scope changes to its children, `Pinned` ignores changes coming from its
/// ancestors, and `Confined` keeps its children in body scope.
fn registry() -> Registry {
    let mut registry = Registry::new();
    let unit = registry
        .register(
            Schema::new("Unit")
                .attr("label", "")
                .positional(&["label"])
                .group(GroupSpec::new("Items"))
                .template(TEXT, "{label}\n>{*Items}")
                .template(HEADER_PASS, "{label}\n>{*Items}")
                .scope_pass(HEADER_PASS, Scope::Header),
        )
        .unwrap();
    registry
        .register(Schema::derive("Pinned", &unit).scope_rule(ScopeRule::Own))
        .unwrap();
    registry
        .register(Schema::derive("Confined", &unit).scope_rule(ScopeRule::Confine(Scope::Body)))
        .unwrap();
    registry
}

fn new(registry: &Registry, type_name: &str, label: &str) -> Node {
    registry
        .new_node(type_name, vec![label.into()], vec![])
        .unwrap()
}

fn scopes(node: &Node) -> Vec<(String, Scope)> {
    node.descendants()
        .map(|n| (n.get("label").unwrap().to_string(), n.scope()))
        .collect()
}

fn tree(registry: &Registry) -> Node {
    let mut root = new(registry, "Unit", "root");
    for (type_name, label) in [("Unit", "a"), ("Pinned", "p"), ("Confined", "c")] {
        let mut child = new(registry, type_name, label);
        child.add(new(registry, "Unit", &format!("{}1", label))).unwrap();
        root.add(child).unwrap();
    }
    root
}

#[test]
fn scope_children_inherit_on_insertion() {
    let registry = registry();
    let mut root = new(&registry, "Unit", "root");
    root.update_scope(Scope::Header).unwrap();

    root.add(new(&registry, "Unit", "plain")).unwrap();
    let mut narrowed = new(&registry, "Unit", "narrowed");
    narrowed.update_scope(Scope::Body).unwrap();
    root.add(narrowed).unwrap();
    root.add(new(&registry, "Pinned", "pinned")).unwrap();
    let mut confined = new(&registry, "Confined", "confined");
    confined.add(new(&registry, "Unit", "inner")).unwrap();
    root.add(confined).unwrap();

    assert_eq!(
        scopes(&root),
        vec![
            ("plain".to_owned(), Scope::Header),
            ("narrowed".to_owned(), Scope::Body),
            ("pinned".to_owned(), Scope::Both),
            ("confined".to_owned(), Scope::Header),
            ("inner".to_owned(), Scope::Body),
        ]
    );
}

#[test]
fn scope_updates_respect_scope_rules() {
    let registry = registry();
    let mut root = tree(&registry);
    root.update_scope(Scope::Header).unwrap();
    assert_eq!(
        scopes(&root),
        vec![
            ("a".to_owned(), Scope::Header),
            ("a1".to_owned(), Scope::Header),
            ("p".to_owned(), Scope::Both),
            ("p1".to_owned(), Scope::Both),
            ("c".to_owned(), Scope::Header),
            ("c1".to_owned(), Scope::Body),
        ]
    );

    // A node that owns its scope still follows an update aimed at itself.
    root.update_child("Items", 1, |mut child| child.update_scope(Scope::Body))
        .unwrap();
    assert_eq!(
        &scopes(&root)[2..4],
        &[("p".to_owned(), Scope::Body), ("p1".to_owned(), Scope::Body)]
    );

    root.update_scope(Scope::Both).unwrap();
    assert_eq!(
        scopes(&root)
            .into_iter()
            .map(|(_, scope)| scope)
            .collect::<Vec<_>>(),
        vec![
            Scope::Both,
            Scope::Both,
            Scope::Body,
            Scope::Body,
            Scope::Both,
            Scope::Body
        ]
    );
}

#[test]
fn scope_filters_children_per_pass() {
    let registry = registry();
    let mut root = tree(&registry);
    root.update_child("Items", 0, |mut child| child.update_scope(Scope::Body))
        .unwrap();

    assert_lines(
        &root,
        TEXT,
        &["root", "    a", "        a1", "    p", "        p1", "    c", "        c1"],
    );
    // `c1` was confined to the body when it joined `c`.
    assert_lines(&root, HEADER_PASS, &["root", "    p", "        p1", "    c"]);
}

#[test]
fn scope_of_rendered_nodes_is_frozen_on_insertion() {
    let registry = registry();
    let mut root = new(&registry, "Unit", "root");
    root.update_scope(Scope::Header).unwrap();

    let mut rendered = new(&registry, "Unit", "rendered");
    rendered.add(new(&registry, "Unit", "inner")).unwrap();
    render_lines(&rendered, TEXT, &RenderOptions::default());
    assert!(matches!(
        rendered.update_scope(Scope::Header),
        Err(TreeError::ScopeFrozen { .. })
    ));

    let err = root.add(rendered).unwrap_err();
    assert!(matches!(err, TreeError::ScopeFrozen { .. }));
    assert!(root.children("Items").unwrap().is_empty());

    // A rendered node whose scope would not change is still welcome.
    let mut narrowed = new(&registry, "Unit", "narrowed");
    narrowed.update_scope(Scope::Header).unwrap();
    render_lines(&narrowed, TEXT, &RenderOptions::default());
    root.add(narrowed).unwrap();
    assert_eq!(root.children("Items").unwrap().len(), 1);
}
