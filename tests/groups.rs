mod common;

use common::{assert_lines, item, list, list_registry, render_lines, TEXT};
use sdgen::catalog::c;
use sdgen::{GroupSpec, RenderOptions, Schema, TreeError, Value};

const BRACKETS: &str = r#"head="[" sep=", " rear="]" empty="(none)""#;

#[test]
fn groups_children_in_order_with_separators() {
    let registry = list_registry(BRACKETS);
    let labels = ["a", "b", "c", "d"];
    let node = list(&registry, "xs", &labels);
    assert_lines(&node, TEXT, &["xs:", "    [a", "    , b", "    , c", "    , d]"]);

    let lines = render_lines(&node, TEXT, &RenderOptions::default());
    let seps = lines.iter().filter(|l| l.trim_start().starts_with(", ")).count();
    assert_eq!(seps, labels.len() - 1);
}

#[test]
fn groups_single_child() {
    let registry = list_registry(BRACKETS);
    assert_lines(&list(&registry, "xs", &["a"]), TEXT, &["xs:", "    [a]"]);
}

#[test]
fn groups_empty_emits_only_empty_text() {
    let registry = list_registry(BRACKETS);
    assert_lines(&list(&registry, "xs", &[]), TEXT, &["xs:", "    (none)"]);

    let registry = list_registry(r#"head="[" sep=", " rear="]""#);
    assert_lines(&list(&registry, "xs", &[]), TEXT, &["xs:"]);
}

#[test]
fn groups_head_and_rear_on_their_own_lines() {
    let registry = list_registry(r#"head="{\n" rear="\n}" sep_eol=",""#);
    assert_lines(
        &list(&registry, "xs", &["a", "b", "c"]),
        TEXT,
        &["xs:", "    {", "    a,", "    b,", "    c", "    }"],
    );
    assert_lines(&list(&registry, "xs", &["a"]), TEXT, &["xs:", "    {", "    a", "    }"]);
}

#[test]
fn groups_single_line_form() {
    let registry = list_registry(r#"head="{\n" rear="\n}" sep_eol="," front0="{ " rear0=" }""#);
    assert_lines(&list(&registry, "xs", &["a"]), TEXT, &["xs:", "    { a }"]);
    assert_lines(
        &list(&registry, "xs", &["a", "b"]),
        TEXT,
        &["xs:", "    {", "    a,", "    b", "    }"],
    );

    // With only `front0` given, `rear0` is the whole of `rear`.
    let registry = list_registry(r#"head="<" rear=">" front0="<<""#);
    assert_lines(&list(&registry, "xs", &["a"]), TEXT, &["xs:", "    <<a>"]);
}

#[test]
fn groups_lead_and_tail_wrap_every_line() {
    let registry = list_registry(r#"lead="- " tail=";""#);
    assert_lines(
        &list(&registry, "xs", &["a", "b"]),
        TEXT,
        &["xs:", "    - a;", "    - b;"],
    );
}

#[test]
fn groups_several_sources() {
    let mut registry = list_registry("");
    registry
        .register(
            Schema::new("Pair")
                .group(GroupSpec::new("Left"))
                .group(GroupSpec::new("Right"))
                .attr("middle", Value::None)
                .template(TEXT, r#"{*Left, .middle, *Right sep=" | "}"#),
        )
        .unwrap();
    let mut pair = registry.new_node("Pair", vec![], vec![]).unwrap();
    pair.insert(item(&registry, "l"), Some("Left"), None).unwrap();
    pair.insert(item(&registry, "r2"), Some("Right"), None).unwrap();
    pair.insert(item(&registry, "r1"), Some("Right"), Some(0))
        .unwrap();
    assert_lines(&pair, TEXT, &["l", " | r1", " | r2"]);

    pair.set_attr("middle", Value::list(["m1", "m2"])).unwrap();
    assert_lines(&pair, TEXT, &["l", " | m1", " | m2", " | r1", " | r2"]);
}

#[test]
fn groups_reject_invalid_children() {
    let registry = c::registry().unwrap();
    let mut switch = registry.new_node("Switch", vec!["x".into()], vec![]).unwrap();
    switch
        .add(registry.new_node("Case", vec!["1".into()], vec![]).unwrap())
        .unwrap();
    switch
        .add(registry.new_node("DefaultCase", vec![], vec![]).unwrap())
        .unwrap();

    let second_default = registry.new_node("DefaultCase", vec![], vec![]).unwrap();
    let second_id = second_default.id();
    match switch.add(second_default).unwrap_err() {
        TreeError::InvalidChild {
            parent,
            parent_id,
            child,
            child_id,
            group,
            ..
        } => {
            assert_eq!(parent, "Switch");
            assert_eq!(parent_id, switch.id());
            assert_eq!(child, "DefaultCase");
            assert_eq!(child_id, second_id);
            assert_eq!(group, "Default");
        }
        other => panic!("expected InvalidChild, got {:?}", other),
    }

    let statement = registry.new_node("Statement", vec!["f()".into()], vec![]).unwrap();
    assert!(matches!(
        switch.insert(statement, Some("Case"), None),
        Err(TreeError::InvalidChild { .. })
    ));
    assert_eq!(switch.children("Case").unwrap().len(), 1);
    assert_eq!(switch.children("Default").unwrap().len(), 1);

    let block = registry.new_node("Block", vec![], vec![]).unwrap();
    assert!(matches!(
        switch.insert(block, Some("Nope"), None),
        Err(TreeError::UnknownGroup { .. })
    ));
    let case = registry.new_node("Case", vec!["2".into()], vec![]).unwrap();
    assert!(matches!(
        switch.insert(case, None, Some(7)),
        Err(TreeError::IndexOutOfRange { index: 7, len: 1, .. })
    ));
}

#[test]
fn groups_trailer_follows_the_last_branch() {
    let registry = c::registry().unwrap();
    let block = || registry.new_node("Block", vec![], vec![]).unwrap();
    let trailers = |node: &sdgen::Node| {
        node.groups()
            .flat_map(|(_, children)| children.iter())
            .map(|child| child.trailer().to_string())
            .collect::<Vec<_>>()
    };

    let mut if_ = registry.new_node("If", vec!["x".into()], vec![]).unwrap();
    if_.add(block()).unwrap();
    assert_eq!(trailers(&if_), vec![";"]);

    let elseif = registry.new_node("Elseif", vec!["y".into()], vec![]).unwrap();
    if_.add(elseif).unwrap();
    assert_eq!(trailers(&if_), vec!["", ";"]);

    if_.add(registry.new_node("Else", vec![], vec![]).unwrap())
        .unwrap();
    assert_eq!(trailers(&if_), vec!["", "", ";"]);

    let removed = if_.remove("Else", 0).unwrap();
    assert_eq!(removed.type_name(), "Else");
    assert_eq!(trailers(&if_), vec!["", ";"]);

    if_.add(registry.new_node("Else", vec![], vec![]).unwrap())
        .unwrap();
    let err = if_.add(registry.new_node("Else", vec![], vec![]).unwrap());
    assert!(matches!(err, Err(TreeError::InvalidChild { .. })));
}

#[test]
fn groups_preferred_and_default_groups() {
    let registry = c::registry().unwrap();
    let mut function = registry
        .new_node("Function", vec!["int".into(), "f".into()], vec![])
        .unwrap();
    function
        .add(registry.new_node("Var", vec!["int".into(), "i".into()], vec![]).unwrap())
        .unwrap();
    function
        .add(registry.new_node("Statement", vec!["i = 0".into()], vec![]).unwrap())
        .unwrap();
    assert_eq!(function.children("Decl").unwrap().len(), 1);
    assert_eq!(function.children("Body").unwrap().len(), 1);

    let mut var = registry.new_node("Var", vec![], vec![]).unwrap();
    let err = var.add(registry.new_node("Var", vec![], vec![]).unwrap());
    assert!(matches!(err, Err(TreeError::NoGroups { .. })));
    assert!(var.set_attr("name", "n").is_ok());
}

#[test]
fn groups_lookup_and_traversal() {
    let registry = c::registry().unwrap();
    let mut module = registry.new_node("Module", vec![], vec![]).unwrap();
    let mut function = registry
        .new_node("Function", vec!["void".into(), "run".into()], vec![])
        .unwrap();
    function
        .add(registry.new_node("Var", vec!["int".into(), "count".into()], vec![]).unwrap())
        .unwrap();
    let statement = registry.new_node("Statement", vec!["count++".into()], vec![]).unwrap();
    let statement_id = statement.id();
    function.add(statement).unwrap();
    module.add(function).unwrap();

    assert!(module.has_child("run", false));
    assert!(!module.has_child("count", false));
    assert_eq!(module.find("count", true).unwrap().type_name(), "Var");

    let auto_name = format!("__Statement_{}", statement_id.get());
    assert_eq!(module.find(&auto_name, true).unwrap().id(), statement_id);

    let order = module
        .descendants()
        .map(|node| node.type_name().to_owned())
        .collect::<Vec<_>>();
    assert_eq!(order, vec!["Function", "Var", "Statement"]);

    let outline = module.to_string();
    assert!(outline.starts_with("Module __Module_"));
    assert!(outline.contains("    Function run"));
    assert!(outline.contains("  *Decl"));
    assert!(outline.contains(".code = \"count++\""));
}

#[test]
fn groups_ids_are_unique_and_increasing() {
    let registry = list_registry("");
    let ids = (0..10)
        .map(|_| item(&registry, "x").id().get())
        .collect::<Vec<_>>();
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
}
