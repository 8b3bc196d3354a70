//! A slice of C: modules, functions, declarations, and the common statements.
//!
//! Every type renders under `c_format` (the source file pass) and, where it can appear in a
//! header, `h_format` (the header pass). Functions and variables appear in both; marking one
//! `static` with [`make_static`] confines it to the source file.

use super::{comma_tokens, words};
use crate::node::{Node, NodeMut, Scope, TreeError};
use crate::render::{GenContext, RenderError};
use crate::schema::{GroupSpec, NodeType, Registry, Schema, SchemaError, ScopeRule};
use crate::value::Value;
use std::sync::Arc;

pub const C_FORMAT: &str = "c_format";
pub const H_FORMAT: &str = "h_format";

const BLOCK: &str = r"
    \{
    >{*Decl}
    >{*Body}
    \}{trailer}
";

/// Register the C node types: `Module`, `Comment`, `Var`, `Statement`, `Function`, `Block`,
/// `If`, `Elseif`, `Else`, `Switch`, `Case` and `DefaultCase`.
pub fn registry() -> Result<Registry, SchemaError> {
    let mut registry = Registry::new();

    let comment = registry.register(
        Schema::new("Comment")
            .attr("text", "")
            .positional(&["text"])
            .generator("words", words)
            .template(C_FORMAT, "/* {>@words rear=\" */\"}")
            .template(H_FORMAT, "/* {>@words rear=\" */\"}")
            .scope_pass(C_FORMAT, Scope::Body)
            .scope_pass(H_FORMAT, Scope::Header),
    )?;

    registry.register(
        Schema::new("Module")
            .attr("name", "")
            .attr_with("description", Value::None, to_comment(&comment))
            .group(GroupSpec::new("Decl"))
            .group(GroupSpec::new("Body"))
            .default_group("Body")
            .template(C_FORMAT, "{*description}\n{*Decl}\n{*Body sep=\"\\n\"}")
            .template(H_FORMAT, "{*description}\n{*Decl}\n{*Body sep=\"\\n\"}")
            .scope_pass(C_FORMAT, Scope::Body)
            .scope_pass(H_FORMAT, Scope::Header),
    )?;

    registry.register(
        Schema::new("Var")
            .attr("type", "int")
            .attr("name", "")
            .attr("init", Value::None)
            .attr("storage", "")
            .positional(&["type", "name", "init"])
            .preferred_group("Decl")
            .trailer(";")
            .template(
                C_FORMAT,
                "{.storage rear=\" \"}{type} {name}{.init head=\" = \"}{trailer}",
            )
            .template(H_FORMAT, "extern {type} {name}{trailer}")
            .scope_pass(C_FORMAT, Scope::Body)
            .scope_pass(H_FORMAT, Scope::Header),
    )?;

    registry.register(
        Schema::new("Statement")
            .attr_with("code", "", strip_semicolon)
            .positional(&["code"])
            .preferred_group("Body")
            .scope(Scope::Body)
            .trailer(";")
            .template(C_FORMAT, "{code}{trailer}")
            .scope_pass(C_FORMAT, Scope::Body),
    )?;

    registry.register(
        Schema::new("Function")
            .attr("return_type", "void")
            .attr("name", "")
            .attr("args", Value::None)
            .attr("storage", "")
            .attr_with("description", Value::None, to_comment(&comment))
            .positional(&["return_type", "name"])
            .rest("args")
            .group(GroupSpec::new("Decl"))
            .group(GroupSpec::new("Body"))
            .default_group("Body")
            .preferred_group("Body")
            .scope_rule(ScopeRule::Confine(Scope::Body))
            .generator("arg_list", arg_list)
            .template(
                C_FORMAT,
                "
                {*description}
                {.storage rear=\" \"}{return_type} {name} ({>@arg_list empty=\"void\"})
                \\{
                >{*Decl}
                >{*Body}
                \\}
                ",
            )
            .template(
                H_FORMAT,
                "
                {*description}
                {.storage rear=\" \"}{return_type} {name} ({>@arg_list empty=\"void\"});
                ",
            )
            .scope_pass(C_FORMAT, Scope::Body)
            .scope_pass(H_FORMAT, Scope::Header),
    )?;

    registry.register(block("Block").template(C_FORMAT, BLOCK))?;

    registry.register(
        Schema::new("If")
            .attr("condition", "")
            .positional(&["condition"])
            .group(GroupSpec::new("Then").accepting(&["Block"]).max_children(1))
            .group(GroupSpec::new("Elseif").accepting(&["Elseif"]))
            .group(GroupSpec::new("Else").accepting(&["Else"]).max_children(1))
            .default_group("Then")
            .preferred_group("Body")
            .scope(Scope::Body)
            .trailer_rule(&["Then", "Elseif", "Else"], ";", "")
            .template(
                C_FORMAT,
                "
                if ({condition})
                {*Then}
                {*Elseif}
                {*Else}
                ",
            )
            .scope_pass(C_FORMAT, Scope::Body),
    )?;

    // Branches are blocks of their own types, so that `Then` takes only a plain `Block`.
    registry.register(
        block("Elseif")
            .attr("condition", "")
            .positional(&["condition"])
            .preferred_group("Elseif")
            .template(C_FORMAT, &format!("else if ({{condition}})\n{}", BLOCK.trim())),
    )?;

    registry.register(
        block("Else")
            .preferred_group("Else")
            .template(C_FORMAT, &format!("else\n{}", BLOCK.trim())),
    )?;

    registry.register(
        Schema::new("Switch")
            .attr("value", "")
            .positional(&["value"])
            .group(GroupSpec::new("Case").accepting(&["Case"]))
            .group(
                GroupSpec::new("Default")
                    .accepting(&["DefaultCase"])
                    .max_children(1),
            )
            .preferred_group("Body")
            .scope(Scope::Body)
            .template(
                C_FORMAT,
                "
                switch ({value})
                \\{
                >{*Case}
                >{*Default}
                \\}
                ",
            )
            .scope_pass(C_FORMAT, Scope::Body),
    )?;

    registry.register(
        Schema::new("Case")
            .attr("label", "")
            .positional(&["label"])
            .group(GroupSpec::new("Body"))
            .scope(Scope::Body)
            .template(
                C_FORMAT,
                "
                case {label} :
                >{*Body}
                >break;
                ",
            )
            .scope_pass(C_FORMAT, Scope::Body),
    )?;

    registry.register(
        Schema::new("DefaultCase")
            .group(GroupSpec::new("Body"))
            .preferred_group("Default")
            .scope(Scope::Body)
            .template(
                C_FORMAT,
                "
                default :
                >{*Body}
                >break;
                ",
            )
            .scope_pass(C_FORMAT, Scope::Body),
    )?;

    Ok(registry)
}

/// A braced block with declarations and statements.
fn block(name: &str) -> Schema {
    Schema::new(name)
        .group(GroupSpec::new("Decl"))
        .group(GroupSpec::new("Body"))
        .default_group("Body")
        .scope(Scope::Body)
        .scope_pass(C_FORMAT, Scope::Body)
}

/// Restrict a function or variable to the source file: it gets `static` storage and body scope,
/// so header rendering leaves it out.
///
/// For a node already in a tree, pass it through `update_child`; for a detached node, use
/// `NodeMut::from(&mut node)`.
pub fn make_static(mut node: NodeMut) -> Result<(), TreeError> {
    node.update_scope(Scope::Body)?;
    node.set_attr("storage", "static")
}

fn strip_semicolon(value: Value) -> Result<Value, TreeError> {
    match value {
        Value::Str(code) => Ok(Value::Str(code.trim_end().trim_end_matches(';').to_owned())),
        other => Ok(other),
    }
}

/// Converter turning description text into a `Comment` node.
fn to_comment(
    comment: &Arc<NodeType>,
) -> impl Fn(Value) -> Result<Value, TreeError> + Send + Sync + 'static {
    let comment = comment.clone();
    move |value| match value {
        Value::Node(_) | Value::None => Ok(value),
        Value::Str(ref text) if text.is_empty() => Ok(Value::None),
        text => Ok(Value::from(Node::new(comment.clone(), vec![text], vec![])?)),
    }
}

fn arg_list(node: &Node, cx: &GenContext) -> Result<Vec<String>, RenderError> {
    let args = match node.get("args")? {
        Value::List(args) => args.iter().map(Value::to_string).collect::<Vec<_>>(),
        Value::None => Vec::new(),
        other => vec![other.to_string()],
    };
    Ok(cx.wrap(&comma_tokens(args)))
}
