//! XML documents: elements with width-wrapped attribute lists, comments, and text.

use super::words;
use crate::node::{Node, TreeError};
use crate::render::{GenContext, RenderError};
use crate::schema::{GroupSpec, Registry, Schema, SchemaError};
use crate::value::Value;

pub const XML_FORMAT: &str = "xml_format";

/// Register `Document`, `Element`, `Empty`, `Comment` and `Text`.
pub fn registry() -> Result<Registry, SchemaError> {
    let mut registry = Registry::new();

    registry.register(
        Schema::new("Document")
            .attr("version", "1.0")
            .attr("encoding", "utf-8")
            .group(GroupSpec::new("Body"))
            .indent_unit("  ")
            .template(
                XML_FORMAT,
                "
                <?xml version=\"{version}\" encoding=\"{encoding}\"?>
                {*Body}
                ",
            ),
    )?;

    let element = registry.register(
        Schema::new("Element")
            .attr("tag", "")
            .attr_with("attrs", Value::None, attribute_pairs)
            .positional(&["tag"])
            .group(GroupSpec::new("Body"))
            .indent_unit("  ")
            .generator("attr_values", attr_values)
            .template(
                XML_FORMAT,
                "
                <{tag}{>@attr_values lead=\" \"}>
                >{*Body}
                </{tag}>
                ",
            ),
    )?;

    registry.register(
        Schema::derive("Empty", &element)
            .leaf()
            .template(XML_FORMAT, "<{tag}{>@attr_values lead=\" \"} />"),
    )?;

    registry.register(
        Schema::new("Comment")
            .attr("text", "")
            .positional(&["text"])
            .generator("words", words)
            .template(XML_FORMAT, "<!-- {>@words rear=\" -->\"}"),
    )?;

    registry.register(
        Schema::new("Text")
            .attr_with("text", "", escape)
            .positional(&["text"])
            .template(XML_FORMAT, "{.text}"),
    )?;

    Ok(registry)
}

/// Escape the characters XML reserves in character data and attribute values.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape(value: Value) -> Result<Value, TreeError> {
    match value {
        Value::Str(text) => Ok(Value::Str(escape_text(&text))),
        other => Ok(other),
    }
}

/// Converts a list of `[name, value]` pairs into a list of `name="value"` strings.
fn attribute_pairs(value: Value) -> Result<Value, TreeError> {
    let conversion = |message: &str| TreeError::Conversion {
        attr: "attrs".to_owned(),
        message: message.to_owned(),
    };
    let pairs = match value {
        Value::None => return Ok(Value::None),
        Value::List(pairs) => pairs,
        _ => return Err(conversion("expected a list of [name, value] pairs")),
    };
    let mut attrs = Vec::with_capacity(pairs.len());
    for pair in pairs {
        match pair.as_list() {
            Some([name, value]) if name.is_scalar() && value.is_scalar() => {
                attrs.push(Value::Str(format!(
                    "{}=\"{}\"",
                    name,
                    escape_text(&value.to_string())
                )));
            }
            _ => return Err(conversion("expected a [name, value] pair")),
        }
    }
    Ok(Value::List(attrs))
}

fn attr_values(node: &Node, cx: &GenContext) -> Result<Vec<String>, RenderError> {
    match node.get("attrs")? {
        Value::None => Ok(Vec::new()),
        Value::List(attrs) => {
            let tokens = attrs.iter().map(Value::to_string).collect::<Vec<_>>();
            Ok(cx.wrap(&tokens))
        }
        _ => Err(RenderError::generator(
            node,
            "attr_values",
            "`attrs` is not a list",
        )),
    }
}

/// Build an element with attributes from `(name, value)` pairs.
pub fn element(
    registry: &Registry,
    type_name: &str,
    tag: &str,
    attrs: &[(&str, &str)],
) -> Result<Node, TreeError> {
    let pairs = attrs
        .iter()
        .map(|(name, value)| Value::list([*name, *value]))
        .collect::<Vec<_>>();
    let attrs = if pairs.is_empty() {
        Value::None
    } else {
        Value::List(pairs)
    };
    registry.new_node(type_name, vec![tag.into()], vec![("attrs", attrs)])
}
