mod geometry;
mod infra;
mod node;
mod render;
mod schema;
mod template;
mod value;

pub mod catalog;

pub use geometry::{str_width, Width, DECORATION_WIDTH};
pub use node::{Descendants, Node, NodeId, NodeMut, Scope, TreeError};
pub use render::{
    render, render_to_string, wrap_tokens, write_to_stream, GenContext, Lines, RenderError,
    RenderOptions, WriteError,
};
pub use schema::{
    AttrSpec, Converter, Generator, GroupSpec, NodeType, Registry, Schema, SchemaError,
    ScopeRule, TrailerRule, DEFAULT_INDENT_UNIT, TRAILER,
};
pub use template::{
    AttrPath, CompiledTemplate, Expansion, Fragment, Modifiers, Source, TemplateError,
    TemplateErrorKind, TemplateLine,
};
pub use value::Value;
