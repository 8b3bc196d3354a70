//! Rendering a node tree into lines of text.

mod expansion;
mod lines;
mod options;
mod wrap;

pub use options::RenderOptions;
pub use wrap::{wrap_tokens, GenContext};

use crate::geometry::{indented, str_width};
use crate::infra::span;
use crate::node::{Node, NodeId};
use lines::{node_lines, LineIter};
use std::fmt;
use std::io::Write;
use tracing::debug;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("{type_name} {node}: attribute `{path}` not found")]
    AttributeNotFound {
        node: NodeId,
        type_name: String,
        path: String,
    },
    #[error("{type_name} {node}: attribute `{path}` holds a list or node and cannot be substituted into a line")]
    NotScalar {
        node: NodeId,
        type_name: String,
        path: String,
    },
    #[error("{type_name} {node}: no children group `{group}`")]
    UnknownGroup {
        node: NodeId,
        type_name: String,
        group: String,
    },
    #[error("{type_name} {node}: no template for format `{format}`")]
    MissingTemplate {
        node: NodeId,
        type_name: String,
        format: String,
    },
    #[error("{type_name} {node}: generator `{generator}` failed: {message}")]
    Generator {
        node: NodeId,
        type_name: String,
        generator: String,
        message: String,
    },
}

impl RenderError {
    /// For generators to report that they cannot produce lines for `node`.
    pub fn generator(node: &Node, generator: &str, message: impl fmt::Display) -> RenderError {
        RenderError::Generator {
            node: node.id(),
            type_name: node.type_name().to_owned(),
            generator: generator.to_owned(),
            message: message.to_string(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum WriteError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// What every node rendered in one call shares.
#[derive(Clone, Copy)]
pub(crate) struct Frame<'a> {
    pub node: &'a Node,
    pub format: &'a str,
    pub options: &'a RenderOptions,
}

/// Lazily rendered lines. After the first error, no more lines are produced; lines already
/// produced stay valid as far as they go.
pub struct Lines<'a> {
    inner: LineIter<'a>,
    unit: &'a str,
    base_indent: usize,
    failed: bool,
}

impl<'a> Iterator for Lines<'a> {
    type Item = Result<String, RenderError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.inner.next()? {
            Ok(line) => Some(Ok(indented(self.unit, self.base_indent, line))),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

/// Render `node` under `format`. Lines are produced on demand; take only as many as you need.
///
/// Rendering the same unchanged tree again produces the same lines. The first render of a node
/// freezes its scope.
pub fn render<'a>(node: &'a Node, format: &'a str, options: &'a RenderOptions) -> Lines<'a> {
    span!("render");

    let unit = options.indent_unit(node.node_type().indent_unit());
    let offset = str_width(unit) * options.base_indent;
    let frame = Frame {
        node,
        format,
        options,
    };
    Lines {
        inner: node_lines(node, format, frame, offset),
        unit,
        base_indent: options.base_indent,
        failed: false,
    }
}

/// Render the whole of `node` into one string, lines separated by newlines.
pub fn render_to_string(
    node: &Node,
    format: &str,
    options: &RenderOptions,
) -> Result<String, RenderError> {
    let lines = render(node, format, options).collect::<Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}

/// Write every line of the rendering to `stream`, each followed by a newline. Returns the number
/// of lines written. On error, the lines before it have already been written.
pub fn write_to_stream<W: Write>(
    node: &Node,
    format: &str,
    options: &RenderOptions,
    stream: &mut W,
) -> Result<usize, WriteError> {
    span!("write to stream");

    let mut count = 0;
    for line in render(node, format, options) {
        writeln!(stream, "{}", line?)?;
        count += 1;
    }
    debug!(node = %node.id(), format, lines = count, "wrote rendering");
    Ok(count)
}
