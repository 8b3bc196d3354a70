//! Nodes: typed tree entities with attributes and grouped children.

mod children;
mod resolve;
mod scope;

pub use children::{Descendants, NodeMut};
pub use scope::Scope;

use crate::schema::NodeType;
use crate::value::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide unique node identity. Only for identity and debugging: ids say nothing about
/// tree position or creation order within a tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    fn fresh() -> NodeId {
        NodeId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub struct Node {
    id: NodeId,
    node_type: Arc<NodeType>,
    /// Attributes set on this node, in the order they were first set.
    attrs: Vec<(String, Value)>,
    /// Parallel to `node_type.groups()`.
    groups: Vec<Vec<Node>>,
    scope: Scope,
    trailer: Value,
    prototype: Option<Arc<Node>>,
    /// Set by the first render; scope changes are refused afterwards.
    rendered: AtomicBool,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("no node type named `{0}` is registered")]
    UnknownType(String),
    #[error("node type `{type_name}` has no attribute `{attr}`")]
    UnknownAttribute { type_name: String, attr: String },
    #[error("node type `{type_name}` takes {expected} positional arguments, got {found}")]
    TooManyArguments {
        type_name: String,
        expected: usize,
        found: usize,
    },
    #[error("attribute `{attr}` of node type `{type_name}` given both positionally and by name")]
    DuplicateArgument { type_name: String, attr: String },
    #[error("node type `{type_name}` has no children group `{group}`")]
    UnknownGroup { type_name: String, group: String },
    #[error("node type `{type_name}` has no children groups")]
    NoGroups { type_name: String },
    #[error("index {index} is out of range for group `{group}` of length {len}")]
    IndexOutOfRange {
        group: String,
        index: usize,
        len: usize,
    },
    #[error("cannot insert {child} {child_id} into group `{group}` of {parent} {parent_id}: {reason}")]
    InvalidChild {
        parent: String,
        parent_id: NodeId,
        child: String,
        child_id: NodeId,
        group: String,
        reason: String,
    },
    #[error("scope of {type_name} {node} cannot change after it has been rendered")]
    ScopeFrozen { type_name: String, node: NodeId },
    #[error("attribute `{attr}`: {message}")]
    Conversion { attr: String, message: String },
}

impl Node {
    /// Build a node of `node_type`. Positional arguments fill the type's positional attributes
    /// in order, then its rest attribute (as a list); keyword arguments fill attributes by name.
    /// Every value passes through the attribute's converter.
    pub fn new(
        node_type: Arc<NodeType>,
        positional: Vec<Value>,
        keyword: Vec<(&str, Value)>,
    ) -> Result<Node, TreeError> {
        let mut node = Node {
            id: NodeId::fresh(),
            groups: node_type.groups().iter().map(|_| Vec::new()).collect(),
            scope: node_type.scope(),
            trailer: Value::Str(node_type.default_trailer().to_owned()),
            attrs: Vec::new(),
            prototype: None,
            rendered: AtomicBool::new(false),
            node_type,
        };

        let declared = node.node_type.positional().len();
        let found = positional.len();
        let mut positional = positional.into_iter();
        let names = node.node_type.positional().to_vec();
        for (name, value) in names.iter().zip(positional.by_ref()) {
            node.set_attr(name, value)?;
        }
        let extra = positional.collect::<Vec<_>>();
        if !extra.is_empty() {
            match node.node_type.rest().map(str::to_owned) {
                Some(rest) => node.set_attr(&rest, Value::List(extra))?,
                None => {
                    return Err(TreeError::TooManyArguments {
                        type_name: node.type_name().to_owned(),
                        expected: declared,
                        found,
                    })
                }
            }
        }

        for (name, value) in keyword {
            if node.has_own_attr(name) {
                return Err(TreeError::DuplicateArgument {
                    type_name: node.type_name().to_owned(),
                    attr: name.to_owned(),
                });
            }
            node.set_attr(name, value)?;
        }

        trace!(id = node.id.get(), node_type = node.type_name(), "new node");
        Ok(node)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node_type(&self) -> &NodeType {
        &self.node_type
    }

    pub fn type_name(&self) -> &str {
        self.node_type.name()
    }

    /// The node's `name` attribute, or `__<Type>_<id>` if it has none.
    pub fn name(&self) -> String {
        match self.lookup("name") {
            Some(value) if value.is_scalar() && value.is_truthy() => value.to_string(),
            _ => format!("__{}_{}", self.type_name(), self.id.get()),
        }
    }

    pub(crate) fn mark_rendered(&self) {
        self.rendered.store(true, Ordering::Relaxed);
    }

    pub(crate) fn is_rendered(&self) -> bool {
        self.rendered.load(Ordering::Relaxed)
    }

    fn fmt_outline(&self, f: &mut fmt::Formatter, depth: usize) -> fmt::Result {
        let pad = "    ".repeat(depth);
        writeln!(
            f,
            "{}{} {} {} [{}]",
            pad,
            self.type_name(),
            self.name(),
            self.id,
            self.scope
        )?;
        for (name, value) in &self.attrs {
            if let Value::Node(node) = value {
                writeln!(f, "{}  .{} =", pad, name)?;
                node.fmt_outline(f, depth + 1)?;
            } else {
                writeln!(f, "{}  .{} = {:?}", pad, name, value.to_string())?;
            }
        }
        for (spec, children) in self.node_type.groups().iter().zip(&self.groups) {
            if children.is_empty() {
                continue;
            }
            writeln!(f, "{}  *{}", pad, spec.name())?;
            for child in children {
                child.fmt_outline(f, depth + 1)?;
            }
        }
        Ok(())
    }
}

/// Nodes are equal only to themselves.
impl PartialEq for Node {
    fn eq(&self, other: &Node) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("type", &self.type_name())
            .field("scope", &self.scope)
            .field("attrs", &self.attrs)
            .field("groups", &self.groups)
            .finish()
    }
}

/// An indented outline of the node, its attributes, and its children.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_outline(f, 0)
    }
}
