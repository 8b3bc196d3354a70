use super::{NodeType, Schema, SchemaError};
use crate::infra::span;
use crate::node::{Node, TreeError};
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// The node types known to a program, by name. Types are registered once, at startup; every
/// declared template is compiled during registration, so a bad template fails there and not
/// during some later render.
#[derive(Default)]
pub struct Registry {
    types: HashMap<String, Arc<NodeType>>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    pub fn register(&mut self, schema: Schema) -> Result<Arc<NodeType>, SchemaError> {
        span!("register type");

        if self.types.contains_key(&schema.name) {
            return Err(SchemaError::DuplicateType(schema.name));
        }
        let node_type = schema.build()?;
        debug!(
            node_type = node_type.name(),
            formats = node_type.formats().count(),
            "registered node type"
        );
        self.types
            .insert(node_type.name().to_owned(), node_type.clone());
        Ok(node_type)
    }

    pub fn get(&self, type_name: &str) -> Result<&Arc<NodeType>, TreeError> {
        self.types
            .get(type_name)
            .ok_or_else(|| TreeError::UnknownType(type_name.to_owned()))
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Construct a node of the named type. See `Node::new`.
    pub fn new_node(
        &self,
        type_name: &str,
        positional: Vec<Value>,
        keyword: Vec<(&str, Value)>,
    ) -> Result<Node, TreeError> {
        Node::new(self.get(type_name)?.clone(), positional, keyword)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}
