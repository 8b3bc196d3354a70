use super::{Node, TreeError};
use crate::render::RenderError;
use crate::schema::TRAILER;
use crate::template::AttrPath;
use crate::value::Value;
use std::sync::Arc;

const NONE: &Value = &Value::None;

impl Node {
    /// Store an attribute value, running it through the attribute's converter. `trailer` is
    /// stored as given.
    pub fn set_attr(&mut self, name: &str, value: impl Into<Value>) -> Result<(), TreeError> {
        let value = value.into();
        if name == TRAILER {
            self.trailer = value;
            return Ok(());
        }
        let spec = self
            .node_type
            .attribute(name)
            .ok_or_else(|| TreeError::UnknownAttribute {
                type_name: self.type_name().to_owned(),
                attr: name.to_owned(),
            })?;
        let value = spec.convert(value)?;
        match self.attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => self.attrs.push((name.to_owned(), value)),
        }
        Ok(())
    }

    pub fn set_trailer(&mut self, trailer: &str) {
        self.trailer = Value::Str(trailer.to_owned());
    }

    pub fn trailer(&self) -> &Value {
        &self.trailer
    }

    /// Let attributes missing from this node (and without a type default) be looked up on
    /// `prototype`.
    pub fn set_prototype(&mut self, prototype: Arc<Node>) {
        self.prototype = Some(prototype);
    }

    pub fn prototype(&self) -> Option<&Node> {
        self.prototype.as_deref()
    }

    pub(crate) fn has_own_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(n, _)| n == name)
    }

    /// Look up a single attribute name: the value set on this node, else the type's default,
    /// else the prototype's value. A default of `None` counts as no default. An attribute that
    /// is declared but found nowhere is `None`.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        if name == TRAILER {
            return Some(&self.trailer);
        }
        if let Some((_, value)) = self.attrs.iter().find(|(n, _)| n == name) {
            return Some(value);
        }
        let spec = self.node_type.attribute(name);
        if let Some(spec) = spec {
            if !spec.default().is_none() {
                return Some(spec.default());
            }
        }
        if let Some(value) = self.prototype.as_ref().and_then(|p| p.lookup(name)) {
            return Some(value);
        }
        spec.map(|_| NONE)
    }

    /// Resolve a dotted attribute path. Every segment but the last must name a node-valued
    /// attribute.
    pub fn resolve(&self, path: &AttrPath) -> Result<&Value, RenderError> {
        let not_found = || RenderError::AttributeNotFound {
            node: self.id,
            type_name: self.type_name().to_owned(),
            path: path.to_string(),
        };
        let (last, init) = path.segments().split_last().ok_or_else(not_found)?;
        let mut node = self;
        for segment in init {
            node = node
                .lookup(segment)
                .and_then(Value::as_node)
                .ok_or_else(not_found)?;
        }
        node.lookup(last).ok_or_else(not_found)
    }

    /// Resolve a dotted path given as a string, like `then.condition`.
    pub fn get(&self, path: &str) -> Result<&Value, RenderError> {
        self.resolve(&AttrPath(path.split('.').map(str::to_owned).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    fn var_type() -> Arc<crate::schema::NodeType> {
        Schema::new("Var")
            .attr("name", "")
            .attr("type", "int")
            .attr("init", Value::None)
            .attr_with("comment", Value::None, |v| {
                Ok(Value::Str(format!("/* {} */", v)))
            })
            .positional(&["type", "name"])
            .build()
            .unwrap()
    }

    #[test]
    fn own_then_default_then_prototype() {
        let var = var_type();
        let mut proto = Node::new(var.clone(), vec![], vec![("init", Value::from(0))]).unwrap();
        proto.set_attr("name", "proto").unwrap();
        let mut node = Node::new(var, vec!["long".into()], vec![]).unwrap();
        node.set_prototype(Arc::new(proto));

        assert_eq!(node.get("type").unwrap(), &Value::from("long"));
        // A non-empty default wins over the prototype.
        assert_eq!(node.get("name").unwrap(), &Value::from(""));
        assert_eq!(node.get("init").unwrap(), &Value::Int(0));
        assert_eq!(node.get("comment").unwrap(), &Value::None);
    }

    #[test]
    fn conversion_runs_once_at_set_time() {
        let mut node = Node::new(var_type(), vec![], vec![]).unwrap();
        node.set_attr("comment", "counter").unwrap();
        assert_eq!(node.get("comment").unwrap(), &Value::from("/* counter */"));
        assert_eq!(node.get("comment").unwrap(), &Value::from("/* counter */"));
    }

    #[test]
    fn unknown_paths() {
        let mut node = Node::new(var_type(), vec![], vec![]).unwrap();
        match node.get("missing") {
            Err(RenderError::AttributeNotFound { path, type_name, .. }) => {
                assert_eq!(path, "missing");
                assert_eq!(type_name, "Var");
            }
            other => panic!("expected AttributeNotFound, got {:?}", other),
        }
        // `type` is a string, not a node.
        assert!(node.get("type.name").is_err());
        assert!(matches!(
            node.set_attr("missing", 1),
            Err(TreeError::UnknownAttribute { .. })
        ));
    }
}
