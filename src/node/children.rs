use super::{Node, Scope, TreeError};
use crate::schema::GroupSpec;
use crate::value::Value;
use std::ops::Deref;
use std::sync::Arc;
use tracing::{trace, warn};

impl Node {
    /// The children of `group`, in insertion order.
    pub fn children(&self, group: &str) -> Result<&[Node], TreeError> {
        let index = self.group_index(group)?;
        Ok(&self.groups[index])
    }

    /// Change the child at `index` of `group` through `f`. The child can be changed but not
    /// swapped for another node, and the group's trailer rule is applied again afterwards.
    pub fn update_child<F, R>(&mut self, group: &str, index: usize, f: F) -> Result<R, TreeError>
    where
        F: FnOnce(NodeMut) -> Result<R, TreeError>,
    {
        let group_index = self.group_index(group)?;
        let len = self.groups[group_index].len();
        let child = self.groups[group_index]
            .get_mut(index)
            .ok_or_else(|| TreeError::IndexOutOfRange {
                group: group.to_owned(),
                index,
                len,
            })?;
        let result = f(NodeMut { node: child });
        self.fix_trailers(group);
        result
    }

    /// Put `child` in place of the child at `index` of `group`, returning the old one. The group's
    /// constraints are checked as if the old child were already gone; on violation nothing
    /// changes.
    pub fn replace(&mut self, group: &str, index: usize, mut child: Node) -> Result<Node, TreeError> {
        let group_index = self.group_index(group)?;
        let len = self.groups[group_index].len();
        if index >= len {
            return Err(TreeError::IndexOutOfRange {
                group: group.to_owned(),
                index,
                len,
            });
        }
        let old = self.groups[group_index].remove(index);
        let admitted = self
            .admit(group_index, &child)
            .and_then(|()| self.adopt_scope(&mut child));
        match admitted {
            Ok(()) => {
                trace!(
                    parent = self.id.get(),
                    old = old.id.get(),
                    new = child.id.get(),
                    %group,
                    "replace"
                );
                self.groups[group_index].insert(index, child);
                self.fix_trailers(group);
                Ok(old)
            }
            Err(err) => {
                self.groups[group_index].insert(index, old);
                Err(err)
            }
        }
    }

    /// All groups with their children, in declaration order.
    pub fn groups(&self) -> impl Iterator<Item = (&GroupSpec, &[Node])> {
        self.node_type
            .groups()
            .iter()
            .zip(self.groups.iter().map(Vec::as_slice))
    }

    /// Insert `child` into `group` at `index` (appending if `None`).
    ///
    /// Without an explicit group the child goes to its type's preferred group if this node has
    /// one by that name, else to this node's default group. The group's constraints are checked
    /// first; on violation nothing changes and the child is dropped.
    pub fn insert(
        &mut self,
        mut child: Node,
        group: Option<&str>,
        index: Option<usize>,
    ) -> Result<(), TreeError> {
        let group = match group {
            Some(group) => group.to_owned(),
            None => self.group_for(&child)?,
        };
        let group_index = self.group_index(&group)?;
        self.admit(group_index, &child)?;
        let len = self.groups[group_index].len();
        let index = index.unwrap_or(len);
        if index > len {
            return Err(TreeError::IndexOutOfRange { group, index, len });
        }

        self.adopt_scope(&mut child)?;
        trace!(
            parent = self.id.get(),
            child = child.id.get(),
            %group,
            index,
            "insert"
        );
        self.groups[group_index].insert(index, child);
        self.fix_trailers(&group);
        Ok(())
    }

    /// Insert into the child's preferred group or this node's default group, at the end.
    pub fn add(&mut self, child: Node) -> Result<(), TreeError> {
        self.insert(child, None, None)
    }

    /// Add several children in order, stopping at the first rejection.
    pub fn extend<I: IntoIterator<Item = Node>>(&mut self, children: I) -> Result<(), TreeError> {
        for child in children {
            self.add(child)?;
        }
        Ok(())
    }

    /// Remove and return the child at `index` of `group`.
    pub fn remove(&mut self, group: &str, index: usize) -> Result<Node, TreeError> {
        let group_index = self.group_index(group)?;
        let len = self.groups[group_index].len();
        if index >= len {
            return Err(TreeError::IndexOutOfRange {
                group: group.to_owned(),
                index,
                len,
            });
        }
        let child = self.groups[group_index].remove(index);
        self.fix_trailers(group);
        Ok(child)
    }

    /// The first child named `name`, searching all groups; with `transitive`, in pre-order over
    /// all descendants.
    pub fn find(&self, name: &str, transitive: bool) -> Option<&Node> {
        if transitive {
            self.descendants().find(|node| node.name() == name)
        } else {
            self.groups
                .iter()
                .flatten()
                .find(|child| child.name() == name)
        }
    }

    pub fn has_child(&self, name: &str, transitive: bool) -> bool {
        self.find(name, transitive).is_some()
    }

    /// Every descendant (not including this node), in pre-order.
    pub fn descendants(&self) -> Descendants {
        let mut descendants = Descendants { stack: Vec::new() };
        descendants.push_children(self);
        descendants
    }

    fn group_index(&self, group: &str) -> Result<usize, TreeError> {
        self.node_type
            .group_index(group)
            .ok_or_else(|| TreeError::UnknownGroup {
                type_name: self.type_name().to_owned(),
                group: group.to_owned(),
            })
    }

    /// Check `child` against the constraints of the group at `group_index`.
    fn admit(&self, group_index: usize, child: &Node) -> Result<(), TreeError> {
        let spec = &self.node_type.groups()[group_index];
        match spec.rejection(&self.groups[group_index], child.node_type()) {
            None => Ok(()),
            Some(reason) => {
                warn!(
                    parent = self.type_name(),
                    child = child.type_name(),
                    group = spec.name(),
                    %reason,
                    "rejected child"
                );
                Err(TreeError::InvalidChild {
                    parent: self.type_name().to_owned(),
                    parent_id: self.id,
                    child: child.type_name().to_owned(),
                    child_id: child.id,
                    group: spec.name().to_owned(),
                    reason,
                })
            }
        }
    }

    fn group_for(&self, child: &Node) -> Result<String, TreeError> {
        if let Some(preferred) = child.node_type().preferred_group() {
            if self.node_type.group(preferred).is_some() {
                return Ok(preferred.to_owned());
            }
        }
        self.node_type
            .default_group()
            .map(str::to_owned)
            .ok_or_else(|| TreeError::NoGroups {
                type_name: self.type_name().to_owned(),
            })
    }

    /// Re-apply the type's trailer rule after `changed` gained or lost a child.
    fn fix_trailers(&mut self, changed: &str) {
        let rule = match self.node_type.trailer_rule() {
            Some(rule) if rule.groups.iter().any(|g| g == changed) => rule.clone(),
            _ => return,
        };
        let indices = rule
            .groups
            .iter()
            .filter_map(|g| self.node_type.group_index(g))
            .collect::<Vec<_>>();
        let last_group = indices
            .iter()
            .rev()
            .copied()
            .find(|&i| !self.groups[i].is_empty());
        for &i in &indices {
            for child in &mut self.groups[i] {
                child.set_trailer(&rule.others);
            }
        }
        if let Some(i) = last_group {
            if let Some(last) = self.groups[i].last_mut() {
                last.set_trailer(&rule.last);
            }
        }
    }
}

/// Pre-order iterator over a node's descendants.
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Descendants<'a> {
    fn push_children(&mut self, node: &'a Node) {
        self.stack.extend(node.groups.iter().flatten().rev());
    }
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        let node = self.stack.pop()?;
        self.push_children(node);
        Some(node)
    }
}

/// A node being changed in place inside its parent. It offers the node's mutating operations but
/// cannot replace the node, so the parent's group constraints keep holding.
pub struct NodeMut<'a> {
    node: &'a mut Node,
}

impl<'a> From<&'a mut Node> for NodeMut<'a> {
    fn from(node: &'a mut Node) -> NodeMut<'a> {
        NodeMut { node }
    }
}

impl<'a> Deref for NodeMut<'a> {
    type Target = Node;

    fn deref(&self) -> &Node {
        self.node
    }
}

impl<'a> NodeMut<'a> {
    pub fn set_attr(&mut self, name: &str, value: impl Into<Value>) -> Result<(), TreeError> {
        self.node.set_attr(name, value)
    }

    pub fn set_prototype(&mut self, prototype: Arc<Node>) {
        self.node.set_prototype(prototype)
    }

    pub fn update_scope(&mut self, scope: Scope) -> Result<(), TreeError> {
        self.node.update_scope(scope)
    }

    pub fn insert(
        &mut self,
        child: Node,
        group: Option<&str>,
        index: Option<usize>,
    ) -> Result<(), TreeError> {
        self.node.insert(child, group, index)
    }

    pub fn add(&mut self, child: Node) -> Result<(), TreeError> {
        self.node.add(child)
    }

    pub fn remove(&mut self, group: &str, index: usize) -> Result<Node, TreeError> {
        self.node.remove(group, index)
    }

    pub fn replace(&mut self, group: &str, index: usize, child: Node) -> Result<Node, TreeError> {
        self.node.replace(group, index, child)
    }

    pub fn update_child<F, R>(&mut self, group: &str, index: usize, f: F) -> Result<R, TreeError>
    where
        F: FnOnce(NodeMut) -> Result<R, TreeError>,
    {
        self.node.update_child(group, index, f)
    }
}
