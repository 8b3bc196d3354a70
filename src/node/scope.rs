use super::{Node, TreeError};
use crate::schema::ScopeRule;
use std::fmt;
use tracing::debug;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Which rendering passes a node takes part in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum Scope {
    Header,
    Body,
    Both,
}

impl Scope {
    /// Whether a node with this scope is rendered by `pass`.
    pub fn admits(self, pass: Scope) -> bool {
        self == Scope::Both || pass == Scope::Both || self == pass
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Scope::Header => "header",
            Scope::Body => "body",
            Scope::Both => "both",
        };
        write!(f, "{}", name)
    }
}

impl Node {
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Set the scope of this node and of its descendants. The type's `ScopeRule` decides what
    /// the children get: `Confine` children get the confined scope, `Own` children (and their
    /// subtrees) are left alone.
    ///
    /// Fails without changing anything if any node that would change has been rendered.
    pub fn update_scope(&mut self, scope: Scope) -> Result<(), TreeError> {
        if let Some(frozen) = self.frozen_in_scope_update() {
            return Err(TreeError::ScopeFrozen {
                type_name: frozen.type_name().to_owned(),
                node: frozen.id,
            });
        }
        debug!(id = self.id.get(), node_type = self.type_name(), %scope, "update scope");
        self.propagate_scope(scope);
        Ok(())
    }

    /// The scope children of this node receive when this node's scope is `scope`.
    pub(crate) fn child_scope(&self, scope: Scope) -> Scope {
        match self.node_type.scope_rule() {
            ScopeRule::Confine(confined) => confined,
            ScopeRule::Propagate | ScopeRule::Own => scope,
        }
    }

    /// Applied to a child when it joins this node: a child still in scope `Both` takes the scope
    /// this node passes down, unless it owns its scope. Fails like `update_scope` if that would
    /// change a rendered node.
    pub(crate) fn adopt_scope(&self, child: &mut Node) -> Result<(), TreeError> {
        let inherited = self.child_scope(self.scope);
        if child.scope == Scope::Both
            && inherited != Scope::Both
            && child.node_type.scope_rule() != ScopeRule::Own
        {
            child.update_scope(inherited)?;
        }
        Ok(())
    }

    fn propagate_scope(&mut self, scope: Scope) {
        self.scope = scope;
        let inner = self.child_scope(scope);
        for child in self.groups.iter_mut().flatten() {
            if child.node_type.scope_rule() != ScopeRule::Own {
                child.propagate_scope(inner);
            }
        }
    }

    fn frozen_in_scope_update(&self) -> Option<&Node> {
        if self.is_rendered() {
            return Some(self);
        }
        self.groups
            .iter()
            .flatten()
            .filter(|child| child.node_type.scope_rule() != ScopeRule::Own)
            .find_map(|child| child.frozen_in_scope_update())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits() {
        assert!(Scope::Both.admits(Scope::Header));
        assert!(Scope::Body.admits(Scope::Both));
        assert!(Scope::Body.admits(Scope::Body));
        assert!(!Scope::Body.admits(Scope::Header));
        assert!(!Scope::Header.admits(Scope::Body));
    }
}
