//! Node types: the declarative description of a kind of node (attributes, children groups,
//! templates) and the registry that holds them.

mod registry;

pub use registry::Registry;

use crate::node::{Node, Scope, TreeError};
use crate::render::{GenContext, RenderError};
use crate::template::{CompiledTemplate, NameScope, TemplateError, TemplateErrorKind};
use crate::value::Value;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

/// The attribute every node has, holding its statement terminator or similar suffix.
pub const TRAILER: &str = "trailer";

/// Default indentation unit.
pub const DEFAULT_INDENT_UNIT: &str = "    ";

/// Converts an attribute value once, when it is stored.
pub type Converter = Arc<dyn Fn(Value) -> Result<Value, TreeError> + Send + Sync>;

/// Computes the lines of an `{@name}` expansion.
pub type Generator = Arc<dyn Fn(&Node, &GenContext) -> Result<Vec<String>, RenderError> + Send + Sync>;

#[derive(Clone)]
pub struct AttrSpec {
    name: String,
    default: Arc<Value>,
    convert: Option<Converter>,
}

impl AttrSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default(&self) -> &Value {
        &self.default
    }

    pub(crate) fn convert(&self, value: Value) -> Result<Value, TreeError> {
        match &self.convert {
            Some(convert) => convert(value),
            None => Ok(value),
        }
    }
}

impl fmt::Debug for AttrSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("AttrSpec")
            .field("name", &self.name)
            .field("default", &self.default)
            .field("convert", &self.convert.is_some())
            .finish()
    }
}

/// A named children group and the constraints on what it accepts.
#[derive(Clone, Debug)]
pub struct GroupSpec {
    name: String,
    /// Type names (matched against a child's whole lineage). `None` accepts anything.
    accepts: Option<Vec<String>>,
    max_children: Option<usize>,
    /// At most `n` children of the given type.
    limits: Vec<(String, usize)>,
}

impl GroupSpec {
    pub fn new(name: &str) -> GroupSpec {
        GroupSpec {
            name: name.to_owned(),
            accepts: None,
            max_children: None,
            limits: Vec::new(),
        }
    }

    pub fn accepting(mut self, type_names: &[&str]) -> GroupSpec {
        self.accepts = Some(type_names.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn max_children(mut self, max: usize) -> GroupSpec {
        self.max_children = Some(max);
        self
    }

    pub fn at_most(mut self, type_name: &str, n: usize) -> GroupSpec {
        self.limits.push((type_name.to_owned(), n));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Why `child` may not join a group already holding `current`, if it may not.
    pub(crate) fn rejection(&self, current: &[Node], child: &NodeType) -> Option<String> {
        if let Some(accepts) = &self.accepts {
            if !accepts.iter().any(|t| child.is_a(t)) {
                return Some(format!("group accepts only {}", accepts.join(", ")));
            }
        }
        if let Some(max) = self.max_children {
            if current.len() >= max {
                return Some(format!("group holds at most {} children", max));
            }
        }
        for (type_name, n) in &self.limits {
            if child.is_a(type_name) {
                let present = current
                    .iter()
                    .filter(|c| c.node_type().is_a(type_name))
                    .count();
                if present >= *n {
                    return Some(format!("group holds at most {} {}", n, type_name));
                }
            }
        }
        None
    }
}

/// How `update_scope` treats the children of a node of this type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeRule {
    /// Children take whatever scope their parent is given.
    Propagate,
    /// Children are always given this scope, whatever the parent is given.
    Confine(Scope),
    /// Nodes of this type keep their scope when an ancestor's scope changes. An explicit
    /// `update_scope` on the node itself still applies.
    Own,
}

/// After every change to the listed groups, the last child of the last non-empty group gets
/// trailer `last` and every other child in those groups gets `others`.
#[derive(Clone, Debug)]
pub struct TrailerRule {
    pub groups: Vec<String>,
    pub last: String,
    pub others: String,
}

struct FormatSlot {
    name: String,
    source: Option<String>,
    compiled: OnceCell<CompiledTemplate>,
}

/// A registered node type. Shared by all of its instances.
pub struct NodeType {
    name: String,
    /// This type's name followed by the names of the types it was derived from.
    lineage: Vec<String>,
    attrs: Vec<AttrSpec>,
    positional: Vec<String>,
    rest: Option<String>,
    groups: Vec<GroupSpec>,
    default_group: Option<String>,
    preferred_group: Option<String>,
    formats: Vec<FormatSlot>,
    scope_passes: Vec<(String, Scope)>,
    scope: Scope,
    scope_rule: ScopeRule,
    trailer: String,
    trailer_rule: Option<TrailerRule>,
    indent_unit: String,
    generators: Vec<(String, Generator)>,
}

impl NodeType {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this type is `type_name` or was derived from it.
    pub fn is_a(&self, type_name: &str) -> bool {
        self.lineage.iter().any(|t| t == type_name)
    }

    pub fn attribute(&self, name: &str) -> Option<&AttrSpec> {
        self.attrs.iter().find(|a| a.name == name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &AttrSpec> {
        self.attrs.iter()
    }

    pub(crate) fn positional(&self) -> &[String] {
        &self.positional
    }

    pub(crate) fn rest(&self) -> Option<&str> {
        self.rest.as_deref()
    }

    pub fn group(&self, name: &str) -> Option<&GroupSpec> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn groups(&self) -> &[GroupSpec] {
        &self.groups
    }

    pub(crate) fn group_index(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.name == name)
    }

    pub fn default_group(&self) -> Option<&str> {
        self.default_group.as_deref()
    }

    /// The group this type's nodes prefer to be added to, if the parent has it.
    pub fn preferred_group(&self) -> Option<&str> {
        self.preferred_group.as_deref()
    }

    pub fn indent_unit(&self) -> &str {
        &self.indent_unit
    }

    /// The scope new nodes of this type start with.
    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn scope_rule(&self) -> ScopeRule {
        self.scope_rule
    }

    /// Which scope pass rendering under `format` is, if any. Formats without a pass render every
    /// node regardless of scope.
    pub fn scope_pass(&self, format: &str) -> Option<Scope> {
        self.scope_passes
            .iter()
            .find(|(f, _)| f == format)
            .map(|(_, scope)| *scope)
    }

    pub(crate) fn default_trailer(&self) -> &str {
        &self.trailer
    }

    pub(crate) fn trailer_rule(&self) -> Option<&TrailerRule> {
        self.trailer_rule.as_ref()
    }

    pub fn generator(&self, name: &str) -> Option<&Generator> {
        self.generators
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, g)| g)
    }

    pub fn formats(&self) -> impl Iterator<Item = &str> {
        self.formats.iter().map(|slot| slot.name.as_str())
    }

    /// The compiled template for `format`, if that format has been compiled.
    pub fn template(&self, format: &str) -> Option<&CompiledTemplate> {
        self.slot(format).and_then(|slot| slot.compiled.get())
    }

    /// Compile `source` as the template for `format`. Each (type, format) pair compiles at most
    /// once: asking again with the same source returns the cached template, asking with a
    /// different source fails with `AlreadyCompiled`.
    pub fn compile(&self, format: &str, source: &str) -> Result<&CompiledTemplate, TemplateError> {
        let whole = |kind| TemplateError {
            type_name: self.name.clone(),
            format: format.to_owned(),
            line: 0,
            column: 0,
            kind,
        };
        let slot = self
            .slot(format)
            .ok_or_else(|| whole(TemplateErrorKind::UnknownFormat(format.to_owned())))?;
        if let Some(existing) = slot.compiled.get() {
            return if existing.source() == source {
                Ok(existing)
            } else {
                Err(whole(TemplateErrorKind::AlreadyCompiled))
            };
        }
        let compiled = CompiledTemplate::compile(&self.name, format, source, self)?;
        let stored = slot.compiled.get_or_init(|| compiled);
        if stored.source() == source {
            Ok(stored)
        } else {
            Err(whole(TemplateErrorKind::AlreadyCompiled))
        }
    }

    fn slot(&self, format: &str) -> Option<&FormatSlot> {
        self.formats.iter().find(|slot| slot.name == format)
    }

    fn compile_declared(&self) -> Result<(), TemplateError> {
        for slot in &self.formats {
            if let Some(source) = &slot.source {
                self.compile(&slot.name, source)?;
            }
        }
        Ok(())
    }
}

impl NameScope for NodeType {
    fn has_group(&self, name: &str) -> bool {
        self.group(name).is_some()
    }

    fn has_attribute(&self, name: &str) -> bool {
        name == TRAILER || self.attribute(name).is_some()
    }

    fn has_generator(&self, name: &str) -> bool {
        self.generator(name).is_some()
    }
}

impl fmt::Debug for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("NodeType")
            .field("name", &self.name)
            .field("lineage", &self.lineage)
            .field("groups", &self.groups)
            .field("scope", &self.scope)
            .finish()
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("node type `{0}` is already registered")]
    DuplicateType(String),
    #[error("node type `{type_name}` declares reserved attribute `{attr}`")]
    ReservedAttribute { type_name: String, attr: String },
    #[error("node type `{type_name}` names undeclared attribute `{attr}` as an argument")]
    UnknownArgument { type_name: String, attr: String },
    #[error("node type `{type_name}` names undeclared group `{group}`")]
    UnknownGroup { type_name: String, group: String },
    #[error("node type `{type_name}` assigns a scope pass to undeclared format `{format}`")]
    UnknownFormat { type_name: String, format: String },
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Builder for a `NodeType`.
///
/// ```
/// use sdgen::{GroupSpec, Schema};
///
/// let block = Schema::new("Block")
///     .group(GroupSpec::new("Body"))
///     .template("c_format", "\\{\n>{*Body}\n\\}")
///     .build()
///     .unwrap();
/// assert!(block.template("c_format").is_some());
/// ```
pub struct Schema {
    name: String,
    lineage: Vec<String>,
    attrs: Vec<AttrSpec>,
    positional: Vec<String>,
    rest: Option<String>,
    groups: Vec<GroupSpec>,
    default_group: Option<String>,
    preferred_group: Option<String>,
    formats: Vec<(String, Option<String>)>,
    scope_passes: Vec<(String, Scope)>,
    scope: Scope,
    scope_rule: ScopeRule,
    trailer: String,
    trailer_rule: Option<TrailerRule>,
    indent_unit: String,
    generators: Vec<(String, Generator)>,
}

impl Schema {
    pub fn new(name: &str) -> Schema {
        Schema {
            name: name.to_owned(),
            lineage: vec![name.to_owned()],
            attrs: Vec::new(),
            positional: Vec::new(),
            rest: None,
            groups: Vec::new(),
            default_group: None,
            preferred_group: None,
            formats: Vec::new(),
            scope_passes: Vec::new(),
            scope: Scope::Both,
            scope_rule: ScopeRule::Propagate,
            trailer: String::new(),
            trailer_rule: None,
            indent_unit: DEFAULT_INDENT_UNIT.to_owned(),
            generators: Vec::new(),
        }
    }

    /// Start from everything `parent` declares. Templates are inherited as source text and
    /// compiled anew for the derived type.
    pub fn derive(name: &str, parent: &NodeType) -> Schema {
        let mut lineage = vec![name.to_owned()];
        lineage.extend(parent.lineage.iter().cloned());
        Schema {
            name: name.to_owned(),
            lineage,
            attrs: parent.attrs.clone(),
            positional: parent.positional.clone(),
            rest: parent.rest.clone(),
            groups: parent.groups.clone(),
            default_group: parent.default_group.clone(),
            preferred_group: parent.preferred_group.clone(),
            formats: parent
                .formats
                .iter()
                .map(|slot| (slot.name.clone(), slot.source.clone()))
                .collect(),
            scope_passes: parent.scope_passes.clone(),
            scope: parent.scope,
            scope_rule: parent.scope_rule,
            trailer: parent.trailer.clone(),
            trailer_rule: parent.trailer_rule.clone(),
            indent_unit: parent.indent_unit.clone(),
            generators: parent.generators.clone(),
        }
    }

    /// Declare (or redeclare) an attribute with its default value.
    pub fn attr(self, name: &str, default: impl Into<Value>) -> Schema {
        self.put_attr(AttrSpec {
            name: name.to_owned(),
            default: Arc::new(default.into()),
            convert: None,
        })
    }

    /// Declare an attribute whose caller-supplied values pass through `convert` when stored.
    /// Defaults are not converted.
    pub fn attr_with<F>(self, name: &str, default: impl Into<Value>, convert: F) -> Schema
    where
        F: Fn(Value) -> Result<Value, TreeError> + Send + Sync + 'static,
    {
        self.put_attr(AttrSpec {
            name: name.to_owned(),
            default: Arc::new(default.into()),
            convert: Some(Arc::new(convert)),
        })
    }

    fn put_attr(mut self, spec: AttrSpec) -> Schema {
        match self.attrs.iter_mut().find(|a| a.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.attrs.push(spec),
        }
        self
    }

    /// Attributes filled, in order, from positional constructor arguments.
    pub fn positional(mut self, names: &[&str]) -> Schema {
        self.positional = names.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Attribute collecting all positional arguments beyond the declared ones, as a list.
    pub fn rest(mut self, name: &str) -> Schema {
        self.rest = Some(name.to_owned());
        self
    }

    /// Declare (or redeclare) a children group. Groups render and fix up trailers in
    /// declaration order.
    pub fn group(mut self, spec: GroupSpec) -> Schema {
        match self.groups.iter_mut().find(|g| g.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.groups.push(spec),
        }
        if self.default_group.is_none() {
            self.default_group = Some(self.groups[0].name.clone());
        }
        self
    }

    /// Drop all children groups, making this a leaf type.
    pub fn leaf(mut self) -> Schema {
        self.groups.clear();
        self.default_group = None;
        self.trailer_rule = None;
        self
    }

    /// The group children go to when they have no preference. Defaults to the first group.
    pub fn default_group(mut self, name: &str) -> Schema {
        self.default_group = Some(name.to_owned());
        self
    }

    pub fn preferred_group(mut self, name: &str) -> Schema {
        self.preferred_group = Some(name.to_owned());
        self
    }

    /// Declare `format` with a template.
    pub fn template(mut self, format: &str, source: &str) -> Schema {
        let source = Some(source.to_owned());
        match self.formats.iter_mut().find(|(f, _)| f == format) {
            Some(existing) => existing.1 = source,
            None => self.formats.push((format.to_owned(), source)),
        }
        self
    }

    /// Declare `format` without a template yet; compile one later with `NodeType::compile`.
    pub fn format(mut self, format: &str) -> Schema {
        if !self.formats.iter().any(|(f, _)| f == format) {
            self.formats.push((format.to_owned(), None));
        }
        self
    }

    /// Rendering under `format` only includes nodes whose scope admits `pass`.
    pub fn scope_pass(mut self, format: &str, pass: Scope) -> Schema {
        self.scope_passes.retain(|(f, _)| f != format);
        self.scope_passes.push((format.to_owned(), pass));
        self
    }

    pub fn scope(mut self, scope: Scope) -> Schema {
        self.scope = scope;
        self
    }

    pub fn scope_rule(mut self, rule: ScopeRule) -> Schema {
        self.scope_rule = rule;
        self
    }

    pub fn trailer(mut self, trailer: &str) -> Schema {
        self.trailer = trailer.to_owned();
        self
    }

    pub fn trailer_rule(mut self, groups: &[&str], last: &str, others: &str) -> Schema {
        self.trailer_rule = Some(TrailerRule {
            groups: groups.iter().map(|s| s.to_string()).collect(),
            last: last.to_owned(),
            others: others.to_owned(),
        });
        self
    }

    pub fn indent_unit(mut self, unit: &str) -> Schema {
        self.indent_unit = unit.to_owned();
        self
    }

    pub fn generator<F>(mut self, name: &str, generator: F) -> Schema
    where
        F: Fn(&Node, &GenContext) -> Result<Vec<String>, RenderError> + Send + Sync + 'static,
    {
        self.generators.retain(|(n, _)| n != name);
        self.generators.push((name.to_owned(), Arc::new(generator)));
        self
    }

    /// Check the declarations and compile every declared template.
    pub fn build(self) -> Result<Arc<NodeType>, SchemaError> {
        self.check()?;
        let node_type = NodeType {
            formats: self
                .formats
                .into_iter()
                .map(|(name, source)| FormatSlot {
                    name,
                    source,
                    compiled: OnceCell::new(),
                })
                .collect(),
            name: self.name,
            lineage: self.lineage,
            attrs: self.attrs,
            positional: self.positional,
            rest: self.rest,
            groups: self.groups,
            default_group: self.default_group,
            preferred_group: self.preferred_group,
            scope_passes: self.scope_passes,
            scope: self.scope,
            scope_rule: self.scope_rule,
            trailer: self.trailer,
            trailer_rule: self.trailer_rule,
            indent_unit: self.indent_unit,
            generators: self.generators,
        };
        node_type.compile_declared()?;
        Ok(Arc::new(node_type))
    }

    fn check(&self) -> Result<(), SchemaError> {
        let type_name = || self.name.clone();
        if self.attrs.iter().any(|a| a.name == TRAILER) {
            return Err(SchemaError::ReservedAttribute {
                type_name: type_name(),
                attr: TRAILER.to_owned(),
            });
        }
        for arg in self.positional.iter().chain(self.rest.iter()) {
            if !self.attrs.iter().any(|a| &a.name == arg) {
                return Err(SchemaError::UnknownArgument {
                    type_name: type_name(),
                    attr: arg.clone(),
                });
            }
        }
        let group_names = self
            .default_group
            .iter()
            .chain(self.trailer_rule.iter().flat_map(|rule| rule.groups.iter()));
        for group in group_names {
            if !self.groups.iter().any(|g| &g.name == group) {
                return Err(SchemaError::UnknownGroup {
                    type_name: type_name(),
                    group: group.clone(),
                });
            }
        }
        for (format, _) in &self.scope_passes {
            if !self.formats.iter().any(|(f, _)| f == format) {
                return Err(SchemaError::UnknownFormat {
                    type_name: type_name(),
                    format: format.clone(),
                });
            }
        }
        Ok(())
    }
}
