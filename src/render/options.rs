use crate::geometry::Width;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Options for rendering a node tree.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialization", serde(default))]
pub struct RenderOptions {
    /// The width that wrapped attribute lists and comments try to stay within.
    pub output_width: Width,
    /// Indentation levels added to every non-blank line of the output.
    pub base_indent: usize,
    /// Replaces the indentation unit declared by each node type.
    pub indent_unit: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> RenderOptions {
        RenderOptions {
            output_width: 79,
            base_indent: 0,
            indent_unit: None,
        }
    }
}

impl RenderOptions {
    pub fn with_output_width(mut self, width: Width) -> RenderOptions {
        self.output_width = width;
        self
    }

    pub fn with_base_indent(mut self, levels: usize) -> RenderOptions {
        self.base_indent = levels;
        self
    }

    pub fn with_indent_unit(mut self, unit: &str) -> RenderOptions {
        self.indent_unit = Some(unit.to_owned());
        self
    }

    pub(crate) fn indent_unit<'a>(&'a self, declared: &'a str) -> &'a str {
        self.indent_unit.as_deref().unwrap_or(declared)
    }
}
