//! Templates: per-type, per-format line templates compiled once into fragment lists.

mod ast;
mod parser;
mod validate;

pub use ast::{AttrPath, Expansion, Fragment, Modifiers, Source, TemplateLine};
pub use validate::NameScope;

use crate::infra::span;
use std::fmt;
use tracing::debug;

/// A template after parsing and validation against its node type.
#[derive(Debug, PartialEq)]
pub struct CompiledTemplate {
    source: String,
    lines: Vec<TemplateLine>,
}

impl CompiledTemplate {
    /// Parse `source` and check it against `names`. `type_name` and `format` only serve to
    /// locate errors.
    pub fn compile(
        type_name: &str,
        format: &str,
        source: &str,
        names: &dyn NameScope,
    ) -> Result<CompiledTemplate, TemplateError> {
        span!("compile template");

        let locate = |line, column, kind| TemplateError {
            type_name: type_name.to_owned(),
            format: format.to_owned(),
            line,
            column,
            kind,
        };
        let mut lines = parser::parse_template(source)
            .map_err(|err| locate(err.line, err.column, err.kind))?;
        validate::validate(&mut lines, names).map_err(|(line, kind)| locate(line, 0, kind))?;
        debug!(
            type_name,
            format,
            lines = lines.len(),
            "compiled template"
        );
        Ok(CompiledTemplate {
            source: source.to_owned(),
            lines,
        })
    }

    /// The template text this was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn lines(&self) -> &[TemplateLine] {
        &self.lines
    }
}

impl fmt::Display for CompiledTemplate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for line in &self.lines {
            write!(f, "{}>", line.indent)?;
            for fragment in &line.fragments {
                write!(f, " {}", fragment)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// A template that failed to compile. `line` and `column` are 1-based; a `column` of 0 means the
/// error concerns the whole line, and a `line` of 0 the whole template.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("node type `{type_name}`, format `{format}`, line {line}, column {column}: {kind}")]
pub struct TemplateError {
    pub type_name: String,
    pub format: String,
    pub line: usize,
    pub column: usize,
    pub kind: TemplateErrorKind,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TemplateErrorKind {
    #[error("directive is not closed with `}}`")]
    UnterminatedDirective,
    #[error("modifier string is not closed with `\"`")]
    UnterminatedString,
    #[error("`}}` outside of a directive; write `\\}}` for a literal brace")]
    UnmatchedBrace,
    #[error("empty directive `{{}}`")]
    EmptyDirective,
    #[error("expected a name, found `{0}`")]
    ExpectedName(char),
    #[error("expected `*`, `.` or `@` to start an expansion source, found `{0}`")]
    ExpectedSource(char),
    #[error("expected `{expected}`, found `{found}`")]
    UnexpectedChar { expected: char, found: char },
    #[error("unknown modifier `{0}`")]
    UnknownModifier(String),
    #[error("modifier `{0}` given twice")]
    DuplicateModifier(String),
    #[error("modifier `{0}` needs a quoted value")]
    ExpectedModifierValue(String),
    #[error("no children group or attribute named `{0}`")]
    UnknownGroup(String),
    #[error("no attribute named `{0}`")]
    UnknownAttribute(String),
    #[error("no generator named `{0}`")]
    UnknownGenerator(String),
    #[error("format `{0}` is not declared")]
    UnknownFormat(String),
    #[error("already compiled from a different template")]
    AlreadyCompiled,
}
