//! The compiled form of a template: lines of fragments.

use std::fmt;

/// One line of a template. `indent` is the number of leading indent markers; every output line
/// produced by this template line is indented by that many indent units.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateLine {
    pub indent: usize,
    pub fragments: Vec<Fragment>,
    /// 1-based line number within the template source, for error reporting.
    pub source_line: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Fragment {
    /// Verbatim text. May contain embedded newlines, which break the output line.
    Literal(String),
    /// Substitute the (scalar) value found at this attribute path.
    Attribute(AttrPath),
    /// Expand one or more sources into a run of lines.
    Expansion(Box<Expansion>),
}

/// A dotted attribute path like `then.condition`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttrPath(pub Vec<String>);

#[derive(Clone, Debug, PartialEq)]
pub struct Expansion {
    /// Continuation lines start at the column where the expansion started.
    pub anchored: bool,
    pub sources: Vec<Source>,
    pub modifiers: Modifiers,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Source {
    /// `*name` before it has been checked against the node type. Never survives validation.
    Star {
        name: String,
        format: Option<String>,
    },
    /// Children of a group, filtered by scope, each rendered recursively.
    Group {
        group: String,
        format: Option<String>,
    },
    /// The value(s) at an attribute path. Node values are rendered recursively.
    Attribute {
        path: AttrPath,
        format: Option<String>,
    },
    /// Lines computed by a generator registered on the node type.
    Generator(String),
}

/// Text wrapped around an expansion. Everything defaults to empty.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Modifiers {
    /// Emitted once if the expansion produces nothing at all, instead of everything else.
    pub empty: String,
    /// Piece emitted as its own line before the first line (text before a newline in `head`).
    pub head_line: Option<String>,
    /// Prefix of the first line.
    pub head: String,
    /// Replaces `head` when the expansion yields exactly one line.
    pub front0: Option<String>,
    /// Suffix of the last line.
    pub rear: String,
    /// Piece emitted as its own line after the last line (text after a newline in `rear`).
    pub rear_line: Option<String>,
    /// Replaces `rear` when the expansion yields exactly one line.
    pub rear0: Option<String>,
    /// Prefix of the first line of every item but the first.
    pub sep: String,
    /// Suffix of every line but the last.
    pub sep_eol: String,
    /// Prefix of every line.
    pub lead: String,
    /// Suffix of every line.
    pub tail: String,
}

impl AttrPath {
    pub fn first(&self) -> &str {
        &self.0[0]
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl Source {
    pub fn format_override(&self) -> Option<&str> {
        match self {
            Source::Star { format, .. }
            | Source::Group { format, .. }
            | Source::Attribute { format, .. } => format.as_deref(),
            Source::Generator(_) => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Source::*;

        match self {
            Star { name, .. } => write!(f, "*{}", name)?,
            Group { group, .. } => write!(f, "*{}", group)?,
            Attribute { path, .. } => write!(f, ".{}", path)?,
            Generator(name) => return write!(f, "@{}", name),
        }
        if let Some(format) = self.format_override() {
            write!(f, ":{}", format)?;
        }
        Ok(())
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Fragment::Literal(text) => write!(f, "'{}'", text.replace('\n', "↵")),
            Fragment::Attribute(path) => write!(f, "{{{}}}", path),
            Fragment::Expansion(exp) => {
                write!(f, "{{")?;
                if exp.anchored {
                    write!(f, ">")?;
                }
                for (i, source) in exp.sources.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", source)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl Modifiers {
    /// The prefix and suffix used when the expansion yields a single line, if either was given.
    pub fn single_line(&self) -> Option<(String, String)> {
        if self.front0.is_none() && self.rear0.is_none() {
            return None;
        }
        let front0 = self.front0.clone().unwrap_or_else(|| {
            let mut front = self.head_line.clone().unwrap_or_default();
            front.push_str(&self.head);
            front
        });
        let rear0 = self.rear0.clone().unwrap_or_else(|| {
            let mut rear = self.rear.clone();
            rear.push_str(self.rear_line.as_deref().unwrap_or(""));
            rear
        });
        Some((front0, rear0))
    }
}
