//! Rendering of one node: template lines, and the fragments within a line.

use super::expansion::ExpansionLines;
use super::{Frame, RenderError};
use crate::geometry::{indented, spaces, str_width, Width};
use crate::node::Node;
use crate::template::{Fragment, TemplateLine};
use std::collections::VecDeque;
use std::iter::{self, Peekable};
use std::mem;
use std::slice;
use tracing::trace;

pub(crate) type LineIter<'a> = Box<dyn Iterator<Item = Result<String, RenderError>> + 'a>;

/// The lines of `node` rendered under `format`, starting at column `offset`. A missing template
/// shows up as the first (and only) item.
pub(crate) fn node_lines<'a>(
    node: &'a Node,
    format: &'a str,
    frame: Frame<'a>,
    offset: Width,
) -> LineIter<'a> {
    match NodeLines::new(node, format, frame, offset) {
        Ok(lines) => Box::new(lines),
        Err(err) => Box::new(iter::once(Err(err))),
    }
}

/// Lines of one node, each indented by its template line's indent level.
struct NodeLines<'a> {
    frame: Frame<'a>,
    unit: &'a str,
    offset: Width,
    template: slice::Iter<'a, TemplateLine>,
    current: Option<(usize, LineLines<'a>)>,
}

impl<'a> NodeLines<'a> {
    fn new(
        node: &'a Node,
        format: &'a str,
        frame: Frame<'a>,
        offset: Width,
    ) -> Result<NodeLines<'a>, RenderError> {
        let template =
            node.node_type()
                .template(format)
                .ok_or_else(|| RenderError::MissingTemplate {
                    node: node.id(),
                    type_name: node.type_name().to_owned(),
                    format: format.to_owned(),
                })?;
        node.mark_rendered();
        trace!(id = node.id().get(), node_type = node.type_name(), format, offset, "render node");
        Ok(NodeLines {
            frame: Frame { node, format, ..frame },
            unit: frame.options.indent_unit(node.node_type().indent_unit()),
            offset,
            template: template.lines().iter(),
            current: None,
        })
    }
}

impl<'a> Iterator for NodeLines<'a> {
    type Item = Result<String, RenderError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((level, line)) = &mut self.current {
                match line.next() {
                    Some(Ok(text)) => return Some(Ok(indented(self.unit, *level, text))),
                    Some(Err(err)) => return Some(Err(err)),
                    None => self.current = None,
                }
            }
            let line = self.template.next()?;
            let offset = self.offset + str_width(self.unit) * line.indent;
            self.current = Some((line.indent, LineLines::new(self.frame, line, offset)));
        }
    }
}

/// Output lines of a single template line.
///
/// A template line without expansions always produces exactly one line, blank or not. With
/// expansions, the text left over after the last expansion line is dropped if it is empty, so an
/// empty expansion on a line of its own leaves no trace.
struct LineLines<'a> {
    frame: Frame<'a>,
    offset: Width,
    fragments: slice::Iter<'a, Fragment>,
    pending: String,
    ready: VecDeque<String>,
    expansion: Option<Draining<'a>>,
    has_expansion: bool,
    finished: bool,
}

/// An expansion being spliced into the current line.
struct Draining<'a> {
    lines: Peekable<ExpansionLines<'a>>,
    /// Continuation lines are shifted right by this much (anchored expansions only).
    shift: Option<Width>,
    first: bool,
}

impl<'a> LineLines<'a> {
    fn new(frame: Frame<'a>, line: &'a TemplateLine, offset: Width) -> LineLines<'a> {
        LineLines {
            frame,
            offset,
            fragments: line.fragments.iter(),
            pending: String::new(),
            ready: VecDeque::new(),
            expansion: None,
            has_expansion: false,
            finished: false,
        }
    }

    /// Append text, breaking the line at embedded newlines.
    fn push_text(&mut self, text: &str) {
        self.push_shifted(text, 0, false);
    }

    /// Like `push_text`, shifting every non-empty piece that starts a new line right by `shift`.
    /// The first piece starts a new line only if `new_line`.
    fn push_shifted(&mut self, text: &str, shift: Width, new_line: bool) {
        for (i, part) in text.split('\n').enumerate() {
            if i > 0 {
                let done = mem::take(&mut self.pending);
                self.ready.push_back(done);
            }
            if (i > 0 || new_line) && !part.is_empty() {
                self.pending.push_str(&spaces(shift));
            }
            self.pending.push_str(part);
        }
    }

    fn next_fragment(&mut self, fragment: &'a Fragment) -> Result<(), RenderError> {
        match fragment {
            Fragment::Literal(text) => self.push_text(text),
            Fragment::Attribute(path) => {
                let node = self.frame.node;
                let value = node.resolve(path)?;
                if !value.is_scalar() {
                    return Err(RenderError::NotScalar {
                        node: node.id(),
                        type_name: node.type_name().to_owned(),
                        path: path.to_string(),
                    });
                }
                self.push_text(&value.to_string());
            }
            Fragment::Expansion(expansion) => {
                self.has_expansion = true;
                let shift = str_width(&self.pending);
                let anchor = self.offset + shift;
                let continuation = if expansion.anchored {
                    anchor
                } else {
                    self.offset
                };
                let lines = ExpansionLines::new(self.frame, expansion, anchor, continuation);
                self.expansion = Some(Draining {
                    lines: lines.peekable(),
                    shift: expansion.anchored.then_some(shift),
                    first: true,
                });
            }
        }
        Ok(())
    }
}

impl<'a> Iterator for LineLines<'a> {
    type Item = Result<String, RenderError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(line) = self.ready.pop_front() {
                return Some(Ok(line));
            }
            if self.finished {
                return None;
            }
            if let Some(draining) = &mut self.expansion {
                let (line, shift, new_line, is_last) = match draining.lines.next() {
                    Some(Ok(line)) => {
                        let is_last = draining.lines.peek().is_none();
                        let new_line = !mem::replace(&mut draining.first, false);
                        (line, draining.shift.unwrap_or(0), new_line, is_last)
                    }
                    Some(Err(err)) => {
                        self.finished = true;
                        return Some(Err(err));
                    }
                    None => {
                        self.expansion = None;
                        continue;
                    }
                };
                self.push_shifted(&line, shift, new_line);
                if !is_last {
                    self.ready.push_back(mem::take(&mut self.pending));
                }
                continue;
            }
            match self.fragments.next() {
                Some(fragment) => {
                    if let Err(err) = self.next_fragment(fragment) {
                        self.finished = true;
                        return Some(Err(err));
                    }
                }
                None => {
                    self.finished = true;
                    if !self.has_expansion || !self.pending.is_empty() {
                        return Some(Ok(mem::take(&mut self.pending)));
                    }
                }
            }
        }
    }
}
