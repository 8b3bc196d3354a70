//! Expansions: the lines of one or more sources, wrapped in the expansion's modifiers.

use super::lines::{node_lines, LineIter};
use super::{Frame, GenContext, RenderError};
use crate::geometry::{str_width, Width};
use crate::node::{Node, Scope};
use crate::template::{Expansion, Source};
use crate::value::Value;
use std::collections::VecDeque;
use std::iter;
use std::mem;
use std::slice;
use std::vec;

/// Where the items of one source come from. Every item is a run of lines.
enum Items<'a> {
    Nodes {
        nodes: slice::Iter<'a, Node>,
        format: &'a str,
        pass: Option<Scope>,
    },
    Values {
        values: slice::Iter<'a, Value>,
        format: &'a str,
        pass: Option<Scope>,
    },
    /// Each generated line is an item of its own.
    Generated(vec::IntoIter<String>),
}

pub(crate) struct ExpansionLines<'a> {
    frame: Frame<'a>,
    expansion: &'a Expansion,
    context: GenContext,
    /// Column at which child nodes start their lines.
    child_offset: Width,
    sources: slice::Iter<'a, Source>,
    items: Option<Items<'a>>,
    item: Option<LineIter<'a>>,
    item_started: bool,
    any_item: bool,
    /// Text before the line held back in `last`: `head` for the first line, nothing after.
    prefix: String,
    /// One line of lookahead, to know which line is the last.
    last: Option<String>,
    count: usize,
    head_line: Option<String>,
    out: VecDeque<String>,
    finished: bool,
}

impl<'a> ExpansionLines<'a> {
    pub(crate) fn new(
        frame: Frame<'a>,
        expansion: &'a Expansion,
        anchor: Width,
        child_offset: Width,
    ) -> ExpansionLines<'a> {
        let mods = &expansion.modifiers;
        let context = GenContext {
            anchor,
            ht_width: str_width(&mods.lead) + str_width(&mods.tail) + str_width(&mods.sep),
            output_width: frame.options.output_width,
        };
        ExpansionLines {
            frame,
            expansion,
            context,
            child_offset,
            sources: expansion.sources.iter(),
            items: None,
            item: None,
            item_started: false,
            any_item: false,
            prefix: mods.head.clone(),
            last: None,
            count: 0,
            head_line: None,
            out: VecDeque::new(),
            finished: false,
        }
    }

    fn open(&self, source: &'a Source) -> Result<Items<'a>, RenderError> {
        let node = self.frame.node;
        let format = source.format_override().unwrap_or(self.frame.format);
        let pass = node.node_type().scope_pass(format);
        match source {
            Source::Group { group, .. } => {
                let nodes = node.children(group).map_err(|_| RenderError::UnknownGroup {
                    node: node.id(),
                    type_name: node.type_name().to_owned(),
                    group: group.clone(),
                })?;
                Ok(Items::Nodes {
                    nodes: nodes.iter(),
                    format,
                    pass,
                })
            }
            Source::Attribute { path, .. } => {
                let values = match node.resolve(path)? {
                    Value::List(values) => values.iter(),
                    value => slice::from_ref(value).iter(),
                };
                Ok(Items::Values {
                    values,
                    format,
                    pass,
                })
            }
            Source::Generator(name) => {
                let generator = node.node_type().generator(name).ok_or_else(|| {
                    RenderError::generator(node, name, "no such generator")
                })?;
                Ok(Items::Generated(generator(node, &self.context)?.into_iter()))
            }
            Source::Star { name, .. } => Err(RenderError::UnknownGroup {
                node: node.id(),
                type_name: node.type_name().to_owned(),
                group: name.clone(),
            }),
        }
    }

    fn next_item(&mut self) -> Option<LineIter<'a>> {
        let frame = self.frame;
        let child_offset = self.child_offset;
        let admitted = |node: &Node, pass: Option<Scope>| match pass {
            Some(pass) => node.scope().admits(pass),
            None => true,
        };
        match self.items.as_mut()? {
            Items::Nodes {
                nodes,
                format,
                pass,
            } => {
                let (format, pass) = (*format, *pass);
                nodes
                    .find(|child| admitted(child, pass))
                    .map(|child| node_lines(child, format, frame, child_offset))
            }
            Items::Values {
                values,
                format,
                pass,
            } => {
                let (format, pass) = (*format, *pass);
                values.find_map(|value| match value {
                    Value::Node(child) if admitted(child, pass) => {
                        Some(node_lines(child, format, frame, child_offset))
                    }
                    Value::Node(_) | Value::None => None,
                    scalar => {
                        let text = scalar.to_string();
                        if text.is_empty() {
                            return None;
                        }
                        let lines = text.split('\n').map(|l| Ok(l.to_owned())).collect::<Vec<_>>();
                        Some(Box::new(lines.into_iter()) as LineIter<'a>)
                    }
                })
            }
            Items::Generated(lines) => lines
                .next()
                .map(|line| Box::new(iter::once(Ok(line))) as LineIter<'a>),
        }
    }

    /// The next line of any source, with `sep`, `lead` and `tail` applied.
    fn raw_line(&mut self) -> Option<Result<String, RenderError>> {
        let expansion = self.expansion;
        let mods = &expansion.modifiers;
        loop {
            if let Some(item) = &mut self.item {
                match item.next() {
                    Some(Ok(line)) => {
                        let sep = if !self.item_started && self.any_item {
                            mods.sep.as_str()
                        } else {
                            ""
                        };
                        self.item_started = true;
                        self.any_item = true;
                        return Some(Ok(format!("{}{}{}{}", sep, mods.lead, line, mods.tail)));
                    }
                    Some(Err(err)) => return Some(Err(err)),
                    None => self.item = None,
                }
                continue;
            }
            if self.items.is_some() {
                match self.next_item() {
                    Some(item) => {
                        self.item = Some(item);
                        self.item_started = false;
                    }
                    None => self.items = None,
                }
                continue;
            }
            let source = self.sources.next()?;
            match self.open(source) {
                Ok(items) => self.items = Some(items),
                Err(err) => return Some(Err(err)),
            }
        }
    }

    fn finish(&mut self) {
        let expansion = self.expansion;
        let mods = &expansion.modifiers;
        match self.last.take() {
            Some(last) => match mods.single_line() {
                Some((front0, rear0)) if self.count == 1 => {
                    self.out.push_back(format!("{}{}{}", front0, last, rear0));
                }
                _ => {
                    if let Some(head_line) = self.head_line.take() {
                        self.out.push_back(head_line);
                    }
                    let prefix = mem::take(&mut self.prefix);
                    self.out.push_back(format!("{}{}{}", prefix, last, mods.rear));
                    if let Some(rear_line) = &mods.rear_line {
                        self.out.push_back(rear_line.clone());
                    }
                }
            },
            None => {
                if !mods.empty.is_empty() {
                    self.out.push_back(mods.empty.clone());
                }
            }
        }
    }
}

impl<'a> Iterator for ExpansionLines<'a> {
    type Item = Result<String, RenderError>;

    fn next(&mut self) -> Option<Self::Item> {
        let expansion = self.expansion;
        let mods = &expansion.modifiers;
        loop {
            if let Some(line) = self.out.pop_front() {
                return Some(Ok(line));
            }
            if self.finished {
                return None;
            }
            match self.raw_line() {
                Some(Ok(line)) => {
                    if self.count == 0 {
                        self.head_line = mods.head_line.clone();
                    } else {
                        if let Some(head_line) = self.head_line.take() {
                            self.out.push_back(head_line);
                        }
                        let prefix = mem::take(&mut self.prefix);
                        let last = self.last.take().unwrap_or_default();
                        self.out
                            .push_back(format!("{}{}{}", prefix, last, mods.sep_eol));
                    }
                    self.last = Some(line);
                    self.count += 1;
                }
                Some(Err(err)) => {
                    self.finished = true;
                    return Some(Err(err));
                }
                None => {
                    self.finished = true;
                    self.finish();
                }
            }
        }
    }
}
