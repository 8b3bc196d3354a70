//! Recursive-descent parser for the template directive language.
//!
//! A template is a block of lines. Surrounding blank lines are dropped and every line is trimmed,
//! so templates can be written as indented string literals. A line starts with zero or more `>`
//! indent markers; the rest is literal text interleaved with `{...}` directives:
//!
//! - `{name}` or `{a.b.c}` substitutes an attribute value.
//! - `{*Body}`, `{.names}`, `{@attr_values}` expand a children group, an attribute, or a
//!   generator into lines. Several sources may be joined with commas, a leading `>` anchors
//!   continuation lines, and `key="value"` modifiers (`head`, `sep`, `rear`, ...) follow.
//!
//! Inside literal text, `\{`, `\}`, `\\` and `\n` are escapes. Inside modifier strings, `\"`,
//! `\\` and `\n` are.

use super::ast::{AttrPath, Expansion, Fragment, Modifiers, Source, TemplateLine};
use super::TemplateErrorKind;

/// A syntax error, located by 1-based line and column within the template source.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    pub line: usize,
    pub column: usize,
    pub kind: TemplateErrorKind,
}

pub fn parse_template(source: &str) -> Result<Vec<TemplateLine>, SyntaxError> {
    let raw_lines: Vec<&str> = source.lines().collect();
    let first = raw_lines.iter().position(|l| !l.trim().is_empty());
    let last = raw_lines.iter().rposition(|l| !l.trim().is_empty());
    let (first, last) = match (first, last) {
        (Some(first), Some(last)) => (first, last),
        _ => return Ok(Vec::new()),
    };

    let mut lines = Vec::new();
    for (i, raw) in raw_lines.iter().enumerate().take(last + 1).skip(first) {
        let trimmed_start = raw.len() - raw.trim_start().len();
        let column_offset = raw[..trimmed_start].chars().count();
        let mut parser = LineParser::new(raw.trim(), i + 1, column_offset);
        lines.push(parser.parse_line()?);
    }
    Ok(lines)
}

struct LineParser {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column_offset: usize,
}

impl LineParser {
    fn new(text: &str, line: usize, column_offset: usize) -> LineParser {
        LineParser {
            chars: text.chars().collect(),
            pos: 0,
            line,
            column_offset,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(ch) if ch.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn error_at(&self, pos: usize, kind: TemplateErrorKind) -> SyntaxError {
        SyntaxError {
            line: self.line,
            column: self.column_offset + pos + 1,
            kind,
        }
    }

    fn error(&self, kind: TemplateErrorKind) -> SyntaxError {
        self.error_at(self.pos, kind)
    }

    fn expect(&mut self, ch: char) -> Result<(), SyntaxError> {
        match self.peek() {
            Some(found) if found == ch => {
                self.pos += 1;
                Ok(())
            }
            Some(found) => Err(self.error(TemplateErrorKind::UnexpectedChar {
                expected: ch,
                found,
            })),
            None => Err(self.error(TemplateErrorKind::UnterminatedDirective)),
        }
    }

    fn parse_line(&mut self) -> Result<TemplateLine, SyntaxError> {
        let mut indent = 0;
        while self.eat('>') {
            indent += 1;
        }

        let mut fragments = Vec::new();
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            match ch {
                '{' => {
                    if !text.is_empty() {
                        fragments.push(Fragment::Literal(std::mem::take(&mut text)));
                    }
                    fragments.push(self.parse_directive()?);
                }
                '}' => return Err(self.error(TemplateErrorKind::UnmatchedBrace)),
                '\\' => {
                    self.pos += 1;
                    match self.advance() {
                        Some('n') => text.push('\n'),
                        Some(escaped @ ('{' | '}' | '\\')) => text.push(escaped),
                        Some(other) => {
                            text.push('\\');
                            text.push(other);
                        }
                        None => text.push('\\'),
                    }
                }
                _ => {
                    text.push(ch);
                    self.pos += 1;
                }
            }
        }
        if !text.is_empty() {
            fragments.push(Fragment::Literal(text));
        }
        Ok(TemplateLine {
            indent,
            fragments,
            source_line: self.line,
        })
    }

    fn parse_directive(&mut self) -> Result<Fragment, SyntaxError> {
        let start = self.pos;
        self.expect('{')?;
        self.skip_whitespace();
        match self.peek() {
            None => Err(self.error_at(start, TemplateErrorKind::UnterminatedDirective)),
            Some('}') => Err(self.error_at(start, TemplateErrorKind::EmptyDirective)),
            Some('>' | '*' | '.' | '@') => {
                let expansion = self.parse_expansion()?;
                Ok(Fragment::Expansion(Box::new(expansion)))
            }
            Some(_) => {
                let path = self.parse_path()?;
                self.skip_whitespace();
                self.expect('}')?;
                Ok(Fragment::Attribute(path))
            }
        }
    }

    fn parse_expansion(&mut self) -> Result<Expansion, SyntaxError> {
        let anchored = self.eat('>');
        let mut sources = vec![self.parse_source()?];
        loop {
            self.skip_whitespace();
            if !self.eat(',') {
                break;
            }
            self.skip_whitespace();
            sources.push(self.parse_source()?);
        }

        let mut modifiers = Modifiers::default();
        let mut seen: Vec<String> = Vec::new();
        loop {
            self.skip_whitespace();
            if self.eat('}') {
                break;
            }
            if self.peek().is_none() {
                return Err(self.error(TemplateErrorKind::UnterminatedDirective));
            }
            let key_pos = self.pos;
            let key = self.parse_name()?;
            if seen.contains(&key) {
                return Err(self.error_at(key_pos, TemplateErrorKind::DuplicateModifier(key)));
            }
            self.skip_whitespace();
            if !self.eat('=') {
                return Err(self.error(TemplateErrorKind::ExpectedModifierValue(key)));
            }
            self.skip_whitespace();
            if self.peek() != Some('"') {
                return Err(self.error(TemplateErrorKind::ExpectedModifierValue(key)));
            }
            let value = self.parse_string()?;
            set_modifier(&mut modifiers, &key, value)
                .map_err(|kind| self.error_at(key_pos, kind))?;
            seen.push(key);
        }

        Ok(Expansion {
            anchored,
            sources,
            modifiers,
        })
    }

    fn parse_source(&mut self) -> Result<Source, SyntaxError> {
        match self.peek() {
            Some('*') => {
                self.pos += 1;
                let name = self.parse_name()?;
                let format = self.parse_format_override()?;
                Ok(Source::Star { name, format })
            }
            Some('.') => {
                self.pos += 1;
                let path = self.parse_path()?;
                let format = self.parse_format_override()?;
                Ok(Source::Attribute { path, format })
            }
            Some('@') => {
                self.pos += 1;
                Ok(Source::Generator(self.parse_name()?))
            }
            Some(found) => Err(self.error(TemplateErrorKind::ExpectedSource(found))),
            None => Err(self.error(TemplateErrorKind::UnterminatedDirective)),
        }
    }

    fn parse_format_override(&mut self) -> Result<Option<String>, SyntaxError> {
        if self.eat(':') {
            Ok(Some(self.parse_name()?))
        } else {
            Ok(None)
        }
    }

    fn parse_path(&mut self) -> Result<AttrPath, SyntaxError> {
        let mut segments = vec![self.parse_name()?];
        while self.peek() == Some('.') && matches!(self.peek_at(1), Some(ch) if is_name_start(ch))
        {
            self.pos += 1;
            segments.push(self.parse_name()?);
        }
        Ok(AttrPath(segments))
    }

    fn parse_name(&mut self) -> Result<String, SyntaxError> {
        let mut name = String::new();
        match self.peek() {
            Some(ch) if is_name_start(ch) => {
                name.push(ch);
                self.pos += 1;
            }
            Some(found) => return Err(self.error(TemplateErrorKind::ExpectedName(found))),
            None => return Err(self.error(TemplateErrorKind::UnterminatedDirective)),
        }
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
                name.push(ch);
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(name)
    }

    fn parse_string(&mut self) -> Result<String, SyntaxError> {
        let start = self.pos;
        self.expect('"')?;
        let mut value = String::new();
        loop {
            match self.advance() {
                None => return Err(self.error_at(start, TemplateErrorKind::UnterminatedString)),
                Some('"') => return Ok(value),
                Some('\\') => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some(escaped @ ('"' | '\\')) => value.push(escaped),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => {
                        return Err(self.error_at(start, TemplateErrorKind::UnterminatedString))
                    }
                },
                Some(ch) => value.push(ch),
            }
        }
    }
}

fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn split_newline(value: &str) -> (&str, Option<&str>) {
    match value.split_once('\n') {
        Some((before, after)) => (before, Some(after)),
        None => (value, None),
    }
}

fn set_modifier(mods: &mut Modifiers, key: &str, value: String) -> Result<(), TemplateErrorKind> {
    match key {
        "empty" => mods.empty = value,
        "head" => {
            let (before, after) = split_newline(&value);
            match after {
                Some(after) => {
                    mods.head_line = Some(before.to_owned());
                    mods.head = after.to_owned();
                }
                None => mods.head = value,
            }
        }
        "front0" => mods.front0 = Some(value),
        "rear" => {
            let (before, after) = split_newline(&value);
            mods.rear_line = after.map(str::to_owned);
            mods.rear = before.to_owned();
        }
        "rear0" => mods.rear0 = Some(value),
        "sep" => mods.sep = value,
        "sep_eol" => mods.sep_eol = value,
        "lead" => mods.lead = value,
        "tail" => mods.tail = value,
        _ => return Err(TemplateErrorKind::UnknownModifier(key.to_owned())),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: &[&str]) -> AttrPath {
        AttrPath(segments.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn indent_markers_and_literals() {
        let lines = parse_template(
            "
            if ({cond})
            >>x = 1;
            ",
        )
        .unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].indent, 0);
        assert_eq!(
            lines[0].fragments,
            vec![
                Fragment::Literal("if (".to_owned()),
                Fragment::Attribute(path(&["cond"])),
                Fragment::Literal(")".to_owned()),
            ]
        );
        assert_eq!(lines[1].indent, 2);
        assert_eq!(lines[1].fragments, vec![Fragment::Literal("x = 1;".to_owned())]);
    }

    #[test]
    fn dotted_paths_and_escapes() {
        let lines = parse_template(r"\{{then.cond}\}\n").unwrap();
        assert_eq!(
            lines[0].fragments,
            vec![
                Fragment::Literal("{".to_owned()),
                Fragment::Attribute(path(&["then", "cond"])),
                Fragment::Literal("}\n".to_owned()),
            ]
        );
    }

    #[test]
    fn expansion_with_modifiers() {
        let lines =
            parse_template(r#"{>*Body:h_format, .names, @attrs head="(\n  " sep=", " rear0=")"}"#)
                .unwrap();
        let exp = match &lines[0].fragments[0] {
            Fragment::Expansion(exp) => exp,
            other => panic!("expected expansion, got {}", other),
        };
        assert!(exp.anchored);
        assert_eq!(
            exp.sources,
            vec![
                Source::Star {
                    name: "Body".to_owned(),
                    format: Some("h_format".to_owned())
                },
                Source::Attribute {
                    path: path(&["names"]),
                    format: None
                },
                Source::Generator("attrs".to_owned()),
            ]
        );
        assert_eq!(exp.modifiers.head_line.as_deref(), Some("("));
        assert_eq!(exp.modifiers.head, "  ");
        assert_eq!(exp.modifiers.sep, ", ");
        assert_eq!(exp.modifiers.rear0.as_deref(), Some(")"));
    }

    #[test]
    fn blank_interior_lines_are_kept() {
        let lines = parse_template("a\n\n  b").unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].fragments.is_empty());
    }

    #[test]
    fn errors_are_located() {
        let err = parse_template("ok\n    x {*Body bogus=\"1\"}").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 14);
        assert_eq!(err.kind, TemplateErrorKind::UnknownModifier("bogus".to_owned()));

        let err = parse_template("{name").unwrap_err();
        assert_eq!(err.kind, TemplateErrorKind::UnterminatedDirective);

        let err = parse_template("a }").unwrap_err();
        assert_eq!((err.column, err.kind), (3, TemplateErrorKind::UnmatchedBrace));

        let err = parse_template(r#"{*Body sep=", " sep=";"}"#).unwrap_err();
        assert_eq!(err.kind, TemplateErrorKind::DuplicateModifier("sep".to_owned()));

        let err = parse_template(r#"{*Body sep=", }"#).unwrap_err();
        assert_eq!(err.kind, TemplateErrorKind::UnterminatedString);

        let err = parse_template("{}").unwrap_err();
        assert_eq!(err.kind, TemplateErrorKind::EmptyDirective);
    }
}
