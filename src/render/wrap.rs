//! Width-aware packing of attribute lists and words.

use crate::geometry::{str_width, Width, DECORATION_WIDTH};

/// What a generator knows about where its lines will go.
#[derive(Debug, Clone, Copy)]
pub struct GenContext {
    /// The column at which the expansion starts.
    pub anchor: Width,
    /// Combined width of the per-line text the expansion wraps around each line (`lead`,
    /// `tail`, `sep`).
    pub ht_width: Width,
    pub output_width: Width,
}

impl GenContext {
    /// The width each generated line should stay within. Zero when the expansion starts too far
    /// right, which leaves one token per line.
    pub fn budget(&self) -> Width {
        self.output_width
            .saturating_sub(self.anchor + self.ht_width + DECORATION_WIDTH)
    }

    pub fn wrap<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<String> {
        wrap_tokens(tokens, self.budget())
    }
}

/// Greedily pack `tokens`, space separated, into lines no wider than `budget`. A token wider than
/// the budget gets a line of its own and is not broken.
pub fn wrap_tokens<S: AsRef<str>>(tokens: &[S], budget: Width) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut width = 0;
    for token in tokens {
        let token = token.as_ref();
        let token_width = str_width(token);
        if !line.is_empty() && width + 1 + token_width > budget {
            lines.push(std::mem::take(&mut line));
            width = 0;
        }
        if !line.is_empty() {
            line.push(' ');
            width += 1;
        }
        line.push_str(token);
        width += token_width;
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}
