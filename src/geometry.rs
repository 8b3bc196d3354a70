use unicode_width::UnicodeWidthStr;

/// Width, measured in terminal columns.
pub type Width = usize;

/// Columns reserved on every wrapped line for the decoration that surrounds an attribute list
/// (brackets, quotes, trailing `>`).
pub const DECORATION_WIDTH: Width = 4;

/// Display width of a string, in columns. Wide (e.g. CJK) characters count as two.
pub fn str_width(s: &str) -> Width {
    UnicodeWidthStr::width(s)
}

/// `n` spaces, for anchoring continuation lines.
pub fn spaces(n: Width) -> String {
    " ".repeat(n)
}

/// Prefix `line` with `unit` repeated `level` times. Blank lines stay blank.
pub fn indented(unit: &str, level: usize, line: String) -> String {
    if level == 0 || line.is_empty() {
        line
    } else {
        let mut out = unit.repeat(level);
        out.push_str(&line);
        out
    }
}
