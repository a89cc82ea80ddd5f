//! Indentation of existing lines and re-indentation of copied text

use std::collections::HashMap;

use crate::config::IndentStyle;
use crate::document::Document;

/// Indent levels of source lines, computed on first use
pub(super) struct IndentCache {
    style: IndentStyle,
    size: usize,
    levels: HashMap<u32, usize>,
}

impl IndentCache {
    pub fn new(style: IndentStyle, size: usize) -> Self {
        Self {
            style,
            size,
            levels: HashMap::new(),
        }
    }

    /// Level of a line: the column of its first token over the indent width
    pub fn level(&mut self, document: &Document, line: u32) -> usize {
        if let Some(level) = self.levels.get(&line) {
            return *level;
        }
        let column = match document.tokens.first_on_line(line) {
            Some(index) => document.tokens.tokens()[index].range.start.character as usize,
            None => document.lines.line_indent(line).chars().count(),
        };
        let level = match self.style {
            IndentStyle::Tabs => column,
            IndentStyle::Spaces => column / self.size,
        };
        self.levels.insert(line, level);
        level
    }
}

/// Shift every line but the first by `delta` indent units
///
/// Negative shifts remove at most the leading whitespace a line has.
pub(super) fn reindent(text: &str, unit: &str, delta: isize) -> String {
    if delta == 0 || !text.contains('\n') {
        return text.to_string();
    }
    let mut lines = text.split('\n');
    let mut result = lines.next().unwrap_or_default().to_string();
    for line in lines {
        result.push('\n');
        if line.trim().is_empty() {
            result.push_str(line);
        } else if delta > 0 {
            result.push_str(&unit.repeat(delta as usize));
            result.push_str(line);
        } else {
            let mut rest = line;
            for _ in 0..delta.unsigned_abs() {
                rest = rest.strip_prefix(unit).unwrap_or_else(|| rest.trim_start());
            }
            result.push_str(rest);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reindent() {
        let text = "{\n    Value : a\n}";
        assert_eq!(reindent(text, "    ", 1), "{\n        Value : a\n    }");
        assert_eq!(reindent(text, "    ", -1), "{\nValue : a\n}");
        assert_eq!(reindent("#Single", "    ", 2), "#Single");
    }
}
