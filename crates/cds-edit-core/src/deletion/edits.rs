//! Text edits for final deletion ranges

use super::{DeletionContext, DeletionRange};
use crate::text::{Position, Range, TextEdit};
use crate::token::{Token, TokenKind};

fn is_closer(token: &Token) -> bool {
    token.is(")") || token.is("]") || token.is("}")
}

pub fn to_text_edits(ranges: &[DeletionRange], context: &DeletionContext<'_>) -> Vec<TextEdit> {
    ranges
        .iter()
        .flat_map(|range| edits_for(range, context))
        .collect()
}

fn edits_for(range: &DeletionRange, context: &DeletionContext<'_>) -> Vec<TextEdit> {
    let tokens = context.tokens;
    let all = tokens.tokens();
    let first = range.token_range.start;
    let mut last = range.token_range.end;
    let mut edits = Vec::new();

    if let Some(separator) = range.print_pattern.separator() {
        match tokens.next_code(last) {
            Some(next) if all[next].is(separator) => {
                last = next;
                if let Some(comment) = all.get(next + 1)
                    && comment.is_comment()
                    && comment.range.start.line == all[next].range.end.line
                {
                    last = next + 1;
                }
            }
            next => {
                let is_last_item = next.is_none_or(|next| is_closer(&all[next]));
                if is_last_item
                    && let Some(previous) = tokens.prev_code(first)
                    && all[previous].is(separator)
                {
                    edits.push(TextEdit::delete(all[previous].range));
                }
            }
        }
    }

    let range = emptied_list(first, last, all).unwrap_or_else(|| widen(first, last, context));
    edits.push(TextEdit::delete(range));
    edits
}

/// Everything between a pair of brackets, when the span is all they hold
fn emptied_list(first: usize, last: usize, all: &[Token]) -> Option<Range> {
    let open = &all[first.checked_sub(1)?];
    let close = all.get(last + 1)?;
    let paired = (open.is("[") && close.is("]"))
        || (open.is("(") && close.is(")"))
        || (open.is("{") && close.is("}"));
    paired.then(|| Range::new(open.range.end, close.range.start))
}

/// Grow the token span over the whitespace around it
///
/// Whole lines go when the span occupies them completely. Otherwise the
/// spaces up to the next token on the same line are consumed, or, when that
/// token closes a list or a declaration, the spaces after the previous token.
fn widen(first: usize, last: usize, context: &DeletionContext<'_>) -> Range {
    let all = context.tokens.tokens();
    let lines = context.lines;
    let start = all[first].range.start;
    let end = all[last].range.end;

    let before: String = lines
        .line_text(start.line)
        .chars()
        .take(start.character as usize)
        .collect();
    let after: String = lines
        .line_text(end.line)
        .chars()
        .skip(end.character as usize)
        .collect();

    if before.trim().is_empty() && after.trim().is_empty() {
        return if end.line + 1 < lines.line_count() {
            Range::new(Position::new(start.line, 0), Position::new(end.line + 1, 0))
        } else if start.line > 0 {
            Range::new(lines.line_end(start.line - 1), lines.line_end(end.line))
        } else {
            Range::new(Position::new(0, 0), lines.line_end(end.line))
        };
    }

    if let Some(next) = all.get(last + 1)
        && next.range.start.line == end.line
        && !is_closer(next)
        && !next.is(";")
    {
        return Range::new(start, next.range.start);
    }

    match first.checked_sub(1).map(|previous| &all[previous]) {
        Some(previous)
            if previous.kind == TokenKind::LineComment && previous.range.end.line < start.line =>
        {
            Range::new(start, end)
        }
        Some(previous) => Range::new(previous.range.end, end),
        None => Range::new(Position::new(0, 0), end),
    }
}
