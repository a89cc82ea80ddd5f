//! Expansion rules, tried in priority order until none applies

use super::{DeletionContext, DeletionKind, DeletionRange, PrintPattern};
use crate::text::Range;
use crate::token::{IdentifierKind, Token, TokenKind, TokenStream};

pub fn expand(mut range: DeletionRange, context: &DeletionContext<'_>) -> DeletionRange {
    while absorb_comments(&mut range, context.tokens)
        || absorb_brackets(&mut range, context.tokens)
        || absorb_at(&mut range, context.tokens)
        || absorb_target_name(&mut range, context.tokens)
        || absorb_annotate_clause(&mut range, context)
    {}
    range.is_expanded = true;
    range
}

fn token(tokens: &TokenStream, index: usize) -> &Token {
    &tokens.tokens()[index]
}

/// Full-line comment right above the range, or a comment trailing it on the
/// same line
fn absorb_comments(range: &mut DeletionRange, tokens: &TokenStream) -> bool {
    let first = range.token_range.start;
    if first > 0 {
        let previous = first - 1;
        if token(tokens, previous).is_comment()
            && tokens.is_first_on_line(previous)
            && tokens.is_first_on_line(first)
        {
            range.token_range.start = previous;
            return true;
        }
    }

    let last = range.token_range.end;
    if let Some(next) = tokens.get(last + 1)
        && next.is_comment()
        && next.range.start.line == token(tokens, last).range.end.line
    {
        range.token_range.end = last + 1;
        return true;
    }
    false
}

/// Brackets around a fully deleted annotation list of a deleted target:
/// `@( ... )` of a compound annotation or `{ ... }` of an element block
fn absorb_brackets(range: &mut DeletionRange, tokens: &TokenStream) -> bool {
    if !range.include_target {
        return false;
    }
    let Some(open) = tokens.prev_code(range.token_range.start) else {
        return false;
    };
    let Some(mut close) = tokens.next_code(range.token_range.end) else {
        return false;
    };
    if let Some(separator) = range.print_pattern.separator()
        && token(tokens, close).is(separator)
    {
        let Some(after) = tokens.next_code(close) else {
            return false;
        };
        close = after;
    }

    let at = tokens
        .prev_code(open)
        .filter(|&at| token(tokens, at).is("@"));
    if let Some(at) = at
        && token(tokens, open).is("(")
        && token(tokens, close).is(")")
        && range.kind < DeletionKind::Assignments
    {
        range.token_range.start = at;
        range.token_range.end = close;
        range.kind = DeletionKind::Assignments;
        range.print_pattern = PrintPattern::BareAnnotations;
        return true;
    }

    let block = token(tokens, open).is("{")
        && token(tokens, close).is("}")
        && range.kind == DeletionKind::Target
        && range.print_pattern == PrintPattern::Declarations;
    if block {
        range.token_range.start = open;
        range.token_range.end = close;
        range.print_pattern = PrintPattern::BareAnnotations;
        return true;
    }
    false
}

/// Leading `@` of a bare annotation
fn absorb_at(range: &mut DeletionRange, tokens: &TokenStream) -> bool {
    let first = range.token_range.start;
    if range.kind > DeletionKind::QualifiedTerm
        || range.print_pattern != PrintPattern::BareAnnotations
        || first == 0
        || !token(tokens, first - 1).is("@")
    {
        return false;
    }
    range.token_range.start = first - 1;
    range.kind = DeletionKind::Annotation;
    true
}

fn member_kind(token: &Token) -> Option<IdentifierKind> {
    token.identifier.filter(|kind| {
        matches!(
            kind,
            IdentifierKind::Element | IdentifierKind::BoundAction | IdentifierKind::Param
        )
    })
}

/// Check that nothing but the declaration end follows `from`
fn declaration_ends_after(tokens: &TokenStream, from: usize, kind: IdentifierKind) -> bool {
    let mut index = from;
    while let Some(next) = tokens.next_code(index) {
        let token = token(tokens, next);
        let ends = match kind {
            IdentifierKind::Param => token.is(",") || token.is(")"),
            _ => token.is(";") || token.is("}"),
        };
        if ends {
            return true;
        }
        if token.is("{")
            || token.is("(")
            || token.is("@")
            || token.identifier == Some(IdentifierKind::Param)
        {
            return false;
        }
        index = next;
    }
    true
}

fn declaration_pattern(kind: IdentifierKind) -> PrintPattern {
    match kind {
        IdentifierKind::Param => PrintPattern::CommaList,
        _ => PrintPattern::Declarations,
    }
}

/// Name of the annotated element, action or parameter next to its
/// annotations
fn absorb_target_name(range: &mut DeletionRange, tokens: &TokenStream) -> bool {
    if !range.include_target
        || !matches!(range.kind, DeletionKind::Annotation | DeletionKind::Assignments)
    {
        return false;
    }

    if let Some(previous) = tokens.prev_code(range.token_range.start)
        && let Some(kind) = member_kind(token(tokens, previous))
        && declaration_ends_after(tokens, range.token_range.end, kind)
    {
        range.token_range.start = previous;
        range.kind = DeletionKind::Target;
        range.print_pattern = declaration_pattern(kind);
        return true;
    }

    if let Some(next) = tokens.next_code(range.token_range.end)
        && let Some(kind) = member_kind(token(tokens, next))
        && declaration_ends_after(tokens, next, kind)
    {
        range.token_range.end = next;
        range.kind = DeletionKind::Target;
        range.print_pattern = declaration_pattern(kind);
        return true;
    }
    false
}

/// Statement terminator of the statement starting at `start`
fn statement_end(tokens: &TokenStream, start: usize) -> usize {
    let mut depth = 0usize;
    let mut index = start;
    while let Some(next) = tokens.next_code(index) {
        let token = token(tokens, next);
        if matches!(token.kind, TokenKind::Punctuation) {
            match token.text.as_str() {
                "{" | "(" | "[" => depth += 1,
                "}" | ")" | "]" => depth = depth.saturating_sub(1),
                ";" if depth == 0 => return next,
                _ => {}
            }
        }
        index = next;
    }
    index
}

/// `annotate <entity> [with] [actions]` in front of a deleted target
///
/// The whole clause goes only when no other surviving target lives in the
/// same statement and nothing but the terminator follows the range. With
/// survivors only `with` is removed.
fn absorb_annotate_clause(range: &mut DeletionRange, context: &DeletionContext<'_>) -> bool {
    let tokens = context.tokens;
    if !range.include_target || range.kind < DeletionKind::Annotation {
        return false;
    }
    let Some(previous) = tokens.prev_code(range.token_range.start) else {
        return false;
    };

    let mut cursor = previous;
    let mut with = None;
    if token(tokens, cursor).is_keyword("actions") {
        let Some(before) = tokens.prev_code(cursor) else {
            return false;
        };
        cursor = before;
    }
    if token(tokens, cursor).is_keyword("with") {
        with = Some(cursor);
        let Some(before) = tokens.prev_code(cursor) else {
            return false;
        };
        cursor = before;
    }

    // entity name, possibly dotted
    let mut annotate = None;
    let mut index = Some(cursor);
    while let Some(current) = index {
        let token = token(tokens, current);
        if token.is_keyword("annotate") {
            annotate = Some(current);
            break;
        }
        if !(token.kind == TokenKind::Identifier || token.is(".")) {
            break;
        }
        index = tokens.prev_code(current);
    }
    let Some(annotate) = annotate else {
        return false;
    };

    let end = statement_end(tokens, annotate);
    let statement = Range::new(
        token(tokens, annotate).range.start,
        token(tokens, end).range.end,
    );
    if context
        .targets
        .has_survivor_within(statement, context.deleted_targets)
    {
        if with == Some(previous) {
            range.token_range.start = previous;
            range.kind = DeletionKind::Target;
            return true;
        }
        return false;
    }

    if tokens.next_code(range.token_range.end) != Some(end) || !token(tokens, end).is(";") {
        return false;
    }
    range.token_range.start = annotate;
    range.kind = DeletionKind::Target;
    range.print_pattern = PrintPattern::Declarations;
    true
}
