//! Merging of adjacent deletion ranges

use super::DeletionRange;
use crate::token::TokenStream;

/// Merge ranges separated only by comments and at most one separator
///
/// Runs until no two ranges can be merged; the result is sorted by token
/// position, so the input order does not matter.
pub fn merge(mut ranges: Vec<DeletionRange>, tokens: &TokenStream) -> Vec<DeletionRange> {
    ranges.sort_by_key(|range| (range.token_range.start, range.token_range.end));
    ranges.dedup();

    loop {
        let mut merged: Vec<DeletionRange> = Vec::with_capacity(ranges.len());
        let mut changed = false;
        for range in ranges {
            if let Some(previous) = merged.last_mut()
                && adjacent(previous, &range, tokens)
            {
                *previous = combine(previous, &range);
                changed = true;
            } else {
                merged.push(range);
            }
        }
        if !changed {
            return merged;
        }
        ranges = merged;
    }
}

fn adjacent(left: &DeletionRange, right: &DeletionRange, tokens: &TokenStream) -> bool {
    if right.token_range.start <= left.token_range.end + 1 {
        return true;
    }
    let between: Vec<_> = tokens.tokens()[left.token_range.end + 1..right.token_range.start]
        .iter()
        .filter(|token| !token.is_comment())
        .collect();
    match between.as_slice() {
        [] => true,
        [token] => [left.print_pattern, right.print_pattern]
            .iter()
            .filter_map(|pattern| pattern.separator())
            .any(|separator| token.is(separator)),
        _ => false,
    }
}

fn combine(left: &DeletionRange, right: &DeletionRange) -> DeletionRange {
    let outer = if right.kind > left.kind { right } else { left };
    DeletionRange {
        kind: left.kind.max(right.kind),
        print_pattern: outer.print_pattern,
        term_range: left.term_range.union(&right.term_range),
        token_range: left.token_range.union(&right.token_range),
        is_expanded: false,
        include_target: left.include_target || right.include_target,
    }
}
