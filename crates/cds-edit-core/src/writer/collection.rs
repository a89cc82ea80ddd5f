//! Reordering of collection items
//!
//! Moved items are cut out of their collections together with the comment
//! lines above them and the comment trailing them, then inserted again in
//! front of the item that follows them in the new order. Items that keep
//! their place are left as they are.

use super::SynthesisContext;
use super::delete::DeletionRequest;
use super::indent::reindent;
use crate::cst::{Collection, CstNode};
use crate::deletion::PrintPattern;
use crate::pointer::Pointer;
use crate::text::{Position, Range};
use crate::{CdsEditError, Result};

/// Text of one moved item
#[derive(Debug, Clone, Default)]
struct Chunk {
    /// Full-line comments above the item
    comments: Vec<String>,
    code: String,
    /// Comment on the item's last line
    trailer: Option<String>,
}

impl Chunk {
    /// The item written on lines of its own
    fn lines(&self, indent: &str, comma: bool) -> String {
        let mut text = String::new();
        for comment in &self.comments {
            text.push_str(comment);
            text.push('\n');
            text.push_str(indent);
        }
        text.push_str(&self.code);
        if comma {
            text.push(',');
        }
        if let Some(trailer) = &self.trailer {
            text.push(' ');
            text.push_str(trailer);
        }
        text
    }
}

/// Where an item of the destination collection sits between its neighbours
#[derive(Debug, Clone, Copy)]
struct Slot {
    item: Range,
    /// Start of the comment lines above the item, or of the item itself
    start: Position,
    comma: Option<Range>,
    /// Comment on the item's last line
    comment: Option<Range>,
}

impl SynthesisContext<'_> {
    pub(super) fn move_collection_values(
        &mut self,
        pointer: &Pointer,
        index: Option<usize>,
        sources: &[Pointer],
    ) -> Result<()> {
        let CstNode::Collection(collection) = self.node(pointer)? else {
            return Err(CdsEditError::internal_error(format!("'{pointer}' is not a collection")));
        };
        let items_pointer = pointer.child("items");
        let document = self.document;
        let tokens = &document.tokens;
        let own_line = collection.items.first().is_some_and(|item| {
            tokens
                .index_starting_at(item.range().start)
                .is_some_and(|first| tokens.is_first_on_line(first))
        });
        let level = match collection.items.first() {
            Some(item) if own_line => self.level(item.range().start.line),
            _ => self.level(collection.range.start.line) + 1,
        };

        let mut local = Vec::new();
        let mut chunks = Vec::with_capacity(sources.len());
        let mut cuts = Vec::with_capacity(sources.len());
        for source in sources {
            let range = self.node(source)?.range();
            let Some(sibling) = source.last_index() else {
                return Err(CdsEditError::internal_error(format!(
                    "'{source}' is not a collection item"
                )));
            };
            let is_local = source.parent().as_ref() == Some(&items_pointer);
            if is_local {
                local.push(sibling);
            }
            chunks.push(self.chunk(range, level));
            cuts.push((
                is_local,
                DeletionRequest::new(range, None, PrintPattern::CommaList, sibling),
            ));
        }

        let mut survivors = Vec::new();
        for (position, item) in collection.items.iter().enumerate() {
            if !local.contains(&position) {
                survivors.push((position, self.slot(item.range())?));
            }
        }
        if survivors.is_empty() {
            self.deletions
                .extend(cuts.into_iter().filter(|(is_local, _)| !is_local).map(|(_, cut)| cut));
            self.permute(collection, &chunks, level, own_line);
            tracing::debug!(collection = %pointer, moved = sources.len(), "permuted collection");
            return Ok(());
        }
        self.deletions.extend(cuts.into_iter().map(|(_, cut)| cut));

        let split = match index {
            Some(index) => survivors.iter().filter(|(position, _)| *position < index).count(),
            None => survivors.len(),
        };
        let indent = self.indent(level);
        if let Some((_, anchor)) = survivors.get(split) {
            let text: String = chunks
                .iter()
                .map(|chunk| {
                    if own_line {
                        format!("{}\n{indent}", chunk.lines(&indent, true))
                    } else {
                        format!("{}, ", chunk.code)
                    }
                })
                .collect();
            self.insert(anchor.start, text);
        } else if let Some(&(position, last)) = survivors.last() {
            let trailing_comma = match collection.items.last() {
                Some(item) if position + 1 < collection.items.len() => {
                    self.slot(item.range())?.comma.is_some()
                }
                _ => true,
            };
            match last.comma.filter(|_| trailing_comma) {
                Some(comma) => {
                    let text: String = chunks
                        .iter()
                        .map(|chunk| {
                            if own_line {
                                format!("\n{indent}{}", chunk.lines(&indent, true))
                            } else {
                                format!(" {},", chunk.code)
                            }
                        })
                        .collect();
                    let at = if own_line { last.comment.unwrap_or(comma).end } else { comma.end };
                    self.insert(at, text);
                }
                None if own_line => {
                    let count = chunks.len();
                    let text = chunks
                        .iter()
                        .enumerate()
                        .map(|(position, chunk)| chunk.lines(&indent, position + 1 < count))
                        .collect::<Vec<_>>()
                        .join(&format!("\n{indent}"));
                    self.insert(last.item.end, ",");
                    let at = last.comment.map_or(last.item.end, |comment| comment.end);
                    self.insert(at, format!("\n{indent}{text}"));
                }
                None => {
                    let text: String =
                        chunks.iter().map(|chunk| format!(", {}", chunk.code)).collect();
                    self.insert(last.item.end, text);
                }
            }
        }
        let expands = collection.range.start.line == collection.range.end.line
            && chunks.iter().any(|chunk| chunk.code.contains('\n'));
        if expands && collection.range.end.character > 0 {
            let close = Position::new(collection.range.end.line, collection.range.end.character - 1);
            let outer = self.indent(level.saturating_sub(1));
            self.insert(close, format!("\n{outer}"));
        }
        tracing::debug!(collection = %pointer, moved = sources.len(), "moved collection items");
        Ok(())
    }

    /// Rewrite the items in place when every one of them moves
    fn permute(
        &mut self,
        collection: &Collection,
        chunks: &[Chunk],
        level: usize,
        own_line: bool,
    ) {
        let Some(last) = collection.items.last() else {
            let codes: Vec<String> = chunks.iter().map(|chunk| chunk.code.clone()).collect();
            let level = self.level(collection.range.start.line);
            let text = self.printer.print_block("[", "]", &codes, level);
            self.replace(collection.range, text);
            return;
        };
        for (item, chunk) in collection.items.iter().zip(chunks) {
            self.replace(item.range(), chunk.code.clone());
        }
        let extra = chunks.get(collection.items.len()..).unwrap_or_default();
        if !extra.is_empty() {
            let indent = self.indent(level);
            let text: String = extra
                .iter()
                .map(|chunk| {
                    if own_line {
                        format!(",\n{indent}{}", chunk.code)
                    } else {
                        format!(", {}", chunk.code)
                    }
                })
                .collect();
            self.insert(last.range().end, text);
        }
    }

    /// Text carried along with the item at `range`, indented for `level`
    fn chunk(&mut self, range: Range, level: usize) -> Chunk {
        let document = self.document;
        let tokens = &document.tokens;
        let all = tokens.tokens();
        let source_level = self.level(range.start.line);
        let code = reindent(
            document.lines.slice(range),
            self.printer.indent_unit(),
            level as isize - source_level as isize,
        );

        let mut comments = Vec::new();
        if let Some(mut first) = tokens.index_starting_at(range.start) {
            while first > 0
                && all[first - 1].is_comment()
                && tokens.is_first_on_line(first - 1)
                && tokens.is_first_on_line(first)
            {
                first -= 1;
                comments.push(all[first].text.clone());
            }
        }
        comments.reverse();

        let trailer = tokens
            .index_ending_at(range.end)
            .map(|last| {
                tokens
                    .next_code(last)
                    .filter(|&next| all[next].is(",") && all[next].range.start.line == range.end.line)
                    .unwrap_or(last)
            })
            .and_then(|last| tokens.get(last + 1).filter(|next| {
                next.is_comment() && next.range.start.line == all[last].range.end.line
            }))
            .map(|comment| comment.text.clone());
        Chunk {
            comments,
            code,
            trailer,
        }
    }

    fn slot(&self, item: Range) -> Result<Slot> {
        let tokens = &self.document.tokens;
        let all = tokens.tokens();
        let (Some(mut first), Some(last)) =
            (tokens.index_starting_at(item.start), tokens.index_ending_at(item.end))
        else {
            return Err(CdsEditError::internal_error(format!(
                "no tokens for the collection item at {item}"
            )));
        };
        while first > 0
            && all[first - 1].is_comment()
            && tokens.is_first_on_line(first - 1)
            && tokens.is_first_on_line(first)
        {
            first -= 1;
        }
        let comma = tokens.next_code(last).filter(|&next| all[next].is(","));
        let end = comma.unwrap_or(last);
        let comment = tokens
            .get(end + 1)
            .filter(|next| next.is_comment() && next.range.start.line == all[end].range.end.line)
            .map(|comment| comment.range);
        Ok(Slot {
            item,
            start: all[first].range.start,
            comma: comma.map(|comma| all[comma].range),
            comment,
        })
    }
}
