//! Token and comment model
//!
//! The parser hands out tokens in two historical shapes. Both are accepted
//! through [`RawToken`] and normalized once into [`Token`], so everything
//! downstream works on a single sorted [`TokenStream`].

use serde::{Deserialize, Serialize};

use crate::text::{Position, Range};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Identifier,
    Keyword,
    Punctuation,
    String,
    Number,
    LineComment,
    BlockComment,
}

impl TokenKind {
    /// Map a parser token type name to a kind, falling back to the token text
    pub fn classify(token_type: &str, text: &str) -> Self {
        match token_type.to_ascii_lowercase().as_str() {
            "identifier" | "name" => TokenKind::Identifier,
            "keyword" => TokenKind::Keyword,
            "punctuation" | "operator" | "symbol" => TokenKind::Punctuation,
            "string" | "stringliteral" | "multilinestring" => TokenKind::String,
            "number" | "numberliteral" => TokenKind::Number,
            "linecomment" | "comment" => TokenKind::LineComment,
            "blockcomment" => TokenKind::BlockComment,
            _ => Self::guess(text),
        }
    }

    fn guess(text: &str) -> Self {
        if text.starts_with("//") {
            TokenKind::LineComment
        } else if text.starts_with("/*") {
            TokenKind::BlockComment
        } else if text.starts_with('\'') || text.starts_with('`') {
            TokenKind::String
        } else if text.starts_with(|c: char| c.is_ascii_digit()) {
            TokenKind::Number
        } else if text.starts_with(|c: char| c.is_alphabetic() || c == '_' || c == '$') {
            TokenKind::Identifier
        } else {
            TokenKind::Punctuation
        }
    }

    pub fn is_comment(self) -> bool {
        matches!(self, TokenKind::LineComment | TokenKind::BlockComment)
    }
}

/// Identifier classification attached by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentifierKind {
    Entity,
    Element,
    BoundAction,
    Param,
    Term,
    Property,
    Other,
}

/// Legacy token shape: 1-based line, end derived from the image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyToken {
    pub image: String,
    pub token_type: String,
    pub line: u32,
    pub column: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier_kind: Option<IdentifierKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSpan {
    pub line: u32,
    pub col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

/// Span token shape: explicit 0-based span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanToken {
    pub text: String,
    pub kind: String,
    pub range: TokenSpan,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier_kind: Option<IdentifierKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawToken {
    Legacy(LegacyToken),
    Span(SpanToken),
}

/// Normalized token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub range: Range,
    pub identifier: Option<IdentifierKind>,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, range: Range) -> Self {
        Self {
            kind,
            text: text.into(),
            range,
            identifier: None,
        }
    }

    pub fn with_identifier(mut self, identifier: IdentifierKind) -> Self {
        self.identifier = Some(identifier);
        self
    }

    pub fn from_raw(raw: RawToken) -> Self {
        match raw {
            RawToken::Legacy(token) => {
                let start = Position::new(token.line.saturating_sub(1), token.column);
                let end = end_of_text(start, &token.image);
                Self {
                    kind: TokenKind::classify(&token.token_type, &token.image),
                    text: token.image,
                    range: Range::new(start, end),
                    identifier: token.identifier_kind,
                }
            }
            RawToken::Span(token) => Self {
                kind: TokenKind::classify(&token.kind, &token.text),
                text: token.text,
                range: Range::from_coords(
                    token.range.line,
                    token.range.col,
                    token.range.end_line,
                    token.range.end_col,
                ),
                identifier: token.identifier_kind,
            },
        }
    }

    pub fn is_comment(&self) -> bool {
        self.kind.is_comment()
    }

    /// Check if this is a punctuation token with the given text
    pub fn is(&self, punctuation: &str) -> bool {
        matches!(self.kind, TokenKind::Punctuation) && self.text == punctuation
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self.kind, TokenKind::Keyword | TokenKind::Identifier) && self.text == keyword
    }
}

/// Position after `text` when it starts at `start`
fn end_of_text(start: Position, text: &str) -> Position {
    let mut end = start;
    for c in text.chars() {
        if c == '\n' {
            end.line += 1;
            end.character = 0;
        } else {
            end.character += 1;
        }
    }
    end
}

/// Tokens of one document sorted by start position
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        tokens.sort_by_key(|token| token.range.start);
        Self { tokens }
    }

    pub fn from_raw(raw: Vec<RawToken>) -> Self {
        Self::new(raw.into_iter().map(Token::from_raw).collect())
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Index of the first token starting on `line`
    pub fn first_on_line(&self, line: u32) -> Option<usize> {
        let index = self
            .tokens
            .partition_point(|token| token.range.start.line < line);
        self.tokens
            .get(index)
            .filter(|token| token.range.start.line == line)
            .map(|_| index)
    }

    /// Index of the first token starting at or after `position`
    pub fn index_at_or_after(&self, position: Position) -> usize {
        self.tokens
            .partition_point(|token| token.range.start < position)
    }

    /// Index of the token starting exactly at `position`
    pub fn index_starting_at(&self, position: Position) -> Option<usize> {
        let index = self.index_at_or_after(position);
        self.tokens
            .get(index)
            .filter(|token| token.range.start == position)
            .map(|_| index)
    }

    /// Index of the token ending exactly at `position`
    pub fn index_ending_at(&self, position: Position) -> Option<usize> {
        let index = self.tokens.partition_point(|token| token.range.end < position);
        self.tokens
            .get(index)
            .filter(|token| token.range.end == position)
            .map(|_| index)
    }

    /// Indices of the tokens lying completely inside `range`
    pub fn indices_within(&self, range: Range) -> std::ops::Range<usize> {
        let start = self.index_at_or_after(range.start);
        let end = self
            .tokens
            .partition_point(|token| token.range.end <= range.end)
            .max(start);
        start..end
    }

    pub fn next_code(&self, index: usize) -> Option<usize> {
        (index + 1..self.tokens.len()).find(|&i| !self.tokens[i].is_comment())
    }

    pub fn prev_code(&self, index: usize) -> Option<usize> {
        (0..index).rev().find(|&i| !self.tokens[i].is_comment())
    }

    /// Last code token ending at or before `position`
    pub fn code_before(&self, position: Position) -> Option<usize> {
        let index = self
            .tokens
            .partition_point(|token| token.range.end <= position);
        (0..index).rev().find(|&i| !self.tokens[i].is_comment())
    }

    /// First code token starting at or after `position`
    pub fn code_after(&self, position: Position) -> Option<usize> {
        let index = self.index_at_or_after(position);
        (index..self.tokens.len()).find(|&i| !self.tokens[i].is_comment())
    }

    pub fn comments(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(|token| token.is_comment())
    }

    pub fn is_first_on_line(&self, index: usize) -> bool {
        let line = self.tokens[index].range.start.line;
        index == 0 || self.tokens[index - 1].range.end.line < line
    }

    pub fn is_last_on_line(&self, index: usize) -> bool {
        let line = self.tokens[index].range.end.line;
        self.tokens
            .get(index + 1)
            .is_none_or(|next| next.range.start.line > line)
    }

    /// Range covering the tokens `first..=last`
    pub fn span(&self, first: usize, last: usize) -> Range {
        Range::new(self.tokens[first].range.start, self.tokens[last].range.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream() -> TokenStream {
        // "@UI.Hidden // note\n  , x"
        TokenStream::new(vec![
            Token::new(TokenKind::Punctuation, "@", Range::from_coords(0, 0, 0, 1)),
            Token::new(TokenKind::Identifier, "UI", Range::from_coords(0, 1, 0, 3)),
            Token::new(TokenKind::Punctuation, ".", Range::from_coords(0, 3, 0, 4)),
            Token::new(TokenKind::Identifier, "Hidden", Range::from_coords(0, 4, 0, 10)),
            Token::new(TokenKind::LineComment, "// note", Range::from_coords(0, 11, 0, 18)),
            Token::new(TokenKind::Punctuation, ",", Range::from_coords(1, 2, 1, 3)),
            Token::new(TokenKind::Identifier, "x", Range::from_coords(1, 4, 1, 5)),
        ])
    }

    #[test]
    fn test_normalize_legacy_token() {
        let raw: RawToken = serde_json::from_str(
            r#"{"image": "Hidden", "tokenType": "Identifier", "line": 3, "column": 4, "identifierKind": "Term"}"#,
        )
        .unwrap();
        let token = Token::from_raw(raw);
        assert_eq!(token.kind, TokenKind::Identifier);
        assert_eq!(token.range, Range::from_coords(2, 4, 2, 10));
        assert_eq!(token.identifier, Some(IdentifierKind::Term));
    }

    #[test]
    fn test_normalize_span_token() {
        let raw: RawToken = serde_json::from_str(
            r#"{"text": "/* a\nb */", "kind": "BlockComment", "range": {"line": 0, "col": 2, "endLine": 1, "endCol": 4}}"#,
        )
        .unwrap();
        let token = Token::from_raw(raw);
        assert!(token.is_comment());
        assert_eq!(token.range, Range::from_coords(0, 2, 1, 4));
    }

    #[test]
    fn test_legacy_multiline_image() {
        let token = Token::from_raw(RawToken::Legacy(LegacyToken {
            image: "`a\nbc`".into(),
            token_type: "String".into(),
            line: 1,
            column: 5,
            identifier_kind: None,
        }));
        assert_eq!(token.range, Range::from_coords(0, 5, 1, 3));
    }

    #[test]
    fn test_lookups() {
        let tokens = stream();
        assert_eq!(tokens.first_on_line(1), Some(5));
        assert_eq!(tokens.first_on_line(2), None);
        assert_eq!(tokens.index_starting_at(Position::new(0, 1)), Some(1));
        assert_eq!(tokens.index_starting_at(Position::new(0, 2)), None);
        assert_eq!(tokens.index_ending_at(Position::new(0, 10)), Some(3));
        assert_eq!(tokens.next_code(3), Some(5));
        assert_eq!(tokens.prev_code(5), Some(3));
        assert_eq!(tokens.comments().count(), 1);
        assert!(tokens.is_last_on_line(4));
        assert!(tokens.is_first_on_line(5));
        assert_eq!(tokens.indices_within(Range::from_coords(0, 1, 0, 10)), 1..4);
        assert_eq!(tokens.code_before(Position::new(1, 0)), Some(3));
        assert_eq!(tokens.code_after(Position::new(0, 10)), Some(5));
    }
}
