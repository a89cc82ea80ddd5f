//! Tokenizer for the annotation subset of CDS

use cds_edit_core::token::{SpanToken, TokenSpan};
use cds_edit_core::{IdentifierKind, Position, Range};

use crate::ParseError;

const KEYWORDS: &[&str] = &["using", "from", "as", "annotate", "with", "actions"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Identifier,
    Keyword,
    Punctuation,
    String,
    Number,
    LineComment,
    BlockComment,
}

impl Kind {
    fn name(self) -> &'static str {
        match self {
            Kind::Identifier => "identifier",
            Kind::Keyword => "keyword",
            Kind::Punctuation => "punctuation",
            Kind::String => "string",
            Kind::Number => "number",
            Kind::LineComment => "lineComment",
            Kind::BlockComment => "blockComment",
        }
    }

    pub fn is_comment(self) -> bool {
        matches!(self, Kind::LineComment | Kind::BlockComment)
    }
}

#[derive(Debug, Clone)]
pub struct Lexeme {
    pub kind: Kind,
    pub text: String,
    pub range: Range,
    pub identifier: Option<IdentifierKind>,
}

impl Lexeme {
    pub fn is(&self, punctuation: &str) -> bool {
        self.kind == Kind::Punctuation && self.text == punctuation
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == Kind::Keyword && self.text == keyword
    }

    pub fn to_raw(&self) -> SpanToken {
        SpanToken {
            text: self.text.clone(),
            kind: self.kind.name().to_string(),
            range: TokenSpan {
                line: self.range.start.line,
                col: self.range.start.character,
                end_line: self.range.end.line,
                end_col: self.range.end.character,
            },
            identifier_kind: self.identifier,
        }
    }
}

struct Cursor {
    chars: Vec<char>,
    offset: usize,
    position: Position,
}

impl Cursor {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.offset).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.offset + ahead).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += 1;
        if c == '\n' {
            self.position.line += 1;
            self.position.character = 0;
        } else {
            self.position.character += 1;
        }
        Some(c)
    }

    fn bump_while(&mut self, text: &mut String, accept: impl Fn(char) -> bool) {
        while let Some(c) = self.peek().filter(|c| accept(*c)) {
            text.push(c);
            self.bump();
        }
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

pub fn tokenize(text: &str) -> Result<Vec<Lexeme>, ParseError> {
    let mut cursor = Cursor {
        chars: text.chars().collect(),
        offset: 0,
        position: Position::default(),
    };
    let mut lexemes = Vec::new();

    while let Some(c) = cursor.peek() {
        if c.is_whitespace() {
            cursor.bump();
            continue;
        }
        let start = cursor.position;
        let mut text = String::new();
        let kind = match c {
            '/' if cursor.peek_at(1) == Some('/') => {
                cursor.bump_while(&mut text, |c| c != '\n');
                Kind::LineComment
            }
            '/' if cursor.peek_at(1) == Some('*') => {
                loop {
                    let Some(c) = cursor.bump() else {
                        return Err(ParseError::new("unterminated block comment", start));
                    };
                    text.push(c);
                    if text.len() > 3 && text.ends_with("*/") {
                        break;
                    }
                }
                Kind::BlockComment
            }
            '\'' => {
                text.push('\'');
                cursor.bump();
                loop {
                    match cursor.bump() {
                        Some('\'') if cursor.peek() == Some('\'') => {
                            text.push_str("''");
                            cursor.bump();
                        }
                        Some('\'') => {
                            text.push('\'');
                            break;
                        }
                        Some(c) => text.push(c),
                        None => return Err(ParseError::new("unterminated string", start)),
                    }
                }
                Kind::String
            }
            '`' => {
                text.push('`');
                cursor.bump();
                loop {
                    match cursor.bump() {
                        Some('`') => {
                            text.push('`');
                            break;
                        }
                        Some(c) => text.push(c),
                        None => return Err(ParseError::new("unterminated string", start)),
                    }
                }
                Kind::String
            }
            c if c.is_ascii_digit() || (c == '-' && cursor.peek_at(1).is_some_and(|n| n.is_ascii_digit())) => {
                text.push(c);
                cursor.bump();
                cursor.bump_while(&mut text, |c| c.is_ascii_digit() || c == '.');
                Kind::Number
            }
            c if is_identifier_char(c) => {
                cursor.bump_while(&mut text, is_identifier_char);
                if KEYWORDS.contains(&text.as_str()) {
                    Kind::Keyword
                } else {
                    Kind::Identifier
                }
            }
            '@' | '(' | ')' | '{' | '}' | '[' | ']' | ':' | ';' | ',' | '.' | '#' | '!' => {
                text.push(c);
                cursor.bump();
                Kind::Punctuation
            }
            other => {
                return Err(ParseError::new(format!("unexpected character '{other}'"), start));
            }
        };
        lexemes.push(Lexeme {
            kind,
            text,
            range: Range::new(start, cursor.position),
            identifier: None,
        });
    }
    Ok(lexemes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_annotation() {
        let lexemes = tokenize("annotate Books with @UI.Hidden : 'it''s'; // done").unwrap();
        let texts: Vec<&str> = lexemes.iter().map(|lexeme| lexeme.text.as_str()).collect();
        assert_eq!(
            texts,
            ["annotate", "Books", "with", "@", "UI", ".", "Hidden", ":", "'it''s'", ";", "// done"]
        );
        assert_eq!(lexemes[0].kind, Kind::Keyword);
        assert_eq!(lexemes[8].range, Range::from_coords(0, 33, 0, 40));
        assert_eq!(lexemes[10].kind, Kind::LineComment);
    }

    #[test]
    fn test_positions_across_lines() {
        let lexemes = tokenize("/* a\n b */ x").unwrap();
        assert_eq!(lexemes[0].kind, Kind::BlockComment);
        assert_eq!(lexemes[0].range, Range::from_coords(0, 0, 1, 5));
        assert_eq!(lexemes[1].range, Range::from_coords(1, 6, 1, 7));
    }
}
