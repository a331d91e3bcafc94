//! Byte-oriented state-machine lexer for YANG statement source.
//!
//! Unlike the XPath sub-lexer (`crate::xpath::lexer`), this lexer is
//! hand-written rather than Logos-generated: the double-quoted-string
//! whitespace-trimming rule (RFC 6020 §6.1.3) is column-position- and
//! line-boundary-dependent, which a context-free token regex cannot
//! express. States: `StatementStart` (folded into the main dispatch),
//! `SeparatorRun`, `UnquotedString`, `LineComment`, `BlockComment`,
//! `QuotedString`.
//!
//! A quoted string is three tokens, per `spec.md` §4.1: an opening
//! [`TokenKind::Quote`], a [`TokenKind::QuotedString`] body (already
//! trimmed/escape-processed), and a closing `Quote`. The lexer tracks
//! this as a tiny bit of pending state between `next_token` calls.

use crate::base::{FileId, Span};
use crate::errors::LexError;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Error,
    Eof,
    LeftBrace,
    RightBrace,
    Separator,
    UnquotedString,
    QuotedString,
    Quote,
    Semicolon,
    Plus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// Logical text: the raw slice for unquoted strings and
    /// punctuation, the decoded/trimmed body for quoted strings, and
    /// the quote character itself (`"` or `'`) for `Quote` tokens.
    pub text: Rc<str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    /// Next call must scan and return the quoted body.
    Body(char),
    /// Next call must return the matching closing quote.
    Closing(char),
}

pub struct Lexer<'a> {
    source: &'a str,
    file: FileId,
    pos: usize,
    pending: Option<Pending>,
}

const SEPARATOR_CHARS: [char; 4] = [' ', '\t', '\r', '\n'];

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, file: FileId) -> Self {
        Self {
            source,
            file,
            pos: 0,
            pending: None,
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(self.file, start as u32, self.pos as u32)
    }

    fn tok(&self, kind: TokenKind, start: usize, text: impl Into<Rc<str>>) -> Token {
        Token {
            kind,
            span: self.span_from(start),
            text: text.into(),
        }
    }

    /// Column of `offset` within its line (1-based), counting tabs as
    /// advancing to the next multiple of 8, per RFC 6020 §6.1.3.
    fn column_at(&self, offset: usize) -> usize {
        let line_start = self.source[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let mut col = 0usize;
        for c in self.source[line_start..offset].chars() {
            if c == '\t' {
                col += 8 - (col % 8);
            } else {
                col += 1;
            }
        }
        col
    }

    /// Pull the next token, skipping comments internally (they never
    /// appear in the token stream).
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        if let Some(pending) = self.pending {
            return self.resume_quoted(pending);
        }

        loop {
            if self.pos >= self.source.len() {
                return Ok(self.tok(TokenKind::Eof, self.pos, ""));
            }
            let start = self.pos;
            let c = self.peek_char().unwrap();

            if SEPARATOR_CHARS.contains(&c) {
                return Ok(self.lex_separator(start));
            }
            if self.source[self.pos..].starts_with("//") {
                self.skip_line_comment();
                continue;
            }
            if self.source[self.pos..].starts_with("/*") {
                self.skip_block_comment(start)?;
                continue;
            }
            return match c {
                '{' => {
                    self.bump();
                    Ok(self.tok(TokenKind::LeftBrace, start, "{"))
                }
                '}' => {
                    self.bump();
                    Ok(self.tok(TokenKind::RightBrace, start, "}"))
                }
                ';' => {
                    self.bump();
                    Ok(self.tok(TokenKind::Semicolon, start, ";"))
                }
                '+' => {
                    self.bump();
                    Ok(self.tok(TokenKind::Plus, start, "+"))
                }
                '"' | '\'' => self.start_quoted(c, start),
                _ => Ok(self.lex_unquoted(start)),
            };
        }
    }

    fn lex_separator(&mut self, start: usize) -> Token {
        while matches!(self.peek_char(), Some(c) if SEPARATOR_CHARS.contains(&c)) {
            self.bump();
        }
        self.tok(TokenKind::Separator, start, " ")
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek_char() {
            self.bump();
            if c == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self, start: usize) -> Result<(), LexError> {
        self.bump(); // '/'
        self.bump(); // '*'
        loop {
            match self.peek_char() {
                None => {
                    return Err(LexError::UnclosedComment {
                        span: self.span_from(start),
                    });
                }
                Some('*') => {
                    self.bump();
                    if self.peek_char() == Some('/') {
                        self.bump();
                        return Ok(());
                    }
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    /// Unquoted strings terminate at any separator, `;`, `{`, `}`, or `"`.
    fn lex_unquoted(&mut self, start: usize) -> Token {
        while let Some(c) = self.peek_char() {
            if SEPARATOR_CHARS.contains(&c) || matches!(c, ';' | '{' | '}' | '"') {
                break;
            }
            self.bump();
        }
        let text = &self.source[start..self.pos];
        self.tok(TokenKind::UnquotedString, start, text)
    }

    fn start_quoted(&mut self, quote: char, start: usize) -> Result<Token, LexError> {
        self.bump();
        self.pending = Some(Pending::Body(quote));
        Ok(self.tok(TokenKind::Quote, start, quote.to_string()))
    }

    fn resume_quoted(&mut self, pending: Pending) -> Result<Token, LexError> {
        match pending {
            Pending::Body(quote) => {
                let start = self.pos;
                let quote_col = self.column_at(start - 1); // column of opening quote
                let mut raw = String::new();
                loop {
                    match self.peek_char() {
                        None => {
                            return Err(LexError::UnterminatedString {
                                span: self.span_from(start),
                            });
                        }
                        Some(c) if c == quote => break,
                        Some('\\') if quote == '"' => {
                            self.bump();
                            raw.push('\\');
                            if let Some(escaped) = self.peek_char() {
                                raw.push(escaped);
                                self.bump();
                            }
                        }
                        Some(c) => {
                            raw.push(c);
                            self.bump();
                        }
                    }
                }
                let span = self.span_from(start);
                let decoded = if quote == '"' {
                    trim_double_quoted(&raw, quote_col)
                } else {
                    raw
                };
                self.pending = Some(Pending::Closing(quote));
                Ok(Token {
                    kind: TokenKind::QuotedString,
                    span,
                    text: decoded.into(),
                })
            }
            Pending::Closing(quote) => {
                let start = self.pos;
                if self.peek_char() != Some(quote) {
                    return Err(LexError::UnterminatedString {
                        span: self.span_from(start),
                    });
                }
                self.bump();
                self.pending = None;
                Ok(self.tok(TokenKind::Quote, start, quote.to_string()))
            }
        }
    }
}

/// Apply RFC 6020 §6.1.3 whitespace trimming, then escape-decode.
///
/// Leading whitespace on every line after the first is trimmed up to
/// the column of the opening quote (tabs count as 8 columns); trailing
/// whitespace is removed from every line.
fn trim_double_quoted(raw: &str, quote_col: usize) -> String {
    let mut lines = raw.split('\n');
    let mut out = String::new();
    if let Some(first) = lines.next() {
        out.push_str(first.trim_end_matches([' ', '\t', '\r']));
    }
    for line in lines {
        out.push('\n');
        out.push_str(&trim_leading_columns(line, quote_col).trim_end_matches([' ', '\t', '\r']));
    }
    decode_escapes(&out)
}

fn trim_leading_columns(line: &str, max_col: usize) -> &str {
    let mut col = 0usize;
    let mut byte = 0usize;
    for c in line.chars() {
        if col >= max_col || !matches!(c, ' ' | '\t') {
            break;
        }
        col += if c == '\t' { 8 - (col % 8) } else { 1 };
        byte += c.len_utf8();
    }
    &line[byte..]
}

fn decode_escapes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            // Illegal escapes are tolerated: the backslash is preserved
            // verbatim, per RFC 6020 v1.0. TODO: reject once a strict
            // RFC 7950 mode is added.
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(src, FileId(0));
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token().expect("lex ok");
            let is_eof = tok.kind == TokenKind::Eof;
            out.push(tok);
            if is_eof {
                break;
            }
        }
        out
    }

    #[test]
    fn lexes_simple_statement() {
        let toks = tokens("leaf foo { type string; }");
        let kinds: Vec<_> = toks.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::UnquotedString,
                TokenKind::Separator,
                TokenKind::UnquotedString,
                TokenKind::Separator,
                TokenKind::LeftBrace,
                TokenKind::Separator,
                TokenKind::UnquotedString,
                TokenKind::Separator,
                TokenKind::UnquotedString,
                TokenKind::Semicolon,
                TokenKind::Separator,
                TokenKind::RightBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn skips_line_and_block_comments() {
        let toks = tokens("// hello\nleaf /* x */ a;");
        let kinds: Vec<_> = toks.iter().map(|t| t.kind).collect();
        assert!(!kinds.contains(&TokenKind::Error));
        assert_eq!(toks[0].kind, TokenKind::UnquotedString);
        assert_eq!(&*toks[0].text, "leaf");
    }

    #[test]
    fn unterminated_block_comment_errors() {
        let mut lexer = Lexer::new("/* never closes", FileId(0));
        let err = lexer.next_token().unwrap_err();
        assert!(matches!(err, LexError::UnclosedComment { .. }));
    }

    #[test]
    fn quoted_string_is_three_tokens() {
        let toks = tokens(r#""hello""#);
        assert_eq!(toks[0].kind, TokenKind::Quote);
        assert_eq!(&*toks[0].text, "\"");
        assert_eq!(toks[1].kind, TokenKind::QuotedString);
        assert_eq!(&*toks[1].text, "hello");
        assert_eq!(toks[2].kind, TokenKind::Quote);
    }

    #[test]
    fn double_quoted_escapes_are_decoded() {
        let toks = tokens(r#""a\nb\t\"c\\d""#);
        assert_eq!(&*toks[1].text, "a\nb\t\"c\\d");
    }

    #[test]
    fn unknown_escape_is_tolerated_verbatim() {
        let toks = tokens(r#""a\qb""#);
        assert_eq!(&*toks[1].text, "a\\qb");
    }

    #[test]
    fn single_quoted_has_no_escape_processing() {
        let toks = tokens(r#"'a\nb'"#);
        assert_eq!(&*toks[1].text, "a\\nb");
    }

    #[test]
    fn double_quoted_trims_continuation_line_indentation() {
        let src = "\"first\n    second\"";
        // opening quote is at column 0, so up to 0 columns are trimmed —
        // none of the leading spaces belong to the alignment margin.
        let toks = tokens(src);
        assert_eq!(&*toks[1].text, "first\n    second");
    }

    #[test]
    fn double_quoted_trims_up_to_quote_column() {
        let src = "  \"first\n    second\"";
        // Quote opens at column 2; two columns of leading whitespace on
        // the continuation line are trimmed, the rest is preserved.
        let toks = tokens(src);
        assert_eq!(&*toks[1].text, "first\n  second");
    }

    #[test]
    fn unterminated_quoted_string_errors() {
        let mut lexer = Lexer::new("\"never closes", FileId(0));
        lexer.next_token().unwrap(); // Quote
        let err = lexer.next_token().unwrap_err();
        assert!(matches!(err, LexError::UnterminatedString { .. }));
    }

    /// `spec.md` §8 invariant 1: for a comment- and quote-free source,
    /// the spans of every non-`Eof` token tile the source exactly —
    /// nothing is skipped or duplicated outside of comment elision.
    #[test]
    fn token_spans_tile_comment_free_source() {
        let src = "container top { leaf a { type string; } }";
        let toks = tokens(src);
        let mut cursor = 0u32;
        for tok in &toks {
            if tok.kind == TokenKind::Eof {
                continue;
            }
            assert_eq!(tok.span.start, cursor, "gap or overlap before {:?}", tok.kind);
            cursor = tok.span.end;
        }
        assert_eq!(cursor as usize, src.len());
    }

    /// Comments are elided entirely: no token's span overlaps a
    /// comment's source range, and the surrounding tokens still tile.
    #[test]
    fn comments_are_elided_from_the_token_stream() {
        let src = "leaf /* x */ a; // trailing\n";
        let toks = tokens(src);
        let texts: Vec<&str> = toks.iter().map(|t| &*t.text).collect();
        assert!(!texts.iter().any(|t| t.contains("x") || t.contains("trailing")));
    }
}
