// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Span-preserving scanner for JavaScript and TypeScript sources.
//!
//! Tokens only carry their kind and byte span; text is always read back from
//! the source, so the eraser can copy everything it does not touch verbatim.
//! Comments and whitespace are trivia and never become tokens.

/// A byte range in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

/// Coarse token classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword
    Ident,
    /// `#name`
    PrivateName,
    /// Quoted string literal
    String,
    /// Complete template literal, substitutions included
    Template,
    /// Numeric or BigInt literal
    Number,
    /// Regular expression literal
    Regex,
    /// Punctuator; `>` is always a single-character token
    Punct(&'static str),
}

/// A scanned token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The span in the source code
    pub span: Span,
    /// Whether a line terminator precedes this token
    pub newline_before: bool,
}

/// A scanning failure at a byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
    /// Byte offset of the problem
    pub offset: usize,
    /// What went wrong
    pub message: String,
}

/// Longest-first operator table. `>` never combines so that nested generic
/// argument lists close one level per token.
const OPERATORS: &[&str] = &[
    "...", "===", "!==", "**=", "<<=", "&&=", "||=", "??=", "=>", "==", "!=", "<=",
    "&&", "||", "??", "?.", "**", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=",
    "<<", "{", "}", "(", ")", "[", "]", ";", ",", ":", "?", ".", "=", "!", "<", ">", "+", "-",
    "*", "/", "%", "&", "|", "^", "~", "@",
];

/// Identifier-like words after which a `/` starts a regular expression.
const REGEX_PRECEDING_WORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case",
    "do", "else", "yield", "await",
];

/// Scanner over a source string.
pub struct Scanner<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
    tokens: Vec<Token>,
    substitutions: Vec<Span>,
}

impl<'a> Scanner<'a> {
    /// Creates a new scanner for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            current_pos: 0,
            tokens: Vec::new(),
            substitutions: Vec::new(),
        }
    }

    /// Scan the whole source.
    pub fn scan(self) -> Result<Vec<Token>, ScanError> {
        self.scan_with_substitutions().map(|(tokens, _)| tokens)
    }

    /// Scan the whole source, also returning the inner span of every
    /// `${ ... }` substitution in a top-level template literal. Templates
    /// nested inside a substitution are part of that substitution's text.
    pub fn scan_with_substitutions(mut self) -> Result<(Vec<Token>, Vec<Span>), ScanError> {
        loop {
            let newline_before = self.skip_trivia()?;
            let start = self.current_pos;
            let Some((_, ch)) = self.advance() else {
                break;
            };

            let kind = match ch {
                '"' | '\'' => {
                    self.scan_string(ch, start)?;
                    TokenKind::String
                }
                '`' => {
                    self.scan_template(start, true)?;
                    TokenKind::Template
                }
                '0'..='9' => {
                    self.scan_number(start);
                    TokenKind::Number
                }
                '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                    self.scan_number(start);
                    TokenKind::Number
                }
                '#' if start == 0 && self.peek() == Some('!') => {
                    // Hashbang line
                    self.skip_line();
                    continue;
                }
                '#' => {
                    if !self.peek().is_some_and(is_id_start) {
                        return Err(self.error(start, "Invalid character '#'"));
                    }
                    self.scan_identifier_rest();
                    TokenKind::PrivateName
                }
                '/' if self.regex_allowed() => {
                    self.scan_regex(start)?;
                    TokenKind::Regex
                }
                _ if is_id_start(ch) || ch == '\\' => {
                    self.scan_identifier_rest();
                    TokenKind::Ident
                }
                _ => TokenKind::Punct(self.scan_operator(start)?),
            };

            self.tokens.push(Token {
                kind,
                span: Span {
                    start,
                    end: self.current_pos,
                },
                newline_before,
            });
        }
        Ok((self.tokens, self.substitutions))
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let result = self.chars.next();
        if let Some((pos, ch)) = result {
            self.current_pos = pos + ch.len_utf8();
        }
        result
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn peek_next(&self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.next().map(|(_, ch)| ch)
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> ScanError {
        ScanError {
            offset,
            message: message.into(),
        }
    }

    fn skip_line(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' || ch == '\r' {
                break;
            }
            self.advance();
        }
    }

    /// Skips whitespace and comments, reporting whether a line break was seen.
    fn skip_trivia(&mut self) -> Result<bool, ScanError> {
        let mut newline = false;
        loop {
            match self.peek() {
                Some('\n' | '\r' | '\u{2028}' | '\u{2029}') => {
                    newline = true;
                    self.advance();
                }
                Some(ch) if ch.is_whitespace() || ch == '\u{feff}' => {
                    self.advance();
                }
                Some('/') => match self.peek_next() {
                    Some('/') => self.skip_line(),
                    Some('*') => {
                        let start = self.current_pos;
                        self.advance();
                        self.advance();
                        let mut prev = ' ';
                        loop {
                            let Some((_, ch)) = self.advance() else {
                                return Err(self.error(start, "Unterminated comment"));
                            };
                            if ch == '\n' || ch == '\r' {
                                newline = true;
                            }
                            if prev == '*' && ch == '/' {
                                break;
                            }
                            prev = ch;
                        }
                    }
                    _ => break,
                },
                _ => break,
            }
        }
        Ok(newline)
    }

    fn scan_string(&mut self, quote: char, start: usize) -> Result<(), ScanError> {
        loop {
            match self.advance() {
                None | Some((_, '\n')) => return Err(self.error(start, "Unterminated string literal")),
                Some((_, ch)) if ch == quote => return Ok(()),
                Some((_, '\\')) => {
                    self.advance();
                }
                Some(_) => {}
            }
        }
    }

    /// Consumes a template literal including nested `${ ... }` substitutions.
    fn scan_template(&mut self, start: usize, record: bool) -> Result<(), ScanError> {
        loop {
            match self.advance() {
                None => return Err(self.error(start, "Unterminated template literal")),
                Some((_, '`')) => return Ok(()),
                Some((_, '\\')) => {
                    self.advance();
                }
                Some((_, '$')) if self.peek() == Some('{') => {
                    self.advance();
                    let inner = self.current_pos;
                    self.skip_substitution(start)?;
                    if record {
                        self.substitutions.push(Span {
                            start: inner,
                            end: self.current_pos - 1,
                        });
                    }
                }
                Some(_) => {}
            }
        }
    }

    fn skip_substitution(&mut self, start: usize) -> Result<(), ScanError> {
        let mut depth = 1usize;
        loop {
            let Some((pos, ch)) = self.advance() else {
                return Err(self.error(start, "Unterminated template literal"));
            };
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                '"' | '\'' => self.scan_string(ch, pos)?,
                '`' => self.scan_template(pos, false)?,
                '/' if self.peek() == Some('/') => self.skip_line(),
                '/' if self.peek() == Some('*') => {
                    self.advance();
                    let mut prev = ' ';
                    while let Some((_, c)) = self.advance() {
                        if prev == '*' && c == '/' {
                            break;
                        }
                        prev = c;
                    }
                }
                _ => {}
            }
        }
    }

    fn scan_number(&mut self, start: usize) {
        let hex = self.source[start..].starts_with("0x") || self.source[start..].starts_with("0X");
        while let Some(ch) = self.peek() {
            let exponent_sign = matches!(ch, '+' | '-')
                && !hex
                && self.source[start..self.current_pos].ends_with(['e', 'E']);
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '.' || exponent_sign {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn scan_identifier_rest(&mut self) {
        while let Some(ch) = self.peek() {
            if is_id_continue(ch) || ch == '\\' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn scan_regex(&mut self, start: usize) -> Result<(), ScanError> {
        let mut in_class = false;
        loop {
            match self.advance() {
                None | Some((_, '\n')) => return Err(self.error(start, "Unterminated regular expression")),
                Some((_, '\\')) => {
                    self.advance();
                }
                Some((_, '[')) => in_class = true,
                Some((_, ']')) => in_class = false,
                Some((_, '/')) if !in_class => break,
                Some(_) => {}
            }
        }
        // Flags
        self.scan_identifier_rest();
        Ok(())
    }

    fn scan_operator(&mut self, start: usize) -> Result<&'static str, ScanError> {
        let rest = &self.source[start..];
        let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) else {
            let ch = rest.chars().next().unwrap_or_default();
            return Err(self.error(start, format!("Invalid character '{}'", ch)));
        };
        // `?.5` is a conditional followed by a number
        let op = if *op == "?." && rest[2..].starts_with(|c: char| c.is_ascii_digit()) {
            "?"
        } else {
            op
        };
        // First character already consumed
        for _ in 1..op.len() {
            self.advance();
        }
        Ok(op)
    }

    /// Decides between regex literal and division from the previous token.
    fn regex_allowed(&self) -> bool {
        let Some(prev) = self.tokens.last() else {
            return true;
        };
        match prev.kind {
            TokenKind::Punct(")" | "]" | "++" | "--") => false,
            TokenKind::Punct(_) => true,
            TokenKind::Ident => {
                REGEX_PRECEDING_WORDS.contains(&&self.source[prev.span.start..prev.span.end])
            }
            _ => false,
        }
    }
}

/// Checks if a character can start an identifier.
fn is_id_start(ch: char) -> bool {
    ch == '_' || ch == '$' || unicode_xid::UnicodeXID::is_xid_start(ch)
}

/// Checks if a character can continue an identifier.
fn is_id_continue(ch: char) -> bool {
    ch == '_'
        || ch == '$'
        || ch == '\u{200c}'
        || ch == '\u{200d}'
        || unicode_xid::UnicodeXID::is_xid_continue(ch)
}

/// Pairs every opening bracket with its closing partner.
///
/// Returns, per token index, the index of the matching bracket (or
/// `usize::MAX` for non-bracket tokens).
pub fn match_brackets(tokens: &[Token]) -> Result<Vec<usize>, ScanError> {
    let mut matching = vec![usize::MAX; tokens.len()];
    let mut stack: Vec<(usize, &'static str)> = Vec::new();

    for (index, token) in tokens.iter().enumerate() {
        let TokenKind::Punct(p) = token.kind else {
            continue;
        };
        match p {
            "(" | "[" | "{" => stack.push((index, p)),
            ")" | "]" | "}" => {
                let expected = match p {
                    ")" => "(",
                    "]" => "[",
                    _ => "{",
                };
                match stack.pop() {
                    Some((open, open_p)) if open_p == expected => {
                        matching[open] = index;
                        matching[index] = open;
                    }
                    _ => {
                        return Err(ScanError {
                            offset: token.span.start,
                            message: format!("Unexpected '{}'", p),
                        });
                    }
                }
            }
            _ => {}
        }
    }

    if let Some((open, p)) = stack.pop() {
        return Err(ScanError {
            offset: tokens[open].span.start,
            message: format!("'{}' is never closed", p),
        });
    }

    Ok(matching)
}
