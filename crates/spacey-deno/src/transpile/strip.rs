// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! TypeScript type erasure.
//!
//! The eraser walks the token stream and records edits against the original
//! text instead of building an AST. Type-only syntax is overwritten with
//! spaces, line terminators are kept, so every executable token stays at the
//! same line and column it had in the TypeScript source.
//!
//! ## Blanked
//!
//! ```typescript
//! let x: number = 42;                 // let x         = 42;
//! function id<T>(v: T): T { ... }     // function id   (v   )    { ... }
//! type ID = string | number;          // (whitespace)
//! interface User { name: string }     // (whitespace)
//! const n = value as string;          // const n = value          ;
//! import type { A } from "./a.ts";    // (whitespace)
//! ```
//!
//! ## Rewritten
//!
//! ```typescript
//! enum Color { Red, Green }
//! ```
//! Becomes:
//! ```javascript
//! var Color; (function (Color) { Color[Color["Red"] = 0] = "Red"; ... })(Color || (Color = {}));
//! ```
//!
//! Constructor parameter properties (`constructor(private x: number) {}`)
//! gain `this.x = x;` at the start of the body.
//!
//! ## Rejected
//!
//! Namespaces, `import x = require(...)`, `export =`, parameter decorators,
//! and parameter properties in derived classes have runtime semantics that
//! cannot be expressed by erasure alone.

use super::scanner::{match_brackets, ScanError, Scanner, Span, Token, TokenKind};

type EraseResult<T> = Result<T, ScanError>;

/// Words that cannot end an expression.
const NON_VALUE_WORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case",
    "do", "else", "yield", "await", "extends", "export", "import", "default", "let", "const",
    "var", "if", "while", "for", "switch", "with", "catch", "function", "class", "as",
    "satisfies", "keyof", "is",
];

/// Words that may precede a parenthesized condition rather than a parameter list.
const CONTROL_WORDS: &[&str] = &[
    "if", "while", "for", "switch", "catch", "with", "return", "typeof", "function", "await",
    "yield", "new", "delete", "void", "in", "of", "instanceof", "case", "do", "else", "throw",
];

const CLASS_MODIFIERS: &[&str] = &[
    "public", "private", "protected", "readonly", "override", "abstract", "declare", "static",
    "async", "get", "set", "accessor",
];

const PARAMETER_MODIFIERS: &[&str] = &["public", "private", "protected", "readonly", "override"];

#[derive(Debug)]
enum Edit {
    /// Overwrite with spaces, keeping line terminators
    Blank { start: usize, end: usize },
    /// Substitute generated code, padded with the newlines it replaced
    Replace { start: usize, end: usize, text: String },
    /// Insert generated code
    Insert { at: usize, text: String },
}

impl Edit {
    fn start(&self) -> usize {
        match self {
            Edit::Blank { start, .. } | Edit::Replace { start, .. } => *start,
            Edit::Insert { at, .. } => *at,
        }
    }

    fn end(&self) -> usize {
        match self {
            Edit::Blank { end, .. } | Edit::Replace { end, .. } => *end,
            Edit::Insert { at, .. } => *at,
        }
    }

    /// The same edit, moved `offset` bytes later in the source.
    fn shifted(self, offset: usize) -> Self {
        match self {
            Edit::Blank { start, end } => Edit::Blank {
                start: start + offset,
                end: end + offset,
            },
            Edit::Replace { start, end, text } => Edit::Replace {
                start: start + offset,
                end: end + offset,
                text,
            },
            Edit::Insert { at, text } => Edit::Insert {
                at: at + offset,
                text,
            },
        }
    }
}

/// Erase TypeScript syntax from `source`, producing JavaScript.
pub fn erase(source: &str) -> EraseResult<String> {
    let mut eraser = Eraser::new(source)?;
    eraser.run()?;
    Ok(eraser.finish())
}

struct Eraser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    matching: Vec<usize>,
    /// Inner spans of template substitutions, in source order
    substitutions: Vec<Span>,
    pos: usize,
    edits: Vec<Edit>,
}

impl<'a> Eraser<'a> {
    fn new(source: &'a str) -> EraseResult<Self> {
        let (tokens, substitutions) = Scanner::new(source).scan_with_substitutions()?;
        let matching = match_brackets(&tokens)?;
        Ok(Self {
            source,
            tokens,
            matching,
            substitutions,
            pos: 0,
            edits: Vec::new(),
        })
    }

    fn run(&mut self) -> EraseResult<()> {
        let end = self.tokens.len();
        self.walk(end, &[])
    }

    // ==================== Token helpers ====================

    fn tok(&self, i: usize) -> Option<&Token> {
        self.tokens.get(i)
    }

    fn kind(&self, i: usize) -> Option<TokenKind> {
        self.tokens.get(i).map(|t| t.kind)
    }

    fn text(&self, i: usize) -> &'a str {
        let source = self.source;
        self.tokens
            .get(i)
            .map_or("", |t| &source[t.span.start..t.span.end])
    }

    fn is_punct(&self, i: usize, p: &str) -> bool {
        matches!(self.kind(i), Some(TokenKind::Punct(q)) if q == p)
    }

    fn is_name(&self, i: usize) -> bool {
        matches!(self.kind(i), Some(TokenKind::Ident))
    }

    fn is_word(&self, i: usize, word: &str) -> bool {
        self.is_name(i) && self.text(i) == word
    }

    fn newline_before(&self, i: usize) -> bool {
        self.tok(i).is_none_or(|t| t.newline_before)
    }

    fn fail<T>(&self, i: usize, message: impl Into<String>) -> EraseResult<T> {
        Err(ScanError {
            offset: self.tok(i).map_or(self.source.len(), |t| t.span.start),
            message: message.into(),
        })
    }

    /// Whether token `i` can be the last token of an expression.
    fn ends_value(&self, i: usize) -> bool {
        match self.kind(i) {
            Some(TokenKind::Ident) => !NON_VALUE_WORDS.contains(&self.text(i)),
            Some(
                TokenKind::String
                | TokenKind::Number
                | TokenKind::Template
                | TokenKind::Regex
                | TokenKind::PrivateName,
            ) => true,
            Some(TokenKind::Punct(")" | "]")) => true,
            _ => false,
        }
    }

    /// Whether token `i` is an operator still waiting for its right operand.
    fn expects_operand(&self, i: usize) -> bool {
        matches!(
            self.kind(i),
            Some(TokenKind::Punct(p)) if !matches!(p, ")" | "]" | "}" | "++" | "--" | ";")
        )
    }

    fn at_statement_start(&self, i: usize) -> bool {
        if i == 0 {
            return true;
        }
        match self.kind(i - 1) {
            Some(TokenKind::Punct(";" | "{" | "}")) => true,
            _ => self.newline_before(i) && !self.expects_operand(i - 1),
        }
    }

    fn is_method_name(&self, i: usize) -> bool {
        match self.kind(i) {
            Some(TokenKind::Ident) => !CONTROL_WORDS.contains(&self.text(i)),
            Some(TokenKind::String | TokenKind::Number | TokenKind::PrivateName) => true,
            Some(TokenKind::Punct("]" | ">")) => true,
            _ => false,
        }
    }

    // ==================== Edits ====================

    /// Blank tokens `from..to`, absorbing edits already made inside the range.
    fn blank(&mut self, from: usize, to: usize) {
        if from >= to || to > self.tokens.len() {
            return;
        }
        let start = self.tokens[from].span.start;
        let end = self.tokens[to - 1].span.end;
        self.edits.retain(|e| e.start() < start || e.end() > end);
        self.edits.push(Edit::Blank { start, end });
    }

    fn finish(mut self) -> String {
        let mut edits = std::mem::take(&mut self.edits);
        edits.sort_by_key(Edit::start);

        let source = self.source;
        let mut out = String::with_capacity(source.len());
        let mut cursor = 0;
        for edit in edits {
            if edit.start() < cursor {
                continue;
            }
            out.push_str(&source[cursor..edit.start()]);
            match edit {
                Edit::Blank { start, end } => {
                    out.extend(source[start..end].chars().map(|c| match c {
                        '\n' | '\r' => c,
                        _ => ' ',
                    }));
                    cursor = end;
                }
                Edit::Replace { start, end, text } => {
                    out.push_str(&text);
                    let lines = source[start..end].matches('\n').count();
                    out.extend(std::iter::repeat_n('\n', lines));
                    cursor = end;
                }
                Edit::Insert { at, text } => {
                    out.push_str(&text);
                    cursor = at;
                }
            }
        }
        out.push_str(&source[cursor..]);
        out
    }

    // ==================== Types ====================

    fn expect_type(&self, i: usize) -> EraseResult<usize> {
        match self.skip_type(i) {
            Some(end) => Ok(end),
            None => self.fail(i, "Type expected"),
        }
    }

    fn expect_angle(&self, i: usize) -> EraseResult<usize> {
        match self.skip_angle(i) {
            Some(end) => Ok(end),
            None => self.fail(i, "'>' expected"),
        }
    }

    /// Skip a `<...>` list starting at `open`, returning the index after `>`.
    ///
    /// Returns `None` on tokens that cannot appear in a type argument list,
    /// which is how comparisons are told apart from generics.
    fn skip_angle(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut k = open;
        loop {
            match self.kind(k)? {
                TokenKind::Punct("<") => depth += 1,
                TokenKind::Punct(">") => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(k + 1);
                    }
                }
                TokenKind::Punct("(" | "[" | "{") => k = self.matching[k],
                TokenKind::Punct(
                    "," | "." | "|" | "&" | "?" | ":" | "-" | "..." | "=" | "=>",
                ) => {}
                TokenKind::Punct(_) | TokenKind::Regex => return None,
                _ => {}
            }
            k += 1;
        }
    }

    /// Skip a full type starting at `i`, returning the index after it.
    fn skip_type(&self, i: usize) -> Option<usize> {
        let k = self.skip_union(i)?;
        // Conditional type
        if self.is_word(k, "extends") && !self.newline_before(k) {
            if let Some(check) = self.skip_union(k + 1) {
                if self.is_punct(check, "?") {
                    let when_true = self.skip_type(check + 1)?;
                    if self.is_punct(when_true, ":") {
                        return self.skip_type(when_true + 1);
                    }
                }
            }
        }
        Some(k)
    }

    fn skip_union(&self, i: usize) -> Option<usize> {
        let mut k = i;
        if self.is_punct(k, "|") || self.is_punct(k, "&") {
            k += 1;
        }
        k = self.skip_type_operand(k)?;
        while self.is_punct(k, "|") || self.is_punct(k, "&") {
            k = self.skip_type_operand(k + 1)?;
        }
        Some(k)
    }

    fn starts_type(&self, i: usize) -> bool {
        match self.kind(i) {
            None => false,
            Some(TokenKind::Punct(p)) => matches!(p, "(" | "[" | "{" | "<" | "-"),
            Some(_) => true,
        }
    }

    fn skip_type_operand(&self, i: usize) -> Option<usize> {
        let mut k = i;
        while matches!(self.text(k), "keyof" | "unique" | "readonly")
            && self.is_name(k)
            && self.starts_type(k + 1)
        {
            k += 1;
        }
        if self.is_word(k, "infer") && self.is_name(k + 1) {
            return Some(self.skip_postfix(k + 2));
        }
        if self.is_word(k, "abstract") && self.is_word(k + 1, "new") {
            k += 1;
        }
        if self.is_word(k, "new") && (self.is_punct(k + 1, "(") || self.is_punct(k + 1, "<")) {
            return self.skip_function_type(k + 1);
        }
        if self.is_word(k, "asserts") && self.is_name(k + 1) && !self.newline_before(k + 1) {
            if self.is_word(k + 2, "is") {
                return self.skip_type(k + 3);
            }
            return Some(k + 2);
        }

        let next = match self.kind(k)? {
            TokenKind::Punct("(") => {
                let close = self.matching[k];
                if self.is_punct(close + 1, "=>") {
                    return self.skip_type(close + 2);
                }
                close + 1
            }
            TokenKind::Punct("<") => return self.skip_function_type(k),
            TokenKind::Punct("{" | "[") => self.matching[k] + 1,
            TokenKind::String | TokenKind::Template | TokenKind::Number => k + 1,
            TokenKind::Punct("-") if self.kind(k + 1) == Some(TokenKind::Number) => k + 2,
            TokenKind::Ident if self.is_word(k, "typeof") => {
                let k = self.skip_entity_name(k + 1)?;
                if self.is_punct(k, "<") { self.skip_angle(k)? } else { k }
            }
            TokenKind::Ident if self.is_word(k, "import") && self.is_punct(k + 1, "(") => {
                let mut k = self.matching[k + 1] + 1;
                while self.is_punct(k, ".") && self.is_name(k + 1) {
                    k += 2;
                }
                if self.is_punct(k, "<") { self.skip_angle(k)? } else { k }
            }
            TokenKind::Ident => {
                let mut k = self.skip_entity_name(k)?;
                if self.is_punct(k, "<") && !self.newline_before(k) {
                    k = self.skip_angle(k)?;
                }
                // Type predicate
                if self.is_word(k, "is") && !self.newline_before(k) {
                    return self.skip_type(k + 1);
                }
                k
            }
            _ => return None,
        };
        Some(self.skip_postfix(next))
    }

    fn skip_entity_name(&self, i: usize) -> Option<usize> {
        if !self.is_name(i) {
            return None;
        }
        let mut k = i + 1;
        while self.is_punct(k, ".") && self.is_name(k + 1) {
            k += 2;
        }
        Some(k)
    }

    /// `T[]` and `T["key"]`
    fn skip_postfix(&self, i: usize) -> usize {
        let mut k = i;
        while self.is_punct(k, "[") && !self.newline_before(k) {
            k = self.matching[k] + 1;
        }
        k
    }

    fn skip_function_type(&self, i: usize) -> Option<usize> {
        let mut k = i;
        if self.is_punct(k, "<") {
            k = self.skip_angle(k)?;
        }
        if !self.is_punct(k, "(") {
            return None;
        }
        let close = self.matching[k];
        if !self.is_punct(close + 1, "=>") {
            return None;
        }
        self.skip_type(close + 2)
    }

    // ==================== Walker ====================

    /// Process tokens from `self.pos` up to `end`, stopping early at any
    /// punctuator in `stops` that appears at this nesting level.
    fn walk(&mut self, end: usize, stops: &[&str]) -> EraseResult<()> {
        while self.pos < end {
            if let Some(TokenKind::Punct(p)) = self.kind(self.pos) {
                if stops.contains(&p) {
                    break;
                }
            }
            self.step(end)?;
        }
        Ok(())
    }

    fn step(&mut self, end: usize) -> EraseResult<()> {
        let i = self.pos;
        let Some(token) = self.tok(i).copied() else {
            self.pos = end;
            return Ok(());
        };
        match token.kind {
            TokenKind::Punct("(") => self.parenthesized(i),
            TokenKind::Punct("{" | "[") => self.nested(i),
            TokenKind::Punct("<") => {
                self.angle(i);
                Ok(())
            }
            // Non-null assertion
            TokenKind::Punct("!") if i > 0 && self.ends_value(i - 1) && !token.newline_before => {
                self.blank(i, i + 1);
                self.pos = i + 1;
                Ok(())
            }
            TokenKind::Ident => self.word(i, end),
            TokenKind::Template => self.template(i),
            _ => {
                self.pos = i + 1;
                Ok(())
            }
        }
    }

    /// Erase inside each `${ ... }` of the template literal at `i`.
    fn template(&mut self, i: usize) -> EraseResult<()> {
        let span = self.tokens[i].span;
        let source = self.source;
        let inner: Vec<Span> = self
            .substitutions
            .iter()
            .filter(|s| s.start > span.start && s.end < span.end)
            .copied()
            .collect();

        for sub in inner {
            let shift = |e: ScanError| ScanError {
                offset: e.offset + sub.start,
                message: e.message,
            };
            let mut eraser = Eraser::new(&source[sub.start..sub.end]).map_err(shift)?;
            eraser.run().map_err(shift)?;
            self.edits
                .extend(eraser.edits.into_iter().map(|e| e.shifted(sub.start)));
        }
        self.pos = i + 1;
        Ok(())
    }

    fn nested(&mut self, open: usize) -> EraseResult<()> {
        let close = self.matching[open];
        self.pos = open + 1;
        self.walk(close, &[])?;
        self.pos = close + 1;
        Ok(())
    }

    fn parenthesized(&mut self, open: usize) -> EraseResult<()> {
        let close = self.matching[open];
        let typed_then = |p: &str| {
            self.is_punct(close + 1, ":")
                && self
                    .skip_type(close + 2)
                    .is_some_and(|e| self.is_punct(e, p) && !self.newline_before(e))
        };
        let arrow = self.is_punct(close + 1, "=>") || typed_then("=>");
        let method = open > 0
            && self.is_method_name(open - 1)
            && ((self.is_punct(close + 1, "{") && !self.newline_before(close + 1))
                || typed_then("{"));

        if !(arrow || method) {
            return self.nested(open);
        }

        let properties = self.parameters(open)?;
        if !properties.is_empty() {
            return self.fail(open, "Parameter properties are only allowed in constructors");
        }
        let mut k = close + 1;
        if self.is_punct(k, ":") {
            let end = self.expect_type(k + 1)?;
            self.blank(k, end);
            k = end;
        }
        self.pos = k;
        Ok(())
    }

    /// Generic call arguments, generic arrow parameters, or `<T>expr`.
    fn angle(&mut self, i: usize) {
        self.pos = i + 1;
        let Some(end) = self.skip_angle(i) else {
            return;
        };
        let erase = if i > 0 && self.ends_value(i - 1) {
            self.is_name(i - 1)
                && !self.newline_before(i)
                && (self.is_punct(end, "(") || self.kind(end) == Some(TokenKind::Template))
        } else {
            self.is_punct(end, "(")
                || matches!(
                    self.kind(end),
                    Some(TokenKind::Ident | TokenKind::String | TokenKind::Number)
                )
        };
        if erase {
            self.blank(i, end);
            self.pos = end;
        }
    }

    fn word(&mut self, i: usize, end: usize) -> EraseResult<()> {
        // Property access: `obj.type`, `x?.class`
        if i > 0 && (self.is_punct(i - 1, ".") || self.is_punct(i - 1, "?.")) {
            self.pos = i + 1;
            return Ok(());
        }

        let handled = match self.text(i) {
            "import" => self.import_declaration(i)?,
            "export" => self.export_declaration(i)?,
            "function" => self.function(i, i)?,
            "class" => self.class(i)?,
            "const" if self.is_word(i + 1, "enum") => self.enumeration(i)?,
            "let" | "const" | "var" => self.declaration(i, end)?,
            "as" | "satisfies" => self.assertion(i)?,
            "catch" if self.is_punct(i + 1, "(") => {
                self.parameters(i + 1)?;
                true
            }
            _ if self.at_statement_start(i) => self.type_statement(i, i)?,
            _ => false,
        };
        if !handled {
            self.pos = i + 1;
        }
        Ok(())
    }

    // ==================== Declarations ====================

    /// Statements that only exist at the type level. `start` is the first
    /// token of the statement, which differs from `i` after `export`.
    fn type_statement(&mut self, i: usize, start: usize) -> EraseResult<bool> {
        let same_line_name = self.is_name(i + 1) && !self.newline_before(i + 1);
        match self.text(i) {
            "interface" if same_line_name => {
                let mut k = i + 2;
                while !self.is_punct(k, "{") {
                    if self.tok(k).is_none() {
                        return self.fail(i, "'{' expected");
                    }
                    k = if self.is_punct(k, "<") { self.expect_angle(k)? } else { k + 1 };
                }
                let close = self.matching[k];
                self.blank(start, close + 1);
                self.pos = close + 1;
                Ok(true)
            }
            "type" if same_line_name && (self.is_punct(i + 2, "=") || self.is_punct(i + 2, "<")) => {
                let mut k = i + 2;
                if self.is_punct(k, "<") {
                    k = self.expect_angle(k)?;
                }
                if !self.is_punct(k, "=") {
                    return self.fail(k, "'=' expected");
                }
                let mut k = self.expect_type(k + 1)?;
                if self.is_punct(k, ";") {
                    k += 1;
                }
                self.blank(start, k);
                self.pos = k;
                Ok(true)
            }
            "declare" if same_line_name => {
                let k = self.declaration_end(i + 1);
                self.blank(start, k);
                self.pos = k;
                Ok(true)
            }
            "abstract" if self.is_word(i + 1, "class") && !self.newline_before(i + 1) => {
                self.blank(i, i + 1);
                self.class(i + 1)
            }
            "enum" if self.is_name(i + 1) && self.is_punct(i + 2, "{") => self.enumeration(i),
            "namespace" | "module"
                if (same_line_name || self.kind(i + 1) == Some(TokenKind::String))
                    && (self.is_punct(i + 2, "{") || self.is_punct(i + 2, ".")) =>
            {
                self.fail(i, "Namespaces are not supported")
            }
            _ => Ok(false),
        }
    }

    /// End of an ambient `declare ...` statement.
    fn declaration_end(&self, i: usize) -> usize {
        let mut k = i;
        while let Some(token) = self.tok(k) {
            match token.kind {
                TokenKind::Punct(";") => return k + 1,
                // Closes the enclosing block
                TokenKind::Punct("}") => return k,
                TokenKind::Punct("{") => {
                    k = self.matching[k] + 1;
                    if self.is_punct(k, ";") {
                        return k + 1;
                    }
                    if self.newline_before(k) {
                        return k;
                    }
                }
                TokenKind::Punct("(" | "[") => k = self.matching[k] + 1,
                _ => {
                    if k > i
                        && token.newline_before
                        && !self.expects_operand(k - 1)
                        && !self.is_punct(k, "|")
                        && !self.is_punct(k, "&")
                    {
                        return k;
                    }
                    k += 1;
                }
            }
        }
        k
    }

    fn import_declaration(&mut self, i: usize) -> EraseResult<bool> {
        let next = i + 1;
        let has_clause = self.is_punct(next, "{")
            || self.is_punct(next, "*")
            || self.is_name(next)
            || self.kind(next) == Some(TokenKind::String);
        if !has_clause {
            // `import(...)`, `import.meta`
            return Ok(false);
        }

        if self.is_word(next, "type")
            && !(self.is_punct(i + 2, ",") || self.is_word(i + 2, "from") || self.is_punct(i + 2, "="))
        {
            let end = self.module_statement_end(i);
            self.blank(i, end);
            self.pos = end;
            return Ok(true);
        }
        if self.is_name(next) && self.is_punct(i + 2, "=") {
            return self.fail(i, "Import assignments are not supported");
        }

        let mut k = next;
        while let Some(token) = self.tok(k) {
            match token.kind {
                TokenKind::String | TokenKind::Punct(";") => break,
                TokenKind::Punct("{") => {
                    self.erase_type_specifiers(k);
                    break;
                }
                _ => k += 1,
            }
        }
        self.pos = self.module_statement_end(i);
        Ok(true)
    }

    fn export_declaration(&mut self, i: usize) -> EraseResult<bool> {
        let n = i + 1;
        if self.is_punct(n, "=") {
            return self.fail(i, "Export assignments are not supported");
        }
        if self.is_word(n, "import") && self.is_name(n + 1) && self.is_punct(n + 2, "=") {
            return self.fail(i, "Import assignments are not supported");
        }
        if self.is_word(n, "type") && (self.is_punct(n + 1, "{") || self.is_punct(n + 1, "*")) {
            let end = self.module_statement_end(i);
            self.blank(i, end);
            self.pos = end;
            return Ok(true);
        }
        if self.is_punct(n, "{") || self.is_punct(n, "*") {
            if self.is_punct(n, "{") {
                self.erase_type_specifiers(n);
            }
            self.pos = self.module_statement_end(i);
            return Ok(true);
        }
        if self.is_word(n, "default") {
            let d = n + 1;
            if self.is_word(d, "interface") || self.is_word(d, "abstract") {
                if self.type_statement(d, i)? {
                    return Ok(true);
                }
            }
            if self.is_word(d, "function") {
                return self.function(d, i);
            }
            if self.is_word(d, "async") && self.is_word(d + 1, "function") {
                return self.function(d + 1, i);
            }
            self.pos = d;
            return Ok(true);
        }
        if self.is_word(n, "function") {
            return self.function(n, i);
        }
        if self.is_word(n, "async") && self.is_word(n + 1, "function") {
            return self.function(n + 1, i);
        }
        if self.is_word(n, "const") && self.is_word(n + 1, "enum") {
            return self.enumeration(n);
        }
        if matches!(
            self.text(n),
            "interface" | "type" | "declare" | "abstract" | "enum" | "namespace" | "module"
        ) && self.is_name(n)
            && self.type_statement(n, i)?
        {
            return Ok(true);
        }
        self.pos = n;
        Ok(true)
    }

    /// Blank `type X` entries inside an import or export brace list.
    fn erase_type_specifiers(&mut self, open: usize) {
        let close = self.matching[open];
        let mut k = open + 1;
        while k < close {
            let mut element_end = k;
            while element_end < close && !self.is_punct(element_end, ",") {
                element_end += 1;
            }
            let len = element_end - k;
            // `type` alone and `type as x` name a binding called `type`
            let is_type = self.is_word(k, "type")
                && len >= 2
                && !(len == 3 && self.is_word(k + 1, "as"));
            if is_type {
                let to = if element_end < close { element_end + 1 } else { element_end };
                self.blank(k, to);
            }
            k = element_end + 1;
        }
    }

    /// Index after an import/export statement's module specifier,
    /// import attributes, and semicolon.
    fn module_statement_end(&self, i: usize) -> usize {
        let mut k = i + 1;
        while let Some(token) = self.tok(k) {
            match token.kind {
                TokenKind::String => {
                    k += 1;
                    if (self.is_word(k, "with") || self.is_word(k, "assert"))
                        && self.is_punct(k + 1, "{")
                        && !self.newline_before(k)
                    {
                        k = self.matching[k + 1] + 1;
                    }
                    break;
                }
                TokenKind::Punct(";") => return k + 1,
                TokenKind::Punct("{") => {
                    k = self.matching[k] + 1;
                    if self.newline_before(k) && !self.is_word(k, "from") {
                        return k;
                    }
                }
                _ => k += 1,
            }
        }
        if self.is_punct(k, ";") { k + 1 } else { k }
    }

    fn function(&mut self, i: usize, start: usize) -> EraseResult<bool> {
        let mut k = i + 1;
        if self.is_punct(k, "*") {
            k += 1;
        }
        if self.is_name(k) {
            k += 1;
        }
        if self.is_punct(k, "<") {
            let end = self.expect_angle(k)?;
            self.blank(k, end);
            k = end;
        }
        if !self.is_punct(k, "(") {
            return Ok(false);
        }

        let close = self.matching[k];
        let properties = self.parameters(k)?;
        if !properties.is_empty() {
            return self.fail(k, "Parameter properties are only allowed in constructors");
        }
        let mut k = close + 1;
        if self.is_punct(k, ":") {
            let end = self.expect_type(k + 1)?;
            self.blank(k, end);
            k = end;
        }
        if self.is_punct(k, "{") {
            self.pos = k;
            return Ok(true);
        }

        // Overload signature
        if self.is_punct(k, ";") {
            k += 1;
        }
        self.blank(start, k);
        self.pos = k;
        Ok(true)
    }

    /// Erase types from a parameter list and return the names of any
    /// parameter properties. Leaves `pos` after the closing parenthesis.
    fn parameters(&mut self, open: usize) -> EraseResult<Vec<&'a str>> {
        let close = self.matching[open];
        let mut properties = Vec::new();
        let mut k = open + 1;

        while k < close {
            let param_start = k;
            if self.is_punct(k, "@") {
                return self.fail(k, "Parameter decorators are not supported");
            }

            let mut is_property = false;
            while PARAMETER_MODIFIERS.contains(&self.text(k))
                && self.is_name(k)
                && (self.is_name(k + 1) || self.is_punct(k + 1, "{") || self.is_punct(k + 1, "["))
            {
                self.blank(k, k + 1);
                is_property = true;
                k += 1;
            }
            if self.is_punct(k, "...") {
                k += 1;
            }

            // `this` parameter
            if self.is_word(k, "this") && self.is_punct(k + 1, ":") {
                let mut end = self.expect_type(k + 2)?;
                if self.is_punct(end, ",") {
                    end += 1;
                }
                self.blank(param_start, end);
                k = end;
                continue;
            }

            let name = k;
            if self.is_punct(k, "{") || self.is_punct(k, "[") {
                let pattern_close = self.matching[k];
                self.pos = k + 1;
                self.walk(pattern_close, &[])?;
                k = pattern_close + 1;
            } else if self.is_name(k) {
                k += 1;
            } else {
                return self.fail(k, "Parameter declaration expected");
            }

            if self.is_punct(k, "?") {
                self.blank(k, k + 1);
                k += 1;
            }
            if self.is_punct(k, ":") {
                let end = self.expect_type(k + 1)?;
                self.blank(k, end);
                k = end;
            }
            if self.is_punct(k, "=") {
                self.pos = k + 1;
                self.walk(close, &[","])?;
                k = self.pos;
            }
            if is_property {
                properties.push(self.text(name));
            }

            if self.is_punct(k, ",") {
                k += 1;
            } else if k != close {
                return self.fail(k, "',' expected");
            }
        }

        self.pos = close + 1;
        Ok(properties)
    }

    fn declaration(&mut self, i: usize, end: usize) -> EraseResult<bool> {
        let binds = |k: usize| self.is_name(k) || self.is_punct(k, "{") || self.is_punct(k, "[");
        if !binds(i + 1) {
            // `let` used as an identifier
            return Ok(false);
        }

        let mut k = i + 1;
        loop {
            if self.is_punct(k, "{") || self.is_punct(k, "[") {
                let close = self.matching[k];
                self.pos = k + 1;
                self.walk(close, &[])?;
                k = close + 1;
            } else if self.is_name(k) {
                k += 1;
            } else {
                break;
            }

            // Definite assignment
            if self.is_punct(k, "!") {
                self.blank(k, k + 1);
                k += 1;
            }
            if self.is_punct(k, ":") {
                let type_end = self.expect_type(k + 1)?;
                self.blank(k, type_end);
                k = type_end;
            }
            if self.is_punct(k, "=") {
                self.pos = k + 1;
                self.walk(end, &[",", ";"])?;
                k = self.pos;
            }
            let binds = |k: usize| self.is_name(k) || self.is_punct(k, "{") || self.is_punct(k, "[");
            if self.is_punct(k, ",") && binds(k + 1) {
                k += 1;
                continue;
            }
            break;
        }
        self.pos = k;
        Ok(true)
    }

    fn assertion(&mut self, i: usize) -> EraseResult<bool> {
        if i == 0 || !self.ends_value(i - 1) || self.newline_before(i) {
            return Ok(false);
        }
        let end = self.expect_type(i + 1)?;
        self.blank(i, end);
        self.pos = end;
        Ok(true)
    }

    // ==================== Classes ====================

    fn class(&mut self, i: usize) -> EraseResult<bool> {
        let mut k = i + 1;
        if self.is_name(k) && !self.is_word(k, "extends") && !self.is_word(k, "implements") {
            k += 1;
        }
        if self.is_punct(k, "<") {
            let end = self.expect_angle(k)?;
            self.blank(k, end);
            k = end;
        }

        let mut derived = false;
        if self.is_word(k, "extends") {
            derived = true;
            k += 1;
            while let Some(token) = self.tok(k) {
                match token.kind {
                    TokenKind::Punct("{") => break,
                    TokenKind::Ident if self.is_word(k, "implements") => break,
                    TokenKind::Punct("(" | "[") => {
                        let close = self.matching[k];
                        self.pos = k + 1;
                        self.walk(close, &[])?;
                        k = close + 1;
                    }
                    TokenKind::Punct("<") => {
                        let end = self.expect_angle(k)?;
                        self.blank(k, end);
                        k = end;
                    }
                    _ => k += 1,
                }
            }
        }

        if self.is_word(k, "implements") {
            let clause = k;
            while !self.is_punct(k, "{") {
                if self.tok(k).is_none() {
                    return self.fail(clause, "'{' expected");
                }
                k = if self.is_punct(k, "<") { self.expect_angle(k)? } else { k + 1 };
            }
            self.blank(clause, k);
        }

        if !self.is_punct(k, "{") {
            // `{ class: ... }` and friends
            return Ok(false);
        }
        self.class_body(k, derived)?;
        Ok(true)
    }

    fn modifier_applies(&self, k: usize) -> bool {
        if !self.is_name(k) || !CLASS_MODIFIERS.contains(&self.text(k)) || self.newline_before(k + 1)
        {
            return false;
        }
        match self.kind(k + 1) {
            Some(
                TokenKind::Ident | TokenKind::String | TokenKind::Number | TokenKind::PrivateName,
            ) => true,
            Some(TokenKind::Punct("[" | "*")) => true,
            Some(TokenKind::Punct("{")) => self.is_word(k, "static"),
            _ => false,
        }
    }

    fn class_body(&mut self, open: usize, derived: bool) -> EraseResult<()> {
        let close = self.matching[open];
        let mut k = open + 1;

        while k < close {
            if self.is_punct(k, ";") {
                k += 1;
                continue;
            }
            let start = k;

            // Decorators
            while self.is_punct(k, "@") {
                k += 1;
                if self.is_name(k) {
                    k += 1;
                }
                while self.is_punct(k, ".") && self.is_name(k + 1) {
                    k += 2;
                }
                if self.is_punct(k, "(") {
                    let args_close = self.matching[k];
                    self.pos = k + 1;
                    self.walk(args_close, &[])?;
                    k = args_close + 1;
                }
            }

            let mut ambient = false;
            let mut is_static = false;
            while self.modifier_applies(k) {
                match self.text(k) {
                    "public" | "private" | "protected" | "readonly" | "override" => {
                        self.blank(k, k + 1)
                    }
                    "abstract" | "declare" => ambient = true,
                    "static" => is_static = true,
                    _ => {}
                }
                k += 1;
            }

            // Static initialization block
            if is_static && self.is_punct(k, "{") {
                let block_close = self.matching[k];
                self.pos = k + 1;
                self.walk(block_close, &[])?;
                k = block_close + 1;
                continue;
            }
            if self.is_punct(k, "*") {
                k += 1;
            }

            // Index signature
            if self.is_punct(k, "[") && self.is_name(k + 1) && self.is_punct(k + 2, ":") {
                let mut end = self.matching[k] + 1;
                if self.is_punct(end, ":") {
                    end = self.expect_type(end + 1)?;
                }
                if self.is_punct(end, ";") {
                    end += 1;
                }
                self.blank(start, end);
                k = end;
                continue;
            }

            let name = k;
            match self.kind(k) {
                Some(TokenKind::Punct("[")) => {
                    let key_close = self.matching[k];
                    self.pos = k + 1;
                    self.walk(key_close, &[])?;
                    k = key_close + 1;
                }
                Some(
                    TokenKind::Ident
                    | TokenKind::String
                    | TokenKind::Number
                    | TokenKind::PrivateName,
                ) => k += 1,
                _ => return self.fail(k, "Unexpected token in class body"),
            }

            if self.is_punct(k, "?") || self.is_punct(k, "!") {
                self.blank(k, k + 1);
                k += 1;
            }
            if self.is_punct(k, "<") {
                let end = self.expect_angle(k)?;
                self.blank(k, end);
                k = end;
            }

            if self.is_punct(k, "(") {
                let params_close = self.matching[k];
                let properties = self.parameters(k)?;
                let mut e = params_close + 1;
                if self.is_punct(e, ":") {
                    let type_end = self.expect_type(e + 1)?;
                    self.blank(e, type_end);
                    e = type_end;
                }

                if self.is_punct(e, "{") && !ambient {
                    if !properties.is_empty() {
                        if !self.is_word(name, "constructor") {
                            return self
                                .fail(k, "Parameter properties are only allowed in constructors");
                        }
                        if derived {
                            return self.fail(
                                k,
                                "Parameter properties are not supported in derived classes",
                            );
                        }
                        let assignments: Vec<String> = properties
                            .iter()
                            .map(|p| format!("this.{p} = {p};"))
                            .collect();
                        self.edits.push(Edit::Insert {
                            at: self.tokens[e].span.end,
                            text: format!(" {}", assignments.join(" ")),
                        });
                    }
                    let body_close = self.matching[e];
                    self.pos = e + 1;
                    self.walk(body_close, &[])?;
                    k = body_close + 1;
                } else {
                    // Overload signature or abstract method
                    if self.is_punct(e, ";") {
                        e += 1;
                    }
                    self.blank(start, e);
                    k = e;
                }
                continue;
            }

            // Field
            if self.is_punct(k, ":") {
                let type_end = self.expect_type(k + 1)?;
                self.blank(k, type_end);
                k = type_end;
            }
            if self.is_punct(k, "=") {
                self.pos = k + 1;
                self.field_initializer(k + 1, close)?;
                k = self.pos;
            }
            if self.is_punct(k, ";") {
                k += 1;
            }
            if ambient {
                self.blank(start, k);
            }
        }

        self.pos = close + 1;
        Ok(())
    }

    /// A field initializer runs to `;`, the class end, or the next member on
    /// a new line.
    fn field_initializer(&mut self, from: usize, close: usize) -> EraseResult<()> {
        while self.pos < close {
            let i = self.pos;
            if self.is_punct(i, ";") {
                break;
            }
            let starts_member = matches!(
                self.kind(i),
                Some(
                    TokenKind::Ident
                        | TokenKind::String
                        | TokenKind::Number
                        | TokenKind::PrivateName
                        | TokenKind::Punct("@" | "*")
                )
            );
            if i > from && self.newline_before(i) && !self.expects_operand(i - 1) && starts_member {
                break;
            }
            self.step(close)?;
        }
        Ok(())
    }

    // ==================== Enums ====================

    /// Rewrite `enum` / `const enum` starting at `first` into a `var` and an
    /// initializer function.
    fn enumeration(&mut self, first: usize) -> EraseResult<bool> {
        let keyword = if self.is_word(first, "const") { first + 1 } else { first };
        let name_index = keyword + 1;
        if !self.is_name(name_index) || !self.is_punct(name_index + 1, "{") {
            return self.fail(keyword, "Enum name expected");
        }
        let name = self.text(name_index);
        let open = name_index + 1;
        let close = self.matching[open];

        let mut statements = Vec::new();
        let mut declared: Vec<&str> = Vec::new();
        // Previous member key and its value, when it is a known integer
        let mut previous: Option<(String, Option<i64>)> = None;
        let mut m = open + 1;

        while m < close {
            let key = match self.kind(m) {
                Some(TokenKind::Ident) => format!("\"{}\"", self.text(m)),
                Some(TokenKind::String) => self.text(m).to_string(),
                _ => return self.fail(m, "Enum member expected"),
            };
            let member = m;
            m += 1;

            if self.is_punct(m, "=") {
                let init_start = m + 1;
                let mut e = init_start;
                while e < close && !self.is_punct(e, ",") {
                    e = match self.kind(e) {
                        Some(TokenKind::Punct("(" | "[" | "{")) => self.matching[e] + 1,
                        _ => e + 1,
                    };
                }
                if e == init_start {
                    return self.fail(init_start, "Expression expected");
                }
                let init = self.enum_initializer(init_start, e, name, &declared);
                if e - init_start == 1 && self.kind(init_start) == Some(TokenKind::String) {
                    statements.push(format!("{name}[{key}] = {init};"));
                    previous = Some((key, None));
                } else {
                    let value = self.integer_literal(init_start, e);
                    statements.push(format!("{name}[{name}[{key}] = {init}] = {key};"));
                    previous = Some((key, value));
                }
                m = e;
            } else {
                let (value, known) = match &previous {
                    None => ("0".to_string(), Some(0)),
                    Some((_, Some(n))) => ((n + 1).to_string(), Some(n + 1)),
                    Some((prev_key, None)) => (format!("{name}[{prev_key}] + 1"), None),
                };
                statements.push(format!("{name}[{name}[{key}] = {value}] = {key};"));
                previous = Some((key, known));
            }

            if self.is_name(member) {
                declared.push(self.text(member));
            }
            if self.is_punct(m, ",") {
                m += 1;
            }
        }

        let start = self.tokens[first].span.start;
        let end = self.tokens[close].span.end;
        self.edits.retain(|e| e.start() < start || e.end() > end);
        self.edits.push(Edit::Replace {
            start,
            end,
            text: format!(
                "var {name}; (function ({name}) {{ {} }})({name} || ({name} = {{}}));",
                statements.join(" ")
            ),
        });
        self.pos = close + 1;
        Ok(true)
    }

    fn integer_literal(&self, from: usize, to: usize) -> Option<i64> {
        match to - from {
            1 => self.text(from).parse().ok(),
            2 if self.is_punct(from, "-") => self.text(from + 1).parse::<i64>().ok().map(|n| -n),
            _ => None,
        }
    }

    /// Source text of an initializer with references to earlier members
    /// qualified by the enum name.
    fn enum_initializer(&self, from: usize, to: usize, name: &str, declared: &[&str]) -> String {
        let mut out = String::new();
        let mut cursor = self.tokens[from].span.start;
        for k in from..to {
            let span = self.tokens[k].span;
            let is_member_ref = self.is_name(k)
                && declared.contains(&self.text(k))
                && !(k > from && (self.is_punct(k - 1, ".") || self.is_punct(k - 1, "?.")));
            if is_member_ref {
                out.push_str(&self.source[cursor..span.start]);
                out.push_str(name);
                out.push('.');
                out.push_str(self.text(k));
                cursor = span.end;
            }
        }
        out.push_str(&self.source[cursor..self.tokens[to - 1].span.end]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn squash(s: &str) -> String {
        s.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn assert_erases(ts: &str, js: &str) {
        let out = erase(ts).unwrap();
        assert_eq!(squash(&out), squash(js), "output was:\n{}", out);
        assert_eq!(out.matches('\n').count(), ts.matches('\n').count());
    }

    fn error_message(ts: &str) -> String {
        erase(ts).unwrap_err().message
    }

    #[test]
    fn test_plain_javascript_is_untouched() {
        let js = "const a = [1, 2].map((x) => x * 2);\nif (a < b && c > d) { f(a) }\n";
        assert_eq!(erase(js).unwrap(), js);
    }

    #[test]
    fn test_variable_annotation() {
        assert_eq!(erase("let x: number = 42;").unwrap(), "let x         = 42;");
        assert_erases("let a!: string, b: Map<string, number[]> = new Map();", "let a , b = new Map();");
    }

    #[test]
    fn test_function_signature() {
        assert_erases(
            "function add(a: number, b?: number): number { return a + (b ?? 0); }",
            "function add(a , b ) { return a + (b ?? 0); }",
        );
        assert_erases("function id<T>(v: T): T { return v; }", "function id (v ) { return v; }");
    }

    #[test]
    fn test_arrow_functions() {
        assert_erases(
            "const f = (x: number): string => String(x);",
            "const f = (x ) => String(x);",
        );
        assert_erases("const g = <T,>(v: T) => v;", "const g = (v ) => v;");
        assert_erases(
            "const p = async (a: string[], { b }: Opts = {}) => a;",
            "const p = async (a , { b } = {}) => a;",
        );
    }

    #[test]
    fn test_type_declarations_vanish() {
        assert_erases(
            "type Id = string | number;\ninterface User<T> extends Base {\n  id: Id;\n}\nexport const one = 1;",
            "export const one = 1;",
        );
        assert_erases("export type Pair<A> = [A, A];\nexport interface X {}\n", "");
        assert_erases("declare const VERSION: string;\nconsole.log(VERSION);", "console.log(VERSION);");
    }

    #[test]
    fn test_type_only_imports_and_exports() {
        assert_erases("import type { A } from './a.ts';\nimport x from './x.ts';", "import x from './x.ts';");
        assert_erases(
            "import { type B, c, type D as E } from './b.ts';",
            "import { c, } from './b.ts';",
        );
        assert_erases("import { type } from './t.ts';", "import { type } from './t.ts';");
        assert_erases("export type { A } from './a.ts';\nexport { b } from './b.ts';", "export { b } from './b.ts';");
    }

    #[test]
    fn test_assertions_and_non_null() {
        assert_erases("const v = obj!.value as string;", "const v = obj .value ;");
        assert_erases("const c = [1, 2] as const;", "const c = [1, 2] ;");
        assert_erases("const u = x as unknown as Foo<Bar>;", "const u = x ;");
        assert_erases("const s = cfg satisfies Config;", "const s = cfg ;");
        assert_erases("if (!ready) { go(); }", "if (!ready) { go(); }");
    }

    #[test]
    fn test_generic_call_arguments() {
        assert_erases("const m = new Map<string, number>();", "const m = new Map ();");
        assert_erases("const s = useState<Item[]>([]);", "const s = useState ([]);");
        assert_erases("for (let i = 0; i < n; i++) { j = i > 2 ? 1 : 0; }", "for (let i = 0; i < n; i++) { j = i > 2 ? 1 : 0; }");
    }

    #[test]
    fn test_class_members() {
        let ts = "class Point implements Shape, Named {\n  private readonly x: number;\n  static origin?: Point;\n  declare tag: string;\n  [key: string]: unknown;\n  get len(): number { return 1; }\n}";
        let js = "class Point {\n x ;\n static origin ;\n \n \n get len() { return 1; }\n}";
        assert_erases(ts, js);
    }

    #[test]
    fn test_parameter_properties() {
        assert_erases(
            "class P {\n  constructor(public x: number, private y = 0) {}\n}",
            "class P {\n constructor( x , y = 0) { this.x = x; this.y = y;}\n}",
        );
        assert_eq!(
            error_message("class Q extends P { constructor(private z: number) { super(); } }"),
            "Parameter properties are not supported in derived classes"
        );
    }

    #[test]
    fn test_abstract_and_overloads() {
        assert_erases(
            "abstract class Base {\n  abstract run(): void;\n  protected name = 'x';\n}",
            "class Base {\n \n name = 'x';\n}",
        );
        assert_erases(
            "function over(a: string): string;\nfunction over(a: number): number;\nfunction over(a: any) { return a; }",
            "function over(a ) { return a; }",
        );
    }

    #[test]
    fn test_this_parameter_and_catch() {
        assert_erases(
            "function h(this: Window, ev: Event) {}",
            "function h( ev ) {}",
        );
        assert_erases("try { x(); } catch (e: unknown) { }", "try { x(); } catch (e ) { }");
    }

    #[test]
    fn test_object_literal_methods() {
        assert_erases(
            "const o = { m(a: number): void {}, n: f(1), k: (b) };",
            "const o = { m(a ) {}, n: f(1), k: (b) };",
        );
    }

    #[test]
    fn test_enum_rewrite() {
        let out = erase("enum Color { Red, Green = \"g\", Blue = 4, Cyan }").unwrap();
        assert_eq!(
            out,
            "var Color; (function (Color) { Color[Color[\"Red\"] = 0] = \"Red\"; \
             Color[\"Green\"] = \"g\"; Color[Color[\"Blue\"] = 4] = \"Blue\"; \
             Color[Color[\"Cyan\"] = 5] = \"Cyan\"; })(Color || (Color = {}));"
        );
    }

    #[test]
    fn test_enum_member_references_and_export() {
        let out = erase("export const enum Flags {\n  A = 1,\n  B = A << 1,\n}\n").unwrap();
        assert!(out.starts_with("export var Flags; (function (Flags) {"));
        assert!(out.contains("Flags[Flags[\"B\"] = Flags.A << 1] = \"B\";"));
        assert_eq!(out.matches('\n').count(), 4);
    }

    #[test]
    fn test_positions_are_preserved() {
        let ts = "const a: Array<string> = [];\nlet b = call<number>(a);\n";
        let out = erase(ts).unwrap();
        assert_eq!(out.len(), ts.len());
        assert_eq!(out.find("call"), ts.find("call"));
        assert_eq!(out.find("(a)"), ts.find("(a)"));
    }

    #[test]
    fn test_template_substitutions() {
        assert_erases("const s = `a${b as string}c`;", "const s = `a${b }c`;");
        assert_erases(
            "const t = `x${f<T>(`y${z!}`)}`;\nlet u: `k-${string}` = `k-${n}`;",
            "const t = `x${f (`y${z }`)}`;\nlet u = `k-${n}`;",
        );
        assert_erases("log(`${(v: number) => v}`);", "log(`${(v ) => v}`);");
        let js = "`${a ? b : c} ${d < e}`";
        assert_eq!(erase(js).unwrap(), js);
    }

    #[test]
    fn test_complex_types() {
        assert_erases(
            "let f: (a: number, ...rest: string[]) => Promise<void> | null = null;",
            "let f = null;",
        );
        assert_erases(
            "let g: T extends string ? { kind: 'a' } : [number, string?] = v;",
            "let g = v;",
        );
        assert_erases("let h: keyof typeof obj = 'a';", "let h = 'a';");
        assert_erases("let i: import('./m.ts').Thing<X>['k'] = z;", "let i = z;");
        assert_erases("function isStr(v: unknown): v is string { return true; }", "function isStr(v ) { return true; }");
    }

    #[test]
    fn test_unsupported_constructs() {
        assert_eq!(error_message("namespace NS { export const a = 1; }"), "Namespaces are not supported");
        assert_eq!(error_message("import fs = require('fs');"), "Import assignments are not supported");
        assert_eq!(error_message("export = foo;"), "Export assignments are not supported");
    }

    #[test]
    fn test_missing_type_reports_offset() {
        let err = erase("let x: = 5;").unwrap_err();
        assert_eq!(err.message, "Type expected");
        assert_eq!(err.offset, 7);
    }
}
