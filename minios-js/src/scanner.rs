//! Source cursor.
//!
//! There is no token stream: the evaluator reads straight from the source
//! text through a [`Cursor`], and loops rewind it to a saved offset to
//! re-parse their condition and body on every pass.
//!
//! Nothing in here reports errors. Unterminated strings, comments and
//! blocks simply run to the end of the input.

use alloc::string::String;

use crate::value::{scan_decimal, truncate_str};

/// Longest identifier kept, in bytes. Longer names are consumed in full and
/// then cut to this length.
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// Deepest chain of `if`/`while`/`for` headers followed when skipping.
const MAX_SKIP_DEPTH: usize = 128;

/// A position in immutable source text.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    /// Source code.
    source: &'a str,
    /// Current byte offset, always on a character boundary.
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor at the start of `source`.
    pub fn new(source: &'a str) -> Self {
        Cursor { source, pos: 0 }
    }

    /// Current byte offset.
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Rewind or advance to a previously saved offset.
    pub fn seek(&mut self, offset: usize) {
        self.pos = offset.min(self.source.len());
    }

    /// Check if the cursor is at the end of input.
    pub fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Unconsumed source text.
    pub fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    /// Current character.
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Character `n` positions ahead of the current one.
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    /// Check if the current character is `ch`.
    pub fn at(&self, ch: char) -> bool {
        self.peek() == Some(ch)
    }

    /// Advance past the current character.
    pub fn bump(&mut self) {
        if let Some(ch) = self.peek() {
            self.pos += ch.len_utf8();
        }
    }

    /// Check if the unconsumed text starts with `s`.
    pub fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    /// Consume `s` if the unconsumed text starts with it.
    pub fn eat(&mut self, s: &str) -> bool {
        if self.starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    /// Check for `keyword` followed by something that cannot continue an
    /// identifier, so `if` matches in `if (` but not in `iffy`.
    pub fn at_keyword(&self, keyword: &str) -> bool {
        self.starts_with(keyword)
            && !self.rest()[keyword.len()..]
                .chars()
                .next()
                .is_some_and(is_id_continue)
    }

    /// Consume `keyword` if [`Cursor::at_keyword`] matches.
    pub fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.at_keyword(keyword) {
            self.pos += keyword.len();
            true
        } else {
            false
        }
    }

    /// Skip whitespace, `//` line comments and `/* */` block comments.
    pub fn skip_trivia(&mut self) {
        loop {
            while self.peek().is_some_and(is_whitespace) {
                self.bump();
            }

            if self.eat("//") {
                while self.peek().is_some_and(|ch| ch != '\n') {
                    self.bump();
                }
                continue;
            }

            if self.eat("/*") {
                match self.rest().find("*/") {
                    Some(end) => self.pos += end + 2,
                    None => self.pos = self.source.len(),
                }
                continue;
            }

            break;
        }
    }

    /// Read an identifier (`[A-Za-z_$][A-Za-z0-9_$]*`).
    ///
    /// Returns an empty string, consuming nothing, when the cursor is not at
    /// an identifier start.
    pub fn read_identifier(&mut self) -> &'a str {
        self.skip_trivia();
        let start = self.pos;
        if !self.peek().is_some_and(is_id_start) {
            return "";
        }
        while self.peek().is_some_and(is_id_continue) {
            self.bump();
        }
        truncate_str(&self.source[start..self.pos], MAX_IDENTIFIER_LEN)
    }

    /// Read a string literal delimited by `"`, `'` or `` ` ``.
    ///
    /// Handles the `\n`, `\t`, `\r` and `\\` escapes; any other escaped
    /// character is taken literally. Returns `None` when the cursor is not at
    /// a quote.
    pub fn read_string_literal(&mut self) -> Option<String> {
        self.skip_trivia();
        let quote = self.peek().filter(|ch| matches!(ch, '"' | '\'' | '`'))?;
        self.bump();

        let mut value = String::new();
        while let Some(ch) = self.peek() {
            if ch == quote {
                self.bump();
                break;
            }
            self.bump();
            if ch != '\\' {
                value.push(ch);
                continue;
            }
            match self.peek() {
                Some('n') => value.push('\n'),
                Some('t') => value.push('\t'),
                Some('r') => value.push('\r'),
                Some(other) => value.push(other),
                // A trailing backslash at end of input is kept as-is.
                None => {
                    value.push('\\');
                    break;
                }
            }
            self.bump();
        }
        Some(value)
    }

    /// Read a number literal: optional sign, digits, optional fraction.
    pub fn read_number_literal(&mut self) -> f64 {
        self.skip_trivia();
        let (value, consumed) = scan_decimal(self.rest());
        self.pos += consumed;
        value
    }

    /// Capture raw text up to the matching `)`; the cursor must be just past
    /// the opening `(`. The closing paren is consumed but not captured.
    pub fn capture_parens(&mut self) -> &'a str {
        let start = self.pos;
        let end = self.scan_balanced('(', ')');
        &self.source[start..end]
    }

    /// Capture the text between a `{` at the cursor and its matching `}`.
    /// Returns an empty string when the cursor is not at `{`.
    pub fn capture_block(&mut self) -> &'a str {
        if !self.eat("{") {
            return "";
        }
        let start = self.pos;
        let end = self.scan_balanced('{', '}');
        &self.source[start..end]
    }

    /// Skip one statement without evaluating it.
    pub fn skip_statement(&mut self) {
        self.skip_nested_statement(0);
    }

    fn skip_nested_statement(&mut self, depth: usize) {
        self.skip_trivia();

        if self.eat("{") {
            self.scan_balanced('{', '}');
            return;
        }

        // Past the depth limit, headed statements are skipped like simple ones.
        if depth < MAX_SKIP_DEPTH {
            if self.eat_keyword("if") {
                self.skip_paren_group();
                self.skip_nested_statement(depth + 1);
                self.skip_trivia();
                if self.eat_keyword("else") {
                    self.skip_nested_statement(depth + 1);
                }
                return;
            }

            if self.eat_keyword("while") || self.eat_keyword("for") {
                self.skip_paren_group();
                self.skip_nested_statement(depth + 1);
                return;
            }
        }

        if self.eat_keyword("function") {
            while self.peek().is_some_and(|ch| ch != '{') {
                self.bump();
            }
            self.capture_block();
            return;
        }

        // Simple statement: up to the next `;` outside any parentheses, or
        // up to (not past) the `}` that closes the enclosing block.
        let mut depth = 0usize;
        while let Some(ch) = self.peek() {
            if self.skip_quoted_or_comment() {
                continue;
            }
            match ch {
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                ';' if depth == 0 => {
                    self.bump();
                    return;
                }
                '}' if depth == 0 => return,
                _ => {}
            }
            self.bump();
        }
    }

    /// Skip a parenthesised group such as a loop header, if one is next.
    fn skip_paren_group(&mut self) {
        self.skip_trivia();
        if self.eat("(") {
            self.scan_balanced('(', ')');
        }
    }

    /// Advance past the delimiter that closes an already opened pair and
    /// return the offset of that closing delimiter (end of input if the pair
    /// is never closed). Quotes and comments are stepped over whole.
    fn scan_balanced(&mut self, open: char, close: char) -> usize {
        let mut depth = 1usize;
        while let Some(ch) = self.peek() {
            if self.skip_quoted_or_comment() {
                continue;
            }
            if ch == open {
                depth += 1;
            } else if ch == close {
                depth -= 1;
                if depth == 0 {
                    let end = self.pos;
                    self.bump();
                    return end;
                }
            }
            self.bump();
        }
        self.pos
    }

    /// Step over a string literal or comment starting at the cursor.
    fn skip_quoted_or_comment(&mut self) -> bool {
        match self.peek() {
            Some('"' | '\'' | '`') => {
                self.read_string_literal();
                true
            }
            Some('/') if matches!(self.peek_nth(1), Some('/' | '*')) => {
                self.skip_trivia();
                true
            }
            _ => false,
        }
    }
}

/// Check if character is whitespace.
fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r')
}

/// Check if character can start an identifier.
pub fn is_id_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
}

/// Check if character can continue an identifier.
pub fn is_id_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
}
