//! Lexical keyword scanning for SQL text
//!
//! This is not a parser. It walks the text once, skipping comments, string
//! literals and quoted identifiers, and reports where a bare keyword occurs.
//! Word boundaries follow the usual `\b` rule: letters, digits and `_` are
//! word characters.

/// Lexer state while walking the text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    LineComment,
    BlockComment,
    /// Inside a quoted region closed by the given character
    Quoted(char),
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Byte offsets of every bare occurrence of `keyword` (ASCII, case-insensitive)
#[must_use]
pub fn keyword_positions(sql: &str, keyword: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut state = State::Code;
    let mut chars = sql.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match state {
            State::LineComment => {
                if c == '\n' {
                    state = State::Code;
                }
            },
            State::BlockComment => {
                if c == '*' && chars.peek().is_some_and(|(_, n)| *n == '/') {
                    chars.next();
                    state = State::Code;
                }
            },
            State::Quoted(close) => {
                if c == close {
                    // A doubled closing quote is an escaped quote
                    if chars.peek().is_some_and(|(_, n)| *n == close) {
                        chars.next();
                    } else {
                        state = State::Code;
                    }
                }
            },
            State::Code => match c {
                '-' if chars.peek().is_some_and(|(_, n)| *n == '-') => {
                    chars.next();
                    state = State::LineComment;
                },
                '/' if chars.peek().is_some_and(|(_, n)| *n == '*') => {
                    chars.next();
                    state = State::BlockComment;
                },
                '\'' | '"' | '`' => state = State::Quoted(c),
                '[' => state = State::Quoted(']'),
                c if is_word_char(c) => {
                    let start = i;
                    let mut end = i + c.len_utf8();
                    while let Some((j, n)) = chars.peek().copied() {
                        if !is_word_char(n) {
                            break;
                        }
                        end = j + n.len_utf8();
                        chars.next();
                    }
                    if sql[start..end].eq_ignore_ascii_case(keyword) {
                        positions.push(start);
                    }
                },
                _ => {},
            },
        }
    }

    positions
}

/// Byte offset of the last bare occurrence of `keyword`
#[must_use]
pub fn last_keyword(sql: &str, keyword: &str) -> Option<usize> {
    keyword_positions(sql, keyword).pop()
}
