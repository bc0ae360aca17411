//! Tokenizer for template expressions.

use super::ExprError;

/// A lexical token with its byte offset in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Token payload.
    pub kind: TokenKind,
    /// Byte offset of the first character.
    pub offset: usize,
}

/// Token payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Numeric literal.
    Number(f64),
    /// String literal with escapes resolved.
    Str(String),
    /// Identifier or keyword.
    Ident(String),
    /// Operator or punctuation.
    Punct(&'static str),
    /// End of input.
    Eof,
}

const PUNCTUATION: &[&str] = &[
    "===", "!==", "==", "!=", "<=", ">=", "&&", "||", "??", "(", ")", "[", "]", ".", ",", "?",
    ":", "!", "+", "-", "*", "/", "%", "<", ">",
];

/// Splits an expression into tokens, ending with `Eof`.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let bytes = source.as_bytes();
    let mut pos = 0usize;

    while pos < source.len() {
        let rest = &source[pos..];
        let Some(ch) = rest.chars().next() else {
            break;
        };

        if ch.is_whitespace() {
            pos += ch.len_utf8();
            continue;
        }

        if ch.is_ascii_digit()
            || (ch == '.' && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit))
        {
            let (number, len) = read_number(rest).ok_or_else(|| ExprError::Syntax {
                message: format!("invalid number near '{}'", preview(rest)),
                offset: pos,
            })?;
            tokens.push(Token {
                kind: TokenKind::Number(number),
                offset: pos,
            });
            pos += len;
            continue;
        }

        if ch == '"' || ch == '\'' {
            let (value, len) = read_string(rest, ch).ok_or(ExprError::Syntax {
                message: "unterminated string literal".to_string(),
                offset: pos,
            })?;
            tokens.push(Token {
                kind: TokenKind::Str(value),
                offset: pos,
            });
            pos += len;
            continue;
        }

        if is_ident_start(ch) {
            let len = rest
                .char_indices()
                .find(|(_, c)| !is_ident_continue(*c))
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            tokens.push(Token {
                kind: TokenKind::Ident(rest[..len].to_string()),
                offset: pos,
            });
            pos += len;
            continue;
        }

        match PUNCTUATION.iter().find(|p| rest.starts_with(**p)) {
            Some(&punct) => {
                tokens.push(Token {
                    kind: TokenKind::Punct(punct),
                    offset: pos,
                });
                pos += punct.len();
            }
            None => {
                return Err(ExprError::Syntax {
                    message: format!("unexpected character '{}'", ch),
                    offset: pos,
                });
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        offset: source.len(),
    });
    Ok(tokens)
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

fn preview(rest: &str) -> String {
    rest.chars().take(8).collect()
}

fn read_number(rest: &str) -> Option<(f64, usize)> {
    let bytes = rest.as_bytes();
    let mut end = 0usize;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }
    // `1a` is not a number followed by an identifier
    if rest[end..].chars().next().is_some_and(is_ident_start) {
        return None;
    }
    rest[..end].parse::<f64>().ok().map(|n| (n, end))
}

fn read_string(rest: &str, quote: char) -> Option<(String, usize)> {
    let mut value = String::new();
    let mut chars = rest.char_indices().skip(1);

    while let Some((i, ch)) = chars.next() {
        match ch {
            c if c == quote => return Some((value, i + c.len_utf8())),
            '\\' => {
                let (_, escaped) = chars.next()?;
                match escaped {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    '0' => value.push('\0'),
                    other => value.push(other),
                }
            }
            '\n' => return None,
            c => value.push(c),
        }
    }

    None
}
