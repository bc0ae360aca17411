//! Statement-level parser for the nested stylesheet language.
//!
//! Values, selectors and guards are kept as raw text here; they are
//! evaluated against the variable scope during compilation.

use crate::style::StyleError;

/// A parsed statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `@name: value;`
    Variable {
        /// Name without the leading `@`.
        name: String,
        /// Raw value text.
        value: String,
    },
    /// `property: value;`
    Declaration {
        /// Raw property name, possibly interpolated.
        property: String,
        /// Raw value text.
        value: String,
    },
    /// `selectors [when guard] { ... }`
    Ruleset {
        /// Raw selector list.
        selector: String,
        /// Raw guard condition after `when`.
        guard: Option<String>,
        /// Block body.
        body: Vec<Statement>,
    },
    /// `@name prelude { ... }` or `@name prelude;`
    AtRule {
        /// At-rule name without `@`.
        name: String,
        /// Raw text between the name and the block or semicolon.
        prelude: String,
        /// Block body, `None` for statement at-rules.
        body: Option<Vec<Statement>>,
    },
}

/// Parses a stylesheet into statements.
pub fn parse(source: &str) -> Result<Vec<Statement>, StyleError> {
    let stripped = strip_comments(source)?;
    let mut parser = Parser {
        src: &stripped,
        pos: 0,
    };
    parser.block(None)
}

/// Replaces comments with whitespace, keeping line breaks.
///
/// `//` only starts a comment outside parentheses so unquoted `url(...)`
/// values survive.
pub fn strip_comments(source: &str) -> Result<String, StyleError> {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.char_indices().peekable();
    let mut quote: Option<char> = None;
    let mut parens = 0usize;

    while let Some((idx, ch)) = chars.next() {
        if let Some(q) = quote {
            out.push(ch);
            if ch == '\\' {
                if let Some((_, escaped)) = chars.next() {
                    out.push(escaped);
                }
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                out.push(ch);
            }
            '(' => {
                parens += 1;
                out.push(ch);
            }
            ')' => {
                parens = parens.saturating_sub(1);
                out.push(ch);
            }
            '/' if matches!(chars.peek(), Some((_, '*'))) => {
                chars.next();
                let mut closed = false;
                let mut prev = '\0';
                for (_, c) in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        closed = true;
                        break;
                    }
                    if c == '\n' {
                        out.push('\n');
                    }
                    prev = c;
                }
                if !closed {
                    return Err(StyleError::Syntax {
                        line: line_of(source, idx),
                        message: "unterminated comment".to_string(),
                    });
                }
                out.push(' ');
            }
            '/' if parens == 0 && matches!(chars.peek(), Some((_, '/'))) => {
                for (_, c) in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            _ => out.push(ch),
        }
    }
    Ok(out)
}

/// 1-based line number of a byte offset.
pub fn line_of(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())].matches('\n').count() + 1
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

enum Terminator {
    Semicolon,
    OpenBrace,
    CloseBrace,
    Eof,
}

impl<'a> Parser<'a> {
    /// Parses statements until the closing brace of a block opened at
    /// `open`, or until end of input for the top level.
    fn block(&mut self, open: Option<usize>) -> Result<Vec<Statement>, StyleError> {
        let mut statements = Vec::new();
        loop {
            self.skip_separators();
            let Some(ch) = self.peek() else {
                return match open {
                    Some(at) => Err(StyleError::Unbalanced(format!(
                        "block opened on line {} is never closed",
                        line_of(self.src, at)
                    ))),
                    None => Ok(statements),
                };
            };
            if ch == '}' {
                return match open {
                    Some(_) => {
                        self.pos += 1;
                        Ok(statements)
                    }
                    None => Err(StyleError::Unbalanced(format!(
                        "unexpected `}}` on line {}",
                        line_of(self.src, self.pos)
                    ))),
                };
            }

            let start = self.pos;
            let (text, terminator) = self.scan()?;
            let text = text.trim();
            match terminator {
                Terminator::OpenBrace => {
                    let brace = self.pos;
                    self.pos += 1;
                    let body = self.block(Some(brace))?;
                    statements.push(self.block_statement(text, body, start)?);
                }
                Terminator::Semicolon => {
                    self.pos += 1;
                    if let Some(statement) = self.simple_statement(text, start)? {
                        statements.push(statement);
                    }
                }
                Terminator::CloseBrace | Terminator::Eof => {
                    if let Some(statement) = self.simple_statement(text, start)? {
                        statements.push(statement);
                    }
                }
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn skip_separators(&mut self) {
        let rest = &self.src[self.pos..];
        let trimmed = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ';');
        self.pos += rest.len() - trimmed.len();
    }

    /// Reads up to the next top-level `;`, `{` or `}` without consuming it.
    fn scan(&mut self) -> Result<(&'a str, Terminator), StyleError> {
        let start = self.pos;
        let bytes = self.src.as_bytes();
        let mut quote: Option<u8> = None;
        let mut parens = 0usize;
        let mut i = start;

        while i < bytes.len() {
            let b = bytes[i];
            if let Some(q) = quote {
                if b == b'\\' {
                    i += 2;
                    continue;
                }
                if b == q {
                    quote = None;
                }
                i += 1;
                continue;
            }
            match b {
                b'"' | b'\'' => quote = Some(b),
                b'(' | b'[' => parens += 1,
                b')' | b']' => parens = parens.saturating_sub(1),
                b'@' if bytes.get(i + 1) == Some(&b'{') => {
                    match self.src[i..].find('}') {
                        Some(close) => {
                            i += close + 1;
                            continue;
                        }
                        None => {
                            return Err(StyleError::Syntax {
                                line: line_of(self.src, i),
                                message: "unterminated interpolation".to_string(),
                            });
                        }
                    }
                }
                b';' if parens == 0 => {
                    self.pos = i;
                    return Ok((&self.src[start..i], Terminator::Semicolon));
                }
                b'{' if parens == 0 => {
                    self.pos = i;
                    return Ok((&self.src[start..i], Terminator::OpenBrace));
                }
                b'}' if parens == 0 => {
                    self.pos = i;
                    return Ok((&self.src[start..i], Terminator::CloseBrace));
                }
                _ => {}
            }
            i += 1;
        }
        if quote.is_some() {
            return Err(StyleError::Syntax {
                line: line_of(self.src, start),
                message: "unterminated string".to_string(),
            });
        }
        self.pos = bytes.len();
        Ok((&self.src[start..], Terminator::Eof))
    }

    fn block_statement(
        &self,
        prelude: &str,
        body: Vec<Statement>,
        start: usize,
    ) -> Result<Statement, StyleError> {
        if prelude.starts_with('@') && !prelude.starts_with("@{") {
            let (name, rest) = split_at_rule_name(prelude);
            if name.is_empty() || name.ends_with(':') {
                return Err(StyleError::Unsupported(format!(
                    "`{}` on line {}",
                    prelude,
                    line_of(self.src, start)
                )));
            }
            return Ok(Statement::AtRule {
                name: name.to_string(),
                prelude: rest.to_string(),
                body: Some(body),
            });
        }
        if prelude.is_empty() {
            return Err(StyleError::Syntax {
                line: line_of(self.src, start),
                message: "block without a selector".to_string(),
            });
        }
        let (selector, guard) = split_guard(prelude);
        if is_mixin_definition(selector) {
            return Err(StyleError::Unsupported(format!(
                "mixin definition `{}` on line {}",
                selector,
                line_of(self.src, start)
            )));
        }
        Ok(Statement::Ruleset {
            selector: selector.to_string(),
            guard: guard.map(str::to_string),
            body,
        })
    }

    fn simple_statement(&self, text: &str, start: usize) -> Result<Option<Statement>, StyleError> {
        if text.is_empty() {
            return Ok(None);
        }
        if text.starts_with('@') && !text.starts_with("@{") {
            let (name, rest) = split_at_rule_name(text);
            if let Some(name) = name.strip_suffix(':') {
                return Ok(Some(Statement::Variable {
                    name: name.to_string(),
                    value: rest.to_string(),
                }));
            }
            if let Some(value) = rest.strip_prefix(':') {
                return Ok(Some(Statement::Variable {
                    name: name.to_string(),
                    value: value.trim().to_string(),
                }));
            }
            return Ok(Some(Statement::AtRule {
                name: name.to_string(),
                prelude: rest.to_string(),
                body: None,
            }));
        }
        match find_top_level(text, b':') {
            Some(colon) if colon > 0 => Ok(Some(Statement::Declaration {
                property: text[..colon].trim().to_string(),
                value: text[colon + 1..].trim().to_string(),
            })),
            _ => Err(StyleError::Unsupported(format!(
                "`{}` on line {}",
                text,
                line_of(self.src, start)
            ))),
        }
    }
}

/// Splits `@name rest` into `name` (including a trailing `:` when written
/// without a space) and the trimmed rest.
fn split_at_rule_name(text: &str) -> (&str, &str) {
    let body = &text[1..];
    let end = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':'))
        .unwrap_or(body.len());
    // Only a single trailing colon belongs to the name (`@x:value`).
    match body[..end].find(':') {
        Some(colon) => (&body[..colon + 1], body[colon + 1..].trim()),
        None => (&body[..end], body[end..].trim()),
    }
}

/// Splits `selector when guard`.
pub fn split_guard(prelude: &str) -> (&str, Option<&str>) {
    let bytes = prelude.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    for (i, &b) in bytes.iter().enumerate() {
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'"' | b'\'' => quote = Some(b),
            b'(' | b'[' => depth += 1,
            b')' | b']' => depth = depth.saturating_sub(1),
            b'w' if depth == 0
                && prelude[i..].starts_with("when")
                && i > 0
                && bytes[i - 1].is_ascii_whitespace()
                && bytes
                    .get(i + 4)
                    .is_none_or(|next| next.is_ascii_whitespace() || *next == b'(') =>
            {
                return (prelude[..i].trim(), Some(prelude[i + 4..].trim()));
            }
            _ => {}
        }
    }
    (prelude, None)
}

fn is_mixin_definition(selector: &str) -> bool {
    let Some(rest) = selector.strip_prefix(['.', '#']) else {
        return false;
    };
    let name_end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(rest.len());
    name_end > 0 && rest[name_end..].trim_start().starts_with('(')
}

/// Byte offset of the first `target` outside quotes, parentheses and
/// interpolations.
pub fn find_top_level(text: &str, target: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'"' | b'\'' => quote = Some(b),
            b'(' | b'[' => depth += 1,
            b')' | b']' => depth = depth.saturating_sub(1),
            b'@' if bytes.get(i + 1) == Some(&b'{') => {
                if let Some(close) = text[i..].find('}') {
                    i += close + 1;
                    continue;
                }
            }
            _ if b == target && depth == 0 => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Splits on every top-level `separator`.
pub fn split_top_level(text: &str, separator: u8) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = text;
    while let Some(at) = find_top_level(rest, separator) {
        parts.push(&rest[..at]);
        rest = &rest[at + 1..];
    }
    parts.push(rest);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declaration(property: &str, value: &str) -> Statement {
        Statement::Declaration {
            property: property.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn parses_nested_blocks() {
        let statements = parse(".a { color: red; .b { x: 1 } @w: 2px; }").unwrap();
        assert_eq!(
            statements,
            vec![Statement::Ruleset {
                selector: ".a".to_string(),
                guard: None,
                body: vec![
                    declaration("color", "red"),
                    Statement::Ruleset {
                        selector: ".b".to_string(),
                        guard: None,
                        body: vec![declaration("x", "1")],
                    },
                    Statement::Variable {
                        name: "w".to_string(),
                        value: "2px".to_string(),
                    },
                ],
            }]
        );
    }

    #[test]
    fn strips_comments_but_not_urls() {
        let stripped =
            strip_comments("a { /* x\ny */ b: url(http://x/y.png); // tail\n c: 'a//b'; }").unwrap();
        assert_eq!(
            stripped,
            "a { \n  b: url(http://x/y.png); \n c: 'a//b'; }"
        );
    }

    #[test]
    fn splits_guards() {
        assert_eq!(
            split_guard("& when (@fullScreen)"),
            ("&", Some("(@fullScreen)"))
        );
        assert_eq!(split_guard(".whenever"), (".whenever", None));
        assert_eq!(split_guard(".a[title='when x']"), (".a[title='when x']", None));
    }

    #[test]
    fn at_rules_and_interpolated_selectors() {
        let statements = parse("@media (max-width: 767px) { .x { a: b } } @{sel} .y { c: d } @import 'x.css';").unwrap();
        assert!(matches!(&statements[0], Statement::AtRule { name, prelude, body: Some(_) } if name == "media" && prelude == "(max-width: 767px)"));
        assert!(matches!(&statements[1], Statement::Ruleset { selector, .. } if selector == "@{sel} .y"));
        assert!(matches!(&statements[2], Statement::AtRule { name, body: None, .. } if name == "import"));
    }

    #[test]
    fn interpolated_property_names() {
        let statements = parse("a { @{side}-width: 1px }").unwrap();
        let Statement::Ruleset { body, .. } = &statements[0] else {
            panic!("expected ruleset");
        };
        assert_eq!(body[0], declaration("@{side}-width", "1px"));
    }

    #[test]
    fn variables_with_and_without_space() {
        let statements = parse("@a: 1px; @b :2px; @c:3px;").unwrap();
        let names: Vec<_> = statements
            .iter()
            .map(|statement| match statement {
                Statement::Variable { name, value } => format!("{}={}", name, value),
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(names, ["a=1px", "b=2px", "c=3px"]);
    }

    #[test]
    fn reports_unbalanced_blocks() {
        assert!(matches!(parse(".a { b: c;"), Err(StyleError::Unbalanced(_))));
        assert!(matches!(parse(".a { } }"), Err(StyleError::Unbalanced(_))));
    }

    #[test]
    fn rejects_mixin_calls_and_definitions() {
        assert!(matches!(parse(".a { .mixin(); }"), Err(StyleError::Unsupported(_))));
        assert!(matches!(parse(".m(@x) { a: @x }"), Err(StyleError::Unsupported(_))));
    }
}
