//! Value model and expression evaluation for declaration values.

use std::cmp::Ordering;
use std::fmt;

use mbrkit_core::expr::format_number;

use super::functions;
use crate::style::StyleError;

/// Source of variable values during evaluation.
pub trait Variables {
    /// Resolves `@name`.
    fn variable(&self, name: &str) -> Result<LessValue, StyleError>;
}

/// An RGBA colour. Channels are kept unclamped until output.
#[derive(Debug, Clone, PartialEq)]
pub struct Color {
    /// Red, 0-255.
    pub r: f64,
    /// Green, 0-255.
    pub g: f64,
    /// Blue, 0-255.
    pub b: f64,
    /// Alpha, 0-1.
    pub a: f64,
    /// Source spelling, printed while the colour is unmodified.
    pub original: Option<String>,
}

impl Color {
    /// A computed colour.
    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self {
            r,
            g,
            b,
            a,
            original: None,
        }
    }

    /// Parses `#rgb` or `#rrggbb`.
    pub fn from_hex(text: &str) -> Option<Self> {
        let hex = text.strip_prefix('#')?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return None,
        };
        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok().map(f64::from);
        Some(Self {
            original: Some(text.to_string()),
            ..Self::rgba(channel(0)?, channel(2)?, channel(4)?, 1.0)
        })
    }

    /// Looks up a named colour keyword.
    pub fn from_keyword(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower == "transparent" {
            return Some(Self {
                original: Some(name.to_string()),
                ..Self::rgba(0.0, 0.0, 0.0, 0.0)
            });
        }
        let hex = NAMED_COLORS
            .iter()
            .find(|(known, _)| *known == lower)
            .map(|(_, hex)| *hex)?;
        let mut color = Self::from_hex(hex)?;
        color.original = Some(name.to_string());
        Some(color)
    }

    /// Converts to hue (degrees), saturation and lightness (0-1).
    pub fn to_hsl(&self) -> (f64, f64, f64) {
        let r = self.r / 255.0;
        let g = self.g / 255.0;
        let b = self.b / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        let d = max - min;
        if d == 0.0 {
            return (0.0, 0.0, l);
        }
        let s = if l > 0.5 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };
        let h = if max == r {
            (g - b) / d + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };
        (h * 60.0, s, l)
    }

    /// Builds a colour from hue (degrees), saturation, lightness and alpha.
    pub fn from_hsl(h: f64, s: f64, l: f64, a: f64) -> Self {
        let h = (h % 360.0 + 360.0) % 360.0 / 360.0;
        let s = s.clamp(0.0, 1.0);
        let l = l.clamp(0.0, 1.0);
        let m2 = if l <= 0.5 { l * (s + 1.0) } else { l + s - l * s };
        let m1 = l * 2.0 - m2;
        let hue = |mut h: f64| {
            if h < 0.0 {
                h += 1.0;
            } else if h > 1.0 {
                h -= 1.0;
            }
            if h * 6.0 < 1.0 {
                m1 + (m2 - m1) * h * 6.0
            } else if h * 2.0 < 1.0 {
                m2
            } else if h * 3.0 < 2.0 {
                m1 + (m2 - m1) * (2.0 / 3.0 - h) * 6.0
            } else {
                m1
            }
        };
        Self::rgba(
            hue(h + 1.0 / 3.0) * 255.0,
            hue(h) * 255.0,
            hue(h - 1.0 / 3.0) * 255.0,
            a,
        )
    }

    fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b].map(|c| c.round().clamp(0.0, 255.0) as u8)
    }

    /// CSS text: the source spelling when unmodified, otherwise `#rrggbb` or
    /// `rgba(r, g, b, a)` when translucent.
    pub fn to_css(&self) -> String {
        if let Some(original) = &self.original {
            return original.clone();
        }
        let [r, g, b] = self.channels();
        let a = self.a.clamp(0.0, 1.0);
        if a < 1.0 {
            format!("rgba({}, {}, {}, {})", r, g, b, format_dimension(a))
        } else {
            format!("#{:02x}{:02x}{:02x}", r, g, b)
        }
    }
}

const NAMED_COLORS: &[(&str, &str)] = &[
    ("black", "#000000"),
    ("white", "#ffffff"),
    ("red", "#ff0000"),
    ("green", "#008000"),
    ("blue", "#0000ff"),
    ("gray", "#808080"),
    ("grey", "#808080"),
];

/// A stylesheet value.
#[derive(Debug, Clone, PartialEq)]
pub enum LessValue {
    /// Number with an optional unit.
    Dimension {
        /// Magnitude.
        value: f64,
        /// Unit suffix, empty for plain numbers.
        unit: String,
    },
    /// Colour.
    Color(Color),
    /// Quoted string; printed with its quotes.
    Quoted {
        /// Content without quotes.
        text: String,
        /// Quote character used in the source.
        quote: char,
    },
    /// Any other literal text, printed as is.
    Keyword(String),
    /// Space- or comma-separated list.
    List {
        /// Items, each flagged with whether whitespace preceded it.
        items: Vec<(bool, LessValue)>,
        /// Comma-separated when true.
        comma: bool,
    },
}

impl LessValue {
    /// A dimension value.
    pub fn dimension(value: f64, unit: impl Into<String>) -> Self {
        LessValue::Dimension {
            value,
            unit: unit.into(),
        }
    }

    /// CSS text.
    pub fn to_css(&self) -> String {
        match self {
            LessValue::Dimension { value, unit } => format!("{}{}", format_dimension(*value), unit),
            LessValue::Color(color) => color.to_css(),
            LessValue::Quoted { text, quote } => format!("{}{}{}", quote, text, quote),
            LessValue::Keyword(text) => text.clone(),
            LessValue::List { items, comma } => {
                let mut out = String::new();
                for (idx, (spaced, item)) in items.iter().enumerate() {
                    if idx > 0 {
                        if *comma {
                            out.push_str(", ");
                        } else if *spaced {
                            out.push(' ');
                        }
                    }
                    out.push_str(&item.to_css());
                }
                out
            }
        }
    }

    /// Text used for interpolation: quoted strings lose their quotes.
    pub fn to_unquoted(&self) -> String {
        match self {
            LessValue::Quoted { text, .. } => text.clone(),
            other => other.to_css(),
        }
    }

    /// Whether the value is the keyword `true`.
    pub fn is_true(&self) -> bool {
        matches!(self, LessValue::Keyword(k) if k == "true")
    }

    /// Numeric magnitude, if this is a dimension.
    pub fn number(&self) -> Option<f64> {
        match self {
            LessValue::Dimension { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Colour, if this is one.
    pub fn color(&self) -> Option<&Color> {
        match self {
            LessValue::Color(color) => Some(color),
            _ => None,
        }
    }

    /// Guard comparison: dimensions compare numerically, everything else
    /// only by equality of the unquoted text.
    pub fn compare(&self, other: &LessValue) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (self.number(), other.number()) {
            return a.partial_cmp(&b);
        }
        (self.to_unquoted() == other.to_unquoted()).then_some(Ordering::Equal)
    }
}

impl fmt::Display for LessValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

/// Number formatting for output: at most eight decimals, no trailing zeros.
pub fn format_dimension(value: f64) -> String {
    let rounded = (value * 1e8).round() / 1e8;
    format_number(if rounded == 0.0 { 0.0 } else { rounded })
}

/// Replaces every `@{name}` with the unquoted value of `@name`.
pub fn interpolate(text: &str, vars: &dyn Variables) -> Result<String, StyleError> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("@{") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let name = &rest[start + 2..start + len];
        out.push_str(&vars.variable(name)?.to_unquoted());
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Number(f64, String),
    Hash(String),
    Str(String, char),
    Escaped(String),
    Var(String),
    Interp(String),
    Ident(String),
    Func(String),
    Url(String),
    LParen,
    RParen,
    Comma,
    Op(char),
    Other(String),
}

#[derive(Debug, Clone)]
struct Token {
    tok: Tok,
    spaced: bool,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

fn tokenize(input: &str) -> Result<Vec<Token>, StyleError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    let mut spaced = false;

    let take_while = |start: usize, pred: &dyn Fn(char) -> bool| -> usize {
        let mut end = start;
        while end < chars.len() && pred(chars[end]) {
            end += 1;
        }
        end
    };
    let text = |from: usize, to: usize| -> String { chars[from..to].iter().collect() };

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            spaced = true;
            i += 1;
            continue;
        }
        let next = chars.get(i + 1).copied();
        let tok = if c.is_ascii_digit() || (c == '.' && next.is_some_and(|n| n.is_ascii_digit())) {
            let end = take_while(i, &|c| c.is_ascii_digit() || c == '.');
            let number: f64 = text(i, end)
                .parse()
                .map_err(|_| StyleError::InvalidValue(format!("invalid number `{}`", text(i, end))))?;
            let unit_end = if chars.get(end) == Some(&'%') {
                end + 1
            } else {
                take_while(end, &|c| c.is_ascii_alphabetic())
            };
            let unit = text(end, unit_end);
            i = unit_end;
            Tok::Number(number, unit)
        } else if c == '#' {
            let end = take_while(i + 1, &is_ident_char);
            let hash = text(i, end);
            i = end;
            Tok::Hash(hash)
        } else if c == '"' || c == '\'' {
            let (content, end) = read_string(&chars, i)?;
            i = end;
            Tok::Str(content, c)
        } else if c == '~' && matches!(next, Some('"') | Some('\'')) {
            let (content, end) = read_string(&chars, i + 1)?;
            i = end;
            Tok::Escaped(content)
        } else if c == '@' && next == Some('{') {
            let end = take_while(i + 2, &|c| c != '}');
            let name = text(i + 2, end);
            i = (end + 1).min(chars.len());
            Tok::Interp(name)
        } else if c == '@' {
            let end = take_while(i + 1, &is_ident_char);
            let name = text(i + 1, end);
            i = end;
            Tok::Var(name)
        } else if c.is_ascii_alphabetic()
            || c == '_'
            || !c.is_ascii()
            || (c == '-' && next.is_some_and(|n| n.is_ascii_alphabetic() || n == '-' || n == '_'))
        {
            let end = take_while(i, &is_ident_char);
            let name = text(i, end);
            if chars.get(end) == Some(&'(') {
                if name.eq_ignore_ascii_case("url") {
                    let after = take_while(end + 1, &|c| c.is_whitespace());
                    if !matches!(chars.get(after), Some('"') | Some('\'') | Some('@')) {
                        let close = take_while(after, &|c| c != ')');
                        let raw = text(after, close).trim_end().to_string();
                        i = (close + 1).min(chars.len());
                        tokens.push(Token {
                            tok: Tok::Url(raw),
                            spaced,
                        });
                        spaced = false;
                        continue;
                    }
                }
                i = end + 1;
                Tok::Func(name)
            } else {
                i = end;
                Tok::Ident(name)
            }
        } else {
            i += 1;
            match c {
                '(' => Tok::LParen,
                ')' => Tok::RParen,
                ',' => Tok::Comma,
                '+' | '-' | '*' | '/' => Tok::Op(c),
                other => Tok::Other(other.to_string()),
            }
        };
        tokens.push(Token { tok, spaced });
        spaced = false;
    }
    Ok(tokens)
}

fn read_string(chars: &[char], open: usize) -> Result<(String, usize), StyleError> {
    let quote = chars[open];
    let mut content = String::new();
    let mut i = open + 1;
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' && i + 1 < chars.len() {
            content.push(c);
            content.push(chars[i + 1]);
            i += 2;
            continue;
        }
        if c == quote {
            return Ok((content, i + 1));
        }
        content.push(c);
        i += 1;
    }
    Err(StyleError::InvalidValue(
        "unterminated string".to_string(),
    ))
}

/// Parses and evaluates a declaration or variable value.
pub fn evaluate_value(input: &str, vars: &dyn Variables) -> Result<LessValue, StyleError> {
    let tokens = tokenize(input)?;
    let mut parser = ValueParser {
        tokens,
        pos: 0,
        vars,
        parens: 0,
        math: true,
    };
    if parser.tokens.is_empty() {
        return Ok(LessValue::Keyword(String::new()));
    }
    let value = parser.comma_list()?;
    match parser.peek() {
        None => Ok(value),
        Some(tok) => Err(StyleError::InvalidValue(format!(
            "unexpected {:?} in `{}`",
            tok, input
        ))),
    }
}

struct ValueParser<'v> {
    tokens: Vec<Token>,
    pos: usize,
    vars: &'v dyn Variables,
    parens: usize,
    math: bool,
}

impl ValueParser<'_> {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos).map(|token| &token.tok)
    }

    fn spaced_at(&self, pos: usize) -> bool {
        self.tokens.get(pos).is_some_and(|token| token.spaced)
    }

    fn at_list_end(&self) -> bool {
        matches!(self.peek(), None | Some(Tok::Comma) | Some(Tok::RParen))
    }

    fn comma_list(&mut self) -> Result<LessValue, StyleError> {
        let mut items = vec![(false, self.space_list()?)];
        while self.peek() == Some(&Tok::Comma) {
            self.pos += 1;
            items.push((true, self.space_list()?));
        }
        Ok(collapse(items, true))
    }

    fn space_list(&mut self) -> Result<LessValue, StyleError> {
        let mut items = Vec::new();
        while !self.at_list_end() {
            let spaced = self.spaced_at(self.pos);
            items.push((spaced, self.additive()?));
        }
        Ok(collapse(items, false))
    }

    /// A `-` is binary unless it is preceded by whitespace and glued to the
    /// operand after it (`1px -2px` is a list of two).
    fn binary_minus(&self) -> bool {
        self.peek() == Some(&Tok::Op('-'))
            && (!self.spaced_at(self.pos) || self.spaced_at(self.pos + 1))
    }

    fn additive(&mut self) -> Result<LessValue, StyleError> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Op('+')) => '+',
                _ if self.binary_minus() => '-',
                _ => break,
            };
            let spaced = (self.spaced_at(self.pos), self.spaced_at(self.pos + 1));
            self.pos += 1;
            if self.at_list_end() {
                return Err(StyleError::Operation(format!("missing operand after `{}`", op)));
            }
            let right = self.multiplicative()?;
            left = self.operate(op, left, right, spaced)?;
        }
        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<LessValue, StyleError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Op('*')) => '*',
                // Outside parentheses `/` is a literal separator.
                Some(Tok::Op('/')) if self.parens > 0 => '/',
                _ => break,
            };
            let spaced = (self.spaced_at(self.pos), self.spaced_at(self.pos + 1));
            self.pos += 1;
            if self.at_list_end() {
                return Err(StyleError::Operation(format!("missing operand after `{}`", op)));
            }
            let right = self.unary()?;
            left = self.operate(op, left, right, spaced)?;
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<LessValue, StyleError> {
        if self.peek() == Some(&Tok::Op('-')) && !self.spaced_at(self.pos + 1) && self.pos + 1 < self.tokens.len() {
            self.pos += 1;
            let operand = self.primary()?;
            return Ok(match operand {
                LessValue::Dimension { value, unit } => LessValue::Dimension {
                    value: -value,
                    unit,
                },
                other => LessValue::Keyword(format!("-{}", other.to_css())),
            });
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<LessValue, StyleError> {
        let Some(token) = self.tokens.get(self.pos).cloned() else {
            return Err(StyleError::Operation("unexpected end of value".to_string()));
        };
        self.pos += 1;
        Ok(match token.tok {
            Tok::Number(value, unit) => LessValue::Dimension { value, unit },
            Tok::Hash(hash) => match Color::from_hex(&hash) {
                Some(color) => LessValue::Color(color),
                None => LessValue::Keyword(hash),
            },
            Tok::Str(text, quote) => LessValue::Quoted {
                text: interpolate(&text, self.vars)?,
                quote,
            },
            Tok::Escaped(text) => LessValue::Keyword(interpolate(&text, self.vars)?),
            Tok::Var(name) => self.vars.variable(&name)?,
            Tok::Interp(name) => LessValue::Keyword(self.vars.variable(&name)?.to_unquoted()),
            Tok::Ident(name) => match Color::from_keyword(&name) {
                Some(color) => LessValue::Color(color),
                None => LessValue::Keyword(name),
            },
            Tok::Url(raw) => LessValue::Keyword(format!("url({})", interpolate(&raw, self.vars)?)),
            Tok::Func(name) => self.call(name)?,
            Tok::LParen => {
                self.parens += 1;
                let inner = self.comma_list()?;
                self.parens -= 1;
                self.expect_close()?;
                if self.math {
                    inner
                } else {
                    LessValue::Keyword(format!("({})", inner.to_css()))
                }
            }
            Tok::RParen | Tok::Comma => {
                return Err(StyleError::Operation("unexpected separator".to_string()));
            }
            Tok::Op(op) => LessValue::Keyword(op.to_string()),
            Tok::Other(text) => LessValue::Keyword(text),
        })
    }

    fn expect_close(&mut self) -> Result<(), StyleError> {
        if self.peek() == Some(&Tok::RParen) {
            self.pos += 1;
            Ok(())
        } else {
            Err(StyleError::Unbalanced("missing `)` in value".to_string()))
        }
    }

    fn call(&mut self, name: String) -> Result<LessValue, StyleError> {
        let saved_math = self.math;
        let saved_parens = self.parens;
        if name.eq_ignore_ascii_case("calc") {
            self.math = false;
        }
        // Arguments are evaluated as if parenthesized, so `/` divides.
        self.parens = 1;
        let mut args = Vec::new();
        if self.peek() != Some(&Tok::RParen) {
            loop {
                args.push(self.space_list()?);
                if self.peek() == Some(&Tok::Comma) {
                    self.pos += 1;
                    continue;
                }
                break;
            }
        }
        self.math = saved_math;
        self.parens = saved_parens;
        self.expect_close()?;

        match functions::call(&name, &args)? {
            Some(value) => Ok(value),
            None => Ok(LessValue::Keyword(format!(
                "{}({})",
                name,
                args.iter().map(LessValue::to_css).collect::<Vec<_>>().join(", ")
            ))),
        }
    }

    fn operate(
        &self,
        op: char,
        left: LessValue,
        right: LessValue,
        spaced: (bool, bool),
    ) -> Result<LessValue, StyleError> {
        if !self.math {
            let before = if spaced.0 { " " } else { "" };
            let after = if spaced.1 { " " } else { "" };
            return Ok(LessValue::Keyword(format!(
                "{}{}{}{}{}",
                left.to_css(),
                before,
                op,
                after,
                right.to_css()
            )));
        }
        operate(op, &left, &right)
    }
}

fn collapse(mut items: Vec<(bool, LessValue)>, comma: bool) -> LessValue {
    if items.len() == 1 {
        return items.remove(0).1;
    }
    LessValue::List { items, comma }
}

fn apply(op: char, a: f64, b: f64) -> f64 {
    match op {
        '+' => a + b,
        '-' => a - b,
        '*' => a * b,
        _ => a / b,
    }
}

/// Arithmetic between two dimensions; colours and strings are rejected.
pub fn operate(op: char, left: &LessValue, right: &LessValue) -> Result<LessValue, StyleError> {
    match (left, right) {
        (
            LessValue::Dimension { value: a, unit: ua },
            LessValue::Dimension { value: b, unit: ub },
        ) => {
            let unit = if ua.is_empty() { ub } else { ua };
            Ok(LessValue::dimension(apply(op, *a, *b), unit.clone()))
        }
        _ => Err(StyleError::Operation(format!(
            "cannot apply `{}` to `{}` and `{}`",
            op,
            left.to_css(),
            right.to_css()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Vars(HashMap<&'static str, &'static str>);

    impl Variables for Vars {
        fn variable(&self, name: &str) -> Result<LessValue, StyleError> {
            match self.0.get(name) {
                Some(raw) => evaluate_value(raw, self),
                None => Err(StyleError::UndefinedVariable(name.to_string())),
            }
        }
    }

    fn eval(input: &str) -> String {
        let vars = Vars(HashMap::from([
            ("pad", "15"),
            ("unit", "px"),
            ("color", "#ff0000"),
            ("name", "\"menu\""),
            ("flag", "true"),
        ]));
        evaluate_value(input, &vars).unwrap().to_css()
    }

    #[test]
    fn keeps_plain_values() {
        assert_eq!(eval("1px solid #fff"), "1px solid #fff");
        assert_eq!(eval("Arial, 'Helvetica Neue', sans-serif"), "Arial, 'Helvetica Neue', sans-serif");
        assert_eq!(eval("12px/1.5 serif"), "12px/1.5 serif");
        assert_eq!(eval("0 -1px 2px rgba(0, 0, 0, 0.5)"), "0 -1px 2px rgba(0, 0, 0, 0.5)");
        assert_eq!(eval("url(assets/bg.png) no-repeat"), "url(assets/bg.png) no-repeat");
        assert_eq!(eval("-webkit-box"), "-webkit-box");
        assert_eq!(eval(""), "");
    }

    #[test]
    fn arithmetic_with_units() {
        assert_eq!(eval("@pad * 1px"), "15px");
        assert_eq!(eval("(@pad / 2) * 1rem"), "7.5rem");
        assert_eq!(eval("@pad + 5"), "20");
        assert_eq!(eval("10px - 2"), "8px");
        assert_eq!(eval("-@pad * 1px"), "-15px");
        assert_eq!(eval("(1 / 3)"), "0.33333333");
    }

    #[test]
    fn calc_keeps_its_expression() {
        assert_eq!(eval("calc(100% - @pad * 1px)"), "calc(100% - 15 * 1px)");
    }

    #[test]
    fn variables_strings_and_escapes() {
        assert_eq!(eval("@color"), "#ff0000");
        assert_eq!(eval("@name"), "\"menu\"");
        assert_eq!(eval("\"@{name}-item\""), "\"menu-item\"");
        assert_eq!(eval("~\"@{pad}px\""), "15px");
        assert_eq!(eval("url(\"@{name}.png\")"), "url(\"menu.png\")");
    }

    #[test]
    fn undefined_variables_fail() {
        let vars = Vars(HashMap::new());
        assert_eq!(
            evaluate_value("@nope", &vars),
            Err(StyleError::UndefinedVariable("nope".to_string()))
        );
    }

    #[test]
    fn colour_output() {
        assert_eq!(eval("fade(@color, 50%)"), "rgba(255, 0, 0, 0.5)");
        assert_eq!(eval("darken(white, 100%)"), "#000000");
        assert_eq!(Color::from_keyword("White").unwrap().to_css(), "White");
        assert_eq!(Color::from_keyword("rebeccapurple"), None);
        assert_eq!(Color::from_hex("#abc").map(|c| c.g), Some(187.0));
        assert_eq!(Color::from_hex("#abcd"), None);
        assert_eq!(Color::rgba(255.0, 0.0, 0.0, 0.5).to_css(), "rgba(255, 0, 0, 0.5)");
    }

    #[test]
    fn hsl_round_trip_is_stable() {
        let color = Color::from_hex("#3366cc").unwrap();
        let (h, s, l) = color.to_hsl();
        assert_eq!(Color::from_hsl(h, s, l, 1.0).to_css(), "#3366cc");
    }

    #[test]
    fn rejects_invalid_operations() {
        let vars = Vars(HashMap::new());
        assert!(matches!(
            evaluate_value("\"a\" + 1", &vars),
            Err(StyleError::Operation(_))
        ));
        assert!(matches!(
            evaluate_value("#111 * 2", &vars),
            Err(StyleError::Operation(_))
        ));
    }
}
