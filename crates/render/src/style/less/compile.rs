//! Evaluation of parsed statements into flat CSS.
//!
//! Nested rulesets are resolved into full selectors, `@media`/`@supports`
//! blocks bubble out of the rulesets that contain them, and variables are
//! looked up lazily through the chain of enclosing blocks. Output items are
//! collected in source order and grouped by their enclosing conditions when
//! printed.

use std::cell::RefCell;

use super::parser::{Statement, parse, split_top_level};
use super::value::{LessValue, Variables, evaluate_value, interpolate};
use crate::style::StyleError;

/// Compiles stylesheet source to CSS.
pub fn compile(source: &str) -> Result<String, StyleError> {
    let statements = parse(source)?;
    let active = RefCell::new(Vec::new());
    let root = Scope::new(&statements, None);
    let mut compiler = Compiler {
        items: Vec::new(),
        active: &active,
    };
    compiler.block(&statements, &root, &[], &[])?;
    let mut out = String::new();
    write_items(&mut out, &compiler.items, 0);
    Ok(out)
}

/// Variables declared directly in one block.
struct Scope<'a> {
    variables: Vec<(&'a str, &'a str)>,
    parent: Option<&'a Scope<'a>>,
}

impl<'a> Scope<'a> {
    fn new(body: &'a [Statement], parent: Option<&'a Scope<'a>>) -> Self {
        let variables = body
            .iter()
            .filter_map(|statement| match statement {
                Statement::Variable { name, value } => Some((name.as_str(), value.as_str())),
                _ => None,
            })
            .collect();
        Self { variables, parent }
    }
}

/// Resolves variables against a scope. Values are evaluated in the scope
/// that defines them; `active` holds the names currently being evaluated.
struct Lookup<'s> {
    scope: &'s Scope<'s>,
    active: &'s RefCell<Vec<String>>,
}

impl Variables for Lookup<'_> {
    fn variable(&self, name: &str) -> Result<LessValue, StyleError> {
        let mut scope = Some(self.scope);
        while let Some(current) = scope {
            // Last definition wins, wherever it appears in the block.
            if let Some((_, raw)) = current.variables.iter().rev().find(|(n, _)| *n == name) {
                if self.active.borrow().iter().any(|active| active == name) {
                    return Err(StyleError::RecursiveVariable(name.to_string()));
                }
                self.active.borrow_mut().push(name.to_string());
                let lookup = Lookup {
                    scope: current,
                    active: self.active,
                };
                let result = evaluate_value(raw, &lookup);
                self.active.borrow_mut().pop();
                return result;
            }
            scope = current.parent;
        }
        Err(StyleError::UndefinedVariable(name.to_string()))
    }
}

/// An enclosing `@media` or `@supports` condition.
#[derive(Debug, Clone, PartialEq)]
struct Condition {
    name: String,
    prelude: String,
}

#[derive(Debug)]
enum Item {
    Rule {
        conditions: Vec<Condition>,
        selectors: Vec<String>,
        declarations: Vec<String>,
    },
    Block {
        conditions: Vec<Condition>,
        name: String,
        prelude: String,
        items: Vec<Item>,
    },
    Directive {
        conditions: Vec<Condition>,
        text: String,
    },
}

impl Item {
    fn conditions(&self) -> &[Condition] {
        match self {
            Item::Rule { conditions, .. }
            | Item::Block { conditions, .. }
            | Item::Directive { conditions, .. } => conditions,
        }
    }
}

struct Compiler<'c> {
    items: Vec<Item>,
    active: &'c RefCell<Vec<String>>,
}

impl Compiler<'_> {
    fn block(
        &mut self,
        body: &[Statement],
        scope: &Scope<'_>,
        selectors: &[String],
        conditions: &[Condition],
    ) -> Result<(), StyleError> {
        // Declarations of this block print before its nested rules.
        let rule = self.items.len();
        self.items.push(Item::Rule {
            conditions: conditions.to_vec(),
            selectors: selectors.to_vec(),
            declarations: Vec::new(),
        });
        let lookup = Lookup {
            scope,
            active: self.active,
        };

        for statement in body {
            match statement {
                Statement::Variable { .. } => {}
                Statement::Declaration { property, value } => {
                    let property = interpolate(property, &lookup)?;
                    let value = if property.starts_with("--") {
                        interpolate(value, &lookup)?
                    } else {
                        evaluate_value(value, &lookup)?.to_css()
                    };
                    if let Some(Item::Rule { declarations, .. }) = self.items.get_mut(rule) {
                        declarations.push(format!("{}: {}", property, value));
                    }
                }
                Statement::Ruleset {
                    selector,
                    guard,
                    body,
                } => {
                    if let Some(guard) = guard
                        && !evaluate_guard(guard, &lookup)?
                    {
                        log::debug!("guard `{}` on `{}` is false", guard, selector);
                        continue;
                    }
                    let resolved = join_selectors(selectors, &interpolate(selector, &lookup)?);
                    let child = Scope::new(body, Some(scope));
                    self.block(body, &child, &resolved, conditions)?;
                }
                Statement::AtRule {
                    name,
                    prelude,
                    body: Some(body),
                } if is_conditional(name) => {
                    let prelude = substitute_variables(prelude, &lookup)?;
                    let nested = push_condition(conditions, name, prelude);
                    let child = Scope::new(body, Some(scope));
                    self.block(body, &child, selectors, &nested)?;
                }
                Statement::AtRule {
                    name,
                    prelude,
                    body: Some(body),
                } => {
                    let prelude = substitute_variables(prelude, &lookup)?;
                    let child = Scope::new(body, Some(scope));
                    let mut inner = Compiler {
                        items: Vec::new(),
                        active: self.active,
                    };
                    inner.block(body, &child, &[], &[])?;
                    self.items.push(Item::Block {
                        conditions: conditions.to_vec(),
                        name: name.clone(),
                        prelude,
                        items: inner.items,
                    });
                }
                Statement::AtRule {
                    name,
                    prelude,
                    body: None,
                } => {
                    let prelude = substitute_variables(prelude, &lookup)?;
                    self.items.push(Item::Directive {
                        conditions: conditions.to_vec(),
                        text: at_rule_head(name, &prelude),
                    });
                }
            }
        }
        Ok(())
    }
}

fn is_conditional(name: &str) -> bool {
    name.eq_ignore_ascii_case("media") || name.eq_ignore_ascii_case("supports")
}

/// Nested conditions of the same kind merge with `and`.
fn push_condition(conditions: &[Condition], name: &str, prelude: String) -> Vec<Condition> {
    let mut nested = conditions.to_vec();
    match nested.last_mut() {
        Some(last) if last.name.eq_ignore_ascii_case(name) => {
            last.prelude = format!("{} and {}", last.prelude, prelude);
        }
        _ => nested.push(Condition {
            name: name.to_string(),
            prelude,
        }),
    }
    nested
}

fn at_rule_head(name: &str, prelude: &str) -> String {
    if prelude.is_empty() {
        format!("@{}", name)
    } else {
        format!("@{} {}", name, prelude)
    }
}

/// Replaces `@{name}` interpolations and bare `@name` references.
fn substitute_variables(text: &str, vars: &dyn Variables) -> Result<String, StyleError> {
    let text = interpolate(text, vars)?;
    let mut out = String::with_capacity(text.len());
    let mut rest = text.as_str();
    while let Some(at) = rest.find('@') {
        out.push_str(&rest[..at]);
        let after = &rest[at + 1..];
        let len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(after.len());
        if len == 0 {
            out.push('@');
        } else {
            out.push_str(&vars.variable(&after[..len])?.to_unquoted());
        }
        rest = &after[len..];
    }
    out.push_str(rest);
    Ok(out)
}

fn normalize_selector(selector: &str) -> String {
    selector.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolves a nested selector list against its parents. `&` stands for the
/// parent; otherwise the child is a descendant.
fn join_selectors(parents: &[String], selector: &str) -> Vec<String> {
    let children: Vec<String> = split_top_level(selector, b',')
        .into_iter()
        .map(normalize_selector)
        .filter(|child| !child.is_empty())
        .collect();
    if parents.is_empty() {
        return children
            .iter()
            .map(|child| child.replace('&', "").trim().to_string())
            .collect();
    }
    let mut joined = Vec::with_capacity(children.len() * parents.len());
    for child in &children {
        for parent in parents {
            if child.contains('&') {
                joined.push(child.replace('&', parent));
            } else {
                joined.push(format!("{} {}", parent, child));
            }
        }
    }
    joined
}

fn invalid_guard(guard: &str) -> StyleError {
    StyleError::InvalidValue(format!("invalid guard `{}`", guard))
}

/// Evaluates `when` conditions: `,` separates alternatives, `and` joins
/// parenthesized conditions, `not` negates one.
fn evaluate_guard(guard: &str, vars: &dyn Variables) -> Result<bool, StyleError> {
    for alternative in split_top_level(guard, b',') {
        if guard_conjunction(alternative.trim(), vars)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn strip_keyword<'t>(text: &'t str, keyword: &str) -> Option<&'t str> {
    let rest = text.strip_prefix(keyword)?;
    rest.starts_with(|c: char| c.is_whitespace() || c == '(')
        .then(|| rest.trim_start())
}

fn guard_conjunction(text: &str, vars: &dyn Variables) -> Result<bool, StyleError> {
    let mut rest = text;
    let mut result = true;
    loop {
        let (negate, after_not) = match strip_keyword(rest, "not") {
            Some(after) => (true, after),
            None => (false, rest),
        };
        let close = matching_paren(after_not).ok_or_else(|| invalid_guard(text))?;
        let holds = guard_condition(&after_not[1..close], vars)? != negate;
        result = result && holds;
        rest = after_not[close + 1..].trim_start();
        if rest.is_empty() {
            return Ok(result);
        }
        rest = strip_keyword(rest, "and").ok_or_else(|| invalid_guard(text))?;
    }
}

/// Index of the `)` matching the `(` that `text` starts with.
fn matching_paren(text: &str) -> Option<usize> {
    if !text.starts_with('(') {
        return None;
    }
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn guard_condition(condition: &str, vars: &dyn Variables) -> Result<bool, StyleError> {
    let Some((at, op)) = find_comparison(condition) else {
        return Ok(evaluate_value(condition.trim(), vars)?.is_true());
    };
    let left = evaluate_value(condition[..at].trim(), vars)?;
    let right = evaluate_value(condition[at + op.len()..].trim(), vars)?;
    let Some(ordering) = left.compare(&right) else {
        return Ok(false);
    };
    Ok(match op {
        "=" => ordering.is_eq(),
        ">" => ordering.is_gt(),
        "<" => ordering.is_lt(),
        ">=" => ordering.is_ge(),
        _ => ordering.is_le(),
    })
}

fn find_comparison(condition: &str) -> Option<(usize, &'static str)> {
    let bytes = condition.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    for (i, &b) in bytes.iter().enumerate() {
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            continue;
        }
        let next = bytes.get(i + 1).copied();
        match b {
            b'"' | b'\'' => quote = Some(b),
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            _ if depth > 0 => {}
            b'>' if next == Some(b'=') => return Some((i, ">=")),
            b'<' if next == Some(b'=') => return Some((i, "<=")),
            b'=' if next == Some(b'<') => return Some((i, "=<")),
            b'>' => return Some((i, ">")),
            b'<' => return Some((i, "<")),
            b'=' => return Some((i, "=")),
            _ => {}
        }
    }
    None
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str("  ");
    }
}

/// Prints items, opening one block per run of items sharing conditions.
fn write_items(out: &mut String, items: &[Item], level: usize) {
    let mut start = 0;
    while start < items.len() {
        let conditions = items[start].conditions();
        let end = items[start..]
            .iter()
            .position(|item| item.conditions() != conditions)
            .map_or(items.len(), |offset| start + offset);
        let mut body = String::new();
        for item in &items[start..end] {
            write_item(&mut body, item, level + conditions.len());
        }
        if !body.is_empty() {
            for (depth, condition) in conditions.iter().enumerate() {
                indent(out, level + depth);
                out.push_str(&at_rule_head(&condition.name, &condition.prelude));
                out.push_str(" {\n");
            }
            out.push_str(&body);
            for depth in (0..conditions.len()).rev() {
                indent(out, level + depth);
                out.push_str("}\n");
            }
        }
        start = end;
    }
}

fn write_item(out: &mut String, item: &Item, level: usize) {
    match item {
        Item::Rule {
            selectors,
            declarations,
            ..
        } => {
            if declarations.is_empty() {
                return;
            }
            if selectors.is_empty() {
                for declaration in declarations {
                    indent(out, level);
                    out.push_str(declaration);
                    out.push_str(";\n");
                }
                return;
            }
            for (idx, selector) in selectors.iter().enumerate() {
                indent(out, level);
                out.push_str(selector);
                out.push_str(if idx + 1 < selectors.len() { ",\n" } else { " {\n" });
            }
            for declaration in declarations {
                indent(out, level + 1);
                out.push_str(declaration);
                out.push_str(";\n");
            }
            indent(out, level);
            out.push_str("}\n");
        }
        Item::Block {
            name,
            prelude,
            items,
            ..
        } => {
            let mut body = String::new();
            write_items(&mut body, items, level + 1);
            if body.is_empty() {
                return;
            }
            indent(out, level);
            out.push_str(&at_rule_head(name, prelude));
            out.push_str(" {\n");
            out.push_str(&body);
            indent(out, level);
            out.push_str("}\n");
        }
        Item::Directive { text, .. } => {
            indent(out, level);
            out.push_str(text);
            out.push_str(";\n");
        }
    }
}
