use mbrkit_core::{DirectiveKind, RenderWarning};

use super::{DirectiveContext, for_each_with_attr};
use crate::dom::Node;

/// Attribute holding `{class: condition, ...}` pairs.
pub const CLASS_ATTR: &str = "mbr-class";
/// Attribute holding a literal class to add.
pub const THEME_STYLE_ATTR: &str = "mbr-theme-style";

/// One `class: condition` entry of an `mbr-class` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassPair {
    /// Class name(s), unquoted.
    pub class: String,
    /// Condition expression, trimmed.
    pub condition: String,
}

/// Result of splitting an `mbr-class` body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassPairs {
    /// Well-formed pairs in source order.
    pub pairs: Vec<ClassPair>,
    /// Entries without a top-level colon, skipped.
    pub skipped: Vec<String>,
}

/// Splits an `mbr-class` body into ordered pairs.
///
/// Outer braces are optional. Entries split on commas and keys split on the
/// first colon, both only at the top level: separators inside quotes or
/// nested `()`, `[]`, `{}` belong to the expression.
pub fn parse_class_pairs(body: &str) -> ClassPairs {
    let mut inner = body.trim();
    if inner.starts_with('{') && inner.ends_with('}') && inner.len() >= 2 {
        inner = &inner[1..inner.len() - 1];
    }

    let mut entries = split_top_level(inner, ',');
    if entries.last().is_some_and(|last| last.trim().is_empty()) {
        entries.pop();
    }

    let mut result = ClassPairs::default();
    for entry in entries {
        let Some(colon) = find_top_level(entry, ':') else {
            if !entry.trim().is_empty() {
                result.skipped.push(entry.trim().to_string());
            }
            continue;
        };
        result.pairs.push(ClassPair {
            class: unquote(entry[..colon].trim()).to_string(),
            condition: entry[colon + 1..].trim().to_string(),
        });
    }
    result
}

fn split_top_level(input: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut scanner = Scanner::default();
    for (idx, ch) in input.char_indices() {
        if scanner.step(ch) && ch == separator {
            parts.push(&input[start..idx]);
            start = idx + ch.len_utf8();
        }
    }
    parts.push(&input[start..]);
    parts
}

fn find_top_level(input: &str, target: char) -> Option<usize> {
    let mut scanner = Scanner::default();
    input
        .char_indices()
        .find(|&(_, ch)| scanner.step(ch) && ch == target)
        .map(|(idx, _)| idx)
}

/// Tracks quote and bracket nesting one character at a time.
#[derive(Default)]
struct Scanner {
    depth: i32,
    quote: Option<char>,
}

impl Scanner {
    /// Consumes `ch`; true when it sits at the top level outside quotes and
    /// is not itself a quote or bracket.
    fn step(&mut self, ch: char) -> bool {
        if let Some(quote) = self.quote {
            if ch == quote {
                self.quote = None;
            }
            return false;
        }
        match ch {
            '"' | '\'' => {
                self.quote = Some(ch);
                false
            }
            '(' | '[' | '{' => {
                self.depth += 1;
                false
            }
            ')' | ']' | '}' => {
                self.depth -= 1;
                false
            }
            _ => self.depth == 0,
        }
    }
}

fn unquote(key: &str) -> &str {
    let quoted = key.len() >= 2
        && ((key.starts_with('"') && key.ends_with('"'))
            || (key.starts_with('\'') && key.ends_with('\'')));
    if quoted { &key[1..key.len() - 1] } else { key }
}

/// Syncs class membership from every `mbr-class` attribute and strips it.
///
/// Pairs apply in order: a truthy condition adds the class when absent, a
/// falsy one removes it when present.
pub fn apply_classes(mut node: Node, ctx: &mut DirectiveContext<'_>) -> Node {
    for_each_with_attr(&mut node, CLASS_ATTR, &mut |element, body| {
        let parsed = parse_class_pairs(&body);
        for entry in parsed.skipped {
            ctx.warn(RenderWarning::at_element(
                DirectiveKind::Class,
                element.name.as_str(),
                format!("skipped entry without a condition: `{}`", entry),
            ));
        }
        for pair in parsed.pairs {
            let on = ctx
                .evaluate(DirectiveKind::Class, &element.name, &pair.condition)
                .truthy();
            if on {
                element.add_class(&pair.class);
            } else {
                element.remove_class(&pair.class);
            }
        }
    });
    node
}

/// Adds the literal class of every `mbr-theme-style` attribute and strips it.
pub fn apply_theme_styles(mut node: Node) -> Node {
    for_each_with_attr(&mut node, THEME_STYLE_ATTR, &mut |element, class| {
        if !class.is_empty() {
            element.add_class(&class);
        }
    });
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_fragment, serialize_node};
    use serde_json::json;

    fn pairs(body: &str) -> Vec<(String, String)> {
        parse_class_pairs(body)
            .pairs
            .into_iter()
            .map(|pair| (pair.class, pair.condition))
            .collect()
    }

    fn pair(class: &str, condition: &str) -> (String, String) {
        (class.to_string(), condition.to_string())
    }

    #[test]
    fn splits_top_level_separators_only() {
        assert_eq!(
            pairs("{'display-1': size == 1, \"a:b\": f(x, y) ? [1, 2] : {c: 3}, plain: 'x,y'}"),
            [
                pair("display-1", "size == 1"),
                pair("a:b", "f(x, y) ? [1, 2] : {c: 3}"),
                pair("plain", "'x,y'"),
            ]
        );
    }

    #[test]
    fn commas_inside_calls_and_strings_stay_in_the_condition() {
        assert_eq!(
            pairs("{a: f(1,2), b: 'x,y'}"),
            [pair("a", "f(1,2)"), pair("b", "'x,y'")]
        );
    }

    #[test]
    fn braces_are_optional_and_trailing_commas_ignored() {
        assert_eq!(pairs("a: x, b: y,"), [pair("a", "x"), pair("b", "y")]);
        assert!(pairs("").is_empty());
        assert!(pairs("{}").is_empty());
    }

    #[test]
    fn entries_without_colon_are_skipped() {
        let parsed = parse_class_pairs("{a: x, nonsense, b: y}");
        assert_eq!(parsed.pairs.len(), 2);
        assert_eq!(parsed.skipped, ["nonsense"]);
    }

    #[test]
    fn unbalanced_body_degrades_to_fewer_pairs() {
        assert!(pairs("{a: (x, b: y}").len() <= 1);
        assert!(pairs("'open: x").is_empty());
    }

    #[test]
    fn syncs_membership_in_order() {
        let params = json!({"big": true, "dark": false});
        let mut ctx = DirectiveContext::new(&params);
        let node = parse_fragment(
            r#"<h1 class="title dark" mbr-class="{'display-1': big, 'dark': dark, 'x y': big}">t</h1>"#,
        )
        .unwrap()
        .remove(0);
        let node = apply_classes(node, &mut ctx);
        assert_eq!(
            serialize_node(&node),
            r#"<h1 class="title display-1 x y">t</h1>"#
        );
    }

    #[test]
    fn malformed_body_leaves_classes_alone() {
        let params = json!({});
        let mut ctx = DirectiveContext::new(&params);
        let node = parse_fragment(r#"<p class="a" mbr-class="oops">t</p>"#).unwrap().remove(0);
        let node = apply_classes(node, &mut ctx);
        assert_eq!(serialize_node(&node), r#"<p class="a">t</p>"#);
        assert_eq!(ctx.diagnostics().count(), 1);
    }

    #[test]
    fn theme_style_adds_literal_class() {
        let node = parse_fragment(
            r#"<div class="a" mbr-theme-style="display-7"><p mbr-theme-style="">x</p></div>"#,
        )
        .unwrap()
        .remove(0);
        assert_eq!(
            serialize_node(&apply_theme_styles(node)),
            r#"<div class="a display-7"><p>x</p></div>"#
        );
    }
}
