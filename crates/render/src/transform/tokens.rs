use mbrkit_core::DirectiveKind;

use super::{DirectiveContext, for_each_element};
use crate::dom::Node;

/// Replaces every `{{expr}}` in attribute values and text nodes.
///
/// A token is `{{`, one or more characters other than `}`, then `}}`. The
/// expression is trimmed before evaluation; `null` and `undefined` results
/// become the empty string. Text inside `script` and `style` is included.
pub fn substitute_tokens(mut node: Node, ctx: &mut DirectiveContext<'_>) -> Node {
    if let Node::Text(text) = &mut node {
        if let Some(replaced) = substitute(text, "#text", ctx) {
            *text = replaced;
        }
    } else {
        for_each_element(&mut node, &mut |element| {
            let name = element.name.clone();
            for attr in &mut element.attrs {
                if let Some(replaced) = substitute(&attr.value, &name, ctx) {
                    attr.value = replaced;
                }
            }
            for child in &mut element.children {
                if let Node::Text(text) = child
                    && let Some(replaced) = substitute(text, &name, ctx)
                {
                    *text = replaced;
                }
            }
        });
    }
    node
}

/// Substitutes tokens in a single string; `None` when it holds no token.
pub fn substitute(input: &str, element: &str, ctx: &mut DirectiveContext<'_>) -> Option<String> {
    let mut tokens = find_tokens(input).peekable();
    tokens.peek()?;

    let mut out = String::with_capacity(input.len());
    let mut last = 0;
    for (start, end, expr) in tokens {
        out.push_str(&input[last..start]);
        let value = ctx.evaluate(DirectiveKind::Token, element, expr.trim());
        out.push_str(&value.to_output_string());
        last = end;
    }
    out.push_str(&input[last..]);
    Some(out)
}

/// Yields `(start, end, expression)` for every token, left to right.
pub fn find_tokens(input: &str) -> impl Iterator<Item = (usize, usize, &str)> {
    let bytes = input.as_bytes();
    let mut pos = 0;
    std::iter::from_fn(move || {
        while pos + 1 < bytes.len() {
            let start = pos;
            if bytes[start] != b'{' || bytes[start + 1] != b'{' {
                pos += 1;
                continue;
            }
            let body_start = start + 2;
            let mut body_end = body_start;
            while body_end < bytes.len() && bytes[body_end] != b'}' {
                body_end += 1;
            }
            if body_end > body_start && bytes.get(body_end + 1) == Some(&b'}') {
                pos = body_end + 2;
                return Some((start, pos, &input[body_start..body_end]));
            }
            pos += 1;
        }
        None
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_fragment, serialize_node};
    use serde_json::json;

    fn tokens(input: &str) -> Vec<&str> {
        find_tokens(input).map(|(_, _, expr)| expr).collect()
    }

    #[test]
    fn finds_tokens_like_the_reference_pattern() {
        assert_eq!(tokens("a {{ x }} b {{y}}"), [" x ", "y"]);
        assert_eq!(tokens("{{}} {{ }}"), [" "]);
        assert_eq!(tokens("{{{a}}"), ["{a"]);
        assert_eq!(tokens("{{a} b}}"), Vec::<&str>::new());
        assert_eq!(tokens("{{a}}}"), ["a"]);
    }

    #[test]
    fn substitutes_text_and_attributes() {
        let params = json!({"title": "Hi", "bg": {"value": "#fff"}, "none": null});
        let mut ctx = DirectiveContext::new(&params);
        let node = parse_fragment(
            r#"<div style="color: {{ bg.value }}" data-x="{{none}}"><h1>{{title}}!</h1><p>{{missing}}</p></div>"#,
        )
        .unwrap()
        .remove(0);
        let node = substitute_tokens(node, &mut ctx);
        assert_eq!(
            serialize_node(&node),
            r#"<div style="color: #fff" data-x><h1>Hi!</h1><p></p></div>"#
        );
        assert!(!ctx.diagnostics().has_warnings());
        assert_eq!(substitute("plain", "p", &mut ctx), None);
    }

    #[test]
    fn reaches_raw_text_elements() {
        let params = json!({"size": 12});
        let mut ctx = DirectiveContext::new(&params);
        let node = parse_fragment("<style>.a { width: {{size}}px; }</style>").unwrap().remove(0);
        assert_eq!(
            serialize_node(&substitute_tokens(node, &mut ctx)),
            "<style>.a { width: 12px; }</style>"
        );
    }

    #[test]
    fn failed_expressions_become_empty_with_a_warning() {
        let params = json!({});
        let mut ctx = DirectiveContext::new(&params);
        let out = substitute("[{{ a.b.c }}]", "p", &mut ctx).unwrap();
        assert_eq!(out, "[]");
        assert_eq!(ctx.diagnostics().count(), 1);
        assert_eq!(ctx.diagnostics().warnings[0].directive, DirectiveKind::Token);
    }
}
