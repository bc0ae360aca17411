use mbrkit_core::expr::Value;
use mbrkit_core::{DirectiveKind, RenderWarning};
use serde_json::{Map, Value as JsonValue};

use super::{DirectiveContext, for_each_with_attr};
use crate::dom::Node;

/// Attribute holding `{property: expression, ...}`.
pub const STYLE_ATTR: &str = "mbr-style";

/// Rewrites an object-literal-like body into JSON text.
///
/// Every run of `[A-Za-z0-9_-]` followed by optional whitespace and a colon
/// becomes a quoted key, then every single quote becomes a double quote. The
/// rewrite is textual and also touches matching runs inside values.
pub fn normalize_object_literal(body: &str) -> String {
    let mut out = String::with_capacity(body.len() + 8);
    let mut rest = body;
    while let Some(start) = rest.find(is_key_char) {
        out.push_str(&rest[..start]);
        let run_len = rest[start..]
            .find(|c: char| !is_key_char(c))
            .unwrap_or(rest.len() - start);
        let run = &rest[start..start + run_len];
        let after = &rest[start + run_len..];
        let gap = after.len() - after.trim_start().len();
        if after[gap..].starts_with(':') {
            out.push('"');
            out.push_str(run);
            out.push_str("\":");
            rest = &after[gap + 1..];
        } else {
            out.push_str(run);
            rest = after;
        }
    }
    out.push_str(rest);
    out.replace('\'', "\"")
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Parses an `mbr-style` body; `None` when it is not a JSON object after
/// normalization.
pub fn parse_style_map(body: &str) -> Option<Map<String, JsonValue>> {
    match serde_json::from_str(&normalize_object_literal(body)) {
        Ok(JsonValue::Object(map)) => Some(map),
        _ => None,
    }
}

/// Appends the evaluated `mbr-style` declarations to each element's inline
/// style and strips the attribute.
///
/// String entries are evaluated as expressions; other JSON values are used
/// as they are. Results that are `undefined` or the empty string are left
/// out. A body that does not parse contributes nothing.
pub fn apply_styles(mut node: Node, ctx: &mut DirectiveContext<'_>) -> Node {
    for_each_with_attr(&mut node, STYLE_ATTR, &mut |element, body| {
        let Some(map) = parse_style_map(&body) else {
            if !body.trim().is_empty() {
                ctx.warn(RenderWarning::at_element(
                    DirectiveKind::Style,
                    element.name.as_str(),
                    format!("unparsable style map `{}`", body.trim()),
                ));
            }
            return;
        };

        let mut declarations = Vec::new();
        for (property, entry) in &map {
            let value = match entry {
                JsonValue::String(source) => {
                    ctx.evaluate(DirectiveKind::Style, &element.name, source)
                }
                other => Value::from_json(other),
            };
            if value.is_undefined() || matches!(&value, Value::Str(s) if s.is_empty()) {
                continue;
            }
            declarations.push(format!("{}: {}", property, value.to_js_string()));
        }
        if declarations.is_empty() {
            return;
        }

        let joined = declarations.join("; ");
        let style = match element.attr("style") {
            Some(existing) if !existing.is_empty() => format!("{}; {}", existing, joined),
            _ => joined,
        };
        element.set_attr("style", style);
    });
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_fragment, serialize_node};
    use serde_json::json;

    fn render(template: &str, params: JsonValue) -> (String, usize) {
        let mut ctx = DirectiveContext::new(&params);
        let node = apply_styles(parse_fragment(template).unwrap().remove(0), &mut ctx);
        (serialize_node(&node), ctx.diagnostics().count())
    }

    #[test]
    fn normalizes_bare_keys_and_quotes() {
        assert_eq!(
            normalize_object_literal("{color: 'bg.value', 'padding-top' : pad}"),
            r#"{"color": "bg.value", "padding-top" : pad}"#
        );
        assert_eq!(
            normalize_object_literal("{opacity: 0.5, z-index :2}"),
            r#"{"opacity": 0.5, "z-index":2}"#
        );
    }

    #[test]
    fn rewrite_also_reaches_values() {
        assert_eq!(
            normalize_object_literal("{a: 'x ? b : c'}"),
            r#"{"a": "x ? "b": c"}"#
        );
        assert!(parse_style_map("{a: 'x ? b : c'}").is_none());
    }

    #[test]
    fn appends_evaluated_declarations() {
        let (html, warnings) = render(
            r#"<div style="display: block" mbr-style="{'color': 'bg.value', opacity: 0.5, 'width': 'missing', 'height': 'empty'}"></div>"#,
            json!({"bg": {"value": "#fff"}, "empty": ""}),
        );
        assert_eq!(
            html,
            r#"<div style="display: block; color: #fff; opacity: 0.5"></div>"#
        );
        assert_eq!(warnings, 0);
    }

    #[test]
    fn null_results_are_kept() {
        let (html, _) = render(
            r#"<div mbr-style="{'color': 'nothing', 'margin': 0}"></div>"#,
            json!({"nothing": null}),
        );
        assert_eq!(html, r#"<div style="color: null; margin: 0"></div>"#);
    }

    #[test]
    fn unparsable_map_contributes_nothing() {
        let (html, warnings) = render(
            r#"<p style="a: b" mbr-style="{color: [}">x</p>"#,
            json!({}),
        );
        assert_eq!(html, r#"<p style="a: b">x</p>"#);
        assert_eq!(warnings, 1);
    }

    #[test]
    fn empty_attribute_is_silent() {
        let (html, warnings) = render(r#"<p mbr-style="">x</p>"#, json!({}));
        assert_eq!(html, "<p>x</p>");
        assert_eq!(warnings, 0);
    }
}
