use mbrkit_core::DirectiveKind;

use super::DirectiveContext;
use crate::dom::Node;

/// Attribute holding the keep-condition.
pub const IF_ATTR: &str = "mbr-if";

/// Drops elements whose `mbr-if` condition is falsy and strips the attribute
/// from the rest. Returns `None` when `node` itself is dropped.
///
/// Conditions of descendants of a dropped element are never evaluated.
pub fn apply_conditionals(mut node: Node, ctx: &mut DirectiveContext<'_>) -> Option<Node> {
    let Node::Element(element) = &mut node else {
        return Some(node);
    };
    if let Some(condition) = element.remove_attr(IF_ATTR) {
        let keep = ctx
            .evaluate(DirectiveKind::If, &element.name, &condition)
            .truthy();
        if !keep {
            log::debug!("mbr-if dropped <{}>: {}", element.name, condition.trim());
            return None;
        }
    }
    let children = std::mem::take(&mut element.children);
    element.children = children
        .into_iter()
        .filter_map(|child| apply_conditionals(child, ctx))
        .collect();
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_fragment, serialize_node};
    use serde_json::json;

    fn run(template: &str, params: serde_json::Value) -> (Option<String>, usize) {
        let mut ctx = DirectiveContext::new(&params);
        let node = parse_fragment(template).unwrap().remove(0);
        let out = apply_conditionals(node, &mut ctx).map(|node| serialize_node(&node));
        (out, ctx.diagnostics().count())
    }

    #[test]
    fn keeps_truthy_and_strips_attribute() {
        let (html, _) = run(
            r#"<div><p mbr-if="show">a</p><p mbr-if="!show">b</p></div>"#,
            json!({"show": true}),
        );
        assert_eq!(html.as_deref(), Some("<div><p>a</p></div>"));
    }

    #[test]
    fn drops_whole_subtree() {
        let (html, warnings) = run(
            r#"<div><section mbr-if="bg.type == 'video'"><p mbr-if="bad syntax here">x</p></section></div>"#,
            json!({"bg": {"type": "color"}}),
        );
        assert_eq!(html.as_deref(), Some("<div></div>"));
        assert_eq!(warnings, 0);
    }

    #[test]
    fn errors_count_as_falsy() {
        let (html, warnings) = run(
            r#"<div><p mbr-if="a.b.c">x</p><p mbr-if="missing">y</p></div>"#,
            json!({}),
        );
        assert_eq!(html.as_deref(), Some("<div></div>"));
        assert_eq!(warnings, 1);
    }

    #[test]
    fn root_can_drop_itself() {
        let (html, _) = run(r#"<section mbr-if="false"></section>"#, json!({}));
        assert_eq!(html, None);
    }
}
