use crate::dom::Node;

/// Class prefix of component scopes.
pub const SCOPE_CLASS_PREFIX: &str = "cid-";

/// Class name for a scope id.
pub fn scope_class(scope_id: &str) -> String {
    format!("{}{}", SCOPE_CLASS_PREFIX, scope_id)
}

/// Marks a `section` root with its scope class and, when given, its anchor
/// id. Other roots are returned unchanged.
pub fn apply_scope(mut node: Node, scope_id: Option<&str>, anchor: Option<&str>) -> Node {
    let Some(scope_id) = scope_id else {
        return node;
    };
    if let Node::Element(root) = &mut node
        && root.name == "section"
    {
        root.add_class(&scope_class(scope_id));
        if let Some(anchor) = anchor {
            root.set_attr("id", anchor);
        }
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_fragment, serialize_node};

    fn scoped(template: &str, scope_id: Option<&str>, anchor: Option<&str>) -> String {
        serialize_node(&apply_scope(
            parse_fragment(template).unwrap().remove(0),
            scope_id,
            anchor,
        ))
    }

    #[test]
    fn scopes_section_roots() {
        assert_eq!(
            scoped(r#"<section class="menu"></section>"#, Some("x1"), None),
            r#"<section class="menu cid-x1"></section>"#
        );
        assert_eq!(
            scoped(r#"<section id="old"></section>"#, Some("x1"), Some("top")),
            r#"<section id="top" class="cid-x1"></section>"#
        );
    }

    #[test]
    fn ignores_other_roots_and_missing_scope() {
        assert_eq!(scoped("<div></div>", Some("x1"), Some("a")), "<div></div>");
        assert_eq!(scoped("<section></section>", None, Some("a")), "<section></section>");
    }
}
