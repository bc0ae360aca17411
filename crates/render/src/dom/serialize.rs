use super::{Element, Node, is_void};

/// Serializes a node and its subtree.
pub fn serialize_node(node: &Node) -> String {
    let mut out = String::new();
    write_node(&mut out, node);
    out
}

/// Serializes a node list in order.
pub fn serialize_nodes(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node);
    }
    out
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Element(element) => write_element(out, element),
        Node::Text(text) => out.push_str(text),
        Node::Comment(body) => {
            out.push_str("<!--");
            out.push_str(body);
            out.push_str("-->");
        }
        Node::Doctype(body) => {
            out.push_str("<!");
            out.push_str(body);
            out.push('>');
        }
    }
}

fn write_element(out: &mut String, element: &Element) {
    out.push('<');
    out.push_str(&element.name);
    for attr in &element.attrs {
        out.push(' ');
        out.push_str(&attr.name);
        if !attr.value.is_empty() {
            out.push_str("=\"");
            out.push_str(&attr.value.replace('"', "&quot;"));
            out.push('"');
        }
    }
    out.push('>');
    if is_void(&element.name) {
        return;
    }
    for child in &element.children {
        write_node(out, child);
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_fragment;

    #[test]
    fn reproduces_untouched_markup() {
        let source = r#"<section class="a"><img src="x.png"><p>a &amp; b<!-- c --></p></section>"#;
        assert_eq!(serialize_nodes(&parse_fragment(source).unwrap()), source);
    }

    #[test]
    fn normalizes_quoting_and_empty_values() {
        let nodes = parse_fragment(r#"<div data-a='say "hi"' hidden="" title=x></div>"#).unwrap();
        assert_eq!(
            serialize_node(&nodes[0]),
            r#"<div data-a="say &quot;hi&quot;" hidden title="x"></div>"#
        );
    }

    #[test]
    fn self_closing_foreign_elements_get_end_tags() {
        let nodes = parse_fragment(r#"<svg><path d="M0"/></svg>"#).unwrap();
        assert_eq!(serialize_node(&nodes[0]), r#"<svg><path d="M0"></path></svg>"#);
    }
}
