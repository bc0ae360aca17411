//! Owned node tree for directive processing, built from `lol_html` tokens.
//!
//! Attribute values and text are kept exactly as written in the template
//! (entities are not decoded), so serialization reproduces untouched markup
//! byte for byte apart from attribute quoting.

mod parse;
mod serialize;

pub use parse::parse_fragment;
pub use serialize::{serialize_node, serialize_nodes};

/// Elements that never have children or an end tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Returns true for void element names.
pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// A node of the fragment tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An element with attributes and children.
    Element(Element),
    /// Character data, raw.
    Text(String),
    /// `<!--...-->` body.
    Comment(String),
    /// `<!...>` body (doctype or bogus declaration).
    Doctype(String),
}

impl Node {
    /// Returns the element when this node is one.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Mutable variant of [`Node::as_element`].
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }
}

/// A single attribute. Empty values serialize as a bare attribute name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Name as written.
    pub name: String,
    /// Raw value.
    pub value: String,
}

/// An element node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Lowercased tag name.
    pub name: String,
    /// Attributes in source order.
    pub attrs: Vec<Attribute>,
    /// Child nodes.
    pub children: Vec<Node>,
}

impl Element {
    /// Creates an element without attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder-style child append.
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.attrs
            .iter()
            .position(|attr| attr.name.eq_ignore_ascii_case(name))
    }

    /// Attribute value by case-insensitive name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.position(name).map(|idx| self.attrs[idx].value.as_str())
    }

    /// Whether the attribute is present.
    pub fn has_attr(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Sets an attribute in place, appending it when absent.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.position(name) {
            Some(idx) => self.attrs[idx].value = value,
            None => self.attrs.push(Attribute {
                name: name.to_string(),
                value,
            }),
        }
    }

    /// Removes an attribute, returning its value.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.position(name)
            .map(|idx| self.attrs.remove(idx).value)
    }

    /// Class names in order.
    pub fn classes(&self) -> Vec<&str> {
        self.attr("class")
            .map(|value| value.split_ascii_whitespace().collect())
            .unwrap_or_default()
    }

    /// Whether the class list contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().contains(&class)
    }

    /// Adds every whitespace-separated name in `names` that is not present yet.
    pub fn add_class(&mut self, names: &str) {
        let mut classes: Vec<String> = self.classes().into_iter().map(str::to_string).collect();
        let before = classes.len();
        for name in names.split_ascii_whitespace() {
            if !classes.iter().any(|existing| existing == name) {
                classes.push(name.to_string());
            }
        }
        if classes.len() != before || self.attr("class").is_some_and(|v| v != classes.join(" ")) {
            self.set_attr("class", classes.join(" "));
        }
    }

    /// Removes every whitespace-separated name in `names`. An emptied class
    /// list stays as an empty `class` attribute.
    pub fn remove_class(&mut self, names: &str) {
        if !self.has_attr("class") {
            return;
        }
        let targets: Vec<&str> = names.split_ascii_whitespace().collect();
        let classes: Vec<String> = self
            .classes()
            .into_iter()
            .filter(|class| !targets.contains(class))
            .map(str::to_string)
            .collect();
        self.set_attr("class", classes.join(" "));
    }

    /// Child elements, skipping text and comments.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }
}

/// Picks the first top-level element of a parsed fragment.
///
/// Leading head-only elements (`style`, `script`, `link`, `meta`, `title`,
/// `base`) are skipped when a later element exists, matching how a document
/// parser files them into `<head>` ahead of the body content.
pub fn root_index(nodes: &[Node]) -> Option<usize> {
    const HEAD_ONLY: &[&str] = &["base", "link", "meta", "script", "style", "title"];
    let mut first = None;
    for (idx, node) in nodes.iter().enumerate() {
        let Node::Element(element) = node else {
            continue;
        };
        first.get_or_insert(idx);
        if !HEAD_ONLY.contains(&element.name.as_str()) {
            return Some(idx);
        }
    }
    first
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_helpers_keep_order() {
        let mut el = Element::new("div").with_attr("class", "a  b");
        el.add_class("c a");
        assert_eq!(el.attr("class"), Some("a b c"));
        el.remove_class("b");
        assert_eq!(el.attr("class"), Some("a c"));
        el.remove_class("a c");
        assert_eq!(el.attr("class"), Some(""));
        el.remove_class("a");
        assert_eq!(el.attr("class"), Some(""));
    }

    #[test]
    fn attribute_lookup_ignores_case() {
        let mut el = Element::new("svg").with_attr("viewBox", "0 0 1 1");
        assert_eq!(el.attr("viewbox"), Some("0 0 1 1"));
        el.set_attr("VIEWBOX", "0 0 2 2");
        assert_eq!(el.attrs.len(), 1);
        assert_eq!(el.attrs[0].name, "viewBox");
        assert_eq!(el.remove_attr("viewbox").as_deref(), Some("0 0 2 2"));
    }

    #[test]
    fn root_skips_leading_head_elements() {
        let nodes = parse_fragment("<style>a{}</style>\n<section></section><div></div>").unwrap();
        let idx = root_index(&nodes).unwrap();
        assert_eq!(nodes[idx].as_element().unwrap().name, "section");

        let only_style = parse_fragment("<style></style>").unwrap();
        assert_eq!(root_index(&only_style), Some(0));
        assert_eq!(root_index(&parse_fragment("text only").unwrap()), None);
    }
}
