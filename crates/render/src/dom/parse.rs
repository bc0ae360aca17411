//! Fragment parsing on top of `lol_html`'s tokenizer.
//!
//! The rewriter's output is discarded; its handlers feed a tree builder.
//! Start tags open elements, each element's end-tag handler closes it (and
//! anything still open inside it), and elements that never see an end tag are
//! closed at the end of input. Text and attribute values stay raw.

use std::cell::RefCell;
use std::rc::Rc;

use lol_html::errors::RewritingError;
use lol_html::html_content::EndTag;
use lol_html::{EndTagHandler, RewriteStrSettings, doc_comments, doc_text, doctype, element, rewrite_str};

use super::{Attribute, Element, Node};

/// Parses an HTML fragment into top-level nodes.
pub fn parse_fragment(source: &str) -> Result<Vec<Node>, RewritingError> {
    let builder = Rc::new(RefCell::new(TreeBuilder::default()));

    let on_element = builder.clone();
    let on_text = builder.clone();
    let on_comment = builder.clone();
    let on_doctype = builder.clone();

    rewrite_str(
        source,
        RewriteStrSettings {
            element_content_handlers: vec![element!("*", move |el| {
                let mut element = Element::new(el.tag_name());
                for attr in el.attributes() {
                    let name = attr.name();
                    if !element.has_attr(&name) {
                        element.attrs.push(Attribute {
                            name,
                            value: attr.value(),
                        });
                    }
                }

                match el.end_tag_handlers() {
                    Some(handlers) => {
                        let id = on_element.borrow_mut().open(element);
                        let closer = on_element.clone();
                        let handler: EndTagHandler<'static> =
                            Box::new(move |_end: &mut EndTag<'_>| {
                                closer.borrow_mut().close(id);
                                Ok(())
                            });
                        handlers.push(handler);
                    }
                    None => on_element.borrow_mut().push(Node::Element(element)),
                }
                Ok(())
            })],
            document_content_handlers: vec![
                doc_text!(move |chunk| {
                    on_text.borrow_mut().text(chunk.as_str());
                    Ok(())
                }),
                doc_comments!(move |comment| {
                    on_comment.borrow_mut().push(Node::Comment(comment.text()));
                    Ok(())
                }),
                doctype!(move |doctype| {
                    let body = match doctype.name() {
                        Some(name) => format!("DOCTYPE {}", name),
                        None => "DOCTYPE".to_string(),
                    };
                    on_doctype.borrow_mut().push(Node::Doctype(body));
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::new()
        },
    )?;

    let built = builder.take();
    Ok(built.finish())
}

#[derive(Default)]
struct TreeBuilder {
    roots: Vec<Node>,
    open: Vec<(usize, Element)>,
    next_id: usize,
}

impl TreeBuilder {
    fn siblings(&mut self) -> &mut Vec<Node> {
        match self.open.last_mut() {
            Some((_, parent)) => &mut parent.children,
            None => &mut self.roots,
        }
    }

    fn push(&mut self, node: Node) {
        self.siblings().push(node);
    }

    /// Appends raw text, merging with a preceding text node.
    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let siblings = self.siblings();
        if let Some(Node::Text(existing)) = siblings.last_mut() {
            existing.push_str(text);
        } else {
            siblings.push(Node::Text(text.to_string()));
        }
    }

    fn open(&mut self, element: Element) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.open.push((id, element));
        id
    }

    fn close(&mut self, id: usize) {
        let Some(depth) = self.open.iter().rposition(|(open_id, _)| *open_id == id) else {
            return;
        };
        while self.open.len() > depth {
            if let Some((_, element)) = self.open.pop() {
                self.push(Node::Element(element));
            }
        }
    }

    fn finish(mut self) -> Vec<Node> {
        while let Some((_, element)) = self.open.pop() {
            self.push(Node::Element(element));
        }
        self.roots
    }
}
