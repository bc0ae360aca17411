//! Directive processing steps.
//!
//! - `prepare`: streaming pre-pass that drops the declaration block and
//!   rewrites placeholder paths.
//! - `tokens`: `{{expr}}` substitution in attributes and text.
//! - `conditionals`: `mbr-if`.
//! - `classes`: `mbr-class` and `mbr-theme-style`.
//! - `styles`: `mbr-style`.
//! - `overlay`: overlay attribute folding.
//! - `scope`: `cid-<id>` class and anchor on the root section.
//!
//! Every tree step takes the root node by value and returns the transformed
//! node, so steps compose in any order and can be exercised in isolation.

/// `mbr-class` and `mbr-theme-style`.
pub mod classes;
/// `mbr-if`.
pub mod conditionals;
/// Overlay attribute folding.
pub mod overlay;
/// Streaming pre-pass over the raw template.
pub mod prepare;
/// Root scoping.
pub mod scope;
/// `mbr-style`.
pub mod styles;
/// `{{expr}}` substitution.
pub mod tokens;

use mbrkit_core::expr::{ExprError, Value, try_evaluate};
use mbrkit_core::{Diagnostics, DirectiveKind, RenderWarning};
use serde_json::Value as JsonValue;

use crate::dom::{Element, Node};

/// Shared state of a directive pass: the parameter namespace and the warnings
/// raised so far.
#[derive(Debug)]
pub struct DirectiveContext<'p> {
    params: &'p JsonValue,
    diagnostics: Diagnostics,
}

impl<'p> DirectiveContext<'p> {
    /// Starts a pass over `params`.
    pub fn new(params: &'p JsonValue) -> Self {
        Self {
            params,
            diagnostics: Diagnostics::new(),
        }
    }

    /// The parameter namespace.
    pub fn params(&self) -> &'p JsonValue {
        self.params
    }

    /// Evaluates `source`, recording a warning and yielding `undefined` on
    /// failure.
    pub fn evaluate(&mut self, directive: DirectiveKind, element: &str, source: &str) -> Value<'p> {
        match try_evaluate(source, self.params) {
            Ok(value) => value,
            Err(err) => {
                self.expression_failed(directive, element, source, &err);
                Value::Undefined
            }
        }
    }

    fn expression_failed(
        &mut self,
        directive: DirectiveKind,
        element: &str,
        source: &str,
        err: &ExprError,
    ) {
        self.warn(RenderWarning::at_element(
            directive,
            element,
            format!("`{}`: {}", source.trim(), err),
        ));
    }

    /// Records a warning.
    pub fn warn(&mut self, warning: RenderWarning) {
        self.diagnostics.warn(warning);
    }

    /// Warnings raised so far.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Ends the pass.
    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }
}

/// Visits every element of the subtree in document order, parent first.
pub(crate) fn for_each_element(node: &mut Node, visit: &mut impl FnMut(&mut Element)) {
    if let Node::Element(element) = node {
        visit(element);
        for child in &mut element.children {
            for_each_element(child, visit);
        }
    }
}

/// Applies an element step to every element carrying `attr`.
pub(crate) fn for_each_with_attr(
    node: &mut Node,
    attr: &str,
    visit: &mut impl FnMut(&mut Element, String),
) {
    for_each_element(node, &mut |element| {
        if let Some(value) = element.remove_attr(attr) {
            visit(element, value);
        }
    });
}
