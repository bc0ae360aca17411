//! Sandboxed expression language for template directives.
//!
//! Expressions are written against the parameter namespace: every top-level
//! parameter is an identifier, nested values are reached with `.` or `[...]`.
//! The language covers literals, comparison, logical and arithmetic operators,
//! the ternary, and a handful of pure string/array methods.
//!
//! [`evaluate`] never fails: syntax errors, runtime errors and unknown
//! identifiers all produce `undefined`. [`try_evaluate`] exposes the error so
//! callers can record what degraded.

mod eval;
mod lexer;
mod parser;
mod value;

use serde_json::Value as JsonValue;
use thiserror::Error;

pub use eval::{Scope, eval};
pub use lexer::{Token, TokenKind, tokenize};
pub use parser::{BinaryOp, Expr, Literal, LogicalOp, MAX_DEPTH, UnaryOp, parse};
pub use value::{Value, format_number, parse_numeric_string};

/// Failures inside the expression sandbox.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    /// The expression text is malformed.
    #[error("Syntax error at offset {offset}: {message}")]
    Syntax {
        /// What the parser expected or rejected.
        message: String,
        /// Byte offset in the expression.
        offset: usize,
    },
    /// The expression nests deeper than the parser allows.
    #[error("Expression nesting exceeds {0} levels")]
    TooDeep(usize),
    /// Evaluation failed (property of `undefined`, unsupported call, ...).
    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Parses and evaluates an expression, reporting failures.
pub fn try_evaluate<'p>(source: &str, params: &'p JsonValue) -> Result<Value<'p>, ExprError> {
    let expr = parse(source.trim())?;
    eval(&expr, &Scope::new(params))
}

/// Parses and evaluates an expression; any failure yields `undefined`.
pub fn evaluate<'p>(source: &str, params: &'p JsonValue) -> Value<'p> {
    try_evaluate(source, params).unwrap_or(Value::Undefined)
}

/// Evaluates an expression in boolean context.
pub fn evaluate_truthy(source: &str, params: &JsonValue) -> bool {
    evaluate(source, params).truthy()
}

/// Evaluates an expression for text output; `null`/`undefined` become `""`.
pub fn evaluate_to_string(source: &str, params: &JsonValue) -> String {
    evaluate(source, params).to_output_string().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params() -> JsonValue {
        json!({
            "show": true,
            "count": 3,
            "title": "Hello",
            "bg": {"type": "color", "value": "#fff", "parallax": false},
            "overlay": {"opacity": 0.5},
            "items": ["a", "b"],
            "empty": "",
            "nothing": null
        })
    }

    #[test]
    fn resolves_dotted_paths() {
        let p = params();
        assert_eq!(evaluate_to_string("bg.value", &p), "#fff");
        assert_eq!(evaluate_to_string("overlay.opacity", &p), "0.5");
        assert_eq!(evaluate_to_string("bg['type']", &p), "color");
        assert_eq!(evaluate_to_string("items[1]", &p), "b");
        assert_eq!(evaluate_to_string("items.length", &p), "2");
    }

    #[test]
    fn unknown_identifiers_are_undefined() {
        let p = params();
        assert!(evaluate("missing", &p).is_undefined());
        assert_eq!(evaluate_to_string("missing", &p), "");
        assert!(!evaluate_truthy("missing", &p));
        assert!(evaluate_truthy("!missing", &p));
        assert_eq!(evaluate_to_string("typeof missing", &p), "undefined");
    }

    #[test]
    fn errors_degrade_to_undefined() {
        let p = params();
        assert!(evaluate("missing.deeper", &p).is_undefined());
        assert!(evaluate("show &&", &p).is_undefined());
        assert!(evaluate("f(1, 2)", &p).is_undefined());
        assert!(!evaluate_truthy("title.nope()", &p));
        assert!(matches!(
            try_evaluate("missing.deeper", &p),
            Err(ExprError::Runtime(_))
        ));
        assert!(matches!(
            try_evaluate("a +", &p),
            Err(ExprError::Syntax { .. })
        ));
    }

    #[test]
    fn comparison_and_logic() {
        let p = params();
        assert!(evaluate_truthy("bg.type == 'color'", &p));
        assert!(evaluate_truthy("bg.type === \"color\" && !bg.parallax", &p));
        assert!(evaluate_truthy("count >= 3 && count < 4", &p));
        assert!(evaluate_truthy("count == '3'", &p));
        assert!(!evaluate_truthy("count === '3'", &p));
        assert!(evaluate_truthy("empty || show", &p));
        assert_eq!(evaluate_to_string("nothing ?? 'fallback'", &p), "fallback");
        assert_eq!(evaluate_to_string("empty ?? 'fallback'", &p), "");
    }

    #[test]
    fn arithmetic_and_concatenation() {
        let p = params();
        assert_eq!(evaluate_to_string("count * 2 + 1", &p), "7");
        assert_eq!(evaluate_to_string("count + 'px'", &p), "3px");
        assert_eq!(evaluate_to_string("'x' + count * 2", &p), "x6");
        assert_eq!(evaluate_to_string("overlay.opacity * 100 + '%'", &p), "50%");
        assert_eq!(evaluate_to_string("-count", &p), "-3");
        assert_eq!(evaluate_to_string("7 % 4", &p), "3");
    }

    #[test]
    fn ternary_selects_branch() {
        let p = params();
        assert_eq!(evaluate_to_string("show ? 'on' : 'off'", &p), "on");
        assert_eq!(
            evaluate_to_string("bg.type == 'image' ? 'img' : bg.type == 'color' ? 'col' : 'x'", &p),
            "col"
        );
    }

    #[test]
    fn string_methods() {
        let p = params();
        assert_eq!(evaluate_to_string("title.toUpperCase()", &p), "HELLO");
        assert!(evaluate_truthy("bg.value.startsWith('#')", &p));
        assert!(evaluate_truthy("items.includes('a')", &p));
        assert_eq!(evaluate_to_string("items.join(' ')", &p), "a b");
        assert_eq!(evaluate_to_string("overlay.opacity.toFixed(2)", &p), "0.50");
    }

    #[test]
    fn sandbox_has_no_globals() {
        let p = params();
        assert!(evaluate("window", &p).is_undefined());
        assert!(evaluate("globalThis.process", &p).is_undefined());
        assert!(evaluate("this", &p).is_undefined());
    }

    #[test]
    fn non_object_namespace_exposes_nothing() {
        let p = json!([1, 2]);
        assert!(evaluate("length", &p).is_undefined());
        assert_eq!(evaluate_to_string("1 + 1", &p), "2");
    }
}
