//! Scoped stylesheet generation.
//!
//! A component's style object is serialized to nested source, wrapped in its
//! `.cid-<id>` scope, given the flattened parameters as trailing variable
//! definitions, and compiled to CSS.

pub mod less;
mod source;
mod vars;

use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::transform::scope::scope_class;

pub use source::stylespec_to_source;
pub use vars::{COLOR_VARIABLES, flatten_variables};

/// Errors from compiling component styles.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StyleError {
    /// Malformed source.
    #[error("syntax error on line {line}: {message}")]
    Syntax {
        /// 1-based line of the offending text.
        line: usize,
        /// What went wrong.
        message: String,
    },
    /// A block is never closed, or closed twice.
    #[error("unbalanced block: {0}")]
    Unbalanced(String),
    /// Reference to a variable defined in no enclosing scope.
    #[error("variable @{0} is undefined")]
    UndefinedVariable(String),
    /// A variable whose value refers back to itself.
    #[error("variable @{0} is defined in terms of itself")]
    RecursiveVariable(String),
    /// Mixins, detached rulesets and other statements outside the subset.
    #[error("unsupported statement {0}")]
    Unsupported(String),
    /// Arithmetic between incompatible values.
    #[error("operation error: {0}")]
    Operation(String),
    /// A value or guard that cannot be read.
    #[error("invalid value: {0}")]
    InvalidValue(String),
    /// A built-in function called with the wrong argument types.
    #[error("wrong arguments to {0}()")]
    FunctionArguments(String),
}

/// Compiles a style object for one component scope.
///
/// Parameter variables are defined at the root, after the scoped block, so
/// they replace earlier root definitions but not ones inside the scope.
pub fn compile_styles(
    spec: &JsonValue,
    params: &JsonValue,
    scope_id: &str,
) -> Result<String, StyleError> {
    let mut source = format!(".{} {{ {} }}", scope_class(scope_id), stylespec_to_source(spec));
    for (name, value) in flatten_variables(params) {
        source.push_str(&format!("\n@{}: {};", name, value));
    }
    log::debug!("compiling {} bytes of style source for {}", source.len(), scope_id);
    less::compile(&source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use serde_json::json;

    #[test]
    fn compiles_scoped_styles_with_parameter_variables() {
        let spec = json!({
            "padding-top": "(@paddingTop * 1rem)",
            ".mbr-section-title": { "color": "@tColor" },
            "& when (@fullScreen)": { "min-height": "100vh" },
            "@media (max-width: 767px)": { ".mbr-text": { "text-align": "center" } }
        });
        let params = json!({ "paddingTop": "2", "tColor": "#232323", "fullScreen": true });
        assert_snapshot!(compile_styles(&spec, &params, "u1").unwrap().trim_end(), @r"
.cid-u1 {
  padding-top: 2rem;
}
.cid-u1 .mbr-section-title {
  color: #232323;
}
.cid-u1 {
  min-height: 100vh;
}
@media (max-width: 767px) {
  .cid-u1 .mbr-text {
    text-align: center;
  }
}
");
    }

    #[test]
    fn scoped_definitions_shadow_parameters() {
        let spec = json!({ "margin": "(@gap * 1px)", ".inner": { "@gap": "1", "padding": "@gap" } });
        let css = compile_styles(&spec, &json!({ "gap": 5 }), "x").unwrap();
        assert_eq!(css, ".cid-x {\n  margin: 5px;\n}\n.cid-x .inner {\n  padding: 1;\n}\n");
    }

    #[test]
    fn unbalanced_sources_fail() {
        let spec = json!({ ".a": [], ".b": { "x": 1 } });
        assert!(matches!(
            compile_styles(&spec, &json!({}), "x"),
            Err(StyleError::Unbalanced(_))
        ));
    }

    #[test]
    fn missing_variables_fail() {
        let spec = json!({ "color": "@nope" });
        assert_eq!(
            compile_styles(&spec, &json!({}), "x"),
            Err(StyleError::UndefinedVariable("nope".to_string()))
        );
    }
}
