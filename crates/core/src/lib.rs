#![deny(missing_docs)]
//! mbrkit core: parameter schema extraction, default values, parameter-set
//! helpers and the sandboxed expression language used by template directives.

/// Default parameter derivation.
pub mod defaults;
/// Render diagnostics.
pub mod error;
/// Sandboxed expression language.
pub mod expr;
/// ParameterSet path access and merging.
pub mod params;
/// `<mbr-parameters>` schema extraction.
pub mod schema;

/// Placeholder that templates use for the project asset root.
pub const PATH_PLACEHOLDER: &str = "@PROJECT_PATH@/";

pub use defaults::{defaults_for, extract_defaults};
pub use error::{DirectiveKind, Diagnostics, RenderWarning};
pub use expr::{ExprError, Value, evaluate, evaluate_to_string, evaluate_truthy, try_evaluate};
pub use params::{ParamError, get_path, merge_overrides, remove_path, set_path};
pub use schema::{
    Control, ControlAttrs, ControlKind, ControlOptions, DECLARATION_TAG, Schema, SchemaError,
    SelectOption, attr_bool, parse_parameters,
};
