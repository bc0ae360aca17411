//! A compiler for the nested stylesheet subset used by component styles:
//! variables, nesting with `&`, guards, arithmetic, colour functions and
//! bubbling `@media` blocks.

mod compile;
mod functions;
mod parser;
mod value;

pub use compile::compile;
pub use parser::{Statement, parse, strip_comments};
pub use value::{Color, LessValue, Variables, evaluate_value, format_dimension};
