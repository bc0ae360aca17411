#![deny(missing_docs)]
//! mbrkit render: turns a directive-annotated component template and its
//! parameters into markup plus scoped CSS, and keeps that output current as
//! parameters change.

pub mod dom;
/// Render options.
pub mod options;
pub mod reactive;
/// Component rendering pipeline.
pub mod renderer;
pub mod style;
pub mod transform;

pub use options::RenderOptions;
pub use reactive::{Clock, ParamHandle, ReactiveController, ReactiveOptions, RenderJob, SystemClock};
pub use renderer::{RenderError, RenderedOutput, render_component, transform_root};
pub use style::{StyleError, compile_styles, flatten_variables, stylespec_to_source};
pub use transform::DirectiveContext;
