use mbrkit_core::{DirectiveKind, RenderWarning};
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::dom::{Node, parse_fragment, root_index, serialize_node};
use crate::options::RenderOptions;
use crate::style::compile_styles;
use crate::transform::DirectiveContext;
use crate::transform::classes::{apply_classes, apply_theme_styles};
use crate::transform::conditionals::apply_conditionals;
use crate::transform::overlay::apply_overlay_styles;
use crate::transform::prepare::prepare;
use crate::transform::scope::apply_scope;
use crate::transform::styles::apply_styles;
use crate::transform::tokens::substitute_tokens;

/// Result of rendering one component.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderedOutput {
    /// Markup of the root element; empty when the root was removed by its
    /// own `mbr-if`.
    pub html: String,
    /// Scoped CSS; empty without styles and a scope id, or when compiling
    /// them failed.
    pub css: String,
    /// Directives that degraded during the render.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<RenderWarning>,
}

/// Fatal render failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The template holds no element once the declaration block is removed.
    #[error("template has no root element")]
    MissingRoot,
    /// The streaming pre-pass or the fragment parse failed.
    #[error("failed to rewrite template: {0}")]
    Rewrite(String),
}

/// Renders a component template against a parameter set.
pub fn render_component(
    template: &str,
    params: &JsonValue,
    options: &RenderOptions,
) -> Result<RenderedOutput, RenderError> {
    let prepared = prepare(template, &options.path_prefix)
        .map_err(|err| RenderError::Rewrite(err.to_string()))?;
    let mut nodes =
        parse_fragment(&prepared).map_err(|err| RenderError::Rewrite(err.to_string()))?;
    let index = root_index(&nodes).ok_or(RenderError::MissingRoot)?;
    let root = nodes.swap_remove(index);

    let mut ctx = DirectiveContext::new(params);
    let html = match transform_root(root, &mut ctx, options) {
        Some(root) => serialize_node(&root),
        None => {
            log::debug!("root element removed by mbr-if");
            String::new()
        }
    };
    let mut warnings = ctx.into_diagnostics().warnings;
    let css = component_css(params, options, &mut warnings);

    Ok(RenderedOutput {
        html,
        css,
        warnings,
    })
}

/// Runs the tree steps over a parsed root, in pipeline order. `None` when
/// the root's own `mbr-if` is falsy.
pub fn transform_root(
    root: Node,
    ctx: &mut DirectiveContext<'_>,
    options: &RenderOptions,
) -> Option<Node> {
    let root = substitute_tokens(root, ctx);
    let root = apply_conditionals(root, ctx)?;
    let root = apply_classes(root, ctx);
    let root = apply_styles(root, ctx);
    let root = apply_theme_styles(root);
    let root = apply_scope(root, options.scope(), options.anchor());
    if options.overlay_styles {
        Some(apply_overlay_styles(root))
    } else {
        Some(root)
    }
}

fn component_css(
    params: &JsonValue,
    options: &RenderOptions,
    warnings: &mut Vec<RenderWarning>,
) -> String {
    let (Some(spec), Some(scope_id)) = (options.style_spec(), options.scope()) else {
        return String::new();
    };
    match compile_styles(spec, params, scope_id) {
        Ok(css) => css,
        Err(err) => {
            log::error!("failed to compile styles for cid-{}: {}", scope_id, err);
            warnings.push(RenderWarning::global(DirectiveKind::Stylesheet, err.to_string()));
            String::new()
        }
    }
}
