//! NAPI-exposed data structures.

use mbrkit_core::{RenderWarning, Schema};
use mbrkit_render::{RenderOptions, RenderedOutput};
use napi_derive::napi;
use serde_json::Value as JsonValue;

/// Declared controls of a template.
#[napi(object)]
#[derive(Debug, Clone)]
pub struct ParametersResult {
    /// Whether the template carries an `<mbr-parameters>` block.
    pub found: bool,
    /// Number of controls.
    pub count: u32,
    /// Controls in declaration order, as JSON objects.
    pub controls: JsonValue,
}

impl ParametersResult {
    pub(crate) fn from_schema(schema: &Schema) -> napi::Result<Self> {
        let controls = serde_json::to_value(&schema.controls)
            .map_err(|err| napi::Error::from_reason(err.to_string()))?;
        Ok(Self {
            found: schema.found,
            count: schema.count() as u32,
            controls,
        })
    }
}

/// Options for rendering a component.
///
/// `PROJECT_PATH` and `cid` are accepted as the legacy spellings of
/// `pathPrefix` and `scopeId`; the newer names win when both are given.
#[napi(object)]
#[derive(Debug, Clone, Default)]
pub struct RenderConfig {
    /// Replacement for `@PROJECT_PATH@/` in path attributes.
    pub path_prefix: Option<String>,
    /// Legacy name of `pathPrefix`.
    #[napi(js_name = "PROJECT_PATH")]
    pub project_path: Option<String>,
    /// Style tree compiled into scoped CSS.
    pub styles: Option<JsonValue>,
    /// Component scope id.
    pub scope_id: Option<String>,
    /// Legacy name of `scopeId`.
    pub cid: Option<String>,
    /// Id set on a scoped `section` root.
    pub anchor: Option<String>,
    /// Fold overlay `opacity`/`bg-color` attributes into inline style.
    pub overlay_styles: Option<bool>,
}

impl From<RenderConfig> for RenderOptions {
    fn from(config: RenderConfig) -> Self {
        RenderOptions {
            path_prefix: config.path_prefix.or(config.project_path).unwrap_or_default(),
            styles: config.styles,
            scope_id: config.scope_id.or(config.cid),
            anchor: config.anchor,
            overlay_styles: config.overlay_styles.unwrap_or(false),
        }
    }
}

/// A degraded directive reported by a render.
#[napi(object)]
#[derive(Debug, Clone)]
pub struct WarningEntry {
    /// Directive name (`mbr-if`, `mbr-class`, `styles`, ...).
    pub directive: String,
    /// Tag of the element carrying the directive.
    pub element: Option<String>,
    /// Human-readable cause.
    pub message: String,
}

impl From<RenderWarning> for WarningEntry {
    fn from(warning: RenderWarning) -> Self {
        WarningEntry {
            directive: warning.directive.as_str().to_string(),
            element: warning.element,
            message: warning.message,
        }
    }
}

/// Rendered component.
#[napi(object)]
#[derive(Debug, Clone)]
pub struct RenderResult {
    /// Markup of the root element.
    pub html: String,
    /// Scoped CSS.
    pub css: String,
    /// Directives that degraded.
    pub warnings: Vec<WarningEntry>,
}

impl From<RenderedOutput> for RenderResult {
    fn from(output: RenderedOutput) -> Self {
        RenderResult {
            html: output.html,
            css: output.css,
            warnings: output.warnings.into_iter().map(WarningEntry::from).collect(),
        }
    }
}
