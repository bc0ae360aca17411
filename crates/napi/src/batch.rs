//! Inputs and outputs of `renderComponents`.

use crate::types::{RenderConfig, RenderResult};
use napi_derive::napi;
use serde_json::Value as JsonValue;

/// One component to render.
#[napi(object)]
#[derive(Debug, Clone)]
pub struct RenderInput {
    /// Caller-chosen identifier, echoed in the result.
    pub id: String,
    /// Component template.
    pub template: String,
    /// Parameters; the template's declared defaults when absent.
    pub params: Option<JsonValue>,
    /// Per-component options, replacing the batch defaults.
    pub options: Option<RenderConfig>,
}

/// Outcome for one input; exactly one of `result` and `error` is set.
#[napi(object)]
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// The input's `id`.
    pub id: String,
    /// Rendered markup, CSS and warnings.
    pub result: Option<RenderResult>,
    /// Why the template could not be rendered.
    pub error: Option<String>,
}

/// Counts for a `renderComponents` call.
#[napi(object)]
#[derive(Debug, Clone)]
pub struct BatchStats {
    /// Inputs submitted, including any skipped after an early stop.
    pub total: u32,
    /// Components that rendered, warnings or not.
    pub succeeded: u32,
    /// Components with no root element or a rewrite failure.
    pub failed: u32,
    /// Wall-clock time for the whole call.
    pub processing_time_ms: f64,
}

/// Tuning for `renderComponents`.
#[napi(object)]
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Worker threads in the render pool; rayon picks when absent.
    pub max_threads: Option<u32>,
    /// Keep rendering after a component fails. On by default; when off the
    /// inputs are rendered one by one and the first failure ends the call.
    pub continue_on_error: Option<bool>,
    /// Options for inputs that carry none of their own.
    pub defaults: Option<RenderConfig>,
}

/// Per-component outcomes plus counts.
#[napi(object)]
#[derive(Debug, Clone)]
pub struct BatchProcessingResult {
    /// One entry per attempted input, in input order.
    pub results: Vec<BatchResult>,
    /// Counts and timing.
    pub stats: BatchStats,
}
