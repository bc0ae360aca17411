#![deny(missing_docs)]
//! Node.js bindings for the mbrkit component renderer.

use mbrkit_render::{RenderOptions, RenderedOutput, render_component as render};
use napi_derive::napi;
use serde_json::Value as JsonValue;

/// Batch processing types.
pub mod batch;
/// NAPI-exposed data structures.
pub mod types;
pub use batch::*;
pub use types::*;

fn to_napi_error(err: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(err.to_string())
}

/// Extracts the declared controls of a template.
#[napi(js_name = "parseParameters")]
pub fn parse_parameters(template: String) -> napi::Result<ParametersResult> {
    let schema = mbrkit_core::parse_parameters(&template).map_err(to_napi_error)?;
    ParametersResult::from_schema(&schema)
}

/// Derives the initial parameter set from a template's declarations.
#[napi(js_name = "extractDefaultParams")]
pub fn extract_default_params(template: String) -> napi::Result<JsonValue> {
    mbrkit_core::extract_defaults(&template).map_err(to_napi_error)
}

/// Shallow merge of incoming parameters over the current ones.
#[napi(js_name = "mergeParams")]
pub fn merge_params(current: JsonValue, incoming: JsonValue) -> JsonValue {
    mbrkit_core::merge_overrides(&current, &incoming)
}

fn render_with(
    template: &str,
    params: Option<JsonValue>,
    options: RenderOptions,
) -> Result<RenderedOutput, String> {
    let params = match params {
        Some(params) => params,
        None => mbrkit_core::extract_defaults(template).map_err(|err| err.to_string())?,
    };
    render(template, &params, &options).map_err(|err| err.to_string())
}

/// Renders one component to markup and scoped CSS.
///
/// Without `params` the template's declared defaults are used.
#[napi(js_name = "renderComponent")]
pub fn render_component(
    template: String,
    params: Option<JsonValue>,
    options: Option<RenderConfig>,
) -> napi::Result<RenderResult> {
    let options = options.map(RenderOptions::from).unwrap_or_default();
    render_with(&template, params, options)
        .map(RenderResult::from)
        .map_err(napi::Error::from_reason)
}

/// Renders many components in parallel.
///
/// # Example (JavaScript)
///
/// ```javascript
/// const { renderComponents } = require('@mbrkit/napi');
///
/// const result = renderComponents(
///   [{ id: 'hero', template, params }],
///   { defaults: { PROJECT_PATH: '/site/' } },
/// );
/// console.log(`Rendered ${result.stats.total} components in ${result.stats.processingTimeMs}ms`);
/// ```
#[napi(js_name = "renderComponents")]
pub fn render_components(
    inputs: Vec<RenderInput>,
    options: Option<BatchOptions>,
) -> napi::Result<BatchProcessingResult> {
    use rayon::prelude::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    let start = Instant::now();
    let opts = options.unwrap_or_default();
    let continue_on_error = opts.continue_on_error.unwrap_or(true);
    let defaults = opts.defaults.clone().unwrap_or_default();

    let pool = if let Some(max_threads) = opts.max_threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(max_threads as usize)
            .build()
            .ok()
    } else {
        None
    };

    let total = inputs.len() as u32;
    let succeeded = AtomicU32::new(0);
    let failed = AtomicU32::new(0);

    let process_input = |input: RenderInput| -> BatchResult {
        let config = input.options.unwrap_or_else(|| defaults.clone());
        match render_with(&input.template, input.params, config.into()) {
            Ok(output) => {
                succeeded.fetch_add(1, Ordering::Relaxed);
                BatchResult {
                    id: input.id,
                    result: Some(output.into()),
                    error: None,
                }
            }
            Err(err) => {
                failed.fetch_add(1, Ordering::Relaxed);
                log::warn!("render of {} failed: {}", input.id, err);
                BatchResult {
                    id: input.id,
                    result: None,
                    error: Some(err),
                }
            }
        }
    };

    let results: Vec<BatchResult> = if continue_on_error {
        if let Some(pool) = pool {
            pool.install(|| inputs.into_par_iter().map(process_input).collect())
        } else {
            inputs.into_par_iter().map(process_input).collect()
        }
    } else {
        // Stop at the first failure, in input order.
        let mut results = Vec::with_capacity(inputs.len());
        for input in inputs {
            let result = process_input(input);
            let had_error = result.error.is_some();
            results.push(result);
            if had_error {
                break;
            }
        }
        results
    };

    let elapsed = start.elapsed();

    Ok(BatchProcessingResult {
        results,
        stats: BatchStats {
            total,
            succeeded: succeeded.load(Ordering::Relaxed),
            failed: failed.load(Ordering::Relaxed),
            processing_time_ms: elapsed.as_secs_f64() * 1000.0,
        },
    })
}
