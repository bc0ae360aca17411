//! Browser bindings for the mbrkit component renderer.
//!
//! Exposes parameter extraction, one-shot rendering and [`PreviewSession`],
//! a debounced live preview driven by the page's event loop. Values cross the
//! boundary as plain JS objects.

use std::time::Duration;

use mbrkit_render::{Clock, ReactiveController, ReactiveOptions, RenderOptions};
use serde::Serialize;
use serde_json::Value as JsonValue;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;

// ============================================================================
// Conversions
// ============================================================================

/// Objects cross the boundary as plain JS objects, never `Map`s.
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsError> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value
        .serialize(&serializer)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

fn from_js<T: serde::de::DeserializeOwned + Default>(value: JsValue, what: &str) -> Result<T, JsError> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(|e| JsError::new(&format!("Invalid {}: {}", what, e)))
}

fn params_or_defaults(template: &str, params: JsValue) -> Result<JsonValue, JsError> {
    if params.is_undefined() || params.is_null() {
        return mbrkit_core::extract_defaults(template).map_err(|e| JsError::new(&e.to_string()));
    }
    serde_wasm_bindgen::from_value(params).map_err(|e| JsError::new(&format!("Invalid params: {}", e)))
}

// ============================================================================
// One-shot API
// ============================================================================

/// Returns `{ found, controls }` for the template's declaration block.
#[wasm_bindgen(js_name = parse_parameters)]
pub fn parse_parameters(template: &str) -> Result<JsValue, JsError> {
    let schema = mbrkit_core::parse_parameters(template).map_err(|e| JsError::new(&e.to_string()))?;
    to_js(&schema)
}

/// Returns the initial parameter set declared by the template.
#[wasm_bindgen(js_name = extract_default_params)]
pub fn extract_default_params(template: &str) -> Result<JsValue, JsError> {
    let defaults = mbrkit_core::extract_defaults(template).map_err(|e| JsError::new(&e.to_string()))?;
    to_js(&defaults)
}

/// Renders a component to `{ html, css, warnings? }`.
///
/// `params` defaults to the template's declared defaults. `options` accepts
/// the same keys as the Node binding (`pathPrefix`/`PROJECT_PATH`,
/// `scopeId`/`cid`, `styles`, `anchor`, `overlayStyles`).
///
/// # Example (JavaScript)
///
/// ```javascript
/// import { render_component } from './mbrkit_wasm';
///
/// const { html, css } = render_component(template, { title: 'Hi' }, { cid: 'u1', styles });
/// ```
#[wasm_bindgen(js_name = render_component)]
pub fn render_component(template: &str, params: JsValue, options: JsValue) -> Result<JsValue, JsError> {
    let params = params_or_defaults(template, params)?;
    let options: RenderOptions = from_js(options, "options")?;
    let output = mbrkit_render::render_component(template, &params, &options)
        .map_err(|e| JsError::new(&e.to_string()))?;
    to_js(&output)
}

// ============================================================================
// Live preview
// ============================================================================

/// Milliseconds since the session started, from `Date.now()`.
#[derive(Debug, Clone, Copy)]
struct DateClock {
    origin: f64,
}

impl DateClock {
    fn new() -> Self {
        Self {
            origin: js_sys::Date::now(),
        }
    }
}

impl Clock for DateClock {
    fn now(&self) -> Duration {
        let elapsed = (js_sys::Date::now() - self.origin).max(0.0);
        Duration::from_secs_f64(elapsed / 1000.0)
    }
}

/// A component under live edit.
///
/// Mutations are debounced; the host calls `poll()` from a timer (or after
/// `pendingDeadlineMs()` has elapsed) and re-reads `output()` when it
/// returns `true`. Overlay attribute folding is always on in a preview.
#[wasm_bindgen]
pub struct PreviewSession {
    controller: ReactiveController<DateClock>,
}

#[wasm_bindgen]
impl PreviewSession {
    /// Starts a session and renders once.
    ///
    /// `reactive` accepts `{ debounceMs }`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        template: String,
        params: JsValue,
        options: JsValue,
        reactive: JsValue,
    ) -> Result<PreviewSession, JsError> {
        let params = params_or_defaults(&template, params)?;
        let options: RenderOptions = from_js::<RenderOptions>(options, "options")?.with_overlay_styles(true);
        let reactive: ReactiveOptions = from_js(reactive, "reactive options")?;
        let controller = ReactiveController::with_clock(template, params, options, reactive, DateClock::new())
            .map_err(|e| JsError::new(&e.to_string()))?;
        Ok(PreviewSession { controller })
    }

    /// Sets the value at a dotted path, e.g. `bg.value`.
    pub fn set(&mut self, path: &str, value: JsValue) -> Result<(), JsError> {
        let value: JsonValue =
            serde_wasm_bindgen::from_value(value).map_err(|e| JsError::new(&format!("Invalid value: {}", e)))?;
        self.controller.set(path, value).map_err(|e| JsError::new(&e.to_string()))
    }

    /// Removes the value at a dotted path; returns whether it existed.
    pub fn remove(&mut self, path: &str) -> bool {
        self.controller.remove(path).is_some()
    }

    /// Renders if the debounce window has passed; returns whether the
    /// output changed.
    pub fn poll(&mut self) -> Result<bool, JsError> {
        self.controller.poll().map_err(|e| JsError::new(&e.to_string()))
    }

    /// Renders immediately and returns the output.
    #[wasm_bindgen(js_name = renderNow)]
    pub fn render_now(&mut self) -> Result<JsValue, JsError> {
        let output = self.controller.render_now().map_err(|e| JsError::new(&e.to_string()))?;
        to_js(output)
    }

    /// Milliseconds from session start until the pending render is due.
    #[wasm_bindgen(js_name = pendingDeadlineMs)]
    pub fn pending_deadline_ms(&self) -> Option<f64> {
        self.controller
            .pending_deadline()
            .map(|deadline| deadline.as_secs_f64() * 1000.0)
    }

    /// Current parameter set.
    pub fn params(&self) -> Result<JsValue, JsError> {
        to_js(self.controller.params())
    }

    /// Most recently committed output.
    pub fn output(&self) -> Result<JsValue, JsError> {
        to_js(self.controller.output())
    }

    /// Generation of the latest mutation.
    pub fn generation(&self) -> f64 {
        self.controller.generation() as f64
    }
}
