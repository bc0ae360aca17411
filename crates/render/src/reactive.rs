//! Live re-rendering of one component as its parameters change.
//!
//! The controller owns the parameter set and only lets it change through its
//! patch API. Every mutation bumps a generation counter and pushes the render
//! deadline one debounce window into the future; the host calls [`poll`]
//! from its timer and a render happens once the window has passed without
//! further mutations. Hosts that render off the main loop use [`take_due`]
//! and [`commit`] instead, and stale results are rejected by generation.
//!
//! [`poll`]: ReactiveController::poll
//! [`take_due`]: ReactiveController::take_due
//! [`commit`]: ReactiveController::commit

use std::time::{Duration, Instant};

use mbrkit_core::{ParamError, get_path, remove_path, set_path};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::options::RenderOptions;
use crate::renderer::{RenderError, RenderedOutput, render_component};

/// Monotonic time source, as an offset from an arbitrary origin.
pub trait Clock {
    /// Current time.
    fn now(&self) -> Duration;
}

/// [`Clock`] backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// A clock starting at zero now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Controller settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReactiveOptions {
    /// Quiet period after the last mutation before re-rendering.
    #[serde(alias = "debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for ReactiveOptions {
    fn default() -> Self {
        Self { debounce_ms: 100 }
    }
}

/// A render captured by [`ReactiveController::take_due`], to be run anywhere
/// and handed back through [`ReactiveController::commit`].
#[derive(Debug, Clone)]
pub struct RenderJob {
    /// Generation of the parameters captured in this job.
    pub generation: u64,
    template: String,
    params: JsonValue,
    options: RenderOptions,
}

impl RenderJob {
    /// Renders the captured snapshot.
    pub fn run(&self) -> Result<RenderedOutput, RenderError> {
        render_component(&self.template, &self.params, &self.options)
    }
}

/// Debounced re-rendering of one component.
#[derive(Debug)]
pub struct ReactiveController<C: Clock = SystemClock> {
    template: String,
    params: JsonValue,
    options: RenderOptions,
    clock: C,
    debounce: Duration,
    deadline: Option<Duration>,
    generation: u64,
    committed: u64,
    output: RenderedOutput,
}

impl ReactiveController<SystemClock> {
    /// Creates a controller on the system clock and renders once.
    pub fn new(
        template: impl Into<String>,
        params: JsonValue,
        options: RenderOptions,
    ) -> Result<Self, RenderError> {
        Self::with_clock(
            template,
            params,
            options,
            ReactiveOptions::default(),
            SystemClock::new(),
        )
    }
}

impl<C: Clock> ReactiveController<C> {
    /// Creates a controller on `clock` and renders once.
    pub fn with_clock(
        template: impl Into<String>,
        params: JsonValue,
        options: RenderOptions,
        reactive: ReactiveOptions,
        clock: C,
    ) -> Result<Self, RenderError> {
        let template = template.into();
        let output = render_component(&template, &params, &options)?;
        Ok(Self {
            template,
            params,
            options,
            clock,
            debounce: Duration::from_millis(reactive.debounce_ms),
            deadline: None,
            generation: 0,
            committed: 0,
            output,
        })
    }

    /// Current parameters.
    pub fn params(&self) -> &JsonValue {
        &self.params
    }

    /// Most recently committed output.
    pub fn output(&self) -> &RenderedOutput {
        &self.output
    }

    /// Render options.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Generation of the latest mutation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Generation of the committed output.
    pub fn committed_generation(&self) -> u64 {
        self.committed
    }

    /// When the pending render becomes due, if one is pending.
    pub fn pending_deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Sets the value at a dotted path.
    pub fn set(&mut self, path: &str, value: JsonValue) -> Result<(), ParamError> {
        set_path(&mut self.params, path, value)?;
        self.touch();
        Ok(())
    }

    /// Removes the value at a dotted path, returning it.
    pub fn remove(&mut self, path: &str) -> Option<JsonValue> {
        let removed = remove_path(&mut self.params, path)?;
        self.touch();
        Some(removed)
    }

    /// A handle on a nested path whose mutations go through this controller.
    pub fn at(&mut self, path: &str) -> ParamHandle<'_, C> {
        ParamHandle {
            controller: self,
            path: path.to_string(),
        }
    }

    fn touch(&mut self) {
        self.generation += 1;
        self.deadline = Some(self.clock.now() + self.debounce);
        log::trace!("generation {} due in {:?}", self.generation, self.debounce);
    }

    /// Captures the pending render once its deadline has passed.
    pub fn take_due(&mut self) -> Option<RenderJob> {
        let deadline = self.deadline?;
        if self.clock.now() < deadline {
            return None;
        }
        self.deadline = None;
        Some(self.snapshot())
    }

    fn snapshot(&self) -> RenderJob {
        RenderJob {
            generation: self.generation,
            template: self.template.clone(),
            params: self.params.clone(),
            options: self.options.clone(),
        }
    }

    /// Installs the output of a render. Returns `false` and keeps the current
    /// output when `generation` is older than the committed one.
    pub fn commit(&mut self, generation: u64, output: RenderedOutput) -> bool {
        if generation < self.committed {
            log::debug!(
                "discarding render of generation {} (committed {})",
                generation,
                self.committed
            );
            return false;
        }
        self.committed = generation;
        self.output = output;
        true
    }

    /// Renders when the debounce window has passed. Returns whether a new
    /// output was committed.
    pub fn poll(&mut self) -> Result<bool, RenderError> {
        let Some(job) = self.take_due() else {
            return Ok(false);
        };
        let output = job.run()?;
        Ok(self.commit(job.generation, output))
    }

    /// Renders immediately, cancelling any pending deadline.
    pub fn render_now(&mut self) -> Result<&RenderedOutput, RenderError> {
        self.deadline = None;
        let job = self.snapshot();
        let output = job.run()?;
        self.commit(job.generation, output);
        Ok(&self.output)
    }
}

/// Path-scoped view of a controller's parameters.
pub struct ParamHandle<'c, C: Clock> {
    controller: &'c mut ReactiveController<C>,
    path: String,
}

impl<C: Clock> ParamHandle<'_, C> {
    fn join(&self, path: &str) -> String {
        if self.path.is_empty() {
            path.to_string()
        } else {
            format!("{}.{}", self.path, path)
        }
    }

    /// A handle on a path below this one.
    pub fn at(self, path: &str) -> Self {
        let path = self.join(path);
        Self {
            controller: self.controller,
            path,
        }
    }

    /// The current value.
    pub fn get(&self) -> Option<&JsonValue> {
        get_path(&self.controller.params, &self.path)
    }

    /// Replaces the value.
    pub fn set(&mut self, value: JsonValue) -> Result<(), ParamError> {
        self.controller.set(&self.path, value)
    }

    /// Sets a child of the value.
    pub fn set_child(&mut self, key: &str, value: JsonValue) -> Result<(), ParamError> {
        let path = self.join(key);
        self.controller.set(&path, value)
    }

    /// Removes the value.
    pub fn remove(&mut self) -> Option<JsonValue> {
        self.controller.remove(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct ManualClock(Rc<Cell<u64>>);

    impl ManualClock {
        fn advance(&self, ms: u64) {
            self.0.set(self.0.get() + ms);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Duration {
            Duration::from_millis(self.0.get())
        }
    }

    const TEMPLATE: &str = r#"<section><h1 mbr-if="show">{{title}}</h1><p>{{bg.value}}</p></section>"#;

    fn controller(clock: &ManualClock) -> ReactiveController<ManualClock> {
        ReactiveController::with_clock(
            TEMPLATE,
            json!({ "show": true, "title": "A", "bg": { "value": "#fff" } }),
            RenderOptions::new(),
            ReactiveOptions::default(),
            clock.clone(),
        )
        .unwrap()
    }

    #[test]
    fn renders_on_construction() {
        let clock = ManualClock::default();
        let controller = controller(&clock);
        assert_eq!(
            controller.output().html,
            "<section><h1>A</h1><p>#fff</p></section>"
        );
        assert_eq!(controller.pending_deadline(), None);
    }

    #[test]
    fn bursts_coalesce_into_one_render() {
        let clock = ManualClock::default();
        let mut controller = controller(&clock);
        let mut renders = 0;
        for title in ["B", "C", "D", "E", "F"] {
            controller.set("title", json!(title)).unwrap();
            clock.advance(60);
            if controller.poll().unwrap() {
                renders += 1;
            }
        }
        assert_eq!(renders, 0);
        assert_eq!(controller.generation(), 5);
        clock.advance(40);
        if controller.poll().unwrap() {
            renders += 1;
        }
        clock.advance(500);
        if controller.poll().unwrap() {
            renders += 1;
        }
        assert_eq!(renders, 1);
        assert_eq!(controller.output().html, "<section><h1>F</h1><p>#fff</p></section>");
        assert_eq!(controller.committed_generation(), 5);
    }

    #[test]
    fn nested_handles_route_through_the_patch_api() {
        let clock = ManualClock::default();
        let mut controller = controller(&clock);
        {
            let mut bg = controller.at("bg");
            assert_eq!(bg.get(), Some(&json!({ "value": "#fff" })));
            bg.set_child("value", json!("#000")).unwrap();
        }
        controller.at("bg").at("value").set(json!("#111")).unwrap();
        assert_eq!(controller.generation(), 2);
        assert_eq!(controller.pending_deadline(), Some(Duration::from_millis(100)));
        controller.render_now().unwrap();
        assert_eq!(controller.output().html, "<section><h1>A</h1><p>#111</p></section>");
        assert_eq!(controller.pending_deadline(), None);
    }

    #[test]
    fn removing_a_parameter_rerenders() {
        let clock = ManualClock::default();
        let mut controller = controller(&clock);
        assert_eq!(controller.remove("show"), Some(json!(true)));
        assert_eq!(controller.remove("missing"), None);
        assert_eq!(controller.generation(), 1);
        clock.advance(100);
        assert!(controller.poll().unwrap());
        assert_eq!(controller.output().html, "<section><p>#fff</p></section>");
    }

    #[test]
    fn stale_commits_are_rejected() {
        let clock = ManualClock::default();
        let mut controller = controller(&clock);
        controller.set("title", json!("old")).unwrap();
        clock.advance(100);
        let slow = controller.take_due().unwrap();

        controller.set("title", json!("new")).unwrap();
        clock.advance(100);
        let fast = controller.take_due().unwrap();
        assert!(controller.commit(fast.generation, fast.run().unwrap()));
        assert!(!controller.commit(slow.generation, slow.run().unwrap()));
        assert_eq!(controller.output().html, "<section><h1>new</h1><p>#fff</p></section>");
    }

    #[test]
    fn options_deserialize_with_default_window() {
        let options: ReactiveOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.debounce_ms, 100);
        let options: ReactiveOptions = serde_json::from_str(r#"{"debounceMs": 250}"#).unwrap();
        assert_eq!(options.debounce_ms, 250);
    }
}
