use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Options for a single component render.
///
/// Deserializes from snake_case, camelCase, and the legacy names
/// `PROJECT_PATH` and `cid`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Replacement for the `@PROJECT_PATH@/` placeholder in path attributes.
    #[serde(alias = "PROJECT_PATH", alias = "pathPrefix")]
    pub path_prefix: String,
    /// Nested-rule style tree compiled into scoped CSS.
    pub styles: Option<JsonValue>,
    /// Component scope id; drives the `cid-<id>` class and CSS scoping.
    #[serde(alias = "cid", alias = "scopeId")]
    pub scope_id: Option<String>,
    /// Element id applied to a scoped `section` root.
    pub anchor: Option<String>,
    /// Folds `opacity`/`bg-color` attributes of `.mbr-overlay` elements into
    /// inline style.
    #[serde(alias = "overlayStyles")]
    pub overlay_styles: bool,
}

impl RenderOptions {
    /// Options with every field unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the path prefix.
    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = prefix.into();
        self
    }

    /// Sets the style tree.
    pub fn with_styles(mut self, styles: JsonValue) -> Self {
        self.styles = Some(styles);
        self
    }

    /// Sets the scope id.
    pub fn with_scope_id(mut self, scope_id: impl Into<String>) -> Self {
        self.scope_id = Some(scope_id.into());
        self
    }

    /// Sets the anchor id.
    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }

    /// Enables overlay attribute folding.
    pub fn with_overlay_styles(mut self, enabled: bool) -> Self {
        self.overlay_styles = enabled;
        self
    }

    /// Scope id, treating an empty string as unset.
    pub fn scope(&self) -> Option<&str> {
        self.scope_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Anchor, treating an empty string as unset.
    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref().filter(|anchor| !anchor.is_empty())
    }

    /// Style tree, treating `null` as unset.
    pub fn style_spec(&self) -> Option<&JsonValue> {
        self.styles.as_ref().filter(|styles| !styles.is_null())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_legacy_names() {
        let options: RenderOptions = serde_json::from_value(json!({
            "PROJECT_PATH": "/assets/",
            "cid": "ab12",
            "styles": {"color": "red"}
        }))
        .unwrap();
        assert_eq!(options.path_prefix, "/assets/");
        assert_eq!(options.scope(), Some("ab12"));
        assert!(options.style_spec().is_some());
        assert!(!options.overlay_styles);
    }

    #[test]
    fn empty_values_count_as_unset() {
        let options = RenderOptions::new().with_scope_id("").with_anchor("");
        assert_eq!(options.scope(), None);
        assert_eq!(options.anchor(), None);
        let options: RenderOptions = serde_json::from_value(json!({"styles": null})).unwrap();
        assert!(options.style_spec().is_none());
    }
}
