use serde::Serialize;

/// Directive (or pipeline step) that degraded during a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DirectiveKind {
    /// `{{expr}}` substitution.
    Token,
    /// `mbr-if`.
    If,
    /// `mbr-class`.
    Class,
    /// `mbr-style`.
    Style,
    /// Scoped stylesheet compilation.
    Stylesheet,
}

impl DirectiveKind {
    /// Attribute or marker name as written in templates.
    pub fn as_str(&self) -> &'static str {
        match self {
            DirectiveKind::Token => "{{}}",
            DirectiveKind::If => "mbr-if",
            DirectiveKind::Class => "mbr-class",
            DirectiveKind::Style => "mbr-style",
            DirectiveKind::Stylesheet => "styles",
        }
    }
}

/// A non-fatal problem recorded while rendering.
///
/// The render still succeeds; the affected directive fell back to its
/// falsy/empty branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderWarning {
    /// Directive that degraded.
    pub directive: DirectiveKind,
    /// Tag name of the element carrying the directive, when there is one.
    pub element: Option<String>,
    /// Human-readable cause.
    pub message: String,
}

impl RenderWarning {
    /// Creates a warning attached to an element.
    pub fn at_element(
        directive: DirectiveKind,
        element: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            directive,
            element: Some(element.into()),
            message: message.into(),
        }
    }

    /// Creates a warning not tied to an element.
    pub fn global(directive: DirectiveKind, message: impl Into<String>) -> Self {
        Self {
            directive,
            element: None,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for RenderWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.element {
            Some(element) => write!(
                f,
                "{} on <{}>: {}",
                self.directive.as_str(),
                element,
                self.message
            ),
            None => write!(f, "{}: {}", self.directive.as_str(), self.message),
        }
    }
}

/// Collection of render warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// Warnings in the order they were raised.
    pub warnings: Vec<RenderWarning>,
}

impl Diagnostics {
    /// Create a new empty diagnostics collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning and forwards it to the log.
    pub fn warn(&mut self, warning: RenderWarning) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Number of recorded warnings.
    pub fn count(&self) -> usize {
        self.warnings.len()
    }

    /// Appends every warning of another collection.
    pub fn extend(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_warnings() {
        let warning = RenderWarning::at_element(DirectiveKind::If, "div", "unexpected token");
        assert_eq!(warning.to_string(), "mbr-if on <div>: unexpected token");
        let global = RenderWarning::global(DirectiveKind::Stylesheet, "undefined variable @x");
        assert_eq!(global.to_string(), "styles: undefined variable @x");
    }

    #[test]
    fn collects_in_order() {
        let mut diagnostics = Diagnostics::new();
        assert!(!diagnostics.has_warnings());
        diagnostics.warn(RenderWarning::global(DirectiveKind::Class, "a"));
        diagnostics.warn(RenderWarning::global(DirectiveKind::Style, "b"));
        assert_eq!(diagnostics.count(), 2);
        assert_eq!(diagnostics.warnings[1].directive, DirectiveKind::Style);
    }
}
