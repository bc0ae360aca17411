use lol_html::{RewriteStrSettings, element, rewrite_str};
use mbrkit_core::{DECLARATION_TAG, PATH_PLACEHOLDER};

/// Attributes whose placeholder paths are rewritten.
pub const PATH_ATTRS: &[&str] = &["src", "href", "data-src", "data-bg", "data-poster"];

/// Drops every declaration block and rewrites placeholder paths.
///
/// Only [`PATH_ATTRS`] values that begin with the placeholder are touched;
/// every occurrence of the placeholder inside such a value is replaced.
pub fn prepare(template: &str, path_prefix: &str) -> Result<String, lol_html::errors::RewritingError> {
    let selector = PATH_ATTRS
        .iter()
        .map(|attr| format!("[{}]", attr))
        .collect::<Vec<_>>()
        .join(", ");

    let handlers = vec![
        element!(DECLARATION_TAG, |el| {
            el.remove();
            Ok(())
        }),
        element!(selector, move |el| {
            for name in PATH_ATTRS {
                if let Some(value) = el.get_attribute(name)
                    && value.starts_with(PATH_PLACEHOLDER)
                {
                    el.set_attribute(name, &value.replace(PATH_PLACEHOLDER, path_prefix))?;
                }
            }
            Ok(())
        }),
    ];

    rewrite_str(
        template,
        RewriteStrSettings {
            element_content_handlers: handlers,
            ..RewriteStrSettings::new()
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_declaration_block() {
        let out = prepare(
            "<mbr-parameters><input type=\"checkbox\" name=\"a\"></mbr-parameters><section>x</section>",
            "",
        )
        .unwrap();
        assert_eq!(out, "<section>x</section>");
    }

    #[test]
    fn rewrites_only_whitelisted_attributes() {
        let out = prepare(
            r#"<img src="@PROJECT_PATH@/a.png" alt="@PROJECT_PATH@/a.png" data-bg="x @PROJECT_PATH@/b.png">"#,
            "/p/",
        )
        .unwrap();
        assert_eq!(
            out,
            r#"<img src="/p/a.png" alt="@PROJECT_PATH@/a.png" data-bg="x @PROJECT_PATH@/b.png">"#
        );
    }

    #[test]
    fn replaces_every_occurrence_in_a_matching_value() {
        let out = prepare(r#"<a href="@PROJECT_PATH@/a#@PROJECT_PATH@/b"></a>"#, "").unwrap();
        assert_eq!(out, r#"<a href="a#b"></a>"#);
    }
}
