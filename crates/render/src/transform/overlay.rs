use super::for_each_element;
use crate::dom::Node;

/// Class marking overlay elements.
pub const OVERLAY_CLASS: &str = "mbr-overlay";

/// Folds the `opacity` and `bg-color` attributes of overlay elements into
/// their inline style and removes both attributes.
pub fn apply_overlay_styles(mut node: Node) -> Node {
    for_each_element(&mut node, &mut |element| {
        if !element.has_class(OVERLAY_CLASS) {
            return;
        }
        let opacity = element.attr("opacity").filter(|v| !v.is_empty()).map(str::to_string);
        let color = element.attr("bg-color").filter(|v| !v.is_empty()).map(str::to_string);
        if opacity.is_none() && color.is_none() {
            return;
        }

        let mut parts = Vec::new();
        if let Some(opacity) = opacity {
            parts.push(format!("opacity: {}", opacity));
        }
        if let Some(color) = color {
            let color = hex_to_rgb(&color).unwrap_or(color);
            parts.push(format!("background-color: {}", color));
        }
        let style = match element.attr("style") {
            Some(existing) if !existing.is_empty() => {
                format!("{}; {};", existing, parts.join("; "))
            }
            _ => format!("{};", parts.join("; ")),
        };
        element.set_attr("style", style);
        element.remove_attr("opacity");
        element.remove_attr("bg-color");
    });
    node
}

/// Converts `#rgb` or `#rrggbb` to `rgb(r, g, b)`.
pub fn hex_to_rgb(color: &str) -> Option<String> {
    let hex = color.strip_prefix('#')?;
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return None,
    };
    let value = u32::from_str_radix(&expanded, 16).ok()?;
    Some(format!(
        "rgb({}, {}, {})",
        (value >> 16) & 255,
        (value >> 8) & 255,
        value & 255
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_fragment, serialize_node};

    #[test]
    fn converts_hex_colours() {
        assert_eq!(hex_to_rgb("#ff8000").as_deref(), Some("rgb(255, 128, 0)"));
        assert_eq!(hex_to_rgb("#0f0").as_deref(), Some("rgb(0, 255, 0)"));
        assert_eq!(hex_to_rgb("red"), None);
        assert_eq!(hex_to_rgb("#12345"), None);
    }

    #[test]
    fn folds_attributes_into_style() {
        let node = parse_fragment(
            r##"<div><div class="mbr-overlay" opacity="0.6" bg-color="#000000" style="top: 0"></div><div opacity="1"></div></div>"##,
        )
        .unwrap()
        .remove(0);
        assert_eq!(
            serialize_node(&apply_overlay_styles(node)),
            r#"<div><div class="mbr-overlay" style="top: 0; opacity: 0.6; background-color: rgb(0, 0, 0);"></div><div opacity="1"></div></div>"#
        );
    }

    #[test]
    fn leaves_bare_overlays_alone() {
        let node = parse_fragment(r#"<div class="mbr-overlay" opacity=""></div>"#).unwrap().remove(0);
        assert_eq!(
            serialize_node(&apply_overlay_styles(node)),
            r#"<div class="mbr-overlay" opacity></div>"#
        );
    }
}
