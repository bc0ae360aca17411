use mbrkit_core::expr::format_number;
use mbrkit_core::{PATH_PLACEHOLDER, Value};
use serde_json::Value as JsonValue;

/// Variables holding colour tokens, passed through without quoting.
pub const COLOR_VARIABLES: &[&str] = &[
    "hamburgerColor",
    "menuBgColor",
    "overlayColor",
    "cardColor",
    "tColor",
    "bgColor",
];

/// Flattens a parameter set into stylesheet variables.
///
/// Nested objects produce `parent-child` names; arrays are leaves. A nested
/// name that also exists as a top-level key takes the top-level value, and a
/// repeated name keeps its first position. When `bg` is an object its `type`
/// and `value` are normalized into `bg-type` and `bg-value`.
pub fn flatten_variables(params: &JsonValue) -> Vec<(String, String)> {
    let Some(top) = params.as_object() else {
        return Vec::new();
    };
    let mut top = top.clone();
    if let Some(JsonValue::Object(bg)) = top.get("bg").cloned() {
        let kind = bg.get("type").cloned().unwrap_or(JsonValue::Null);
        let kind = if Value::from_json(&kind).truthy() {
            kind
        } else {
            JsonValue::String(String::new())
        };
        let value = match bg.get("value") {
            None | Some(JsonValue::Null) => JsonValue::String(String::new()),
            Some(value) if kind == "color" => value.clone(),
            Some(value) => JsonValue::String(Value::from_json(value).to_js_string().into_owned()),
        };
        top.insert("bg-type".to_string(), kind);
        top.insert("bg-value".to_string(), value);
    }
    let top = JsonValue::Object(top);

    let mut flat: Vec<(String, String)> = Vec::new();
    collect(&top, &top, "", &mut flat);
    flat
}

fn collect(params: &JsonValue, node: &JsonValue, prefix: &str, flat: &mut Vec<(String, String)>) {
    let Some(map) = node.as_object() else {
        return;
    };
    for (key, value) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}-{}", prefix, key)
        };
        if value.is_object() {
            collect(params, value, &name, flat);
            continue;
        }
        let value = params.get(&name).unwrap_or(value);
        let rendered = variable_value(&name, value);
        match flat.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = rendered,
            None => flat.push((name, rendered)),
        }
    }
}

fn variable_value(name: &str, value: &JsonValue) -> String {
    let JsonValue::String(raw) = value else {
        return Value::from_json(value).to_js_string().into_owned();
    };
    let safe = raw.replace(PATH_PLACEHOLDER, "");
    if COLOR_VARIABLES.contains(&name) {
        return safe;
    }
    if name == "bg-value" {
        return if is_color_token(&safe) {
            safe
        } else {
            format!("\"{}\"", safe)
        };
    }
    if is_numeric(&safe) {
        return safe.parse::<f64>().map(format_number).unwrap_or(safe);
    }
    format!("\"{}\"", safe)
}

/// `^-?\d+(\.\d+)?$`
fn is_numeric(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let (int, frac) = match digits.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (digits, None),
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    all_digits(int) && frac.is_none_or(all_digits)
}

fn is_color_token(text: &str) -> bool {
    let trimmed = text.trim();
    let is_hex = trimmed.strip_prefix('#').is_some_and(|hex| {
        matches!(hex.len(), 3 | 6 | 8) && hex.bytes().all(|b| b.is_ascii_hexdigit())
    });
    let lower = text.trim_start().to_ascii_lowercase();
    let is_rgb = lower.starts_with("rgb(") || lower.starts_with("rgba(");
    let is_word = !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_alphabetic());
    is_hex || is_rgb || is_word
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flat(params: JsonValue) -> Vec<String> {
        flatten_variables(&params)
            .into_iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect()
    }

    #[test]
    fn quotes_strings_and_normalizes_numbers() {
        assert_eq!(
            flat(json!({
                "title": "Hello",
                "paddingTop": "007",
                "ratio": "-1.50",
                "fullScreen": true,
                "count": 3,
                "nothing": null,
                "image": "@PROJECT_PATH@/assets/a.jpg"
            })),
            [
                "title=\"Hello\"",
                "paddingTop=7",
                "ratio=-1.5",
                "fullScreen=true",
                "count=3",
                "nothing=null",
                "image=\"assets/a.jpg\""
            ]
        );
    }

    #[test]
    fn colour_variables_stay_raw() {
        assert_eq!(
            flat(json!({ "menuBgColor": "#fff", "other": "#fff" })),
            ["menuBgColor=#fff", "other=\"#fff\""]
        );
    }

    #[test]
    fn nested_objects_use_prefixed_names() {
        assert_eq!(
            flat(json!({ "card": { "width": "3", "style": { "radius": "4" } }, "list": [1, 2] })),
            ["card-width=3", "card-style-radius=4", "list=1,2"]
        );
    }

    #[test]
    fn top_level_keys_win_over_nested_names() {
        assert_eq!(
            flat(json!({ "a": { "b": "nested" }, "a-b": "top" })),
            ["a-b=\"top\""]
        );
    }

    #[test]
    fn background_objects_expose_type_and_value() {
        assert_eq!(
            flat(json!({ "bg": { "type": "color", "value": "#ffffff", "parallax": false } })),
            ["bg-type=\"color\"", "bg-value=#ffffff", "bg-parallax=false"]
        );
        assert_eq!(
            flat(json!({ "bg": { "type": "image", "value": "@PROJECT_PATH@/img/x.png" } })),
            ["bg-type=\"image\"", "bg-value=\"img/x.png\""]
        );
        assert_eq!(
            flat(json!({ "bg": { "type": null, "value": "rgba(0,0,0,.5)" } })),
            ["bg-type=\"\"", "bg-value=rgba(0,0,0,.5)"]
        );
    }
}
