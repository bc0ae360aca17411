//! Initial parameter values derived from a component's declared controls.

use serde_json::{Map, Value as JsonValue, json};

use crate::schema::{Control, ControlKind, SchemaError, parse_parameters};

/// Parses the template's declaration block and derives its default parameters.
pub fn extract_defaults(template: &str) -> Result<JsonValue, SchemaError> {
    let schema = parse_parameters(template)?;
    Ok(defaults_for(&schema.controls))
}

/// Derives a default parameter map from an ordered control list.
///
/// Controls of unrecognized kinds, and controls without a name, produce no
/// entry.
pub fn defaults_for(controls: &[Control]) -> JsonValue {
    let mut params = Map::new();

    for control in controls {
        let Some(name) = control.name.as_deref() else {
            continue;
        };
        if let Some(value) = default_value(control) {
            params.insert(name.to_string(), value);
        }
    }

    JsonValue::Object(params)
}

fn default_value(control: &Control) -> Option<JsonValue> {
    match &control.kind {
        ControlKind::Checkbox => Some(JsonValue::Bool(control.attrs.checked)),
        ControlKind::Range => Some(range_default(control)),
        ControlKind::Color => Some(
            control
                .value
                .clone()
                .map(JsonValue::String)
                .unwrap_or(JsonValue::Null),
        ),
        ControlKind::Image | ControlKind::Video => Some(JsonValue::String(
            control.value.clone().unwrap_or_default(),
        )),
        ControlKind::Background => {
            let inputs = control.input_options();
            let selected = inputs
                .iter()
                .find(|input| input.attrs.selected)
                .or_else(|| inputs.first())?;
            Some(json!({
                "type": selected.kind.as_str(),
                "value": selected.value,
                "parallax": control.attrs.parallax,
            }))
        }
        ControlKind::Select => {
            let options = control.select_options();
            let selected = options
                .iter()
                .find(|option| option.selected)
                .or_else(|| options.first());
            Some(
                selected
                    .map(|option| JsonValue::String(option.value.clone()))
                    .unwrap_or(JsonValue::Null),
            )
        }
        _ => None,
    }
}

fn range_default(control: &Control) -> JsonValue {
    let raw = control
        .value
        .as_deref()
        .filter(|value| !value.is_empty())
        .or(control.attrs.min.as_deref());
    let number = raw.map(parse_number).unwrap_or(0.0);
    json_number(number)
}

/// Parses a declared numeric value the way a loose `Number(...)` cast would.
/// Blank text is zero; unparsable text is NaN, which [`json_number`] stores as
/// `null`.
fn parse_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"));
    if let Some(digits) = hex {
        return u64::from_str_radix(digits, 16).map_or(f64::NAN, |n| n as f64);
    }
    // `inf` and `nan` spellings parse too; both end up as `null`.
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// Stores whole numbers as integers so they serialize without a fraction.
/// Non-finite numbers become `null`, as `JSON.stringify` writes them.
pub(crate) fn json_number(number: f64) -> JsonValue {
    if number.fract() == 0.0 && number.abs() < 9.0e15 {
        JsonValue::from(number as i64)
    } else {
        serde_json::Number::from_f64(number)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null)
    }
}
