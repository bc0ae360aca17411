//! Built-in functions. Unknown names are left to the caller, which prints the
//! call unchanged.

use super::value::{Color, LessValue};
use crate::style::StyleError;

/// Evaluates a built-in; `Ok(None)` when `name` is not one or the arguments
/// are not plain values (for example `rgba(var(--x), 1)`).
pub fn call(name: &str, args: &[LessValue]) -> Result<Option<LessValue>, StyleError> {
    let value = match name.to_ascii_lowercase().as_str() {
        "rgb" => rgb(args, false),
        "rgba" => rgb(args, true),
        "fade" => {
            let (color, amount) = color_and_amount(name, args)?;
            Some(LessValue::Color(Color {
                a: amount / 100.0,
                original: None,
                ..color
            }))
        }
        "lighten" => Some(adjust_lightness(name, args, 1.0)?),
        "darken" => Some(adjust_lightness(name, args, -1.0)?),
        _ => None,
    };
    Ok(value)
}

fn channel(value: &LessValue) -> Option<f64> {
    match value {
        LessValue::Dimension { value, unit } if unit == "%" => Some(value * 2.55),
        LessValue::Dimension { value, .. } => Some(*value),
        _ => None,
    }
}

fn alpha(value: &LessValue) -> Option<f64> {
    match value {
        LessValue::Dimension { value, unit } if unit == "%" => Some(value / 100.0),
        LessValue::Dimension { value, .. } => Some(*value),
        _ => None,
    }
}

fn rgb(args: &[LessValue], with_alpha: bool) -> Option<LessValue> {
    let color = match args {
        [r, g, b] => Color::rgba(channel(r)?, channel(g)?, channel(b)?, 1.0),
        [r, g, b, a] if with_alpha => Color::rgba(channel(r)?, channel(g)?, channel(b)?, alpha(a)?),
        [LessValue::Color(color), a] if with_alpha => Color {
            a: alpha(a)?,
            original: None,
            ..color.clone()
        },
        _ => return None,
    };
    Some(LessValue::Color(color))
}

fn color_and_amount(name: &str, args: &[LessValue]) -> Result<(Color, f64), StyleError> {
    match args {
        [LessValue::Color(color), LessValue::Dimension { value, .. }] => Ok((color.clone(), *value)),
        _ => Err(StyleError::FunctionArguments(name.to_string())),
    }
}

fn adjust_lightness(name: &str, args: &[LessValue], sign: f64) -> Result<LessValue, StyleError> {
    let (color, amount) = color_and_amount(name, args)?;
    let (h, s, l) = color.to_hsl();
    Ok(LessValue::Color(Color::from_hsl(
        h,
        s,
        l + sign * amount / 100.0,
        color.a,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(text: &str) -> LessValue {
        LessValue::Color(Color::from_hex(text).unwrap())
    }

    fn css(value: Option<LessValue>) -> String {
        value.unwrap().to_css()
    }

    #[test]
    fn builds_colours() {
        let args = [
            LessValue::dimension(255.0, ""),
            LessValue::dimension(0.0, ""),
            LessValue::dimension(0.0, ""),
            LessValue::dimension(0.25, ""),
        ];
        assert_eq!(css(call("rgba", &args).unwrap()), "rgba(255, 0, 0, 0.25)");
        assert_eq!(css(call("rgb", &args[..3]).unwrap()), "#ff0000");
        assert_eq!(
            css(call("rgba", &[hex("#000"), LessValue::dimension(50.0, "%")]).unwrap()),
            "rgba(0, 0, 0, 0.5)"
        );
    }

    #[test]
    fn non_numeric_channels_pass_through() {
        let args = [LessValue::Keyword("var(--c)".to_string()), LessValue::dimension(1.0, "")];
        assert_eq!(call("rgba", &args).unwrap(), None);
        assert_eq!(call("translate", &args).unwrap(), None);
    }

    #[test]
    fn fade_sets_alpha_from_percentage() {
        let out = call("fade", &[hex("#ffffff"), LessValue::dimension(40.0, "%")]).unwrap();
        assert_eq!(css(out), "rgba(255, 255, 255, 0.4)");
    }

    #[test]
    fn lighten_and_darken() {
        let darker = call("darken", &[hex("#808080"), LessValue::dimension(10.0, "%")]).unwrap();
        assert_eq!(css(darker), "#666666");
        let lighter = call("lighten", &[hex("#000"), LessValue::dimension(100.0, "%")]).unwrap();
        assert_eq!(css(lighter), "#ffffff");
    }

    #[test]
    fn rejects_wrong_argument_types() {
        assert_eq!(
            call("fade", &[LessValue::Keyword("x".to_string())]),
            Err(StyleError::FunctionArguments("fade".to_string()))
        );
    }
}
