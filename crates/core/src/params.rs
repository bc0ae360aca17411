//! ParameterSet helpers: dotted-path access and override merging.
//!
//! A parameter set is a JSON object. Paths address nested values with dots
//! (`bg.value`); a segment made of digits indexes into an array.

use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

/// Errors raised by path mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    /// The path had no segments.
    #[error("Parameter path is empty")]
    EmptyPath,
    /// A segment walked into a value that cannot hold children.
    #[error("Cannot descend into '{segment}' of parameter path '{path}'")]
    NotAContainer {
        /// Full path being resolved.
        path: String,
        /// Segment whose parent is a scalar.
        segment: String,
    },
    /// The parameter set itself is not an object.
    #[error("Parameter set must be an object")]
    InvalidRoot,
    /// An array index past the end; arrays only grow by appending.
    #[error("Index {index} of parameter path '{path}' is past the end of a {len}-item array")]
    IndexOutOfRange {
        /// Full path being resolved.
        path: String,
        /// Requested index.
        index: usize,
        /// Array length at the time of the write.
        len: usize,
    },
}

fn segments(path: &str) -> Vec<&str> {
    path.split('.')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Resolves a dotted path.
pub fn get_path<'a>(params: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    segments(path)
        .into_iter()
        .try_fold(params, |current, segment| child(current, segment))
}

fn child<'a>(value: &'a JsonValue, segment: &str) -> Option<&'a JsonValue> {
    match value {
        JsonValue::Object(map) => map.get(segment),
        JsonValue::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Writes `value` at a dotted path, creating intermediate objects as needed.
///
/// Returns the value previously stored at the path.
pub fn set_path(
    params: &mut JsonValue,
    path: &str,
    value: JsonValue,
) -> Result<Option<JsonValue>, ParamError> {
    let parts = segments(path);
    let Some((last, parents)) = parts.split_last() else {
        return Err(ParamError::EmptyPath);
    };
    if !params.is_object() {
        return Err(ParamError::InvalidRoot);
    }

    let mut current = params;
    for segment in parents {
        current = match current {
            JsonValue::Object(map) => map
                .entry(segment.to_string())
                .or_insert_with(|| JsonValue::Object(Map::new())),
            JsonValue::Array(items) => {
                let index = parse_index(path, segment)?;
                items.get_mut(index).ok_or_else(|| not_container(path, segment))?
            }
            _ => return Err(not_container(path, segment)),
        };
        if current.is_null() {
            *current = JsonValue::Object(Map::new());
        }
    }

    match current {
        JsonValue::Object(map) => Ok(map.insert(last.to_string(), value)),
        JsonValue::Array(items) => {
            let index = parse_index(path, last)?;
            let len = items.len();
            if index < len {
                Ok(Some(std::mem::replace(&mut items[index], value)))
            } else if index == len {
                items.push(value);
                Ok(None)
            } else {
                Err(ParamError::IndexOutOfRange {
                    path: path.to_string(),
                    index,
                    len,
                })
            }
        }
        _ => Err(not_container(path, last)),
    }
}

/// Removes the value at a dotted path, returning it when present.
pub fn remove_path(params: &mut JsonValue, path: &str) -> Option<JsonValue> {
    let parts = segments(path);
    let (last, parents) = parts.split_last()?;

    let mut current = params;
    for segment in parents {
        current = match current {
            JsonValue::Object(map) => map.get_mut(*segment)?,
            JsonValue::Array(items) => items.get_mut(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    match current {
        JsonValue::Object(map) => map.shift_remove(*last),
        JsonValue::Array(items) => {
            let index = last.parse::<usize>().ok()?;
            (index < items.len()).then(|| items.remove(index))
        }
        _ => None,
    }
}

fn parse_index(path: &str, segment: &str) -> Result<usize, ParamError> {
    segment.parse().map_err(|_| not_container(path, segment))
}

fn not_container(path: &str, segment: &str) -> ParamError {
    ParamError::NotAContainer {
        path: path.to_string(),
        segment: segment.to_string(),
    }
}

/// Merges stored overrides over a base parameter set.
///
/// The merge is shallow: a top-level key present in `overrides` replaces the
/// base value wholesale, nested objects included. Non-object inputs are
/// treated as empty.
pub fn merge_overrides(base: &JsonValue, overrides: &JsonValue) -> JsonValue {
    let mut merged = base.as_object().cloned().unwrap_or_default();
    if let Some(incoming) = overrides.as_object() {
        for (key, value) in incoming {
            merged.insert(key.clone(), value.clone());
        }
    }
    JsonValue::Object(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_nested_paths() {
        let params = json!({"bg": {"type": "color", "value": "#fff"}, "list": [1, 2]});
        assert_eq!(get_path(&params, "bg.value"), Some(&json!("#fff")));
        assert_eq!(get_path(&params, "list.1"), Some(&json!(2)));
        assert_eq!(get_path(&params, "bg.missing"), None);
        assert_eq!(get_path(&params, "bg.value.deeper"), None);
    }

    #[test]
    fn set_creates_intermediate_objects() {
        let mut params = json!({});
        assert_eq!(set_path(&mut params, "overlay.opacity", json!(0.5)), Ok(None));
        assert_eq!(params, json!({"overlay": {"opacity": 0.5}}));

        let previous = set_path(&mut params, "overlay.opacity", json!(0.7)).unwrap();
        assert_eq!(previous, Some(json!(0.5)));
    }

    #[test]
    fn set_through_scalar_fails() {
        let mut params = json!({"title": "x"});
        let err = set_path(&mut params, "title.size", json!(1)).unwrap_err();
        assert!(matches!(err, ParamError::NotAContainer { .. }), "{err:?}");
        assert_eq!(set_path(&mut params, " . ", json!(1)), Err(ParamError::EmptyPath));
    }

    #[test]
    fn array_writes_overwrite_or_append() {
        let mut params = json!({"items": ["a"]});
        assert_eq!(set_path(&mut params, "items.0", json!("b")), Ok(Some(json!("a"))));
        assert_eq!(set_path(&mut params, "items.1", json!("c")), Ok(None));
        assert_eq!(params, json!({"items": ["b", "c"]}));

        let huge = format!("items.{}", usize::MAX - 1);
        assert_eq!(
            set_path(&mut params, &huge, json!(1)),
            Err(ParamError::IndexOutOfRange {
                path: huge.clone(),
                index: usize::MAX - 1,
                len: 2,
            })
        );
        assert!(matches!(
            set_path(&mut params, "items.3", json!(1)),
            Err(ParamError::IndexOutOfRange { index: 3, len: 2, .. })
        ));
        assert_eq!(params, json!({"items": ["b", "c"]}));
    }

    #[test]
    fn remove_keeps_sibling_order() {
        let mut params = json!({"a": 1, "b": {"x": 1, "y": 2}, "c": 3});
        assert_eq!(remove_path(&mut params, "b.x"), Some(json!(1)));
        assert_eq!(remove_path(&mut params, "a"), Some(json!(1)));
        assert_eq!(remove_path(&mut params, "nope.x"), None);
        let keys: Vec<&String> = params.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["b", "c"]);
    }

    #[test]
    fn merge_is_shallow() {
        let base = json!({"bg": {"type": "color", "value": "#fff"}, "size": 1});
        let stored = json!({"bg": {"type": "image"}, "extra": true});
        let merged = merge_overrides(&base, &stored);
        assert_eq!(
            merged,
            json!({"bg": {"type": "image"}, "size": 1, "extra": true})
        );
    }
}
