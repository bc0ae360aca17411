use mbrkit_core::Value;
use serde_json::Value as JsonValue;

/// Serializes a style object into nested stylesheet source.
///
/// Blocks are closed by comparing each key's depth with the depth of the key
/// written just before it, across the whole call. An empty object is closed
/// immediately. An empty array opens a block that is never closed; that
/// output is kept as is and fails to compile downstream.
pub fn stylespec_to_source(spec: &JsonValue) -> String {
    let mut writer = SourceWriter {
        out: String::new(),
        prev_depth: 0,
    };
    writer.entries(spec, 0);
    writer.out.trim().to_string()
}

struct SourceWriter {
    out: String,
    prev_depth: usize,
}

impl SourceWriter {
    fn entries(&mut self, value: &JsonValue, depth: usize) {
        match value {
            JsonValue::Object(map) => {
                for (key, child) in map {
                    self.entry(key, child, depth);
                }
            }
            JsonValue::Array(items) => {
                for (idx, child) in items.iter().enumerate() {
                    self.entry(&idx.to_string(), child, depth);
                }
            }
            _ => {}
        }
    }

    fn entry(&mut self, key: &str, value: &JsonValue, depth: usize) {
        let indent = "  ".repeat(depth);
        match value {
            JsonValue::Object(_) | JsonValue::Array(_) => {
                if !self.out.is_empty() {
                    self.out.push('\n');
                }
                self.out.push_str(&indent);
                self.out.push_str(key);
                self.out.push_str(" {\n");
                self.entries(value, depth + 1);
            }
            leaf => {
                self.out.push_str(&indent);
                self.out.push_str(key);
                self.out.push_str(": ");
                self.out.push_str(&Value::from_json(leaf).to_js_string());
                self.out.push_str(";\n");
            }
        }

        let empty_object = matches!(value, JsonValue::Object(map) if map.is_empty());
        if depth < self.prev_depth || empty_object {
            self.out.push_str(&indent);
            self.out.push_str("}\n");
        }
        self.prev_depth = depth;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn closes_blocks_by_depth_difference() {
        let spec = json!({
            ".a": {
                "color": "red",
                ".b": {
                    ".c": { "x": 1 },
                    "y": 2
                }
            },
            ".d": { "z": 0 }
        });
        assert_eq!(
            stylespec_to_source(&spec),
            ".a {\n  color: red;\n\n  .b {\n\n    .c {\n      x: 1;\n    }\n    y: 2;\n  }\n}\n\n.d {\n  z: 0;\n}"
        );
    }

    #[test]
    fn empty_object_closes_immediately() {
        let spec = json!({ ".a": {}, ".b": { "x": "1px" } });
        assert_eq!(stylespec_to_source(&spec), ".a {\n}\n\n.b {\n  x: 1px;\n}");
    }

    #[test]
    fn empty_array_leaves_block_open() {
        let spec = json!({ ".a": [], ".b": { "x": 1 } });
        assert_eq!(stylespec_to_source(&spec), ".a {\n\n.b {\n  x: 1;\n}");
    }

    #[test]
    fn leaves_use_script_string_form() {
        let spec = json!({ "a": true, "b": null, "c": 1.5, "d": "@var" });
        assert_eq!(
            stylespec_to_source(&spec),
            "a: true;\nb: null;\nc: 1.5;\nd: @var;"
        );
    }

    #[test]
    fn closes_every_level_on_the_way_out() {
        let spec = json!({ ".a": { ".b": { "x": 1 } }, ".c": { "y": 2 } });
        assert_eq!(
            stylespec_to_source(&spec),
            ".a {\n\n  .b {\n    x: 1;\n  }\n}\n\n.c {\n  y: 2;\n}"
        );
    }
}
