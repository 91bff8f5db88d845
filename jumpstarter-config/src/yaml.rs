//! Minimal YAML emission for the Jumpstarter manifest.
//!
//! This is deliberately not a YAML library. The only document this service
//! ever serializes is the fixed-shape Jumpstarter custom resource, so the
//! emitter supports exactly the restricted value model that document needs:
//! null, booleans, numbers, strings, ordered maps, and lists. Anything
//! outside that model is outside the contract.

use serde_json::Value;

/// Serializes `value` as a YAML block starting at the given indentation
/// level.
///
/// Maps render one key per line; map- or list-valued entries open a nested
/// block on the following lines. List elements render as `- value` for
/// scalars, or as a bare `-` followed by a nested block. Indentation is two
/// spaces per level.
///
/// The function is total over the supported model and never fails.
pub fn emit(value: &Value, indent: usize) -> String {
    let pad = "  ".repeat(indent);
    let mut lines = Vec::new();

    match value {
        Value::Object(map) => {
            for (key, value) in map {
                match value {
                    Value::Object(_) | Value::Array(_) => {
                        lines.push(format!("{pad}{key}:"));
                        lines.push(emit(value, indent + 1));
                    }
                    scalar => lines.push(format!("{pad}{key}: {}", scalar_text(scalar))),
                }
            }
        }

        Value::Array(items) => {
            for item in items {
                match item {
                    Value::Object(_) | Value::Array(_) => {
                        lines.push(format!("{pad}-"));
                        lines.push(emit(item, indent + 1));
                    }
                    scalar => lines.push(format!("{pad}- {}", scalar_text(scalar))),
                }
            }
        }

        scalar => lines.push(format!("{pad}{}", scalar_text(scalar))),
    }

    lines.join("\n")
}

/// Formats a scalar for inline YAML output.
///
/// Strings containing `:` or `#`, or starting with `-`, are wrapped in
/// double quotes verbatim. Embedded double quotes are not escaped; callers
/// must avoid such inputs.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => if *b { "true" } else { "false" }.to_string(),
        Value::String(s) => {
            if s.contains(':') || s.contains('#') || s.starts_with('-') {
                format!("\"{s}\"")
            } else {
                s.clone()
            }
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod test {
    use super::emit;
    use serde_json::json;

    #[test]
    fn nested_map() {
        let value = json!({"a": "b", "c": {"d": 1}});
        assert_eq!(emit(&value, 0), "a: b\nc:\n  d: 1");
    }

    #[test]
    fn quotes_strings_that_would_misparse() {
        assert_eq!(emit(&json!({"k": "x:y"}), 0), "k: \"x:y\"");
        assert_eq!(emit(&json!({"k": "a#b"}), 0), "k: \"a#b\"");
        assert_eq!(emit(&json!({"k": "-flag"}), 0), "k: \"-flag\"");
    }

    #[test]
    fn plain_strings_pass_through_unquoted() {
        assert_eq!(emit(&json!({"k": "example.com"}), 0), "k: example.com");
    }

    #[test]
    fn scalar_variants() {
        let value = json!({"n": null, "t": true, "f": false, "i": 42});
        assert_eq!(emit(&value, 0), "n: null\nt: true\nf: false\ni: 42");
    }

    #[test]
    fn lists_of_scalars_and_maps() {
        let value = json!({"xs": ["a", "b"], "ys": [{"k": "v"}]});
        assert_eq!(emit(&value, 0), "xs:\n  - a\n  - b\nys:\n  -\n    k: v");
    }

    #[test]
    fn indentation_offsets_the_whole_block() {
        let value = json!({"a": "b"});
        assert_eq!(emit(&value, 2), "    a: b");
    }

    #[test]
    fn round_trips_through_a_conformant_parser() {
        let value = json!({
            "apiVersion": "jumpstarter.dev/v1alpha1",
            "kind": "Jumpstarter",
            "metadata": {"name": "jumpstarter", "namespace": "default"},
            "spec": {
                "baseDomain": "x:y",
                "replicas": 3,
                "enabled": true,
                "tags": ["edge", "lab"],
            },
        });

        let parsed: serde_json::Value =
            serde_yaml::from_str(&emit(&value, 0)).expect("emitted YAML must parse");
        assert_eq!(parsed, value);
    }
}
