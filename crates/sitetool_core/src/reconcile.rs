//! Structural merge of locale trees.
//!
//! The reference tree drives the walk. Target values that are present and
//! non-empty always win, except where the reference expects a container and
//! the target holds something else. Every filled location is recorded at the
//! highest node that was copied wholesale: a missing key holding an array is
//! reported once as `a.c`, while indices appended to an existing target array
//! are reported one by one as `a.c[3]`. A slot that is empty on both sides
//! is left as the target has it and is not reported.

use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub merged: Value,
    pub filled_paths: Vec<String>,
}

impl Reconciled {
    pub fn is_complete(&self) -> bool {
        self.filled_paths.is_empty()
    }
}

pub fn reconcile(reference: &Value, target: &Value) -> Reconciled {
    let mut filled_paths = Vec::new();
    let merged = merge_value(reference, Some(target), "", &mut filled_paths);
    Reconciled {
        merged,
        filled_paths,
    }
}

/// Empty string, `null` and a missing key all mean "not translated yet".
pub fn is_absent(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.is_empty(),
        Some(_) => false,
    }
}

fn merge_value(
    reference: &Value,
    target: Option<&Value>,
    path: &str,
    filled: &mut Vec<String>,
) -> Value {
    let target = match target {
        Some(value) if !is_absent(Some(value)) => value,
        // Both sides empty: nothing to fill, keep the target's own form.
        Some(value) if is_absent(Some(reference)) => return value.clone(),
        _ => {
            filled.push(path.to_string());
            return reference.clone();
        }
    };

    match reference {
        Value::Array(reference_items) => {
            let Value::Array(target_items) = target else {
                filled.push(path.to_string());
                return reference.clone();
            };
            Value::Array(merge_array(reference_items, target_items, path, filled))
        }
        Value::Object(reference_map) => {
            let Value::Object(target_map) = target else {
                filled.push(path.to_string());
                return reference.clone();
            };
            Value::Object(merge_object(reference_map, target_map, path, filled))
        }
        _ => target.clone(),
    }
}

fn merge_object(
    reference: &Map<String, Value>,
    target: &Map<String, Value>,
    path: &str,
    filled: &mut Vec<String>,
) -> Map<String, Value> {
    let mut merged = target.clone();
    for (key, reference_child) in reference {
        let child_path = join_key(path, key);
        let next = merge_value(reference_child, target.get(key), &child_path, filled);
        merged.insert(key.clone(), next);
    }
    merged
}

fn merge_array(
    reference: &[Value],
    target: &[Value],
    path: &str,
    filled: &mut Vec<String>,
) -> Vec<Value> {
    let mut merged = Vec::with_capacity(reference.len().max(target.len()));
    for (index, reference_item) in reference.iter().enumerate() {
        let item_path = join_index(path, index);
        let next = match (reference_item, target.get(index)) {
            (_, None) => {
                filled.push(item_path);
                reference_item.clone()
            }
            // Primitive entries are authoritative once the target has them.
            (Value::Object(_) | Value::Array(_), Some(existing)) => {
                merge_value(reference_item, Some(existing), &item_path, filled)
            }
            (_, Some(existing)) if is_absent(Some(existing)) => {
                if is_absent(Some(reference_item)) {
                    existing.clone()
                } else {
                    filled.push(item_path);
                    reference_item.clone()
                }
            }
            (_, Some(existing)) => existing.clone(),
        };
        merged.push(next);
    }
    if target.len() > reference.len() {
        merged.extend(target[reference.len()..].iter().cloned());
    }
    merged
}

pub fn join_key(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

pub fn join_index(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::{is_absent, reconcile};

    #[test]
    fn fills_empty_and_missing_values_from_reference() {
        let reference = json!({"a": {"b": "hello", "c": [1, 2, 3]}});
        let target = json!({"a": {"b": ""}});

        let outcome = reconcile(&reference, &target);
        assert_eq!(outcome.merged, reference);
        assert_eq!(outcome.filled_paths, vec!["a.b", "a.c"]);
    }

    #[test]
    fn appends_missing_array_entries_per_index() {
        let reference = json!({"a": {"c": [1, 2, 3]}});
        let target = json!({"a": {"c": [10]}});

        let outcome = reconcile(&reference, &target);
        assert_eq!(outcome.merged, json!({"a": {"c": [10, 2, 3]}}));
        assert_eq!(outcome.filled_paths, vec!["a.c[1]", "a.c[2]"]);
    }

    #[test]
    fn keeps_localized_values_and_extra_keys() {
        let reference = json!({
            "hero": {"title": "Build faster", "cta": "Book a call"},
            "footer": "All rights reserved"
        });
        let target = json!({
            "hero": {"title": "Schneller bauen", "badge": "Neu"},
            "footer": "Alle Rechte vorbehalten",
            "legal": {"imprint": "Impressum"}
        });

        let outcome = reconcile(&reference, &target);
        assert_eq!(
            outcome.merged,
            json!({
                "hero": {"title": "Schneller bauen", "badge": "Neu", "cta": "Book a call"},
                "footer": "Alle Rechte vorbehalten",
                "legal": {"imprint": "Impressum"}
            })
        );
        assert_eq!(outcome.filled_paths, vec!["hero.cta"]);
    }

    #[test]
    fn container_mismatch_takes_reference_shape() {
        let reference = json!({"faq": [{"q": "Why?", "a": "Because."}], "nav": {"home": "Home"}});
        let target = json!({"faq": "todo", "nav": ["Start"]});

        let outcome = reconcile(&reference, &target);
        assert_eq!(outcome.merged, reference);
        assert_eq!(outcome.filled_paths, vec!["faq", "nav"]);
    }

    #[test]
    fn primitive_reference_does_not_override_container_target() {
        let reference = json!({"pricing": "Contact us"});
        let target = json!({"pricing": {"starter": "49 EUR"}});

        let outcome = reconcile(&reference, &target);
        assert_eq!(outcome.merged, target);
        assert!(outcome.is_complete());
    }

    #[test]
    fn recurses_into_objects_inside_arrays() {
        let reference = json!({
            "services": {"faq": [
                {"question": "Q1", "answer": "A1"},
                {"question": "Q2", "answer": "A2"},
                {"question": "Q3", "answer": "A3"}
            ]}
        });
        let target = json!({
            "services": {"faq": [
                {"question": "F1", "answer": "R1"},
                {"question": "F2", "answer": null},
                {"question": "", "answer": "R3", "note": "lokal"}
            ]}
        });

        let outcome = reconcile(&reference, &target);
        assert_eq!(
            outcome.filled_paths,
            vec!["services.faq[1].answer", "services.faq[2].question"]
        );
        assert_eq!(
            outcome.merged["services"]["faq"][2],
            json!({"question": "Q3", "answer": "R3", "note": "lokal"})
        );
    }

    #[test]
    fn primitive_array_entries_are_kept_even_when_different() {
        let reference = json!({"steps": ["one", "two"]});
        let target = json!({"steps": ["eins", "zwei", "drei"]});

        let outcome = reconcile(&reference, &target);
        assert_eq!(outcome.merged, target);
        assert!(outcome.filled_paths.is_empty());
    }

    #[test]
    fn empty_primitive_array_entries_are_filled() {
        let reference = json!({"steps": ["one", "two"]});
        let target = json!({"steps": ["", null]});

        let outcome = reconcile(&reference, &target);
        assert_eq!(outcome.merged, reference);
        assert_eq!(outcome.filled_paths, vec!["steps[0]", "steps[1]"]);
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let reference = json!({
            "meta": {"title": "Site", "description": "Consulting"},
            "faq": [{"q": "a", "tags": ["x", "y"]}, {"q": "b"}],
            "flags": {"beta": false, "count": 3}
        });
        let target = json!({"meta": {"title": "Web"}, "faq": [{"tags": ["z"]}], "flags": null});

        let first = reconcile(&reference, &target);
        assert!(!first.filled_paths.is_empty());
        let second = reconcile(&reference, &first.merged);
        assert_eq!(second.merged, first.merged);
        assert!(second.filled_paths.is_empty());
    }

    #[test]
    fn merged_copies_do_not_alias_reference() {
        let reference = json!({"a": {"list": [{"x": "1"}]}, "b": {"x": "2"}});
        let snapshot = reference.clone();
        let mut outcome = reconcile(&reference, &json!({}));

        outcome.merged["a"]["list"][0]["x"] = Value::String("changed".to_string());
        outcome.merged["b"]["x"] = Value::String("changed".to_string());
        assert_eq!(reference, snapshot);
    }

    #[test]
    fn merged_tree_contains_every_reference_path() {
        let reference = json!({
            "a": {"b": [1, {"c": "d"}], "e": {"f": null}},
            "g": "h"
        });
        let target = json!({"a": {"b": [7]}, "x": "extra"});

        let outcome = reconcile(&reference, &target);
        assert_paths_covered(&reference, &outcome.merged);
        assert_eq!(outcome.merged["x"], json!("extra"));
    }

    #[test]
    fn empty_reference_leaves_settle_after_first_pass() {
        let reference = json!({"legal": {"vat": "", "fax": null}, "list": ["", "x"]});
        let target = json!({"legal": {"fax": ""}, "list": [null]});

        let first = reconcile(&reference, &target);
        assert_eq!(first.filled_paths, vec!["legal.vat", "list[1]"]);
        assert_eq!(
            first.merged,
            json!({"legal": {"fax": "", "vat": ""}, "list": [null, "x"]})
        );

        let second = reconcile(&reference, &first.merged);
        assert_eq!(second.merged, first.merged);
        assert!(second.filled_paths.is_empty());
    }

    #[test]
    fn root_level_empty_target_reports_root_path() {
        let reference = json!({"a": "b"});
        let outcome = reconcile(&reference, &Value::Null);
        assert_eq!(outcome.merged, reference);
        assert_eq!(outcome.filled_paths, vec![""]);
    }

    #[test]
    fn absence_covers_null_empty_and_missing() {
        assert!(is_absent(None));
        assert!(is_absent(Some(&Value::Null)));
        assert!(is_absent(Some(&json!(""))));
        assert!(!is_absent(Some(&json!(" "))));
        assert!(!is_absent(Some(&json!(0))));
        assert!(!is_absent(Some(&json!(false))));
    }

    fn assert_paths_covered(reference: &Value, merged: &Value) {
        match reference {
            Value::Object(map) => {
                let merged_map = merged.as_object().expect("object at reference object path");
                for (key, child) in map {
                    let merged_child = merged_map.get(key).expect("reference key present");
                    assert_paths_covered(child, merged_child);
                }
            }
            Value::Array(items) => {
                let merged_items = merged.as_array().expect("array at reference array path");
                assert!(merged_items.len() >= items.len());
                for (child, merged_child) in items.iter().zip(merged_items) {
                    assert_paths_covered(child, merged_child);
                }
            }
            _ => {}
        }
    }
}
