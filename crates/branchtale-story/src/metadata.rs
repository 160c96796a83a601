//! Lenient extraction of recognized metadata keys.
//!
//! Absent keys default to `None`/empty. Keys present with an unusable type are
//! dropped and reported through `NodeMetadata::problems`; ingestion never fails
//! on metadata content.

use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;

pub const KEY_START: &str = "start";
pub const KEY_END: &str = "end";
pub const KEY_REVISIT: &str = "revisit";
pub const KEY_CHOICES: &str = "choices";
pub const KEY_PACE: &str = "pace";
pub const KEY_COLOUR: &str = "colour";
pub const KEY_EFFECT: &str = "effect";
pub const KEY_POV: &str = "pov";
pub const KEY_MESSAGE_POV: &str = "message-pov";
pub const KEY_MESSAGE_TITLE: &str = "message-title";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeMetadata {
    pub start: Option<bool>,
    pub end: Option<bool>,
    pub revisit: Option<bool>,
    pub choices: BTreeMap<String, String>,
    pub pace: Option<String>,
    pub colour: Option<String>,
    pub effect: Option<String>,
    pub pov: Option<String>,
    pub message_pov: Option<String>,
    pub message_title: Option<String>,
    pub problems: Vec<String>,
}

impl NodeMetadata {
    pub fn from_mapping(mapping: &Mapping) -> Self {
        let mut meta = NodeMetadata::default();
        meta.start = meta.flag(mapping, KEY_START);
        meta.end = meta.flag(mapping, KEY_END);
        meta.revisit = meta.flag(mapping, KEY_REVISIT);
        meta.choices = meta.choices(mapping);
        meta.pace = meta.option(mapping, KEY_PACE);
        meta.colour = meta.option(mapping, KEY_COLOUR);
        meta.effect = meta.option(mapping, KEY_EFFECT);
        meta.pov = meta.option(mapping, KEY_POV);
        meta.message_pov = meta.option(mapping, KEY_MESSAGE_POV);
        meta.message_title = meta.option(mapping, KEY_MESSAGE_TITLE);
        meta
    }

    fn flag(&mut self, mapping: &Mapping, key: &str) -> Option<bool> {
        let value = mapping.get(key)?;
        let flag = match value {
            Value::Bool(flag) => Some(*flag),
            Value::String(text) => legacy_bool(text),
            Value::Null => return None,
            _ => None,
        };
        if flag.is_none() {
            self.problems
                .push(format!("`{key}` must be a boolean, found {}", type_name(value)));
        }
        flag
    }

    fn option(&mut self, mapping: &Mapping, key: &str) -> Option<String> {
        let value = mapping.get(key)?;
        if value.is_null() {
            return None;
        }
        let text = scalar_text(value);
        if text.is_none() {
            self.problems
                .push(format!("`{key}` must be a scalar, found {}", type_name(value)));
        }
        text
    }

    fn choices(&mut self, mapping: &Mapping) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        let Some(value) = mapping.get(KEY_CHOICES) else {
            return out;
        };
        let entries = match value {
            Value::Mapping(entries) => entries,
            Value::Null => return out,
            other => {
                self.problems.push(format!(
                    "`{KEY_CHOICES}` must be a mapping, found {}",
                    type_name(other)
                ));
                return out;
            }
        };

        for (label, target) in entries {
            let (Some(label), Some(target)) = (scalar_text(label), scalar_text(target)) else {
                continue;
            };
            if label.is_empty() || target.is_empty() {
                continue;
            }
            out.insert(label, target);
        }
        out
    }
}

/// YAML 1.1 spellings that YAML 1.2 reads as strings.
fn legacy_bool(text: &str) -> Option<bool> {
    match text {
        "yes" | "Yes" | "YES" | "on" | "On" | "ON" => Some(true),
        "no" | "No" | "NO" | "off" | "Off" | "OFF" => Some(false),
        _ => None,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter::parse_metadata;

    fn meta(yaml: &str) -> NodeMetadata {
        NodeMetadata::from_mapping(&parse_metadata(yaml).expect("fixture yaml should parse"))
    }

    #[test]
    fn reads_recognized_keys() {
        let meta = meta(
            "start: true\nrevisit: false\npace: slow\ncolour: \"#ff00ff\"\nmessage-pov: ana\nmessage-title: Group chat\nchoices:\n  Go north: forest\n  Go south: river\n",
        );
        assert_eq!(meta.start, Some(true));
        assert_eq!(meta.end, None);
        assert_eq!(meta.revisit, Some(false));
        assert_eq!(meta.pace.as_deref(), Some("slow"));
        assert_eq!(meta.colour.as_deref(), Some("#ff00ff"));
        assert_eq!(meta.message_pov.as_deref(), Some("ana"));
        assert_eq!(meta.message_title.as_deref(), Some("Group chat"));
        assert_eq!(meta.choices.len(), 2);
        assert_eq!(meta.choices["Go north"], "forest");
        assert!(meta.problems.is_empty());
    }

    #[test]
    fn drops_empty_choice_labels_and_targets() {
        let meta = meta("choices:\n  \"\": forest\n  Wait:\n  Run: river\n");
        assert_eq!(meta.choices.len(), 1);
        assert_eq!(meta.choices["Run"], "river");
    }

    #[test]
    fn malformed_fields_default_and_are_reported() {
        let meta = meta("start: maybe\nchoices: [a, b]\npov: [x]\n");
        assert_eq!(meta.start, None);
        assert!(meta.choices.is_empty());
        assert_eq!(meta.pov, None);
        assert_eq!(meta.problems.len(), 3);
    }

    #[test]
    fn yaml_1_1_boolean_spellings_are_flags() {
        let parsed = meta("start: yes\nend: True\nrevisit: Off\n");
        assert_eq!(parsed.start, Some(true));
        assert_eq!(parsed.end, Some(true));
        assert_eq!(parsed.revisit, Some(false));
        assert!(parsed.problems.is_empty());

        let parsed = meta("start: y\n");
        assert_eq!(parsed.start, None);
        assert_eq!(parsed.problems.len(), 1);
    }

    #[test]
    fn numeric_values_become_text() {
        let meta = meta("pace: 200\nchoices:\n  1: two\n");
        assert_eq!(meta.pace.as_deref(), Some("200"));
        assert_eq!(meta.choices["1"], "two");
    }
}
