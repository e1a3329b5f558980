use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map as JsonMap, Number, Value as JsonValue};

pub type Mapping = BTreeMap<String, StateValue>;

/// Leaf value of a desired or observed state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
}

/// Tagged state value. Every comparison rule in the reconciler is keyed on
/// these three shapes; there is no implicit coercion between them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StateValue {
    Scalar(Scalar),
    Mapping(Mapping),
    Sequence(Vec<StateValue>),
}

impl Scalar {
    /// Equality used when diffing. Integers compare exactly, mixed
    /// integer/float pairs compare by value, text compares by codepoints.
    pub fn matches(&self, other: &Scalar) -> bool {
        match (self, other) {
            (Scalar::Null, Scalar::Null) => true,
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Text(a), Scalar::Text(b)) => a == b,
            (Scalar::Number(a), Scalar::Number(b)) => numbers_match(a, b),
            _ => false,
        }
    }

    /// Total order used to canonicalise sequences.
    pub fn sort_cmp(&self, other: &Scalar) -> Ordering {
        match (self, other) {
            (Scalar::Bool(a), Scalar::Bool(b)) => a.cmp(b),
            (Scalar::Text(a), Scalar::Text(b)) => a.cmp(b),
            (Scalar::Number(a), Scalar::Number(b)) => {
                let a = a.as_f64().unwrap_or(f64::NAN);
                let b = b.as_f64().unwrap_or(f64::NAN);
                a.partial_cmp(&b).unwrap_or(Ordering::Equal)
            }
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Scalar::Null => 0,
            Scalar::Bool(_) => 1,
            Scalar::Number(_) => 2,
            Scalar::Text(_) => 3,
        }
    }

    /// Text rendering for identifiers; the remote side reports ids as
    /// strings while callers sometimes pass numbers.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Scalar::Text(s) => Some(s.clone()),
            Scalar::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

fn numbers_match(a: &Number, b: &Number) -> bool {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return a == b;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

impl StateValue {
    pub fn text(value: impl Into<String>) -> Self {
        StateValue::Scalar(Scalar::Text(value.into()))
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            StateValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            StateValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<String> {
        self.as_scalar().and_then(Scalar::as_text)
    }

    /// Converts a JSON object into a mapping; anything else yields `None`.
    pub fn mapping_from_json(value: JsonValue) -> Option<Mapping> {
        match StateValue::from(value) {
            StateValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn mapping_to_json(mapping: &Mapping) -> JsonValue {
        let object: JsonMap<String, JsonValue> = mapping
            .iter()
            .map(|(k, v)| (k.clone(), JsonValue::from(v.clone())))
            .collect();
        JsonValue::Object(object)
    }
}

impl From<JsonValue> for StateValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => StateValue::Scalar(Scalar::Null),
            JsonValue::Bool(b) => StateValue::Scalar(Scalar::Bool(b)),
            JsonValue::Number(n) => StateValue::Scalar(Scalar::Number(n)),
            JsonValue::String(s) => StateValue::Scalar(Scalar::Text(s)),
            JsonValue::Array(items) => {
                StateValue::Sequence(items.into_iter().map(StateValue::from).collect())
            }
            JsonValue::Object(object) => StateValue::Mapping(
                object
                    .into_iter()
                    .map(|(k, v)| (k, StateValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<StateValue> for JsonValue {
    fn from(value: StateValue) -> Self {
        match value {
            StateValue::Scalar(Scalar::Null) => JsonValue::Null,
            StateValue::Scalar(Scalar::Bool(b)) => JsonValue::Bool(b),
            StateValue::Scalar(Scalar::Number(n)) => JsonValue::Number(n),
            StateValue::Scalar(Scalar::Text(s)) => JsonValue::String(s),
            StateValue::Sequence(items) => {
                JsonValue::Array(items.into_iter().map(JsonValue::from).collect())
            }
            StateValue::Mapping(m) => StateValue::mapping_to_json(&m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_conversion_keeps_shape() {
        let source = json!({"name": "tmpl1", "groups": [{"groupid": "1"}], "status": 0, "flag": null});
        let value = StateValue::from(source.clone());
        assert!(value.as_mapping().is_some());
        assert_eq!(JsonValue::from(value), source);
    }

    #[test]
    fn test_numbers_match_across_representations() {
        let int = Scalar::Number(Number::from(1));
        let float = Scalar::Number(Number::from_f64(1.0).unwrap());
        assert!(int.matches(&float));
        assert!(!int.matches(&Scalar::Text("1".to_string())));
    }

    #[test]
    fn test_sort_cmp_ranks_by_kind() {
        let null = Scalar::Null;
        let text = Scalar::Text("a".to_string());
        assert_eq!(null.sort_cmp(&text), Ordering::Less);
        assert_eq!(text.sort_cmp(&Scalar::Text("b".to_string())), Ordering::Less);
    }

    #[test]
    fn test_as_text_renders_numbers() {
        assert_eq!(StateValue::from(json!(10084)).as_text().as_deref(), Some("10084"));
        assert_eq!(StateValue::from(json!("10084")).as_text().as_deref(), Some("10084"));
        assert_eq!(StateValue::from(json!(true)).as_text(), None);
    }
}
