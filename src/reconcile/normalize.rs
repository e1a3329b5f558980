use std::cmp::Ordering;
use std::collections::HashMap;

use super::value::{Mapping, Scalar, StateValue};

/// Per-field sort keys for sequences of mappings, e.g. `groups` sorted by
/// each element's `groupid`.
#[derive(Debug, Clone, Default)]
pub struct SortKeys {
    keys: HashMap<String, String>,
}

impl SortKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, key: impl Into<String>) -> Self {
        self.keys.insert(field.into(), key.into());
        self
    }

    /// Keys for the linked objects the Zabbix API returns unordered.
    pub fn zabbix() -> Self {
        Self::new()
            .with("templates", "templateid")
            .with("groups", "groupid")
            .with("interfaces", "ip")
            .with("hosts", "hostid")
    }

    pub fn key_for(&self, field: &str) -> Option<&str> {
        self.keys.get(field).map(String::as_str)
    }
}

/// Returns a sorted copy of `items`. Mappings sort by the sub-field `key`,
/// scalars sort by value. A sequence holding anything else keeps its
/// order, as does one whose field has no key configured and holds mappings.
pub fn sort_sequence(items: &[StateValue], key: Option<&str>) -> Vec<StateValue> {
    let mut sorted = items.to_vec();
    let all_scalars = items.iter().all(|item| item.as_scalar().is_some());

    if key.is_none() && !all_scalars {
        return sorted;
    }

    sorted.sort_by(|a, b| compare_ranks(sort_rank(a, key), sort_rank(b, key)));
    sorted
}

fn sort_rank<'a>(item: &'a StateValue, key: Option<&str>) -> Option<&'a Scalar> {
    match item {
        StateValue::Scalar(s) => Some(s),
        StateValue::Mapping(m) => key.and_then(|k| m.get(k)).and_then(StateValue::as_scalar),
        StateValue::Sequence(_) => None,
    }
}

fn compare_ranks(a: Option<&Scalar>, b: Option<&Scalar>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.sort_cmp(b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Canonical copy of `desired` with every sequence sorted the way the
/// reconciler compares it.
pub fn normalize(desired: &Mapping, keys: &SortKeys) -> Mapping {
    desired
        .iter()
        .map(|(field, value)| (field.clone(), normalize_value(Some(field.as_str()), value, keys)))
        .collect()
}

pub(crate) fn normalize_value(field: Option<&str>, value: &StateValue, keys: &SortKeys) -> StateValue {
    match value {
        StateValue::Scalar(_) => value.clone(),
        StateValue::Mapping(m) => StateValue::Mapping(normalize(m, keys)),
        StateValue::Sequence(items) => {
            let key = field.and_then(|f| keys.key_for(f));
            let items: Vec<StateValue> = items
                .iter()
                .map(|item| normalize_value(None, item, keys))
                .collect();
            StateValue::Sequence(sort_sequence(&items, key))
        }
    }
}
