use super::normalize::{sort_sequence, SortKeys};
use super::value::{Mapping, StateValue};

/// Directional mapping diff: only keys of `desired` are examined.
pub(crate) fn mapping_differs(desired: &Mapping, observed: &Mapping, keys: &SortKeys) -> bool {
    desired
        .iter()
        .any(|(field, want)| field_differs(field, want, observed.get(field), keys))
}

pub(crate) fn field_differs(
    field: &str,
    want: &StateValue,
    have: Option<&StateValue>,
    keys: &SortKeys,
) -> bool {
    match have {
        None => true,
        Some(have) => value_differs(Some(field), want, have, keys),
    }
}

fn value_differs(field: Option<&str>, want: &StateValue, have: &StateValue, keys: &SortKeys) -> bool {
    match (want, have) {
        (StateValue::Scalar(a), StateValue::Scalar(b)) => !a.matches(b),
        (StateValue::Mapping(a), StateValue::Mapping(b)) => mapping_differs(a, b, keys),
        (StateValue::Sequence(a), StateValue::Sequence(b)) => {
            if a.len() != b.len() {
                return true;
            }
            let key = field.and_then(|f| keys.key_for(f));
            let a = sort_sequence(a, key);
            let b = sort_sequence(b, key);
            a.iter()
                .zip(b.iter())
                .any(|(want, have)| value_differs(None, want, have, keys))
        }
        // scalar against mapping, mapping against sequence, ...
        _ => true,
    }
}
