//! Desired-versus-observed state reconciliation.
//!
//! The reconciler is pure: it never talks to a remote system and never
//! mutates the structures it is handed. Callers fetch the observed object,
//! ask for a [`Verdict`] and issue the matching create, update or delete.

mod diff;
pub mod normalize;
pub mod value;

use serde::{Deserialize, Serialize};

pub use normalize::{normalize, sort_sequence, SortKeys};
pub use value::{Mapping, Scalar, StateValue};

/// Whether the caller wants the object to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
    #[default]
    Present,
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Create,
    Update,
    Delete,
    Noop,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub changed: bool,
    pub intent: Intent,
    /// Normalized fields to send with the create or update call. For an
    /// update this is only the top-level fields that differ.
    pub applied_fields: Mapping,
}

#[derive(Debug, Clone)]
pub struct Reconciler {
    identity_field: String,
    sort_keys: SortKeys,
}

impl Reconciler {
    pub fn new(identity_field: impl Into<String>) -> Self {
        Self {
            identity_field: identity_field.into(),
            sort_keys: SortKeys::default(),
        }
    }

    pub fn with_sort_keys(mut self, sort_keys: SortKeys) -> Self {
        self.sort_keys = sort_keys;
        self
    }

    /// True when any field of `desired` (other than the identity field)
    /// is missing from or different in `observed`.
    pub fn needs_update(&self, desired: &Mapping, observed: &Mapping) -> bool {
        !self.changed_fields(desired, observed).is_empty()
    }

    /// Every top-level field of `desired` that differs from `observed`,
    /// normalized. All fields are evaluated; nested branches stop at their
    /// first difference.
    pub fn changed_fields(&self, desired: &Mapping, observed: &Mapping) -> Mapping {
        desired
            .iter()
            .filter(|(field, _)| field.as_str() != self.identity_field)
            .filter(|(field, want)| diff::field_differs(field, want, observed.get(*field), &self.sort_keys))
            .map(|(field, want)| {
                (
                    field.clone(),
                    normalize::normalize_value(Some(field.as_str()), want, &self.sort_keys),
                )
            })
            .collect()
    }

    pub fn reconcile(&self, desired: &Mapping, observed: Option<&Mapping>, ensure: Ensure) -> Verdict {
        match (ensure, observed) {
            (Ensure::Present, None) => Verdict {
                changed: true,
                intent: Intent::Create,
                applied_fields: normalize(desired, &self.sort_keys),
            },
            (Ensure::Present, Some(observed)) => {
                let applied_fields = self.changed_fields(desired, observed);
                if applied_fields.is_empty() {
                    Verdict {
                        changed: false,
                        intent: Intent::Noop,
                        applied_fields,
                    }
                } else {
                    Verdict {
                        changed: true,
                        intent: Intent::Update,
                        applied_fields,
                    }
                }
            }
            (Ensure::Absent, Some(_)) => Verdict {
                changed: true,
                intent: Intent::Delete,
                applied_fields: self.identity_only(desired),
            },
            (Ensure::Absent, None) => Verdict {
                changed: false,
                intent: Intent::Noop,
                applied_fields: Mapping::new(),
            },
        }
    }

    fn identity_only(&self, desired: &Mapping) -> Mapping {
        desired
            .get(&self.identity_field)
            .map(|v| (self.identity_field.clone(), v.clone()))
            .into_iter()
            .collect()
    }
}
