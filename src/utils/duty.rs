use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::roster::RosterSelector;
use crate::reconcile::Ensure;

/// One invocation of one module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Duty {
    pub name: String,
    pub duty_type: String,
    #[serde(default)]
    pub roster_selector: RosterSelector,
    #[serde(default)]
    pub state: Ensure,
    #[serde(default)]
    pub spec: JsonValue,
}

impl Duty {
    pub fn new(name: impl Into<String>, duty_type: impl Into<String>, spec: JsonValue) -> Self {
        Self {
            name: name.into(),
            duty_type: duty_type.into(),
            roster_selector: RosterSelector::default(),
            state: Ensure::Present,
            spec,
        }
    }

    pub fn with_state(mut self, state: Ensure) -> Self {
        self.state = state;
        self
    }

    pub fn with_roster(mut self, selector: RosterSelector) -> Self {
        self.roster_selector = selector;
        self
    }

    pub fn spec_str(&self, key: &str) -> Option<&str> {
        self.spec.get(key).and_then(|v| v.as_str())
    }
}
