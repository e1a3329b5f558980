pub mod systemd;
pub mod utils;
pub mod zabbix;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::utils::{Duty, Roster};

/// What a module reports back: Ansible's `{changed, meta}` pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionResult {
    pub changed: bool,
    #[serde(default)]
    pub meta: JsonValue,
}

impl ExecutionResult {
    pub fn changed(meta: JsonValue) -> Self {
        Self { changed: true, meta }
    }

    pub fn unchanged(meta: JsonValue) -> Self {
        Self { changed: false, meta }
    }

    pub fn empty() -> Self {
        Self::unchanged(json!({}))
    }
}

#[async_trait]
pub trait AutomationModule: Send + Sync {
    fn name(&self) -> &str;

    fn supported_duty_types(&self) -> Vec<&str>;

    fn required_roster_traits(&self) -> Vec<&str>;

    async fn validate(&self, roster: &Roster, duty: &Duty) -> Result<()>;

    /// Brings the remote object to the duty's desired state. In check mode
    /// no mutating call is made, the result reports what would change.
    async fn apply(&self, roster: &Roster, duty: &Duty, check_mode: bool) -> Result<ExecutionResult>;

    async fn destroy(&self, roster: &Roster, duty: &Duty, check_mode: bool) -> Result<ExecutionResult>;
}
