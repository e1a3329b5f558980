use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use log::info;
use serde_json::{json, Value as JsonValue};

use super::systemctl::{ServiceOperations, ServiceStatus, SystemctlClient};
use crate::modules::utils::poll_until;
use crate::modules::{AutomationModule, ExecutionResult};
use crate::utils::{Duty, Roster};

const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;

/// Fails unless a systemd service is active and running. Optionally waits
/// up to `wait_timeout` seconds for it to come up.
pub struct CheckServiceModule {
    services: Arc<dyn ServiceOperations>,
}

impl CheckServiceModule {
    pub fn new(services: Arc<dyn ServiceOperations>) -> Self {
        Self { services }
    }

    async fn running_pid(&self, name: &str) -> Result<Option<Option<String>>> {
        match self.services.status(name).await? {
            ServiceStatus::Running { pid } => Ok(Some(pid)),
            ServiceStatus::NotRunning { active } => {
                info!("Service {} not running: {}", name, active);
                Ok(None)
            }
            ServiceStatus::Unknown => anyhow::bail!("Could not determine status of service {}", name),
        }
    }
}

/// Reads an optional whole-seconds setting from the duty spec.
fn spec_seconds(duty: &Duty, key: &str, default: u64) -> Result<Duration> {
    match duty.spec.get(key) {
        None | Some(JsonValue::Null) => Ok(Duration::from_secs(default)),
        Some(value) => value.as_u64().map(Duration::from_secs).ok_or_else(|| {
            anyhow::anyhow!(
                "CheckService '{}' must be a whole number of seconds, got {}",
                key,
                value
            )
        }),
    }
}

/// `(wait_timeout, poll_interval)`; a wait needs a non-zero interval.
fn wait_settings(duty: &Duty) -> Result<(Duration, Duration)> {
    let wait_timeout = spec_seconds(duty, "wait_timeout", 0)?;
    let interval = spec_seconds(duty, "poll_interval", DEFAULT_POLL_INTERVAL_SECS)?;
    if !wait_timeout.is_zero() && interval.is_zero() {
        anyhow::bail!("CheckService 'poll_interval' must be at least 1 second when 'wait_timeout' is set");
    }
    Ok((wait_timeout, interval))
}

impl Default for CheckServiceModule {
    fn default() -> Self {
        Self::new(Arc::new(SystemctlClient::default()))
    }
}

#[async_trait]
impl AutomationModule for CheckServiceModule {
    fn name(&self) -> &str {
        "check-service"
    }

    fn supported_duty_types(&self) -> Vec<&str> {
        vec!["CheckService"]
    }

    fn required_roster_traits(&self) -> Vec<&str> {
        vec!["systemd"]
    }

    async fn validate(&self, _roster: &Roster, duty: &Duty) -> Result<()> {
        if duty.spec_str("name").is_none() {
            anyhow::bail!("CheckService duty requires 'name' in spec");
        }
        wait_settings(duty)?;
        Ok(())
    }

    async fn apply(&self, _roster: &Roster, duty: &Duty, _check_mode: bool) -> Result<ExecutionResult> {
        let name = duty
            .spec_str("name")
            .ok_or_else(|| anyhow::anyhow!("name is required"))?;
        let (wait_timeout, interval) = wait_settings(duty)?;

        let pid = if wait_timeout.is_zero() {
            self.running_pid(name).await?
        } else {
            let operation = format!("service {}", name);
            let pid = poll_until(&operation, interval, wait_timeout, || self.running_pid(name))
                .await
                .map_err(|e| anyhow::anyhow!("Service {} is stopped, inactive, dead or failed ({})", name, e))?;
            Some(pid)
        };

        let Some(pid) = pid else {
            anyhow::bail!("Service {} is stopped, inactive, dead or failed", name);
        };

        let pid_text = pid.clone().unwrap_or_else(|| "unknown".to_string());
        Ok(ExecutionResult::unchanged(json!({
            "msg": format!("Service {} is Active and running with pid {}", name, pid_text),
            "process_id": pid,
        })))
    }

    async fn destroy(&self, _roster: &Roster, duty: &Duty, _check_mode: bool) -> Result<ExecutionResult> {
        anyhow::bail!("CheckService duty '{}' does not support state absent", duty.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replays a fixed sequence of statuses, repeating the last one.
    struct ScriptedServices {
        statuses: Mutex<Vec<ServiceStatus>>,
    }

    impl ScriptedServices {
        fn new(mut statuses: Vec<ServiceStatus>) -> Arc<Self> {
            statuses.reverse();
            Arc::new(Self {
                statuses: Mutex::new(statuses),
            })
        }
    }

    #[async_trait]
    impl ServiceOperations for ScriptedServices {
        async fn status(&self, _unit: &str) -> Result<ServiceStatus> {
            let mut statuses = self.statuses.lock().unwrap();
            if statuses.len() > 1 {
                Ok(statuses.pop().unwrap())
            } else {
                Ok(statuses[0].clone())
            }
        }
    }

    fn running() -> ServiceStatus {
        ServiceStatus::Running {
            pid: Some("1873".to_string()),
        }
    }

    fn stopped() -> ServiceStatus {
        ServiceStatus::NotRunning {
            active: "inactive (dead)".to_string(),
        }
    }

    fn duty(spec: serde_json::Value) -> Duty {
        Duty::new("kafka", "CheckService", spec)
    }

    #[tokio::test]
    async fn test_running_service() {
        let module = CheckServiceModule::new(ScriptedServices::new(vec![running()]));
        let result = module
            .apply(&Roster::localhost(), &duty(json!({"name": "kafka-server"})), false)
            .await
            .unwrap();

        assert!(!result.changed);
        assert_eq!(result.meta["process_id"], "1873");
        assert_eq!(
            result.meta["msg"],
            "Service kafka-server is Active and running with pid 1873"
        );
    }

    #[tokio::test]
    async fn test_stopped_service_fails() {
        let module = CheckServiceModule::new(ScriptedServices::new(vec![stopped()]));
        let err = module
            .apply(&Roster::localhost(), &duty(json!({"name": "kafka-server"})), false)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Service kafka-server is stopped, inactive, dead or failed");
    }

    #[tokio::test]
    async fn test_waits_for_service_to_start() {
        let module = CheckServiceModule::new(ScriptedServices::new(vec![stopped(), running()]));
        let result = module
            .apply(
                &Roster::localhost(),
                &duty(json!({"name": "kafka-server", "wait_timeout": 5, "poll_interval": 1})),
                false,
            )
            .await
            .unwrap();

        assert_eq!(result.meta["process_id"], "1873");
    }

    #[tokio::test]
    async fn test_unknown_status_fails() {
        let module = CheckServiceModule::new(ScriptedServices::new(vec![ServiceStatus::Unknown]));
        let err = module
            .apply(&Roster::localhost(), &duty(json!({"name": "nope"})), false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Could not determine status"));
    }

    #[tokio::test]
    async fn test_validate_requires_name() {
        let module = CheckServiceModule::default();
        assert!(module.validate(&Roster::localhost(), &duty(json!({}))).await.is_err());
    }

    #[tokio::test]
    async fn test_validate_rejects_non_integer_wait_settings() {
        let module = CheckServiceModule::new(ScriptedServices::new(vec![stopped(), running()]));
        let quoted = duty(json!({"name": "kafka", "wait_timeout": "5", "poll_interval": 1}));

        let err = module.validate(&Roster::localhost(), &quoted).await.unwrap_err();
        assert!(err.to_string().contains("'wait_timeout' must be a whole number"));

        let negative = duty(json!({"name": "kafka", "poll_interval": -2}));
        assert!(module.validate(&Roster::localhost(), &negative).await.is_err());
    }

    #[tokio::test]
    async fn test_apply_does_not_skip_wait_on_bad_timeout() {
        let module = CheckServiceModule::new(ScriptedServices::new(vec![stopped(), running()]));
        let err = module
            .apply(
                &Roster::localhost(),
                &duty(json!({"name": "kafka", "wait_timeout": "5", "poll_interval": 1})),
                false,
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("wait_timeout"));
    }

    #[tokio::test]
    async fn test_validate_rejects_zero_interval_with_wait() {
        let module = CheckServiceModule::default();
        let spinning = duty(json!({"name": "kafka", "wait_timeout": 5, "poll_interval": 0}));
        let err = module.validate(&Roster::localhost(), &spinning).await.unwrap_err();
        assert!(err.to_string().contains("poll_interval"));

        let single_check = duty(json!({"name": "kafka", "wait_timeout": 0, "poll_interval": 0}));
        assert!(module.validate(&Roster::localhost(), &single_check).await.is_ok());
    }

    #[tokio::test]
    async fn test_destroy_is_unsupported() {
        let module = CheckServiceModule::default();
        assert!(module
            .destroy(&Roster::localhost(), &duty(json!({"name": "kafka-server"})), false)
            .await
            .is_err());
    }
}
