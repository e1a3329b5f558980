use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceStatus {
    Running { pid: Option<String> },
    NotRunning { active: String },
    Unknown,
}

impl ServiceStatus {
    /// Reads the `Active:` and `Main PID:` lines of `systemctl status`.
    pub fn parse(output: &str) -> Self {
        let Some(active) = output.lines().find_map(|l| l.trim().strip_prefix("Active:")) else {
            return ServiceStatus::Unknown;
        };

        if !active.contains("(running)") {
            return ServiceStatus::NotRunning {
                active: active.trim().to_string(),
            };
        }

        let pid = output
            .lines()
            .find_map(|l| l.trim().strip_prefix("Main PID:"))
            .and_then(|rest| rest.split_whitespace().next())
            .map(str::to_string);

        ServiceStatus::Running { pid }
    }
}

#[async_trait]
pub trait ServiceOperations: Send + Sync {
    async fn status(&self, unit: &str) -> Result<ServiceStatus>;
}

pub struct SystemctlClient {
    binary: PathBuf,
}

impl SystemctlClient {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }
}

impl Default for SystemctlClient {
    fn default() -> Self {
        Self::new("/bin/systemctl")
    }
}

#[async_trait]
impl ServiceOperations for SystemctlClient {
    async fn status(&self, unit: &str) -> Result<ServiceStatus> {
        // exit status is non-zero for stopped units, only stdout matters
        let output = Command::new(&self.binary)
            .arg("status")
            .arg(format!("{}.service", unit))
            .output()
            .await
            .with_context(|| format!("Failed to run {} status {}", self.binary.display(), unit))?;

        Ok(ServiceStatus::parse(&String::from_utf8_lossy(&output.stdout)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUNNING: &str = "\
● kafka-server.service - Apache Kafka server
   Loaded: loaded (/etc/systemd/system/kafka-server.service; enabled; vendor preset: disabled)
   Active: active (running) since Tue 2017-10-17 09:12:44 UTC; 2 days ago
 Main PID: 1873 (java)
   CGroup: /system.slice/kafka-server.service
           └─1873 java -Xmx1G -Xms1G -server
";

    const STOPPED: &str = "\
● kafka-server.service - Apache Kafka server
   Loaded: loaded (/etc/systemd/system/kafka-server.service; enabled; vendor preset: disabled)
   Active: inactive (dead) since Tue 2017-10-17 09:12:44 UTC; 2 days ago
";

    #[test]
    fn test_parse_running() {
        assert_eq!(
            ServiceStatus::parse(RUNNING),
            ServiceStatus::Running {
                pid: Some("1873".to_string())
            }
        );
    }

    #[test]
    fn test_parse_stopped() {
        match ServiceStatus::parse(STOPPED) {
            ServiceStatus::NotRunning { active } => assert!(active.starts_with("inactive (dead)")),
            other => panic!("unexpected status {:?}", other),
        }
    }

    #[test]
    fn test_parse_unknown_unit() {
        assert_eq!(ServiceStatus::parse(""), ServiceStatus::Unknown);
    }

    #[tokio::test]
    async fn test_missing_binary_is_an_error() {
        let client = SystemctlClient::new("/nonexistent/systemctl");
        assert!(client.status("kafka-server").await.is_err());
    }
}
