use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::reconcile::Ensure;

#[derive(Parser)]
#[command(name = "drift")]
#[command(about = "Reconcile remote systems with their desired state", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Report what would change without making mutating calls
    #[arg(long, global = true)]
    pub check: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StateArg {
    Present,
    Absent,
}

impl From<StateArg> for Ensure {
    fn from(state: StateArg) -> Self {
        match state {
            StateArg::Present => Ensure::Present,
            StateArg::Absent => Ensure::Absent,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create, update or delete one Zabbix object
    Zabbix {
        #[arg(long, env = "ZABBIX_URL")]
        url: String,

        #[arg(long, env = "ZABBIX_USER")]
        user: String,

        /// Plain password or a secret reference such as env://NAME
        #[arg(long, env = "ZABBIX_PASSWORD", hide_env_values = true)]
        password: String,

        /// Object kind: template, host, hostgroup, ...
        #[arg(long)]
        api: String,

        /// Field of api_args identifying the object
        #[arg(long)]
        api_uid: String,

        /// Desired object as a JSON document
        #[arg(long)]
        api_args: String,

        #[arg(long, value_enum, default_value = "present")]
        state: StateArg,
    },

    /// Check that a systemd service is running
    CheckService {
        #[arg(long)]
        name: String,

        /// Seconds to wait for the service to come up
        #[arg(long, default_value = "0")]
        wait_timeout: u64,

        #[arg(long, default_value = "2", value_parser = clap::value_parser!(u64).range(1..))]
        poll_interval: u64,
    },

    /// Run every duty of a playbook file in order
    Run {
        #[arg(long)]
        file: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_zabbix_command() {
        let cli = Cli::try_parse_from([
            "drift",
            "zabbix",
            "--url",
            "http://zabbix.example/api_jsonrpc.php",
            "--user",
            "Admin",
            "--password",
            "zabbix",
            "--api",
            "template",
            "--api-uid",
            "host",
            "--api-args",
            r#"{"host": "tmpl1"}"#,
            "--state",
            "absent",
            "--check",
        ])
        .unwrap();

        assert!(cli.check);
        match cli.command {
            Commands::Zabbix { api, state, .. } => {
                assert_eq!(api, "template");
                assert_eq!(Ensure::from(state), Ensure::Absent);
            }
            _ => panic!("expected zabbix command"),
        }
    }

    #[test]
    fn test_check_service_defaults() {
        let cli = Cli::try_parse_from(["drift", "check-service", "--name", "kafka-server"]).unwrap();
        match cli.command {
            Commands::CheckService { name, wait_timeout, poll_interval } => {
                assert_eq!(name, "kafka-server");
                assert_eq!(wait_timeout, 0);
                assert_eq!(poll_interval, 2);
            }
            _ => panic!("expected check-service command"),
        }
    }

    #[test]
    fn test_zero_poll_interval_is_rejected() {
        let result = Cli::try_parse_from(["drift", "check-service", "--name", "kafka-server", "--poll-interval", "0"]);
        assert!(result.is_err());
    }
}
