use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{json, Value as JsonValue};
use tracing::info;

use drift::cli::{Cli, Commands};
use drift::reconcile::Ensure;
use drift::telemetry;
use drift::utils::{Duty, Playbook, Roster, RosterSelector};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    if let Err(e) = telemetry::init_telemetry() {
        eprintln!("Failed to initialize telemetry: {}", e);
    }

    let cli = Cli::parse();
    let outcome = run(cli).await;
    telemetry::shutdown_telemetry();

    match outcome {
        Ok(report) => {
            println!("{}", report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{}", json!({"failed": true, "msg": format!("{:#}", e)}));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<JsonValue> {
    match cli.command {
        Commands::Zabbix {
            url,
            user,
            password,
            api,
            api_uid,
            api_args,
            state,
        } => {
            let api_args: JsonValue =
                serde_json::from_str(&api_args).context("--api-args must be a JSON object")?;
            let roster = Roster {
                name: "zabbix".to_string(),
                roster_type: "zabbix".to_string(),
                traits: vec!["monitoring".to_string(), "zabbix".to_string()],
                connection: json!({"url": url}),
                auth: json!({"user": user, "password": password}),
            };
            let duty = Duty::new(
                format!("{} {}", api, api_uid),
                "ZabbixConfig",
                json!({"api": api, "api_uid": api_uid, "api_args": api_args}),
            )
            .with_state(Ensure::from(state))
            .with_roster(RosterSelector::by_name("zabbix"));

            run_single(vec![roster], duty, cli.check).await
        }
        Commands::CheckService {
            name,
            wait_timeout,
            poll_interval,
        } => {
            let duty = Duty::new(
                name.clone(),
                "CheckService",
                json!({"name": name, "wait_timeout": wait_timeout, "poll_interval": poll_interval}),
            )
            .with_roster(RosterSelector::by_name("localhost"));

            run_single(Vec::new(), duty, cli.check).await
        }
        Commands::Run { file } => {
            let playbook = Playbook::from_file(&file)?;
            info!("Loaded playbook {}: {}", file.display(), playbook);

            let controller = drift::default_controller(playbook.rosters, cli.check);
            let results = controller.run_duties(&playbook.duties).await?;

            let changed = results.iter().any(|(_, r)| r.changed);
            let results: Vec<JsonValue> = results
                .into_iter()
                .map(|(duty, r)| json!({"duty": duty, "changed": r.changed, "meta": r.meta}))
                .collect();
            Ok(json!({"changed": changed, "results": results}))
        }
    }
}

async fn run_single(rosters: Vec<Roster>, duty: Duty, check_mode: bool) -> Result<JsonValue> {
    let controller = drift::default_controller(rosters, check_mode);
    let result = controller.run_duty(&duty).await?;
    Ok(serde_json::to_value(result)?)
}
