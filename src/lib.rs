pub mod cli;
pub mod controller;
pub mod modules;
pub mod reconcile;
pub mod secrets;
pub mod telemetry;
pub mod utils;

use std::sync::Arc;

use controller::Controller;
use modules::systemd::CheckServiceModule;
use modules::zabbix::ZabbixConfigModule;
use secrets::SecretManager;
use utils::Roster;

/// Controller with every built-in module registered. The local machine is
/// always available as the `localhost` roster.
pub fn default_controller(mut rosters: Vec<Roster>, check_mode: bool) -> Controller {
    if !rosters.iter().any(|r| r.name == "localhost") {
        rosters.push(Roster::localhost());
    }

    let secrets = Arc::new(SecretManager::with_defaults());
    let mut controller = Controller::new(rosters).with_check_mode(check_mode);
    controller.register_module(Arc::new(ZabbixConfigModule::new(secrets)));
    controller.register_module(Arc::new(CheckServiceModule::default()));
    controller
}
