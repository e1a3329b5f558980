pub mod clients;
pub mod zabbix_config;

pub use zabbix_config::{ZabbixConfigModule, ZabbixTarget};
