use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value as JsonValue;

/// The slice of the Zabbix API the configuration module needs. `api` is
/// the object kind (`template`, `host`, `hostgroup`, ...), each call maps
/// to the `<api>.<verb>` JSON-RPC method.
#[async_trait]
pub trait ZabbixOperations: Send + Sync {
    async fn login(&self, user: &str, password: &str) -> Result<()>;
    async fn get(&self, api: &str, params: JsonValue) -> Result<Vec<JsonValue>>;
    async fn create(&self, api: &str, args: JsonValue) -> Result<JsonValue>;
    async fn update(&self, api: &str, args: JsonValue) -> Result<JsonValue>;
    async fn delete(&self, api: &str, ids: Vec<String>) -> Result<JsonValue>;
}
