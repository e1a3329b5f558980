use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use serde_json::{json, Value as JsonValue};
use thiserror::Error;
use tokio::sync::RwLock;
use url::Url;

use super::traits::ZabbixOperations;

#[derive(Debug, Error)]
pub enum ZabbixError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),
    #[error("Zabbix API Error {code}: {message}, {data}")]
    Api {
        code: i64,
        message: String,
        data: String,
    },
    #[error("Malformed Zabbix response: {0}")]
    MalformedResponse(String),
}

/// JSON-RPC 2.0 client for the Zabbix API endpoint (`api_jsonrpc.php`).
pub struct ZabbixClient {
    url: Url,
    http: reqwest::Client,
    auth: RwLock<Option<String>>,
    request_id: AtomicU64,
}

impl ZabbixClient {
    pub fn new(url: Url) -> Result<Self, ZabbixError> {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(format!("drift/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            url,
            http,
            auth: RwLock::new(None),
            request_id: AtomicU64::new(0),
        })
    }

    pub async fn call(&self, method: &str, params: JsonValue) -> Result<JsonValue, ZabbixError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let auth = self.auth.read().await.clone();
        let body = build_request(method, params, id, auth.as_deref());

        debug!("Zabbix request {} -> {}", id, method);

        let response = self
            .http
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/json-rpc")
            .body(body.to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ZabbixError::Status(status));
        }

        let data: JsonValue = response.json().await?;
        parse_response(data)
    }
}

pub(crate) fn build_request(method: &str, params: JsonValue, id: u64, auth: Option<&str>) -> JsonValue {
    let mut request = json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": id,
    });
    if let Some(auth) = auth {
        request["auth"] = json!(auth);
    }
    request
}

pub(crate) fn parse_response(mut data: JsonValue) -> Result<JsonValue, ZabbixError> {
    if let Some(error) = data.get("error") {
        let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or_default();
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or_default()
            .to_string();
        let data = match error.get("data") {
            Some(JsonValue::String(s)) if !s.is_empty() => s.clone(),
            Some(JsonValue::String(_)) | Some(JsonValue::Null) | None => "No data".to_string(),
            Some(other) => other.to_string(),
        };
        return Err(ZabbixError::Api { code, message, data });
    }

    if data.get("result").is_none() {
        return Err(ZabbixError::MalformedResponse(data.to_string()));
    }
    Ok(data["result"].take())
}

#[async_trait]
impl ZabbixOperations for ZabbixClient {
    async fn login(&self, user: &str, password: &str) -> Result<()> {
        let token = self
            .call("user.login", json!({"user": user, "password": password}))
            .await?;
        let token = token
            .as_str()
            .ok_or_else(|| ZabbixError::MalformedResponse(token.to_string()))?
            .to_string();

        *self.auth.write().await = Some(token);
        Ok(())
    }

    async fn get(&self, api: &str, params: JsonValue) -> Result<Vec<JsonValue>> {
        let result = self.call(&format!("{}.get", api), params).await?;
        match result {
            JsonValue::Array(objects) => Ok(objects),
            other => Err(ZabbixError::MalformedResponse(other.to_string()).into()),
        }
    }

    async fn create(&self, api: &str, args: JsonValue) -> Result<JsonValue> {
        Ok(self.call(&format!("{}.create", api), args).await?)
    }

    async fn update(&self, api: &str, args: JsonValue) -> Result<JsonValue> {
        Ok(self.call(&format!("{}.update", api), args).await?)
    }

    async fn delete(&self, api: &str, ids: Vec<String>) -> Result<JsonValue> {
        Ok(self.call(&format!("{}.delete", api), json!(ids)).await?)
    }
}
