use anyhow::{Context, Result};
use async_trait::async_trait;

use super::SecretResolver;

/// `file:///run/secrets/zabbix` reads a file and strips the trailing newline.
#[derive(Debug, Default)]
pub struct FileSecretResolver;

impl FileSecretResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SecretResolver for FileSecretResolver {
    fn scheme(&self) -> &str {
        "file"
    }

    async fn resolve(&self, reference: &str) -> Result<String> {
        let contents = tokio::fs::read_to_string(reference)
            .await
            .with_context(|| format!("Failed to read secret file '{}'", reference))?;
        Ok(contents.trim_end_matches(['\r', '\n']).to_string())
    }
}
