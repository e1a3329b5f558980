use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::env;

use super::SecretResolver;

/// `env://NAME` reads the environment variable `NAME`.
#[derive(Debug, Default)]
pub struct EnvSecretResolver;

impl EnvSecretResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SecretResolver for EnvSecretResolver {
    fn scheme(&self) -> &str {
        "env"
    }

    async fn resolve(&self, reference: &str) -> Result<String> {
        env::var(reference).map_err(|_| anyhow!("Environment variable '{}' not found", reference))
    }
}
