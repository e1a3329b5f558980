pub mod env;
pub mod file;

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

pub use env::EnvSecretResolver;
pub use file::FileSecretResolver;

/// Resolves one reference scheme, e.g. `env://ZABBIX_PASSWORD`.
#[async_trait]
pub trait SecretResolver: Send + Sync {
    fn scheme(&self) -> &str;

    async fn resolve(&self, reference: &str) -> Result<String>;
}

/// Turns credential references found in rosters into their values. Strings
/// whose `scheme://` prefix names no registered resolver are returned
/// unchanged, so plain passwords may contain `://`.
pub struct SecretManager {
    resolvers: HashMap<String, Box<dyn SecretResolver>>,
}

impl SecretManager {
    pub fn new() -> Self {
        Self {
            resolvers: HashMap::new(),
        }
    }

    /// Manager with the `env` and `file` resolvers registered.
    pub fn with_defaults() -> Self {
        let mut manager = Self::new();
        manager.register_resolver(Box::new(EnvSecretResolver::new()));
        manager.register_resolver(Box::new(FileSecretResolver::new()));
        manager
    }

    pub fn register_resolver(&mut self, resolver: Box<dyn SecretResolver>) {
        self.resolvers.insert(resolver.scheme().to_string(), resolver);
    }

    pub async fn resolve(&self, reference: &str) -> Result<String> {
        let resolved = reference
            .split_once("://")
            .and_then(|(scheme, path)| self.resolvers.get(scheme).map(|r| (r, path)));

        match resolved {
            Some((resolver, path)) => resolver.resolve(path).await,
            None => Ok(reference.to_string()),
        }
    }
}

impl Default for SecretManager {
    fn default() -> Self {
        Self::new()
    }
}
