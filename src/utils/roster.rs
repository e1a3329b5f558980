use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A remote endpoint a duty runs against, with the credentials to reach it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roster {
    pub name: String,
    pub roster_type: String,
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default)]
    pub connection: JsonValue,
    #[serde(default)]
    pub auth: JsonValue,
}

impl Roster {
    /// The implicit roster for modules that act on the local machine.
    pub fn localhost() -> Self {
        Self {
            name: "localhost".to_string(),
            roster_type: "local".to_string(),
            traits: vec!["local".to_string(), "systemd".to_string()],
            connection: JsonValue::Null,
            auth: JsonValue::Null,
        }
    }

    pub fn has_trait(&self, trait_name: &str) -> bool {
        self.traits.iter().any(|t| t == trait_name)
    }

    pub fn missing_traits<'a>(&self, required_traits: &[&'a str]) -> Vec<&'a str> {
        required_traits
            .iter()
            .copied()
            .filter(|t| !self.has_trait(t))
            .collect()
    }

    pub fn connection_str(&self, key: &str) -> Option<&str> {
        self.connection.get(key).and_then(|v| v.as_str())
    }

    pub fn auth_str(&self, key: &str) -> Option<&str> {
        self.auth.get(key).and_then(|v| v.as_str())
    }

    pub fn matches_selector(&self, selector: &RosterSelector) -> bool {
        if let Some(name) = &selector.name {
            if &self.name != name {
                return false;
            }
        }

        if let Some(required_traits) = &selector.traits {
            if required_traits.iter().any(|t| !self.has_trait(t)) {
                return false;
            }
        }

        if let Some(roster_type) = &selector.roster_type {
            if &self.roster_type != roster_type {
                return false;
            }
        }

        true
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterSelector {
    pub name: Option<String>,
    pub traits: Option<Vec<String>>,
    pub roster_type: Option<String>,
}

impl RosterSelector {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn zabbix_roster() -> Roster {
        Roster {
            name: "zabbix-prod".to_string(),
            roster_type: "zabbix".to_string(),
            traits: vec!["monitoring".to_string(), "zabbix".to_string()],
            connection: json!({"url": "http://zabbix.example/api_jsonrpc.php"}),
            auth: json!({"user": "Admin", "password": "env://ZABBIX_PASSWORD"}),
        }
    }

    #[test]
    fn test_missing_traits() {
        let roster = zabbix_roster();
        assert!(roster.missing_traits(&["zabbix"]).is_empty());
        assert_eq!(roster.missing_traits(&["zabbix", "systemd"]), vec!["systemd"]);
    }

    #[test]
    fn test_matches_selector() {
        let roster = zabbix_roster();
        assert!(roster.matches_selector(&RosterSelector::by_name("zabbix-prod")));
        assert!(!roster.matches_selector(&RosterSelector::by_name("other")));
        assert!(roster.matches_selector(&RosterSelector {
            traits: Some(vec!["monitoring".to_string()]),
            roster_type: Some("zabbix".to_string()),
            ..RosterSelector::default()
        }));
        assert!(!roster.matches_selector(&RosterSelector {
            traits: Some(vec!["aws".to_string()]),
            ..RosterSelector::default()
        }));
    }

    #[test]
    fn test_connection_lookups() {
        let roster = zabbix_roster();
        assert_eq!(roster.connection_str("url"), Some("http://zabbix.example/api_jsonrpc.php"));
        assert_eq!(roster.auth_str("user"), Some("Admin"));
        assert_eq!(Roster::localhost().connection_str("url"), None);
    }
}
