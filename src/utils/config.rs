use core::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{Duty, Roster};

/// A playbook file: the rosters duties may run against and the duties
/// themselves, executed in file order.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Playbook {
    #[serde(default)]
    pub rosters: Vec<Roster>,
    #[serde(default)]
    pub duties: Vec<Duty>,
}

impl fmt::Display for Playbook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rosters, {} duties", self.rosters.len(), self.duties.len())
    }
}

impl Playbook {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read playbook {}", path.display()))?;
        Self::from_yaml(&contents)
            .with_context(|| format!("Failed to parse playbook {}", path.display()))
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let playbook: Playbook = serde_yaml::from_str(contents)?;
        Ok(playbook)
    }
}
