use anyhow::{anyhow, Context, Result};
use log::info;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

use crate::modules::{AutomationModule, ExecutionResult};
use crate::reconcile::Ensure;
use crate::utils::{Duty, Roster};

/// Dispatches duties to the module registered for their `duty_type`,
/// against the first roster that matches the duty's selector and carries
/// the traits the module needs.
pub struct Controller {
    modules: HashMap<String, Arc<dyn AutomationModule>>,
    rosters: Vec<Roster>,
    check_mode: bool,
}

impl Controller {
    pub fn new(rosters: Vec<Roster>) -> Self {
        Self {
            modules: HashMap::new(),
            rosters,
            check_mode: false,
        }
    }

    pub fn with_check_mode(mut self, check_mode: bool) -> Self {
        self.check_mode = check_mode;
        self
    }

    pub fn register_module(&mut self, module: Arc<dyn AutomationModule>) {
        let name = module.name().to_string();
        self.modules.insert(name, module);
    }

    fn select_module(&self, duty: &Duty) -> Result<Arc<dyn AutomationModule>> {
        self.modules
            .values()
            .find(|m| m.supported_duty_types().contains(&duty.duty_type.as_str()))
            .cloned()
            .ok_or_else(|| anyhow!("No module found supporting duty type '{}'", duty.duty_type))
    }

    fn match_roster(&self, duty: &Duty, module: &dyn AutomationModule) -> Result<&Roster> {
        let required_traits = module.required_roster_traits();
        let candidates: Vec<&Roster> = self
            .rosters
            .iter()
            .filter(|r| r.matches_selector(&duty.roster_selector))
            .collect();

        if let Some(roster) = candidates
            .iter()
            .find(|r| r.missing_traits(&required_traits).is_empty())
        {
            return Ok(*roster);
        }

        match candidates.first() {
            Some(roster) => Err(anyhow!(
                "Roster '{}' missing required trait '{}' for module '{}'",
                roster.name,
                roster.missing_traits(&required_traits).join(", "),
                module.name()
            )),
            None => Err(anyhow!("No matching roster found for duty '{}'", duty.name)),
        }
    }

    #[instrument(skip(self, duty), fields(duty_name = %duty.name, duty_type = %duty.duty_type))]
    pub async fn run_duty(&self, duty: &Duty) -> Result<ExecutionResult> {
        let module = self.select_module(duty)?;
        info!("Selected module: {}", module.name());

        let roster = self.match_roster(duty, module.as_ref())?;
        info!("Matched roster: {}", roster.name);

        module.validate(roster, duty).await?;

        let result = match duty.state {
            Ensure::Present => module.apply(roster, duty, self.check_mode).await?,
            Ensure::Absent => module.destroy(roster, duty, self.check_mode).await?,
        };

        info!("Duty '{}' finished, changed={}", duty.name, result.changed);
        Ok(result)
    }

    /// Runs duties in order and stops at the first failure.
    #[instrument(skip(self, duties), fields(duties = duties.len()))]
    pub async fn run_duties(&self, duties: &[Duty]) -> Result<Vec<(String, ExecutionResult)>> {
        let mut results = Vec::with_capacity(duties.len());

        for (idx, duty) in duties.iter().enumerate() {
            info!("Running duty {}/{}: {}", idx + 1, duties.len(), duty.name);
            let result = self
                .run_duty(duty)
                .await
                .with_context(|| format!("Duty '{}' failed", duty.name))?;
            results.push((duty.name.clone(), result));
        }

        Ok(results)
    }
}
