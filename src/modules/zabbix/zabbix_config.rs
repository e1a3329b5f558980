use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::info;
use serde::Deserialize;
use serde_json::{json, Map as JsonMap, Value as JsonValue};
use url::Url;

use crate::modules::zabbix::clients::{ZabbixClient, ZabbixOperations};
use crate::modules::{AutomationModule, ExecutionResult};
use crate::reconcile::{Ensure, Intent, Mapping, Reconciler, SortKeys, StateValue};
use crate::secrets::SecretManager;
use crate::utils::{Duty, Roster};

/// Linked-object fields and the `select*` option that makes `<api>.get`
/// return them.
const SELECT_OPTIONS: &[(&str, &str, &str)] = &[
    ("groups", "selectGroups", "groupid"),
    ("templates", "selectParentTemplates", "templateid"),
    ("interfaces", "selectInterfaces", "extend"),
    ("hosts", "selectHosts", "hostid"),
];

static NULL: JsonValue = JsonValue::Null;

/// One Zabbix object as described by a duty spec.
#[derive(Debug, Clone, Deserialize)]
pub struct ZabbixTarget {
    api: String,
    api_uid: String,
    api_args: JsonMap<String, JsonValue>,
}

impl ZabbixTarget {
    pub fn from_duty(duty: &Duty) -> Result<Self> {
        let target: ZabbixTarget = serde_json::from_value(duty.spec.clone()).with_context(|| {
            format!(
                "ZabbixConfig duty '{}' requires 'api', 'api_uid' and 'api_args' in spec",
                duty.name
            )
        })?;

        if !target.api_args.contains_key(&target.api_uid) {
            anyhow::bail!("No {} provided in api_args", target.api_uid);
        }

        Ok(target)
    }

    /// Value of the identifying field, `null` if `api_args` lacks it.
    pub fn name(&self) -> &JsonValue {
        self.api_args.get(&self.api_uid).unwrap_or(&NULL)
    }

    fn display_name(&self) -> String {
        match self.name() {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Field holding the object's id in API responses.
    pub fn id_field(&self) -> String {
        if self.api == "hostgroup" {
            "groupid".to_string()
        } else {
            format!("{}id", self.api)
        }
    }

    pub fn lookup_params(&self) -> JsonValue {
        let mut filter = JsonMap::new();
        filter.insert(self.api_uid.clone(), self.name().clone());
        if let Some(hostid) = self.api_args.get("hostid") {
            filter.insert("hostid".to_string(), hostid.clone());
        }

        let mut params = JsonMap::new();
        params.insert("filter".to_string(), JsonValue::Object(filter));
        for (field, option, value) in SELECT_OPTIONS {
            if self.api_args.contains_key(*field) {
                params.insert(option.to_string(), json!(value));
            }
        }
        JsonValue::Object(params)
    }

    pub fn desired(&self) -> Mapping {
        self.api_args
            .iter()
            .map(|(k, v)| (k.clone(), StateValue::from(v.clone())))
            .collect()
    }

    fn meta(&self, id: &str) -> JsonValue {
        let mut meta = JsonMap::new();
        meta.insert("name".to_string(), self.name().clone());
        meta.insert(self.id_field(), json!(id));
        JsonValue::Object(meta)
    }

    fn reconciler(&self) -> Reconciler {
        Reconciler::new(self.api_uid.clone()).with_sort_keys(SortKeys::zabbix())
    }
}

/// An object as it currently exists in Zabbix.
#[derive(Debug, Clone)]
pub struct ObservedObject {
    pub id: String,
    pub state: Mapping,
}

pub async fn fetch_object(ops: &dyn ZabbixOperations, target: &ZabbixTarget) -> Result<Option<ObservedObject>> {
    let objects = ops.get(&target.api, target.lookup_params()).await?;
    let Some(object) = objects.into_iter().next() else {
        return Ok(None);
    };

    let id_field = target.id_field();
    let mut state = StateValue::mapping_from_json(object)
        .with_context(|| format!("{}.get returned a non-object result", target.api))?;
    let id = state
        .get(&id_field)
        .and_then(StateValue::as_text)
        .with_context(|| format!("{}.get result lacks '{}'", target.api, id_field))?;

    // linked templates come back as parentTemplates
    if target.api_args.contains_key("templates") {
        if let Some(parents) = state.remove("parentTemplates") {
            state.insert("templates".to_string(), parents);
        }
    }

    Ok(Some(ObservedObject { id, state }))
}

pub async fn ensure_present(
    ops: &dyn ZabbixOperations,
    target: &ZabbixTarget,
    check_mode: bool,
) -> Result<ExecutionResult> {
    let observed = fetch_object(ops, target).await.with_context(|| {
        format!(
            "Exception while checking if {} \"{}\" exist [params {}]",
            target.api,
            target.display_name(),
            JsonValue::Object(target.api_args.clone())
        )
    })?;

    let verdict = target
        .reconciler()
        .reconcile(&target.desired(), observed.as_ref().map(|o| &o.state), Ensure::Present);
    let id_field = target.id_field();

    match (verdict.intent, observed) {
        (Intent::Create, _) => {
            info!("Creating {} '{}'", target.api, target.display_name());
            if check_mode {
                return Ok(ExecutionResult::changed(json!({"name": target.name()})));
            }

            let args = StateValue::mapping_to_json(&verdict.applied_fields);
            let result = ops.create(&target.api, args).await.with_context(|| {
                format!("Exception for api: {}, name: {}", target.api, target.display_name())
            })?;
            let id = result
                .get(format!("{}s", id_field))
                .and_then(|ids| ids.get(0))
                .and_then(|id| StateValue::from(id.clone()).as_text())
                .with_context(|| format!("{}.create returned no {}s", target.api, id_field))?;

            Ok(ExecutionResult::changed(target.meta(&id)))
        }
        (Intent::Update, Some(observed)) => {
            let fields: Vec<&String> = verdict.applied_fields.keys().collect();
            info!(
                "Updating {} '{}' ({}), changed fields: {:?}",
                target.api,
                target.display_name(),
                observed.id,
                fields
            );
            if !check_mode {
                let mut args = verdict.applied_fields.clone();
                args.insert(id_field.clone(), StateValue::text(observed.id.clone()));
                ops.update(&target.api, StateValue::mapping_to_json(&args))
                    .await
                    .with_context(|| {
                        format!(
                            "Exception for api: {}, name: {}, id: {}",
                            target.api,
                            target.display_name(),
                            observed.id
                        )
                    })?;
            }
            Ok(ExecutionResult::changed(target.meta(&observed.id)))
        }
        (Intent::Noop, Some(observed)) => {
            info!("{} '{}' is up to date", target.api, target.display_name());
            Ok(ExecutionResult::unchanged(target.meta(&observed.id)))
        }
        (intent, _) => anyhow::bail!(
            "Unexpected {:?} verdict while ensuring {} '{}' is present",
            intent,
            target.api,
            target.display_name()
        ),
    }
}

pub async fn ensure_absent(
    ops: &dyn ZabbixOperations,
    target: &ZabbixTarget,
    check_mode: bool,
) -> Result<ExecutionResult> {
    let observed = fetch_object(ops, target).await.with_context(|| {
        format!(
            "Exception while checking if {} \"{}\" exist",
            target.api,
            target.display_name()
        )
    })?;

    let verdict = target
        .reconciler()
        .reconcile(&target.desired(), observed.as_ref().map(|o| &o.state), Ensure::Absent);

    let Some(observed) = observed.filter(|_| verdict.intent == Intent::Delete) else {
        info!("{} '{}' does not exist, skipping deletion", target.api, target.display_name());
        return Ok(ExecutionResult::empty());
    };

    info!("Deleting {} '{}' ({})", target.api, target.display_name(), observed.id);
    if check_mode {
        return Ok(ExecutionResult::changed(target.meta(&observed.id)));
    }

    let result = ops
        .delete(&target.api, vec![observed.id.clone()])
        .await
        .with_context(|| format!("Exception while deleting {} {}", target.api, target.display_name()))?;

    if is_empty_result(&result) {
        Ok(ExecutionResult::empty())
    } else {
        Ok(ExecutionResult::changed(target.meta(&observed.id)))
    }
}

fn is_empty_result(result: &JsonValue) -> bool {
    match result {
        JsonValue::Object(m) => m.is_empty(),
        JsonValue::Array(a) => a.is_empty(),
        JsonValue::Null => true,
        _ => false,
    }
}

pub struct ZabbixConfigModule {
    secrets: Arc<SecretManager>,
}

impl ZabbixConfigModule {
    pub fn new(secrets: Arc<SecretManager>) -> Self {
        Self { secrets }
    }

    fn api_url(roster: &Roster) -> Result<Url> {
        let url = roster
            .connection_str("url")
            .ok_or_else(|| anyhow::anyhow!("Roster '{}' missing 'url' in connection", roster.name))?;
        Url::parse(url).with_context(|| format!("Invalid Zabbix URL '{}'", url))
    }

    async fn get_zabbix_client(&self, roster: &Roster) -> Result<ZabbixClient> {
        let url = Self::api_url(roster)?;
        let user = roster
            .auth_str("user")
            .ok_or_else(|| anyhow::anyhow!("Roster '{}' missing 'user' in auth", roster.name))?;
        let password_ref = roster
            .auth_str("password")
            .ok_or_else(|| anyhow::anyhow!("Roster '{}' missing 'password' in auth", roster.name))?;
        let password = self.secrets.resolve(password_ref).await?;

        let client = ZabbixClient::new(url.clone())?;
        client
            .login(user, &password)
            .await
            .map_err(|e| anyhow::anyhow!("Cannot login to zabbix api at {} ({})", url, e))?;

        Ok(client)
    }
}

#[async_trait]
impl AutomationModule for ZabbixConfigModule {
    fn name(&self) -> &str {
        "zabbix-config"
    }

    fn supported_duty_types(&self) -> Vec<&str> {
        vec!["ZabbixConfig"]
    }

    fn required_roster_traits(&self) -> Vec<&str> {
        vec!["zabbix"]
    }

    async fn validate(&self, roster: &Roster, duty: &Duty) -> Result<()> {
        Self::api_url(roster)?;
        ZabbixTarget::from_duty(duty)?;
        Ok(())
    }

    async fn apply(&self, roster: &Roster, duty: &Duty, check_mode: bool) -> Result<ExecutionResult> {
        let target = ZabbixTarget::from_duty(duty)?;
        let client = self.get_zabbix_client(roster).await?;
        ensure_present(&client, &target, check_mode).await
    }

    async fn destroy(&self, roster: &Roster, duty: &Duty, check_mode: bool) -> Result<ExecutionResult> {
        let target = ZabbixTarget::from_duty(duty)?;
        let client = self.get_zabbix_client(roster).await?;
        ensure_absent(&client, &target, check_mode).await
    }
}
