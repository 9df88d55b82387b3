use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;
use crate::types::TaskFilter;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub stack_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    pub event_bus_name: String,
    pub exporter_marker: String,
    pub desired_status: String,
    pub launch_type: String,
    pub interval_secs: u64,
    pub event_source: String,
    pub event_detail_type: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: None,
            stack_name: String::new(),
            cluster_name: None,
            event_bus_name: "default".into(),
            exporter_marker: "exporter".into(),
            desired_status: "RUNNING".into(),
            launch_type: "EC2".into(),
            interval_secs: 60,
            event_source: "ecs-prometheus-operator".into(),
            event_detail_type: "ecs-prometheus-operator".into(),
        }
    }
}

/// Identity of the deployment the daemon watches, derived from the
/// stack name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub project: String,
    /// `<envType>-<envNum>`, upper-cased.
    pub env_name: String,
    pub cluster: String,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::figment()
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("ecs-exporter-discovery.toml"))
            .merge(Json::file("ecs-exporter-discovery.json"))
            // Variable names used by existing deployments
            .merge(Env::raw().filter_map(|key| {
                if key.as_str().eq_ignore_ascii_case("STACKNAME") {
                    Some("stack_name".into())
                } else if key.as_str().eq_ignore_ascii_case("REGION") {
                    Some("region".into())
                } else {
                    None
                }
            }))
            .merge(Env::prefixed("EXPORTER_DISCOVERY_"))
    }

    pub fn deployment(&self) -> Result<Deployment, ConfigError> {
        if self.exporter_marker.is_empty() {
            return Err(ConfigError::EmptyMarker);
        }
        if self.interval_secs == 0 {
            return Err(ConfigError::ZeroInterval);
        }

        let parts: Vec<&str> = self.stack_name.split('-').collect();
        let (project, env_type, env_num) = match parts.as_slice() {
            [p, t, n] if !p.is_empty() && !t.is_empty() && !n.is_empty() => (*p, *t, *n),
            _ => return Err(ConfigError::MalformedStackName(self.stack_name.clone())),
        };

        let cluster = self
            .cluster_name
            .clone()
            .unwrap_or_else(|| format!("{}-ECS-CLUSTER", self.stack_name));

        Ok(Deployment {
            project: project.to_string(),
            env_name: format!("{}-{}", env_type, env_num).to_uppercase(),
            cluster,
        })
    }

    pub fn task_filter(&self) -> TaskFilter {
        TaskFilter {
            desired_status: self.desired_status.clone(),
            launch_type: self.launch_type.clone(),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}
