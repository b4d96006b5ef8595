use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The compose document consumed by the container engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologyDescriptor {
    #[serde(default)]
    pub services: IndexMap<String, ServiceDefinition>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub networks: IndexMap<String, NetworkDefinition>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub volumes: IndexMap<String, VolumeDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub environment: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthcheck: Option<Healthcheck>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub depends_on: IndexMap<String, Dependency>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSpec {
    pub context: String,
    pub dockerfile: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Healthcheck {
    pub test: Vec<String>,
    pub interval: String,
    pub timeout: String,
    pub retries: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub condition: DependencyCondition,
}

/// When a dependent may start relative to its dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyCondition {
    /// The dependency's process has started; says nothing about readiness.
    ServiceStarted,
    /// The dependency's healthcheck passes.
    ServiceHealthy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkDefinition {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeDefinition {}

impl ServiceDefinition {
    pub fn depends_on(&mut self, service: &str, condition: DependencyCondition) {
        self.depends_on
            .insert(service.to_string(), Dependency { condition });
    }

    pub fn dependency_condition(&self, service: &str) -> Option<DependencyCondition> {
        self.depends_on.get(service).map(|d| d.condition)
    }
}

impl TopologyDescriptor {
    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("serializing topology descriptor")
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("parsing topology descriptor")
    }

    /// Write the descriptor to `path` unless the file already holds exactly
    /// this content. Returns whether the file was written.
    pub fn save(&self, path: &Path) -> Result<bool> {
        let content = self.to_yaml()?;
        if std::fs::read_to_string(path).is_ok_and(|existing| existing == content) {
            debug!(path = %path.display(), "topology descriptor unchanged");
            return Ok(false);
        }
        let tmp_path = path.with_extension("yml.tmp");
        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("writing {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("replacing topology descriptor {}", path.display()))?;
        debug!(path = %path.display(), services = self.services.len(), "wrote topology descriptor");
        Ok(true)
    }
}
