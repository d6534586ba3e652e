//! Worker configuration.
//!
//! Loaded from YAML (all fields but `origin` optional) and then overridden from the
//! environment:
//!
//! - `OFFLINE_CACHE_ORIGIN`: origin used to resolve root-relative precache paths
//! - `OFFLINE_CACHE_VERSION`: partition version tag
//! - `OFFLINE_CACHE_DIR`: switch to a disk store rooted here
//!
//! ```yaml
//! origin: https://prompts.example.com
//! version: v7
//! precache: ["/", "/manifest.json", "/favicon.ico", "/offline.html"]
//! rules:
//!   dynamic_patterns: ["^/categories(/|$)", "^/prompts(/|$)"]
//! store:
//!   kind: disk
//!   path: /var/cache/offline-cache
//! ```

use crate::cache::{CacheStore, DiskStore, MemoryStore, PartitionSet};
use crate::strategy::ClassificationRules;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionNames {
    #[serde(rename = "static", default = "default_static_name")]
    pub static_assets: String,
    #[serde(default = "default_dynamic_name")]
    pub dynamic: String,
    #[serde(default = "default_generic_name")]
    pub generic: String,
}

fn default_static_name() -> String {
    "static".to_string()
}

fn default_dynamic_name() -> String {
    "dynamic".to_string()
}

fn default_generic_name() -> String {
    "generic".to_string()
}

impl Default for PartitionNames {
    fn default() -> Self {
        Self {
            static_assets: default_static_name(),
            dynamic: default_dynamic_name(),
            generic: default_generic_name(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    #[default]
    Memory,
    Disk {
        path: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub origin: Url,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub partitions: PartitionNames,
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,
    #[serde(default)]
    pub rules: ClassificationRules,
    #[serde(default)]
    pub store: StoreConfig,
}

fn default_version() -> String {
    "v1".to_string()
}

fn default_precache() -> Vec<String> {
    vec![
        "/".to_string(),
        "/manifest.json".to_string(),
        "/favicon.ico".to_string(),
    ]
}

impl WorkerConfig {
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            version: default_version(),
            partitions: PartitionNames::default(),
            precache: default_precache(),
            rules: ClassificationRules::default(),
            store: StoreConfig::default(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_precache(mut self, paths: Vec<String>) -> Self {
        self.precache = paths;
        self
    }

    pub fn with_rules(mut self, rules: ClassificationRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::configuration_with_context(
                format!("cannot read config file: {}", e),
                ErrorContext::new()
                    .with_details(path.as_ref().display().to_string())
                    .with_source("config"),
            )
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Apply `OFFLINE_CACHE_*` environment overrides.
    pub fn apply_env(mut self) -> Result<Self> {
        if let Ok(origin) = env::var("OFFLINE_CACHE_ORIGIN") {
            self.origin = Url::parse(&origin).map_err(|e| {
                Error::configuration_with_context(
                    format!("invalid origin: {}", e),
                    ErrorContext::new()
                        .with_field_path("OFFLINE_CACHE_ORIGIN")
                        .with_details(origin.clone()),
                )
            })?;
        }
        if let Ok(version) = env::var("OFFLINE_CACHE_VERSION") {
            self.version = version;
        }
        if let Ok(dir) = env::var("OFFLINE_CACHE_DIR") {
            self.store = StoreConfig::Disk {
                path: PathBuf::from(dir),
            };
        }
        Ok(self)
    }

    pub fn partition_set(&self) -> Result<PartitionSet> {
        PartitionSet::new(
            &self.partitions.static_assets,
            &self.partitions.dynamic,
            &self.partitions.generic,
            &self.version,
        )
    }

    /// Precache paths resolved against `origin`.
    pub fn precache_urls(&self) -> Result<Vec<Url>> {
        self.precache
            .iter()
            .enumerate()
            .map(|(i, path)| {
                self.origin.join(path).map_err(|e| {
                    Error::configuration_with_context(
                        format!("invalid precache path: {}", e),
                        ErrorContext::new()
                            .with_field_path(format!("precache[{}]", i))
                            .with_details(path.clone()),
                    )
                })
            })
            .collect()
    }

    pub fn build_store(&self) -> Arc<dyn CacheStore> {
        match &self.store {
            StoreConfig::Memory => Arc::new(MemoryStore::new()),
            StoreConfig::Disk { path } => Arc::new(DiskStore::new(path)),
        }
    }
}
