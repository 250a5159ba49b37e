//! Synchronization configuration.
//!
//! A [`SyncConfig`] names the wikibase endpoint, the recent-changes day
//! window and the RDF syntax of the local graph file, plus an optional
//! `[hosting]` section for the pull-request flow. Loadable from a TOML file;
//! validation happens on load, before any file or network work.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SyncResult};
use crate::rdf::RdfSyntax;

fn default_days() -> u32 {
    100
}

fn default_syntax() -> String {
    "ttl".to_string()
}

fn default_token_var() -> String {
    "GITHUB_TOKEN".to_string()
}

/// Settings for one synchronized graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Wikibase action API endpoint (`…/api.php`).
    pub endpoint: String,
    /// Recent-changes window in days. Must be at least 1.
    #[serde(default = "default_days")]
    pub days: u32,
    /// Syntax of the local graph file (`ttl`, `nt`, `xml`, …).
    #[serde(default = "default_syntax")]
    pub syntax: String,
    /// Pull-request settings; absent when the push flow is unused.
    #[serde(default)]
    pub hosting: Option<HostingConfig>,
}

/// Where and how the synchronized graph is published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostingConfig {
    /// Repository as `owner/name`.
    pub repository: String,
    /// Branch the pull request targets.
    pub base_branch: String,
    /// Branch created for the synchronized file.
    pub sync_branch: String,
    /// Path of the graph file inside the repository.
    pub file_path: String,
    /// Environment variable holding the access token.
    #[serde(default = "default_token_var")]
    pub token_var: String,
}

impl SyncConfig {
    /// Config with defaults for everything but the endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            days: default_days(),
            syntax: default_syntax(),
            hosting: None,
        }
    }

    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> SyncResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io { source })?;
        let config: Self = toml::from_str(&text).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the day window and syntax name.
    pub fn validate(&self) -> SyncResult<()> {
        if self.days < 1 {
            return Err(ConfigError::InvalidDayWindow {
                days: self.days.into(),
            }
            .into());
        }
        self.syntax()?;
        Ok(())
    }

    /// The configured syntax, resolved.
    pub fn syntax(&self) -> SyncResult<RdfSyntax> {
        Ok(RdfSyntax::from_name(&self.syntax)?)
    }

}

impl HostingConfig {
    /// Read the access token from the configured environment variable.
    pub fn token(&self) -> SyncResult<String> {
        std::env::var(&self.token_var).map_err(|_| {
            ConfigError::MissingToken {
                var: self.token_var.clone(),
            }
            .into()
        })
    }
}
