use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use dripfile_client::HttpClientConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub api: ApiSection,
    pub log: LogSection,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Http,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub backend: Backend,
    pub base_url: String,
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            backend: Backend::Http,
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_secs: None,
            user_agent: None,
        }
    }
}

impl ApiSection {
    pub fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            base_url: self.base_url.clone(),
            timeout: self.timeout_secs.map(Duration::from_secs),
            user_agent: self.user_agent.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogSection {
    pub filter: Option<String>,
}

pub fn load(path: Option<&Path>) -> Result<RuntimeConfig> {
    let Some(path) = path else {
        return Ok(RuntimeConfig::default());
    };
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&source).with_context(|| format!("invalid config TOML at {}", path.display()))
}
