//! Named-target configuration
//!
//! Targets are endpoint/bucket records loaded from a JSON file so the CLI
//! can refer to them by name instead of repeating connection details.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One named storage target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    /// Name used on the command line (`--target virginia`)
    pub name: String,

    /// Public endpoint URL
    pub endpoint: String,

    /// Internal-network endpoint URL, used with `--internal`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_endpoint: Option<String>,

    /// Bucket name
    pub bucket: String,

    /// Enable transfer acceleration on connect
    #[serde(default)]
    pub accelerate: bool,

    /// Region passed to the SDK (defaults to "auto" for S3-compatible services)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Static access key id; the SDK default chain is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,

    /// Static secret access key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
}

impl Target {
    /// The endpoint to use, honoring the `--internal` flag
    pub fn endpoint_for(&self, internal: bool) -> Result<&str> {
        if internal {
            self.internal_endpoint.as_deref().ok_or_else(|| {
                Error::config(format!(
                    "target '{}' has no internal endpoint configured",
                    self.name
                ))
            })
        } else {
            Ok(&self.endpoint)
        }
    }
}

/// Target registry loaded from the configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Known targets
    #[serde(default)]
    pub targets: Vec<Target>,
}

impl Config {
    /// Load configuration from the default config file
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::io("reading config", e))?;
        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io("creating config dir", e))?;
        }
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| Error::config(format!("serializing config: {}", e)))?;
        std::fs::write(path, contents).map_err(|e| Error::io("writing config", e))?;
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("bucketeer").join("targets.json"))
            .ok_or_else(|| Error::config("could not determine config directory"))
    }

    /// Resolve a target by name
    pub fn resolve(&self, name: &str) -> Result<&Target> {
        self.targets
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| Error::UnknownTarget {
                name: name.to_string(),
                available: self.target_names().join(", "),
            })
    }

    /// Names of all configured targets
    pub fn target_names(&self) -> Vec<&str> {
        self.targets.iter().map(|t| t.name.as_str()).collect()
    }

    /// A starter configuration with one example target
    pub fn example() -> Self {
        Self {
            targets: vec![Target {
                name: "virginia".to_string(),
                endpoint: "https://oss-us-east-1.aliyuncs.com".to_string(),
                internal_endpoint: Some("https://oss-us-east-1-internal.aliyuncs.com".to_string()),
                bucket: "oversea-download".to_string(),
                accelerate: true,
                region: None,
                access_key_id: None,
                secret_access_key: None,
            }],
        }
    }
}
