//! Settings for binaries that host the engine.
//!
//! The engine itself reads no files or environment; these settings tell a
//! host process which policy to compile and how to log.

use serde::Deserialize;

use crate::logging::LoggingConfig;
use crate::rbac::{load_policy, Checker, PolicyConfig, Preset};

/// Host settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// Path to a TOML/JSON/YAML policy file
    #[serde(default)]
    pub policy_file: Option<String>,

    /// Bundled preset id, used when no policy file is set
    #[serde(default)]
    pub preset: Option<String>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Settings {
    /// Load from the environment (`GATEKEEPER__POLICY_FILE`, `GATEKEEPER__LOGGING__LEVEL`, ...).
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("GATEKEEPER").separator("__"))
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }

    /// Load from a specific file path, with environment overrides.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("GATEKEEPER").separator("__"))
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }

    /// Resolve the policy these settings point at. The file wins over the preset.
    pub fn policy(&self) -> anyhow::Result<PolicyConfig> {
        if let Some(path) = &self.policy_file {
            return Ok(load_policy(path)?);
        }
        if let Some(id) = &self.preset {
            let preset: Preset = id.parse().map_err(anyhow::Error::msg)?;
            return Ok(preset.config());
        }
        anyhow::bail!("no policy configured: set policy_file or preset")
    }

    /// Resolve and compile the policy.
    pub fn checker(&self) -> anyhow::Result<Checker> {
        Ok(Checker::new(self.policy()?)?)
    }
}
