//! Subcommand implementations.

pub mod check;
pub mod preset;
pub mod roles;
pub mod validate;

use anyhow::{Context, Result};
use std::path::Path;

use gatekeeper_core::rbac::{load_policy, Checker, PolicyConfig};
use gatekeeper_core::settings::Settings;

/// Read the policy named on the command line, falling back to the settings.
pub fn resolve_policy(file: Option<&Path>, settings: &Settings) -> Result<PolicyConfig> {
    match file {
        Some(path) => load_policy(path)
            .with_context(|| format!("Failed to load policy {}", path.display())),
        None => settings
            .policy()
            .context("No policy file given and none configured in settings"),
    }
}

/// Resolve, validate and compile the policy.
pub fn resolve_checker(
    file: Option<&Path>,
    settings: &Settings,
) -> Result<(PolicyConfig, Checker)> {
    let config = resolve_policy(file, settings)?;
    let checker = Checker::new(config.clone()).context("Policy is invalid")?;
    Ok((config, checker))
}
