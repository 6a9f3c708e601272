//! Role hierarchy inspection.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tabled::Tabled;

use gatekeeper_core::settings::Settings;

use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct RolesArgs {
    /// Policy file (.toml, .json, .yaml)
    file: Option<PathBuf>,
}

#[derive(Tabled, Serialize)]
struct RoleRow {
    #[tabled(rename = "Level")]
    level: i32,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Capabilities")]
    capabilities: String,
}

pub fn execute(args: RolesArgs, settings: &Settings, format: OutputFormat) -> Result<()> {
    let (config, checker) = super::resolve_checker(args.file.as_deref(), settings)?;

    let rows: Vec<RoleRow> = checker
        .roles_by_level()
        .into_iter()
        .map(|(role, level)| {
            let grants: Vec<String> = config
                .resources
                .iter()
                .filter_map(|resource| {
                    let actions = checker.allowed_actions(role, resource);
                    if actions.is_empty() {
                        return None;
                    }
                    let actions: Vec<&str> = actions.iter().map(|a| a.as_str()).collect();
                    Some(format!("{}: {}", resource, actions.join(", ")))
                })
                .collect();

            RoleRow {
                level,
                role: role.to_string(),
                capabilities: if grants.is_empty() {
                    "-".to_string()
                } else {
                    grants.join("\n")
                },
            }
        })
        .collect();

    output::print_list(&rows, format)?;

    if format == OutputFormat::Table {
        let scope = match &config.api_key_scope {
            Some(scope) if scope.allowed_resources.is_empty() => "(empty)".to_string(),
            Some(scope) => scope
                .allowed_resources
                .iter()
                .map(|r| r.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            None => "disabled".to_string(),
        };
        output::print_detail("API-key scope", &scope);
    }
    Ok(())
}
