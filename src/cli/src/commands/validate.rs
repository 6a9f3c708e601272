//! Policy linting.
//!
//! Runs the validator over a policy file and reports the first defect, or
//! every defect with `--all`.

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tabled::Tabled;

use gatekeeper_core::rbac::{validate, validate_all, ConfigError};
use gatekeeper_core::settings::Settings;

use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct ValidateArgs {
    /// Policy file (.toml, .json, .yaml)
    file: Option<PathBuf>,

    /// Report every defect instead of stopping at the first
    #[arg(short, long)]
    all: bool,
}

/// One validation failure as displayed.
#[derive(Tabled, Serialize)]
struct DefectRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Error")]
    message: String,
}

impl From<&ConfigError> for DefectRow {
    fn from(error: &ConfigError) -> Self {
        Self {
            category: error.category().to_string(),
            message: error.to_string(),
        }
    }
}

#[derive(Serialize)]
struct Report<'a> {
    valid: bool,
    errors: &'a [DefectRow],
}

pub fn execute(args: ValidateArgs, settings: &Settings, format: OutputFormat) -> Result<()> {
    let config = super::resolve_policy(args.file.as_deref(), settings)?;

    let defects: Vec<ConfigError> = if args.all {
        validate_all(&config)
            .err()
            .map(|e| e.into_vec())
            .unwrap_or_default()
    } else {
        validate(&config).err().into_iter().collect()
    };
    let rows: Vec<DefectRow> = defects.iter().map(DefectRow::from).collect();

    match format {
        OutputFormat::Table if rows.is_empty() => output::print_success(&format!(
            "Policy is valid: {} roles, {} permissions, {} resources, {} actions",
            config.roles.len(),
            config.permissions.len(),
            config.resources.len(),
            config.actions.len()
        )),
        OutputFormat::Table => output::print_list(&rows, format)?,
        _ => output::print_item(
            &Report {
                valid: rows.is_empty(),
                errors: &rows,
            },
            format,
        )?,
    }

    if !rows.is_empty() {
        bail!("Policy is invalid ({} error(s))", rows.len());
    }
    Ok(())
}
