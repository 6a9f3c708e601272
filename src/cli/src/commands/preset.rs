//! Bundled policy presets.
//!
//! `preset show` prints a preset as a policy file that can be saved and
//! edited as the starting point of a custom policy.

use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use serde::Serialize;
use tabled::Tabled;

use gatekeeper_core::rbac::{render_policy, PolicyFormat, Preset};

use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum PresetCommands {
    /// List bundled presets
    List,

    /// Print a preset as a policy file
    Show {
        /// Preset identifier (e.g., file-management)
        id: String,

        /// Policy file format
        #[arg(short, long, default_value = "toml")]
        format: FileFormat,
    },
}

/// Policy file encodings accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FileFormat {
    Toml,
    Json,
    Yaml,
}

impl From<FileFormat> for PolicyFormat {
    fn from(format: FileFormat) -> Self {
        match format {
            FileFormat::Toml => Self::Toml,
            FileFormat::Json => Self::Json,
            FileFormat::Yaml => Self::Yaml,
        }
    }
}

#[derive(Tabled, Serialize)]
struct PresetRow {
    #[tabled(rename = "ID")]
    id: &'static str,
    #[tabled(rename = "Name")]
    name: &'static str,
    #[tabled(rename = "Roles")]
    roles: usize,
    #[tabled(rename = "Resources")]
    resources: usize,
    #[tabled(rename = "Description")]
    description: &'static str,
}

pub fn execute(cmd: PresetCommands, format: OutputFormat) -> Result<()> {
    match cmd {
        PresetCommands::List => {
            let rows: Vec<PresetRow> = Preset::all()
                .into_iter()
                .map(|preset| {
                    let config = preset.config();
                    PresetRow {
                        id: preset.id(),
                        name: preset.name(),
                        roles: config.roles.len(),
                        resources: config.resources.len(),
                        description: preset.description(),
                    }
                })
                .collect();
            output::print_list(&rows, format)?;
        }

        PresetCommands::Show {
            id,
            format: file_format,
        } => {
            let preset: Preset = id.parse().map_err(anyhow::Error::msg)?;
            let text = render_policy(&preset.config(), file_format.into())
                .with_context(|| format!("Failed to render preset {}", preset))?;
            print!("{}", text);
            if !text.ends_with('\n') {
                println!();
            }
        }
    }

    Ok(())
}
