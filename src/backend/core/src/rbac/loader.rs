//! Reading policies from TOML, JSON or YAML files.
//!
//! Loading only parses; pass the result to [`Checker::new`](super::Checker::new)
//! to validate and compile it.

use std::path::Path;
use thiserror::Error;
use tracing::debug;

use super::models::PolicyConfig;

/// Errors raised while reading a policy file.
#[derive(Debug, Error)]
pub enum PolicyLoadError {
    #[error("Failed to read policy file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported policy file extension: {0} (expected toml, json, yaml or yml)")]
    UnsupportedFormat(String),

    #[error("Failed to parse {format} policy: {message}")]
    Parse {
        format: PolicyFormat,
        message: String,
    },
}

/// On-disk policy encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyFormat {
    Toml,
    Json,
    Yaml,
}

impl PolicyFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, PolicyLoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        match ext.as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(PolicyLoadError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

impl std::fmt::Display for PolicyFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
            Self::Yaml => "YAML",
        })
    }
}

/// Parse a policy from text in the given format.
pub fn parse_policy(text: &str, format: PolicyFormat) -> Result<PolicyConfig, PolicyLoadError> {
    let parse_err = |message: String| PolicyLoadError::Parse { format, message };

    match format {
        PolicyFormat::Toml => toml::from_str(text).map_err(|e| parse_err(e.to_string())),
        PolicyFormat::Json => serde_json::from_str(text).map_err(|e| parse_err(e.to_string())),
        PolicyFormat::Yaml => serde_yaml::from_str(text).map_err(|e| parse_err(e.to_string())),
    }
}

/// Read and parse a policy file, choosing the format by extension.
pub fn load_policy(path: impl AsRef<Path>) -> Result<PolicyConfig, PolicyLoadError> {
    let path = path.as_ref();
    let format = PolicyFormat::from_path(path)?;

    let text = std::fs::read_to_string(path).map_err(|source| PolicyLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;

    debug!(path = %path.display(), format = %format, "Loading policy file");
    parse_policy(&text, format)
}

/// Render a policy in the given format.
pub fn render_policy(
    config: &PolicyConfig,
    format: PolicyFormat,
) -> Result<String, PolicyLoadError> {
    let err = |message: String| PolicyLoadError::Parse { format, message };

    match format {
        PolicyFormat::Toml => toml::to_string_pretty(config).map_err(|e| err(e.to_string())),
        PolicyFormat::Json => serde_json::to_string_pretty(config).map_err(|e| err(e.to_string())),
        PolicyFormat::Yaml => serde_yaml::to_string(config).map_err(|e| err(e.to_string())),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
