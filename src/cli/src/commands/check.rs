//! Authorization queries against a policy.
//!
//! `check` evaluates a single (subject, resource, action) triple;
//! `require-role` evaluates the role hierarchy. Both print the internal
//! denial reason, which a request-serving host would never expose.

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use gatekeeper_core::rbac::{Action, AuthSubject, AuthType, DenyError, Permission, Resource, Role};
use gatekeeper_core::settings::Settings;

use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct CheckArgs {
    /// Policy file (.toml, .json, .yaml)
    file: Option<PathBuf>,

    /// Resource being accessed
    #[arg(short, long)]
    resource: String,

    /// Action being performed
    #[arg(short, long)]
    action: String,

    /// Evaluate as a JWT subject carrying this role
    #[arg(long, conflicts_with = "permissions", required_unless_present = "permissions")]
    role: Option<String>,

    /// Evaluate as an API-key subject holding these permissions
    #[arg(short, long = "permission", value_delimiter = ',')]
    permissions: Vec<String>,
}

#[derive(Args)]
pub struct RequireRoleArgs {
    /// Policy file (.toml, .json, .yaml)
    file: Option<PathBuf>,

    /// Role carried by the subject
    #[arg(long)]
    role: String,

    /// Minimum role required
    #[arg(long)]
    min_role: String,
}

/// Serialized outcome of a query.
#[derive(Debug, Serialize)]
struct Decision {
    allowed: bool,
    auth_type: AuthType,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    permissions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl Decision {
    fn new(subject: &AuthSubject, result: &Result<(), DenyError>) -> Self {
        let mut permissions = match subject {
            AuthSubject::ApiKey { permissions } => {
                permissions.iter().map(|p| p.to_string()).collect()
            }
            AuthSubject::Jwt { .. } => Vec::new(),
        };
        permissions.sort();

        Self {
            allowed: result.is_ok(),
            auth_type: subject.auth_type(),
            role: subject.role().map(|r| r.to_string()),
            permissions,
            resource: None,
            action: None,
            min_role: None,
            reason: result.as_ref().err().map(|e| e.to_string()),
        }
    }

    fn print(&self, format: OutputFormat) -> Result<()> {
        if format != OutputFormat::Table {
            return output::print_item(self, format);
        }

        output::print_verdict(self.allowed);
        output::print_detail("Auth type", &self.auth_type.to_string());
        if let Some(role) = &self.role {
            output::print_detail("Role", role);
        }
        if !self.permissions.is_empty() {
            output::print_detail("Permissions", &self.permissions.join(", "));
        }
        if let Some(resource) = &self.resource {
            output::print_detail("Resource", resource);
        }
        if let Some(action) = &self.action {
            output::print_detail("Action", action);
        }
        if let Some(min_role) = &self.min_role {
            output::print_detail("Minimum role", min_role);
        }
        if let Some(reason) = &self.reason {
            output::print_detail("Reason", reason);
        }
        Ok(())
    }
}

pub fn execute(args: CheckArgs, settings: &Settings, format: OutputFormat) -> Result<()> {
    let (_, checker) = super::resolve_checker(args.file.as_deref(), settings)?;

    let subject = match args.role {
        Some(role) => AuthSubject::jwt(role),
        None => {
            let permissions: Vec<Permission> =
                args.permissions.into_iter().map(Permission::new).collect();
            if let Err(e) = checker.validate_permissions(&permissions) {
                output::print_warning(&format!("API key would be rejected at issuance: {}", e));
            }
            AuthSubject::api_key(permissions)
        }
    };

    let resource = Resource::new(args.resource);
    let action = Action::new(args.action);
    let result = checker.authorize(&subject, &resource, &action);

    let decision = Decision {
        resource: Some(resource.to_string()),
        action: Some(action.to_string()),
        ..Decision::new(&subject, &result)
    };
    decision.print(format)?;

    if !decision.allowed {
        bail!("Access denied");
    }
    Ok(())
}

pub fn execute_require_role(
    args: RequireRoleArgs,
    settings: &Settings,
    format: OutputFormat,
) -> Result<()> {
    let (_, checker) = super::resolve_checker(args.file.as_deref(), settings)?;

    let subject = AuthSubject::jwt(args.role);
    let min_role = Role::new(args.min_role);
    let result = checker.require_role(&subject, &min_role);

    let decision = Decision {
        min_role: Some(min_role.to_string()),
        ..Decision::new(&subject, &result)
    };
    decision.print(format)?;

    if !decision.allowed {
        bail!("Role requirement not met");
    }
    Ok(())
}
