#![allow(clippy::result_large_err)]
//! # Gatekeeper Core
//!
//! A configuration-driven Role-Based Access Control decision engine.
//!
//! ## Architecture
//!
//! - **Policy Validator**: rejects policies with missing sets, duplicates or
//!   dangling references
//! - **Authorization Checker**: compiles a validated policy once and answers
//!   role-capability and API-key-scope queries with pure lookups
//! - **Presets**: bundled file-management, CMS and e-commerce policies
//! - **Middleware**: Axum layers that turn decisions into 401/403 responses
//! - **Logging / Settings**: tracing subscriber setup and host configuration

pub mod error;
pub mod logging;
pub mod rbac;
pub mod settings;

pub use error::{ErrorCode, GatekeeperError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{ErrorCode, GatekeeperError, Result};
    pub use crate::rbac::{
        has_permission, validate, validate_all, Action, ApiKeyScope, AuthSubject, AuthType, Checker,
        ConfigError, ConfigErrors, DenyError, DenyKind, Permission, PermissionMapping, PolicyConfig,
        Preset, RbacContext, RequireAccessLayer, RequireRoleLayer, Resource, Role, RoleDefinition,
    };
}
