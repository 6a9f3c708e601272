//! Role-Based Access Control (RBAC) decision engine.
//!
//! This module provides:
//! - **Models**: Role, Permission, Resource and Action identifiers, the
//!   policy configuration, and the authenticated subject
//! - **Validator**: rejects malformed or self-inconsistent policies
//! - **Checker**: compiles a validated policy into lookup tables and answers
//!   authorization queries
//! - **Presets**: ready-made file-management, CMS and e-commerce policies
//! - **Loader**: reads policies from TOML, JSON or YAML
//! - **Authorization Middleware**: Axum layers that enforce checker decisions
//!
//! # Usage
//!
//! ```rust,ignore
//! use gatekeeper_core::rbac::{AuthSubject, Checker, Preset};
//!
//! let checker = Preset::FileManagement.checker();
//!
//! let viewer = AuthSubject::jwt("viewer");
//! assert!(checker.is_authorized(&viewer, &"file".into(), &"read".into()));
//! assert!(!checker.is_authorized(&viewer, &"file".into(), &"write".into()));
//! ```

pub mod checker;
pub mod error;
pub mod loader;
pub mod middleware;
pub mod models;
pub mod presets;
pub mod validator;

pub use checker::{has_permission, Checker};
pub use error::{ConfigError, ConfigErrorCategory, ConfigErrors, DenyError, DenyKind};
pub use loader::{load_policy, parse_policy, render_policy, PolicyFormat, PolicyLoadError};
pub use middleware::{RbacContext, RbacService, RequireAccessLayer, RequireRoleLayer};
pub use models::{
    Action, ApiKeyScope, AuthSubject, AuthType, Capabilities, Permission, PermissionMapping,
    PolicyConfig, Resource, Role, RoleDefinition,
};
pub use presets::Preset;
pub use validator::{validate, validate_all};
