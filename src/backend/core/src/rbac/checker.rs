//! The authorization checker.
//!
//! A [`Checker`] is compiled once from a validated [`PolicyConfig`] and is
//! read-only afterwards. Every query is a handful of hash lookups, and the
//! checker can be shared across threads behind an `Arc` without locking.
//!
//! ```rust,ignore
//! use gatekeeper_core::rbac::{AuthSubject, Checker, PolicyConfig};
//!
//! let checker = Checker::new(config)?;
//! checker.authorize(&AuthSubject::jwt("viewer"), &"document".into(), &"read".into())?;
//! ```

use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use super::error::{ConfigError, DenyError};
use super::models::{Action, AuthSubject, Permission, PolicyConfig, Resource, Role};
use super::validator;

/// Compiled, immutable authorization tables.
#[derive(Debug, Clone)]
pub struct Checker {
    /// Role → privilege level. Also the set of valid roles.
    role_levels: HashMap<Role, i32>,

    /// Role → resource → permitted actions.
    capabilities: HashMap<Role, HashMap<Resource, HashSet<Action>>>,

    permission_to_action: HashMap<Permission, Action>,
    action_to_permission: HashMap<Action, Permission>,

    valid_permissions: HashSet<Permission>,

    /// `None` when the policy declares no API-key scope: every API-key
    /// subject is denied.
    api_key_resources: Option<HashSet<Resource>>,
}

impl Checker {
    /// Validate `config` and compile it.
    pub fn new(config: PolicyConfig) -> Result<Self, ConfigError> {
        validator::validate(&config)?;
        Ok(Self::compile(config))
    }

    /// Like [`Checker::new`], but panics on an invalid policy.
    ///
    /// Only for policies known at build time, such as the bundled presets.
    /// Never feed it runtime-supplied configuration.
    pub fn new_or_panic(config: PolicyConfig) -> Self {
        match Self::new(config) {
            Ok(checker) => checker,
            Err(e) => panic!("invalid RBAC policy: {}", e),
        }
    }

    fn compile(config: PolicyConfig) -> Self {
        let role_levels: HashMap<Role, i32> = config
            .roles
            .into_iter()
            .map(|def| (def.name, def.level))
            .collect();

        let capabilities: HashMap<Role, HashMap<Resource, HashSet<Action>>> = config
            .capabilities
            .into_iter()
            .map(|(role, grants)| {
                let grants = grants
                    .into_iter()
                    .map(|(resource, actions)| (resource, actions.into_iter().collect()))
                    .collect();
                (role, grants)
            })
            .collect();

        let mut permission_to_action = HashMap::new();
        let mut action_to_permission = HashMap::new();
        for mapping in config.permission_to_action {
            permission_to_action.insert(mapping.permission.clone(), mapping.action.clone());
            action_to_permission.insert(mapping.action, mapping.permission);
        }

        let api_key_resources = config
            .api_key_scope
            .map(|scope| scope.allowed_resources.into_iter().collect());

        info!(
            roles = role_levels.len(),
            permissions = config.permissions.len(),
            resources = config.resources.len(),
            actions = config.actions.len(),
            api_key_access = api_key_resources.is_some(),
            "Compiled RBAC policy"
        );

        Self {
            role_levels,
            capabilities,
            permission_to_action,
            action_to_permission,
            valid_permissions: config.permissions.into_iter().collect(),
            api_key_resources,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authorization
    // ─────────────────────────────────────────────────────────────────────────

    /// Decide whether `subject` may perform `action` on `resource`.
    ///
    /// Anything not explicitly granted is denied.
    pub fn authorize<'a>(
        &self,
        subject: impl Into<Option<&'a AuthSubject>>,
        resource: &Resource,
        action: &Action,
    ) -> Result<(), DenyError> {
        let subject = subject.into().ok_or(DenyError::NilSubject)?;

        let result = match subject {
            AuthSubject::Jwt { role } => self.authorize_role(role, resource, action),
            AuthSubject::ApiKey { permissions } => {
                self.authorize_api_key(permissions, resource, action)
            }
        };

        match &result {
            Ok(()) => debug!(
                auth_type = %subject.auth_type(),
                resource = %resource,
                action = %action,
                "Access granted"
            ),
            Err(e) => debug!(
                auth_type = %subject.auth_type(),
                resource = %resource,
                action = %action,
                reason = %e,
                "Access denied"
            ),
        }

        result
    }

    fn authorize_role(
        &self,
        role: &Role,
        resource: &Resource,
        action: &Action,
    ) -> Result<(), DenyError> {
        if role.is_empty() {
            return Err(DenyError::InvalidRole(String::new()));
        }

        let granted = self
            .capabilities
            .get(role)
            .and_then(|grants| grants.get(resource))
            .is_some_and(|actions| actions.contains(action));

        if granted {
            Ok(())
        } else {
            Err(DenyError::denied(format!(
                "role {} may not {} {}",
                role, action, resource
            )))
        }
    }

    fn authorize_api_key(
        &self,
        permissions: &HashSet<Permission>,
        resource: &Resource,
        action: &Action,
    ) -> Result<(), DenyError> {
        let allowed = self
            .api_key_resources
            .as_ref()
            .ok_or_else(|| DenyError::denied("API-key access is not configured"))?;

        if !allowed.contains(resource) {
            return Err(DenyError::denied(format!(
                "resource {} is outside the API-key scope",
                resource
            )));
        }

        let required = self.action_to_permission(action).ok_or_else(|| {
            DenyError::denied(format!("action {} is not exposed to API keys", action))
        })?;

        if !has_permission(permissions, required) {
            return Err(DenyError::denied(format!(
                "API key lacks permission {}",
                required
            )));
        }

        Ok(())
    }

    /// `true` iff [`Checker::authorize`] succeeds.
    pub fn is_authorized<'a>(
        &self,
        subject: impl Into<Option<&'a AuthSubject>>,
        resource: &Resource,
        action: &Action,
    ) -> bool {
        self.authorize(subject, resource, action).is_ok()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Role hierarchy
    // ─────────────────────────────────────────────────────────────────────────

    /// Require a JWT subject whose role is at least as privileged as `min_role`.
    ///
    /// API-key subjects never pass: they carry permissions, not a role.
    pub fn require_role<'a>(
        &self,
        subject: impl Into<Option<&'a AuthSubject>>,
        min_role: &Role,
    ) -> Result<(), DenyError> {
        let role = match subject.into().ok_or(DenyError::NilSubject)? {
            AuthSubject::Jwt { role } => role,
            AuthSubject::ApiKey { .. } => {
                return Err(DenyError::denied("role check requires a JWT subject"));
            }
        };

        let level = self
            .role_level(role)
            .ok_or_else(|| DenyError::InvalidRole(role.to_string()))?;
        let min_level = self
            .role_level(min_role)
            .ok_or_else(|| DenyError::InvalidRole(min_role.to_string()))?;

        if level >= min_level {
            Ok(())
        } else {
            debug!(role = %role, min_role = %min_role, "Role below required level");
            Err(DenyError::denied(format!(
                "role {} is below required role {}",
                role, min_role
            )))
        }
    }

    /// `true` iff both roles are declared and `a` is at least as privileged as `b`.
    pub fn is_role_elevated(&self, a: &Role, b: &Role) -> bool {
        match (self.role_level(a), self.role_level(b)) {
            (Some(a), Some(b)) => a >= b,
            _ => false,
        }
    }

    /// Resolve a raw role string to a declared role.
    pub fn validate_role(&self, role: &str) -> Result<Role, DenyError> {
        self.role_levels
            .get_key_value(role)
            .map(|(role, _)| role.clone())
            .ok_or_else(|| DenyError::InvalidRole(role.to_string()))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Permissions
    // ─────────────────────────────────────────────────────────────────────────

    /// Reject an empty permission list or one naming an undeclared permission.
    pub fn validate_permissions<'a, I>(&self, permissions: I) -> Result<(), DenyError>
    where
        I: IntoIterator<Item = &'a Permission>,
    {
        let mut count = 0usize;
        for permission in permissions {
            if !self.valid_permissions.contains(permission) {
                return Err(DenyError::InvalidPermission(permission.to_string()));
            }
            count += 1;
        }

        if count == 0 {
            return Err(DenyError::InvalidPermission("empty permission set".to_string()));
        }
        Ok(())
    }

    /// The action a permission grants, if the permission is mapped.
    pub fn permission_to_action(&self, permission: &Permission) -> Option<&Action> {
        self.permission_to_action.get(permission)
    }

    /// The permission an API key needs for an action, if the action is exposed.
    pub fn action_to_permission(&self, action: &Action) -> Option<&Permission> {
        self.action_to_permission.get(action)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Introspection
    // ─────────────────────────────────────────────────────────────────────────

    pub fn role_level(&self, role: &Role) -> Option<i32> {
        self.role_levels.get(role).copied()
    }

    /// Declared roles, most privileged first.
    pub fn roles_by_level(&self) -> Vec<(&Role, i32)> {
        let mut roles: Vec<_> = self.role_levels.iter().map(|(r, l)| (r, *l)).collect();
        roles.sort_by(|a, b| b.1.cmp(&a.1));
        roles
    }

    /// Actions `role` may perform on `resource`, sorted by name.
    pub fn allowed_actions(&self, role: &Role, resource: &Resource) -> Vec<&Action> {
        let mut actions: Vec<&Action> = self
            .capabilities
            .get(role)
            .and_then(|grants| grants.get(resource))
            .map(|actions| actions.iter().collect())
            .unwrap_or_default();
        actions.sort();
        actions
    }

    pub fn api_key_access_enabled(&self) -> bool {
        self.api_key_resources.is_some()
    }
}

impl TryFrom<PolicyConfig> for Checker {
    type Error = ConfigError;

    fn try_from(config: PolicyConfig) -> Result<Self, Self::Error> {
        Self::new(config)
    }
}

/// `true` iff `required` is in `permissions`.
pub fn has_permission(permissions: &HashSet<Permission>, required: &Permission) -> bool {
    permissions.contains(required)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
