//! RBAC data models: identifiers, role definitions, the policy configuration,
//! and the authenticated subject evaluated by the checker.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use super::error::{ConfigError, DenyError};

// ═══════════════════════════════════════════════════════════════════════════════
// Identifiers
// ═══════════════════════════════════════════════════════════════════════════════

/// Declares a strongly-typed string identifier.
///
/// The four identifier kinds share a representation but must never be mixed
/// up at call sites, so each one gets its own newtype.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// A named privilege tier, e.g. `admin` or `viewer`.
    Role
}

string_id! {
    /// A coarse grant understood by API-key subjects, e.g. `read`.
    Permission
}

string_id! {
    /// The object type an action is performed against, e.g. `document`.
    Resource
}

string_id! {
    /// A fine-grained operation checked against role capabilities, e.g. `write`.
    Action
}

// ═══════════════════════════════════════════════════════════════════════════════
// Policy building blocks
// ═══════════════════════════════════════════════════════════════════════════════

/// A role together with its position in the privilege order.
///
/// Higher levels carry more privilege. Levels are unique across a policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    pub name: Role,
    pub level: i32,
}

impl RoleDefinition {
    pub fn new(name: impl Into<Role>, level: i32) -> Self {
        Self {
            name: name.into(),
            level,
        }
    }
}

/// One pair of the permission ↔ action bijection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionMapping {
    pub permission: Permission,
    pub action: Action,
}

impl PermissionMapping {
    pub fn new(permission: impl Into<Permission>, action: impl Into<Action>) -> Self {
        Self {
            permission: permission.into(),
            action: action.into(),
        }
    }
}

/// Resources reachable by API-key subjects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyScope {
    #[serde(default)]
    pub allowed_resources: Vec<Resource>,
}

impl ApiKeyScope {
    pub fn new<I, R>(resources: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Resource>,
    {
        Self {
            allowed_resources: resources.into_iter().map(Into::into).collect(),
        }
    }
}

/// Role → resource → actions that role may perform on that resource.
pub type Capabilities = BTreeMap<Role, BTreeMap<Resource, Vec<Action>>>;

// ═══════════════════════════════════════════════════════════════════════════════
// Policy configuration
// ═══════════════════════════════════════════════════════════════════════════════

/// The complete policy: the sole input from which a checker is built.
///
/// Every cross-reference (capability keys and values, bijection entries,
/// API-key scope) must name a value from the declared sets. Run
/// [`PolicyConfig::validate`] or build a [`Checker`](super::Checker) to
/// enforce that.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub roles: Vec<RoleDefinition>,
    pub permissions: Vec<Permission>,
    pub resources: Vec<Resource>,
    pub actions: Vec<Action>,

    #[serde(default)]
    pub capabilities: Capabilities,

    #[serde(default)]
    pub permission_to_action: Vec<PermissionMapping>,

    /// `None` denies every API-key subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_scope: Option<ApiKeyScope>,
}

impl PolicyConfig {
    /// Start an empty policy; populate it with the builder methods below.
    pub fn builder() -> Self {
        Self::default()
    }

    pub fn role(mut self, name: impl Into<Role>, level: i32) -> Self {
        self.roles.push(RoleDefinition::new(name, level));
        self
    }

    pub fn permissions<I, P>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        self.permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    pub fn resources<I, R>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Resource>,
    {
        self.resources.extend(resources.into_iter().map(Into::into));
        self
    }

    pub fn actions<I, A>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Action>,
    {
        self.actions.extend(actions.into_iter().map(Into::into));
        self
    }

    /// Grant `role` the given actions on `resource`, merging with earlier grants.
    pub fn grant<I, A>(
        mut self,
        role: impl Into<Role>,
        resource: impl Into<Resource>,
        actions: I,
    ) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Action>,
    {
        self.capabilities
            .entry(role.into())
            .or_default()
            .entry(resource.into())
            .or_default()
            .extend(actions.into_iter().map(Into::into));
        self
    }

    pub fn map_permission(
        mut self,
        permission: impl Into<Permission>,
        action: impl Into<Action>,
    ) -> Self {
        self.permission_to_action
            .push(PermissionMapping::new(permission, action));
        self
    }

    pub fn api_key_scope<I, R>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Resource>,
    {
        self.api_key_scope = Some(ApiKeyScope::new(resources));
        self
    }

    /// Check internal consistency; see [`validate`](super::validator::validate).
    pub fn validate(&self) -> Result<(), ConfigError> {
        super::validator::validate(self)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Authenticated subject
// ═══════════════════════════════════════════════════════════════════════════════

/// How the caller was authenticated upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    /// Role-carrying token; checked against role capabilities.
    Jwt,
    /// Permission-carrying key; checked against the API-key scope.
    ApiKey,
}

impl AuthType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jwt => "jwt",
            Self::ApiKey => "api_key",
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthType {
    type Err = DenyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jwt" => Ok(Self::Jwt),
            "api_key" => Ok(Self::ApiKey),
            other => Err(DenyError::UnknownAuthType(other.to_string())),
        }
    }
}

/// One authenticated caller for the duration of a single query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthSubject {
    Jwt { role: Role },
    ApiKey {
        #[serde(default)]
        permissions: HashSet<Permission>,
    },
}

impl AuthSubject {
    pub fn jwt(role: impl Into<Role>) -> Self {
        Self::Jwt { role: role.into() }
    }

    pub fn api_key<I, P>(permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        Self::ApiKey {
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a subject from the loosely-typed pieces an identity layer hands over.
    ///
    /// Fails with [`DenyError::UnknownAuthType`] when `auth_type` names neither
    /// variant. A missing role on a JWT subject becomes the empty role, which
    /// every query then denies.
    pub fn from_parts<I, P>(
        auth_type: &str,
        role: Option<&str>,
        permissions: I,
    ) -> Result<Self, DenyError>
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        Ok(match auth_type.parse::<AuthType>()? {
            AuthType::Jwt => Self::jwt(role.unwrap_or_default()),
            AuthType::ApiKey => Self::api_key(permissions),
        })
    }

    pub fn auth_type(&self) -> AuthType {
        match self {
            Self::Jwt { .. } => AuthType::Jwt,
            Self::ApiKey { .. } => AuthType::ApiKey,
        }
    }

    /// The role carried by a JWT subject.
    pub fn role(&self) -> Option<&Role> {
        match self {
            Self::Jwt { role } => Some(role),
            Self::ApiKey { .. } => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_conversions() {
        let role = Role::from("admin");
        assert_eq!(role.as_str(), "admin");
        assert_eq!(role.to_string(), "admin");
        assert_eq!(role, Role::new(String::from("admin")));
        assert!(Action::default().is_empty());
    }

    #[test]
    fn test_identifier_serde_is_transparent() {
        let json = serde_json::to_string(&Resource::new("document")).unwrap();
        assert_eq!(json, "\"document\"");
        let back: Resource = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_str(), "document");
    }

    #[test]
    fn test_builder_merges_grants() {
        let config = PolicyConfig::builder()
            .role("admin", 2)
            .grant("admin", "document", ["read"])
            .grant("admin", "document", ["write"]);

        let actions = &config.capabilities[&Role::new("admin")][&Resource::new("document")];
        assert_eq!(actions, &vec![Action::new("read"), Action::new("write")]);
    }

    #[test]
    fn test_auth_type_parse() {
        assert_eq!("jwt".parse::<AuthType>().unwrap(), AuthType::Jwt);
        assert_eq!("api_key".parse::<AuthType>().unwrap(), AuthType::ApiKey);
        assert!(matches!(
            "basic".parse::<AuthType>(),
            Err(DenyError::UnknownAuthType(t)) if t == "basic"
        ));
    }

    #[test]
    fn test_auth_type_parse_matches_serde() {
        for spelling in ["jwt", "api_key", "JWT", "APIKey", "apikey", "ApiKey"] {
            let parsed = spelling.parse::<AuthType>().ok();
            let quoted = format!("\"{}\"", spelling);
            let decoded = serde_json::from_str::<AuthType>(&quoted).ok();
            assert_eq!(parsed, decoded, "{} disagrees", spelling);
        }

        for auth_type in [AuthType::Jwt, AuthType::ApiKey] {
            let json = serde_json::to_string(&auth_type).unwrap();
            assert_eq!(json, format!("\"{}\"", auth_type));
        }
    }

    #[test]
    fn test_subject_from_parts() {
        let jwt = AuthSubject::from_parts("jwt", Some("viewer"), Vec::<String>::new())
            .unwrap();
        assert_eq!(jwt, AuthSubject::jwt("viewer"));
        assert_eq!(jwt.auth_type(), AuthType::Jwt);

        let key = AuthSubject::from_parts("api_key", None, ["read"]).unwrap();
        assert_eq!(key.auth_type(), AuthType::ApiKey);
        assert!(key.role().is_none());

        let missing_role = AuthSubject::from_parts("jwt", None, Vec::<String>::new())
            .unwrap();
        assert_eq!(missing_role.role().map(Role::is_empty), Some(true));

        assert!(AuthSubject::from_parts("session", None, Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_subject_serde_tagging() {
        let subject: AuthSubject =
            serde_json::from_str(r#"{"type":"api_key","permissions":["read"]}"#).unwrap();
        assert_eq!(subject, AuthSubject::api_key(["read"]));

        let subject: AuthSubject =
            serde_json::from_str(r#"{"type":"jwt","role":"admin"}"#).unwrap();
        assert_eq!(subject, AuthSubject::jwt("admin"));
    }

    #[test]
    fn test_policy_config_deserialize_defaults() {
        let config: PolicyConfig = serde_json::from_str(
            r#"{
                "roles": [{"name": "admin", "level": 1}],
                "permissions": ["read"],
                "resources": ["document"],
                "actions": ["read"]
            }"#,
        )
        .unwrap();

        assert!(config.capabilities.is_empty());
        assert!(config.permission_to_action.is_empty());
        assert!(config.api_key_scope.is_none());
    }
}
