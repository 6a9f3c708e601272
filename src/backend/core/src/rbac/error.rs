//! Configuration and denial errors.
//!
//! Configuration errors surface only while a policy is validated or compiled.
//! Denials are the expected negative outcome of a query; their `Display`
//! output carries internal detail for logs, while
//! [`DenyError::public_message`] is safe to return to the caller.

use std::fmt;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// Configuration errors
// ═══════════════════════════════════════════════════════════════════════════════

/// A defect in a [`PolicyConfig`](super::PolicyConfig).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field} must not be empty")]
    EmptySet { field: &'static str },

    #[error("duplicate {field}: {value}")]
    DuplicateName { field: &'static str, value: String },

    #[error("duplicate role level {level}: {first} and {second}")]
    DuplicateLevel {
        level: i32,
        first: String,
        second: String,
    },

    #[error("role name must not be empty (roles[{index}])")]
    EmptyRoleName { index: usize },

    #[error("unknown role: {value} (in {field})")]
    UnknownRole { field: String, value: String },

    #[error("unknown resource: {value} (in {field})")]
    UnknownResource { field: String, value: String },

    #[error("unknown action: {value} (in {field})")]
    UnknownAction { field: String, value: String },

    #[error("unknown permission: {value} (in {field})")]
    UnknownPermission { field: String, value: String },

    #[error("duplicate permission in mapping: {0}")]
    DuplicateMappedPermission(String),

    #[error("duplicate action in mapping: {0}")]
    DuplicateMappedAction(String),
}

/// Broad class of a configuration defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorCategory {
    /// A required set is missing.
    Structural,
    /// A name or level is repeated, or a name is blank.
    Integrity,
    /// A cross-reference names something that was never declared.
    Referential,
}

impl fmt::Display for ConfigErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Structural => "structural",
            Self::Integrity => "integrity",
            Self::Referential => "referential",
        })
    }
}

impl ConfigError {
    pub fn category(&self) -> ConfigErrorCategory {
        match self {
            Self::EmptySet { .. } => ConfigErrorCategory::Structural,
            Self::DuplicateName { .. }
            | Self::DuplicateLevel { .. }
            | Self::EmptyRoleName { .. }
            | Self::DuplicateMappedPermission(_)
            | Self::DuplicateMappedAction(_) => ConfigErrorCategory::Integrity,
            Self::UnknownRole { .. }
            | Self::UnknownResource { .. }
            | Self::UnknownAction { .. }
            | Self::UnknownPermission { .. } => ConfigErrorCategory::Referential,
        }
    }
}

/// Every defect found in one policy, in check order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigErrors(Vec<ConfigError>);

impl ConfigErrors {
    pub(crate) fn new(errors: Vec<ConfigError>) -> Self {
        Self(errors)
    }

    pub fn first(&self) -> Option<&ConfigError> {
        self.0.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConfigError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<ConfigError> {
        self.0
    }
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} policy error(s)", self.0.len())?;
        for error in &self.0 {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigErrors {}

impl IntoIterator for ConfigErrors {
    type Item = ConfigError;
    type IntoIter = std::vec::IntoIter<ConfigError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Denials
// ═══════════════════════════════════════════════════════════════════════════════

/// A negative authorization outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DenyError {
    /// No subject was supplied. Always a caller bug.
    #[error("nil auth subject")]
    NilSubject,

    #[error("invalid role: {0:?}")]
    InvalidRole(String),

    #[error("invalid permission: {0}")]
    InvalidPermission(String),

    #[error("unknown auth type: {0}")]
    UnknownAuthType(String),

    /// Capability or scope mismatch.
    #[error("access denied: {reason}")]
    Denied { reason: String },
}

/// The sentinel category a denial belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyKind {
    NilSubject,
    InvalidRole,
    InvalidPermission,
    Denied,
}

impl DenyError {
    pub(crate) fn denied(reason: impl Into<String>) -> Self {
        Self::Denied {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> DenyKind {
        match self {
            Self::NilSubject => DenyKind::NilSubject,
            Self::InvalidRole(_) => DenyKind::InvalidRole,
            Self::InvalidPermission(_) => DenyKind::InvalidPermission,
            Self::UnknownAuthType(_) | Self::Denied { .. } => DenyKind::Denied,
        }
    }

    /// Message for the unauthorized party; reveals nothing about the policy.
    pub fn public_message(&self) -> &'static str {
        match self.kind() {
            DenyKind::NilSubject => "Authentication required",
            DenyKind::InvalidRole | DenyKind::InvalidPermission | DenyKind::Denied => {
                "You do not have permission to perform this action"
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
