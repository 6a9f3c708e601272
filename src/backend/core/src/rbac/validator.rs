//! Policy validation.
//!
//! Checks run in a fixed order:
//!
//! 1. roles, permissions, resources and actions are all non-empty
//! 2. no duplicate names within any of those four sets
//! 3. no two roles share a level
//! 4. no role has an empty name
//! 5-7. capability keys and values reference declared roles, resources, actions
//! 8. the permission ↔ action mapping references declared values
//! 9. no permission or action appears twice in the mapping
//! 10. the API-key scope, when present, references declared resources

use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use super::error::{ConfigError, ConfigErrors};
use super::models::PolicyConfig;

/// Validate a policy, stopping at the first defect.
pub fn validate(config: &PolicyConfig) -> Result<(), ConfigError> {
    match collect(config).into_iter().next() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

/// Validate a policy and report every defect, in the order [`validate`]
/// would encounter them.
pub fn validate_all(config: &PolicyConfig) -> Result<(), ConfigErrors> {
    let errors = collect(config);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigErrors::new(errors))
    }
}

fn collect(config: &PolicyConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    // 1. Structural
    let sets = [
        ("roles", config.roles.is_empty()),
        ("permissions", config.permissions.is_empty()),
        ("resources", config.resources.is_empty()),
        ("actions", config.actions.is_empty()),
    ];
    for (field, empty) in sets {
        if empty {
            errors.push(ConfigError::EmptySet { field });
        }
    }

    // 2. Duplicate names
    let role_names: Vec<&str> = config.roles.iter().map(|r| r.name.as_str()).collect();
    push_duplicates(&mut errors, "role", &role_names);
    push_duplicates(&mut errors, "permission", &config.permissions);
    push_duplicates(&mut errors, "resource", &config.resources);
    push_duplicates(&mut errors, "action", &config.actions);

    // 3. Duplicate levels
    let mut levels: HashMap<i32, &str> = HashMap::new();
    for role in &config.roles {
        if let Some(first) = levels.insert(role.level, role.name.as_str()) {
            errors.push(ConfigError::DuplicateLevel {
                level: role.level,
                first: first.to_string(),
                second: role.name.to_string(),
            });
        }
    }

    // 4. Blank role names
    for (index, role) in config.roles.iter().enumerate() {
        if role.name.is_empty() {
            errors.push(ConfigError::EmptyRoleName { index });
        }
    }

    let roles: HashSet<&str> = role_names.iter().copied().collect();
    let permissions: HashSet<&str> = config.permissions.iter().map(|p| p.as_str()).collect();
    let resources: HashSet<&str> = config.resources.iter().map(|r| r.as_str()).collect();
    let actions: HashSet<&str> = config.actions.iter().map(|a| a.as_str()).collect();

    // 5-7. Capabilities
    for (role, grants) in &config.capabilities {
        if !roles.contains(role.as_str()) {
            errors.push(ConfigError::UnknownRole {
                field: "capabilities".to_string(),
                value: role.to_string(),
            });
        }
        for (resource, granted) in grants {
            if !resources.contains(resource.as_str()) {
                errors.push(ConfigError::UnknownResource {
                    field: format!("capabilities.{}", role),
                    value: resource.to_string(),
                });
            }
            for action in granted {
                if !actions.contains(action.as_str()) {
                    errors.push(ConfigError::UnknownAction {
                        field: format!("capabilities.{}.{}", role, resource),
                        value: action.to_string(),
                    });
                }
            }
        }
    }

    // 8. Mapping references
    let mappings = &config.permission_to_action;
    for mapping in mappings {
        if !permissions.contains(mapping.permission.as_str()) {
            errors.push(ConfigError::UnknownPermission {
                field: "permission_to_action".to_string(),
                value: mapping.permission.to_string(),
            });
        }
        if !actions.contains(mapping.action.as_str()) {
            errors.push(ConfigError::UnknownAction {
                field: "permission_to_action".to_string(),
                value: mapping.action.to_string(),
            });
        }
    }

    // 9. Bijection
    for dup in duplicates(mappings.iter().map(|m| m.permission.as_str())) {
        errors.push(ConfigError::DuplicateMappedPermission(dup.to_string()));
    }
    for dup in duplicates(mappings.iter().map(|m| m.action.as_str())) {
        errors.push(ConfigError::DuplicateMappedAction(dup.to_string()));
    }

    // 10. API-key scope
    if let Some(scope) = &config.api_key_scope {
        for resource in &scope.allowed_resources {
            if !resources.contains(resource.as_str()) {
                errors.push(ConfigError::UnknownResource {
                    field: "api_key_scope".to_string(),
                    value: resource.to_string(),
                });
            }
        }
    }

    errors
}

fn push_duplicates<T: Borrow<str>>(
    errors: &mut Vec<ConfigError>,
    field: &'static str,
    values: &[T],
) {
    for dup in duplicates(values.iter().map(Borrow::<str>::borrow)) {
        errors.push(ConfigError::DuplicateName {
            field,
            value: dup.to_string(),
        });
    }
}

/// Every value seen more than once, reported at its second occurrence.
fn duplicates<T: Eq + Hash + Copy>(values: impl Iterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    values.filter(|v| !seen.insert(*v)).collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
