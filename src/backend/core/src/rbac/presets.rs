//! Bundled policy presets.
//!
//! Gatekeeper ships with three ready-made policies:
//!
//! | Preset          | Roles (high → low)                     | API-key scope     |
//! |-----------------|----------------------------------------|-------------------|
//! | FileManagement  | admin, editor, viewer                  | file, folder      |
//! | Cms             | admin, editor, author, reader          | article, page, media |
//! | Ecommerce       | admin, manager, support, customer      | product, order    |
//!
//! Presets are plain [`PolicyConfig`] values; nothing about them is special
//! to the engine.

use std::fmt;
use std::str::FromStr;

use super::checker::Checker;
use super::models::PolicyConfig;

/// Predefined policy templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    FileManagement,
    Cms,
    Ecommerce,
}

impl Preset {
    /// Get the preset identifier string.
    pub fn id(&self) -> &'static str {
        match self {
            Self::FileManagement => "file-management",
            Self::Cms => "cms",
            Self::Ecommerce => "ecommerce",
        }
    }

    /// Get the human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::FileManagement => "File Management",
            Self::Cms => "Content Management",
            Self::Ecommerce => "E-commerce",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::FileManagement => "Files, folders and shares with admin/editor/viewer tiers",
            Self::Cms => "Articles, pages, media and comments with an editorial workflow",
            Self::Ecommerce => "Catalog, orders, customers and inventory for a storefront",
        }
    }

    /// Return the policy for this preset.
    pub fn config(&self) -> PolicyConfig {
        match self {
            Self::FileManagement => PolicyConfig::builder()
                .role("admin", 3)
                .role("editor", 2)
                .role("viewer", 1)
                .permissions(["read", "write", "delete"])
                .resources(["file", "folder", "share"])
                .actions(["read", "write", "delete", "manage"])
                .grant("admin", "file", ["read", "write", "delete", "manage"])
                .grant("admin", "folder", ["read", "write", "delete", "manage"])
                .grant("admin", "share", ["read", "write", "delete", "manage"])
                .grant("editor", "file", ["read", "write"])
                .grant("editor", "folder", ["read", "write"])
                .grant("editor", "share", ["read"])
                .grant("viewer", "file", ["read"])
                .grant("viewer", "folder", ["read"])
                .map_permission("read", "read")
                .map_permission("write", "write")
                .map_permission("delete", "delete")
                // Shares are never reachable with an API key.
                .api_key_scope(["file", "folder"]),

            Self::Cms => {
                let publishing = ["read", "create", "update", "publish", "delete"];
                PolicyConfig::builder()
                    .role("admin", 4)
                    .role("editor", 3)
                    .role("author", 2)
                    .role("reader", 1)
                    .permissions(["read", "create", "update", "publish"])
                    .resources(["article", "page", "media", "comment"])
                    .actions(publishing)
                    .actions(["moderate"])
                    .grant("admin", "article", publishing)
                    .grant("admin", "page", publishing)
                    .grant("admin", "media", ["read", "create", "update", "delete"])
                    .grant("admin", "comment", ["read", "create", "delete", "moderate"])
                    .grant("editor", "article", ["read", "create", "update", "publish"])
                    .grant("editor", "page", ["read", "update", "publish"])
                    .grant("editor", "media", ["read", "create", "update"])
                    .grant("editor", "comment", ["read", "moderate"])
                    .grant("author", "article", ["read", "create", "update"])
                    .grant("author", "media", ["read", "create"])
                    .grant("author", "comment", ["read", "create"])
                    .grant("reader", "article", ["read"])
                    .grant("reader", "page", ["read"])
                    .grant("reader", "comment", ["read", "create"])
                    .map_permission("read", "read")
                    .map_permission("create", "create")
                    .map_permission("update", "update")
                    .map_permission("publish", "publish")
                    .api_key_scope(["article", "page", "media"])
            }

            Self::Ecommerce => {
                let order_actions = ["view", "create", "update", "cancel", "refund", "manage"];
                PolicyConfig::builder()
                    .role("admin", 4)
                    .role("manager", 3)
                    .role("support", 2)
                    .role("customer", 1)
                    .permissions(["catalog.read", "catalog.write", "orders.create"])
                    .resources(["product", "order", "customer", "inventory"])
                    .actions(order_actions)
                    .grant("admin", "product", ["view", "create", "update", "manage"])
                    .grant("admin", "order", order_actions)
                    .grant("admin", "customer", ["view", "update", "manage"])
                    .grant("admin", "inventory", ["view", "update", "manage"])
                    .grant("manager", "product", ["view", "create", "update"])
                    .grant("manager", "order", ["view", "update", "cancel", "refund"])
                    .grant("manager", "inventory", ["view", "update"])
                    .grant("support", "order", ["view", "cancel"])
                    .grant("support", "customer", ["view", "update"])
                    .grant("customer", "product", ["view"])
                    .grant("customer", "order", ["view", "create"])
                    .map_permission("catalog.read", "view")
                    .map_permission("catalog.write", "update")
                    .map_permission("orders.create", "create")
                    .api_key_scope(["product", "order"])
            }
        }
    }

    /// Compile this preset. Presets are known-valid, so this never fails.
    pub fn checker(&self) -> Checker {
        Checker::new_or_panic(self.config())
    }

    /// Return all presets.
    pub fn all() -> Vec<Preset> {
        vec![Self::FileManagement, Self::Cms, Self::Ecommerce]
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|p| p.id() == s)
            .ok_or_else(|| format!("unknown preset: {}", s))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
