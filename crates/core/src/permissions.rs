//! Role-based permission table.
//!
//! Admins (role id 1) hold every permission, including names this table has
//! never heard of. Managers (role id 2) hold the nine account-management
//! permissions. Every other role id holds none.

use serde::{Deserialize, Serialize};

use crate::types::Role;

/// Account-management permissions granted to managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "managers.create")]
    ManagersCreate,
    #[serde(rename = "managers.read")]
    ManagersRead,
    #[serde(rename = "managers.update")]
    ManagersUpdate,
    #[serde(rename = "managers.delete")]
    ManagersDelete,
    #[serde(rename = "users.create")]
    UsersCreate,
    #[serde(rename = "users.read")]
    UsersRead,
    #[serde(rename = "users.update")]
    UsersUpdate,
    #[serde(rename = "users.delete")]
    UsersDelete,
    #[serde(rename = "users.assign_role")]
    UsersAssignRole,
}

/// The manager allow-list.
pub const MANAGER_PERMISSIONS: [Permission; 9] = [
    Permission::ManagersCreate,
    Permission::ManagersRead,
    Permission::ManagersUpdate,
    Permission::ManagersDelete,
    Permission::UsersCreate,
    Permission::UsersRead,
    Permission::UsersUpdate,
    Permission::UsersDelete,
    Permission::UsersAssignRole,
];

impl Permission {
    /// The dotted permission name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ManagersCreate => "managers.create",
            Self::ManagersRead => "managers.read",
            Self::ManagersUpdate => "managers.update",
            Self::ManagersDelete => "managers.delete",
            Self::UsersCreate => "users.create",
            Self::UsersRead => "users.read",
            Self::UsersUpdate => "users.update",
            Self::UsersDelete => "users.delete",
            Self::UsersAssignRole => "users.assign_role",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MANAGER_PERMISSIONS
            .into_iter()
            .find(|permission| permission.as_str() == s)
            .ok_or_else(|| format!("unknown permission: {s}"))
    }
}

/// The permissions a role id carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionSet {
    /// Everything, whatever the name.
    All,
    /// Exactly the listed permissions.
    Only(&'static [Permission]),
    /// Nothing.
    None,
}

impl PermissionSet {
    /// Look up the set for a backend role id.
    #[must_use]
    pub const fn for_role_id(role_id: i32) -> Self {
        match Role::from_id(role_id) {
            Some(Role::Admin) => Self::All,
            Some(Role::Manager) => Self::Only(&MANAGER_PERMISSIONS),
            Some(Role::Pharmacist | Role::Cashier) | None => Self::None,
        }
    }

    /// Whether `name` is granted.
    #[must_use]
    pub fn allows(self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(list) => list.iter().any(|permission| permission.as_str() == name),
            Self::None => false,
        }
    }
}

/// Whether `role_id` holds the permission called `name`.
#[must_use]
pub fn has_permission(role_id: i32, name: &str) -> bool {
    PermissionSet::for_role_id(role_id).allows(name)
}

/// Evaluate several permissions at once.
///
/// With `require_all` the names are combined with AND, otherwise with OR. An
/// empty list is vacuously granted under AND and denied under OR.
#[must_use]
pub fn has_permissions(role_id: i32, names: &[&str], require_all: bool) -> bool {
    let set = PermissionSet::for_role_id(role_id);
    if require_all {
        names.iter().all(|name| set.allows(name))
    } else {
        names.iter().any(|name| set.allows(name))
    }
}
