//! Staff roles.

use serde::{Deserialize, Serialize};

/// Error returned when a role name or id is not one of the four staff roles.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid role: {0}")]
pub struct RoleParseError(pub String);

/// Staff role with a fixed numeric id shared with the backend.
///
/// The id is what the backend sends as `role_id`; the lower-case name is
/// what the token store keeps under `userRole`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Chain-wide administrator. Holds every permission.
    Admin,
    /// Pharmacy manager. Manages branches, staff and other managers.
    Manager,
    /// Dispenses medicine and maintains branch inventory.
    Pharmacist,
    /// Records sales at the counter.
    Cashier,
}

impl Role {
    /// Every role, in id order.
    pub const ALL: [Self; 4] = [Self::Admin, Self::Manager, Self::Pharmacist, Self::Cashier];

    /// The backend's numeric id for this role.
    #[must_use]
    pub const fn id(self) -> i32 {
        match self {
            Self::Admin => 1,
            Self::Manager => 2,
            Self::Pharmacist => 3,
            Self::Cashier => 4,
        }
    }

    /// Look up a role by its backend id.
    #[must_use]
    pub const fn from_id(id: i32) -> Option<Self> {
        match id {
            1 => Some(Self::Admin),
            2 => Some(Self::Manager),
            3 => Some(Self::Pharmacist),
            4 => Some(Self::Cashier),
            _ => None,
        }
    }

    /// The lower-case role name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Pharmacist => "pharmacist",
            Self::Cashier => "cashier",
        }
    }

    /// Path of this role's home dashboard.
    #[must_use]
    pub const fn default_route(self) -> &'static str {
        crate::routes::AppRoute::dashboard_for(self).to_path()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "pharmacist" => Ok(Self::Pharmacist),
            "cashier" => Ok(Self::Cashier),
            _ => Err(RoleParseError(s.to_owned())),
        }
    }
}

impl TryFrom<i32> for Role {
    type Error = RoleParseError;

    fn try_from(id: i32) -> Result<Self, Self::Error> {
        Self::from_id(id).ok_or_else(|| RoleParseError(id.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip() {
        for role in Role::ALL {
            assert_eq!(Role::from_id(role.id()), Some(role));
        }
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(5), None);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("manager".parse::<Role>().unwrap(), Role::Manager);
        assert_eq!(" Cashier ".parse::<Role>().unwrap(), Role::Cashier);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_default_routes() {
        assert_eq!(Role::Admin.default_route(), "/admin/dashboard");
        assert_eq!(Role::Manager.default_route(), "/manager/dashboard");
        assert_eq!(Role::Pharmacist.default_route(), "/pharmacist/dashboard");
        assert_eq!(Role::Cashier.default_route(), "/cashier/dashboard");
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Pharmacist).unwrap(), "\"pharmacist\"");
    }
}
