//! Session state.

use pharmacy_core::{AccessView, BranchId, Role, UserId};
use serde::{Deserialize, Serialize};

use crate::api::ApiUser;
use crate::storage::StorageKey;

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub full_name: String,
    /// `None` when neither the stored role nor the backend's role id is one
    /// of the four staff roles.
    pub role: Option<Role>,
    pub role_id: i32,
    pub branch_id: Option<BranchId>,
}

impl User {
    /// Build a user from the backend's account, with an optional role that
    /// overrides the one derived from the account.
    #[must_use]
    pub fn from_api(user: &ApiUser, role: Option<Role>) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: role.or_else(|| user.derived_role()),
            role_id: user.role_id,
            branch_id: user.branch_id,
        }
    }

    /// The denormalized fields kept in the session store.
    pub(crate) fn storage_entries(&self) -> Vec<(StorageKey, String)> {
        let mut entries = vec![
            (StorageKey::UserId, self.id.to_string()),
            (StorageKey::UserName, self.full_name.clone()),
            (StorageKey::UserEmail, self.email.clone()),
            (StorageKey::RoleId, self.role_id.to_string()),
        ];
        if let Some(role) = self.role {
            entries.push((StorageKey::UserRole, role.as_str().to_owned()));
        }
        if let Some(branch_id) = self.branch_id {
            entries.push((StorageKey::BranchId, branch_id.to_string()));
        }
        entries
    }
}

/// Where the process-wide session is in its lifecycle.
///
/// `Uninitialized → Loading → Authenticated | Anonymous`. Logging in moves
/// any state to `Authenticated`; logging out moves any state to `Anonymous`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// The startup check has not run.
    #[default]
    Uninitialized,
    /// The startup check is validating a stored token.
    Loading,
    Authenticated(User),
    Anonymous,
}

impl SessionState {
    /// True until the startup check has finished.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Uninitialized | Self::Loading)
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.user().and_then(|user| user.role)
    }

    /// Alias of [`SessionState::role`].
    #[must_use]
    pub fn user_role(&self) -> Option<Role> {
        self.role()
    }

    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.user().map(|user| user.id)
    }

    #[must_use]
    pub fn user_email(&self) -> Option<&str> {
        self.user().map(|user| user.email.as_str())
    }

    #[must_use]
    pub fn role_id(&self) -> Option<i32> {
        self.user().map(|user| user.role_id)
    }

    #[must_use]
    pub fn branch_id(&self) -> Option<BranchId> {
        self.user().and_then(|user| user.branch_id)
    }

    /// The snapshot the route guard decides on.
    #[must_use]
    pub fn access_view(&self) -> AccessView {
        AccessView {
            loading: self.is_loading(),
            is_authenticated: self.is_authenticated(),
            role: self.role(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cashier() -> User {
        User {
            id: UserId::new(12),
            email: "cashier@pharmacy.et".to_string(),
            full_name: "Selam Tesfaye".to_string(),
            role: Some(Role::Cashier),
            role_id: 4,
            branch_id: Some(BranchId::new(3)),
        }
    }

    #[test]
    fn test_loading_covers_uninitialized() {
        assert!(SessionState::Uninitialized.is_loading());
        assert!(SessionState::Loading.is_loading());
        assert!(!SessionState::Anonymous.is_loading());
        assert!(!SessionState::Authenticated(cashier()).is_loading());
    }

    #[test]
    fn test_derived_fields() {
        let state = SessionState::Authenticated(cashier());
        assert_eq!(state.role(), Some(Role::Cashier));
        assert_eq!(state.user_role(), state.role());
        assert_eq!(state.user_id(), Some(UserId::new(12)));
        assert_eq!(state.user_email(), Some("cashier@pharmacy.et"));
        assert_eq!(state.role_id(), Some(4));
        assert_eq!(state.branch_id(), Some(BranchId::new(3)));

        assert_eq!(SessionState::Anonymous.role_id(), None);
    }

    #[test]
    fn test_access_view() {
        let view = SessionState::Authenticated(cashier()).access_view();
        assert!(!view.loading);
        assert!(view.is_authenticated);
        assert_eq!(view.role, Some(Role::Cashier));
    }

    #[test]
    fn test_storage_entries_skip_missing_fields() {
        let mut user = cashier();
        user.branch_id = None;
        user.role = None;
        let keys: Vec<_> = user.storage_entries().into_iter().map(|(k, _)| k).collect();
        assert!(!keys.contains(&StorageKey::BranchId));
        assert!(!keys.contains(&StorageKey::UserRole));
        assert!(keys.contains(&StorageKey::RoleId));
    }
}
