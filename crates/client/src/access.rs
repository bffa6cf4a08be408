//! Object-level access rules for staff accounts.
//!
//! The permission table answers "may this role do X at all". These rules
//! answer "may this user do X to that account", which also depends on who
//! the target is. Both users are passed in explicitly.

use pharmacy_core::{Permission, Role, UserId, has_permission};

use crate::auth::User;

/// What the current user wants to do to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    View,
    Create,
    Update,
    Delete,
    AssignRole,
}

/// The parts of an account the rules look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub role_id: i32,
}

impl UserRecord {
    #[must_use]
    pub const fn role(&self) -> Option<Role> {
        Role::from_id(self.role_id)
    }
}

impl From<&User> for UserRecord {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            role_id: user.role_id,
        }
    }
}

/// The permission that governs `action` on an account with `target_role`.
const fn required_permission(action: Action, target_role: Option<Role>) -> Permission {
    let manages_manager = matches!(target_role, Some(Role::Manager));
    match (action, manages_manager) {
        (Action::View, true) => Permission::ManagersRead,
        (Action::View, false) => Permission::UsersRead,
        (Action::Create, true) => Permission::ManagersCreate,
        (Action::Create, false) => Permission::UsersCreate,
        (Action::Update, true) => Permission::ManagersUpdate,
        (Action::Update, false) => Permission::UsersUpdate,
        (Action::Delete, true) => Permission::ManagersDelete,
        (Action::Delete, false) => Permission::UsersDelete,
        (Action::AssignRole, _) => Permission::UsersAssignRole,
    }
}

/// Whether `current` may perform `action` on `target`.
///
/// - Nobody signed in: denied.
/// - Admin: allowed.
/// - Manager: may view anyone; may not update, delete or reassign their own
///   account or an admin's; otherwise the permission table decides.
/// - Anyone else: may only view their own account.
#[must_use]
pub fn can_perform_action(action: Action, target: &UserRecord, current: Option<&UserRecord>) -> bool {
    let Some(current) = current else {
        return false;
    };
    match current.role() {
        Some(Role::Admin) => true,
        Some(Role::Manager) => {
            if action == Action::View {
                return true;
            }
            let is_self = target.id == current.id;
            let target_is_admin = target.role() == Some(Role::Admin);
            if is_self || target_is_admin {
                return false;
            }
            has_permission(
                current.role_id,
                required_permission(action, target.role()).as_str(),
            )
        }
        Some(Role::Pharmacist | Role::Cashier) | None => {
            action == Action::View && target.id == current.id
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn record(id: i64, role: Role) -> UserRecord {
        UserRecord {
            id: UserId::new(id),
            role_id: role.id(),
        }
    }

    const ADMIN: UserRecord = record(1, Role::Admin);
    const MANAGER: UserRecord = record(2, Role::Manager);
    const OTHER_MANAGER: UserRecord = record(3, Role::Manager);
    const PHARMACIST: UserRecord = record(4, Role::Pharmacist);
    const CASHIER: UserRecord = record(5, Role::Cashier);

    #[test]
    fn test_anonymous_is_denied() {
        assert!(!can_perform_action(Action::View, &CASHIER, None));
    }

    #[test]
    fn test_admin_can_do_anything() {
        for action in [
            Action::View,
            Action::Create,
            Action::Update,
            Action::Delete,
            Action::AssignRole,
        ] {
            assert!(can_perform_action(action, &ADMIN, Some(&ADMIN)));
            assert!(can_perform_action(action, &MANAGER, Some(&ADMIN)));
        }
    }

    #[test]
    fn test_manager_cannot_modify_self() {
        for action in [Action::Update, Action::Delete, Action::AssignRole] {
            assert!(!can_perform_action(action, &MANAGER, Some(&MANAGER)));
        }
        assert!(can_perform_action(Action::View, &MANAGER, Some(&MANAGER)));
    }

    #[test]
    fn test_manager_cannot_touch_admins() {
        assert!(!can_perform_action(Action::Delete, &ADMIN, Some(&MANAGER)));
        assert!(!can_perform_action(Action::Update, &ADMIN, Some(&MANAGER)));
        assert!(can_perform_action(Action::View, &ADMIN, Some(&MANAGER)));
    }

    #[test]
    fn test_manager_manages_staff_and_other_managers() {
        assert!(can_perform_action(Action::Delete, &CASHIER, Some(&MANAGER)));
        assert!(can_perform_action(Action::AssignRole, &PHARMACIST, Some(&MANAGER)));
        assert!(can_perform_action(Action::Update, &OTHER_MANAGER, Some(&MANAGER)));
        assert!(can_perform_action(Action::Create, &OTHER_MANAGER, Some(&MANAGER)));
    }

    #[test]
    fn test_staff_only_view_themselves() {
        assert!(can_perform_action(Action::View, &CASHIER, Some(&CASHIER)));
        assert!(!can_perform_action(Action::View, &PHARMACIST, Some(&CASHIER)));
        assert!(!can_perform_action(Action::Update, &CASHIER, Some(&CASHIER)));
    }

    #[test]
    fn test_unknown_role_is_treated_as_staff() {
        let unknown = UserRecord {
            id: UserId::new(9),
            role_id: 42,
        };
        assert!(can_perform_action(Action::View, &unknown, Some(&unknown)));
        assert!(!can_perform_action(Action::Delete, &CASHIER, Some(&unknown)));
    }
}
