//! Route guard.
//!
//! A pure decision over the session snapshot and a route's allow-list. The
//! client feeds it the current [`AccessView`]; nothing here reads global state.

use crate::routes::{LOGIN_PATH, default_route_for};
use crate::types::Role;

/// The slice of session state the guard needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessView {
    /// The startup session check has not finished yet.
    pub loading: bool,
    /// A validated session exists.
    pub is_authenticated: bool,
    /// Role of the signed-in user, if one could be derived.
    pub role: Option<Role>,
}

/// What to do with a request for a protected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Show the loading placeholder and nothing else.
    Loading,
    /// Send the visitor to the login page, remembering where they were going.
    RedirectToLogin {
        /// The location that was requested.
        from: String,
    },
    /// Send a signed-in user somewhere else (their own dashboard).
    Redirect {
        /// Target path.
        to: &'static str,
    },
    /// Render the protected content.
    Render,
}

impl GuardDecision {
    /// The path this decision navigates to, if it is a redirect.
    #[must_use]
    pub const fn redirect_target(&self) -> Option<&'static str> {
        match self {
            Self::RedirectToLogin { .. } => Some(LOGIN_PATH),
            Self::Redirect { to } => Some(*to),
            Self::Loading | Self::Render => None,
        }
    }
}

/// Decide whether `location` may be rendered for the given session.
///
/// An empty `allowed` list admits any signed-in role. A signed-in user whose
/// role is not admitted is sent to their own dashboard, not logged out.
#[must_use]
pub fn guard(view: &AccessView, allowed: &[Role], location: &str) -> GuardDecision {
    if view.loading {
        return GuardDecision::Loading;
    }
    if !view.is_authenticated {
        return GuardDecision::RedirectToLogin {
            from: location.to_owned(),
        };
    }
    let admitted = allowed.is_empty() || view.role.is_some_and(|role| allowed.contains(&role));
    if admitted {
        GuardDecision::Render
    } else {
        GuardDecision::Redirect {
            to: default_route_for(view.role),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn view(loading: bool, is_authenticated: bool, role: Option<Role>) -> AccessView {
        AccessView {
            loading,
            is_authenticated,
            role,
        }
    }

    #[test]
    fn test_loading_wins_over_everything() {
        for authenticated in [false, true] {
            for role in [None, Some(Role::Admin), Some(Role::Cashier)] {
                assert_eq!(
                    guard(&view(true, authenticated, role), &[Role::Admin], "/admin/dashboard"),
                    GuardDecision::Loading
                );
            }
        }
    }

    #[test]
    fn test_anonymous_goes_to_login_with_location() {
        let decision = guard(&view(false, false, None), &[], "/manager/staff");
        assert_eq!(
            decision,
            GuardDecision::RedirectToLogin {
                from: "/manager/staff".to_owned()
            }
        );
        assert_eq!(decision.redirect_target(), Some("/login"));
    }

    #[test]
    fn test_wrong_role_goes_home_not_to_login() {
        let decision = guard(
            &view(false, true, Some(Role::Cashier)),
            &[Role::Admin],
            "/admin/dashboard",
        );
        assert_eq!(
            decision,
            GuardDecision::Redirect {
                to: "/cashier/dashboard"
            }
        );
    }

    #[test]
    fn test_missing_role_with_allow_list_goes_to_login_path() {
        let decision = guard(&view(false, true, None), &[Role::Manager], "/manager/dashboard");
        assert_eq!(decision, GuardDecision::Redirect { to: "/login" });
    }

    #[test]
    fn test_empty_allow_list_admits_any_role() {
        assert_eq!(
            guard(&view(false, true, Some(Role::Pharmacist)), &[], "/change-password"),
            GuardDecision::Render
        );
    }

    #[test]
    fn test_admitted_role_renders() {
        assert_eq!(
            guard(
                &view(false, true, Some(Role::Manager)),
                &[Role::Admin, Role::Manager],
                "/manager/reports"
            ),
            GuardDecision::Render
        );
    }
}
