//! Application route table.
//!
//! Every page the client knows about, the path it lives at, and who may see
//! it. The role → dashboard map used by the guard and by every post-login or
//! post-error redirect lives here and nowhere else.

use std::fmt::Display;

use crate::guard::{AccessView, GuardDecision, guard};
use crate::types::Role;

/// Path of the login page; also the home of anyone without a usable role.
pub const LOGIN_PATH: &str = "/login";

/// Who may open a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// Anyone, signed in or not.
    Public,
    /// Only visitors without a session; signed-in users go to their dashboard.
    GuestOnly,
    /// Signed-in users whose role is in the list. An empty list admits any role.
    Roles(&'static [Role]),
}

/// Application routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AppRoute {
    #[default]
    Login,
    Signup,
    ForgotPassword,
    ChangePassword,
    AdminDashboard,
    AdminManagers,
    ManagerDashboard,
    ManagerStaff,
    ManagerBranches,
    ManagerReports,
    PharmacistDashboard,
    PharmacistInventory,
    CashierDashboard,
    CashierSales,
    NotFound,
}

impl AppRoute {
    /// Every route, in menu order.
    pub const ALL: [Self; 15] = [
        Self::Login,
        Self::Signup,
        Self::ForgotPassword,
        Self::ChangePassword,
        Self::AdminDashboard,
        Self::AdminManagers,
        Self::ManagerDashboard,
        Self::ManagerStaff,
        Self::ManagerBranches,
        Self::ManagerReports,
        Self::PharmacistDashboard,
        Self::PharmacistInventory,
        Self::CashierDashboard,
        Self::CashierSales,
        Self::NotFound,
    ];

    /// Parse a URL path into a route. Query strings and trailing slashes are ignored.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or("");
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        match path {
            "/" | LOGIN_PATH => Self::Login,
            _ => Self::ALL
                .into_iter()
                .find(|route| route.to_path() == path)
                .unwrap_or(Self::NotFound),
        }
    }

    /// The URL path of this route.
    #[must_use]
    pub const fn to_path(self) -> &'static str {
        match self {
            Self::Login => LOGIN_PATH,
            Self::Signup => "/signup",
            Self::ForgotPassword => "/forgot-password",
            Self::ChangePassword => "/change-password",
            Self::AdminDashboard => "/admin/dashboard",
            Self::AdminManagers => "/admin/managers",
            Self::ManagerDashboard => "/manager/dashboard",
            Self::ManagerStaff => "/manager/staff",
            Self::ManagerBranches => "/manager/branches",
            Self::ManagerReports => "/manager/reports",
            Self::PharmacistDashboard => "/pharmacist/dashboard",
            Self::PharmacistInventory => "/pharmacist/inventory",
            Self::CashierDashboard => "/cashier/dashboard",
            Self::CashierSales => "/cashier/sales",
            Self::NotFound => "/404",
        }
    }

    /// Who may open this route.
    #[must_use]
    pub const fn access(self) -> RouteAccess {
        match self {
            Self::Login | Self::Signup | Self::ForgotPassword => RouteAccess::GuestOnly,
            Self::NotFound => RouteAccess::Public,
            Self::ChangePassword => RouteAccess::Roles(&[]),
            Self::AdminDashboard | Self::AdminManagers => RouteAccess::Roles(&[Role::Admin]),
            Self::ManagerDashboard
            | Self::ManagerStaff
            | Self::ManagerBranches
            | Self::ManagerReports => RouteAccess::Roles(&[Role::Manager]),
            Self::PharmacistDashboard | Self::PharmacistInventory => {
                RouteAccess::Roles(&[Role::Pharmacist])
            }
            Self::CashierDashboard | Self::CashierSales => RouteAccess::Roles(&[Role::Cashier]),
        }
    }

    /// Whether the route needs a signed-in user.
    #[must_use]
    pub const fn requires_auth(self) -> bool {
        matches!(self.access(), RouteAccess::Roles(_))
    }

    /// The home dashboard of a role.
    #[must_use]
    pub const fn dashboard_for(role: Role) -> Self {
        match role {
            Role::Admin => Self::AdminDashboard,
            Role::Manager => Self::ManagerDashboard,
            Role::Pharmacist => Self::PharmacistDashboard,
            Role::Cashier => Self::CashierDashboard,
        }
    }

    /// Run the guard for a request to `path`.
    ///
    /// Guest-only pages send signed-in users to their dashboard once the
    /// session check has finished. A signed-in user without a known role has
    /// no dashboard, so the guest page renders for them.
    #[must_use]
    pub fn resolve(path: &str, view: &AccessView) -> (Self, GuardDecision) {
        let route = Self::from_path(path);
        let decision = match route.access() {
            RouteAccess::Public => GuardDecision::Render,
            RouteAccess::GuestOnly if view.loading => GuardDecision::Loading,
            RouteAccess::GuestOnly => match view.role {
                Some(role) if view.is_authenticated => GuardDecision::Redirect {
                    to: role.default_route(),
                },
                _ => GuardDecision::Render,
            },
            RouteAccess::Roles(allowed) => guard(view, allowed, path),
        };
        (route, decision)
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_path())
    }
}

/// Default landing path for an optional role; unknown or missing roles land on login.
#[must_use]
pub const fn default_route_for(role: Option<Role>) -> &'static str {
    match role {
        Some(role) => role.default_route(),
        None => LOGIN_PATH,
    }
}
