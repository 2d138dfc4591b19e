//! The role gate: a pure decision over `(path, role)`.

use crate::types::Role;

/// Where unauthenticated callers are sent.
pub const SIGN_IN_PATH: &str = "/";

/// The dashboard root. Only admins may land on it.
pub const DASHBOARD_ROOT: &str = "/dashboard";

/// Outcome of [`decide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Forward the request.
    Allow,
    /// Redirect to this path.
    Redirect(&'static str),
}

impl AccessDecision {
    /// Whether the request passes.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Path prefixes each role may visit.
#[must_use]
pub const fn allowed_prefixes(role: Role) -> &'static [&'static str] {
    match role {
        Role::Admin => &[
            "/dashboard",
            "/users",
            "/settings",
            "/reports",
            "/tickets",
            "/directions",
            "/schedule",
        ],
        Role::SalesAgent => &["/dashboard/customers", "/dashboard/sell-ticket"],
        Role::Driver => &["/dashboard/qr-scanner"],
        Role::Customer => &[],
    }
}

/// Where a role lands after sign-in or a denied request.
#[must_use]
pub const fn landing_page(role: Role) -> &'static str {
    match role {
        Role::Admin => DASHBOARD_ROOT,
        Role::SalesAgent => "/dashboard/customers",
        Role::Driver => "/dashboard/qr-scanner",
        Role::Customer => SIGN_IN_PATH,
    }
}

/// Decide whether `role` may open `path`.
///
/// A missing role is always sent to sign-in. The literal dashboard root is
/// decided before the prefix table, so `/dashboard/customers` does not grant
/// `/dashboard`.
#[must_use]
pub fn decide(path: &str, role: Option<Role>) -> AccessDecision {
    let Some(role) = role else {
        return AccessDecision::Redirect(SIGN_IN_PATH);
    };

    if path == DASHBOARD_ROOT {
        return match role {
            Role::Admin => AccessDecision::Allow,
            Role::SalesAgent | Role::Driver | Role::Customer => {
                AccessDecision::Redirect(landing_page(role))
            },
        };
    }

    if allowed_prefixes(role)
        .iter()
        .any(|prefix| path.starts_with(prefix))
    {
        AccessDecision::Allow
    } else {
        AccessDecision::Redirect(landing_page(role))
    }
}
