//! Sidebar menu per role.

use crate::types::Role;
use serde::Serialize;

/// One sidebar entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    /// Stable key used for labels and icons
    pub key: &'static str,
    /// Target path
    pub href: &'static str,
}

const fn item(key: &'static str, href: &'static str) -> MenuItem {
    MenuItem { key, href }
}

const ADMIN_MENU: &[MenuItem] = &[
    item("dashboard", "/dashboard"),
    item("users", "/dashboard/users"),
    item("directions", "/dashboard/directions"),
    item("statuses", "/dashboard/statuses"),
    item("schedule", "/dashboard/schedule"),
    item("tickets", "/dashboard/tickets"),
];

const SALES_AGENT_MENU: &[MenuItem] = &[
    item("customers", "/dashboard/customers"),
    item("sell-ticket", "/dashboard/sell-ticket"),
];

const DRIVER_MENU: &[MenuItem] = &[item("qr-scanner", "/dashboard/qr-scanner")];

/// Menu entries for `role`.
#[must_use]
pub const fn menu_for(role: Role) -> &'static [MenuItem] {
    match role {
        Role::Admin => ADMIN_MENU,
        Role::SalesAgent => SALES_AGENT_MENU,
        Role::Driver => DRIVER_MENU,
        Role::Customer => &[],
    }
}
