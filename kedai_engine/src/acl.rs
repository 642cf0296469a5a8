//! Role-based access control.
//!
//! All permission decisions go through [`PERMISSIONS`], a single table mapping each [`Capability`] to the [`Access`]
//! level granted to admins, staff and customers respectively. Customer-facing capabilities are usually granted at the
//! [`Access::Own`] level, meaning the customer may only act on records that belong to their own account.
use std::fmt::Display;

use log::*;

use crate::{
    db_types::{Principal, Role},
    traits::EngineError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    PlaceOrder,
    ViewOrder,
    UpdateOrderStatus,
    DeleteOrder,
    RequestPayment,
    ViewPayment,
    ConfirmPayment,
    OverridePaymentStatus,
    ViewSalesReport,
}

impl Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Capability::PlaceOrder => "place orders",
            Capability::ViewOrder => "view orders",
            Capability::UpdateOrderStatus => "update order status",
            Capability::DeleteOrder => "delete orders",
            Capability::RequestPayment => "request payments",
            Capability::ViewPayment => "view payments",
            Capability::ConfirmPayment => "confirm payments",
            Capability::OverridePaymentStatus => "override payment status",
            Capability::ViewSalesReport => "view sales reports",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Denied,
    /// Only records owned by the caller's account
    Own,
    Any,
}

use Access::{Any, Denied, Own};

/// Columns are `[admin, staff, customer]`.
pub const PERMISSIONS: [(Capability, [Access; 3]); 9] = [
    (Capability::PlaceOrder, [Any, Any, Own]),
    (Capability::ViewOrder, [Any, Any, Own]),
    (Capability::UpdateOrderStatus, [Any, Any, Denied]),
    (Capability::DeleteOrder, [Any, Denied, Denied]),
    (Capability::RequestPayment, [Any, Any, Own]),
    (Capability::ViewPayment, [Any, Any, Own]),
    (Capability::ConfirmPayment, [Any, Any, Own]),
    (Capability::OverridePaymentStatus, [Any, Any, Denied]),
    (Capability::ViewSalesReport, [Any, Any, Denied]),
];

fn column(role: Role) -> usize {
    match role {
        Role::Admin => 0,
        Role::Staff => 1,
        Role::Customer => 2,
    }
}

/// Looks up the access level `role` has for `capability`. Capabilities missing from the table are denied.
pub fn access(role: Role, capability: Capability) -> Access {
    PERMISSIONS.iter().find(|(c, _)| *c == capability).map(|(_, row)| row[column(role)]).unwrap_or(Denied)
}

/// The set of records a caller may act upon for a given capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Any,
    /// Restricted to records owned by this account id
    Owner(i64),
}

impl Scope {
    pub fn owner(&self) -> Option<i64> {
        match self {
            Scope::Any => None,
            Scope::Owner(id) => Some(*id),
        }
    }

    pub fn permits(&self, record_owner: Option<i64>) -> bool {
        match self {
            Scope::Any => true,
            Scope::Owner(id) => record_owner == Some(*id),
        }
    }
}

/// Resolves the scope `principal` has for `capability`, or returns [`EngineError::Forbidden`].
pub fn authorize(principal: &Principal, capability: Capability) -> Result<Scope, EngineError> {
    match access(principal.role, capability) {
        Any => Ok(Scope::Any),
        Own => Ok(Scope::Owner(principal.account_id)),
        Denied => {
            debug!("🔐️ Account #{} ({}) may not {capability}", principal.account_id, principal.role);
            Err(EngineError::Forbidden(format!("The {} role may not {capability}", principal.role)))
        },
    }
}
