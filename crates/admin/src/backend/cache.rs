//! Per-session list snapshots.

use hearth_core::account::User;
use hearth_core::catalog::Product;
use hearth_core::order::Order;

/// Which list a snapshot holds.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum ListKind {
    Products,
    Orders,
    Users,
}

/// Cache key: the admin session's scope plus the list.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct ListKey {
    pub scope: String,
    pub kind: ListKind,
}

impl ListKey {
    pub fn new(scope: &str, kind: ListKind) -> Self {
        Self {
            scope: scope.to_owned(),
            kind,
        }
    }
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum ListSnapshot {
    Products(Vec<Product>),
    Orders(Vec<Order>),
    Users(Vec<User>),
}
