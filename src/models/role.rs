use serde::{Deserialize, Serialize};

/// The three parties that can look at an order. Buyer and seller are the
/// transaction sides; admin is the platform observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Seller,
    Admin,
}

impl Role {
    /// The counterparty a state-advancing action should notify. Admin
    /// actions land on whichever side the action affects, so admin has no
    /// single counterparty and callers pick explicitly.
    pub fn counterparty(self) -> Option<Role> {
        match self {
            Role::Buyer => Some(Role::Seller),
            Role::Seller => Some(Role::Buyer),
            Role::Admin => None,
        }
    }
}
