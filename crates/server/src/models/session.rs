//! Session-related types.
//!
//! Types stored in the session for authentication state. The storefront
//! login flow writes them; this server only reads them.

use serde::{Deserialize, Serialize};

use wishlist_core::CustomerId;

/// Session-stored customer identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentCustomer {
    /// Authenticated customer ID.
    pub customer_id: CustomerId,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in customer.
    pub const CURRENT_CUSTOMER: &str = "current_customer";
}
