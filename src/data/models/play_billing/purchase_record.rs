use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Native Play Billing purchase record, delivered through the purchase
/// update listener or a past-purchases query.
///
/// https://developer.android.com/reference/com/android/billingclient/api/Purchase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    /// Order id of the purchase.
    pub order_id: String,
    /// The product sku.
    pub sku: String,
    /// Time the product was purchased, in milliseconds since the Unix epoch.
    pub purchase_time_millis: i64,
    /// The purchase state of the order.
    pub purchase_state: PurchaseStateCode,
    /// Whether the purchase has already been acknowledged.
    pub is_acknowledged: bool,
    /// Whether the subscription renews automatically.
    pub is_auto_renewing: bool,
    /// The token uniquely identifying this purchase. Opaque; required for
    /// acknowledgement and consumption.
    pub purchase_token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum PurchaseStateCode {
    Unspecified = 0,
    Purchased = 1,
    Pending = 2,
}
