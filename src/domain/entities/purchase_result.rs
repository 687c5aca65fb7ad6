use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a completed purchase or a restored entry, normalized from the
/// backend's native transaction record. Immutable; owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseResult {
    /// Purchase/order id (transaction identifier on StoreKit).
    pub id: String,
    /// Transaction date in UTC.
    pub transaction_date_utc: DateTime<Utc>,
    /// Product id/sku.
    pub product_id: String,
    /// Whether the purchase has already been acknowledged. Always false for
    /// StoreKit, which has no acknowledgement flag.
    pub acknowledged: bool,
    /// Whether the subscription renews automatically.
    pub auto_renewing: bool,
    /// Opaque token identifying the purchase: the Play Billing purchase token,
    /// or the Base64-encoded StoreKit receipt. Required for later
    /// finalization; must not be interpreted by callers.
    pub purchase_token: String,
    /// Current purchase/subscription state.
    pub state: PurchaseState,
}

/// Current status of a purchase. A superset covering both backends; a given
/// backend only ever produces a subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PurchaseState {
    /// Purchase state unknown.
    #[default]
    Unknown,
    /// Purchased and in good standing.
    Purchased,
    /// Purchase was canceled.
    Canceled,
    /// Purchase was refunded.
    Refunded,
    /// In the process of being processed.
    Purchasing,
    /// Transaction has failed.
    Failed,
    /// Was restored.
    Restored,
    /// In queue, pending external action.
    Deferred,
    /// In free trial.
    FreeTrial,
    /// Pending purchase.
    PaymentPending,
    /// Free product.
    Free,
}
