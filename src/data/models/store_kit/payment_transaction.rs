use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use super::sk_error::SkRequestError;

/// Native StoreKit payment transaction (`SKPaymentTransaction`), delivered
/// through the payment queue observer.
///
/// https://developer.apple.com/documentation/storekit/skpaymenttransaction
///
/// Nested fields may be absent depending on the transaction state (a
/// purchasing transaction has no identifier yet; only restored transactions
/// link an original transaction). Normalization substitutes empty/zero
/// defaults rather than failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentTransaction {
    /// Transaction identifier, present once the transaction succeeded.
    pub transaction_identifier: Option<String>,
    /// Product identifier of the payment request.
    pub product_identifier: Option<String>,
    /// Transaction time in seconds since the reference date
    /// (2001-01-01T00:00:00Z).
    pub seconds_since_reference_date: Option<f64>,
    /// Current state of the transaction in the queue.
    pub transaction_state: SkPaymentTransactionState,
    /// Error describing why the transaction failed, for `Failed` state.
    pub error: Option<SkRequestError>,
    /// For restored transactions, the transaction that was originally
    /// purchased.
    pub original_transaction: Option<Box<PaymentTransaction>>,
    /// Raw receipt bytes. Encoded to Base64 as the opaque purchase token.
    pub transaction_receipt: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum SkPaymentTransactionState {
    /// The transaction is being processed by the App Store.
    Purchasing = 0,
    /// Payment was successfully processed.
    Purchased = 1,
    /// The transaction failed.
    Failed = 2,
    /// This transaction restores content previously purchased by the user.
    Restored = 3,
    /// The transaction is in the queue, pending external action.
    Deferred = 4,
}
