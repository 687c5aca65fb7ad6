use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::PurchaseError;

/// Response codes returned by the Play Billing client.
///
/// https://developer.android.com/reference/com/android/billingclient/api/BillingClient.BillingResponseCode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum BillingResponseCode {
    /// The request has reached the maximum timeout before the client could
    /// respond.
    ServiceTimeout = -3,
    /// The requested feature is not supported by the Play Store on the
    /// current device.
    FeatureNotSupported = -2,
    /// The Play Store service is not connected.
    ServiceDisconnected = -1,
    Ok = 0,
    /// Transaction was canceled by the user.
    UserCancelled = 1,
    /// The service is currently unavailable.
    ServiceUnavailable = 2,
    /// A user billing error occurred during processing.
    BillingUnavailable = 3,
    /// The requested product is not available for purchase.
    ItemUnavailable = 4,
    /// Error resulting from incorrect usage of the API.
    DeveloperError = 5,
    /// Fatal error during the API action.
    Error = 6,
    /// The purchase failed because the item is already owned.
    ItemAlreadyOwned = 7,
    /// Requested action on the item failed since it is not owned by the
    /// user.
    ItemNotOwned = 8,
}

impl BillingResponseCode {
    /// Total translation into the portable taxonomy; `Ok` and any future
    /// codes fall through to `Unknown`.
    pub fn to_purchase_error(self) -> PurchaseError {
        match self {
            BillingResponseCode::BillingUnavailable => PurchaseError::BillingUnavailable,
            BillingResponseCode::DeveloperError => PurchaseError::DeveloperError,
            BillingResponseCode::Error => PurchaseError::GeneralError,
            BillingResponseCode::FeatureNotSupported => PurchaseError::GeneralError,
            BillingResponseCode::ItemAlreadyOwned => PurchaseError::AlreadyOwned,
            BillingResponseCode::ItemNotOwned => PurchaseError::NotOwned,
            BillingResponseCode::ItemUnavailable => PurchaseError::ItemUnavailable,
            BillingResponseCode::ServiceDisconnected => PurchaseError::ServiceDisconnected,
            BillingResponseCode::ServiceTimeout => PurchaseError::NetworkConnectionFailed,
            BillingResponseCode::ServiceUnavailable => PurchaseError::ServiceUnavailable,
            BillingResponseCode::UserCancelled => PurchaseError::UserCancelled,
            BillingResponseCode::Ok => PurchaseError::Unknown,
        }
    }
}

/// Result of a Play Billing client call: a response code plus a debug
/// message intended for logs, not for users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingResult {
    pub response_code: BillingResponseCode,
    pub debug_message: String,
}

impl BillingResult {
    pub fn new(response_code: BillingResponseCode, debug_message: impl Into<String>) -> Self {
        Self {
            response_code,
            debug_message: debug_message.into(),
        }
    }

    pub fn ok() -> Self {
        Self::new(BillingResponseCode::Ok, "")
    }

    pub fn is_ok(&self) -> bool {
        self.response_code == BillingResponseCode::Ok
    }
}

/// Catalog partition of the Play Billing store: one-time products vs.
/// subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkuType {
    InApp,
    Subs,
}

/// Response to a catalog query. `billing_result` is `None` when the backend
/// returned no result object at all.
#[derive(Debug, Clone)]
pub struct SkuDetailsQueryResult {
    pub billing_result: Option<BillingResult>,
    pub sku_details: Vec<super::sku_details::SkuDetails>,
}

/// Response to a past-purchases query. Same `None` convention as
/// [`SkuDetailsQueryResult`].
#[derive(Debug, Clone)]
pub struct PurchasesQueryResult {
    pub billing_result: Option<BillingResult>,
    pub purchases: Vec<super::purchase_record::PurchaseRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_translates_into_the_declared_set() {
        let codes = [
            BillingResponseCode::ServiceTimeout,
            BillingResponseCode::FeatureNotSupported,
            BillingResponseCode::ServiceDisconnected,
            BillingResponseCode::Ok,
            BillingResponseCode::UserCancelled,
            BillingResponseCode::ServiceUnavailable,
            BillingResponseCode::BillingUnavailable,
            BillingResponseCode::ItemUnavailable,
            BillingResponseCode::DeveloperError,
            BillingResponseCode::Error,
            BillingResponseCode::ItemAlreadyOwned,
            BillingResponseCode::ItemNotOwned,
        ];
        for code in codes {
            // The match in to_purchase_error is total; this pins the
            // interesting rows.
            let _ = code.to_purchase_error();
        }
        assert_eq!(
            BillingResponseCode::ItemAlreadyOwned.to_purchase_error(),
            PurchaseError::AlreadyOwned
        );
        assert_eq!(
            BillingResponseCode::ServiceTimeout.to_purchase_error(),
            PurchaseError::NetworkConnectionFailed
        );
        assert_eq!(
            BillingResponseCode::FeatureNotSupported.to_purchase_error(),
            PurchaseError::GeneralError
        );
        assert_eq!(
            BillingResponseCode::Ok.to_purchase_error(),
            PurchaseError::Unknown
        );
    }
}
