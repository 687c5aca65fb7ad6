use thiserror::Error;

/// Portable error taxonomy covering both store backends.
///
/// Every native failure code surfaces as exactly one of these; codes not
/// explicitly listed in the translation tables map to [`PurchaseError::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PurchaseError {
    /// Unknown error.
    Unknown,
    /// Billing API version is not supported for the type requested
    /// (Play Billing), client error (StoreKit).
    BillingUnavailable,
    /// Developer issue: reentrant call, missing precondition, bad parameter.
    DeveloperError,
    /// Product sku not available.
    ItemUnavailable,
    /// Other error.
    GeneralError,
    /// User cancelled the purchase.
    UserCancelled,
    /// App store unavailable on device.
    AppStoreUnavailable,
    /// User is not allowed to authorize payments.
    PaymentNotAllowed,
    /// One of the payment parameters was not recognized by the store.
    PaymentInvalid,
    /// The requested product is invalid.
    InvalidProduct,
    /// The product request failed.
    ProductRequestFailed,
    /// The user has not allowed access to cloud service information.
    PermissionDenied,
    /// The device could not connect to the network.
    NetworkConnectionFailed,
    /// The user has revoked permission to use this cloud service.
    CloudServiceRevoked,
    /// The user has not yet acknowledged the store's privacy policy.
    PrivacyError,
    /// The app is attempting to use a property without the required
    /// entitlement.
    UnauthorizedRequest,
    /// The offer identifier cannot be found or is not active.
    InvalidOffer,
    /// The signature in a payment discount is not valid.
    InvalidSignature,
    /// Parameters are missing in a payment discount.
    MissingOfferParams,
    /// The configured offer price is no longer valid.
    InvalidOfferPrice,
    /// Restoring the transaction failed.
    RestoreFailed,
    /// Network connection is down.
    ServiceUnavailable,
    /// Product is already owned.
    AlreadyOwned,
    /// Item is not owned and can not be consumed.
    NotOwned,
    /// Billing client service is disconnected.
    ServiceDisconnected,
}

/// The single error type carried by every fallible operation in this crate:
/// one [`PurchaseError`] member plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error:?}: {message}")]
pub struct InAppPurchaseError {
    pub error: PurchaseError,
    pub message: String,
}

impl InAppPurchaseError {
    pub fn new(error: PurchaseError, message: impl Into<String>) -> Self {
        Self {
            error,
            message: message.into(),
        }
    }

    /// Developer misuse (reentrant calls, missing preconditions). Raised
    /// locally, without contacting the backend.
    pub fn developer(message: impl Into<String>) -> Self {
        Self::new(PurchaseError::DeveloperError, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(PurchaseError::Unknown, message)
    }
}
