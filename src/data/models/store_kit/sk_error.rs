use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::PurchaseError;

/// StoreKit error codes (`SKErrorCode`).
///
/// https://developer.apple.com/documentation/storekit/skerrorcode
///
/// The Play Billing and StoreKit code spaces are disjoint — overlapping
/// integer values mean different things — so each backend carries its own
/// translation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i64)]
pub enum SkErrorCode {
    Unknown = 0,
    /// The client is not allowed to perform the attempted action.
    ClientInvalid = 1,
    /// The user canceled a payment request.
    PaymentCancelled = 2,
    /// One of the payment parameters was not recognized by the App Store.
    PaymentInvalid = 3,
    /// The user is not allowed to authorize payments.
    PaymentNotAllowed = 4,
    /// The requested product is not available in the store.
    ProductNotAvailable = 5,
    /// The user has not allowed access to cloud service information.
    CloudServicePermissionDenied = 6,
    /// The device could not connect to the network.
    CloudServiceNetworkConnectionFailed = 7,
    /// The user has revoked permission to use this cloud service.
    CloudServiceRevoked = 8,
    /// The user has not yet acknowledged the privacy policy.
    PrivacyAcknowledgementRequired = 9,
    /// The app is attempting to use a property without the required
    /// entitlement.
    UnauthorizedRequestData = 10,
    /// The offer identifier is invalid.
    InvalidOfferIdentifier = 11,
    /// The signature in a payment discount is not valid.
    InvalidSignature = 12,
    /// Parameters are missing in a payment discount.
    MissingOfferParams = 13,
    /// The price in a payment discount is not valid.
    InvalidOfferPrice = 14,
}

impl SkErrorCode {
    pub fn to_purchase_error(self) -> PurchaseError {
        match self {
            SkErrorCode::Unknown => PurchaseError::Unknown,
            SkErrorCode::ClientInvalid => PurchaseError::BillingUnavailable,
            SkErrorCode::PaymentCancelled => PurchaseError::UserCancelled,
            SkErrorCode::PaymentInvalid => PurchaseError::PaymentInvalid,
            SkErrorCode::PaymentNotAllowed => PurchaseError::PaymentNotAllowed,
            SkErrorCode::ProductNotAvailable => PurchaseError::ItemUnavailable,
            SkErrorCode::CloudServicePermissionDenied => PurchaseError::PermissionDenied,
            SkErrorCode::CloudServiceNetworkConnectionFailed => {
                PurchaseError::NetworkConnectionFailed
            }
            SkErrorCode::CloudServiceRevoked => PurchaseError::CloudServiceRevoked,
            SkErrorCode::PrivacyAcknowledgementRequired => PurchaseError::PrivacyError,
            SkErrorCode::UnauthorizedRequestData => PurchaseError::UnauthorizedRequest,
            SkErrorCode::InvalidOfferIdentifier => PurchaseError::InvalidOffer,
            SkErrorCode::InvalidSignature => PurchaseError::InvalidSignature,
            SkErrorCode::MissingOfferParams => PurchaseError::MissingOfferParams,
            SkErrorCode::InvalidOfferPrice => PurchaseError::InvalidOfferPrice,
        }
    }

    /// Translation over the raw code space. `NSError` carries an untyped
    /// integer, so anything outside the declared codes maps to `Unknown`.
    pub fn purchase_error_for(code: i64) -> PurchaseError {
        match code {
            0 => SkErrorCode::Unknown,
            1 => SkErrorCode::ClientInvalid,
            2 => SkErrorCode::PaymentCancelled,
            3 => SkErrorCode::PaymentInvalid,
            4 => SkErrorCode::PaymentNotAllowed,
            5 => SkErrorCode::ProductNotAvailable,
            6 => SkErrorCode::CloudServicePermissionDenied,
            7 => SkErrorCode::CloudServiceNetworkConnectionFailed,
            8 => SkErrorCode::CloudServiceRevoked,
            9 => SkErrorCode::PrivacyAcknowledgementRequired,
            10 => SkErrorCode::UnauthorizedRequestData,
            11 => SkErrorCode::InvalidOfferIdentifier,
            12 => SkErrorCode::InvalidSignature,
            13 => SkErrorCode::MissingOfferParams,
            14 => SkErrorCode::InvalidOfferPrice,
            _ => return PurchaseError::Unknown,
        }
        .to_purchase_error()
    }
}

/// Failure reported by a StoreKit request or the payment queue: the
/// `NSError` code plus its localized description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkRequestError {
    pub code: i64,
    pub localized_description: String,
}

impl SkRequestError {
    pub fn new(code: i64, localized_description: impl Into<String>) -> Self {
        Self {
            code,
            localized_description: localized_description.into(),
        }
    }

    pub fn to_purchase_error(&self) -> PurchaseError {
        SkErrorCode::purchase_error_for(self.code)
    }
}
