use serde::{Deserialize, Serialize};

/// Native StoreKit catalog record (`SKProduct`).
///
/// https://developer.apple.com/documentation/storekit/skproduct
///
/// Price formatting is done on the platform side with the product's price
/// locale, so the formatted strings arrive pre-localized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkProduct {
    /// The string that identifies the product to the App Store.
    pub product_identifier: String,
    /// Localized name of the product.
    pub localized_title: String,
    /// Localized description of the product.
    pub localized_description: String,
    /// Cost of the product in the local currency, in whole currency units.
    pub price: f64,
    /// Price formatted with the product's locale, e.g. "$1.99".
    pub localized_price: String,
    /// ISO 4217 currency code of the price locale. May be absent when the
    /// locale carries no currency.
    pub currency_code: Option<String>,
    /// Introductory offer, when one is configured.
    pub introductory_price: Option<SkProductDiscount>,
}

/// Introductory/promotional pricing attached to an [`SkProduct`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkProductDiscount {
    pub price: f64,
    pub localized_price: String,
}
