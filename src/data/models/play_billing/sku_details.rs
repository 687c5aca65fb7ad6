use serde::{Deserialize, Serialize};

/// Native Play Billing catalog record.
///
/// https://developer.android.com/reference/com/android/billingclient/api/SkuDetails
///
/// Purchase launch requires the original catalog record, not just the sku,
/// so retrieved records are cached for the life of the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuDetails {
    /// The product sku.
    pub sku: String,
    /// Title of the product.
    pub title: String,
    /// Description of the product.
    pub description: String,
    /// Formatted price of the item, including its currency sign.
    pub price: String,
    /// Price in micro-units (1,000,000 micro-units equal one currency unit).
    pub price_amount_micros: i64,
    /// ISO 4217 currency code for the price.
    pub price_currency_code: String,
    /// Formatted introductory price, empty when the product has none.
    pub introductory_price: String,
    /// Introductory price in micro-units.
    pub introductory_price_amount_micros: i64,
}
