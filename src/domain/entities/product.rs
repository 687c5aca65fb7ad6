use serde::{Deserialize, Serialize};

/// Catalog entry returned by [`load_products`], immutable once returned and
/// owned by the caller.
///
/// [`load_products`]: crate::domain::services::in_app_purchase_service::InAppPurchaseService::load_products
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Name of the product.
    pub name: String,
    /// Description of the product.
    pub description: String,
    /// Product id or sku.
    pub product_id: String,
    /// Localized price (not including tax), formatted by the store.
    pub formatted_price: String,
    /// ISO 4217 currency code for the price, e.g. "GBP".
    pub currency_code: String,
    /// Price in micro-units, where 1,000,000 micro-units equal one unit of
    /// the currency. For example, if the price is "€7.99", this is 7990000.
    pub micros_price: i64,
    /// Localized introductory price, empty when the product has none.
    pub localized_introductory_price: String,
    /// Introductory price of the product in micro-units.
    pub micros_introductory_price: i64,
    /// Purchase state of the product.
    pub state: ProductState,
    /// Source of the product image/logo, when the catalog provides one.
    pub image_source: Option<String>,
}

impl Product {
    /// Whether the store returned an introductory price for this product.
    /// Optional in the catalog response, hence the presence check.
    pub fn has_introductory_price(&self) -> bool {
        !self.localized_introductory_price.is_empty()
    }
}

/// Purchase state of a [`Product`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProductState {
    /// The purchase state of the product is unknown (usually not purchased).
    #[default]
    Unknown,
    /// Product has been purchased and is in good standing.
    Active,
    /// Pending purchase, the payment is pending.
    Pending,
    /// Free product. Could be used to promote free products/apps.
    Free,
}
