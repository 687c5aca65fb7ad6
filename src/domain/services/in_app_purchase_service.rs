use async_trait::async_trait;

use crate::{
    domain::entities::{
        product::Product, product_type::ProductType, purchase_result::PurchaseResult,
    },
    errors::InAppPurchaseError,
};

/// The purchase session interface implemented by both store backends.
///
/// One logical session per instance. All operations are asynchronous:
/// submission never blocks, and completion suspends until the backend
/// delivers the matching callback. Only one purchase and only one restore
/// may be in flight at a time; a second request of the same kind is
/// rejected with `DeveloperError` rather than queued.
#[async_trait]
pub trait InAppPurchaseService: Send + Sync {
    /// Initializes the in-app purchase infrastructure: connects to the
    /// billing client or registers the payment observer. Not reentrant;
    /// fails with `DeveloperError` if the session is already started.
    async fn start(&self) -> Result<(), InAppPurchaseError>;

    /// Shuts down the in-app purchase infrastructure. Always succeeds from
    /// the caller's perspective: backend teardown errors are logged and
    /// swallowed, so it is safe to call from cleanup paths regardless of
    /// prior state. Cancels an outstanding `start` wait, but leaves
    /// in-flight purchase/restore waits pending.
    async fn stop(&self);

    /// Loads products from the store catalog.
    ///
    /// product_ids:
    ///   Product ids to load.
    /// product_type:
    ///   Selects the backend catalog partition (subscription vs. one-time).
    async fn load_products(
        &self,
        product_ids: &[String],
        product_type: ProductType,
    ) -> Result<Vec<Product>, InAppPurchaseError>;

    /// Whether purchases can be made on this device.
    fn can_make_payments(&self) -> bool;

    /// Launches the purchase flow for the given product and suspends until
    /// the backend reports the outcome. There is no timeout: if the user
    /// abandons the flow without any backend notification, the wait stays
    /// pending; callers impose their own timeout policy if needed.
    async fn purchase(&self, product_id: &str) -> Result<PurchaseResult, InAppPurchaseError>;

    /// Restores previously completed purchases of the given type.
    async fn restore(
        &self,
        product_type: ProductType,
    ) -> Result<Vec<PurchaseResult>, InAppPurchaseError>;

    /// Finalizes a purchase: acknowledges subscriptions/non-consumables,
    /// consumes consumables. A no-op on StoreKit, where transactions are
    /// finished as they are observed.
    async fn finalize_purchase(
        &self,
        token: &str,
        product_type: ProductType,
    ) -> Result<(), InAppPurchaseError>;
}
