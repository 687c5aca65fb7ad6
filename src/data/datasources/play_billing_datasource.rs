use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    data::models::play_billing::{
        billing_result::{BillingResult, PurchasesQueryResult, SkuDetailsQueryResult, SkuType},
        purchase_record::PurchaseRecord,
        sku_details::SkuDetails,
    },
    errors::InAppPurchaseError,
};

/// Boundary to the native Play Billing client, implemented by the embedding
/// application. Treated as a black box: connection, catalog queries,
/// purchase launch, past-purchase queries and acknowledge/consume, with
/// asynchronous, possibly multi-callback responses.
#[async_trait]
pub trait PlayBillingClient: Send + Sync {
    /// Registers the listener that receives connection and purchase-update
    /// callbacks. Registered once, before the connection is started; there
    /// is no per-call correlation on the native side.
    fn set_listener(&self, listener: Arc<dyn PlayBillingListener>);

    /// Whether the client is already connected and usable.
    fn is_ready(&self) -> bool;

    /// Starts the connection. The outcome arrives asynchronously through
    /// [`PlayBillingListener::on_billing_setup_finished`].
    fn start_connection(&self);

    /// Tears down the connection and releases client resources.
    fn end_connection(&self) -> Result<(), InAppPurchaseError>;

    /// Queries the catalog partition for the given skus.
    async fn query_sku_details(
        &self,
        product_ids: &[String],
        sku_type: SkuType,
    ) -> SkuDetailsQueryResult;

    /// Launches the native purchase flow for a previously retrieved catalog
    /// record. A non-Ok result means the flow never started; otherwise the
    /// outcome arrives through [`PlayBillingListener::on_purchases_updated`].
    fn launch_billing_flow(&self, sku: &SkuDetails) -> BillingResult;

    /// Queries previously completed purchases for the partition.
    async fn query_purchases(&self, sku_type: SkuType) -> PurchasesQueryResult;

    /// Acknowledges a non-consumable or subscription purchase. `None` means
    /// the backend returned no result object at all.
    async fn acknowledge_purchase(&self, purchase_token: &str) -> Option<BillingResult>;

    /// Consumes a consumable purchase, permitting repurchase.
    async fn consume_purchase(&self, purchase_token: &str) -> Option<BillingResult>;
}

/// Callbacks delivered by the Play Billing client. Invocations may arrive
/// on any thread the backend chooses.
pub trait PlayBillingListener: Send + Sync {
    fn on_billing_setup_finished(&self, result: BillingResult);

    fn on_billing_service_disconnected(&self);

    /// Reports the outcome of a purchase flow: the updated purchases on
    /// success, or a failure code (item-already-owned included).
    fn on_purchases_updated(&self, result: BillingResult, purchases: Vec<PurchaseRecord>);
}
