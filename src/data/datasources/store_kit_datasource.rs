use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    data::models::store_kit::{
        payment_transaction::PaymentTransaction, sk_error::SkRequestError, sk_product::SkProduct,
    },
    errors::InAppPurchaseError,
};

/// Boundary to the native StoreKit payment queue, implemented by the
/// embedding application.
#[async_trait]
pub trait StoreKitPaymentQueue: Send + Sync {
    /// Adds the observer that receives transaction updates and restore
    /// signals for this queue.
    fn add_transaction_observer(&self, observer: Arc<dyn PaymentTransactionObserver>);

    /// Removes the previously added observer.
    fn remove_transaction_observer(&self) -> Result<(), InAppPurchaseError>;

    /// Whether the user can authorize payments on this device.
    fn can_make_payments(&self) -> bool;

    /// Adds a payment request to the queue. The outcome arrives through
    /// [`PaymentTransactionObserver::updated_transactions`].
    fn add_payment(&self, product_id: &str);

    /// Asks the queue to re-deliver previously completed transactions. They
    /// stream through [`PaymentTransactionObserver::updated_transactions`]
    /// until one of the terminal restore callbacks fires.
    fn restore_completed_transactions(&self);

    /// Marks a delivered transaction as finished, removing it from the
    /// queue.
    fn finish_transaction(&self, transaction: &PaymentTransaction);

    /// Fetches catalog entries for the given product identifiers. Unlike
    /// purchases, a products request carries its own per-call delegate on
    /// the native side, so it maps onto a plain awaitable call here.
    async fn fetch_products(&self, product_ids: &[String])
        -> Result<Vec<SkProduct>, SkRequestError>;
}

/// Payment queue callbacks. Invocations may arrive on any thread the
/// backend chooses.
pub trait PaymentTransactionObserver: Send + Sync {
    /// One or more transactions were added or changed state in the queue.
    fn updated_transactions(&self, transactions: Vec<PaymentTransaction>);

    /// All restored transactions have been delivered.
    fn restore_completed_transactions_finished(&self);

    /// The restore flow failed.
    fn restore_completed_transactions_failed(&self, error: SkRequestError);
}
