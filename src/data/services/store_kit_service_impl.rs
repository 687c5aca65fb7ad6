use std::{sync::Arc, sync::Mutex};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Duration, TimeZone, Utc};
use once_cell::sync::Lazy;
use tracing::debug;

use crate::{
    data::{
        bridge::completion_slot::CompletionSlot,
        datasources::store_kit_datasource::{PaymentTransactionObserver, StoreKitPaymentQueue},
        models::store_kit::{
            payment_transaction::{PaymentTransaction, SkPaymentTransactionState},
            sk_error::SkRequestError,
            sk_product::SkProduct,
        },
    },
    domain::{
        entities::{
            product::{Product, ProductState},
            product_type::ProductType,
            purchase_result::{PurchaseResult, PurchaseState},
        },
        services::in_app_purchase_service::InAppPurchaseService,
    },
    errors::{InAppPurchaseError, PurchaseError},
};

/// StoreKit timestamps count seconds from this date rather than the Unix
/// epoch.
static REFERENCE_DATE: Lazy<DateTime<Utc>> =
    Lazy::new(|| Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap());

/// Purchase session over the observer-driven StoreKit payment queue.
///
/// The queue delivers purchase and restore outcomes through a transaction
/// observer registered at session start, so the observer routes each
/// delivery to the pending operation via its completion slots. The observer
/// cell doubles as the connection state: a registered observer means the
/// session is started.
pub struct StoreKitServiceImpl {
    queue: Arc<dyn StoreKitPaymentQueue>,
    observer: Mutex<Option<Arc<PaymentObserver>>>,
}

/// State shared with the payment queue through the observer registration.
struct PaymentObserver {
    queue: Arc<dyn StoreKitPaymentQueue>,
    purchasing: CompletionSlot<PurchaseResult>,
    restoring: CompletionSlot<Vec<PurchaseResult>>,
    /// Restored transactions stream in one by one; they collect here until
    /// the queue signals that the restore flow ended.
    restored: Mutex<Vec<PurchaseResult>>,
}

impl StoreKitServiceImpl {
    pub fn new(queue: Arc<dyn StoreKitPaymentQueue>) -> Self {
        Self {
            queue,
            observer: Mutex::new(None),
        }
    }

    fn current_observer(&self) -> Result<Arc<PaymentObserver>, InAppPurchaseError> {
        self.observer.lock().unwrap().clone().ok_or_else(|| {
            InAppPurchaseError::developer("Payment queue observer has not been added")
        })
    }
}

#[async_trait]
impl InAppPurchaseService for StoreKitServiceImpl {
    async fn start(&self) -> Result<(), InAppPurchaseError> {
        let mut cell = self.observer.lock().unwrap();
        if cell.is_some() {
            return Err(InAppPurchaseError::developer(
                "Payment queue observer has already been added",
            ));
        }

        let observer = Arc::new(PaymentObserver {
            queue: self.queue.clone(),
            purchasing: CompletionSlot::new("purchase"),
            restoring: CompletionSlot::new("restore"),
            restored: Mutex::new(Vec::new()),
        });
        self.queue
            .add_transaction_observer(observer.clone() as Arc<dyn PaymentTransactionObserver>);
        *cell = Some(observer);
        debug!("payment queue observer added");
        Ok(())
    }

    async fn stop(&self) {
        if self.observer.lock().unwrap().take().is_some() {
            if let Err(e) = self.queue.remove_transaction_observer() {
                debug!(error = %e, "unable to remove payment queue observer");
            }
            debug!("payment queue observer removed");
        }
    }

    async fn load_products(
        &self,
        product_ids: &[String],
        _product_type: ProductType,
    ) -> Result<Vec<Product>, InAppPurchaseError> {
        self.current_observer()?;

        let products = self
            .queue
            .fetch_products(product_ids)
            .await
            .map_err(|e| translate(&e))?;

        Ok(products.iter().map(product_from_sk).collect())
    }

    fn can_make_payments(&self) -> bool {
        self.queue.can_make_payments()
    }

    async fn purchase(&self, product_id: &str) -> Result<PurchaseResult, InAppPurchaseError> {
        let observer = self.current_observer()?;
        let receiver = observer.purchasing.begin()?;

        debug!(product_id, "payment added, awaiting transaction update");
        self.queue.add_payment(product_id);

        match receiver.await {
            Ok(outcome) => outcome,
            Err(_) => Err(InAppPurchaseError::unknown("Purchase wait was cancelled")),
        }
    }

    async fn restore(
        &self,
        _product_type: ProductType,
    ) -> Result<Vec<PurchaseResult>, InAppPurchaseError> {
        let observer = self.current_observer()?;
        let receiver = observer.restoring.begin()?;

        observer.restored.lock().unwrap().clear();
        self.queue.restore_completed_transactions();

        match receiver.await {
            Ok(outcome) => outcome,
            Err(_) => Err(InAppPurchaseError::unknown("Restore wait was cancelled")),
        }
    }

    async fn finalize_purchase(
        &self,
        _token: &str,
        _product_type: ProductType,
    ) -> Result<(), InAppPurchaseError> {
        // Transactions are finished by the observer as they are delivered;
        // there is nothing left to settle here.
        self.current_observer()?;
        Ok(())
    }
}

impl PaymentTransactionObserver for PaymentObserver {
    fn updated_transactions(&self, transactions: Vec<PaymentTransaction>) {
        for transaction in transactions {
            debug!(
                state = ?transaction.transaction_state,
                product = transaction.product_identifier.as_deref().unwrap_or(""),
                "transaction updated"
            );
            match transaction.transaction_state {
                SkPaymentTransactionState::Purchased => {
                    self.purchasing
                        .complete(purchase_result_from_transaction(&transaction));
                    self.queue.finish_transaction(&transaction);
                }
                SkPaymentTransactionState::Restored => {
                    self.restored
                        .lock()
                        .unwrap()
                        .push(purchase_result_from_transaction(&transaction));
                    self.queue.finish_transaction(&transaction);
                }
                SkPaymentTransactionState::Failed => {
                    let error = match &transaction.error {
                        Some(e) => translate(e),
                        None => InAppPurchaseError::new(
                            PurchaseError::GeneralError,
                            "Transaction failed without an error",
                        ),
                    };
                    self.purchasing.fail(error);
                    self.queue.finish_transaction(&transaction);
                }
                // Still in flight; a later update carries the outcome.
                SkPaymentTransactionState::Purchasing
                | SkPaymentTransactionState::Deferred => {}
            }
        }
    }

    fn restore_completed_transactions_finished(&self) {
        let restored = std::mem::take(&mut *self.restored.lock().unwrap());
        debug!(count = restored.len(), "restore finished");
        self.restoring.complete(restored);
    }

    fn restore_completed_transactions_failed(&self, error: SkRequestError) {
        self.restored.lock().unwrap().clear();
        self.restoring.fail(translate(&error));
    }
}

fn translate(error: &SkRequestError) -> InAppPurchaseError {
    InAppPurchaseError::new(
        error.to_purchase_error(),
        error.localized_description.clone(),
    )
}

fn micros(price: f64) -> i64 {
    (price * 1_000_000.0).round() as i64
}

fn product_from_sk(product: &SkProduct) -> Product {
    let (intro_price, intro_micros) = match &product.introductory_price {
        Some(discount) => (discount.localized_price.clone(), micros(discount.price)),
        None => (String::new(), 0),
    };
    Product {
        name: product.localized_title.clone(),
        description: product.localized_description.clone(),
        product_id: product.product_identifier.clone(),
        formatted_price: product.localized_price.clone(),
        currency_code: product.currency_code.clone().unwrap_or_default(),
        micros_price: micros(product.price),
        localized_introductory_price: intro_price,
        micros_introductory_price: intro_micros,
        state: ProductState::Unknown,
        image_source: None,
    }
}

/// Identity fields come from the original transaction when one is linked
/// (restored transactions carry theirs there), while the timestamp always
/// reflects the outer transaction. Absent fields fall back to empty/zero
/// defaults.
fn purchase_result_from_transaction(transaction: &PaymentTransaction) -> PurchaseResult {
    let identity: &PaymentTransaction = transaction
        .original_transaction
        .as_deref()
        .unwrap_or(transaction);

    let millis = (transaction.seconds_since_reference_date.unwrap_or(0.0) * 1000.0) as i64;
    let transaction_date_utc = Duration::try_milliseconds(millis)
        .and_then(|offset| REFERENCE_DATE.checked_add_signed(offset))
        .unwrap_or_default();

    PurchaseResult {
        id: identity.transaction_identifier.clone().unwrap_or_default(),
        transaction_date_utc,
        product_id: identity.product_identifier.clone().unwrap_or_default(),
        // StoreKit carries no acknowledgement or renewal flags.
        acknowledged: false,
        auto_renewing: false,
        purchase_token: transaction
            .transaction_receipt
            .as_deref()
            .map(|receipt| BASE64.encode(receipt))
            .unwrap_or_default(),
        state: match transaction.transaction_state {
            SkPaymentTransactionState::Purchasing => PurchaseState::Purchasing,
            SkPaymentTransactionState::Purchased => PurchaseState::Purchased,
            SkPaymentTransactionState::Failed => PurchaseState::Failed,
            SkPaymentTransactionState::Restored => PurchaseState::Restored,
            SkPaymentTransactionState::Deferred => PurchaseState::Deferred,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::data::models::store_kit::sk_product::SkProductDiscount;

    enum RestoreEnd {
        Finished,
        Failed(SkRequestError),
    }

    struct MockQueue {
        observer: Mutex<Option<Arc<dyn PaymentTransactionObserver>>>,
        payments_allowed: AtomicBool,
        products_response: Mutex<Result<Vec<SkProduct>, SkRequestError>>,
        /// Delivered synchronously from add_payment when set.
        update_on_payment: Mutex<Option<Vec<PaymentTransaction>>>,
        /// Restore script: streamed batches, then the terminal callback.
        restore_script: Mutex<Option<(Vec<Vec<PaymentTransaction>>, RestoreEnd)>>,
        finished: Mutex<Vec<PaymentTransaction>>,
        fail_removal: AtomicBool,
    }

    impl MockQueue {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                observer: Mutex::new(None),
                payments_allowed: AtomicBool::new(true),
                products_response: Mutex::new(Ok(Vec::new())),
                update_on_payment: Mutex::new(None),
                restore_script: Mutex::new(None),
                finished: Mutex::new(Vec::new()),
                fail_removal: AtomicBool::new(false),
            })
        }

        fn observer(&self) -> Arc<dyn PaymentTransactionObserver> {
            self.observer.lock().unwrap().clone().expect("no observer")
        }
    }

    #[async_trait]
    impl StoreKitPaymentQueue for MockQueue {
        fn add_transaction_observer(&self, observer: Arc<dyn PaymentTransactionObserver>) {
            *self.observer.lock().unwrap() = Some(observer);
        }

        fn remove_transaction_observer(&self) -> Result<(), InAppPurchaseError> {
            if self.fail_removal.load(Ordering::SeqCst) {
                return Err(InAppPurchaseError::unknown("teardown exploded"));
            }
            *self.observer.lock().unwrap() = None;
            Ok(())
        }

        fn can_make_payments(&self) -> bool {
            self.payments_allowed.load(Ordering::SeqCst)
        }

        fn add_payment(&self, _product_id: &str) {
            if let Some(transactions) = self.update_on_payment.lock().unwrap().take() {
                self.observer().updated_transactions(transactions);
            }
        }

        fn restore_completed_transactions(&self) {
            let Some((batches, end)) = self.restore_script.lock().unwrap().take() else {
                return;
            };
            let observer = self.observer();
            for batch in batches {
                observer.updated_transactions(batch);
            }
            match end {
                RestoreEnd::Finished => observer.restore_completed_transactions_finished(),
                RestoreEnd::Failed(error) => {
                    observer.restore_completed_transactions_failed(error)
                }
            }
        }

        fn finish_transaction(&self, transaction: &PaymentTransaction) {
            self.finished.lock().unwrap().push(transaction.clone());
        }

        async fn fetch_products(
            &self,
            _product_ids: &[String],
        ) -> Result<Vec<SkProduct>, SkRequestError> {
            self.products_response.lock().unwrap().clone()
        }
    }

    fn purchased_transaction(id: &str, product_id: &str) -> PaymentTransaction {
        PaymentTransaction {
            transaction_identifier: Some(id.to_string()),
            product_identifier: Some(product_id.to_string()),
            seconds_since_reference_date: Some(700_000_000.0),
            transaction_state: SkPaymentTransactionState::Purchased,
            error: None,
            original_transaction: None,
            transaction_receipt: Some(b"receipt-bytes".to_vec()),
        }
    }

    fn restored_transaction(id: &str, product_id: &str) -> PaymentTransaction {
        PaymentTransaction {
            transaction_state: SkPaymentTransactionState::Restored,
            ..purchased_transaction(id, product_id)
        }
    }

    async fn started_service(queue: Arc<MockQueue>) -> StoreKitServiceImpl {
        let service = StoreKitServiceImpl::new(queue);
        service.start().await.unwrap();
        service
    }

    #[tokio::test]
    async fn start_registers_the_observer_once() {
        let queue = MockQueue::new();
        let service = StoreKitServiceImpl::new(queue.clone());
        service.start().await.unwrap();
        assert!(queue.observer.lock().unwrap().is_some());

        let err = service.start().await.unwrap_err();
        assert_eq!(err.error, PurchaseError::DeveloperError);
    }

    #[tokio::test]
    async fn stop_removes_the_observer_and_never_fails() {
        let queue = MockQueue::new();
        let service = started_service(queue.clone()).await;
        service.stop().await;
        assert!(queue.observer.lock().unwrap().is_none());

        // Stopped session rejects operations until started again.
        let err = service.purchase("product1").await.unwrap_err();
        assert_eq!(err.error, PurchaseError::DeveloperError);

        queue.fail_removal.store(true, Ordering::SeqCst);
        service.start().await.unwrap();
        service.stop().await;
    }

    #[tokio::test]
    async fn operations_before_start_fail_with_developer_error() {
        let service = StoreKitServiceImpl::new(MockQueue::new());
        let ids = vec!["product1".to_string()];

        let err = service
            .load_products(&ids, ProductType::NonConsumable)
            .await
            .unwrap_err();
        assert_eq!(err.error, PurchaseError::DeveloperError);

        let err = service.purchase("product1").await.unwrap_err();
        assert_eq!(err.error, PurchaseError::DeveloperError);

        let err = service.restore(ProductType::NonConsumable).await.unwrap_err();
        assert_eq!(err.error, PurchaseError::DeveloperError);

        let err = service
            .finalize_purchase("tok1", ProductType::Consumable)
            .await
            .unwrap_err();
        assert_eq!(err.error, PurchaseError::DeveloperError);
    }

    #[test]
    fn can_make_payments_delegates_to_the_queue() {
        let queue = MockQueue::new();
        queue.payments_allowed.store(false, Ordering::SeqCst);
        let service = StoreKitServiceImpl::new(queue);
        assert!(!service.can_make_payments());
    }

    #[tokio::test]
    async fn load_products_normalizes_catalog_entries() {
        let queue = MockQueue::new();
        *queue.products_response.lock().unwrap() = Ok(vec![SkProduct {
            product_identifier: "product1".into(),
            localized_title: "Premium".into(),
            localized_description: "Premium upgrade".into(),
            price: 1.99,
            localized_price: "$1.99".into(),
            currency_code: Some("USD".into()),
            introductory_price: Some(SkProductDiscount {
                price: 0.99,
                localized_price: "$0.99".into(),
            }),
        }]);
        let service = started_service(queue).await;

        let products = service
            .load_products(&["product1".to_string()], ProductType::Subscription)
            .await
            .unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].product_id, "product1");
        assert_eq!(products[0].micros_price, 1_990_000);
        assert_eq!(products[0].currency_code, "USD");
        assert_eq!(products[0].micros_introductory_price, 990_000);
        assert!(products[0].has_introductory_price());
    }

    #[tokio::test]
    async fn load_products_translates_request_errors() {
        let queue = MockQueue::new();
        *queue.products_response.lock().unwrap() =
            Err(SkRequestError::new(5, "product not available"));
        let service = started_service(queue).await;

        let err = service
            .load_products(&["product1".to_string()], ProductType::NonConsumable)
            .await
            .unwrap_err();
        assert_eq!(err.error, PurchaseError::ItemUnavailable);
        assert_eq!(err.message, "product not available");
    }

    #[tokio::test]
    async fn purchase_resolves_and_finishes_the_transaction() {
        let queue = MockQueue::new();
        *queue.update_on_payment.lock().unwrap() =
            Some(vec![purchased_transaction("tx1", "product1")]);
        let service = started_service(queue.clone()).await;

        let purchase = service.purchase("product1").await.unwrap();
        assert_eq!(purchase.id, "tx1");
        assert_eq!(purchase.product_id, "product1");
        assert_eq!(purchase.state, PurchaseState::Purchased);
        assert_eq!(purchase.purchase_token, BASE64.encode(b"receipt-bytes"));
        assert!(!purchase.acknowledged);
        assert!(!purchase.auto_renewing);
        assert_eq!(queue.finished.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn purchase_failure_translates_the_transaction_error() {
        let queue = MockQueue::new();
        let mut failed = purchased_transaction("tx1", "product1");
        failed.transaction_state = SkPaymentTransactionState::Failed;
        failed.error = Some(SkRequestError::new(2, "user cancelled"));
        *queue.update_on_payment.lock().unwrap() = Some(vec![failed]);
        let service = started_service(queue.clone()).await;

        let err = service.purchase("product1").await.unwrap_err();
        assert_eq!(err.error, PurchaseError::UserCancelled);
        // Failed transactions still get finished.
        assert_eq!(queue.finished.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn purchase_failure_without_error_is_a_general_error() {
        let queue = MockQueue::new();
        let mut failed = purchased_transaction("tx1", "product1");
        failed.transaction_state = SkPaymentTransactionState::Failed;
        *queue.update_on_payment.lock().unwrap() = Some(vec![failed]);
        let service = started_service(queue).await;

        let err = service.purchase("product1").await.unwrap_err();
        assert_eq!(err.error, PurchaseError::GeneralError);
    }

    #[tokio::test]
    async fn in_flight_states_are_ignored_until_the_outcome_arrives() {
        let queue = MockQueue::new();
        let mut purchasing = purchased_transaction("tx1", "product1");
        purchasing.transaction_state = SkPaymentTransactionState::Purchasing;
        purchasing.transaction_identifier = None;
        let mut deferred = purchased_transaction("tx1", "product1");
        deferred.transaction_state = SkPaymentTransactionState::Deferred;
        *queue.update_on_payment.lock().unwrap() = Some(vec![
            purchasing,
            deferred,
            purchased_transaction("tx1", "product1"),
        ]);
        let service = started_service(queue.clone()).await;

        let purchase = service.purchase("product1").await.unwrap();
        assert_eq!(purchase.state, PurchaseState::Purchased);
        // Only the terminal transaction was finished.
        assert_eq!(queue.finished.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_purchases_are_rejected_not_queued() {
        let queue = MockQueue::new();
        let service = Arc::new(started_service(queue.clone()).await);

        // First purchase launches but no transaction update arrives yet.
        let first = {
            let service = service.clone();
            tokio::spawn(async move { service.purchase("product1").await })
        };
        loop {
            let pending = {
                let observer = service.observer.lock().unwrap();
                observer.as_ref().unwrap().purchasing.is_pending()
            };
            if pending {
                break;
            }
            tokio::task::yield_now().await;
        }

        let err = service.purchase("product2").await.unwrap_err();
        assert_eq!(err.error, PurchaseError::DeveloperError);

        queue
            .observer()
            .updated_transactions(vec![purchased_transaction("tx1", "product1")]);
        let purchase = first.await.unwrap().unwrap();
        assert_eq!(purchase.id, "tx1");

        // After settlement a new purchase is accepted again.
        *queue.update_on_payment.lock().unwrap() =
            Some(vec![purchased_transaction("tx2", "product2")]);
        let purchase = service.purchase("product2").await.unwrap();
        assert_eq!(purchase.id, "tx2");
    }

    #[tokio::test]
    async fn restore_accumulates_streamed_transactions_in_order() {
        let queue = MockQueue::new();
        *queue.restore_script.lock().unwrap() = Some((
            vec![
                vec![
                    restored_transaction("tx1", "product1"),
                    restored_transaction("tx2", "product2"),
                ],
                vec![restored_transaction("tx3", "product3")],
            ],
            RestoreEnd::Finished,
        ));
        let service = started_service(queue.clone()).await;

        let restored = service.restore(ProductType::NonConsumable).await.unwrap();
        assert_eq!(restored.len(), 3);
        assert_eq!(restored[0].id, "tx1");
        assert_eq!(restored[1].id, "tx2");
        assert_eq!(restored[2].id, "tx3");
        assert!(restored.iter().all(|r| r.state == PurchaseState::Restored));
        assert_eq!(queue.finished.lock().unwrap().len(), 3);

        // The accumulator was flushed; an empty restore yields nothing.
        *queue.restore_script.lock().unwrap() = Some((Vec::new(), RestoreEnd::Finished));
        let restored = service.restore(ProductType::NonConsumable).await.unwrap();
        assert!(restored.is_empty());
    }

    #[tokio::test]
    async fn restore_failure_translates_the_queue_error() {
        let queue = MockQueue::new();
        *queue.restore_script.lock().unwrap() = Some((
            vec![vec![restored_transaction("tx1", "product1")]],
            RestoreEnd::Failed(SkRequestError::new(7, "network down")),
        ));
        let service = started_service(queue).await;

        let err = service.restore(ProductType::NonConsumable).await.unwrap_err();
        assert_eq!(err.error, PurchaseError::NetworkConnectionFailed);
        assert_eq!(err.message, "network down");
    }

    #[tokio::test]
    async fn finalize_is_a_no_op_success() {
        let service = started_service(MockQueue::new()).await;
        service
            .finalize_purchase("any-token", ProductType::Consumable)
            .await
            .unwrap();
    }

    #[test]
    fn normalization_prefers_the_original_transaction_identity() {
        let mut outer = restored_transaction("tx-restored", "product-outer");
        outer.seconds_since_reference_date = Some(86_400.0);
        outer.original_transaction =
            Some(Box::new(purchased_transaction("tx-original", "product1")));

        let result = purchase_result_from_transaction(&outer);
        assert_eq!(result.id, "tx-original");
        assert_eq!(result.product_id, "product1");
        // The timestamp stays with the outer transaction.
        assert_eq!(
            result.transaction_date_utc,
            Utc.with_ymd_and_hms(2001, 1, 2, 0, 0, 0).unwrap()
        );
        assert_eq!(result.state, PurchaseState::Restored);
    }

    #[test]
    fn normalization_defaults_missing_fields() {
        let transaction = PaymentTransaction {
            transaction_identifier: None,
            product_identifier: None,
            seconds_since_reference_date: None,
            transaction_state: SkPaymentTransactionState::Purchasing,
            error: None,
            original_transaction: None,
            transaction_receipt: None,
        };

        let result = purchase_result_from_transaction(&transaction);
        assert_eq!(result.id, "");
        assert_eq!(result.product_id, "");
        assert_eq!(result.purchase_token, "");
        assert_eq!(result.transaction_date_utc, *REFERENCE_DATE);
        assert_eq!(result.state, PurchaseState::Purchasing);
    }
}
