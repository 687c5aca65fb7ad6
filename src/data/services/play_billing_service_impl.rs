use std::{collections::HashMap, sync::Arc, sync::Mutex};

use async_trait::async_trait;
use chrono::DateTime;
use tracing::debug;

use crate::{
    data::{
        bridge::completion_slot::CompletionSlot,
        datasources::play_billing_datasource::{PlayBillingClient, PlayBillingListener},
        models::play_billing::{
            billing_result::{BillingResult, SkuType},
            purchase_record::{PurchaseRecord, PurchaseStateCode},
            sku_details::SkuDetails,
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

/// Purchase session over the callback-driven Play Billing client.
///
/// Orchestrates connect → query catalog → launch purchase → await the
/// purchase-update callback → acknowledge/consume. The client delivers all
/// purchase outcomes through one listener registered at connection time, so
/// the session routes each callback to the currently pending operation via
/// its completion slots.
pub struct PlayBillingServiceImpl {
    client: Arc<dyn PlayBillingClient>,
    session: Arc<PlayBillingSession>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// State shared between the service and the listener the client calls back
/// into. Mutated only by the owning session and its registered listener.
struct PlayBillingSession {
    state: Mutex<ConnectionState>,
    connected: CompletionSlot<()>,
    purchasing: CompletionSlot<PurchaseResult>,
    /// Catalog records by sku. Purchase launch requires the original
    /// record, so callers must query products before purchasing. Entries
    /// live until the session is dropped; the catalog is small and
    /// re-queries insert-if-absent.
    retrieved_products: Mutex<HashMap<String, SkuDetails>>,
}

impl PlayBillingServiceImpl {
    pub fn new(client: Arc<dyn PlayBillingClient>) -> Self {
        Self {
            client,
            session: Arc::new(PlayBillingSession {
                state: Mutex::new(ConnectionState::Disconnected),
                connected: CompletionSlot::new("connection"),
                purchasing: CompletionSlot::new("purchase"),
                retrieved_products: Mutex::new(HashMap::new()),
            }),
        }
    }

    fn ensure_connected(&self) -> Result<(), InAppPurchaseError> {
        if *self.session.state.lock().unwrap() != ConnectionState::Connected {
            return Err(InAppPurchaseError::developer(
                "Billing client is not connected",
            ));
        }
        Ok(())
    }

    fn set_state(&self, state: ConnectionState) {
        *self.session.state.lock().unwrap() = state;
    }

    async fn acknowledge(&self, token: &str) -> Result<(), InAppPurchaseError> {
        check_billing_result(self.client.acknowledge_purchase(token).await)
    }

    async fn consume(&self, token: &str) -> Result<(), InAppPurchaseError> {
        check_billing_result(self.client.consume_purchase(token).await)
    }
}

#[async_trait]
impl InAppPurchaseService for PlayBillingServiceImpl {
    async fn start(&self) -> Result<(), InAppPurchaseError> {
        {
            let mut state = self.session.state.lock().unwrap();
            if *state != ConnectionState::Disconnected {
                return Err(InAppPurchaseError::developer(
                    "Billing client has already been started",
                ));
            }
            *state = ConnectionState::Connecting;
        }

        let receiver = match self.session.connected.begin() {
            Ok(receiver) => receiver,
            Err(e) => {
                self.set_state(ConnectionState::Disconnected);
                return Err(e);
            }
        };

        self.client
            .set_listener(self.session.clone() as Arc<dyn PlayBillingListener>);

        if self.client.is_ready() {
            // Already connected; complete without waiting on the callback.
            self.session.connected.complete(());
        } else {
            debug!("starting billing client connection");
            self.client.start_connection();
        }

        match receiver.await {
            Ok(Ok(())) => {
                self.set_state(ConnectionState::Connected);
                debug!("billing client connected");
                Ok(())
            }
            Ok(Err(e)) => {
                self.set_state(ConnectionState::Disconnected);
                Err(e)
            }
            // Slot cancelled by stop() while we were waiting.
            Err(_) => {
                self.set_state(ConnectionState::Disconnected);
                Err(InAppPurchaseError::new(
                    PurchaseError::ServiceDisconnected,
                    "Connection wait was cancelled",
                ))
            }
        }
    }

    async fn stop(&self) {
        self.set_state(ConnectionState::Disconnected);
        self.session.connected.cancel();

        if let Err(e) = self.client.end_connection() {
            // Teardown must always succeed from the caller's perspective.
            debug!(error = %e, "unable to end billing client connection");
        }
        debug!("billing client disconnected");
    }

    async fn load_products(
        &self,
        product_ids: &[String],
        product_type: ProductType,
    ) -> Result<Vec<Product>, InAppPurchaseError> {
        self.ensure_connected()?;

        let query = self
            .client
            .query_sku_details(product_ids, sku_type_for(product_type))
            .await;

        let result = query
            .billing_result
            .ok_or_else(|| InAppPurchaseError::unknown("BillingResult is null"))?;
        if !result.is_ok() {
            return Err(billing_error(&result));
        }

        {
            let mut cache = self.session.retrieved_products.lock().unwrap();
            for sku in &query.sku_details {
                cache.entry(sku.sku.clone()).or_insert_with(|| sku.clone());
            }
        }

        Ok(query.sku_details.iter().map(product_from_sku).collect())
    }

    fn can_make_payments(&self) -> bool {
        // Play Billing has no capability query; purchases are always
        // permitted once connected.
        true
    }

    async fn purchase(&self, product_id: &str) -> Result<PurchaseResult, InAppPurchaseError> {
        self.ensure_connected()?;

        if self.session.purchasing.is_pending() {
            return Err(InAppPurchaseError::developer(
                "Another purchase is in progress",
            ));
        }

        let sku = self
            .session
            .retrieved_products
            .lock()
            .unwrap()
            .get(product_id)
            .cloned()
            .ok_or_else(|| {
                InAppPurchaseError::developer(format!(
                    "No retrieved product with sku {product_id}; products must be queried before purchasing"
                ))
            })?;

        let receiver = self.session.purchasing.begin()?;

        let launch = self.client.launch_billing_flow(&sku);
        if !launch.is_ok() {
            // The flow never started; no callback will arrive for it.
            self.session.purchasing.cancel();
            return Err(billing_error(&launch));
        }

        debug!(sku = %sku.sku, "billing flow launched, awaiting purchase update");
        match receiver.await {
            Ok(outcome) => outcome,
            Err(_) => Err(InAppPurchaseError::unknown("Purchase wait was cancelled")),
        }
    }

    async fn restore(
        &self,
        product_type: ProductType,
    ) -> Result<Vec<PurchaseResult>, InAppPurchaseError> {
        self.ensure_connected()?;

        let query = self
            .client
            .query_purchases(sku_type_for(product_type))
            .await;

        let result = query
            .billing_result
            .ok_or_else(|| InAppPurchaseError::unknown("BillingResult is null"))?;
        if !result.is_ok() {
            return Err(billing_error(&result));
        }

        Ok(query
            .purchases
            .iter()
            .map(|p| {
                debug!(sku = %p.sku, acknowledged = p.is_acknowledged, state = ?p.purchase_state, "restored purchase");
                purchase_result_from_record(p)
            })
            .collect())
    }

    async fn finalize_purchase(
        &self,
        token: &str,
        product_type: ProductType,
    ) -> Result<(), InAppPurchaseError> {
        self.ensure_connected()?;

        match product_type {
            // Subscriptions are acknowledged the same way as non-consumables.
            // https://developer.android.com/google/play/billing/integrate#acknowledge
            ProductType::Subscription | ProductType::NonConsumable => self.acknowledge(token).await,
            ProductType::Consumable => self.consume(token).await,
            ProductType::Unknown => Err(InAppPurchaseError::developer(format!(
                "Unsupported product type {product_type:?}"
            ))),
        }
    }
}

impl PlayBillingListener for PlayBillingSession {
    fn on_billing_setup_finished(&self, result: BillingResult) {
        debug!(code = ?result.response_code, message = %result.debug_message, "billing setup finished");
        if result.is_ok() {
            self.connected.complete(());
        } else {
            self.connected.fail(billing_error(&result));
        }
    }

    fn on_billing_service_disconnected(&self) {
        debug!("billing service disconnected");
    }

    fn on_purchases_updated(&self, result: BillingResult, purchases: Vec<PurchaseRecord>) {
        debug!(code = ?result.response_code, message = %result.debug_message, count = purchases.len(), "purchases updated");

        if !result.is_ok() {
            // Any non-Ok code fails the pending purchase, item-already-owned
            // included.
            self.purchasing.fail(billing_error(&result));
            return;
        }

        match purchases.first() {
            Some(purchase) => self.purchasing.complete(purchase_result_from_record(purchase)),
            None => self
                .purchasing
                .fail(InAppPurchaseError::unknown("Purchase update contained no purchases")),
        }
    }
}

fn sku_type_for(product_type: ProductType) -> SkuType {
    match product_type {
        ProductType::Subscription => SkuType::Subs,
        ProductType::Consumable | ProductType::NonConsumable | ProductType::Unknown => {
            SkuType::InApp
        }
    }
}

fn billing_error(result: &BillingResult) -> InAppPurchaseError {
    InAppPurchaseError::new(
        result.response_code.to_purchase_error(),
        result.debug_message.clone(),
    )
}

fn check_billing_result(result: Option<BillingResult>) -> Result<(), InAppPurchaseError> {
    let result = result.ok_or_else(|| InAppPurchaseError::unknown("BillingResult is null"))?;
    if !result.is_ok() {
        return Err(billing_error(&result));
    }
    Ok(())
}

fn product_from_sku(sku: &SkuDetails) -> Product {
    Product {
        name: sku.title.clone(),
        description: sku.description.clone(),
        product_id: sku.sku.clone(),
        formatted_price: sku.price.clone(),
        currency_code: sku.price_currency_code.clone(),
        micros_price: sku.price_amount_micros,
        localized_introductory_price: sku.introductory_price.clone(),
        micros_introductory_price: sku.introductory_price_amount_micros,
        state: ProductState::Unknown,
        image_source: None,
    }
}

fn purchase_result_from_record(record: &PurchaseRecord) -> PurchaseResult {
    PurchaseResult {
        id: record.order_id.clone(),
        transaction_date_utc: DateTime::from_timestamp_millis(record.purchase_time_millis)
            .unwrap_or_default(),
        product_id: record.sku.clone(),
        acknowledged: record.is_acknowledged,
        auto_renewing: record.is_auto_renewing,
        purchase_token: record.purchase_token.clone(),
        state: match record.purchase_state {
            PurchaseStateCode::Unspecified => PurchaseState::Unknown,
            PurchaseStateCode::Purchased => PurchaseState::Purchased,
            PurchaseStateCode::Pending => PurchaseState::PaymentPending,
        },
    }
}
