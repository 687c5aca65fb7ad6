use std::sync::Arc;

use crate::{
    data::{
        datasources::{
            play_billing_datasource::PlayBillingClient, store_kit_datasource::StoreKitPaymentQueue,
        },
        services::{
            play_billing_service_impl::PlayBillingServiceImpl,
            store_kit_service_impl::StoreKitServiceImpl,
        },
    },
    domain::{
        entities::{product::Product, product_type::ProductType, purchase_result::PurchaseResult},
        services::in_app_purchase_service::InAppPurchaseService,
    },
    errors::InAppPurchaseError,
};

/// Store-agnostic entry point. The backing store is chosen once at
/// construction; everything after that goes through the same portable API.
pub struct InAppPurchase<S: InAppPurchaseService> {
    service: S,
}

impl<S: InAppPurchaseService> InAppPurchase<S> {
    pub async fn start(&self) -> Result<(), InAppPurchaseError> {
        self.service.start().await
    }

    pub async fn stop(&self) {
        self.service.stop().await
    }

    pub async fn load_products(
        &self,
        product_ids: &[String],
        product_type: ProductType,
    ) -> Result<Vec<Product>, InAppPurchaseError> {
        self.service.load_products(product_ids, product_type).await
    }

    pub fn can_make_payments(&self) -> bool {
        self.service.can_make_payments()
    }

    pub async fn purchase(&self, product_id: &str) -> Result<PurchaseResult, InAppPurchaseError> {
        self.service.purchase(product_id).await
    }

    pub async fn restore(
        &self,
        product_type: ProductType,
    ) -> Result<Vec<PurchaseResult>, InAppPurchaseError> {
        self.service.restore(product_type).await
    }

    pub async fn finalize_purchase(
        &self,
        purchase_token: &str,
        product_type: ProductType,
    ) -> Result<(), InAppPurchaseError> {
        self.service
            .finalize_purchase(purchase_token, product_type)
            .await
    }
}

impl InAppPurchase<PlayBillingServiceImpl> {
    pub fn new_play_billing(client: Arc<dyn PlayBillingClient>) -> Self {
        Self {
            service: PlayBillingServiceImpl::new(client),
        }
    }
}

impl InAppPurchase<StoreKitServiceImpl> {
    pub fn new_store_kit(queue: Arc<dyn StoreKitPaymentQueue>) -> Self {
        Self {
            service: StoreKitServiceImpl::new(queue),
        }
    }
}
