pub mod data {
    pub(crate) mod bridge {
        pub(crate) mod completion_slot;
    }
    pub mod datasources {
        pub mod play_billing_datasource;
        pub mod store_kit_datasource;
    }
    pub mod models {
        pub mod play_billing {
            pub mod billing_result;
            pub mod purchase_record;
            pub mod sku_details;
        }
        pub mod store_kit {
            pub mod payment_transaction;
            pub mod sk_error;
            pub mod sk_product;
        }
    }
    pub mod services {
        pub mod play_billing_service_impl;
        pub mod store_kit_service_impl;
    }
}

pub mod domain {
    pub mod entities {
        pub mod product;
        pub mod product_type;
        pub mod purchase_result;
    }
    pub mod services {
        pub mod in_app_purchase_service;
    }
}

pub mod errors;
pub mod util;
