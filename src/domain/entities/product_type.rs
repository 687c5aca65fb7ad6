use serde::{Deserialize, Serialize};

/// Product type supplied by the caller, never inferred. Determines which
/// backend catalog partition and finalization path is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductType {
    /// Unknown/invalid product type.
    Unknown,
    Subscription,
    Consumable,
    NonConsumable,
}
