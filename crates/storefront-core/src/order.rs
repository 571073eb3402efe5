//! Order and Customer Records

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::line_item::LineItem;

/// Customer details attached to an order. Every field is optional at intake;
/// the empty string is the canonical "unknown" value so stored records never
/// carry nulls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
}

/// An order awaiting or past payment confirmation.
///
/// `total` is the processor's authoritative amount when one is known,
/// otherwise the sum of line totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub customer: Customer,
    pub items: Vec<LineItem>,
    /// Three-letter uppercase currency code.
    pub currency: String,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Sum of `price * quantity` over the items, saturating at
    /// `Decimal::MAX` rather than panicking on absurd inputs.
    #[must_use]
    pub fn items_total(items: &[LineItem]) -> Decimal {
        items
            .iter()
            .fold(Decimal::ZERO, |acc, item| acc.saturating_add(item.total()))
    }
}
