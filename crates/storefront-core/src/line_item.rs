//! Line-Item Normalization
//!
//! Cart items arrive from two places with different shapes: the client's
//! cart submission (unit price plus quantity, loosely typed) and the payment
//! processor's retrospective line-item listing (minor-unit totals). Each
//! shape has its own adapter into the canonical [`LineItem`]; nothing else
//! in the codebase inspects the raw records.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::money::to_number;

/// Display-name bound enforced before an item is sent to the processor.
pub const NAME_MAX_CHARS: usize = 250;

/// Placeholder name for items that arrive without one.
const UNNAMED_ITEM: &str = "Item";

/// Canonical order line: display name, unit price in major currency units,
/// and quantity. Invariant: `price > 0` and `quantity >= 1`; records that
/// cannot satisfy this are discarded during normalization, not clamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub price: Decimal,
    pub quantity: u64,
}

impl LineItem {
    /// Line total (`price * quantity`), saturating at `Decimal::MAX` so a
    /// hostile price can never panic the arithmetic.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity))
    }
}

/// Raw client-submitted cart item. Field names vary between callers
/// (`qty` vs `quantity`, `price` vs `amount`), and values may be numbers
/// or strings, so everything is kept loose and resolved via coercion.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CartItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub quantity: Option<Value>,
    #[serde(default)]
    pub qty: Option<Value>,
}

impl CartItem {
    /// First of `quantity`/`qty` that coerces to a positive integer, else 1.
    fn resolve_quantity(&self) -> u64 {
        [&self.quantity, &self.qty]
            .into_iter()
            .flatten()
            .find_map(|v| to_number(v).trunc().to_u64().filter(|q| *q > 0))
            .unwrap_or(1)
    }

    /// Unit price from `price`, falling back to the `amount` alias.
    fn resolve_price(&self) -> Decimal {
        self.price
            .as_ref()
            .or(self.amount.as_ref())
            .map(to_number)
            .unwrap_or(Decimal::ZERO)
    }

    fn resolve_name(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => truncate_chars(name, NAME_MAX_CHARS),
            _ => UNNAMED_ITEM.to_string(),
        }
    }
}

/// Line item as reported back by the payment processor for a completed
/// session. Totals are in minor currency units (cents) and are authoritative:
/// the processor does not report the unit price the client originally
/// submitted, so the unit price is derived from the total to avoid cent-level
/// drift against what was actually charged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionLineItem {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub quantity: Option<u64>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub amount_subtotal: Option<i64>,
    #[serde(default)]
    pub price: Option<SessionPrice>,
}

/// Price object nested inside a processor line item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionPrice {
    #[serde(default)]
    pub unit_amount: Option<i64>,
}

impl SessionLineItem {
    fn resolve_quantity(&self) -> u64 {
        self.quantity.filter(|q| *q > 0).unwrap_or(1)
    }

    /// Line total in minor units: `amount_total`, else `amount_subtotal`,
    /// else `unit_amount * quantity`.
    fn resolve_total_minor(&self, quantity: u64) -> Option<i64> {
        self.amount_total
            .or(self.amount_subtotal)
            .or_else(|| {
                self.price
                    .as_ref()
                    .and_then(|p| p.unit_amount)
                    .and_then(|unit| i64::try_from(quantity).ok().and_then(|q| unit.checked_mul(q)))
            })
    }
}

/// Normalize client-submitted cart items, preserving order and discarding
/// records whose coerced price is not positive or whose line total cannot
/// be represented.
#[must_use]
pub fn normalize_cart(items: &[CartItem]) -> Vec<LineItem> {
    items
        .iter()
        .filter_map(|raw| {
            let quantity = raw.resolve_quantity();
            let price = raw.resolve_price();
            if price <= Decimal::ZERO {
                return None;
            }
            // Coercion accepts arbitrarily large strings; anything whose
            // line total overflows Decimal is garbage, not an order.
            price.checked_mul(Decimal::from(quantity))?;
            Some(LineItem {
                name: raw.resolve_name(),
                price,
                quantity,
            })
        })
        .collect()
}

/// Normalize processor-reported line items (line-total-authoritative path),
/// preserving order and discarding records without a positive total.
#[must_use]
pub fn normalize_session_items(items: &[SessionLineItem]) -> Vec<LineItem> {
    items
        .iter()
        .filter_map(|raw| {
            let quantity = raw.resolve_quantity();
            let total_minor = raw.resolve_total_minor(quantity)?;
            let price = Decimal::new(total_minor, 2) / Decimal::from(quantity);
            (price > Decimal::ZERO).then(|| LineItem {
                name: raw
                    .description
                    .as_deref()
                    .filter(|d| !d.is_empty())
                    .map_or_else(|| UNNAMED_ITEM.to_string(), |d| {
                        truncate_chars(d, NAME_MAX_CHARS)
                    }),
                price,
                quantity,
            })
        })
        .collect()
}

/// Truncate to a maximum number of characters without splitting a char.
#[must_use]
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn cart_item(value: Value) -> CartItem {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_cart_normalization_drops_nonpositive_prices() {
        let items = vec![
            cart_item(json!({"name": "Varenyky", "price": "12.5", "quantity": 2})),
            cart_item(json!({"name": "Kvas", "price": "-1", "quantity": 1})),
        ];

        let normalized = normalize_cart(&items);
        assert_eq!(
            normalized,
            vec![LineItem {
                name: "Varenyky".into(),
                price: dec!(12.5),
                quantity: 2,
            }]
        );
    }

    #[test]
    fn test_cart_aliases_resolved() {
        let items = vec![cart_item(json!({"amount": 9.99, "qty": "3"}))];

        let normalized = normalize_cart(&items);
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].name, "Item");
        assert_eq!(normalized[0].price, dec!(9.99));
        assert_eq!(normalized[0].quantity, 3);
    }

    #[test]
    fn test_cart_quantity_defaults_to_one() {
        let items = vec![
            cart_item(json!({"name": "A", "price": 5})),
            cart_item(json!({"name": "B", "price": 5, "quantity": 0})),
            cart_item(json!({"name": "C", "price": 5, "quantity": -2})),
        ];

        let normalized = normalize_cart(&items);
        assert!(normalized.iter().all(|item| item.quantity == 1));
    }

    #[test]
    fn test_cart_order_preserved() {
        let items = vec![
            cart_item(json!({"name": "A", "price": 1})),
            cart_item(json!({"name": "B", "price": "zero"})),
            cart_item(json!({"name": "C", "price": 2})),
        ];

        let names: Vec<_> = normalize_cart(&items)
            .into_iter()
            .map(|item| item.name)
            .collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn test_session_items_use_authoritative_total() {
        let items = vec![SessionLineItem {
            description: Some("Varenyky".into()),
            quantity: Some(2),
            amount_total: Some(2500),
            amount_subtotal: Some(2400),
            price: Some(SessionPrice {
                unit_amount: Some(1200),
            }),
        }];

        let normalized = normalize_session_items(&items);
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].price, dec!(12.5));
        assert_eq!(normalized[0].total(), dec!(25));
    }

    #[test]
    fn test_session_items_fall_back_to_unit_amount() {
        let items = vec![SessionLineItem {
            description: None,
            quantity: Some(3),
            price: Some(SessionPrice {
                unit_amount: Some(400),
            }),
            ..SessionLineItem::default()
        }];

        let normalized = normalize_session_items(&items);
        assert_eq!(normalized[0].name, "Item");
        assert_eq!(normalized[0].price, dec!(4));
        assert_eq!(normalized[0].quantity, 3);
    }

    #[test]
    fn test_session_items_discard_zero_totals() {
        let items = vec![SessionLineItem {
            description: Some("Freebie".into()),
            quantity: Some(1),
            amount_total: Some(0),
            ..SessionLineItem::default()
        }];

        assert!(normalize_session_items(&items).is_empty());
    }

    #[test]
    fn test_astronomical_prices_discarded_not_panicking() {
        let items = vec![
            cart_item(json!({"name": "Hostile", "price": "79000000000000000000000000000", "quantity": 2})),
            cart_item(json!({"name": "Varenyky", "price": "12.5", "quantity": 2})),
        ];

        let normalized = normalize_cart(&items);
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].name, "Varenyky");
    }

    #[test]
    fn test_line_total_saturates_instead_of_overflowing() {
        let item = LineItem {
            name: "Hostile".into(),
            price: Decimal::MAX,
            quantity: 2,
        };
        assert_eq!(item.total(), Decimal::MAX);
    }

    #[test]
    fn test_session_unit_amount_overflow_discarded() {
        let items = vec![SessionLineItem {
            description: Some("Hostile".into()),
            quantity: Some(2),
            price: Some(SessionPrice {
                unit_amount: Some(i64::MAX),
            }),
            ..SessionLineItem::default()
        }];

        assert!(normalize_session_items(&items).is_empty());
    }

    #[test]
    fn test_truncate_chars_is_char_safe() {
        assert_eq!(truncate_chars("Вареники з вишнею", 8), "Вареники");
        assert_eq!(truncate_chars("short", 250), "short");
    }

    #[test]
    fn test_long_names_truncated() {
        let long = "x".repeat(400);
        let items = vec![cart_item(json!({"name": long, "price": 1}))];
        assert_eq!(normalize_cart(&items)[0].name.len(), NAME_MAX_CHARS);
    }
}
