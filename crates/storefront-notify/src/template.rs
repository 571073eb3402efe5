//! Order confirmation email templates.
//!
//! Money values are formatted before rendering so the templates only deal
//! in strings. HTML output is escaped by Askama, so customer-supplied item
//! names and addresses cannot inject markup into the email.

use askama::Template;

use storefront_core::{Order, format_currency};

/// One rendered line of the order table.
pub struct ItemRow {
    pub index: usize,
    pub name: String,
    pub quantity: u64,
    pub unit_price: String,
    pub line_total: String,
}

/// HTML body of the order confirmation email.
#[derive(Template)]
#[template(path = "order_confirmation.html")]
pub struct OrderConfirmationHtml<'a> {
    pub session_id: Option<&'a str>,
    pub customer_name: &'a str,
    pub customer_email: &'a str,
    pub customer_address: &'a str,
    pub rows: Vec<ItemRow>,
    pub total: String,
}

/// Plain text body of the order confirmation email.
#[derive(Template)]
#[template(path = "order_confirmation.txt")]
pub struct OrderConfirmationText<'a> {
    pub session_id: Option<&'a str>,
    pub customer_name: &'a str,
    pub customer_email: &'a str,
    pub customer_address: &'a str,
    pub rows: Vec<ItemRow>,
    pub total: String,
}

/// Format the order's items into table rows.
pub fn item_rows(order: &Order) -> Vec<ItemRow> {
    order
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| ItemRow {
            index: i + 1,
            name: item.name.clone(),
            quantity: item.quantity,
            unit_price: format_currency(item.price, &order.currency),
            line_total: format_currency(item.total(), &order.currency),
        })
        .collect()
}

/// Placeholder for customer fields the checkout never captured.
pub fn or_unknown(value: &str) -> &str {
    if value.is_empty() { "unknown" } else { value }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use storefront_core::{Customer, LineItem, Order};

    use super::*;

    fn order() -> Order {
        Order {
            customer: Customer {
                name: "Olena".into(),
                email: "olena@example.com".into(),
                address: String::new(),
            },
            items: vec![
                LineItem {
                    name: "Varenyky".into(),
                    price: dec!(12.5),
                    quantity: 2,
                },
                LineItem {
                    name: "Kvas <1L> & \"cold\"".into(),
                    price: dec!(3),
                    quantity: 1,
                },
            ],
            currency: "CAD".into(),
            total: dec!(28),
            created_at: Utc::now(),
        }
    }

    fn render_html(order: &Order, session_id: Option<&str>) -> String {
        OrderConfirmationHtml {
            session_id,
            customer_name: or_unknown(&order.customer.name),
            customer_email: or_unknown(&order.customer.email),
            customer_address: or_unknown(&order.customer.address),
            rows: item_rows(order),
            total: format_currency(order.total, &order.currency),
        }
        .render()
        .unwrap()
    }

    #[test]
    fn test_html_renders_items_and_total() {
        let html = render_html(&order(), Some("cs_test_123"));
        assert!(html.contains("cs_test_123"));
        assert!(html.contains("Varenyky"));
        assert!(html.contains("12.50 CAD"));
        assert!(html.contains("25.00 CAD"));
        assert!(html.contains("28.00 CAD"));
        assert!(html.contains("Olena"));
    }

    #[test]
    fn test_html_escapes_markup_in_names() {
        let html = render_html(&order(), None);
        // No raw markup or quotes from the interpolated name survive.
        assert!(!html.contains("<1L>"));
        assert!(!html.contains("\"cold\""));
        assert!(html.contains("Kvas &#60;1L&#62; &#38; &#34;cold&#34;"));
    }

    #[test]
    fn test_missing_customer_fields_render_as_unknown() {
        let html = render_html(&order(), None);
        assert!(html.contains("unknown"));
    }

    #[test]
    fn test_text_renders_rows() {
        let text = OrderConfirmationText {
            session_id: None,
            customer_name: "Olena",
            customer_email: "olena@example.com",
            customer_address: "unknown",
            rows: item_rows(&order()),
            total: "28.00 CAD".into(),
        }
        .render()
        .unwrap();
        assert!(text.contains("1. Varenyky x2 at 12.50 CAD = 25.00 CAD"));
        assert!(text.contains("Order total: 28.00 CAD"));
    }
}
