//! Domain DTOs for the Kami API.
//!
//! # Design
//! These records are transient: fetched, displayed, discarded. Server ids
//! arrive as `_id`; every other key is camelCase. Amounts are `i64` đồng.
//! Transaction totals are never stored on the record, they are recomputed
//! from the line items each time `subtotal` / `total` is called.

use serde::{Deserialize, Serialize};

/// A service offered by the business.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateService {
    pub name: String,
    pub price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Partial update; omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateService {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A customer. `transactions` is only populated on detail responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Customer {
    /// Sum of the embedded transactions' line items, before discounts.
    pub fn total_spent(&self) -> i64 {
        self.transactions.iter().map(Transaction::subtotal).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateCustomer {
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateCustomer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// One service entry within a transaction, priced at the time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineItem {
    pub name: String,
    pub price: i64,
    pub quantity: i64,
}

impl LineItem {
    pub fn line_total(&self) -> i64 {
        self.price * self.quantity
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub services: Vec<LineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Transaction {
    /// Σ price × quantity over the line items.
    pub fn subtotal(&self) -> i64 {
        self.services.iter().map(LineItem::line_total).sum()
    }

    /// Subtotal minus the discount; an absent discount counts as zero.
    pub fn total(&self) -> i64 {
        self.subtotal() - self.discount.unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransaction {
    pub customer_id: String,
    pub services: Vec<LineItem>,
}

/// Body of `POST /auth`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// The active session: bearer token plus the phone number it was issued for.
///
/// Only the token is persisted, so `subject` is `None` for a credential
/// restored from storage by a later process.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub subject: Option<String>,
}

// Keep the token out of logs and panic messages.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("subject", &self.subject)
            .finish()
    }
}

/// Render an amount with thousands separators, e.g. `1,234,000 đ`.
pub fn format_amount(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0 { "-" } else { "" };
    format!("{sign}{grouped} đ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: i64, quantity: i64) -> LineItem {
        LineItem {
            name: "Cut".to_string(),
            price,
            quantity,
        }
    }

    fn transaction(services: Vec<LineItem>, discount: Option<i64>) -> Transaction {
        Transaction {
            id: "t1".to_string(),
            customer_id: None,
            customer_name: None,
            services,
            discount,
            date: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn total_subtracts_discount() {
        let tx = transaction(vec![item(100, 2), item(50, 1)], Some(30));
        assert_eq!(tx.subtotal(), 250);
        assert_eq!(tx.total(), 220);
    }

    #[test]
    fn total_follows_line_item_edits() {
        let mut tx = transaction(vec![item(100, 2)], None);
        assert_eq!(tx.total(), 200);
        tx.services.push(item(50, 3));
        assert_eq!(tx.total(), 350);
        tx.services[0].quantity = 1;
        assert_eq!(tx.total(), 250);
    }

    #[test]
    fn empty_transaction_totals_zero() {
        assert_eq!(transaction(Vec::new(), None).total(), 0);
    }

    #[test]
    fn discount_larger_than_subtotal_goes_negative() {
        assert_eq!(transaction(vec![item(10, 1)], Some(25)).total(), -15);
    }

    #[test]
    fn customer_total_spent_sums_subtotals() {
        let customer = Customer {
            id: "c1".to_string(),
            name: "An".to_string(),
            phone: "0901".to_string(),
            address: None,
            updated_at: None,
            transactions: vec![
                transaction(vec![item(100, 2)], Some(50)),
                transaction(vec![item(30, 1)], None),
            ],
        };
        assert_eq!(customer.total_spent(), 230);
    }

    #[test]
    fn transaction_deserializes_wire_format() {
        let json = r#"{
            "_id": "665f",
            "customerId": "c9",
            "customerName": "Binh",
            "services": [{"name": "Wash", "price": 40000, "quantity": 2}],
            "discount": 5000,
            "date": "2024-06-01T10:00:00Z",
            "status": "done"
        }"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.id, "665f");
        assert_eq!(tx.customer_name.as_deref(), Some("Binh"));
        assert_eq!(tx.total(), 75000);
    }

    #[test]
    fn customer_list_item_has_no_transactions() {
        let json = r#"{"_id":"c1","name":"An","phone":"0901"}"#;
        let customer: Customer = serde_json::from_str(json).unwrap();
        assert!(customer.transactions.is_empty());
        assert_eq!(customer.total_spent(), 0);
    }

    #[test]
    fn create_transaction_uses_camel_case() {
        let input = CreateTransaction {
            customer_id: "c1".to_string(),
            services: vec![item(100, 1)],
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["customerId"], "c1");
        assert_eq!(json["services"][0]["quantity"], 1);
    }

    #[test]
    fn credential_debug_hides_token() {
        let credential = Credential {
            token: "abc".to_string(),
            subject: Some("+15551234567".to_string()),
        };
        let shown = format!("{credential:?}");
        assert!(!shown.contains("abc"));
        assert!(shown.contains("+15551234567"));
    }

    #[test]
    fn format_amount_groups_thousands() {
        assert_eq!(format_amount(0), "0 đ");
        assert_eq!(format_amount(950), "950 đ");
        assert_eq!(format_amount(1000), "1,000 đ");
        assert_eq!(format_amount(1234000), "1,234,000 đ");
        assert_eq!(format_amount(-15000), "-15,000 đ");
    }
}
