//! Domain types shared by the transport boundary, the providers, and the form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A product category. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category id
    pub id: i64,
    /// Display name, also the value stored on orders
    pub name: String,
}

/// A product inside one category. Prices are whole roubles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product id
    pub id: i64,
    /// Display name, also the value stored on orders
    pub name: String,
    /// Unit price
    pub price: i64,
}

/// Payload sent to create or update an order.
///
/// Orders store human-readable category and product names, not ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderData {
    /// Category name
    pub category: String,
    /// Product name
    pub product: String,
    /// Unit price at submission time
    pub price: i64,
    /// Number of units
    pub quantity: i64,
    /// `price * quantity`, frozen at submission time
    pub total: i64,
    /// Free-form comment
    pub comment: String,
}

/// A stored order as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Server-assigned id
    pub id: i64,
    /// Category name
    pub category: String,
    /// Product name
    pub product: String,
    /// Unit price
    pub price: i64,
    /// Number of units
    pub quantity: i64,
    /// Total at submission time
    pub total: i64,
    /// Free-form comment
    pub comment: String,
    /// Creation timestamp, kept across updates
    pub created_at: DateTime<Utc>,
}

/// Label/value pair for a select input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    /// Text shown to the user
    pub label: String,
    /// Id submitted when selected
    pub value: i64,
}

impl From<&Category> for SelectOption {
    fn from(category: &Category) -> Self {
        Self {
            label: category.name.clone(),
            value: category.id,
        }
    }
}

impl From<&Product> for SelectOption {
    fn from(product: &Product) -> Self {
        Self {
            label: format!("{} - {} rub.", product.name, product.price),
            value: product.id,
        }
    }
}
