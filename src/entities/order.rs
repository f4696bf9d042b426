//! Order entity - A submitted order as kept by the simulated backend.
//!
//! Orders reference their category and product by name, not by id, exactly as the
//! client submitted them.

use crate::models::Order;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Category name at submission time
    pub category: String,
    /// Product name at submission time
    pub product: String,
    /// Unit price at submission time
    pub price: i64,
    /// Number of units
    pub quantity: i64,
    /// `price * quantity` as submitted
    pub total: i64,
    /// Free-form comment
    pub comment: String,
    /// When the order was created
    pub created_at: DateTimeUtc,
    /// When the order was last modified
    pub updated_at: DateTimeUtc,
}

/// Orders stand alone
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Order {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            category: model.category,
            product: model.product,
            price: model.price,
            quantity: model.quantity,
            total: model.total,
            comment: model.comment,
            created_at: model.created_at,
        }
    }
}
