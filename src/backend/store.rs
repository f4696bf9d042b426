//! Order store - create, read, update and list orders.
//!
//! All functions are async and return `Result` types. Payload validation happens
//! here so every path into the store applies the same rules.

use crate::{
    core::form::QUANTITY_RANGE,
    entities::{OrderEntity, order},
    errors::{Error, Result},
    models::OrderData,
};
use sea_orm::{QueryOrder, Set, prelude::*};

fn validate(payload: &OrderData) -> Result<()> {
    if payload.category.trim().is_empty() || payload.product.trim().is_empty() {
        return Err(Error::IncompleteForm);
    }
    if !QUANTITY_RANGE.contains(&payload.quantity) {
        return Err(Error::InvalidQuantity {
            quantity: payload.quantity,
        });
    }
    Ok(())
}

/// Inserts a new order and returns it with its assigned id.
///
/// # Errors
/// Returns an error if:
/// - The category or product name is empty
/// - The quantity is outside 1..=10
/// - The database insert fails
pub async fn create_order(db: &DatabaseConnection, payload: OrderData) -> Result<order::Model> {
    validate(&payload)?;

    let now = chrono::Utc::now();
    let order = order::ActiveModel {
        category: Set(payload.category),
        product: Set(payload.product),
        price: Set(payload.price),
        quantity: Set(payload.quantity),
        total: Set(payload.total),
        comment: Set(payload.comment),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    order.insert(db).await.map_err(Into::into)
}

/// Retrieves a specific order by its id.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_order_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<order::Model>> {
    OrderEntity::find_by_id(id).one(db).await.map_err(Into::into)
}

/// Replaces an order's contents. `id` and `created_at` are preserved.
///
/// # Errors
/// Returns an error if:
/// - The payload fails validation
/// - The order does not exist
/// - The database update fails
pub async fn update_order(
    db: &DatabaseConnection,
    id: i64,
    payload: OrderData,
) -> Result<order::Model> {
    validate(&payload)?;

    let mut order: order::ActiveModel = OrderEntity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(Error::OrderNotFound { id })?
        .into();

    order.category = Set(payload.category);
    order.product = Set(payload.product);
    order.price = Set(payload.price);
    order.quantity = Set(payload.quantity);
    order.total = Set(payload.total);
    order.comment = Set(payload.comment);
    order.updated_at = Set(chrono::Utc::now());

    order.update(db).await.map_err(Into::into)
}

/// Lists all orders, newest first. Ties on `created_at` fall back to id, newest first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_orders(db: &DatabaseConnection) -> Result<Vec<order::Model>> {
    OrderEntity::find()
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
