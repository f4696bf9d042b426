//! Order creation and update.

use crate::{
    api::OrderApi,
    core::form::OrderForm,
    errors::SharedError,
    models::{Category, Order, OrderData, Product},
};
use std::sync::Arc;
use tracing::{error, info};

/// Derives the wire payload from the form's ids and the loaded reference data.
///
/// Names and price come from the selected category and product; anything that cannot
/// be resolved becomes an empty name or a zero price. `total` is frozen here and
/// saturates at `i64::MAX` for out-of-range quantities.
#[must_use]
pub fn build_payload(
    form: &OrderForm,
    products: Option<&[Product]>,
    categories: Option<&[Category]>,
) -> OrderData {
    let product = products
        .and_then(|list| list.iter().find(|p| Some(p.id) == form.product_id()));
    let category = categories
        .and_then(|list| list.iter().find(|c| Some(c.id) == form.category_id()));

    OrderData {
        category: category.map(|c| c.name.clone()).unwrap_or_default(),
        product: product.map(|p| p.name.clone()).unwrap_or_default(),
        price: product.map_or(0, |p| p.price),
        quantity: form.quantity(),
        total: product.map_or(0, |p| p.price.saturating_mul(form.quantity())),
        comment: form.comment().to_string(),
    }
}

/// State of the last create/update call
#[derive(Debug, Default)]
pub struct OrderMutation {
    pending: bool,
    error: Option<SharedError>,
    last_result: Option<Order>,
}

impl OrderMutation {
    /// A call is in flight
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending
    }

    /// Error of the last call, if it failed
    #[must_use]
    pub const fn error(&self) -> Option<&SharedError> {
        self.error.as_ref()
    }

    /// Order returned by the last successful call
    #[must_use]
    pub const fn last_result(&self) -> Option<&Order> {
        self.last_result.as_ref()
    }

    /// Forgets the outcome of the last call.
    pub fn reset(&mut self) {
        self.error = None;
        self.last_result = None;
    }

    /// Builds the payload and creates an order, or updates `existing_order_id` if given.
    ///
    /// # Errors
    /// Returns the transport error; it is also kept in [`OrderMutation::error`].
    pub async fn submit<A: OrderApi>(
        &mut self,
        api: &A,
        form: &OrderForm,
        products: Option<&[Product]>,
        categories: Option<&[Category]>,
        existing_order_id: Option<i64>,
    ) -> Result<Order, SharedError> {
        let payload = build_payload(form, products, categories);
        self.pending = true;
        self.error = None;

        let result = match existing_order_id {
            Some(id) => api.update_order(id, payload).await,
            None => api.submit_order(payload).await,
        };
        self.pending = false;

        match result {
            Ok(order) => {
                info!(order_id = order.id, total = order.total, "Order saved");
                self.last_result = Some(order.clone());
                Ok(order)
            }
            Err(e) => {
                error!("Saving order failed: {}", e);
                let shared = Arc::new(e);
                self.error = Some(Arc::clone(&shared));
                Err(shared)
            }
        }
    }
}
