//! Transport boundary consumed by the core.
//!
//! The core never talks to a concrete backend. Providers and the mutation are generic
//! over [`OrderApi`], so the simulated backend, a real HTTP client, or a test double
//! can stand behind them.

use crate::errors::Result;
use crate::models::{Category, Order, OrderData, Product};
use std::future::Future;

/// Calls offered by the order backend.
///
/// Futures must be `Send` because fetches are spawned onto the runtime and their
/// results delivered back to the owning view model as messages.
pub trait OrderApi: Send + Sync + 'static {
    /// Lists every category.
    fn fetch_categories(&self) -> impl Future<Output = Result<Vec<Category>>> + Send;

    /// Lists the products of one category. Unknown ids yield an empty list.
    fn fetch_products(&self, category_id: i64)
    -> impl Future<Output = Result<Vec<Product>>> + Send;

    /// Creates an order.
    fn submit_order(&self, payload: OrderData) -> impl Future<Output = Result<Order>> + Send;

    /// Loads one order.
    fn get_order(&self, id: i64) -> impl Future<Output = Result<Order>> + Send;

    /// Replaces the contents of an existing order, keeping its id and creation time.
    fn update_order(
        &self,
        id: i64,
        payload: OrderData,
    ) -> impl Future<Output = Result<Order>> + Send;

    /// Lists every order, newest first.
    fn list_orders(&self) -> impl Future<Output = Result<Vec<Order>>> + Send;
}
