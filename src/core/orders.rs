//! Order list view model.

use crate::{
    api::OrderApi,
    config::CacheConfig,
    core::{
        fetcher::Fetcher,
        query::{Query, RequestId, Settled},
    },
    errors::{Result, SharedError},
    models::Order,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::debug;

/// One row of the orders table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRow {
    /// Order id, used to open it for editing
    pub id: i64,
    /// `"<category> / <product>"`
    pub item: String,
    /// Number of units
    pub quantity: i64,
    /// Total at submission time
    pub total: i64,
    /// Free-form comment
    pub comment: String,
    /// Creation time, `YYYY-MM-DD HH:MM`
    pub created_at: String,
}

impl From<&Order> for OrderRow {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            item: format!("{} / {}", order.category, order.product),
            quantity: order.quantity,
            total: order.total,
            comment: order.comment.clone(),
            created_at: order.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Previously submitted orders, newest first
pub struct OrderListViewModel<A: OrderApi> {
    api: Arc<A>,
    orders: Query<(), Vec<Order>>,
    fetcher: Fetcher<Result<Vec<Order>>>,
}

impl<A: OrderApi> OrderListViewModel<A> {
    /// Opens the list and starts loading it. Must be called inside a Tokio runtime.
    pub fn new(api: Arc<A>, cache_config: &CacheConfig) -> Self {
        let mut orders = Query::new("orders", cache_config.orders());
        orders.set_key(Some(()));
        let mut vm = Self {
            api,
            orders,
            fetcher: Fetcher::new(),
        };
        vm.refetch();
        vm
    }

    /// Loaded orders
    #[must_use]
    pub fn orders_data(&self) -> Option<&[Order]> {
        self.orders.data().map(Vec::as_slice)
    }

    /// First load in progress
    #[must_use]
    pub fn orders_loading(&self) -> bool {
        self.orders.is_loading()
    }

    /// Last load failed
    #[must_use]
    pub fn orders_has_error(&self) -> bool {
        self.orders.has_error()
    }

    /// Error of the last load
    #[must_use]
    pub fn orders_error(&self) -> Option<&SharedError> {
        self.orders.error()
    }

    /// Table rows for the loaded orders
    #[must_use]
    pub fn rows(&self) -> Vec<OrderRow> {
        self.orders_data()
            .map(|list| list.iter().map(OrderRow::from).collect())
            .unwrap_or_default()
    }

    /// Forces a reload.
    pub fn refetch(&mut self) -> RequestId {
        let api = Arc::clone(&self.api);
        let request = self.fetcher.spawn(async move { api.list_orders().await });
        self.orders.begin(request);
        debug!(?request, "Fetching orders");
        request
    }

    /// Reloads if the list is older than its staleness window.
    pub fn on_focus(&mut self) {
        if self.orders.needs_fetch(Instant::now()) {
            self.refetch();
        }
    }

    /// Waits for the next load to complete and applies it.
    pub async fn next_event(&mut self) -> Option<Settled> {
        let (request, outcome) = self.fetcher.next().await?;
        Some(match outcome {
            Ok(result) => self.orders.settle(&(), request, result, Instant::now()),
            Err(e) => self.orders.abandon(request, &e.to_string()),
        })
    }

    /// Applies results until nothing is in flight.
    pub async fn settle(&mut self) {
        while self.next_event().await.is_some() {}
    }
}
