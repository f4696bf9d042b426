//! Shared test utilities for the order desk.
//!
//! Sample data mirrors a small catalog (Electronics = 1, Books = 2) with round
//! prices so payload arithmetic is easy to check. [`ManualApi`] lets a test decide
//! exactly when, and in what order, each backend call completes.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use crate::{
    api::OrderApi,
    backend::SimulatedBackend,
    config::{AppConfig, BackendConfig, CategoryConfig, ProductConfig, database},
    errors::{Error, Result},
    models::{Category, Order, OrderData, Product},
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing_subscriber::EnvFilter;

/// Installs a test-friendly tracing subscriber once per process.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory order store with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = database::create_connection(database::DEFAULT_DATABASE_URL).await?;
    database::create_tables(&db).await?;
    Ok(db)
}

/// `[{1, Electronics}, {2, Books}]`
pub fn sample_categories() -> Vec<Category> {
    vec![
        Category {
            id: 1,
            name: "Electronics".to_string(),
        },
        Category {
            id: 2,
            name: "Books".to_string(),
        },
    ]
}

/// Electronics products: Smartphone (101, 30000) and Laptop (102, 60000)
pub fn sample_products() -> Vec<Product> {
    vec![
        Product {
            id: 101,
            name: "Smartphone".to_string(),
            price: 30000,
        },
        Product {
            id: 102,
            name: "Laptop".to_string(),
            price: 60000,
        },
    ]
}

/// Books products: Fiction (301, 600)
pub fn sample_book_products() -> Vec<Product> {
    vec![Product {
        id: 301,
        name: "Fiction".to_string(),
        price: 600,
    }]
}

/// Two smartphones, comment "fast"
pub fn sample_payload() -> OrderData {
    OrderData {
        category: "Electronics".to_string(),
        product: "Smartphone".to_string(),
        price: 30000,
        quantity: 2,
        total: 60000,
        comment: "fast".to_string(),
    }
}

/// Stored version of [`sample_payload`] with the given id
pub fn sample_order(id: i64) -> Order {
    let payload = sample_payload();
    Order {
        id,
        category: payload.category,
        product: payload.product,
        price: payload.price,
        quantity: payload.quantity,
        total: payload.total,
        comment: payload.comment,
        created_at: Utc::now(),
    }
}

/// Config whose catalog is the sample data and whose backend never waits or fails.
pub fn sample_config() -> AppConfig {
    let to_config = |c: &Category, products: Vec<Product>| CategoryConfig {
        id: c.id,
        name: c.name.clone(),
        products: products
            .into_iter()
            .map(|p| ProductConfig {
                id: p.id,
                name: p.name,
                price: p.price,
            })
            .collect(),
    };
    let categories = sample_categories();
    AppConfig {
        backend: BackendConfig::reliable(),
        categories: vec![
            to_config(&categories[0], sample_products()),
            to_config(&categories[1], sample_book_products()),
        ],
        ..AppConfig::default()
    }
}

/// Simulated backend over the sample catalog, no latency, no failures.
pub async fn reliable_backend() -> Result<SimulatedBackend> {
    reliable_backend_with(sample_config()).await
}

/// Simulated backend over an in-memory store with the given config.
pub async fn reliable_backend_with(config: AppConfig) -> Result<SimulatedBackend> {
    SimulatedBackend::connect(Arc::new(config), database::DEFAULT_DATABASE_URL).await
}

/// A backend call waiting for the test to answer it
pub enum Call {
    /// `fetch_categories`
    Categories(oneshot::Sender<Result<Vec<Category>>>),
    /// `fetch_products`
    Products(i64, oneshot::Sender<Result<Vec<Product>>>),
    /// `get_order`
    GetOrder(i64, oneshot::Sender<Result<Order>>),
    /// `submit_order`
    Submit(OrderData, oneshot::Sender<Result<Order>>),
    /// `update_order`
    Update(i64, OrderData, oneshot::Sender<Result<Order>>),
    /// `list_orders`
    List(oneshot::Sender<Result<Vec<Order>>>),
}

/// [`OrderApi`] whose calls complete only when the test answers them
pub struct ManualApi {
    calls: mpsc::UnboundedSender<Call>,
}

/// Test side of a [`ManualApi`]
pub struct PendingCalls {
    rx: mpsc::UnboundedReceiver<Call>,
    stash: Vec<Call>,
}

impl ManualApi {
    /// Creates the api and the handle used to answer its calls.
    pub fn new() -> (Arc<Self>, PendingCalls) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self { calls: tx }),
            PendingCalls {
                rx,
                stash: Vec::new(),
            },
        )
    }

    async fn call<T>(&self, make: impl FnOnce(oneshot::Sender<Result<T>>) -> Call) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.calls
            .send(make(tx))
            .map_err(|_| Error::fetch("manual", "test dropped its handle"))?;
        // a test dropping the sender stands in for a fetch task that dies
        rx.await
            .unwrap_or_else(|_| panic!("call was dropped unanswered"))
    }
}

impl OrderApi for ManualApi {
    async fn fetch_categories(&self) -> Result<Vec<Category>> {
        self.call(Call::Categories).await
    }

    async fn fetch_products(&self, category_id: i64) -> Result<Vec<Product>> {
        self.call(|tx| Call::Products(category_id, tx)).await
    }

    async fn submit_order(&self, payload: OrderData) -> Result<Order> {
        self.call(|tx| Call::Submit(payload, tx)).await
    }

    async fn get_order(&self, id: i64) -> Result<Order> {
        self.call(|tx| Call::GetOrder(id, tx)).await
    }

    async fn update_order(&self, id: i64, payload: OrderData) -> Result<Order> {
        self.call(|tx| Call::Update(id, payload, tx)).await
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        self.call(Call::List).await
    }
}

impl PendingCalls {
    async fn take(&mut self, what: &str, mut matches: impl FnMut(&Call) -> bool) -> Call {
        if let Some(pos) = self.stash.iter().position(&mut matches) {
            return self.stash.remove(pos);
        }
        loop {
            let call = tokio::time::timeout(Duration::from_secs(5), self.rx.recv())
                .await
                .unwrap_or_else(|_| panic!("timed out waiting for {what} call"))
                .unwrap_or_else(|| panic!("api dropped while waiting for {what} call"));
            if matches(&call) {
                return call;
            }
            self.stash.push(call);
        }
    }

    /// Next `fetch_categories` call
    pub async fn categories(&mut self) -> oneshot::Sender<Result<Vec<Category>>> {
        match self.take("categories", |c| matches!(c, Call::Categories(_))).await {
            Call::Categories(tx) => tx,
            _ => unreachable!(),
        }
    }

    /// Next `fetch_products` call for `category_id`
    pub async fn products(&mut self, category_id: i64) -> oneshot::Sender<Result<Vec<Product>>> {
        match self
            .take("products", |c| matches!(c, Call::Products(id, _) if *id == category_id))
            .await
        {
            Call::Products(_, tx) => tx,
            _ => unreachable!(),
        }
    }

    /// Next `get_order` call for `order_id`
    pub async fn order(&mut self, order_id: i64) -> oneshot::Sender<Result<Order>> {
        match self
            .take("order", |c| matches!(c, Call::GetOrder(id, _) if *id == order_id))
            .await
        {
            Call::GetOrder(_, tx) => tx,
            _ => unreachable!(),
        }
    }

    /// Calls received but not yet taken
    pub fn drain_unanswered(&mut self) -> usize {
        while let Ok(call) = self.rx.try_recv() {
            self.stash.push(call);
        }
        self.stash.len()
    }
}
