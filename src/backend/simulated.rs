//! Simulated transport.
//!
//! Each call sleeps for the configured latency, then fails with the configured
//! probability before touching the catalog or the order store.

use crate::{
    api::OrderApi,
    backend::store,
    config::{AppConfig, OperationConfig, database},
    errors::{Error, Result},
    models::{Category, Order, OrderData, Product},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{debug, warn};

/// In-process stand-in for the order server
#[derive(Clone)]
pub struct SimulatedBackend {
    config: Arc<AppConfig>,
    db: DatabaseConnection,
}

impl SimulatedBackend {
    /// Wraps an existing order store connection. Tables must already exist.
    #[must_use]
    pub const fn new(config: Arc<AppConfig>, db: DatabaseConnection) -> Self {
        Self { config, db }
    }

    /// Opens the order store at `url`, creates its tables, and builds the backend.
    pub async fn connect(config: Arc<AppConfig>, url: &str) -> Result<Self> {
        let db = database::create_connection(url).await?;
        database::create_tables(&db).await?;
        Ok(Self::new(config, db))
    }

    /// Order store connection
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Waits out the latency, then rolls for an injected failure.
    async fn simulate(op: OperationConfig, operation: &'static str, failure: &str) -> bool {
        if !op.latency().is_zero() {
            tokio::time::sleep(op.latency()).await;
        }
        let failed = op.failure_rate > 0.0 && rand::random::<f64>() < op.failure_rate;
        if failed {
            warn!(operation, "Injected failure: {}", failure);
        } else {
            debug!(operation, "Simulated call settled");
        }
        !failed
    }
}

impl OrderApi for SimulatedBackend {
    async fn fetch_categories(&self) -> Result<Vec<Category>> {
        let message = "Categories loading error";
        if !Self::simulate(self.config.backend.categories, "fetch_categories", message).await {
            return Err(Error::fetch("categories", message));
        }
        Ok(self.config.category_list())
    }

    async fn fetch_products(&self, category_id: i64) -> Result<Vec<Product>> {
        let message = "Products loading error";
        if !Self::simulate(self.config.backend.products, "fetch_products", message).await {
            return Err(Error::fetch("products", message));
        }
        Ok(self.config.products_for(category_id))
    }

    async fn submit_order(&self, payload: OrderData) -> Result<Order> {
        let message = "Processing order server error";
        if !Self::simulate(self.config.backend.submit, "submit_order", message).await {
            return Err(Error::Submit {
                message: message.to_string(),
            });
        }
        store::create_order(&self.db, payload).await.map(Order::from)
    }

    async fn get_order(&self, id: i64) -> Result<Order> {
        let message = "Order loading error";
        if !Self::simulate(self.config.backend.get_order, "get_order", message).await {
            return Err(Error::fetch("order", message));
        }
        store::get_order_by_id(&self.db, id)
            .await?
            .map(Order::from)
            .ok_or(Error::OrderNotFound { id })
    }

    async fn update_order(&self, id: i64, payload: OrderData) -> Result<Order> {
        let message = "Updating order server error";
        if !Self::simulate(self.config.backend.update_order, "update_order", message).await {
            return Err(Error::Submit {
                message: message.to_string(),
            });
        }
        store::update_order(&self.db, id, payload)
            .await
            .map(Order::from)
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let message = "Orders loading error";
        if !Self::simulate(self.config.backend.list_orders, "list_orders", message).await {
            return Err(Error::fetch("orders", message));
        }
        let orders = store::list_orders(&self.db).await?;
        Ok(orders.into_iter().map(Order::from).collect())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::config::BackendConfig;
    use crate::test_utils::{reliable_backend, sample_payload};
    use std::time::Duration;

    #[tokio::test]
    async fn test_catalog_is_served_from_config() -> Result<()> {
        let backend = reliable_backend().await?;

        let categories = backend.fetch_categories().await?;
        assert_eq!(categories.len(), 4);
        assert_eq!(categories[0].name, "Electronics");

        let products = backend.fetch_products(2).await?;
        let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["T-shirt", "Jeans", "Coat"]);

        assert!(backend.fetch_products(99).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_submit_get_update_list() -> Result<()> {
        let backend = reliable_backend().await?;

        let created = backend.submit_order(sample_payload()).await?;
        let fetched = backend.get_order(created.id).await?;
        assert_eq!(fetched, created);

        let mut payload = sample_payload();
        payload.comment = "call first".to_string();
        let updated = backend.update_order(created.id, payload).await?;
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.comment, "call first");

        let listed = backend.list_orders().await?;
        assert_eq!(listed, vec![updated]);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_unknown_order() -> Result<()> {
        let backend = reliable_backend().await?;
        let result = backend.get_order(7).await;
        assert!(matches!(result.unwrap_err(), Error::OrderNotFound { id: 7 }));
        Ok(())
    }

    #[tokio::test]
    async fn test_certain_failure_is_reported_per_operation() -> Result<()> {
        let mut config = AppConfig::default();
        config.backend = BackendConfig::reliable();
        config.backend.categories.failure_rate = 1.0;
        config.backend.submit.failure_rate = 1.0;
        let backend = SimulatedBackend::connect(Arc::new(config), "sqlite::memory:").await?;

        let err = backend.fetch_categories().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Fetch {
                resource: "categories",
                ..
            }
        ));

        let err = backend.submit_order(sample_payload()).await.unwrap_err();
        assert!(matches!(err, Error::Submit { .. }));
        assert!(backend.list_orders().await?.is_empty());

        // unaffected operations keep working
        assert_eq!(backend.fetch_products(1).await?.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_latency_is_applied() -> Result<()> {
        let mut config = AppConfig::default();
        config.backend = BackendConfig::reliable();
        config.backend.products.latency_ms = 40;
        let backend = SimulatedBackend::connect(Arc::new(config), "sqlite::memory:").await?;

        let started = tokio::time::Instant::now();
        backend.fetch_products(1).await?;
        assert!(started.elapsed() >= Duration::from_millis(40));
        Ok(())
    }
}
