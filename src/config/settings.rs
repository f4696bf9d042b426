//! Application settings loaded from config.toml
//!
//! Every section is optional. A missing file, or a file that leaves a section out,
//! falls back to the defaults below, which reproduce the behaviour of the demo
//! backend: roughly one second of latency and a noticeable failure rate on every call.

use crate::errors::{Error, Result};
use crate::models::{Category, Product};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "ORDER_DESK_CONFIG";

/// Root of config.toml
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Simulated transport tuning
    #[serde(default)]
    pub backend: BackendConfig,
    /// Query cache staleness windows
    #[serde(default)]
    pub cache: CacheConfig,
    /// Catalog served by the simulated backend
    #[serde(default = "default_catalog")]
    pub categories: Vec<CategoryConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            cache: CacheConfig::default(),
            categories: default_catalog(),
        }
    }
}

impl AppConfig {
    /// Category list as served by `fetch_categories`.
    #[must_use]
    pub fn category_list(&self) -> Vec<Category> {
        self.categories
            .iter()
            .map(|c| Category {
                id: c.id,
                name: c.name.clone(),
            })
            .collect()
    }

    /// Products of one category, empty for unknown ids.
    #[must_use]
    pub fn products_for(&self, category_id: i64) -> Vec<Product> {
        self.categories
            .iter()
            .find(|c| c.id == category_id)
            .map(|c| c.products.iter().map(ProductConfig::to_product).collect())
            .unwrap_or_default()
    }
}

/// Latency and failure injection for one backend operation
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct OperationConfig {
    /// Delay before the call settles
    pub latency_ms: u64,
    /// Probability in `[0, 1]` that the call fails
    pub failure_rate: f64,
}

impl OperationConfig {
    const fn new(latency_ms: u64, failure_rate: f64) -> Self {
        Self {
            latency_ms,
            failure_rate,
        }
    }

    /// An operation that settles immediately and never fails.
    #[must_use]
    pub const fn instant() -> Self {
        Self::new(0, 0.0)
    }

    /// Latency as a [`Duration`]
    #[must_use]
    pub const fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

/// Per-operation tuning of the simulated backend
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    /// `fetch_categories`
    pub categories: OperationConfig,
    /// `fetch_products`
    pub products: OperationConfig,
    /// `submit_order`
    pub submit: OperationConfig,
    /// `get_order`
    pub get_order: OperationConfig,
    /// `update_order`
    pub update_order: OperationConfig,
    /// `list_orders`
    pub list_orders: OperationConfig,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            categories: OperationConfig::new(1000, 0.2),
            products: OperationConfig::new(800, 0.1),
            submit: OperationConfig::new(2000, 0.3),
            get_order: OperationConfig::new(1000, 0.1),
            update_order: OperationConfig::new(2000, 0.3),
            list_orders: OperationConfig::new(1000, 0.0),
        }
    }
}

impl BackendConfig {
    /// Zero latency, zero failures on every operation. Used by tests and dry runs.
    #[must_use]
    pub const fn reliable() -> Self {
        Self {
            categories: OperationConfig::instant(),
            products: OperationConfig::instant(),
            submit: OperationConfig::instant(),
            get_order: OperationConfig::instant(),
            update_order: OperationConfig::instant(),
            list_orders: OperationConfig::instant(),
        }
    }
}

/// How long each kind of cached result stays fresh
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    /// Category list
    pub categories_stale_secs: u64,
    /// Product lists, per category
    pub products_stale_secs: u64,
    /// Order list
    pub orders_stale_secs: u64,
    /// Single order in edit mode. Zero means always refetch.
    pub order_stale_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            categories_stale_secs: 5 * 60,
            products_stale_secs: 2 * 60,
            orders_stale_secs: 2 * 60,
            order_stale_secs: 0,
        }
    }
}

impl CacheConfig {
    /// Category list staleness window
    #[must_use]
    pub const fn categories(&self) -> Duration {
        Duration::from_secs(self.categories_stale_secs)
    }

    /// Product list staleness window
    #[must_use]
    pub const fn products(&self) -> Duration {
        Duration::from_secs(self.products_stale_secs)
    }

    /// Order list staleness window
    #[must_use]
    pub const fn orders(&self) -> Duration {
        Duration::from_secs(self.orders_stale_secs)
    }

    /// Single order staleness window
    #[must_use]
    pub const fn order(&self) -> Duration {
        Duration::from_secs(self.order_stale_secs)
    }
}

/// One catalog category
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryConfig {
    /// Category id
    pub id: i64,
    /// Category name
    pub name: String,
    /// Products in this category
    #[serde(default)]
    pub products: Vec<ProductConfig>,
}

/// One catalog product
#[derive(Debug, Clone, Deserialize)]
pub struct ProductConfig {
    /// Product id
    pub id: i64,
    /// Product name
    pub name: String,
    /// Unit price
    pub price: i64,
}

impl ProductConfig {
    fn to_product(&self) -> Product {
        Product {
            id: self.id,
            name: self.name.clone(),
            price: self.price,
        }
    }
}

fn category(id: i64, name: &str, products: &[(i64, &str, i64)]) -> CategoryConfig {
    CategoryConfig {
        id,
        name: name.to_string(),
        products: products
            .iter()
            .map(|&(id, name, price)| ProductConfig {
                id,
                name: name.to_string(),
                price,
            })
            .collect(),
    }
}

fn default_catalog() -> Vec<CategoryConfig> {
    vec![
        category(
            1,
            "Electronics",
            &[
                (101, "Smartphone", 29999),
                (102, "Laptop", 59999),
                (103, "Headphones", 4999),
            ],
        ),
        category(
            2,
            "Clothes",
            &[(201, "T-shirt", 1999), (202, "Jeans", 3999), (203, "Coat", 7999)],
        ),
        category(
            3,
            "Books",
            &[
                (301, "Fiction", 599),
                (302, "Science book", 1299),
                (303, "Children's book", 399),
            ],
        ),
        category(
            4,
            "Sport",
            &[
                (401, "Football ball", 2999),
                (402, "Dumbbells", 1999),
                (403, "Yoga mat", 1499),
            ],
        ),
    ]
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read, the TOML syntax is invalid, or a
/// failure rate lies outside `[0, 1]`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;
    parse_config(&contents)
}

fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &AppConfig) -> Result<()> {
    let b = &config.backend;
    let operations = [
        ("categories", b.categories),
        ("products", b.products),
        ("submit", b.submit),
        ("get_order", b.get_order),
        ("update_order", b.update_order),
        ("list_orders", b.list_orders),
    ];
    for (name, op) in operations {
        if !(0.0..=1.0).contains(&op.failure_rate) {
            return Err(Error::Config {
                message: format!(
                    "backend.{name}.failure_rate must be within [0, 1], got {}",
                    op.failure_rate
                ),
            });
        }
    }
    Ok(())
}

/// Loads the application configuration.
///
/// Reads the file named by `ORDER_DESK_CONFIG` (default `config.toml`). A missing
/// file is not an error: the built-in defaults are used instead.
///
/// # Errors
/// Returns an error if the file exists but cannot be parsed.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config.toml".to_string());
    if Path::new(&path).exists() {
        let config = load_config(&path)?;
        info!(
            "Loaded configuration from {} ({} categories)",
            path,
            config.categories.len()
        );
        Ok(config)
    } else {
        info!("No configuration file at {}, using defaults", path);
        Ok(AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_defaults_match_demo_backend() {
        let config = AppConfig::default();
        assert_eq!(config.categories.len(), 4);
        assert_eq!(config.backend.categories.latency_ms, 1000);
        assert_eq!(config.backend.submit.failure_rate, 0.3);
        assert_eq!(config.cache.order(), Duration::ZERO);
        assert_eq!(config.cache.categories(), Duration::from_secs(300));
    }

    #[test]
    fn test_parse_partial_config_keeps_defaults() {
        let toml_str = r#"
            [backend.submit]
            latency_ms = 10
            failure_rate = 0.0

            [cache]
            products_stale_secs = 30
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.backend.submit, OperationConfig::new(10, 0.0));
        assert_eq!(config.backend.products, OperationConfig::new(800, 0.1));
        assert_eq!(config.cache.products_stale_secs, 30);
        assert_eq!(config.cache.categories_stale_secs, 300);
        assert_eq!(config.categories.len(), 4);
    }

    #[test]
    fn test_parse_custom_catalog() {
        let toml_str = r#"
            [[categories]]
            id = 9
            name = "Garden"

            [[categories.products]]
            id = 901
            name = "Rake"
            price = 750
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(
            config.category_list(),
            vec![Category {
                id: 9,
                name: "Garden".to_string()
            }]
        );
        assert_eq!(config.products_for(9)[0].name, "Rake");
        assert!(config.products_for(1).is_empty());
    }

    #[test]
    fn test_rejects_out_of_range_failure_rate() {
        let toml_str = r"
            [backend.products]
            latency_ms = 0
            failure_rate = 1.5
        ";

        let result = parse_config(toml_str);
        assert!(matches!(result, Err(Error::Config { message: _ })));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = load_config("definitely/not/here.toml");
        assert!(matches!(result, Err(Error::Config { message: _ })));
    }
}
