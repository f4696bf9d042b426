//! Order store connection and table creation.
//!
//! The simulated backend keeps orders in `SQLite` through `SeaORM`. The default URL
//! points at an in-memory database, so nothing outlives the process.

use crate::entities::OrderEntity;
use crate::errors::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};

/// Default order store URL
pub const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";

/// Gets the order store URL from `DATABASE_URL`, falling back to an in-memory database.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Opens the order store.
///
/// The pool is capped at one connection: every connection to `sqlite::memory:` opens
/// its own private database.
pub async fn create_connection(url: &str) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(url.to_owned());
    options.max_connections(1).sqlx_logging(false);
    Database::connect(options).await.map_err(Into::into)
}

/// Creates the orders table from the entity definition.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let order_table = schema.create_table_from_entity(OrderEntity);
    db.execute(builder.build(&order_table)).await?;

    Ok(())
}
