#![allow(clippy::result_large_err)]

use dotenvy::dotenv;
use order_desk::{
    api::OrderApi,
    backend::SimulatedBackend,
    config::{self, CacheConfig, database},
    core::{OrderFormViewModel, OrderListViewModel},
    errors::{Error, Result},
    models::Order,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// How often a failed fetch or submit is retried before the session gives up
const MAX_ATTEMPTS: usize = 5;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal
    dotenv().ok();

    // 3. Load the application configuration
    let app_config = Arc::new(config::load_app_configuration()?);
    let cache = app_config.cache;

    // 4. Open the order store behind the simulated backend
    let backend = SimulatedBackend::connect(Arc::clone(&app_config), &database::get_database_url())
        .await
        .inspect(|_| info!("Order store initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize order store: {}", e))?;
    let backend = Arc::new(backend);

    // 5. Scripted session: create, list, edit, list again
    let created = create_session(&backend, &cache).await?;
    list_session(&backend, &cache).await?;
    edit_session(&backend, &cache, created.id).await?;
    list_session(&backend, &cache).await?;

    info!("Session finished.");
    Ok(())
}

async fn create_session<A: OrderApi>(api: &Arc<A>, cache: &CacheConfig) -> Result<Order> {
    info!("Creating a new order");
    let mut vm = OrderFormViewModel::create(Arc::clone(api), cache);
    settle_with_retries(&mut vm).await?;

    let category_id = vm
        .categories_data()
        .and_then(|list| list.first())
        .map(|c| c.id)
        .ok_or_else(|| Error::Config {
            message: "Catalog has no categories".to_string(),
        })?;
    vm.select_category(Some(category_id));
    settle_with_retries(&mut vm).await?;

    let product_id = vm
        .products_data()
        .and_then(|list| list.first())
        .map(|p| p.id)
        .ok_or_else(|| Error::Config {
            message: format!("Category {category_id} has no products"),
        })?;
    vm.select_product(Some(product_id));
    vm.set_quantity(2);
    vm.set_comment("Deliver before noon");

    let order = submit_with_retries(&mut vm).await?;
    info!(order_id = order.id, total = order.total, "Order created");
    Ok(order)
}

async fn list_session<A: OrderApi>(api: &Arc<A>, cache: &CacheConfig) -> Result<()> {
    let mut list = OrderListViewModel::new(Arc::clone(api), cache);
    for attempt in 1..=MAX_ATTEMPTS {
        list.settle().await;
        if !list.orders_has_error() {
            for row in list.rows() {
                info!(
                    id = row.id,
                    item = %row.item,
                    quantity = row.quantity,
                    total = row.total,
                    created_at = %row.created_at,
                    "Order"
                );
            }
            return Ok(());
        }
        warn!(attempt, "Order list failed to load, retrying");
        list.refetch();
    }
    Err(Error::fetch(
        "orders",
        format!("gave up after {MAX_ATTEMPTS} attempts"),
    ))
}

async fn edit_session<A: OrderApi>(api: &Arc<A>, cache: &CacheConfig, order_id: i64) -> Result<()> {
    info!(order_id, "Editing order");
    let mut vm = OrderFormViewModel::edit(Arc::clone(api), cache, order_id);
    settle_with_retries(&mut vm).await?;

    if !vm.reconcile_state().is_some_and(|s| s.is_settled()) {
        warn!(state = ?vm.reconcile_state(), "Form did not fully reconcile");
    }

    vm.set_quantity(vm.form().quantity() + 1);
    let order = submit_with_retries(&mut vm).await?;
    info!(
        order_id = order.id,
        quantity = order.quantity,
        total = order.total,
        "Order updated"
    );
    Ok(())
}

/// Applies every outstanding fetch, refetching whatever failed.
async fn settle_with_retries<A: OrderApi>(vm: &mut OrderFormViewModel<A>) -> Result<()> {
    for attempt in 1..=MAX_ATTEMPTS {
        vm.settle().await;

        let mut retried = false;
        if vm.categories_has_error() {
            warn!(attempt, "Categories failed to load, retrying");
            retried |= vm.refetch_categories().is_some();
        }
        if vm.products_has_error() {
            warn!(attempt, "Products failed to load, retrying");
            retried |= vm.refetch_products().is_some();
        }
        if vm.order_has_error() {
            warn!(attempt, "Order failed to load, retrying");
            retried |= vm.refetch_order().is_some();
        }
        if !retried {
            return Ok(());
        }
    }
    Err(Error::fetch(
        "reference data",
        format!("gave up after {MAX_ATTEMPTS} attempts"),
    ))
}

async fn submit_with_retries<A: OrderApi>(vm: &mut OrderFormViewModel<A>) -> Result<Order> {
    for attempt in 1..=MAX_ATTEMPTS {
        match vm.submit().await {
            Ok(order) => return Ok(order),
            Err(e) => {
                warn!(attempt, "Submit failed: {}", e);
                vm.reset_mutation();
            }
        }
    }
    Err(Error::Submit {
        message: format!("gave up after {MAX_ATTEMPTS} attempts"),
    })
}
