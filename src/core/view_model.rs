//! Order form view model.
//!
//! Owns the form and the three providers it depends on (categories, products for the
//! selected category, and in edit mode the order being edited). Fetches run as
//! spawned tasks; their results are applied one at a time through
//! [`OrderFormViewModel::next_event`], in whatever order they complete. After every
//! applied result the edit-mode reconciliation runs again on a fresh snapshot.
//!
//! Must be created inside a Tokio runtime. Dropping the view model aborts its
//! in-flight fetches.

use crate::{
    api::OrderApi,
    config::CacheConfig,
    core::{
        cache::CacheAccounting,
        fetcher::Fetcher,
        form::OrderForm,
        mutation::OrderMutation,
        query::{Query, RequestId, Settled},
        reconcile::{ProductsSnapshot, ReconcileFlags, ReconcileState, Reconciled, Snapshot, reconcile},
    },
    errors::{Result, SharedError},
    models::{Category, Order, Product, SelectOption},
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Upper bound on reconciliation passes per trigger; each pass can move the product
/// key at most once, so two are enough and the rest is slack.
const MAX_RECONCILE_PASSES: usize = 4;

/// How the form was opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    /// Blank form, submit creates a new order
    Create,
    /// Form reconciled from an existing order, submit updates it
    Edit(i64),
}

enum Response {
    Categories(Result<Vec<Category>>),
    Products(i64, Result<Vec<Product>>),
    Order(i64, Result<Order>),
}

type SuccessCallback = Box<dyn FnMut(&Order) + Send>;

/// Form state, reference data and edit-mode reconciliation for one open form
pub struct OrderFormViewModel<A: OrderApi> {
    api: Arc<A>,
    editing: bool,
    form: OrderForm,
    categories: Query<(), Vec<Category>>,
    products: Query<i64, Vec<Product>>,
    order: Query<i64, Order>,
    reconcile: ReconcileFlags,
    mutation: OrderMutation,
    cache: CacheAccounting,
    on_success: Option<SuccessCallback>,
    fetcher: Fetcher<Response>,
}

impl<A: OrderApi> OrderFormViewModel<A> {
    /// Opens a form and starts loading what it needs.
    pub fn new(api: Arc<A>, cache_config: &CacheConfig, mode: FormMode) -> Self {
        let mut categories = Query::new("categories", cache_config.categories());
        categories.set_key(Some(()));

        let mut order = Query::new("order", cache_config.order());
        if let FormMode::Edit(id) = mode {
            order.set_key(Some(id));
        }

        let mut vm = Self {
            api,
            editing: matches!(mode, FormMode::Edit(_)),
            form: OrderForm::default(),
            categories,
            products: Query::new("products", cache_config.products()),
            order,
            reconcile: ReconcileFlags::default(),
            mutation: OrderMutation::default(),
            cache: CacheAccounting::default(),
            on_success: None,
            fetcher: Fetcher::new(),
        };
        info!(?mode, "Opening order form");
        vm.update_cached_products_count();
        vm.ensure_fresh();
        vm.run_reconciliation();
        vm
    }

    /// Blank form for a new order
    pub fn create(api: Arc<A>, cache_config: &CacheConfig) -> Self {
        Self::new(api, cache_config, FormMode::Create)
    }

    /// Form editing order `order_id`
    pub fn edit(api: Arc<A>, cache_config: &CacheConfig, order_id: i64) -> Self {
        Self::new(api, cache_config, FormMode::Edit(order_id))
    }

    /// Runs `callback` after every successful submit, e.g. to navigate away.
    #[must_use]
    pub fn with_on_success(mut self, callback: impl FnMut(&Order) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }

    // --- form ---

    /// Current form
    #[must_use]
    pub const fn form(&self) -> &OrderForm {
        &self.form
    }

    /// `true` in edit mode
    #[must_use]
    pub const fn is_editing(&self) -> bool {
        self.editing
    }

    /// Whether the form can be submitted
    #[must_use]
    pub fn is_form_valid(&self) -> bool {
        self.form.is_valid()
    }

    /// Selects a category, clearing the product if it changed.
    pub fn select_category(&mut self, category_id: Option<i64>) {
        if self.form.set_category_id(category_id) {
            debug!(?category_id, "Category selected");
        }
        self.sync_products_key();
        self.run_reconciliation();
    }

    /// Selects a product from the current category.
    pub const fn select_product(&mut self, product_id: Option<i64>) {
        self.form.set_product_id(product_id);
    }

    /// Sets the quantity.
    pub const fn set_quantity(&mut self, quantity: i64) {
        self.form.set_quantity(quantity);
    }

    /// Replaces the comment.
    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.form.set_comment(comment);
    }

    /// Clears the form. In edit mode this also detaches it from the order, so nothing
    /// is reconciled back into it.
    pub fn reset_form(&mut self) {
        self.form.reset();
        if self.editing {
            self.reconcile = ReconcileFlags::default();
            self.order.set_key(None);
        }
        self.sync_products_key();
        self.run_reconciliation();
    }

    // --- reference data ---

    /// Loaded categories
    #[must_use]
    pub fn categories_data(&self) -> Option<&[Category]> {
        self.categories.data().map(Vec::as_slice)
    }

    /// First category load in progress
    #[must_use]
    pub fn categories_loading(&self) -> bool {
        self.categories.is_loading()
    }

    /// Last category load failed
    #[must_use]
    pub fn categories_has_error(&self) -> bool {
        self.categories.has_error()
    }

    /// Error of the last category load
    #[must_use]
    pub fn categories_error(&self) -> Option<&SharedError> {
        self.categories.error()
    }

    /// Category select options
    #[must_use]
    pub fn categories_options(&self) -> Vec<SelectOption> {
        self.categories_data()
            .map(|list| list.iter().map(SelectOption::from).collect())
            .unwrap_or_default()
    }

    /// Products of the selected category
    #[must_use]
    pub fn products_data(&self) -> Option<&[Product]> {
        self.products.data().map(Vec::as_slice)
    }

    /// First product load for the selected category in progress
    #[must_use]
    pub fn products_loading(&self) -> bool {
        self.products.is_loading()
    }

    /// Last product load for the selected category failed
    #[must_use]
    pub fn products_has_error(&self) -> bool {
        self.products.has_error()
    }

    /// Error of the last product load for the selected category
    #[must_use]
    pub fn products_error(&self) -> Option<&SharedError> {
        self.products.error()
    }

    /// Product select options
    #[must_use]
    pub fn products_options(&self) -> Vec<SelectOption> {
        self.products_data()
            .map(|list| list.iter().map(SelectOption::from).collect())
            .unwrap_or_default()
    }

    // --- edit mode ---

    /// Order being edited, once loaded
    #[must_use]
    pub fn order_data(&self) -> Option<&Order> {
        self.order.data()
    }

    /// Order being edited is loading
    #[must_use]
    pub fn order_loading(&self) -> bool {
        self.order.is_loading()
    }

    /// Last order load failed
    #[must_use]
    pub fn order_has_error(&self) -> bool {
        self.order.has_error()
    }

    /// Error of the last order load
    #[must_use]
    pub fn order_error(&self) -> Option<&SharedError> {
        self.order.error()
    }

    /// Reconciliation progress; `None` in create mode
    #[must_use]
    pub const fn reconcile_state(&self) -> Option<ReconcileState> {
        if self.editing {
            Some(self.reconcile.state)
        } else {
            None
        }
    }

    /// Switches the form to another order. The form is cleared before the new order
    /// is reconciled.
    pub fn set_target_order(&mut self, order_id: Option<i64>) {
        if !self.editing {
            warn!(?order_id, "Ignoring target order outside edit mode");
            return;
        }
        if self.order.set_key(order_id) {
            info!(?order_id, "Editing another order");
            if self.order.needs_fetch(Instant::now()) {
                self.refetch_order();
            }
            self.run_reconciliation();
        }
    }

    /// The view regained focus: refetch whatever is stale. The edited order has no
    /// staleness window by default, so it is always refetched.
    pub fn on_focus(&mut self) {
        self.ensure_fresh();
    }

    // --- cache ---

    /// Product records cached across all categories
    #[must_use]
    pub const fn all_cached_products(&self) -> usize {
        self.cache.all_cached_products()
    }

    /// A manual refresh is running
    #[must_use]
    pub const fn is_refreshing_cache(&self) -> bool {
        self.cache.is_refreshing()
    }

    /// When the last manual refresh completed
    #[must_use]
    pub const fn last_cache_update(&self) -> DateTime<Utc> {
        self.cache.last_update()
    }

    /// Refetches categories, drops every cached product list, and refetches the
    /// products of the selected category. Every step runs even if an earlier
    /// fetch failed; failures are logged, not returned.
    pub async fn refetch_all_data(&mut self) {
        self.cache.begin_refresh();
        let category_id = self.form.category_id();
        let mut failures = Vec::new();

        if let Some(request) = self.refetch_categories() {
            failures.extend(self.wait_for(request).await.err());
        }

        self.products.invalidate_all();
        self.update_cached_products_count();

        if category_id.is_some() {
            if let Some(request) = self.refetch_products() {
                failures.extend(self.wait_for(request).await.err());
            }
        }

        self.update_cached_products_count();
        self.cache.stamp(Utc::now());
        for e in failures {
            error!("Updating cache error: {}", e);
        }
        self.cache.end_refresh();
    }

    // --- mutation ---

    /// State of the last submit
    #[must_use]
    pub const fn mutation(&self) -> &OrderMutation {
        &self.mutation
    }

    /// Forgets the outcome of the last submit.
    pub fn reset_mutation(&mut self) {
        self.mutation.reset();
    }

    /// Creates the order, or in edit mode updates the edited one.
    ///
    /// On success a create-mode form is reset; an edit-mode form is left as is.
    /// The success callback, if any, runs afterwards in both modes.
    ///
    /// # Errors
    /// Returns the transport error. The form is left untouched so the user can retry.
    pub async fn submit(&mut self) -> std::result::Result<Order, SharedError> {
        let existing_order_id = if self.editing {
            self.order.key().copied()
        } else {
            None
        };

        let order = self
            .mutation
            .submit(
                self.api.as_ref(),
                &self.form,
                self.products.data().map(Vec::as_slice),
                self.categories.data().map(Vec::as_slice),
                existing_order_id,
            )
            .await?;

        if !self.editing {
            self.reset_form();
        }
        if let Some(callback) = self.on_success.as_mut() {
            callback(&order);
        }
        Ok(order)
    }

    // --- fetch plumbing ---

    /// Fetches currently in flight
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.fetcher.in_flight()
    }

    /// Forces a category fetch.
    pub fn refetch_categories(&mut self) -> Option<RequestId> {
        self.categories.key()?;
        let api = Arc::clone(&self.api);
        let request = self
            .fetcher
            .spawn(async move { Response::Categories(api.fetch_categories().await) });
        self.categories.begin(request);
        debug!(?request, "Fetching categories");
        Some(request)
    }

    /// Forces a product fetch for the selected category. `None` while no category is
    /// selected.
    pub fn refetch_products(&mut self) -> Option<RequestId> {
        let category_id = *self.products.key()?;
        let api = Arc::clone(&self.api);
        let request = self.fetcher.spawn(async move {
            Response::Products(category_id, api.fetch_products(category_id).await)
        });
        self.products.begin(request);
        debug!(?request, category_id, "Fetching products");
        Some(request)
    }

    /// Forces a fetch of the edited order. `None` outside edit mode or when detached.
    pub fn refetch_order(&mut self) -> Option<RequestId> {
        let order_id = *self.order.key()?;
        let api = Arc::clone(&self.api);
        let request = self
            .fetcher
            .spawn(async move { Response::Order(order_id, api.get_order(order_id).await) });
        self.order.begin(request);
        debug!(?request, order_id, "Fetching order");
        Some(request)
    }

    /// Waits for the next fetch to complete and applies it. `None` once nothing is
    /// in flight.
    pub async fn next_event(&mut self) -> Option<Settled> {
        let (request, outcome) = self.fetcher.next().await?;
        Some(match outcome {
            Ok(response) => self.apply(request, response),
            Err(e) => self.abandon(request, &e.to_string()),
        })
    }

    /// Applies results until nothing is in flight.
    pub async fn settle(&mut self) {
        while self.next_event().await.is_some() {}
    }

    async fn wait_for(&mut self, request: RequestId) -> std::result::Result<(), SharedError> {
        while let Some(settled) = self.next_event().await {
            if settled.request == request {
                return settled.error.map_or(Ok(()), Err);
            }
        }
        Ok(())
    }

    fn apply(&mut self, request: RequestId, response: Response) -> Settled {
        let now = Instant::now();
        let settled = match response {
            Response::Categories(result) => {
                let settled = self.categories.settle(&(), request, result, now);
                self.update_cached_products_count();
                settled
            }
            Response::Products(category_id, result) => {
                let settled = self.products.settle(&category_id, request, result, now);
                self.update_cached_products_count();
                settled
            }
            Response::Order(order_id, result) => self.order.settle(&order_id, request, result, now),
        };
        if settled.applied {
            self.run_reconciliation();
        }
        settled
    }

    fn abandon(&mut self, request: RequestId, reason: &str) -> Settled {
        let mut settled = self.categories.abandon(request, reason);
        if !settled.applied {
            settled = self.products.abandon(request, reason);
        }
        if !settled.applied {
            settled = self.order.abandon(request, reason);
        }
        if settled.applied {
            self.run_reconciliation();
        }
        settled
    }

    fn ensure_fresh(&mut self) {
        let now = Instant::now();
        if self.categories.needs_fetch(now) {
            self.refetch_categories();
        }
        if self.products.needs_fetch(now) {
            self.refetch_products();
        }
        if self.order.needs_fetch(now) {
            self.refetch_order();
        }
    }

    fn sync_products_key(&mut self) -> bool {
        let changed = self.products.set_key(self.form.category_id());
        if changed && self.products.needs_fetch(Instant::now()) {
            self.refetch_products();
        }
        changed
    }

    fn update_cached_products_count(&mut self) {
        self.cache
            .update_count(self.products.cached().map(|(_, list)| list));
    }

    fn run_reconciliation(&mut self) {
        if !self.editing {
            return;
        }
        for _ in 0..MAX_RECONCILE_PASSES {
            let snapshot = Snapshot {
                target_order_id: self.order.key().copied(),
                order: self.order.data(),
                categories: self.categories.data().map(Vec::as_slice),
                products: self.products.key().map(|&category_id| ProductsSnapshot {
                    category_id,
                    products: self.products.data().map(Vec::as_slice),
                    loading: self.products.is_loading(),
                }),
            };
            let Reconciled { form, flags } = reconcile(&self.form, &self.reconcile, &snapshot);
            if flags.state != self.reconcile.state {
                info!(
                    from = ?self.reconcile.state,
                    to = ?flags.state,
                    "Reconciliation state changed"
                );
            }
            self.form = form;
            self.reconcile = flags;
            if !self.sync_products_key() {
                break;
            }
        }
    }
}
