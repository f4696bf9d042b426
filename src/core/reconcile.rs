//! Edit-mode reconciliation.
//!
//! An existing order stores its category and product by name. Before the form can
//! show it, those names have to be mapped back onto ids from the reference data, and
//! the order, the category list and the product list all arrive independently.
//!
//! [`reconcile`] is a pure transition: it takes the current form, the previous
//! [`ReconcileFlags`] and a [`Snapshot`] of whatever data is available right now,
//! and returns the next form and flags. Feeding it the same snapshot twice changes
//! nothing, and it only ever fills `category_id` and then `product_id` forward.
//! Fields are cleared only by the explicit invalidation rules:
//!
//! - the target order id changed: hard reset of form and flags;
//! - the loaded order's id changed after it was first observed: re-reconcile;
//! - the loaded order's category no longer matches what was reconciled: re-reconcile.

use crate::core::form::OrderForm;
use crate::models::{Category, Order, Product};
use tracing::{debug, trace};

/// Where an edit session stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcileState {
    /// Order or categories not available yet, or no category name matched
    #[default]
    Uninitialized,
    /// Category matched and copied into the form
    CategoryReconciled,
    /// Waiting for the product list of the reconciled category
    ProductReconciling,
    /// Product matched and copied into the form
    ProductReconciled,
    /// Product list loaded, but the order's product is not in it
    ProductAbsent,
}

impl ReconcileState {
    /// `true` once nothing more will be filled in without new input.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::ProductReconciled | Self::ProductAbsent)
    }
}

/// Bookkeeping carried between reconciliation passes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReconcileFlags {
    /// Current state
    pub state: ReconcileState,
    /// Whether the form has been populated from the order for the current target
    pub initialized: bool,
    /// Order id the previous pass was aiming at
    pub target_order_id: Option<i64>,
    /// Id of the last loaded order seen for this target
    pub observed_order_id: Option<i64>,
    /// Category id chosen by reconciliation and the normalized name it matched
    pub reconciled_category: Option<(i64, String)>,
}

impl ReconcileFlags {
    fn invalidate(&mut self) {
        self.initialized = false;
        self.reconciled_category = None;
        self.state = ReconcileState::Uninitialized;
    }
}

/// Product list for one category as seen by the form
#[derive(Debug, Clone, Copy)]
pub struct ProductsSnapshot<'a> {
    /// Category the list belongs to
    pub category_id: i64,
    /// Loaded products, if any
    pub products: Option<&'a [Product]>,
    /// First load still in progress
    pub loading: bool,
}

/// Everything reconciliation may look at
#[derive(Debug, Clone, Copy, Default)]
pub struct Snapshot<'a> {
    /// Order the form is editing
    pub target_order_id: Option<i64>,
    /// Loaded order, if any
    pub order: Option<&'a Order>,
    /// Loaded categories, if any
    pub categories: Option<&'a [Category]>,
    /// Product list for the form's current category, if any
    pub products: Option<ProductsSnapshot<'a>>,
}

/// Output of one pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    /// Next form state
    pub form: OrderForm,
    /// Next flags
    pub flags: ReconcileFlags,
}

/// Case-folded, trimmed name used for matching.
#[must_use]
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Runs one reconciliation pass.
#[must_use]
pub fn reconcile(form: &OrderForm, flags: &ReconcileFlags, snapshot: &Snapshot<'_>) -> Reconciled {
    let mut form = form.clone();
    let mut flags = flags.clone();

    if snapshot.target_order_id != flags.target_order_id {
        debug!(
            from = ?flags.target_order_id,
            to = ?snapshot.target_order_id,
            "Target order changed, resetting form"
        );
        form.reset();
        flags = ReconcileFlags {
            target_order_id: snapshot.target_order_id,
            ..ReconcileFlags::default()
        };
    }

    let Some(order) = snapshot.order else {
        return Reconciled { form, flags };
    };

    if flags.observed_order_id.is_some_and(|seen| seen != order.id) {
        debug!(order_id = order.id, "Loaded order replaced, reconciling again");
        flags.invalidate();
    }
    flags.observed_order_id = Some(order.id);

    if Some(order.id) != flags.target_order_id {
        trace!(order_id = order.id, "Loaded order is not the target, waiting");
        return Reconciled { form, flags };
    }

    let order_category = normalize(&order.category);

    if flags.initialized
        && flags
            .reconciled_category
            .as_ref()
            .is_none_or(|(_, name)| *name != order_category)
    {
        debug!(order_id = order.id, "Order category changed, reconciling again");
        flags.invalidate();
    }

    if !flags.initialized {
        let Some(category) = snapshot
            .categories
            .and_then(|list| list.iter().find(|c| normalize(&c.name) == order_category))
        else {
            return Reconciled { form, flags };
        };

        form.set_category_id(Some(category.id));
        form.set_quantity(order.quantity);
        form.set_comment(order.comment.clone());
        flags.initialized = true;
        flags.reconciled_category = Some((category.id, order_category));
        flags.state = ReconcileState::CategoryReconciled;
        debug!(order_id = order.id, category_id = category.id, "Category reconciled");
    }

    if matches!(
        flags.state,
        ReconcileState::CategoryReconciled | ReconcileState::ProductReconciling
    ) {
        reconcile_product(&mut form, &mut flags, order, snapshot.products);
    }

    Reconciled { form, flags }
}

fn reconcile_product(
    form: &mut OrderForm,
    flags: &mut ReconcileFlags,
    order: &Order,
    products: Option<ProductsSnapshot<'_>>,
) {
    let Some((category_id, _)) = flags.reconciled_category else {
        return;
    };

    // The user picked another category while we were waiting; leave it to them.
    if form.category_id() != Some(category_id) {
        return;
    }

    let ready = products
        .filter(|p| p.category_id == category_id && !p.loading)
        .and_then(|p| p.products)
        .filter(|list| !list.is_empty());

    let Some(list) = ready else {
        flags.state = ReconcileState::ProductReconciling;
        return;
    };

    let wanted = normalize(&order.product);
    if let Some(product) = list.iter().find(|p| normalize(&p.name) == wanted) {
        form.set_product_id(Some(product.id));
        flags.state = ReconcileState::ProductReconciled;
        debug!(order_id = order.id, product_id = product.id, "Product reconciled");
    } else {
        form.set_product_id(None);
        flags.state = ReconcileState::ProductAbsent;
        debug!(
            order_id = order.id,
            product = %order.product,
            "Order product not found in category"
        );
    }
}
