//! Cache accounting - counts cached product records and tracks manual refreshes.

use crate::models::Product;
use chrono::{DateTime, Utc};
use tracing::{info, trace};

/// Counters the view shows next to the refresh button
#[derive(Debug, Clone)]
pub struct CacheAccounting {
    all_cached_products: usize,
    is_refreshing: bool,
    last_update: DateTime<Utc>,
}

impl Default for CacheAccounting {
    fn default() -> Self {
        Self {
            all_cached_products: 0,
            is_refreshing: false,
            last_update: Utc::now(),
        }
    }
}

impl CacheAccounting {
    /// Total product records across every cached product list
    #[must_use]
    pub const fn all_cached_products(&self) -> usize {
        self.all_cached_products
    }

    /// A manual refresh is running
    #[must_use]
    pub const fn is_refreshing(&self) -> bool {
        self.is_refreshing
    }

    /// When the last manual refresh completed
    #[must_use]
    pub const fn last_update(&self) -> DateTime<Utc> {
        self.last_update
    }

    /// Recomputes the product count from every cached list, whichever category it
    /// belongs to.
    pub fn update_count<'a>(&mut self, lists: impl IntoIterator<Item = &'a Vec<Product>>) {
        let total = lists.into_iter().map(Vec::len).sum();
        if total != self.all_cached_products {
            trace!(
                from = self.all_cached_products,
                to = total,
                "Cached product count changed"
            );
        }
        self.all_cached_products = total;
    }

    /// Marks a manual refresh as started.
    pub fn begin_refresh(&mut self) {
        info!("Refreshing reference data cache...");
        self.is_refreshing = true;
    }

    /// Records a completed refresh.
    pub fn stamp(&mut self, at: DateTime<Utc>) {
        self.last_update = at;
        info!(
            products = self.all_cached_products,
            "Reference data cache refreshed"
        );
    }

    /// Clears the busy flag, whatever the outcome.
    pub fn end_refresh(&mut self) {
        self.is_refreshing = false;
    }
}
