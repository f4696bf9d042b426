//! Core logic - framework-agnostic form state, providers and reconciliation.

/// Product cache accounting and manual refresh bookkeeping
pub mod cache;
/// Spawned fetches delivered back in completion order
pub mod fetcher;
/// The mutable order form
pub mod form;
/// Create/update mutation and payload derivation
pub mod mutation;
/// Order list view model
pub mod orders;
/// Keyed query cache with staleness and request supersession
pub mod query;
/// Edit-mode reconciliation of an order onto reference data ids
pub mod reconcile;
/// Order form view model
pub mod view_model;

pub use form::OrderForm;
pub use orders::{OrderListViewModel, OrderRow};
pub use reconcile::ReconcileState;
pub use view_model::{FormMode, OrderFormViewModel};
