//! Unified error type for the order desk.
//!
//! Every failure is scoped to the operation that produced it: fetch failures land on
//! the provider that issued the request, submit failures on the mutation.

use thiserror::Error;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of the problem
        message: String,
    },

    /// Order store failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Loading reference data, an order, or the order list failed
    #[error("Failed to load {resource}: {message}")]
    Fetch {
        /// What was being loaded ("categories", "products", ...)
        resource: &'static str,
        /// Transport-level reason
        message: String,
    },

    /// Creating or updating an order failed
    #[error("Order submission failed: {message}")]
    Submit {
        /// Transport-level reason
        message: String,
    },

    /// No order with this id exists
    #[error("Order not found: {id}")]
    OrderNotFound {
        /// Requested order id
        id: i64,
    },

    /// Quantity outside the accepted range
    #[error("Invalid quantity: {quantity} (must be between 1 and 10)")]
    InvalidQuantity {
        /// Rejected quantity
        quantity: i64,
    },

    /// Payload without a category or product name
    #[error("Order is missing a category or product")]
    IncompleteForm,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable error
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Builds a [`Error::Fetch`] for the given resource.
    pub fn fetch(resource: &'static str, message: impl Into<String>) -> Self {
        Self::Fetch {
            resource,
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

/// An error observed by more than one consumer (provider state, mutation state)
pub type SharedError = std::sync::Arc<Error>;
