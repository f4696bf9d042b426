//! Entity module - SeaORM entity definitions for the order store.

pub mod order;

pub use order::{Column as OrderColumn, Entity as OrderEntity, Model as OrderModel};
