// src/models/mod.rs

//! Contains data structures representing database entities.

pub mod order;
pub mod order_item;
pub mod variant;

pub use order::{Order, OrderStatus};
pub use order_item::OrderItem;
pub use variant::Variant;
