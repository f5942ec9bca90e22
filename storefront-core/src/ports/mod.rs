//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. Services depend
//! only on these traits, not on concrete implementations.

pub mod local_store;
mod storefront_api;

pub use local_store::{keys, LocalStore};
pub use storefront_api::StorefrontApi;
