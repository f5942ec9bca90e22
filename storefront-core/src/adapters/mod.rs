//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - reqwest HTTP client for the StorefrontApi port
//! - In-process storefront simulation for the StorefrontApi port
//! - JSON file and in-memory maps for the LocalStore port

pub mod file_store;
pub mod http;
pub mod memory;
pub mod memory_store;

pub use file_store::FileStore;
pub use http::HttpStorefront;
pub use memory::{InMemoryStorefront, RecordedCall};
pub use memory_store::MemoryStore;
