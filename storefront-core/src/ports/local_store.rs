//! Local store port - persistent string key/value storage
//!
//! The client keeps only a few identifiers here (credential token, cached
//! profile, cart identifier). Reads and writes are synchronous.

use crate::domain::result::Result;

/// Keys shared by the services
pub mod keys {
    /// Bearer token issued at login
    pub const TOKEN: &str = "token";
    /// Cached user profile as JSON
    pub const USER: &str = "user";
    /// Cached cart identifier
    pub const CART_ID: &str = "cartID";
}

pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}
