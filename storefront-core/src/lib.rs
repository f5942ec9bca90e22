//! Storefront Core - client-side state for the storefront REST API
//!
//! This crate follows hexagonal architecture:
//!
//! - **domain**: View models of the remote storefront (Product, Cart, Order, ...)
//! - **ports**: Traits for external dependencies (StorefrontApi, LocalStore)
//! - **services**: Session, cart, catalog and order logic
//! - **adapters**: Concrete implementations (HTTP, JSON file, in-memory)

pub mod adapters;
pub mod config;
pub mod domain;
mod log_migrations;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use adapters::{FileStore, HttpStorefront};
use config::Config;
use ports::{LocalStore, StorefrontApi};
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult};
pub use domain::{
    Cart, CartDetails, CartItem, Fetched, Order, OrderDetails, OrderItem, Outcome, Product, Route,
    Session, User,
};
pub use services::{EventCount, LogEntry, LogEvent, LogQuery, LoggingService};

/// Main context for storefront operations
///
/// Holds the configuration, the adapters and every service. The session
/// is restored from the local store when the context is built.
pub struct StorefrontContext {
    pub config: Config,
    pub shop_dir: Option<PathBuf>,
    pub api: Arc<dyn StorefrontApi>,
    pub store: Arc<dyn LocalStore>,
    pub session_service: SessionService,
    pub cart_service: CartService,
    pub catalog_service: CatalogService,
    pub order_service: OrderService,
}

impl StorefrontContext {
    /// Context talking HTTP to the configured API, persisting to `shop_dir`
    pub fn new(shop_dir: &Path) -> Result<Self> {
        let config = Config::load(shop_dir)?;
        let api = HttpStorefront::new(&config.api_base_url, config.timeout())
            .context("Failed to create storefront API client")?;
        let store = FileStore::new(shop_dir);

        let mut ctx = Self::with_adapters(config, Arc::new(api), Arc::new(store))?;
        ctx.shop_dir = Some(shop_dir.to_path_buf());
        Ok(ctx)
    }

    /// Context over arbitrary adapters (in-memory ones in tests)
    pub fn with_adapters(
        config: Config,
        api: Arc<dyn StorefrontApi>,
        store: Arc<dyn LocalStore>,
    ) -> Result<Self> {
        let mut session_service = SessionService::new(Arc::clone(&api), Arc::clone(&store));
        session_service
            .restore()
            .context("Failed to restore session")?;

        let cart_service = CartService::new(Arc::clone(&api), Arc::clone(&store));
        let catalog_service = CatalogService::new(Arc::clone(&api));
        let order_service = OrderService::new(Arc::clone(&api));

        Ok(Self {
            config,
            shop_dir: None,
            api,
            store,
            session_service,
            cart_service,
            catalog_service,
            order_service,
        })
    }

    /// Log out and drop any cart view state
    pub fn logout(&mut self) -> domain::result::Result<Outcome> {
        let outcome = self.session_service.logout()?;
        self.cart_service.reset();
        Ok(outcome)
    }
}
