//! Cart service - keeps the local cart in step with the remote cart
//!
//! The cart identifier is created lazily with one remote call and cached
//! in the local store until checkout (or logout) clears it:
//!
//! ```text
//! UNSET --ensure_cart--> SET --checkout--> UNSET
//! ```
//!
//! Two `ensure_cart` calls racing before the first one caches its result
//! will create two carts; nothing guards against that.

use std::sync::Arc;

use crate::domain::result::{Error, Result};
use crate::domain::{AddItemRequest, CartDetails, Outcome, Route};
use crate::ports::{keys, LocalStore, StorefrontApi};

pub const MSG_INIT_FAILED: &str = "Could not initialize cart";
pub const MSG_LOAD_FAILED: &str = "Failed to load cart";
pub const MSG_ADD_FAILED: &str = "Add item failed";
pub const MSG_UPDATE_FAILED: &str = "Update failed";
pub const MSG_REMOVE_FAILED: &str = "Remove failed";
pub const MSG_CHECKOUT_FAILED: &str = "Checkout failed";
pub const MSG_CART_EMPTY: &str = "Your cart is empty";

/// What the cart view renders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartState {
    pub cart_id: Option<i64>,
    pub details: Option<CartDetails>,
    /// Raised for the duration of a non-silent refresh
    pub loading: bool,
    pub error: Option<String>,
}

pub struct CartService {
    api: Arc<dyn StorefrontApi>,
    store: Arc<dyn LocalStore>,
    state: CartState,
}

impl CartService {
    pub fn new(api: Arc<dyn StorefrontApi>, store: Arc<dyn LocalStore>) -> Self {
        Self {
            api,
            store,
            state: CartState::default(),
        }
    }

    pub fn state(&self) -> &CartState {
        &self.state
    }

    /// Cart identifier cached in the local store
    ///
    /// A value that is not a number is dropped.
    pub fn cached_cart_id(&self) -> Result<Option<i64>> {
        let Some(raw) = self.store.get(keys::CART_ID)? else {
            return Ok(None);
        };
        match raw.trim().parse::<i64>() {
            Ok(id) if id > 0 => Ok(Some(id)),
            _ => {
                tracing::warn!(value = %raw, "discarding invalid cached cart id");
                self.store.remove(keys::CART_ID)?;
                Ok(None)
            }
        }
    }

    /// Use the cached cart identifier, or create a cart and cache its id
    pub fn ensure_cart(&mut self) -> Result<Outcome> {
        if let Some(id) = self.cached_cart_id()? {
            self.state.cart_id = Some(id);
            return Ok(Outcome::Updated);
        }

        match self.api.create_cart() {
            Ok(cart) => {
                self.store.set(keys::CART_ID, &cart.id.to_string())?;
                tracing::debug!(cart_id = cart.id, "created cart");
                self.state.cart_id = Some(cart.id);
                Ok(Outcome::Updated)
            }
            Err(e) => Ok(self.fail(&e, MSG_INIT_FAILED)),
        }
    }

    /// Re-fetch the cart contents
    ///
    /// A silent refresh leaves the loading flag alone so the view does not
    /// flicker after a mutation.
    pub fn refresh(&mut self, silent: bool) -> Result<Outcome> {
        let cart_id = match self.current_cart_id()? {
            Ok(id) => id,
            Err(outcome) => return Ok(outcome),
        };

        if !silent {
            self.state.loading = true;
        }
        let result = self.api.get_cart(cart_id);
        if !silent {
            self.state.loading = false;
        }

        match result {
            Ok(details) => {
                self.state.details = Some(details);
                self.state.error = None;
                Ok(Outcome::Updated)
            }
            Err(e) => Ok(self.fail(&e, MSG_LOAD_FAILED)),
        }
    }

    /// Add `quantity` of a product, then refresh silently
    ///
    /// Without a session the user is sent to login before anything is
    /// created remotely.
    pub fn add_item(&mut self, product_id: i64, quantity: u32) -> Result<Outcome> {
        if quantity == 0 {
            return Err(Error::validation("Quantity must be at least 1"));
        }
        if self.store.get(keys::TOKEN)?.is_none() {
            return Ok(Outcome::Navigate(Route::Login));
        }

        let cart_id = match self.current_cart_id()? {
            Ok(id) => id,
            Err(outcome) => return Ok(outcome),
        };

        let item = AddItemRequest {
            product_id,
            quantity,
        };
        if let Err(e) = self.api.add_item(cart_id, &item) {
            return Ok(self.fail(&e, MSG_ADD_FAILED));
        }
        self.refresh(true)
    }

    /// Set a line's quantity by deleting it and re-adding it
    ///
    /// Not atomic: between the two calls the item is absent from the
    /// remote cart. A quantity of zero leaves it removed.
    pub fn update_quantity(&mut self, product_id: i64, new_quantity: u32) -> Result<Outcome> {
        let cart_id = match self.current_cart_id()? {
            Ok(id) => id,
            Err(outcome) => return Ok(outcome),
        };

        if let Err(e) = self.api.remove_item(cart_id, product_id) {
            return Ok(self.fail(&e, MSG_UPDATE_FAILED));
        }

        if new_quantity > 0 {
            let item = AddItemRequest {
                product_id,
                quantity: new_quantity,
            };
            if let Err(e) = self.api.add_item(cart_id, &item) {
                // The line is already gone remotely, so show the cart as it is now
                let outcome = self.fail(&e, MSG_UPDATE_FAILED);
                self.refresh(true)?;
                if outcome.is_failed() {
                    self.state.error = Some(MSG_UPDATE_FAILED.to_string());
                }
                return Ok(outcome);
            }
        }
        self.refresh(true)
    }

    pub fn remove_item(&mut self, product_id: i64) -> Result<Outcome> {
        let cart_id = match self.current_cart_id()? {
            Ok(id) => id,
            Err(outcome) => return Ok(outcome),
        };

        if let Err(e) = self.api.remove_item(cart_id, product_id) {
            return Ok(self.fail(&e, MSG_REMOVE_FAILED));
        }
        self.refresh(true)
    }

    /// Turn the cart into an order
    ///
    /// On success the cached cart identifier is cleared and the user is
    /// sent to the new order.
    pub fn checkout(&mut self) -> Result<Outcome> {
        let Some(cart_id) = self.cached_cart_id()? else {
            return Ok(self.fail_with(MSG_CART_EMPTY));
        };
        self.state.cart_id = Some(cart_id);

        if self.state.details.is_none() {
            let outcome = self.refresh(true)?;
            if outcome != Outcome::Updated {
                return Ok(outcome);
            }
        }
        if self.state.details.as_ref().map_or(true, CartDetails::is_empty) {
            return Ok(self.fail_with(MSG_CART_EMPTY));
        }

        match self.api.create_order(cart_id) {
            Ok(order) => {
                self.store.remove(keys::CART_ID)?;
                self.state = CartState::default();
                tracing::debug!(order_id = order.id, "checkout completed");
                Ok(Outcome::Navigate(Route::OrderDetail(order.id)))
            }
            Err(e) => Ok(self.fail(&e, MSG_CHECKOUT_FAILED)),
        }
    }

    /// Forget view state (not the cached identifier)
    pub fn reset(&mut self) {
        self.state = CartState::default();
    }

    /// Cart id from state, or from `ensure_cart` when none is known yet
    fn current_cart_id(&mut self) -> Result<std::result::Result<i64, Outcome>> {
        if let Some(id) = self.state.cart_id {
            return Ok(Ok(id));
        }
        let outcome = self.ensure_cart()?;
        Ok(self.state.cart_id.ok_or(outcome))
    }

    /// A 401 redirects to login; anything else sets the inline error
    fn fail(&mut self, error: &Error, message: &str) -> Outcome {
        let outcome = Outcome::from_error(error, message);
        if outcome.is_failed() {
            tracing::warn!(error = %error, "{}", message);
            self.state.error = Some(message.to_string());
        } else {
            tracing::info!(error = %error, "cart request unauthorized");
        }
        outcome
    }

    fn fail_with(&mut self, message: &str) -> Outcome {
        self.state.error = Some(message.to_string());
        Outcome::failed(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryStorefront, MemoryStore};
    use crate::domain::{Credentials, Product};
    use rust_decimal::Decimal;

    fn setup() -> (Arc<InMemoryStorefront>, Arc<MemoryStore>, CartService) {
        let api = Arc::new(InMemoryStorefront::with_products([
            Product::new(1, "Mug", Decimal::new(1250, 2)),
            Product::new(2, "Tea", Decimal::new(325, 2)),
        ]));
        api.register_user("Ada", "ada@example.com", "secret");
        let token = api
            .login(&Credentials {
                email: "ada@example.com".to_string(),
                password: "secret".to_string(),
            })
            .unwrap()
            .token;
        api.set_token(Some(&token));

        let store = Arc::new(MemoryStore::new());
        store.set(keys::TOKEN, &token).unwrap();

        let service = CartService::new(api.clone(), store.clone());
        api.clear_calls();
        (api, store, service)
    }

    #[test]
    fn test_ensure_cart_creates_once_and_caches() {
        let (api, store, mut service) = setup();

        assert_eq!(service.ensure_cart().unwrap(), Outcome::Updated);
        assert_eq!(service.ensure_cart().unwrap(), Outcome::Updated);

        assert_eq!(api.call_count("POST /carts"), 1);
        let cached = store.get(keys::CART_ID).unwrap().unwrap();
        assert_eq!(Some(cached.parse::<i64>().unwrap()), service.state().cart_id);
    }

    #[test]
    fn test_ensure_cart_reuses_cached_id() {
        let (api, store, mut service) = setup();
        store.set(keys::CART_ID, "41").unwrap();

        service.ensure_cart().unwrap();
        assert_eq!(service.state().cart_id, Some(41));
        assert_eq!(api.call_count("POST /carts"), 0);
    }

    #[test]
    fn test_ensure_cart_failure_sets_message() {
        let (api, store, mut service) = setup();
        api.fail_next("POST /carts", 500);

        assert_eq!(service.ensure_cart().unwrap(), Outcome::failed(MSG_INIT_FAILED));
        assert_eq!(service.state().error.as_deref(), Some(MSG_INIT_FAILED));
        assert!(store.get(keys::CART_ID).unwrap().is_none());
    }

    #[test]
    fn test_invalid_cached_id_is_dropped() {
        let (_api, store, service) = setup();
        store.set(keys::CART_ID, "abc").unwrap();

        assert!(service.cached_cart_id().unwrap().is_none());
        assert!(store.get(keys::CART_ID).unwrap().is_none());
    }

    #[test]
    fn test_add_item_refreshes() {
        let (api, _store, mut service) = setup();

        assert_eq!(service.add_item(1, 2).unwrap(), Outcome::Updated);
        let details = service.state().details.clone().unwrap();
        assert_eq!(details.item(1).map(|i| i.quantity), Some(2));
        assert_eq!(details.subtotal(), Decimal::new(2500, 2));
        assert_eq!(api.call_count("GET /carts/:id"), 1);
    }

    #[test]
    fn test_add_item_requires_session() {
        let (api, store, mut service) = setup();
        store.remove(keys::TOKEN).unwrap();

        assert_eq!(service.add_item(1, 1).unwrap(), Outcome::Navigate(Route::Login));
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_add_item_rejects_zero_quantity() {
        let (_api, _store, mut service) = setup();
        assert!(matches!(service.add_item(1, 0), Err(Error::Validation(_))));
    }

    #[test]
    fn test_update_quantity_replaces_line() {
        let (api, _store, mut service) = setup();
        service.add_item(1, 2).unwrap();

        assert_eq!(service.update_quantity(1, 5).unwrap(), Outcome::Updated);
        let details = service.state().details.clone().unwrap();
        assert_eq!(details.item(1).map(|i| i.quantity), Some(5));
        assert_eq!(api.call_count("DELETE /carts/:id/items/:productId"), 1);
    }

    #[test]
    fn test_update_quantity_to_zero_removes_item() {
        let (api, _store, mut service) = setup();
        service.add_item(1, 2).unwrap();
        service.add_item(2, 1).unwrap();

        assert_eq!(service.update_quantity(1, 0).unwrap(), Outcome::Updated);
        let details = service.state().details.clone().unwrap();
        assert!(details.item(1).is_none());
        assert!(details.item(2).is_some());
        assert_eq!(api.call_count("POST /carts/:id/items"), 2);
    }

    #[test]
    fn test_update_quantity_readd_failure_shows_remote_cart() {
        let (api, _store, mut service) = setup();
        service.add_item(1, 2).unwrap();
        service.add_item(2, 1).unwrap();
        api.fail_next("POST /carts/:id/items", 500);

        assert_eq!(
            service.update_quantity(1, 4).unwrap(),
            Outcome::failed(MSG_UPDATE_FAILED)
        );
        let details = service.state().details.clone().unwrap();
        assert!(details.item(1).is_none());
        assert_eq!(details.item(2).map(|i| i.quantity), Some(1));
        assert_eq!(service.state().error.as_deref(), Some(MSG_UPDATE_FAILED));
    }

    #[test]
    fn test_update_quantity_readd_unauthorized_redirects() {
        let (api, _store, mut service) = setup();
        service.add_item(1, 2).unwrap();
        api.fail_next("POST /carts/:id/items", 401);

        assert_eq!(
            service.update_quantity(1, 4).unwrap(),
            Outcome::Navigate(Route::Login)
        );
        let details = service.state().details.clone().unwrap();
        assert!(details.item(1).is_none());
    }

    #[test]
    fn test_remove_item() {
        let (_api, _store, mut service) = setup();
        service.add_item(2, 3).unwrap();

        assert_eq!(service.remove_item(2).unwrap(), Outcome::Updated);
        assert!(service.state().details.as_ref().unwrap().is_empty());
    }

    #[test]
    fn test_remove_failure_message() {
        let (api, _store, mut service) = setup();
        service.add_item(2, 3).unwrap();
        api.fail_next("DELETE /carts/:id/items/:productId", 500);

        assert_eq!(service.remove_item(2).unwrap(), Outcome::failed(MSG_REMOVE_FAILED));
        assert_eq!(service.state().error.as_deref(), Some(MSG_REMOVE_FAILED));
    }

    #[test]
    fn test_silent_refresh_leaves_loading_flag() {
        let (_api, _store, mut service) = setup();
        service.ensure_cart().unwrap();

        service.state.loading = true;
        service.refresh(true).unwrap();
        assert!(service.state().loading);

        service.refresh(false).unwrap();
        assert!(!service.state().loading);
        assert!(service.state().details.is_some());
    }

    #[test]
    fn test_checkout_clears_cached_id() {
        let (api, store, mut service) = setup();
        service.add_item(1, 1).unwrap();
        let cart_id = service.state().cart_id.unwrap();

        let outcome = service.checkout().unwrap();
        assert!(matches!(outcome, Outcome::Navigate(Route::OrderDetail(_))));
        assert!(store.get(keys::CART_ID).unwrap().is_none());
        assert_eq!(service.state(), &CartState::default());
        assert!(api.get_cart(cart_id).unwrap().is_empty());

        // The next cart interaction starts a new cart
        service.ensure_cart().unwrap();
        assert_ne!(service.state().cart_id, Some(cart_id));
    }

    #[test]
    fn test_checkout_empty_cart_makes_no_order_call() {
        let (api, _store, mut service) = setup();
        assert_eq!(service.checkout().unwrap(), Outcome::failed(MSG_CART_EMPTY));

        service.ensure_cart().unwrap();
        assert_eq!(service.checkout().unwrap(), Outcome::failed(MSG_CART_EMPTY));
        assert_eq!(api.call_count("POST /orders"), 0);
    }

    #[test]
    fn test_checkout_failure_keeps_cart() {
        let (api, store, mut service) = setup();
        service.add_item(1, 1).unwrap();
        api.fail_next("POST /orders", 500);

        assert_eq!(service.checkout().unwrap(), Outcome::failed(MSG_CHECKOUT_FAILED));
        assert!(store.get(keys::CART_ID).unwrap().is_some());
    }

    #[test]
    fn test_unauthorized_mutations_redirect_to_login() {
        let (api, _store, mut service) = setup();
        service.add_item(1, 1).unwrap();
        api.revoke_tokens();

        let login = Outcome::Navigate(Route::Login);
        assert_eq!(service.add_item(2, 1).unwrap(), login);
        assert_eq!(service.update_quantity(1, 3).unwrap(), login);
        assert_eq!(service.remove_item(1).unwrap(), login);
        assert_eq!(service.refresh(false).unwrap(), login);
        assert_eq!(service.checkout().unwrap(), login);
        assert!(service.state().error.is_none());
    }
}
