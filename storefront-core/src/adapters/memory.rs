//! In-memory storefront
//!
//! Implements `StorefrontApi` by simulating the backend in process: users
//! and bearer tokens, a catalog, carts that accumulate quantities, and
//! orders created from carts. Every call is recorded together with the
//! token that was attached, and failures can be injected per endpoint.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{
    AddItemRequest, Cart, CartDetails, CartItem, Credentials, LoginResponse, Order, OrderDetails,
    OrderItem, Product, SignupRequest, User,
};
use crate::ports::StorefrontApi;

/// A call made against the in-memory storefront
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Endpoint template, e.g. `"POST /carts/:id/items"`
    pub endpoint: &'static str,
    /// Bearer token attached to the call
    pub token: Option<String>,
}

#[derive(Debug, Default)]
struct ServerState {
    users: Vec<(User, String)>,
    tokens: HashMap<String, i64>,
    products: BTreeMap<i64, Product>,
    carts: BTreeMap<i64, (Cart, Vec<(i64, u32)>)>,
    orders: BTreeMap<i64, (Order, Vec<OrderItem>)>,
    next_user_id: i64,
    next_cart_id: i64,
    next_order_id: i64,
    calls: Vec<RecordedCall>,
    injected: HashMap<&'static str, VecDeque<u16>>,
}

#[derive(Debug, Default)]
pub struct InMemoryStorefront {
    state: Mutex<ServerState>,
    token: Mutex<Option<String>>,
}

impl InMemoryStorefront {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storefront with a catalog already in place
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let storefront = Self::new();
        for product in products {
            storefront.add_product(product);
        }
        storefront
    }

    fn state(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_product(&self, product: Product) {
        self.state().products.insert(product.id, product);
    }

    /// Register a customer directly, bypassing signup
    pub fn register_user(&self, name: &str, email: &str, password: &str) -> User {
        let mut state = self.state();
        state.next_user_id += 1;
        let user = User::new(state.next_user_id, email).with_name(name);
        state.users.push((user.clone(), password.to_string()));
        user
    }

    /// Invalidate every issued token; later authenticated calls get a 401
    pub fn revoke_tokens(&self) {
        self.state().tokens.clear();
    }

    /// Make the next call to `endpoint` fail with the given HTTP status
    pub fn fail_next(&self, endpoint: &'static str, status: u16) {
        self.state()
            .injected
            .entry(endpoint)
            .or_default()
            .push_back(status);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state().calls.clone()
    }

    pub fn call_count(&self, endpoint: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.endpoint == endpoint)
            .count()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Whether a cart exists server-side
    pub fn has_cart(&self, cart_id: i64) -> bool {
        self.state().carts.contains_key(&cart_id)
    }

    pub fn cart_count(&self) -> usize {
        self.state().carts.len()
    }

    /// Record the call, apply injected failures, and return the caller's token
    fn begin(&self, state: &mut ServerState, endpoint: &'static str) -> Result<Option<String>> {
        let token = self.token();
        state.calls.push(RecordedCall {
            endpoint,
            token: token.clone(),
        });

        if let Some(status) = state.injected.get_mut(endpoint).and_then(VecDeque::pop_front) {
            return Err(status_error(status, "injected failure"));
        }
        Ok(token)
    }

    /// Like `begin`, but the endpoint requires a valid bearer token
    fn begin_authenticated(&self, state: &mut ServerState, endpoint: &'static str) -> Result<i64> {
        let token = self
            .begin(state, endpoint)?
            .ok_or_else(|| Error::Unauthorized("missing token".to_string()))?;
        state
            .tokens
            .get(&token)
            .copied()
            .ok_or_else(|| Error::Unauthorized("invalid token".to_string()))
    }
}

fn status_error(status: u16, message: &str) -> Error {
    match status {
        401 => Error::Unauthorized(message.to_string()),
        404 => Error::NotFound(message.to_string()),
        _ => Error::Api {
            status,
            message: message.to_string(),
        },
    }
}

impl StorefrontApi for InMemoryStorefront {
    fn set_token(&self, token: Option<&str>) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = token.map(str::to_string);
    }

    fn token(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn signup(&self, request: &SignupRequest) -> Result<()> {
        let mut state = self.state();
        self.begin(&mut state, "POST /users/signup")?;

        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(status_error(400, "email and password are required"));
        }
        if state.users.iter().any(|(u, _)| u.email == request.email) {
            return Err(status_error(409, "email already registered"));
        }

        state.next_user_id += 1;
        let mut user = User::new(state.next_user_id, request.email.clone());
        user.name = request.name.clone();
        state.users.push((user, request.password.clone()));
        Ok(())
    }

    fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
        let mut state = self.state();
        self.begin(&mut state, "POST /users/login")?;

        let user = state
            .users
            .iter()
            .find(|(u, password)| u.email == credentials.email && *password == credentials.password)
            .map(|(u, _)| u.clone())
            .ok_or_else(|| Error::Unauthorized("invalid credentials".to_string()))?;

        let token = Uuid::new_v4().to_string();
        state.tokens.insert(token.clone(), user.id);
        Ok(LoginResponse {
            token,
            user: Some(user),
        })
    }

    fn list_products(&self) -> Result<Vec<Product>> {
        let mut state = self.state();
        self.begin(&mut state, "GET /products")?;
        Ok(state.products.values().cloned().collect())
    }

    fn get_product(&self, product_id: i64) -> Result<Product> {
        let mut state = self.state();
        self.begin(&mut state, "GET /products/:id")?;
        state
            .products
            .get(&product_id)
            .cloned()
            .ok_or_else(|| Error::not_found("product not found"))
    }

    fn create_cart(&self) -> Result<Cart> {
        let mut state = self.state();
        let user_id = self.begin_authenticated(&mut state, "POST /carts")?;

        state.next_cart_id += 1;
        let cart = Cart {
            id: state.next_cart_id,
            user_id,
            created_at: Some(Utc::now()),
        };
        state.carts.insert(cart.id, (cart.clone(), Vec::new()));
        Ok(cart)
    }

    fn get_cart(&self, cart_id: i64) -> Result<CartDetails> {
        let mut state = self.state();
        self.begin_authenticated(&mut state, "GET /carts/:id")?;

        let (cart, lines) = state
            .carts
            .get(&cart_id)
            .ok_or_else(|| Error::not_found("cart not found"))?;

        let items = lines
            .iter()
            .filter_map(|(product_id, quantity)| {
                state.products.get(product_id).map(|p| CartItem {
                    cart_id,
                    product_id: *product_id,
                    product_name: p.name.clone(),
                    unit_price: p.price,
                    quantity: *quantity,
                })
            })
            .collect();

        Ok(CartDetails {
            cart: cart.clone(),
            items,
        })
    }

    fn add_item(&self, cart_id: i64, item: &AddItemRequest) -> Result<()> {
        let mut state = self.state();
        self.begin_authenticated(&mut state, "POST /carts/:id/items")?;

        if !state.products.contains_key(&item.product_id) {
            return Err(status_error(500, "failed to add item"));
        }
        let (_, lines) = state
            .carts
            .get_mut(&cart_id)
            .ok_or_else(|| status_error(500, "failed to add item"))?;

        match lines.iter_mut().find(|(p, _)| *p == item.product_id) {
            Some((_, quantity)) => *quantity += item.quantity,
            None => lines.push((item.product_id, item.quantity)),
        }
        Ok(())
    }

    fn remove_item(&self, cart_id: i64, product_id: i64) -> Result<()> {
        let mut state = self.state();
        self.begin_authenticated(&mut state, "DELETE /carts/:id/items/:productId")?;

        if let Some((_, lines)) = state.carts.get_mut(&cart_id) {
            lines.retain(|(p, _)| *p != product_id);
        }
        Ok(())
    }

    fn create_order(&self, cart_id: i64) -> Result<Order> {
        let mut state = self.state();
        let user_id = self.begin_authenticated(&mut state, "POST /orders")?;

        let lines = state
            .carts
            .get(&cart_id)
            .map(|(_, lines)| lines.clone())
            .unwrap_or_default();

        let items: Vec<OrderItem> = lines
            .iter()
            .filter_map(|(product_id, quantity)| {
                state.products.get(product_id).map(|p| OrderItem {
                    order_id: None,
                    product_id: *product_id,
                    product_name: p.name.clone(),
                    quantity: *quantity,
                    unit_price: p.price,
                })
            })
            .collect();

        if items.is_empty() {
            return Err(status_error(400, "cart is empty"));
        }

        let total_amount: Decimal = items
            .iter()
            .map(|i| i.unit_price * Decimal::from(i.quantity))
            .sum();

        state.next_order_id += 1;
        let order = Order {
            id: state.next_order_id,
            user_id,
            total_amount,
            status: "pending".to_string(),
            created_at: Utc::now(),
        };
        let items = items
            .into_iter()
            .map(|mut i| {
                i.order_id = Some(order.id);
                i
            })
            .collect();
        state.orders.insert(order.id, (order.clone(), items));

        if let Some((_, lines)) = state.carts.get_mut(&cart_id) {
            lines.clear();
        }
        Ok(order)
    }

    fn list_orders(&self) -> Result<Vec<Order>> {
        let mut state = self.state();
        let user_id = self.begin_authenticated(&mut state, "GET /orders")?;
        Ok(state
            .orders
            .values()
            .filter(|(o, _)| o.user_id == user_id)
            .map(|(o, _)| o.clone())
            .collect())
    }

    fn get_order(&self, order_id: i64) -> Result<OrderDetails> {
        let mut state = self.state();
        self.begin_authenticated(&mut state, "GET /orders/:id")?;
        state
            .orders
            .get(&order_id)
            .map(|(order, items)| OrderDetails {
                order: order.clone(),
                items: items.clone(),
            })
            .ok_or_else(|| Error::not_found("order not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storefront() -> InMemoryStorefront {
        let storefront = InMemoryStorefront::with_products([
            Product::new(1, "Mug", Decimal::new(1250, 2)),
            Product::new(2, "Tea", Decimal::new(325, 2)),
        ]);
        storefront.register_user("Ada", "ada@example.com", "secret");
        storefront
    }

    fn login(storefront: &InMemoryStorefront) {
        let resp = storefront
            .login(&Credentials {
                email: "ada@example.com".to_string(),
                password: "secret".to_string(),
            })
            .unwrap();
        storefront.set_token(Some(&resp.token));
    }

    #[test]
    fn test_cart_requires_token() {
        let storefront = storefront();
        assert!(matches!(storefront.create_cart(), Err(Error::Unauthorized(_))));

        storefront.set_token(Some("forged"));
        assert!(matches!(storefront.create_cart(), Err(Error::Unauthorized(_))));
    }

    #[test]
    fn test_add_item_accumulates_quantity() {
        let storefront = storefront();
        login(&storefront);
        let cart = storefront.create_cart().unwrap();

        let item = AddItemRequest { product_id: 1, quantity: 2 };
        storefront.add_item(cart.id, &item).unwrap();
        storefront.add_item(cart.id, &item).unwrap();

        let details = storefront.get_cart(cart.id).unwrap();
        assert_eq!(details.item(1).map(|i| i.quantity), Some(4));
    }

    #[test]
    fn test_order_empties_cart() {
        let storefront = storefront();
        login(&storefront);
        let cart = storefront.create_cart().unwrap();
        storefront
            .add_item(cart.id, &AddItemRequest { product_id: 2, quantity: 3 })
            .unwrap();

        let order = storefront.create_order(cart.id).unwrap();
        assert_eq!(order.total_amount, Decimal::new(975, 2));
        assert_eq!(order.status, "pending");
        assert!(storefront.get_cart(cart.id).unwrap().is_empty());

        let details = storefront.get_order(order.id).unwrap();
        assert_eq!(details.items.len(), 1);
        assert_eq!(details.items[0].order_id, Some(order.id));

        assert!(matches!(
            storefront.create_order(cart.id),
            Err(Error::Api { status: 400, .. })
        ));
    }

    #[test]
    fn test_injected_failure_applies_once() {
        let storefront = storefront();
        storefront.fail_next("GET /products", 503);

        assert!(matches!(
            storefront.list_products(),
            Err(Error::Api { status: 503, .. })
        ));
        assert_eq!(storefront.list_products().unwrap().len(), 2);
        assert_eq!(storefront.call_count("GET /products"), 2);
    }
}
