//! Storefront API port - the remote REST service
//!
//! Every method is one round-trip. Implementations map HTTP 401 to
//! `Error::Unauthorized` and 404 to `Error::NotFound` so services can react
//! to them without knowing about HTTP.

use crate::domain::result::Result;
use crate::domain::{
    AddItemRequest, Cart, CartDetails, Credentials, LoginResponse, Order, OrderDetails, Product,
    SignupRequest,
};

/// Remote storefront abstraction
pub trait StorefrontApi: Send + Sync {
    /// Set or clear the bearer token attached to subsequent requests
    fn set_token(&self, token: Option<&str>);

    /// The bearer token currently attached to requests
    fn token(&self) -> Option<String>;

    // === Users ===

    /// `POST /users/signup`
    fn signup(&self, request: &SignupRequest) -> Result<()>;

    /// `POST /users/login`
    fn login(&self, credentials: &Credentials) -> Result<LoginResponse>;

    // === Catalog ===

    /// `GET /products`
    fn list_products(&self) -> Result<Vec<Product>>;

    /// `GET /products/:id`
    fn get_product(&self, product_id: i64) -> Result<Product>;

    // === Carts ===

    /// `POST /carts`
    fn create_cart(&self) -> Result<Cart>;

    /// `GET /carts/:id`
    fn get_cart(&self, cart_id: i64) -> Result<CartDetails>;

    /// `POST /carts/:id/items` - the server adds to any existing quantity
    fn add_item(&self, cart_id: i64, item: &AddItemRequest) -> Result<()>;

    /// `DELETE /carts/:id/items/:productId`
    fn remove_item(&self, cart_id: i64, product_id: i64) -> Result<()>;

    // === Orders ===

    /// `POST /orders` - turns the cart into an order and empties it
    fn create_order(&self, cart_id: i64) -> Result<Order>;

    /// `GET /orders`
    fn list_orders(&self) -> Result<Vec<Order>>;

    /// `GET /orders/:id`
    fn get_order(&self, order_id: i64) -> Result<OrderDetails>;
}
