//! Core domain entities
//!
//! Transient view models of the remote storefront. These are pure data
//! structures - no I/O or external dependencies.

mod cart;
mod navigation;
mod order;
mod product;
pub mod result;
mod user;

pub use cart::{AddItemRequest, Cart, CartDetails, CartItem};
pub use navigation::{Fetched, Outcome, Route};
pub use order::{CreateOrderRequest, Order, OrderDetails, OrderItem};
pub use product::Product;
pub use user::{Credentials, LoginResponse, Session, SignupRequest, User};
