//! Service layer - client-side state synchronization
//!
//! Services coordinate the ports. Each one backs a view of the storefront
//! and turns remote failures into inline messages or redirects.

mod cart;
mod catalog;
pub mod logging;
mod orders;
mod session;

pub use cart::{
    CartService, CartState, MSG_ADD_FAILED, MSG_CART_EMPTY, MSG_CHECKOUT_FAILED, MSG_INIT_FAILED,
    MSG_LOAD_FAILED, MSG_REMOVE_FAILED, MSG_UPDATE_FAILED,
};
pub use catalog::{CatalogService, MSG_PRODUCTS_FAILED, MSG_PRODUCT_NOT_FOUND};
pub use logging::{EventCount, LogEntry, LogEvent, LogQuery, LoggingService};
pub use orders::{OrderService, MSG_ORDERS_FAILED, MSG_ORDER_FAILED};
pub use session::{SessionService, MSG_LOGIN_FAILED, MSG_SIGNUP_FAILED};
