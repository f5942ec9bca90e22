//! Order service - order history and order detail
//!
//! Orders are created by checkout; this service only reads them.

use std::sync::Arc;

use crate::domain::{Fetched, Order, OrderDetails};
use crate::ports::StorefrontApi;

pub const MSG_ORDERS_FAILED: &str = "Failed to load orders";
pub const MSG_ORDER_FAILED: &str = "Failed to load order";

pub struct OrderService {
    api: Arc<dyn StorefrontApi>,
}

impl OrderService {
    pub fn new(api: Arc<dyn StorefrontApi>) -> Self {
        Self { api }
    }

    pub fn list_orders(&self) -> Fetched<Vec<Order>> {
        match self.api.list_orders() {
            Ok(orders) => Fetched::Ready(orders),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load orders");
                Fetched::from_error(&e, MSG_ORDERS_FAILED)
            }
        }
    }

    pub fn get_order(&self, order_id: i64) -> Fetched<OrderDetails> {
        match self.api.get_order(order_id) {
            Ok(details) => Fetched::Ready(details),
            Err(e) => {
                tracing::warn!(order_id, error = %e, "failed to load order");
                Fetched::from_error(&e, MSG_ORDER_FAILED)
            }
        }
    }
}
