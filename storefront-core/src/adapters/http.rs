//! Storefront REST API client
//!
//! Blocking `reqwest` client for the storefront backend. Once a token is set
//! it is attached to every request as `Authorization: Bearer <token>`, the
//! way a default header would be.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use url::Url;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{
    AddItemRequest, Cart, CartDetails, CreateOrderRequest, Credentials, LoginResponse, Order,
    OrderDetails, Product, SignupRequest,
};
use crate::ports::StorefrontApi;

/// Header carrying a per-request correlation id
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Storefront API client over HTTP
#[derive(Debug)]
pub struct HttpStorefront {
    client: Client,
    base_url: Url,
    timeout: Duration,
    token: RwLock<Option<String>>,
}

impl HttpStorefront {
    /// Create a client for the API rooted at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut parsed = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid API base URL '{}': {}", base_url, e)))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(Error::Config(format!(
                "API base URL must use http or https, got '{}'",
                parsed.scheme()
            )));
        }

        // Url::join drops the last path segment unless it ends with a slash
        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: parsed,
            timeout,
            token: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::Config(format!("Invalid request path '{}': {}", path, e)))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.url(path)?;
        let request_id = Uuid::new_v4().to_string();
        tracing::debug!(%method, %url, %request_id, "storefront request");

        let mut builder = self
            .client
            .request(method, url)
            .header(REQUEST_ID_HEADER, request_id);

        if let Some(token) = self.token() {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().map_err(|e| self.map_request_error(e))?;
        self.check_response_status(response)
    }

    fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.send(builder)?;
        response
            .json::<T>()
            .map_err(|e| Error::Network(format!("Failed to parse storefront response: {}", e)))
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json(self.request(Method::GET, path)?)
    }

    fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.send_json(self.request(Method::POST, path)?.json(body))
    }

    /// POST whose response body is ignored (204 or an echo of the resource)
    fn post_discard<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        self.send(self.request(Method::POST, path)?.json(body))?;
        Ok(())
    }

    /// Map request errors to user-friendly messages
    fn map_request_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::Network(format!(
                "Connection timed out after {} seconds",
                self.timeout.as_secs()
            ))
        } else if error.is_connect() {
            Error::Network(format!("Unable to connect to the storefront at {}", self.base_url))
        } else {
            Error::Network(format!("Storefront request failed: {}", error))
        }
    }

    /// Check response status and return appropriate errors
    fn check_response_status(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = error_message(&response.text().unwrap_or_default());
        tracing::debug!(status = status.as_u16(), %message, "storefront request rejected");

        Err(match status {
            StatusCode::UNAUTHORIZED => Error::Unauthorized(message),
            StatusCode::NOT_FOUND => Error::NotFound(message),
            _ => Error::Api {
                status: status.as_u16(),
                message,
            },
        })
    }
}

/// Extract a message from an error body
///
/// Backends answer either with plain text or with `{"message": ...}` /
/// `{"error": ...}`.
fn error_message(body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(JsonValue::Object(map)) = serde_json::from_str::<JsonValue>(trimmed) {
        for key in ["message", "error"] {
            if let Some(JsonValue::String(msg)) = map.get(key) {
                return msg.clone();
            }
        }
    }
    trimmed.to_string()
}

impl StorefrontApi for HttpStorefront {
    fn set_token(&self, token: Option<&str>) {
        let mut guard = self.token.write().unwrap_or_else(PoisonError::into_inner);
        *guard = token.map(str::to_string);
    }

    fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn signup(&self, request: &SignupRequest) -> Result<()> {
        self.post_discard("users/signup", request)
    }

    fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
        self.post("users/login", credentials)
    }

    fn list_products(&self) -> Result<Vec<Product>> {
        let products: Option<Vec<Product>> = self.get("products")?;
        Ok(products.unwrap_or_default())
    }

    fn get_product(&self, product_id: i64) -> Result<Product> {
        self.get(&format!("products/{}", product_id))
    }

    fn create_cart(&self) -> Result<Cart> {
        self.post("carts", &serde_json::json!({}))
    }

    fn get_cart(&self, cart_id: i64) -> Result<CartDetails> {
        self.get(&format!("carts/{}", cart_id))
    }

    fn add_item(&self, cart_id: i64, item: &AddItemRequest) -> Result<()> {
        self.post_discard(&format!("carts/{}/items", cart_id), item)
    }

    fn remove_item(&self, cart_id: i64, product_id: i64) -> Result<()> {
        let path = format!("carts/{}/items/{}", cart_id, product_id);
        self.send(self.request(Method::DELETE, &path)?)?;
        Ok(())
    }

    fn create_order(&self, cart_id: i64) -> Result<Order> {
        self.post("orders", &CreateOrderRequest { cart_id })
    }

    fn list_orders(&self) -> Result<Vec<Order>> {
        let orders: Option<Vec<Order>> = self.get("orders")?;
        Ok(orders.unwrap_or_default())
    }

    fn get_order(&self, order_id: i64) -> Result<OrderDetails> {
        self.get(&format!("orders/{}", order_id))
    }
}
