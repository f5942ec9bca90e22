//! Mock storefront HTTP server for integration tests
//!
//! Serves the storefront REST routes over a real socket, backed by an
//! `InMemoryStorefront`. Responses mirror the backend's wire format:
//! login answers with only `{"token": ...}`, empty lists come back as
//! `null` and errors are plain text.

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};

use storefront_core::adapters::InMemoryStorefront;
use storefront_core::domain::{AddItemRequest, Credentials, Product, SignupRequest};
use storefront_core::ports::StorefrontApi;
use storefront_core::Error;

/// A request as seen by the mock server
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub request_id: Option<String>,
}

pub struct MockStorefrontServer {
    port: u16,
    backend: Arc<InMemoryStorefront>,
    requests: Arc<Mutex<Vec<ReceivedRequest>>>,
    running: Arc<AtomicBool>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl MockStorefrontServer {
    /// Start on a random port with the default catalog
    pub fn start() -> std::io::Result<Self> {
        Self::start_with(InMemoryStorefront::with_products(catalog()))
    }

    pub fn start_with(backend: InMemoryStorefront) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        listener.set_nonblocking(true)?;

        let backend = Arc::new(backend);
        let requests = Arc::new(Mutex::new(Vec::new()));
        let running = Arc::new(AtomicBool::new(true));

        let thread_handle = {
            let backend = Arc::clone(&backend);
            let requests = Arc::clone(&requests);
            let running = Arc::clone(&running);
            thread::spawn(move || {
                while running.load(Ordering::SeqCst) {
                    match listener.accept() {
                        // Serial handling: the backend's token slot is per request
                        Ok((stream, _)) => handle_connection(stream, &backend, &requests),
                        Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                            thread::sleep(Duration::from_millis(5));
                        }
                        Err(_) => break,
                    }
                }
            })
        };

        Ok(Self {
            port,
            backend,
            requests,
            running,
            thread_handle: Some(thread_handle),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn backend(&self) -> &InMemoryStorefront {
        &self.backend
    }

    pub fn requests(&self) -> Vec<ReceivedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> ReceivedRequest {
        self.requests().pop().expect("no request received")
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockStorefrontServer {
    fn drop(&mut self) {
        self.stop();
    }
}

pub fn catalog() -> Vec<Product> {
    vec![
        Product::new(1, "Keyboard", Decimal::new(4999, 2)).with_description("Mechanical, tenkeyless"),
        Product::new(2, "Mouse", Decimal::new(1950, 2)),
        Product::new(3, "Monitor", Decimal::new(18900, 2)),
    ]
}

fn handle_connection(
    stream: TcpStream,
    backend: &InMemoryStorefront,
    requests: &Mutex<Vec<ReceivedRequest>>,
) {
    let _ = stream.set_nonblocking(false);
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let mut reader = BufReader::new(match stream.try_clone() {
        Ok(s) => s,
        Err(_) => return,
    });
    let mut stream = stream;

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("").to_string();
    let path = parts.next().unwrap_or("").to_string();

    let mut authorization = None;
    let mut request_id = None;
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let value = value.trim().to_string();
            match name.trim().to_ascii_lowercase().as_str() {
                "authorization" => authorization = Some(value),
                "x-request-id" => request_id = Some(value),
                "content-length" => content_length = value.parse().unwrap_or(0),
                _ => {}
            }
        }
    }

    let mut body = vec![0u8; content_length];
    if reader.read_exact(&mut body).is_err() {
        return;
    }

    requests.lock().unwrap().push(ReceivedRequest {
        method: method.clone(),
        path: path.clone(),
        authorization: authorization.clone(),
        request_id,
    });

    let token = authorization
        .as_deref()
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim);
    backend.set_token(token);

    let (status, body) = match route(backend, &method, &path, &body) {
        Ok((status, value)) => (status, value.map(|v| v.to_string()).unwrap_or_default()),
        Err(e) => error_response(&e),
    };
    send_response(&mut stream, status, &body);
}

type Reply = std::result::Result<(u16, Option<Value>), Error>;

fn route(backend: &InMemoryStorefront, method: &str, path: &str, body: &[u8]) -> Reply {
    let path = path.split('?').next().unwrap_or(path);
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    match (method, segments.as_slice()) {
        ("POST", ["users", "signup"]) => {
            let request: SignupRequest = parse_body(body)?;
            backend.signup(&request)?;
            Ok((201, Some(json!({ "message": "user created" }))))
        }
        ("POST", ["users", "login"]) => {
            let credentials: Credentials = parse_body(body)?;
            let response = backend.login(&credentials)?;
            Ok((200, Some(json!({ "token": response.token }))))
        }
        ("GET", ["products"]) => ok_list(backend.list_products()?),
        ("GET", ["products", id]) => ok(200, &backend.get_product(parse_id(id)?)?),
        ("POST", ["carts"]) => ok(201, &backend.create_cart()?),
        ("GET", ["carts", id]) => {
            let details = backend.get_cart(parse_id(id)?)?;
            let mut value = to_value(&details)?;
            if details.items.is_empty() {
                value["items"] = Value::Null;
            }
            Ok((200, Some(value)))
        }
        ("POST", ["carts", id, "items"]) => {
            let item: AddItemRequest = parse_body(body)?;
            backend.add_item(parse_id(id)?, &item)?;
            Ok((201, None))
        }
        ("DELETE", ["carts", id, "items", product_id]) => {
            backend.remove_item(parse_id(id)?, parse_id(product_id)?)?;
            Ok((204, None))
        }
        ("POST", ["orders"]) => {
            let request: Value = parse_body(body)?;
            let cart_id = request["cart_id"]
                .as_i64()
                .ok_or_else(|| bad_request("cart_id is required"))?;
            ok(201, &backend.create_order(cart_id)?)
        }
        ("GET", ["orders"]) => ok_list(backend.list_orders()?),
        ("GET", ["orders", id]) => ok(200, &backend.get_order(parse_id(id)?)?),
        _ => Err(Error::NotFound("404 page not found".to_string())),
    }
}

fn ok<T: Serialize>(status: u16, value: &T) -> Reply {
    Ok((status, Some(to_value(value)?)))
}

/// Empty lists are encoded as `null`
fn ok_list<T: Serialize>(items: Vec<T>) -> Reply {
    if items.is_empty() {
        return Ok((200, Some(Value::Null)));
    }
    ok(200, &items)
}

fn to_value<T: Serialize>(value: &T) -> std::result::Result<Value, Error> {
    Ok(serde_json::to_value(value)?)
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> std::result::Result<T, Error> {
    serde_json::from_slice(body).map_err(|_| bad_request("invalid request body"))
}

fn parse_id(raw: &str) -> std::result::Result<i64, Error> {
    raw.parse().map_err(|_| bad_request("invalid id"))
}

fn bad_request(message: &str) -> Error {
    Error::Api {
        status: 400,
        message: message.to_string(),
    }
}

fn error_response(error: &Error) -> (u16, String) {
    match error {
        Error::Unauthorized(msg) => (401, msg.clone()),
        Error::NotFound(msg) => (404, msg.clone()),
        Error::Api { status, message } => (*status, message.clone()),
        other => (500, other.to_string()),
    }
}

fn send_response(stream: &mut TcpStream, status: u16, body: &str) {
    let reason = match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        409 => "Conflict",
        _ => "Internal Server Error",
    };
    let content_type = if status < 300 {
        "application/json"
    } else {
        "text/plain; charset=utf-8"
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        content_type,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}
