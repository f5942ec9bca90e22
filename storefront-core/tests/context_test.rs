//! Session persistence across contexts sharing one shop directory
//!
//! Run with: cargo test --test context_test -- --nocapture

mod support;

use std::sync::Arc;
use std::thread;

use tempfile::TempDir;

use storefront_core::adapters::file_store::STORAGE_FILENAME;
use storefront_core::adapters::{FileStore, InMemoryStorefront};
use storefront_core::config::Config;
use storefront_core::ports::{keys, LocalStore, StorefrontApi};
use storefront_core::{Outcome, Route, StorefrontContext};

use support::MockStorefrontServer;

fn save_config(dir: &TempDir, server: &MockStorefrontServer) {
    Config {
        api_base_url: server.base_url(),
        timeout_secs: 5,
    }
    .save(dir.path())
    .unwrap();
}

fn read_storage(dir: &TempDir) -> serde_json::Value {
    let content = std::fs::read_to_string(dir.path().join(STORAGE_FILENAME)).unwrap();
    serde_json::from_str(&content).unwrap()
}

#[test]
fn test_session_survives_restart() {
    let server = MockStorefrontServer::start().unwrap();
    server
        .backend()
        .register_user("Ada", "ada@example.com", "secret");
    let dir = TempDir::new().unwrap();
    save_config(&dir, &server);

    {
        let mut ctx = StorefrontContext::new(dir.path()).unwrap();
        assert!(!ctx.session_service.is_authenticated());
        ctx.session_service
            .login("ada@example.com", "secret")
            .unwrap();
        ctx.cart_service.add_item(2, 1).unwrap();
    }

    let storage = read_storage(&dir);
    assert!(storage[keys::TOKEN].is_string());
    assert!(storage[keys::CART_ID].is_string());

    let mut ctx = StorefrontContext::new(dir.path()).unwrap();
    assert!(ctx.session_service.is_authenticated());
    assert_eq!(
        ctx.api.token().as_deref(),
        storage[keys::TOKEN].as_str()
    );

    // Restored token and cached cart id are used without creating a new cart
    assert_eq!(ctx.cart_service.refresh(false).unwrap(), Outcome::Updated);
    let details = ctx.cart_service.state().details.clone().unwrap();
    assert_eq!(details.item(2).map(|i| i.quantity), Some(1));
    assert_eq!(server.backend().cart_count(), 1);
}

#[test]
fn test_logout_clears_persisted_keys() {
    let server = MockStorefrontServer::start().unwrap();
    server
        .backend()
        .register_user("Ada", "ada@example.com", "secret");
    let dir = TempDir::new().unwrap();
    save_config(&dir, &server);

    let mut ctx = StorefrontContext::new(dir.path()).unwrap();
    ctx.session_service
        .login("ada@example.com", "secret")
        .unwrap();
    ctx.cart_service.add_item(1, 2).unwrap();
    ctx.store.set("theme", "dark").unwrap();

    assert_eq!(ctx.logout().unwrap(), Outcome::Navigate(Route::Login));
    assert!(ctx.cart_service.state().details.is_none());

    let storage = read_storage(&dir);
    assert!(storage.get(keys::TOKEN).is_none());
    assert!(storage.get(keys::USER).is_none());
    assert!(storage.get(keys::CART_ID).is_none());
    assert_eq!(storage["theme"], "dark");

    let ctx = StorefrontContext::new(dir.path()).unwrap();
    assert!(!ctx.session_service.is_authenticated());
    assert!(ctx.api.token().is_none());
}

#[test]
fn test_malformed_profile_is_discarded_on_startup() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path());
    store.set(keys::TOKEN, "stale").unwrap();
    store.set(keys::USER, "{broken").unwrap();

    let api = Arc::new(InMemoryStorefront::new());
    let ctx = StorefrontContext::with_adapters(
        Config::default(),
        api.clone(),
        Arc::new(FileStore::new(dir.path())),
    )
    .unwrap();

    assert!(!ctx.session_service.is_authenticated());
    assert!(api.token().is_none());
    assert!(store.get(keys::TOKEN).unwrap().is_none());
    assert!(store.get(keys::USER).unwrap().is_none());
}

#[test]
fn test_concurrent_writers_keep_every_key() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().to_path_buf();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let path = path.clone();
            thread::spawn(move || {
                let store = FileStore::new(&path);
                store.set(&format!("key{}", i), &i.to_string()).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let store = FileStore::new(&path);
    for i in 0..8 {
        assert_eq!(
            store.get(&format!("key{}", i)).unwrap(),
            Some(i.to_string())
        );
    }
}
