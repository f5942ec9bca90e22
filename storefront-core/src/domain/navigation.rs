//! Where the front-end should take the user after an action

use serde::Serialize;

use super::result::Error;

/// A screen of the storefront
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "view", content = "id", rename_all = "snake_case")]
pub enum Route {
    Home,
    Login,
    Signup,
    Products,
    ProductDetail(i64),
    Cart,
    Orders,
    OrderDetail(i64),
}

/// What happened to a user action
///
/// Remote failures never escape a service as errors; they end up here as
/// either a generic message or a redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum Outcome {
    /// Local state was updated; stay on the current view
    Updated,
    /// Take the user to another view
    Navigate(Route),
    /// Show an inline error message
    Failed(String),
}

impl Outcome {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn route(&self) -> Option<Route> {
        match self {
            Self::Navigate(route) => Some(*route),
            _ => None,
        }
    }

    /// Convert a remote failure: a 401 sends the user to login, anything
    /// else becomes the generic `message`
    pub fn from_error(error: &Error, message: &str) -> Self {
        if error.is_unauthorized() {
            Self::Navigate(Route::Login)
        } else {
            Self::failed(message)
        }
    }
}

/// Result of a read-only fetch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum Fetched<T> {
    Ready(T),
    Navigate(Route),
    Failed(String),
}

impl<T> Fetched<T> {
    /// Same conversion as `Outcome::from_error`
    pub fn from_error(error: &Error, message: &str) -> Self {
        if error.is_unauthorized() {
            Self::Navigate(Route::Login)
        } else {
            Self::Failed(message.to_string())
        }
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Self::Ready(value) => Fetched::Ready(f(value)),
            Self::Navigate(route) => Fetched::Navigate(route),
            Self::Failed(message) => Fetched::Failed(message),
        }
    }
}
