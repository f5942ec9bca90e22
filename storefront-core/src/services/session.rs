//! Session service - login, logout and the persisted credential

use std::sync::Arc;

use crate::domain::result::Result;
use crate::domain::{Credentials, Outcome, Route, Session, SignupRequest, User};
use crate::ports::{keys, LocalStore, StorefrontApi};

pub const MSG_LOGIN_FAILED: &str = "Login failed";
pub const MSG_SIGNUP_FAILED: &str = "Signup failed";

/// Holds the credential token and user profile
///
/// The token and profile are cached in the local store so a session
/// survives restarts; `restore` re-hydrates them and re-attaches the
/// bearer header.
pub struct SessionService {
    api: Arc<dyn StorefrontApi>,
    store: Arc<dyn LocalStore>,
    session: Option<Session>,
}

impl SessionService {
    pub fn new(api: Arc<dyn StorefrontApi>, store: Arc<dyn LocalStore>) -> Self {
        Self {
            api,
            store,
            session: None,
        }
    }

    /// Re-hydrate the session from the local store
    ///
    /// A profile that is not valid JSON is discarded together with the
    /// token. Returns whether a session was restored.
    pub fn restore(&mut self) -> Result<bool> {
        let Some(token) = self.store.get(keys::TOKEN)? else {
            self.session = None;
            self.api.set_token(None);
            return Ok(false);
        };

        let user = match self.store.get(keys::USER)? {
            Some(json) => match serde_json::from_str::<User>(&json) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding malformed cached profile");
                    self.store.remove(keys::USER)?;
                    self.store.remove(keys::TOKEN)?;
                    self.session = None;
                    self.api.set_token(None);
                    return Ok(false);
                }
            },
            None => None,
        };

        self.api.set_token(Some(&token));
        self.session = Some(Session { token, user });
        Ok(true)
    }

    /// Log in and persist the credential
    ///
    /// Any remote failure becomes the generic "Login failed" message.
    pub fn login(&mut self, email: &str, password: &str) -> Result<Outcome> {
        let credentials = Credentials {
            email: email.trim().to_string(),
            password: password.to_string(),
        };

        let response = match self.api.login(&credentials) {
            Ok(response) => response,
            Err(e) => {
                tracing::info!(error = %e, "login rejected");
                return Ok(Outcome::failed(MSG_LOGIN_FAILED));
            }
        };

        self.store.set(keys::TOKEN, &response.token)?;
        match &response.user {
            Some(user) => self.store.set(keys::USER, &serde_json::to_string(user)?)?,
            None => self.store.remove(keys::USER)?,
        }

        self.api.set_token(Some(&response.token));
        self.session = Some(Session {
            token: response.token,
            user: response.user,
        });

        Ok(Outcome::Navigate(Route::Home))
    }

    /// Clear the credential, the cached profile and the cached cart
    pub fn logout(&mut self) -> Result<Outcome> {
        self.store.remove(keys::TOKEN)?;
        self.store.remove(keys::USER)?;
        self.store.remove(keys::CART_ID)?;
        self.api.set_token(None);
        self.session = None;
        Ok(Outcome::Navigate(Route::Login))
    }

    /// Create an account; on success the user is sent to login
    pub fn signup(&self, name: Option<&str>, email: &str, password: &str) -> Outcome {
        let request = SignupRequest {
            name: name.map(str::trim).filter(|n| !n.is_empty()).map(str::to_string),
            email: email.trim().to_string(),
            password: password.to_string(),
        };

        match self.api.signup(&request) {
            Ok(()) => Outcome::Navigate(Route::Login),
            Err(e) => {
                tracing::info!(error = %e, "signup rejected");
                Outcome::failed(e.server_message().unwrap_or(MSG_SIGNUP_FAILED))
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.session.as_ref().and_then(|s| s.user.as_ref())
    }
}
