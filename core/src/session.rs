//! Session Manager: owns the bearer token and its lifecycle.
//!
//! # Design
//! The manager is the only writer of the `Session`. Register and login swap
//! in a fresh token on success; logout always ends anonymous, whatever the
//! server says. Request failures are converted into a held message plus an
//! `Err(ClientError)` and never escape as panics.

use tracing::{info, warn};

use crate::client::TodoClient;
use crate::error::{ApiError, ClientError};
use crate::http::HttpRequest;
use crate::store::TokenStore;
use crate::transport::Transport;
use crate::types::{LoginRequest, RegisterRequest, TokenResponse};

const REGISTER_FAILED: &str = "Registration failed";
const LOGIN_FAILED: &str = "Invalid credentials";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Anonymous,
    Authenticating,
    Authenticated,
}

/// The current credential. `Authenticated` always carries a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    status: SessionStatus,
}

impl Session {
    pub fn anonymous() -> Self {
        Self {
            token: None,
            status: SessionStatus::Anonymous,
        }
    }

    pub fn authenticated(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            status: SessionStatus::Authenticated,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::anonymous()
    }
}

pub struct SessionManager<T, S> {
    client: TodoClient,
    transport: T,
    store: S,
    session: Session,
    loading: bool,
    error: Option<String>,
}

impl<T: Transport, S: TokenStore> SessionManager<T, S> {
    /// Start a manager, picking up any token left in `store` by a previous run.
    ///
    /// A stored token is trusted as-is; it is not validated against the server.
    pub fn restore(client: TodoClient, transport: T, store: S) -> Self {
        let session = match store.load() {
            Ok(Some(token)) => Session::authenticated(token),
            Ok(None) => Session::anonymous(),
            Err(e) => {
                warn!("could not read stored token: {e}");
                Session::anonymous()
            }
        };
        Self {
            client,
            transport,
            store,
            session,
            loading: false,
            error: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Any stored token counts as logged in for routing purposes.
    pub fn is_logged_in(&self) -> bool {
        self.session.token.is_some()
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn register(&mut self, username: &str, email: &str, password: &str) -> Result<(), ClientError> {
        let input = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let request = self.client.build_register(&input);
        self.authenticate(request, REGISTER_FAILED)
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<(), ClientError> {
        let input = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let request = self.client.build_login(&input);
        self.authenticate(request, LOGIN_FAILED)
    }

    /// Revoke the token server-side if possible, then forget it locally.
    ///
    /// Local state is cleared even when the server call fails.
    pub fn logout(&mut self) {
        self.loading = true;
        let request = self.client.build_logout(&self.session);
        let outcome = self
            .transport
            .execute(request)
            .and_then(|response| self.client.parse_logout(response));
        if let Err(e) = outcome {
            warn!("server logout failed, clearing local session anyway: {e}");
        }

        if let Err(e) = self.store.clear() {
            warn!("could not clear stored token: {e}");
        }
        self.session = Session::anonymous();
        self.loading = false;
        info!("logged out");
    }

    fn authenticate(
        &mut self,
        request: Result<HttpRequest, ApiError>,
        fallback: &str,
    ) -> Result<(), ClientError> {
        self.error = None;
        self.loading = true;
        let previous = self.session.status;
        self.session.status = SessionStatus::Authenticating;

        let outcome = request
            .and_then(|req| self.transport.execute(req))
            .and_then(|response| self.client.parse_token(response));
        self.loading = false;

        match outcome {
            Ok(TokenResponse { token }) => {
                if let Err(e) = self.store.save(&token) {
                    warn!("could not persist token: {e}");
                }
                self.session = Session::authenticated(token);
                info!("session authenticated");
                Ok(())
            }
            Err(e) => {
                self.session.status = previous;
                let err = ClientError::from_api(&e, fallback);
                warn!("authentication failed: {e}");
                self.error = Some(err.message().to_string());
                Err(err)
            }
        }
    }
}
