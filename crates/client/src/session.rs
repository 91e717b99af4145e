//! Explicit authentication state.
//!
//! A [`Session`] is created once and handed to the [`Gateway`] at
//! construction; every clone shares the same credential. The gateway reads
//! the token for each call and ends the session when the server answers 401.
//!
//! [`Gateway`]: crate::Gateway

use std::sync::Arc;

use api_types::auth::{AuthResponse, LoginRequest, RegisterRequest};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::{ClientError, Gateway};

/// Bearer token issued by login/register plus the profile it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
}

impl From<AuthResponse> for Credential {
    fn from(value: AuthResponse) -> Self {
        Self {
            token: value.token,
            name: value.name,
            email: value.email,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    state: Arc<watch::Sender<Option<Credential>>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Session {
    pub fn new(credential: Option<Credential>) -> Self {
        let (state, _) = watch::channel(credential);
        Self {
            state: Arc::new(state),
        }
    }

    pub fn credential(&self) -> Option<Credential> {
        self.state.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state
            .borrow()
            .as_ref()
            .map(|credential| credential.token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_some()
    }

    pub fn establish(&self, credential: Credential) {
        self.state.send_replace(Some(credential));
    }

    /// Drops the credential. Returns `true` if a session was active.
    pub fn invalidate(&self) -> bool {
        let previous = self.state.send_replace(None);
        if previous.is_some() {
            tracing::info!("session ended");
        }
        previous.is_some()
    }

    /// Observes credential changes, e.g. to persist or delete a stored token.
    pub fn subscribe(&self) -> watch::Receiver<Option<Credential>> {
        self.state.subscribe()
    }
}

/// Owner of the session lifecycle: login, register, validation and logout.
#[derive(Debug, Clone)]
pub struct SessionManager {
    gateway: Gateway,
}

impl SessionManager {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn session(&self) -> &Session {
        self.gateway.session()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Credential, ClientError> {
        let response = self
            .gateway
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        Ok(self.begin(response))
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Credential, ClientError> {
        let response = self
            .gateway
            .register(&RegisterRequest {
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        Ok(self.begin(response))
    }

    /// Checks the stored credential against the server, ending the session
    /// when it is not accepted.
    pub async fn validate(&self) -> bool {
        if !self.session().is_authenticated() {
            return false;
        }
        let valid = self.gateway.validate_session().await;
        if !valid {
            self.session().invalidate();
        }
        valid
    }

    pub fn logout(&self) {
        self.session().invalidate();
    }

    fn begin(&self, response: AuthResponse) -> Credential {
        let credential = Credential::from(response);
        tracing::info!(user = %credential.name, "session started");
        self.session().establish(credential.clone());
        credential
    }
}
