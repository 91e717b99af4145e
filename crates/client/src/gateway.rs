use std::time::Duration;

use api_types::{
    ErrorResponse,
    account::{Account, NewAccount},
    auth::{AuthResponse, LoginRequest, RegisterRequest},
    category::{Category, NewCategory},
    transaction::TransactionFormData,
};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{ClientError, Session};

/// Default bound for every request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Typed access to the remote API.
///
/// Holds no state besides the shared [`Session`]: the bearer token is read
/// for every authenticated call and the session is invalidated when the
/// server answers 401.
#[derive(Debug, Clone)]
pub struct Gateway {
    base_url: Url,
    http: reqwest::Client,
    session: Session,
}

impl Gateway {
    /// `base_url` points at the API root, e.g. `http://localhost:5091/api`.
    pub fn new(base_url: &str, timeout: Duration, session: Session) -> Result<Self, ClientError> {
        let base_url =
            Url::parse(base_url).map_err(|err| ClientError::InvalidUrl(err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(format!("{base_url} cannot hold a path")));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(ClientError::Transport)?;

        Ok(Self {
            base_url,
            http,
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Appends `segments` to the API root, percent-encoding each one so an
    /// id can never escape its path segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let url = self.url(segments);
        tracing::debug!(%method, path = url.path(), "api request");
        self.http.request(method, url)
    }

    /// Sends a request, returning the response only for 2xx statuses.
    async fn dispatch(
        &self,
        request: RequestBuilder,
        authenticated: bool,
    ) -> Result<Response, ClientError> {
        let request = if authenticated {
            let token = self.session.token().ok_or(ClientError::NotAuthenticated)?;
            request.bearer_auth(token)
        } else {
            request
        };

        let res = request.send().await.map_err(ClientError::from_transport)?;
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let message = res.json::<ErrorResponse>().await.map(|err| err.error).ok();
        tracing::warn!(%status, message = message.as_deref().unwrap_or(""), "api call failed");

        if status.as_u16() == 401 && authenticated {
            self.session.invalidate();
        }
        Err(ClientError::from_status(status, message))
    }

    async fn json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        authenticated: bool,
    ) -> Result<T, ClientError> {
        self.dispatch(request, authenticated)
            .await?
            .json::<T>()
            .await
            .map_err(ClientError::from_transport)
    }

    async fn text(&self, request: RequestBuilder) -> Result<String, ClientError> {
        self.dispatch(request, true)
            .await?
            .text()
            .await
            .map_err(ClientError::from_transport)
    }

    /// Mutation replies may carry the record, something else, or nothing at
    /// all (`204 No Content`). Anything that is not JSON becomes `Null`.
    async fn reply(&self, request: RequestBuilder) -> Result<Value, ClientError> {
        let body = self.text(request).await?;
        Ok(serde_json::from_str(&body).unwrap_or(Value::Null))
    }

    /// Create endpoints answer with the new id, either as a JSON string or
    /// as plain text.
    async fn created_id(&self, request: RequestBuilder) -> Result<String, ClientError> {
        let body = self.text(request).await?;
        let id = match serde_json::from_str::<Value>(&body) {
            Ok(Value::String(id)) => id,
            Ok(Value::Number(id)) => id.to_string(),
            _ => body.trim().to_string(),
        };
        if id.is_empty() {
            return Err(ClientError::Decode("empty id in create response".to_string()));
        }
        Ok(id)
    }

    pub async fn login(&self, payload: &LoginRequest) -> Result<AuthResponse, ClientError> {
        self.json(self.request(Method::POST, &["auth", "login"]).json(payload), false)
            .await
    }

    pub async fn register(&self, payload: &RegisterRequest) -> Result<AuthResponse, ClientError> {
        self.json(self.request(Method::POST, &["auth", "register"]).json(payload), false)
            .await
    }

    /// Raw records; see [`engine::canonical`] for normalization.
    pub async fn list_transactions(&self) -> Result<Vec<Value>, ClientError> {
        self.json(self.request(Method::GET, &["transactions"]), true)
            .await
    }

    pub async fn create_transaction(
        &self,
        payload: &TransactionFormData,
    ) -> Result<Value, ClientError> {
        self.reply(self.request(Method::POST, &["transactions"]).json(payload))
            .await
    }

    pub async fn update_transaction(
        &self,
        id: &str,
        payload: &TransactionFormData,
    ) -> Result<Value, ClientError> {
        let request = self
            .request(Method::PUT, &["transactions", id])
            .json(payload);
        self.reply(request).await
    }

    pub async fn delete_transaction(&self, id: &str) -> Result<(), ClientError> {
        self.dispatch(self.request(Method::DELETE, &["transactions", id]), true)
            .await
            .map(|_| ())
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, ClientError> {
        self.json(self.request(Method::GET, &["category"]), true).await
    }

    pub async fn create_category(&self, payload: &NewCategory) -> Result<String, ClientError> {
        self.created_id(self.request(Method::POST, &["category"]).json(payload))
            .await
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>, ClientError> {
        self.json(self.request(Method::GET, &["account"]), true).await
    }

    pub async fn create_account(&self, payload: &NewAccount) -> Result<String, ClientError> {
        self.created_id(self.request(Method::POST, &["account"]).json(payload))
            .await
    }

    /// Sends a free-form question to the assistant and returns its answer.
    pub async fn ask_ai(&self, question: &str) -> Result<String, ClientError> {
        let body = self
            .text(self.request(Method::POST, &["Analyze", "ask-ia"]).json(question))
            .await?;
        answer_text(&body)
            .ok_or_else(|| ClientError::Decode("assistant reply has no answer".to_string()))
    }

    /// The API has no dedicated endpoint; an authenticated listing that
    /// succeeds means the token is still accepted.
    pub async fn validate_session(&self) -> bool {
        match self
            .dispatch(self.request(Method::GET, &["transactions"]), true)
            .await
        {
            Ok(_) => true,
            Err(err) => {
                tracing::debug!("session validation failed: {err}");
                false
            }
        }
    }
}

/// The assistant answers `{"resposta": "..."}`; older deployments send a
/// bare JSON string or plain text.
fn answer_text(body: &str) -> Option<String> {
    let answer = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(fields)) => ["resposta", "answer", "response"]
            .iter()
            .find_map(|key| fields.get(*key).and_then(Value::as_str))
            .map(str::to_string)?,
        Ok(Value::String(answer)) => answer,
        Ok(_) => return None,
        Err(_) => body.trim().to_string(),
    };
    (!answer.trim().is_empty()).then_some(answer)
}
