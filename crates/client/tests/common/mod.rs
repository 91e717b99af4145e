#![allow(dead_code)]

use std::{
    collections::VecDeque,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use client::{DEFAULT_TIMEOUT, Gateway, Session};
use serde_json::{Value, json};
use uuid::Uuid;

pub const EMAIL: &str = "ana@example.com";
pub const PASSWORD: &str = "secret";

/// In-memory stand-in for the remote API.
///
/// Records are stored the way the legacy backend returns them: PascalCase
/// keys and textual enum labels.
#[derive(Debug, Default)]
pub struct Backend {
    pub token: Option<String>,
    pub transactions: Vec<Value>,
    pub categories: Vec<Value>,
    pub accounts: Vec<Value>,
    pub list_delay: Duration,
    /// Per-call overrides for the transaction list, consumed in order.
    pub list_script: VecDeque<ListReply>,
    pub list_calls: usize,
    pub last_payload: Option<Value>,
    /// Answer creates and updates without a body (`201`/`204`).
    pub empty_mutation_replies: bool,
}

/// One scripted answer of the transaction list endpoint.
#[derive(Debug, Default)]
pub struct ListReply {
    pub delay: Duration,
    /// Served instead of the stored records when set.
    pub body: Option<Value>,
}

#[derive(Clone, Default)]
pub struct FakeApi {
    pub backend: Arc<Mutex<Backend>>,
}

impl FakeApi {
    pub fn with<R>(&self, f: impl FnOnce(&mut Backend) -> R) -> R {
        f(&mut self.backend.lock().unwrap())
    }

    /// Issues a token without going through login.
    pub fn authorize(&self) -> String {
        let token = Uuid::new_v4().to_string();
        self.with(|backend| backend.token = Some(token.clone()));
        token
    }

    pub fn revoke(&self) {
        self.with(|backend| backend.token = None);
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = self.with(|backend| backend.token.clone());
        let presented = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));
        matches!((expected, presented), (Some(expected), Some(presented)) if expected == presented)
    }
}

pub struct Harness {
    pub api: FakeApi,
    pub addr: SocketAddr,
}

impl Harness {
    pub async fn start() -> Self {
        let api = FakeApi::default();
        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/register", post(register))
            .route(
                "/api/transactions",
                get(list_transactions).post(create_transaction),
            )
            .route(
                "/api/transactions/{id}",
                put(update_transaction).delete(delete_transaction),
            )
            .route("/api/category", get(list_categories).post(create_category))
            .route("/api/account", get(list_accounts).post(create_account))
            .route("/api/Analyze/ask-ia", post(ask_assistant))
            .with_state(api.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { api, addr }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn gateway(&self, session: Session) -> Gateway {
        self.gateway_with_timeout(session, DEFAULT_TIMEOUT)
    }

    pub fn gateway_with_timeout(&self, session: Session, timeout: Duration) -> Gateway {
        Gateway::new(&self.base_url(), timeout, session).unwrap()
    }

    /// A gateway whose session already holds a valid token.
    pub fn signed_in_gateway(&self) -> Gateway {
        let token = self.api.authorize();
        let session = Session::new(Some(client::Credential {
            token,
            name: "Ana".to_string(),
            email: EMAIL.to_string(),
        }));
        self.gateway(session)
    }
}

pub fn legacy_record(id: &str, date: &str, kind: &str, amount: f64, category: &str) -> Value {
    json!({
        "Id": id,
        "Date": date,
        "Description": format!("record {id}"),
        "CategoryName": category,
        "Type": kind,
        "Amount": amount,
        "Status": "Paid",
        "IsRecurring": false,
        "Notes": null,
    })
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn unauthorized() -> Response {
    error(StatusCode::UNAUTHORIZED, "Invalid or expired token")
}

fn session_body(token: String, name: &str, email: &str) -> Response {
    Json(json!({ "token": token, "name": name, "email": email })).into_response()
}

async fn login(State(api): State<FakeApi>, Json(body): Json<Value>) -> Response {
    if body["email"] != EMAIL || body["password"] != PASSWORD {
        return error(StatusCode::UNAUTHORIZED, "Invalid email or password");
    }
    session_body(api.authorize(), "Ana", EMAIL)
}

async fn register(State(api): State<FakeApi>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    if email == EMAIL {
        return error(StatusCode::CONFLICT, "Email already registered");
    }
    let name = body["name"].as_str().unwrap_or_default().to_string();
    session_body(api.authorize(), &name, &email)
}

async fn list_transactions(State(api): State<FakeApi>, headers: HeaderMap) -> Response {
    if !api.authorized(&headers) {
        return unauthorized();
    }
    let reply = api.with(|backend| {
        backend.list_calls += 1;
        backend.list_script.pop_front().unwrap_or(ListReply {
            delay: backend.list_delay,
            body: None,
        })
    });
    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }
    let body = reply
        .body
        .unwrap_or_else(|| api.with(|backend| Value::from(backend.transactions.clone())));
    Json(body).into_response()
}

fn record_from_payload(backend: &Backend, id: &str, body: &Value) -> Result<Value, Response> {
    let amount = body["amount"].as_f64().unwrap_or_default();
    if amount <= 0.0 {
        return Err(error(StatusCode::BAD_REQUEST, "Amount must be positive"));
    }
    let category_id = body["categoryId"].as_str().unwrap_or_default();
    let category = backend
        .categories
        .iter()
        .find(|category| category["id"] == category_id)
        .and_then(|category| category["categoryName"].as_str())
        .unwrap_or(category_id)
        .to_string();
    let kind = if body["type"] == 0 { "Entrada" } else { "Saída" };
    let status = if body["status"] == 0 { "Paid" } else { "Pending" };

    Ok(json!({
        "Id": id,
        "Date": body["date"],
        "Description": body["description"],
        "CategoryName": category,
        "Type": kind,
        "Amount": amount,
        "Status": status,
        "IsRecurring": body["isRecurring"],
        "Notes": body["notes"],
    }))
}

async fn create_transaction(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !api.authorized(&headers) {
        return unauthorized();
    }
    api.with(|backend| {
        backend.last_payload = Some(body.clone());
        let id = Uuid::new_v4().to_string();
        match record_from_payload(backend, &id, &body) {
            Ok(record) => {
                backend.transactions.push(record.clone());
                if backend.empty_mutation_replies {
                    return StatusCode::CREATED.into_response();
                }
                (StatusCode::CREATED, Json(record)).into_response()
            }
            Err(response) => response,
        }
    })
}

async fn update_transaction(
    State(api): State<FakeApi>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !api.authorized(&headers) {
        return unauthorized();
    }
    api.with(|backend| {
        backend.last_payload = Some(body.clone());
        let Some(position) = backend
            .transactions
            .iter()
            .position(|record| record["Id"] == id.as_str())
        else {
            return error(StatusCode::NOT_FOUND, "Transaction not found");
        };
        match record_from_payload(backend, &id, &body) {
            Ok(record) => {
                backend.transactions[position] = record.clone();
                if backend.empty_mutation_replies {
                    return StatusCode::NO_CONTENT.into_response();
                }
                Json(record).into_response()
            }
            Err(response) => response,
        }
    })
}

async fn delete_transaction(
    State(api): State<FakeApi>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !api.authorized(&headers) {
        return unauthorized();
    }
    api.with(|backend| {
        let before = backend.transactions.len();
        backend
            .transactions
            .retain(|record| record["Id"] != id.as_str());
        if backend.transactions.len() == before {
            error(StatusCode::NOT_FOUND, "Transaction not found")
        } else {
            StatusCode::NO_CONTENT.into_response()
        }
    })
}

async fn list_categories(State(api): State<FakeApi>, headers: HeaderMap) -> Response {
    if !api.authorized(&headers) {
        return unauthorized();
    }
    Json(api.with(|backend| backend.categories.clone())).into_response()
}

async fn create_category(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !api.authorized(&headers) {
        return unauthorized();
    }
    let name = body["categoryName"].as_str().unwrap_or_default().to_string();
    api.with(|backend| {
        if backend
            .categories
            .iter()
            .any(|category| category["categoryName"] == name.as_str())
        {
            return error(StatusCode::CONFLICT, "Category already exists");
        }
        let id = Uuid::new_v4().to_string();
        backend
            .categories
            .push(json!({ "id": id, "categoryName": name, "totalSpent": 0.0 }));
        (StatusCode::CREATED, Json(json!(id))).into_response()
    })
}

async fn list_accounts(State(api): State<FakeApi>, headers: HeaderMap) -> Response {
    if !api.authorized(&headers) {
        return unauthorized();
    }
    Json(api.with(|backend| backend.accounts.clone())).into_response()
}

async fn create_account(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !api.authorized(&headers) {
        return unauthorized();
    }
    api.with(|backend| {
        let id = Uuid::new_v4().to_string();
        backend.accounts.push(json!({
            "id": id,
            "name": body["name"],
            "InitialBalance": body["initialBalance"],
            "type": body["type"],
        }));
        // Plain-text id, as some deployments answer.
        (StatusCode::CREATED, id).into_response()
    })
}

async fn ask_assistant(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !api.authorized(&headers) {
        return unauthorized();
    }
    api.with(|backend| backend.last_payload = Some(body.clone()));
    let Some(question) = body.as_str().filter(|question| !question.is_empty()) else {
        return error(StatusCode::BAD_REQUEST, "Pergunta inválida");
    };
    Json(json!({ "resposta": format!("Sobre \"{question}\": reduza gastos com lazer.") }))
        .into_response()
}
