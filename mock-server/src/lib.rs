use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct Credentials {
    pub shared_secret: String,
    pub user: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            shared_secret: "shared-secret".to_string(),
            user: "admin".to_string(),
            password: "admin-password".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub uid: i64,
    pub login: String,
    pub mail: String,
    pub enabled: bool,
    pub su: bool,
}

#[derive(Debug)]
pub struct Panel {
    credentials: Credentials,
    tokens: RwLock<HashSet<String>>,
    accounts: RwLock<BTreeMap<i64, Account>>,
    logins: AtomicUsize,
}

impl Panel {
    pub fn new(credentials: Credentials) -> Self {
        let accounts = [
            Account {
                uid: 2000,
                login: "admin".to_string(),
                mail: "admin@example.org".to_string(),
                enabled: true,
                su: true,
            },
            Account {
                uid: 2001,
                login: "alice".to_string(),
                mail: "alice@example.org".to_string(),
                enabled: true,
                su: false,
            },
        ];
        Self {
            credentials,
            tokens: RwLock::new(HashSet::new()),
            accounts: RwLock::new(accounts.into_iter().map(|a| (a.uid, a)).collect()),
            logins: AtomicUsize::new(0),
        }
    }

    /// Number of successful login handshakes served so far.
    pub fn login_count(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    async fn issue_token(&self) -> Value {
        let token = Uuid::new_v4().simple().to_string();
        self.tokens.write().await.insert(token.clone());
        self.logins.fetch_add(1, Ordering::SeqCst);
        json!({ "token": token })
    }
}

pub type Db = Arc<Panel>;

pub fn app() -> Router {
    app_with(Arc::new(Panel::new(Credentials::default())))
}

pub fn app_with(db: Db) -> Router {
    Router::new()
        .route("/api/auth/sharedsecret", get(auth_shared_secret).post(auth_shared_secret))
        .route("/api/auth/login", get(auth_login).post(auth_login))
        .route("/api/rest/{object}/{action}", get(rest_call).post(rest_call))
        .route("/api/post", get(post_call).post(post_call))
        .with_state(db)
}

pub async fn run(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(db)).await
}

type Reply = (StatusCode, Json<Value>);

/// Query string merged with the JSON body, body keys winning.
fn collect_params(query: &HashMap<String, String>, body: &Bytes) -> Result<Map<String, Value>, Reply> {
    let mut params: Map<String, Value> = query
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    if !body.is_empty() {
        let parsed: Map<String, Value> = serde_json::from_slice(body)
            .map_err(|e| error(StatusCode::BAD_REQUEST, 400, &format!("invalid body: {e}")))?;
        params.extend(parsed);
    }
    Ok(params)
}

fn error(status: StatusCode, code: i64, message: &str) -> Reply {
    (status, Json(json!({ "code": code, "message": message })))
}

fn content(content: Value) -> Reply {
    (StatusCode::OK, Json(json!({ "code": 0, "message": "", "content": content })))
}

fn str_param<'a>(params: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str)
}

fn int_param(params: &Map<String, Value>, key: &str) -> Option<i64> {
    match params.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

async fn auth_shared_secret(State(db): State<Db>, Query(query): Query<HashMap<String, String>>, body: Bytes) -> Reply {
    let params = match collect_params(&query, &body) {
        Ok(params) => params,
        Err(reply) => return reply,
    };
    let creds = &db.credentials;
    let secret_ok = str_param(&params, "secret") == Some(creds.shared_secret.as_str());
    let login_ok = str_param(&params, "login").is_none_or(|login| login == creds.user);
    if !(secret_ok && login_ok) {
        tracing::info!("shared secret login rejected");
        return error(StatusCode::UNAUTHORIZED, 401, "invalid shared secret");
    }
    tracing::info!("shared secret login accepted");
    (StatusCode::OK, Json(db.issue_token().await))
}

async fn auth_login(State(db): State<Db>, Query(query): Query<HashMap<String, String>>, body: Bytes) -> Reply {
    let params = match collect_params(&query, &body) {
        Ok(params) => params,
        Err(reply) => return reply,
    };
    let creds = &db.credentials;
    if str_param(&params, "user") != Some(creds.user.as_str())
        || str_param(&params, "password") != Some(creds.password.as_str())
    {
        tracing::info!("user login rejected");
        return error(StatusCode::UNAUTHORIZED, 401, "invalid user or password");
    }
    tracing::info!("user login accepted");
    (StatusCode::OK, Json(db.issue_token().await))
}

async fn rest_call(
    State(db): State<Db>,
    Path((object, action)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Reply {
    let params = match collect_params(&query, &body) {
        Ok(params) => params,
        Err(reply) => return reply,
    };
    dispatch(&db, &query, &object, &action, &params).await
}

async fn post_call(State(db): State<Db>, Query(query): Query<HashMap<String, String>>, body: Bytes) -> Reply {
    let params = match collect_params(&query, &body) {
        Ok(params) => params,
        Err(reply) => return reply,
    };
    let (Some(object), Some(action)) = (str_param(&params, "object"), str_param(&params, "action")) else {
        return error(StatusCode::BAD_REQUEST, 400, "missing object or action");
    };
    let (object, action) = (object.to_string(), action.to_string());
    dispatch(&db, &query, &object, &action, &params).await
}

/// The token is only honoured from the query string.
async fn dispatch(db: &Panel, query: &HashMap<String, String>, object: &str, action: &str, params: &Map<String, Value>) -> Reply {
    let authorized = match query.get("token") {
        Some(token) => db.tokens.read().await.contains(token),
        None => false,
    };
    if !authorized {
        tracing::info!(object, action, "rejected call without valid token");
        return error(StatusCode::OK, 403, "not authenticated");
    }
    tracing::info!(object, action, "object call");

    match (object, action) {
        ("account", "find") => {
            let accounts = db.accounts.read().await;
            let found: Vec<&Account> = accounts
                .values()
                .filter(|a| int_param(params, "uid").is_none_or(|uid| a.uid == uid))
                .filter(|a| str_param(params, "login").is_none_or(|login| a.login == login))
                .collect();
            content(json!(found))
        }
        ("account", "lock" | "unlock") => {
            let Some(uid) = int_param(params, "uid") else {
                return content(json!(false));
            };
            let mut accounts = db.accounts.write().await;
            match accounts.get_mut(&uid) {
                Some(account) => {
                    account.enabled = action == "unlock";
                    content(json!(true))
                }
                None => content(json!(false)),
            }
        }
        ("domain", "find") => content(json!([{ "domaine": "example.org", "uid": 2000 }])),
        ("ftp", "find") => content(json!([{ "id": 1, "login": "alice_web", "uid": 2001 }])),
        _ => error(StatusCode::OK, 404, "unknown object or action"),
    }
}
