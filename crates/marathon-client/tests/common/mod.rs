//! Mock notification backend served by axum on an ephemeral port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, patch},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use marathon_client::ClientConfig;
use marathon_types::Channel;

const JWT_SECRET: &str = "test-secret";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
}

pub fn issue_token(user: &str) -> String {
    let claims = Claims {
        sub: user.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET.as_bytes())).unwrap()
}

#[derive(Default)]
pub struct MockState {
    pub global: Mutex<Vec<Value>>,
    pub event: Mutex<Vec<Value>>,
    /// Answer list calls with a bare array.
    pub bare: AtomicBool,
    pub fail_deletes: AtomicBool,
    pub list_hits: AtomicUsize,
    /// `METHOD path?query` of every request that reached the router.
    pub requests: Mutex<Vec<String>>,
}

impl MockState {
    pub fn list_hits(&self) -> usize {
        self.list_hits.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn records(&self, channel: Channel) -> &Mutex<Vec<Value>> {
        match channel {
            Channel::Global => &self.global,
            Channel::Event => &self.event,
        }
    }

    fn update_all<F: FnMut(&mut Value)>(&self, mut f: F) {
        for channel in Channel::ALL {
            self.records(channel).lock().unwrap().iter_mut().for_each(&mut f);
        }
    }
}

pub struct MockBackend {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
}

impl MockBackend {
    pub async fn start(state: MockState) -> Self {
        let state = Arc::new(state);
        let app = Router::new()
            .route("/api/v1/notification/global", get(list_global))
            .route("/api/v1/notification/event", get(list_event))
            .route("/api/v1/notification/read-all", patch(read_all))
            .route("/api/v1/notification/{id}/read", patch(read_one))
            .route("/api/v1/notification/{id}", delete(delete_one))
            .layer(middleware::from_fn(require_auth))
            .layer(middleware::from_fn_with_state(state.clone(), record_request))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn config(&self, token: Option<String>) -> ClientConfig {
        ClientConfig {
            base_url: format!("http://{}", self.addr),
            token,
            ..ClientConfig::default()
        }
    }
}

async fn record_request(State(state): State<Arc<MockState>>, req: Request, next: Next) -> Response {
    let line = format!("{} {}", req.method(), req.uri());
    state.requests.lock().unwrap().push(line);
    next.run(req).await
}

async fn require_auth(req: Request, next: Next) -> Result<Response, StatusCode> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    decode::<Claims>(token, &DecodingKey::from_secret(JWT_SECRET.as_bytes()), &Validation::default())
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    Ok(next.run(req).await)
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: u32,
    size: u32,
}

#[derive(Debug, Deserialize)]
struct ReadQuery {
    #[serde(rename = "type")]
    kind: String,
}

async fn list_global(State(state): State<Arc<MockState>>, Query(q): Query<PageQuery>) -> Json<Value> {
    Json(list(&state, Channel::Global, q))
}

async fn list_event(State(state): State<Arc<MockState>>, Query(q): Query<PageQuery>) -> Json<Value> {
    Json(list(&state, Channel::Event, q))
}

fn list(state: &MockState, channel: Channel, q: PageQuery) -> Value {
    state.list_hits.fetch_add(1, Ordering::SeqCst);
    let all = state.records(channel).lock().unwrap().clone();
    if state.bare.load(Ordering::SeqCst) {
        return Value::Array(all);
    }

    let page_index = q.page.saturating_sub(1) as usize;
    let size = q.size.max(1) as usize;
    let content: Vec<Value> = all.iter().skip(page_index * size).take(size).cloned().collect();
    let total_pages = all.len().div_ceil(size);
    json!({
        "content": content,
        "totalElements": all.len(),
        "totalPages": total_pages,
        "pageable": { "pageNumber": page_index, "pageSize": size, "offset": page_index * size },
        "first": page_index == 0,
        "last": page_index + 1 >= total_pages,
        "empty": content.is_empty(),
        "number": page_index,
        "size": size,
    })
}

async fn read_one(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    Query(q): Query<ReadQuery>,
) -> Json<Value> {
    state.update_all(|r| {
        if id_matches(r, &id) {
            r["isRead"] = json!(true);
        }
    });
    Json(json!({ "success": true, "message": format!("{} read", q.kind) }))
}

async fn read_all(State(state): State<Arc<MockState>>) -> StatusCode {
    state.update_all(|r| r["isRead"] = json!(true));
    StatusCode::NO_CONTENT
}

async fn delete_one(State(state): State<Arc<MockState>>, Path(id): Path<String>) -> Response {
    if state.fail_deletes.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "storage offline").into_response();
    }
    for channel in Channel::ALL {
        state.records(channel).lock().unwrap().retain(|r| !id_matches(r, &id));
    }
    Json(json!({ "success": true })).into_response()
}

// Record ids may be stored as JSON numbers; paths always carry strings.
fn id_matches(record: &Value, id: &str) -> bool {
    match &record["id"] {
        Value::String(s) => s == id,
        Value::Number(n) => n.to_string() == id,
        _ => false,
    }
}
