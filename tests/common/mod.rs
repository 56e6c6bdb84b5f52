//! An in-process stand-in for the Discord REST API, plus helpers to sign interaction requests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use ed25519_dalek::{Signer, SigningKey};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tempest::http::{Http, HttpBuilder, RatelimiterSettings};
use tempest::model::id::ApplicationId;
use tokio::net::TcpListener;

pub const APPLICATION_ID: u64 = 846962681424216065;
pub const DM_CHANNEL_ID: u64 = 319674150115610528;

/// A request the mock API received.
#[derive(Clone, Debug)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// What the mock API answers with.
pub struct Reply {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: String,
}

impl Reply {
    pub fn json(body: Value) -> Self {
        Self {
            status: 200,
            headers: vec![("content-type", "application/json".to_owned())],
            body: body.to_string(),
        }
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn header(mut self, name: &'static str, value: impl ToString) -> Self {
        self.headers.push((name, value.to_string()));
        self
    }
}

type Responder = dyn Fn(&Recorded, usize) -> Reply + Send + Sync;

struct MockState {
    requests: Mutex<Vec<Recorded>>,
    responder: Box<Responder>,
}

/// A running mock API.
pub struct MockApi {
    pub base: String,
    state: Arc<MockState>,
}

impl MockApi {
    /// Serves `responder`'s replies. It is given each request along with the number of requests
    /// received before it.
    pub async fn start(responder: impl Fn(&Recorded, usize) -> Reply + Send + Sync + 'static) -> Self {
        let state = Arc::new(MockState {
            requests: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let app = Router::new().fallback(record).with_state(Arc::clone(&state));
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        Self {
            base,
            state,
        }
    }

    /// Answers every webhook call the way Discord does when it succeeds.
    pub async fn discord() -> Self {
        Self::start(|request, _| default_reply(request)).await
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().clone()
    }

    /// The requests whose path contains `fragment`.
    pub fn requests_to(&self, fragment: &str) -> Vec<Recorded> {
        self.requests().into_iter().filter(|r| r.path.contains(fragment)).collect()
    }

    /// Waits until at least `count` requests containing `fragment` arrived.
    pub async fn wait_for(&self, fragment: &str, count: usize) -> Vec<Recorded> {
        for _ in 0..200 {
            let requests = self.requests_to(fragment);
            if requests.len() >= count {
                return requests;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {count} requests to {fragment}, got {:?}", self.requests());
    }

    /// An HTTP client pointed at this mock.
    pub fn http(&self) -> Http {
        self.http_with(RatelimiterSettings::default())
    }

    pub fn http_with(&self, settings: RatelimiterSettings) -> Http {
        HttpBuilder::new("Mjg4NzYwMjQxMzYzODc3ODg4.C_ikow.j3VupLBuE1QWZng3TMGH0z_UAwg")
            .proxy(self.base.clone())
            .application_id(ApplicationId::new(APPLICATION_ID))
            .ratelimiter_settings(settings)
            .build()
    }
}

async fn record(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let recorded = Recorded {
        method,
        path: uri.path_and_query().map_or_else(|| uri.path().to_owned(), ToString::to_string),
        headers,
        body: body.to_vec(),
    };

    let reply = {
        let mut requests = state.requests.lock();
        let reply = (state.responder)(&recorded, requests.len());
        requests.push(recorded);
        reply
    };

    let mut response =
        (StatusCode::from_u16(reply.status).unwrap(), reply.body).into_response();
    for (name, value) in reply.headers {
        response.headers_mut().insert(name, value.parse().unwrap());
    }
    response
}

pub fn message(id: u64, content: &str) -> Value {
    json!({
        "id": id.to_string(),
        "channel_id": "290926798626357999",
        "content": content,
    })
}

fn sent_content(request: &Recorded) -> String {
    serde_json::from_slice::<Value>(&request.body)
        .ok()
        .and_then(|body| body["content"].as_str().map(ToOwned::to_owned))
        .unwrap_or_default()
}

/// Discord's answers: 204 for callbacks and deletions, a message for webhook and channel
/// messages, and the bot user for `/users/@me`.
pub fn default_reply(request: &Recorded) -> Reply {
    if request.path.ends_with("/callback") || request.method == Method::DELETE {
        Reply::empty(204)
    } else if request.path.contains("/webhooks/") {
        Reply::json(message(1100, &sent_content(request)))
    } else if request.path.contains("/channels/") && request.path.contains("/messages") {
        let channel_id = request.path.split('/').nth(4).unwrap_or_default();
        let mut reply = message(1200, &sent_content(request));
        reply["channel_id"] = json!(channel_id);
        Reply::json(reply)
    } else if request.path.ends_with("/users/@me/channels") {
        Reply::json(json!({"id": DM_CHANNEL_ID.to_string(), "type": 1, "recipients": [user()]}))
    } else if request.path.contains("/members/") {
        Reply::json(json!({"user": user(), "roles": ["41771983423143936"], "nick": "Mace"}))
    } else if request.path.ends_with("/users/@me") {
        Reply::json(json!({"id": APPLICATION_ID.to_string(), "username": "Tempest", "bot": true}))
    } else if request.path.ends_with("/gateway") {
        Reply::json(json!({"url": "wss://gateway.discord.gg"}))
    } else if request.path.contains("/users/") {
        Reply::json(user())
    } else if request.path.contains("/commands") {
        Reply {
            status: 200,
            headers: vec![("content-type", "application/json".to_owned())],
            body: String::from_utf8(request.body.clone()).unwrap(),
        }
    } else {
        Reply::empty(404)
    }
}

/// Signs interaction requests the way Discord does.
pub struct Keys {
    key: SigningKey,
}

impl Keys {
    pub fn new() -> Self {
        Self {
            key: SigningKey::from_bytes(&[42; 32]),
        }
    }

    pub fn public_key(&self) -> String {
        hex(self.key.verifying_key().as_bytes())
    }

    pub fn sign(&self, timestamp: &str, body: &[u8]) -> String {
        hex(&self.key.sign(&[timestamp.as_bytes(), body].concat()).to_bytes())
    }
}

pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

pub fn user() -> Value {
    json!({"id": "53908232506183680", "username": "Mason"})
}

pub fn command_payload(name: &str, options: Value) -> Value {
    json!({
        "id": "846962681424216064",
        "application_id": APPLICATION_ID.to_string(),
        "type": 2,
        "token": "aW50ZXJhY3Rpb24",
        "version": 1,
        "channel_id": "290926798626357999",
        "user": user(),
        "data": {"id": "771825006014889984", "name": name, "type": 1, "options": options},
    })
}

pub fn component_payload(custom_id: &str) -> Value {
    json!({
        "id": "846962681424216070",
        "application_id": APPLICATION_ID.to_string(),
        "type": 3,
        "token": "Y29tcG9uZW50",
        "version": 1,
        "channel_id": "290926798626357999",
        "user": user(),
        "message": {"id": "846962681424216099", "channel_id": "290926798626357999"},
        "data": {"custom_id": custom_id, "component_type": 2},
    })
}

pub fn autocomplete_payload(name: &str, options: Value) -> Value {
    json!({
        "id": "846962681424216080",
        "application_id": APPLICATION_ID.to_string(),
        "type": 4,
        "token": "YXV0b2NvbXBsZXRl",
        "version": 1,
        "user": user(),
        "data": {"id": "771825006014889984", "name": name, "type": 1, "options": options},
    })
}
