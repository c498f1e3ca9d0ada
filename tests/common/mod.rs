#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use household_api_client::{
    ApiClient, ApiResponse, Config, Error, Notification, PreparedRequest, Transport,
    token::MemoryCredentialStore,
};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

pub enum Reply {
    Status(u16, Option<serde_json::Value>),
    NetworkDown,
}

type Responder = dyn Fn(&Call) -> Reply + Send + Sync;

/// In-memory transport recording the order in which requests are issued.
///
/// Refresh calls are held until `hold_refresh_until` non-refresh calls have been seen, so tests can
/// line up concurrent 401s deterministically.
pub struct ScriptedTransport {
    calls: Mutex<Vec<Call>>,
    respond: Box<Responder>,
    hold_refresh_until: usize,
}

impl ScriptedTransport {
    pub fn new(respond: impl Fn(&Call) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            respond: Box::new(respond),
            hold_refresh_until: 0,
        }
    }

    pub fn hold_refresh_until(mut self, calls: usize) -> Self {
        self.hold_refresh_until = calls;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn refresh_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.path.ends_with("/auth/refresh"))
            .count()
    }

    fn non_refresh_calls(&self) -> usize {
        self.calls().len() - self.refresh_calls()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: PreparedRequest) -> Result<ApiResponse, Error> {
        let call = Call {
            method: request.method.to_string(),
            path: request.url.path().to_string(),
            authorization: request.authorization().map(str::to_string),
        };
        self.calls.lock().unwrap().push(call.clone());

        if call.path.ends_with("/auth/refresh") {
            while self.non_refresh_calls() < self.hold_refresh_until {
                tokio::task::yield_now().await;
            }
        }

        match (self.respond)(&call) {
            Reply::Status(status, body) => Ok(ApiResponse::new(
                StatusCode::from_u16(status).unwrap(),
                HeaderMap::new(),
                body.map(|b| serde_json::to_vec(&b).unwrap())
                    .unwrap_or_default(),
            )),
            Reply::NetworkDown => Err(Error::Network(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )))),
        }
    }
}

pub const BASE: &str = "http://household.test/api/v1";

pub fn client_over(transport: Arc<ScriptedTransport>) -> ApiClient {
    ApiClient::with_parts(
        Config::from_values(BASE),
        transport,
        Arc::new(MemoryCredentialStore::new()),
    )
    .expect("client")
}

pub fn token_body(token: &str) -> Option<serde_json::Value> {
    Some(serde_json::json!({ "data": { "access_token": token } }))
}

/// Protected endpoints answer 401 to anything but `Bearer <good>`; refresh mints `good`.
pub fn accept_only(good: &'static str) -> impl Fn(&Call) -> Reply + Send + Sync + 'static {
    move |call: &Call| {
        if call.path.ends_with("/auth/refresh") {
            return Reply::Status(200, token_body(good));
        }
        if call.authorization.as_deref() == Some(format!("Bearer {good}").as_str()) {
            Reply::Status(200, Some(serde_json::json!({ "data": call.path })))
        } else {
            Reply::Status(401, None)
        }
    }
}

pub fn record_notifications(client: &ApiClient) -> Arc<Mutex<Vec<Notification>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    client.on_notification(move |n: &Notification| sink.lock().unwrap().push(n.clone()));
    seen
}
