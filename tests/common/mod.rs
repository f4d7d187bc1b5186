//! 테스트용 백엔드 (axum)
//!
//! 모든 요청을 기록하고, 미리 등록한 응답을 `{ data: ... }` 형태로 돌려줍니다.

#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use portal_lib::config::PortalConfig;
use portal_lib::session::{Role, Session};
use portal_lib::Portal;

pub const API_PREFIX: &str = "/api/v1";

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub body: Value,
    pub authorization: Option<String>,
    pub request_id: Option<String>,
}

#[derive(Debug, Clone)]
struct Canned {
    status: u16,
    body: String,
    delay: Duration,
}

#[derive(Default)]
struct Inner {
    requests: Vec<Recorded>,
    responses: HashMap<String, VecDeque<Canned>>,
}

#[derive(Clone)]
pub struct MockBackend {
    inner: Arc<Mutex<Inner>>,
    base_url: String,
}

fn key(method: &str, path: &str) -> String {
    format!("{} {}", method.to_uppercase(), path)
}

impl MockBackend {
    pub async fn start() -> Self {
        let inner = Arc::new(Mutex::new(Inner::default()));

        let app = Router::new()
            .fallback(handle)
            .with_state(inner.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            inner,
            base_url: format!("http://{}{}", addr, API_PREFIX),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 응답 등록. 같은 경로에 여러 번 등록하면 순서대로 소비하고 마지막 응답은 계속 재사용
    pub fn respond(&self, method: &str, path: &str, status: u16, body: Value) {
        self.push(method, path, status, body.to_string(), Duration::ZERO);
    }

    /// `{ data: ... }` 로 감싼 성공 응답
    pub fn respond_data(&self, method: &str, path: &str, data: Value) {
        self.respond(method, path, 200, json!({ "data": data }));
    }

    pub fn respond_raw(&self, method: &str, path: &str, status: u16, body: &str) {
        self.push(method, path, status, body.to_string(), Duration::ZERO);
    }

    pub fn respond_slow(&self, method: &str, path: &str, status: u16, body: Value, delay: Duration) {
        self.push(method, path, status, body.to_string(), delay);
    }

    fn push(&self, method: &str, path: &str, status: u16, body: String, delay: Duration) {
        self.inner
            .lock()
            .unwrap()
            .responses
            .entry(key(method, path))
            .or_default()
            .push_back(Canned { status, body, delay });
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, method: &str, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method.to_uppercase() && r.path == path)
            .collect()
    }

    pub fn config(&self) -> PortalConfig {
        PortalConfig::new(&self.base_url).without_session_file()
    }

    pub fn portal(&self) -> Portal {
        Portal::new(self.config()).unwrap()
    }

    pub fn portal_with_timeout(&self, timeout: Duration) -> Portal {
        Portal::new(self.config().with_request_timeout(timeout)).unwrap()
    }

    /// 로그인된 상태의 포털
    pub fn signed_in_portal(&self, role: Role) -> Portal {
        let portal = self.portal();
        portal.session().set(test_session(role)).unwrap();
        portal
    }
}

pub fn test_session(role: Role) -> Session {
    Session {
        token: "test-token".to_string(),
        role,
        email: Some("patient@example.com".to_string()),
        expires_at: Utc::now() + ChronoDuration::hours(1),
    }
}

async fn handle(
    State(inner): State<Arc<Mutex<Inner>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path()
        .strip_prefix(API_PREFIX)
        .unwrap_or(uri.path())
        .to_string();

    let query = uri
        .query()
        .map(|q| {
            q.split('&')
                .filter_map(|pair| pair.split_once('='))
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        })
        .unwrap_or_default();

    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let canned = {
        let mut inner = inner.lock().unwrap();
        inner.requests.push(Recorded {
            method: method.as_str().to_string(),
            path: path.clone(),
            query,
            body: serde_json::from_slice(&body).unwrap_or(Value::Null),
            authorization: header("authorization"),
            request_id: header("x-request-id"),
        });

        inner
            .responses
            .get_mut(&key(method.as_str(), &path))
            .and_then(|queue| {
                if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                }
            })
    };

    match canned {
        Some(canned) => {
            if !canned.delay.is_zero() {
                tokio::time::sleep(canned.delay).await;
            }
            let status = StatusCode::from_u16(canned.status).unwrap();
            (
                status,
                [("content-type", "application/json")],
                canned.body,
            )
                .into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": format!("No route for {} {}", method, path) })),
        )
            .into_response(),
    }
}
