//! Scripted transport for unit tests.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use chrono::TimeZone;
use chrono::Utc;
use helpdesk_protocol::Role;
use helpdesk_protocol::User;
use serde_json::Value;
use serde_json::json;

use crate::client::ApiClient;
use crate::error::ClientError;
use crate::session::SessionStore;
use crate::transport::ApiRequest;
use crate::transport::Method;
use crate::transport::RawResponse;
use crate::transport::Transport;

/// Answers from per-route queues. The last queued response for a route
/// repeats; unknown routes get a 404 envelope.
pub(crate) struct ScriptedTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<RawResponse>>>,
    requests: Mutex<Vec<ApiRequest>>,
    delay: Duration,
    marker: AtomicBool,
}

impl ScriptedTransport {
    pub(crate) fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            routes: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            delay,
            marker: AtomicBool::new(true),
        })
    }

    pub(crate) fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(RawResponse::new(status, body));
    }

    pub(crate) fn ok(&self, method: Method, path: &str, data: Value) {
        self.respond(method, path, 200, json!({ "success": true, "data": data }));
    }

    pub(crate) fn set_marker(&self, present: bool) {
        self.marker.store(present, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self, method: Method, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, ClientError> {
        let key = (request.method, request.path.clone());
        self.requests.lock().unwrap().push(request);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let mut routes = self.routes.lock().unwrap();
        let response = match routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        Ok(response.unwrap_or_else(|| {
            RawResponse::new(404, json!({ "success": false, "message": "Route not found" }))
        }))
    }

    fn has_session_marker(&self) -> bool {
        self.marker.load(Ordering::SeqCst)
    }
}

pub(crate) fn client_with(transport: &Arc<ScriptedTransport>) -> ApiClient {
    ApiClient::new(transport.clone(), SessionStore::new())
}

pub(crate) fn user(role: Role) -> User {
    User {
        id: "u1".to_string(),
        email: "pat@example.com".to_string(),
        name: "Pat".to_string(),
        role,
        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        updated_at: None,
    }
}

pub(crate) fn user_json(role: &str) -> Value {
    json!({
        "id": "u1",
        "email": "pat@example.com",
        "name": "Pat",
        "role": role,
        "createdAt": "2025-01-01T00:00:00Z"
    })
}

pub(crate) fn ticket_json(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "uniqueToken": format!("tok-{id}"),
        "guestEmail": "sam@example.com",
        "guestName": "Sam",
        "subject": "Cannot log in",
        "initialMessage": "The login page spins forever.",
        "status": status,
        "priority": "MEDIUM",
        "createdAt": "2025-01-01T00:00:00Z",
        "updatedAt": "2025-01-01T00:00:00Z"
    })
}

pub(crate) fn message_json(id: &str, content: &str) -> Value {
    json!({
        "id": id,
        "ticketId": "t1",
        "content": content,
        "senderType": "GUEST",
        "senderName": "Sam",
        "createdAt": "2025-01-01T00:00:00Z"
    })
}
