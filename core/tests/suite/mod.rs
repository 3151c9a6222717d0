mod auth_flow;
mod http_client;
mod list_queries;
mod route_guard;
mod submission;

use helpdesk_core::ApiClient;
use helpdesk_core::ClientConfig;
use serde_json::Value;
use serde_json::json;
use wiremock::MockServer;

/// Client pointed at the mock server's `/api` prefix.
pub(crate) fn client_for(server: &MockServer, token: Option<&str>) -> ApiClient {
    let config = ClientConfig {
        api_url: format!("{}/api", server.uri()),
        session_token: token.map(str::to_string),
        ..ClientConfig::default()
    };
    ApiClient::from_config(&config).expect("client")
}

pub(crate) fn envelope(data: Value) -> Value {
    json!({ "success": true, "data": data })
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

pub(crate) fn ticket_json(id: &str, subject: &str) -> Value {
    json!({
        "id": id,
        "uniqueToken": format!("tok-{id}"),
        "guestEmail": "sam@example.com",
        "guestName": "Sam",
        "subject": subject,
        "initialMessage": "The login page spins forever.",
        "status": "OPEN",
        "priority": "MEDIUM",
        "createdAt": "2025-01-01T00:00:00Z",
        "updatedAt": "2025-01-01T00:00:00Z"
    })
}
