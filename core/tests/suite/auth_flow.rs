use helpdesk_core::auth;
use helpdesk_core::auth::AuthFlowError;
use helpdesk_core::endpoints::ListTickets;
use helpdesk_core::navigation::MemoryNavigator;
use helpdesk_core::navigation::Navigator;
use helpdesk_core::notify::Notice;
use helpdesk_core::notify::RecordingNotifier;
use helpdesk_protocol::Role;
use helpdesk_protocol::requests::LoginRequest;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::body_json;
use wiremock::matchers::method;
use wiremock::matchers::path;

use super::client_for;
use super::envelope;
use super::user_json;

fn credentials() -> LoginRequest {
    LoginRequest {
        email: "pat@example.com".to_string(),
        password: "hunter22".to_string(),
    }
}

#[tokio::test]
async fn login_stores_user_and_routes_by_role() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "email": "pat@example.com", "password": "hunter22" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(json!({ "user": user_json("MANAGER"), "token": "jwt" }))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let notifier = RecordingNotifier::new();
    let signed_in = auth::login(&client, &notifier, credentials())
        .await
        .expect("login");

    assert_eq!(signed_in.redirect, "/manager/tickets");
    assert_eq!(signed_in.token, "jwt");
    assert_eq!(client.session().snapshot().role(), Some(Role::Manager));
    assert_eq!(notifier.notices(), vec![Notice::success("Logged in successfully")]);
}

#[tokio::test]
async fn rejected_login_reports_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "success": false, "message": "Invalid credentials" })),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let notifier = RecordingNotifier::new();
    let err = auth::login(&client, &notifier, credentials())
        .await
        .expect_err("rejected");

    assert!(matches!(err, AuthFlowError::Client(_)));
    assert!(!client.session().is_authenticated());
    assert_eq!(notifier.notices(), vec![Notice::error("Invalid credentials")]);
}

#[tokio::test]
async fn logout_clears_session_and_cached_tickets() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tickets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([]))))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("jwt"));
    client
        .session()
        .set_credentials(serde_json::from_value(user_json("ADMIN")).expect("user"));
    client.query(&ListTickets(None)).await.expect("list");

    let navigator = MemoryNavigator::new("/admin/tickets");
    let notifier = RecordingNotifier::new();
    auth::logout(&client, &notifier, &navigator)
        .await
        .expect("logout");

    assert!(!client.session().is_authenticated());
    assert_eq!(navigator.location().path(), "/login");
    assert_eq!(notifier.notices(), vec![Notice::success("Logged out successfully")]);

    // The ticket list was evicted, so this goes back to the network.
    client.query(&ListTickets(None)).await.expect("list again");
}

#[tokio::test]
async fn failed_logout_keeps_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "success": false })))
        .mount(&server)
        .await;

    let client = client_for(&server, Some("jwt"));
    client
        .session()
        .set_credentials(serde_json::from_value(user_json("ADMIN")).expect("user"));
    let navigator = MemoryNavigator::new("/admin/triage");
    let notifier = RecordingNotifier::new();

    auth::logout(&client, &notifier, &navigator)
        .await
        .expect_err("server error");

    assert!(client.session().is_authenticated());
    assert_eq!(navigator.location().path(), "/admin/triage");
    assert_eq!(notifier.notices(), vec![Notice::error("Failed to logout")]);
}
