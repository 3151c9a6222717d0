use std::time::Duration;

use helpdesk_core::ClientError;
use helpdesk_core::endpoints::GetTicket;
use helpdesk_core::endpoints::TicketRef;
use helpdesk_core::endpoints::UpdateTicket;
use helpdesk_protocol::TicketStatus;
use helpdesk_protocol::requests::UpdateTicketRequest;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::body_json;
use wiremock::matchers::header;
use wiremock::matchers::method;
use wiremock::matchers::path;

use super::client_for;
use super::envelope;
use super::ticket_json;
use super::user_json;

#[tokio::test]
async fn concurrent_queries_share_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tickets/t1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(ticket_json("t1", "Printer on fire")))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let query = GetTicket(TicketRef::Id("t1".to_string()));
    let (a, b) = tokio::join!(client.query(&query), client.query(&query));

    let a = a.expect("first").into_data().expect("ticket");
    let b = b.expect("second").into_data().expect("ticket");
    assert_eq!(a, b);
    assert_eq!(a.subject, "Printer on fire");

    // Served from cache: the mock still sees exactly one request.
    client.query(&query).await.expect("cached");
}

#[tokio::test]
async fn session_cookie_travels_with_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/profile"))
        .and(header("cookie", "token=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(user_json("ADMIN"))))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("abc123"));
    assert!(client.has_session_marker());
    let user = client
        .query(&helpdesk_core::endpoints::Profile)
        .await
        .expect("profile")
        .into_data()
        .expect("user");
    assert_eq!(user.name, "Pat");
}

#[tokio::test]
async fn unauthorized_response_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tickets/t1"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "success": false, "message": "Session expired" })),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, Some("stale"));
    let user = serde_json::from_value(user_json("MANAGER")).expect("user");
    client.session().set_credentials(user);
    assert!(client.session().is_authenticated());

    let err = client
        .query(&GetTicket(TicketRef::Id("t1".to_string())))
        .await
        .expect_err("401");
    assert_eq!(
        err,
        ClientError::Unauthorized {
            message: "Session expired".to_string()
        }
    );
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn validation_details_surface_on_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/tickets/t1"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "message": "Validation failed",
            "error": { "code": "VALIDATION", "details": { "status": "invalid" } }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client
        .mutate(&UpdateTicket {
            id: "t1".to_string(),
            patch: UpdateTicketRequest {
                status: Some(TicketStatus::Closed),
                ..Default::default()
            },
        })
        .await
        .expect_err("400");

    let ClientError::Api {
        status,
        message,
        details,
    } = err
    else {
        panic!("expected api error, got {err:?}");
    };
    assert_eq!(status, 400);
    assert_eq!(message, "Validation failed");
    assert_eq!(details, Some(json!({ "status": "invalid" })));
}

#[tokio::test]
async fn mutation_refreshes_observed_ticket() {
    let server = MockServer::start().await;
    let mut resolved = ticket_json("t1", "Printer on fire");
    resolved["status"] = json!("RESOLVED");

    Mock::given(method("GET"))
        .and(path("/api/tickets/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(ticket_json(
            "t1",
            "Printer on fire",
        ))))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tickets/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(resolved.clone())))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/tickets/t1"))
        .and(body_json(json!({ "status": "RESOLVED" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(resolved)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let mut ticket = client.subscribe(&GetTicket(TicketRef::Id("t1".to_string())));
    let first = ticket.settled().await.expect("state");
    assert_eq!(
        first.data.and_then(|r| r.data).map(|t| t.status),
        Some(TicketStatus::Open)
    );

    client
        .mutate(&UpdateTicket {
            id: "t1".to_string(),
            patch: UpdateTicketRequest {
                status: Some(TicketStatus::Resolved),
                ..Default::default()
            },
        })
        .await
        .expect("update");

    let refreshed = ticket.settled().await.expect("state");
    assert_eq!(
        refreshed.data.and_then(|r| r.data).map(|t| t.status),
        Some(TicketStatus::Resolved)
    );
}

#[tokio::test]
async fn missing_ticket_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tickets/token/nope"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({ "success": false, "message": "Ticket not found" })),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client
        .query(&GetTicket(TicketRef::Token("nope".to_string())))
        .await
        .expect_err("404");
    assert!(err.is_not_found());
}
