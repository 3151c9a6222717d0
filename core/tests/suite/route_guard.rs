use helpdesk_core::GuardDecision;
use helpdesk_core::session::authorize_view;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::method;
use wiremock::matchers::path;

use super::client_for;
use super::envelope;
use super::user_json;

async fn profile_responds(server: &MockServer, template: ResponseTemplate, calls: u64) {
    Mock::given(method("GET"))
        .and(path("/api/auth/profile"))
        .respond_with(template)
        .expect(calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn manager_is_sent_out_of_admin_section() {
    let server = MockServer::start().await;
    profile_responds(
        &server,
        ResponseTemplate::new(200).set_body_json(envelope(user_json("MANAGER"))),
        1,
    )
    .await;

    let client = client_for(&server, Some("jwt"));
    assert_eq!(
        authorize_view(&client, "/admin/users").await,
        GuardDecision::Redirect("/manager/tickets".to_string())
    );
    // The session is now hydrated; the second check needs no probe.
    assert_eq!(
        authorize_view(&client, "/manager/tickets?page=2").await,
        GuardDecision::Allow
    );
}

#[tokio::test]
async fn admin_root_as_manager_lands_on_manager_tickets() {
    let server = MockServer::start().await;
    profile_responds(
        &server,
        ResponseTemplate::new(200).set_body_json(envelope(user_json("MANAGER"))),
        1,
    )
    .await;

    let client = client_for(&server, Some("jwt"));
    assert_eq!(
        authorize_view(&client, "/admin").await,
        GuardDecision::Redirect("/manager/tickets".to_string())
    );
    assert_eq!(
        authorize_view(&client, "/manager/").await,
        GuardDecision::Redirect("/manager/tickets".to_string())
    );
}

#[tokio::test]
async fn admin_root_as_admin_lands_on_triage() {
    let server = MockServer::start().await;
    profile_responds(
        &server,
        ResponseTemplate::new(200).set_body_json(envelope(user_json("ADMIN"))),
        1,
    )
    .await;

    let client = client_for(&server, Some("jwt"));
    assert_eq!(
        authorize_view(&client, "/admin").await,
        GuardDecision::Redirect("/admin/triage".to_string())
    );
}

#[tokio::test]
async fn role_root_without_marker_goes_straight_to_login() {
    let server = MockServer::start().await;
    profile_responds(
        &server,
        ResponseTemplate::new(200).set_body_json(envelope(user_json("ADMIN"))),
        0,
    )
    .await;

    let client = client_for(&server, None);
    assert_eq!(
        authorize_view(&client, "/admin").await,
        GuardDecision::Redirect("/login".to_string())
    );
}

#[tokio::test]
async fn admin_reaches_admin_pages() {
    let server = MockServer::start().await;
    profile_responds(
        &server,
        ResponseTemplate::new(200).set_body_json(envelope(user_json("ADMIN"))),
        1,
    )
    .await;

    let client = client_for(&server, Some("jwt"));
    assert_eq!(authorize_view(&client, "/admin/triage").await, GuardDecision::Allow);
    assert!(client.session().is_authenticated());
}

#[tokio::test]
async fn missing_marker_redirects_without_probing() {
    let server = MockServer::start().await;
    profile_responds(
        &server,
        ResponseTemplate::new(200).set_body_json(envelope(user_json("ADMIN"))),
        0,
    )
    .await;

    let client = client_for(&server, None);
    assert_eq!(
        authorize_view(&client, "/manager/tickets").await,
        GuardDecision::Redirect("/login".to_string())
    );
    assert_eq!(authorize_view(&client, "/login").await, GuardDecision::Allow);
    assert_eq!(
        authorize_view(&client, "/ticket/abc").await,
        GuardDecision::Allow
    );
}

#[tokio::test]
async fn expired_marker_falls_back_to_login() {
    let server = MockServer::start().await;
    profile_responds(
        &server,
        ResponseTemplate::new(401).set_body_json(json!({ "success": false, "message": "expired" })),
        1,
    )
    .await;

    let client = client_for(&server, Some("expired"));
    assert_eq!(
        authorize_view(&client, "/admin/categories").await,
        GuardDecision::Redirect("/login".to_string())
    );
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn signed_in_user_skips_login_page() {
    let server = MockServer::start().await;
    let client = client_for(&server, Some("jwt"));
    assert_eq!(
        authorize_view(&client, "/login").await,
        GuardDecision::Redirect("/admin/triage".to_string())
    );
}
