use std::sync::Arc;
use std::time::Duration;

use helpdesk_core::endpoints::ListTickets;
use helpdesk_core::list_controller::ListQueryController;
use helpdesk_core::list_query::ListDefaults;
use helpdesk_core::navigation::MemoryNavigator;
use helpdesk_core::navigation::Navigator;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::query_param;
use wiremock::matchers::query_param_is_missing;

use super::client_for;
use super::ticket_json;

fn page_of(ids: &[&str], total: u32) -> serde_json::Value {
    let tickets: Vec<_> = ids.iter().map(|id| ticket_json(id, "Printer on fire")).collect();
    json!({
        "success": true,
        "data": tickets,
        "pagination": { "page": 1, "limit": 10, "total": total, "totalPages": 1 }
    })
}

#[tokio::test]
async fn bare_url_requests_page_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tickets"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "10"))
        .and(query_param("sort", "createdAt"))
        .and(query_param("order", "desc"))
        .and(query_param_is_missing("status"))
        .and(query_param_is_missing("search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_of(&["t1", "t2"], 2)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let navigator = Arc::new(MemoryNavigator::new("/manager/tickets"));
    let controller = ListQueryController::new(
        navigator,
        ListDefaults::TICKET_QUEUE,
        Duration::from_millis(500),
    );

    let response = client
        .query(&ListTickets(Some(controller.params())))
        .await
        .expect("list");
    assert_eq!(response.pagination.map(|p| p.total), Some(2));
    assert_eq!(response.data.map(|t| t.len()), Some(2));
}

#[tokio::test]
async fn filter_change_requests_first_filtered_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tickets"))
        .and(query_param("page", "1"))
        .and(query_param("status", "OPEN"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_of(&["t3"], 1)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let navigator = Arc::new(MemoryNavigator::new("/admin/tickets?page=4&limit=25"));
    let controller = ListQueryController::new(
        Arc::clone(&navigator),
        ListDefaults::TICKET_QUEUE,
        Duration::from_millis(500),
    );

    controller.set_filter("status", "OPEN");
    assert_eq!(navigator.location().get("page"), Some("1"));
    assert_eq!(navigator.location().get("limit"), Some("25"));

    let response = client
        .query(&ListTickets(Some(controller.params())))
        .await
        .expect("list");
    assert_eq!(
        response.data.map(|t| t.into_iter().map(|t| t.id).collect::<Vec<_>>()),
        Some(vec!["t3".to_string()])
    );
}
